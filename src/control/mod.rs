//! Control strategies and the sinks fed in slicing and state modes
//!
//! One [`ControlStrategy`] per target kind in normal mode. Slicing and
//! state publishing skip the strategies and hand the [`dominant_axis`] of
//! the translation to a [`VolumeSlicer`] and [`AxisTelemetry`] sinks.

pub mod extraction;
pub mod frames;
pub mod sinks;
pub mod strategy;

pub use extraction::dominant_axis;
pub use frames::{extrinsic_euler_deg, rotation_inverse, EulerOrder};
pub use sinks::{AxisTelemetry, VolumeSlicer};
pub use strategy::{CameraStrategy, ControlStrategy, ObjectStrategy, RigidBodyStrategy};
