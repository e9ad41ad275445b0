//! SpaceNav control core
//!
//! Turns samples from a 6-DOF spatial input device into pose and velocity
//! commands for one selectable target of a running simulation.
//!
//! ```text
//! Device ──► SampleFilter ──► Dispatcher ──► ControlStrategy ──► Target
//!            (denoised)      (index, mode)        │
//!                                                 └──► Slicer / Telemetry sinks
//! ```
//!
//! Everything runs synchronously inside the host's physics tick; see
//! [`controller::SpaceNavController::tick`].

pub mod config;
pub mod control;
pub mod controller;
pub mod device;
pub mod dispatch;
pub mod filter;
pub mod scene;
pub mod targets;
pub mod telemetry;
pub mod volume;

pub use controller::{ControllerSinks, InitError, SpaceNavController};
