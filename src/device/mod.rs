//! Device subsystem for 6-DOF spatial input
//!
//! Splits device access into three pieces:
//!
//! 1. [`event_source`] - Raw samples and the non-blocking poll contract
//! 2. [`session`] - Open/close lifecycle of the one device handle
//! 3. [`replay`] - Recorded event scripts for offline runs
//!
//! # Architecture
//!
//! ```text
//! Driver / Channel / Script ──► DeviceSession<Open> ──► SampleFilter
//!                              (one poll per tick)
//! ```
//!
//! A poll never waits: when nothing is pending the source answers
//! [`RawSample::NoEvent`] immediately, which keeps a physics tick bounded.

pub mod event_source;
pub mod replay;
pub mod session;

pub use event_source::{
    ButtonEdge, ChannelDevice, DeviceError, DeviceEventSource, RawSample, ScriptedDevice,
    AXIS_COUNT,
};
pub use session::{Closed, DeviceSession, Open, SessionState};
