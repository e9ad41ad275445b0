use std::collections::VecDeque;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Number of raw axes reported per motion sample (tx, ty, tz, rx, ry, rz)
pub const AXIS_COUNT: usize = 6;

// Edge of a button transition
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ButtonEdge {
    Pressed,
    Released,
}

/// One polled device event
///
/// `Unknown` carries the raw kind code of an event the driver reported but
/// this crate has no mapping for. Receiving one is an invariant violation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RawSample {
    NoEvent,
    Motion([i32; AXIS_COUNT]),
    Button { index: usize, edge: ButtonEdge },
    Unknown(u32),
}

// Device errors
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    #[error("Could not open the space navigator device: {0}")]
    OpenFailed(String),

    #[error("Device channel disconnected: {0}")]
    Disconnected(String),
}

/// Non-blocking source of raw device events
///
/// Implementations must return from [`poll_event`](Self::poll_event)
/// immediately, answering [`RawSample::NoEvent`] when nothing is pending.
pub trait DeviceEventSource: Send {
    /// Human readable device name for logs
    fn name(&self) -> &str;

    fn open(&mut self) -> Result<(), DeviceError>;

    fn poll_event(&mut self) -> RawSample;

    fn close(&mut self);
}

/// Device replaying a fixed queue of samples
///
/// Once the queue is drained every poll reports [`RawSample::NoEvent`].
#[derive(Debug, Default)]
pub struct ScriptedDevice {
    name: String,
    pending: VecDeque<RawSample>,
    fail_open: bool,
    is_open: bool,
}

impl ScriptedDevice {
    pub fn new(name: impl Into<String>, samples: impl IntoIterator<Item = RawSample>) -> Self {
        Self {
            name: name.into(),
            pending: samples.into_iter().collect(),
            fail_open: false,
            is_open: false,
        }
    }

    /// A device whose open always fails, as when no spacenav daemon runs
    pub fn unavailable(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fail_open: true,
            ..Default::default()
        }
    }
}

impl DeviceEventSource for ScriptedDevice {
    fn name(&self) -> &str {
        &self.name
    }

    fn open(&mut self) -> Result<(), DeviceError> {
        if self.fail_open {
            return Err(DeviceError::OpenFailed(format!(
                "{} is not available",
                self.name
            )));
        }
        self.is_open = true;
        debug!(
            "Scripted device {} opened with {} queued samples",
            self.name,
            self.pending.len()
        );
        Ok(())
    }

    fn poll_event(&mut self) -> RawSample {
        if !self.is_open {
            return RawSample::NoEvent;
        }
        self.pending.pop_front().unwrap_or(RawSample::NoEvent)
    }

    fn close(&mut self) {
        self.is_open = false;
    }
}

/// Device fed by another task through an mpsc channel
///
/// The receiver is drained with `try_recv`, so a poll never waits on the
/// producer.
#[derive(Debug)]
pub struct ChannelDevice {
    name: String,
    receiver: mpsc::Receiver<RawSample>,
    disconnect_reported: bool,
}

impl ChannelDevice {
    pub fn new(name: impl Into<String>, receiver: mpsc::Receiver<RawSample>) -> Self {
        Self {
            name: name.into(),
            receiver,
            disconnect_reported: false,
        }
    }
}

impl DeviceEventSource for ChannelDevice {
    fn name(&self) -> &str {
        &self.name
    }

    fn open(&mut self) -> Result<(), DeviceError> {
        if self.receiver.is_closed() && self.receiver.is_empty() {
            return Err(DeviceError::Disconnected(format!(
                "no producer attached to {}",
                self.name
            )));
        }
        info!("Channel device {} opened", self.name);
        Ok(())
    }

    fn poll_event(&mut self) -> RawSample {
        match self.receiver.try_recv() {
            Ok(sample) => sample,
            Err(mpsc::error::TryRecvError::Empty) => RawSample::NoEvent,
            Err(mpsc::error::TryRecvError::Disconnected) => {
                if !self.disconnect_reported {
                    warn!("Device channel {} disconnected, reporting idle", self.name);
                    self.disconnect_reported = true;
                }
                RawSample::NoEvent
            }
        }
    }

    fn close(&mut self) {
        self.receiver.close();
    }
}
