//! Device Session - lifecycle of the single device handle
//!
//! The handle is opened once during initialization, polled once per tick and
//! closed exactly once during teardown. The typestate makes polling a closed
//! handle, or closing it twice, a compile error. The session owns its source
//! by value, so whoever holds the `DeviceSession` is its only user.

use chrono::{DateTime, Local};
use statum::{machine, state};
use tracing::{debug, info, warn};

use super::event_source::{DeviceError, DeviceEventSource, RawSample};

#[state]
#[derive(Debug, Clone)]
pub enum SessionState {
    Closed,
    Open,
}

#[machine]
pub struct DeviceSession<S: SessionState> {
    // Underlying event source
    source: Box<dyn DeviceEventSource>,

    // Time the handle was opened
    opened_at: Option<DateTime<Local>>,

    // Number of polls since open
    polls: u64,
}

impl<S: SessionState> DeviceSession<S> {
    pub fn device_name(&self) -> &str {
        self.source.name()
    }
}

impl DeviceSession<Closed> {
    pub fn create(source: Box<dyn DeviceEventSource>) -> Self {
        debug!("Creating device session for {}", source.name());
        Self::new(source, None, 0)
    }

    /// Opens the device and transitions to the Open state
    ///
    /// The session is consumed on failure; there is no retry.
    pub fn open(mut self) -> Result<DeviceSession<Open>, DeviceError> {
        info!("> Initializing SpaceNav device {}", self.source.name());
        match self.source.open() {
            Ok(()) => {
                let now = Local::now();
                info!(
                    "Device {} opened at {}",
                    self.source.name(),
                    now.format("%H:%M:%S.%3f")
                );
                self.opened_at = Some(now);
                self.polls = 0;
                Ok(self.transition())
            }
            Err(e) => {
                warn!("Could not open the space navigator device: {}", e);
                Err(e)
            }
        }
    }
}

impl DeviceSession<Open> {
    pub fn poll(&mut self) -> RawSample {
        self.polls += 1;
        self.source.poll_event()
    }

    pub fn polls(&self) -> u64 {
        self.polls
    }

    pub fn close(mut self) -> DeviceSession<Closed> {
        self.source.close();
        match self.opened_at {
            Some(opened_at) => info!(
                "Device {} closed after {} polls (open since {})",
                self.source.name(),
                self.polls,
                opened_at.format("%H:%M:%S")
            ),
            None => info!("Device {} closed", self.source.name()),
        }
        self.opened_at = None;
        self.transition()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::ScriptedDevice;

    #[test]
    fn open_poll_close_cycle() {
        let device = ScriptedDevice::new("script", [RawSample::Motion([5; 6])]);
        let mut session = DeviceSession::create(Box::new(device)).open().unwrap();

        assert_eq!(session.poll(), RawSample::Motion([5; 6]));
        assert_eq!(session.poll(), RawSample::NoEvent);
        assert_eq!(session.polls(), 2);

        let closed = session.close();
        assert_eq!(closed.device_name(), "script");
    }

    #[test]
    fn failed_open_reports_error() {
        let session = DeviceSession::create(Box::new(ScriptedDevice::unavailable("gone")));
        assert!(session.open().is_err());
    }
}
