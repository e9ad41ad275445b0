//! Telemetry sinks for dominant-axis values
//!
//! The tick never waits on transport: [`ChannelTelemetry`] queues samples
//! with `try_send` and the [`mqtt::MqttPublisher`] task drains the queue.

pub mod mqtt;

use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Local};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::control::AxisTelemetry;

pub use mqtt::{MqttPublisher, MqttSettings, MqttStatus, TelemetryError};

/// Which mode produced a sample
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TelemetryStream {
    Slicing,
    State,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AxisSample {
    pub stream: TelemetryStream,
    pub axis: usize,
    pub value: f64,
    pub timestamp: DateTime<Local>,
}

impl AxisSample {
    pub fn new(stream: TelemetryStream, axis: usize, value: f64) -> Self {
        Self {
            stream,
            axis,
            value,
            timestamp: Local::now(),
        }
    }

    /// Wire form, `"<axis> <value>"`
    pub fn payload(&self) -> String {
        format!("{} {}", self.axis, self.value)
    }
}

/// Forwards samples into a bounded queue without blocking
pub struct ChannelTelemetry {
    stream: TelemetryStream,
    sender: mpsc::Sender<AxisSample>,
    dropped: u64,
}

impl ChannelTelemetry {
    pub fn new(stream: TelemetryStream, sender: mpsc::Sender<AxisSample>) -> Self {
        Self {
            stream,
            sender,
            dropped: 0,
        }
    }

    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

impl AxisTelemetry for ChannelTelemetry {
    fn publish_axis_value(&mut self, axis: usize, value: f64) {
        let sample = AxisSample::new(self.stream, axis, value);
        if let Err(e) = self.sender.try_send(sample) {
            self.dropped += 1;
            // first drop and every hundredth after that
            if self.dropped % 100 == 1 {
                warn!(
                    "Dropping {:?} telemetry ({} so far): {}",
                    self.stream, self.dropped, e
                );
            }
        }
    }
}

/// Logs every value; used when no transport is configured
#[derive(Clone, Copy, Debug)]
pub struct LogTelemetry {
    pub stream: TelemetryStream,
}

impl AxisTelemetry for LogTelemetry {
    fn publish_axis_value(&mut self, axis: usize, value: f64) {
        info!("{:?} axis {} value {:.6}", self.stream, axis, value);
    }
}

/// Keeps every value in memory; clones share the same record
#[derive(Clone, Debug, Default)]
pub struct RecordingTelemetry {
    values: Arc<Mutex<Vec<(usize, f64)>>>,
}

impl RecordingTelemetry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn values(&self) -> Vec<(usize, f64)> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl AxisTelemetry for RecordingTelemetry {
    fn publish_axis_value(&mut self, axis: usize, value: f64) {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((axis, value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_is_axis_then_value() {
        let sample = AxisSample::new(TelemetryStream::Slicing, 1, -0.5);
        assert_eq!(sample.payload(), "1 -0.5");
    }

    #[tokio::test]
    async fn channel_sink_forwards_samples() {
        let (tx, mut rx) = mpsc::channel(4);
        let mut sink = ChannelTelemetry::new(TelemetryStream::State, tx);

        sink.publish_axis_value(2, 0.25);

        let sample = rx.recv().await.unwrap();
        assert_eq!(sample.stream, TelemetryStream::State);
        assert_eq!((sample.axis, sample.value), (2, 0.25));
    }

    #[test]
    fn full_channel_drops_without_blocking() {
        let (tx, _rx) = mpsc::channel(1);
        let mut sink = ChannelTelemetry::new(TelemetryStream::Slicing, tx);

        sink.publish_axis_value(0, 1.0);
        sink.publish_axis_value(0, 2.0);
        sink.publish_axis_value(0, 3.0);

        assert_eq!(sink.dropped(), 2);
    }

    #[test]
    fn closed_channel_counts_as_dropped() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let mut sink = ChannelTelemetry::new(TelemetryStream::Slicing, tx);

        sink.publish_axis_value(1, 1.0);

        assert_eq!(sink.dropped(), 1);
    }

    #[test]
    fn recording_clones_share_values() {
        let recorder = RecordingTelemetry::new();
        let mut sink = recorder.clone();

        sink.publish_axis_value(1, -0.5);

        assert_eq!(recorder.values(), vec![(1, -0.5)]);
    }
}
