/// Receives the dominant-axis value of a tick
pub trait AxisTelemetry: Send {
    fn publish_axis_value(&mut self, axis: usize, value: f64);
}

/// Moves the cut planes of the slice-capable volume
pub trait VolumeSlicer: Send {
    fn slice_volume(&mut self, axis: usize, delta: f64);
}
