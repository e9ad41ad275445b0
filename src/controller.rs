//! SpaceNav controller - one tick of device control
//!
//! Owns the sample filter (and through it the only device session), the
//! target list and the sinks. The host calls [`SpaceNavController::tick`]
//! once per physics step:
//!
//! 1. poll the filter once
//! 2. recompute index and mode from the press counters
//! 3. drive the selected target, or hand the dominant axis to the sinks
//!
//! Nothing in here waits: the device poll returns immediately and scene
//! handles are only locked for the duration of a single strategy call.

use chrono::{DateTime, Duration, Local};
use tracing::{debug, info, warn};

use crate::config::ControlConfig;
use crate::control::{
    dominant_axis, AxisTelemetry, CameraStrategy, ControlStrategy, ObjectStrategy,
    RigidBodyStrategy, VolumeSlicer,
};
use crate::device::DeviceEventSource;
use crate::dispatch::{dispatch, Capabilities, ControlMode, DispatchState, SelectionMode};
use crate::filter::{FilterError, FilteredInput, SampleFilter};
use crate::scene::{read_shared, shared, write_shared, Pose, Shared, TargetRegistry};
use crate::targets::{build_targets, describe_targets, ControllableTarget, TargetHandle};
use crate::volume::SceneVolumeSlicer;

/// Camera whose frame translations are expressed in
pub const REFERENCE_CAMERA: &str = "main_camera";

const STATS_INTERVAL_SECS: i64 = 10;

// Initialization errors
#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("Malformed control object '{0}', expected 'KIND NAME'")]
    MalformedTarget(String),

    #[error("No controllable objects could be resolved")]
    NoTargets,
}

/// Receivers of dominant-axis values; any may be absent
#[derive(Default)]
pub struct ControllerSinks {
    /// Falls back to slicing the slice-capable volume directly
    pub slicer: Option<Box<dyn VolumeSlicer>>,
    pub slicing_telemetry: Option<Box<dyn AxisTelemetry>>,
    pub state_telemetry: Option<Box<dyn AxisTelemetry>>,
}

#[derive(Debug, Default)]
struct TickStats {
    ticks: u64,
    handoffs: u64,
}

pub struct SpaceNavController {
    filter: SampleFilter,
    targets: Vec<ControllableTarget>,
    capabilities: Vec<Capabilities>,
    selection: SelectionMode,
    reference: Shared<Pose>,
    object_strategy: ObjectStrategy,
    rigid_body_strategy: RigidBodyStrategy,
    sinks: ControllerSinks,
    last_dispatch: Option<DispatchState>,
    stats: TickStats,
    last_stats_time: DateTime<Local>,
}

impl SpaceNavController {
    /// Resolves the targets, then opens the device
    ///
    /// A device that cannot be opened leaves the controller disabled but
    /// still returns `Ok`; only an unusable target list is fatal.
    pub fn init(
        config: &ControlConfig,
        registry: &dyn TargetRegistry,
        device: Box<dyn DeviceEventSource>,
        mut sinks: ControllerSinks,
    ) -> Result<Self, InitError> {
        info!("Initializing SpaceNav controller");
        let targets = build_targets(config, registry)?;
        let capabilities = targets.iter().map(|t| t.capabilities).collect();

        let reference = match registry.camera(REFERENCE_CAMERA) {
            Some(camera) => {
                info!("Got camera: {}", REFERENCE_CAMERA);
                camera
            }
            None => match registry.first_camera() {
                Some((name, camera)) => {
                    info!("Got camera: {}", name);
                    camera
                }
                None => {
                    warn!("No camera in scene, translating in world frame");
                    shared(Pose::default())
                }
            },
        };

        if sinks.slicer.is_none() {
            sinks.slicer = targets.iter().find_map(|target| match &target.handle {
                TargetHandle::Volume(volume) if target.capabilities.can_slice => {
                    Some(Box::new(SceneVolumeSlicer::new(volume.clone())) as Box<dyn VolumeSlicer>)
                }
                _ => None,
            });
        }

        let filter = SampleFilter::new(config.filter_settings(), device);
        let scaling = config.velocity_scaling;

        Ok(Self {
            filter,
            targets,
            capabilities,
            selection: config.selection,
            reference,
            object_strategy: ObjectStrategy {
                angular_scale: scaling.angular,
            },
            rigid_body_strategy: RigidBodyStrategy {
                linear_scale: scaling.linear,
            },
            sinks,
            last_dispatch: None,
            stats: TickStats::default(),
            last_stats_time: Local::now(),
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.filter.is_enabled()
    }

    pub fn targets(&self) -> &[ControllableTarget] {
        &self.targets
    }

    pub fn filter(&self) -> &SampleFilter {
        &self.filter
    }

    pub fn last_dispatch(&self) -> Option<DispatchState> {
        self.last_dispatch
    }

    pub fn active_target_name(&self) -> Option<&str> {
        self.last_dispatch
            .and_then(|state| self.targets.get(state.selected_index))
            .map(|target| target.name.as_str())
    }

    /// Runs one control step
    ///
    /// Returns `None` while the device is disabled, in which case nothing
    /// is polled or mutated. An unknown device event aborts the tick before
    /// any target is touched.
    pub fn tick(&mut self) -> Result<Option<DispatchState>, FilterError> {
        if !self.filter.is_enabled() {
            return Ok(None);
        }
        let input = self.filter.poll()?;
        let state = dispatch(self.filter.button_counts(), &self.capabilities, self.selection);
        self.note_dispatch(state);

        match state.mode {
            ControlMode::Normal => self.drive(state.selected_index, &input),
            ControlMode::Slicing => {
                let (axis, value) = dominant_axis(input.translation);
                if let Some(slicer) = self.sinks.slicer.as_mut() {
                    slicer.slice_volume(axis, value);
                }
                if let Some(telemetry) = self.sinks.slicing_telemetry.as_mut() {
                    telemetry.publish_axis_value(axis, value);
                }
                self.stats.handoffs += 1;
            }
            ControlMode::PublishingState => {
                let (axis, value) = dominant_axis(input.translation);
                if let Some(telemetry) = self.sinks.state_telemetry.as_mut() {
                    telemetry.publish_axis_value(axis, value);
                }
                self.stats.handoffs += 1;
            }
        }

        self.stats.ticks += 1;
        self.log_stats();
        Ok(Some(state))
    }

    fn note_dispatch(&mut self, state: DispatchState) {
        if self.last_dispatch == Some(state) {
            return;
        }
        if let Some(target) = self.targets.get(state.selected_index) {
            info!("Active object: {} ({:?})", target.name, state.mode);
        }
        debug!(
            "{}",
            describe_targets(&self.targets, Some(state.selected_index))
        );
        self.last_dispatch = Some(state);
    }

    fn drive(&self, index: usize, input: &FilteredInput) {
        let Some(target) = self.targets.get(index) else {
            return;
        };
        // copied so the reference camera can itself be the target
        let reference = *read_shared(&self.reference);

        match &target.handle {
            TargetHandle::Camera(camera) => {
                CameraStrategy.apply(input, &reference, &mut write_shared(camera));
            }
            TargetHandle::StereoCamera(cameras) => {
                for camera in cameras {
                    CameraStrategy.apply(input, &reference, &mut write_shared(camera));
                }
            }
            TargetHandle::RigidBody(body) => {
                self.rigid_body_strategy
                    .apply(input, &reference, &mut write_shared(body));
            }
            TargetHandle::Object(object) => {
                self.object_strategy
                    .apply(input, &reference, &mut write_shared(object));
            }
            TargetHandle::Volume(volume) => {
                self.object_strategy
                    .apply(input, &reference, &mut write_shared(volume).pose);
            }
        }
    }

    fn log_stats(&mut self) {
        let now = Local::now();
        let elapsed = now - self.last_stats_time;
        if elapsed <= Duration::seconds(STATS_INTERVAL_SECS) {
            return;
        }
        let filter = self.filter.stats();
        info!(
            "Controller stats: {} ticks, {} hand-offs in {} seconds",
            self.stats.ticks,
            self.stats.handoffs,
            elapsed.num_seconds()
        );
        info!(
            "Device: {} polls, {} motion accepted, {} rejected, {} button presses",
            filter.polls, filter.accepted_motion, filter.rejected_motion, filter.button_presses
        );
        self.stats = TickStats::default();
        self.last_stats_time = now;
    }

    /// Closes the device; later ticks do nothing
    pub fn close(&mut self) {
        if self.filter.is_enabled() {
            info!("Closing SpaceNav controller");
        }
        self.filter.close();
    }
}
