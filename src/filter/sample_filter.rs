//! Sample Filter - per-axis denoising with idle hysteresis
//!
//! Holds the current translation/rotation command between polls. A motion
//! event overwrites both vectors wholesale; idle polls may zero individual
//! components whose magnitude stays below that axis' deadbound. Values are
//! never blended.

use cgmath::{Vector3, Zero};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::device::{
    ButtonEdge, DeviceEventSource, DeviceSession, Open, RawSample, AXIS_COUNT,
};

/// Full-scale factor of the device: 0.001 per 512 raw units
pub const FULL_SCALE: f64 = 0.001 / 512.0;

/// Raw magnitude a motion axis must stay below to be accepted
pub const DEFAULT_DEVICE_RANGE: i32 = 510;

/// When the idle streak is reset
///
/// `EveryIdlePoll` reproduces the historical behaviour where every idle poll
/// resets the streak right after comparing it, so only thresholds of 0 ever
/// trigger the clamp. `OnMotion` counts idle polls since the last accepted
/// motion sample.
#[derive(Deserialize, Serialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum IdleReset {
    #[default]
    EveryIdlePoll,
    OnMotion,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FilterSettings {
    /// Per-axis scale, output order (tx, ty, tz, rx, ry, rz)
    pub axis_scale: [f64; AXIS_COUNT],

    /// Per-axis noise threshold, output order
    pub deadbound: [f64; AXIS_COUNT],

    /// Idle polls tolerated before the deadbound clamp is considered
    pub idle_threshold: u32,

    pub idle_reset: IdleReset,

    /// Exclusive bound on raw axis magnitudes
    pub device_range: i32,

    /// Number of buttons with press counters
    pub button_slots: usize,
}

impl Default for FilterSettings {
    fn default() -> Self {
        let translation_scale = 0.5 * FULL_SCALE;
        let rotation_scale = 50.0 * FULL_SCALE;
        Self {
            axis_scale: [
                translation_scale,
                translation_scale,
                translation_scale,
                rotation_scale,
                rotation_scale,
                rotation_scale,
            ],
            deadbound: [0.1; AXIS_COUNT],
            idle_threshold: 100,
            idle_reset: IdleReset::default(),
            device_range: DEFAULT_DEVICE_RANGE,
            button_slots: 2,
        }
    }
}

/// Denoised command produced by one poll
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FilteredInput {
    pub translation: Vector3<f64>,
    pub rotation: Vector3<f64>,
}

impl FilteredInput {
    pub fn zero() -> Self {
        Self {
            translation: Vector3::zero(),
            rotation: Vector3::zero(),
        }
    }
}

impl Default for FilteredInput {
    fn default() -> Self {
        Self::zero()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FilterStats {
    pub polls: u64,
    pub accepted_motion: u64,
    pub rejected_motion: u64,
    pub button_presses: u64,
}

// Filter errors
#[derive(Debug, thiserror::Error)]
pub enum FilterError {
    #[error("Unknown message type {0} in spacenav. This should never happen.")]
    UnknownEventKind(u32),
}

enum DeviceLink {
    Active(DeviceSession<Open>),
    Disabled,
}

pub struct SampleFilter {
    settings: FilterSettings,
    link: DeviceLink,
    translation: Vector3<f64>,
    rotation: Vector3<f64>,
    idle_streak: u32,
    button_counts: Vec<u64>,
    stats: FilterStats,
}

impl SampleFilter {
    /// Opens the device and builds the filter
    ///
    /// A device that fails to open leaves the filter disabled; every poll
    /// then returns the zero command.
    pub fn new(settings: FilterSettings, device: Box<dyn DeviceEventSource>) -> Self {
        let link = match DeviceSession::create(device).open() {
            Ok(session) => {
                info!("SUCCESSFULLY Initialized SpaceNav.");
                DeviceLink::Active(session)
            }
            Err(e) => {
                warn!("INFO! Could not initialize SpaceNav: {}", e);
                DeviceLink::Disabled
            }
        };
        let button_counts = vec![0; settings.button_slots];
        debug!("Sample filter settings: {:?}", settings);

        Self {
            settings,
            link,
            translation: Vector3::zero(),
            rotation: Vector3::zero(),
            idle_streak: 0,
            button_counts,
            stats: FilterStats::default(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self.link, DeviceLink::Active(_))
    }

    pub fn current(&self) -> FilteredInput {
        FilteredInput {
            translation: self.translation,
            rotation: self.rotation,
        }
    }

    pub fn button_counts(&self) -> &[u64] {
        &self.button_counts
    }

    pub fn idle_streak(&self) -> u32 {
        self.idle_streak
    }

    pub fn stats(&self) -> &FilterStats {
        &self.stats
    }

    /// Queries the device once and folds the result into the filter state
    pub fn poll(&mut self) -> Result<FilteredInput, FilterError> {
        let sample = match &mut self.link {
            DeviceLink::Active(session) => session.poll(),
            DeviceLink::Disabled => return Ok(FilteredInput::zero()),
        };
        self.stats.polls += 1;
        self.apply(sample)?;
        Ok(self.current())
    }

    fn apply(&mut self, sample: RawSample) -> Result<(), FilterError> {
        match sample {
            RawSample::NoEvent => self.on_idle(),
            RawSample::Motion(raw) => self.on_motion(raw),
            RawSample::Button { index, edge } => self.on_button(index, edge),
            RawSample::Unknown(kind) => {
                error!("Unknown message type {} in spacenav", kind);
                return Err(FilterError::UnknownEventKind(kind));
            }
        }
        Ok(())
    }

    fn on_idle(&mut self) {
        self.idle_streak = self.idle_streak.saturating_add(1);
        if self.idle_streak > self.settings.idle_threshold {
            let deadbound = &self.settings.deadbound;
            for axis in 0..3 {
                if self.translation[axis].abs() < deadbound[axis] {
                    self.translation[axis] = 0.0;
                }
                if self.rotation[axis].abs() < deadbound[axis + 3] {
                    self.rotation[axis] = 0.0;
                }
            }
        }
        if self.settings.idle_reset == IdleReset::EveryIdlePoll {
            self.idle_streak = 0;
        }
    }

    fn on_motion(&mut self, raw: [i32; AXIS_COUNT]) {
        let range = self.settings.device_range;
        if raw.iter().any(|value| value.abs() >= range) {
            debug!("Discarding out-of-range motion sample {:?}", raw);
            self.stats.rejected_motion += 1;
            return;
        }
        let (translation, rotation) = remap_motion(raw, &self.settings.axis_scale);
        self.translation = translation;
        self.rotation = rotation;
        if self.settings.idle_reset == IdleReset::OnMotion {
            self.idle_streak = 0;
        }
        self.stats.accepted_motion += 1;
    }

    fn on_button(&mut self, index: usize, edge: ButtonEdge) {
        if edge != ButtonEdge::Pressed {
            return;
        }
        match self.button_counts.get_mut(index) {
            Some(count) => {
                *count += 1;
                self.stats.button_presses += 1;
                info!("Button {} pressed ({} presses)", index, count);
            }
            None => warn!("Ignoring press of untracked button {}", index),
        }
    }

    /// Closes the device; the filter stays disabled afterwards
    pub fn close(&mut self) {
        match std::mem::replace(&mut self.link, DeviceLink::Disabled) {
            DeviceLink::Active(session) => {
                let _closed = session.close();
            }
            DeviceLink::Disabled => debug!("Device already closed or never opened"),
        }
    }
}

/// Maps raw device axes onto the output frame
///
/// Raw (x, y, z, rx, ry, rz) becomes translation (-z, x, y) and rotation
/// (rz, -rx, ry), each scaled by its output axis entry.
pub fn remap_motion(
    raw: [i32; AXIS_COUNT],
    scale: &[f64; AXIS_COUNT],
) -> (Vector3<f64>, Vector3<f64>) {
    let [x, y, z, rx, ry, rz] = raw.map(f64::from);
    let translation = Vector3::new(-z * scale[0], x * scale[1], y * scale[2]);
    let rotation = Vector3::new(rz * scale[3], -rx * scale[4], ry * scale[5]);
    (translation, rotation)
}
