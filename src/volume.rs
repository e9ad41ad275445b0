//! Slicing of a registry volume along one axis
//!
//! The visible region stays symmetric about the volume origin: slicing
//! moves both cut planes of an axis together and shrinks the texture
//! window around its centre to match.

use cgmath::Vector3;
use tracing::{debug, error, warn};

use crate::control::VolumeSlicer;
use crate::scene::{read_shared, write_shared, Shared, VolumeState};

/// Smallest half extent a slice may reach
pub const MIN_HALF_EXTENT: f64 = 0.01;

pub struct SceneVolumeSlicer {
    volume: Shared<VolumeState>,
    original_max: Vector3<f64>,
    texture_scale: Vector3<f64>,
}

impl SceneVolumeSlicer {
    /// Captures the current bounds as the unsliced extent
    pub fn new(volume: Shared<VolumeState>) -> Self {
        let (original_max, texture_scale) = {
            let state = read_shared(&volume);
            let extent = state.max_corner - state.min_corner;
            let window = state.max_texture_coord - state.min_texture_coord;
            let mut scale = Vector3::new(0.0, 0.0, 0.0);
            for axis in 0..3 {
                if extent[axis].abs() > f64::EPSILON {
                    scale[axis] = window[axis] / extent[axis];
                } else {
                    warn!("Volume has no extent along axis {}", axis);
                }
            }
            (state.max_corner, scale)
        };
        debug!(
            "Volume slicer: max corner {:?}, texture scale {:?}",
            original_max, texture_scale
        );
        Self {
            volume,
            original_max,
            texture_scale,
        }
    }
}

impl VolumeSlicer for SceneVolumeSlicer {
    fn slice_volume(&mut self, axis: usize, delta: f64) {
        if axis > 2 {
            error!("Cannot slice volume along axis {}", axis);
            return;
        }
        let mut volume = write_shared(&self.volume);
        let upper = self.original_max[axis].max(MIN_HALF_EXTENT);
        let value = (volume.max_corner[axis] + delta).clamp(MIN_HALF_EXTENT, upper);
        let scale = self.texture_scale[axis];

        volume.max_corner[axis] = value;
        volume.min_corner[axis] = -value;
        volume.max_texture_coord[axis] = 0.5 + value * scale;
        volume.min_texture_coord[axis] = 0.5 - value * scale;
        debug!("Sliced axis {} to half extent {:.4}", axis, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{shared, Pose};

    const EPS: f64 = 1e-12;

    fn unit_volume() -> Shared<VolumeState> {
        shared(VolumeState::centered(
            Pose::default(),
            Vector3::new(1.0, 2.0, 0.5),
        ))
    }

    #[test]
    fn slicing_shrinks_both_planes_and_texture() {
        let volume = unit_volume();
        let mut slicer = SceneVolumeSlicer::new(volume.clone());

        slicer.slice_volume(1, -0.5);

        let state = read_shared(&volume);
        assert!((state.max_corner.y - 1.5).abs() < EPS);
        assert!((state.min_corner.y + 1.5).abs() < EPS);
        // texture window 1.0 over extent 4.0
        assert!((state.max_texture_coord.y - (0.5 + 1.5 * 0.25)).abs() < EPS);
        assert!((state.min_texture_coord.y - (0.5 - 1.5 * 0.25)).abs() < EPS);
        assert_eq!(state.max_corner.x, 1.0);
    }

    #[test]
    fn slicing_clamps_to_original_and_minimum() {
        let volume = unit_volume();
        let mut slicer = SceneVolumeSlicer::new(volume.clone());

        slicer.slice_volume(0, 5.0);
        assert_eq!(read_shared(&volume).max_corner.x, 1.0);

        slicer.slice_volume(0, -5.0);
        assert_eq!(read_shared(&volume).max_corner.x, MIN_HALF_EXTENT);
        assert_eq!(read_shared(&volume).min_corner.x, -MIN_HALF_EXTENT);
    }

    #[test]
    fn unsliced_volume_keeps_full_texture() {
        let volume = unit_volume();
        let mut slicer = SceneVolumeSlicer::new(volume.clone());

        slicer.slice_volume(2, 0.0);

        let state = read_shared(&volume);
        assert!((state.max_texture_coord.z - 1.0).abs() < EPS);
        assert!(state.min_texture_coord.z.abs() < EPS);
    }

    #[test]
    fn invalid_axis_is_ignored() {
        let volume = unit_volume();
        let before = *read_shared(&volume);
        let mut slicer = SceneVolumeSlicer::new(volume.clone());

        slicer.slice_volume(3, 0.5);

        assert_eq!(*read_shared(&volume), before);
    }
}
