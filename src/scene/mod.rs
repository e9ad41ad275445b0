//! In-memory scene acting as the target registry
//!
//! The registry owns every object; the control core only keeps shared
//! handles and mutates the pose or velocity fields of the selected one.
//! Other subsystems may hold the same handles.

pub mod registry;

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use cgmath::{Matrix3, SquareMatrix, Vector3, Zero};
use tracing::warn;

pub use registry::{integrate_bodies, ObjectKind, SceneObject, SceneRegistry, TargetRegistry};

/// Shared, registry-owned handle
pub type Shared<T> = Arc<RwLock<T>>;

pub fn shared<T>(value: T) -> Shared<T> {
    Arc::new(RwLock::new(value))
}

pub fn read_shared<T>(handle: &Shared<T>) -> RwLockReadGuard<'_, T> {
    handle.read().unwrap_or_else(|poisoned| {
        warn!("Recovering poisoned scene handle for read");
        PoisonError::into_inner(poisoned)
    })
}

pub fn write_shared<T>(handle: &Shared<T>) -> RwLockWriteGuard<'_, T> {
    handle.write().unwrap_or_else(|poisoned| {
        warn!("Recovering poisoned scene handle for write");
        PoisonError::into_inner(poisoned)
    })
}

/// Local position and orientation of a scene object
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pose {
    pub position: Vector3<f64>,
    pub orientation: Matrix3<f64>,
}

impl Pose {
    pub fn new(position: Vector3<f64>, orientation: Matrix3<f64>) -> Self {
        Self {
            position,
            orientation,
        }
    }

    pub fn at(position: Vector3<f64>) -> Self {
        Self::new(position, Matrix3::identity())
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::at(Vector3::zero())
    }
}

/// Physics-driven body; pose is integrated by the physics step only
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RigidBodyState {
    pub pose: Pose,
    pub linear_velocity: Vector3<f64>,
    pub angular_velocity: Vector3<f64>,
}

impl RigidBodyState {
    pub fn at_rest(pose: Pose) -> Self {
        Self {
            pose,
            linear_velocity: Vector3::zero(),
            angular_velocity: Vector3::zero(),
        }
    }
}

/// Voxel volume with its visible bounds and texture window
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VolumeState {
    pub pose: Pose,
    pub max_corner: Vector3<f64>,
    pub min_corner: Vector3<f64>,
    pub max_texture_coord: Vector3<f64>,
    pub min_texture_coord: Vector3<f64>,
}

impl VolumeState {
    /// Volume centred on its origin with half extent `half_extent` and the
    /// full texture mapped across it
    pub fn centered(pose: Pose, half_extent: Vector3<f64>) -> Self {
        Self {
            pose,
            max_corner: half_extent,
            min_corner: -half_extent,
            max_texture_coord: Vector3::new(1.0, 1.0, 1.0),
            min_texture_coord: Vector3::zero(),
        }
    }
}
