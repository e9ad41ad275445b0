//! Per-kind control strategies
//!
//! Each strategy maps the filtered command onto one kind of target. The
//! reference pose is the camera the operator looks through; translations
//! are expressed in its frame so the device always feels view-relative.

use cgmath::Vector3;

use super::frames::{extrinsic_euler_deg, rotation_inverse, EulerOrder};
use crate::filter::FilteredInput;
use crate::scene::{Pose, RigidBodyState};

pub trait ControlStrategy {
    type Target;

    fn apply(&self, input: &FilteredInput, reference: &Pose, target: &mut Self::Target);
}

/// Moves a camera in its own frame
///
/// The reference pose is not used; a camera is its own reference.
#[derive(Clone, Copy, Debug, Default)]
pub struct CameraStrategy;

impl ControlStrategy for CameraStrategy {
    type Target = Pose;

    fn apply(&self, input: &FilteredInput, _reference: &Pose, camera: &mut Pose) {
        camera.position += camera.orientation * input.translation;
        let rotation = extrinsic_euler_deg(input.rotation, EulerOrder::Zyx);
        camera.orientation = camera.orientation * rotation;
    }
}

/// Moves and turns a free object relative to the reference camera
#[derive(Clone, Copy, Debug)]
pub struct ObjectStrategy {
    pub angular_scale: f64,
}

impl ControlStrategy for ObjectStrategy {
    type Target = Pose;

    fn apply(&self, input: &FilteredInput, reference: &Pose, object: &mut Pose) {
        object.position += reference.orientation * input.translation;

        let a = self.angular_scale;
        let angles = Vector3::new(
            -a * input.rotation.x,
            -a * input.rotation.y,
            a * input.rotation.z,
        );
        let delta = extrinsic_euler_deg(angles, EulerOrder::Xyz);
        let camera = reference.orientation;
        let delta = rotation_inverse(&camera) * delta * camera;
        object.orientation = delta * object.orientation;
    }
}

/// Commands body velocities; the pose belongs to the physics step
#[derive(Clone, Copy, Debug)]
pub struct RigidBodyStrategy {
    pub linear_scale: f64,
}

impl ControlStrategy for RigidBodyStrategy {
    type Target = RigidBodyState;

    fn apply(&self, input: &FilteredInput, reference: &Pose, body: &mut RigidBodyState) {
        body.linear_velocity = (reference.orientation * input.translation) * self.linear_scale;
        // angular velocity is deliberately left unscaled
        body.angular_velocity = Vector3::new(
            -input.rotation.x,
            -input.rotation.y,
            input.rotation.z,
        );
    }
}
