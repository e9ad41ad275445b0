use cgmath::{InnerSpace, Matrix3, Rad};
use tracing::{debug, info};

use super::{read_shared, shared, write_shared, Pose, RigidBodyState, Shared, VolumeState};

/// Kind prefix of a `KIND NAME` control object entry
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Camera,
    Light,
    Volume,
    Body,
    Joint,
    /// Any other prefix: looked up by name across every kind
    Any,
}

impl ObjectKind {
    pub fn parse(prefix: &str) -> Self {
        match prefix {
            "CAMERA" => ObjectKind::Camera,
            "LIGHT" => ObjectKind::Light,
            "VOLUME" => ObjectKind::Volume,
            "BODY" => ObjectKind::Body,
            "JOINT" => ObjectKind::Joint,
            _ => ObjectKind::Any,
        }
    }
}

/// Live handle to one registry object
#[derive(Clone, Debug)]
pub enum SceneObject {
    Camera(Shared<Pose>),
    Light(Shared<Pose>),
    RigidBody(Shared<RigidBodyState>),
    Volume(Shared<VolumeState>),
    Joint(Shared<Pose>),
    Object(Shared<Pose>),
}

impl SceneObject {
    pub fn kind(&self) -> ObjectKind {
        match self {
            SceneObject::Camera(_) => ObjectKind::Camera,
            SceneObject::Light(_) => ObjectKind::Light,
            SceneObject::RigidBody(_) => ObjectKind::Body,
            SceneObject::Volume(_) => ObjectKind::Volume,
            SceneObject::Joint(_) => ObjectKind::Joint,
            SceneObject::Object(_) => ObjectKind::Any,
        }
    }
}

/// Resolves object names and kinds to live handles
pub trait TargetRegistry {
    fn lookup(&self, kind: ObjectKind, name: &str) -> Option<SceneObject>;

    /// Every object in registration order
    fn objects(&self) -> Vec<(String, SceneObject)>;

    fn camera(&self, name: &str) -> Option<Shared<Pose>> {
        match self.lookup(ObjectKind::Camera, name) {
            Some(SceneObject::Camera(handle)) => Some(handle),
            _ => None,
        }
    }

    fn first_camera(&self) -> Option<(String, Shared<Pose>)> {
        self.objects()
            .into_iter()
            .find_map(|(name, object)| match object {
                SceneObject::Camera(handle) => Some((name, handle)),
                _ => None,
            })
    }
}

#[derive(Debug, Default)]
pub struct SceneRegistry {
    objects: Vec<(String, SceneObject)>,
}

impl SceneRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&mut self, name: &str, object: SceneObject) {
        debug!("Registering {:?} {}", object.kind(), name);
        self.objects.retain(|(existing, _)| existing != name);
        self.objects.push((name.to_string(), object));
    }

    pub fn add_camera(&mut self, name: &str, pose: Pose) -> Shared<Pose> {
        let handle = shared(pose);
        self.insert(name, SceneObject::Camera(handle.clone()));
        handle
    }

    pub fn add_light(&mut self, name: &str, pose: Pose) -> Shared<Pose> {
        let handle = shared(pose);
        self.insert(name, SceneObject::Light(handle.clone()));
        handle
    }

    pub fn add_joint(&mut self, name: &str, pose: Pose) -> Shared<Pose> {
        let handle = shared(pose);
        self.insert(name, SceneObject::Joint(handle.clone()));
        handle
    }

    pub fn add_object(&mut self, name: &str, pose: Pose) -> Shared<Pose> {
        let handle = shared(pose);
        self.insert(name, SceneObject::Object(handle.clone()));
        handle
    }

    pub fn add_rigid_body(&mut self, name: &str, body: RigidBodyState) -> Shared<RigidBodyState> {
        let handle = shared(body);
        self.insert(name, SceneObject::RigidBody(handle.clone()));
        handle
    }

    pub fn add_volume(&mut self, name: &str, volume: VolumeState) -> Shared<VolumeState> {
        let handle = shared(volume);
        self.insert(name, SceneObject::Volume(handle.clone()));
        handle
    }

    pub fn rigid_bodies(&self) -> impl Iterator<Item = &Shared<RigidBodyState>> {
        self.objects.iter().filter_map(|(_, object)| match object {
            SceneObject::RigidBody(handle) => Some(handle),
            _ => None,
        })
    }
}

impl TargetRegistry for SceneRegistry {
    fn lookup(&self, kind: ObjectKind, name: &str) -> Option<SceneObject> {
        self.objects
            .iter()
            .find(|(existing, object)| {
                existing == name && (kind == ObjectKind::Any || object.kind() == kind)
            })
            .map(|(_, object)| object.clone())
    }

    fn objects(&self) -> Vec<(String, SceneObject)> {
        self.objects.clone()
    }
}

/// Advances every rigid body by its commanded velocities
///
/// Stands in for the physics engine of the host: velocities are world-frame,
/// angular velocity in radians per second.
pub fn integrate_bodies(registry: &SceneRegistry, dt: f64) {
    for handle in registry.rigid_bodies() {
        let mut body = write_shared(handle);
        let linear = body.linear_velocity;
        body.pose.position += linear * dt;

        let angular = body.angular_velocity;
        let speed = angular.magnitude();
        if speed > f64::EPSILON {
            let delta = Matrix3::from_axis_angle(angular / speed, Rad(speed * dt));
            body.pose.orientation = delta * body.pose.orientation;
        }
    }
}

/// Logs the registry contents, one object per line
pub fn log_registry(registry: &dyn TargetRegistry) {
    let objects = registry.objects();
    info!("------------ Scene objects ({}) ------------", objects.len());
    for (name, object) in &objects {
        let position = match object {
            SceneObject::Camera(h)
            | SceneObject::Light(h)
            | SceneObject::Joint(h)
            | SceneObject::Object(h) => read_shared(h).position,
            SceneObject::RigidBody(h) => read_shared(h).pose.position,
            SceneObject::Volume(h) => read_shared(h).pose.position,
        };
        info!(
            "{:?} {} at ({:.3}, {:.3}, {:.3})",
            object.kind(),
            name,
            position.x,
            position.y,
            position.z
        );
    }
}
