//! Controllable target list
//!
//! Built once at initialization from the config and the registry, then
//! indexed by the dispatcher. Entries are never added or removed at runtime.

use std::fmt::Write as _;
use std::path::Path;

use tracing::{error, info, warn};

use crate::config::ControlConfig;
use crate::controller::InitError;
use crate::dispatch::Capabilities;
use crate::scene::{ObjectKind, Pose, RigidBodyState, SceneObject, Shared, TargetRegistry, VolumeState};

/// Name of the synthetic entry driving every stereo camera at once
pub const STEREO_CAMERA: &str = "stereo_camera";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TargetKind {
    Camera,
    StereoCamera,
    RigidBody,
    Object,
    Volume,
}

/// Closed set of handles the strategies know how to drive
#[derive(Clone, Debug)]
pub enum TargetHandle {
    Camera(Shared<Pose>),
    StereoCamera(Vec<Shared<Pose>>),
    RigidBody(Shared<RigidBodyState>),
    Object(Shared<Pose>),
    Volume(Shared<VolumeState>),
}

impl TargetHandle {
    pub fn kind(&self) -> TargetKind {
        match self {
            TargetHandle::Camera(_) => TargetKind::Camera,
            TargetHandle::StereoCamera(_) => TargetKind::StereoCamera,
            TargetHandle::RigidBody(_) => TargetKind::RigidBody,
            TargetHandle::Object(_) => TargetKind::Object,
            TargetHandle::Volume(_) => TargetKind::Volume,
        }
    }
}

impl From<SceneObject> for TargetHandle {
    fn from(object: SceneObject) -> Self {
        match object {
            SceneObject::Camera(pose) => TargetHandle::Camera(pose),
            SceneObject::RigidBody(body) => TargetHandle::RigidBody(body),
            SceneObject::Volume(volume) => TargetHandle::Volume(volume),
            SceneObject::Light(pose) | SceneObject::Joint(pose) | SceneObject::Object(pose) => {
                TargetHandle::Object(pose)
            }
        }
    }
}

#[derive(Clone, Debug)]
pub struct ControllableTarget {
    pub name: String,
    pub handle: TargetHandle,
    pub capabilities: Capabilities,
}

impl ControllableTarget {
    pub fn new(name: impl Into<String>, handle: TargetHandle) -> Self {
        Self {
            name: name.into(),
            handle,
            capabilities: Capabilities::default(),
        }
    }

    pub fn kind(&self) -> TargetKind {
        self.handle.kind()
    }
}

/// Splits a `KIND NAME` entry at the first space
///
/// The name may itself contain spaces.
pub fn parse_entry(entry: &str) -> Result<(ObjectKind, &str), InitError> {
    let (kind, name) = entry
        .trim()
        .split_once(' ')
        .ok_or_else(|| InitError::MalformedTarget(entry.to_string()))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(InitError::MalformedTarget(entry.to_string()));
    }
    Ok((ObjectKind::parse(kind), name))
}

/// Resolves the configured targets against the registry
///
/// Unresolved names are reported and left out. Fails only on a malformed
/// entry or when nothing controllable remains.
pub fn build_targets(
    config: &ControlConfig,
    registry: &dyn TargetRegistry,
) -> Result<Vec<ControllableTarget>, InitError> {
    let mut targets = match &config.control_objects {
        Some(entries) => resolve_entries(entries, registry)?,
        None => {
            info!("No control objects configured, using every non-joint object");
            registry
                .objects()
                .into_iter()
                .filter(|(_, object)| object.kind() != ObjectKind::Joint)
                .map(|(name, object)| ControllableTarget::new(name, object.into()))
                .collect()
        }
    };

    if let Some(names) = &config.stereo_camera {
        if let Some(stereo) = stereo_target(names, registry) {
            targets.push(stereo);
        }
    }

    apply_capabilities(config, &mut targets);

    if targets.is_empty() {
        return Err(InitError::NoTargets);
    }
    info!("{}", describe_targets(&targets, None));
    Ok(targets)
}

fn resolve_entries(
    entries: &[String],
    registry: &dyn TargetRegistry,
) -> Result<Vec<ControllableTarget>, InitError> {
    let mut targets = Vec::with_capacity(entries.len());
    for entry in entries {
        let (kind, name) = parse_entry(entry)?;
        info!("Looking for the object \"{}\"", name);
        match registry.lookup(kind, name) {
            Some(object) => targets.push(ControllableTarget::new(name, object.into())),
            None => error!("Could not find object named \"{}\"", name),
        }
    }
    Ok(targets)
}

fn stereo_target(names: &[String], registry: &dyn TargetRegistry) -> Option<ControllableTarget> {
    let cameras: Vec<_> = names
        .iter()
        .filter_map(|name| {
            let camera = registry.camera(name);
            if camera.is_none() {
                error!("Could not find stereo camera \"{}\"", name);
            }
            camera
        })
        .collect();
    if cameras.is_empty() {
        warn!("No stereo camera resolved, skipping {}", STEREO_CAMERA);
        return None;
    }
    Some(ControllableTarget::new(
        STEREO_CAMERA,
        TargetHandle::StereoCamera(cameras),
    ))
}

fn apply_capabilities(config: &ControlConfig, targets: &mut [ControllableTarget]) {
    if let Some(slice) = &config.slice_volume {
        match targets
            .iter_mut()
            .find(|t| t.name == slice.volume_name && t.kind() == TargetKind::Volume)
        {
            Some(target) if matcap_available(&slice.matcap_path) => {
                info!("Volume {} can be sliced", target.name);
                target.capabilities.can_slice = true;
            }
            Some(target) => error!(
                "Matcap {} not found, slicing disabled for {}",
                slice.matcap_path.display(),
                target.name
            ),
            None => warn!(
                "Slice volume {} is not a controllable volume",
                slice.volume_name
            ),
        }
    }

    if let Some(publish) = &config.publish_state {
        match targets.iter_mut().find(|t| t.name == publish.object) {
            Some(target) => {
                info!("Object {} publishes its state", target.name);
                target.capabilities.can_publish_state = true;
            }
            None => warn!(
                "Publish state object {} is not a controllable target",
                publish.object
            ),
        }
    }
}

fn matcap_available(path: &Path) -> bool {
    path.is_file()
}

/// Target list as printed for the operator; `active` gets an arrow
pub fn describe_targets(targets: &[ControllableTarget], active: Option<usize>) -> String {
    let mut text = format!("--- Controllable objects ({}) ---", targets.len());
    for (index, target) in targets.iter().enumerate() {
        let marker = if Some(index) == active { "-> " } else { "" };
        let _ = write!(text, "\n{}{} ({:?})", marker, target.name, target.kind());
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PublishState, SliceVolume};
    use crate::scene::SceneRegistry;
    use cgmath::Vector3;

    fn registry() -> SceneRegistry {
        let mut registry = SceneRegistry::new();
        registry.add_camera("main_camera", Pose::default());
        registry.add_camera("cameraL", Pose::default());
        registry.add_camera("cameraR", Pose::default());
        registry.add_rigid_body("drill", RigidBodyState::at_rest(Pose::default()));
        registry.add_volume(
            "skull",
            VolumeState::centered(Pose::default(), Vector3::new(1.0, 1.0, 1.0)),
        );
        registry.add_joint("hinge", Pose::default());
        registry
    }

    fn config_with(entries: &[&str]) -> ControlConfig {
        ControlConfig {
            control_objects: Some(entries.iter().map(|e| e.to_string()).collect()),
            ..Default::default()
        }
    }

    fn names(targets: &[ControllableTarget]) -> Vec<&str> {
        targets.iter().map(|t| t.name.as_str()).collect()
    }

    #[test]
    fn entries_keep_configured_order() {
        let config = config_with(&["VOLUME skull", "CAMERA main_camera", "BODY drill"]);
        let targets = build_targets(&config, &registry()).unwrap();

        assert_eq!(names(&targets), vec!["skull", "main_camera", "drill"]);
        assert_eq!(targets[0].kind(), TargetKind::Volume);
        assert_eq!(targets[2].kind(), TargetKind::RigidBody);
    }

    #[test]
    fn unresolved_entries_shrink_the_list() {
        let config = config_with(&["CAMERA main_camera", "BODY ghost", "CAMERA drill"]);
        let targets = build_targets(&config, &registry()).unwrap();

        assert_eq!(names(&targets), vec!["main_camera"]);
    }

    #[test]
    fn malformed_entry_aborts() {
        let config = config_with(&["CAMERA main_camera", "drill"]);
        assert!(matches!(
            build_targets(&config, &registry()),
            Err(InitError::MalformedTarget(_))
        ));
    }

    #[test]
    fn nothing_resolved_is_an_error() {
        let config = config_with(&["BODY ghost"]);
        assert!(matches!(
            build_targets(&config, &registry()),
            Err(InitError::NoTargets)
        ));
    }

    #[test]
    fn unknown_kind_looks_up_by_name() {
        let config = config_with(&["OBJECT drill"]);
        let targets = build_targets(&config, &registry()).unwrap();
        assert_eq!(targets[0].kind(), TargetKind::RigidBody);
    }

    #[test]
    fn fallback_skips_joints() {
        let targets = build_targets(&ControlConfig::default(), &registry()).unwrap();
        assert_eq!(
            names(&targets),
            vec!["main_camera", "cameraL", "cameraR", "drill", "skull"]
        );
    }

    #[test]
    fn stereo_entry_is_appended() {
        let mut config = config_with(&["BODY drill"]);
        config.stereo_camera = Some(vec!["cameraL".into(), "missing".into(), "cameraR".into()]);
        let targets = build_targets(&config, &registry()).unwrap();

        assert_eq!(names(&targets), vec!["drill", STEREO_CAMERA]);
        match &targets[1].handle {
            TargetHandle::StereoCamera(cameras) => assert_eq!(cameras.len(), 2),
            other => panic!("unexpected handle {:?}", other),
        }
    }

    #[test]
    fn missing_matcap_withholds_slicing_only() {
        let mut config = config_with(&["VOLUME skull", "BODY drill"]);
        config.slice_volume = Some(SliceVolume {
            volume_name: "skull".into(),
            matcap_path: "/nonexistent/matcap.png".into(),
        });
        config.publish_state = Some(PublishState {
            object: "drill".into(),
        });
        let targets = build_targets(&config, &registry()).unwrap();

        assert!(!targets[0].capabilities.can_slice);
        assert!(targets[1].capabilities.can_publish_state);
    }

    #[test]
    fn existing_matcap_enables_slicing() {
        let matcap = std::env::temp_dir().join(format!("spacenav-matcap-{}.png", std::process::id()));
        std::fs::write(&matcap, b"png").unwrap();

        let mut config = config_with(&["VOLUME skull"]);
        config.slice_volume = Some(SliceVolume {
            volume_name: "skull".into(),
            matcap_path: matcap.clone(),
        });
        let targets = build_targets(&config, &registry()).unwrap();
        std::fs::remove_file(&matcap).unwrap();

        assert!(targets[0].capabilities.can_slice);
    }

    #[test]
    fn description_marks_active_target() {
        let targets = build_targets(&config_with(&["CAMERA main_camera", "BODY drill"]), &registry())
            .unwrap();
        let text = describe_targets(&targets, Some(1));
        assert!(text.contains("-> drill"));
        assert!(!text.contains("-> main_camera"));
    }
}
