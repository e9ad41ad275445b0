use std::path::PathBuf;

use spacenav_control::config::ControlConfig;
use spacenav_control::device::replay::ReplayScript;
use spacenav_control::dispatch::SelectionMode;
use spacenav_control::filter::IdleReset;

fn demo(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("demos").join(name)
}

#[tokio::test]
async fn demo_config_loads() {
    let config = ControlConfig::load(&demo("control.toml")).await.unwrap();

    assert_eq!(config.control_objects.as_ref().map(Vec::len), Some(4));
    assert_eq!(config.selection, SelectionMode::DualButton);
    assert_eq!(config.idle_reset, IdleReset::OnMotion);
    assert_eq!(config.filter_settings().deadbound[0], 0.0001);
    assert_eq!(config.publish_state.unwrap().object, "drill");
}

#[tokio::test]
async fn demo_replay_expands() {
    let script = ReplayScript::load(&demo("replay.toml")).await.unwrap();

    assert_eq!(script.events.len(), 11);
    assert_eq!(script.samples().len(), 30 + 30 + 10 + 8);
}
