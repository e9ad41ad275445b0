use std::path::PathBuf;
use std::time::Duration;

use cgmath::Vector3;
use clap::Parser;
use color_eyre::{eyre::eyre, Result};
use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use spacenav_control::config::ControlConfig;
use spacenav_control::device::replay::{ReplayScript, ScriptEvent};
use spacenav_control::scene::registry::log_registry;
use spacenav_control::scene::{integrate_bodies, Pose, RigidBodyState, SceneRegistry, VolumeState};
use spacenav_control::telemetry::{
    ChannelTelemetry, LogTelemetry, MqttPublisher, MqttSettings, TelemetryStream,
};
use spacenav_control::{ControllerSinks, SpaceNavController};

/// Drives a demo scene with a SpaceNav device replay
#[derive(Parser, Debug)]
#[command(name = "spacenav-sim", version)]
struct Cli {
    /// Control config (TOML); defaults to the per-user config if present
    #[arg(long)]
    spf: Option<PathBuf>,

    /// Device event script (TOML); a short built-in demo otherwise
    #[arg(long)]
    replay: Option<PathBuf>,

    /// Physics ticks to run
    #[arg(long, default_value_t = 600)]
    ticks: u64,

    /// Physics step in milliseconds
    #[arg(long, default_value_t = 16)]
    dt_ms: u64,

    /// MQTT broker as HOST[:PORT] for slicing and state telemetry
    #[arg(long)]
    mqtt: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    setup()?;
    let cli = Cli::parse();

    let config = ControlConfig::load_or_default(cli.spf.as_deref()).await?;
    let registry = demo_scene();
    log_registry(&registry);

    let script = match &cli.replay {
        Some(path) => ReplayScript::load(path).await?,
        None => demo_script(),
    };
    let device = script.into_device("spacenav-replay");

    let (sinks, publisher) = telemetry_sinks(cli.mqtt.as_deref())?;
    let mut controller = SpaceNavController::init(&config, &registry, Box::new(device), sinks)
        .map_err(|e| eyre!("Failed to initialize SpaceNav controller: {}", e))?;

    let dt = Duration::from_millis(cli.dt_ms.max(1));
    let mut interval = tokio::time::interval(dt);
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    info!("Running {} ticks of {} ms", cli.ticks, dt.as_millis());
    for _ in 0..cli.ticks {
        tokio::select! {
            _ = interval.tick() => {}
            _ = &mut shutdown => {
                info!("Interrupted, shutting down");
                break;
            }
        }
        if let Err(e) = controller.tick() {
            error!("Tick aborted: {}", e);
        }
        integrate_bodies(&registry, dt.as_secs_f64());
    }

    controller.close();
    if let Some(name) = controller.active_target_name() {
        info!("Last active object: {}", name);
    }
    log_registry(&registry);

    // dropping the controller closes the telemetry queues
    drop(controller);
    if let Some(publisher) = publisher {
        let status = publisher.status();
        info!(
            "MQTT {:?}, {} messages sent before shutdown",
            status.connection_state, status.messages_sent
        );
        let status = publisher.shutdown(Duration::from_secs(2)).await;
        match status.last_activity {
            Some(at) => info!(
                "Published {} telemetry messages, last at {}",
                status.messages_sent,
                at.format("%H:%M:%S%.3f")
            ),
            None => info!("No telemetry was published"),
        }
    }
    Ok(())
}

fn setup() -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info")
    }
    setup_logging_env();
    Ok(())
}

fn setup_logging_env() {
    FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_file(true)
        .with_line_number(true)
        .pretty()
        .init();
}

fn telemetry_sinks(mqtt: Option<&str>) -> Result<(ControllerSinks, Option<MqttPublisher>)> {
    let Some(server) = mqtt else {
        let sinks = ControllerSinks {
            slicer: None,
            slicing_telemetry: Some(Box::new(LogTelemetry {
                stream: TelemetryStream::Slicing,
            })),
            state_telemetry: Some(Box::new(LogTelemetry {
                stream: TelemetryStream::State,
            })),
        };
        return Ok((sinks, None));
    };

    let (tx, rx) = mpsc::channel(256);
    let publisher = MqttPublisher::spawn(MqttSettings::new(server), rx)
        .map_err(|e| eyre!("Failed to start telemetry publisher: {}", e))?;
    let sinks = ControllerSinks {
        slicer: None,
        slicing_telemetry: Some(Box::new(ChannelTelemetry::new(
            TelemetryStream::Slicing,
            tx.clone(),
        ))),
        state_telemetry: Some(Box::new(ChannelTelemetry::new(TelemetryStream::State, tx))),
    };
    Ok((sinks, Some(publisher)))
}

fn demo_scene() -> SceneRegistry {
    let mut registry = SceneRegistry::new();
    registry.add_camera("main_camera", Pose::at(Vector3::new(2.0, 0.0, 0.5)));
    registry.add_camera("cameraL", Pose::at(Vector3::new(2.0, -0.03, 0.5)));
    registry.add_camera("cameraR", Pose::at(Vector3::new(2.0, 0.03, 0.5)));
    registry.add_light("light_1", Pose::at(Vector3::new(0.0, 0.0, 3.0)));
    registry.add_rigid_body(
        "drill",
        RigidBodyState::at_rest(Pose::at(Vector3::new(0.0, 0.3, 0.0))),
    );
    registry.add_volume(
        "skull",
        VolumeState::centered(Pose::default(), Vector3::new(0.5, 0.5, 0.5)),
    );
    registry.add_joint("drill-hinge", Pose::default());
    registry
}

/// Pushes forward, then steps the selection and pulls back
fn demo_script() -> ReplayScript {
    let push = ScriptEvent::Motion {
        axes: [0, 0, -200, 0, 0, 0],
    };
    let pull = ScriptEvent::Motion {
        axes: [0, 0, 200, 0, 0, 0],
    };
    let press = ScriptEvent::Button {
        index: 0,
        pressed: true,
    };
    ReplayScript {
        events: vec![
            push,
            ScriptEvent::Idle { count: 60 },
            press.clone(),
            press,
            pull,
            ScriptEvent::Idle { count: 60 },
        ],
    }
}
