//! Recorded device event scripts
//!
//! A script is a TOML file with one `[[event]]` table per entry:
//!
//! ```toml
//! [[event]]
//! kind = "motion"
//! axes = [0, 0, -200, 0, 0, 0]
//!
//! [[event]]
//! kind = "button"
//! index = 0
//!
//! [[event]]
//! kind = "idle"
//! count = 20
//! ```

use std::path::Path;

use color_eyre::{eyre::eyre, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::event_source::{ButtonEdge, RawSample, ScriptedDevice, AXIS_COUNT};

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ScriptEvent {
    Motion {
        axes: [i32; AXIS_COUNT],
    },
    Button {
        index: usize,
        #[serde(default = "default_pressed")]
        pressed: bool,
    },
    Idle {
        count: usize,
    },
}

fn default_pressed() -> bool {
    true
}

#[derive(Deserialize, Serialize, Clone, Debug, Default)]
pub struct ReplayScript {
    #[serde(default, rename = "event")]
    pub events: Vec<ScriptEvent>,
}

impl ReplayScript {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| eyre!("Failed to parse replay script: {}", e))
    }

    pub async fn load(path: &Path) -> Result<Self> {
        info!("Loading replay script {}", path.display());
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| eyre!("Failed to read replay script {}: {}", path.display(), e))?;
        Self::from_toml_str(&content)
    }

    /// Expands the script into the raw samples a driver would report
    pub fn samples(&self) -> Vec<RawSample> {
        let mut samples = Vec::new();
        for event in &self.events {
            match event {
                ScriptEvent::Motion { axes } => samples.push(RawSample::Motion(*axes)),
                ScriptEvent::Button { index, pressed } => {
                    let edge = if *pressed {
                        ButtonEdge::Pressed
                    } else {
                        ButtonEdge::Released
                    };
                    samples.push(RawSample::Button {
                        index: *index,
                        edge,
                    });
                }
                ScriptEvent::Idle { count } => {
                    samples.extend(std::iter::repeat(RawSample::NoEvent).take(*count))
                }
            }
        }
        debug!(
            "Replay script expanded to {} samples from {} events",
            samples.len(),
            self.events.len()
        );
        samples
    }

    pub fn into_device(self, name: impl Into<String>) -> ScriptedDevice {
        ScriptedDevice::new(name, self.samples())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCRIPT: &str = r#"
[[event]]
kind = "motion"
axes = [10, 20, 30, -40, -50, -60]

[[event]]
kind = "button"
index = 1

[[event]]
kind = "button"
index = 1
pressed = false

[[event]]
kind = "idle"
count = 3
"#;

    #[test]
    fn parses_and_expands_script() {
        let script = ReplayScript::from_toml_str(SCRIPT).unwrap();
        assert_eq!(script.events.len(), 4);

        let samples = script.samples();
        assert_eq!(samples.len(), 6);
        assert_eq!(samples[0], RawSample::Motion([10, 20, 30, -40, -50, -60]));
        assert_eq!(
            samples[1],
            RawSample::Button {
                index: 1,
                edge: ButtonEdge::Pressed
            }
        );
        assert_eq!(
            samples[2],
            RawSample::Button {
                index: 1,
                edge: ButtonEdge::Released
            }
        );
        assert!(samples[3..].iter().all(|s| *s == RawSample::NoEvent));
    }

    #[test]
    fn rejects_unknown_kind() {
        let bad = "[[event]]\nkind = \"twist\"\n";
        assert!(ReplayScript::from_toml_str(bad).is_err());
    }
}
