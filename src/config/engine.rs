use super::traits::{ConfigManifest, ConfigSection, FieldManifest};
use crate::error::TinyGpError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How to launch the external search engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Executable path; empty until the caller supplies one.
    pub command: String,
    pub args: Vec<String>,
    /// Upper bound on a whole run. `None` waits indefinitely.
    pub timeout_secs: Option<u64>,
}

impl EngineConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

impl ConfigSection for EngineConfig {
    fn section_name() -> &'static str {
        "engine"
    }

    fn validate(&self) -> Result<(), TinyGpError> {
        if self.timeout_secs == Some(0) {
            return Err(TinyGpError::Configuration(
                "Engine timeout must be at least one second".to_string(),
            ));
        }
        if self.command.is_empty() && !self.args.is_empty() {
            return Err(TinyGpError::Configuration(
                "Engine arguments given without an engine command".to_string(),
            ));
        }
        Ok(())
    }

    fn to_manifest(&self) -> ConfigManifest {
        ConfigManifest {
            section: "Engine".to_string(),
            fields: vec![
                FieldManifest::new(
                    "command",
                    "string",
                    serde_json::json!(self.command),
                    "Search engine executable",
                ),
                FieldManifest::new(
                    "args",
                    "list",
                    serde_json::json!(self.args),
                    "Arguments passed to the engine",
                ),
                FieldManifest::new(
                    "timeout_secs",
                    "integer",
                    serde_json::json!(self.timeout_secs),
                    "Run timeout in seconds, unbounded when absent",
                )
                .bounded(Some(1.0), None),
            ],
        }
    }
}
