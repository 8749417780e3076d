use std::path::Path;

use serde::{Deserialize, Serialize};

use schemashift_core::ChangeKind;

use crate::{CliError, CliResult};

/// Config file looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG: &str = "schemashift.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub log: LogSettings,
    pub diff: DiffSettings,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// Filter directive used when `RUST_LOG` is unset.
    pub level: String,
    pub format: LogFormat,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: LogFormat::Text,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffSettings {
    /// Change kinds always removed from diffs and plans.
    pub skip: Vec<ChangeKind>,
}

/// Load settings from `path`, or from [`DEFAULT_CONFIG`] when it exists.
pub fn load_settings(path: Option<&Path>) -> CliResult<Settings> {
    match path {
        Some(path) => {
            if !path.exists() {
                return Err(CliError::InvalidConfig(format!(
                    "config file {} does not exist",
                    path.display()
                )));
            }
            parse_settings(&std::fs::read_to_string(path)?)
        }
        None => {
            let path = Path::new(DEFAULT_CONFIG);
            if path.exists() {
                parse_settings(&std::fs::read_to_string(path)?)
            } else {
                Ok(Settings::default())
            }
        }
    }
}

pub fn parse_settings(content: &str) -> CliResult<Settings> {
    Ok(toml::from_str(content)?)
}
