//! Desktop Configuration
//!
//! Reads `config.json` once at startup and turns it into the immutable
//! credentials, cloud settings and device panels the rest of the app uses.
//!
//! ```json
//! {
//!   "token": "...",
//!   "secret": "...",
//!   "devices": [
//!     {
//!       "name": "Desk Lamp",
//!       "deviceId": "ABCDEF123456",
//!       "commands": {
//!         "on":  { "commandType": "command", "command": "turnOn", "parameter": "default" },
//!         "off": {}
//!       }
//!     }
//!   ],
//!   "cloud": { "timeoutMs": 10000 }
//! }
//! ```

use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use switchbot_cloud::device::{DEFAULT_COMMAND_TYPE, DEFAULT_PARAMETER};
use switchbot_cloud::{CloudConfig, Credentials, DeviceDescriptor};

/// Environment variable overriding the config file location
pub const CONFIG_ENV: &str = "SWITCHBOT_CONFIG";

const CONFIG_FILE: &str = "config.json";
const UNNAMED_DEVICE: &str = "Unnamed Device";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error(
        "Configuration file {0} not found. Copy config.example.json to config.json \
         and fill in your SwitchBot credentials."
    )]
    NotFound(String),

    #[error("Failed to read {path}: {message}")]
    Unreadable { path: String, message: String },

    #[error("Invalid JSON in {path}: {message}")]
    InvalidJson { path: String, message: String },

    #[error("Missing '{0}' in configuration file")]
    MissingKey(&'static str),

    #[error("'devices' must be a list of device definitions")]
    DevicesNotList,

    #[error("Invalid 'cloud' section: {0}")]
    Cloud(String),
}

/// One action's command settings; every field falls back to a default
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandSpec {
    #[serde(default)]
    pub command_type: Option<String>,
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub parameter: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceEntry {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub device_id: Option<String>,
    #[serde(default)]
    pub commands: BTreeMap<String, CommandSpec>,
}

/// Whole config file
#[derive(Clone, Deserialize)]
pub struct DesktopConfig {
    pub token: String,
    pub secret: String,
    pub devices: Vec<DeviceEntry>,
    #[serde(default)]
    pub cloud: CloudConfig,
}

// credentials print redacted
impl std::fmt::Debug for DesktopConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DesktopConfig")
            .field("credentials", &self.credentials())
            .field("devices", &self.devices)
            .field("cloud", &self.cloud)
            .finish()
    }
}

/// A device as shown in the shell, with one descriptor per configured action
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DevicePanel {
    pub name: String,
    pub device_id: String,
    pub actions: BTreeMap<String, DeviceDescriptor>,
}

impl DevicePanel {
    pub fn descriptor(&self, action: &str) -> Option<&DeviceDescriptor> {
        self.actions.get(&action.to_ascii_lowercase())
    }
}

impl DesktopConfig {
    /// Load and check the config file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let shown = path.display().to_string();
        let text = fs::read_to_string(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => ConfigError::NotFound(shown.clone()),
            _ => ConfigError::Unreadable {
                path: shown.clone(),
                message: e.to_string(),
            },
        })?;
        Self::parse(&text, &shown)
    }

    /// Parse config text; `origin` names the source in error messages
    pub fn parse(text: &str, origin: &str) -> Result<Self, ConfigError> {
        let invalid = |e: serde_json::Error| ConfigError::InvalidJson {
            path: origin.to_string(),
            message: e.to_string(),
        };

        let raw: Value = serde_json::from_str(text).map_err(invalid)?;
        for key in ["token", "secret", "devices"] {
            if raw.get(key).is_none() {
                return Err(ConfigError::MissingKey(key));
            }
        }
        if !raw["devices"].is_array() {
            return Err(ConfigError::DevicesNotList);
        }

        let config: DesktopConfig = serde_json::from_value(raw).map_err(invalid)?;
        config
            .cloud
            .validate()
            .map_err(|e| ConfigError::Cloud(e.to_string()))?;
        Ok(config)
    }

    pub fn credentials(&self) -> Credentials {
        Credentials::new(self.token.clone(), self.secret.clone())
    }

    /// Expand every device x action into a descriptor, in file order
    pub fn panels(&self) -> Vec<DevicePanel> {
        self.devices
            .iter()
            .map(|entry| {
                let name = entry
                    .name
                    .clone()
                    .filter(|n| !n.trim().is_empty())
                    .unwrap_or_else(|| UNNAMED_DEVICE.to_string());
                let device_id = entry.device_id.clone().unwrap_or_default();

                let actions = entry
                    .commands
                    .iter()
                    .map(|(action, spec)| {
                        let action = action.to_ascii_lowercase();
                        let descriptor = DeviceDescriptor::new(
                            device_id.clone(),
                            name.clone(),
                            spec.command
                                .clone()
                                .unwrap_or_else(|| default_command(&action).to_string()),
                            spec.command_type
                                .clone()
                                .unwrap_or_else(|| DEFAULT_COMMAND_TYPE.to_string()),
                            spec.parameter
                                .clone()
                                .unwrap_or_else(|| DEFAULT_PARAMETER.to_string()),
                        );
                        (action, descriptor)
                    })
                    .collect();

                DevicePanel {
                    name,
                    device_id,
                    actions,
                }
            })
            .collect()
    }
}

fn default_command(action: &str) -> &'static str {
    match action {
        "on" => "turnOn",
        "off" => "turnOff",
        _ => "",
    }
}

/// Pick the config file: CLI argument, then `$SWITCHBOT_CONFIG`, then
/// `./config.json`, then the platform config dir.
pub fn resolve_path(cli_arg: Option<String>) -> PathBuf {
    if let Some(arg) = cli_arg {
        return PathBuf::from(arg);
    }
    if let Ok(env_path) = std::env::var(CONFIG_ENV) {
        if !env_path.is_empty() {
            return PathBuf::from(env_path);
        }
    }

    let local = PathBuf::from(CONFIG_FILE);
    if local.exists() {
        return local;
    }

    dirs::config_dir()
        .map(|dir| dir.join("switchbot-desk").join(CONFIG_FILE))
        .filter(|p| p.exists())
        .unwrap_or(local)
}
