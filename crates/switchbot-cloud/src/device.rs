//! Device Descriptors
//!
//! The static record identifying one controllable device and the fixed
//! command to send it. Built once at startup and never mutated.

use crate::error::CloudError;
use crate::Result;
use serde::{Deserialize, Serialize};

/// Default `commandType` for native device commands
pub const DEFAULT_COMMAND_TYPE: &str = "command";

/// Default command parameter
pub const DEFAULT_PARAMETER: &str = "default";

/// One device + command pairing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceDescriptor {
    /// SwitchBot device id (path segment of the command endpoint)
    pub id: String,

    /// Display name shown in status lines
    pub label: String,

    /// Vendor command name, e.g. `turnOn`
    pub command: String,

    /// `command` for native commands, `customize` for IR-relayed ones
    pub command_type: String,

    /// Command argument, `default` when the command takes none
    pub parameter: String,
}

impl DeviceDescriptor {
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        command: impl Into<String>,
        command_type: impl Into<String>,
        parameter: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            command: command.into(),
            command_type: command_type.into(),
            parameter: parameter.into(),
        }
    }

    /// Native command with the default type and parameter
    pub fn native(id: impl Into<String>, label: impl Into<String>, command: impl Into<String>) -> Self {
        Self::new(id, label, command, DEFAULT_COMMAND_TYPE, DEFAULT_PARAMETER)
    }

    /// Name used in status lines, falling back to the id
    pub fn display_name(&self) -> &str {
        if self.label.trim().is_empty() {
            &self.id
        } else {
            &self.label
        }
    }

    /// Check the fields the command endpoint cannot do without.
    ///
    /// `parameter` may legitimately be empty and `label` is cosmetic.
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("id", &self.id),
            ("command", &self.command),
            ("commandType", &self.command_type),
        ];

        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(CloudError::InvalidDescriptor {
                    device_id: self.id.clone(),
                    field,
                });
            }
        }
        Ok(())
    }
}
