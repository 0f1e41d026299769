//! Module configuration
//!
//! Device names, mount names and queue geometry. Every field has the
//! default the module has always used, so an empty JSON object is a
//! valid configuration.

use kernel_api::QUEUE_SLOT_SIZE;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Longest mount name the filesystem engine accepts
pub const MAX_MOUNT_NAME_LEN: usize = 8;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// FAT module configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModuleConfig {
    /// Name of the driver's own control device
    pub control_device: String,
    /// Device name routed to the SD backend
    pub sd_device: String,
    /// Device name routed to the USB backend
    pub usb_device: String,
    /// Mount name for the SD backend
    pub sd_mount_name: String,
    /// Mount name for the USB backend
    pub usb_mount_name: String,
    /// Bytes allocated for the message queue
    pub queue_buffer_size: usize,
    /// Message slots in the queue
    pub queue_capacity: usize,
    /// Bytes per block reported by get-usage
    pub usage_block_size: u64,
}

impl Default for ModuleConfig {
    fn default() -> Self {
        Self {
            control_device: "fat".to_string(),
            sd_device: "sd:".to_string(),
            usb_device: "usb:".to_string(),
            sd_mount_name: "sd".to_string(),
            usb_mount_name: "usb".to_string(),
            queue_buffer_size: 0x80,
            queue_capacity: 32,
            usage_block_size: 0x4000,
        }
    }
}

impl ModuleConfig {
    /// Parses and validates a JSON configuration
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads and validates a JSON configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Device names registered at start-up, all on the same queue
    pub fn device_names(&self) -> [&str; 3] {
        [
            self.control_device.as_str(),
            self.sd_device.as_str(),
            self.usb_device.as_str(),
        ]
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.queue_capacity == 0 {
            return Err(ConfigError::Invalid("queue_capacity must be non-zero".into()));
        }
        if self.usage_block_size == 0 {
            return Err(ConfigError::Invalid(
                "usage_block_size must be non-zero".into(),
            ));
        }
        let needed = self.queue_capacity.saturating_mul(QUEUE_SLOT_SIZE);
        if self.queue_buffer_size < needed {
            return Err(ConfigError::Invalid(format!(
                "queue_buffer_size {} cannot hold {} slots",
                self.queue_buffer_size, self.queue_capacity
            )));
        }

        let mut seen = HashSet::new();
        for device in self.device_names() {
            if device.is_empty() {
                return Err(ConfigError::Invalid("device names must be non-empty".into()));
            }
            if !seen.insert(device) {
                return Err(ConfigError::Invalid(format!(
                    "device name {:?} is used twice",
                    device
                )));
            }
        }

        for mount in [&self.sd_mount_name, &self.usb_mount_name] {
            if mount.is_empty() || mount.len() > MAX_MOUNT_NAME_LEN {
                return Err(ConfigError::Invalid(format!(
                    "mount name {:?} must be 1 to {} bytes",
                    mount, MAX_MOUNT_NAME_LEN
                )));
            }
        }
        if self.sd_mount_name == self.usb_mount_name {
            return Err(ConfigError::Invalid(
                "SD and USB mount names must differ".into(),
            ));
        }

        Ok(())
    }
}
