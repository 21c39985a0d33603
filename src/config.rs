use std::{collections::BTreeMap, path::Path};

use serde::Deserialize;

use crate::model::fs::FSError;

pub const OBS_DRIVER: &str = "obs";
pub const MEMORY_DRIVER: &str = "memory";

/// Disks by name plus the one used when no name is given.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_disk")]
    pub default: String,
    pub disks: BTreeMap<String, DiskConfig>,
}

fn default_disk() -> String {
    OBS_DRIVER.to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct DiskConfig {
    pub driver: String,
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub secret: String,
    #[serde(default)]
    pub endpoint: String,
    #[serde(default)]
    pub bucket: String,
    #[serde(default)]
    pub ssl_verify: bool,
    #[serde(default)]
    pub cdn_domain: Option<String>,
    #[serde(default)]
    pub prefix: Option<String>,
    #[serde(default)]
    pub options: ClientOptions,
}

/// Tuning handed to the SDK client as-is.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ClientOptions {
    pub max_retry_count: u32,
    /// seconds
    pub socket_timeout: u64,
    /// seconds
    pub connect_timeout: u64,
    pub chunk_size: usize,
    pub region: String,
    pub path_style: bool,
    /// Fetch each listed file's metadata so list entries carry a mimetype.
    pub list_metadata: bool,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            max_retry_count: 3,
            socket_timeout: 60,
            connect_timeout: 60,
            chunk_size: 65536,
            region: "us-east-1".to_string(),
            path_style: false,
            list_metadata: false,
        }
    }
}

impl StorageConfig {
    pub fn load(path: &Path) -> Result<Self, FSError> {
        let content = std::fs::read_to_string(path).map_err(|err| {
            FSError::Config(format!("failed to read {}: {}", path.display(), err))
        })?;

        let config = Self::parse(&content).map_err(|err| {
            FSError::Config(format!("failed to load {}: {}", path.display(), err))
        })?;

        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self, FSError> {
        let config: StorageConfig =
            toml::from_str(content).map_err(|err| FSError::Config(err.to_string()))?;
        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), FSError> {
        if self.disks.is_empty() {
            return Err(FSError::Config("at least one disk must be configured".to_string()));
        }
        if !self.disks.contains_key(&self.default) {
            return Err(FSError::Config(format!(
                "default disk is not configured: {}",
                self.default
            )));
        }
        for (name, disk) in &self.disks {
            disk.validate()
                .map_err(|err| FSError::Config(format!("disk {}: {}", name, err)))?;
        }

        Ok(())
    }

    pub fn disk(&self, name: &str) -> Result<&DiskConfig, FSError> {
        self.disks
            .get(name)
            .ok_or_else(|| FSError::Config(format!("disk is not configured: {}", name)))
    }
}

impl DiskConfig {
    pub fn validate(&self) -> Result<(), FSError> {
        if self.driver.is_empty() {
            return Err(FSError::Config("driver must not be empty".to_string()));
        }
        if self.options.chunk_size == 0 {
            return Err(FSError::Config("chunk_size must be greater than zero".to_string()));
        }
        if self.driver != OBS_DRIVER {
            return Ok(());
        }

        let required = [
            ("key", &self.key),
            ("secret", &self.secret),
            ("endpoint", &self.endpoint),
            ("bucket", &self.bucket),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(FSError::Config(format!("{} must not be empty", field)));
            }
        }

        Ok(())
    }
}
