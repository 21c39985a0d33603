use std::{
    collections::BTreeMap,
    sync::{Arc, OnceLock},
};

use tracing::info;

use crate::{
    config::StorageConfig, filesystem::Filesystem, model::fs::FSError, registry::DriverRegistry,
};

static STORAGE: OnceLock<Storage> = OnceLock::new();

/// Resolved disks, keyed by name.
pub struct Storage {
    default: String,
    disks: BTreeMap<String, Arc<dyn Filesystem>>,
}

impl Storage {
    pub fn new(default: &str) -> Self {
        Self {
            default: default.to_string(),
            disks: BTreeMap::new(),
        }
    }

    pub fn with_disk(mut self, name: &str, disk: Arc<dyn Filesystem>) -> Self {
        self.disks.insert(name.to_string(), disk);
        self
    }

    pub fn from_config(config: &StorageConfig, registry: &DriverRegistry) -> Result<Self, FSError> {
        config.validate()?;

        let mut storage = Self::new(&config.default);
        for (name, disk) in &config.disks {
            let resolved = registry
                .resolve(disk)
                .map_err(|err| FSError::Config(format!("disk {}: {}", name, err)))?;
            info!(disk = name.as_str(), driver = disk.driver.as_str(), "resolved");
            storage.disks.insert(name.clone(), resolved);
        }

        Ok(storage)
    }

    pub fn disk(&self, name: &str) -> Result<Arc<dyn Filesystem>, FSError> {
        self.disks
            .get(name)
            .cloned()
            .ok_or_else(|| FSError::Config(format!("disk is not configured: {}", name)))
    }

    pub fn default_disk(&self) -> Result<Arc<dyn Filesystem>, FSError> {
        self.disk(&self.default)
    }

    pub fn names(&self) -> Vec<&str> {
        self.disks.keys().map(|name| name.as_str()).collect()
    }
}

/// Installs the process-wide storage. Only the first call wins.
pub fn init(storage: Storage) -> Result<(), FSError> {
    STORAGE
        .set(storage)
        .map_err(|_| FSError::Config("storage facade is already initialized".to_string()))
}

fn storage() -> Result<&'static Storage, FSError> {
    STORAGE
        .get()
        .ok_or_else(|| FSError::Config("storage facade is not initialized".to_string()))
}

pub fn disk(name: &str) -> Result<Arc<dyn Filesystem>, FSError> {
    storage()?.disk(name)
}

pub fn default_disk() -> Result<Arc<dyn Filesystem>, FSError> {
    storage()?.default_disk()
}
