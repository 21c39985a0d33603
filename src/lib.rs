//! Filesystem adapter over S3-compatible object storage.
//!
//! [`fs::ObjectFS`] implements the [`filesystem::Filesystem`] contract on top
//! of any [`adapters::ObjectAdapter`]. Disks are described in a TOML file
//! ([`config::StorageConfig`]), built by a [`registry::DriverRegistry`] and
//! reached through the [`facade`].

pub mod adapters;
pub mod config;
mod driver;
pub mod facade;
pub mod filesystem;
pub mod fs;
pub mod model;
pub mod registry;
pub mod util;

pub use filesystem::Filesystem;
pub use model::fs::{FSError, FileInfo, FileType, Visibility, WriteOptions};
