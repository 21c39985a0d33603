use std::{io::Read, time::Duration};

use time::OffsetDateTime;

use crate::model::{
    fs::{FSError, FileInfo, ReadResult, ReadStream, Visibility, WriteOptions},
    s3::SignMethod,
};

/// Generic filesystem contract a storage driver fulfils.
///
/// Paths are relative to the disk: a configured prefix is applied on the
/// way in and stripped from everything handed back.
pub trait Filesystem: Send + Sync {
    fn write(
        &self,
        path: &str,
        contents: &[u8],
        options: &WriteOptions,
    ) -> Result<FileInfo, FSError>;

    fn write_stream(
        &self,
        path: &str,
        reader: &mut dyn Read,
        options: &WriteOptions,
    ) -> Result<FileInfo, FSError>;

    fn update(
        &self,
        path: &str,
        contents: &[u8],
        options: &WriteOptions,
    ) -> Result<FileInfo, FSError> {
        self.write(path, contents, options)
    }

    fn update_stream(
        &self,
        path: &str,
        reader: &mut dyn Read,
        options: &WriteOptions,
    ) -> Result<FileInfo, FSError> {
        self.write_stream(path, reader, options)
    }

    /// Copy, then delete the source. A failed copy leaves the source alone;
    /// a failed delete leaves both objects behind.
    fn rename(&self, from: &str, to: &str) -> Result<(), FSError> {
        self.copy(from, to)?;
        self.delete(from)
    }

    fn copy(&self, from: &str, to: &str) -> Result<(), FSError>;

    fn delete(&self, path: &str) -> Result<(), FSError>;

    fn delete_dir(&self, dirname: &str) -> Result<(), FSError>;

    fn create_dir(&self, dirname: &str, options: &WriteOptions) -> Result<FileInfo, FSError>;

    fn set_visibility(&self, path: &str, visibility: Visibility) -> Result<Visibility, FSError>;

    fn has(&self, path: &str) -> Result<bool, FSError>;

    fn read(&self, path: &str) -> Result<ReadResult, FSError>;

    fn read_stream(&self, path: &str) -> Result<ReadStream, FSError>;

    fn list_contents(&self, directory: &str, recursive: bool) -> Result<Vec<FileInfo>, FSError>;

    fn get_metadata(&self, path: &str) -> Result<FileInfo, FSError>;

    fn get_size(&self, path: &str) -> Result<u64, FSError>;

    fn get_mimetype(&self, path: &str) -> Result<String, FSError>;

    fn get_timestamp(&self, path: &str) -> Result<i64, FSError>;

    fn get_visibility(&self, path: &str) -> Result<Visibility, FSError>;

    fn sign_url(
        &self,
        path: &str,
        expires_in: Duration,
        method: SignMethod,
    ) -> Result<String, FSError>;

    fn temporary_url(&self, path: &str, expiration: OffsetDateTime) -> Result<String, FSError>;

    fn get_url(&self, path: &str) -> String;
}
