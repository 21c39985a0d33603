use std::{fmt, str::FromStr};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FSError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("transient failure: {0}")]
    Transient(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl FSError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, FSError::NotFound(_))
    }

    pub fn group(&self) -> &'static str {
        match self {
            FSError::NotFound(_) => "not_found",
            FSError::PermissionDenied(_) => "permission_denied",
            FSError::Transient(_) => "transient",
            FSError::Config(_) => "config",
            FSError::Io(_) => "io",
            FSError::Other(_) => "other",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileType {
    File,
    Dir,
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileType::File => f.pad("file"),
            FileType::Dir => f.pad("dir"),
        }
    }
}

/// Normalized description of a stored object or virtual directory.
///
/// `path` never carries the disk prefix or a leading slash, and directory
/// paths never carry a trailing slash.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileInfo {
    pub kind: FileType,
    pub path: String,
    pub timestamp: Option<i64>,
    pub size: Option<u64>,
    pub mimetype: Option<String>,
}

impl FileInfo {
    pub fn dir(path: &str) -> Self {
        Self {
            kind: FileType::Dir,
            path: path.trim_end_matches('/').to_string(),
            timestamp: None,
            size: None,
            mimetype: None,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == FileType::Dir
    }

    pub fn is_file(&self) -> bool {
        self.kind == FileType::File
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Visibility {
    Private,
    PublicRead,
}

impl Visibility {
    /// Canned ACL name understood by the object store.
    pub fn as_acl(&self) -> &'static str {
        match self {
            Visibility::Private => "private",
            Visibility::PublicRead => "public-read",
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Visibility::Private => f.pad("private"),
            Visibility::PublicRead => f.pad("public"),
        }
    }
}

impl FromStr for Visibility {
    type Err = FSError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "private" => Ok(Visibility::Private),
            "public" | "public-read" => Ok(Visibility::PublicRead),
            other => Err(FSError::Config(format!("unknown visibility: {}", other))),
        }
    }
}

/// Per-call options for writes.
#[derive(Clone, Debug, Default)]
pub struct WriteOptions {
    pub visibility: Option<Visibility>,
    pub mimetype: Option<String>,
}

impl WriteOptions {
    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = Some(visibility);
        self
    }

    pub fn with_mimetype(mut self, mimetype: &str) -> Self {
        self.mimetype = Some(mimetype.to_string());
        self
    }
}

pub struct ReadResult {
    pub info: FileInfo,
    pub contents: Vec<u8>,
}

pub struct ReadStream {
    pub path: String,
    pub stream: Box<dyn std::io::Read + Send>,
}
