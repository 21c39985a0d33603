use std::{fmt, str::FromStr, time::SystemTime};

use crate::model::fs::FSError;

pub const ALL_USERS_URI: &str = "http://acs.amazonaws.com/groups/global/AllUsers";

/// Object metadata as reported by a HEAD or GET.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObjectHead {
    pub key: String,
    pub content_length: Option<u64>,
    pub content_type: Option<String>,
    pub last_modified: Option<SystemTime>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListedObject {
    pub key: String,
    pub size: u64,
    pub last_modified: Option<SystemTime>,
}

/// One page of a delimited listing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ListPage {
    pub objects: Vec<ListedObject>,
    pub common_prefixes: Vec<String>,
    pub next_marker: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grant {
    pub grantee_uri: Option<String>,
    pub permission: String,
}

impl Grant {
    pub fn grants_public_read(&self) -> bool {
        let everyone = self
            .grantee_uri
            .as_deref()
            .map(|uri| uri == ALL_USERS_URI || uri.ends_with("/Everyone"))
            .unwrap_or(false);

        everyone && (self.permission == "READ" || self.permission == "FULL_CONTROL")
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SignMethod {
    Get,
    Put,
    Delete,
    Head,
}

impl fmt::Display for SignMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let method = match self {
            SignMethod::Get => "GET",
            SignMethod::Put => "PUT",
            SignMethod::Delete => "DELETE",
            SignMethod::Head => "HEAD",
        };
        write!(f, "{}", method)
    }
}

impl FromStr for SignMethod {
    type Err = FSError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(SignMethod::Get),
            "PUT" => Ok(SignMethod::Put),
            "DELETE" => Ok(SignMethod::Delete),
            "HEAD" => Ok(SignMethod::Head),
            other => Err(FSError::Config(format!("unsupported sign method: {}", other))),
        }
    }
}
