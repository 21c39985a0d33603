/// Splits a configured endpoint into its host part and the TLS choice implied
/// by an explicit scheme, if any.
pub fn parse_endpoint(endpoint: &str) -> (String, Option<bool>) {
    let endpoint = endpoint.trim();

    let (host, ssl) = if let Some(rest) = endpoint.strip_prefix("http://") {
        (rest, Some(false))
    } else if let Some(rest) = endpoint.strip_prefix("https://") {
        (rest, Some(true))
    } else {
        (endpoint, None)
    };

    (host.trim_end_matches('/').to_string(), ssl)
}

pub fn scheme(ssl: bool) -> &'static str {
    if ssl {
        "https"
    } else {
        "http"
    }
}

/// Normalizes a directory path into a listing prefix: `a/b` -> `a/b/`.
/// The root stays empty.
pub fn dir_key(path: &str) -> String {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        return String::new();
    }

    format!("{}/", trimmed)
}

/// Key prefix shared by every object of a disk.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PathPrefix {
    prefix: String,
}

impl PathPrefix {
    pub fn new(prefix: Option<&str>) -> Self {
        Self {
            prefix: prefix.map(dir_key).unwrap_or_default(),
        }
    }

    pub fn apply(&self, path: &str) -> String {
        format!("{}{}", self.prefix, path.trim_start_matches('/'))
    }

    pub fn remove<'a>(&self, key: &'a str) -> &'a str {
        key.strip_prefix(self.prefix.as_str())
            .unwrap_or(key)
            .trim_start_matches('/')
    }
}
