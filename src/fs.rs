use std::time::{Duration, SystemTime};

use time::OffsetDateTime;
use tracing::{error, info};

use crate::{adapters, config, model, util};

pub const MAX_KEYS: i32 = 1000;
pub const DELIMITER: &str = "/";
pub const DEFAULT_MIMETYPE: &str = "application/octet-stream";
pub const DEFAULT_CHUNK_SIZE: usize = 65536;

/// Everything found under one listing prefix, pages exhausted.
#[derive(Debug, Default)]
pub struct Listing {
    pub objects: Vec<model::s3::ListedObject>,
    pub prefixes: Vec<String>,
}

/// Filesystem view of one bucket.
///
/// Configuration is fixed once built: the `with_*` methods consume the value
/// and there are no setters.
pub struct ObjectFS {
    client: Box<dyn adapters::adapter::ObjectAdapter>,
    bucket: String,
    endpoint: String,
    ssl_verify: bool,
    cdn_domain: Option<String>,
    prefix: util::object::PathPrefix,
    chunk_size: usize,
    list_metadata: bool,
}

impl ObjectFS {
    pub fn new(client: Box<dyn adapters::adapter::ObjectAdapter>, bucket: &str) -> Self {
        Self {
            client,
            bucket: bucket.to_string(),
            endpoint: String::new(),
            ssl_verify: false,
            cdn_domain: None,
            prefix: util::object::PathPrefix::default(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            list_metadata: false,
        }
    }

    pub fn from_config(
        client: Box<dyn adapters::adapter::ObjectAdapter>,
        disk: &config::DiskConfig,
    ) -> Self {
        Self::new(client, &disk.bucket)
            .with_endpoint(&disk.endpoint, disk.ssl_verify)
            .with_cdn_domain(disk.cdn_domain.as_deref())
            .with_prefix(disk.prefix.as_deref())
            .with_chunk_size(disk.options.chunk_size)
            .with_list_metadata(disk.options.list_metadata)
    }

    /// An explicit `http://` or `https://` on the endpoint wins over the
    /// `ssl_verify` flag.
    pub fn with_endpoint(mut self, endpoint: &str, ssl_verify: bool) -> Self {
        let (host, scheme_ssl) = util::object::parse_endpoint(endpoint);
        self.endpoint = host;
        self.ssl_verify = scheme_ssl.unwrap_or(ssl_verify);
        self
    }

    pub fn with_cdn_domain(mut self, cdn_domain: Option<&str>) -> Self {
        self.cdn_domain = cdn_domain
            .map(|domain| domain.trim())
            .filter(|domain| !domain.is_empty())
            .map(|domain| domain.to_string());
        self
    }

    pub fn with_prefix(mut self, prefix: Option<&str>) -> Self {
        self.prefix = util::object::PathPrefix::new(prefix);
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Listed files get one metadata call each to fill in their mimetype.
    pub fn with_list_metadata(mut self, list_metadata: bool) -> Self {
        self.list_metadata = list_metadata;
        self
    }

    pub fn list_metadata(&self) -> bool {
        self.list_metadata
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn client(&self) -> &dyn adapters::adapter::ObjectAdapter {
        self.client.as_ref()
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn ssl_verify(&self) -> bool {
        self.ssl_verify
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn prefix(&self) -> &util::object::PathPrefix {
        &self.prefix
    }

    pub fn key(&self, path: &str) -> String {
        self.prefix.apply(path)
    }

    pub fn copy_source(&self, path: &str) -> String {
        format!("{}/{}", self.bucket, self.key(path))
    }

    pub fn mimetype_for(&self, path: &str, options: &model::fs::WriteOptions) -> String {
        if let Some(mimetype) = &options.mimetype {
            return mimetype.clone();
        }

        mime_guess::from_path(path)
            .first_raw()
            .unwrap_or(DEFAULT_MIMETYPE)
            .to_string()
    }

    pub fn normalize_head(&self, head: &model::s3::ObjectHead) -> model::fs::FileInfo {
        let path = self.prefix.remove(&head.key);
        if path.ends_with('/') {
            let mut info = model::fs::FileInfo::dir(path);
            info.timestamp = head.last_modified.and_then(unix_secs);
            return info;
        }

        model::fs::FileInfo {
            kind: model::fs::FileType::File,
            path: path.to_string(),
            timestamp: head.last_modified.and_then(unix_secs),
            size: head.content_length,
            mimetype: head.content_type.clone(),
        }
    }

    pub fn normalize_listed(&self, object: &model::s3::ListedObject) -> model::fs::FileInfo {
        model::fs::FileInfo {
            kind: model::fs::FileType::File,
            path: self.prefix.remove(&object.key).to_string(),
            timestamp: object.last_modified.and_then(unix_secs),
            size: Some(object.size),
            mimetype: None,
        }
    }

    /// Lists `dir_key` page by page until the store stops handing out a
    /// marker. With `recursive`, every common prefix found is listed the same
    /// way once the current prefix is exhausted.
    pub fn list_dir_objects(
        &self,
        dir_key: &str,
        recursive: bool,
    ) -> Result<Listing, model::fs::FSError> {
        let mut listing = Listing::default();
        let mut marker: Option<String> = None;

        loop {
            let page = match self.client.fs_list_objects(
                &self.bucket,
                dir_key,
                Some(DELIMITER),
                marker.as_deref(),
                MAX_KEYS,
            ) {
                Err(err) => {
                    error!(error_message=%err, error_group="list_objects");
                    return Err(err);
                }
                Ok(page) => page,
            };

            listing.objects.extend(
                page.objects
                    .into_iter()
                    .filter(|o| !o.key.is_empty() && o.key != dir_key),
            );
            listing.prefixes.extend(page.common_prefixes);

            marker = page.next_marker;
            if marker.is_none() {
                break;
            }
        }

        info!(
            prefix = dir_key,
            objects = listing.objects.len(),
            prefixes = listing.prefixes.len(),
            "listed"
        );

        if recursive {
            let children = listing.prefixes.clone();
            for child in children {
                let nested = self.list_dir_objects(&child, recursive)?;
                listing.objects.extend(nested.objects);
                listing.prefixes.extend(nested.prefixes);
            }
        }

        Ok(listing)
    }

    pub fn public_url(&self, path: &str) -> String {
        let key = self.key(path);
        let key = key.trim_start_matches('/');

        if let Some(cdn_domain) = &self.cdn_domain {
            return format!("{}/{}", cdn_domain.trim_end_matches('/'), key);
        }

        format!(
            "{}://{}.{}/{}",
            util::object::scheme(self.ssl_verify),
            self.bucket,
            self.endpoint,
            key
        )
    }
}

pub fn unix_secs(time: SystemTime) -> Option<i64> {
    time.duration_since(SystemTime::UNIX_EPOCH)
        .ok()
        .map(|d| d.as_secs() as i64)
}

/// Seconds between now and an absolute expiration.
pub fn expires_in(expiration: OffsetDateTime) -> Result<Duration, model::fs::FSError> {
    let remaining = expiration - OffsetDateTime::now_utc();
    if !remaining.is_positive() {
        return Err(model::fs::FSError::Config(format!(
            "expiration is not in the future: {}",
            expiration
        )));
    }

    Ok(Duration::from_secs(remaining.whole_seconds().max(1) as u64))
}
