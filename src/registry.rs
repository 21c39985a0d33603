use std::{collections::HashMap, sync::Arc, time::Duration};

use aws_config::{retry::RetryConfig, timeout::TimeoutConfig, BehaviorVersion};
use aws_sdk_s3::config::{Credentials, Region};
use tracing::{info, span, Level};

use crate::{
    adapters,
    config::{self, DiskConfig},
    filesystem::Filesystem,
    fs,
    model::fs::FSError,
    util,
};

pub type DriverFactory =
    Box<dyn Fn(&DiskConfig) -> Result<Arc<dyn Filesystem>, FSError> + Send + Sync>;

/// Named driver resolvers; a disk picks one through its `driver` field.
pub struct DriverRegistry {
    drivers: HashMap<String, DriverFactory>,
}

impl Default for DriverRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl DriverRegistry {
    pub fn empty() -> Self {
        Self {
            drivers: HashMap::new(),
        }
    }

    /// `obs` talks to an S3-compatible endpoint, `memory` keeps everything in
    /// process.
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();

        registry.extend(config::OBS_DRIVER, |disk| {
            let client = s3_client(disk);
            let driver: Arc<dyn Filesystem> =
                Arc::new(fs::ObjectFS::from_config(Box::new(client), disk));
            Ok(driver)
        });

        registry.extend(config::MEMORY_DRIVER, |disk| {
            let client = adapters::mock::MockClient::new();
            let driver: Arc<dyn Filesystem> =
                Arc::new(fs::ObjectFS::from_config(Box::new(client), disk));
            Ok(driver)
        });

        registry
    }

    /// Registers `factory` under `name`, replacing any previous one.
    pub fn extend<F>(&mut self, name: &str, factory: F)
    where
        F: Fn(&DiskConfig) -> Result<Arc<dyn Filesystem>, FSError> + Send + Sync + 'static,
    {
        self.drivers.insert(name.to_string(), Box::new(factory));
    }

    pub fn has_driver(&self, name: &str) -> bool {
        self.drivers.contains_key(name)
    }

    pub fn resolve(&self, disk: &DiskConfig) -> Result<Arc<dyn Filesystem>, FSError> {
        let span = span!(Level::INFO, "resolve", context = "resolve");
        let _e = span.enter();
        info!(driver = %disk.driver, bucket = %disk.bucket, "called");

        disk.validate()?;

        let factory = self
            .drivers
            .get(&disk.driver)
            .ok_or_else(|| FSError::Config(format!("unknown storage driver: {}", disk.driver)))?;

        factory(disk)
    }
}

pub fn endpoint_url(disk: &DiskConfig) -> String {
    let (host, scheme_ssl) = util::object::parse_endpoint(&disk.endpoint);
    let ssl = scheme_ssl.unwrap_or(disk.ssl_verify);

    format!("{}://{}", util::object::scheme(ssl), host)
}

/// The first try plus `max_retry_count` retries.
pub fn max_attempts(options: &config::ClientOptions) -> u32 {
    options.max_retry_count.saturating_add(1)
}

/// Builds one SDK client from the disk's credentials and tuning. Retries,
/// timeouts and request signing all stay inside the SDK.
pub fn s3_client(disk: &DiskConfig) -> aws_sdk_s3::Client {
    let options = &disk.options;

    let credentials = Credentials::new(&disk.key, &disk.secret, None, None, "obsfs-disk");
    let retry = RetryConfig::standard().with_max_attempts(max_attempts(options));
    let timeouts = TimeoutConfig::builder()
        .connect_timeout(Duration::from_secs(options.connect_timeout))
        .read_timeout(Duration::from_secs(options.socket_timeout))
        .build();

    let sdk_config = util::poll::poll_until_ready(
        aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(options.region.clone()))
            .endpoint_url(endpoint_url(disk))
            .credentials_provider(credentials)
            .retry_config(retry)
            .timeout_config(timeouts)
            .load(),
    );

    let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
        .force_path_style(options.path_style)
        .build();

    aws_sdk_s3::Client::from_conf(s3_config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientOptions;
    use crate::model::fs::WriteOptions;

    fn disk(driver: &str, endpoint: &str, ssl_verify: bool) -> DiskConfig {
        DiskConfig {
            driver: driver.to_string(),
            key: "AK".to_string(),
            secret: "SK".to_string(),
            endpoint: endpoint.to_string(),
            bucket: "media".to_string(),
            ssl_verify,
            cdn_domain: None,
            prefix: None,
            options: ClientOptions::default(),
        }
    }

    #[test]
    fn test_endpoint_url() {
        let cases = vec![
            ("obs.example.com", false, "http://obs.example.com"),
            ("obs.example.com", true, "https://obs.example.com"),
            ("http://obs.example.com/", true, "http://obs.example.com"),
            ("https://obs.example.com", false, "https://obs.example.com"),
        ];

        for (endpoint, ssl_verify, expected) in cases {
            assert_eq!(
                endpoint_url(&disk("obs", endpoint, ssl_verify)),
                expected,
                "failed for case: {}",
                endpoint
            );
        }
    }

    #[test]
    fn test_max_attempts() {
        let cases = vec![(0, 1), (3, 4), (u32::MAX, u32::MAX)];

        for (retries, expected) in cases {
            let options = ClientOptions {
                max_retry_count: retries,
                ..ClientOptions::default()
            };
            assert_eq!(max_attempts(&options), expected, "failed for case: {}", retries);
        }
    }

    #[test]
    fn test_resolve_memory() {
        let registry = DriverRegistry::with_defaults();
        let fs = registry
            .resolve(&disk("memory", "obs.example.com", true))
            .unwrap();

        fs.write("a.txt", b"x", &WriteOptions::default()).unwrap();
        assert!(fs.has("a.txt").unwrap());
        assert_eq!(fs.get_url("a.txt"), "https://media.obs.example.com/a.txt");
    }

    #[test]
    fn test_resolve_errors() {
        let registry = DriverRegistry::with_defaults();

        let mut missing_key = disk("obs", "obs.example.com", true);
        missing_key.key = String::new();

        let cases = vec![
            ("unknown driver", disk("ftp", "obs.example.com", true)),
            ("missing key", missing_key),
        ];

        for (name, disk) in cases {
            assert!(
                matches!(registry.resolve(&disk), Err(FSError::Config(_))),
                "failed for case: {}",
                name
            );
        }
    }

    #[test]
    fn test_extend_replaces_driver() {
        let mut registry = DriverRegistry::empty();
        assert!(!registry.has_driver("memory"));

        registry.extend("memory", |_| Err(FSError::Other("disabled".to_string())));
        assert!(registry.has_driver("memory"));
        assert!(matches!(
            registry.resolve(&disk("memory", "e", false)),
            Err(FSError::Other(_))
        ));

        registry.extend("memory", |disk| {
            let client = adapters::mock::MockClient::new();
            let driver: Arc<dyn Filesystem> =
                Arc::new(fs::ObjectFS::from_config(Box::new(client), disk));
            Ok(driver)
        });
        assert!(registry.resolve(&disk("memory", "e", false)).is_ok());
    }
}
