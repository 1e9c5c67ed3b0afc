use std::env;
use std::time::Duration;

use crate::aws::endpoint_url;
use crate::errors::ExtendedError;

/// Largest compressed message, body plus attributes, sent inline.
///
/// 256 KiB minus headroom for the transport's own accounting.
pub const MAX_MESSAGE_SIZE: usize = 262_085;
/// Payloads below this size are wrapped without being shrunk.
///
/// 64 KiB minus 50 bytes for the container overhead of an uncompressed gzip stream.
pub const MAX_UNCOMPRESSED_SIZE: usize = 65_486;
pub const DEFAULT_SHARDS: u32 = 50;
pub const DEFAULT_REGION: &str = "us-east-1";
pub const DEFAULT_VISIBILITY_TIMEOUT: i32 = 300;
pub const DEFAULT_WAIT_TIME: i32 = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverflowConfig {
    /// Destination for bodies that do not fit inline.
    pub bucket: Option<String>,
    pub shards: u32,
    pub max_message_size: usize,
    pub max_uncompressed_size: usize,
}

impl Default for OverflowConfig {
    fn default() -> Self {
        Self {
            bucket: None,
            shards: DEFAULT_SHARDS,
            max_message_size: MAX_MESSAGE_SIZE,
            max_uncompressed_size: MAX_UNCOMPRESSED_SIZE,
        }
    }
}

impl OverflowConfig {
    #[must_use]
    pub fn with_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = Some(bucket.into());
        self
    }

    #[must_use]
    pub fn with_shards(mut self, shards: u32) -> Self {
        self.shards = shards;
        self
    }
}

/// Settings for one queue client. Several differently configured clients can
/// live in the same process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub account: String,
    pub region: String,
    pub queue_prefix: String,
    pub queue_suffix: String,
    pub default_visibility_timeout: i32,
    pub long_polling_wait_time: i32,
    /// Host (and optional port) replacing the regional SQS endpoint.
    pub sqs_endpoint: Option<String>,
    pub s3_endpoint: Option<String>,
    pub operation_timeout: Option<Duration>,
    pub connect_timeout: Option<Duration>,
    pub overflow: OverflowConfig,
}

impl ClientConfig {
    #[must_use]
    pub fn new(account: impl Into<String>) -> Self {
        Self {
            account: account.into(),
            region: DEFAULT_REGION.to_string(),
            queue_prefix: String::new(),
            queue_suffix: String::new(),
            default_visibility_timeout: DEFAULT_VISIBILITY_TIMEOUT,
            long_polling_wait_time: DEFAULT_WAIT_TIME,
            sqs_endpoint: None,
            s3_endpoint: None,
            operation_timeout: None,
            connect_timeout: None,
            overflow: OverflowConfig::default(),
        }
    }

    /// # Errors
    ///
    /// Returns a `ConfigError` when `EXTENDED_SQS_ACCOUNT` is missing or a
    /// numeric variable does not parse.
    pub fn from_env() -> Result<Self, ExtendedError> {
        let account = env::var("EXTENDED_SQS_ACCOUNT")
            .map_err(|e| ExtendedError::ConfigError(format!("EXTENDED_SQS_ACCOUNT: {e}")))?;

        let mut config = Self::new(account);
        if let Ok(region) = env::var("AWS_REGION") {
            config.region = region;
        }
        config.queue_prefix = env::var("EXTENDED_SQS_QUEUE_PREFIX").unwrap_or_default();
        config.queue_suffix = env::var("EXTENDED_SQS_QUEUE_SUFFIX").unwrap_or_default();
        if let Some(timeout) = parse_var("EXTENDED_SQS_VISIBILITY_TIMEOUT")? {
            config.default_visibility_timeout = timeout;
        }
        if let Some(wait) = parse_var("EXTENDED_SQS_WAIT_TIME")? {
            config.long_polling_wait_time = wait;
        }
        config.sqs_endpoint = env::var("EXTENDED_SQS_ENDPOINT").ok();
        config.s3_endpoint = env::var("EXTENDED_S3_ENDPOINT").ok();
        config.overflow.bucket = env::var("EXTENDED_S3_BUCKET").ok();
        if let Some(shards) = parse_var("EXTENDED_S3_SHARDS")? {
            config.overflow.shards = shards;
        }

        Ok(config)
    }

    #[must_use]
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    #[must_use]
    pub fn with_queue_affixes(mut self, prefix: impl Into<String>, suffix: impl Into<String>) -> Self {
        self.queue_prefix = prefix.into();
        self.queue_suffix = suffix.into();
        self
    }

    #[must_use]
    pub fn with_sqs_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.sqs_endpoint = Some(endpoint.into());
        self
    }

    #[must_use]
    pub fn with_overflow(mut self, overflow: OverflowConfig) -> Self {
        self.overflow = overflow;
        self
    }

    /// Full URL of the queue called `name`, with prefix and suffix applied.
    #[must_use]
    pub fn queue_url(&self, name: &str) -> String {
        let host = match &self.sqs_endpoint {
            Some(endpoint) => endpoint_url(endpoint),
            None => format!("https://sqs.{}.amazonaws.com", self.region),
        };
        format!(
            "{host}/{}/{}{name}{}",
            self.account, self.queue_prefix, self.queue_suffix
        )
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Result<Option<T>, ExtendedError>
where
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| ExtendedError::ConfigError(format!("{name}: {e}"))),
        Err(_) => Ok(None),
    }
}
