//! Shared AWS SDK configuration built from an explicit [`ClientConfig`].

use aws_config::timeout::TimeoutConfig;
use aws_config::{BehaviorVersion, Region, SdkConfig};

use crate::core::config::ClientConfig;

/// Loads credentials from the default provider chain and applies the region
/// and timeouts from `config`. Endpoint overrides are applied per service.
pub async fn load_sdk_config(config: &ClientConfig) -> SdkConfig {
    let mut timeouts = TimeoutConfig::builder();
    if let Some(timeout) = config.operation_timeout {
        timeouts = timeouts.operation_timeout(timeout);
    }
    if let Some(timeout) = config.connect_timeout {
        timeouts = timeouts.connect_timeout(timeout);
    }

    aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(config.region.clone()))
        .timeout_config(timeouts.build())
        .load()
        .await
}

/// Endpoint overrides are configured as bare hosts; the SDK wants a URL.
pub(crate) fn endpoint_url(endpoint: &str) -> String {
    if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        endpoint.to_string()
    } else {
        format!("https://{endpoint}")
    }
}
