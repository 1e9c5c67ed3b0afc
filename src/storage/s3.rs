use async_trait::async_trait;
use aws_sdk_s3::Client as S3Client;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use tracing::debug;

use super::ObjectStore;
use crate::aws::{endpoint_url, load_sdk_config};
use crate::core::config::ClientConfig;
use crate::errors::ExtendedError;

/// [`ObjectStore`] backed by S3.
#[derive(Debug, Clone)]
pub struct S3Store {
    client: S3Client,
}

impl S3Store {
    #[must_use]
    pub fn new(client: S3Client) -> Self {
        Self { client }
    }

    pub async fn from_config(config: &ClientConfig) -> Self {
        let shared = load_sdk_config(config).await;
        let mut builder = aws_sdk_s3::config::Builder::from(&shared);
        if let Some(endpoint) = &config.s3_endpoint {
            builder = builder
                .endpoint_url(endpoint_url(endpoint))
                .force_path_style(true);
        }
        Self::new(S3Client::from_conf(builder.build()))
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, ExtendedError> {
        let output = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                ExtendedError::StoreError(format!(
                    "get_object s3://{bucket}{key}: {}",
                    DisplayErrorContext(&e)
                ))
            })?;

        let bytes = output
            .body
            .collect()
            .await
            .map_err(|e| ExtendedError::StoreError(format!("read s3://{bucket}{key}: {e}")))?
            .into_bytes();

        debug!(bucket, key, size = bytes.len(), "Fetched overflowed body");
        Ok(bytes.to_vec())
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_encoding: &str,
    ) -> Result<(), ExtendedError> {
        let size = body.len();
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .content_encoding(content_encoding)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| {
                ExtendedError::StoreError(format!(
                    "put_object s3://{bucket}{key}: {}",
                    DisplayErrorContext(&e)
                ))
            })?;

        debug!(bucket, key, size, "Stored overflowed body");
        Ok(())
    }
}
