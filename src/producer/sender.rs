use std::sync::Arc;

use base64::{Engine as _, engine::general_purpose};
use tracing::{debug, info};

use crate::codec::{Codec, CompressionLevel, GzipCodec, estimate_message_size};
use crate::core::config::{ClientConfig, OverflowConfig};
use crate::core::models::{
    AttributeValue, EXTENDED_STORE_BUCKET, EXTENDED_STORE_KEY, MessageAttributes,
    OVERFLOW_SENTINEL, Payload, RESERVED_ATTRIBUTE_NAMES, SendResult,
};
use crate::errors::ExtendedError;
use crate::storage::{ObjectStore, shard_key};
use crate::transport::{OutgoingMessage, QueueTransport};

/// A payload addressed to a queue, with optional FIFO routing.
#[derive(Debug, Clone, PartialEq)]
pub struct SendRequest {
    pub queue_name: String,
    pub payload: Payload,
    pub attributes: MessageAttributes,
    pub message_group_id: Option<String>,
    pub message_deduplication_id: Option<String>,
    /// Overrides the configured overflow bucket for this message.
    pub bucket: Option<String>,
}

impl SendRequest {
    pub fn new(queue_name: impl Into<String>, payload: impl Into<Payload>) -> Self {
        Self {
            queue_name: queue_name.into(),
            payload: payload.into(),
            attributes: MessageAttributes::new(),
            message_group_id: None,
            message_deduplication_id: None,
            bucket: None,
        }
    }

    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_attributes(mut self, attributes: MessageAttributes) -> Self {
        self.attributes = attributes;
        self
    }

    #[must_use]
    pub fn with_message_group_id(mut self, group_id: impl Into<String>) -> Self {
        self.message_group_id = Some(group_id.into());
        self
    }

    #[must_use]
    pub fn with_message_deduplication_id(mut self, dedup_id: impl Into<String>) -> Self {
        self.message_deduplication_id = Some(dedup_id.into());
        self
    }

    #[must_use]
    pub fn with_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = Some(bucket.into());
        self
    }
}

/// Compresses payloads and moves the ones that still do not fit to the
/// overflow store, leaving a pointer in the queue message.
pub struct ExtendedSender {
    config: ClientConfig,
    transport: Arc<dyn QueueTransport>,
    store: Arc<dyn ObjectStore>,
    codec: Arc<dyn Codec>,
}

impl ExtendedSender {
    pub fn new(
        config: ClientConfig,
        transport: Arc<dyn QueueTransport>,
        store: Arc<dyn ObjectStore>,
    ) -> Self {
        Self::with_codec(config, transport, store, Arc::new(GzipCodec))
    }

    pub fn with_codec(
        config: ClientConfig,
        transport: Arc<dyn QueueTransport>,
        store: Arc<dyn ObjectStore>,
        codec: Arc<dyn Codec>,
    ) -> Self {
        Self {
            config,
            transport,
            store,
            codec,
        }
    }

    fn overflow(&self) -> &OverflowConfig {
        &self.config.overflow
    }

    /// Sends `request`, offloading the body when it cannot travel inline.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` before any remote call when no overflow bucket
    /// is configured, an `EncodingError` or `CompressionError` if the payload
    /// cannot be encoded, and the transport or store error unchanged if either
    /// call fails.
    pub async fn send(&self, request: SendRequest) -> Result<SendResult, ExtendedError> {
        let SendRequest {
            queue_name,
            payload,
            mut attributes,
            message_group_id,
            message_deduplication_id,
            bucket,
        } = request;

        let bucket = bucket
            .or_else(|| self.overflow().bucket.clone())
            .ok_or_else(|| ExtendedError::ConfigError("overflow bucket name required".to_string()))?;

        let body = payload.into_text()?;

        // Pointers left over from a previous message must never leak into this one
        for name in RESERVED_ATTRIBUTE_NAMES {
            attributes.remove(name);
        }

        let raw_size = estimate_message_size(body.as_bytes(), &attributes);
        let level = if raw_size < self.overflow().max_uncompressed_size {
            CompressionLevel::None
        } else {
            CompressionLevel::Default
        };
        let compressed = self.codec.compress(body.as_bytes(), level)?;

        let compressed_size = estimate_message_size(&compressed, &attributes);
        debug!(queue = %queue_name, raw_size, compressed_size, ?level, "Encoded payload");

        let (wire_body, key) = if compressed_size > self.overflow().max_message_size {
            let key = shard_key(self.overflow().shards);
            self.store
                .put_object(&bucket, &key, compressed, GzipCodec::CONTENT_ENCODING)
                .await?;
            info!(queue = %queue_name, bucket = %bucket, key = %key, compressed_size, "Payload overflowed to store");

            attributes.insert(EXTENDED_STORE_BUCKET.to_string(), AttributeValue::String(bucket));
            attributes.insert(EXTENDED_STORE_KEY.to_string(), AttributeValue::String(key.clone()));
            (OVERFLOW_SENTINEL.to_string(), Some(key))
        } else {
            (general_purpose::STANDARD.encode(&compressed), None)
        };

        let receipt = self
            .transport
            .send_message(OutgoingMessage {
                queue_url: self.config.queue_url(&queue_name),
                body: wire_body,
                attributes,
                message_group_id,
                message_deduplication_id,
            })
            .await?;

        Ok(SendResult { receipt, key })
    }
}
