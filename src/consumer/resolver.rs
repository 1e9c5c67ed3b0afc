use std::sync::Arc;

use base64::{Engine as _, engine::general_purpose};
use futures::future::join_all;
use serde_json::Value;
use tracing::{debug, warn};

use crate::codec::{Codec, GzipCodec};
use crate::core::models::{
    BodyLocation, DeliveredMessage, ReceivedMessage, Resolution, Resolved,
};
use crate::errors::ExtendedError;
use crate::storage::ObjectStore;

/// Turns encoded queue messages back into the payloads producers sent.
#[derive(Clone)]
pub struct MessageResolver {
    store: Arc<dyn ObjectStore>,
    codec: Arc<dyn Codec>,
}

impl MessageResolver {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self::with_codec(store, Arc::new(GzipCodec))
    }

    pub fn with_codec(store: Arc<dyn ObjectStore>, codec: Arc<dyn Codec>) -> Self {
        Self { store, codec }
    }

    /// Resolves every message concurrently. One resolution per message, in
    /// input order; a failing message never fails the batch.
    pub async fn resolve_batch(&self, messages: Vec<ReceivedMessage>) -> Vec<Resolution> {
        if messages.is_empty() {
            return Vec::new();
        }

        let resolutions = join_all(messages.into_iter().map(|message| async move {
            let outcome = self.decode(message.location()).await;
            if let Err(e) = &outcome {
                warn!(message_id = ?message.message_id, error = %e, "Failed to resolve message");
            }
            Resolution { message, outcome }
        }))
        .await;

        debug!(
            total = resolutions.len(),
            failed = resolutions.iter().filter(|r| !r.is_resolved()).count(),
            "Resolved batch"
        );
        resolutions
    }

    /// # Errors
    ///
    /// Returns the store error if the overflowed body cannot be fetched, or a
    /// `DecodeError` if the body is not valid base64, gzip, or JSON.
    pub async fn resolve_message(&self, message: &ReceivedMessage) -> Result<Value, ExtendedError> {
        self.decode(message.location()).await
    }

    /// Resolves a message handed over by a queue trigger.
    ///
    /// # Errors
    ///
    /// Fails on the first error; there is no batch to protect.
    pub async fn resolve_delivered(
        &self,
        message: DeliveredMessage,
    ) -> Result<Resolved<DeliveredMessage>, ExtendedError> {
        let body = self.decode(message.location()).await?;
        Ok(Resolved { message, body })
    }

    async fn decode(&self, location: BodyLocation<'_>) -> Result<Value, ExtendedError> {
        let compressed = match location {
            BodyLocation::Inline(body) => general_purpose::STANDARD.decode(body.trim())?,
            // Stored objects hold the compressed bytes themselves
            BodyLocation::Overflowed { bucket, key } => {
                self.store.get_object(bucket, key).await?
            }
        };

        let raw = self.codec.decompress(&compressed)?;
        serde_json::from_slice(&raw)
            .map_err(|e| ExtendedError::DecodeError(format!("payload parse: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{CompressionLevel, MockCodec};
    use crate::core::models::{
        AttributeValue, DeliveredAttribute, EXTENDED_STORE_BUCKET, EXTENDED_STORE_KEY,
        MessageAttributes,
    };
    use crate::storage::MockObjectStore;
    use serde_json::json;

    fn gzip(value: &Value) -> Vec<u8> {
        GzipCodec
            .compress(value.to_string().as_bytes(), CompressionLevel::Default)
            .unwrap()
    }

    fn inline(id: &str, value: &Value) -> ReceivedMessage {
        ReceivedMessage {
            message_id: Some(id.to_string()),
            body: Some(general_purpose::STANDARD.encode(gzip(value))),
            ..ReceivedMessage::default()
        }
    }

    fn overflowed(id: &str, key: &str) -> ReceivedMessage {
        let mut attributes = MessageAttributes::new();
        attributes.insert(EXTENDED_STORE_BUCKET.to_string(), AttributeValue::from("bucket"));
        attributes.insert(EXTENDED_STORE_KEY.to_string(), AttributeValue::from(key));
        ReceivedMessage {
            message_id: Some(id.to_string()),
            body: Some("true".to_string()),
            attributes,
            ..ReceivedMessage::default()
        }
    }

    #[tokio::test]
    async fn test_batch_isolates_failed_fetch() {
        let stored = gzip(&json!({"n": 3}));
        let mut store = MockObjectStore::new();
        store
            .expect_get_object()
            .withf(|bucket, key| bucket == "bucket" && key == "/7/missing.json.gz")
            .times(1)
            .returning(|_, key| Err(ExtendedError::StoreError(format!("NoSuchKey {key}"))));
        store
            .expect_get_object()
            .withf(|_, key| key == "/2/present.json.gz")
            .times(1)
            .returning(move |_, _| Ok(stored.clone()));

        let resolver = MessageResolver::new(Arc::new(store));
        let resolutions = resolver
            .resolve_batch(vec![
                inline("1", &json!({"n": 1})),
                overflowed("2", "/7/missing.json.gz"),
                overflowed("3", "/2/present.json.gz"),
            ])
            .await;

        assert_eq!(resolutions.len(), 3);
        assert_eq!(resolutions[0].body(), Some(&json!({"n": 1})));
        assert!(matches!(resolutions[1].error(), Some(ExtendedError::StoreError(_))));
        assert_eq!(resolutions[1].message.message_id.as_deref(), Some("2"));
        assert_eq!(resolutions[2].body(), Some(&json!({"n": 3})));
    }

    #[tokio::test]
    async fn test_empty_batch_touches_nothing() {
        let mut store = MockObjectStore::new();
        store.expect_get_object().never();
        let mut codec = MockCodec::new();
        codec.expect_decompress().never();

        let resolver = MessageResolver::with_codec(Arc::new(store), Arc::new(codec));
        assert!(resolver.resolve_batch(Vec::new()).await.is_empty());
    }

    #[tokio::test]
    async fn test_decode_failures_are_per_message() {
        let resolver = MessageResolver::new(Arc::new(MockObjectStore::new()));
        let not_json = ReceivedMessage {
            body: Some(general_purpose::STANDARD.encode(
                GzipCodec
                    .compress(b"not json", CompressionLevel::None)
                    .unwrap(),
            )),
            ..ReceivedMessage::default()
        };
        let not_gzip = ReceivedMessage {
            body: Some(general_purpose::STANDARD.encode(b"plain")),
            ..ReceivedMessage::default()
        };
        let not_base64 = ReceivedMessage {
            body: Some("%%%".to_string()),
            ..ReceivedMessage::default()
        };

        let resolutions = resolver
            .resolve_batch(vec![not_json, not_gzip, not_base64])
            .await;
        assert_eq!(resolutions.len(), 3);
        assert!(
            resolutions
                .iter()
                .all(|r| matches!(r.error(), Some(ExtendedError::DecodeError(_))))
        );
    }

    #[tokio::test]
    async fn test_single_pointer_attribute_reads_body_inline() {
        let mut message = inline("1", &json!("hello"));
        message
            .attributes
            .insert(EXTENDED_STORE_KEY.to_string(), AttributeValue::from("/1/x.json.gz"));

        let mut store = MockObjectStore::new();
        store.expect_get_object().never();
        let resolver = MessageResolver::new(Arc::new(store));

        assert_eq!(resolver.resolve_message(&message).await.unwrap(), json!("hello"));
    }

    #[tokio::test]
    async fn test_resolve_delivered_fetches_pointer() {
        let stored = gzip(&json!({"big": [1, 2, 3]}));
        let mut store = MockObjectStore::new();
        store
            .expect_get_object()
            .withf(|bucket, key| bucket == "bucket" && key == "/4/k.json.gz")
            .times(1)
            .returning(move |_, _| Ok(stored.clone()));

        let mut message = DeliveredMessage {
            body: Some("true".to_string()),
            ..DeliveredMessage::default()
        };
        for (name, value) in [(EXTENDED_STORE_BUCKET, "bucket"), (EXTENDED_STORE_KEY, "/4/k.json.gz")] {
            message.message_attributes.insert(
                name.to_string(),
                DeliveredAttribute {
                    string_value: Some(value.to_string()),
                    data_type: "String".to_string(),
                    ..DeliveredAttribute::default()
                },
            );
        }

        let resolver = MessageResolver::new(Arc::new(store));
        let resolved = resolver.resolve_delivered(message).await.unwrap();
        assert_eq!(resolved.body, json!({"big": [1, 2, 3]}));
        assert_eq!(resolved.message.body.as_deref(), Some("true"));
    }

    #[tokio::test]
    async fn test_resolve_delivered_propagates_errors() {
        let resolver = MessageResolver::new(Arc::new(MockObjectStore::new()));
        let message = DeliveredMessage {
            body: Some("!!".to_string()),
            ..DeliveredMessage::default()
        };
        let err = resolver.resolve_delivered(message).await.unwrap_err();
        assert!(matches!(err, ExtendedError::DecodeError(_)));
    }
}
