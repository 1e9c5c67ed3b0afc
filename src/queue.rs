//! Queue client bundling the plain queue operations with the extended
//! send and retrieve paths.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{info, warn};

use crate::codec::{Codec, GzipCodec};
use crate::consumer::{ExtendedReceiver, MessageResolver, RetrieveRequest};
use crate::core::config::ClientConfig;
use crate::core::models::{
    DeliveredMessage, ReceivedMessage, Resolution, Resolved, SendReceipt, SendResult,
};
use crate::errors::ExtendedError;
use crate::producer::{ExtendedSender, SendRequest};
use crate::retry::{PollPolicy, PollState, poll_until};
use crate::storage::{ObjectStore, S3Store};
use crate::transport::{DeleteEntry, DeleteOutcome, OutgoingMessage, QueueTransport, SqsTransport};

pub struct QueueClient {
    config: ClientConfig,
    transport: Arc<dyn QueueTransport>,
    sender: ExtendedSender,
    receiver: ExtendedReceiver,
}

impl QueueClient {
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
        let sender = ExtendedSender::with_codec(
            config.clone(),
            Arc::clone(&transport),
            Arc::clone(&store),
            Arc::clone(&codec),
        );
        let receiver = ExtendedReceiver::new(
            config.clone(),
            Arc::clone(&transport),
            MessageResolver::with_codec(store, codec),
        );
        Self {
            config,
            transport,
            sender,
            receiver,
        }
    }

    /// Client talking to SQS and S3 as described by `config`.
    pub async fn from_config(config: ClientConfig) -> Self {
        let transport = SqsTransport::from_config(&config).await;
        let store = S3Store::from_config(&config).await;
        Self::new(config, Arc::new(transport), Arc::new(store))
    }

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    #[must_use]
    pub fn resolver(&self) -> &MessageResolver {
        self.receiver.resolver()
    }

    #[must_use]
    pub fn queue_url(&self, name: &str) -> String {
        self.config.queue_url(name)
    }

    /// # Errors
    ///
    /// Returns the transport error unchanged.
    pub async fn list_queues(&self) -> Result<Vec<String>, ExtendedError> {
        self.transport.list_queues().await
    }

    /// Sends the payload text as the body, without compression or overflow.
    ///
    /// # Errors
    ///
    /// Returns an `EncodingError` if the payload is not JSON, or the transport
    /// error unchanged.
    pub async fn send(&self, request: SendRequest) -> Result<SendReceipt, ExtendedError> {
        let body = request.payload.into_text()?;
        self.transport
            .send_message(OutgoingMessage {
                queue_url: self.config.queue_url(&request.queue_name),
                body,
                attributes: request.attributes,
                message_group_id: request.message_group_id,
                message_deduplication_id: request.message_deduplication_id,
            })
            .await
    }

    /// See [`ExtendedSender::send`].
    ///
    /// # Errors
    ///
    /// Fails on configuration, encoding, store or transport errors.
    pub async fn extended_send(&self, request: SendRequest) -> Result<SendResult, ExtendedError> {
        self.sender.send(request).await
    }

    /// # Errors
    ///
    /// Returns the transport error unchanged.
    pub async fn retrieve(
        &self,
        request: RetrieveRequest,
    ) -> Result<Vec<ReceivedMessage>, ExtendedError> {
        self.receiver.retrieve(request).await
    }

    /// See [`ExtendedReceiver::extended_retrieve`].
    ///
    /// # Errors
    ///
    /// Returns the transport error if the receive call fails.
    pub async fn extended_retrieve(
        &self,
        request: RetrieveRequest,
    ) -> Result<Vec<Resolution>, ExtendedError> {
        self.receiver.extended_retrieve(request).await
    }

    /// Repeats [`Self::extended_retrieve`] until a batch arrives, backing off
    /// between empty receives.
    ///
    /// # Errors
    ///
    /// Returns a `TimeoutError` when every attempt came back empty, or the
    /// first transport error.
    pub async fn poll_extended(
        &self,
        request: RetrieveRequest,
        policy: &PollPolicy,
    ) -> Result<Vec<Resolution>, ExtendedError> {
        poll_until(policy, || {
            let request = request.clone();
            async move {
                let batch = self.extended_retrieve(request).await?;
                Ok(if batch.is_empty() {
                    PollState::Pending
                } else {
                    PollState::Ready(batch)
                })
            }
        })
        .await
    }

    /// Acknowledges messages. Entries repeating an earlier id are dropped.
    ///
    /// # Errors
    ///
    /// Returns the transport error unchanged.
    pub async fn remove(
        &self,
        queue_name: &str,
        entries: Vec<DeleteEntry>,
    ) -> Result<DeleteOutcome, ExtendedError> {
        let mut seen = HashSet::new();
        let entries: Vec<DeleteEntry> = entries
            .into_iter()
            .filter(|entry| seen.insert(entry.id.clone()))
            .collect();

        let outcome = self
            .transport
            .delete_messages(&self.config.queue_url(queue_name), entries)
            .await?;
        if !outcome.failed.is_empty() {
            warn!(queue = queue_name, failed = ?outcome.failed, "Some deletes were rejected");
        }
        Ok(outcome)
    }

    /// # Errors
    ///
    /// Returns the transport error unchanged.
    pub async fn purge(&self, queue_name: &str) -> Result<(), ExtendedError> {
        info!(queue = queue_name, "Purging queue");
        self.transport
            .purge_queue(&self.config.queue_url(queue_name))
            .await
    }

    /// # Errors
    ///
    /// Returns the transport error unchanged.
    pub async fn set_visibility_timeout(
        &self,
        queue_name: &str,
        receipt_handle: &str,
        timeout: i32,
    ) -> Result<(), ExtendedError> {
        self.transport
            .change_visibility(&self.config.queue_url(queue_name), receipt_handle, timeout)
            .await
    }

    /// See [`MessageResolver::resolve_delivered`].
    ///
    /// # Errors
    ///
    /// Fails on the first store or decode error.
    pub async fn resolve_delivered(
        &self,
        message: DeliveredMessage,
    ) -> Result<Resolved<DeliveredMessage>, ExtendedError> {
        self.resolver().resolve_delivered(message).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MockObjectStore;
    use crate::transport::MockQueueTransport;
    use std::time::Duration;

    fn client(transport: MockQueueTransport) -> QueueClient {
        QueueClient::new(
            ClientConfig::new("123").with_queue_affixes("dev-", ""),
            Arc::new(transport),
            Arc::new(MockObjectStore::new()),
        )
    }

    #[tokio::test]
    async fn test_remove_deduplicates_by_id() {
        let mut transport = MockQueueTransport::new();
        transport
            .expect_delete_messages()
            .withf(|url, entries| {
                url == "https://sqs.us-east-1.amazonaws.com/123/dev-jobs"
                    && *entries == [DeleteEntry::new("1", "a"), DeleteEntry::new("2", "c")]
            })
            .times(1)
            .returning(|_, entries| {
                Ok(DeleteOutcome {
                    successful: entries.into_iter().map(|e| e.id).collect(),
                    failed: Vec::new(),
                })
            });

        let outcome = client(transport)
            .remove(
                "jobs",
                vec![
                    DeleteEntry::new("1", "a"),
                    DeleteEntry::new("1", "b"),
                    DeleteEntry::new("2", "c"),
                ],
            )
            .await
            .unwrap();
        assert_eq!(outcome.successful, vec!["1", "2"]);
    }

    #[tokio::test]
    async fn test_plain_send_is_not_encoded() {
        let mut transport = MockQueueTransport::new();
        transport
            .expect_send_message()
            .withf(|msg| msg.body == r#"{"id":7}"# && msg.attributes.is_empty())
            .times(1)
            .returning(|_| Ok(SendReceipt::default()));

        client(transport)
            .send(SendRequest::new("jobs", serde_json::json!({"id": 7})))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_plain_send_rejects_non_json_text() {
        let mut transport = MockQueueTransport::new();
        transport.expect_send_message().never();

        let err = client(transport)
            .send(SendRequest::new("jobs", "hello world"))
            .await
            .unwrap_err();
        assert!(matches!(err, ExtendedError::EncodingError(_)));
    }

    #[tokio::test]
    async fn test_purge_and_visibility_use_queue_url() {
        let mut transport = MockQueueTransport::new();
        transport
            .expect_purge_queue()
            .withf(|url| url.ends_with("/123/dev-jobs"))
            .times(1)
            .returning(|_| Ok(()));
        transport
            .expect_change_visibility()
            .withf(|url, handle, timeout| url.ends_with("/dev-jobs") && handle == "rh" && *timeout == 60)
            .times(1)
            .returning(|_, _, _| Ok(()));

        let client = client(transport);
        client.purge("jobs").await.unwrap();
        client.set_visibility_timeout("jobs", "rh", 60).await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_extended_times_out_on_empty_queue() {
        let mut transport = MockQueueTransport::new();
        transport
            .expect_receive_messages()
            .times(2)
            .returning(|_| Ok(Vec::new()));

        let policy = PollPolicy {
            initial_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(10),
            max_attempts: 2,
        };
        let err = client(transport)
            .poll_extended(RetrieveRequest::new("jobs"), &policy)
            .await
            .unwrap_err();
        assert!(matches!(err, ExtendedError::TimeoutError(_)));
    }
}
