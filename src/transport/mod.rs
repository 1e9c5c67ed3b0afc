//! Queue transport primitives consumed by the sender and receiver

pub mod sqs;

use async_trait::async_trait;

use crate::core::models::{MessageAttributes, ReceivedMessage, SendReceipt};
use crate::errors::ExtendedError;

pub use sqs::SqsTransport;

/// A fully encoded message ready for the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub queue_url: String,
    pub body: String,
    pub attributes: MessageAttributes,
    pub message_group_id: Option<String>,
    pub message_deduplication_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiveRequest {
    pub queue_url: String,
    pub max_messages: i32,
    pub wait_time_seconds: i32,
    pub visibility_timeout: i32,
    pub attribute_names: Vec<String>,
}

/// One message to acknowledge in a batch delete.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeleteEntry {
    pub id: String,
    pub receipt_handle: String,
}

impl DeleteEntry {
    #[must_use]
    pub fn new(id: impl Into<String>, receipt_handle: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            receipt_handle: receipt_handle.into(),
        }
    }
}

/// Entry ids the transport acknowledged or rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteOutcome {
    pub successful: Vec<String>,
    pub failed: Vec<String>,
}

/// Send/receive/delete primitives of the underlying queue.
///
/// Implementations surface their own failures as `TransportError`s and apply
/// whatever connection pooling and retry policy their client has.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait QueueTransport: Send + Sync {
    async fn send_message(&self, message: OutgoingMessage) -> Result<SendReceipt, ExtendedError>;

    async fn receive_messages(
        &self,
        request: ReceiveRequest,
    ) -> Result<Vec<ReceivedMessage>, ExtendedError>;

    async fn delete_messages(
        &self,
        queue_url: &str,
        entries: Vec<DeleteEntry>,
    ) -> Result<DeleteOutcome, ExtendedError>;

    async fn purge_queue(&self, queue_url: &str) -> Result<(), ExtendedError>;

    async fn change_visibility(
        &self,
        queue_url: &str,
        receipt_handle: &str,
        visibility_timeout: i32,
    ) -> Result<(), ExtendedError>;

    async fn list_queues(&self) -> Result<Vec<String>, ExtendedError>;
}
