use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use aws_sdk_sqs::Client as SqsClient;
use aws_sdk_sqs::error::DisplayErrorContext;
use aws_sdk_sqs::primitives::Blob;
use aws_sdk_sqs::types::{DeleteMessageBatchRequestEntry, Message, MessageAttributeValue};
use tracing::debug;

use super::{DeleteEntry, DeleteOutcome, OutgoingMessage, QueueTransport, ReceiveRequest};
use crate::aws::{endpoint_url, load_sdk_config};
use crate::core::config::ClientConfig;
use crate::core::models::{AttributeValue, MessageAttributes, ReceivedMessage, SendReceipt};
use crate::errors::ExtendedError;

/// [`QueueTransport`] backed by SQS.
#[derive(Debug, Clone)]
pub struct SqsTransport {
    client: SqsClient,
}

impl SqsTransport {
    #[must_use]
    pub fn new(client: SqsClient) -> Self {
        Self { client }
    }

    pub async fn from_config(config: &ClientConfig) -> Self {
        let shared = load_sdk_config(config).await;
        let mut builder = aws_sdk_sqs::config::Builder::from(&shared);
        if let Some(endpoint) = &config.sqs_endpoint {
            builder = builder.endpoint_url(endpoint_url(endpoint));
        }
        Self::new(SqsClient::from_conf(builder.build()))
    }
}

fn transport_error<E, R>(operation: &str, error: &aws_sdk_sqs::error::SdkError<E, R>) -> ExtendedError
where
    E: std::error::Error + 'static,
    R: std::fmt::Debug,
{
    ExtendedError::TransportError(format!("{operation}: {}", DisplayErrorContext(error)))
}

fn to_sqs_attribute(value: &AttributeValue) -> Result<MessageAttributeValue, ExtendedError> {
    let builder = MessageAttributeValue::builder().data_type(value.data_type());
    let builder = match value {
        AttributeValue::String(s) | AttributeValue::Number(s) => builder.string_value(s),
        AttributeValue::Binary(b) => builder.binary_value(Blob::new(b.clone())),
        AttributeValue::StringList(list) => builder.set_string_list_values(Some(list.clone())),
        AttributeValue::BinaryList(list) => builder.set_binary_list_values(Some(
            list.iter().cloned().map(Blob::new).collect(),
        )),
    };
    builder
        .build()
        .map_err(|e| ExtendedError::EncodingError(format!("message attribute: {e}")))
}

fn from_sqs_attribute(value: &MessageAttributeValue) -> Option<AttributeValue> {
    if let Some(s) = value.string_value() {
        let s = s.to_string();
        return Some(if value.data_type().starts_with("Number") {
            AttributeValue::Number(s)
        } else {
            AttributeValue::String(s)
        });
    }
    if let Some(b) = value.binary_value() {
        return Some(AttributeValue::Binary(b.as_ref().to_vec()));
    }
    if !value.string_list_values().is_empty() {
        return Some(AttributeValue::StringList(value.string_list_values().to_vec()));
    }
    if !value.binary_list_values().is_empty() {
        return Some(AttributeValue::BinaryList(
            value
                .binary_list_values()
                .iter()
                .map(|b| b.as_ref().to_vec())
                .collect(),
        ));
    }
    None
}

fn from_sqs_message(message: &Message) -> ReceivedMessage {
    let attributes: MessageAttributes = message
        .message_attributes()
        .map(|attrs| {
            attrs
                .iter()
                .filter_map(|(name, value)| from_sqs_attribute(value).map(|v| (name.clone(), v)))
                .collect()
        })
        .unwrap_or_default();

    let system_attributes: BTreeMap<String, String> = message
        .attributes()
        .map(|attrs| {
            attrs
                .iter()
                .map(|(name, value)| (name.as_str().to_string(), value.clone()))
                .collect()
        })
        .unwrap_or_default();

    ReceivedMessage {
        message_id: message.message_id().map(str::to_string),
        receipt_handle: message.receipt_handle().map(str::to_string),
        body: message.body().map(str::to_string),
        attributes,
        system_attributes,
    }
}

#[async_trait]
impl QueueTransport for SqsTransport {
    async fn send_message(&self, message: OutgoingMessage) -> Result<SendReceipt, ExtendedError> {
        let attributes = message
            .attributes
            .iter()
            .map(|(name, value)| Ok((name.clone(), to_sqs_attribute(value)?)))
            .collect::<Result<HashMap<_, _>, ExtendedError>>()?;

        let output = self
            .client
            .send_message()
            .queue_url(&message.queue_url)
            .message_body(message.body)
            .set_message_attributes((!attributes.is_empty()).then_some(attributes))
            .set_message_group_id(message.message_group_id)
            .set_message_deduplication_id(message.message_deduplication_id)
            .send()
            .await
            .map_err(|e| transport_error("send_message", &e))?;

        debug!(queue_url = %message.queue_url, message_id = ?output.message_id(), "Sent message");
        Ok(SendReceipt {
            message_id: output.message_id().map(str::to_string),
            sequence_number: output.sequence_number().map(str::to_string),
        })
    }

    async fn receive_messages(
        &self,
        request: ReceiveRequest,
    ) -> Result<Vec<ReceivedMessage>, ExtendedError> {
        let output = self
            .client
            .receive_message()
            .queue_url(&request.queue_url)
            .max_number_of_messages(request.max_messages)
            .wait_time_seconds(request.wait_time_seconds)
            .visibility_timeout(request.visibility_timeout)
            .set_message_attribute_names(Some(request.attribute_names))
            .send()
            .await
            .map_err(|e| transport_error("receive_message", &e))?;

        Ok(output.messages().iter().map(from_sqs_message).collect())
    }

    async fn delete_messages(
        &self,
        queue_url: &str,
        entries: Vec<DeleteEntry>,
    ) -> Result<DeleteOutcome, ExtendedError> {
        let entries = entries
            .into_iter()
            .map(|entry| {
                DeleteMessageBatchRequestEntry::builder()
                    .id(entry.id)
                    .receipt_handle(entry.receipt_handle)
                    .build()
                    .map_err(|e| ExtendedError::EncodingError(format!("delete entry: {e}")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let output = self
            .client
            .delete_message_batch()
            .queue_url(queue_url)
            .set_entries(Some(entries))
            .send()
            .await
            .map_err(|e| transport_error("delete_message_batch", &e))?;

        Ok(DeleteOutcome {
            successful: output.successful().iter().map(|s| s.id().to_string()).collect(),
            failed: output.failed().iter().map(|f| f.id().to_string()).collect(),
        })
    }

    async fn purge_queue(&self, queue_url: &str) -> Result<(), ExtendedError> {
        self.client
            .purge_queue()
            .queue_url(queue_url)
            .send()
            .await
            .map_err(|e| transport_error("purge_queue", &e))?;
        Ok(())
    }

    async fn change_visibility(
        &self,
        queue_url: &str,
        receipt_handle: &str,
        visibility_timeout: i32,
    ) -> Result<(), ExtendedError> {
        self.client
            .change_message_visibility()
            .queue_url(queue_url)
            .receipt_handle(receipt_handle)
            .visibility_timeout(visibility_timeout)
            .send()
            .await
            .map_err(|e| transport_error("change_message_visibility", &e))?;
        Ok(())
    }

    async fn list_queues(&self) -> Result<Vec<String>, ExtendedError> {
        let output = self
            .client
            .list_queues()
            .send()
            .await
            .map_err(|e| transport_error("list_queues", &e))?;
        Ok(output.queue_urls().to_vec())
    }
}
