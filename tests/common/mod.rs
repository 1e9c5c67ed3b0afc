#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use extended_sqs::core::models::{ReceivedMessage, SendReceipt};
use extended_sqs::storage::ObjectStore;
use extended_sqs::transport::{
    DeleteEntry, DeleteOutcome, OutgoingMessage, QueueTransport, ReceiveRequest,
};
use extended_sqs::ExtendedError;

/// In-memory queue. Like SQS, only requested attribute names are returned.
#[derive(Default)]
pub struct MemoryQueue {
    queues: Mutex<HashMap<String, VecDeque<ReceivedMessage>>>,
    pub sent: Mutex<Vec<OutgoingMessage>>,
    pub deleted: Mutex<Vec<DeleteEntry>>,
    next_id: AtomicUsize,
}

impl MemoryQueue {
    pub fn push_raw(&self, queue_url: &str, message: ReceivedMessage) {
        self.queues
            .lock()
            .unwrap()
            .entry(queue_url.to_string())
            .or_default()
            .push_back(message);
    }

    pub fn depth(&self, queue_url: &str) -> usize {
        self.queues
            .lock()
            .unwrap()
            .get(queue_url)
            .map_or(0, VecDeque::len)
    }
}

#[async_trait]
impl QueueTransport for MemoryQueue {
    async fn send_message(&self, message: OutgoingMessage) -> Result<SendReceipt, ExtendedError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst).to_string();
        self.push_raw(
            &message.queue_url,
            ReceivedMessage {
                message_id: Some(id.clone()),
                receipt_handle: Some(format!("rh-{id}")),
                body: Some(message.body.clone()),
                attributes: message.attributes.clone(),
                system_attributes: BTreeMap::new(),
            },
        );
        self.sent.lock().unwrap().push(message);
        Ok(SendReceipt {
            message_id: Some(id),
            sequence_number: None,
        })
    }

    async fn receive_messages(
        &self,
        request: ReceiveRequest,
    ) -> Result<Vec<ReceivedMessage>, ExtendedError> {
        let mut queues = self.queues.lock().unwrap();
        let Some(queue) = queues.get_mut(&request.queue_url) else {
            return Ok(Vec::new());
        };
        let count = queue.len().min(usize::try_from(request.max_messages).unwrap_or(0));
        Ok(queue
            .drain(..count)
            .map(|mut message| {
                message
                    .attributes
                    .retain(|name, _| request.attribute_names.contains(name));
                message
            })
            .collect())
    }

    async fn delete_messages(
        &self,
        _queue_url: &str,
        entries: Vec<DeleteEntry>,
    ) -> Result<DeleteOutcome, ExtendedError> {
        let successful = entries.iter().map(|e| e.id.clone()).collect();
        self.deleted.lock().unwrap().extend(entries);
        Ok(DeleteOutcome {
            successful,
            failed: Vec::new(),
        })
    }

    async fn purge_queue(&self, queue_url: &str) -> Result<(), ExtendedError> {
        self.queues.lock().unwrap().remove(queue_url);
        Ok(())
    }

    async fn change_visibility(
        &self,
        _queue_url: &str,
        _receipt_handle: &str,
        _visibility_timeout: i32,
    ) -> Result<(), ExtendedError> {
        Ok(())
    }

    async fn list_queues(&self) -> Result<Vec<String>, ExtendedError> {
        Ok(self.queues.lock().unwrap().keys().cloned().collect())
    }
}

/// In-memory object store counting calls.
#[derive(Default)]
pub struct MemoryStore {
    pub objects: Mutex<HashMap<(String, String), (Vec<u8>, String)>>,
    pub gets: AtomicUsize,
    pub puts: AtomicUsize,
}

impl MemoryStore {
    pub fn object(&self, bucket: &str, key: &str) -> Option<(Vec<u8>, String)> {
        self.objects
            .lock()
            .unwrap()
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, ExtendedError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.object(bucket, key)
            .map(|(body, _)| body)
            .ok_or_else(|| ExtendedError::StoreError(format!("NoSuchKey: {bucket}{key}")))
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_encoding: &str,
    ) -> Result<(), ExtendedError> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        self.objects.lock().unwrap().insert(
            (bucket.to_string(), key.to_string()),
            (body, content_encoding.to_string()),
        );
        Ok(())
    }
}
