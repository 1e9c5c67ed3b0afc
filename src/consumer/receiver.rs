use std::sync::Arc;

use tracing::debug;

use super::resolver::MessageResolver;
use crate::core::config::ClientConfig;
use crate::core::models::{RESERVED_ATTRIBUTE_NAMES, ReceivedMessage, Resolution};
use crate::errors::ExtendedError;
use crate::transport::{QueueTransport, ReceiveRequest};

pub const DEFAULT_MAX_MESSAGES: i32 = 10;

/// What to pull from a queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrieveRequest {
    pub queue_name: String,
    pub max_messages: i32,
    pub attribute_names: Vec<String>,
    /// Falls back to the configured default visibility timeout.
    pub visibility_timeout: Option<i32>,
}

impl RetrieveRequest {
    pub fn new(queue_name: impl Into<String>) -> Self {
        Self {
            queue_name: queue_name.into(),
            max_messages: DEFAULT_MAX_MESSAGES,
            attribute_names: Vec::new(),
            visibility_timeout: None,
        }
    }

    #[must_use]
    pub fn with_max_messages(mut self, max_messages: i32) -> Self {
        self.max_messages = max_messages;
        self
    }

    #[must_use]
    pub fn with_attribute_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attribute_names = names.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_visibility_timeout(mut self, timeout: i32) -> Self {
        self.visibility_timeout = Some(timeout);
        self
    }
}

/// Pulls batches from the transport and resolves them.
pub struct ExtendedReceiver {
    config: ClientConfig,
    transport: Arc<dyn QueueTransport>,
    resolver: MessageResolver,
}

impl ExtendedReceiver {
    pub fn new(
        config: ClientConfig,
        transport: Arc<dyn QueueTransport>,
        resolver: MessageResolver,
    ) -> Self {
        Self {
            config,
            transport,
            resolver,
        }
    }

    #[must_use]
    pub fn resolver(&self) -> &MessageResolver {
        &self.resolver
    }

    fn receive_request(&self, request: RetrieveRequest, attribute_names: Vec<String>) -> ReceiveRequest {
        ReceiveRequest {
            queue_url: self.config.queue_url(&request.queue_name),
            max_messages: request.max_messages,
            wait_time_seconds: self.config.long_polling_wait_time,
            visibility_timeout: request
                .visibility_timeout
                .unwrap_or(self.config.default_visibility_timeout),
            attribute_names,
        }
    }

    /// Receives raw messages with only the caller's attribute names.
    ///
    /// # Errors
    ///
    /// Returns the transport error unchanged.
    pub async fn retrieve(
        &self,
        request: RetrieveRequest,
    ) -> Result<Vec<ReceivedMessage>, ExtendedError> {
        let names = request.attribute_names.clone();
        self.transport
            .receive_messages(self.receive_request(request, names))
            .await
    }

    /// Receives a batch and resolves every message, fetching overflowed
    /// bodies from the store. Per-message failures are reported in each
    /// [`Resolution`]; only the receive call itself can fail.
    ///
    /// # Errors
    ///
    /// Returns the transport error if the receive call fails.
    pub async fn extended_retrieve(
        &self,
        request: RetrieveRequest,
    ) -> Result<Vec<Resolution>, ExtendedError> {
        let names = with_reserved_names(&request.attribute_names);
        let queue = request.queue_name.clone();
        let messages = self
            .transport
            .receive_messages(self.receive_request(request, names))
            .await?;

        if messages.is_empty() {
            return Ok(Vec::new());
        }

        debug!(queue = %queue, count = messages.len(), "Received extended batch");
        Ok(self.resolver.resolve_batch(messages).await)
    }
}

/// Caller's attribute names followed by any missing pointer names.
fn with_reserved_names(names: &[String]) -> Vec<String> {
    let mut all = Vec::with_capacity(names.len() + RESERVED_ATTRIBUTE_NAMES.len());
    for name in names
        .iter()
        .map(String::as_str)
        .chain(RESERVED_ATTRIBUTE_NAMES)
    {
        if !all.iter().any(|existing: &String| existing == name) {
            all.push(name.to_string());
        }
    }
    all
}
