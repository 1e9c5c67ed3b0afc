//! Extended queue messages: payloads of any size over a size-capped queue.
//!
//! Producers hand a payload to the sender, which gzips it and, if the result
//! still does not fit the queue's message cap, writes it to an object store
//! and sends a pointer instead. Consumers receive batches and resolve every
//! message back into its payload, fetching overflowed bodies as needed.
//!
//! # Architecture
//!
//! The crate uses:
//! - SQS as the queue transport and S3 as the overflow store
//! - gzip (flate2) for body compression, base64 for the wire body
//! - Tokio and futures for concurrent per-message resolution
//! - `lambda_runtime` for the queue-trigger resolver binary
//!
//! # Example
//!
//! ```no_run
//! use extended_sqs::core::config::{ClientConfig, OverflowConfig};
//! use extended_sqs::consumer::RetrieveRequest;
//! use extended_sqs::producer::SendRequest;
//! use extended_sqs::queue::QueueClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     extended_sqs::setup_logging();
//!
//!     let config = ClientConfig::new("123456789012")
//!         .with_overflow(OverflowConfig::default().with_bucket("my-overflow-bucket"));
//!     let client = QueueClient::from_config(config).await;
//!
//!     let sent = client
//!         .extended_send(SendRequest::new("jobs", serde_json::json!({ "job": 1 })))
//!         .await?;
//!     println!("overflowed: {}", sent.is_extended());
//!
//!     for resolution in client.extended_retrieve(RetrieveRequest::new("jobs")).await? {
//!         match resolution.outcome {
//!             Ok(body) => println!("body: {body}"),
//!             Err(e) => println!("failed: {e}"),
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod aws;
pub mod codec;
pub mod consumer;
pub mod core;
pub mod errors;
pub mod producer;
pub mod queue;
pub mod retry;
pub mod storage;
pub mod transport;

pub use errors::ExtendedError;
pub use queue::QueueClient;

/// Configure structured logging with JSON format for AWS Lambda environments.
///
/// This function sets up tracing-subscriber with a JSON formatter suitable for
/// `CloudWatch` Logs integration. Calling it again after a subscriber has been
/// installed is a no-op.
///
/// # Example
///
/// ```
/// extended_sqs::setup_logging();
/// ```
pub fn setup_logging() {
    use tracing_subscriber::prelude::*;
    let fmt_layer = tracing_subscriber::fmt::layer().json().with_target(true);

    let _ = tracing_subscriber::registry().with(fmt_layer).try_init();
}
