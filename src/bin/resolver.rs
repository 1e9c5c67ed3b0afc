// Lambda bootstrap for the queue-trigger resolver

use std::sync::Arc;

use extended_sqs::consumer::{MessageResolver, handler};
use extended_sqs::core::config::ClientConfig;
use extended_sqs::retry::RetryPolicy;
use extended_sqs::storage::S3Store;
use lambda_runtime::{Error, LambdaEvent, run, service_fn};
use tracing::error;

#[tokio::main]
async fn main() -> Result<(), Error> {
    extended_sqs::setup_logging();

    let config = ClientConfig::from_env().map_err(|e| {
        error!("Config error: {}", e);
        Error::from(e.to_string())
    })?;
    let resolver = MessageResolver::new(Arc::new(S3Store::from_config(&config).await));
    let policy = RetryPolicy::default();

    run(service_fn(|event: LambdaEvent<_>| handler(&resolver, &policy, event))).await
}
