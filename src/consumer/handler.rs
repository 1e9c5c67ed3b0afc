use lambda_runtime::{Error, LambdaEvent};
use serde::Deserialize;
use tracing::{error, info};

use super::resolver::MessageResolver;
use crate::core::models::DeliveredMessage;
use crate::retry::{RetryPolicy, with_retry};

/// Queue trigger event as delivered to a Lambda function.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SqsEvent {
    #[serde(rename = "Records", default)]
    pub records: Vec<DeliveredMessage>,
}

/// Lambda handler for the queue trigger. Resolves every record, retrying
/// store and transport failures; the first record that still fails fails the
/// invocation so the trigger redelivers it.
pub async fn function_handler(
    resolver: &MessageResolver,
    policy: &RetryPolicy,
    event: LambdaEvent<SqsEvent>,
) -> Result<usize, Error> {
    let records = event.payload.records;
    info!(count = records.len(), "Received queue trigger event");

    let mut resolved = 0;
    for record in records {
        let message_id = record.message_id.clone();
        let result = with_retry(policy, || resolver.resolve_delivered(record.clone())).await;
        match result {
            Ok(message) => {
                info!(message_id = ?message_id, body = %message.body, "Resolved message");
                resolved += 1;
            }
            Err(e) => {
                error!(message_id = ?message_id, error = %e, "Failed to resolve message");
                return Err(Error::from(format!("Failed to resolve message: {e}")));
            }
        }
    }

    Ok(resolved)
}

pub use self::function_handler as handler;
