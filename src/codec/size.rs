use crate::core::models::{AttributeValue, MessageAttributes};

/// Fixed charge per attribute, whatever its arity.
///
/// Tuned so a one-byte string attribute costs 10 bytes, matching the
/// transport accounting consumers already rely on.
pub const ATTRIBUTE_OVERHEAD: usize = 9;

/// Bytes the transport charges for `attributes`, excluding the body.
#[must_use]
pub fn estimate_attributes_size(attributes: &MessageAttributes) -> usize {
    attributes
        .values()
        .map(|value| ATTRIBUTE_OVERHEAD + value_size(value))
        .sum()
}

/// Bytes the transport charges for a message with this body and attributes.
#[must_use]
pub fn estimate_message_size(body: &[u8], attributes: &MessageAttributes) -> usize {
    body.len() + estimate_attributes_size(attributes)
}

fn value_size(value: &AttributeValue) -> usize {
    match value {
        AttributeValue::String(s) | AttributeValue::Number(s) => s.len(),
        AttributeValue::Binary(b) => b.len(),
        AttributeValue::StringList(list) => list.iter().map(String::len).sum(),
        AttributeValue::BinaryList(list) => list.iter().map(Vec::len).sum(),
    }
}
