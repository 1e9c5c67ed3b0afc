use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::ExtendedError;

/// Attribute naming the bucket that holds an overflowed body.
pub const EXTENDED_STORE_BUCKET: &str = "EXTENDED_STORE_BUCKET";
/// Attribute naming the object key of an overflowed body.
pub const EXTENDED_STORE_KEY: &str = "EXTENDED_STORE_KEY";
pub const RESERVED_ATTRIBUTE_NAMES: [&str; 2] = [EXTENDED_STORE_BUCKET, EXTENDED_STORE_KEY];

/// Body sent in place of the payload once it has been moved to the store.
pub const OVERFLOW_SENTINEL: &str = "true";

/// A typed message attribute as the queue transport carries it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeValue {
    String(String),
    Number(String),
    Binary(Vec<u8>),
    StringList(Vec<String>),
    BinaryList(Vec<Vec<u8>>),
}

impl AttributeValue {
    /// Transport data type label.
    #[must_use]
    pub fn data_type(&self) -> &'static str {
        match self {
            AttributeValue::String(_) => "String",
            AttributeValue::Number(_) => "Number",
            AttributeValue::Binary(_) => "Binary",
            AttributeValue::StringList(_) => "StringList",
            AttributeValue::BinaryList(_) => "BinaryList",
        }
    }

    /// Scalar string content for `String` and `Number` attributes.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::String(s) | AttributeValue::Number(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::String(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::String(value)
    }
}

pub type MessageAttributes = BTreeMap<String, AttributeValue>;

/// Read access to string attributes, shared by raw transport messages and
/// trigger-delivered records whose field casing differs.
pub trait PointerAttributes {
    fn string_attribute(&self, name: &str) -> Option<&str>;
}

impl PointerAttributes for MessageAttributes {
    fn string_attribute(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(AttributeValue::as_str)
    }
}

/// Where the encoded body of a message lives.
///
/// On the wire this is the presence of both reserved pointer attributes; it is
/// decoded into this variant at the boundary and never travels as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyLocation<'a> {
    Inline(&'a str),
    Overflowed { bucket: &'a str, key: &'a str },
}

impl<'a> BodyLocation<'a> {
    /// A message is overflowed only when both pointer attributes carry a value.
    pub fn detect<A: PointerAttributes + ?Sized>(body: Option<&'a str>, attributes: &'a A) -> Self {
        let bucket = attributes
            .string_attribute(EXTENDED_STORE_BUCKET)
            .filter(|b| !b.is_empty());
        let key = attributes
            .string_attribute(EXTENDED_STORE_KEY)
            .filter(|k| !k.is_empty());

        match (bucket, key) {
            (Some(bucket), Some(key)) => BodyLocation::Overflowed { bucket, key },
            _ => BodyLocation::Inline(body.unwrap_or_default()),
        }
    }
}

/// Producer-supplied value before transport encoding.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Pre-rendered JSON text, sent as-is.
    Text(String),
    Json(Value),
}

impl Payload {
    /// # Errors
    ///
    /// Returns an `EncodingError` if the value cannot be represented as JSON.
    pub fn from_serializable<T: Serialize + ?Sized>(value: &T) -> Result<Self, ExtendedError> {
        serde_json::to_value(value)
            .map(Payload::Json)
            .map_err(|e| ExtendedError::EncodingError(format!("payload serialize: {e}")))
    }

    /// # Errors
    ///
    /// Returns an `EncodingError` if a JSON payload cannot be rendered as text,
    /// or if a text payload is not valid JSON.
    pub fn into_text(self) -> Result<String, ExtendedError> {
        match self {
            Payload::Text(text) => {
                serde_json::from_str::<serde::de::IgnoredAny>(&text)
                    .map_err(|e| ExtendedError::EncodingError(format!("payload is not JSON: {e}")))?;
                Ok(text)
            }
            Payload::Json(value) => serde_json::to_string(&value)
                .map_err(|e| ExtendedError::EncodingError(format!("payload serialize: {e}"))),
        }
    }
}

impl From<String> for Payload {
    fn from(value: String) -> Self {
        Payload::Text(value)
    }
}

impl From<&str> for Payload {
    fn from(value: &str) -> Self {
        Payload::Text(value.to_string())
    }
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        Payload::Json(value)
    }
}

/// A message as returned by the transport's receive primitive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReceivedMessage {
    pub message_id: Option<String>,
    pub receipt_handle: Option<String>,
    pub body: Option<String>,
    pub attributes: MessageAttributes,
    pub system_attributes: BTreeMap<String, String>,
}

impl ReceivedMessage {
    #[must_use]
    pub fn location(&self) -> BodyLocation<'_> {
        BodyLocation::detect(self.body.as_deref(), &self.attributes)
    }
}

/// Attribute of a trigger-delivered record (camelCase field names).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveredAttribute {
    #[serde(default)]
    pub string_value: Option<String>,
    /// Base64 text as delivered by the trigger.
    #[serde(default)]
    pub binary_value: Option<String>,
    #[serde(default)]
    pub string_list_values: Vec<String>,
    #[serde(default)]
    pub binary_list_values: Vec<String>,
    #[serde(default)]
    pub data_type: String,
}

/// A message handed over by a queue trigger rather than pulled by `receive`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveredMessage {
    #[serde(default)]
    pub message_id: Option<String>,
    #[serde(default)]
    pub receipt_handle: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    #[serde(default)]
    pub message_attributes: BTreeMap<String, DeliveredAttribute>,
    #[serde(default, rename = "eventSourceARN")]
    pub event_source_arn: Option<String>,
}

impl PointerAttributes for DeliveredMessage {
    fn string_attribute(&self, name: &str) -> Option<&str> {
        self.message_attributes
            .get(name)
            .and_then(|attr| attr.string_value.as_deref())
    }
}

impl DeliveredMessage {
    #[must_use]
    pub fn location(&self) -> BodyLocation<'_> {
        BodyLocation::detect(self.body.as_deref(), self)
    }
}

/// Outcome of decoding one message.
#[derive(Debug)]
pub struct Resolution<M = ReceivedMessage> {
    pub message: M,
    pub outcome: Result<Value, ExtendedError>,
}

impl<M> Resolution<M> {
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.outcome.is_ok()
    }

    #[must_use]
    pub fn body(&self) -> Option<&Value> {
        self.outcome.as_ref().ok()
    }

    #[must_use]
    pub fn error(&self) -> Option<&ExtendedError> {
        self.outcome.as_ref().err()
    }

    /// # Errors
    ///
    /// Returns the error this message failed to resolve with.
    pub fn into_resolved(self) -> Result<Resolved<M>, ExtendedError> {
        let message = self.message;
        self.outcome.map(|body| Resolved { message, body })
    }
}

/// A successfully decoded message.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved<M> {
    pub message: M,
    pub body: Value,
}

/// Acknowledgement returned by the transport for a sent message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SendReceipt {
    pub message_id: Option<String>,
    pub sequence_number: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendResult {
    pub receipt: SendReceipt,
    /// Store key of the overflowed body, when the payload did not fit inline.
    pub key: Option<String>,
}

impl SendResult {
    #[must_use]
    pub fn is_extended(&self) -> bool {
        self.key.is_some()
    }
}
