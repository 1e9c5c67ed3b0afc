//! Producer side: encoding payloads for a size-capped queue

pub mod sender;

pub use sender::{ExtendedSender, SendRequest};
