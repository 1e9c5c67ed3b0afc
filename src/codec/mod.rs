//! Size accounting and body compression shared by both sides of the queue

pub mod compression;
pub mod size;

pub use compression::{Codec, CompressionLevel, GzipCodec};
pub use size::{estimate_attributes_size, estimate_message_size};

#[cfg(any(test, feature = "testing"))]
pub use compression::MockCodec;
