//! Object storage for bodies that do not fit in a queue message

pub mod keys;
pub mod s3;

use async_trait::async_trait;

use crate::errors::ExtendedError;

pub use keys::shard_key;
pub use s3::S3Store;

/// Key-addressed object storage backing overflowed message bodies.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch the object stored at `key`.
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, ExtendedError>;

    /// Store `body` at `key`, tagged with `content_encoding`.
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_encoding: &str,
    ) -> Result<(), ExtendedError>;
}
