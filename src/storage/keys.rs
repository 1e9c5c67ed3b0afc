use rand::Rng;
use uuid::Uuid;

/// Object key for an overflowed body: `/{shard}/{uuid}.json.gz`.
///
/// The shard is drawn uniformly from `[0, shards)` to spread writes across
/// store partitions. A shard count of zero is treated as one.
#[must_use]
pub fn shard_key(shards: u32) -> String {
    let shard = rand::rng().random_range(0..shards.max(1));
    format!("/{shard}/{}.json.gz", Uuid::new_v4())
}

/// Shard component of a key produced by [`shard_key`].
#[must_use]
pub fn shard_of(key: &str) -> Option<u32> {
    key.strip_prefix('/')?.split('/').next()?.parse().ok()
}
