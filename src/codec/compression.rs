use std::io::{Read, Write};

use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;

use crate::errors::ExtendedError;

/// Effort the sender asks of the codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionLevel {
    /// Wrap the bytes in the container without shrinking them.
    None,
    Default,
}

/// Reversible byte-stream compression.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait Codec: Send + Sync {
    /// # Errors
    ///
    /// Returns a `CompressionError` if the encoder fails.
    fn compress(&self, data: &[u8], level: CompressionLevel) -> Result<Vec<u8>, ExtendedError>;

    /// # Errors
    ///
    /// Returns a `DecodeError` if `data` is not a valid compressed stream.
    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>, ExtendedError>;
}

/// Gzip codec; stored objects are tagged with this content encoding.
#[derive(Debug, Clone, Copy, Default)]
pub struct GzipCodec;

impl GzipCodec {
    pub const CONTENT_ENCODING: &'static str = "gzip";
}

impl Codec for GzipCodec {
    fn compress(&self, data: &[u8], level: CompressionLevel) -> Result<Vec<u8>, ExtendedError> {
        let compression = match level {
            CompressionLevel::None => Compression::none(),
            CompressionLevel::Default => Compression::default(),
        };
        let mut encoder = GzEncoder::new(Vec::with_capacity(data.len() / 2 + 64), compression);
        encoder.write_all(data).map_err(compression_error)?;
        encoder.finish().map_err(compression_error)
    }

    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>, ExtendedError> {
        let mut decoded = Vec::new();
        GzDecoder::new(data)
            .read_to_end(&mut decoded)
            .map_err(|e| ExtendedError::DecodeError(format!("gunzip: {e}")))?;
        Ok(decoded)
    }
}

fn compression_error(error: std::io::Error) -> ExtendedError {
    ExtendedError::CompressionError(format!("gzip: {error}"))
}
