//! Gzip encoding and the compression selection policy

use std::io::Write;

use flate2::Compression;
use flate2::write::GzEncoder;

use crate::error::Result;

/// Raw size a file must exceed before compression is considered, in bytes
pub const MIN_COMPRESS_SIZE: u64 = 1024;

/// Gzip-encode `data` at the highest compression level
pub fn encode(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::best());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

/// Decide whether the gzip representation should be served
///
/// Small files stay raw, and the encoded form must land strictly under 85%
/// of the original size. Evaluated in integer arithmetic so the boundary is
/// exact.
pub fn should_compress(raw: u64, compressed: u64) -> bool {
    raw > MIN_COMPRESS_SIZE && compressed * 100 < raw * 85
}

/// Compressed size as a rounded percentage of the raw size
pub fn compression_ratio(raw: u64, compressed: u64) -> u64 {
    if raw == 0 {
        return 100;
    }
    (compressed as f64 / raw as f64 * 100.0).round() as u64
}
