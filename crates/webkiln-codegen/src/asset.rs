//! Asset entities shared across the pipeline
//!
//! One [`Asset`] per embedded file, carrying both byte representations and
//! the derived metadata every emitter needs.

use sha2::{Digest, Sha256};

/// A single web asset prepared for embedding
#[derive(Debug, Clone)]
pub struct Asset {
    /// Path relative to the source directory, `/`-separated
    pub path: String,

    /// C identifier derived from the path
    pub identifier: String,

    /// Resolved Content-Type
    pub mime: String,

    /// Original file bytes
    pub raw: Vec<u8>,

    /// Gzip-encoded file bytes
    pub compressed: Vec<u8>,

    /// Whether the compressed representation is the one served
    pub uses_compression: bool,

    /// SHA-256 hex digest of the raw content, used as the etag value
    pub etag: String,

    /// Whether this asset is a root-level default document candidate
    pub is_default_document: bool,
}

impl Asset {
    /// Uppercase form of the identifier, used for handler and define names
    pub fn identifier_upper(&self) -> String {
        self.identifier.to_uppercase()
    }

    /// Bytes actually embedded for serving
    pub fn stored(&self) -> &[u8] {
        if self.uses_compression {
            &self.compressed
        } else {
            &self.raw
        }
    }
}

/// Count of assets sharing one file extension
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionGroup {
    /// Uppercased extension, empty for extensionless names
    pub extension: String,
    /// Number of assets with this extension
    pub count: usize,
}

/// Aggregate totals over the full asset set
#[derive(Debug, Clone, Copy, Default)]
pub struct AssetTotals {
    /// Number of embedded assets
    pub file_count: usize,
    /// Sum of raw sizes in bytes
    pub raw_total: u64,
    /// Sum of gzip-encoded sizes in bytes, independent of per-asset selection
    pub gzip_total: u64,
}

/// Map an asset path to a C identifier
///
/// Every character outside `[0-9A-Za-z]` becomes an underscore, so
/// `assets/app-v2.min.js` turns into `assets_app_v2_min_js`. Distinct paths
/// can collide after sanitization; the registry rejects such sets.
pub fn sanitize_identifier(path: &str) -> String {
    path.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// Extension of the file name component, uppercased
///
/// Text after the last dot of the name. A name without a dot, or with only
/// a leading dot, has no extension and yields the empty string.
pub fn extension_of(path: &str) -> String {
    let name = path.rsplit('/').next().unwrap_or(path);
    match name.rfind('.') {
        Some(pos) if pos > 0 => name[pos + 1..].to_uppercase(),
        _ => String::new(),
    }
}

/// SHA-256 digest of `data` as lowercase hex
pub fn content_hash(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}
