//! Asset registry
//!
//! Turns collected files into fully-derived [`Asset`] entities: compression
//! selection, identifiers, content types, etags and aggregate totals.

use std::collections::HashMap;

use tracing::debug;

use crate::asset::{
    Asset, AssetTotals, ExtensionGroup, content_hash, extension_of, sanitize_identifier,
};
use crate::collect::Collection;
use crate::compress;
use crate::error::{Error, Result};

/// The complete asset set with derived metadata
#[derive(Debug)]
pub struct AssetRegistry {
    /// Assets ordered by relative path
    pub assets: Vec<Asset>,

    /// Per-extension counts, ordered alphabetically by extension
    pub extension_groups: Vec<ExtensionGroup>,

    /// Aggregate size counters
    pub totals: AssetTotals,
}

impl AssetRegistry {
    /// Derive the registry from a collection
    ///
    /// Every file is gzip-encoded exactly once; the selection policy then
    /// decides which representation is served. Distinct paths mapping to the
    /// same C identifier are rejected before any encoding work.
    pub fn build(collection: Collection) -> Result<AssetRegistry> {
        check_identifiers(&collection)?;

        let mut assets = Vec::with_capacity(collection.files.len());
        let mut totals = AssetTotals::default();
        let mut group_order: Vec<String> = Vec::new();
        let mut group_counts: HashMap<String, usize> = HashMap::new();

        for (path, raw) in collection.files {
            let compressed = compress::encode(&raw)?;
            let raw_len = raw.len() as u64;
            let compressed_len = compressed.len() as u64;
            let uses_compression = compress::should_compress(raw_len, compressed_len);
            let ratio = compress::compression_ratio(raw_len, compressed_len);
            if uses_compression {
                debug!("{path}: gzip {raw_len} -> {compressed_len} bytes ({ratio}%)");
            } else if raw_len <= compress::MIN_COMPRESS_SIZE {
                debug!("{path}: gzip unused (too small)");
            } else {
                debug!("{path}: gzip unused ({raw_len} -> {compressed_len} bytes = {ratio}%)");
            }

            let extension = extension_of(&path);
            if !group_counts.contains_key(&extension) {
                group_order.push(extension.clone());
            }
            *group_counts.entry(extension).or_insert(0) += 1;

            totals.file_count += 1;
            totals.raw_total += raw_len;
            totals.gzip_total += compressed_len;

            let etag = content_hash(&raw);
            assets.push(Asset {
                identifier: sanitize_identifier(&path),
                mime: mime_guess::from_path(&path)
                    .first_raw()
                    .unwrap_or("text/plain")
                    .to_string(),
                is_default_document: path.starts_with("index.htm"),
                path,
                raw,
                compressed,
                uses_compression,
                etag,
            });
        }

        let mut extension_groups: Vec<ExtensionGroup> = group_order
            .into_iter()
            .map(|extension| {
                let count = group_counts[&extension];
                ExtensionGroup { extension, count }
            })
            .collect();
        extension_groups.sort_by(|a, b| a.extension.cmp(&b.extension));

        Ok(AssetRegistry {
            assets,
            extension_groups,
            totals,
        })
    }

    /// Indices of root-level default document candidates, in path order
    pub fn default_candidates(&self) -> Vec<usize> {
        self.assets
            .iter()
            .enumerate()
            .filter(|(_, asset)| asset.is_default_document)
            .map(|(index, _)| index)
            .collect()
    }
}

/// Reject path sets whose sanitized identifiers are not unique
fn check_identifiers(collection: &Collection) -> Result<()> {
    let mut by_identifier: HashMap<String, Vec<&str>> = HashMap::new();
    for path in collection.files.keys() {
        by_identifier
            .entry(sanitize_identifier(path))
            .or_default()
            .push(path);
    }
    for path in collection.files.keys() {
        let identifier = sanitize_identifier(path);
        if let Some(group) = by_identifier.get(&identifier) {
            if group.len() > 1 {
                return Err(Error::IdentifierCollision {
                    identifier,
                    paths: group.iter().map(|p| p.to_string()).collect(),
                });
            }
        }
    }
    Ok(())
}
