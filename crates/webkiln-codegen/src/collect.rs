//! Source directory scanning
//!
//! Walks the source tree, applies exclusion patterns and returns the raw
//! content of every asset keyed by its `/`-separated relative path.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

use crate::asset::content_hash;
use crate::error::{Error, Result};

/// Suffixes treated as pre-compressed copies of a sibling asset
pub const PRECOMPRESSED_SUFFIXES: [&str; 3] = [".gz", ".br", ".brottli"];

/// Number of excluded paths listed in the advisory log line
const EXCLUSION_EXAMPLES: usize = 10;

/// Collected source files plus advisory findings
#[derive(Debug, Default)]
pub struct Collection {
    /// Relative path to raw content, ordered by path
    pub files: BTreeMap<String, Vec<u8>>,
    /// Relative paths dropped by exclusion patterns
    pub excluded: Vec<String>,
    /// Groups of paths whose content is byte-identical
    pub duplicate_groups: Vec<Vec<String>>,
}

/// Scan `source_dir` and gather every servable asset
///
/// Hidden files and directories are skipped at any depth. Paths matching an
/// exclusion pattern are dropped and reported. Pre-compressed copies are
/// dropped when the uncompressed sibling is present. An empty result set and
/// a missing default document are distinct fatal conditions.
pub fn collect(source_dir: &Path, exclude: &[String], require_index: bool) -> Result<Collection> {
    let exclusions = build_exclusion_set(exclude)?;

    let mut files: BTreeMap<String, Vec<u8>> = BTreeMap::new();
    let mut excluded: Vec<String> = Vec::new();

    let walker = WalkDir::new(source_dir)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e));
    for entry in walker {
        let entry = entry.map_err(|e| {
            let path = e
                .path()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| source_dir.to_path_buf());
            Error::Read {
                path,
                source: e.into(),
            }
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(source_dir) else {
            continue;
        };
        let relative = slash_path(relative);

        if exclusions.is_match(&relative) {
            excluded.push(relative);
            continue;
        }

        let content = std::fs::read(entry.path()).map_err(|e| Error::Read {
            path: entry.path().to_path_buf(),
            source: e,
        })?;
        files.insert(relative, content);
    }

    drop_precompressed(&mut files);
    report_exclusions(&excluded);

    if files.is_empty() {
        return Err(Error::EmptySourceDir {
            path: source_dir.to_path_buf(),
        });
    }
    if require_index && !has_default_document(&files) {
        return Err(Error::MissingDefaultDocument);
    }

    let duplicate_groups = find_duplicates(&files);
    for group in &duplicate_groups {
        warn!("identical content: {}", group.join(", "));
    }

    Ok(Collection {
        files,
        excluded,
        duplicate_groups,
    })
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}

/// Relative path with `/` separators regardless of platform
fn slash_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn build_exclusion_set(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        // literal_separator keeps * within one path component; only **
        // crosses directories
        let glob = GlobBuilder::new(pattern)
            .literal_separator(true)
            .build()
            .map_err(|e| Error::InvalidPattern {
                pattern: pattern.clone(),
                message: e.to_string(),
            })?;
        builder.add(glob);
    }
    builder.build().map_err(|e| Error::InvalidPattern {
        pattern: e.glob().unwrap_or_default().to_string(),
        message: e.to_string(),
    })
}

/// Remove `.gz`/`.br`/`.brottli` copies whose uncompressed sibling was also
/// collected; the generator re-encodes content itself
fn drop_precompressed(files: &mut BTreeMap<String, Vec<u8>>) {
    let suppressed: Vec<String> = files
        .keys()
        .filter(|path| {
            PRECOMPRESSED_SUFFIXES.iter().any(|suffix| {
                path.strip_suffix(suffix)
                    .is_some_and(|original| files.contains_key(original))
            })
        })
        .cloned()
        .collect();
    for path in suppressed {
        debug!("skipping pre-compressed copy {path}");
        files.remove(&path);
    }
}

fn report_exclusions(excluded: &[String]) {
    if excluded.is_empty() {
        return;
    }
    let shown = excluded
        .iter()
        .take(EXCLUSION_EXAMPLES)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    let rest = excluded.len().saturating_sub(EXCLUSION_EXAMPLES);
    if rest > 0 {
        info!("excluded {} files: {shown}, and {rest} more", excluded.len());
    } else {
        info!("excluded {} files: {shown}", excluded.len());
    }
}

fn has_default_document(files: &BTreeMap<String, Vec<u8>>) -> bool {
    files.keys().any(|path| {
        path.rsplit('/')
            .next()
            .unwrap_or(path)
            .starts_with("index.htm")
    })
}

/// Group paths by content digest, keeping first-seen order
fn find_duplicates(files: &BTreeMap<String, Vec<u8>>) -> Vec<Vec<String>> {
    let mut order: Vec<String> = Vec::new();
    let mut by_digest: HashMap<String, Vec<String>> = HashMap::new();
    for (path, content) in files {
        let digest = content_hash(content);
        if !by_digest.contains_key(&digest) {
            order.push(digest.clone());
        }
        by_digest.entry(digest).or_default().push(path.clone());
    }
    order
        .into_iter()
        .filter_map(|digest| by_digest.remove(&digest))
        .filter(|group| group.len() > 1)
        .collect()
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn write(dir: &Path, relative: &str, content: &[u8]) {
        let path = dir.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_collects_files_recursively_in_path_order() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "index.html", b"<html></html>");
        write(dir.path(), "assets/app.js", b"console.log(1)");
        write(dir.path(), "assets/style.css", b"body{}");

        let collection = collect(dir.path(), &[], true).unwrap();
        let paths: Vec<&String> = collection.files.keys().collect();
        assert_eq!(paths, ["assets/app.js", "assets/style.css", "index.html"]);
    }

    #[test]
    fn test_skips_hidden_files_and_directories() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "index.html", b"x");
        write(dir.path(), ".hidden", b"x");
        write(dir.path(), ".git/config", b"x");
        write(dir.path(), "sub/.DS_Store", b"x");

        let collection = collect(dir.path(), &[], true).unwrap();
        assert_eq!(collection.files.len(), 1);
        assert!(collection.files.contains_key("index.html"));
    }

    #[test]
    fn test_exclusion_patterns() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "index.html", b"x");
        write(dir.path(), "app.js.map", b"x");
        write(dir.path(), "assets/app.js.map", b"x");
        write(dir.path(), "assets/app.js", b"x");

        let exclude = vec!["**/*.map".to_string(), "*.map".to_string()];
        let collection = collect(dir.path(), &exclude, true).unwrap();
        assert_eq!(collection.files.len(), 2);
        assert_eq!(collection.excluded.len(), 2);
        assert!(!collection.files.contains_key("app.js.map"));
        assert!(!collection.files.contains_key("assets/app.js.map"));
    }

    #[test]
    fn test_star_does_not_cross_directories() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "index.html", b"x");
        write(dir.path(), "nested/app.js.map", b"x");

        let exclude = vec!["*.map".to_string()];
        let collection = collect(dir.path(), &exclude, true).unwrap();
        assert!(collection.files.contains_key("nested/app.js.map"));
    }

    #[test]
    fn test_drops_precompressed_copies_with_sibling() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "index.html", b"x");
        write(dir.path(), "index.html.gz", b"x");
        write(dir.path(), "style.css", b"x");
        write(dir.path(), "style.css.br", b"x");
        write(dir.path(), "logo.svg.brottli", b"x");
        write(dir.path(), "logo.svg", b"x");

        let collection = collect(dir.path(), &[], true).unwrap();
        assert_eq!(collection.files.len(), 3);
        assert!(!collection.files.contains_key("index.html.gz"));
        assert!(!collection.files.contains_key("style.css.br"));
        assert!(!collection.files.contains_key("logo.svg.brottli"));
    }

    #[test]
    fn test_keeps_precompressed_without_sibling() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "index.html", b"x");
        write(dir.path(), "archive.tar.gz", b"x");

        let collection = collect(dir.path(), &[], true).unwrap();
        assert!(collection.files.contains_key("archive.tar.gz"));
    }

    #[test]
    fn test_reports_duplicate_content() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "index.html", b"<html></html>");
        write(dir.path(), "a.txt", b"identical content");
        write(dir.path(), "b.txt", b"identical content");
        write(dir.path(), "c.txt", b"different content");

        let collection = collect(dir.path(), &[], true).unwrap();
        assert_eq!(collection.duplicate_groups.len(), 1);
        assert_eq!(collection.duplicate_groups[0], ["a.txt", "b.txt"]);
    }

    #[test]
    fn test_empty_directory_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let err = collect(dir.path(), &[], false).unwrap_err();
        assert!(matches!(err, Error::EmptySourceDir { .. }));
    }

    #[test]
    fn test_everything_excluded_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "app.js.map", b"x");

        let exclude = vec!["**/*.map".to_string(), "*.map".to_string()];
        let err = collect(dir.path(), &exclude, false).unwrap_err();
        assert!(matches!(err, Error::EmptySourceDir { .. }));
    }

    #[test]
    fn test_missing_index_is_fatal_when_required() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "main.html", b"x");

        let err = collect(dir.path(), &[], true).unwrap_err();
        assert!(matches!(err, Error::MissingDefaultDocument));

        let collection = collect(dir.path(), &[], false).unwrap();
        assert_eq!(collection.files.len(), 1);
    }

    #[test]
    fn test_index_at_depth_satisfies_check() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "app/index.htm", b"x");

        assert!(collect(dir.path(), &[], true).is_ok());
    }

    #[test]
    fn test_invalid_pattern_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "index.html", b"x");

        let exclude = vec!["a{".to_string()];
        let err = collect(dir.path(), &exclude, true).unwrap_err();
        assert!(matches!(err, Error::InvalidPattern { .. }));
    }
}
