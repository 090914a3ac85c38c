//! Error types for the asset pipeline

use std::path::PathBuf;

use thiserror::Error;
use webkiln_core::error::{
    EXIT_BUDGET, EXIT_COLLISION, EXIT_CONFIG, EXIT_FAILURE, EXIT_NO_ASSETS, EXIT_NO_INDEX,
};

/// Result type alias for webkiln-codegen operations
pub type Result<T> = std::result::Result<T, Error>;

/// Which size budget was exceeded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BudgetKind {
    /// Sum of raw file sizes
    Raw,
    /// Sum of gzip-encoded file sizes
    Gzip,
}

impl std::fmt::Display for BudgetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BudgetKind::Raw => write!(f, "uncompressed"),
            BudgetKind::Gzip => write!(f, "gzip"),
        }
    }
}

/// Errors that can occur while collecting assets or generating output
#[derive(Error, Debug)]
pub enum Error {
    /// Source directory yielded no assets after exclusions
    #[error("source directory is empty: no assets found under {path}")]
    EmptySourceDir {
        /// Directory that was scanned
        path: PathBuf,
    },

    /// No index.html or index.htm present while the index check is enabled
    #[error("no index.html or index.htm found in source files")]
    MissingDefaultDocument,

    /// Two or more asset paths sanitize to the same C identifier
    #[error("identifier collision: {} all map to '{}'", .paths.join(", "), .identifier)]
    IdentifierCollision {
        /// The identifier both paths produce
        identifier: String,
        /// Asset paths involved in the collision
        paths: Vec<String>,
    },

    /// A size budget was exceeded
    #[error("{kind} size budget exceeded: {actual} bytes > {limit} bytes")]
    BudgetExceeded {
        /// Which budget failed
        kind: BudgetKind,
        /// Configured limit in bytes
        limit: u64,
        /// Measured total in bytes
        actual: u64,
    },

    /// An exclude pattern failed to compile
    #[error("invalid exclude pattern '{pattern}': {message}")]
    InvalidPattern {
        /// The offending glob pattern
        pattern: String,
        /// Compiler diagnostic
        message: String,
    },

    /// Reading an asset file failed
    #[error("failed to read {path}: {source}")]
    Read {
        /// File that could not be read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Process exit code for this error, part of the CLI contract
    pub fn exit_code(&self) -> u8 {
        match self {
            Error::EmptySourceDir { .. } => EXIT_NO_ASSETS,
            Error::MissingDefaultDocument => EXIT_NO_INDEX,
            Error::BudgetExceeded { .. } => EXIT_BUDGET,
            Error::IdentifierCollision { .. } => EXIT_COLLISION,
            Error::InvalidPattern { .. } => EXIT_CONFIG,
            Error::Read { .. } | Error::Io(_) => EXIT_FAILURE,
        }
    }
}
