//! Error types for webkiln-core

use thiserror::Error;

/// Result type alias for webkiln-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Exit code for I/O and other untyped failures
pub const EXIT_FAILURE: u8 = 1;
/// Exit code for invalid configuration values
pub const EXIT_CONFIG: u8 = 2;
/// Exit code for an empty asset set
pub const EXIT_NO_ASSETS: u8 = 3;
/// Exit code for a missing default document
pub const EXIT_NO_INDEX: u8 = 4;
/// Exit code for an exceeded size budget
pub const EXIT_BUDGET: u8 = 5;
/// Exit code for colliding generated identifiers
pub const EXIT_COLLISION: u8 = 6;

/// Errors that can occur while loading or validating configuration
#[derive(Error, Debug)]
pub enum Error {
    /// Settings file could not be found
    #[error("settings file not found: {path}")]
    SettingsNotFound {
        /// Path that was searched
        path: String,
    },

    /// Failed to parse the YAML settings file
    #[error("failed to parse settings: {0}")]
    SettingsParse(#[from] serde_yaml::Error),

    /// A configuration value failed validation
    #[error("invalid value for {field}: {message}")]
    InvalidValue {
        /// Which setting is invalid
        field: &'static str,
        /// What is wrong with it
        message: String,
    },

    /// Source directory does not exist
    #[error("source directory not found: {path}")]
    SourceDirMissing {
        /// Path that was given
        path: String,
    },

    /// Source path exists but is not a directory
    #[error("source path is not a directory: {path}")]
    SourceDirNotDirectory {
        /// Path that was given
        path: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Process exit code for this error, part of the CLI contract
    pub fn exit_code(&self) -> u8 {
        match self {
            Error::Io(_) => EXIT_FAILURE,
            _ => EXIT_CONFIG,
        }
    }
}
