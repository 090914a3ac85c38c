//! Webkiln Core Library
//!
//! Shared types for the webkiln generator:
//! - Configuration loading, merging, and validation
//! - The engine and tri-state toggle enums
//! - The error taxonomy and its process exit codes
//!
//! The pipeline itself lives in `webkiln-codegen`; this crate only defines what
//! a run is configured to do.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;

pub use config::{Config, Engine, Settings, TriState};
pub use error::{Error, Result};
