//! Webkiln Code Generation
//!
//! This crate turns a directory of built web assets into one embeddable
//! C/C++ source file for an embedded HTTP server.
//!
//! # Pipeline Overview
//!
//! ```text
//! ┌─────────┐     ┌──────────┐     ┌─────────┐     ┌─────────┐
//! │  Walk   │────▶│ Registry │────▶│ Render  │────▶│  Clean  │
//! │ (Files) │     │ (Encode) │     │ (Emit)  │     │ (Post)  │
//! └─────────┘     └──────────┘     └─────────┘     └─────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use webkiln_codegen::{AssetRegistry, collect, render};
//!
//! let collection = collect(&config.source_dir, &config.exclude, !config.no_index_check)?;
//! let registry = AssetRegistry::build(collection)?;
//! let source = render(&registry, &config, None);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod asset;
pub mod collect;
pub mod compress;
mod engines;
pub mod error;
pub mod generator;
pub mod postprocess;
pub mod registry;

pub use collect::{Collection, collect};
pub use error::{BudgetKind, Error, Result};
pub use generator::{render, route_count};
pub use postprocess::clean;
pub use registry::AssetRegistry;
