//! Webkiln CLI
//!
//! Turns a directory of built web assets into one embeddable C/C++ source
//! file for an embedded HTTP server.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use directories::ProjectDirs;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use webkiln_core::config::DEFAULT_SETTINGS_FILE;
use webkiln_core::{Config, Engine, Settings, TriState};

mod commands;

/// Webkiln - embed built web assets into C/C++ sources
#[derive(Parser)]
#[command(name = "webkiln")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Target server engine
    #[arg(short, long, value_enum)]
    engine: Option<Engine>,

    /// Directory holding the built web assets
    #[arg(short, long)]
    source_dir: Option<PathBuf>,

    /// Output file path
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// ETag handling
    #[arg(long, value_enum)]
    etag: Option<TriState>,

    /// Gzip handling
    #[arg(long, value_enum)]
    gzip: Option<TriState>,

    /// Cache max-age in seconds (0 means no-cache)
    #[arg(long)]
    cache_time: Option<u32>,

    /// Version string embedded into the generated source
    #[arg(long)]
    app_version: Option<String>,

    /// Name of the generated registration function
    #[arg(long)]
    init_fn: Option<String>,

    /// Prefix for generated macros, the manifest type, and the hook
    #[arg(long)]
    prefix: Option<String>,

    /// URL prefix under which all routes are mounted
    #[arg(long)]
    base_path: Option<String>,

    /// Exclusion glob, repeatable or comma-separated (replaces the default list)
    #[arg(long, value_delimiter = ',')]
    exclude: Option<Vec<String>>,

    /// Raw-size budget, a number with optional k/m suffix
    #[arg(long)]
    max_size: Option<String>,

    /// Gzip-size budget, a number with optional k/m suffix
    #[arg(long)]
    max_gzip_size: Option<String>,

    /// Allow asset sets without a default document
    #[arg(long)]
    no_index_check: bool,

    /// Run the full pipeline and report, but write nothing
    #[arg(long)]
    dry_run: bool,

    /// Embed the generation timestamp into the output header
    #[arg(long)]
    created: bool,

    /// Settings file path (default: ./webkiln.yaml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    /// Command-line values as a partial settings source.
    ///
    /// Boolean flags map to `Some(true)` only when passed, so an absent flag
    /// never overrides a settings-file value.
    fn settings(&self) -> Settings {
        Settings {
            engine: self.engine,
            source_dir: self.source_dir.clone(),
            output: self.output.clone(),
            etag: self.etag,
            gzip: self.gzip,
            cache_time: self.cache_time,
            app_version: self.app_version.clone(),
            init_fn: self.init_fn.clone(),
            prefix: self.prefix.clone(),
            base_path: self.base_path.clone(),
            exclude: self.exclude.clone(),
            max_size: self.max_size.clone(),
            max_gzip_size: self.max_gzip_size.clone(),
            no_index_check: self.no_index_check.then_some(true),
            created: self.created.then_some(true),
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!("{error:#}");
            log_remediation(&error);
            ExitCode::from(exit_code_for(&error))
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let file = file_settings(cli.config.as_deref())?;
    let config = Config::resolve(cli.settings().or(file))?;
    commands::generate::run(&config, cli.dry_run)
}

/// Load the highest-precedence settings file that exists.
///
/// An explicit `--config` path must exist; otherwise `./webkiln.yaml` is
/// tried, then the user-level config directory, then empty settings.
fn file_settings(explicit: Option<&Path>) -> Result<Settings> {
    if let Some(path) = explicit {
        tracing::debug!("Loading settings from {}", path.display());
        return Ok(Settings::load(path)?);
    }

    let local = Path::new(DEFAULT_SETTINGS_FILE);
    if local.exists() {
        tracing::debug!("Loading settings from {}", local.display());
        return Ok(Settings::load(local)?);
    }

    if let Some(dirs) = ProjectDirs::from("", "", "webkiln") {
        let user = dirs.config_dir().join(DEFAULT_SETTINGS_FILE);
        if user.exists() {
            tracing::debug!("Loading settings from {}", user.display());
            return Ok(Settings::load(user)?);
        }
    }

    Ok(Settings::default())
}

/// Map the error chain to the documented process exit code
fn exit_code_for(error: &anyhow::Error) -> u8 {
    if let Some(config_error) = error.downcast_ref::<webkiln_core::Error>() {
        return config_error.exit_code();
    }
    if let Some(codegen_error) = error.downcast_ref::<webkiln_codegen::Error>() {
        return codegen_error.exit_code();
    }
    webkiln_core::error::EXIT_FAILURE
}

/// One actionable follow-up line for the errors users can fix themselves
fn log_remediation(error: &anyhow::Error) {
    let Some(codegen_error) = error.downcast_ref::<webkiln_codegen::Error>() else {
        return;
    };
    match codegen_error {
        webkiln_codegen::Error::MissingDefaultDocument => {
            tracing::info!(
                "Add an index.html entry point, or pass --no-index-check to embed without one \
                 (clients must then request a file path explicitly)"
            );
        }
        webkiln_codegen::Error::EmptySourceDir { .. } => {
            tracing::info!(
                "Point --source-dir at the build output directory of your web project \
                 (for example dist/ or build/)"
            );
        }
        webkiln_codegen::Error::BudgetExceeded { .. } => {
            tracing::info!(
                "Raise --max-size/--max-gzip-size, exclude assets, or shrink the frontend build"
            );
        }
        _ => {}
    }
}
