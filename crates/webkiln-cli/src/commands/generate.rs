//! Generate the embedded-asset source file

use std::fs;

use anyhow::{Context, Result};
use webkiln_codegen::{AssetRegistry, BudgetKind, Error, collect, render, route_count};
use webkiln_core::Config;

/// Run the full generation pipeline
///
/// Collect, derive, budget-check, render, then write the output exactly once.
/// With `dry_run` everything happens except the write.
pub fn run(config: &Config, dry_run: bool) -> Result<()> {
    tracing::debug!("{}", config.summary());
    tracing::info!("Collecting assets from {}", config.source_dir.display());

    let collection = collect(&config.source_dir, &config.exclude, !config.no_index_check)?;
    let registry = AssetRegistry::build(collection)?;
    let totals = registry.totals;

    tracing::info!(
        "{} files, {}kB original size, {}kB gzip size",
        totals.file_count,
        kilobytes(totals.raw_total),
        kilobytes(totals.gzip_total)
    );

    check_budget(BudgetKind::Raw, config.max_size, totals.raw_total)?;
    check_budget(BudgetKind::Gzip, config.max_gzip_size, totals.gzip_total)?;

    let created_at = config.created.then(timestamp);
    let source = render(&registry, config, created_at.as_deref());

    if dry_run {
        tracing::info!("Dry run: {} not written", config.output.display());
    } else {
        write_output(config, &source)?;
        tracing::info!(
            "{} {}kB size",
            config.output.display(),
            kilobytes(source.len() as u64)
        );
    }

    if config.engine.has_handler_limit() {
        let routes = route_count(&registry, config);
        tracing::info!(
            "{} routes generated: set max_uri_handlers to at least {} for {}",
            routes,
            routes + 5,
            config.engine.display_name()
        );
    }

    Ok(())
}

fn check_budget(kind: BudgetKind, limit: Option<u64>, actual: u64) -> Result<()> {
    let Some(limit) = limit else {
        return Ok(());
    };
    if actual > limit {
        return Err(Error::BudgetExceeded {
            kind,
            limit,
            actual,
        }
        .into());
    }
    tracing::debug!("{kind} total {actual} bytes within the {limit} byte budget");
    Ok(())
}

fn write_output(config: &Config, source: &str) -> Result<()> {
    if let Some(parent) = config.output.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }
    fs::write(&config.output, source)
        .with_context(|| format!("Failed to write {}", config.output.display()))
}

fn timestamp() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
}

fn kilobytes(bytes: u64) -> u64 {
    (bytes + 512) / 1024
}
