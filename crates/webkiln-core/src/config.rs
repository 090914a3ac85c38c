//! Configuration loading and validation
//!
//! Settings come from two places with a fixed precedence: command-line flags win
//! over the optional YAML settings file (`webkiln.yaml`), which wins over the
//! built-in defaults. Both sources deserialize into the same partial [`Settings`]
//! struct; [`Config::resolve`] merges, defaults, and validates the result into
//! the immutable configuration the pipeline runs with.

use clap::ValueEnum;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Default output file name
pub const DEFAULT_OUTPUT: &str = "webkiln.h";

/// Default settings file name, looked up in the working directory
pub const DEFAULT_SETTINGS_FILE: &str = "webkiln.yaml";

/// Default macro prefix for generated defines and hooks
pub const DEFAULT_PREFIX: &str = "WEBKILN";

/// Default name of the generated route-registration function
pub const DEFAULT_INIT_FN: &str = "initStaticAssets";

/// Exclusion globs applied when the user supplies none.
/// User-supplied patterns replace this list, they do not extend it.
pub const DEFAULT_EXCLUDES: &[&str] = &[
    ".DS_Store",
    "Thumbs.db",
    ".git",
    ".svn",
    "*.swp",
    "*~",
    ".gitignore",
    ".gitattributes",
];

static C_IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][0-9A-Za-z_]*$").expect("identifier pattern"));

static SIZE_LITERAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+(?:\.\d+)?)\s*([KkMm])?$").expect("size pattern"));

/// Target embedded HTTP server engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Engine {
    /// PsychicHttp v1 (`PsychicHttpServer`)
    Psychic,
    /// PsychicHttp v2 (`PsychicHttpServerV2`)
    Psychic2,
    /// ESPAsyncWebServer (`AsyncWebServer`, PROGMEM data)
    Async,
    /// ESP-IDF `esp_http_server` (plain C handler table)
    #[value(name = "espidf")]
    #[serde(rename = "espidf")]
    EspIdf,
}

impl Engine {
    /// The configuration token for this engine
    pub fn token(&self) -> &'static str {
        match self {
            Engine::Psychic => "psychic",
            Engine::Psychic2 => "psychic2",
            Engine::Async => "async",
            Engine::EspIdf => "espidf",
        }
    }

    /// Human-readable library name, for logs and hints
    pub fn display_name(&self) -> &'static str {
        match self {
            Engine::Psychic => "PsychicHttpServer",
            Engine::Psychic2 => "PsychicHttpServer V2",
            Engine::Async => "ESPAsyncWebServer",
            Engine::EspIdf => "ESP-IDF",
        }
    }

    /// Whether the engine caps concurrent URI handlers and benefits from a
    /// `max_uri_handlers` sizing hint after generation
    pub fn has_handler_limit(&self) -> bool {
        !matches!(self, Engine::Async)
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Three-way feature toggle for ETag and gzip handling.
///
/// `On` and `Off` are resolved while generating; `Compiler` defers the choice to
/// the target build by emitting both branches under an `#ifdef` guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TriState {
    /// Always enabled; only the feature branch is emitted, unguarded
    #[value(name = "true")]
    On,
    /// Always disabled; the feature never appears in the output
    #[value(name = "false")]
    Off,
    /// Both branches emitted, selected by a preprocessor define at compile time
    #[value(name = "compiler")]
    Compiler,
}

// YAML reads bare `true`/`false` as booleans, so the settings file needs to
// accept both the bool form and the quoted token form.
impl<'de> Deserialize<'de> for TriState {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct TriStateVisitor;

        impl serde::de::Visitor<'_> for TriStateVisitor {
            type Value = TriState;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("true, false, or \"compiler\"")
            }

            fn visit_bool<E: serde::de::Error>(self, value: bool) -> std::result::Result<TriState, E> {
                Ok(if value { TriState::On } else { TriState::Off })
            }

            fn visit_str<E: serde::de::Error>(self, value: &str) -> std::result::Result<TriState, E> {
                match value {
                    "true" | "on" => Ok(TriState::On),
                    "false" | "off" => Ok(TriState::Off),
                    "compiler" => Ok(TriState::Compiler),
                    other => Err(E::unknown_variant(other, &["true", "false", "compiler"])),
                }
            }
        }

        deserializer.deserialize_any(TriStateVisitor)
    }
}

impl TriState {
    /// The configuration token for this state
    pub fn token(&self) -> &'static str {
        match self {
            TriState::On => "true",
            TriState::Off => "false",
            TriState::Compiler => "compiler",
        }
    }
}

impl fmt::Display for TriState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Partial configuration, as read from one source.
///
/// Every field is optional; the settings file and the command line each produce
/// one of these and [`Config::resolve`] folds them together.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Target engine token
    pub engine: Option<Engine>,

    /// Directory holding the built web assets
    pub source_dir: Option<PathBuf>,

    /// Output file path
    pub output: Option<PathBuf>,

    /// ETag toggle
    pub etag: Option<TriState>,

    /// Gzip toggle
    pub gzip: Option<TriState>,

    /// Cache max-age in seconds (0 means `no-cache`)
    pub cache_time: Option<u32>,

    /// Version string embedded into the output
    pub app_version: Option<String>,

    /// Name of the generated registration function
    pub init_fn: Option<String>,

    /// Prefix for generated macros, manifest types, and the hook
    pub prefix: Option<String>,

    /// URL prefix under which all routes are mounted
    pub base_path: Option<String>,

    /// Exclusion globs (replaces the default list)
    pub exclude: Option<Vec<String>>,

    /// Raw-size budget as a size literal (`500000`, `512k`, `2m`)
    pub max_size: Option<String>,

    /// Gzip-size budget as a size literal
    pub max_gzip_size: Option<String>,

    /// Skip the default-document check
    pub no_index_check: Option<bool>,

    /// Embed the generation timestamp into the header comment
    pub created: Option<bool>,
}

impl Settings {
    /// Load settings from a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::SettingsNotFound {
                path: path.display().to_string(),
            });
        }
        let contents = std::fs::read_to_string(path)?;
        let settings: Settings = serde_yaml::from_str(&contents)?;
        Ok(settings)
    }

    /// Merge with a lower-precedence source; values present in `self` win
    pub fn or(self, fallback: Settings) -> Settings {
        Settings {
            engine: self.engine.or(fallback.engine),
            source_dir: self.source_dir.or(fallback.source_dir),
            output: self.output.or(fallback.output),
            etag: self.etag.or(fallback.etag),
            gzip: self.gzip.or(fallback.gzip),
            cache_time: self.cache_time.or(fallback.cache_time),
            app_version: self.app_version.or(fallback.app_version),
            init_fn: self.init_fn.or(fallback.init_fn),
            prefix: self.prefix.or(fallback.prefix),
            base_path: self.base_path.or(fallback.base_path),
            exclude: self.exclude.or(fallback.exclude),
            max_size: self.max_size.or(fallback.max_size),
            max_gzip_size: self.max_gzip_size.or(fallback.max_gzip_size),
            no_index_check: self.no_index_check.or(fallback.no_index_check),
            created: self.created.or(fallback.created),
        }
    }
}

/// Resolved, validated configuration. Read-only for the rest of the pipeline.
#[derive(Debug, Clone)]
pub struct Config {
    /// Target engine
    pub engine: Engine,

    /// Directory holding the built web assets
    pub source_dir: PathBuf,

    /// Output file path
    pub output: PathBuf,

    /// ETag toggle
    pub etag: TriState,

    /// Gzip toggle
    pub gzip: TriState,

    /// Cache max-age in seconds (0 means `no-cache`)
    pub cache_time: u32,

    /// Version string embedded into the output (empty = omitted)
    pub app_version: String,

    /// Name of the generated registration function
    pub init_fn: String,

    /// Prefix for generated macros, manifest types, and the hook
    pub prefix: String,

    /// URL prefix under which all routes are mounted (empty = root)
    pub base_path: String,

    /// Exclusion globs
    pub exclude: Vec<String>,

    /// Raw-size budget in bytes
    pub max_size: Option<u64>,

    /// Gzip-size budget in bytes
    pub max_gzip_size: Option<u64>,

    /// Skip the default-document check
    pub no_index_check: bool,

    /// Embed the generation timestamp into the header comment
    pub created: bool,
}

impl Config {
    /// Fill defaults and validate a merged [`Settings`] into a usable config.
    ///
    /// `source_dir` is the one setting without a default; resolution fails when
    /// no source provided it.
    pub fn resolve(settings: Settings) -> Result<Self> {
        let source_dir = settings.source_dir.ok_or(Error::InvalidValue {
            field: "source-dir",
            message: "required (pass --source-dir or set source_dir in webkiln.yaml)".to_string(),
        })?;

        let config = Config {
            engine: settings.engine.unwrap_or(Engine::Psychic),
            source_dir,
            output: settings.output.unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT)),
            etag: settings.etag.unwrap_or(TriState::Off),
            gzip: settings.gzip.unwrap_or(TriState::On),
            cache_time: settings.cache_time.unwrap_or(0),
            app_version: settings.app_version.unwrap_or_default(),
            init_fn: settings.init_fn.unwrap_or_else(|| DEFAULT_INIT_FN.to_string()),
            prefix: settings.prefix.unwrap_or_else(|| DEFAULT_PREFIX.to_string()),
            base_path: settings.base_path.unwrap_or_default(),
            exclude: settings
                .exclude
                .unwrap_or_else(|| DEFAULT_EXCLUDES.iter().map(|s| s.to_string()).collect()),
            max_size: settings.max_size.as_deref().map(parse_size).transpose()?,
            max_gzip_size: settings.max_gzip_size.as_deref().map(parse_size).transpose()?,
            no_index_check: settings.no_index_check.unwrap_or(false),
            created: settings.created.unwrap_or(false),
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate value shapes and the source directory
    pub fn validate(&self) -> Result<()> {
        validate_identifier("init-fn", &self.init_fn)?;
        validate_identifier("prefix", &self.prefix)?;
        validate_base_path(&self.base_path)?;

        if !self.source_dir.exists() {
            return Err(Error::SourceDirMissing {
                path: self.source_dir.display().to_string(),
            });
        }
        if !self.source_dir.is_dir() {
            return Err(Error::SourceDirNotDirectory {
                path: self.source_dir.display().to_string(),
            });
        }

        Ok(())
    }

    /// The bare route every default document answers on
    pub fn bare_path(&self) -> &str {
        if self.base_path.is_empty() {
            "/"
        } else {
            &self.base_path
        }
    }

    /// Full route path for an asset's relative path
    pub fn route_path(&self, relative_path: &str) -> String {
        format!("{}/{}", self.base_path, relative_path)
    }

    /// One-line `key=value` rendering of the effective configuration, used for
    /// the generated header comment and the startup log
    pub fn summary(&self) -> String {
        let mut parts = vec![
            format!("engine={}", self.engine),
            format!("source={}", self.source_dir.display()),
            format!("output={}", self.output.display()),
            format!("etag={}", self.etag),
            format!("gzip={}", self.gzip),
            format!("cachetime={}", self.cache_time),
        ];

        if !self.app_version.is_empty() {
            parts.push(format!("version={}", self.app_version));
        }
        parts.push(format!("initfn={}", self.init_fn));
        parts.push(format!("prefix={}", self.prefix));
        if !self.base_path.is_empty() {
            parts.push(format!("basepath={}", self.base_path));
        }
        if let Some(max) = self.max_size {
            parts.push(format!("maxsize={}", max));
        }
        if let Some(max) = self.max_gzip_size {
            parts.push(format!("maxgzipsize={}", max));
        }
        if !self.exclude.is_empty() {
            parts.push(format!("exclude=[{}]", self.exclude.join(", ")));
        }

        parts.join(" ")
    }
}

/// Parse a size literal: a positive decimal number with an optional `k`/`m`
/// suffix (×1024 / ×1048576), e.g. `500000`, `512k`, `1.5m`.
pub fn parse_size(input: &str) -> Result<u64> {
    let captures = SIZE_LITERAL
        .captures(input.trim())
        .ok_or_else(|| Error::InvalidValue {
            field: "size",
            message: format!("'{input}' is not a size (use a number with optional k/m suffix)"),
        })?;

    // The pattern only admits digits and one dot, so the parse cannot fail.
    let value: f64 = captures[1].parse().map_err(|_| Error::InvalidValue {
        field: "size",
        message: format!("'{input}' is out of range"),
    })?;

    let multiplier = match captures.get(2).map(|m| m.as_str()) {
        Some("k") | Some("K") => 1024.0,
        Some("m") | Some("M") => 1024.0 * 1024.0,
        _ => 1.0,
    };

    let bytes = (value * multiplier) as u64;
    if bytes == 0 {
        return Err(Error::InvalidValue {
            field: "size",
            message: format!("'{input}' must be a positive size"),
        });
    }
    Ok(bytes)
}

fn validate_identifier(field: &'static str, value: &str) -> Result<()> {
    if C_IDENTIFIER.is_match(value) {
        Ok(())
    } else {
        Err(Error::InvalidValue {
            field,
            message: format!("'{value}' is not a valid C identifier"),
        })
    }
}

/// Validate a base path: empty, or `/`-prefixed with no trailing slash and no
/// empty segments
pub fn validate_base_path(value: &str) -> Result<()> {
    if value.is_empty() {
        return Ok(());
    }
    if !value.starts_with('/') {
        return Err(Error::InvalidValue {
            field: "base-path",
            message: format!("'{value}' must start with '/'"),
        });
    }
    if value.ends_with('/') {
        return Err(Error::InvalidValue {
            field: "base-path",
            message: format!("'{value}' must not end with '/'"),
        });
    }
    if value.contains("//") {
        return Err(Error::InvalidValue {
            field: "base-path",
            message: format!("'{value}' must not contain empty segments"),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn minimal_settings(dir: &Path) -> Settings {
        Settings {
            source_dir: Some(dir.to_path_buf()),
            ..Settings::default()
        }
    }

    #[test]
    fn test_resolve_applies_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::resolve(minimal_settings(dir.path())).unwrap();

        assert_eq!(config.engine, Engine::Psychic);
        assert_eq!(config.etag, TriState::Off);
        assert_eq!(config.gzip, TriState::On);
        assert_eq!(config.cache_time, 0);
        assert_eq!(config.prefix, "WEBKILN");
        assert_eq!(config.init_fn, "initStaticAssets");
        assert_eq!(config.output, PathBuf::from("webkiln.h"));
        assert_eq!(config.exclude.len(), DEFAULT_EXCLUDES.len());
    }

    #[test]
    fn test_resolve_requires_source_dir() {
        let err = Config::resolve(Settings::default()).unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_CONFIG);
    }

    #[test]
    fn test_resolve_rejects_missing_source_dir() {
        let settings = Settings {
            source_dir: Some(PathBuf::from("/definitely/not/here")),
            ..Settings::default()
        };
        let err = Config::resolve(settings).unwrap_err();
        assert!(matches!(err, Error::SourceDirMissing { .. }));
    }

    #[test]
    fn test_resolve_rejects_file_as_source_dir() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("plain.txt");
        std::fs::write(&file, "x").unwrap();

        let settings = Settings {
            source_dir: Some(file),
            ..Settings::default()
        };
        let err = Config::resolve(settings).unwrap_err();
        assert!(matches!(err, Error::SourceDirNotDirectory { .. }));
    }

    #[test]
    fn test_cli_settings_override_file_settings() {
        let dir = tempfile::tempdir().unwrap();
        let cli = Settings {
            source_dir: Some(dir.path().to_path_buf()),
            gzip: Some(TriState::Off),
            ..Settings::default()
        };
        let file = Settings {
            gzip: Some(TriState::Compiler),
            etag: Some(TriState::On),
            prefix: Some("MYAPP".to_string()),
            ..Settings::default()
        };

        let config = Config::resolve(cli.or(file)).unwrap();
        assert_eq!(config.gzip, TriState::Off);
        assert_eq!(config.etag, TriState::On);
        assert_eq!(config.prefix, "MYAPP");
    }

    #[test]
    fn test_settings_load_from_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("webkiln.yaml");
        std::fs::write(
            &path,
            "engine: espidf\netag: compiler\ncache_time: 3600\nexclude:\n  - '*.map'\n",
        )
        .unwrap();

        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.engine, Some(Engine::EspIdf));
        assert_eq!(settings.etag, Some(TriState::Compiler));
        assert_eq!(settings.cache_time, Some(3600));
        assert_eq!(settings.exclude, Some(vec!["*.map".to_string()]));
    }

    #[test]
    fn test_settings_tri_state_accepts_yaml_booleans() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("webkiln.yaml");
        std::fs::write(&path, "etag: true\ngzip: false\n").unwrap();

        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.etag, Some(TriState::On));
        assert_eq!(settings.gzip, Some(TriState::Off));
    }

    #[test]
    fn test_settings_load_rejects_unknown_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("webkiln.yaml");
        std::fs::write(&path, "engine: psychic\ncompression: best\n").unwrap();

        assert!(Settings::load(&path).is_err());
    }

    #[test]
    fn test_settings_load_missing_file() {
        let err = Settings::load("/no/such/webkiln.yaml").unwrap_err();
        assert!(matches!(err, Error::SettingsNotFound { .. }));
    }

    #[rstest]
    #[case("500000", 500_000)]
    #[case("512k", 524_288)]
    #[case("512K", 524_288)]
    #[case("2m", 2_097_152)]
    #[case("1.5m", 1_572_864)]
    #[case("1.5k", 1_536)]
    fn test_parse_size_accepts(#[case] input: &str, #[case] expected: u64) {
        assert_eq!(parse_size(input).unwrap(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("abc")]
    #[case("-5k")]
    #[case("12g")]
    #[case("0")]
    #[case("k")]
    fn test_parse_size_rejects(#[case] input: &str) {
        assert!(parse_size(input).is_err());
    }

    #[rstest]
    #[case("")]
    #[case("/ui")]
    #[case("/deeply/nested/mount")]
    fn test_base_path_accepts(#[case] input: &str) {
        assert!(validate_base_path(input).is_ok());
    }

    #[rstest]
    #[case("ui")]
    #[case("/ui/")]
    #[case("/")]
    #[case("/a//b")]
    fn test_base_path_rejects(#[case] input: &str) {
        assert!(validate_base_path(input).is_err());
    }

    #[test]
    fn test_identifier_validation() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = minimal_settings(dir.path());
        settings.init_fn = Some("2fast".to_string());
        assert!(Config::resolve(settings).is_err());

        let mut settings = minimal_settings(dir.path());
        settings.prefix = Some("MY APP".to_string());
        assert!(Config::resolve(settings).is_err());

        let mut settings = minimal_settings(dir.path());
        settings.prefix = Some("_OK_2".to_string());
        assert!(Config::resolve(settings).is_ok());
    }

    #[test]
    fn test_route_paths() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = minimal_settings(dir.path());
        settings.base_path = Some("/ui".to_string());
        let config = Config::resolve(settings).unwrap();

        assert_eq!(config.route_path("index.html"), "/ui/index.html");
        assert_eq!(config.bare_path(), "/ui");

        let config = Config::resolve(minimal_settings(dir.path())).unwrap();
        assert_eq!(config.route_path("index.html"), "/index.html");
        assert_eq!(config.bare_path(), "/");
    }

    #[test]
    fn test_summary_lists_effective_values() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = minimal_settings(dir.path());
        settings.engine = Some(Engine::EspIdf);
        settings.etag = Some(TriState::Compiler);
        settings.base_path = Some("/app".to_string());
        settings.app_version = Some("v2.1.0".to_string());
        let config = Config::resolve(settings).unwrap();

        let summary = config.summary();
        assert!(summary.contains("engine=espidf"));
        assert!(summary.contains("etag=compiler"));
        assert!(summary.contains("gzip=true"));
        assert!(summary.contains("basepath=/app"));
        assert!(summary.contains("version=v2.1.0"));
    }

    #[test]
    fn test_engine_tokens() {
        assert_eq!(Engine::Psychic.token(), "psychic");
        assert_eq!(Engine::Psychic2.token(), "psychic2");
        assert_eq!(Engine::Async.token(), "async");
        assert_eq!(Engine::EspIdf.token(), "espidf");
    }

    #[test]
    fn test_handler_limit_hint_engines() {
        assert!(Engine::Psychic.has_handler_limit());
        assert!(Engine::Psychic2.has_handler_limit());
        assert!(Engine::EspIdf.has_handler_limit());
        assert!(!Engine::Async.has_handler_limit());
    }
}
