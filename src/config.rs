use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::AppError;

pub const DEFAULT_CONFIG_FILE: &str = "docshare.toml";
pub const ENV_PREFIX: &str = "DOCSHARE";

/// Runtime configuration.
///
/// Values come from built-in defaults, then an optional TOML file, then
/// `DOCSHARE_*` environment variables (e.g. `DOCSHARE_MONGODB_URI`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AppConfig {
    pub mongodb_uri: String,
    pub mongodb_database: String,
    /// SQLite file holding offline copies.
    pub cache_path: PathBuf,
    /// Use in-memory stores seeded with demo data instead of MongoDB.
    pub demo_mode: bool,
    /// `tracing_subscriber::EnvFilter` directive used when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            mongodb_uri: "mongodb://localhost:27017".to_string(),
            mongodb_database: "docshare".to_string(),
            cache_path: PathBuf::from("docshare-offline.db"),
            demo_mode: false,
            log_filter: "docshare=info".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration, reading `file` if given or `docshare.toml` if it exists.
    ///
    /// An explicitly named file must exist.
    pub fn load(file: Option<&Path>) -> Result<Self, AppError> {
        let file_source = match file {
            Some(path) => config::File::from(path).required(true),
            None => config::File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        Self::builder()?
            .add_source(file_source)
            .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| AppError::Internal(format!("Invalid configuration: {e}")))
    }

    fn builder() -> Result<config::ConfigBuilder<config::builder::DefaultState>, AppError> {
        let defaults = Self::default();
        config::Config::builder()
            .set_default("mongodb_uri", defaults.mongodb_uri)
            .and_then(|b| b.set_default("mongodb_database", defaults.mongodb_database))
            .and_then(|b| {
                b.set_default(
                    "cache_path",
                    defaults.cache_path.to_string_lossy().into_owned(),
                )
            })
            .and_then(|b| b.set_default("demo_mode", defaults.demo_mode))
            .and_then(|b| b.set_default("log_filter", defaults.log_filter))
            .map_err(|e| AppError::Internal(format!("Invalid configuration: {e}")))
    }
}
