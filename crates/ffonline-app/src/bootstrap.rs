use std::path::{Path, PathBuf};
use std::sync::Arc;

use ffonline_config::{PipelineSettings, TemplateCatalog};
use ffonline_core::MediaEngine;
use ffonline_engine_ffmpeg::{DEFAULT_BINARY, FfmpegEngine};
use ffonline_telemetry::{DEFAULT_LOG_LEVEL, LogFormat, LoggingConfig};
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::workbench::Workbench;

/// Path to a JSON [`PipelineSettings`] document.
pub const SETTINGS_ENV: &str = "FFONLINE_SETTINGS";
/// Path to a JSON template catalog replacing the built-in one.
pub const CATALOG_ENV: &str = "FFONLINE_CATALOG";
/// Log level used when `RUST_LOG` is unset.
pub const LOG_LEVEL_ENV: &str = "FFONLINE_LOG_LEVEL";
/// `json` or `pretty`.
pub const LOG_FORMAT_ENV: &str = "FFONLINE_LOG_FORMAT";
/// Path of the ffmpeg executable.
pub const FFMPEG_ENV: &str = "FFONLINE_FFMPEG";

/// Everything needed to build a [`Workbench`], resolved from the environment.
#[derive(Debug, Clone)]
pub struct BootstrapDependencies {
    log_level: String,
    log_format: LogFormat,
    settings: PipelineSettings,
    catalog: TemplateCatalog,
    ffmpeg_binary: PathBuf,
}

impl BootstrapDependencies {
    /// Resolve dependencies from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a referenced settings or catalog file cannot be
    /// read or fails validation.
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolve dependencies through `lookup`; blank values count as unset.
    ///
    /// # Errors
    ///
    /// See [`BootstrapDependencies::from_env`].
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let settings = match var(SETTINGS_ENV) {
            Some(path) => {
                let raw = read_config_file("settings.read", Path::new(&path))?;
                PipelineSettings::from_json(&raw)
                    .map_err(|err| AppError::settings("settings.parse", err))?
            }
            None => PipelineSettings::default(),
        };
        let catalog = match var(CATALOG_ENV) {
            Some(path) => {
                let raw = read_config_file("catalog.read", Path::new(&path))?;
                TemplateCatalog::from_json(&raw)
                    .map_err(|err| AppError::catalog("catalog.parse", err))?
            }
            None => TemplateCatalog::builtin(),
        };

        Ok(Self {
            log_level: var(LOG_LEVEL_ENV).unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
            log_format: var(LOG_FORMAT_ENV)
                .map_or_else(LogFormat::infer, |value| LogFormat::from_str_lossy(&value)),
            settings,
            catalog,
            ffmpeg_binary: var(FFMPEG_ENV).map_or_else(|| PathBuf::from(DEFAULT_BINARY), PathBuf::from),
        })
    }

    /// Resolved pipeline settings.
    #[must_use]
    pub const fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Resolved template catalog.
    #[must_use]
    pub const fn catalog(&self) -> &TemplateCatalog {
        &self.catalog
    }

    /// ffmpeg executable the native engine will invoke.
    #[must_use]
    pub fn ffmpeg_binary(&self) -> &Path {
        &self.ffmpeg_binary
    }

    /// Configured log level.
    #[must_use]
    pub fn log_level(&self) -> &str {
        &self.log_level
    }

    /// Configured log format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Build a workbench over `engine` with the resolved catalog and settings.
    #[must_use]
    pub fn into_workbench(self, engine: Arc<dyn MediaEngine>) -> Workbench {
        Workbench::new(engine, self.catalog, self.settings)
    }
}

/// Boot a session from the environment: logging, native engine, engine load.
///
/// # Errors
///
/// Returns an error if configuration is invalid, logging cannot be
/// installed, or the engine cannot be created or loaded.
pub async fn run_app() -> AppResult<Workbench> {
    let dependencies = BootstrapDependencies::from_env()?;
    let logging = LoggingConfig {
        level: dependencies.log_level(),
        format: dependencies.log_format(),
        ..LoggingConfig::default()
    };
    ffonline_telemetry::init_logging(&logging)
        .map_err(|err| AppError::telemetry("telemetry.init", err))?;

    info!(
        ffmpeg = %dependencies.ffmpeg_binary().display(),
        templates = dependencies.catalog().len(),
        "ffonline session bootstrap starting"
    );
    let engine = FfmpegEngine::with_binary(dependencies.ffmpeg_binary())
        .map_err(|err| AppError::engine("engine.new", err))?;
    let workbench = dependencies.into_workbench(Arc::new(engine));
    workbench.initialise().await?;
    Ok(workbench)
}

fn read_config_file(operation: &'static str, path: &Path) -> AppResult<String> {
    std::fs::read_to_string(path).map_err(|source| AppError::Io {
        operation,
        path: Some(path.to_path_buf()),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::error::Error;
    use std::io::Write;

    type TestResult<T> = Result<T, Box<dyn Error>>;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    #[test]
    fn empty_environment_uses_defaults() -> TestResult<()> {
        let deps = BootstrapDependencies::from_lookup(lookup(&[(FFMPEG_ENV, "  ")]))?;
        assert_eq!(deps.settings(), &PipelineSettings::default());
        assert_eq!(deps.catalog(), &TemplateCatalog::builtin());
        assert_eq!(deps.ffmpeg_binary(), Path::new(DEFAULT_BINARY));
        assert_eq!(deps.log_level(), DEFAULT_LOG_LEVEL);
        assert_eq!(deps.log_format(), LogFormat::infer());
        Ok(())
    }

    #[test]
    fn files_and_overrides_are_honoured() -> TestResult<()> {
        let mut settings = tempfile::NamedTempFile::new()?;
        settings.write_all(br#"{"archive_name": "bundle.zip", "detection": "strict"}"#)?;
        let path = settings.path().display().to_string();

        let deps = BootstrapDependencies::from_lookup(lookup(&[
            (SETTINGS_ENV, path.as_str()),
            (LOG_LEVEL_ENV, "debug"),
            (LOG_FORMAT_ENV, "json"),
            (FFMPEG_ENV, "/opt/ffmpeg/bin/ffmpeg"),
        ]))?;
        assert_eq!(deps.settings().archive_name, "bundle.zip");
        assert_eq!(deps.log_level(), "debug");
        assert_eq!(deps.log_format(), LogFormat::Json);
        assert_eq!(deps.ffmpeg_binary(), Path::new("/opt/ffmpeg/bin/ffmpeg"));
        Ok(())
    }

    #[test]
    fn unreadable_or_invalid_files_are_reported() -> TestResult<()> {
        let missing = BootstrapDependencies::from_lookup(lookup(&[(
            SETTINGS_ENV,
            "/definitely/missing/settings.json",
        )]));
        assert!(matches!(missing, Err(AppError::Io { operation: "settings.read", .. })));

        let mut catalog = tempfile::NamedTempFile::new()?;
        catalog.write_all(b"[]")?;
        let path = catalog.path().display().to_string();
        let invalid = BootstrapDependencies::from_lookup(lookup(&[(CATALOG_ENV, path.as_str())]));
        assert!(matches!(invalid, Err(AppError::Catalog { .. })));
        Ok(())
    }
}
