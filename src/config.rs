//! Runtime settings
//!
//! Expected environment variables:
//! - ETL_DATA_DIR: Root of the data directory (optional, defaults to `data`)
//! - ETL_MANIFEST: Sources manifest YAML (optional, built-in manifest otherwise)
//! - ETL_REFRESH: Re-download and re-extract existing files (optional, `true`/`false`)
//!
//! Command line flags override the environment.

use crate::error::EtlError;
use crate::manifest::SourcesManifest;
use crate::storage::DataLayout;

use eyre::{Context, Result};
use std::path::{Path, PathBuf};

pub const DATA_DIR_VAR: &str = "ETL_DATA_DIR";
pub const MANIFEST_VAR: &str = "ETL_MANIFEST";
pub const REFRESH_VAR: &str = "ETL_REFRESH";

pub const DEFAULT_DATA_DIR: &str = "data";

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub data_dir: PathBuf,
    pub manifest: Option<PathBuf>,
    pub refresh: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            manifest: None,
            refresh: false,
        }
    }
}

impl Settings {
    /// Read settings from the environment
    ///
    /// # Errors
    /// An `ETL_REFRESH` value that isn't a boolean is a configuration error.
    pub fn from_env() -> Result<Self> {
        let mut settings = Self::default();

        if let Ok(dir) = std::env::var(DATA_DIR_VAR)
            && !dir.trim().is_empty()
        {
            settings.data_dir = PathBuf::from(dir);
        }

        if let Ok(manifest) = std::env::var(MANIFEST_VAR)
            && !manifest.trim().is_empty()
        {
            settings.manifest = Some(PathBuf::from(manifest));
        }

        if let Ok(refresh) = std::env::var(REFRESH_VAR) {
            settings.refresh = parse_flag(&refresh)
                .with_context(|| format!("Invalid {REFRESH_VAR}: {refresh}"))?;
        }

        log::debug!("Settings: {:?}", settings);
        Ok(settings)
    }

    pub fn with_data_dir(mut self, data_dir: Option<PathBuf>) -> Self {
        if let Some(dir) = data_dir {
            self.data_dir = dir;
        }
        self
    }

    pub fn with_manifest(mut self, manifest: Option<PathBuf>) -> Self {
        if manifest.is_some() {
            self.manifest = manifest;
        }
        self
    }

    /// Turn refresh on; a `false` flag leaves the environment value alone
    pub fn with_refresh(mut self, refresh: bool) -> Self {
        self.refresh |= refresh;
        self
    }

    pub fn layout(&self) -> DataLayout {
        DataLayout::new(&self.data_dir)
    }

    /// Load the configured manifest, or the built-in one
    pub fn load_manifest(&self) -> Result<SourcesManifest> {
        match &self.manifest {
            Some(path) => load_manifest_file(path),
            None => {
                log::debug!("No manifest configured, using built-in sources");
                SourcesManifest::builtin()
            }
        }
    }
}

fn load_manifest_file(path: &Path) -> Result<SourcesManifest> {
    log::info!("Loading manifest from {}", path.display());
    SourcesManifest::read(path)
}

fn parse_flag(value: &str) -> Result<bool, EtlError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "" | "0" | "false" | "no" | "off" => Ok(false),
        other => Err(EtlError::config(format!("expected a boolean, got '{other}'"))),
    }
}
