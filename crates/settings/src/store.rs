use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use crate::config::KioskConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to serialize config {path}: {source}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to write config {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to prepare directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Kiosk configuration bound to its file on disk.
/// 與設定檔綁定的自助機設定。
#[derive(Debug)]
pub struct ConfigStore {
    path: PathBuf,
    data: KioskConfig,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>, config: KioskConfig) -> Self {
        let mut data = config;
        data.sanitize();
        Self {
            path: path.into(),
            data,
        }
    }

    /// Loads `path`, falling back to defaults when the file does not exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            debug!(path = %path.display(), "config file missing, using defaults");
            let mut data = KioskConfig::default();
            data.sanitize();
            return Ok(Self { path, data });
        }

        let data = read_config(&path)?;
        info!(path = %path.display(), "loaded kiosk config");
        Ok(Self { path, data })
    }

    pub fn config(&self) -> &KioskConfig {
        &self.data
    }

    pub fn update<F>(&mut self, mut op: F) -> Result<(), ConfigError>
    where
        F: FnMut(&mut KioskConfig),
    {
        op(&mut self.data);
        self.data.sanitize();
        self.save()
    }

    pub fn overwrite(&mut self, config: KioskConfig) -> Result<(), ConfigError> {
        self.data = config;
        self.data.sanitize();
        self.save()
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        ensure_parent(&self.path)?;
        let payload = encode(&self.data, &self.path)?;

        let tmp_path = self.path.with_extension("tmp");
        fs::write(&tmp_path, payload.as_bytes()).map_err(|source| ConfigError::Write {
            path: tmp_path.clone(),
            source,
        })?;
        fs::rename(&tmp_path, &self.path).map_err(|source| ConfigError::Write {
            path: self.path.clone(),
            source,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn export_to(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref().to_path_buf();
        ensure_parent(&path)?;
        let payload = encode(&self.data, &path)?;
        fs::write(&path, payload.as_bytes()).map_err(|source| ConfigError::Write { path, source })
    }

    /// Replaces the current config with `source`, keeping a `.bak` copy of the
    /// file being replaced.
    pub fn import_from(&mut self, source: impl AsRef<Path>) -> Result<(), ConfigError> {
        let data = read_config(source.as_ref())?;
        self.backup_existing()?;
        self.data = data;
        self.save()
    }

    fn backup_existing(&self) -> Result<(), ConfigError> {
        if self.path.exists() {
            let backup = self.path.with_extension("bak");
            fs::copy(&self.path, &backup).map_err(|source| ConfigError::Write {
                path: backup,
                source,
            })?;
        }
        Ok(())
    }
}

fn read_config(path: &Path) -> Result<KioskConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let mut data: KioskConfig =
        serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    data.sanitize();
    Ok(data)
}

fn encode(config: &KioskConfig, path: &Path) -> Result<String, ConfigError> {
    serde_json::to_string_pretty(config).map_err(|source| ConfigError::Serialize {
        path: path.to_path_buf(),
        source,
    })
}

fn ensure_parent(path: &Path) -> Result<(), ConfigError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent).map_err(|source| ConfigError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })
        }
        _ => Ok(()),
    }
}
