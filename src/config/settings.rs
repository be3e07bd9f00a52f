use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::logging::{CONFIG_TARGET, LogLevel, Logger, json_str};
use crate::store::NodeId;

pub const SETTINGS_FILE: &str = "settings.json";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to access settings at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse settings at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Persisted user settings. Missing or unknown fields fall back to defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Relay address; empty until the connect form has been submitted.
    pub address: String,
    pub active_identity: Option<NodeId>,
    pub acknowledged_notice_version: u32,
}

/// Location of `settings.json` on disk.
#[derive(Debug, Clone)]
pub struct SettingsFile {
    path: PathBuf,
}

impl SettingsFile {
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(SETTINGS_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the settings; a missing file yields the defaults.
    pub fn load(&self) -> Result<Settings, SettingsError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Settings::default()),
            Err(source) => {
                return Err(SettingsError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        serde_json::from_str(&raw).map_err(|source| SettingsError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    pub fn persist(&self, settings: &Settings) -> Result<(), SettingsError> {
        let raw = serde_json::to_string_pretty(settings).map_err(|source| SettingsError::Parse {
            path: self.path.clone(),
            source,
        })?;
        fs::write(&self.path, raw).map_err(|source| SettingsError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

struct SettingsState {
    settings: Settings,
    file: Option<SettingsFile>,
}

/// Settings shared between views. Every update is written through to disk
/// when a file is attached; write failures are logged and the in-memory copy
/// stays authoritative.
#[derive(Clone)]
pub struct SettingsHandle {
    state: Arc<Mutex<SettingsState>>,
    logger: Logger,
}

impl SettingsHandle {
    /// Load from `file`, falling back to defaults (and logging) on failure.
    pub fn load(file: SettingsFile, logger: Logger) -> Self {
        let settings = match file.load() {
            Ok(settings) => settings,
            Err(err) => {
                logger.emit(
                    LogLevel::Warn,
                    CONFIG_TARGET,
                    "settings_load_failed",
                    [json_str("error", err.to_string())],
                );
                Settings::default()
            }
        };
        Self {
            state: Arc::new(Mutex::new(SettingsState {
                settings,
                file: Some(file),
            })),
            logger,
        }
    }

    /// Settings that are never written to disk.
    pub fn in_memory(settings: Settings) -> Self {
        Self {
            state: Arc::new(Mutex::new(SettingsState {
                settings,
                file: None,
            })),
            logger: Logger::null(),
        }
    }

    pub fn snapshot(&self) -> Settings {
        self.state
            .lock()
            .map(|state| state.settings.clone())
            .unwrap_or_default()
    }

    pub fn update(&self, change: impl FnOnce(&mut Settings)) {
        let Ok(mut state) = self.state.lock() else {
            self.logger
                .emit(LogLevel::Error, CONFIG_TARGET, "settings_poisoned", []);
            return;
        };
        change(&mut state.settings);
        if let Some(file) = &state.file {
            if let Err(err) = file.persist(&state.settings) {
                self.logger.emit(
                    LogLevel::Warn,
                    CONFIG_TARGET,
                    "settings_persist_failed",
                    [json_str("error", err.to_string())],
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::MemorySink;
    use crate::store::Identity;

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let file = SettingsFile::in_dir(dir.path());
        assert_eq!(file.load().unwrap(), Settings::default());
    }

    #[test]
    fn updates_are_written_through() {
        let dir = tempfile::tempdir().unwrap();
        let handle = SettingsHandle::load(SettingsFile::in_dir(dir.path()), Logger::null());
        let me = Identity::new("me", 3);
        handle.update(|settings| {
            settings.address = "relay.example:7117".to_string();
            settings.active_identity = Some(me.id);
        });

        let reloaded = SettingsFile::in_dir(dir.path()).load().unwrap();
        assert_eq!(reloaded.address, "relay.example:7117");
        assert_eq!(reloaded.active_identity, Some(me.id));
        assert_eq!(handle.snapshot(), reloaded);
    }

    #[test]
    fn corrupt_file_is_logged_and_defaulted() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(SETTINGS_FILE), "{ not json").unwrap();
        let sink = MemorySink::new();
        let handle = SettingsHandle::load(
            SettingsFile::in_dir(dir.path()),
            Logger::new(sink.clone()),
        );
        assert_eq!(handle.snapshot(), Settings::default());
        assert!(sink.contains("settings_load_failed"));
    }

    #[test]
    fn partial_documents_fill_in_defaults() {
        let parsed: Settings = serde_json::from_str(r#"{"address":"a:1","extra":true}"#).unwrap();
        assert_eq!(parsed.address, "a:1");
        assert_eq!(parsed.acknowledged_notice_version, 0);
    }
}
