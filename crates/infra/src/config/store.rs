//! Settings file persistence.
//!
//! Remote credentials live in a `settings.toml` next to the database. The
//! store publishes every change on a watch channel so the sync engine can
//! reconnect without restarting the app. Writes go through a temp file and
//! rename so a crash never leaves a half-written settings file.

use std::path::{Path, PathBuf};

use punchclock_domain::{PunchClockError, RemoteConfig, Result};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{info, warn};

const SETTINGS_FILE: &str = "settings.toml";

#[derive(Debug, Default, Serialize, Deserialize)]
struct SettingsFile {
    #[serde(default)]
    remote: RemoteConfig,
}

/// Disk-backed settings store with live change notification.
pub struct ConfigStore {
    path: PathBuf,
    sender: watch::Sender<RemoteConfig>,
}

impl ConfigStore {
    /// Open (or initialise) the settings file under `dir`.
    ///
    /// An unreadable or malformed file is treated as absent so the app can
    /// still start; the user re-enters setup instead of hitting a wall.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let path = dir.as_ref().join(SETTINGS_FILE);
        let initial = match load_settings(&path) {
            Ok(Some(settings)) => settings.remote,
            Ok(None) => RemoteConfig::default(),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "settings unreadable, starting blank");
                RemoteConfig::default()
            }
        };

        let (sender, _) = watch::channel(initial);
        Ok(Self { path, sender })
    }

    /// Persist new remote credentials and notify watchers.
    pub fn persist(&self, config: RemoteConfig) -> Result<()> {
        let settings = SettingsFile { remote: config.clone() };
        let body = toml::to_string_pretty(&settings)
            .map_err(|err| PunchClockError::Config(format!("failed to encode settings: {err}")))?;

        let tmp_path = self.path.with_extension("toml.tmp");
        std::fs::write(&tmp_path, body).map_err(map_io_error)?;
        std::fs::rename(&tmp_path, &self.path).map_err(map_io_error)?;

        info!(path = %self.path.display(), "settings persisted");
        self.sender.send_replace(config);
        Ok(())
    }

    /// Subscribe to config changes. The receiver starts at the current value.
    pub fn watch(&self) -> watch::Receiver<RemoteConfig> {
        self.sender.subscribe()
    }

    /// Current config snapshot.
    pub fn current(&self) -> RemoteConfig {
        self.sender.borrow().clone()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn load_settings(path: &Path) -> Result<Option<SettingsFile>> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(map_io_error(err)),
    };
    let settings = toml::from_str(&raw)
        .map_err(|err| PunchClockError::Config(format!("malformed settings file: {err}")))?;
    Ok(Some(settings))
}

fn map_io_error(err: std::io::Error) -> PunchClockError {
    PunchClockError::Config(format!("settings io error: {err}"))
}
