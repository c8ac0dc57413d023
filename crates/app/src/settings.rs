//! Settings for the `expenses` binary, read from `settings.toml` and
//! `EXPENSES_*` environment variables (nested keys use `__`, e.g.
//! `EXPENSES_SERVER__PORT=8080`).
//!
//! Snapshot mode is enabled by the presence of a `[sync]` section.
use std::path::PathBuf;

use config::{Config, Environment, File};
use serde::Deserialize;

use crate::error::Result;

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct App {
    pub level: String,
}

impl Default for App {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Server {
    pub bind: String,
    pub port: u16,
    /// Database used in plain mode.
    pub database: PathBuf,
    /// Snapshot sessions unused for this long are forgotten.
    pub session_idle_minutes: u64,
}

impl Default for Server {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 5000,
            database: PathBuf::from("data.db"),
            session_idle_minutes: 12 * 60,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CipherKind {
    #[default]
    Gpg,
    Native,
}

#[derive(Debug, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Remote {
    /// Google Drive; `token.json` and `credentials.json` live in `config_dir`.
    Drive {
        #[serde(default = "current_dir")]
        config_dir: PathBuf,
    },
    Directory { path: PathBuf },
}

impl Default for Remote {
    fn default() -> Self {
        Remote::Drive {
            config_dir: current_dir(),
        }
    }
}

fn current_dir() -> PathBuf {
    PathBuf::from(".")
}

#[derive(Debug, Deserialize)]
pub struct SyncSettings {
    pub file_id: String,
    #[serde(default = "SyncSettings::default_database")]
    pub database: PathBuf,
    #[serde(default = "SyncSettings::default_encrypted")]
    pub encrypted: PathBuf,
    #[serde(default = "SyncSettings::default_backup_dir")]
    pub backup_dir: PathBuf,
    #[serde(default)]
    pub cipher: CipherKind,
    #[serde(default = "SyncSettings::default_gpg_program")]
    pub gpg_program: PathBuf,
    /// gpg home directory; gpg's own default when unset.
    #[serde(default)]
    pub gpg_homedir: Option<PathBuf>,
    #[serde(default)]
    pub remote: Remote,
}

impl SyncSettings {
    fn default_database() -> PathBuf {
        PathBuf::from("expenses.db")
    }

    fn default_encrypted() -> PathBuf {
        PathBuf::from("expenses.db.gpg")
    }

    fn default_backup_dir() -> PathBuf {
        PathBuf::from("backups")
    }

    fn default_gpg_program() -> PathBuf {
        PathBuf::from("gpg")
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub app: App,
    pub server: Server,
    pub sync: Option<SyncSettings>,
}

impl Settings {
    /// Load `path` (optional) and layer the environment on top.
    pub fn new(path: &str) -> Result<Self> {
        let settings = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(
                Environment::with_prefix("EXPENSES")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    #[cfg(test)]
    fn from_toml(source: &str) -> Result<Self> {
        let settings = Config::builder()
            .add_source(File::from_str(source, config::FileFormat::Toml))
            .build()?;
        Ok(settings.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_means_plain_mode_with_defaults() {
        let settings = Settings::from_toml("").unwrap();

        assert_eq!(settings.app.level, "info");
        assert_eq!(settings.server.bind, "127.0.0.1");
        assert_eq!(settings.server.port, 5000);
        assert_eq!(settings.server.database, PathBuf::from("data.db"));
        assert_eq!(settings.server.session_idle_minutes, 720);
        assert!(settings.sync.is_none());
    }

    #[test]
    fn sync_section_fills_in_defaults() {
        let settings = Settings::from_toml(
            r#"
            [sync]
            file_id = "1AbC"
            "#,
        )
        .unwrap();

        let sync = settings.sync.unwrap();
        assert_eq!(sync.file_id, "1AbC");
        assert_eq!(sync.database, PathBuf::from("expenses.db"));
        assert_eq!(sync.encrypted, PathBuf::from("expenses.db.gpg"));
        assert_eq!(sync.backup_dir, PathBuf::from("backups"));
        assert_eq!(sync.cipher, CipherKind::Gpg);
        assert_eq!(sync.gpg_homedir, None);
        assert_eq!(sync.remote, Remote::default());
    }

    #[test]
    fn directory_remote_and_native_cipher() {
        let settings = Settings::from_toml(
            r#"
            [server]
            port = 8080

            [sync]
            file_id = "expenses"
            cipher = "native"
            remote = { kind = "directory", path = "/srv/snapshots" }
            "#,
        )
        .unwrap();

        assert_eq!(settings.server.port, 8080);
        let sync = settings.sync.unwrap();
        assert_eq!(sync.cipher, CipherKind::Native);
        assert_eq!(
            sync.remote,
            Remote::Directory {
                path: PathBuf::from("/srv/snapshots")
            }
        );
    }

    #[test]
    fn sync_without_file_id_is_rejected() {
        assert!(Settings::from_toml("[sync]\ncipher = \"gpg\"").is_err());
    }

    #[test]
    fn missing_file_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nothing-here.toml");
        let settings = Settings::new(path.to_str().unwrap()).unwrap();
        assert!(settings.sync.is_none());
    }
}
