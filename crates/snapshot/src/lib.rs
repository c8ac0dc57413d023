//! Encrypted database snapshots kept on a remote store.
//!
//! The remote holds a single encrypted blob under a fixed file id. A
//! [`Snapshot`] moves it between three local places:
//!
//! - the *encrypted download*, a copy of the blob as last fetched or sent;
//! - the *database*, the decrypted file the application works on;
//! - the *backup directory*, where timestamped encrypted copies accumulate.
//!
//! Nothing is retried. Concurrent writers are not coordinated: the last
//! [`Snapshot::save`] wins.
use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Arc,
};

use chrono::Local;
use tracing::instrument;
use zeroize::Zeroizing;

pub use cipher::{Cipher, GpgCipher, NativeCipher, NativeParams};
pub use error::{Result, SnapshotError};
pub use passphrase::Passphrase;
pub use remote::{DirStore, DriveStore, ObjectStore};

mod cipher;
mod error;
mod passphrase;
mod remote;

/// Local and remote locations used by a [`Snapshot`].
#[derive(Debug, Clone)]
pub struct SnapshotConfig {
    /// Id of the blob on the remote store.
    pub file_id: String,
    /// Decrypted database file.
    pub database: PathBuf,
    /// Local copy of the encrypted blob.
    pub encrypted: PathBuf,
    pub backup_dir: PathBuf,
}

pub struct Snapshot {
    config: SnapshotConfig,
    cipher: Arc<dyn Cipher>,
    remote: Arc<dyn ObjectStore>,
}

impl std::fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Snapshot")
            .field("config", &self.config)
            .field("cipher", &self.cipher.name())
            .field("remote", &self.remote.name())
            .finish()
    }
}

impl Snapshot {
    /// Return a builder for `Snapshot`.
    pub fn builder() -> SnapshotBuilder {
        SnapshotBuilder::default()
    }

    pub fn database_path(&self) -> &Path {
        &self.config.database
    }

    pub fn encrypted_path(&self) -> &Path {
        &self.config.encrypted
    }

    /// Fetch the remote blob and decrypt it into the database file.
    ///
    /// The database file is only replaced once decryption succeeded; on
    /// failure whatever was there before is left untouched.
    #[instrument(skip_all, fields(file_id = %self.config.file_id))]
    pub async fn login(&self, passphrase: &Passphrase) -> Result<()> {
        let blob = self.remote.fetch(&self.config.file_id).await?;
        let plaintext = Zeroizing::new(self.cipher.decrypt(&blob, passphrase).await?);

        write_file(&self.config.encrypted, &blob).await?;
        replace_file(&self.config.database, &plaintext).await?;
        tracing::info!(
            "snapshot decrypted to {} ({} bytes)",
            self.config.database.display(),
            plaintext.len()
        );
        Ok(())
    }

    /// Check `passphrase` against the local encrypted copy.
    ///
    /// Used when the database is already unlocked: neither the database
    /// nor the remote is touched.
    #[instrument(skip_all)]
    pub async fn verify(&self, passphrase: &Passphrase) -> Result<()> {
        let blob = tokio::fs::read(&self.config.encrypted).await?;
        self.cipher.decrypt(&blob, passphrase).await?;
        Ok(())
    }

    /// Remove a decrypted database left behind by an earlier run.
    pub async fn discard_local(&self) {
        remove_if_present(&self.config.database).await;
    }

    /// Encrypt the database and replace the remote blob with it.
    ///
    /// The encrypted download is overwritten first; the database file itself
    /// is only read.
    #[instrument(skip_all, fields(file_id = %self.config.file_id))]
    pub async fn save(&self, passphrase: &Passphrase) -> Result<()> {
        let sealed = self.seal_database(passphrase).await?;
        write_file(&self.config.encrypted, &sealed).await?;
        self.remote.replace(&self.config.file_id, sealed).await?;
        tracing::info!("snapshot uploaded through {}", self.remote.name());
        Ok(())
    }

    /// Encrypt the database into a new timestamped file of the backup
    /// directory. The remote is not touched.
    #[instrument(skip_all)]
    pub async fn local_copy(&self, passphrase: &Passphrase) -> Result<PathBuf> {
        let sealed = self.seal_database(passphrase).await?;
        tokio::fs::create_dir_all(&self.config.backup_dir).await?;

        let path = self.config.backup_dir.join(backup_file_name(Local::now()));
        tokio::fs::write(&path, sealed).await?;
        tracing::info!("local copy written to {}", path.display());
        Ok(path)
    }

    /// Save if possible, then drop every local trace of the snapshot.
    ///
    /// A failed save is logged and otherwise ignored: the local files are
    /// removed regardless.
    #[instrument(skip_all, fields(file_id = %self.config.file_id))]
    pub async fn logout(&self, passphrase: &Passphrase) {
        if let Err(err) = self.save(passphrase).await {
            tracing::warn!("save before logout failed: {err}");
        }
        remove_if_present(&self.config.database).await;
        remove_if_present(&self.config.encrypted).await;
    }

    async fn seal_database(&self, passphrase: &Passphrase) -> Result<Vec<u8>> {
        let plaintext = tokio::fs::read(&self.config.database).await?;
        self.cipher.encrypt(&plaintext, passphrase).await
    }
}

/// `expenses_<YYYYmmdd_HHMMSS>.db.gpg`
fn backup_file_name<Tz: chrono::TimeZone>(at: chrono::DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("expenses_{}.db.gpg", at.format("%Y%m%d_%H%M%S"))
}

async fn write_file(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, data).await?;
    Ok(())
}

/// Write `data` next to `path`, then rename it into place.
async fn replace_file(path: &Path, data: &[u8]) -> Result<()> {
    let parent = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => parent.to_path_buf(),
        None => PathBuf::from("."),
    };
    tokio::fs::create_dir_all(&parent).await?;

    let staged = tempfile::NamedTempFile::new_in(&parent)?;
    tokio::fs::write(staged.path(), data).await?;
    staged.persist(path).map_err(|err| err.error)?;
    Ok(())
}

async fn remove_if_present(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => tracing::debug!("removed {}", path.display()),
        Err(err) if err.kind() == ErrorKind::NotFound => {}
        Err(err) => tracing::warn!("failed to remove {}: {err}", path.display()),
    }
}

/// The builder for `Snapshot`
#[derive(Default)]
pub struct SnapshotBuilder {
    config: Option<SnapshotConfig>,
    cipher: Option<Arc<dyn Cipher>>,
    remote: Option<Arc<dyn ObjectStore>>,
}

impl SnapshotBuilder {
    pub fn config(mut self, config: SnapshotConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn cipher(mut self, cipher: impl Cipher + 'static) -> Self {
        self.cipher = Some(Arc::new(cipher));
        self
    }

    pub fn remote(mut self, remote: impl ObjectStore + 'static) -> Self {
        self.remote = Some(Arc::new(remote));
        self
    }

    /// Construct `Snapshot`
    pub fn build(self) -> Result<Snapshot> {
        let config = self
            .config
            .ok_or_else(|| SnapshotError::Config("missing locations".to_string()))?;
        if config.file_id.trim().is_empty() {
            return Err(SnapshotError::Config("file id must not be empty".to_string()));
        }
        let cipher = self
            .cipher
            .ok_or_else(|| SnapshotError::Config("missing cipher".to_string()))?;
        let remote = self
            .remote
            .ok_or_else(|| SnapshotError::Config("missing remote store".to_string()))?;

        Ok(Snapshot {
            config,
            cipher,
            remote,
        })
    }
}
