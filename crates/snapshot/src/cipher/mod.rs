//! Passphrase-based symmetric encryption of whole snapshots.
//!
//! [`Cipher`] is the only thing the snapshot flows know about encryption.
//! [`GpgCipher`] drives an external `gpg` binary, [`NativeCipher`] does the
//! work in process.
use async_trait::async_trait;

use crate::{Passphrase, error::Result};

pub use gpg::GpgCipher;
pub use native::{NativeCipher, NativeParams};

mod gpg;
mod native;

#[async_trait]
pub trait Cipher: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    async fn encrypt(&self, plaintext: &[u8], passphrase: &Passphrase) -> Result<Vec<u8>>;

    /// Fails with [`SnapshotError::Cipher`] on a wrong passphrase or a
    /// damaged input.
    ///
    /// [`SnapshotError::Cipher`]: crate::SnapshotError::Cipher
    async fn decrypt(&self, ciphertext: &[u8], passphrase: &Passphrase) -> Result<Vec<u8>>;
}
