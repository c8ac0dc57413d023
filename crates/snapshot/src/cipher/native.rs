//! In-process snapshot encryption: Argon2id key derivation + AES-256-GCM.
//!
//! Layout of an encrypted snapshot:
//!
//! ```text
//! magic "EXPSNAP1" | m_cost u32 LE | t_cost u32 LE | p_cost u32 LE | salt (16) | nonce (12) | ciphertext + tag
//! ```
//!
//! The Argon2 parameters travel with the data so a snapshot stays readable
//! when the defaults change.
use aes_gcm::{
    Aes256Gcm, Nonce,
    aead::{Aead, KeyInit, OsRng, rand_core::RngCore},
};
use argon2::{Algorithm, Argon2, Params, Version};
use async_trait::async_trait;
use zeroize::Zeroizing;

use crate::{
    Passphrase,
    error::{Result, SnapshotError},
};

use super::Cipher;

const MAGIC: &[u8; 8] = b"EXPSNAP1";
const SALT_SIZE: usize = 16;
const NONCE_SIZE: usize = 12;
const HEADER_SIZE: usize = MAGIC.len() + 12 + SALT_SIZE + NONCE_SIZE;
/// Upper bound on the memory cost accepted from a header (1 GiB).
const MAX_MEMORY_KIB: u32 = 1 << 20;

/// Argon2id cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NativeParams {
    /// Memory cost in KiB
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for NativeParams {
    fn default() -> Self {
        Self {
            memory_kib: 65536,
            iterations: 3,
            parallelism: 4,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct NativeCipher {
    params: NativeParams,
}

impl NativeCipher {
    pub fn new(params: NativeParams) -> Self {
        Self { params }
    }
}

fn derive_key(
    passphrase: &Passphrase,
    salt: &[u8],
    params: NativeParams,
) -> Result<Zeroizing<[u8; 32]>> {
    let argon2_params = Params::new(
        params.memory_kib,
        params.iterations,
        params.parallelism,
        Some(32),
    )
    .map_err(|e| SnapshotError::Cipher(format!("invalid Argon2 parameters: {e}")))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, argon2_params);

    let mut key = Zeroizing::new([0u8; 32]);
    argon2
        .hash_password_into(passphrase.expose().as_bytes(), salt, &mut key[..])
        .map_err(|e| SnapshotError::Cipher(format!("key derivation failed: {e}")))?;
    Ok(key)
}

fn seal(plaintext: &[u8], passphrase: &Passphrase, params: NativeParams) -> Result<Vec<u8>> {
    let mut salt = [0u8; SALT_SIZE];
    OsRng.fill_bytes(&mut salt);
    let mut nonce = [0u8; NONCE_SIZE];
    OsRng.fill_bytes(&mut nonce);

    let key = derive_key(passphrase, &salt, params)?;
    let cipher = Aes256Gcm::new_from_slice(&key[..])
        .map_err(|e| SnapshotError::Cipher(format!("failed to create cipher: {e}")))?;
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce), plaintext)
        .map_err(|e| SnapshotError::Cipher(format!("encryption failed: {e}")))?;

    let mut out = Vec::with_capacity(HEADER_SIZE + ciphertext.len());
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&params.memory_kib.to_le_bytes());
    out.extend_from_slice(&params.iterations.to_le_bytes());
    out.extend_from_slice(&params.parallelism.to_le_bytes());
    out.extend_from_slice(&salt);
    out.extend_from_slice(&nonce);
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    let mut word = [0u8; 4];
    word.copy_from_slice(&bytes[offset..offset + 4]);
    u32::from_le_bytes(word)
}

fn open(data: &[u8], passphrase: &Passphrase) -> Result<Vec<u8>> {
    if data.len() < HEADER_SIZE || &data[..MAGIC.len()] != MAGIC {
        return Err(SnapshotError::Cipher(
            "not an encrypted snapshot".to_string(),
        ));
    }

    let params = NativeParams {
        memory_kib: read_u32(data, 8),
        iterations: read_u32(data, 12),
        parallelism: read_u32(data, 16),
    };
    if params.memory_kib > MAX_MEMORY_KIB {
        return Err(SnapshotError::Cipher(format!(
            "memory cost {} KiB exceeds limit",
            params.memory_kib
        )));
    }

    let salt_start = MAGIC.len() + 12;
    let nonce_start = salt_start + SALT_SIZE;
    let salt = &data[salt_start..nonce_start];
    let nonce = &data[nonce_start..HEADER_SIZE];

    let key = derive_key(passphrase, salt, params)?;
    let cipher = Aes256Gcm::new_from_slice(&key[..])
        .map_err(|e| SnapshotError::Cipher(format!("failed to create cipher: {e}")))?;
    cipher
        .decrypt(Nonce::from_slice(nonce), &data[HEADER_SIZE..])
        .map_err(|_| {
            SnapshotError::Cipher(
                "decryption failed: wrong passphrase or corrupted data".to_string(),
            )
        })
}

#[async_trait]
impl Cipher for NativeCipher {
    fn name(&self) -> &'static str {
        "native"
    }

    async fn encrypt(&self, plaintext: &[u8], passphrase: &Passphrase) -> Result<Vec<u8>> {
        let plaintext = Zeroizing::new(plaintext.to_vec());
        let passphrase = passphrase.clone();
        let params = self.params;
        tokio::task::spawn_blocking(move || seal(&plaintext, &passphrase, params))
            .await
            .map_err(|e| SnapshotError::Cipher(format!("encryption task failed: {e}")))?
    }

    async fn decrypt(&self, ciphertext: &[u8], passphrase: &Passphrase) -> Result<Vec<u8>> {
        let ciphertext = ciphertext.to_vec();
        let passphrase = passphrase.clone();
        tokio::task::spawn_blocking(move || open(&ciphertext, &passphrase))
            .await
            .map_err(|e| SnapshotError::Cipher(format!("decryption task failed: {e}")))?
    }
}
