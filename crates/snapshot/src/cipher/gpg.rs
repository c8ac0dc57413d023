use std::{io::Write, path::PathBuf, process::Stdio};

use async_trait::async_trait;
use tokio::{io::AsyncWriteExt, process::Command};

use crate::{
    Passphrase,
    error::{Result, SnapshotError},
};

use super::Cipher;

/// Symmetric encryption through the `gpg` command line tool.
///
/// The passphrase is written to gpg's stdin (`--passphrase-fd 0`), the
/// input goes through a temporary file and the result is read from stdout.
/// Output is compatible with `gpg --symmetric` run by hand.
#[derive(Debug, Clone)]
pub struct GpgCipher {
    program: PathBuf,
    homedir: Option<PathBuf>,
}

impl Default for GpgCipher {
    fn default() -> Self {
        Self::new("gpg")
    }
}

impl GpgCipher {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            homedir: None,
        }
    }

    /// Run gpg against `homedir` instead of the default `~/.gnupg`.
    pub fn with_homedir(mut self, homedir: impl Into<PathBuf>) -> Self {
        self.homedir = Some(homedir.into());
        self
    }

    async fn run(&self, mode: &[&str], input: &[u8], passphrase: &Passphrase) -> Result<Vec<u8>> {
        let mut source = tempfile::NamedTempFile::new()?;
        source.write_all(input)?;
        source.flush()?;

        let mut command = Command::new(&self.program);
        if let Some(homedir) = &self.homedir {
            command.arg("--homedir").arg(homedir);
        }
        let mut child = command
            .args([
                "--batch",
                "--yes",
                "--quiet",
                "--no-symkey-cache",
                "--pinentry-mode",
                "loopback",
                "--passphrase-fd",
                "0",
                "--output",
                "-",
            ])
            .args(mode)
            .arg(source.path())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|err| {
                SnapshotError::Cipher(format!(
                    "failed to start {}: {err}",
                    self.program.display()
                ))
            })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| SnapshotError::Cipher("gpg stdin unavailable".to_string()))?;
        stdin.write_all(passphrase.expose().as_bytes()).await?;
        stdin.write_all(b"\n").await?;
        drop(stdin);

        let output = child.wait_with_output().await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SnapshotError::Cipher(format!(
                "gpg exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }
        Ok(output.stdout)
    }
}

#[async_trait]
impl Cipher for GpgCipher {
    fn name(&self) -> &'static str {
        "gpg"
    }

    async fn encrypt(&self, plaintext: &[u8], passphrase: &Passphrase) -> Result<Vec<u8>> {
        self.run(
            &["--symmetric", "--cipher-algo", "AES256"],
            plaintext,
            passphrase,
        )
        .await
    }

    async fn decrypt(&self, ciphertext: &[u8], passphrase: &Passphrase) -> Result<Vec<u8>> {
        self.run(&["--decrypt"], ciphertext, passphrase).await
    }
}
