//! Where the encrypted snapshot lives between sessions.
use async_trait::async_trait;

use crate::error::Result;

pub use dir::DirStore;
pub use drive::DriveStore;

mod dir;
mod drive;

/// A remote holding opaque blobs addressed by a pre-existing file id.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Human-readable provider name (e.g., "drive", "directory").
    fn name(&self) -> &'static str;

    /// Download the blob stored under `file_id`.
    async fn fetch(&self, file_id: &str) -> Result<Vec<u8>>;

    /// Overwrite the content of `file_id`. The object must already exist.
    async fn replace(&self, file_id: &str, data: Vec<u8>) -> Result<()>;
}
