use std::{
    io::ErrorKind,
    path::{Component, Path, PathBuf},
};

use async_trait::async_trait;

use crate::error::{Result, SnapshotError};

use super::ObjectStore;

/// A local directory standing in for the remote; file ids are file names.
#[derive(Debug, Clone)]
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn object_path(&self, file_id: &str) -> Result<PathBuf> {
        let mut components = Path::new(file_id).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(name)), None) => Ok(self.root.join(name)),
            _ => Err(SnapshotError::Remote(format!("invalid file id: {file_id}"))),
        }
    }
}

#[async_trait]
impl ObjectStore for DirStore {
    fn name(&self) -> &'static str {
        "directory"
    }

    async fn fetch(&self, file_id: &str) -> Result<Vec<u8>> {
        let path = self.object_path(file_id)?;
        tokio::fs::read(&path).await.map_err(|err| match err.kind() {
            ErrorKind::NotFound => SnapshotError::Remote(format!("file not found: {file_id}")),
            _ => SnapshotError::Io(err),
        })
    }

    async fn replace(&self, file_id: &str, data: Vec<u8>) -> Result<()> {
        let path = self.object_path(file_id)?;
        if !tokio::fs::try_exists(&path).await? {
            return Err(SnapshotError::Remote(format!("file not found: {file_id}")));
        }
        tokio::fs::write(&path, data).await?;
        Ok(())
    }
}
