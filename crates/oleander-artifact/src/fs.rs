use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;

use crate::{ArtifactStore, Fingerprint, StoreError};

/// Filesystem-based artifact store.
///
/// Each artifact is stored at `{root}/{fingerprint}.cwasm`. Writes go to a
/// uniquely named temp file in the same directory and are renamed into
/// place, so a concurrent reader sees either the whole artifact or none of
/// it.
pub struct FsStore {
  root: PathBuf,
}

impl FsStore {
  /// Create a new filesystem store rooted at the given directory.
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self { root: root.into() }
  }

  /// The root directory of the store.
  pub fn root(&self) -> &Path {
    &self.root
  }

  fn artifact_path(&self, fingerprint: &Fingerprint) -> PathBuf {
    self.root.join(format!("{}.cwasm", fingerprint))
  }
}

#[async_trait]
impl ArtifactStore for FsStore {
  async fn exists(&self, fingerprint: &Fingerprint) -> Result<bool, StoreError> {
    let path = self.artifact_path(fingerprint);
    Ok(fs::try_exists(&path).await?)
  }

  async fn get(&self, fingerprint: &Fingerprint) -> Result<Bytes, StoreError> {
    let path = self.artifact_path(fingerprint);
    match fs::read(&path).await {
      Ok(contents) => Ok(Bytes::from(contents)),
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
        Err(StoreError::NotFound(*fingerprint))
      }
      Err(e) => Err(StoreError::Io(e)),
    }
  }

  async fn put(&self, fingerprint: &Fingerprint, artifact: Bytes) -> Result<(), StoreError> {
    let path = self.artifact_path(fingerprint);

    match fs::read(&path).await {
      Ok(existing) => {
        return if existing.as_slice() == artifact.as_ref() {
          Ok(())
        } else {
          Err(StoreError::Corruption {
            fingerprint: *fingerprint,
          })
        };
      }
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
      Err(e) => return Err(StoreError::Io(e)),
    }

    fs::create_dir_all(&self.root).await?;

    let tmp_path = self
      .root
      .join(format!(".{}.{}.tmp", fingerprint, uuid::Uuid::new_v4()));

    fs::write(&tmp_path, &artifact).await?;
    if let Err(e) = fs::rename(&tmp_path, &path).await {
      let _ = fs::remove_file(&tmp_path).await;
      return Err(StoreError::Io(e));
    }

    Ok(())
  }

  async fn delete(&self, fingerprint: &Fingerprint) -> Result<(), StoreError> {
    let path = self.artifact_path(fingerprint);
    fs::remove_file(&path).await.map_err(|e| {
      if e.kind() == std::io::ErrorKind::NotFound {
        StoreError::NotFound(*fingerprint)
      } else {
        StoreError::Io(e)
      }
    })
  }
}
