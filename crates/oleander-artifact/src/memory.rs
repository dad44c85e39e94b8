use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use bytes::Bytes;

use crate::{ArtifactStore, Fingerprint, StoreError};

/// In-memory artifact store.
///
/// Useful for tests and for embedders that do not want artifacts to
/// outlive the process.
#[derive(Default)]
pub struct MemoryStore {
  entries: RwLock<HashMap<Fingerprint, Bytes>>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// Number of artifacts currently held.
  pub fn len(&self) -> usize {
    self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

#[async_trait]
impl ArtifactStore for MemoryStore {
  async fn exists(&self, fingerprint: &Fingerprint) -> Result<bool, StoreError> {
    let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
    Ok(entries.contains_key(fingerprint))
  }

  async fn get(&self, fingerprint: &Fingerprint) -> Result<Bytes, StoreError> {
    let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
    entries
      .get(fingerprint)
      .cloned()
      .ok_or(StoreError::NotFound(*fingerprint))
  }

  async fn put(&self, fingerprint: &Fingerprint, artifact: Bytes) -> Result<(), StoreError> {
    let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
    match entries.get(fingerprint) {
      Some(existing) if *existing == artifact => Ok(()),
      Some(_) => Err(StoreError::Corruption {
        fingerprint: *fingerprint,
      }),
      None => {
        entries.insert(*fingerprint, artifact);
        Ok(())
      }
    }
  }

  async fn delete(&self, fingerprint: &Fingerprint) -> Result<(), StoreError> {
    let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
    entries
      .remove(fingerprint)
      .map(|_| ())
      .ok_or(StoreError::NotFound(*fingerprint))
  }
}
