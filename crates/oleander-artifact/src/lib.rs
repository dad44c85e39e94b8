//! Compiled-artifact storage for oleander.
//!
//! An artifact is the engine-specific serialized form of a compiled wasm
//! module, keyed by the [`Fingerprint`] of the bytecode it was compiled
//! from. The [`ArtifactStore`] trait defines the storage backend layer;
//! implementations handle the actual persistence (filesystem, memory)
//! while callers only ever address artifacts by fingerprint.

mod fingerprint;
mod fs;
mod memory;

pub use fingerprint::{Fingerprint, ParseFingerprintError};
pub use fs::FsStore;
pub use memory::MemoryStore;

use async_trait::async_trait;
use bytes::Bytes;

/// Error type for artifact storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
  /// No artifact is stored under the given fingerprint.
  #[error("artifact not found: {0}")]
  NotFound(Fingerprint),

  /// An I/O error occurred.
  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  /// The store already holds different content for this fingerprint.
  ///
  /// With a correct fingerprint this cannot happen; surfacing it instead of
  /// overwriting preserves the evidence.
  #[error("conflicting artifact content for fingerprint {fingerprint}")]
  Corruption { fingerprint: Fingerprint },
}

/// Artifact storage trait.
///
/// Implementations must be safe under concurrent `put` of different
/// fingerprints and concurrent `get`/`put` of the same fingerprint; a
/// reader never observes a partially written artifact.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
  /// Check whether an artifact exists for the fingerprint.
  ///
  /// A pure storage lookup; never triggers compilation.
  async fn exists(&self, fingerprint: &Fingerprint) -> Result<bool, StoreError>;

  /// Retrieve the artifact stored under the fingerprint.
  async fn get(&self, fingerprint: &Fingerprint) -> Result<Bytes, StoreError>;

  /// Store an artifact under the fingerprint.
  ///
  /// Idempotent: re-putting byte-identical content is a no-op. Putting
  /// conflicting content for an existing fingerprint fails with
  /// [`StoreError::Corruption`] and leaves the stored artifact untouched.
  async fn put(&self, fingerprint: &Fingerprint, artifact: Bytes) -> Result<(), StoreError>;

  /// Delete the artifact stored under the fingerprint.
  async fn delete(&self, fingerprint: &Fingerprint) -> Result<(), StoreError>;
}
