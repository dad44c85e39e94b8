//! Per-fingerprint coalescing of in-flight compilations.
//!
//! The table maps a fingerprint to a watch channel carrying the eventual
//! result of the one compilation running for it. The lock is held only to
//! register or deregister an entry, never across the compilation itself.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use oleander_artifact::Fingerprint;
use tokio::sync::watch;
use wasmtime::Module;

use crate::error::LoadError;

/// Result broadcast to every request coalesced onto one compilation.
pub(crate) type Outcome = Result<Module, LoadError>;

pub(crate) type OutcomeSender = watch::Sender<Option<Outcome>>;
pub(crate) type OutcomeReceiver = watch::Receiver<Option<Outcome>>;

/// What a request holds after trying to register a compilation.
pub(crate) enum Registration {
  /// This request compiles; publish the outcome through the sender.
  Winner(OutcomeSender),
  /// Another request is already compiling; await its broadcast.
  Waiter(OutcomeReceiver),
}

/// Table of compilations currently in flight, keyed by fingerprint.
#[derive(Default)]
pub(crate) struct InflightMap {
  entries: Mutex<HashMap<Fingerprint, OutcomeReceiver>>,
}

impl InflightMap {
  pub(crate) fn new() -> Self {
    Self::default()
  }

  /// Join the in-flight compilation for the fingerprint, if there is one.
  pub(crate) fn subscribe(&self, fingerprint: &Fingerprint) -> Option<OutcomeReceiver> {
    let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
    entries.get(fingerprint).cloned()
  }

  /// Register a compilation for the fingerprint, or join an existing one.
  pub(crate) fn register(&self, fingerprint: Fingerprint) -> Registration {
    let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
    if let Some(rx) = entries.get(&fingerprint) {
      return Registration::Waiter(rx.clone());
    }

    let (tx, rx) = watch::channel(None);
    entries.insert(fingerprint, rx);
    Registration::Winner(tx)
  }

  pub(crate) fn deregister(&self, fingerprint: &Fingerprint) {
    let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
    entries.remove(fingerprint);
  }
}

/// Deregisters the in-flight entry when the compilation task finishes,
/// including when it unwinds.
pub(crate) struct InflightGuard {
  map: Arc<InflightMap>,
  fingerprint: Fingerprint,
}

impl InflightGuard {
  pub(crate) fn new(map: Arc<InflightMap>, fingerprint: Fingerprint) -> Self {
    Self { map, fingerprint }
  }
}

impl Drop for InflightGuard {
  fn drop(&mut self) {
    self.map.deregister(&self.fingerprint);
  }
}
