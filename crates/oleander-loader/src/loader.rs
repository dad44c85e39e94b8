//! The load scheduler.

use std::future::Future;
use std::sync::Arc;

use bytes::Bytes;
use oleander_artifact::{ArtifactStore, Fingerprint, StoreError};
use oleander_compiler::Compiled;
use oleander_engine::{ConfigError, EngineHandle};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use wasmtime::Module;

use crate::config::LoaderConfig;
use crate::error::LoadError;
use crate::inflight::{
  InflightGuard, InflightMap, Outcome, OutcomeReceiver, OutcomeSender, Registration,
};

/// Schedules module loads against a shared engine and artifact store.
///
/// Compilation and deserialization run under independently sized pools,
/// and concurrent cache misses for one fingerprint coalesce into a single
/// compilation whose result every requester observes. Cloning the loader
/// shares the pools and the in-flight table.
#[derive(Clone)]
pub struct ModuleLoader {
  engine: EngineHandle,
  store: Arc<dyn ArtifactStore>,
  config: LoaderConfig,
  inflight: Arc<InflightMap>,
  compile_permits: Arc<Semaphore>,
  deserialize_permits: Arc<Semaphore>,
}

/// Why a cache hit did not produce a module.
enum HitFailure {
  Cancelled,
  /// The artifact is unusable (wrong engine configuration or corrupt
  /// bytes); the load falls back to compilation.
  Stale(String),
}

impl ModuleLoader {
  /// Create a loader over the given engine and store.
  pub fn new(
    engine: EngineHandle,
    store: Arc<dyn ArtifactStore>,
    config: LoaderConfig,
  ) -> Result<Self, ConfigError> {
    config.validate()?;

    Ok(Self {
      engine,
      store,
      compile_permits: Arc::new(Semaphore::new(config.max_concurrent_compilations)),
      deserialize_permits: Arc::new(Semaphore::new(config.max_concurrent_deserializations)),
      config,
      inflight: Arc::new(InflightMap::new()),
    })
  }

  /// The engine handle all loads compile and deserialize against.
  pub fn engine(&self) -> &EngineHandle {
    &self.engine
  }

  /// The configuration the loader was built with.
  pub fn config(&self) -> &LoaderConfig {
    &self.config
  }

  /// Load the module for `fingerprint`.
  ///
  /// The bytecode provider is invoked lazily, only on a cache miss, and
  /// only by the request that ends up compiling. Dropping the returned
  /// future or cancelling the token abandons this caller's interest, but a
  /// compilation already in flight runs to completion so other waiters
  /// (and the artifact store) still get its result.
  pub async fn load<P, Fut>(
    &self,
    fingerprint: Fingerprint,
    bytecode: P,
    cancel: CancellationToken,
  ) -> Result<Module, LoadError>
  where
    P: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = std::io::Result<Bytes>> + Send,
  {
    let mut provider = Some(bytecode);

    loop {
      if cancel.is_cancelled() {
        return Err(LoadError::Cancelled);
      }

      // Join an in-flight compilation before probing the store, so a
      // request landing between broadcast and persist coalesces instead
      // of racing the store write.
      if let Some(rx) = self.inflight.subscribe(&fingerprint) {
        match await_broadcast(rx, &cancel).await? {
          Some(outcome) => return outcome,
          None => continue,
        }
      }

      match self.store.get(&fingerprint).await {
        Ok(artifact) => match self.deserialize_under_permit(artifact, &cancel).await {
          Ok(module) => {
            debug!(%fingerprint, "artifact cache hit");
            return Ok(module);
          }
          Err(HitFailure::Cancelled) => return Err(LoadError::Cancelled),
          Err(HitFailure::Stale(message)) => {
            warn!(%fingerprint, %message, "stale artifact, falling back to compilation");
            if let Err(e) = self.store.delete(&fingerprint).await {
              warn!(%fingerprint, error = %e, "failed to delete stale artifact");
            }
          }
        },
        Err(StoreError::NotFound(_)) => {
          debug!(%fingerprint, "artifact cache miss");
        }
        Err(e) => {
          warn!(%fingerprint, error = %e, "artifact store read failed, treating as miss");
        }
      }

      // Cache miss: start a compilation, or join the one that beat us to
      // registration.
      let rx = match self.inflight.register(fingerprint) {
        Registration::Waiter(rx) => rx,
        Registration::Winner(tx) => {
          let Some(provider) = provider.take() else {
            // The provider was already consumed by a compilation that died
            // without reporting; release the registration before failing.
            self.inflight.deregister(&fingerprint);
            drop(tx);
            return Err(LoadError::worker("compilation restarted without bytecode"));
          };
          let rx = tx.subscribe();
          self.spawn_compile(fingerprint, tx, provider);
          rx
        }
      };

      match await_broadcast(rx, &cancel).await? {
        Some(outcome) => return outcome,
        None => continue,
      }
    }
  }

  /// Load a module directly from bytecode, fingerprinting it first.
  pub async fn load_bytecode(
    &self,
    bytecode: Bytes,
    cancel: CancellationToken,
  ) -> Result<Module, LoadError> {
    let fingerprint = Fingerprint::of(&bytecode);
    self
      .load(fingerprint, move || async move { Ok(bytecode) }, cancel)
      .await
  }

  /// Deserialize an artifact under a deserialization permit.
  async fn deserialize_under_permit(
    &self,
    artifact: Bytes,
    cancel: &CancellationToken,
  ) -> Result<Module, HitFailure> {
    let permit = tokio::select! {
      permit = self.deserialize_permits.clone().acquire_owned() => {
        permit.map_err(|_| HitFailure::Stale("deserialization pool closed".to_string()))?
      }
      _ = cancel.cancelled() => return Err(HitFailure::Cancelled),
    };

    let engine = self.engine.clone();
    let result = tokio::task::spawn_blocking(move || {
      let _permit = permit;
      oleander_compiler::deserialize(&engine, &artifact)
    })
    .await;

    match result {
      Ok(Ok(module)) => Ok(module),
      Ok(Err(e)) => Err(HitFailure::Stale(e.to_string())),
      Err(e) => Err(HitFailure::Stale(format!(
        "deserialization worker failed: {e}"
      ))),
    }
  }

  /// Spawn the single compilation task for a fingerprint.
  ///
  /// The task is detached from the requesting caller: it publishes the
  /// outcome to every waiter, then persists the artifact, then deregisters
  /// the in-flight entry.
  fn spawn_compile<P, Fut>(&self, fingerprint: Fingerprint, tx: OutcomeSender, provider: P)
  where
    P: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = std::io::Result<Bytes>> + Send,
  {
    let engine = self.engine.clone();
    let store = Arc::clone(&self.store);
    let permits = Arc::clone(&self.compile_permits);
    let guard = InflightGuard::new(Arc::clone(&self.inflight), fingerprint);

    tokio::spawn(async move {
      let outcome = compile_under_permit(engine, permits, provider).await;

      let (published, artifact) = match outcome {
        Ok(compiled) => (Ok(compiled.module), Some(compiled.artifact)),
        Err(e) => (Err(e), None),
      };

      // Publish before persisting: waiters are unblocked the moment the
      // module exists, and the store write happens behind them.
      let _ = tx.send(Some(published));

      if let Some(artifact) = artifact {
        match store.put(&fingerprint, artifact).await {
          Ok(()) => debug!(%fingerprint, "compiled artifact persisted"),
          Err(e) => warn!(%fingerprint, error = %e, "failed to persist compiled artifact"),
        }
      }

      // Deregister while the channel still holds the outcome, so a late
      // request either joins the broadcast or finds the persisted artifact.
      drop(guard);
      drop(tx);
    });
  }
}

/// Run the provider and compilation under a compilation permit.
async fn compile_under_permit<P, Fut>(
  engine: EngineHandle,
  permits: Arc<Semaphore>,
  provider: P,
) -> Result<Compiled, LoadError>
where
  P: FnOnce() -> Fut + Send + 'static,
  Fut: Future<Output = std::io::Result<Bytes>> + Send,
{
  let permit = permits
    .acquire_owned()
    .await
    .map_err(|_| LoadError::worker("compilation pool closed"))?;

  let bytecode = provider()
    .await
    .map_err(|e| LoadError::bytecode(e.to_string()))?;

  let result = tokio::task::spawn_blocking(move || {
    let _permit = permit;
    oleander_compiler::compile(&engine, &bytecode)
  })
  .await
  .map_err(|e| LoadError::worker(e.to_string()))?;

  Ok(result?)
}

/// Wait for a coalesced outcome, honouring the caller's cancellation.
///
/// Returns `Ok(None)` when the compilation task died without reporting;
/// the caller retries from the top.
async fn await_broadcast(
  mut rx: OutcomeReceiver,
  cancel: &CancellationToken,
) -> Result<Option<Outcome>, LoadError> {
  loop {
    if let Some(outcome) = rx.borrow_and_update().clone() {
      return Ok(Some(outcome));
    }

    tokio::select! {
      changed = rx.changed() => {
        if changed.is_err() {
          return Ok(rx.borrow().clone());
        }
      }
      _ = cancel.cancelled() => return Err(LoadError::Cancelled),
    }
  }
}
