//! Concurrent module load scheduler for oleander.
//!
//! A load request enters with a fingerprint and a lazy bytecode provider.
//! The loader probes the artifact store; on a hit it deserializes under a
//! bounded deserialization pool, on a miss it compiles under a bounded
//! compilation pool and persists the artifact in the background. Concurrent
//! misses for the same fingerprint coalesce into a single compilation.
//!
//! # Usage
//!
//! ```ignore
//! use oleander_artifact::{Fingerprint, FsStore};
//! use oleander_engine::{EngineConfig, EngineHandle};
//! use oleander_loader::{LoaderConfig, ModuleLoader};
//!
//! let engine = EngineHandle::new(EngineConfig::default())?;
//! let store = Arc::new(FsStore::new("/var/cache/oleander"));
//! let loader = ModuleLoader::new(engine, store, LoaderConfig::default())?;
//!
//! let fingerprint = Fingerprint::of(&bytecode);
//! let module = loader
//!     .load(fingerprint, move || async move { Ok(bytecode) }, cancel)
//!     .await?;
//! ```

mod config;
mod error;
mod inflight;
mod loader;

pub use config::LoaderConfig;
pub use error::LoadError;
pub use loader::ModuleLoader;
