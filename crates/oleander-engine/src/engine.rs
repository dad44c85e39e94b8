use serde::{Deserialize, Serialize};
use wasmtime::{Config, Engine};

use crate::error::ConfigError;

/// Cranelift optimization level for compiled modules.
///
/// Artifacts produced at one level can only be deserialized by an engine
/// configured at the same level; wasmtime enforces this at load time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OptLevel {
  /// No optimization; fastest compilation.
  None,
  /// Optimize for execution speed.
  Speed,
  /// Optimize for execution speed and code size.
  SpeedAndSize,
}

impl From<OptLevel> for wasmtime::OptLevel {
  fn from(level: OptLevel) -> Self {
    match level {
      OptLevel::None => wasmtime::OptLevel::None,
      OptLevel::Speed => wasmtime::OptLevel::Speed,
      OptLevel::SpeedAndSize => wasmtime::OptLevel::SpeedAndSize,
    }
  }
}

/// Configuration for creating a wasmtime Engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
  /// Optimization level applied when compiling modules.
  #[serde(default = "default_opt_level")]
  pub opt_level: OptLevel,
  /// Enable epoch-based interruption so executions can be bounded.
  #[serde(default = "default_epoch_interruption")]
  pub epoch_interruption: bool,
}

fn default_opt_level() -> OptLevel {
  OptLevel::SpeedAndSize
}

fn default_epoch_interruption() -> bool {
  true
}

impl Default for EngineConfig {
  fn default() -> Self {
    Self {
      opt_level: default_opt_level(),
      epoch_interruption: default_epoch_interruption(),
    }
  }
}

/// A shared, immutable wasmtime engine plus the configuration it was built
/// with.
///
/// The handle should be created once and shared across all compilation and
/// deserialization calls in a process, as the engine is expensive to create.
/// Cloning is cheap: the underlying engine is reference-counted.
#[derive(Clone)]
pub struct EngineHandle {
  engine: Engine,
  config: EngineConfig,
}

impl EngineHandle {
  /// Build an engine from the given configuration.
  ///
  /// This is the only point at which configuration is applied; the handle
  /// never mutates it afterwards.
  pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
    let mut wasm_config = Config::new();

    wasm_config.cranelift_opt_level(config.opt_level.into());
    wasm_config.epoch_interruption(config.epoch_interruption);

    let engine = Engine::new(&wasm_config).map_err(|e| ConfigError::engine(e.to_string()))?;

    Ok(Self { engine, config })
  }

  /// The underlying wasmtime engine.
  pub fn engine(&self) -> &Engine {
    &self.engine
  }

  /// The configuration the engine was built with.
  pub fn config(&self) -> &EngineConfig {
    &self.config
  }
}
