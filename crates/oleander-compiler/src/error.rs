use thiserror::Error;

/// The bytecode could not be compiled.
///
/// Compilation failures are deterministic for a given input and are never
/// retried automatically.
#[derive(Debug, Clone, Error)]
#[error("failed to compile module: {message}")]
pub struct CompileError {
  pub message: String,
}

impl CompileError {
  pub fn new(message: impl Into<String>) -> Self {
    Self {
      message: message.into(),
    }
  }
}

/// The artifact could not be deserialized.
///
/// Both variants are recoverable: callers fall back to recompiling from
/// bytecode rather than failing the load.
#[derive(Debug, Clone, Error)]
pub enum DeserializeError {
  /// The artifact was produced under a different engine configuration.
  #[error("artifact incompatible with engine configuration: {message}")]
  IncompatibleConfig { message: String },

  /// The bytes are not a valid serialized module for this engine.
  #[error("artifact is not a valid serialized module: {message}")]
  Corrupt { message: String },
}
