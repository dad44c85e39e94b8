use oleander_compiler::CompileError;
use thiserror::Error;

/// Errors surfaced to a load caller.
///
/// Storage and deserialization failures never appear here: the loader
/// falls back to recompilation for those. A load only fails when the
/// compile path itself fails or the caller cancels.
///
/// All variants are `Clone` so one failure can be reported to every
/// coalesced waiter.
#[derive(Debug, Clone, Error)]
pub enum LoadError {
  /// The bytecode provider failed on a cache miss.
  #[error("failed to read bytecode: {message}")]
  Bytecode { message: String },

  /// The bytecode could not be compiled.
  #[error(transparent)]
  Compile(#[from] CompileError),

  /// The compilation task died without reporting a result.
  #[error("compilation worker failed: {message}")]
  Worker { message: String },

  /// The caller cancelled the request before it completed.
  #[error("load cancelled")]
  Cancelled,
}

impl LoadError {
  pub(crate) fn bytecode(message: impl Into<String>) -> Self {
    Self::Bytecode {
      message: message.into(),
    }
  }

  pub(crate) fn worker(message: impl Into<String>) -> Self {
    Self::Worker {
      message: message.into(),
    }
  }
}
