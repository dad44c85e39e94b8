use thiserror::Error;

/// Errors raised while validating configuration or building the engine.
///
/// These are fatal at startup; nothing downstream retries them.
#[derive(Debug, Error)]
pub enum ConfigError {
  /// A concurrency limit was set to zero.
  #[error("'{name}' must be at least 1")]
  InvalidLimit { name: &'static str },

  /// The engine rejected the compiler configuration.
  #[error("failed to create wasmtime engine: {message}")]
  Engine { message: String },
}

impl ConfigError {
  /// Create an engine construction error.
  pub fn engine(message: impl Into<String>) -> Self {
    Self::Engine {
      message: message.into(),
    }
  }
}
