use oleander_engine::ConfigError;
use serde::{Deserialize, Serialize};

/// Configuration for the load scheduler.
///
/// The two pools are sized independently because compilation and
/// deserialization have different contention profiles against a shared
/// engine. Both default to small fixed pools; unbounded fan-out against
/// one engine measurably degrades per-call latency as load increases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoaderConfig {
  /// Maximum number of compilations in flight at once.
  #[serde(default = "default_max_compilations")]
  pub max_concurrent_compilations: usize,
  /// Maximum number of deserializations in flight at once.
  #[serde(default = "default_max_deserializations")]
  pub max_concurrent_deserializations: usize,
}

fn default_max_compilations() -> usize {
  4
}

fn default_max_deserializations() -> usize {
  8
}

impl Default for LoaderConfig {
  fn default() -> Self {
    Self {
      max_concurrent_compilations: default_max_compilations(),
      max_concurrent_deserializations: default_max_deserializations(),
    }
  }
}

impl LoaderConfig {
  pub(crate) fn validate(&self) -> Result<(), ConfigError> {
    if self.max_concurrent_compilations == 0 {
      return Err(ConfigError::InvalidLimit {
        name: "max_concurrent_compilations",
      });
    }
    if self.max_concurrent_deserializations == 0 {
      return Err(ConfigError::InvalidLimit {
        name: "max_concurrent_deserializations",
      });
    }
    Ok(())
  }
}
