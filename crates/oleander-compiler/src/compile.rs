use bytes::Bytes;
use oleander_engine::EngineHandle;
use wasmtime::Module;

use crate::error::{CompileError, DeserializeError};

/// A freshly compiled module together with its serialized artifact.
#[derive(Debug)]
pub struct Compiled {
  /// The in-memory module, ready for instantiation.
  pub module: Module,
  /// The engine's serialization of the module, suitable for persisting
  /// and later reconstruction via [`deserialize`].
  pub artifact: Bytes,
}

/// Compile raw wasm bytecode into a module and its serialized artifact.
///
/// CPU-bound and slow; callers are expected to schedule it accordingly.
/// Holds no lock shared with other compilations.
pub fn compile(handle: &EngineHandle, bytecode: &[u8]) -> Result<Compiled, CompileError> {
  let module =
    Module::new(handle.engine(), bytecode).map_err(|e| CompileError::new(format!("{e:#}")))?;

  let artifact = module
    .serialize()
    .map_err(|e| CompileError::new(format!("failed to serialize module: {e:#}")))?;

  Ok(Compiled {
    module,
    artifact: Bytes::from(artifact),
  })
}

/// Reconstruct a module from a serialized artifact.
///
/// Safe to call concurrently from independent threads; the engine is only
/// read. Fails with [`DeserializeError::IncompatibleConfig`] when the
/// artifact was produced under a different engine configuration and with
/// [`DeserializeError::Corrupt`] when the bytes are not a valid artifact.
pub fn deserialize(handle: &EngineHandle, artifact: &[u8]) -> Result<Module, DeserializeError> {
  // SAFETY: the artifact must have been produced by `Module::serialize`.
  // Callers only hand us bytes from a content-addressed store that this
  // crate populated; the engine still validates the artifact header and
  // configuration before trusting the contents.
  unsafe { Module::deserialize(handle.engine(), artifact) }.map_err(classify)
}

/// Split the engine's deserialization failure into the config-mismatch and
/// corrupt-bytes classes.
///
/// wasmtime reports every configuration mismatch with a message beginning
/// "Module was compiled ..."; anything else means the bytes themselves are
/// not a valid artifact.
fn classify(error: wasmtime::Error) -> DeserializeError {
  let message = format!("{error:#}");
  if message.contains("was compiled") {
    DeserializeError::IncompatibleConfig { message }
  } else {
    DeserializeError::Corrupt { message }
  }
}
