//! Shared wasmtime engine handle for oleander.
//!
//! The engine owns the compiler configuration (optimization level, epoch
//! interruption). It is created once at startup and shared by every
//! compilation and deserialization in the process; configuration is
//! immutable after construction.

mod engine;
mod error;

pub use engine::{EngineConfig, EngineHandle, OptLevel};
pub use error::ConfigError;
