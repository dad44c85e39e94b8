//! Module compilation and artifact deserialization for oleander.
//!
//! [`compile`] is the expensive path: full compilation of raw bytecode,
//! returning both the in-memory module and its serialized artifact.
//! [`deserialize`] is the cheap path: reconstructing a module from an
//! artifact produced by an identically configured engine. Empirically the
//! two differ by roughly two orders of magnitude.

mod compile;
mod error;

pub use compile::{Compiled, compile, deserialize};
pub use error::{CompileError, DeserializeError};
