//! Bitcoin script codec and classifier.
//!
//! Converts between the ASM text form of a script and its binary encoding,
//! decodes bytecode into chunks, and classifies scripts into the standard
//! output templates.

pub mod opcodes;
pub mod chunk;
pub mod asm;
pub mod script;
pub mod classify;
pub mod config;

mod error;
pub use error::ScriptError;
pub use script::Script;
pub use chunk::{decode_push, encode_push, PushData, ScriptChunk};
pub use classify::{classify, Classification, ScriptType};
pub use config::DecodeConfig;
pub use opcodes::{lookup_by_name, lookup_by_value, Opcode, OpcodeKind};
