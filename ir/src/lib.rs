//! `vkcpu-ir`: a thin typed-SSA builder sitting directly on top of
//! cranelift's module/context/builder triad.
//!
//! This crate does not know anything about SPIR-V; it exposes the set of
//! operations a translator needs to lower *any* typed SSA IR onto native
//! code — constants, the canonical arithmetic/comparison/bitcast family,
//! memory access and GEP, control flow, calls, vector insert/extract/splat,
//! and atomics — while tagging every emitted value with the id of whatever
//! produced it upstream, so a disassembly dump can be read back against the
//! SPIR-V module that was compiled.
pub mod builder;
pub mod module;
pub mod op;
pub mod types;

pub use builder::{FuncBuilder, Value};
pub use module::IrModule;
pub use op::IrOp;
pub use types::IrType;
