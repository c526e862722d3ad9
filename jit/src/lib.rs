//! The JIT module host (§4.5 "C5") and the process-global runtime
//! intrinsics table (§4.6 "C6") that every compiled shader module links
//! against.
//!
//! `host` owns one `cranelift_jit::JITModule` per compiled shader and drives
//! it through verify -> optimise -> compile -> resolve-symbols ->
//! inject-user-data. `intrinsics` is the table the host's symbol resolver
//! consults, built once at process init from `math`, `image`, and the pixel
//! codec (`vkcpu_format`).
pub mod codec;
pub mod host;
pub mod image;
pub mod intrinsics;
pub mod math;

pub use host::{JitError, JitHost};
