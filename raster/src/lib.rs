//! Pipeline object, assembler/rasterizer, and render-pass executor (§4.7-§4.9
//! "C7", "C8", "C9"): the fixed-function half of the draw path, sitting on
//! top of the compiled shader stages `vkcpu-jit` hands back.
pub mod assemble;
pub mod pipeline;
pub mod raster;
pub mod renderpass;
