//! Plain `#[repr(C)]` structs a caller fills in and passes by pointer —
//! the FFI shape of the fixed-function state blocks `vkcpu_raster::pipeline`
//! and `vkcpu_raster::renderpass` already model as plain Rust values. Kept
//! deliberately smaller than the real `VkGraphicsPipelineCreateInfo` chain
//! (no `pNext`, no separate shader-stage create-info array indirection) —
//! see the design ledger's "single-subpass render passes" entry for the
//! sibling simplification on the render-pass side.
use vkcpu_raster::pipeline as rp;
use vkcpu_raster::renderpass as rpass;

#[repr(C)]
#[derive(Copy, Clone)]
pub struct VkExtent3D {
    pub width: u32,
    pub height: u32,
    pub depth: u32,
}

#[repr(C)]
#[derive(Copy, Clone)]
pub struct VkViewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub min_depth: f32,
    pub max_depth: f32,
}

impl From<VkViewport> for rp::Viewport {
    fn from(v: VkViewport) -> Self {
        rp::Viewport { x: v.x, y: v.y, width: v.width, height: v.height, min_depth: v.min_depth, max_depth: v.max_depth }
    }
}

#[repr(C)]
#[derive(Copy, Clone)]
pub struct VkRect2D {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl From<VkRect2D> for rp::Rect2D {
    fn from(r: VkRect2D) -> Self {
        rp::Rect2D { x: r.x, y: r.y, width: r.width, height: r.height }
    }
}

#[repr(C)]
#[derive(Copy, Clone)]
pub struct VkClearColorValue {
    pub float32: [f32; 4],
}

#[repr(u32)]
#[derive(Copy, Clone)]
pub enum VkAttachmentLoadOp {
    Load = 0,
    Clear = 1,
    DontCare = 2,
}

impl From<VkAttachmentLoadOp> for rpass::LoadOp {
    fn from(op: VkAttachmentLoadOp) -> Self {
        match op {
            VkAttachmentLoadOp::Load => rpass::LoadOp::Load,
            VkAttachmentLoadOp::Clear => rpass::LoadOp::Clear,
            VkAttachmentLoadOp::DontCare => rpass::LoadOp::DontCare,
        }
    }
}

#[repr(u32)]
#[derive(Copy, Clone)]
pub enum VkAttachmentStoreOp {
    Store = 0,
    DontCare = 1,
}

impl From<VkAttachmentStoreOp> for rpass::StoreOp {
    fn from(op: VkAttachmentStoreOp) -> Self {
        match op {
            VkAttachmentStoreOp::Store => rpass::StoreOp::Store,
            VkAttachmentStoreOp::DontCare => rpass::StoreOp::DontCare,
        }
    }
}

#[repr(u32)]
#[derive(Copy, Clone, PartialEq, Eq)]
pub enum VkImageLayout {
    Undefined = 0,
    General = 1,
    ColorAttachmentOptimal = 2,
    DepthStencilAttachmentOptimal = 3,
    DepthStencilReadOnlyOptimal = 4,
    ShaderReadOnlyOptimal = 5,
    TransferSrcOptimal = 6,
    TransferDstOptimal = 7,
    Preinitialized = 8,
    PresentSrcKhr = 1000001002,
}

impl From<VkImageLayout> for rpass::ImageLayout {
    fn from(layout: VkImageLayout) -> Self {
        match layout {
            VkImageLayout::Undefined => rpass::ImageLayout::Undefined,
            VkImageLayout::General => rpass::ImageLayout::General,
            VkImageLayout::ColorAttachmentOptimal => rpass::ImageLayout::ColorAttachmentOptimal,
            VkImageLayout::DepthStencilAttachmentOptimal => rpass::ImageLayout::DepthStencilAttachmentOptimal,
            VkImageLayout::DepthStencilReadOnlyOptimal => rpass::ImageLayout::DepthStencilReadOnlyOptimal,
            VkImageLayout::ShaderReadOnlyOptimal => rpass::ImageLayout::ShaderReadOnlyOptimal,
            VkImageLayout::TransferSrcOptimal => rpass::ImageLayout::TransferSrcOptimal,
            VkImageLayout::TransferDstOptimal => rpass::ImageLayout::TransferDstOptimal,
            VkImageLayout::Preinitialized => rpass::ImageLayout::Preinitialized,
            VkImageLayout::PresentSrcKhr => rpass::ImageLayout::PresentSrc,
        }
    }
}

/// One attachment slot. A caller passes an array of these plus separate
/// index lists for which slots are color/depth-stencil — the single-subpass
/// simplification named in the design ledger.
#[repr(C)]
#[derive(Copy, Clone)]
pub struct VkAttachmentDescription {
    pub format: crate::format_map::VkFormat,
    pub load_op: VkAttachmentLoadOp,
    pub store_op: VkAttachmentStoreOp,
    pub stencil_load_op: VkAttachmentLoadOp,
    pub stencil_store_op: VkAttachmentStoreOp,
    pub initial_layout: VkImageLayout,
    pub final_layout: VkImageLayout,
}
