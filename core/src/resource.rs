//! Buffer, image, and view objects (§3, C12). A resource is created
//! unbound and later tied to a `DeviceMemory` range with `bind_memory`,
//! mirroring `vkAllocateMemory`/`vkBindBufferMemory`'s two-step contract —
//! the object exists and can be queried (`memory_requirements`) before it
//! has a backing store.
use vkcpu_format::codec::{mip_offset, Extent3D};
use vkcpu_format::{describe, runtime::SamplerDescriptor, Format};
use vkcpu_spirv::Module as SpirvModule;

use crate::handle::Handle;
use crate::memory::DeviceMemory;

bitflags::bitflags! {
    pub struct BufferUsageFlags: u32 {
        const TRANSFER_SRC         = 1 << 0;
        const TRANSFER_DST         = 1 << 1;
        const UNIFORM_TEXEL_BUFFER = 1 << 2;
        const STORAGE_TEXEL_BUFFER = 1 << 3;
        const UNIFORM_BUFFER       = 1 << 4;
        const STORAGE_BUFFER       = 1 << 5;
        const INDEX_BUFFER         = 1 << 6;
        const VERTEX_BUFFER        = 1 << 7;
        const INDIRECT_BUFFER      = 1 << 8;
    }
}

bitflags::bitflags! {
    pub struct ImageUsageFlags: u32 {
        const TRANSFER_SRC             = 1 << 0;
        const TRANSFER_DST             = 1 << 1;
        const SAMPLED                  = 1 << 2;
        const STORAGE                  = 1 << 3;
        const COLOR_ATTACHMENT         = 1 << 4;
        const DEPTH_STENCIL_ATTACHMENT = 1 << 5;
        const INPUT_ATTACHMENT         = 1 << 6;
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ImageType {
    Type1D,
    Type2D,
    Type3D,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ImageTiling {
    Optimal,
    Linear,
}

/// A resource's bound backing store: which `DeviceMemory` allocation, and
/// at what byte offset within it.
#[derive(Copy, Clone)]
pub struct MemoryBinding {
    pub memory: Handle<DeviceMemory>,
    pub offset: u64,
}

pub struct Buffer {
    pub size: u64,
    pub usage: BufferUsageFlags,
    pub binding: Option<MemoryBinding>,
}

impl Buffer {
    pub fn new(size: u64, usage: BufferUsageFlags) -> Buffer {
        Buffer { size, usage, binding: None }
    }
}

pub struct Image {
    pub image_type: ImageType,
    pub format: Format,
    pub extent: Extent3D,
    pub mip_levels: u32,
    pub array_layers: u32,
    pub samples: u32,
    pub tiling: ImageTiling,
    pub usage: ImageUsageFlags,
    pub layout: vkcpu_raster::renderpass::ImageLayout,
    pub binding: Option<MemoryBinding>,
}

impl Image {
    pub fn new(image_type: ImageType, format: Format, extent: Extent3D, mip_levels: u32, array_layers: u32, samples: u32, tiling: ImageTiling, usage: ImageUsageFlags) -> Image {
        Image {
            image_type,
            format,
            extent,
            mip_levels,
            array_layers,
            samples,
            tiling,
            usage,
            layout: vkcpu_raster::renderpass::ImageLayout::Undefined,
            binding: None,
        }
    }

    /// Total backing size: `mip_offset` at one-past-the-last mip is exactly
    /// the sum of every level's per-layer footprint, the same accumulation
    /// `vkcpu-format`'s own addressing math performs internally.
    pub fn byte_size(&self) -> u64 {
        let info = describe(self.format);
        mip_offset(info, self.extent, self.array_layers, self.mip_levels)
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ImageViewType {
    Type1D,
    Type2D,
    Type3D,
    Cube,
    Array1D,
    Array2D,
    CubeArray,
}

#[derive(Copy, Clone, Debug)]
pub struct ImageSubresourceRange {
    pub base_mip_level: u32,
    pub level_count: u32,
    pub base_array_layer: u32,
    pub layer_count: u32,
}

pub struct ImageView {
    pub image: Handle<Image>,
    pub view_type: ImageViewType,
    pub format: Format,
    pub subresource_range: ImageSubresourceRange,
}

pub struct BufferView {
    pub buffer: Handle<Buffer>,
    pub format: Format,
    pub offset: u64,
    pub range: u64,
}

/// `VkSamplerCreateInfo` reduced to the fields `vkcpu_format::runtime`'s
/// sample kernel actually reads (§4.2: LOD bias, anisotropy, and unnormalised
/// coordinates are accepted but not modelled — see the design ledger).
pub struct Sampler {
    pub descriptor: SamplerDescriptor,
}

impl Sampler {
    pub fn new(descriptor: SamplerDescriptor) -> Sampler {
        Sampler { descriptor }
    }
}

/// An immutable parsed SPIR-V module plus its original bytes (§4.1 "C1"),
/// exactly as `vkCreateShaderModule` hands back an opaque object a pipeline
/// later references by `(module, entry point)`.
pub struct ShaderModule {
    pub parsed: SpirvModule,
}

impl ShaderModule {
    pub fn new(bytes: &[u8]) -> crate::error::Result<ShaderModule> {
        let parsed = SpirvModule::from_bytes(bytes).map_err(|_| crate::error::Error::InitializationFailed)?;
        Ok(ShaderModule { parsed })
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum QueryType {
    Occlusion,
    PipelineStatistics,
    Timestamp,
}

/// `vkGetQueryPoolResults`' backing store: one `u64` result per query slot,
/// plus an availability bit since `VK_QUERY_RESULT_WITH_AVAILABILITY_BIT`
/// callers need to distinguish "not yet written" from "wrote zero".
pub struct QueryPool {
    pub query_type: QueryType,
    pub results: Vec<u64>,
    pub available: Vec<bool>,
}

impl QueryPool {
    pub fn new(query_type: QueryType, count: u32) -> QueryPool {
        QueryPool { query_type, results: vec![0; count as usize], available: vec![false; count as usize] }
    }

    pub fn reset(&mut self, first: u32, count: u32) {
        for i in first..first + count {
            self.results[i as usize] = 0;
            self.available[i as usize] = false;
        }
    }

    pub fn write(&mut self, query: u32, value: u64) {
        self.results[query as usize] = value;
        self.available[query as usize] = true;
    }
}
