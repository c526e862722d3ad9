//! Device/Instance/PhysicalDevice/Queue object model (§2, §3): the minimal
//! top-level surface the ICD dispatch layer (`vkcpu-icd`) sits on. There is
//! exactly one `PhysicalDevice` (the host CPU) per `Instance`, and exactly
//! one `Queue` per `Device` — a CPU driver has no hardware queue families
//! to enumerate, so the object graph collapses to the smallest shape the
//! API still requires a caller to walk through.
use fxhash::FxHashMap;
use vkcpu_format::{Format, FormatFeatureFlags};
use vkcpu_raster::pipeline::{Pipeline, ShaderStage, StageSource};
use vkcpu_raster::renderpass::RenderPass;
use vkcpu_translate::constants::SpecializationInfo;
use vkcpu_translate::reflect::{push_constant_globals, resource_bindings, ResourceBinding};

use crate::command::{CommandBuffer, CommandPool};
use crate::config::DeviceConfig;
use crate::descriptor::{DescriptorPool, DescriptorSet};
use crate::error::{Error, Result};
use crate::handle::{Arena, Handle};
use crate::memory::DeviceMemory;
use crate::resource::{Buffer, BufferView, Image, ImageView, QueryPool, Sampler, ShaderModule};
use crate::sync::{Event, Fence, Semaphore};

/// `vkEnumeratePhysicalDevices` always returns exactly this one device: the
/// host CPU itself, running every shader stage as JIT-compiled native code.
pub struct PhysicalDevice {
    pub device_name: &'static str,
    pub max_fragment_workers: usize,
}

impl PhysicalDevice {
    pub fn host() -> PhysicalDevice {
        PhysicalDevice { device_name: "vkcpu (software rasterizer)", max_fragment_workers: std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1) }
    }

    /// §3/§9: format support is whatever `vkcpu-format::describe` can
    /// decode/encode — every `Format` this crate enumerates supports the
    /// full linear/optimal/buffer feature triple, since there is no
    /// hardware texture unit to fall short of software behaviour.
    pub fn format_properties(&self, format: Format) -> FormatFeatureFlags {
        let _ = format;
        FormatFeatureFlags::all()
    }
}

pub struct Instance {
    pub physical_device: PhysicalDevice,
}

impl Instance {
    pub fn create() -> Instance {
        Instance { physical_device: PhysicalDevice::host() }
    }
}

/// One shader stage's reflected resource/push-constant bindings, cached at
/// pipeline-creation time so descriptor binding (`crate::descriptor`) never
/// needs the originating `ShaderModule` to stay alive (§4.1: a shader
/// module may be destroyed immediately after every pipeline referencing it
/// is created, exactly like `vkDestroyShaderModule`'s contract).
#[derive(Default, Clone)]
pub struct StageReflection {
    pub bindings: Vec<ResourceBinding>,
    pub push_constants: Vec<String>,
}

pub struct GraphicsPipelineObject {
    pub pipeline: Pipeline,
    pub reflection: FxHashMap<ShaderStage, StageReflection>,
}

pub struct ComputePipelineObject {
    pub pipeline: Pipeline,
    pub reflection: StageReflection,
    pub local_size: (u32, u32, u32),
}

pub struct Framebuffer {
    pub attachments: Vec<Handle<ImageView>>,
    pub width: u32,
    pub height: u32,
    pub layers: u32,
}

/// The one queue a `Device` exposes. `submit` runs every command buffer to
/// completion inline (§3 "Open Questions": no asynchronous scheduler), so
/// by the time `vkQueueSubmit` returns, every semaphore in its signal list
/// is already signaled and every fence in its wait list has already been
/// waited on.
pub struct Queue;

pub struct Device {
    pub config: DeviceConfig,
    pub queue: Queue,
    pub memories: Arena<DeviceMemory>,
    pub buffers: Arena<Buffer>,
    pub images: Arena<Image>,
    pub image_views: Arena<ImageView>,
    pub buffer_views: Arena<BufferView>,
    pub samplers: Arena<Sampler>,
    pub shader_modules: Arena<ShaderModule>,
    pub descriptor_set_layouts: Arena<crate::descriptor::DescriptorSetLayout>,
    pub descriptor_pools: Arena<DescriptorPool>,
    pub descriptor_sets: Arena<DescriptorSet>,
    pub graphics_pipelines: Arena<GraphicsPipelineObject>,
    pub compute_pipelines: Arena<ComputePipelineObject>,
    pub render_passes: Arena<RenderPass>,
    pub framebuffers: Arena<Framebuffer>,
    pub query_pools: Arena<QueryPool>,
    pub command_pools: Arena<CommandPool>,
    pub command_buffers: Arena<CommandBuffer>,
    pub fences: Arena<Fence>,
    pub semaphores: Arena<Semaphore>,
    pub events: Arena<Event>,
}

impl Device {
    pub fn create(_physical_device: &PhysicalDevice) -> Device {
        Device {
            config: DeviceConfig::from_env(),
            queue: Queue,
            memories: Arena::new(),
            buffers: Arena::new(),
            images: Arena::new(),
            image_views: Arena::new(),
            buffer_views: Arena::new(),
            samplers: Arena::new(),
            shader_modules: Arena::new(),
            descriptor_set_layouts: Arena::new(),
            descriptor_pools: Arena::new(),
            descriptor_sets: Arena::new(),
            graphics_pipelines: Arena::new(),
            compute_pipelines: Arena::new(),
            render_passes: Arena::new(),
            framebuffers: Arena::new(),
            query_pools: Arena::new(),
            command_pools: Arena::new(),
            command_buffers: Arena::new(),
            fences: Arena::new(),
            semaphores: Arena::new(),
            events: Arena::new(),
        }
    }

    pub fn allocate_memory(&mut self, size: u64) -> Result<Handle<DeviceMemory>> {
        Ok(self.memories.insert(DeviceMemory::allocate(size)?))
    }

    pub fn bind_buffer_memory(&mut self, buffer: Handle<Buffer>, memory: Handle<DeviceMemory>, offset: u64) -> Result<()> {
        let buf = self.buffers.get_mut(buffer).ok_or(Error::InitializationFailed)?;
        buf.binding = Some(crate::resource::MemoryBinding { memory, offset });
        Ok(())
    }

    pub fn bind_image_memory(&mut self, image: Handle<Image>, memory: Handle<DeviceMemory>, offset: u64) -> Result<()> {
        let img = self.images.get_mut(image).ok_or(Error::InitializationFailed)?;
        img.binding = Some(crate::resource::MemoryBinding { memory, offset });
        Ok(())
    }

    pub fn create_shader_module(&mut self, bytes: &[u8]) -> Result<Handle<ShaderModule>> {
        Ok(self.shader_modules.insert(ShaderModule::new(bytes)?))
    }

    /// `vkCreateGraphicsPipelines`'s single-pipeline form (§4.7 "C7"):
    /// reflects every stage's descriptor and push-constant bindings once,
    /// then hands the compiled stages to `vkcpu_raster::Pipeline::new`.
    #[allow(clippy::too_many_arguments)]
    pub fn create_graphics_pipeline(
        &mut self,
        stages: &[(ShaderStage, Handle<ShaderModule>, String, SpecializationInfo)],
        vertex_input: vkcpu_raster::pipeline::VertexInputState,
        input_assembly: vkcpu_raster::pipeline::InputAssemblyState,
        viewports: Vec<vkcpu_raster::pipeline::Viewport>,
        scissors: Vec<vkcpu_raster::pipeline::Rect2D>,
        rasterization: vkcpu_raster::pipeline::RasterizationState,
        multisample: vkcpu_raster::pipeline::MultisampleState,
        depth_stencil: vkcpu_raster::pipeline::DepthStencilState,
        color_blend: vkcpu_raster::pipeline::ColorBlendState,
        dynamic_state: vkcpu_raster::pipeline::DynamicStateFlags,
    ) -> Result<Handle<GraphicsPipelineObject>> {
        let mut reflection = FxHashMap::default();
        let mut sources = Vec::with_capacity(stages.len());
        for (stage, module_handle, entry_point, spec_info) in stages {
            let module = self.shader_modules.get(*module_handle).ok_or(Error::InitializationFailed)?;
            reflection.insert(
                *stage,
                StageReflection { bindings: resource_bindings(&module.parsed), push_constants: push_constant_globals(&module.parsed) },
            );
            sources.push(StageSource { stage: *stage, module: &module.parsed, entry_point, spec_info: spec_info.clone() });
        }
        let pipeline = Pipeline::new(
            sources,
            self.config.fragment_workers,
            vertex_input,
            input_assembly,
            viewports,
            scissors,
            rasterization,
            multisample,
            depth_stencil,
            color_blend,
            dynamic_state,
        )?;
        Ok(self.graphics_pipelines.insert(GraphicsPipelineObject { pipeline, reflection }))
    }

    pub fn create_compute_pipeline(&mut self, module_handle: Handle<ShaderModule>, entry_point: &str, spec_info: SpecializationInfo) -> Result<Handle<ComputePipelineObject>> {
        let module = self.shader_modules.get(module_handle).ok_or(Error::InitializationFailed)?;
        let reflection = StageReflection { bindings: resource_bindings(&module.parsed), push_constants: push_constant_globals(&module.parsed) };
        let local_size = local_workgroup_size(&module.parsed);
        let sources = vec![StageSource { stage: ShaderStage::Compute, module: &module.parsed, entry_point, spec_info }];
        let pipeline = Pipeline::new(
            sources,
            1,
            Default::default(),
            vkcpu_raster::pipeline::InputAssemblyState { topology: vkcpu_raster::pipeline::PrimitiveTopology::TriangleList, primitive_restart_enable: false },
            Vec::new(),
            Vec::new(),
            Default::default(),
            Default::default(),
            Default::default(),
            Default::default(),
            vkcpu_raster::pipeline::DynamicStateFlags::empty(),
        )?;
        Ok(self.compute_pipelines.insert(ComputePipelineObject { pipeline, reflection, local_size }))
    }

    pub fn create_framebuffer(&mut self, attachments: Vec<Handle<ImageView>>, width: u32, height: u32, layers: u32) -> Handle<Framebuffer> {
        self.framebuffers.insert(Framebuffer { attachments, width, height, layers })
    }

    pub fn create_command_pool(&mut self) -> Handle<CommandPool> {
        self.command_pools.insert(CommandPool::new())
    }

    pub fn allocate_command_buffer(&mut self, pool: Handle<CommandPool>) -> Result<Handle<CommandBuffer>> {
        let handle = self.command_buffers.insert(CommandBuffer::new(pool));
        self.command_pools.get_mut(pool).ok_or(Error::InitializationFailed)?.buffers.push(handle);
        Ok(handle)
    }

    /// Cascades onto every command buffer the pool owns, matching
    /// `vkDestroyCommandPool`'s "implicitly frees all command buffers
    /// allocated from it" contract (the same cascade shape the teacher's
    /// `render::arena` module drives for its own backend objects).
    pub fn destroy_command_pool(&mut self, pool: Handle<CommandPool>) {
        if let Some(p) = self.command_pools.remove(pool) {
            for buf in p.buffers {
                self.command_buffers.remove(buf);
            }
        }
    }

    pub fn create_descriptor_pool(&mut self, max_sets: u32) -> Handle<DescriptorPool> {
        self.descriptor_pools.insert(DescriptorPool::new(max_sets))
    }

    pub fn allocate_descriptor_set(&mut self, pool: Handle<DescriptorPool>, layout: crate::descriptor::DescriptorSetLayout) -> Result<Handle<DescriptorSet>> {
        let p = self.descriptor_pools.get_mut(pool).ok_or(Error::InitializationFailed)?;
        if p.sets.len() as u32 >= p.max_sets {
            return Err(Error::OutOfDeviceMemory);
        }
        let handle = self.descriptor_sets.insert(DescriptorSet::new(layout));
        self.descriptor_pools.get_mut(pool).unwrap().sets.push(handle);
        Ok(handle)
    }

    pub fn destroy_descriptor_pool(&mut self, pool: Handle<DescriptorPool>) {
        if let Some(p) = self.descriptor_pools.remove(pool) {
            for set in p.sets {
                self.descriptor_sets.remove(set);
            }
        }
    }
}

/// Reads `OpExecutionMode ... LocalSize x y z` off a compute module,
/// defaulting to `(1, 1, 1)` if the shader declares none (SPIR-V requires
/// `GLCompute` entry points to declare a local size through either this
/// mode or a `LocalSizeId` spec-constant form; only the literal form is
/// supported here, matching the rest of this crate's no-spec-constant-IDs
/// simplification for execution modes).
fn local_workgroup_size(module: &vkcpu_spirv::Module) -> (u32, u32, u32) {
    for (_, inst) in module.decode() {
        if let vkcpu_spirv::inst::Instruction::ExecutionMode(m) = inst {
            if m.mode == spirv_headers::ExecutionMode::LocalSize && m.optional_literals.len() >= 3 {
                return (m.optional_literals[0], m.optional_literals[1], m.optional_literals[2]);
            }
        }
    }
    (1, 1, 1)
}
