//! Render pass, framebuffer, descriptor, and pipeline entry points (§4.5-§4.9,
//! C7-C9). `VkGraphicsPipelineCreateInfo`'s usual `pNext`-chained sub-struct
//! pointers collapse into one flat `#[repr(C)]` struct here — still one
//! field per fixed-function state block `vkcpu_raster::pipeline` models,
//! just without the separate allocation per block a real loader would do.
use std::ffi::{c_char, CStr};

use vkcpu_raster::pipeline as rp;
use vkcpu_raster::renderpass as rpass;

use crate::dispatch::IcdDevice;
use crate::ffi_types::{VkAttachmentDescription, VkRect2D, VkViewport};
use crate::header::is_valid_dispatchable;
use crate::ndhandle;

#[repr(C)]
pub struct VkRenderPassCreateInfo {
    pub attachments: *const VkAttachmentDescription,
    pub attachment_count: u32,
    pub color_attachments: *const u32,
    pub color_attachment_count: u32,
    /// `u32::MAX` means "no depth-stencil attachment", matching the
    /// `VK_ATTACHMENT_UNUSED` sentinel a real `VkAttachmentReference` uses.
    pub depth_stencil_attachment: u32,
}

/// Single-subpass simplification (design ledger): every render pass this
/// driver creates has exactly one subpass reading `color_attachments` as
/// its color outputs and, optionally, `depth_stencil_attachment` as its
/// depth-stencil output. No input or resolve attachments are modelled.
///
/// # Safety
/// `device` must be a live `IcdDevice`; `info` a valid pointer whose array
/// fields are valid for their declared counts.
#[no_mangle]
pub unsafe extern "C" fn vk_create_render_pass(device: *mut IcdDevice, info: *const VkRenderPassCreateInfo) -> u64 {
    if !is_valid_dispatchable(device) || info.is_null() {
        return 0;
    }
    let info = &*info;
    let attachments: Vec<rpass::AttachmentDescription> = std::slice::from_raw_parts(info.attachments, info.attachment_count as usize)
        .iter()
        .filter_map(|a| {
            let format = crate::format_map::to_internal(a.format)?;
            Some(rpass::AttachmentDescription {
                format,
                load_op: a.load_op.into(),
                store_op: a.store_op.into(),
                stencil_load_op: a.stencil_load_op.into(),
                stencil_store_op: a.stencil_store_op.into(),
                initial_layout: a.initial_layout.into(),
                final_layout: a.final_layout.into(),
            })
        })
        .collect();

    let color_indices = std::slice::from_raw_parts(info.color_attachments, info.color_attachment_count as usize);
    let color_attachments: Vec<rpass::AttachmentReference> =
        color_indices.iter().map(|&i| rpass::AttachmentReference { attachment: i, layout: rpass::ImageLayout::ColorAttachmentOptimal }).collect();

    let depth_stencil_attachment = if info.depth_stencil_attachment == u32::MAX {
        None
    } else {
        Some(rpass::AttachmentReference { attachment: info.depth_stencil_attachment, layout: rpass::ImageLayout::DepthStencilAttachmentOptimal })
    };

    let subpass = rpass::SubpassDescription { color_attachments, depth_stencil_attachment, ..Default::default() };
    let handle = (*device).inner.render_passes.insert(rpass::RenderPass { attachments, subpasses: vec![subpass] });
    ndhandle::to_u64(handle)
}

/// # Safety
/// `device` must be a live `IcdDevice`; `render_pass` a live handle on it.
#[no_mangle]
pub unsafe extern "C" fn vk_destroy_render_pass(device: *mut IcdDevice, render_pass: u64) {
    if render_pass == 0 || !is_valid_dispatchable(device) {
        return;
    }
    let handle = ndhandle::from_u64(render_pass);
    (*device).inner.render_passes.remove(handle);
    ndhandle::free::<rpass::RenderPass>(render_pass);
}

/// # Safety
/// `device` must be a live `IcdDevice`; `attachments` valid for
/// `attachment_count` reads, each a live `ImageView` handle on `device`.
#[no_mangle]
pub unsafe extern "C" fn vk_create_framebuffer(device: *mut IcdDevice, attachments: *const u64, attachment_count: u32, width: u32, height: u32, layers: u32) -> u64 {
    if !is_valid_dispatchable(device) {
        return 0;
    }
    let views = std::slice::from_raw_parts(attachments, attachment_count as usize).iter().map(|&raw| ndhandle::from_u64(raw)).collect();
    let handle = (*device).inner.create_framebuffer(views, width, height, layers);
    ndhandle::to_u64(handle)
}

/// # Safety
/// `device` must be a live `IcdDevice`; `framebuffer` a live handle on it.
#[no_mangle]
pub unsafe extern "C" fn vk_destroy_framebuffer(device: *mut IcdDevice, framebuffer: u64) {
    if framebuffer == 0 || !is_valid_dispatchable(device) {
        return;
    }
    let handle = ndhandle::from_u64(framebuffer);
    (*device).inner.framebuffers.remove(handle);
    ndhandle::free::<vkcpu_core::device::Framebuffer>(framebuffer);
}

#[repr(u32)]
#[derive(Copy, Clone)]
pub enum VkDescriptorType {
    Sampler = 0,
    CombinedImageSampler = 1,
    SampledImage = 2,
    StorageImage = 3,
    UniformTexelBuffer = 4,
    StorageTexelBuffer = 5,
    UniformBuffer = 6,
    StorageBuffer = 7,
}

#[repr(C)]
#[derive(Copy, Clone)]
pub struct VkDescriptorSetLayoutBinding {
    pub binding: u32,
    pub descriptor_type: VkDescriptorType,
    pub stage_flags: u32,
}

fn convert_descriptor_type(ty: VkDescriptorType) -> vkcpu_core::descriptor::DescriptorType {
    use vkcpu_core::descriptor::DescriptorType as D;
    match ty {
        VkDescriptorType::Sampler => D::Sampler,
        VkDescriptorType::CombinedImageSampler => D::CombinedImageSampler,
        VkDescriptorType::SampledImage => D::SampledImage,
        VkDescriptorType::StorageImage => D::StorageImage,
        VkDescriptorType::UniformTexelBuffer => D::UniformTexelBuffer,
        VkDescriptorType::StorageTexelBuffer => D::StorageTexelBuffer,
        VkDescriptorType::UniformBuffer => D::UniformBuffer,
        VkDescriptorType::StorageBuffer => D::StorageBuffer,
    }
}

/// `DescriptorSetLayout` is a value, not a device-owned arena entry in its
/// own right upstream of allocation (`Device::allocate_descriptor_set`
/// takes one by value) — this driver still arenas it so the FFI side has a
/// stable 64-bit handle to hand `vk_allocate_descriptor_set` later.
///
/// # Safety
/// `device` must be a live `IcdDevice`; `bindings` valid for `count` reads.
#[no_mangle]
pub unsafe extern "C" fn vk_create_descriptor_set_layout(device: *mut IcdDevice, bindings: *const VkDescriptorSetLayoutBinding, count: u32) -> u64 {
    if !is_valid_dispatchable(device) {
        return 0;
    }
    let bindings = std::slice::from_raw_parts(bindings, count as usize)
        .iter()
        .map(|b| vkcpu_core::descriptor::DescriptorSetLayoutBinding { binding: b.binding, descriptor_type: convert_descriptor_type(b.descriptor_type), stage_flags: b.stage_flags })
        .collect();
    let handle = (*device).inner.descriptor_set_layouts.insert(vkcpu_core::descriptor::DescriptorSetLayout { bindings });
    ndhandle::to_u64(handle)
}

/// # Safety
/// `device` must be a live `IcdDevice`.
#[no_mangle]
pub unsafe extern "C" fn vk_create_descriptor_pool(device: *mut IcdDevice, max_sets: u32) -> u64 {
    if !is_valid_dispatchable(device) {
        return 0;
    }
    let handle = (*device).inner.create_descriptor_pool(max_sets);
    ndhandle::to_u64(handle)
}

/// # Safety
/// `device` must be a live `IcdDevice`; `pool` a live handle on it.
#[no_mangle]
pub unsafe extern "C" fn vk_destroy_descriptor_pool(device: *mut IcdDevice, pool: u64) {
    if pool == 0 || !is_valid_dispatchable(device) {
        return;
    }
    let handle = ndhandle::from_u64(pool);
    (*device).inner.destroy_descriptor_pool(handle);
    ndhandle::free::<vkcpu_core::descriptor::DescriptorPool>(pool);
}

/// # Safety
/// `device` must be a live `IcdDevice`; `pool` and `layout` live handles.
#[no_mangle]
pub unsafe extern "C" fn vk_allocate_descriptor_set(device: *mut IcdDevice, pool: u64, layout: u64) -> u64 {
    if !is_valid_dispatchable(device) {
        return 0;
    }
    let pool_handle = ndhandle::from_u64(pool);
    let layout_handle = ndhandle::from_u64(layout);
    let Some(layout_value) = (*device).inner.descriptor_set_layouts.get(layout_handle).cloned() else { return 0 };
    match (*device).inner.allocate_descriptor_set(pool_handle, layout_value) {
        Ok(handle) => ndhandle::to_u64(handle),
        Err(e) => {
            warn!("vkAllocateDescriptorSets failed: {}", e);
            0
        }
    }
}

/// One-write-per-call simplification (design ledger) of `vkUpdateDescriptorSets`.
///
/// # Safety
/// `device` must be a live `IcdDevice`; `set` a live handle.
#[no_mangle]
pub unsafe extern "C" fn vk_update_descriptor_set_buffer(device: *mut IcdDevice, set: u64, binding: u32, buffer: u64, offset: u64, range: u64) {
    if !is_valid_dispatchable(device) {
        return;
    }
    let set_handle = ndhandle::from_u64(set);
    let buffer_handle = ndhandle::from_u64(buffer);
    if let Some(s) = (*device).inner.descriptor_sets.get_mut(set_handle) {
        s.write(binding, vkcpu_core::descriptor::DescriptorSlot::Buffer { buffer: buffer_handle, offset, range });
    }
}

/// `sampler == 0` means a `SampledImage`/`StorageImage` write with no
/// combined sampler.
///
/// # Safety
/// `device` must be a live `IcdDevice`; `set` a live handle.
#[no_mangle]
pub unsafe extern "C" fn vk_update_descriptor_set_image(device: *mut IcdDevice, set: u64, binding: u32, view: u64, sampler: u64) {
    if !is_valid_dispatchable(device) {
        return;
    }
    let set_handle = ndhandle::from_u64(set);
    let view_handle = ndhandle::from_u64(view);
    let sampler_handle = if sampler == 0 { None } else { Some(ndhandle::from_u64(sampler)) };
    if let Some(s) = (*device).inner.descriptor_sets.get_mut(set_handle) {
        s.write(binding, vkcpu_core::descriptor::DescriptorSlot::Image { view: view_handle, sampler: sampler_handle });
    }
}

#[repr(u32)]
#[derive(Copy, Clone)]
pub enum VkShaderStage {
    Vertex = 0,
    TessControl = 1,
    TessEval = 2,
    Geometry = 3,
    Fragment = 4,
    Compute = 5,
}

impl From<VkShaderStage> for rp::ShaderStage {
    fn from(s: VkShaderStage) -> Self {
        match s {
            VkShaderStage::Vertex => rp::ShaderStage::Vertex,
            VkShaderStage::TessControl => rp::ShaderStage::TessControl,
            VkShaderStage::TessEval => rp::ShaderStage::TessEval,
            VkShaderStage::Geometry => rp::ShaderStage::Geometry,
            VkShaderStage::Fragment => rp::ShaderStage::Fragment,
            VkShaderStage::Compute => rp::ShaderStage::Compute,
        }
    }
}

#[repr(C)]
pub struct VkPipelineShaderStageInfo {
    pub stage: VkShaderStage,
    pub module: u64,
    pub entry_point: *const c_char,
    pub spec_info_data: *const u8,
    pub spec_info_len: usize,
}

#[repr(u32)]
#[derive(Copy, Clone)]
pub enum VkVertexInputRate {
    Vertex = 0,
    Instance = 1,
}

#[repr(C)]
pub struct VkVertexInputBindingDescription {
    pub binding: u32,
    pub stride: u32,
    pub input_rate: VkVertexInputRate,
}

#[repr(C)]
pub struct VkVertexInputAttributeDescription {
    pub location: u32,
    pub binding: u32,
    pub format: crate::format_map::VkFormat,
    pub offset: u32,
}

#[repr(u32)]
#[derive(Copy, Clone)]
pub enum VkPrimitiveTopology {
    PointList = 0,
    LineList = 1,
    LineStrip = 2,
    TriangleList = 3,
    TriangleStrip = 4,
    TriangleFan = 5,
}

#[repr(u32)]
#[derive(Copy, Clone)]
pub enum VkPolygonMode {
    Fill = 0,
    Line = 1,
    Point = 2,
}

#[repr(u32)]
#[derive(Copy, Clone)]
pub enum VkFrontFace {
    CounterClockwise = 0,
    Clockwise = 1,
}

#[repr(C)]
#[derive(Copy, Clone)]
pub struct VkRasterizationState {
    pub depth_clamp_enable: u32,
    pub rasterizer_discard_enable: u32,
    pub polygon_mode: VkPolygonMode,
    pub cull_mode_bits: u32,
    pub front_face: VkFrontFace,
    pub depth_bias_enable: u32,
    pub depth_bias_constant_factor: f32,
    pub depth_bias_slope_factor: f32,
    pub line_width: f32,
}

#[repr(u32)]
#[derive(Copy, Clone)]
pub enum VkCompareOp {
    Never = 0,
    Less = 1,
    Equal = 2,
    LessOrEqual = 3,
    Greater = 4,
    NotEqual = 5,
    GreaterOrEqual = 6,
    Always = 7,
}

impl From<VkCompareOp> for rp::CompareOp {
    fn from(op: VkCompareOp) -> Self {
        match op {
            VkCompareOp::Never => rp::CompareOp::Never,
            VkCompareOp::Less => rp::CompareOp::Less,
            VkCompareOp::Equal => rp::CompareOp::Equal,
            VkCompareOp::LessOrEqual => rp::CompareOp::LessOrEqual,
            VkCompareOp::Greater => rp::CompareOp::Greater,
            VkCompareOp::NotEqual => rp::CompareOp::NotEqual,
            VkCompareOp::GreaterOrEqual => rp::CompareOp::GreaterOrEqual,
            VkCompareOp::Always => rp::CompareOp::Always,
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone)]
pub struct VkDepthStencilState {
    pub depth_test_enable: u32,
    pub depth_write_enable: u32,
    pub depth_compare_op: VkCompareOp,
    pub stencil_test_enable: u32,
}

#[repr(u32)]
#[derive(Copy, Clone)]
pub enum VkBlendFactor {
    Zero = 0,
    One = 1,
    SrcColor = 2,
    OneMinusSrcColor = 3,
    DstColor = 4,
    OneMinusDstColor = 5,
    SrcAlpha = 6,
    OneMinusSrcAlpha = 7,
    DstAlpha = 8,
    OneMinusDstAlpha = 9,
}

impl From<VkBlendFactor> for rp::BlendFactor {
    fn from(f: VkBlendFactor) -> Self {
        match f {
            VkBlendFactor::Zero => rp::BlendFactor::Zero,
            VkBlendFactor::One => rp::BlendFactor::One,
            VkBlendFactor::SrcColor => rp::BlendFactor::SrcColor,
            VkBlendFactor::OneMinusSrcColor => rp::BlendFactor::OneMinusSrcColor,
            VkBlendFactor::DstColor => rp::BlendFactor::DstColor,
            VkBlendFactor::OneMinusDstColor => rp::BlendFactor::OneMinusDstColor,
            VkBlendFactor::SrcAlpha => rp::BlendFactor::SrcAlpha,
            VkBlendFactor::OneMinusSrcAlpha => rp::BlendFactor::OneMinusSrcAlpha,
            VkBlendFactor::DstAlpha => rp::BlendFactor::DstAlpha,
            VkBlendFactor::OneMinusDstAlpha => rp::BlendFactor::OneMinusDstAlpha,
        }
    }
}

#[repr(u32)]
#[derive(Copy, Clone)]
pub enum VkBlendOp {
    Add = 0,
    Subtract = 1,
    ReverseSubtract = 2,
    Min = 3,
    Max = 4,
}

impl From<VkBlendOp> for rp::BlendOp {
    fn from(op: VkBlendOp) -> Self {
        match op {
            VkBlendOp::Add => rp::BlendOp::Add,
            VkBlendOp::Subtract => rp::BlendOp::Subtract,
            VkBlendOp::ReverseSubtract => rp::BlendOp::ReverseSubtract,
            VkBlendOp::Min => rp::BlendOp::Min,
            VkBlendOp::Max => rp::BlendOp::Max,
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone)]
pub struct VkColorBlendAttachmentState {
    pub blend_enable: u32,
    pub src_color_blend_factor: VkBlendFactor,
    pub dst_color_blend_factor: VkBlendFactor,
    pub color_blend_op: VkBlendOp,
    pub src_alpha_blend_factor: VkBlendFactor,
    pub dst_alpha_blend_factor: VkBlendFactor,
    pub alpha_blend_op: VkBlendOp,
    pub color_write_mask: u32,
}

#[repr(C)]
pub struct VkGraphicsPipelineCreateInfo {
    pub stages: *const VkPipelineShaderStageInfo,
    pub stage_count: u32,
    pub vertex_bindings: *const VkVertexInputBindingDescription,
    pub vertex_binding_count: u32,
    pub vertex_attributes: *const VkVertexInputAttributeDescription,
    pub vertex_attribute_count: u32,
    pub topology: VkPrimitiveTopology,
    pub primitive_restart_enable: u32,
    pub viewports: *const VkViewport,
    pub viewport_count: u32,
    pub scissors: *const VkRect2D,
    pub scissor_count: u32,
    pub rasterization: VkRasterizationState,
    pub rasterization_samples: u32,
    pub depth_stencil: VkDepthStencilState,
    pub color_blend_attachments: *const VkColorBlendAttachmentState,
    pub color_blend_attachment_count: u32,
    pub blend_constants: [f32; 4],
    pub dynamic_state_bits: u32,
}

unsafe fn convert_stage_sources<'a>(stages: &'a [VkPipelineShaderStageInfo], device: &'a IcdDevice) -> Option<Vec<(rp::ShaderStage, vkcpu_core::handle::Handle<vkcpu_core::resource::ShaderModule>, String, vkcpu_translate::constants::SpecializationInfo)>> {
    let mut out = Vec::with_capacity(stages.len());
    for s in stages {
        let module = ndhandle::from_u64(s.module);
        device.inner.shader_modules.get(module)?;
        let entry_point = CStr::from_ptr(s.entry_point).to_str().ok()?.to_owned();
        let spec_info = crate::spec_info::parse(s.spec_info_data, s.spec_info_len);
        out.push((s.stage.into(), module, entry_point, spec_info));
    }
    Some(out)
}

/// # Safety
/// `device` must be a live `IcdDevice`; `info` a valid pointer whose array
/// fields are valid for their declared counts; every shader-module handle
/// referenced must be live on `device`.
#[no_mangle]
pub unsafe extern "C" fn vk_create_graphics_pipeline(device: *mut IcdDevice, info: *const VkGraphicsPipelineCreateInfo) -> u64 {
    if !is_valid_dispatchable(device) || info.is_null() {
        return 0;
    }
    let info = &*info;
    let stage_infos = std::slice::from_raw_parts(info.stages, info.stage_count as usize);
    let Some(stages) = convert_stage_sources(stage_infos, &*device) else { return 0 };

    let vertex_bindings = std::slice::from_raw_parts(info.vertex_bindings, info.vertex_binding_count as usize)
        .iter()
        .map(|b| rp::VertexInputBinding {
            binding: b.binding,
            stride: b.stride,
            input_rate: match b.input_rate {
                VkVertexInputRate::Vertex => rp::VertexInputRate::Vertex,
                VkVertexInputRate::Instance => rp::VertexInputRate::Instance,
            },
        })
        .collect();
    let vertex_attributes: Vec<rp::VertexInputAttribute> = std::slice::from_raw_parts(info.vertex_attributes, info.vertex_attribute_count as usize)
        .iter()
        .filter_map(|a| Some(rp::VertexInputAttribute { location: a.location, binding: a.binding, format: crate::format_map::to_internal(a.format)?, offset: a.offset }))
        .collect();
    let vertex_input = rp::VertexInputState { bindings: vertex_bindings, attributes: vertex_attributes };

    let topology = match info.topology {
        VkPrimitiveTopology::PointList => rp::PrimitiveTopology::PointList,
        VkPrimitiveTopology::LineList => rp::PrimitiveTopology::LineList,
        VkPrimitiveTopology::LineStrip => rp::PrimitiveTopology::LineStrip,
        VkPrimitiveTopology::TriangleList => rp::PrimitiveTopology::TriangleList,
        VkPrimitiveTopology::TriangleStrip => rp::PrimitiveTopology::TriangleStrip,
        VkPrimitiveTopology::TriangleFan => rp::PrimitiveTopology::TriangleFan,
    };
    let input_assembly = rp::InputAssemblyState { topology, primitive_restart_enable: info.primitive_restart_enable != 0 };

    let viewports: Vec<rp::Viewport> = std::slice::from_raw_parts(info.viewports, info.viewport_count as usize).iter().map(|&v| v.into()).collect();
    let scissors: Vec<rp::Rect2D> = std::slice::from_raw_parts(info.scissors, info.scissor_count as usize).iter().map(|&r| r.into()).collect();

    let rz = &info.rasterization;
    let rasterization = rp::RasterizationState {
        depth_clamp_enable: rz.depth_clamp_enable != 0,
        rasterizer_discard_enable: rz.rasterizer_discard_enable != 0,
        polygon_mode: match rz.polygon_mode {
            VkPolygonMode::Fill => rp::PolygonMode::Fill,
            VkPolygonMode::Line => rp::PolygonMode::Line,
            VkPolygonMode::Point => rp::PolygonMode::Point,
        },
        cull_mode: rp::CullMode::from_bits_truncate(rz.cull_mode_bits),
        front_face: match rz.front_face {
            VkFrontFace::CounterClockwise => rp::FrontFace::CounterClockwise,
            VkFrontFace::Clockwise => rp::FrontFace::Clockwise,
        },
        depth_bias_enable: rz.depth_bias_enable != 0,
        depth_bias_constant_factor: rz.depth_bias_constant_factor,
        depth_bias_slope_factor: rz.depth_bias_slope_factor,
        line_width: rz.line_width,
    };

    let multisample = rp::MultisampleState { rasterization_samples: info.rasterization_samples, sample_shading_enable: false };

    let ds = &info.depth_stencil;
    let depth_stencil = rp::DepthStencilState {
        depth_test_enable: ds.depth_test_enable != 0,
        depth_write_enable: ds.depth_write_enable != 0,
        depth_compare_op: ds.depth_compare_op.into(),
        stencil_test_enable: ds.stencil_test_enable != 0,
        ..Default::default()
    };

    let attachments: Vec<rp::ColorBlendAttachmentState> = std::slice::from_raw_parts(info.color_blend_attachments, info.color_blend_attachment_count as usize)
        .iter()
        .map(|a| rp::ColorBlendAttachmentState {
            blend_enable: a.blend_enable != 0,
            src_color_blend_factor: a.src_color_blend_factor.into(),
            dst_color_blend_factor: a.dst_color_blend_factor.into(),
            color_blend_op: a.color_blend_op.into(),
            src_alpha_blend_factor: a.src_alpha_blend_factor.into(),
            dst_alpha_blend_factor: a.dst_alpha_blend_factor.into(),
            alpha_blend_op: a.alpha_blend_op.into(),
            color_write_mask: rp::ColorComponentFlags::from_bits_truncate(a.color_write_mask),
        })
        .collect();
    let color_blend = rp::ColorBlendState { logic_op_enable: false, logic_op: rp::LogicOp::Copy, attachments, blend_constants: info.blend_constants };

    let dynamic_state = rp::DynamicStateFlags::from_bits_truncate(info.dynamic_state_bits);

    match (*device).inner.create_graphics_pipeline(&stages, vertex_input, input_assembly, viewports, scissors, rasterization, multisample, depth_stencil, color_blend, dynamic_state) {
        Ok(handle) => ndhandle::to_u64(handle),
        Err(e) => {
            warn!("vkCreateGraphicsPipelines failed: {}", e);
            0
        }
    }
}

/// # Safety
/// `device` must be a live `IcdDevice`; `module` a live handle; `entry_point`
/// a valid null-terminated C string; `spec_info_data` valid for
/// `spec_info_len` reads (or null/0).
#[no_mangle]
pub unsafe extern "C" fn vk_create_compute_pipeline(device: *mut IcdDevice, module: u64, entry_point: *const c_char, spec_info_data: *const u8, spec_info_len: usize) -> u64 {
    if !is_valid_dispatchable(device) || entry_point.is_null() {
        return 0;
    }
    let Ok(entry_point) = CStr::from_ptr(entry_point).to_str() else { return 0 };
    let module_handle = ndhandle::from_u64(module);
    let spec_info = crate::spec_info::parse(spec_info_data, spec_info_len);
    match (*device).inner.create_compute_pipeline(module_handle, entry_point, spec_info) {
        Ok(handle) => ndhandle::to_u64(handle),
        Err(e) => {
            warn!("vkCreateComputePipelines failed: {}", e);
            0
        }
    }
}

/// `bind_point_is_compute != 0` selects which arena to remove the pipeline
/// from — this driver keeps graphics and compute pipelines in separate
/// arenas (design ledger), unlike Vulkan's single `VkPipeline` handle space,
/// so destruction needs to know which one a given handle came from.
///
/// # Safety
/// `device` must be a live `IcdDevice`; `pipeline` a live handle in the
/// arena `bind_point_is_compute` selects.
#[no_mangle]
pub unsafe extern "C" fn vk_destroy_pipeline(device: *mut IcdDevice, pipeline: u64, bind_point_is_compute: u32) {
    if pipeline == 0 || !is_valid_dispatchable(device) {
        return;
    }
    if bind_point_is_compute != 0 {
        let handle = ndhandle::from_u64(pipeline);
        (*device).inner.compute_pipelines.remove(handle);
        ndhandle::free::<vkcpu_core::device::ComputePipelineObject>(pipeline);
    } else {
        let handle = ndhandle::from_u64(pipeline);
        (*device).inner.graphics_pipelines.remove(handle);
        ndhandle::free::<vkcpu_core::device::GraphicsPipelineObject>(pipeline);
    }
}
