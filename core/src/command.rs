//! Command buffers and their replay (§5 "C10"): recording just appends to
//! a plain `Vec<Command>` — no sort key, unlike the teacher's own
//! `render::command::Command` (which reorders by `sortkey` because its
//! backend is free to interleave draw calls across command buffers). A
//! Vulkan command buffer's recorded order is itself the execution order
//! (§5's "strict recorded order" invariant), so reordering here would be
//! a correctness bug, not an optimisation.
use vkcpu_format::codec::{self, Extent3D};
use vkcpu_format::describe;
use vkcpu_raster::assemble::{self, DrawParams as RasterDrawParams, IndexBuffer, IndexType};
use vkcpu_raster::pipeline::{ColorBlendState, DepthStencilState, DynamicStateFlags, FrontFace, MultisampleState, RasterizationState, Rect2D, ShaderStage, Viewport};
use vkcpu_raster::raster::{rasterize_primitives, ColorAttachment, DepthStencilAttachment};
use vkcpu_raster::renderpass::{self, ClearValue, ImageLayout, RenderPass};

use crate::descriptor::{BindContext, BindStorage};
use crate::device::{ComputePipelineObject, Device, Framebuffer, GraphicsPipelineObject};
use crate::error::{Error, Result};
use crate::handle::Handle;
use crate::resource::{Buffer, Image, QueryPool};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum CommandBufferState {
    Initial,
    Recording,
    Executable,
    Pending,
    Invalid,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PipelineBindPoint {
    Graphics,
    Compute,
}

#[derive(Clone, Copy, Debug)]
pub struct BufferCopy {
    pub src_offset: u64,
    pub dst_offset: u64,
    pub size: u64,
}

#[derive(Clone, Copy, Debug)]
pub struct ImageSubresourceLayers {
    pub mip_level: u32,
    pub base_array_layer: u32,
    pub layer_count: u32,
}

#[derive(Clone, Copy, Debug)]
pub struct ImageCopy {
    pub src_subresource: ImageSubresourceLayers,
    pub src_offset: (i32, i32, i32),
    pub dst_subresource: ImageSubresourceLayers,
    pub dst_offset: (i32, i32, i32),
    pub extent: Extent3D,
}

#[derive(Clone)]
pub enum Command {
    BindGraphicsPipeline(Handle<GraphicsPipelineObject>),
    BindComputePipeline(Handle<ComputePipelineObject>),
    BindDescriptorSets { bind_point: PipelineBindPoint, first_set: u32, sets: Vec<Handle<crate::descriptor::DescriptorSet>> },
    BindVertexBuffer { binding: u32, buffer: Handle<Buffer>, offset: u64 },
    BindIndexBuffer { buffer: Handle<Buffer>, offset: u64, index_type: IndexType },
    PushConstants { data: Vec<u8> },
    SetViewport(Vec<Viewport>),
    SetScissor(Vec<Rect2D>),
    SetLineWidth(f32),
    SetDepthBias { constant_factor: f32, slope_factor: f32 },
    SetBlendConstants([f32; 4]),
    Draw { vertex_count: u32, instance_count: u32, first_vertex: u32, first_instance: u32 },
    DrawIndexed { index_count: u32, instance_count: u32, first_index: u32, first_instance: u32 },
    Dispatch { x: u32, y: u32, z: u32 },
    BeginRenderPass { render_pass: Handle<RenderPass>, framebuffer: Handle<Framebuffer>, clear_values: Vec<ClearValue> },
    NextSubpass,
    EndRenderPass,
    CopyBuffer { src: Handle<Buffer>, dst: Handle<Buffer>, regions: Vec<BufferCopy> },
    CopyImage { src: Handle<Image>, dst: Handle<Image>, regions: Vec<ImageCopy> },
    ClearColorImage { image: Handle<Image>, color: [f32; 4] },
    ClearDepthStencilImage { image: Handle<Image>, depth: f32, stencil: u32 },
    PipelineBarrierImageLayout { image: Handle<Image>, old_layout: ImageLayout, new_layout: ImageLayout },
    SetEvent(Handle<crate::sync::Event>),
    ResetEvent(Handle<crate::sync::Event>),
    WaitEvents(Vec<Handle<crate::sync::Event>>),
    ResetQueryPool { pool: Handle<QueryPool>, first: u32, count: u32 },
    WriteTimestamp { pool: Handle<QueryPool>, query: u32, value: u64 },
}

#[derive(Default)]
pub struct CommandPool {
    pub buffers: Vec<Handle<CommandBuffer>>,
}

impl CommandPool {
    pub fn new() -> CommandPool {
        CommandPool::default()
    }
}

/// A recorded command buffer plus its lifecycle state (§5 "C10"):
/// `Initial -> Recording -> Executable -> Pending -> (Executable | Invalid)`.
/// Resetting the pool or the buffer itself drops the recorded commands and
/// returns to `Initial`.
pub struct CommandBuffer {
    pub pool: Handle<CommandPool>,
    pub state: CommandBufferState,
    pub commands: Vec<Command>,
}

impl CommandBuffer {
    pub fn new(pool: Handle<CommandPool>) -> CommandBuffer {
        CommandBuffer { pool, state: CommandBufferState::Initial, commands: Vec::new() }
    }

    pub fn begin(&mut self) -> Result<()> {
        if self.state != CommandBufferState::Initial {
            return Err(Error::InitializationFailed);
        }
        self.commands.clear();
        self.state = CommandBufferState::Recording;
        Ok(())
    }

    pub fn end(&mut self) -> Result<()> {
        if self.state != CommandBufferState::Recording {
            return Err(Error::InitializationFailed);
        }
        self.state = CommandBufferState::Executable;
        Ok(())
    }

    pub fn reset(&mut self) {
        self.commands.clear();
        self.state = CommandBufferState::Initial;
    }

    pub fn record(&mut self, cmd: Command) -> Result<()> {
        if self.state != CommandBufferState::Recording {
            return Err(Error::InitializationFailed);
        }
        self.commands.push(cmd);
        Ok(())
    }
}

/// Fixed-function override state a `CmdSet*` command replaces for every
/// subsequent draw, tracked as the replay loop walks the recorded list in
/// order (§4.10): a command buffer carries no separate "current dynamic
/// state" at record time, only at replay time.
#[derive(Default)]
struct DynamicOverrides {
    viewports: Option<Vec<Viewport>>,
    scissors: Option<Vec<Rect2D>>,
    line_width: Option<f32>,
    depth_bias: Option<(f32, f32)>,
    blend_constants: Option<[f32; 4]>,
}

struct RenderPassState {
    render_pass: Handle<RenderPass>,
    framebuffer: Handle<Framebuffer>,
    subpass: usize,
}

struct BoundDescriptors {
    graphics: Vec<Handle<crate::descriptor::DescriptorSet>>,
    compute: Vec<Handle<crate::descriptor::DescriptorSet>>,
}

/// Replays one command buffer's recorded list against `device`'s resource
/// arenas (§5, §4.8, §4.9). Called once per submitted command buffer from
/// `Device::queue_submit`, in submission order, and within a single
/// command buffer, in strict recorded order.
pub fn execute(device: &mut Device, buffer: Handle<CommandBuffer>) -> Result<()> {
    let commands = {
        let cb = device.command_buffers.get(buffer).ok_or(Error::InitializationFailed)?;
        cb.commands.clone_commands()
    };

    let mut graphics_pipeline: Option<Handle<GraphicsPipelineObject>> = None;
    let mut compute_pipeline: Option<Handle<ComputePipelineObject>> = None;
    let mut descriptors = BoundDescriptors { graphics: Vec::new(), compute: Vec::new() };
    let mut vertex_buffers: Vec<Option<(Handle<Buffer>, u64)>> = Vec::new();
    let mut index_buffer: Option<(Handle<Buffer>, u64, IndexType)> = None;
    let mut dynamic = DynamicOverrides::default();
    let mut push_constant_data: Vec<u8> = Vec::new();
    let mut render_pass_state: Option<RenderPassState> = None;

    for cmd in &commands {
        match cmd {
            Command::BindGraphicsPipeline(h) => graphics_pipeline = Some(*h),
            Command::BindComputePipeline(h) => compute_pipeline = Some(*h),
            Command::BindDescriptorSets { bind_point, first_set, sets } => {
                let target = match bind_point {
                    PipelineBindPoint::Graphics => &mut descriptors.graphics,
                    PipelineBindPoint::Compute => &mut descriptors.compute,
                };
                let needed = *first_set as usize + sets.len();
                if target.len() < needed {
                    target.resize(needed, sets.first().copied().unwrap_or_else(|| sets[0]));
                }
                for (i, s) in sets.iter().enumerate() {
                    target[*first_set as usize + i] = *s;
                }
            }
            Command::BindVertexBuffer { binding, buffer, offset } => {
                let idx = *binding as usize;
                if vertex_buffers.len() <= idx {
                    vertex_buffers.resize(idx + 1, None);
                }
                vertex_buffers[idx] = Some((*buffer, *offset));
            }
            Command::BindIndexBuffer { buffer: b, offset, index_type } => index_buffer = Some((*b, *offset, *index_type)),
            Command::PushConstants { data } => push_constant_data = data.clone(),
            Command::SetViewport(v) => dynamic.viewports = Some(v.clone()),
            Command::SetScissor(s) => dynamic.scissors = Some(s.clone()),
            Command::SetLineWidth(w) => dynamic.line_width = Some(*w),
            Command::SetDepthBias { constant_factor, slope_factor } => dynamic.depth_bias = Some((*constant_factor, *slope_factor)),
            Command::SetBlendConstants(c) => dynamic.blend_constants = Some(*c),
            Command::Draw { vertex_count, instance_count, first_vertex, first_instance } => {
                let params = RasterDrawParams { vertex_count: *vertex_count, instance_count: *instance_count, first_vertex: *first_vertex, first_instance: *first_instance };
                draw(device, graphics_pipeline, &descriptors.graphics, &vertex_buffers, None, &params, &dynamic, &push_constant_data, render_pass_state.as_ref())?;
            }
            Command::DrawIndexed { index_count, instance_count, first_index, first_instance } => {
                let params = RasterDrawParams { vertex_count: *index_count, instance_count: *instance_count, first_vertex: *first_index, first_instance: *first_instance };
                draw(device, graphics_pipeline, &descriptors.graphics, &vertex_buffers, index_buffer, &params, &dynamic, &push_constant_data, render_pass_state.as_ref())?;
            }
            Command::Dispatch { x, y, z } => dispatch(device, compute_pipeline, &descriptors.compute, &push_constant_data, *x, *y, *z)?,
            Command::BeginRenderPass { render_pass, framebuffer, clear_values } => {
                begin_render_pass(device, *render_pass, *framebuffer, clear_values)?;
                render_pass_state = Some(RenderPassState { render_pass: *render_pass, framebuffer: *framebuffer, subpass: 0 });
            }
            Command::NextSubpass => {
                if let Some(rp) = render_pass_state.as_mut() {
                    rp.subpass += 1;
                }
            }
            Command::EndRenderPass => {
                if let Some(rp) = render_pass_state.take() {
                    end_render_pass(device, rp.render_pass, rp.framebuffer)?;
                }
            }
            Command::CopyBuffer { src, dst, regions } => copy_buffer(device, *src, *dst, regions)?,
            Command::CopyImage { src, dst, regions } => copy_image(device, *src, *dst, regions)?,
            Command::ClearColorImage { image, color } => clear_color_image(device, *image, *color)?,
            Command::ClearDepthStencilImage { image, depth, stencil } => clear_depth_stencil_image(device, *image, *depth, *stencil)?,
            Command::PipelineBarrierImageLayout { image, old_layout, new_layout } => {
                if let Some(img) = device.images.get_mut(*image) {
                    img.layout = *new_layout;
                }
                renderpass::transition_layout(image.index, *old_layout, *new_layout);
            }
            Command::SetEvent(h) => {
                if let Some(e) = device.events.get(*h) {
                    e.set();
                }
            }
            Command::ResetEvent(h) => {
                if let Some(e) = device.events.get(*h) {
                    e.reset();
                }
            }
            Command::WaitEvents(handles) => {
                for h in handles {
                    if let Some(e) = device.events.get(*h) {
                        e.wait(None);
                    }
                }
            }
            Command::ResetQueryPool { pool, first, count } => {
                if let Some(p) = device.query_pools.get_mut(*pool) {
                    p.reset(*first, *count);
                }
            }
            Command::WriteTimestamp { pool, query, value } => {
                if let Some(p) = device.query_pools.get_mut(*pool) {
                    p.write(*query, *value);
                }
            }
        }
    }
    Ok(())
}

/// `Vec<Command>` isn't `Copy`; replay needs an owned snapshot of the
/// recorded list to walk while also mutating `device` (a command buffer
/// can reference resources on the same device it's replaying against), so
/// cloning it up front sidesteps a self-borrow rather than relying on
/// interior mutability the rest of this crate doesn't otherwise use.
trait CloneCommands {
    fn clone_commands(&self) -> Vec<Command>;
}
impl CloneCommands for Vec<Command> {
    fn clone_commands(&self) -> Vec<Command> {
        self.clone()
    }
}

fn write_push_constants(host_ptr: impl Fn(&str) -> Option<*mut u8>, names: &[String], data: &[u8]) {
    for name in names {
        if let Some(cell) = host_ptr(name) {
            let n = data.len().min(256);
            unsafe { std::ptr::copy_nonoverlapping(data.as_ptr(), cell, n) };
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn draw(
    device: &mut Device,
    pipeline: Option<Handle<GraphicsPipelineObject>>,
    sets: &[Handle<crate::descriptor::DescriptorSet>],
    vertex_buffers: &[Option<(Handle<Buffer>, u64)>],
    index_buffer: Option<(Handle<Buffer>, u64, IndexType)>,
    params: &RasterDrawParams,
    dynamic: &DynamicOverrides,
    push_constants: &[u8],
    render_pass_state: Option<&RenderPassState>,
) -> Result<()> {
    let Some(pipeline_handle) = pipeline else { return Err(Error::InitializationFailed) };
    let Some(rp_state) = render_pass_state else { return Err(Error::InitializationFailed) };

    // Snapshot bound descriptor sets as owned values: the rest of this
    // function repeatedly re-borrows `device.graphics_pipelines` mutably,
    // which a `Vec<&DescriptorSet>` tied to `device.descriptor_sets`'s
    // borrow would conflict with.
    let bound_sets: Vec<crate::descriptor::DescriptorSet> = sets.iter().filter_map(|h| device.descriptor_sets.get(*h).cloned()).collect();

    let vb_data: Vec<Vec<u8>> = vertex_buffers
        .iter()
        .map(|binding| match binding {
            Some((buf, offset)) => read_buffer_bytes(device, *buf, *offset, u64::MAX).unwrap_or_default(),
            None => Vec::new(),
        })
        .collect();
    let vb_slices: Vec<&[u8]> = vb_data.iter().map(|v| v.as_slice()).collect();

    let index_data = index_buffer.map(|(buf, offset, ty)| {
        let data = read_buffer_bytes(device, buf, offset, u64::MAX).unwrap_or_default();
        (data, ty)
    });

    let fb = device.framebuffers.get(rp_state.framebuffer).ok_or(Error::InitializationFailed)?;
    let (fb_width, fb_height) = (fb.width, fb.height);
    let color_attachment_views = fb.attachments.clone();

    let (topology, primitive_restart, front_face, cull_mode, vertex_input, viewports, scissors, stage_flags) = {
        let pipeline_obj = device.graphics_pipelines.get_mut(pipeline_handle).ok_or(Error::InitializationFailed)?;
        if let Some(cb) = dynamic.blend_constants {
            pipeline_obj.pipeline.color_blend.blend_constants = cb;
        }
        let viewports = dynamic.viewports.clone().unwrap_or_else(|| pipeline_obj.pipeline.viewports.clone());
        let scissors = dynamic.scissors.clone().unwrap_or_else(|| pipeline_obj.pipeline.scissors.clone());
        let stage_flags: Vec<ShaderStage> = [ShaderStage::Vertex, ShaderStage::Geometry, ShaderStage::TessControl, ShaderStage::TessEval]
            .into_iter()
            .filter(|s| pipeline_obj.pipeline.has_stage(*s))
            .collect();
        (
            pipeline_obj.pipeline.input_assembly.topology,
            pipeline_obj.pipeline.input_assembly.primitive_restart_enable,
            pipeline_obj.pipeline.rasterization.front_face,
            pipeline_obj.pipeline.rasterization.cull_mode,
            pipeline_obj.pipeline.vertex_input.clone(),
            viewports,
            scissors,
            stage_flags,
        )
    };

    // Bind descriptor sets and push constants into every non-fragment
    // stage present, then every fragment worker (each worker compiles its
    // own module and must see the same bindings).
    for stage in stage_flags {
        let reflection = {
            let pipeline_obj = device.graphics_pipelines.get(pipeline_handle).ok_or(Error::InitializationFailed)?;
            pipeline_obj.reflection.get(&stage).cloned().unwrap_or_default()
        };
        let pipeline_obj = device.graphics_pipelines.get_mut(pipeline_handle).ok_or(Error::InitializationFailed)?;
        write_push_constants(|name| pipeline_obj.pipeline.global_ptr(stage, name), &reflection.push_constants, push_constants);
        let mut ctx = BindContext {
            memories: &device.memories,
            buffers: &device.buffers,
            images: &device.images,
            image_views: &device.image_views,
            buffer_views: &device.buffer_views,
            samplers: &device.samplers,
            storage: &mut BindStorage::default(),
        };
        let pipeline_obj = device.graphics_pipelines.get_mut(pipeline_handle).ok_or(Error::InitializationFailed)?;
        crate::descriptor::bind_into_pipeline(|name| pipeline_obj.pipeline.global_ptr(stage, name), &reflection.bindings, &bound_sets, &mut ctx);
    }

    let fragment_reflection = {
        let pipeline_obj = device.graphics_pipelines.get(pipeline_handle).ok_or(Error::InitializationFailed)?;
        pipeline_obj.pipeline.has_stage(ShaderStage::Fragment).then(|| pipeline_obj.reflection.get(&ShaderStage::Fragment).cloned().unwrap_or_default())
    };
    if let Some(reflection) = fragment_reflection {
        let worker_count = device.graphics_pipelines.get(pipeline_handle).ok_or(Error::InitializationFailed)?.pipeline.fragment_worker_count();
        for worker in 0..worker_count {
            let pipeline_obj = device.graphics_pipelines.get_mut(pipeline_handle).ok_or(Error::InitializationFailed)?;
            write_push_constants(|name| pipeline_obj.pipeline.fragment_global_ptr(worker, name), &reflection.push_constants, push_constants);
            let mut ctx = BindContext {
                memories: &device.memories,
                buffers: &device.buffers,
                images: &device.images,
                image_views: &device.image_views,
                buffer_views: &device.buffer_views,
                samplers: &device.samplers,
                storage: &mut BindStorage::default(),
            };
            let pipeline_obj = device.graphics_pipelines.get_mut(pipeline_handle).ok_or(Error::InitializationFailed)?;
            crate::descriptor::bind_into_pipeline(|name| pipeline_obj.pipeline.fragment_global_ptr(worker, name), &reflection.bindings, &bound_sets, &mut ctx);
        }
    }

    let pipeline_obj = device.graphics_pipelines.get_mut(pipeline_handle).ok_or(Error::InitializationFailed)?;

    let indices = index_data.as_ref().map(|(data, ty)| IndexBuffer { data, index_type: *ty });
    let pairs = assemble::vertex_instance_pairs(params, indices.as_ref(), primitive_restart, u32::MAX);
    let vertex_out = assemble::run_vertex_stage(&mut pipeline_obj.pipeline, &pairs, &vertex_input, &vb_slices);
    let primitives = assemble::assemble_primitives(topology, vertex_out);

    let mut staged: Vec<assemble::Primitive> = Vec::new();
    for p in primitives {
        match p {
            assemble::Primitive::Triangle(tri) => staged.extend(assemble::clip_near(tri).into_iter().map(assemble::Primitive::Triangle)),
            other => staged.push(other),
        }
    }
    let clipped: Vec<assemble::Primitive> = staged
        .into_iter()
        .filter(|p| match p {
            assemble::Primitive::Triangle(tri) => {
                let windowed = [assemble::to_window(&tri.v[0], &viewports, 0), assemble::to_window(&tri.v[1], &viewports, 0), assemble::to_window(&tri.v[2], &viewports, 0)];
                !assemble::is_culled(&windowed, front_face, cull_mode)
            }
            _ => true,
        })
        .collect();

    let scissor = scissors.first().copied().unwrap_or(Rect2D { x: 0, y: 0, width: fb_width, height: fb_height });

    with_attachments(device, &color_attachment_views, rp_state.render_pass, |color_targets, depth_stencil| {
        rasterize_primitives(&mut pipeline_obj.pipeline, &clipped, scissor, front_face, color_targets, depth_stencil, |v| assemble::to_window(v, &viewports, 0));
    })
}

fn dispatch(device: &mut Device, pipeline: Option<Handle<ComputePipelineObject>>, sets: &[Handle<crate::descriptor::DescriptorSet>], push_constants: &[u8], gx: u32, gy: u32, gz: u32) -> Result<()> {
    let Some(pipeline_handle) = pipeline else { return Err(Error::InitializationFailed) };
    let bound_sets: Vec<crate::descriptor::DescriptorSet> = sets.iter().filter_map(|h| device.descriptor_sets.get(*h).cloned()).collect();

    let obj = device.compute_pipelines.get(pipeline_handle).ok_or(Error::InitializationFailed)?;
    let reflection = obj.reflection.clone();
    let local_size = obj.local_size;

    let mut ctx = BindContext {
        memories: &device.memories,
        buffers: &device.buffers,
        images: &device.images,
        image_views: &device.image_views,
        buffer_views: &device.buffer_views,
        samplers: &device.samplers,
        storage: &mut BindStorage::default(),
    };
    let obj = device.compute_pipelines.get_mut(pipeline_handle).ok_or(Error::InitializationFailed)?;
    write_push_constants(|name| obj.pipeline.global_ptr(ShaderStage::Compute, name), &reflection.push_constants, push_constants);
    crate::descriptor::bind_into_pipeline(|name| obj.pipeline.global_ptr(ShaderStage::Compute, name), &reflection.bindings, &bound_sets, &mut ctx);

    let entry = obj.pipeline.entry(ShaderStage::Compute).ok_or(Error::InitializationFailed)?;
    let input_layout = vkcpu_translate::builtins::input_layout(vkcpu_translate::builtins::ExecutionModel::GLCompute);
    debug_assert!(input_layout.size >= 48);

    for wz in 0..gz {
        for wy in 0..gy {
            for wx in 0..gx {
                for lz in 0..local_size.2 {
                    for ly in 0..local_size.1 {
                        for lx in 0..local_size.0 {
                            if let Some(ptr) = obj.pipeline.builtin_input_ptr(ShaderStage::Compute) {
                                let global = [wx * local_size.0 + lx, wy * local_size.1 + ly, wz * local_size.2 + lz];
                                let local_index = lz * local_size.0 * local_size.1 + ly * local_size.0 + lx;
                                unsafe {
                                    let words = ptr as *mut u32;
                                    *words = global[0];
                                    *words.add(1) = global[1];
                                    *words.add(2) = global[2];
                                    *words.add(4) = lx;
                                    *words.add(5) = ly;
                                    *words.add(6) = lz;
                                    *words.add(8) = wx;
                                    *words.add(9) = wy;
                                    *words.add(10) = wz;
                                    *words.add(12) = local_index;
                                }
                            }
                            unsafe { entry() };
                        }
                    }
                }
            }
        }
    }
    Ok(())
}

fn read_buffer_bytes(device: &Device, buffer: Handle<Buffer>, offset: u64, max_len: u64) -> Option<Vec<u8>> {
    let buf = device.buffers.get(buffer)?;
    let binding = buf.binding?;
    let mem = device.memories.get(binding.memory)?;
    let available = buf.size.saturating_sub(offset);
    let len = available.min(max_len).min(mem.size().saturating_sub(binding.offset + offset));
    let start = (binding.offset + offset) as usize;
    Some(mem.as_slice()[start..start + len as usize].to_vec())
}

fn with_attachments<F: FnOnce(&mut [ColorAttachment], Option<&mut DepthStencilAttachment>)>(device: &mut Device, views: &[Handle<crate::resource::ImageView>], render_pass: Handle<RenderPass>, f: F) -> Result<()> {
    let _ = device.render_passes.get(render_pass).ok_or(Error::InitializationFailed)?;

    // Resolve every bound view's backing bytes up front, splitting color
    // targets from a single depth/stencil target (at most one per
    // subpass, matching `VkSubpassDescription`'s single `pDepthStencilAttachment`).
    let mut color_raw: Vec<(*mut u8, usize, Format, u32, u32)> = Vec::new();
    let mut depth_raw: Option<(*mut u8, usize, Format, u32, u32)> = None;

    for (i, view_handle) in views.iter().enumerate() {
        let view = device.image_views.get(*view_handle).ok_or(Error::InitializationFailed)?;
        let image = device.images.get(view.image).ok_or(Error::InitializationFailed)?;
        let binding = image.binding.ok_or(Error::InitializationFailed)?;
        let mem = device.memories.get_mut(binding.memory).ok_or(Error::InitializationFailed)?;
        let info = describe(image.format);
        let len = (info.total_size as u64 * image.extent.width as u64 * image.extent.height as u64) as usize;
        let ptr = unsafe { mem.as_mut_slice().as_mut_ptr().add(binding.offset as usize) };
        let is_depth = matches!(image.format, vkcpu_format::Format::D32_SFLOAT | vkcpu_format::Format::D24_UNORM_S8_UINT | vkcpu_format::Format::S8_UINT);
        if is_depth && depth_raw.is_none() {
            depth_raw = Some((ptr, len, image.format, image.extent.width, image.extent.height));
        } else {
            color_raw.push((ptr, len, image.format, image.extent.width, image.extent.height));
        }
        let _ = i;
    }

    let mut colors: Vec<ColorAttachment> = color_raw
        .into_iter()
        .map(|(ptr, len, format, width, height)| ColorAttachment { data: unsafe { std::slice::from_raw_parts_mut(ptr, len) }, format, width, height })
        .collect();
    let mut depth = depth_raw.map(|(ptr, len, format, width, height)| DepthStencilAttachment { data: unsafe { std::slice::from_raw_parts_mut(ptr, len) }, format, width, height });

    f(&mut colors, depth.as_mut());
    Ok(())
}

use vkcpu_format::Format;

fn begin_render_pass(device: &mut Device, render_pass: Handle<RenderPass>, framebuffer: Handle<Framebuffer>, clear_values: &[ClearValue]) -> Result<()> {
    let fb = device.framebuffers.get(framebuffer).ok_or(Error::InitializationFailed)?;
    let views = fb.attachments.clone();
    let rp = device.render_passes.get(render_pass).ok_or(Error::InitializationFailed)?;
    let attachments = rp.attachments.clone();

    with_attachments(device, &views, render_pass, |colors, depth_stencil| {
        let mut color_idx = 0;
        for (i, desc) in attachments.iter().enumerate() {
            let is_depth = is_depth_format(desc.format);
            if is_depth {
                if let (Some(ds), Some(cv)) = (depth_stencil.as_deref_mut(), clear_values.get(i)) {
                    renderpass::apply_depth_stencil_load_op(ds, desc.load_op, desc.stencil_load_op, *cv);
                }
            } else if let Some(target) = colors.get_mut(color_idx) {
                if let Some(cv) = clear_values.get(i) {
                    renderpass::apply_color_load_op(target, desc.load_op, *cv);
                }
                color_idx += 1;
            }
        }
    })
}

fn end_render_pass(device: &mut Device, render_pass: Handle<RenderPass>, framebuffer: Handle<Framebuffer>) -> Result<()> {
    let fb = device.framebuffers.get(framebuffer).ok_or(Error::InitializationFailed)?;
    let views = fb.attachments.clone();
    let rp = device.render_passes.get(render_pass).ok_or(Error::InitializationFailed)?;
    let attachments = rp.attachments.clone();
    with_attachments(device, &views, render_pass, |_colors, _depth_stencil| {
        for (i, desc) in attachments.iter().enumerate() {
            renderpass::apply_store_op(i as u32, desc.store_op);
        }
    })
}

fn is_depth_format(format: Format) -> bool {
    matches!(format, Format::D32_SFLOAT | Format::D24_UNORM_S8_UINT | Format::S8_UINT)
}

fn copy_buffer(device: &mut Device, src: Handle<Buffer>, dst: Handle<Buffer>, regions: &[BufferCopy]) -> Result<()> {
    for region in regions {
        let bytes = read_buffer_bytes(device, src, region.src_offset, region.size).ok_or(Error::InitializationFailed)?;
        let dst_buf = device.buffers.get(dst).ok_or(Error::InitializationFailed)?;
        let binding = dst_buf.binding.ok_or(Error::InitializationFailed)?;
        let mem = device.memories.get_mut(binding.memory).ok_or(Error::InitializationFailed)?;
        let start = (binding.offset + region.dst_offset) as usize;
        mem.as_mut_slice()[start..start + bytes.len()].copy_from_slice(&bytes);
    }
    Ok(())
}

fn copy_image(device: &mut Device, src: Handle<Image>, dst: Handle<Image>, regions: &[ImageCopy]) -> Result<()> {
    for region in regions {
        let (src_info, src_ptr, src_extent, src_layers) = image_mip_view(device, src, region.src_subresource.mip_level)?;
        let (dst_info, dst_ptr, dst_extent, dst_layers) = image_mip_view(device, dst, region.dst_subresource.mip_level)?;
        for layer in 0..region.src_subresource.layer_count.min(region.dst_subresource.layer_count) {
            for k in 0..region.extent.depth {
                for j in 0..region.extent.height {
                    for i in 0..region.extent.width {
                        let src_off = codec::texel_offset(
                            src_info,
                            src_extent,
                            src_layers,
                            (region.src_offset.0 as u32) + i,
                            (region.src_offset.1 as u32) + j,
                            (region.src_offset.2 as u32) + k,
                            region.src_subresource.base_array_layer + layer,
                            0,
                        );
                        let dst_off = codec::texel_offset(
                            dst_info,
                            dst_extent,
                            dst_layers,
                            (region.dst_offset.0 as u32) + i,
                            (region.dst_offset.1 as u32) + j,
                            (region.dst_offset.2 as u32) + k,
                            region.dst_subresource.base_array_layer + layer,
                            0,
                        );
                        unsafe {
                            std::ptr::copy_nonoverlapping(src_ptr.add(src_off as usize), dst_ptr.add(dst_off as usize), src_info.total_size.min(dst_info.total_size) as usize);
                        }
                    }
                }
            }
        }
    }
    Ok(())
}

fn image_mip_view(device: &mut Device, image: Handle<Image>, mip: u32) -> Result<(&'static vkcpu_format::FormatInfo, *mut u8, Extent3D, u32)> {
    let img = device.images.get(image).ok_or(Error::InitializationFailed)?;
    let binding = img.binding.ok_or(Error::InitializationFailed)?;
    let format = img.format;
    let extent = img.extent;
    let array_layers = img.array_layers;
    let info: &'static vkcpu_format::FormatInfo = describe(format);
    let level_offset = codec::mip_offset(info, extent, array_layers, mip);
    let mem = device.memories.get_mut(binding.memory).ok_or(Error::InitializationFailed)?;
    let ptr = unsafe { mem.as_mut_slice().as_mut_ptr().add((binding.offset + level_offset) as usize) };
    Ok((info, ptr, codec::mip_extent(extent, mip), array_layers))
}

fn clear_color_image(device: &mut Device, image: Handle<Image>, color: [f32; 4]) -> Result<()> {
    let (info, ptr, extent, layers) = image_mip_view(device, image, 0)?;
    let total = info.total_size as usize;
    let count = extent.width as usize * extent.height as usize * extent.depth as usize * layers as usize;
    for t in 0..count {
        let texel = unsafe { std::slice::from_raw_parts_mut(ptr.add(t * total), total) };
        codec::set_channel_f32(info, texel, info.channels.red, color[0]);
        codec::set_channel_f32(info, texel, info.channels.green, color[1]);
        codec::set_channel_f32(info, texel, info.channels.blue, color[2]);
        if info.channels.alpha.present() {
            codec::set_channel_f32(info, texel, info.channels.alpha, color[3]);
        }
    }
    Ok(())
}

fn clear_depth_stencil_image(device: &mut Device, image: Handle<Image>, depth: f32, stencil: u32) -> Result<()> {
    let (info, ptr, extent, layers) = image_mip_view(device, image, 0)?;
    let total = info.total_size as usize;
    let count = extent.width as usize * extent.height as usize * extent.depth as usize * layers as usize;
    for t in 0..count {
        let texel = unsafe { std::slice::from_raw_parts_mut(ptr.add(t * total), total) };
        codec::set_channel_f32(info, texel, info.channels.red, depth);
        if info.channels.green.present() {
            codec::set_channel_u32(info, texel, info.channels.green, stencil);
        }
    }
    Ok(())
}
