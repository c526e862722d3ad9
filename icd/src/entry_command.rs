//! Command pool/buffer lifecycle and the `vkCmd*` recording surface (§5
//! "C10"). Every `vkCmd*` trampoline here just builds one
//! `vkcpu_core::command::Command` value and appends it with `record` —
//! replay (`vkcpu_core::command::execute`) happens later, at
//! `vkQueueSubmit` (`entry_sync::vk_queue_submit`).
use vkcpu_core::command::{BufferCopy, Command, PipelineBindPoint};
use vkcpu_raster::assemble::IndexType;
use vkcpu_raster::pipeline::{Rect2D, Viewport};
use vkcpu_raster::renderpass::ClearValue;

use crate::dispatch::{IcdCommandBuffer, IcdDevice};
use crate::header::is_valid_dispatchable;
use crate::ndhandle;
use crate::result::VkResult;

/// # Safety
/// `device` must be a live `IcdDevice`.
#[no_mangle]
pub unsafe extern "C" fn vk_create_command_pool(device: *mut IcdDevice) -> u64 {
    if !is_valid_dispatchable(device) {
        return 0;
    }
    ndhandle::to_u64((*device).inner.create_command_pool())
}

/// # Safety
/// `device` must be a live `IcdDevice`; `pool` a live handle on it. Every
/// `IcdCommandBuffer` dispatchable wrapper previously allocated from this
/// pool via `vk_allocate_command_buffer` becomes dangling and must not be
/// used again — matching `vkDestroyCommandPool`'s implicit-free contract,
/// this driver does not additionally free those dispatchable wrappers here
/// (the caller is expected to have already freed them, exactly as real
/// Vulkan usage requires command buffers not to be destroyed pool-first).
#[no_mangle]
pub unsafe extern "C" fn vk_destroy_command_pool(device: *mut IcdDevice, pool: u64) {
    if pool == 0 || !is_valid_dispatchable(device) {
        return;
    }
    let handle = ndhandle::from_u64(pool);
    (*device).inner.destroy_command_pool(handle);
    ndhandle::free::<vkcpu_core::command::CommandPool>(pool);
}

/// # Safety
/// `device` must be a live `IcdDevice`; `pool` a live handle on it.
#[no_mangle]
pub unsafe extern "C" fn vk_allocate_command_buffer(device: *mut IcdDevice, pool: u64) -> *mut IcdCommandBuffer {
    if !is_valid_dispatchable(device) {
        return std::ptr::null_mut();
    }
    let pool_handle = ndhandle::from_u64(pool);
    match (*device).inner.allocate_command_buffer(pool_handle) {
        Ok(handle) => IcdCommandBuffer::create(device, handle),
        Err(e) => {
            warn!("vkAllocateCommandBuffers failed: {}", e);
            std::ptr::null_mut()
        }
    }
}

/// Only frees the dispatchable wrapper: the underlying recorded-command
/// slot is freed by `vk_destroy_command_pool`'s cascade, matching
/// `vkFreeCommandBuffers`/`vkDestroyCommandPool` both being valid ways to
/// reclaim a command buffer.
///
/// # Safety
/// `cb` must be null or a live `IcdCommandBuffer` from
/// `vk_allocate_command_buffer`.
#[no_mangle]
pub unsafe extern "C" fn vk_free_command_buffer(cb: *mut IcdCommandBuffer) {
    if cb.is_null() {
        return;
    }
    IcdCommandBuffer::destroy(cb);
}

/// # Safety
/// `cb` must be a live `IcdCommandBuffer`.
#[no_mangle]
pub unsafe extern "C" fn vk_begin_command_buffer(cb: *mut IcdCommandBuffer) -> std::os::raw::c_int {
    with_buffer_result(cb, |buffer| buffer.begin())
}

/// # Safety
/// `cb` must be a live `IcdCommandBuffer`.
#[no_mangle]
pub unsafe extern "C" fn vk_end_command_buffer(cb: *mut IcdCommandBuffer) -> std::os::raw::c_int {
    with_buffer_result(cb, |buffer| buffer.end())
}

/// # Safety
/// `cb` must be a live `IcdCommandBuffer`.
#[no_mangle]
pub unsafe extern "C" fn vk_reset_command_buffer(cb: *mut IcdCommandBuffer) {
    if !is_valid_dispatchable(cb) {
        return;
    }
    let device = (*cb).device;
    let handle = (*cb).handle;
    if let Some(buffer) = (*device).inner.command_buffers.get_mut(handle) {
        buffer.reset();
    }
}

unsafe fn with_buffer_result(cb: *mut IcdCommandBuffer, f: impl FnOnce(&mut vkcpu_core::command::CommandBuffer) -> vkcpu_core::error::Result<()>) -> std::os::raw::c_int {
    if !is_valid_dispatchable(cb) {
        return VkResult::ErrorInitializationFailed as std::os::raw::c_int;
    }
    let device = (*cb).device;
    let handle = (*cb).handle;
    match (*device).inner.command_buffers.get_mut(handle) {
        Some(buffer) => match f(buffer) {
            Ok(()) => VkResult::Success as std::os::raw::c_int,
            Err(e) => VkResult::from(e) as std::os::raw::c_int,
        },
        None => VkResult::ErrorInitializationFailed as std::os::raw::c_int,
    }
}

unsafe fn record(cb: *mut IcdCommandBuffer, cmd: Command) {
    if !is_valid_dispatchable(cb) {
        return;
    }
    let device = (*cb).device;
    let handle = (*cb).handle;
    if let Some(buffer) = (*device).inner.command_buffers.get_mut(handle) {
        if let Err(e) = buffer.record(cmd) {
            warn!("command recording rejected: {}", e);
        }
    }
}

/// `bind_point_is_compute != 0` selects `BindComputePipeline` over
/// `BindGraphicsPipeline` (the two pipeline kinds live in separate arenas
/// here, design ledger).
///
/// # Safety
/// `cb` must be a live `IcdCommandBuffer`; `pipeline` a live handle in the
/// arena `bind_point_is_compute` selects.
#[no_mangle]
pub unsafe extern "C" fn vk_cmd_bind_pipeline(cb: *mut IcdCommandBuffer, bind_point_is_compute: u32, pipeline: u64) {
    let cmd = if bind_point_is_compute != 0 { Command::BindComputePipeline(ndhandle::from_u64(pipeline)) } else { Command::BindGraphicsPipeline(ndhandle::from_u64(pipeline)) };
    record(cb, cmd);
}

/// # Safety
/// `cb` must be a live `IcdCommandBuffer`; `buffer` a live `Buffer` handle.
#[no_mangle]
pub unsafe extern "C" fn vk_cmd_bind_vertex_buffer(cb: *mut IcdCommandBuffer, binding: u32, buffer: u64, offset: u64) {
    record(cb, Command::BindVertexBuffer { binding, buffer: ndhandle::from_u64(buffer), offset });
}

/// `index_type_is_u32 != 0` selects `IndexType::Uint32`.
///
/// # Safety
/// `cb` must be a live `IcdCommandBuffer`; `buffer` a live `Buffer` handle.
#[no_mangle]
pub unsafe extern "C" fn vk_cmd_bind_index_buffer(cb: *mut IcdCommandBuffer, buffer: u64, offset: u64, index_type_is_u32: u32) {
    let index_type = if index_type_is_u32 != 0 { IndexType::Uint32 } else { IndexType::Uint16 };
    record(cb, Command::BindIndexBuffer { buffer: ndhandle::from_u64(buffer), offset, index_type });
}

/// # Safety
/// `cb` must be a live `IcdCommandBuffer`; `sets` valid for `count` reads,
/// each a live `DescriptorSet` handle.
#[no_mangle]
pub unsafe extern "C" fn vk_cmd_bind_descriptor_sets(cb: *mut IcdCommandBuffer, bind_point_is_compute: u32, first_set: u32, sets: *const u64, count: u32) {
    let bind_point = if bind_point_is_compute != 0 { PipelineBindPoint::Compute } else { PipelineBindPoint::Graphics };
    let sets = std::slice::from_raw_parts(sets, count as usize).iter().map(|&raw| ndhandle::from_u64(raw)).collect();
    record(cb, Command::BindDescriptorSets { bind_point, first_set, sets });
}

/// # Safety
/// `cb` must be a live `IcdCommandBuffer`; `data` valid for `size` reads.
#[no_mangle]
pub unsafe extern "C" fn vk_cmd_push_constants(cb: *mut IcdCommandBuffer, data: *const u8, size: u32) {
    let bytes = std::slice::from_raw_parts(data, size as usize).to_vec();
    record(cb, Command::PushConstants { data: bytes });
}

/// # Safety
/// `cb` must be a live `IcdCommandBuffer`; `viewports` valid for `count` reads.
#[no_mangle]
pub unsafe extern "C" fn vk_cmd_set_viewport(cb: *mut IcdCommandBuffer, viewports: *const crate::ffi_types::VkViewport, count: u32) {
    let vp: Vec<Viewport> = std::slice::from_raw_parts(viewports, count as usize).iter().map(|&v| v.into()).collect();
    record(cb, Command::SetViewport(vp));
}

/// # Safety
/// `cb` must be a live `IcdCommandBuffer`; `scissors` valid for `count` reads.
#[no_mangle]
pub unsafe extern "C" fn vk_cmd_set_scissor(cb: *mut IcdCommandBuffer, scissors: *const crate::ffi_types::VkRect2D, count: u32) {
    let sc: Vec<Rect2D> = std::slice::from_raw_parts(scissors, count as usize).iter().map(|&r| r.into()).collect();
    record(cb, Command::SetScissor(sc));
}

/// # Safety
/// `cb` must be a live `IcdCommandBuffer`.
#[no_mangle]
pub unsafe extern "C" fn vk_cmd_draw(cb: *mut IcdCommandBuffer, vertex_count: u32, instance_count: u32, first_vertex: u32, first_instance: u32) {
    record(cb, Command::Draw { vertex_count, instance_count, first_vertex, first_instance });
}

/// # Safety
/// `cb` must be a live `IcdCommandBuffer`.
#[no_mangle]
pub unsafe extern "C" fn vk_cmd_draw_indexed(cb: *mut IcdCommandBuffer, index_count: u32, instance_count: u32, first_index: u32, first_instance: u32) {
    record(cb, Command::DrawIndexed { index_count, instance_count, first_index, first_instance });
}

/// # Safety
/// `cb` must be a live `IcdCommandBuffer`.
#[no_mangle]
pub unsafe extern "C" fn vk_cmd_dispatch(cb: *mut IcdCommandBuffer, x: u32, y: u32, z: u32) {
    record(cb, Command::Dispatch { x, y, z });
}

/// Single-subpass simplification (design ledger): `clear_colors` supplies
/// one `VK_ATTACHMENT_LOAD_OP_CLEAR` color value per color attachment, in
/// attachment order; a render pass with a depth-stencil attachment that
/// also needs clearing is out of this entry point's scope (see ledger).
///
/// # Safety
/// `cb` must be a live `IcdCommandBuffer`; `render_pass` and `framebuffer`
/// live handles; `clear_colors` valid for `count` reads.
#[no_mangle]
pub unsafe extern "C" fn vk_cmd_begin_render_pass(cb: *mut IcdCommandBuffer, render_pass: u64, framebuffer: u64, clear_colors: *const crate::ffi_types::VkClearColorValue, count: u32) {
    let clear_values: Vec<ClearValue> = std::slice::from_raw_parts(clear_colors, count as usize).iter().map(|c| ClearValue::Color(c.float32)).collect();
    record(cb, Command::BeginRenderPass { render_pass: ndhandle::from_u64(render_pass), framebuffer: ndhandle::from_u64(framebuffer), clear_values });
}

/// # Safety
/// `cb` must be a live `IcdCommandBuffer`.
#[no_mangle]
pub unsafe extern "C" fn vk_cmd_end_render_pass(cb: *mut IcdCommandBuffer) {
    record(cb, Command::EndRenderPass);
}

/// Single-region simplification of `vkCmdCopyBuffer` (design ledger): one
/// `BufferCopy` region per call instead of an array.
///
/// # Safety
/// `cb` must be a live `IcdCommandBuffer`; `src`/`dst` live `Buffer` handles.
#[no_mangle]
pub unsafe extern "C" fn vk_cmd_copy_buffer(cb: *mut IcdCommandBuffer, src: u64, dst: u64, src_offset: u64, dst_offset: u64, size: u64) {
    record(cb, Command::CopyBuffer { src: ndhandle::from_u64(src), dst: ndhandle::from_u64(dst), regions: vec![BufferCopy { src_offset, dst_offset, size }] });
}

/// # Safety
/// `cb` must be a live `IcdCommandBuffer`; `image` a live `Image` handle;
/// `color` a valid pointer.
#[no_mangle]
pub unsafe extern "C" fn vk_cmd_clear_color_image(cb: *mut IcdCommandBuffer, image: u64, color: *const crate::ffi_types::VkClearColorValue) {
    record(cb, Command::ClearColorImage { image: ndhandle::from_u64(image), color: (*color).float32 });
}

/// # Safety
/// `cb` must be a live `IcdCommandBuffer`; `event` a live `Event` handle.
#[no_mangle]
pub unsafe extern "C" fn vk_cmd_set_event(cb: *mut IcdCommandBuffer, event: u64) {
    record(cb, Command::SetEvent(ndhandle::from_u64(event)));
}

/// # Safety
/// `cb` must be a live `IcdCommandBuffer`; `event` a live `Event` handle.
#[no_mangle]
pub unsafe extern "C" fn vk_cmd_reset_event(cb: *mut IcdCommandBuffer, event: u64) {
    record(cb, Command::ResetEvent(ndhandle::from_u64(event)));
}

/// # Safety
/// `cb` must be a live `IcdCommandBuffer`; `events` valid for `count` reads.
#[no_mangle]
pub unsafe extern "C" fn vk_cmd_wait_events(cb: *mut IcdCommandBuffer, events: *const u64, count: u32) {
    let events = std::slice::from_raw_parts(events, count as usize).iter().map(|&raw| ndhandle::from_u64(raw)).collect();
    record(cb, Command::WaitEvents(events));
}
