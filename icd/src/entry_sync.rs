//! Fence/semaphore/event lifecycle and queue submission/presentation
//! entry points (§3, C11).
use std::os::raw::c_int;
use std::time::Duration;

use vkcpu_core::command::CommandBuffer;
use vkcpu_core::queue;
use vkcpu_core::sync::{Event, Fence, Semaphore, WaitResult};
use vkcpu_core::Handle;

use crate::dispatch::{IcdDevice, IcdQueue};
use crate::header::is_valid_dispatchable;
use crate::ndhandle;
use crate::result::VkResult;

/// `flags & 1 != 0` requests a fence created already signaled
/// (`VK_FENCE_CREATE_SIGNALED_BIT`'s numeric value).
///
/// # Safety
/// `device` must be a live `IcdDevice`.
#[no_mangle]
pub unsafe extern "C" fn vk_create_fence(device: *mut IcdDevice, flags: u32) -> u64 {
    if !is_valid_dispatchable(device) {
        return 0;
    }
    let handle = (*device).inner.fences.insert(Fence::new(flags & 1 != 0));
    ndhandle::to_u64(handle)
}

/// # Safety
/// `device` must be a live `IcdDevice`; `fence` a live handle on it.
#[no_mangle]
pub unsafe extern "C" fn vk_destroy_fence(device: *mut IcdDevice, fence: u64) {
    if fence == 0 || !is_valid_dispatchable(device) {
        return;
    }
    let handle = ndhandle::from_u64(fence);
    (*device).inner.fences.remove(handle);
    ndhandle::free::<Fence>(fence);
}

/// # Safety
/// `device` must be a live `IcdDevice`; `fences` valid for `count` reads,
/// each a live handle on it.
#[no_mangle]
pub unsafe extern "C" fn vk_reset_fences(device: *mut IcdDevice, fences: *const u64, count: u32) {
    if !is_valid_dispatchable(device) {
        return;
    }
    for &raw in std::slice::from_raw_parts(fences, count as usize) {
        let handle: Handle<Fence> = ndhandle::from_u64(raw);
        if let Some(f) = (*device).inner.fences.get(handle) {
            f.reset();
        }
    }
}

/// # Safety
/// `device` must be a live `IcdDevice`; `fence` a live handle on it.
#[no_mangle]
pub unsafe extern "C" fn vk_get_fence_status(device: *mut IcdDevice, fence: u64) -> c_int {
    if !is_valid_dispatchable(device) {
        return VkResult::ErrorInitializationFailed as c_int;
    }
    let handle = ndhandle::from_u64(fence);
    match (*device).inner.fences.get(handle) {
        Some(f) if f.status() => VkResult::Success as c_int,
        Some(_) => VkResult::NotReady as c_int,
        None => VkResult::ErrorInitializationFailed as c_int,
    }
}

/// `wait_all != 0` waits for every listed fence; `timeout_ns == u64::MAX`
/// waits forever, matching `UINT64_MAX`'s meaning in the real API.
///
/// # Safety
/// `device` must be a live `IcdDevice`; `fences` valid for `count` reads.
#[no_mangle]
pub unsafe extern "C" fn vk_wait_for_fences(device: *mut IcdDevice, fences: *const u64, count: u32, wait_all: u32, timeout_ns: u64) -> c_int {
    if !is_valid_dispatchable(device) {
        return VkResult::ErrorInitializationFailed as c_int;
    }
    let handles: Vec<Handle<Fence>> = std::slice::from_raw_parts(fences, count as usize).iter().map(|&raw| ndhandle::from_u64(raw)).collect();
    let timeout = if timeout_ns == u64::MAX { None } else { Some(Duration::from_nanos(timeout_ns)) };
    let result = queue::wait_for_fences(&(*device).inner, &handles, wait_all != 0, timeout);
    match result {
        WaitResult::Success => VkResult::Success as c_int,
        WaitResult::Timeout => VkResult::Timeout as c_int,
    }
}

/// # Safety
/// `device` must be a live `IcdDevice`.
#[no_mangle]
pub unsafe extern "C" fn vk_create_semaphore(device: *mut IcdDevice) -> u64 {
    if !is_valid_dispatchable(device) {
        return 0;
    }
    let handle = (*device).inner.semaphores.insert(Semaphore::new());
    ndhandle::to_u64(handle)
}

/// # Safety
/// `device` must be a live `IcdDevice`; `semaphore` a live handle on it.
#[no_mangle]
pub unsafe extern "C" fn vk_destroy_semaphore(device: *mut IcdDevice, semaphore: u64) {
    if semaphore == 0 || !is_valid_dispatchable(device) {
        return;
    }
    let handle = ndhandle::from_u64(semaphore);
    (*device).inner.semaphores.remove(handle);
    ndhandle::free::<Semaphore>(semaphore);
}

/// # Safety
/// `device` must be a live `IcdDevice`.
#[no_mangle]
pub unsafe extern "C" fn vk_create_event(device: *mut IcdDevice) -> u64 {
    if !is_valid_dispatchable(device) {
        return 0;
    }
    let handle = (*device).inner.events.insert(Event::new());
    ndhandle::to_u64(handle)
}

/// # Safety
/// `device` must be a live `IcdDevice`; `event` a live handle on it.
#[no_mangle]
pub unsafe extern "C" fn vk_destroy_event(device: *mut IcdDevice, event: u64) {
    if event == 0 || !is_valid_dispatchable(device) {
        return;
    }
    let handle = ndhandle::from_u64(event);
    (*device).inner.events.remove(handle);
    ndhandle::free::<Event>(event);
}

/// # Safety
/// `device` must be a live `IcdDevice`; `event` a live handle on it.
#[no_mangle]
pub unsafe extern "C" fn vk_set_event(device: *mut IcdDevice, event: u64) {
    if !is_valid_dispatchable(device) {
        return;
    }
    let handle = ndhandle::from_u64(event);
    if let Some(e) = (*device).inner.events.get(handle) {
        e.set();
    }
}

/// # Safety
/// `device` must be a live `IcdDevice`; `event` a live handle on it.
#[no_mangle]
pub unsafe extern "C" fn vk_reset_event(device: *mut IcdDevice, event: u64) {
    if !is_valid_dispatchable(device) {
        return;
    }
    let handle = ndhandle::from_u64(event);
    if let Some(e) = (*device).inner.events.get(handle) {
        e.reset();
    }
}

/// # Safety
/// `device` must be a live `IcdDevice`; `event` a live handle on it.
#[no_mangle]
pub unsafe extern "C" fn vk_get_event_status(device: *mut IcdDevice, event: u64) -> c_int {
    if !is_valid_dispatchable(device) {
        return VkResult::ErrorInitializationFailed as c_int;
    }
    let handle = ndhandle::from_u64(event);
    match (*device).inner.events.get(handle) {
        Some(e) if e.status() => VkResult::EventSet as c_int,
        Some(_) => VkResult::EventReset as c_int,
        None => VkResult::ErrorInitializationFailed as c_int,
    }
}

/// Single-batch simplification of `vkQueueSubmit` (design ledger): one
/// implicit batch with no wait/signal semaphore lists, since this driver's
/// queue runs every command buffer to completion inline and has no
/// cross-queue asynchrony for semaphores to order against (§3 "Open
/// Questions").
///
/// # Safety
/// `queue` must be a live `IcdQueue`; `command_buffers` valid for `count`
/// reads, each a live `IcdCommandBuffer` pointer; `fence` must be 0 or a
/// live handle on the owning device.
#[no_mangle]
pub unsafe extern "C" fn vk_queue_submit(queue: *mut IcdQueue, command_buffers: *const u64, count: u32, fence: u64) -> c_int {
    if !is_valid_dispatchable(queue) {
        return VkResult::ErrorInitializationFailed as c_int;
    }
    let device = (*queue).device;
    let cbs: Vec<Handle<CommandBuffer>> = std::slice::from_raw_parts(command_buffers, count as usize)
        .iter()
        .map(|&raw| (*(raw as *const crate::dispatch::IcdCommandBuffer)).handle)
        .collect();
    let fence_handle = if fence == 0 { None } else { Some(ndhandle::from_u64(fence)) };
    let submits = [vkcpu_core::queue::SubmitInfo { wait_semaphores: Vec::new(), command_buffers: cbs, signal_semaphores: Vec::new() }];
    match queue::queue_submit(&mut (*device).inner, &submits, fence_handle) {
        Ok(()) => VkResult::Success as c_int,
        Err(e) => VkResult::from(e) as c_int,
    }
}

/// # Safety
/// `queue` must be a live `IcdQueue`.
#[no_mangle]
pub unsafe extern "C" fn vk_queue_wait_idle(queue: *mut IcdQueue) -> c_int {
    if !is_valid_dispatchable(queue) {
        return VkResult::ErrorInitializationFailed as c_int;
    }
    match queue::queue_wait_idle(&(*(*queue).device).inner) {
        Ok(()) => VkResult::Success as c_int,
        Err(e) => VkResult::from(e) as c_int,
    }
}

/// # Safety
/// `device` must be a live `IcdDevice`.
#[no_mangle]
pub unsafe extern "C" fn vk_device_wait_idle(device: *mut IcdDevice) -> c_int {
    if !is_valid_dispatchable(device) {
        return VkResult::ErrorInitializationFailed as c_int;
    }
    match queue::device_wait_idle(&(*device).inner) {
        Ok(()) => VkResult::Success as c_int,
        Err(e) => VkResult::from(e) as c_int,
    }
}

/// Swapchain-free `vkQueuePresentKHR` (design ledger): takes a raw image
/// handle directly rather than a swapchain/image-index pair, and hands
/// back a pointer to the presented image's backing bytes instead of
/// blitting to a window surface (spec's windowing/swapchain non-goal).
///
/// # Safety
/// `queue` must be a live `IcdQueue`; `image` a live `Image` handle on the
/// owning device.
#[no_mangle]
pub unsafe extern "C" fn vk_queue_present(queue: *mut IcdQueue, image: u64) -> *const u8 {
    if !is_valid_dispatchable(queue) {
        return std::ptr::null();
    }
    let device = (*queue).device;
    let handle = ndhandle::from_u64(image);
    match queue::queue_present(&(*device).inner, handle) {
        Ok(ptr) => ptr,
        Err(e) => {
            warn!("vkQueuePresentKHR failed: {}", e);
            std::ptr::null()
        }
    }
}
