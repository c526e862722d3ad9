//! Instance, physical-device, and device lifecycle entry points (§2, §3).
//! `vkCreateInstance` takes no create-info fields this driver reads (no
//! layers, no instance extensions are modelled) — the parameter exists only
//! so the trampoline's signature matches what a loader expects to call.
use std::ffi::c_void;
use std::os::raw::c_int;

use crate::dispatch::{IcdDevice, IcdInstance, IcdPhysicalDevice, IcdQueue};
use crate::header::is_valid_dispatchable;
use crate::result::VkResult;

#[repr(C)]
pub struct VkPhysicalDeviceProperties {
    pub api_version: u32,
    pub driver_version: u32,
    pub vendor_id: u32,
    pub device_id: u32,
    pub device_name: [u8; 256],
}

/// §6 "External interfaces": no `pCreateInfo` field is read, since this
/// driver has no instance extensions or layers to validate against.
///
/// # Safety
/// `_create_info` is accepted but never dereferenced.
#[no_mangle]
pub unsafe extern "C" fn vk_create_instance(_create_info: *mut c_void) -> *mut IcdInstance {
    info!("creating instance");
    IcdInstance::create()
}

/// # Safety
/// `instance` must be null or a live `IcdInstance` from `vk_create_instance`.
#[no_mangle]
pub unsafe extern "C" fn vk_destroy_instance(instance: *mut IcdInstance) {
    if instance.is_null() {
        return;
    }
    IcdInstance::destroy(instance);
}

/// This driver reports exactly one physical device (§2): the first call
/// with `count` pointing at 0 writes 1 and returns; a call with a non-null
/// `devices` array of length >= 1 fills in the one handle.
///
/// # Safety
/// `instance` must be a live `IcdInstance`. `count` must point to a valid
/// `u32`. `devices`, if non-null, must point to an array of at least
/// `*count` `IcdPhysicalDevice` pointers.
#[no_mangle]
pub unsafe extern "C" fn vk_enumerate_physical_devices(instance: *mut IcdInstance, count: *mut u32, devices: *mut *mut IcdPhysicalDevice) -> c_int {
    if !is_valid_dispatchable(instance) {
        return VkResult::ErrorInitializationFailed as c_int;
    }
    if devices.is_null() {
        *count = 1;
        return VkResult::Success as c_int;
    }
    if *count == 0 {
        return VkResult::Incomplete as c_int;
    }
    *devices = IcdPhysicalDevice::create(instance);
    *count = 1;
    VkResult::Success as c_int
}

/// # Safety
/// `physical_device` must be a live `IcdPhysicalDevice`. `out` must be a
/// valid pointer to a `VkPhysicalDeviceProperties`.
#[no_mangle]
pub unsafe extern "C" fn vk_get_physical_device_properties(physical_device: *mut IcdPhysicalDevice, out: *mut VkPhysicalDeviceProperties) {
    if !is_valid_dispatchable(physical_device) || out.is_null() {
        return;
    }
    let pd = (*physical_device).physical_device();
    let mut name = [0u8; 256];
    let bytes = pd.device_name.as_bytes();
    let n = bytes.len().min(255);
    name[..n].copy_from_slice(&bytes[..n]);
    (*out).api_version = vulkan_api_version(1, 1, 0);
    (*out).driver_version = 1;
    (*out).vendor_id = 0;
    (*out).device_id = 0;
    (*out).device_name = name;
}

fn vulkan_api_version(major: u32, minor: u32, patch: u32) -> u32 {
    (major << 22) | (minor << 12) | patch
}

/// # Safety
/// `physical_device` must be a live `IcdPhysicalDevice`.
#[no_mangle]
pub unsafe extern "C" fn vk_get_physical_device_format_properties(physical_device: *mut IcdPhysicalDevice, format: crate::format_map::VkFormat) -> u32 {
    if !is_valid_dispatchable(physical_device) {
        return 0;
    }
    let Some(internal) = crate::format_map::to_internal(format) else { return 0 };
    (*physical_device).physical_device().format_properties(internal).bits()
}

/// # Safety
/// `physical_device` must be a live `IcdPhysicalDevice`.
#[no_mangle]
pub unsafe extern "C" fn vk_create_device(physical_device: *mut IcdPhysicalDevice) -> *mut IcdDevice {
    if !is_valid_dispatchable(physical_device) {
        return std::ptr::null_mut();
    }
    info!("creating device");
    IcdDevice::create((*physical_device).physical_device())
}

/// Frees the lazily created `vkGetDeviceQueue` queue (§2: a queue has no
/// destroy entry point of its own) before freeing the device itself.
///
/// # Safety
/// `device` must be null or a live `IcdDevice` from `vk_create_device`.
#[no_mangle]
pub unsafe extern "C" fn vk_destroy_device(device: *mut IcdDevice) {
    if device.is_null() {
        return;
    }
    let queue = (*device).queue.get();
    if !queue.is_null() {
        crate::header::free_dispatchable(queue);
    }
    IcdDevice::destroy(device);
}

/// One queue per device (§2); lazily allocated on first call and cached on
/// the device so repeated calls (and `vkDestroyDevice`) see the same
/// pointer.
///
/// # Safety
/// `device` must be a live `IcdDevice`.
#[no_mangle]
pub unsafe extern "C" fn vk_get_device_queue(device: *mut IcdDevice) -> *mut IcdQueue {
    if !is_valid_dispatchable(device) {
        return std::ptr::null_mut();
    }
    let existing = (*device).queue.get();
    if !existing.is_null() {
        return existing;
    }
    let queue = IcdQueue::create(device);
    (*device).queue.set(queue);
    queue
}
