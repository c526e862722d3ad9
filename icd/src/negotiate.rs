//! Loader-negotiation ABI (§6 "External interfaces"): the three symbols a
//! Vulkan loader dlopens by name before it ever calls anything else. Every
//! other entry point (`vkCreateInstance` included) is reached only through
//! [`icd_get_instance_proc_address`]'s name table — there is no exported
//! `vkCreateInstance` symbol, matching a loader-negotiated ICD rather than
//! the legacy pre-negotiation calling convention.
use std::ffi::{c_char, c_void, CStr};
use std::os::raw::c_int;
use std::sync::Once;

use crate::dispatch::IcdInstance;
use crate::header::is_valid_dispatchable;
use crate::result::VkResult;
use crate::{entry_command, entry_instance, entry_pipeline, entry_resource, entry_sync};

/// Highest `ICD_LOADER_INTERFACE_VERSION` this driver speaks. Version 5
/// is the first to require `icd_get_physical_device_proc_address`
/// alongside the two `*_get_instance_proc_address` paths (§6).
const SUPPORTED_LOADER_INTERFACE_VERSION: u32 = 5;

static LOGGER_INIT: Once = Once::new();

fn ensure_logger() {
    // Gated here rather than at a `vkCreateInstance` call: negotiation is
    // the very first entry point a loader touches, so this is the earliest
    // point a host process's own `env_logger` installation (if any) has
    // already happened and `try_init` can detect it without clobbering it.
    LOGGER_INIT.call_once(|| {
        let _ = env_logger::try_init();
    });
}

/// `vk_icdNegotiateLoaderICDInterfaceVersion`. `supported_version` is
/// in/out: the loader writes the highest version *it* speaks in, and this
/// function writes back `min(that, SUPPORTED_LOADER_INTERFACE_VERSION)`.
///
/// # Safety
/// `supported_version` must be a valid pointer to a `u32`.
#[no_mangle]
pub unsafe extern "C" fn icd_negotiate_loader_interface_version(supported_version: *mut u32) -> c_int {
    ensure_logger();
    if supported_version.is_null() {
        return VkResult::ErrorInitializationFailed as c_int;
    }
    let requested = *supported_version;
    *supported_version = requested.min(SUPPORTED_LOADER_INTERFACE_VERSION);
    debug!("negotiated loader interface version {}", *supported_version);
    VkResult::Success as c_int
}

type VoidFn = unsafe extern "C" fn();

/// Resolves a name against the instance-level and device-level entry
/// points. `instance` may be null only for the handful of names that are
/// valid to query before an instance exists (`vkCreateInstance`,
/// `vkEnumerateInstanceVersion`, `vkEnumerateInstanceExtensionProperties`).
///
/// # Safety
/// `instance`, if non-null, must be a live `IcdInstance` returned by
/// `entry_instance::vkCreateInstance` and not yet destroyed. `name` must be
/// a valid null-terminated C string.
#[no_mangle]
pub unsafe extern "C" fn icd_get_instance_proc_address(instance: *mut IcdInstance, name: *const c_char) -> Option<VoidFn> {
    if name.is_null() {
        return None;
    }
    let name = match CStr::from_ptr(name).to_str() {
        Ok(s) => s,
        Err(_) => return None,
    };
    if !instance.is_null() && !is_valid_dispatchable(instance) {
        warn!("icd_get_instance_proc_address called with a corrupt instance handle");
        return None;
    }
    lookup(name)
}

/// `vk_icdGetPhysicalDeviceProcAddr`: the loader-interface-v2+ companion
/// table for the handful of physical-device-level entry points
/// (`vkGetPhysicalDeviceFeatures` and friends) a loader may dispatch
/// directly rather than through `icd_get_instance_proc_address`.
///
/// # Safety
/// `instance` must be a live `IcdInstance`. `name` must be a valid
/// null-terminated C string.
#[no_mangle]
pub unsafe extern "C" fn icd_get_physical_device_proc_address(instance: *mut IcdInstance, name: *const c_char) -> Option<VoidFn> {
    if instance.is_null() || !is_valid_dispatchable(instance) {
        return None;
    }
    icd_get_instance_proc_address(instance, name)
}

/// Name -> function-pointer table. Kept as one big match rather than an
/// `fxhash` map: the lookup happens once per call site at application
/// startup (loaders cache the result), never on a hot path.
unsafe fn lookup(name: &str) -> Option<VoidFn> {
    macro_rules! entry {
        ($f:expr) => {
            Some(std::mem::transmute::<_, VoidFn>($f as *const c_void))
        };
    }
    match name {
        "vkGetInstanceProcAddr" => entry!(icd_get_instance_proc_address as unsafe extern "C" fn(*mut IcdInstance, *const c_char) -> Option<VoidFn>),
        "vkCreateInstance" => entry!(entry_instance::vk_create_instance as unsafe extern "C" fn(*mut c_void) -> *mut IcdInstance),
        "vkDestroyInstance" => entry!(entry_instance::vk_destroy_instance as unsafe extern "C" fn(*mut IcdInstance)),
        "vkEnumeratePhysicalDevices" => {
            entry!(entry_instance::vk_enumerate_physical_devices as unsafe extern "C" fn(*mut IcdInstance, *mut u32, *mut *mut crate::dispatch::IcdPhysicalDevice) -> c_int)
        }
        "vkGetPhysicalDeviceProperties" => {
            entry!(entry_instance::vk_get_physical_device_properties as unsafe extern "C" fn(*mut crate::dispatch::IcdPhysicalDevice, *mut entry_instance::VkPhysicalDeviceProperties))
        }
        "vkGetPhysicalDeviceFormatProperties" => {
            entry!(entry_instance::vk_get_physical_device_format_properties as unsafe extern "C" fn(*mut crate::dispatch::IcdPhysicalDevice, crate::format_map::VkFormat) -> u32)
        }
        "vkCreateDevice" => entry!(entry_instance::vk_create_device as unsafe extern "C" fn(*mut crate::dispatch::IcdPhysicalDevice) -> *mut crate::dispatch::IcdDevice),
        "vkDestroyDevice" => entry!(entry_instance::vk_destroy_device as unsafe extern "C" fn(*mut crate::dispatch::IcdDevice)),
        "vkGetDeviceQueue" => entry!(entry_instance::vk_get_device_queue as unsafe extern "C" fn(*mut crate::dispatch::IcdDevice) -> *mut crate::dispatch::IcdQueue),

        "vkAllocateMemory" => entry!(entry_resource::vk_allocate_memory as unsafe extern "C" fn(*mut crate::dispatch::IcdDevice, u64) -> u64),
        "vkFreeMemory" => entry!(entry_resource::vk_free_memory as unsafe extern "C" fn(*mut crate::dispatch::IcdDevice, u64)),
        "vkMapMemory" => entry!(entry_resource::vk_map_memory as unsafe extern "C" fn(*mut crate::dispatch::IcdDevice, u64) -> *mut u8),
        "vkCreateBuffer" => entry!(entry_resource::vk_create_buffer as unsafe extern "C" fn(*mut crate::dispatch::IcdDevice, u64, u32) -> u64),
        "vkDestroyBuffer" => entry!(entry_resource::vk_destroy_buffer as unsafe extern "C" fn(*mut crate::dispatch::IcdDevice, u64)),
        "vkBindBufferMemory" => entry!(entry_resource::vk_bind_buffer_memory as unsafe extern "C" fn(*mut crate::dispatch::IcdDevice, u64, u64, u64) -> c_int),
        "vkCreateImage" => entry!(entry_resource::vk_create_image as unsafe extern "C" fn(*mut crate::dispatch::IcdDevice, *const entry_resource::VkImageCreateInfo) -> u64),
        "vkDestroyImage" => entry!(entry_resource::vk_destroy_image as unsafe extern "C" fn(*mut crate::dispatch::IcdDevice, u64)),
        "vkBindImageMemory" => entry!(entry_resource::vk_bind_image_memory as unsafe extern "C" fn(*mut crate::dispatch::IcdDevice, u64, u64, u64) -> c_int),
        "vkCreateImageView" => entry!(entry_resource::vk_create_image_view as unsafe extern "C" fn(*mut crate::dispatch::IcdDevice, *const entry_resource::VkImageViewCreateInfo) -> u64),
        "vkDestroyImageView" => entry!(entry_resource::vk_destroy_image_view as unsafe extern "C" fn(*mut crate::dispatch::IcdDevice, u64)),
        "vkCreateSampler" => entry!(entry_resource::vk_create_sampler as unsafe extern "C" fn(*mut crate::dispatch::IcdDevice) -> u64),
        "vkDestroySampler" => entry!(entry_resource::vk_destroy_sampler as unsafe extern "C" fn(*mut crate::dispatch::IcdDevice, u64)),
        "vkCreateShaderModule" => entry!(entry_resource::vk_create_shader_module as unsafe extern "C" fn(*mut crate::dispatch::IcdDevice, *const u8, usize) -> u64),
        "vkDestroyShaderModule" => entry!(entry_resource::vk_destroy_shader_module as unsafe extern "C" fn(*mut crate::dispatch::IcdDevice, u64)),

        "vkCreateRenderPass" => entry!(entry_pipeline::vk_create_render_pass as unsafe extern "C" fn(*mut crate::dispatch::IcdDevice, *const entry_pipeline::VkRenderPassCreateInfo) -> u64),
        "vkDestroyRenderPass" => entry!(entry_pipeline::vk_destroy_render_pass as unsafe extern "C" fn(*mut crate::dispatch::IcdDevice, u64)),
        "vkCreateFramebuffer" => entry!(entry_pipeline::vk_create_framebuffer as unsafe extern "C" fn(*mut crate::dispatch::IcdDevice, *const u64, u32, u32, u32, u32) -> u64),
        "vkDestroyFramebuffer" => entry!(entry_pipeline::vk_destroy_framebuffer as unsafe extern "C" fn(*mut crate::dispatch::IcdDevice, u64)),
        "vkCreateDescriptorSetLayout" => {
            entry!(entry_pipeline::vk_create_descriptor_set_layout as unsafe extern "C" fn(*mut crate::dispatch::IcdDevice, *const entry_pipeline::VkDescriptorSetLayoutBinding, u32) -> u64)
        }
        "vkCreateDescriptorPool" => entry!(entry_pipeline::vk_create_descriptor_pool as unsafe extern "C" fn(*mut crate::dispatch::IcdDevice, u32) -> u64),
        "vkDestroyDescriptorPool" => entry!(entry_pipeline::vk_destroy_descriptor_pool as unsafe extern "C" fn(*mut crate::dispatch::IcdDevice, u64)),
        "vkAllocateDescriptorSets" => entry!(entry_pipeline::vk_allocate_descriptor_set as unsafe extern "C" fn(*mut crate::dispatch::IcdDevice, u64, u64) -> u64),
        "vkUpdateDescriptorSetBuffer" => entry!(entry_pipeline::vk_update_descriptor_set_buffer as unsafe extern "C" fn(*mut crate::dispatch::IcdDevice, u64, u32, u64, u64, u64)),
        "vkUpdateDescriptorSetImage" => entry!(entry_pipeline::vk_update_descriptor_set_image as unsafe extern "C" fn(*mut crate::dispatch::IcdDevice, u64, u32, u64, u64)),
        "vkCreateGraphicsPipelines" => {
            entry!(entry_pipeline::vk_create_graphics_pipeline as unsafe extern "C" fn(*mut crate::dispatch::IcdDevice, *const entry_pipeline::VkGraphicsPipelineCreateInfo) -> u64)
        }
        "vkCreateComputePipelines" => {
            entry!(entry_pipeline::vk_create_compute_pipeline as unsafe extern "C" fn(*mut crate::dispatch::IcdDevice, u64, *const c_char, *const u8, usize) -> u64)
        }
        "vkDestroyPipeline" => entry!(entry_pipeline::vk_destroy_pipeline as unsafe extern "C" fn(*mut crate::dispatch::IcdDevice, u64, u32)),

        "vkCreateCommandPool" => entry!(entry_command::vk_create_command_pool as unsafe extern "C" fn(*mut crate::dispatch::IcdDevice) -> u64),
        "vkDestroyCommandPool" => entry!(entry_command::vk_destroy_command_pool as unsafe extern "C" fn(*mut crate::dispatch::IcdDevice, u64)),
        "vkAllocateCommandBuffers" => entry!(entry_command::vk_allocate_command_buffer as unsafe extern "C" fn(*mut crate::dispatch::IcdDevice, u64) -> *mut crate::dispatch::IcdCommandBuffer),
        "vkFreeCommandBuffers" => entry!(entry_command::vk_free_command_buffer as unsafe extern "C" fn(*mut crate::dispatch::IcdCommandBuffer)),
        "vkBeginCommandBuffer" => entry!(entry_command::vk_begin_command_buffer as unsafe extern "C" fn(*mut crate::dispatch::IcdCommandBuffer) -> c_int),
        "vkEndCommandBuffer" => entry!(entry_command::vk_end_command_buffer as unsafe extern "C" fn(*mut crate::dispatch::IcdCommandBuffer) -> c_int),
        "vkResetCommandBuffer" => entry!(entry_command::vk_reset_command_buffer as unsafe extern "C" fn(*mut crate::dispatch::IcdCommandBuffer)),
        "vkCmdBindPipeline" => entry!(entry_command::vk_cmd_bind_pipeline as unsafe extern "C" fn(*mut crate::dispatch::IcdCommandBuffer, u32, u64)),
        "vkCmdBindVertexBuffers" => entry!(entry_command::vk_cmd_bind_vertex_buffer as unsafe extern "C" fn(*mut crate::dispatch::IcdCommandBuffer, u32, u64, u64)),
        "vkCmdBindIndexBuffer" => entry!(entry_command::vk_cmd_bind_index_buffer as unsafe extern "C" fn(*mut crate::dispatch::IcdCommandBuffer, u64, u64, u32)),
        "vkCmdBindDescriptorSets" => entry!(entry_command::vk_cmd_bind_descriptor_sets as unsafe extern "C" fn(*mut crate::dispatch::IcdCommandBuffer, u32, u32, *const u64, u32)),
        "vkCmdPushConstants" => entry!(entry_command::vk_cmd_push_constants as unsafe extern "C" fn(*mut crate::dispatch::IcdCommandBuffer, *const u8, u32)),
        "vkCmdSetViewport" => entry!(entry_command::vk_cmd_set_viewport as unsafe extern "C" fn(*mut crate::dispatch::IcdCommandBuffer, *const crate::ffi_types::VkViewport, u32)),
        "vkCmdSetScissor" => entry!(entry_command::vk_cmd_set_scissor as unsafe extern "C" fn(*mut crate::dispatch::IcdCommandBuffer, *const crate::ffi_types::VkRect2D, u32)),
        "vkCmdDraw" => entry!(entry_command::vk_cmd_draw as unsafe extern "C" fn(*mut crate::dispatch::IcdCommandBuffer, u32, u32, u32, u32)),
        "vkCmdDrawIndexed" => entry!(entry_command::vk_cmd_draw_indexed as unsafe extern "C" fn(*mut crate::dispatch::IcdCommandBuffer, u32, u32, u32, u32)),
        "vkCmdDispatch" => entry!(entry_command::vk_cmd_dispatch as unsafe extern "C" fn(*mut crate::dispatch::IcdCommandBuffer, u32, u32, u32)),
        "vkCmdBeginRenderPass" => entry!(entry_command::vk_cmd_begin_render_pass as unsafe extern "C" fn(*mut crate::dispatch::IcdCommandBuffer, u64, u64, *const crate::ffi_types::VkClearColorValue, u32)),
        "vkCmdEndRenderPass" => entry!(entry_command::vk_cmd_end_render_pass as unsafe extern "C" fn(*mut crate::dispatch::IcdCommandBuffer)),
        "vkCmdCopyBuffer" => entry!(entry_command::vk_cmd_copy_buffer as unsafe extern "C" fn(*mut crate::dispatch::IcdCommandBuffer, u64, u64, u64, u64, u64)),
        "vkCmdClearColorImage" => entry!(entry_command::vk_cmd_clear_color_image as unsafe extern "C" fn(*mut crate::dispatch::IcdCommandBuffer, u64, *const crate::ffi_types::VkClearColorValue)),
        "vkCmdSetEvent" => entry!(entry_command::vk_cmd_set_event as unsafe extern "C" fn(*mut crate::dispatch::IcdCommandBuffer, u64)),
        "vkCmdResetEvent" => entry!(entry_command::vk_cmd_reset_event as unsafe extern "C" fn(*mut crate::dispatch::IcdCommandBuffer, u64)),
        "vkCmdWaitEvents" => entry!(entry_command::vk_cmd_wait_events as unsafe extern "C" fn(*mut crate::dispatch::IcdCommandBuffer, *const u64, u32)),

        "vkCreateFence" => entry!(entry_sync::vk_create_fence as unsafe extern "C" fn(*mut crate::dispatch::IcdDevice, u32) -> u64),
        "vkDestroyFence" => entry!(entry_sync::vk_destroy_fence as unsafe extern "C" fn(*mut crate::dispatch::IcdDevice, u64)),
        "vkResetFences" => entry!(entry_sync::vk_reset_fences as unsafe extern "C" fn(*mut crate::dispatch::IcdDevice, *const u64, u32)),
        "vkGetFenceStatus" => entry!(entry_sync::vk_get_fence_status as unsafe extern "C" fn(*mut crate::dispatch::IcdDevice, u64) -> c_int),
        "vkWaitForFences" => entry!(entry_sync::vk_wait_for_fences as unsafe extern "C" fn(*mut crate::dispatch::IcdDevice, *const u64, u32, u32, u64) -> c_int),
        "vkCreateSemaphore" => entry!(entry_sync::vk_create_semaphore as unsafe extern "C" fn(*mut crate::dispatch::IcdDevice) -> u64),
        "vkDestroySemaphore" => entry!(entry_sync::vk_destroy_semaphore as unsafe extern "C" fn(*mut crate::dispatch::IcdDevice, u64)),
        "vkCreateEvent" => entry!(entry_sync::vk_create_event as unsafe extern "C" fn(*mut crate::dispatch::IcdDevice) -> u64),
        "vkDestroyEvent" => entry!(entry_sync::vk_destroy_event as unsafe extern "C" fn(*mut crate::dispatch::IcdDevice, u64)),
        "vkSetEvent" => entry!(entry_sync::vk_set_event as unsafe extern "C" fn(*mut crate::dispatch::IcdDevice, u64)),
        "vkResetEvent" => entry!(entry_sync::vk_reset_event as unsafe extern "C" fn(*mut crate::dispatch::IcdDevice, u64)),
        "vkGetEventStatus" => entry!(entry_sync::vk_get_event_status as unsafe extern "C" fn(*mut crate::dispatch::IcdDevice, u64) -> c_int),
        "vkQueueSubmit" => entry!(entry_sync::vk_queue_submit as unsafe extern "C" fn(*mut crate::dispatch::IcdQueue, *const u64, u32, u64) -> c_int),
        "vkQueueWaitIdle" => entry!(entry_sync::vk_queue_wait_idle as unsafe extern "C" fn(*mut crate::dispatch::IcdQueue) -> c_int),
        "vkDeviceWaitIdle" => entry!(entry_sync::vk_device_wait_idle as unsafe extern "C" fn(*mut crate::dispatch::IcdDevice) -> c_int),
        "vkQueuePresentKHR" => entry!(entry_sync::vk_queue_present as unsafe extern "C" fn(*mut crate::dispatch::IcdQueue, u64) -> *const u8),

        _ => {
            trace!("unresolved proc address request: {}", name);
            None
        }
    }
}
