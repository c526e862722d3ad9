//! Memory, buffer, image, and shader-module entry points (§3, §4.1-§4.3,
//! C12). Every handle here is non-dispatchable (`crate::ndhandle`) — these
//! are always arguments to some other object's call, never looked up
//! through a per-object method table.
use std::os::raw::c_int;

use vkcpu_core::resource::{Buffer, BufferUsageFlags, Image, ImageTiling, ImageType, ImageUsageFlags, ImageView, ImageViewType, Sampler};
use vkcpu_format::codec::Extent3D;
use vkcpu_format::runtime::SamplerDescriptor;

use crate::dispatch::IcdDevice;
use crate::header::is_valid_dispatchable;
use crate::ndhandle;
use crate::result::VkResult;

/// # Safety
/// `device` must be a live `IcdDevice`.
#[no_mangle]
pub unsafe extern "C" fn vk_allocate_memory(device: *mut IcdDevice, size: u64) -> u64 {
    if !is_valid_dispatchable(device) {
        return 0;
    }
    match (*device).inner.allocate_memory(size) {
        Ok(handle) => ndhandle::to_u64(handle),
        Err(e) => {
            warn!("vkAllocateMemory failed: {}", e);
            0
        }
    }
}

/// # Safety
/// `device` must be a live `IcdDevice`; `memory` must be 0 or a handle
/// returned by `vk_allocate_memory` on this device and not yet freed.
#[no_mangle]
pub unsafe extern "C" fn vk_free_memory(device: *mut IcdDevice, memory: u64) {
    if memory == 0 || !is_valid_dispatchable(device) {
        return;
    }
    let handle = ndhandle::from_u64(memory);
    (*device).inner.memories.remove(handle);
    ndhandle::free::<vkcpu_core::memory::DeviceMemory>(memory);
}

/// §3 "Open Questions": maps are always whole-allocation and coherent, so
/// this takes no offset/size/flags the way `vkMapMemory` otherwise would.
///
/// # Safety
/// `device` must be a live `IcdDevice`; `memory` a live handle on it.
#[no_mangle]
pub unsafe extern "C" fn vk_map_memory(device: *mut IcdDevice, memory: u64) -> *mut u8 {
    if !is_valid_dispatchable(device) {
        return std::ptr::null_mut();
    }
    let handle = ndhandle::from_u64(memory);
    match (*device).inner.memories.get_mut(handle) {
        Some(mem) => mem.map(),
        None => std::ptr::null_mut(),
    }
}

/// # Safety
/// `device` must be a live `IcdDevice`.
#[no_mangle]
pub unsafe extern "C" fn vk_create_buffer(device: *mut IcdDevice, size: u64, usage_bits: u32) -> u64 {
    if !is_valid_dispatchable(device) {
        return 0;
    }
    let usage = BufferUsageFlags::from_bits_truncate(usage_bits);
    let handle = (*device).inner.buffers.insert(Buffer::new(size, usage));
    ndhandle::to_u64(handle)
}

/// # Safety
/// `device` must be a live `IcdDevice`; `buffer` a live handle on it.
#[no_mangle]
pub unsafe extern "C" fn vk_destroy_buffer(device: *mut IcdDevice, buffer: u64) {
    if buffer == 0 || !is_valid_dispatchable(device) {
        return;
    }
    let handle = ndhandle::from_u64(buffer);
    (*device).inner.buffers.remove(handle);
    ndhandle::free::<Buffer>(buffer);
}

/// # Safety
/// `device` must be a live `IcdDevice`; `buffer` and `memory` live handles
/// on it.
#[no_mangle]
pub unsafe extern "C" fn vk_bind_buffer_memory(device: *mut IcdDevice, buffer: u64, memory: u64, offset: u64) -> c_int {
    if !is_valid_dispatchable(device) {
        return VkResult::ErrorInitializationFailed as c_int;
    }
    let buffer = ndhandle::from_u64(buffer);
    let memory = ndhandle::from_u64(memory);
    match (*device).inner.bind_buffer_memory(buffer, memory, offset) {
        Ok(()) => VkResult::Success as c_int,
        Err(e) => VkResult::from(e) as c_int,
    }
}

#[repr(u32)]
#[derive(Copy, Clone)]
pub enum VkImageType {
    Type1D = 0,
    Type2D = 1,
    Type3D = 2,
}

#[repr(u32)]
#[derive(Copy, Clone)]
pub enum VkImageTiling {
    Optimal = 0,
    Linear = 1,
}

#[repr(C)]
pub struct VkImageCreateInfo {
    pub image_type: VkImageType,
    pub format: crate::format_map::VkFormat,
    pub extent: crate::ffi_types::VkExtent3D,
    pub mip_levels: u32,
    pub array_layers: u32,
    pub samples: u32,
    pub tiling: VkImageTiling,
    pub usage_bits: u32,
}

/// # Safety
/// `device` must be a live `IcdDevice`; `info` a valid pointer to a
/// `VkImageCreateInfo`.
#[no_mangle]
pub unsafe extern "C" fn vk_create_image(device: *mut IcdDevice, info: *const VkImageCreateInfo) -> u64 {
    if !is_valid_dispatchable(device) || info.is_null() {
        return 0;
    }
    let info = &*info;
    let Some(format) = crate::format_map::to_internal(info.format) else { return 0 };
    let image_type = match info.image_type {
        VkImageType::Type1D => ImageType::Type1D,
        VkImageType::Type2D => ImageType::Type2D,
        VkImageType::Type3D => ImageType::Type3D,
    };
    let tiling = match info.tiling {
        VkImageTiling::Optimal => ImageTiling::Optimal,
        VkImageTiling::Linear => ImageTiling::Linear,
    };
    let usage = ImageUsageFlags::from_bits_truncate(info.usage_bits);
    let extent = Extent3D { width: info.extent.width, height: info.extent.height, depth: info.extent.depth };
    let image = Image::new(image_type, format, extent, info.mip_levels, info.array_layers, info.samples, tiling, usage);
    let handle = (*device).inner.images.insert(image);
    ndhandle::to_u64(handle)
}

/// # Safety
/// `device` must be a live `IcdDevice`; `image` a live handle on it.
#[no_mangle]
pub unsafe extern "C" fn vk_destroy_image(device: *mut IcdDevice, image: u64) {
    if image == 0 || !is_valid_dispatchable(device) {
        return;
    }
    let handle = ndhandle::from_u64(image);
    (*device).inner.images.remove(handle);
    ndhandle::free::<Image>(image);
}

/// # Safety
/// `device` must be a live `IcdDevice`; `image` and `memory` live handles.
#[no_mangle]
pub unsafe extern "C" fn vk_bind_image_memory(device: *mut IcdDevice, image: u64, memory: u64, offset: u64) -> c_int {
    if !is_valid_dispatchable(device) {
        return VkResult::ErrorInitializationFailed as c_int;
    }
    let image = ndhandle::from_u64(image);
    let memory = ndhandle::from_u64(memory);
    match (*device).inner.bind_image_memory(image, memory, offset) {
        Ok(()) => VkResult::Success as c_int,
        Err(e) => VkResult::from(e) as c_int,
    }
}

#[repr(u32)]
#[derive(Copy, Clone)]
pub enum VkImageViewType {
    Type1D = 0,
    Type2D = 1,
    Type3D = 2,
    Cube = 3,
    Array1D = 4,
    Array2D = 5,
    CubeArray = 6,
}

#[repr(C)]
pub struct VkImageViewCreateInfo {
    pub image: u64,
    pub view_type: VkImageViewType,
    pub format: crate::format_map::VkFormat,
    pub base_mip_level: u32,
    pub level_count: u32,
    pub base_array_layer: u32,
    pub layer_count: u32,
}

/// # Safety
/// `device` must be a live `IcdDevice`; `info` a valid pointer; `info.image`
/// a live image handle on `device`.
#[no_mangle]
pub unsafe extern "C" fn vk_create_image_view(device: *mut IcdDevice, info: *const VkImageViewCreateInfo) -> u64 {
    if !is_valid_dispatchable(device) || info.is_null() {
        return 0;
    }
    let info = &*info;
    let Some(format) = crate::format_map::to_internal(info.format) else { return 0 };
    let image = ndhandle::from_u64(info.image);
    let view_type = match info.view_type {
        VkImageViewType::Type1D => ImageViewType::Type1D,
        VkImageViewType::Type2D => ImageViewType::Type2D,
        VkImageViewType::Type3D => ImageViewType::Type3D,
        VkImageViewType::Cube => ImageViewType::Cube,
        VkImageViewType::Array1D => ImageViewType::Array1D,
        VkImageViewType::Array2D => ImageViewType::Array2D,
        VkImageViewType::CubeArray => ImageViewType::CubeArray,
    };
    let subresource_range = vkcpu_core::resource::ImageSubresourceRange {
        base_mip_level: info.base_mip_level,
        level_count: info.level_count,
        base_array_layer: info.base_array_layer,
        layer_count: info.layer_count,
    };
    let handle = (*device).inner.image_views.insert(ImageView { image, view_type, format, subresource_range });
    ndhandle::to_u64(handle)
}

/// # Safety
/// `device` must be a live `IcdDevice`; `view` a live handle on it.
#[no_mangle]
pub unsafe extern "C" fn vk_destroy_image_view(device: *mut IcdDevice, view: u64) {
    if view == 0 || !is_valid_dispatchable(device) {
        return;
    }
    let handle = ndhandle::from_u64(view);
    (*device).inner.image_views.remove(handle);
    ndhandle::free::<ImageView>(view);
}

/// Reduced to the sampler state `vkcpu_format::runtime`'s sample kernel
/// reads (§4.2): bilinear-or-nearest per axis, clamp-to-edge addressing.
/// Anisotropy, LOD bias, and border color are not modelled (design
/// ledger) — every caller gets `SamplerDescriptor::default()`.
///
/// # Safety
/// `device` must be a live `IcdDevice`.
#[no_mangle]
pub unsafe extern "C" fn vk_create_sampler(device: *mut IcdDevice) -> u64 {
    if !is_valid_dispatchable(device) {
        return 0;
    }
    let handle = (*device).inner.samplers.insert(Sampler::new(SamplerDescriptor::default()));
    ndhandle::to_u64(handle)
}

/// # Safety
/// `device` must be a live `IcdDevice`; `sampler` a live handle on it.
#[no_mangle]
pub unsafe extern "C" fn vk_destroy_sampler(device: *mut IcdDevice, sampler: u64) {
    if sampler == 0 || !is_valid_dispatchable(device) {
        return;
    }
    let handle = ndhandle::from_u64(sampler);
    (*device).inner.samplers.remove(handle);
    ndhandle::free::<Sampler>(sampler);
}

/// # Safety
/// `device` must be a live `IcdDevice`; `code` must point to `len` valid
/// bytes of a SPIR-V module.
#[no_mangle]
pub unsafe extern "C" fn vk_create_shader_module(device: *mut IcdDevice, code: *const u8, len: usize) -> u64 {
    if !is_valid_dispatchable(device) || code.is_null() {
        return 0;
    }
    let bytes = std::slice::from_raw_parts(code, len);
    match (*device).inner.create_shader_module(bytes) {
        Ok(handle) => ndhandle::to_u64(handle),
        Err(e) => {
            warn!("vkCreateShaderModule failed: {}", e);
            0
        }
    }
}

/// # Safety
/// `device` must be a live `IcdDevice`; `module` a live handle on it.
#[no_mangle]
pub unsafe extern "C" fn vk_destroy_shader_module(device: *mut IcdDevice, module: u64) {
    if module == 0 || !is_valid_dispatchable(device) {
        return;
    }
    let handle = ndhandle::from_u64(module);
    (*device).inner.shader_modules.remove(handle);
    ndhandle::free::<vkcpu_core::resource::ShaderModule>(module);
}
