//! Dispatchable object kinds (§9 "one sum type per dispatchable kind"):
//! `Instance`, `PhysicalDevice`, `Device`, `Queue`, and `CommandBuffer` are
//! the handles a caller reaches another `vk*` call's method table through,
//! as opposed to the non-dispatchable handles in `crate::ndhandle` which are
//! only ever passed as an argument to some other object's call.
//!
//! Each kind is a plain Rust struct allocated through
//! [`crate::header::alloc_dispatchable`]; there is no shared base-class
//! vtable (§9's design note), just one struct shape per kind and a
//! `vkGet*ProcAddr` lookup keyed on the method name instead of a virtual
//! call.
use crate::header::{alloc_dispatchable, free_dispatchable};

pub struct IcdInstance {
    pub inner: vkcpu_core::Instance,
}

/// Owns no state of its own: `vkEnumeratePhysicalDevices` always reports
/// exactly the one physical device living on `instance.inner.physical_device`
/// (§2 "exactly one `PhysicalDevice` per `Instance`").
pub struct IcdPhysicalDevice {
    pub instance: *mut IcdInstance,
}

pub struct IcdDevice {
    pub inner: vkcpu_core::Device,
    /// Lazily created by the first `vkGetDeviceQueue` call and freed by
    /// `vkDestroyDevice` — Vulkan queues have no separate destroy entry
    /// point of their own, they're owned by the device that vends them.
    pub queue: std::cell::Cell<*mut IcdQueue>,
}

/// One queue per device (§2); `device` points back at the owning
/// dispatchable `IcdDevice` so `vkQueueSubmit`/`vkQueuePresentKHR` can reach
/// its resource arenas.
pub struct IcdQueue {
    pub device: *mut IcdDevice,
}

pub struct IcdCommandBuffer {
    pub device: *mut IcdDevice,
    pub handle: vkcpu_core::Handle<vkcpu_core::command::CommandBuffer>,
}

impl IcdInstance {
    pub fn create() -> *mut IcdInstance {
        alloc_dispatchable(IcdInstance { inner: vkcpu_core::Instance::create() })
    }

    /// # Safety
    /// `ptr` must have come from `IcdInstance::create` and not yet been
    /// destroyed.
    pub unsafe fn destroy(ptr: *mut IcdInstance) {
        free_dispatchable(ptr)
    }
}

impl IcdPhysicalDevice {
    pub fn create(instance: *mut IcdInstance) -> *mut IcdPhysicalDevice {
        alloc_dispatchable(IcdPhysicalDevice { instance })
    }

    /// # Safety
    /// `self` must be a live `IcdPhysicalDevice`; `self.instance` must be a
    /// live `IcdInstance`.
    pub unsafe fn physical_device(&self) -> &vkcpu_core::device::PhysicalDevice {
        &(*self.instance).inner.physical_device
    }
}

impl IcdDevice {
    pub fn create(physical_device: &vkcpu_core::device::PhysicalDevice) -> *mut IcdDevice {
        alloc_dispatchable(IcdDevice { inner: vkcpu_core::Device::create(physical_device) })
    }

    /// # Safety
    /// `ptr` must have come from `IcdDevice::create` and not yet been
    /// destroyed.
    pub unsafe fn destroy(ptr: *mut IcdDevice) {
        free_dispatchable(ptr)
    }
}

impl IcdQueue {
    pub fn create(device: *mut IcdDevice) -> *mut IcdQueue {
        alloc_dispatchable(IcdQueue { device })
    }
}

impl IcdCommandBuffer {
    pub fn create(device: *mut IcdDevice, handle: vkcpu_core::Handle<vkcpu_core::command::CommandBuffer>) -> *mut IcdCommandBuffer {
        alloc_dispatchable(IcdCommandBuffer { device, handle })
    }

    /// # Safety
    /// `ptr` must have come from `IcdCommandBuffer::create` and not yet been
    /// destroyed (the command pool that owns the underlying handle frees the
    /// handle itself; this only releases the dispatchable wrapper).
    pub unsafe fn destroy(ptr: *mut IcdCommandBuffer) {
        free_dispatchable(ptr)
    }
}
