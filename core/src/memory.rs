//! Device memory (§3, C12): a single host allocation backing one or more
//! bound resources, addressed with a raw 16-byte-aligned block the way the
//! ICD's own dispatchable-object header is aligned (§6) — not because
//! anything here reads that header, but so a buffer or image bound at any
//! sub-offset never straddles an alignment boundary a SIMD-friendly codec
//! kernel might assume.
use std::alloc::{alloc_zeroed, dealloc, Layout};
use std::ptr::NonNull;

const ALIGN: usize = 16;

pub struct DeviceMemory {
    ptr: NonNull<u8>,
    layout: Layout,
}

// The backing allocation is plain bytes; `vkcpu-core` alone decides which
// threads may touch which ranges, exactly like `vkcpu-raster`'s `RacyPtr`
// assumes disjoint partitions rather than the type system proving it.
unsafe impl Send for DeviceMemory {}
unsafe impl Sync for DeviceMemory {}

impl DeviceMemory {
    pub fn allocate(size: u64) -> crate::error::Result<DeviceMemory> {
        let size = (size as usize).max(1);
        let layout = Layout::from_size_align(size, ALIGN).map_err(|_| crate::error::Error::OutOfDeviceMemory)?;
        let ptr = unsafe { alloc_zeroed(layout) };
        let ptr = NonNull::new(ptr).ok_or(crate::error::Error::OutOfDeviceMemory)?;
        Ok(DeviceMemory { ptr, layout })
    }

    pub fn size(&self) -> u64 {
        self.layout.size() as u64
    }

    /// Maps are always whole-allocation and coherent by construction (§3
    /// "Open Questions": host and device never disagree about memory
    /// contents on a CPU backend) — there is no separate flush/invalidate
    /// step to model.
    pub fn map(&mut self) -> *mut u8 {
        self.ptr.as_ptr()
    }

    pub fn as_slice(&self) -> &[u8] {
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.layout.size()) }
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.layout.size()) }
    }
}

impl Drop for DeviceMemory {
    fn drop(&mut self) {
        unsafe { dealloc(self.ptr.as_ptr(), self.layout) };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_allocation_is_zeroed_and_sized_correctly() {
        let mut mem = DeviceMemory::allocate(256).unwrap();
        assert_eq!(mem.size(), 256);
        assert!(mem.as_mut_slice().iter().all(|&b| b == 0));
    }
}
