//! Non-dispatchable handle marshalling. Vulkan non-dispatchable handles
//! (`VkBuffer`, `VkImage`, `VkSampler`, ...) are opaque 64-bit integers that
//! are only ever passed as an *argument* to some other object's call, never
//! looked up through a `vkGet*ProcAddr` table the way dispatchable handles
//! are (`crate::dispatch`) — so they don't need the 16-byte header trick.
//!
//! `vkcpu_core::Handle<T>`'s `index`/`generation` fields are `pub(crate)` to
//! that crate, so this side of the FFI boundary can't bit-pack them directly.
//! Instead each `Handle<T>` is boxed once and its heap address is the `u64`
//! that crosses the boundary; `from_u64`/`free` unbox it back.
use vkcpu_core::Handle;

pub fn to_u64<T>(handle: Handle<T>) -> u64 {
    Box::into_raw(Box::new(handle)) as u64
}

/// # Safety
/// `raw` must have come from `to_u64::<T>` and not yet been passed to `free`.
pub unsafe fn from_u64<T>(raw: u64) -> Handle<T> {
    *(raw as *const Handle<T>)
}

/// # Safety
/// `raw` must have come from `to_u64::<T>` and not yet been freed.
pub unsafe fn free<T>(raw: u64) {
    if raw == 0 {
        return;
    }
    drop(Box::from_raw(raw as *mut Handle<T>));
}

#[cfg(test)]
mod tests {
    use super::*;
    use vkcpu_core::Arena;

    #[test]
    fn handle_survives_a_roundtrip_through_u64() {
        let mut arena: Arena<u32> = Arena::default();
        let handle = arena.insert(7);
        let raw = to_u64(handle);
        assert_ne!(raw, 0);
        let back = unsafe { from_u64::<u32>(raw) };
        assert_eq!(arena.get(back), Some(&7));
        unsafe { free::<u32>(raw) };
    }
}
