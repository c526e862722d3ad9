//! `VkResult` (§7): the FFI-facing status code every `vk*` trampoline
//! returns, mapped from `vkcpu_core::error::Error` plus the success-family
//! codes (`NotReady`, `Timeout`, `EventSet`, `EventReset`, `Incomplete`) that
//! aren't errors at all but still aren't plain `Success`.
use vkcpu_core::error::Error as CoreError;

#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VkResult {
    Success = 0,
    NotReady = 1,
    Timeout = 2,
    EventSet = 3,
    EventReset = 4,
    Incomplete = 5,
    ErrorOutOfHostMemory = -1,
    ErrorOutOfDeviceMemory = -2,
    ErrorInitializationFailed = -3,
    ErrorDeviceLost = -4,
    ErrorExtensionNotPresent = -7,
    ErrorFeatureNotPresent = -8,
}

impl From<CoreError> for VkResult {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::OutOfHostMemory => VkResult::ErrorOutOfHostMemory,
            CoreError::OutOfDeviceMemory => VkResult::ErrorOutOfDeviceMemory,
            CoreError::InitializationFailed => VkResult::ErrorInitializationFailed,
            CoreError::ExtensionNotPresent(_) => VkResult::ErrorExtensionNotPresent,
            CoreError::FeatureNotPresent(_) => VkResult::ErrorFeatureNotPresent,
            CoreError::DeviceLost => VkResult::ErrorDeviceLost,
            CoreError::Incomplete => VkResult::Incomplete,
        }
    }
}

/// Folds a `core::Result<T>` into a `(T, VkResult)` pair for trampolines
/// that need to write a value out-parameter on success and a code either way.
pub fn split<T>(result: Result<T, CoreError>) -> (Option<T>, VkResult) {
    match result {
        Ok(v) => (Some(v), VkResult::Success),
        Err(e) => (None, VkResult::from(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_lost_maps_to_its_own_negative_code() {
        assert_eq!(VkResult::from(CoreError::DeviceLost), VkResult::ErrorDeviceLost);
    }
}
