//! FFI-facing `VkFormat` codes. `vkcpu_format::Format`'s own doc comment
//! says its discriminants are "free to be whatever is convenient" because
//! it is never serialised across the ICD boundary — this module is that
//! boundary, so it uses the real `VkFormat` numeric values instead and maps
//! them onto the subset `vkcpu_format::Format` actually implements.
use vkcpu_format::Format;

#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(non_camel_case_types)]
pub enum VkFormat {
    UNDEFINED = 0,
    R8_UNORM = 9,
    R8_SNORM = 10,
    R8_UINT = 13,
    R8_SINT = 14,
    R8_SRGB = 15,
    R8G8_UNORM = 16,
    R8G8_SNORM = 17,
    R8G8_UINT = 20,
    R8G8_SINT = 21,
    R8G8B8_UNORM = 23,
    R8G8B8_SRGB = 29,
    R8G8B8A8_UNORM = 37,
    R8G8B8A8_SNORM = 38,
    R8G8B8A8_UINT = 41,
    R8G8B8A8_SINT = 42,
    R8G8B8A8_SRGB = 43,
    B8G8R8A8_UNORM = 44,
    B8G8R8A8_SRGB = 50,
    A8B8G8R8_UNORM_PACK32 = 51,
    R16_UNORM = 70,
    R16_SNORM = 71,
    R16_UINT = 74,
    R16_SINT = 75,
    R16_SFLOAT = 76,
    R16G16_SFLOAT = 83,
    R16G16B16A16_UNORM = 91,
    R16G16B16A16_SFLOAT = 97,
    R32_UINT = 98,
    R32_SINT = 99,
    R32_SFLOAT = 100,
    R32G32_SFLOAT = 103,
    R32G32B32_SFLOAT = 106,
    R32G32B32A32_UINT = 107,
    R32G32B32A32_SFLOAT = 109,
    B10G11R11_UFLOAT_PACK32 = 122,
    D16_UNORM = 124,
    D32_SFLOAT = 126,
    D24_UNORM_S8_UINT = 129,
    S8_UINT = 127,
    G8_B8_R8_3PLANE_420_UNORM = 139,
}

/// Returns `None` for `UNDEFINED` and any code outside the subset this
/// driver implements, matching `VK_FORMAT_UNDEFINED` never denoting a usable
/// image or buffer format.
pub fn to_internal(fmt: VkFormat) -> Option<Format> {
    use VkFormat::*;
    Some(match fmt {
        UNDEFINED => return None,
        R8_UNORM => Format::R8_UNORM,
        R8_SNORM => Format::R8_SNORM,
        R8_UINT => Format::R8_UINT,
        R8_SINT => Format::R8_SINT,
        R8_SRGB => Format::R8_SRGB,
        R8G8_UNORM => Format::R8G8_UNORM,
        R8G8_SNORM => Format::R8G8_SNORM,
        R8G8_UINT => Format::R8G8_UINT,
        R8G8_SINT => Format::R8G8_SINT,
        R8G8B8_UNORM => Format::R8G8B8_UNORM,
        R8G8B8_SRGB => Format::R8G8B8_SRGB,
        R8G8B8A8_UNORM => Format::R8G8B8A8_UNORM,
        R8G8B8A8_SNORM => Format::R8G8B8A8_SNORM,
        R8G8B8A8_UINT => Format::R8G8B8A8_UINT,
        R8G8B8A8_SINT => Format::R8G8B8A8_SINT,
        R8G8B8A8_SRGB => Format::R8G8B8A8_SRGB,
        B8G8R8A8_UNORM => Format::B8G8R8A8_UNORM,
        B8G8R8A8_SRGB => Format::B8G8R8A8_SRGB,
        A8B8G8R8_UNORM_PACK32 => Format::A8B8G8R8_UNORM_PACK32,
        R16_UNORM => Format::R16_UNORM,
        R16_SNORM => Format::R16_SNORM,
        R16_UINT => Format::R16_UINT,
        R16_SINT => Format::R16_SINT,
        R16_SFLOAT => Format::R16_SFLOAT,
        R16G16_SFLOAT => Format::R16G16_SFLOAT,
        R16G16B16A16_UNORM => Format::R16G16B16A16_UNORM,
        R16G16B16A16_SFLOAT => Format::R16G16B16A16_SFLOAT,
        R32_UINT => Format::R32_UINT,
        R32_SINT => Format::R32_SINT,
        R32_SFLOAT => Format::R32_SFLOAT,
        R32G32_SFLOAT => Format::R32G32_SFLOAT,
        R32G32B32_SFLOAT => Format::R32G32B32_SFLOAT,
        R32G32B32A32_UINT => Format::R32G32B32A32_UINT,
        R32G32B32A32_SFLOAT => Format::R32G32B32A32_SFLOAT,
        B10G11R11_UFLOAT_PACK32 => Format::B10G11R11_UFLOAT_PACK32,
        D16_UNORM => Format::D16_UNORM,
        D32_SFLOAT => Format::D32_SFLOAT,
        D24_UNORM_S8_UINT => Format::D24_UNORM_S8_UINT,
        S8_UINT => Format::S8_UINT,
        G8_B8_R8_3PLANE_420_UNORM => Format::G8_B8_R8_3PLANE_420_UNORM,
    })
}

/// The inverse of [`to_internal`], used when reporting format properties
/// back to the caller (`vkGetPhysicalDeviceFormatProperties`).
pub fn from_internal(fmt: Format) -> VkFormat {
    match fmt {
        Format::R8_UNORM => VkFormat::R8_UNORM,
        Format::R8_SNORM => VkFormat::R8_SNORM,
        Format::R8_UINT => VkFormat::R8_UINT,
        Format::R8_SINT => VkFormat::R8_SINT,
        Format::R8_SRGB => VkFormat::R8_SRGB,
        Format::R8G8_UNORM => VkFormat::R8G8_UNORM,
        Format::R8G8_SNORM => VkFormat::R8G8_SNORM,
        Format::R8G8_UINT => VkFormat::R8G8_UINT,
        Format::R8G8_SINT => VkFormat::R8G8_SINT,
        Format::R8G8B8_UNORM => VkFormat::R8G8B8_UNORM,
        Format::R8G8B8_SRGB => VkFormat::R8G8B8_SRGB,
        Format::R8G8B8A8_UNORM => VkFormat::R8G8B8A8_UNORM,
        Format::R8G8B8A8_SNORM => VkFormat::R8G8B8A8_SNORM,
        Format::R8G8B8A8_UINT => VkFormat::R8G8B8A8_UINT,
        Format::R8G8B8A8_SINT => VkFormat::R8G8B8A8_SINT,
        Format::R8G8B8A8_SRGB => VkFormat::R8G8B8A8_SRGB,
        Format::B8G8R8A8_UNORM => VkFormat::B8G8R8A8_UNORM,
        Format::B8G8R8A8_SRGB => VkFormat::B8G8R8A8_SRGB,
        Format::A8B8G8R8_UNORM_PACK32 => VkFormat::A8B8G8R8_UNORM_PACK32,
        Format::R16_UNORM => VkFormat::R16_UNORM,
        Format::R16_SNORM => VkFormat::R16_SNORM,
        Format::R16_UINT => VkFormat::R16_UINT,
        Format::R16_SINT => VkFormat::R16_SINT,
        Format::R16_SFLOAT => VkFormat::R16_SFLOAT,
        Format::R16G16_SFLOAT => VkFormat::R16G16_SFLOAT,
        Format::R16G16B16A16_UNORM => VkFormat::R16G16B16A16_UNORM,
        Format::R16G16B16A16_SFLOAT => VkFormat::R16G16B16A16_SFLOAT,
        Format::R32_UINT => VkFormat::R32_UINT,
        Format::R32_SINT => VkFormat::R32_SINT,
        Format::R32_SFLOAT => VkFormat::R32_SFLOAT,
        Format::R32G32_SFLOAT => VkFormat::R32G32_SFLOAT,
        Format::R32G32B32_SFLOAT => VkFormat::R32G32B32_SFLOAT,
        Format::R32G32B32A32_UINT => VkFormat::R32G32B32A32_UINT,
        Format::R32G32B32A32_SFLOAT => VkFormat::R32G32B32A32_SFLOAT,
        Format::B10G11R11_UFLOAT_PACK32 => VkFormat::B10G11R11_UFLOAT_PACK32,
        Format::D16_UNORM => VkFormat::D16_UNORM,
        Format::D32_SFLOAT => VkFormat::D32_SFLOAT,
        Format::D24_UNORM_S8_UINT => VkFormat::D24_UNORM_S8_UINT,
        Format::S8_UINT => VkFormat::S8_UINT,
        Format::G8_B8_R8_3PLANE_420_UNORM => VkFormat::G8_B8_R8_3PLANE_420_UNORM,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn undefined_has_no_internal_counterpart() {
        assert!(to_internal(VkFormat::UNDEFINED).is_none());
    }

    #[test]
    fn bgra8_unorm_roundtrips() {
        let internal = to_internal(VkFormat::B8G8R8A8_UNORM).unwrap();
        assert_eq!(from_internal(internal), VkFormat::B8G8R8A8_UNORM);
    }
}
