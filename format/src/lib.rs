//! Declarative per-format metadata and the pixel codec built on top of it.
//!
//! This is the format engine named in the overview: every texel layout the
//! ICD has to understand is data, not code, so adding a format is adding a
//! table row rather than a new code path. The codec itself stays generic
//! here; the hot per-format specialisation happens where the JIT registers
//! runtime intrinsics (`vkcpu-jit`), per the "not a generic switch" design
//! note — this crate is the reference implementation those specialised
//! kernels are checked against.
#[macro_use]
extern crate log;

pub mod codec;
pub mod float;
pub mod runtime;
mod table;

use bitflags::bitflags;

/// Mirrors `VkFormat`'s channel encoding, not its numeric values: this is a
/// driver-internal enum, never serialised across the ICD boundary, so its
/// discriminants are free to be whatever is convenient here.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
#[allow(non_camel_case_types)]
pub enum Format {
    R8_UNORM,
    R8_SNORM,
    R8_UINT,
    R8_SINT,
    R8_SRGB,
    R8G8_UNORM,
    R8G8_SNORM,
    R8G8_UINT,
    R8G8_SINT,
    R8G8B8_UNORM,
    R8G8B8_SRGB,
    R8G8B8A8_UNORM,
    R8G8B8A8_SNORM,
    R8G8B8A8_UINT,
    R8G8B8A8_SINT,
    R8G8B8A8_SRGB,
    B8G8R8A8_UNORM,
    B8G8R8A8_SRGB,
    A8B8G8R8_UNORM_PACK32,
    R16_UNORM,
    R16_SNORM,
    R16_UINT,
    R16_SINT,
    R16_SFLOAT,
    R16G16_SFLOAT,
    R16G16B16A16_UNORM,
    R16G16B16A16_SFLOAT,
    R32_UINT,
    R32_SINT,
    R32_SFLOAT,
    R32G32_SFLOAT,
    R32G32B32_SFLOAT,
    R32G32B32A32_UINT,
    R32G32B32A32_SFLOAT,
    B10G11R11_UFLOAT_PACK32,
    D16_UNORM,
    D32_SFLOAT,
    D24_UNORM_S8_UINT,
    S8_UINT,
    G8_B8_R8_3PLANE_420_UNORM,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum BaseType {
    Unknown,
    UNorm,
    SNorm,
    UScaled,
    SScaled,
    UInt,
    SInt,
    UFloat,
    SFloat,
    Srgb,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum FormatCategory {
    Normal,
    Compressed,
    Planar,
    PlanarSamplable,
}

bitflags! {
    /// One bit per `VkFormatFeatureFlagBits` the core cares about. Kept as
    /// a bitflags type (teacher: `bitflags` is a root dependency of every
    /// generation of the workspace) rather than a `Vec<Feature>` so feature
    /// tests are a single `contains` check on the hot path.
    pub struct FormatFeatureFlags: u32 {
        const SAMPLED_IMAGE              = 1 << 0;
        const STORAGE_IMAGE               = 1 << 1;
        const COLOR_ATTACHMENT            = 1 << 2;
        const COLOR_ATTACHMENT_BLEND      = 1 << 3;
        const DEPTH_STENCIL_ATTACHMENT    = 1 << 4;
        const BLIT_SRC                    = 1 << 5;
        const BLIT_DST                    = 1 << 6;
        const TRANSFER_SRC                = 1 << 7;
        const TRANSFER_DST                = 1 << 8;
        const VERTEX_BUFFER               = 1 << 9;
        const UNIFORM_TEXEL_BUFFER        = 1 << 10;
        const STORAGE_TEXEL_BUFFER        = 1 << 11;
        const SAMPLED_IMAGE_FILTER_LINEAR = 1 << 12;
        const COSITED_CHROMA_SAMPLES      = 1 << 13;
        const MIDPOINT_CHROMA_SAMPLES     = 1 << 14;
    }
}

/// A channel's bit offset and width within the texel's `element_size`
/// container. `bits == 0` means the channel is absent (e.g. no alpha).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Default)]
pub struct ChannelLayout {
    pub offset: u32,
    pub bits: u32,
}

impl ChannelLayout {
    pub const NONE: ChannelLayout = ChannelLayout { offset: 0, bits: 0 };

    pub fn present(&self) -> bool {
        self.bits != 0
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Default)]
pub struct Channels {
    pub red: ChannelLayout,
    pub green: ChannelLayout,
    pub blue: ChannelLayout,
    pub alpha: ChannelLayout,
}

/// A fully-resolved format descriptor, the per-format row of the Format
/// Descriptor Table (§4.1 "C1").
#[derive(Clone, Debug)]
pub struct FormatInfo {
    pub format: Format,
    pub category: FormatCategory,
    /// Bytes per texel (or per compressed block).
    pub total_size: u32,
    /// Bytes in the integer container a channel sits in; for packed
    /// formats this equals `total_size` since all channels share one word.
    pub element_size: u32,
    pub base_type: BaseType,
    pub channels: Channels,
    pub linear_tiling_features: FormatFeatureFlags,
    pub optimal_tiling_features: FormatFeatureFlags,
    pub buffer_features: FormatFeatureFlags,
}

impl FormatInfo {
    pub fn channel_count(&self) -> u32 {
        [self.channels.red, self.channels.green, self.channels.blue, self.channels.alpha]
            .iter()
            .filter(|c| c.present())
            .count() as u32
    }

    pub fn is_packed(&self) -> bool {
        self.element_size == self.total_size && self.channel_count() > 1
    }
}

/// Returns the populated descriptor for `format`.
///
/// Per the component contract, every format in the enum's range resolves to
/// an entry here (planar formats included — `needs_ycbcr` is what tells the
/// caller it must route through planar-aware paths instead of this one).
pub fn describe(format: Format) -> &'static FormatInfo {
    table::lookup(format)
}

pub fn needs_ycbcr(format: Format) -> bool {
    matches!(
        describe(format).category,
        FormatCategory::Planar | FormatCategory::PlanarSamplable
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_format_resolves() {
        let all = [
            Format::R8_UNORM,
            Format::R8G8B8A8_UNORM,
            Format::B8G8R8A8_UNORM,
            Format::R32G32B32A32_SFLOAT,
            Format::D32_SFLOAT,
            Format::G8_B8_R8_3PLANE_420_UNORM,
        ];
        for f in all {
            let info = describe(f);
            assert_eq!(info.format, f);
        }
    }

    #[test]
    fn planar_format_needs_ycbcr() {
        assert!(needs_ycbcr(Format::G8_B8_R8_3PLANE_420_UNORM));
        assert!(!needs_ycbcr(Format::R8G8B8A8_UNORM));
    }

    #[test]
    fn normal_formats_expose_full_feature_set() {
        let info = describe(Format::R8G8B8A8_UNORM);
        assert!(info.optimal_tiling_features.contains(FormatFeatureFlags::COLOR_ATTACHMENT_BLEND));
        assert!(info.optimal_tiling_features.contains(FormatFeatureFlags::SAMPLED_IMAGE_FILTER_LINEAR));
    }

    #[test]
    fn planar_formats_expose_only_ycbcr_features() {
        let info = describe(Format::G8_B8_R8_3PLANE_420_UNORM);
        assert!(!info.optimal_tiling_features.contains(FormatFeatureFlags::COLOR_ATTACHMENT));
        assert!(info.optimal_tiling_features.contains(FormatFeatureFlags::SAMPLED_IMAGE));
    }
}
