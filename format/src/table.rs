//! The Format Descriptor Table: one row per `Format`, built once by a pure
//! constructor per category and cached in a process-wide static map, the
//! way the teacher's `backend_gl::format` module built a `static` entry per
//! GL format — generalised here to a builder function instead of one
//! literal per entry, since the feature flags are a pure function of
//! category rather than something each format chooses independently.
use crate::{BaseType, ChannelLayout, Channels, Format, FormatCategory, FormatFeatureFlags, FormatInfo};
use lazy_static::lazy_static;
use std::collections::HashMap;

fn normal_features(filterable: bool) -> (FormatFeatureFlags, FormatFeatureFlags) {
    let mut optimal = FormatFeatureFlags::SAMPLED_IMAGE
        | FormatFeatureFlags::STORAGE_IMAGE
        | FormatFeatureFlags::COLOR_ATTACHMENT
        | FormatFeatureFlags::COLOR_ATTACHMENT_BLEND
        | FormatFeatureFlags::BLIT_SRC
        | FormatFeatureFlags::BLIT_DST
        | FormatFeatureFlags::TRANSFER_SRC
        | FormatFeatureFlags::TRANSFER_DST
        | FormatFeatureFlags::VERTEX_BUFFER
        | FormatFeatureFlags::UNIFORM_TEXEL_BUFFER
        | FormatFeatureFlags::STORAGE_TEXEL_BUFFER;
    if filterable {
        optimal |= FormatFeatureFlags::SAMPLED_IMAGE_FILTER_LINEAR;
    }
    // linear tiling drops storage-image and blend (no atomic/blend unit
    // guarantee on a plain linear layout in the reference API either).
    let linear = optimal & !(FormatFeatureFlags::STORAGE_IMAGE | FormatFeatureFlags::COLOR_ATTACHMENT_BLEND);
    (linear, optimal)
}

fn depth_stencil_features() -> (FormatFeatureFlags, FormatFeatureFlags) {
    let optimal = FormatFeatureFlags::DEPTH_STENCIL_ATTACHMENT
        | FormatFeatureFlags::SAMPLED_IMAGE
        | FormatFeatureFlags::BLIT_SRC
        | FormatFeatureFlags::BLIT_DST
        | FormatFeatureFlags::TRANSFER_SRC
        | FormatFeatureFlags::TRANSFER_DST;
    (FormatFeatureFlags::empty(), optimal)
}

fn planar_features() -> (FormatFeatureFlags, FormatFeatureFlags) {
    let optimal = FormatFeatureFlags::SAMPLED_IMAGE
        | FormatFeatureFlags::SAMPLED_IMAGE_FILTER_LINEAR
        | FormatFeatureFlags::TRANSFER_SRC
        | FormatFeatureFlags::TRANSFER_DST
        | FormatFeatureFlags::COSITED_CHROMA_SAMPLES
        | FormatFeatureFlags::MIDPOINT_CHROMA_SAMPLES;
    (FormatFeatureFlags::empty(), optimal)
}

fn color(
    format: Format,
    total_size: u32,
    element_size: u32,
    base_type: BaseType,
    channels: Channels,
    filterable: bool,
) -> FormatInfo {
    let (linear_tiling_features, optimal_tiling_features) = normal_features(filterable);
    FormatInfo {
        format,
        category: FormatCategory::Normal,
        total_size,
        element_size,
        base_type,
        channels,
        linear_tiling_features,
        optimal_tiling_features,
        buffer_features: FormatFeatureFlags::UNIFORM_TEXEL_BUFFER | FormatFeatureFlags::STORAGE_TEXEL_BUFFER,
    }
}

fn depth_stencil(format: Format, total_size: u32, element_size: u32, base_type: BaseType, channels: Channels) -> FormatInfo {
    let (linear_tiling_features, optimal_tiling_features) = depth_stencil_features();
    FormatInfo {
        format,
        category: FormatCategory::Normal,
        total_size,
        element_size,
        base_type,
        channels,
        linear_tiling_features,
        optimal_tiling_features,
        buffer_features: FormatFeatureFlags::empty(),
    }
}

fn planar(format: Format, total_size: u32) -> FormatInfo {
    let (linear_tiling_features, optimal_tiling_features) = planar_features();
    FormatInfo {
        format,
        category: FormatCategory::PlanarSamplable,
        total_size,
        element_size: 1,
        base_type: BaseType::UNorm,
        channels: Channels::default(),
        linear_tiling_features,
        optimal_tiling_features,
        buffer_features: FormatFeatureFlags::empty(),
    }
}

fn ch(offset: u32, bits: u32) -> ChannelLayout {
    ChannelLayout { offset, bits }
}

fn rgba(r: u32, g: u32, b: u32, a: u32, bits: u32) -> Channels {
    Channels {
        red: ch(r, bits),
        green: ch(g, bits),
        blue: ch(b, bits),
        alpha: if a == u32::MAX { ChannelLayout::NONE } else { ch(a, bits) },
    }
}

lazy_static! {
    static ref TABLE: HashMap<Format, FormatInfo> = build_table();
}

fn build_table() -> HashMap<Format, FormatInfo> {
    use Format::*;
    let mut m = HashMap::default();
    let mut add = |info: FormatInfo| {
        m.insert(info.format, info);
    };

    add(color(R8_UNORM, 1, 1, BaseType::UNorm, rgba(0, u32::MAX, u32::MAX, u32::MAX, 8), true));
    add(color(R8_SNORM, 1, 1, BaseType::SNorm, rgba(0, u32::MAX, u32::MAX, u32::MAX, 8), true));
    add(color(R8_UINT, 1, 1, BaseType::UInt, rgba(0, u32::MAX, u32::MAX, u32::MAX, 8), false));
    add(color(R8_SINT, 1, 1, BaseType::SInt, rgba(0, u32::MAX, u32::MAX, u32::MAX, 8), false));
    add(color(R8_SRGB, 1, 1, BaseType::Srgb, rgba(0, u32::MAX, u32::MAX, u32::MAX, 8), true));

    add(color(R8G8_UNORM, 2, 1, BaseType::UNorm, rgba(0, 1, u32::MAX, u32::MAX, 8), true));
    add(color(R8G8_SNORM, 2, 1, BaseType::SNorm, rgba(0, 1, u32::MAX, u32::MAX, 8), true));
    add(color(R8G8_UINT, 2, 1, BaseType::UInt, rgba(0, 1, u32::MAX, u32::MAX, 8), false));
    add(color(R8G8_SINT, 2, 1, BaseType::SInt, rgba(0, 1, u32::MAX, u32::MAX, 8), false));

    add(color(R8G8B8_UNORM, 3, 1, BaseType::UNorm, rgba(0, 1, 2, u32::MAX, 8), true));
    add(color(R8G8B8_SRGB, 3, 1, BaseType::Srgb, rgba(0, 1, 2, u32::MAX, 8), true));

    add(color(R8G8B8A8_UNORM, 4, 1, BaseType::UNorm, rgba(0, 1, 2, 3, 8), true));
    add(color(R8G8B8A8_SNORM, 4, 1, BaseType::SNorm, rgba(0, 1, 2, 3, 8), true));
    add(color(R8G8B8A8_UINT, 4, 1, BaseType::UInt, rgba(0, 1, 2, 3, 8), false));
    add(color(R8G8B8A8_SINT, 4, 1, BaseType::SInt, rgba(0, 1, 2, 3, 8), false));
    add(color(R8G8B8A8_SRGB, 4, 1, BaseType::Srgb, rgba(0, 1, 2, 3, 8), true));

    add(color(B8G8R8A8_UNORM, 4, 1, BaseType::UNorm, rgba(2, 1, 0, 3, 8), true));
    add(color(B8G8R8A8_SRGB, 4, 1, BaseType::Srgb, rgba(2, 1, 0, 3, 8), true));

    add(color(
        A8B8G8R8_UNORM_PACK32,
        4,
        4,
        BaseType::UNorm,
        Channels {
            red: ch(0, 8),
            green: ch(8, 8),
            blue: ch(16, 8),
            alpha: ch(24, 8),
        },
        true,
    ));

    add(color(R16_UNORM, 2, 2, BaseType::UNorm, rgba(0, u32::MAX, u32::MAX, u32::MAX, 16), true));
    add(color(R16_SNORM, 2, 2, BaseType::SNorm, rgba(0, u32::MAX, u32::MAX, u32::MAX, 16), true));
    add(color(R16_UINT, 2, 2, BaseType::UInt, rgba(0, u32::MAX, u32::MAX, u32::MAX, 16), false));
    add(color(R16_SINT, 2, 2, BaseType::SInt, rgba(0, u32::MAX, u32::MAX, u32::MAX, 16), false));
    add(color(R16_SFLOAT, 2, 2, BaseType::SFloat, rgba(0, u32::MAX, u32::MAX, u32::MAX, 16), true));
    add(color(R16G16_SFLOAT, 4, 2, BaseType::SFloat, rgba(0, 1, u32::MAX, u32::MAX, 16), true));
    add(color(R16G16B16A16_UNORM, 8, 2, BaseType::UNorm, rgba(0, 1, 2, 3, 16), true));
    add(color(R16G16B16A16_SFLOAT, 8, 2, BaseType::SFloat, rgba(0, 1, 2, 3, 16), true));

    add(color(R32_UINT, 4, 4, BaseType::UInt, rgba(0, u32::MAX, u32::MAX, u32::MAX, 32), false));
    add(color(R32_SINT, 4, 4, BaseType::SInt, rgba(0, u32::MAX, u32::MAX, u32::MAX, 32), false));
    add(color(R32_SFLOAT, 4, 4, BaseType::SFloat, rgba(0, u32::MAX, u32::MAX, u32::MAX, 32), true));
    add(color(R32G32_SFLOAT, 8, 4, BaseType::SFloat, rgba(0, 1, u32::MAX, u32::MAX, 32), true));
    add(color(R32G32B32_SFLOAT, 12, 4, BaseType::SFloat, rgba(0, 1, 2, u32::MAX, 32), true));
    add(color(R32G32B32A32_UINT, 16, 4, BaseType::UInt, rgba(0, 1, 2, 3, 32), false));
    add(color(R32G32B32A32_SFLOAT, 16, 4, BaseType::SFloat, rgba(0, 1, 2, 3, 32), true));

    add(FormatInfo {
        format: B10G11R11_UFLOAT_PACK32,
        category: FormatCategory::Normal,
        total_size: 4,
        element_size: 4,
        base_type: BaseType::UFloat,
        channels: Channels {
            red: ch(0, 11),
            green: ch(11, 11),
            blue: ch(22, 10),
            alpha: ChannelLayout::NONE,
        },
        ..color(B10G11R11_UFLOAT_PACK32, 4, 4, BaseType::UFloat, Channels::default(), true)
    });

    add(depth_stencil(D16_UNORM, 2, 2, BaseType::UNorm, rgba(0, u32::MAX, u32::MAX, u32::MAX, 16)));
    add(depth_stencil(D32_SFLOAT, 4, 4, BaseType::SFloat, rgba(0, u32::MAX, u32::MAX, u32::MAX, 32)));
    add(depth_stencil(
        D24_UNORM_S8_UINT,
        4,
        4,
        BaseType::UNorm,
        Channels {
            red: ch(0, 24),
            green: ch(24, 8),
            blue: ChannelLayout::NONE,
            alpha: ChannelLayout::NONE,
        },
    ));
    add(depth_stencil(S8_UINT, 1, 1, BaseType::UInt, rgba(0, u32::MAX, u32::MAX, u32::MAX, 8)));

    add(planar(G8_B8_R8_3PLANE_420_UNORM, 3));

    m
}

pub fn lookup(format: Format) -> &'static FormatInfo {
    TABLE.get(&format).unwrap_or_else(|| panic!("no format descriptor table entry for {:?}", format))
}
