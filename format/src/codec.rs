//! Texel addressing and the generic (non-JIT-specialised) read/write/sample
//! kernels. This is the reference codec the per-format JIT specialisations
//! registered into the runtime intrinsics table (`vkcpu-jit`) are checked
//! against — see §4.2's "not a generic switch" requirement.
use crate::float::{Half, Uf10, Uf11, Uf14};
use crate::{BaseType, ChannelLayout, Format, FormatInfo};

/// One mip level's extent, each axis halved (minimum 1) from the base.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Extent3D {
    pub width: u32,
    pub height: u32,
    pub depth: u32,
}

pub fn mip_extent(base: Extent3D, mip: u32) -> Extent3D {
    let shift = |v: u32| (v >> mip).max(1);
    Extent3D {
        width: shift(base.width),
        height: shift(base.height),
        depth: shift(base.depth),
    }
}

/// Byte offset of mip level `mip`'s first texel within an image with `layers`
/// array layers, given the base extent. Levels are laid out mip-major,
/// layer-minor: all layers of mip 0, then all layers of mip 1, and so on.
pub fn mip_offset(info: &FormatInfo, base: Extent3D, layers: u32, mip: u32) -> u64 {
    let mut offset = 0u64;
    for level in 0..mip {
        let e = mip_extent(base, level);
        offset += level_byte_size(info, e, layers);
    }
    offset
}

fn level_byte_size(info: &FormatInfo, extent: Extent3D, layers: u32) -> u64 {
    info.total_size as u64 * extent.width as u64 * extent.height as u64 * extent.depth as u64 * layers as u64
}

/// Byte offset of texel `(i, j, k)` in array layer `layer` at mip level `mip`,
/// relative to the image's backing base.
pub fn texel_offset(info: &FormatInfo, base: Extent3D, layers: u32, i: u32, j: u32, k: u32, layer: u32, mip: u32) -> u64 {
    let level_base = mip_offset(info, base, layers, mip);
    let extent = mip_extent(base, mip);
    let layer_size = info.total_size as u64 * extent.width as u64 * extent.height as u64 * extent.depth as u64;
    let within_layer =
        info.total_size as u64 * (k as u64 * extent.height as u64 * extent.width as u64 + j as u64 * extent.width as u64 + i as u64);
    level_base + layer as u64 * layer_size + within_layer
}

/// The standard transfer function: `c <= 0.0031308 ? 12.92c : 1.055 c^(1/2.4) - 0.055`.
pub fn linear_to_srgb(c: f32) -> f32 {
    if c <= 0.0031308 {
        12.92 * c
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    }
}

pub fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

fn read_container(bytes: &[u8], channel: ChannelLayout, element_size: u32, packed: bool) -> u64 {
    if channel.bits == 0 {
        return 0;
    }
    if packed {
        let word = match bytes.len() {
            1 => bytes[0] as u64,
            2 => u16::from_le_bytes([bytes[0], bytes[1]]) as u64,
            4 => u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as u64,
            8 => u64::from_le_bytes(bytes.try_into().unwrap()),
            n => panic!("unsupported packed container width {}", n),
        };
        let mask = if channel.bits == 64 { u64::MAX } else { (1u64 << channel.bits) - 1 };
        (word >> channel.offset) & mask
    } else {
        // non-packed: `offset` is the channel's index among the texel's
        // channels, not a bit position — each channel occupies one whole
        // `element_size`-byte container.
        let start = channel.offset as usize * element_size as usize;
        let slice = &bytes[start..start + element_size as usize];
        match element_size {
            1 => slice[0] as u64,
            2 => u16::from_le_bytes([slice[0], slice[1]]) as u64,
            4 => u32::from_le_bytes(slice.try_into().unwrap()) as u64,
            8 => u64::from_le_bytes(slice.try_into().unwrap()),
            n => panic!("unsupported element width {}", n),
        }
    }
}

fn sign_extend(value: u64, bits: u32) -> i64 {
    let shift = 64 - bits;
    ((value << shift) as i64) >> shift
}

/// Decodes one channel of a texel to its shader-visible `f32` representation.
pub fn get_channel_f32(info: &FormatInfo, bytes: &[u8], channel: ChannelLayout) -> f32 {
    if !channel.present() {
        return 0.0;
    }
    let packed = info.is_packed();
    let raw = read_container(bytes, channel, info.element_size, packed);
    let bits = channel.bits;
    match info.base_type {
        BaseType::UNorm => raw as f32 / max_unorm(bits),
        BaseType::UScaled => raw as f32,
        BaseType::SNorm => (sign_extend(raw, bits) as f32 / max_snorm(bits)).max(-1.0),
        BaseType::SScaled => sign_extend(raw, bits) as f32,
        BaseType::UInt => raw as f32,
        BaseType::SInt => sign_extend(raw, bits) as f32,
        BaseType::Srgb => srgb_to_linear(raw as f32 / max_unorm(bits)),
        BaseType::UFloat => decode_ufloat(raw as u16, bits),
        BaseType::SFloat => decode_sfloat(raw, bits),
        BaseType::Unknown => panic!("format {:?} has an unknown base type", info.format),
    }
}

fn max_unorm(bits: u32) -> f32 {
    ((1u64 << bits) - 1) as f32
}

fn max_snorm(bits: u32) -> f32 {
    ((1i64 << (bits - 1)) - 1) as f32
}

fn decode_ufloat(raw: u16, bits: u32) -> f32 {
    match bits {
        10 => Uf10(raw).to_f32(),
        11 => Uf11(raw).to_f32(),
        14 => Uf14(raw).to_f32(),
        _ => panic!("unsupported unsigned-float width {}", bits),
    }
}

fn decode_sfloat(raw: u64, bits: u32) -> f32 {
    match bits {
        16 => Half::from_bits(raw as u16).to_f32(),
        32 => f32::from_bits(raw as u32),
        64 => f64::from_bits(raw) as f32,
        _ => panic!("unsupported signed-float width {}", bits),
    }
}

/// Raw unsigned-integer read (`texelFetch` on a `*_UINT` format): no
/// normalisation, unlike [`get_channel_f32`]'s `UInt -> f32` cast.
pub fn get_channel_u32(info: &FormatInfo, bytes: &[u8], channel: ChannelLayout) -> u32 {
    if !channel.present() {
        return 0;
    }
    read_container(bytes, channel, info.element_size, info.is_packed()) as u32
}

/// Raw signed-integer read (`texelFetch` on a `*_SINT` format).
pub fn get_channel_i32(info: &FormatInfo, bytes: &[u8], channel: ChannelLayout) -> i32 {
    if !channel.present() {
        return 0;
    }
    let raw = read_container(bytes, channel, info.element_size, info.is_packed());
    sign_extend(raw, channel.bits) as i32
}

pub fn set_channel_u32(info: &FormatInfo, bytes: &mut [u8], channel: ChannelLayout, value: u32) {
    write_container(bytes, channel, info.element_size, info.is_packed(), value as u64);
}

pub fn set_channel_i32(info: &FormatInfo, bytes: &mut [u8], channel: ChannelLayout, value: i32) {
    let bits = channel.bits;
    let masked = if bits == 0 { 0 } else { (value as i64 as u64) & ((1u64 << bits) - 1) };
    write_container(bytes, channel, info.element_size, info.is_packed(), masked);
}

fn write_container(bytes: &mut [u8], channel: ChannelLayout, element_size: u32, packed: bool, value: u64) {
    if channel.bits == 0 {
        return;
    }
    if packed {
        let mask = if channel.bits == 64 { u64::MAX } else { (1u64 << channel.bits) - 1 };
        let shifted = (value & mask) << channel.offset;
        match bytes.len() {
            1 => bytes[0] |= shifted as u8,
            2 => {
                let existing = u16::from_le_bytes([bytes[0], bytes[1]]);
                let merged = existing | shifted as u16;
                bytes.copy_from_slice(&merged.to_le_bytes());
            }
            4 => {
                let existing = u32::from_le_bytes(bytes.try_into().unwrap());
                let merged = existing | shifted as u32;
                bytes.copy_from_slice(&merged.to_le_bytes());
            }
            8 => {
                let existing = u64::from_le_bytes(bytes.try_into().unwrap());
                let merged = existing | shifted;
                bytes.copy_from_slice(&merged.to_le_bytes());
            }
            n => panic!("unsupported packed container width {}", n),
        }
    } else {
        let start = channel.offset as usize * element_size as usize;
        let slice = &mut bytes[start..start + element_size as usize];
        match element_size {
            1 => slice[0] = value as u8,
            2 => slice.copy_from_slice(&(value as u16).to_le_bytes()),
            4 => slice.copy_from_slice(&(value as u32).to_le_bytes()),
            8 => slice.copy_from_slice(&value.to_le_bytes()),
            n => panic!("unsupported element width {}", n),
        }
    }
}

/// Encodes a shader-visible `f32` channel value into its on-disk container.
pub fn set_channel_f32(info: &FormatInfo, bytes: &mut [u8], channel: ChannelLayout, value: f32) {
    if !channel.present() {
        return;
    }
    let packed = info.is_packed();
    let bits = channel.bits;
    let raw: u64 = match info.base_type {
        BaseType::UNorm => (value.clamp(0.0, 1.0) * max_unorm(bits)).round() as u64,
        BaseType::UScaled => value.round() as u64,
        BaseType::SNorm => (value.clamp(-1.0, 1.0) * max_snorm(bits)).round() as i64 as u64 & ((1u64 << bits) - 1),
        BaseType::SScaled => value.round() as i64 as u64 & ((1u64 << bits) - 1),
        BaseType::UInt => value as u64,
        BaseType::SInt => (value as i64 as u64) & ((1u64 << bits) - 1),
        BaseType::Srgb => (linear_to_srgb(value.clamp(0.0, 1.0)) * max_unorm(bits)).round() as u64,
        BaseType::UFloat => encode_ufloat(value, bits) as u64,
        BaseType::SFloat => encode_sfloat(value, bits),
        BaseType::Unknown => panic!("format {:?} has an unknown base type", info.format),
    };
    write_container(bytes, channel, info.element_size, packed, raw);
}

fn encode_ufloat(value: f32, bits: u32) -> u16 {
    match bits {
        10 => Uf10::from_f32(value).0,
        11 => Uf11::from_f32(value).0,
        14 => Uf14::from_f32(value).0,
        _ => panic!("unsupported unsigned-float width {}", bits),
    }
}

fn encode_sfloat(value: f32, bits: u32) -> u64 {
    match bits {
        16 => Half::from_f32(value).to_bits() as u64,
        32 => value.to_bits() as u64,
        64 => (value as f64).to_bits(),
        _ => panic!("unsupported signed-float width {}", bits),
    }
}

/// Sampler address modes (`VkSamplerAddressMode`).
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum AddressMode {
    Repeat,
    MirroredRepeat,
    ClampToEdge,
    ClampToBorder,
    MirrorClampToEdge,
}

/// Maps an integer texel coordinate `v` to `[0, size-1]` (or `[-1, size]`
/// exactly for `ClampToBorder`, where -1/size signal "use the border
/// colour").
pub fn wrap(v: i64, size: u32, mode: AddressMode) -> i64 {
    let size = size as i64;
    match mode {
        AddressMode::Repeat => v.rem_euclid(size),
        AddressMode::MirroredRepeat => {
            let period = 2 * size;
            let m = v.rem_euclid(period);
            if m < size {
                m
            } else {
                period - 1 - m
            }
        }
        AddressMode::ClampToEdge => v.clamp(0, size - 1),
        AddressMode::ClampToBorder => v.clamp(-1, size),
        AddressMode::MirrorClampToEdge => {
            let n = if v >= 0 { v } else { -(1 + v) };
            (size - 1 - n).clamp(0, size - 1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::describe;

    #[test]
    fn srgb_transfer_roundtrips() {
        for v in [0.0f32, 0.001, 0.18, 0.5, 1.0] {
            let encoded = linear_to_srgb(v);
            let decoded = srgb_to_linear(encoded);
            assert!((decoded - v).abs() < 1e-5, "{} -> {} -> {}", v, encoded, decoded);
        }
    }

    #[test]
    fn address_mode_total_repeat() {
        for v in -10i64..10 {
            let w = wrap(v, 4, AddressMode::Repeat);
            assert!((0..4).contains(&w));
        }
    }

    #[test]
    fn address_mode_total_clamp_to_border() {
        for v in -10i64..10 {
            let w = wrap(v, 4, AddressMode::ClampToBorder);
            assert!((-1..=4).contains(&w));
        }
    }

    #[test]
    fn mip_offsets_strictly_ascending() {
        let info = describe(Format::R8G8B8A8_UNORM);
        let base = Extent3D { width: 8, height: 8, depth: 1 };
        let mut prev = None;
        for mip in 0..4 {
            let off = mip_offset(info, base, 1, mip);
            if let Some(p) = prev {
                assert!(off > p, "mip {} offset {} did not exceed {}", mip, off, p);
            }
            prev = Some(off);
        }
    }

    #[test]
    fn unorm_roundtrip_for_8_bit() {
        let info = describe(Format::R8G8B8A8_UNORM);
        let mut bytes = [0u8; 4];
        set_channel_f32(info, &mut bytes, info.channels.red, 0.5);
        let v = get_channel_f32(info, &bytes, info.channels.red);
        assert!((v - 0.5).abs() <= 1.0 / 255.0);
    }

    #[test]
    fn clear_color_scenario_bgra() {
        // clearing (R=0.25, G=0.5, B=0.75, A=1.0) into B8G8R8A8_UNORM lays
        // out B,G,R,A in ascending memory address order.
        let info = describe(Format::B8G8R8A8_UNORM);
        let mut bytes = [0u8; 4];
        set_channel_f32(info, &mut bytes, info.channels.red, 0.25);
        set_channel_f32(info, &mut bytes, info.channels.green, 0.5);
        set_channel_f32(info, &mut bytes, info.channels.blue, 0.75);
        set_channel_f32(info, &mut bytes, info.channels.alpha, 1.0);
        assert_eq!(bytes, [0xBF, 0x80, 0x40, 0xFF]);
    }
}
