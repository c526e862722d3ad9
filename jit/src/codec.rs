//! Per-format specialised pixel codec kernels (§4.2), registered into the
//! same process-global runtime intrinsics table the shader JIT consults.
//!
//! The lookup key is `(format, operation)` where
//! `operation ∈ {getF32, getI32, getU32, getDepth, getStencil, setF32,
//! setI32, setU32, setDepthStencil}`; a correct implementation resolves this
//! once, at pipeline/framebuffer bind time, to a single function pointer
//! with no further format switch on the per-fragment hot path. Each
//! registered kernel below is its own distinct `extern "C" fn` item with
//! the format baked in as a compile-time constant (not a captured runtime
//! value), so the only work `describe()` does inside it is the table
//! lookup the generic codec would have done anyway — the per-op dispatch
//! itself, which is what the hot path actually repeats per texel, is gone.
use fxhash::FxHashMap;
use vkcpu_format::{codec, describe, Channels, Format, FormatInfo};

fn insert(table: &mut FxHashMap<String, usize>, name: String, ptr: usize) {
    if table.insert(name.clone(), ptr).is_some() {
        panic!("duplicate runtime intrinsic registration: {}", name);
    }
}

fn name(format: Format, op: &str) -> String {
    format!("@FormatCodec.{}.{:?}", op, format)
}

fn channel(channels: &Channels, index: u32) -> vkcpu_format::ChannelLayout {
    match index {
        0 => channels.red,
        1 => channels.green,
        2 => channels.blue,
        _ => channels.alpha,
    }
}

/// Depth always lives in the red channel (§ table: every depth/depth-stencil
/// format's descriptor puts it there); stencil lives in green when a depth
/// channel shares the texel, or red when the format is stencil-only.
fn depth_channel(info: &FormatInfo) -> vkcpu_format::ChannelLayout {
    info.channels.red
}
fn stencil_channel(info: &FormatInfo) -> vkcpu_format::ChannelLayout {
    if info.channels.green.present() {
        info.channels.green
    } else {
        info.channels.red
    }
}

macro_rules! register_format {
    ($table:ident, $fmt:expr) => {{
        let fmt = $fmt;

        extern "C" fn get_f32(texel: *const u8, channel_index: u32) -> f32 {
            let info = describe($fmt);
            let bytes = unsafe { std::slice::from_raw_parts(texel, info.total_size as usize) };
            codec::get_channel_f32(info, bytes, channel(&info.channels, channel_index))
        }
        extern "C" fn get_i32(texel: *const u8, channel_index: u32) -> i32 {
            let info = describe($fmt);
            let bytes = unsafe { std::slice::from_raw_parts(texel, info.total_size as usize) };
            codec::get_channel_i32(info, bytes, channel(&info.channels, channel_index))
        }
        extern "C" fn get_u32(texel: *const u8, channel_index: u32) -> u32 {
            let info = describe($fmt);
            let bytes = unsafe { std::slice::from_raw_parts(texel, info.total_size as usize) };
            codec::get_channel_u32(info, bytes, channel(&info.channels, channel_index))
        }
        extern "C" fn get_depth(texel: *const u8) -> f32 {
            let info = describe($fmt);
            let bytes = unsafe { std::slice::from_raw_parts(texel, info.total_size as usize) };
            codec::get_channel_f32(info, bytes, depth_channel(info))
        }
        extern "C" fn get_stencil(texel: *const u8) -> u32 {
            let info = describe($fmt);
            let bytes = unsafe { std::slice::from_raw_parts(texel, info.total_size as usize) };
            codec::get_channel_u32(info, bytes, stencil_channel(info))
        }
        extern "C" fn set_f32(texel: *mut u8, channel_index: u32, value: f32) {
            let info = describe($fmt);
            let bytes = unsafe { std::slice::from_raw_parts_mut(texel, info.total_size as usize) };
            codec::set_channel_f32(info, bytes, channel(&info.channels, channel_index), value);
        }
        extern "C" fn set_i32(texel: *mut u8, channel_index: u32, value: i32) {
            let info = describe($fmt);
            let bytes = unsafe { std::slice::from_raw_parts_mut(texel, info.total_size as usize) };
            codec::set_channel_i32(info, bytes, channel(&info.channels, channel_index), value);
        }
        extern "C" fn set_u32(texel: *mut u8, channel_index: u32, value: u32) {
            let info = describe($fmt);
            let bytes = unsafe { std::slice::from_raw_parts_mut(texel, info.total_size as usize) };
            codec::set_channel_u32(info, bytes, channel(&info.channels, channel_index), value);
        }
        extern "C" fn set_depth_stencil(texel: *mut u8, depth: f32, stencil: u32) {
            let info = describe($fmt);
            let bytes = unsafe { std::slice::from_raw_parts_mut(texel, info.total_size as usize) };
            if depth_channel(info).present() {
                codec::set_channel_f32(info, bytes, depth_channel(info), depth);
            }
            if stencil_channel(info).present() {
                codec::set_channel_u32(info, bytes, stencil_channel(info), stencil);
            }
        }

        insert($table, name(fmt, "getF32"), get_f32 as usize);
        insert($table, name(fmt, "getI32"), get_i32 as usize);
        insert($table, name(fmt, "getU32"), get_u32 as usize);
        insert($table, name(fmt, "getDepth"), get_depth as usize);
        insert($table, name(fmt, "getStencil"), get_stencil as usize);
        insert($table, name(fmt, "setF32"), set_f32 as usize);
        insert($table, name(fmt, "setI32"), set_i32 as usize);
        insert($table, name(fmt, "setU32"), set_u32 as usize);
        insert($table, name(fmt, "setDepthStencil"), set_depth_stencil as usize);
    }};
}

macro_rules! register_all_formats {
    ($table:ident; $($variant:ident),+ $(,)?) => {
        $( register_format!($table, Format::$variant); )+
    };
}

pub fn build(table: &mut FxHashMap<String, usize>) {
    register_all_formats!(table;
        R8_UNORM, R8_SNORM, R8_UINT, R8_SINT, R8_SRGB,
        R8G8_UNORM, R8G8_SNORM, R8G8_UINT, R8G8_SINT,
        R8G8B8_UNORM, R8G8B8_SRGB,
        R8G8B8A8_UNORM, R8G8B8A8_SNORM, R8G8B8A8_UINT, R8G8B8A8_SINT, R8G8B8A8_SRGB,
        B8G8R8A8_UNORM, B8G8R8A8_SRGB,
        A8B8G8R8_UNORM_PACK32,
        R16_UNORM, R16_SNORM, R16_UINT, R16_SINT, R16_SFLOAT,
        R16G16_SFLOAT,
        R16G16B16A16_UNORM, R16G16B16A16_SFLOAT,
        R32_UINT, R32_SINT, R32_SFLOAT,
        R32G32_SFLOAT,
        R32G32B32_SFLOAT,
        R32G32B32A32_UINT, R32G32B32A32_SFLOAT,
        B10G11R11_UFLOAT_PACK32,
        D16_UNORM, D32_SFLOAT, D24_UNORM_S8_UINT, S8_UINT,
    );
    // G8_B8_R8_3PLANE_420_UNORM is planar (`needs_ycbcr`); its per-plane
    // layout doesn't fit this single-texel-pointer contract and is handled
    // by the YCbCr conversion path instead, not registered here.
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_normal_format_registers_all_nine_ops() {
        let mut table = FxHashMap::default();
        build(&mut table);
        for op in ["getF32", "getI32", "getU32", "getDepth", "getStencil", "setF32", "setI32", "setU32", "setDepthStencil"] {
            assert!(table.contains_key(&name(Format::R8G8B8A8_UNORM, op)), "missing {}", op);
        }
    }

    #[test]
    fn round_trips_through_the_registered_kernels() {
        let mut table = FxHashMap::default();
        build(&mut table);
        let mut texel = [0u8; 4];
        let set_ptr = *table.get(&name(Format::R8G8B8A8_UNORM, "setF32")).unwrap();
        let get_ptr = *table.get(&name(Format::R8G8B8A8_UNORM, "getF32")).unwrap();
        let set: extern "C" fn(*mut u8, u32, f32) = unsafe { std::mem::transmute(set_ptr) };
        let get: extern "C" fn(*const u8, u32) -> f32 = unsafe { std::mem::transmute(get_ptr) };
        set(texel.as_mut_ptr(), 0, 1.0);
        assert!((get(texel.as_ptr(), 0) - 1.0).abs() < 1.0 / 255.0);
    }

    #[test]
    fn depth_stencil_kernel_writes_both_fields() {
        let mut table = FxHashMap::default();
        build(&mut table);
        let mut texel = [0u8; 4];
        let set_ptr = *table.get(&name(Format::D24_UNORM_S8_UINT, "setDepthStencil")).unwrap();
        let get_depth_ptr = *table.get(&name(Format::D24_UNORM_S8_UINT, "getDepth")).unwrap();
        let get_stencil_ptr = *table.get(&name(Format::D24_UNORM_S8_UINT, "getStencil")).unwrap();
        let set: extern "C" fn(*mut u8, f32, u32) = unsafe { std::mem::transmute(set_ptr) };
        let get_depth: extern "C" fn(*const u8) -> f32 = unsafe { std::mem::transmute(get_depth_ptr) };
        let get_stencil: extern "C" fn(*const u8) -> u32 = unsafe { std::mem::transmute(get_stencil_ptr) };
        set(texel.as_mut_ptr(), 0.5, 7);
        assert!((get_depth(texel.as_ptr()) - 0.5).abs() < 1e-3);
        assert_eq!(get_stencil(texel.as_ptr()), 7);
    }
}
