//! Image sample/fetch runtime intrinsics (§4.6 "C6").
//!
//! `OpImageSampleImplicitLod`, `OpImageSampleExplicitLod`, and `OpImageFetch`
//! all lower to an extern call taking exactly two arguments, `[image, coord]`
//! (`translate::function::translate_image_op`) named
//! `@{OpName}.{CoordTypeTag}.{Float|Int|Uint}`. The coordinate type tag comes
//! from the coordinate operand's IR type — scalar or vector float for
//! sample, scalar or vector int for fetch — and the trailing tag from the
//! sampled image's data type.
//!
//! Every one of these functions always computes a full four-component
//! result, mirroring `vkcpu_format::runtime::sample`/`fetch`, which always
//! decode rgba; the translator extracts whichever components the SPIR-V
//! result type actually asked for.
use fxhash::FxHashMap;
use vkcpu_format::runtime::{sample, OpaqueHandle, SamplerDescriptor};
use vkcpu_ir::types::IrType;
use vkcpu_translate::mangle::type_tag_pub;

fn insert(table: &mut FxHashMap<String, usize>, name: String, ptr: usize) {
    if table.insert(name.clone(), ptr).is_some() {
        panic!("duplicate runtime intrinsic registration: {}", name);
    }
}

fn coord_ty(lanes: u32, elem: IrType) -> IrType {
    if lanes == 1 {
        elem
    } else {
        IrType::Vector(Box::new(elem), lanes)
    }
}

/// Unnormalised texel coordinates read out of a coordinate argument that may
/// be a scalar or a 2/3/4-lane vector, padding missing lanes with zero and
/// treating a present fourth lane as an array layer index.
fn unpack_coords(coord: &[f32], lanes: u32) -> (f32, f32, f32, u32) {
    let u = coord[0];
    let v = if lanes >= 2 { coord[1] } else { 0.0 };
    let w = if lanes >= 3 { coord[2] } else { 0.0 };
    let layer = if lanes >= 4 { coord[3].max(0.0) as u32 } else { 0 };
    (u, v, w, layer)
}

fn unpack_icoords(coord: &[i32], lanes: u32) -> (i32, i32, i32, u32) {
    let i = coord[0];
    let j = if lanes >= 2 { coord[1] } else { 0 };
    let k = if lanes >= 3 { coord[2] } else { 0 };
    let layer = if lanes >= 4 { coord[3].max(0) as u32 } else { 0 };
    (i, j, k, layer)
}

fn to_kind(out: [f32; 4], kind: &str) -> [f32; 4] {
    match kind {
        "Float" => out,
        // Integer-sampled images carry exact integer texel values through
        // the f32 decode path (`get_channel_f32` on integer base types is a
        // plain numeric cast, not a bit reinterpretation); truncate back.
        _ => [out[0].trunc(), out[1].trunc(), out[2].trunc(), out[3].trunc()],
    }
}

macro_rules! sample_fn {
    ($table:ident, $op_name:expr, $kind:expr, $lanes:literal, $coord_ty:ty) => {{
        extern "C" fn f(handle: *const OpaqueHandle, coord: $coord_ty) -> [f32; 4] {
            let handle = unsafe { &*handle };
            let image = unsafe { handle.image_descriptor() };
            let sampler: &SamplerDescriptor = unsafe { handle.sampler_descriptor() };
            let coord_slice: &[f32] = &coord_as_slice(&coord);
            let (u, v, w, layer) = unpack_coords(coord_slice, $lanes);
            let mut out = [0f32; 4];
            sample(image, sampler, u, v, w, layer, &mut out);
            to_kind(out, $kind)
        }
        let name = format!("@{}.{}.{}", $op_name, type_tag_pub(&coord_ty($lanes, IrType::Float(32))), $kind);
        insert($table, name, f as usize);
    }};
}

macro_rules! fetch_fn {
    ($table:ident, $kind:expr, $lanes:literal, $coord_ty:ty) => {{
        extern "C" fn f(handle: *const OpaqueHandle, coord: $coord_ty) -> [f32; 4] {
            let handle = unsafe { &*handle };
            let image = unsafe { handle.image_descriptor() };
            let coord_slice: &[i32] = &coord_as_islice(&coord);
            let (i, j, k, layer) = unpack_icoords(coord_slice, $lanes);
            let mut out = [0f32; 4];
            image.fetch(i, j, k, layer, 0, &mut out);
            to_kind(out, $kind)
        }
        let name = format!("@{}.{}.{}", "ImageFetch", type_tag_pub(&coord_ty($lanes, IrType::Int(32))), $kind);
        insert($table, name, f as usize);
    }};
}

// Bridges for the scalar/array mismatch the macros above paper over: a
// one-lane coordinate arrives as a bare `f32`/`i32`, not a one-element array.
trait AsFloatSlice {
    fn as_slice4(&self) -> [f32; 4];
}
impl AsFloatSlice for f32 {
    fn as_slice4(&self) -> [f32; 4] {
        [*self, 0.0, 0.0, 0.0]
    }
}
impl AsFloatSlice for [f32; 2] {
    fn as_slice4(&self) -> [f32; 4] {
        [self[0], self[1], 0.0, 0.0]
    }
}
impl AsFloatSlice for [f32; 3] {
    fn as_slice4(&self) -> [f32; 4] {
        [self[0], self[1], self[2], 0.0]
    }
}
impl AsFloatSlice for [f32; 4] {
    fn as_slice4(&self) -> [f32; 4] {
        *self
    }
}
fn coord_as_slice<T: AsFloatSlice>(c: &T) -> [f32; 4] {
    c.as_slice4()
}

trait AsIntSlice {
    fn as_slice4(&self) -> [i32; 4];
}
impl AsIntSlice for i32 {
    fn as_slice4(&self) -> [i32; 4] {
        [*self, 0, 0, 0]
    }
}
impl AsIntSlice for [i32; 2] {
    fn as_slice4(&self) -> [i32; 4] {
        [self[0], self[1], 0, 0]
    }
}
impl AsIntSlice for [i32; 3] {
    fn as_slice4(&self) -> [i32; 4] {
        [self[0], self[1], self[2], 0]
    }
}
impl AsIntSlice for [i32; 4] {
    fn as_slice4(&self) -> [i32; 4] {
        *self
    }
}
fn coord_as_islice<T: AsIntSlice>(c: &T) -> [i32; 4] {
    c.as_slice4()
}

pub fn build(table: &mut FxHashMap<String, usize>) {
    for kind in ["Float", "Int", "Uint"] {
        for op_name in ["ImageSampleImplicitLod", "ImageSampleExplicitLod"] {
            sample_fn!(table, op_name, kind, 1, f32);
            sample_fn!(table, op_name, kind, 2, [f32; 2]);
            sample_fn!(table, op_name, kind, 3, [f32; 3]);
            sample_fn!(table, op_name, kind, 4, [f32; 4]);
        }
        fetch_fn!(table, kind, 1, i32);
        fetch_fn!(table, kind, 2, [i32; 2]);
        fetch_fn!(table, kind, 3, [i32; 3]);
        fetch_fn!(table, kind, 4, [i32; 4]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vkcpu_format::codec::Extent3D;
    use vkcpu_format::runtime::ImageDescriptor;
    use vkcpu_format::{describe, AddressMode, Format};

    #[test]
    fn table_has_the_names_the_translator_would_ask_for() {
        let mut table = FxHashMap::default();
        build(&mut table);
        assert!(table.contains_key("@ImageSampleImplicitLod.F32[2].Float"));
        assert!(table.contains_key("@ImageFetch.I32[2].Uint"));
        assert!(table.contains_key("@ImageSampleExplicitLod.F32.Int"));
    }

    #[test]
    fn registered_sample_fn_reads_back_solid_colour() {
        let mut table = FxHashMap::default();
        build(&mut table);
        let info = describe(Format::R8G8B8A8_UNORM);
        let extent = Extent3D { width: 2, height: 2, depth: 1 };
        let mut data = vec![0u8; (extent.width * extent.height) as usize * info.total_size as usize];
        for t in 0..(extent.width * extent.height) as usize {
            let bytes = &mut data[t * info.total_size as usize..(t + 1) * info.total_size as usize];
            vkcpu_format::codec::set_channel_f32(info, bytes, info.channels.red, 1.0);
            vkcpu_format::codec::set_channel_f32(info, bytes, info.channels.alpha, 1.0);
        }
        let mut image = ImageDescriptor { data: data.as_mut_ptr(), format: Format::R8G8B8A8_UNORM, extent, mip_levels: 1, array_layers: 1 };
        let mut sampler = SamplerDescriptor::default();
        sampler.address_u = AddressMode::ClampToEdge;
        sampler.address_v = AddressMode::ClampToEdge;
        let handle = OpaqueHandle::sampled_image(&mut image as *mut _, &mut sampler as *mut _);

        let ptr = *table.get("@ImageSampleImplicitLod.F32[2].Float").unwrap();
        let f: extern "C" fn(*const OpaqueHandle, [f32; 2]) -> [f32; 4] = unsafe { std::mem::transmute(ptr) };
        let out = f(&handle as *const _, [0.5, 0.5]);
        assert!((out[0] - 1.0).abs() < 1.0 / 255.0);
    }
}
