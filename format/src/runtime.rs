//! The raw, `repr(C)` shapes the JIT-compiled runtime intrinsics
//! (`vkcpu-jit::intrinsics`) and the resource binder (`vkcpu-core`) both see
//! across the extern-call boundary.
//!
//! Per §4.4 "opaque types map to pointers to three-slot structs `{u32 kind,
//! u8* handle, u8* extra}`": a combined-image-sampler's `handle` slot points
//! at an [`ImageDescriptor`] here, and its `extra` slot, when the opaque
//! value carries a sampler, points at a [`SamplerDescriptor`]. Both are
//! populated by `vkcpu-core`'s descriptor-set binding code and read (never
//! mutated) by the sample/fetch intrinsics.
use crate::codec::{self, wrap, AddressMode, Extent3D};
use crate::{describe, Format};

/// The three-slot opaque handle every `Image`/`Sampler`/`SampledImage` SPIR-V
/// type collapses to (§4.4 "Values": `{u32 kind, u8* handle, u8* extra}`),
/// 24 bytes wide including the padding `kind`'s 4 bytes need before the two
/// 8-byte-aligned pointers. `vkcpu-translate` never constructs one of these
/// directly — it only ever materialises a *pointer* to one, filled in by
/// `vkcpu-core`'s descriptor-set binder — so this type lives here, next to
/// the descriptors its slots point at, rather than in the translator.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct OpaqueHandle {
    pub kind: u32,
    _pad: u32,
    pub handle: *mut u8,
    pub extra: *mut u8,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum HandleKind {
    Image = 1,
    Sampler = 2,
    SampledImage = 3,
}

impl OpaqueHandle {
    pub fn image(image: *mut ImageDescriptor) -> Self {
        OpaqueHandle { kind: HandleKind::Image as u32, _pad: 0, handle: image as *mut u8, extra: std::ptr::null_mut() }
    }
    pub fn sampler(sampler: *mut SamplerDescriptor) -> Self {
        OpaqueHandle { kind: HandleKind::Sampler as u32, _pad: 0, handle: sampler as *mut u8, extra: std::ptr::null_mut() }
    }
    pub fn sampled_image(image: *mut ImageDescriptor, sampler: *mut SamplerDescriptor) -> Self {
        OpaqueHandle { kind: HandleKind::SampledImage as u32, _pad: 0, handle: image as *mut u8, extra: sampler as *mut u8 }
    }

    /// # Safety
    /// `self.handle` must point at a live `ImageDescriptor` (true for both
    /// `Image` and `SampledImage` kinds).
    pub unsafe fn image_descriptor(&self) -> &ImageDescriptor {
        &*(self.handle as *const ImageDescriptor)
    }
    /// # Safety
    /// `self.extra` must point at a live `SamplerDescriptor` (true only for
    /// the `SampledImage` kind).
    pub unsafe fn sampler_descriptor(&self) -> &SamplerDescriptor {
        &*(self.extra as *const SamplerDescriptor)
    }
}

#[cfg(test)]
mod handle_tests {
    use super::*;

    #[test]
    fn opaque_handle_is_24_bytes() {
        assert_eq!(std::mem::size_of::<OpaqueHandle>(), 24);
    }
}

/// Backing memory plus addressing metadata for one bound image.
///
/// `data` points at mip level 0, layer 0; `codec::texel_offset` computes
/// every other address relative to it.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct ImageDescriptor {
    pub data: *mut u8,
    pub format: Format,
    pub extent: Extent3D,
    pub mip_levels: u32,
    pub array_layers: u32,
}

impl ImageDescriptor {
    fn bytes(&self, len: usize) -> &[u8] {
        unsafe { std::slice::from_raw_parts(self.data, len) }
    }
    fn bytes_mut(&mut self, len: usize) -> &mut [u8] {
        unsafe { std::slice::from_raw_parts_mut(self.data, len) }
    }

    /// `texelFetch`-style read: integer coordinates, no filtering, no
    /// wrapping other than clamping out-of-range mips/layers away (the
    /// caller is required to have already bounds-checked per the API's own
    /// contract — this mirrors `OpImageFetch`'s undefined-on-OOB semantics
    /// by simply clamping, which keeps the codec's slice indexing in
    /// bounds).
    pub fn fetch(&self, i: i32, j: i32, k: i32, layer: u32, mip: u32, out: &mut [f32; 4]) {
        let info = describe(self.format);
        let mip = mip.min(self.mip_levels.saturating_sub(1));
        let layer = layer.min(self.array_layers.saturating_sub(1));
        let level_extent = codec::mip_extent(self.extent, mip);
        let i = (i as i64).clamp(0, level_extent.width as i64 - 1) as u32;
        let j = (j as i64).clamp(0, level_extent.height as i64 - 1) as u32;
        let k = (k as i64).clamp(0, level_extent.depth as i64 - 1) as u32;
        let offset = codec::texel_offset(info, self.extent, self.array_layers, i, j, k, layer, mip);
        let texel = self.bytes(offset as usize + info.total_size as usize);
        let texel = &texel[offset as usize..];
        *out = [
            codec::get_channel_f32(info, texel, info.channels.red),
            codec::get_channel_f32(info, texel, info.channels.green),
            codec::get_channel_f32(info, texel, info.channels.blue),
            codec::get_channel_f32(info, texel, info.channels.alpha),
        ];
    }

    pub fn store(&mut self, i: u32, j: u32, k: u32, layer: u32, mip: u32, value: &[f32; 4]) {
        let info = describe(self.format);
        let offset = codec::texel_offset(info, self.extent, self.array_layers, i, j, k, layer, mip);
        let total = info.total_size as usize;
        let texel = self.bytes_mut(offset as usize + total);
        let texel = &mut texel[offset as usize..offset as usize + total];
        codec::set_channel_f32(info, texel, info.channels.red, value[0]);
        codec::set_channel_f32(info, texel, info.channels.green, value[1]);
        codec::set_channel_f32(info, texel, info.channels.blue, value[2]);
        codec::set_channel_f32(info, texel, info.channels.alpha, value[3]);
    }
}

/// A bound sampler's filtering and addressing state (`VkSamplerCreateInfo`,
/// reduced to what the codec's address-mode wrapping and linear-filter path
/// need).
#[repr(C)]
#[derive(Clone, Copy)]
pub struct SamplerDescriptor {
    pub mag_linear: bool,
    pub min_linear: bool,
    pub address_u: AddressMode,
    pub address_v: AddressMode,
    pub address_w: AddressMode,
    pub border_color: [f32; 4],
}

impl Default for SamplerDescriptor {
    fn default() -> Self {
        SamplerDescriptor {
            mag_linear: false,
            min_linear: false,
            address_u: AddressMode::Repeat,
            address_v: AddressMode::Repeat,
            address_w: AddressMode::Repeat,
            border_color: [0.0; 4],
        }
    }
}

fn wrapped(v: i64, size: u32, mode: AddressMode) -> Option<u32> {
    let w = wrap(v, size, mode);
    if w < 0 || w >= size as i64 {
        None // ClampToBorder sentinel
    } else {
        Some(w as u32)
    }
}

/// `OpImageSampleImplicitLod`-style lookup: normalised `[u, v, w] in [0,1)`
/// coordinates (already divided by the `q` component if projective),
/// addressed per `sampler`, mip 0 only (§4.2: "a correct implementation
/// selects mip 0 in the absence of derivative information").
pub fn sample(image: &ImageDescriptor, sampler: &SamplerDescriptor, u: f32, v: f32, w: f32, layer: u32, out: &mut [f32; 4]) {
    let extent = codec::mip_extent(image.extent, 0);
    if sampler.mag_linear {
        sample_linear(image, sampler, extent, u, v, w, layer, out);
    } else {
        sample_nearest(image, sampler, extent, u, v, w, layer, out);
    }
}

fn texel_coord(n: f32, size: u32) -> i64 {
    (n * size as f32).floor() as i64
}

fn fetch_or_border(image: &ImageDescriptor, sampler: &SamplerDescriptor, extent: Extent3D, i: i64, j: i64, k: i64, layer: u32, out: &mut [f32; 4]) {
    let iw = wrapped(i, extent.width, sampler.address_u);
    let jw = wrapped(j, extent.height, sampler.address_v);
    let kw = wrapped(k, extent.depth.max(1), sampler.address_w);
    match (iw, jw, kw) {
        (Some(i), Some(j), Some(k)) => image.fetch(i as i32, j as i32, k as i32, layer, 0, out),
        _ => *out = sampler.border_color,
    }
}

fn sample_nearest(image: &ImageDescriptor, sampler: &SamplerDescriptor, extent: Extent3D, u: f32, v: f32, w: f32, layer: u32, out: &mut [f32; 4]) {
    let i = texel_coord(u, extent.width);
    let j = texel_coord(v, extent.height);
    let k = texel_coord(w, extent.depth.max(1));
    fetch_or_border(image, sampler, extent, i, j, k, layer, out);
}

fn sample_linear(image: &ImageDescriptor, sampler: &SamplerDescriptor, extent: Extent3D, u: f32, v: f32, w: f32, layer: u32, out: &mut [f32; 4]) {
    // Tri-linear in output space: fetch the eight neighbours and interpolate.
    let fx = u * extent.width as f32 - 0.5;
    let fy = v * extent.height as f32 - 0.5;
    let fz = w * extent.depth.max(1) as f32 - 0.5;
    let (i0, j0, k0) = (fx.floor() as i64, fy.floor() as i64, fz.floor() as i64);
    let (tx, ty, tz) = (fx - i0 as f32, fy - j0 as f32, fz - k0 as f32);

    let mut acc = [0f32; 4];
    for dz in 0..=1i64 {
        for dy in 0..=1i64 {
            for dx in 0..=1i64 {
                let mut texel = [0f32; 4];
                fetch_or_border(image, sampler, extent, i0 + dx, j0 + dy, k0 + dz, layer, &mut texel);
                let wx = if dx == 0 { 1.0 - tx } else { tx };
                let wy = if dy == 0 { 1.0 - ty } else { ty };
                let wz = if dz == 0 { 1.0 - tz } else { tz };
                let weight = wx * wy * wz;
                for c in 0..4 {
                    acc[c] += texel[c] * weight;
                }
            }
        }
    }
    *out = acc;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{set_channel_f32, Extent3D};

    fn solid_image(format: Format, extent: Extent3D, color: [f32; 4]) -> (Vec<u8>, ImageDescriptor) {
        let info = describe(format);
        let texel_count = (extent.width * extent.height * extent.depth) as usize;
        let mut data = vec![0u8; texel_count * info.total_size as usize];
        for t in 0..texel_count {
            let bytes = &mut data[t * info.total_size as usize..(t + 1) * info.total_size as usize];
            set_channel_f32(info, bytes, info.channels.red, color[0]);
            set_channel_f32(info, bytes, info.channels.green, color[1]);
            set_channel_f32(info, bytes, info.channels.blue, color[2]);
            set_channel_f32(info, bytes, info.channels.alpha, color[3]);
        }
        let desc = ImageDescriptor { data: data.as_ptr() as *mut u8, format, extent, mip_levels: 1, array_layers: 1 };
        (data, desc)
    }

    #[test]
    fn nearest_sample_of_solid_image_returns_its_colour() {
        let (_backing, image) = solid_image(Format::R8G8B8A8_UNORM, Extent3D { width: 4, height: 4, depth: 1 }, [1.0, 0.0, 0.0, 1.0]);
        let sampler = SamplerDescriptor::default();
        let mut out = [0f32; 4];
        sample(&image, &sampler, 0.5, 0.5, 0.0, 0, &mut out);
        assert!((out[0] - 1.0).abs() < 1.0 / 255.0);
        assert!(out[1] < 1.0 / 255.0);
    }

    #[test]
    fn linear_sample_of_solid_image_returns_its_colour() {
        let (_backing, image) = solid_image(Format::R8G8B8A8_UNORM, Extent3D { width: 4, height: 4, depth: 1 }, [0.0, 1.0, 0.0, 1.0]);
        let sampler = SamplerDescriptor { mag_linear: true, min_linear: true, ..SamplerDescriptor::default() };
        let mut out = [0f32; 4];
        sample(&image, &sampler, 0.5, 0.5, 0.0, 0, &mut out);
        assert!((out[1] - 1.0).abs() < 1.0 / 255.0);
    }
}
