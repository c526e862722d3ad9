//! Rasterizer and per-sample pipeline (§4.8 "C8", steps 7-10): triangle
//! scan conversion, fragment shading, and the depth/stencil/blend/write-mask
//! chain that lands a shaded fragment in its attachments.
//!
//! The fragment stage is the one part of a draw invoked once per covered
//! sample rather than once per vertex, so it is also the one part worth
//! spreading across more than one core: each worker in
//! [`Pipeline::fragment_hosts_mut`] is handed a disjoint set of scanlines
//! via `rayon`, and every attachment write a worker performs lands in a byte
//! range no other worker's rows ever touch.
use rayon::prelude::*;
use vkcpu_format::{codec, describe, Format, FormatInfo};
use vkcpu_jit::host::JitHost;
use vkcpu_translate::mangle;

use crate::assemble::{Line, Point, Primitive, Triangle, WindowVertex, MAX_VARYING_LOCATIONS};
use crate::pipeline::{ColorBlendAttachmentState, ColorComponentFlags, DepthStencilState, Pipeline, Rect2D, StencilOpState};

/// One bound render target the rasterizer reads and writes directly; no
/// intermediate sample buffer, since multisampling beyond 1 sample is not
/// implemented (tracked as an Open Question resolution in the design
/// ledger) and every target is therefore exactly one sample per texel.
pub struct ColorAttachment<'a> {
    pub data: &'a mut [u8],
    pub format: Format,
    pub width: u32,
    pub height: u32,
}

pub struct DepthStencilAttachment<'a> {
    pub data: &'a mut [u8],
    pub format: Format,
    pub width: u32,
    pub height: u32,
}

/// Wraps a raw attachment base pointer so it can cross the `Send` bound
/// `rayon::par_iter_mut` requires. Safe only because callers partition rows
/// (`y % worker_count`) so two workers never address the same byte range —
/// see [`rasterize_triangle`].
#[derive(Copy, Clone)]
struct RacyPtr(*mut u8);
unsafe impl Send for RacyPtr {}
unsafe impl Sync for RacyPtr {}

fn edge(ax: f32, ay: f32, bx: f32, by: f32, px: f32, py: f32) -> f32 {
    (bx - ax) * (py - ay) - (by - ay) * (px - ax)
}

/// True for a "top" edge (horizontal, pointing in +x) or a "left" edge
/// (pointing in +y) of a triangle wound so its signed area is positive —
/// the standard top-left fill-convention test (§4.8 step 7), applied after
/// [`rasterize_triangle`] has normalised every triangle to that winding.
/// Pixel centers exactly on such an edge are covered; centers on any other
/// edge are not, so two triangles sharing an edge never both shade the
/// shared row of pixels.
fn is_top_left(ax: f32, ay: f32, bx: f32, by: f32) -> bool {
    (ay == by && bx > ax) || by > ay
}

fn depth_channel(format: Format) -> Option<vkcpu_format::ChannelLayout> {
    if format == Format::S8_UINT {
        None
    } else {
        Some(describe(format).channels.red)
    }
}

fn stencil_channel(format: Format) -> Option<vkcpu_format::ChannelLayout> {
    match format {
        Format::D24_UNORM_S8_UINT => Some(describe(format).channels.green),
        Format::S8_UINT => Some(describe(format).channels.red),
        _ => None,
    }
}

/// Byte range of texel `(x, y)` in a single-sample, single-mip, single-layer
/// attachment. Equivalent to `codec::texel_offset` at `mip = 0, layer = 0,
/// k = 0` but without needing the attachment's height (unused by that
/// formula at those parameters): render targets here never carry mips or
/// array layers, so the general addressing function is unneeded overhead.
fn texel_range(info: &FormatInfo, width: u32, x: u32, y: u32) -> std::ops::Range<usize> {
    let off = info.total_size as usize * (y as usize * width as usize + x as usize);
    off..off + info.total_size as usize
}

fn stencil_op_state<'a>(state: &'a DepthStencilState, front_facing: bool) -> &'a StencilOpState {
    if front_facing {
        &state.front
    } else {
        &state.back
    }
}

/// Invokes the fragment entry point once for a covered sample, writing
/// `FragCoord` and every populated varying into `host`'s globals first and
/// reading the shaded color outputs back out by location afterward (§4.8
/// step 8). Operates on a single `&mut JitHost` so the caller can run one
/// of these per `rayon` worker with no further synchronisation.
fn shade_fragment(
    host: &mut JitHost,
    entry: unsafe extern "C" fn(),
    frag_coord: [f32; 4],
    varyings: &[Option<[f32; 4]>; MAX_VARYING_LOCATIONS as usize],
) -> [Option<[f32; 4]>; MAX_VARYING_LOCATIONS as usize] {
    if let Some(ptr) = host.get_data_ptr("_builtin_input") {
        unsafe {
            let p = ptr as *mut f32;
            for (i, v) in frag_coord.iter().enumerate() {
                *p.add(i) = *v;
            }
        }
    }
    for loc in 0..MAX_VARYING_LOCATIONS {
        let Some(value) = varyings[loc as usize] else { continue };
        if let Some(ptr) = host.get_data_ptr(&mangle::input(&loc.to_string())) {
            unsafe {
                let p = ptr as *mut f32;
                for (i, v) in value.iter().enumerate() {
                    *p.add(i) = *v;
                }
            }
        }
    }
    if let Some(ptr) = host.get_data_ptr("_discard_flag") {
        unsafe { *(ptr as *mut i32) = 0 };
    }

    unsafe { entry() };

    // `OpKill` (`discard`) stores 1 into this cell and returns instead of
    // trapping; a killed sample contributes no attachment writes at all.
    let discarded = host.get_data_ptr("_discard_flag").map(|ptr| unsafe { *(ptr as *const i32) } != 0).unwrap_or(false);
    if discarded {
        return [None; MAX_VARYING_LOCATIONS as usize];
    }

    let mut outputs = [None; MAX_VARYING_LOCATIONS as usize];
    for loc in 0..MAX_VARYING_LOCATIONS {
        if let Some(ptr) = host.get_data_ptr(&mangle::output_at_location(loc)) {
            unsafe {
                let p = ptr as *const f32;
                outputs[loc as usize] = Some([*p, *p.add(1), *p.add(2), *p.add(3)]);
            }
        }
    }
    outputs
}

/// Reconstructs a `&mut [u8]` over exactly one texel's bytes from a raw
/// attachment base pointer. Safe to call concurrently from several threads
/// as long as every call site's `(x, y)` pair is disjoint from every other
/// in-flight call's — unlike slicing the whole attachment buffer per call
/// (which would claim overlapping exclusive access to bytes the slice never
/// touches), this only ever claims the bytes it actually reads or writes.
unsafe fn texel_slice(ptr: *mut u8, len: usize, info: &FormatInfo, width: u32, x: u32, y: u32) -> &mut [u8] {
    let range = texel_range(info, width, x, y);
    debug_assert!(range.end <= len);
    std::slice::from_raw_parts_mut(ptr.add(range.start), range.len())
}

#[allow(clippy::too_many_arguments)]
fn apply_color_attachment(texel: &mut [u8], info: &FormatInfo, shaded: [f32; 4], attachment_state: &ColorBlendAttachmentState, logic_op_enable: bool, logic_op: crate::pipeline::LogicOp) {
    let read_channel = |t: &[u8], ch: vkcpu_format::ChannelLayout| -> f32 { codec::get_channel_f32(info, t, ch) };
    let dst = [
        read_channel(texel, info.channels.red),
        read_channel(texel, info.channels.green),
        read_channel(texel, info.channels.blue),
        if info.channels.alpha.present() { read_channel(texel, info.channels.alpha) } else { 1.0 },
    ];

    let mut result = if attachment_state.blend_enable {
        let src_factor = attachment_state.src_color_blend_factor.resolve(shaded, dst);
        let dst_factor = attachment_state.dst_color_blend_factor.resolve(shaded, dst);
        let mut rgb = [0.0f32; 3];
        for i in 0..3 {
            rgb[i] = attachment_state.color_blend_op.apply(shaded[i] * src_factor[i], dst[i] * dst_factor[i]);
        }
        let src_a_factor = attachment_state.src_alpha_blend_factor.resolve(shaded, dst)[3];
        let dst_a_factor = attachment_state.dst_alpha_blend_factor.resolve(shaded, dst)[3];
        let a = attachment_state.alpha_blend_op.apply(shaded[3] * src_a_factor, dst[3] * dst_a_factor);
        [rgb[0], rgb[1], rgb[2], a]
    } else {
        shaded
    };

    if logic_op_enable && info.base_type == vkcpu_format::BaseType::UInt {
        let read_u = |t: &[u8], ch: vkcpu_format::ChannelLayout| codec::get_channel_u32(info, t, ch);
        let dst_u = [
            read_u(texel, info.channels.red),
            read_u(texel, info.channels.green),
            read_u(texel, info.channels.blue),
            if info.channels.alpha.present() { read_u(texel, info.channels.alpha) } else { 0 },
        ];
        let src_u = [shaded[0] as u32, shaded[1] as u32, shaded[2] as u32, shaded[3] as u32];
        let applied = std::array::from_fn::<u32, 4, _>(|i| logic_op.apply(src_u[i], dst_u[i]));
        result = [applied[0] as f32, applied[1] as f32, applied[2] as f32, applied[3] as f32];
    }

    let mask = attachment_state.color_write_mask;
    if mask.contains(ColorComponentFlags::R) {
        codec::set_channel_f32(info, texel, info.channels.red, result[0]);
    }
    if mask.contains(ColorComponentFlags::G) {
        codec::set_channel_f32(info, texel, info.channels.green, result[1]);
    }
    if mask.contains(ColorComponentFlags::B) {
        codec::set_channel_f32(info, texel, info.channels.blue, result[2]);
    }
    if mask.contains(ColorComponentFlags::A) && info.channels.alpha.present() {
        codec::set_channel_f32(info, texel, info.channels.alpha, result[3]);
    }
}

/// Runs the depth and stencil tests for one sample (§4.8 step 9) and, if the
/// fragment survives, updates the depth/stencil attachment per the relevant
/// `StencilOpState`. Returns whether the color write should proceed.
fn depth_stencil_test(texel: &mut [u8], info: &FormatInfo, format: Format, depth: f32, state: &DepthStencilState, front_facing: bool) -> bool {
    let ops = stencil_op_state(state, front_facing);

    let stencil_ch = stencil_channel(format);
    let current_stencil = stencil_ch.map(|ch| codec::get_channel_u32(info, texel, ch) as u8).unwrap_or(0);
    let stencil_passes = if state.stencil_test_enable && stencil_ch.is_some() {
        ops.compare_op.evaluate((current_stencil & ops.compare_mask as u8) as f32, (ops.reference & ops.compare_mask as u8) as f32)
    } else {
        true
    };

    let depth_ch = depth_channel(format);
    let current_depth = depth_ch.map(|ch| codec::get_channel_f32(info, texel, ch)).unwrap_or(1.0);
    let depth_passes = if state.depth_test_enable && depth_ch.is_some() { state.depth_compare_op.evaluate(depth, current_depth) } else { true };

    let bounds_pass = !state.depth_bounds_test_enable || (depth >= state.min_depth_bounds && depth <= state.max_depth_bounds);

    let passes = stencil_passes && depth_passes && bounds_pass;

    if state.stencil_test_enable && stencil_ch.is_some() {
        let op = if !stencil_passes {
            ops.fail_op
        } else if !depth_passes {
            ops.depth_fail_op
        } else {
            ops.pass_op
        };
        let new_value = op.apply(current_stencil, ops.reference as u8) & ops.write_mask as u8;
        let kept = current_stencil & !(ops.write_mask as u8);
        codec::set_channel_u32(info, texel, stencil_ch.unwrap(), (kept | new_value) as u32);
    }

    if passes && depth_passes && state.depth_write_enable {
        if let Some(ch) = depth_ch {
            codec::set_channel_f32(info, texel, ch, depth);
        }
    }

    passes
}

#[allow(clippy::too_many_arguments)]
fn barycentric_weights(v0: &WindowVertex, v1: &WindowVertex, v2: &WindowVertex, px: f32, py: f32, area: f32) -> Option<(f32, f32, f32)> {
    let w0 = edge(v1.x, v1.y, v2.x, v2.y, px, py);
    let w1 = edge(v2.x, v2.y, v0.x, v0.y, px, py);
    let w2 = edge(v0.x, v0.y, v1.x, v1.y, px, py);

    let pass = |w: f32, top_left: bool| if top_left { w >= 0.0 } else { w > 0.0 };

    if pass(w0, is_top_left(v1.x, v1.y, v2.x, v2.y)) && pass(w1, is_top_left(v2.x, v2.y, v0.x, v0.y)) && pass(w2, is_top_left(v0.x, v0.y, v1.x, v1.y)) {
        Some((w0 / area, w1 / area, w2 / area))
    } else {
        None
    }
}

/// Rasterizes one triangle into `color_targets`/`depth_stencil_target`,
/// running steps 7-10 for every covered sample. The triangle's bounding box
/// is clamped to `scissor` first (§4.8 step 7); rows within that box are
/// split round-robin across the pipeline's fragment worker gang, each
/// worker driving its own `JitHost` so no two threads ever touch the same
/// compiled module concurrently.
#[allow(clippy::too_many_arguments)]
pub fn rasterize_triangle(
    pipeline: &mut Pipeline,
    tri: &Triangle,
    scissor: Rect2D,
    front_face: crate::pipeline::FrontFace,
    color_targets: &mut [ColorAttachment],
    depth_stencil_target: Option<&mut DepthStencilAttachment>,
    to_window: impl Fn(&crate::assemble::VertexOutput) -> WindowVertex,
) {
    let mut verts = [to_window(&tri.v[0]), to_window(&tri.v[1]), to_window(&tri.v[2])];
    let mut area = edge(verts[0].x, verts[0].y, verts[1].x, verts[1].y, verts[2].x, verts[2].y);
    if area == 0.0 {
        return;
    }
    // `area < 0` is counter-clockwise in this y-down window space (matching
    // `assemble::is_culled`'s convention). Recorded before the winding
    // normalisation below so the stencil op state's front/back selection
    // still reflects the triangle's original orientation.
    let is_ccw = area < 0.0;
    let front_facing = matches!(front_face, crate::pipeline::FrontFace::CounterClockwise) == is_ccw;
    if area < 0.0 {
        verts.swap(1, 2);
        area = -area;
    }

    let min_x = verts.iter().map(|v| v.x).fold(f32::INFINITY, f32::min).floor().max(scissor.x as f32) as i64;
    let max_x = verts.iter().map(|v| v.x).fold(f32::NEG_INFINITY, f32::max).ceil().min((scissor.x + scissor.width as i32) as f32) as i64;
    let min_y = verts.iter().map(|v| v.y).fold(f32::INFINITY, f32::min).floor().max(scissor.y as f32) as i64;
    let max_y = verts.iter().map(|v| v.y).fold(f32::NEG_INFINITY, f32::max).ceil().min((scissor.y + scissor.height as i32) as f32) as i64;
    if min_x >= max_x || min_y >= max_y {
        return;
    }

    let color_ptrs: Vec<RacyPtr> = color_targets.iter_mut().map(|c| RacyPtr(c.data.as_mut_ptr())).collect();
    let color_formats: Vec<(Format, u32, u32)> = color_targets.iter().map(|c| (c.format, c.width, c.height)).collect();
    let color_len: Vec<usize> = color_targets.iter().map(|c| c.data.len()).collect();
    let color_blend = pipeline.color_blend.clone();
    let depth_stencil_state = pipeline.depth_stencil;

    let ds_ptr = depth_stencil_target.as_ref().map(|d| RacyPtr(d.data.as_mut_ptr()));
    let ds_meta = depth_stencil_target.as_ref().map(|d| (d.format, d.width, d.height, d.data.len()));

    let num_workers = pipeline.fragment_worker_count();
    let entry_name = match pipeline.fragment_entry_name() {
        Some(name) => name.to_string(),
        None => return,
    };

    pipeline.fragment_hosts_mut().par_iter_mut().enumerate().for_each(|(worker, host)| {
        // Each gang member is its own independent JIT compilation, so its
        // entry point lives at its own address — resolved per worker rather
        // than reusing one host's pointer for every thread.
        let Some(raw) = host.get_optional_ptr(&entry_name) else { return };
        let entry: unsafe extern "C" fn() = unsafe { std::mem::transmute::<*const u8, unsafe extern "C" fn()>(raw) };
        for y in (min_y..max_y).skip(worker).step_by(num_workers) {
            for x in min_x..max_x {
                let px = x as f32 + 0.5;
                let py = y as f32 + 0.5;
                let Some((l0, l1, l2)) = barycentric_weights(&verts[0], &verts[1], &verts[2], px, py, area) else { continue };

                let persp = l0 * verts[0].inv_w + l1 * verts[1].inv_w + l2 * verts[2].inv_w;
                let pc0 = l0 * verts[0].inv_w / persp;
                let pc1 = l1 * verts[1].inv_w / persp;
                let pc2 = l2 * verts[2].inv_w / persp;
                let depth = l0 * verts[0].depth + l1 * verts[1].depth + l2 * verts[2].depth;

                if depth_stencil_state.depth_test_enable || depth_stencil_state.stencil_test_enable {
                    if let (Some(ds), Some((fmt, w, _h, len))) = (ds_ptr, ds_meta) {
                        let info = describe(fmt);
                        let texel = unsafe { texel_slice(ds.0, len, info, w, x as u32, y as u32) };
                        if !depth_stencil_test(texel, info, fmt, depth, &depth_stencil_state, front_facing) {
                            continue;
                        }
                    }
                }

                let mut varyings = [None; MAX_VARYING_LOCATIONS as usize];
                for loc in 0..MAX_VARYING_LOCATIONS as usize {
                    varyings[loc] = match (verts[0].varyings[loc], verts[1].varyings[loc], verts[2].varyings[loc]) {
                        (Some(a), Some(b), Some(c)) => Some(std::array::from_fn(|i| a[i] * pc0 + b[i] * pc1 + c[i] * pc2)),
                        _ => None,
                    };
                }
                let frag_coord = [px, py, depth, persp];
                let outputs = shade_fragment(host, entry, frag_coord, &varyings);

                for (i, (fmt, w, _h)) in color_formats.iter().enumerate() {
                    let Some(shaded) = outputs[i] else { continue };
                    let attachment_state = color_blend.attachments.get(i).cloned().unwrap_or_default();
                    let info = describe(*fmt);
                    let texel = unsafe { texel_slice(color_ptrs[i].0, color_len[i], info, *w, x as u32, y as u32) };
                    apply_color_attachment(texel, info, shaded, &attachment_state, color_blend.logic_op_enable, color_blend.logic_op);
                }
            }
        }
    });
}

/// Writes one covered sample's shaded color into every color attachment,
/// sharing the per-sample tail (depth/stencil test, shade, blend/write-mask)
/// between [`rasterize_point`] and [`rasterize_line`] — neither needs the
/// triangle path's barycentric setup or worker-gang split, since a point or
/// line covers far fewer samples than a filled triangle.
#[allow(clippy::too_many_arguments)]
fn shade_and_write_sample(
    host: &mut JitHost,
    entry: unsafe extern "C" fn(),
    x: i64,
    y: i64,
    depth: f32,
    persp: f32,
    varyings: &[Option<[f32; 4]>; MAX_VARYING_LOCATIONS as usize],
    depth_stencil_state: &DepthStencilState,
    mut depth_stencil_target: Option<&mut DepthStencilAttachment>,
    color_targets: &mut [ColorAttachment],
    color_blend: &crate::pipeline::ColorBlendState,
) {
    if depth_stencil_state.depth_test_enable || depth_stencil_state.stencil_test_enable {
        if let Some(ds) = depth_stencil_target.as_deref_mut() {
            let info = describe(ds.format);
            let texel = unsafe { texel_slice(ds.data.as_mut_ptr(), ds.data.len(), info, ds.width, x as u32, y as u32) };
            if !depth_stencil_test(texel, info, ds.format, depth, depth_stencil_state, true) {
                return;
            }
        }
    }

    let frag_coord = [x as f32 + 0.5, y as f32 + 0.5, depth, persp];
    let outputs = shade_fragment(host, entry, frag_coord, varyings);

    for (i, target) in color_targets.iter_mut().enumerate() {
        let Some(shaded) = outputs[i] else { continue };
        let attachment_state = color_blend.attachments.get(i).cloned().unwrap_or_default();
        let info = describe(target.format);
        let texel = unsafe { texel_slice(target.data.as_mut_ptr(), target.data.len(), info, target.width, x as u32, y as u32) };
        apply_color_attachment(texel, info, shaded, &attachment_state, color_blend.logic_op_enable, color_blend.logic_op);
    }
}

/// Rasterizes a single point primitive (§4.8 "Line and point rasterization
/// follow the same skeleton with width rules"): its footprint is a
/// `round(point_size)`-pixel square centered on the vertex, every covered
/// texel shaded with the vertex's own (unchanging) varyings. Point sprite
/// coordinates (`PointCoord`) are not modelled; every covered sample sees
/// the same `FragCoord`-derived inputs.
pub fn rasterize_point(
    pipeline: &mut Pipeline,
    point: &Point,
    scissor: Rect2D,
    color_targets: &mut [ColorAttachment],
    depth_stencil_target: Option<&mut DepthStencilAttachment>,
    to_window: &impl Fn(&crate::assemble::VertexOutput) -> WindowVertex,
) {
    let w = to_window(&point.v);
    let size = w.point_size.max(1.0).round().max(1.0) as i64;
    let half_lo = size / 2;
    let half_hi = size - half_lo;
    let cx = w.x.floor() as i64;
    let cy = w.y.floor() as i64;
    let min_x = (cx - half_lo).max(scissor.x as i64);
    let max_x = (cx + half_hi).min((scissor.x + scissor.width as i32) as i64);
    let min_y = (cy - half_lo).max(scissor.y as i64);
    let max_y = (cy + half_hi).min((scissor.y + scissor.height as i32) as i64);
    if min_x >= max_x || min_y >= max_y {
        return;
    }

    let depth_stencil_state = pipeline.depth_stencil;
    let color_blend = pipeline.color_blend.clone();
    let entry_name = match pipeline.fragment_entry_name() {
        Some(name) => name.to_string(),
        None => return,
    };
    let Some(host) = pipeline.fragment_hosts_mut().first_mut() else { return };
    let Some(raw) = host.get_optional_ptr(&entry_name) else { return };
    let entry: unsafe extern "C" fn() = unsafe { std::mem::transmute::<*const u8, unsafe extern "C" fn()>(raw) };

    let mut depth_stencil_target = depth_stencil_target;
    for y in min_y..max_y {
        for x in min_x..max_x {
            shade_and_write_sample(
                host,
                entry,
                x,
                y,
                w.depth,
                w.inv_w,
                &w.varyings,
                &depth_stencil_state,
                depth_stencil_target.as_deref_mut(),
                color_targets,
                &color_blend,
            );
        }
    }
}

/// Rasterizes a single line primitive by walking its dominant axis one
/// texel at a time (a digital differential analyzer), perspective-correctly
/// interpolating depth and varyings between the two endpoints at each step
/// (§4.8). Line width beyond the always-covered one-texel-wide core is not
/// modelled.
pub fn rasterize_line(
    pipeline: &mut Pipeline,
    line: &Line,
    scissor: Rect2D,
    color_targets: &mut [ColorAttachment],
    depth_stencil_target: Option<&mut DepthStencilAttachment>,
    to_window: &impl Fn(&crate::assemble::VertexOutput) -> WindowVertex,
) {
    let w0 = to_window(&line.v[0]);
    let w1 = to_window(&line.v[1]);
    let dx = w1.x - w0.x;
    let dy = w1.y - w0.y;
    let steps = dx.abs().max(dy.abs()).ceil().max(1.0) as i64;

    let depth_stencil_state = pipeline.depth_stencil;
    let color_blend = pipeline.color_blend.clone();
    let entry_name = match pipeline.fragment_entry_name() {
        Some(name) => name.to_string(),
        None => return,
    };
    let Some(host) = pipeline.fragment_hosts_mut().first_mut() else { return };
    let Some(raw) = host.get_optional_ptr(&entry_name) else { return };
    let entry: unsafe extern "C" fn() = unsafe { std::mem::transmute::<*const u8, unsafe extern "C" fn()>(raw) };

    let mut depth_stencil_target = depth_stencil_target;
    for i in 0..=steps {
        let t = i as f32 / steps as f32;
        let x = (w0.x + dx * t).floor() as i64;
        let y = (w0.y + dy * t).floor() as i64;
        if x < scissor.x as i64 || x >= (scissor.x + scissor.width as i32) as i64 || y < scissor.y as i64 || y >= (scissor.y + scissor.height as i32) as i64 {
            continue;
        }

        let persp = (1.0 - t) * w0.inv_w + t * w1.inv_w;
        let pc0 = (1.0 - t) * w0.inv_w / persp;
        let pc1 = t * w1.inv_w / persp;
        let depth = (1.0 - t) * w0.depth + t * w1.depth;
        let mut varyings = [None; MAX_VARYING_LOCATIONS as usize];
        for loc in 0..MAX_VARYING_LOCATIONS as usize {
            varyings[loc] = match (w0.varyings[loc], w1.varyings[loc]) {
                (Some(a), Some(b)) => Some(std::array::from_fn(|c| a[c] * pc0 + b[c] * pc1)),
                _ => None,
            };
        }

        shade_and_write_sample(host, entry, x, y, depth, persp, &varyings, &depth_stencil_state, depth_stencil_target.as_deref_mut(), color_targets, &color_blend);
    }
}

/// Rasterizes every primitive a draw assembled: triangles through the
/// parallel scan-converter, points and lines through their own
/// single-worker paths (§4.8 step 7 applies to all three).
pub fn rasterize_primitives(
    pipeline: &mut Pipeline,
    primitives: &[Primitive],
    scissor: Rect2D,
    front_face: crate::pipeline::FrontFace,
    color_targets: &mut [ColorAttachment],
    mut depth_stencil_target: Option<&mut DepthStencilAttachment>,
    to_window: impl Fn(&crate::assemble::VertexOutput) -> WindowVertex,
) {
    for prim in primitives {
        match prim {
            Primitive::Triangle(tri) => rasterize_triangle(pipeline, tri, scissor, front_face, color_targets, depth_stencil_target.as_deref_mut(), &to_window),
            Primitive::Point(point) => rasterize_point(pipeline, point, scissor, color_targets, depth_stencil_target.as_deref_mut(), &to_window),
            Primitive::Line(line) => rasterize_line(pipeline, line, scissor, color_targets, depth_stencil_target.as_deref_mut(), &to_window),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn top_left_edge_detects_horizontal_and_descending_edges() {
        assert!(is_top_left(0.0, 0.0, 1.0, 0.0)); // horizontal, pointing right: a top edge
        assert!(is_top_left(0.0, 0.0, 0.0, 1.0)); // vertical, pointing down: a left edge
        assert!(!is_top_left(1.0, 0.0, 0.0, 0.0)); // horizontal, pointing left
        assert!(!is_top_left(0.0, 1.0, 0.0, 0.0)); // vertical, pointing up
    }

    #[test]
    fn barycentric_weights_recover_vertex_values_at_corners() {
        let v0 = corner(0.0, 0.0, 0.0);
        let v1 = corner(4.0, 0.0, 1.0);
        let v2 = corner(0.0, 4.0, 0.5);
        let area = edge(v0.x, v0.y, v1.x, v1.y, v2.x, v2.y);
        let (l0, l1, l2) = barycentric_weights(&v0, &v1, &v2, 0.0 + 0.001, 0.0 + 0.001, area).unwrap();
        assert!(l0 > 0.98);
        assert!(l1 < 0.02 && l2 < 0.02);
    }

    fn corner(x: f32, y: f32, depth: f32) -> WindowVertex {
        WindowVertex { x, y, depth, inv_w: 1.0, point_size: 1.0, varyings: [None; MAX_VARYING_LOCATIONS as usize] }
    }

    #[test]
    fn depth_channel_is_none_for_stencil_only_format() {
        assert!(depth_channel(Format::S8_UINT).is_none());
        assert!(stencil_channel(Format::S8_UINT).is_some());
    }

    #[test]
    fn combined_depth_stencil_format_splits_channels() {
        assert_eq!(depth_channel(Format::D24_UNORM_S8_UINT).unwrap().bits, 24);
        assert_eq!(stencil_channel(Format::D24_UNORM_S8_UINT).unwrap().bits, 8);
    }

    #[test]
    fn apply_color_attachment_writes_unblended_color_when_blend_disabled() {
        let info = describe(Format::R8G8B8A8_UNORM);
        let mut texel = [0u8; 4];
        let state = ColorBlendAttachmentState::default();
        apply_color_attachment(&mut texel, info, [1.0, 0.0, 0.0, 1.0], &state, false, crate::pipeline::LogicOp::Copy);
        assert_eq!(texel, [255, 0, 0, 255]);
    }

    #[test]
    fn depth_test_rejects_fragment_behind_existing_depth() {
        let info = describe(Format::D32_SFLOAT);
        let mut texel = [0u8; 4];
        codec::set_channel_f32(info, &mut texel, info.channels.red, 0.2);
        let mut state = DepthStencilState::default();
        state.depth_test_enable = true;
        state.depth_compare_op = crate::pipeline::CompareOp::Less;
        assert!(!depth_stencil_test(&mut texel, info, Format::D32_SFLOAT, 0.5, &state, true));
        assert!(depth_stencil_test(&mut texel, info, Format::D32_SFLOAT, 0.1, &state, true));
    }
}
