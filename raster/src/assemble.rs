//! Assembler stage (§4.8 "C8", steps 1-6): vertex fetch through culling.
//! Everything from rasterization onward lives in [`crate::raster`].
//!
//! Vertex-to-fragment varyings are carried as a fixed 4-float slot per
//! `Location`, matching the size floor `vkcpu_translate::globals` reserves
//! for every `Input`/`Output` cell — a generic rasterizer has no other way
//! to know a varying's real SPIR-V type without re-threading the
//! translator's type tables through the pipeline object, and vec4 is the
//! common case for shader interpolants.
use smallvec::SmallVec;
use vkcpu_format::{codec, describe, Format};
use vkcpu_translate::builtins::{self, ExecutionModel};
use vkcpu_translate::mangle;

use crate::pipeline::{Pipeline, PrimitiveTopology, ShaderStage, VertexInputBinding, VertexInputRate, VertexInputState, Viewport};

pub const MAX_VARYING_LOCATIONS: u32 = 16;

#[derive(Clone)]
pub struct VertexOutput {
    pub clip_position: [f32; 4],
    pub point_size: f32,
    pub varyings: [Option<[f32; 4]>; MAX_VARYING_LOCATIONS as usize],
}

impl VertexOutput {
    fn zero() -> Self {
        VertexOutput { clip_position: [0.0; 4], point_size: 1.0, varyings: [None; MAX_VARYING_LOCATIONS as usize] }
    }
}

/// A vertex after the perspective divide and viewport transform: window-space
/// `xy`, `[0,1]`-range depth, and the varyings carried through unchanged.
#[derive(Clone)]
pub struct WindowVertex {
    pub x: f32,
    pub y: f32,
    pub depth: f32,
    pub inv_w: f32,
    pub point_size: f32,
    pub varyings: [Option<[f32; 4]>; MAX_VARYING_LOCATIONS as usize],
}

pub struct DrawParams {
    pub vertex_count: u32,
    pub instance_count: u32,
    pub first_vertex: u32,
    pub first_instance: u32,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum IndexType {
    Uint16,
    Uint32,
}

pub struct IndexBuffer<'a> {
    pub data: &'a [u8],
    pub index_type: IndexType,
}

fn fetch_index(ib: &IndexBuffer, i: u32) -> u32 {
    match ib.index_type {
        IndexType::Uint16 => {
            let off = i as usize * 2;
            u16::from_le_bytes([ib.data[off], ib.data[off + 1]]) as u32
        }
        IndexType::Uint32 => {
            let off = i as usize * 4;
            u32::from_le_bytes([ib.data[off], ib.data[off + 1], ib.data[off + 2], ib.data[off + 3]])
        }
    }
}

/// Step 1: build the `(vertex_id, instance_id)` pairs a draw invokes the
/// vertex stage for, honouring first-vertex/first-instance and an optional
/// index buffer (§4.8 step 1).
pub fn vertex_instance_pairs(params: &DrawParams, indices: Option<&IndexBuffer>, primitive_restart_enable: bool, restart_index: u32) -> Vec<(u32, u32)> {
    let mut pairs = Vec::with_capacity((params.vertex_count as u64 * params.instance_count as u64) as usize);
    for instance in 0..params.instance_count {
        for v in 0..params.vertex_count {
            let raw_index = indices.map(|ib| fetch_index(ib, v));
            if primitive_restart_enable {
                if let Some(raw) = raw_index {
                    if raw == restart_index {
                        continue;
                    }
                }
            }
            let vertex_id = match raw_index {
                Some(raw) => raw + params.first_vertex,
                None => params.first_vertex + v,
            };
            pairs.push((vertex_id, params.first_instance + instance));
        }
    }
    pairs
}

/// Decodes one vertex attribute out of its bound vertex buffer via the pixel
/// codec's channel-read path — a vertex attribute fetch is structurally the
/// same operation as a texel channel decode (a format-described byte blob,
/// read at a computed offset), so the codec is reused rather than
/// duplicated. Missing green/blue channels read as 0; a missing alpha
/// channel reads as 1, matching how a 3-channel vertex format like
/// `R32G32B32_SFLOAT` is understood to expand to `vec4(r, g, b, 1)`.
pub fn fetch_attribute(format: Format, binding: &VertexInputBinding, buffer: &[u8], offset: u32, vertex_id: u32, instance_id: u32, instance_divisor: u32) -> [f32; 4] {
    let index = match binding.input_rate {
        VertexInputRate::Vertex => vertex_id,
        VertexInputRate::Instance => instance_id / instance_divisor.max(1),
    };
    let info = describe(format);
    let base = index as u64 * binding.stride as u64 + offset as u64;
    let texel = &buffer[base as usize..base as usize + info.total_size as usize];
    let alpha = if info.channels.alpha.present() { codec::get_channel_f32(info, texel, info.channels.alpha) } else { 1.0 };
    [
        codec::get_channel_f32(info, texel, info.channels.red),
        codec::get_channel_f32(info, texel, info.channels.green),
        codec::get_channel_f32(info, texel, info.channels.blue),
        alpha,
    ]
}

/// Step 2: runs the vertex entry point once per `(vertex_id, instance_id)`
/// pair, writing `builtin_input`, zeroing `builtin_output`, invoking the
/// entry point, then copying `builtin_output` and every populated varying
/// location back out (§4.8 step 2).
pub fn run_vertex_stage(
    pipeline: &mut Pipeline,
    pairs: &[(u32, u32)],
    vertex_input: &VertexInputState,
    vertex_buffers: &[&[u8]],
) -> Vec<VertexOutput> {
    let mut outputs = Vec::with_capacity(pairs.len());
    let input_layout = builtins::input_layout(ExecutionModel::Vertex);
    debug_assert_eq!(input_layout.fields.len(), 2, "vertex builtin input is {vertex_id, instance_id}");

    for &(vertex_id, instance_id) in pairs {
        if let Some(ptr) = pipeline.builtin_input_ptr(ShaderStage::Vertex) {
            unsafe {
                let words = ptr as *mut u32;
                *words = vertex_id;
                *words.add(1) = instance_id;
            }
        }
        if let Some(ptr) = pipeline.builtin_output_ptr(ShaderStage::Vertex) {
            unsafe { std::ptr::write_bytes(ptr, 0, builtins::output_layout(ExecutionModel::Vertex).size as usize) };
        }

        for attr in &vertex_input.attributes {
            let binding = vertex_input.bindings.iter().find(|b| b.binding == attr.binding).expect("attribute references unknown binding");
            let buffer = vertex_buffers[binding.binding as usize];
            let value = fetch_attribute(attr.format, binding, buffer, attr.offset, vertex_id, instance_id, 1);
            if let Some(ptr) = pipeline.global_ptr(ShaderStage::Vertex, &mangle::input(&attr.location.to_string())) {
                unsafe {
                    let words = ptr as *mut f32;
                    for (i, v) in value.iter().enumerate() {
                        *words.add(i) = *v;
                    }
                }
            }
        }

        let entry = pipeline.entry(ShaderStage::Vertex).expect("pipeline has no vertex stage");
        unsafe { entry() };

        let mut out = VertexOutput::zero();
        if let Some(ptr) = pipeline.builtin_output_ptr(ShaderStage::Vertex) {
            unsafe {
                let bytes = ptr;
                if let Some(off) = builtins::output_offset(ExecutionModel::Vertex, spirv_headers::BuiltIn::Position) {
                    let p = bytes.add(off as usize) as *const f32;
                    out.clip_position = [*p, *p.add(1), *p.add(2), *p.add(3)];
                }
                if let Some(off) = builtins::output_offset(ExecutionModel::Vertex, spirv_headers::BuiltIn::PointSize) {
                    out.point_size = *(bytes.add(off as usize) as *const f32);
                }
            }
        }
        for loc in 0..MAX_VARYING_LOCATIONS {
            if let Some(ptr) = pipeline.global_ptr(ShaderStage::Vertex, &mangle::output_at_location(loc)) {
                unsafe {
                    let p = ptr as *const f32;
                    out.varyings[loc as usize] = Some([*p, *p.add(1), *p.add(2), *p.add(3)]);
                }
            }
        }
        outputs.push(out);
    }
    outputs
}

pub struct Triangle {
    pub v: [VertexOutput; 3],
}
pub struct Line {
    pub v: [VertexOutput; 2],
}
pub struct Point {
    pub v: VertexOutput,
}

pub enum Primitive {
    Triangle(Triangle),
    Line(Line),
    Point(Point),
}

/// Step 3: groups shaded vertices into primitives per the bound topology
/// (§4.8 step 3). Primitive restart has already removed the relevant
/// indices in [`vertex_instance_pairs`], so here the vertex list is simply
/// contiguous per-primitive.
pub fn assemble_primitives(topology: PrimitiveTopology, vertices: Vec<VertexOutput>) -> Vec<Primitive> {
    let mut out = Vec::new();
    match topology {
        PrimitiveTopology::PointList => {
            for v in vertices {
                out.push(Primitive::Point(Point { v }));
            }
        }
        PrimitiveTopology::LineList => {
            let mut it = vertices.into_iter();
            while let (Some(a), Some(b)) = (it.next(), it.next()) {
                out.push(Primitive::Line(Line { v: [a, b] }));
            }
        }
        PrimitiveTopology::LineStrip => {
            for w in vertices.windows(2) {
                out.push(Primitive::Line(Line { v: [w[0].clone(), w[1].clone()] }));
            }
        }
        PrimitiveTopology::TriangleList => {
            let mut it = vertices.into_iter();
            while let (Some(a), Some(b), Some(c)) = (it.next(), it.next(), it.next()) {
                out.push(Primitive::Triangle(Triangle { v: [a, b, c] }));
            }
        }
        PrimitiveTopology::TriangleStrip => {
            for (i, w) in vertices.windows(3).enumerate() {
                let tri = if i % 2 == 0 { [w[0].clone(), w[1].clone(), w[2].clone()] } else { [w[1].clone(), w[0].clone(), w[2].clone()] };
                out.push(Primitive::Triangle(Triangle { v: tri }));
            }
        }
        PrimitiveTopology::TriangleFan => {
            if !vertices.is_empty() {
                let pivot = vertices[0].clone();
                for w in vertices[1..].windows(2) {
                    out.push(Primitive::Triangle(Triangle { v: [pivot.clone(), w[0].clone(), w[1].clone()] }));
                }
            }
        }
    }
    out
}

fn lerp_vertex(a: &VertexOutput, b: &VertexOutput, t: f32) -> VertexOutput {
    let lerp4 = |x: [f32; 4], y: [f32; 4]| -> [f32; 4] { std::array::from_fn(|i| x[i] + (y[i] - x[i]) * t) };
    let mut out = VertexOutput::zero();
    out.clip_position = lerp4(a.clip_position, b.clip_position);
    out.point_size = a.point_size + (b.point_size - a.point_size) * t;
    for i in 0..MAX_VARYING_LOCATIONS as usize {
        out.varyings[i] = match (a.varyings[i], b.varyings[i]) {
            (Some(x), Some(y)) => Some(lerp4(x, y)),
            _ => None,
        };
    }
    out
}

/// Step 4: homogeneous clip against the near plane only (`w >= epsilon`).
/// Clipping a triangle by one plane of the canonical volume yields a convex
/// polygon of at most four vertices — "up to two replacement triangles"
/// (§4.8 step 4) exactly. The other five planes of the clip volume are left
/// to the rasterizer's own window-space scissor/viewport bound check, which
/// clips x/y/z without ever risking a divide-by-zero the way a negative-`w`
/// vertex would.
pub fn clip_near(tri: Triangle) -> SmallVec<[Triangle; 2]> {
    const EPS: f32 = 1e-5;
    let verts = [tri.v[0].clone(), tri.v[1].clone(), tri.v[2].clone()];
    let inside = |v: &VertexOutput| v.clip_position[3] >= EPS;

    let mut poly: SmallVec<[VertexOutput; 4]> = SmallVec::new();
    for i in 0..3 {
        let cur = &verts[i];
        let next = &verts[(i + 1) % 3];
        let cur_in = inside(cur);
        if cur_in {
            poly.push(cur.clone());
        }
        if cur_in != inside(next) {
            let t = (EPS - cur.clip_position[3]) / (next.clip_position[3] - cur.clip_position[3]);
            poly.push(lerp_vertex(cur, next, t));
        }
    }

    let mut out = SmallVec::new();
    for i in 1..poly.len().saturating_sub(1) {
        out.push(Triangle { v: [poly[0].clone(), poly[i].clone(), poly[i + 1].clone()] });
    }
    out
}

fn select_viewport<'a>(viewports: &'a [Viewport], index: usize) -> &'a Viewport {
    viewports.get(index).unwrap_or(&viewports[0])
}

/// Step 5: perspective divide and viewport transform (§4.8 step 5). Depth
/// follows Vulkan's native `[0,1]` clip-space convention directly — no
/// remapping from a `[-1,1]` OpenGL-style volume is applied.
pub fn to_window(v: &VertexOutput, viewports: &[Viewport], viewport_index: usize) -> WindowVertex {
    let viewport = select_viewport(viewports, viewport_index);
    let inv_w = 1.0 / v.clip_position[3];
    let ndc_x = v.clip_position[0] * inv_w;
    let ndc_y = v.clip_position[1] * inv_w;
    let ndc_z = v.clip_position[2] * inv_w;
    WindowVertex {
        x: viewport.x + (ndc_x * 0.5 + 0.5) * viewport.width,
        y: viewport.y + (ndc_y * 0.5 + 0.5) * viewport.height,
        depth: viewport.min_depth + ndc_z * (viewport.max_depth - viewport.min_depth),
        inv_w,
        point_size: v.point_size,
        varyings: v.varyings,
    }
}

/// Step 6: front-face and cull-mode test, in window space (CW/CCW is
/// determined by the signed area of the projected triangle; a positive
/// signed area is counter-clockwise in a y-down window coordinate system).
pub fn is_culled(tri: &[WindowVertex; 3], front_face: crate::pipeline::FrontFace, cull_mode: crate::pipeline::CullMode) -> bool {
    use crate::pipeline::{CullMode, FrontFace};
    if cull_mode == CullMode::NONE {
        return false;
    }
    let area = (tri[1].x - tri[0].x) * (tri[2].y - tri[0].y) - (tri[2].x - tri[0].x) * (tri[1].y - tri[0].y);
    let is_ccw = area < 0.0; // y grows downward in window space
    let is_front = match front_face {
        FrontFace::CounterClockwise => is_ccw,
        FrontFace::Clockwise => !is_ccw,
    };
    match (is_front, cull_mode) {
        (true, m) => m.contains(CullMode::FRONT),
        (false, m) => m.contains(CullMode::BACK),
    }
}
