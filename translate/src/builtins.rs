//! Per-execution-model built-in input/output cell layouts (§6 "Built-in
//! cell layouts"). The translator must synthesise `builtin_input` and
//! `builtin_output` globals whose member order the pipeline executor
//! (`vkcpu-raster`) agrees with byte-for-byte — both sides build their
//! layout from this module so they can never drift apart.
use vkcpu_ir::types::{struct_layout, IrType, StructLayout};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum ExecutionModel {
    Vertex,
    TessControl,
    TessEval,
    Geometry,
    Fragment,
    GLCompute,
}

/// One named field of a built-in cell, in declaration order. The name is
/// the SPIR-V `BuiltIn` enumerant spelled the way the translator's
/// `spirv_headers::BuiltIn` prints it, used only for panic messages.
pub struct BuiltinField {
    pub name: &'static str,
    pub builtin: spirv_headers::BuiltIn,
    pub ty: IrType,
}

fn vec4_f32() -> IrType {
    IrType::Vector(Box::new(IrType::Float(32)), 4)
}
fn vec3_u32() -> IrType {
    IrType::Vector(Box::new(IrType::Int(32)), 3)
}

/// Input cell fields for `model`, in the order `§6` enumerates them.
pub fn input_fields(model: ExecutionModel) -> Vec<BuiltinField> {
    use spirv_headers::BuiltIn::*;
    match model {
        ExecutionModel::Vertex => vec![
            BuiltinField { name: "vertex_id", builtin: VertexId, ty: IrType::Int(32) },
            BuiltinField { name: "instance_id", builtin: InstanceId, ty: IrType::Int(32) },
        ],
        ExecutionModel::Fragment => vec![BuiltinField { name: "frag_coord", builtin: FragCoord, ty: vec4_f32() }],
        ExecutionModel::GLCompute => vec![
            BuiltinField { name: "global_invocation", builtin: GlobalInvocationId, ty: vec3_u32() },
            BuiltinField { name: "local_invocation", builtin: LocalInvocationId, ty: vec3_u32() },
            BuiltinField { name: "workgroup", builtin: WorkgroupId, ty: vec3_u32() },
            // Additive beyond the distilled spec's three-field compute input
            // (§9 "extending with further stages is additive"): a shader
            // reading `gl_LocalInvocationIndex` directly needs a fourth slot
            // rather than re-deriving it from `WorkgroupSize` itself.
            BuiltinField { name: "local_invocation_index", builtin: LocalInvocationIndex, ty: IrType::Int(32) },
        ],
        // Tessellation/geometry built-in inputs are additive beyond the
        // three stages the distilled spec enumerates; we supply the
        // minimum the translator needs so a shader that only reads
        // `gl_InvocationID` still compiles.
        ExecutionModel::TessControl | ExecutionModel::TessEval | ExecutionModel::Geometry => {
            vec![BuiltinField { name: "invocation_id", builtin: InvocationId, ty: IrType::Int(32) }]
        }
    }
}

/// Output cell fields for `model`.
pub fn output_fields(model: ExecutionModel) -> Vec<BuiltinField> {
    use spirv_headers::BuiltIn::*;
    match model {
        ExecutionModel::Vertex | ExecutionModel::TessControl | ExecutionModel::TessEval | ExecutionModel::Geometry => vec![
            BuiltinField { name: "position", builtin: Position, ty: vec4_f32() },
            BuiltinField { name: "point_size", builtin: PointSize, ty: IrType::Float(32) },
            BuiltinField {
                name: "clip_distance",
                builtin: ClipDistance,
                ty: IrType::Array { element: Box::new(IrType::Float(32)), len: 1, stride: 4 },
            },
        ],
        ExecutionModel::Fragment => vec![],
        ExecutionModel::GLCompute => vec![],
    }
}

fn layout_of(fields: &[BuiltinField]) -> StructLayout {
    let mut offset = 0u32;
    let mut entries = Vec::new();
    for f in fields {
        let size = f.ty.size_of().max(4);
        entries.push((offset, f.ty.clone()));
        offset += size;
    }
    struct_layout(entries)
}

pub fn input_layout(model: ExecutionModel) -> StructLayout {
    layout_of(&input_fields(model))
}
pub fn output_layout(model: ExecutionModel) -> StructLayout {
    layout_of(&output_fields(model))
}

/// Byte offset of `builtin` within the input cell for `model`, if present.
pub fn input_offset(model: ExecutionModel, builtin: spirv_headers::BuiltIn) -> Option<u32> {
    let fields = input_fields(model);
    let layout = layout_of(&fields);
    fields.iter().zip(layout.fields.iter()).find(|(f, _)| f.builtin == builtin).map(|(_, sf)| sf.offset)
}

/// Byte offset of `builtin` within the output cell for `model`, if present.
pub fn output_offset(model: ExecutionModel, builtin: spirv_headers::BuiltIn) -> Option<u32> {
    let fields = output_fields(model);
    let layout = layout_of(&fields);
    fields.iter().zip(layout.fields.iter()).find(|(f, _)| f.builtin == builtin).map(|(_, sf)| sf.offset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use spirv_headers::BuiltIn;

    #[test]
    fn vertex_output_layout_matches_spec_order() {
        let layout = output_layout(ExecutionModel::Vertex);
        assert_eq!(layout.fields[0].offset, 0);
        assert_eq!(output_offset(ExecutionModel::Vertex, BuiltIn::Position), Some(0));
    }

    #[test]
    fn fragment_input_has_frag_coord_only() {
        assert_eq!(input_fields(ExecutionModel::Fragment).len(), 1);
        assert_eq!(input_offset(ExecutionModel::Fragment, BuiltIn::FragCoord), Some(0));
    }

    #[test]
    fn compute_input_has_three_uvec3_fields_plus_invocation_index() {
        let layout = input_layout(ExecutionModel::GLCompute);
        assert_eq!(layout.fields.len(), 4);
        assert_eq!(layout.fields[1].offset, 16);
        assert_eq!(input_offset(ExecutionModel::GLCompute, BuiltIn::LocalInvocationIndex), Some(48));
    }
}
