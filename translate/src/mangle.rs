//! Name mangling shared between the translator and the resource binder
//! (`vkcpu-core`), per §6: the two sides must agree on exactly these
//! strings or a compiled module's externs silently fail to resolve
//! against the runtime descriptor bindings.
use vkcpu_ir::types::IrType;

pub fn input(name: &str) -> String {
    format!("_input_{}", name)
}
pub fn output(name: &str) -> String {
    format!("_output_{}", name)
}
pub fn output_at_location(location: u32) -> String {
    format!("_output_@location{}", location)
}
pub fn uniform(name: &str) -> String {
    format!("_uniform_{}", name)
}
pub fn uniform_constant(name: &str) -> String {
    format!("_uniformc_{}", name)
}
pub fn buffer(name: &str) -> String {
    format!("_buffer_{}", name)
}
pub fn push_constant(name: &str) -> String {
    format!("_pc_{}", name)
}

/// A runtime intrinsic's mangled name: `@Name.T0.T1...` where each operand
/// type encodes scalar kind, bit width, and lane count (§4.4 extension
/// instructions / §4.6 runtime intrinsics — both sides must agree on this
/// exact scheme).
pub fn intrinsic(op_name: &str, operand_types: &[&IrType]) -> String {
    let mut s = format!("@{}", op_name);
    for ty in operand_types {
        s.push('.');
        s.push_str(&type_tag(ty));
    }
    s
}

/// Public entry point for callers (image sample/fetch helper naming) that
/// need a single type's tag without building a whole intrinsic name.
pub fn type_tag_pub(ty: &IrType) -> String {
    type_tag(ty)
}

fn type_tag(ty: &IrType) -> String {
    match ty {
        IrType::Bool => "Bool".to_string(),
        IrType::Int(8) => "I8".to_string(),
        IrType::Int(16) => "I16".to_string(),
        IrType::Int(32) => "I32".to_string(),
        IrType::Int(64) => "I64".to_string(),
        IrType::Int(n) => format!("I{}", n),
        IrType::Float(16) => "F16".to_string(),
        IrType::Float(32) => "F32".to_string(),
        IrType::Float(64) => "F64".to_string(),
        IrType::Float(n) => format!("F{}", n),
        IrType::Vector(elem, lanes) => format!("{}[{}]", type_tag(elem), lanes),
        IrType::Pointer => "Ptr".to_string(),
        IrType::Void => "Void".to_string(),
        IrType::Array { .. } | IrType::Struct(_) => "Agg".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_spec_examples() {
        assert_eq!(input("foo"), "_input_foo");
        assert_eq!(output_at_location(3), "_output_@location3");
        assert_eq!(
            intrinsic("FMin", &[&IrType::Vector(Box::new(IrType::Float(32)), 4), &IrType::Vector(Box::new(IrType::Float(32)), 4)]),
            "@FMin.F32[4].F32[4]"
        );
    }
}
