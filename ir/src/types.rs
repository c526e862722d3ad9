//! IR-level type descriptions.
//!
//! Cranelift's own type system is flat (scalar and vector machine types
//! only); SPIR-V's structs and arrays are represented here purely as
//! layout metadata — size, alignment, and (for structs) a field offset
//! table — and lowered to pointer arithmetic plus scalar loads/stores at
//! the point of use, the same way a C compiler's IR has no "struct" type
//! once you are past the front end.
use cranelift_codegen::ir::types as clif;
use cranelift_codegen::ir::Type as ClifType;

#[derive(Clone, Debug, PartialEq)]
pub enum IrType {
    Void,
    Int(u32),
    Float(u32),
    Bool,
    Vector(Box<IrType>, u32),
    Pointer,
    Array { element: Box<IrType>, len: u32, stride: u32 },
    Struct(StructLayout),
}

#[derive(Clone, Debug, PartialEq)]
pub struct StructField {
    pub offset: u32,
    pub ty: IrType,
}

#[derive(Clone, Debug, PartialEq, Default)]
pub struct StructLayout {
    pub fields: Vec<StructField>,
    pub size: u32,
}

impl IrType {
    /// Size in bytes, needed for stack allocation and GEP offset math.
    pub fn size_of(&self) -> u32 {
        match self {
            IrType::Void => 0,
            IrType::Bool => 1,
            IrType::Int(bits) | IrType::Float(bits) => (*bits).div_ceil(8),
            IrType::Vector(elem, lanes) => elem.size_of() * lanes,
            IrType::Pointer => 8,
            IrType::Array { element, len, stride } => {
                let natural = element.size_of();
                let s = if *stride > natural { *stride } else { natural };
                s * len
            }
            IrType::Struct(layout) => layout.size,
        }
    }

    /// The scalar or vector cranelift type backing this value in registers.
    /// Aggregates (`Array`/`Struct`) have no register representation —
    /// they only ever exist in memory, addressed by a pointer.
    pub fn to_clif(&self) -> ClifType {
        match self {
            IrType::Void => clif::INVALID,
            IrType::Bool => clif::I8,
            IrType::Int(8) => clif::I8,
            IrType::Int(16) => clif::I16,
            IrType::Int(32) => clif::I32,
            IrType::Int(64) => clif::I64,
            IrType::Int(n) => panic!("unsupported integer width {}", n),
            IrType::Float(16) => clif::F32, // f16 has no native lane; callers widen before arithmetic
            IrType::Float(32) => clif::F32,
            IrType::Float(64) => clif::F64,
            IrType::Float(n) => panic!("unsupported float width {}", n),
            IrType::Pointer => clif::I64,
            IrType::Vector(elem, lanes) => elem.to_clif().by(*lanes).expect("lane count not supported by target"),
            IrType::Array { .. } | IrType::Struct(_) => panic!("aggregate type has no scalar register representation"),
        }
    }

    pub fn is_aggregate(&self) -> bool {
        matches!(self, IrType::Array { .. } | IrType::Struct(_))
    }
}

/// Builds a struct layout from SPIR-V member types honouring explicit
/// `Offset` decorations (never recomputed std140 — see `vkcpu-translate`).
pub fn struct_layout(fields: Vec<(u32, IrType)>) -> StructLayout {
    let mut size = 0;
    let entries: Vec<StructField> = fields
        .into_iter()
        .map(|(offset, ty)| {
            size = size.max(offset + ty.size_of());
            StructField { offset, ty }
        })
        .collect();
    StructLayout { fields: entries, size }
}
