//! Type translation: SPIR-V `OpType*` instructions lowered to an
//! arena-allocated `TypeDesc`, memoised by SPIR-V id exactly like
//! `render::interface::TypeDesc` describes a shader's buffer interface —
//! generalised here to cover opaque image/sampler types and to carry the
//! decoration-sourced layout (`Offset`/`ArrayStride`/`MatrixStride`) a
//! reflection consumer needs instead of assuming std140.
use fxhash::FxHashMap;
use typed_arena::Arena;
use vkcpu_ir::types::IrType;
use vkcpu_spirv::decoration::DecorationTable;
use vkcpu_spirv::inst::Instruction;
use vkcpu_spirv::Module;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Primitive {
    Bool,
    Int,
    UnsignedInt,
    Half,
    Float,
    Double,
}

impl Primitive {
    pub fn bits(&self) -> u32 {
        match self {
            Primitive::Bool => 8,
            Primitive::Int | Primitive::UnsignedInt | Primitive::Float => 32,
            Primitive::Half => 16,
            Primitive::Double => 64,
        }
    }
    pub fn is_signed(&self) -> bool {
        matches!(self, Primitive::Int)
    }
    pub fn is_float(&self) -> bool {
        matches!(self, Primitive::Half | Primitive::Float | Primitive::Double)
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ImageDataType {
    Float,
    Integer,
    UnsignedInteger,
}

/// The three-slot opaque handle layout every `Image`/`Sampler`/
/// `SampledImage` type collapses to at runtime: a type tag plus two
/// host-owned pointers (backing image descriptor, sampler descriptor) —
/// see the external-interface opaque handle contract.
pub const OPAQUE_HANDLE_SIZE: u32 = 24;

#[derive(Clone, Debug, PartialEq)]
pub enum TypeDesc<'tcx> {
    Void,
    Bool,
    Primitive(Primitive),
    Vector(Primitive, u8),
    Matrix(Primitive, u8, u8, u32 /* matrix stride */),
    Array(&'tcx TypeDesc<'tcx>, u32 /* length */, u32 /* stride */),
    RuntimeArray(&'tcx TypeDesc<'tcx>, u32 /* stride */),
    Struct(Vec<StructMember<'tcx>>),
    Pointer(&'tcx TypeDesc<'tcx>),
    Image(ImageDataType),
    Sampler,
    SampledImage(ImageDataType),
    Function(Vec<&'tcx TypeDesc<'tcx>>, &'tcx TypeDesc<'tcx>),
}

#[derive(Clone, Debug, PartialEq)]
pub struct StructMember<'tcx> {
    pub offset: u32,
    pub ty: &'tcx TypeDesc<'tcx>,
    pub row_major: bool,
}

impl<'tcx> TypeDesc<'tcx> {
    pub fn size_of(&self) -> u32 {
        match self {
            TypeDesc::Void => 0,
            TypeDesc::Bool => 1,
            TypeDesc::Primitive(p) => p.bits() / 8,
            TypeDesc::Vector(p, n) => (p.bits() / 8) * *n as u32,
            TypeDesc::Matrix(_, _rows, cols, stride) => *stride * *cols as u32,
            TypeDesc::Array(_, len, stride) => len * stride,
            TypeDesc::RuntimeArray(_, _) => 0,
            TypeDesc::Struct(members) => members.iter().map(|m| m.offset + m.ty.size_of()).max().unwrap_or(0),
            TypeDesc::Pointer(_) => 8,
            TypeDesc::Image(_) | TypeDesc::Sampler | TypeDesc::SampledImage(_) => OPAQUE_HANDLE_SIZE,
            TypeDesc::Function(..) => 0,
        }
    }

    pub fn is_opaque(&self) -> bool {
        matches!(self, TypeDesc::Image(_) | TypeDesc::Sampler | TypeDesc::SampledImage(_))
    }

    /// Lowers to the flat, layout-free `IrType` the builder deals in.
    /// Opaque handles and pointers both become `IrType::Pointer`; the
    /// three-slot handle shape only matters to the runtime intrinsics that
    /// construct and consume it, not to value passing in the IR itself.
    pub fn to_ir(&self) -> IrType {
        match self {
            TypeDesc::Void => IrType::Void,
            TypeDesc::Bool => IrType::Bool,
            TypeDesc::Primitive(p) => prim_to_ir(*p),
            TypeDesc::Vector(p, n) => IrType::Vector(Box::new(prim_to_ir(*p)), *n as u32),
            TypeDesc::Matrix(p, rows, cols, stride) => IrType::Array {
                element: Box::new(IrType::Vector(Box::new(prim_to_ir(*p)), *rows as u32)),
                len: *cols as u32,
                stride: *stride,
            },
            TypeDesc::Array(elem, len, stride) => IrType::Array { element: Box::new(elem.to_ir()), len: *len, stride: *stride },
            TypeDesc::RuntimeArray(elem, stride) => IrType::Array { element: Box::new(elem.to_ir()), len: 0, stride: *stride },
            TypeDesc::Struct(members) => {
                let fields = members.iter().map(|m| (m.offset, m.ty.to_ir())).collect();
                IrType::Struct(vkcpu_ir::types::struct_layout(fields))
            }
            TypeDesc::Pointer(_) => IrType::Pointer,
            TypeDesc::Image(_) | TypeDesc::Sampler | TypeDesc::SampledImage(_) => IrType::Pointer,
            TypeDesc::Function(..) => IrType::Void,
        }
    }
}

fn prim_to_ir(p: Primitive) -> IrType {
    match p {
        Primitive::Bool => IrType::Bool,
        Primitive::Int | Primitive::UnsignedInt => IrType::Int(32),
        Primitive::Half => IrType::Float(16),
        Primitive::Float => IrType::Float(32),
        Primitive::Double => IrType::Float(64),
    }
}

/// Memoised id -> type table, built in one pass over the module the way a
/// reflection pass walks `OpType*`/`OpTypePointer`/`OpTypeStruct` once and
/// remembers results by result-id: SPIR-V requires every id to be declared
/// before use, so a single forward pass is always enough.
pub struct TypeTable<'tcx> {
    arena: &'tcx Arena<TypeDesc<'tcx>>,
    by_id: FxHashMap<u32, &'tcx TypeDesc<'tcx>>,
    array_lengths: FxHashMap<u32, u32>,
}

impl<'tcx> TypeTable<'tcx> {
    pub fn build(module: &Module, decorations: &DecorationTable, arena: &'tcx Arena<TypeDesc<'tcx>>) -> TypeTable<'tcx> {
        let mut array_lengths = FxHashMap::default();
        for (_, inst) in module.decode() {
            if let Instruction::Constant(c) = inst {
                if let Some(&word) = c.data.first() {
                    array_lengths.insert(c.result_id, word);
                }
            }
        }

        let mut table = TypeTable { arena, by_id: FxHashMap::default(), array_lengths };
        for (_, inst) in module.decode() {
            table.visit(inst, decorations);
        }
        table
    }

    pub fn get(&self, id: u32) -> &'tcx TypeDesc<'tcx> {
        self.by_id.get(&id).copied().unwrap_or_else(|| panic!("type id %{} referenced before its OpType* declaration", id))
    }

    fn alloc(&mut self, id: u32, ty: TypeDesc<'tcx>) -> &'tcx TypeDesc<'tcx> {
        let r = self.arena.alloc(ty);
        self.by_id.insert(id, r);
        r
    }

    fn visit(&mut self, inst: Instruction, decorations: &DecorationTable) {
        use vkcpu_spirv::inst::Instruction::*;
        match inst {
            TypeVoid(i) => {
                self.alloc(i.result_id, TypeDesc::Void);
            }
            TypeBool(i) => {
                self.alloc(i.result_id, TypeDesc::Bool);
            }
            TypeInt(i) => {
                let p = if i.signedness { Primitive::Int } else { Primitive::UnsignedInt };
                self.alloc(i.result_id, TypeDesc::Primitive(p));
            }
            TypeFloat(i) => {
                let p = match i.width {
                    16 => Primitive::Half,
                    64 => Primitive::Double,
                    _ => Primitive::Float,
                };
                self.alloc(i.result_id, TypeDesc::Primitive(p));
            }
            TypeVector(i) => {
                let component = self.get(i.component_id);
                let p = match component {
                    TypeDesc::Primitive(p) => *p,
                    TypeDesc::Bool => Primitive::Int,
                    other => panic!("vector component type must be scalar, got {:?}", other),
                };
                self.alloc(i.result_id, TypeDesc::Vector(p, i.count as u8));
            }
            TypeMatrix(i) => {
                let column = self.get(i.column_type_id);
                let (p, rows) = match column {
                    TypeDesc::Vector(p, rows) => (*p, *rows),
                    other => panic!("matrix column type must be a vector, got {:?}", other),
                };
                let stride = decorations.matrix_stride_of_member(i.result_id, 0).unwrap_or(rows as u32 * (p.bits() / 8));
                self.alloc(i.result_id, TypeDesc::Matrix(p, rows, i.column_count as u8, stride));
            }
            TypeArray(i) => {
                let elem = self.get(i.type_id);
                let stride = decorations.array_stride(i.result_id).unwrap_or(elem.size_of());
                let len = self.array_lengths.get(&i.length_id).copied().unwrap_or(0);
                self.alloc(i.result_id, TypeDesc::Array(elem, len, stride));
            }
            TypeRuntimeArray(i) => {
                let elem = self.get(i.type_id);
                let stride = decorations.array_stride(i.result_id).unwrap_or(elem.size_of());
                self.alloc(i.result_id, TypeDesc::RuntimeArray(elem, stride));
            }
            TypeStruct(i) => {
                let members = i
                    .member_types
                    .iter()
                    .enumerate()
                    .map(|(idx, &mid)| StructMember {
                        offset: decorations.offset_of_member(i.result_id, idx as u32).unwrap_or(0),
                        ty: self.get(mid),
                        row_major: decorations.is_row_major_member(i.result_id, idx as u32),
                    })
                    .collect();
                self.alloc(i.result_id, TypeDesc::Struct(members));
            }
            TypePointer(i) => {
                let pointee = self.get(i.type_id);
                self.alloc(i.result_id, TypeDesc::Pointer(pointee));
            }
            TypeImage(i) => {
                let sampled = self.get(i.sampled_type_id);
                let kind = match sampled {
                    TypeDesc::Primitive(Primitive::UnsignedInt) => ImageDataType::UnsignedInteger,
                    TypeDesc::Primitive(Primitive::Int) => ImageDataType::Integer,
                    _ => ImageDataType::Float,
                };
                self.alloc(i.result_id, TypeDesc::Image(kind));
            }
            TypeSampler(i) => {
                self.alloc(i.result_id, TypeDesc::Sampler);
            }
            TypeSampledImage(i) => {
                let image = self.get(i.image_type_id);
                let kind = match image {
                    TypeDesc::Image(k) => *k,
                    other => panic!("OpTypeSampledImage operand must be an image type, got {:?}", other),
                };
                self.alloc(i.result_id, TypeDesc::SampledImage(kind));
            }
            TypeFunction(i) => {
                let ret = self.get(i.return_type_id);
                let params = i.parameter_type_ids.iter().map(|&p| self.get(p)).collect();
                self.alloc(i.result_id, TypeDesc::Function(params, ret));
            }
            _ => {}
        }
    }
}
