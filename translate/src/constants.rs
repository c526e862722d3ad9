//! Constant and specialization-constant resolution.
//!
//! `OpConstant*` lower to a raw bit pattern per result id, memoised the same
//! way `TypeTable` memoises types. `OpSpecConstant*` read the caller's
//! specialization-info blob (§6) when the id is overridden, and fall back to
//! the module's declared literal otherwise. `OpSpecConstantOp` is folded
//! immediately at translate time with a small interpreter over already
//! resolved operands, never emitted as IR (§4.4: "spec-constant-op as a
//! constant-folded mini-interpreter").
use crate::types::{Primitive, TypeDesc, TypeTable};
use fxhash::FxHashMap;
use vkcpu_spirv::decoration::DecorationTable;
use vkcpu_spirv::inst::Instruction;
use vkcpu_spirv::Module;

/// `(spec_id, offset, size)` entries plus the backing data blob, exactly
/// the shape §6 describes.
#[derive(Clone, Debug, Default)]
pub struct SpecializationInfo {
    pub entries: Vec<(u32, u32, u32)>,
    pub data: Vec<u8>,
}

impl SpecializationInfo {
    fn override_bits(&self, spec_id: u32) -> Option<u64> {
        let (_, offset, size) = self.entries.iter().copied().find(|(id, _, _)| *id == spec_id)?;
        let slice = &self.data[offset as usize..offset as usize + size as usize];
        let mut buf = [0u8; 8];
        buf[..slice.len()].copy_from_slice(slice);
        Some(u64::from_le_bytes(buf))
    }
}

#[derive(Clone, Debug)]
pub enum ConstValue {
    Scalar(u64),
    Composite(Vec<ConstValue>),
}

impl ConstValue {
    pub fn as_i64(&self) -> i64 {
        match self {
            ConstValue::Scalar(b) => *b as i64,
            ConstValue::Composite(_) => panic!("expected scalar constant, found composite"),
        }
    }
    pub fn as_f64(&self, bits: u32) -> f64 {
        match (self, bits) {
            (ConstValue::Scalar(b), 32) => f32::from_bits(*b as u32) as f64,
            (ConstValue::Scalar(b), 64) => f64::from_bits(*b),
            (ConstValue::Scalar(b), 16) => half::f16::from_bits(*b as u16).to_f64(),
            _ => panic!("expected float scalar constant"),
        }
    }
}

pub struct ConstantTable {
    by_id: FxHashMap<u32, (u32 /* type id */, ConstValue)>,
}

fn words_to_bits(data: &[u32]) -> u64 {
    match data.len() {
        1 => data[0] as u64,
        2 => (data[0] as u64) | ((data[1] as u64) << 32),
        n => panic!("unsupported constant literal width ({} words)", n),
    }
}

impl ConstantTable {
    pub fn build(module: &Module, types: &TypeTable, decorations: &DecorationTable, spec_info: &SpecializationInfo) -> ConstantTable {
        let mut by_id = FxHashMap::default();
        for (_, inst) in module.decode() {
            match inst {
                Instruction::Constant(c) => {
                    by_id.insert(c.result_id, (c.result_type_id, ConstValue::Scalar(words_to_bits(c.data))));
                }
                Instruction::SpecConstant(c) => {
                    let literal = words_to_bits(c.data);
                    let bits = decorations
                        .spec_id(c.result_id)
                        .and_then(|id| spec_info.override_bits(id))
                        .unwrap_or(literal);
                    by_id.insert(c.result_id, (c.result_type_id, ConstValue::Scalar(bits)));
                }
                Instruction::ConstantComposite(c) => {
                    let parts = c.constituents.iter().map(|id| by_id.get(id).expect("composite constituent must precede its use").1.clone()).collect();
                    by_id.insert(c.result_id, (c.result_type_id, ConstValue::Composite(parts)));
                }
                Instruction::SpecConstantOp(op) => {
                    let folded = fold_spec_op(&op, types, &by_id);
                    by_id.insert(op.result_id, (op.result_type_id, folded));
                }
                _ => {}
            }
        }
        ConstantTable { by_id }
    }

    pub fn get(&self, id: u32) -> &ConstValue {
        &self.by_id.get(&id).unwrap_or_else(|| panic!("constant id %{} referenced before declaration", id)).1
    }

    /// Like `get`, but for callers (e.g. access-chain index translation)
    /// that need to tell "this id is a compile-time constant" from "this
    /// id is an ordinary SSA value" without panicking on the latter.
    pub fn try_get(&self, id: u32) -> Option<&ConstValue> {
        self.by_id.get(&id).map(|(_, v)| v)
    }

    pub fn type_id_of(&self, id: u32) -> u32 {
        self.by_id.get(&id).unwrap_or_else(|| panic!("constant id %{} referenced before declaration", id)).0
    }
}

fn fold_spec_op(
    op: &vkcpu_spirv::inst::ISpecConstantOp,
    types: &TypeTable,
    known: &FxHashMap<u32, (u32, ConstValue)>,
) -> ConstValue {
    let result_ty = types.get(op.result_type_id);
    let operand_value = |id: u32| known.get(&id).unwrap_or_else(|| panic!("spec-constant-op operand %{} not yet resolved", id)).1.clone();
    let is_float = matches!(result_ty, TypeDesc::Primitive(Primitive::Float | Primitive::Double | Primitive::Half));

    let op_code: spirv_headers::Op = num_traits::FromPrimitive::from_u16(op.wrapped_opcode)
        .unwrap_or_else(|| panic!("spec-constant-op wraps unknown opcode {}", op.wrapped_opcode));

    use spirv_headers::Op;
    match (op_code, op.operands) {
        (Op::IAdd, [a, b]) => ConstValue::Scalar((operand_value(*a).as_i64().wrapping_add(operand_value(*b).as_i64())) as u64),
        (Op::ISub, [a, b]) => ConstValue::Scalar((operand_value(*a).as_i64().wrapping_sub(operand_value(*b).as_i64())) as u64),
        (Op::IMul, [a, b]) => ConstValue::Scalar((operand_value(*a).as_i64().wrapping_mul(operand_value(*b).as_i64())) as u64),
        (Op::SDiv, [a, b]) => ConstValue::Scalar((operand_value(*a).as_i64() / operand_value(*b).as_i64()) as u64),
        (Op::UDiv, [a, b]) => ConstValue::Scalar(((operand_value(*a).as_i64() as u64) / (operand_value(*b).as_i64() as u64)) as u64),
        (Op::ShiftLeftLogical, [a, b]) => ConstValue::Scalar(((operand_value(*a).as_i64() as u64) << operand_value(*b).as_i64()) as u64),
        (Op::ShiftRightLogical, [a, b]) => ConstValue::Scalar(((operand_value(*a).as_i64() as u64) >> operand_value(*b).as_i64()) as u64),
        (Op::BitwiseAnd, [a, b]) => ConstValue::Scalar((operand_value(*a).as_i64() & operand_value(*b).as_i64()) as u64),
        (Op::BitwiseOr, [a, b]) => ConstValue::Scalar((operand_value(*a).as_i64() | operand_value(*b).as_i64()) as u64),
        (Op::BitwiseXor, [a, b]) => ConstValue::Scalar((operand_value(*a).as_i64() ^ operand_value(*b).as_i64()) as u64),
        (Op::SNegate, [a]) => ConstValue::Scalar((-operand_value(*a).as_i64()) as u64),
        (Op::FAdd, [a, b]) if is_float => {
            let sum = (operand_value(*a).as_f64(32) + operand_value(*b).as_f64(32)) as f32;
            ConstValue::Scalar(sum.to_bits() as u64)
        }
        _ => panic!("spec-constant-op folding does not yet cover opcode {:?}", op_code),
    }
}
