use crate::inst::*;
use crate::{IPtr, Module, ParseError};
use num_traits::FromPrimitive;
use spirv_headers::*;
use std::marker::PhantomData;

impl Module {
    pub fn decode_raw(&self) -> impl Iterator<Item = (IPtr, RawInstruction)> {
        struct RawInstIter<'m> {
            i: &'m [u32],
            ptr: usize,
        }

        impl<'m> Iterator for RawInstIter<'m> {
            type Item = (IPtr<'m>, RawInstruction<'m>);

            fn next(&mut self) -> Option<(IPtr<'m>, RawInstruction<'m>)> {
                if !self.i.is_empty() {
                    let (inst, rest) = decode_raw_instruction(self.i).expect("truncated instruction stream");
                    let ptr = self.ptr;
                    self.ptr += inst.word_count as usize;
                    self.i = rest;
                    Some((IPtr(ptr, PhantomData), inst))
                } else {
                    None
                }
            }
        }

        RawInstIter {
            i: self.instruction_stream(),
            ptr: 5,
        }
    }

    pub fn filter_instructions<'a, T: DecodedInstruction<'a>>(&'a self) -> impl Iterator<Item = (IPtr<'a>, T)> + 'a {
        self.decode_raw().filter_map(|(iptr, inst)| {
            if inst.opcode == T::OPCODE as u16 {
                Some((iptr, T::decode(inst.operands)))
            } else {
                None
            }
        })
    }

    pub fn decode(&self) -> impl Iterator<Item = (IPtr, Instruction)> {
        self.decode_raw().map(|(iptr, inst)| (iptr, inst.decode()))
    }

    pub fn decode_raw_at<'a>(&'a self, iptr: IPtr) -> Result<RawInstruction<'a>, ParseError> {
        decode_raw_instruction(&self.data[iptr.0..]).map(|(inst, _)| inst)
    }
}

pub trait DecodedInstruction<'m>: 'm {
    const OPCODE: Op;
    fn decode<'a: 'm>(operands: &'a [u32]) -> Self;
}

impl<'m> DecodedInstruction<'m> for IName {
    const OPCODE: Op = Op::Name;
    fn decode<'a: 'm>(operands: &'a [u32]) -> Self {
        IName {
            target_id: operands[0],
            name: parse_string(&operands[1..]).0,
        }
    }
}
impl<'m> DecodedInstruction<'m> for IMemberName {
    const OPCODE: Op = Op::MemberName;
    fn decode<'a: 'm>(operands: &'a [u32]) -> Self {
        IMemberName {
            target_id: operands[0],
            member: operands[1],
            name: parse_string(&operands[2..]).0,
        }
    }
}
impl<'m> DecodedInstruction<'m> for IExtInstImport {
    const OPCODE: Op = Op::ExtInstImport;
    fn decode<'a: 'm>(operands: &'a [u32]) -> Self {
        IExtInstImport {
            result_id: operands[0],
            name: parse_string(&operands[1..]).0,
        }
    }
}
impl<'m> DecodedInstruction<'m> for IMemoryModel {
    const OPCODE: Op = Op::MemoryModel;
    fn decode<'a: 'm>(operands: &'a [u32]) -> Self {
        IMemoryModel(
            try_parse_constant::<AddressingModel>(operands[0]).unwrap(),
            try_parse_constant::<MemoryModel>(operands[1]).unwrap(),
        )
    }
}
impl<'m> DecodedInstruction<'m> for IEntryPoint<'m> {
    const OPCODE: Op = Op::EntryPoint;
    fn decode<'a: 'm>(operands: &'a [u32]) -> Self {
        let (n, r) = parse_string(&operands[2..]);
        IEntryPoint {
            execution: try_parse_constant::<ExecutionModel>(operands[0]).unwrap(),
            id: operands[1],
            name: n,
            interface: r,
        }
    }
}
impl<'m> DecodedInstruction<'m> for IExecutionMode<'m> {
    const OPCODE: Op = Op::ExecutionMode;
    fn decode<'a: 'm>(operands: &'a [u32]) -> Self {
        IExecutionMode {
            target_id: operands[0],
            mode: try_parse_constant::<ExecutionMode>(operands[1]).unwrap(),
            optional_literals: &operands[2..],
        }
    }
}
impl<'m> DecodedInstruction<'m> for ICapability {
    const OPCODE: Op = Op::Capability;
    fn decode<'a: 'm>(operands: &'a [u32]) -> Self {
        ICapability(try_parse_constant::<Capability>(operands[0]).unwrap())
    }
}
impl<'m> DecodedInstruction<'m> for ITypeVoid {
    const OPCODE: Op = Op::TypeVoid;
    fn decode<'a: 'm>(operands: &'a [u32]) -> Self {
        ITypeVoid { result_id: operands[0] }
    }
}
impl<'m> DecodedInstruction<'m> for ITypeBool {
    const OPCODE: Op = Op::TypeBool;
    fn decode<'a: 'm>(operands: &'a [u32]) -> Self {
        ITypeBool { result_id: operands[0] }
    }
}
impl<'m> DecodedInstruction<'m> for ITypeInt {
    const OPCODE: Op = Op::TypeInt;
    fn decode<'a: 'm>(operands: &'a [u32]) -> Self {
        ITypeInt {
            result_id: operands[0],
            width: operands[1],
            signedness: operands[2] != 0,
        }
    }
}
impl<'m> DecodedInstruction<'m> for ITypeFloat {
    const OPCODE: Op = Op::TypeFloat;
    fn decode<'a: 'm>(operands: &'a [u32]) -> Self {
        ITypeFloat {
            result_id: operands[0],
            width: operands[1],
        }
    }
}
impl<'m> DecodedInstruction<'m> for ITypeVector {
    const OPCODE: Op = Op::TypeVector;
    fn decode<'a: 'm>(operands: &'a [u32]) -> Self {
        ITypeVector {
            result_id: operands[0],
            component_id: operands[1],
            count: operands[2],
        }
    }
}
impl<'m> DecodedInstruction<'m> for ITypeMatrix {
    const OPCODE: Op = Op::TypeMatrix;
    fn decode<'a: 'm>(operands: &'a [u32]) -> Self {
        ITypeMatrix {
            result_id: operands[0],
            column_type_id: operands[1],
            column_count: operands[2],
        }
    }
}
impl<'m> DecodedInstruction<'m> for ITypeImage {
    const OPCODE: Op = Op::TypeImage;
    fn decode<'a: 'm>(operands: &'a [u32]) -> Self {
        ITypeImage {
            result_id: operands[0],
            sampled_type_id: operands[1],
            dim: try_parse_constant::<Dim>(operands[2]).unwrap(),
            depth: match operands[3] {
                0 => Some(false),
                1 => Some(true),
                _ => None,
            },
            arrayed: operands[4] != 0,
            ms: operands[5] != 0,
            sampled: match operands[6] {
                1 => Some(true),
                2 => Some(false),
                _ => None,
            },
            format: try_parse_constant::<ImageFormat>(operands[7]).unwrap(),
            access: operands.get(8).map(|&v| try_parse_constant::<AccessQualifier>(v).unwrap()),
        }
    }
}
impl<'m> DecodedInstruction<'m> for ITypeSampler {
    const OPCODE: Op = Op::TypeSampler;
    fn decode<'a: 'm>(operands: &'a [u32]) -> Self {
        ITypeSampler { result_id: operands[0] }
    }
}
impl<'m> DecodedInstruction<'m> for ITypeSampledImage {
    const OPCODE: Op = Op::TypeSampledImage;
    fn decode<'a: 'm>(operands: &'a [u32]) -> Self {
        ITypeSampledImage {
            result_id: operands[0],
            image_type_id: operands[1],
        }
    }
}
impl<'m> DecodedInstruction<'m> for ITypeArray {
    const OPCODE: Op = Op::TypeArray;
    fn decode<'a: 'm>(operands: &'a [u32]) -> Self {
        ITypeArray {
            result_id: operands[0],
            type_id: operands[1],
            length_id: operands[2],
        }
    }
}
impl<'m> DecodedInstruction<'m> for ITypeRuntimeArray {
    const OPCODE: Op = Op::TypeRuntimeArray;
    fn decode<'a: 'm>(operands: &'a [u32]) -> Self {
        ITypeRuntimeArray {
            result_id: operands[0],
            type_id: operands[1],
        }
    }
}
impl<'m> DecodedInstruction<'m> for ITypeStruct<'m> {
    const OPCODE: Op = Op::TypeStruct;
    fn decode<'a: 'm>(operands: &'a [u32]) -> Self {
        ITypeStruct {
            result_id: operands[0],
            member_types: &operands[1..],
        }
    }
}
impl<'m> DecodedInstruction<'m> for ITypeOpaque {
    const OPCODE: Op = Op::TypeOpaque;
    fn decode<'a: 'm>(operands: &'a [u32]) -> Self {
        ITypeOpaque {
            result_id: operands[0],
            name: parse_string(&operands[1..]).0,
        }
    }
}
impl<'m> DecodedInstruction<'m> for ITypePointer {
    const OPCODE: Op = Op::TypePointer;
    fn decode<'a: 'm>(operands: &'a [u32]) -> Self {
        ITypePointer {
            result_id: operands[0],
            storage_class: try_parse_constant::<StorageClass>(operands[1]).unwrap(),
            type_id: operands[2],
        }
    }
}
impl<'m> DecodedInstruction<'m> for ITypeFunction<'m> {
    const OPCODE: Op = Op::TypeFunction;
    fn decode<'a: 'm>(operands: &'a [u32]) -> Self {
        ITypeFunction {
            result_id: operands[0],
            return_type_id: operands[1],
            parameter_type_ids: &operands[2..],
        }
    }
}
impl<'m> DecodedInstruction<'m> for IConstant<'m> {
    const OPCODE: Op = Op::Constant;
    fn decode<'a: 'm>(operands: &'a [u32]) -> Self {
        IConstant {
            result_type_id: operands[0],
            result_id: operands[1],
            data: &operands[2..],
        }
    }
}
impl<'m> DecodedInstruction<'m> for IConstantComposite<'m> {
    const OPCODE: Op = Op::ConstantComposite;
    fn decode<'a: 'm>(operands: &'a [u32]) -> Self {
        IConstantComposite {
            result_type_id: operands[0],
            result_id: operands[1],
            constituents: &operands[2..],
        }
    }
}
impl<'m> DecodedInstruction<'m> for IVariable {
    const OPCODE: Op = Op::Variable;
    fn decode<'a: 'm>(operands: &'a [u32]) -> Self {
        IVariable {
            result_type_id: operands[0],
            result_id: operands[1],
            storage_class: try_parse_constant::<StorageClass>(operands[2]).unwrap(),
            initializer: operands.get(3).copied(),
        }
    }
}
impl<'m> DecodedInstruction<'m> for ILoad {
    const OPCODE: Op = Op::Load;
    fn decode<'a: 'm>(operands: &'a [u32]) -> Self {
        ILoad {
            result_type_id: operands[0],
            result_id: operands[1],
            pointer_id: operands[2],
        }
    }
}
impl<'m> DecodedInstruction<'m> for IStore {
    const OPCODE: Op = Op::Store;
    fn decode<'a: 'm>(operands: &'a [u32]) -> Self {
        IStore {
            pointer_id: operands[0],
            object_id: operands[1],
        }
    }
}
impl<'m> DecodedInstruction<'m> for IAccessChain<'m> {
    const OPCODE: Op = Op::AccessChain;
    fn decode<'a: 'm>(operands: &'a [u32]) -> Self {
        IAccessChain {
            result_type_id: operands[0],
            result_id: operands[1],
            base_id: operands[2],
            indexes: &operands[3..],
        }
    }
}
impl<'m> DecodedInstruction<'m> for ICompositeExtract<'m> {
    const OPCODE: Op = Op::CompositeExtract;
    fn decode<'a: 'm>(operands: &'a [u32]) -> Self {
        ICompositeExtract {
            result_type_id: operands[0],
            result_id: operands[1],
            composite_id: operands[2],
            indexes: &operands[3..],
        }
    }
}
impl<'m> DecodedInstruction<'m> for ICompositeInsert<'m> {
    const OPCODE: Op = Op::CompositeInsert;
    fn decode<'a: 'm>(operands: &'a [u32]) -> Self {
        ICompositeInsert {
            result_type_id: operands[0],
            result_id: operands[1],
            object_id: operands[2],
            composite_id: operands[3],
            indexes: &operands[4..],
        }
    }
}
impl<'m> DecodedInstruction<'m> for ICompositeConstruct<'m> {
    const OPCODE: Op = Op::CompositeConstruct;
    fn decode<'a: 'm>(operands: &'a [u32]) -> Self {
        ICompositeConstruct {
            result_type_id: operands[0],
            result_id: operands[1],
            constituents: &operands[2..],
        }
    }
}
impl<'m> DecodedInstruction<'m> for IVectorShuffle<'m> {
    const OPCODE: Op = Op::VectorShuffle;
    fn decode<'a: 'm>(operands: &'a [u32]) -> Self {
        IVectorShuffle {
            result_type_id: operands[0],
            result_id: operands[1],
            vector1_id: operands[2],
            vector2_id: operands[3],
            components: &operands[4..],
        }
    }
}
impl<'m> DecodedInstruction<'m> for IFunction {
    const OPCODE: Op = Op::Function;
    fn decode<'a: 'm>(operands: &'a [u32]) -> Self {
        IFunction {
            result_type_id: operands[0],
            result_id: operands[1],
            control: try_parse_constant::<FunctionControl>(operands[2]).unwrap(),
            function_type_id: operands[3],
        }
    }
}
impl<'m> DecodedInstruction<'m> for IFunctionParameter {
    const OPCODE: Op = Op::FunctionParameter;
    fn decode<'a: 'm>(operands: &'a [u32]) -> Self {
        IFunctionParameter {
            result_type_id: operands[0],
            result_id: operands[1],
        }
    }
}
impl<'m> DecodedInstruction<'m> for IFunctionCall<'m> {
    const OPCODE: Op = Op::FunctionCall;
    fn decode<'a: 'm>(operands: &'a [u32]) -> Self {
        IFunctionCall {
            result_type_id: operands[0],
            result_id: operands[1],
            function_id: operands[2],
            arguments: &operands[3..],
        }
    }
}
impl<'m> DecodedInstruction<'m> for IDecorate<'m> {
    const OPCODE: Op = Op::Decorate;
    fn decode<'a: 'm>(operands: &'a [u32]) -> Self {
        IDecorate {
            target_id: operands[0],
            decoration: try_parse_constant::<Decoration>(operands[1]).unwrap(),
            params: &operands[2..],
        }
    }
}
impl<'m> DecodedInstruction<'m> for IMemberDecorate<'m> {
    const OPCODE: Op = Op::MemberDecorate;
    fn decode<'a: 'm>(operands: &'a [u32]) -> Self {
        IMemberDecorate {
            target_id: operands[0],
            member: operands[1],
            decoration: try_parse_constant::<Decoration>(operands[2]).unwrap(),
            params: &operands[3..],
        }
    }
}
impl<'m> DecodedInstruction<'m> for ILabel {
    const OPCODE: Op = Op::Label;
    fn decode<'a: 'm>(operands: &'a [u32]) -> Self {
        ILabel { result_id: operands[0] }
    }
}
impl<'m> DecodedInstruction<'m> for IBranch {
    const OPCODE: Op = Op::Branch;
    fn decode<'a: 'm>(operands: &'a [u32]) -> Self {
        IBranch { result_id: operands[0] }
    }
}
impl<'m> DecodedInstruction<'m> for IBranchConditional {
    const OPCODE: Op = Op::BranchConditional;
    fn decode<'a: 'm>(operands: &'a [u32]) -> Self {
        IBranchConditional {
            condition_id: operands[0],
            true_label: operands[1],
            false_label: operands[2],
        }
    }
}
impl<'m> DecodedInstruction<'m> for IPhi<'m> {
    const OPCODE: Op = Op::Phi;
    fn decode<'a: 'm>(operands: &'a [u32]) -> Self {
        IPhi {
            result_type_id: operands[0],
            result_id: operands[1],
            incoming: &operands[2..],
        }
    }
}
impl<'m> DecodedInstruction<'m> for ILoopMerge {
    const OPCODE: Op = Op::LoopMerge;
    fn decode<'a: 'm>(operands: &'a [u32]) -> Self {
        ILoopMerge {
            merge_block: operands[0],
            continue_target: operands[1],
            control: try_parse_constant::<LoopControl>(operands[2]).unwrap(),
        }
    }
}
impl<'m> DecodedInstruction<'m> for ISelectionMerge {
    const OPCODE: Op = Op::SelectionMerge;
    fn decode<'a: 'm>(operands: &'a [u32]) -> Self {
        ISelectionMerge {
            merge_block: operands[0],
            control: try_parse_constant::<SelectionControl>(operands[1]).unwrap(),
        }
    }
}

impl<'m> RawInstruction<'m> {
    pub fn decode(&self) -> Instruction<'m> {
        decode_instruction(self.opcode, self.operands).unwrap_or_else(|e| panic!("{}", e))
    }
}

pub(crate) fn decode_raw_instruction(i: &[u32]) -> Result<(RawInstruction, &[u32]), ParseError> {
    if i.is_empty() {
        return Err(ParseError::IncompleteInstruction);
    }
    let word_count = (i[0] >> 16) as usize;
    let opcode = (i[0] & 0xffff) as u16;

    if word_count == 0 || i.len() < word_count {
        return Err(ParseError::IncompleteInstruction);
    }

    Ok((
        RawInstruction {
            opcode,
            word_count: word_count as u16,
            operands: &i[1..word_count],
        },
        &i[word_count..],
    ))
}

fn try_parse_constant<T: FromPrimitive>(constant: u32) -> Result<T, ParseError> {
    T::from_u32(constant).ok_or(ParseError::UnknownConstant("enumerant", constant))
}

fn decode_instruction(opcode: u16, operands: &[u32]) -> Result<Instruction, ParseError> {
    let op = Op::from_u16(opcode).ok_or(ParseError::UnknownConstant("opcode", opcode as u32))?;
    Ok(match op {
        Op::Nop => Instruction::Nop,
        Op::Name => Instruction::Name(IName::decode(operands)),
        Op::MemberName => Instruction::MemberName(IMemberName::decode(operands)),
        Op::ExtInstImport => Instruction::ExtInstImport(IExtInstImport::decode(operands)),
        Op::ExtInst => Instruction::ExtInst(IExtInst {
            result_type_id: operands[0],
            result_id: operands[1],
            set_id: operands[2],
            instruction: operands[3],
            operands: &operands[4..],
        }),
        Op::MemoryModel => Instruction::MemoryModel(IMemoryModel::decode(operands)),
        Op::EntryPoint => Instruction::EntryPoint(IEntryPoint::decode(operands)),
        Op::ExecutionMode => Instruction::ExecutionMode(IExecutionMode::decode(operands)),
        Op::Capability => Instruction::Capability(ICapability::decode(operands)),
        Op::TypeVoid => Instruction::TypeVoid(ITypeVoid::decode(operands)),
        Op::TypeBool => Instruction::TypeBool(ITypeBool::decode(operands)),
        Op::TypeInt => Instruction::TypeInt(ITypeInt::decode(operands)),
        Op::TypeFloat => Instruction::TypeFloat(ITypeFloat::decode(operands)),
        Op::TypeVector => Instruction::TypeVector(ITypeVector::decode(operands)),
        Op::TypeMatrix => Instruction::TypeMatrix(ITypeMatrix::decode(operands)),
        Op::TypeImage => Instruction::TypeImage(ITypeImage::decode(operands)),
        Op::TypeSampler => Instruction::TypeSampler(ITypeSampler::decode(operands)),
        Op::TypeSampledImage => Instruction::TypeSampledImage(ITypeSampledImage::decode(operands)),
        Op::TypeArray => Instruction::TypeArray(ITypeArray::decode(operands)),
        Op::TypeRuntimeArray => Instruction::TypeRuntimeArray(ITypeRuntimeArray::decode(operands)),
        Op::TypeStruct => Instruction::TypeStruct(ITypeStruct::decode(operands)),
        Op::TypeOpaque => Instruction::TypeOpaque(ITypeOpaque::decode(operands)),
        Op::TypePointer => Instruction::TypePointer(ITypePointer::decode(operands)),
        Op::TypeFunction => Instruction::TypeFunction(ITypeFunction::decode(operands)),
        Op::Constant => Instruction::Constant(IConstant::decode(operands)),
        Op::ConstantComposite => Instruction::ConstantComposite(IConstantComposite::decode(operands)),
        Op::SpecConstant | Op::SpecConstantTrue | Op::SpecConstantFalse => {
            Instruction::SpecConstant(IConstant::decode(operands))
        }
        Op::SpecConstantOp => Instruction::SpecConstantOp(ISpecConstantOp {
            result_type_id: operands[0],
            result_id: operands[1],
            wrapped_opcode: operands[2] as u16,
            operands: &operands[3..],
        }),
        Op::Variable => Instruction::Variable(IVariable::decode(operands)),
        Op::Load => Instruction::Load(ILoad::decode(operands)),
        Op::Store => Instruction::Store(IStore::decode(operands)),
        Op::AccessChain => Instruction::AccessChain(IAccessChain::decode(operands)),
        Op::InBoundsAccessChain => Instruction::InBoundsAccessChain(IAccessChain::decode(operands)),
        Op::CompositeExtract => Instruction::CompositeExtract(ICompositeExtract::decode(operands)),
        Op::CompositeInsert => Instruction::CompositeInsert(ICompositeInsert::decode(operands)),
        Op::CompositeConstruct => Instruction::CompositeConstruct(ICompositeConstruct::decode(operands)),
        Op::VectorShuffle => Instruction::VectorShuffle(IVectorShuffle::decode(operands)),
        Op::Function => Instruction::Function(IFunction::decode(operands)),
        Op::FunctionParameter => Instruction::FunctionParameter(IFunctionParameter::decode(operands)),
        Op::FunctionCall => Instruction::FunctionCall(IFunctionCall::decode(operands)),
        Op::FunctionEnd => Instruction::FunctionEnd,
        Op::Label => Instruction::Label(ILabel::decode(operands)),
        Op::Branch => Instruction::Branch(IBranch::decode(operands)),
        Op::BranchConditional => Instruction::BranchConditional(IBranchConditional::decode(operands)),
        Op::Phi => Instruction::Phi(IPhi::decode(operands)),
        Op::LoopMerge => Instruction::LoopMerge(ILoopMerge::decode(operands)),
        Op::SelectionMerge => Instruction::SelectionMerge(ISelectionMerge::decode(operands)),
        Op::Kill => Instruction::Kill,
        Op::Return => Instruction::Return,
        Op::ReturnValue => Instruction::ReturnValue(IReturnValue { value_id: operands[0] }),
        Op::ImageSampleImplicitLod => Instruction::ImageSampleImplicitLod(decode_image_sample(operands)),
        Op::ImageSampleExplicitLod => Instruction::ImageSampleExplicitLod(decode_image_sample(operands)),
        Op::ImageFetch => Instruction::ImageFetch(decode_image_sample(operands)),
        Op::Decorate => Instruction::Decorate(IDecorate::decode(operands)),
        Op::MemberDecorate => Instruction::MemberDecorate(IMemberDecorate::decode(operands)),
        op if is_generic_result_op(op) => Instruction::Generic(IGeneric {
            op,
            result_type_id: Some(operands[0]),
            result_id: Some(operands[1]),
            operands: &operands[2..],
        }),
        _ => Instruction::Unknown(IUnknownInst(opcode, operands.to_owned())),
    })
}

fn decode_image_sample(operands: &[u32]) -> IImageSample {
    IImageSample {
        result_type_id: operands[0],
        result_id: operands[1],
        sampled_image_id: operands[2],
        coordinate_id: operands[3],
        operands: &operands[4..],
    }
}

/// Opcodes that fit the uniform `(result_type, result_id, operands...)`
/// shape and carry no structural meaning the translator needs beyond that:
/// arithmetic, comparisons, conversions, bitwise/logical ops, and the
/// handful of matrix/vector algebra ops SPIR-V defines directly rather than
/// through `GlslFunctions`.
fn is_generic_result_op(op: Op) -> bool {
    matches!(
        op,
        Op::IAdd
            | Op::FAdd
            | Op::ISub
            | Op::FSub
            | Op::IMul
            | Op::FMul
            | Op::UDiv
            | Op::SDiv
            | Op::FDiv
            | Op::UMod
            | Op::SRem
            | Op::SMod
            | Op::FRem
            | Op::FMod
            | Op::SNegate
            | Op::FNegate
            | Op::VectorTimesScalar
            | Op::MatrixTimesScalar
            | Op::VectorTimesMatrix
            | Op::MatrixTimesVector
            | Op::MatrixTimesMatrix
            | Op::OuterProduct
            | Op::Dot
            | Op::Transpose
            | Op::Not
            | Op::BitwiseAnd
            | Op::BitwiseOr
            | Op::BitwiseXor
            | Op::ShiftLeftLogical
            | Op::ShiftRightLogical
            | Op::ShiftRightArithmetic
            | Op::BitCount
            | Op::BitReverse
            | Op::BitFieldInsert
            | Op::BitFieldSExtract
            | Op::BitFieldUExtract
            | Op::LogicalAnd
            | Op::LogicalOr
            | Op::LogicalNot
            | Op::LogicalEqual
            | Op::LogicalNotEqual
            | Op::Select
            | Op::Any
            | Op::All
            | Op::IsNan
            | Op::IsInf
            | Op::IEqual
            | Op::INotEqual
            | Op::UGreaterThan
            | Op::SGreaterThan
            | Op::UGreaterThanEqual
            | Op::SGreaterThanEqual
            | Op::ULessThan
            | Op::SLessThan
            | Op::ULessThanEqual
            | Op::SLessThanEqual
            | Op::FOrdEqual
            | Op::FUnordEqual
            | Op::FOrdNotEqual
            | Op::FUnordNotEqual
            | Op::FOrdLessThan
            | Op::FUnordLessThan
            | Op::FOrdGreaterThan
            | Op::FUnordGreaterThan
            | Op::FOrdLessThanEqual
            | Op::FUnordLessThanEqual
            | Op::FOrdGreaterThanEqual
            | Op::FUnordGreaterThanEqual
            | Op::ConvertFToU
            | Op::ConvertFToS
            | Op::ConvertSToF
            | Op::ConvertUToF
            | Op::UConvert
            | Op::SConvert
            | Op::FConvert
            | Op::Bitcast
            | Op::VectorExtractDynamic
            | Op::VectorInsertDynamic
            | Op::Undef
    )
}

fn parse_string(data: &[u32]) -> (String, &[u32]) {
    let bytes: Vec<u8> = data
        .iter()
        .flat_map(|&n| n.to_le_bytes())
        .take_while(|&b| b != 0)
        .collect();
    let words_consumed = 1 + bytes.len() / 4;
    let s = String::from_utf8(bytes).expect("shader string literal is not valid UTF-8");
    (s, &data[words_consumed..])
}
