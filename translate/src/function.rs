//! Per-function body translation: walks one SPIR-V function's block graph
//! and emits it onto a `vkcpu_ir::builder::FuncBuilder`.
//!
//! `OpPhi` needs no dedicated emission: cranelift represents incoming-value
//! merges as block parameters, so every non-entry SPIR-V block that opens
//! with one or more `OpPhi` gets those phis' types appended as cranelift
//! block params up front, and the phi's result id is bound to that param
//! immediately. Predecessor blocks then just pass the right argument when
//! they jump — the "phi instruction" itself is a no-op when reached during
//! the main per-instruction walk.
use crate::constants::ConstantTable;
use crate::globals::GlobalTable;
use crate::types::{ImageDataType, TypeDesc, TypeTable};
use cranelift_codegen::ir::{self, InstBuilder};
use cranelift_frontend::FunctionBuilderContext;
use cranelift_module::{FuncId, Module as ClifModule};
use fxhash::FxHashMap;
use vkcpu_ir::builder::{make_signature, FuncBuilder, Value};
use vkcpu_ir::op::{FloatCmp, IntCmp, IrOp};
use vkcpu_ir::types::IrType;
use vkcpu_spirv::decoration::DecorationTable;
use vkcpu_spirv::inst::Instruction;
use vkcpu_spirv::IPtr;

pub struct FunctionBody<'m> {
    pub param_ids: Vec<u32>,
    /// Instructions in program order, grouped into SPIR-V basic blocks
    /// keyed by their `OpLabel` result id. Preserves textual order.
    pub blocks: Vec<(u32, Vec<(IPtr<'m>, Instruction<'m>)>)>,
}

struct PhiInfo {
    result_id: u32,
    ty: IrType,
    incoming: Vec<(u32, u32)>, // (value_id, parent_block_label)
}

fn leading_phis<'m>(instrs: &[(IPtr<'m>, Instruction<'m>)], types: &TypeTable) -> Vec<PhiInfo> {
    instrs
        .iter()
        .take_while(|(_, i)| matches!(i, Instruction::Phi(_)))
        .map(|(_, i)| match i {
            Instruction::Phi(p) => {
                let incoming = p.incoming.chunks(2).map(|c| (c[0], c[1])).collect();
                PhiInfo { result_id: p.result_id, ty: types.get(p.result_type_id).to_ir(), incoming }
            }
            _ => unreachable!(),
        })
        .collect()
}

pub struct TranslateCtx<'a, 'tcx> {
    pub types: &'a TypeTable<'tcx>,
    pub consts: &'a ConstantTable,
    pub decorations: &'a DecorationTable,
    pub globals: &'a GlobalTable,
    pub func_ids: &'a FxHashMap<u32, FuncId>,
    /// Runtime intrinsics and extended-instruction externs declared so far,
    /// keyed by mangled name: shared across every function in the module so
    /// repeat references (e.g. two shaders both calling `@FMin.F32.F32`)
    /// reuse one `FuncId` rather than redeclaring it.
    pub externs: &'a mut FxHashMap<String, FuncId>,
    pub value_type_id: FxHashMap<u32, u32>,
}

pub fn translate_function<M: ClifModule>(
    module: &mut M,
    func: &mut ir::Function,
    fctx: &mut FunctionBuilderContext,
    body: &FunctionBody,
    param_types: &[IrType],
    ctx: &mut TranslateCtx,
) {
    let mut fb = FuncBuilder::new(func, fctx);
    let mut values: FxHashMap<u32, Value> = FxHashMap::default();
    let mut blocks: FxHashMap<u32, ir::Block> = FxHashMap::default();
    let mut phi_lists: FxHashMap<u32, Vec<PhiInfo>> = FxHashMap::default();

    // Pass 1: create a cranelift block per SPIR-V label, appending phi
    // params for every non-entry block up front.
    for (idx, (label, instrs)) in body.blocks.iter().enumerate() {
        let block = fb.create_block();
        blocks.insert(*label, block);
        if idx == 0 {
            for (param_id, ty) in body.param_ids.iter().zip(param_types.iter()) {
                let v = fb.append_block_param(block, ty);
                values.insert(*param_id, v);
            }
        } else {
            let phis = leading_phis(instrs, ctx.types);
            for phi in &phis {
                let v = fb.append_block_param(block, &phi.ty);
                values.insert(phi.result_id, v);
            }
            phi_lists.insert(*label, phis);
        }
    }

    // Pass 2: emit each block's body in order. The entry block additionally
    // materialises every module-scope global's address before any
    // instruction runs, since a `Uniform`/`Input`/`Output` variable is never
    // defined by an in-body `OpVariable` and so has no other value-producing
    // site the walk above would reach.
    for (idx, (label, instrs)) in body.blocks.iter().enumerate() {
        let block = blocks[label];
        fb.switch_to_block(block);
        if idx == 0 {
            materialize_globals(module, &mut fb, ctx, &mut values);
        }
        for (_, inst) in instrs {
            translate_instruction(module, &mut fb, inst, *label, &blocks, &phi_lists, &mut values, ctx);
        }
        fb.seal_block(block);
    }

    fb.finalize();
}

fn materialize_globals<M: ClifModule>(module: &mut M, fb: &mut FuncBuilder, ctx: &mut TranslateCtx, values: &mut FxHashMap<u32, Value>) {
    let globals: Vec<(u32, cranelift_module::DataId, u32, bool, u32)> =
        ctx.globals.iter().map(|g| (g.spirv_id, g.data_id, g.pointer_type_id, g.indirect, g.builtin_offset)).collect();
    for (spirv_id, data_id, pointer_type_id, indirect, builtin_offset) in globals {
        let gv = module.declare_data_in_func(data_id, fb.builder.func);
        let slot = fb.global_addr(gv);
        let mut addr = if indirect { fb.load(&IrType::Pointer, slot, 0) } else { slot };
        if builtin_offset != 0 {
            addr = fb.gep(addr, builtin_offset as i64);
        }
        ctx.value_type_id.insert(spirv_id, pointer_type_id);
        values.insert(spirv_id, addr);
    }
}

fn jump_args(
    target: u32,
    source_label: u32,
    phi_lists: &FxHashMap<u32, Vec<PhiInfo>>,
    values: &FxHashMap<u32, Value>,
) -> Vec<Value> {
    phi_lists
        .get(&target)
        .map(|phis| {
            phis.iter()
                .map(|p| {
                    let (value_id, _) = p
                        .incoming
                        .iter()
                        .find(|(_, parent)| *parent == source_label)
                        .unwrap_or_else(|| panic!("phi %{} has no incoming value from predecessor block %{}", p.result_id, source_label));
                    values.get(value_id).cloned().unwrap_or_else(|| panic!("phi incoming value %{} not yet defined", value_id))
                })
                .collect()
        })
        .unwrap_or_default()
}

#[allow(clippy::too_many_arguments)]
fn translate_instruction<M: ClifModule>(
    module: &mut M,
    fb: &mut FuncBuilder,
    inst: &Instruction,
    current_label: u32,
    blocks: &FxHashMap<u32, ir::Block>,
    phi_lists: &FxHashMap<u32, Vec<PhiInfo>>,
    values: &mut FxHashMap<u32, Value>,
    ctx: &mut TranslateCtx,
) {
    use Instruction::*;
    let val = |values: &FxHashMap<u32, Value>, id: u32| -> Value {
        values.get(&id).cloned().unwrap_or_else(|| panic!("SSA value %{} used before definition", id))
    };

    match inst {
        Phi(_) | Nop | Name(_) | MemberName(_) | ExtInstImport(_) | MemoryModel(_) | EntryPoint(_) | ExecutionMode(_) | Capability(_) => {
            // Phi is bound at block creation; the rest are module-level
            // metadata with nothing to emit.
        }
        TypeVoid(_) | TypeBool(_) | TypeInt(_) | TypeFloat(_) | TypeVector(_) | TypeMatrix(_) | TypeImage(_) | TypeSampler(_)
        | TypeSampledImage(_) | TypeArray(_) | TypeRuntimeArray(_) | TypeStruct(_) | TypeOpaque(_) | TypePointer(_) | TypeFunction(_)
        | Constant(_) | ConstantComposite(_) | SpecConstant(_) | SpecConstantOp(_) | Decorate(_) | MemberDecorate(_) => {
            // Already resolved by the module-level type/constant passes.
        }

        Variable(v) => {
            let pointee = match ctx.types.get(v.result_type_id) {
                TypeDesc::Pointer(p) => p.to_ir(),
                other => panic!("OpVariable result type must be a pointer, got {:?}", other),
            };
            let ptr = fb.stack_alloc(&pointee);
            ctx.value_type_id.insert(v.result_id, v.result_type_id);
            values.insert(v.result_id, ptr);
        }

        Load(l) => {
            let ty = ctx.types.get(l.result_type_id).to_ir();
            let addr = val(values, l.pointer_id);
            let loaded = fb.load(&ty, addr, 0);
            ctx.value_type_id.insert(l.result_id, l.result_type_id);
            values.insert(l.result_id, loaded);
        }
        Store(s) => {
            let addr = val(values, s.pointer_id);
            let value = val(values, s.object_id);
            fb.store(value, addr, 0);
        }

        AccessChain(a) | InBoundsAccessChain(a) => {
            let base_type_id = *ctx.value_type_id.get(&a.base_id).unwrap_or_else(|| panic!("access chain base %{} has no known type", a.base_id));
            let base = val(values, a.base_id);
            let mut pointee = match ctx.types.get(base_type_id) {
                TypeDesc::Pointer(p) => p,
                other => panic!("access chain base must be a pointer, got {:?}", other),
            };
            let mut ptr = base;
            for &index_id in a.indexes {
                match pointee {
                    TypeDesc::Struct(members) => {
                        let idx = ctx.consts.get(index_id).as_i64() as usize;
                        let member = &members[idx];
                        ptr = fb.gep(ptr, member.offset as i64);
                        pointee = member.ty;
                    }
                    TypeDesc::Array(elem, _len, stride) | TypeDesc::RuntimeArray(elem, stride) => {
                        ptr = if let Some(c) = try_const(ctx, index_id) {
                            fb.gep(ptr, c * *stride as i64)
                        } else {
                            fb.gep_dynamic(ptr, val(values, index_id), *stride as i64)
                        };
                        pointee = elem;
                    }
                    TypeDesc::Vector(p, _) => {
                        let stride = p.bits() as i64 / 8;
                        ptr = if let Some(c) = try_const(ctx, index_id) {
                            fb.gep(ptr, c * stride)
                        } else {
                            fb.gep_dynamic(ptr, val(values, index_id), stride)
                        };
                        break;
                    }
                    other => panic!("access chain cannot index into {:?}", other),
                }
            }
            ctx.value_type_id.insert(a.result_id, a.result_type_id);
            values.insert(a.result_id, ptr);
        }

        CompositeExtract(c) => {
            let src = val(values, c.composite_id);
            let mut cur = src;
            for &lane in c.indexes {
                cur = extract_component(fb, cur, lane);
            }
            values.insert(c.result_id, cur);
        }
        CompositeInsert(c) => {
            let composite = val(values, c.composite_id);
            let object = val(values, c.object_id);
            if c.indexes.len() != 1 {
                panic!("nested OpCompositeInsert (struct-of-vector) is not supported by this engine");
            }
            let out = fb.insertlane(composite, c.indexes[0] as u8, object);
            values.insert(c.result_id, out);
        }
        CompositeConstruct(c) => {
            let ty = ctx.types.get(c.result_type_id).to_ir();
            let lanes = match &ty {
                IrType::Vector(_, n) => *n,
                other => panic!("OpCompositeConstruct only supports vector results, got {:?}", other),
            };
            let mut parts: Vec<Value> = c.constituents.iter().map(|&id| val(values, id)).collect();
            let mut out = fb.splat(parts.remove(0), lanes);
            for (lane, part) in parts.into_iter().enumerate() {
                out = fb.insertlane(out, (lane + 1) as u8, part);
            }
            values.insert(c.result_id, out);
        }
        VectorShuffle(s) => {
            let v1 = val(values, s.vector1_id);
            let v1_lanes = match &v1.ty {
                IrType::Vector(_, n) => *n,
                _ => panic!("OpVectorShuffle operand must be a vector"),
            };
            let v2 = val(values, s.vector2_id);
            let mut out: Option<Value> = None;
            for (lane, &src) in s.components.iter().enumerate() {
                let picked = if (src as u32) < v1_lanes {
                    extract_component(fb, v1.clone(), src)
                } else {
                    extract_component(fb, v2.clone(), src - v1_lanes as u32)
                };
                out = Some(match out {
                    None => fb.splat(picked, s.components.len() as u32),
                    Some(acc) => fb.insertlane(acc, lane as u8, picked),
                });
            }
            values.insert(s.result_id, out.expect("vector shuffle must select at least one component"));
        }

        FunctionCall(c) => {
            let callee = *ctx.func_ids.get(&c.function_id).unwrap_or_else(|| panic!("call to undeclared function %{}", c.function_id));
            let func_ref = module.declare_func_in_func(callee, fb.builder.func);
            let args: Vec<Value> = c.arguments.iter().map(|&id| val(values, id)).collect();
            let ret_ty = if c.result_type_id == 0 { None } else { Some(ctx.types.get(c.result_type_id).to_ir()) };
            if let Some(ret) = fb.call(func_ref, &args, ret_ty) {
                values.insert(c.result_id, ret);
            }
        }

        Label(_) => {}
        Branch(b) => {
            let target = blocks[&b.result_id];
            let args = jump_args(b.result_id, current_label, phi_lists, values);
            fb.jump(target, &args);
        }
        BranchConditional(b) => {
            let cond = val(values, b.condition_id);
            let then_block = blocks[&b.true_label];
            let else_block = blocks[&b.false_label];
            let then_args = jump_args(b.true_label, current_label, phi_lists, values);
            let else_args = jump_args(b.false_label, current_label, phi_lists, values);
            fb.brif(cond, then_block, &then_args, else_block, &else_args);
        }
        LoopMerge(_) | SelectionMerge(_) => {
            // Branch metadata only (§4.4): cranelift's own optimiser does
            // not need merge-block hints to handle arbitrary reducible CFGs.
        }
        Kill => {
            // `discard`: flag the sample as killed and return, rather than
            // trapping the whole process — the fragment loop
            // (`vkcpu-raster::raster::shade_fragment`) checks this cell
            // after invocation and drops every attachment write for a
            // killed sample.
            let gv = module.declare_data_in_func(ctx.globals.discard_flag, fb.builder.func);
            let addr = fb.global_addr(gv);
            let one = fb.iconst(&IrType::I32, 1);
            fb.store(one, addr, 0);
            fb.ret(&[]);
        }
        Return => {
            fb.ret(&[]);
        }
        ReturnValue(r) => {
            let v = val(values, r.value_id);
            fb.ret(&[v]);
        }

        ImageSampleImplicitLod(s) | ImageSampleExplicitLod(s) | ImageFetch(s) => {
            translate_image_op(module, fb, s, inst, values, ctx);
        }

        ExtInst(e) => {
            let name = crate::extinst::name_of(e.instruction);
            let operand_values: Vec<Value> = e.operands.iter().map(|&id| val(values, id)).collect();
            let ret_ty = ctx.types.get(e.result_type_id).to_ir();
            let tags: Vec<&IrType> = operand_values.iter().map(|v| &v.ty).collect();
            let mangled = crate::mangle::intrinsic(name, &tags);
            let func_ref = declare_extern_call(module, ctx, fb.builder.func, &mangled, &operand_values, &ret_ty);
            let result = fb.call(func_ref, &operand_values, Some(ret_ty)).expect("extended instruction must return a value");
            values.insert(e.result_id, result);
        }

        Unknown(u) => panic!("translator encountered an unmodelled SPIR-V opcode {}", u.0),

        Generic(g) => translate_generic(fb, g, &val, values, ctx),
    }
}

fn try_const(ctx: &TranslateCtx, id: u32) -> Option<i64> {
    ctx.consts.try_get(id).map(|c| c.as_i64())
}

fn extract_component(fb: &mut FuncBuilder, vector: Value, lane: u32) -> Value {
    let elem_ty = match &vector.ty {
        IrType::Vector(elem, _) => (**elem).clone(),
        other => panic!("cannot extract a lane from non-vector type {:?}", other),
    };
    fb.extractlane(vector, lane as u8, elem_ty)
}

fn translate_generic(
    fb: &mut FuncBuilder,
    g: &vkcpu_spirv::inst::IGeneric,
    val: &dyn Fn(&FxHashMap<u32, Value>, u32) -> Value,
    values: &mut FxHashMap<u32, Value>,
    ctx: &TranslateCtx,
) {
    use spirv_headers::Op;
    let result_id = g.result_id.expect("generic arithmetic/comparison opcode must produce a result");
    let result_ty = g.result_type_id.map(|t| ctx.types.get(t).to_ir());

    let bin = |op: Op| -> Option<IrOp> {
        Some(match op {
            Op::IAdd => IrOp::IAdd,
            Op::ISub => IrOp::ISub,
            Op::IMul => IrOp::IMul,
            Op::UDiv => IrOp::UDiv,
            Op::SDiv => IrOp::SDiv,
            Op::UMod => IrOp::UMod,
            Op::SRem => IrOp::SRem,
            Op::SMod => IrOp::SMod,
            Op::FAdd => IrOp::FAdd,
            Op::FSub => IrOp::FSub,
            Op::FMul => IrOp::FMul,
            Op::FDiv => IrOp::FDiv,
            Op::FRem | Op::FMod => IrOp::FRem,
            Op::BitwiseAnd | Op::LogicalAnd => IrOp::And,
            Op::BitwiseOr | Op::LogicalOr => IrOp::Or,
            Op::BitwiseXor | Op::LogicalNotEqual => IrOp::Xor,
            Op::ShiftLeftLogical => IrOp::ShiftLeft,
            Op::ShiftRightLogical => IrOp::ShiftRightLogical,
            Op::ShiftRightArithmetic => IrOp::ShiftRightArithmetic,
            _ => return None,
        })
    };
    let icmp = |op: Op| -> Option<IntCmp> {
        Some(match op {
            Op::IEqual | Op::LogicalEqual => IntCmp::Eq,
            Op::INotEqual => IntCmp::Ne,
            Op::ULessThan => IntCmp::ULt,
            Op::ULessThanEqual => IntCmp::ULe,
            Op::UGreaterThan => IntCmp::UGt,
            Op::UGreaterThanEqual => IntCmp::UGe,
            Op::SLessThan => IntCmp::SLt,
            Op::SLessThanEqual => IntCmp::SLe,
            Op::SGreaterThan => IntCmp::SGt,
            Op::SGreaterThanEqual => IntCmp::SGe,
            _ => return None,
        })
    };
    let fcmp = |op: Op| -> Option<FloatCmp> {
        Some(match op {
            Op::FOrdEqual => FloatCmp::OrdEq,
            Op::FOrdNotEqual => FloatCmp::OrdNe,
            Op::FOrdLessThan => FloatCmp::OrdLt,
            Op::FOrdLessThanEqual => FloatCmp::OrdLe,
            Op::FOrdGreaterThan => FloatCmp::OrdGt,
            Op::FOrdGreaterThanEqual => FloatCmp::OrdGe,
            Op::FUnordEqual => FloatCmp::UnordEq,
            Op::FUnordNotEqual => FloatCmp::UnordNe,
            Op::FUnordLessThan => FloatCmp::UnordLt,
            Op::FUnordLessThanEqual => FloatCmp::UnordLe,
            Op::FUnordGreaterThan => FloatCmp::UnordGt,
            Op::FUnordGreaterThanEqual => FloatCmp::UnordGe,
            _ => return None,
        })
    };

    let out = if g.op == Op::SNegate {
        let a = val(values, g.operands[0]);
        fb.binary(IrOp::SNegate, a.clone(), a)
    } else if g.op == Op::FNegate {
        let a = val(values, g.operands[0]);
        fb.binary(IrOp::FNegate, a.clone(), a)
    } else if g.op == Op::LogicalNot || g.op == Op::Not {
        let a = val(values, g.operands[0]);
        fb.binary(IrOp::Not, a.clone(), a)
    } else if let Some(op) = bin(g.op) {
        let a = val(values, g.operands[0]);
        let b = val(values, g.operands[1]);
        fb.binary(op, a, b)
    } else if let Some(cmp) = icmp(g.op) {
        let a = val(values, g.operands[0]);
        let b = val(values, g.operands[1]);
        fb.icmp(cmp, a, b)
    } else if let Some(cmp) = fcmp(g.op) {
        let a = val(values, g.operands[0]);
        let b = val(values, g.operands[1]);
        fb.fcmp(cmp, a, b)
    } else {
        match g.op {
            Op::Bitcast => {
                let a = val(values, g.operands[0]);
                fb.bitcast(a, result_ty.expect("bitcast must carry a result type"))
            }
            Op::ConvertSToF | Op::ConvertUToF | Op::ConvertFToS | Op::ConvertFToU | Op::UConvert | Op::SConvert | Op::FConvert => {
                translate_convert(fb, g.op, val(values, g.operands[0]), result_ty.clone().unwrap())
            }
            Op::Select => {
                let cond = val(values, g.operands[0]);
                let a = val(values, g.operands[1]);
                let b = val(values, g.operands[2]);
                Value { inner: fb.builder.ins().select(cond.inner, a.inner, b.inner), ty: a.ty }
            }
            other => panic!("generic translation does not cover opcode {:?}", other),
        }
    };
    values.insert(result_id, out);
}

fn translate_convert(fb: &mut FuncBuilder, op: spirv_headers::Op, a: Value, to: IrType) -> Value {
    use spirv_headers::Op;
    let inner = match op {
        Op::ConvertSToF => fb.builder.ins().fcvt_from_sint(to.to_clif(), a.inner),
        Op::ConvertUToF => fb.builder.ins().fcvt_from_uint(to.to_clif(), a.inner),
        Op::ConvertFToS => fb.builder.ins().fcvt_to_sint_sat(to.to_clif(), a.inner),
        Op::ConvertFToU => fb.builder.ins().fcvt_to_uint_sat(to.to_clif(), a.inner),
        Op::UConvert => {
            let src_bits = a.ty.size_of() * 8;
            let dst_bits = to.size_of() * 8;
            if dst_bits > src_bits {
                fb.builder.ins().uextend(to.to_clif(), a.inner)
            } else {
                fb.builder.ins().ireduce(to.to_clif(), a.inner)
            }
        }
        Op::SConvert => {
            let src_bits = a.ty.size_of() * 8;
            let dst_bits = to.size_of() * 8;
            if dst_bits > src_bits {
                fb.builder.ins().sextend(to.to_clif(), a.inner)
            } else {
                fb.builder.ins().ireduce(to.to_clif(), a.inner)
            }
        }
        Op::FConvert => {
            let src_bits = a.ty.size_of() * 8;
            let dst_bits = to.size_of() * 8;
            if dst_bits > src_bits {
                fb.builder.ins().fpromote(to.to_clif(), a.inner)
            } else {
                fb.builder.ins().fdemote(to.to_clif(), a.inner)
            }
        }
        other => panic!("unsupported conversion opcode {:?}", other),
    };
    Value { inner, ty: to }
}

fn declare_extern_call<M: ClifModule>(
    module: &mut M,
    ctx: &mut TranslateCtx,
    func: &mut ir::Function,
    name: &str,
    args: &[Value],
    ret: &IrType,
) -> ir::FuncRef {
    let id = match ctx.externs.get(name) {
        Some(&id) => id,
        None => {
            let params: Vec<IrType> = args.iter().map(|v| v.ty.clone()).collect();
            let sig = make_signature(module.isa().default_call_conv(), &params, std::slice::from_ref(ret));
            let id = module
                .declare_function(name, cranelift_module::Linkage::Import, &sig)
                .unwrap_or_else(|e| panic!("failed to declare runtime intrinsic {}: {}", name, e));
            ctx.externs.insert(name.to_string(), id);
            id
        }
    };
    module.declare_func_in_func(id, func)
}

fn translate_image_op<M: ClifModule>(
    module: &mut M,
    fb: &mut FuncBuilder,
    s: &vkcpu_spirv::inst::IImageSample,
    inst: &Instruction,
    values: &mut FxHashMap<u32, Value>,
    ctx: &mut TranslateCtx,
) {
    let op_name = match inst {
        Instruction::ImageSampleImplicitLod(_) => "ImageSampleImplicitLod",
        Instruction::ImageSampleExplicitLod(_) => "ImageSampleExplicitLod",
        Instruction::ImageFetch(_) => "ImageFetch",
        _ => unreachable!(),
    };
    let image = values.get(&s.sampled_image_id).cloned().unwrap_or_else(|| panic!("image operand %{} not found", s.sampled_image_id));
    let coord = values.get(&s.coordinate_id).cloned().unwrap_or_else(|| panic!("coordinate operand %{} not found", s.coordinate_id));
    let result_ty = ctx.types.get(s.result_type_id).to_ir();
    let image_kind: &str = image_kind_tag(ctx, s.sampled_image_id);
    let mangled = format!("@{}.{}.{}", op_name, crate::mangle::type_tag_pub(&coord.ty), image_kind);
    let args = [image, coord];
    let func_ref = declare_extern_call(module, ctx, fb.builder.func, &mangled, &args, &result_ty);
    let result = fb.call(func_ref, &args, Some(result_ty)).expect("image sample/fetch must return a value");
    values.insert(s.result_id, result);
}

fn image_kind_tag(ctx: &TranslateCtx, image_id: u32) -> &'static str {
    let type_id = *ctx.value_type_id.get(&image_id).unwrap_or(&0);
    match ctx.types.get(type_id) {
        TypeDesc::SampledImage(ImageDataType::UnsignedInteger) | TypeDesc::Image(ImageDataType::UnsignedInteger) => "Uint",
        TypeDesc::SampledImage(ImageDataType::Integer) | TypeDesc::Image(ImageDataType::Integer) => "Int",
        _ => "Float",
    }
}
