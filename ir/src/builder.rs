//! The per-function builder: a typed wrapper over
//! `cranelift_frontend::FunctionBuilder` that tracks an `IrType` alongside
//! every SSA value and remembers which upstream id produced it.
use crate::op::{FloatCmp, IntCmp, IrOp};
use crate::types::IrType;
use cranelift_codegen::ir::condcodes::{FloatCC, IntCC};
use cranelift_codegen::ir::{self, AbiParam, InstBuilder, MemFlags, Signature, StackSlotData, StackSlotKind};
use cranelift_frontend::{FunctionBuilder, FunctionBuilderContext, Variable};
use fxhash::FxHashMap;

#[derive(Clone, Debug, PartialEq)]
pub struct Value {
    pub inner: ir::Value,
    pub ty: IrType,
}

pub struct FuncBuilder<'a> {
    pub builder: FunctionBuilder<'a>,
    next_var: u32,
    /// Locals that are mutated across basic blocks (SPIR-V function-scope
    /// `OpVariable`s without an SSA def site): cranelift resolves these to
    /// block parameters / phis itself once every block has been sealed.
    vars: FxHashMap<u32, (Variable, IrType)>,
    /// Purely diagnostic: which SPIR-V (or other upstream) id produced a
    /// given cranelift value, so a disassembly dump can be read back
    /// against the original module.
    names: FxHashMap<ir::Value, u32>,
}

impl<'a> FuncBuilder<'a> {
    pub fn new(func: &'a mut ir::Function, ctx: &'a mut FunctionBuilderContext) -> Self {
        FuncBuilder { builder: FunctionBuilder::new(func, ctx), next_var: 0, vars: FxHashMap::default(), names: FxHashMap::default() }
    }

    pub fn name(&mut self, value: &Value, source_id: u32) {
        self.names.insert(value.inner, source_id);
    }

    pub fn source_id_of(&self, value: ir::Value) -> Option<u32> {
        self.names.get(&value).copied()
    }

    // ----- blocks -----
    pub fn create_block(&mut self) -> ir::Block {
        self.builder.create_block()
    }
    pub fn switch_to_block(&mut self, block: ir::Block) {
        self.builder.switch_to_block(block)
    }
    pub fn seal_block(&mut self, block: ir::Block) {
        self.builder.seal_block(block)
    }
    pub fn append_block_param(&mut self, block: ir::Block, ty: &IrType) -> Value {
        Value { inner: self.builder.append_block_param(block, ty.to_clif()), ty: ty.clone() }
    }

    // ----- constants -----
    pub fn iconst(&mut self, ty: &IrType, value: i64) -> Value {
        Value { inner: self.builder.ins().iconst(ty.to_clif(), value), ty: ty.clone() }
    }
    pub fn fconst32(&mut self, bits: u32) -> Value {
        let inner = self.builder.ins().f32const(ir::immediates::Ieee32::with_bits(bits));
        Value { inner, ty: IrType::Float(32) }
    }
    pub fn fconst64(&mut self, bits: u64) -> Value {
        let inner = self.builder.ins().f64const(ir::immediates::Ieee64::with_bits(bits));
        Value { inner, ty: IrType::Float(64) }
    }
    pub fn bconst(&mut self, value: bool) -> Value {
        Value { inner: self.builder.ins().iconst(ir::types::I8, value as i64), ty: IrType::Bool }
    }

    // ----- locals for cross-block mutable storage -----
    pub fn declare_local(&mut self, id: u32, ty: IrType) -> Variable {
        let var = Variable::new(self.next_var as usize);
        self.next_var += 1;
        self.builder.declare_var(var, ty.to_clif());
        self.vars.insert(id, (var, ty));
        var
    }
    pub fn def_var(&mut self, id: u32, value: Value) {
        let (var, _) = *self.vars.get(&id).expect("local not declared before def");
        self.builder.def_var(var, value.inner);
    }
    pub fn use_var(&mut self, id: u32) -> Value {
        let (var, ty) = self.vars.get(&id).cloned().expect("local not declared before use");
        Value { inner: self.builder.use_var(var), ty }
    }

    // ----- arithmetic -----
    pub fn binary(&mut self, op: IrOp, lhs: Value, rhs: Value) -> Value {
        let ty = lhs.ty.clone();
        let inner = match op {
            IrOp::IAdd => self.builder.ins().iadd(lhs.inner, rhs.inner),
            IrOp::ISub => self.builder.ins().isub(lhs.inner, rhs.inner),
            IrOp::IMul => self.builder.ins().imul(lhs.inner, rhs.inner),
            IrOp::UDiv => self.builder.ins().udiv(lhs.inner, rhs.inner),
            IrOp::SDiv => self.builder.ins().sdiv(lhs.inner, rhs.inner),
            IrOp::UMod => self.builder.ins().urem(lhs.inner, rhs.inner),
            IrOp::SRem => self.builder.ins().srem(lhs.inner, rhs.inner),
            IrOp::SMod => {
                // SPIR-V's SMod carries the divisor's sign; cranelift's
                // srem carries the dividend's, per C semantics. Correct
                // by adding the divisor back when signs disagree and the
                // remainder is non-zero.
                let r = self.builder.ins().srem(lhs.inner, rhs.inner);
                let zero = self.builder.ins().iconst(ty.to_clif(), 0);
                let r_nonzero = self.builder.ins().icmp(IntCC::NotEqual, r, zero);
                let xor = self.builder.ins().bxor(lhs.inner, rhs.inner);
                let signs_differ = self.builder.ins().icmp_imm(IntCC::SignedLessThan, xor, 0);
                let need_fix = self.builder.ins().band(r_nonzero, signs_differ);
                let fixed = self.builder.ins().iadd(r, rhs.inner);
                self.builder.ins().select(need_fix, fixed, r)
            }
            IrOp::FAdd => self.builder.ins().fadd(lhs.inner, rhs.inner),
            IrOp::FSub => self.builder.ins().fsub(lhs.inner, rhs.inner),
            IrOp::FMul => self.builder.ins().fmul(lhs.inner, rhs.inner),
            IrOp::FDiv => self.builder.ins().fdiv(lhs.inner, rhs.inner),
            IrOp::FRem => {
                // No native frem; reduce to `a - trunc(a / b) * b`. Wide
                // formats route through the runtime intrinsics table
                // instead of this path.
                let q = self.builder.ins().fdiv(lhs.inner, rhs.inner);
                let t = self.builder.ins().trunc(q);
                let prod = self.builder.ins().fmul(t, rhs.inner);
                self.builder.ins().fsub(lhs.inner, prod)
            }
            IrOp::SNegate => self.builder.ins().ineg(lhs.inner),
            IrOp::FNegate => self.builder.ins().fneg(lhs.inner),
            IrOp::And => self.builder.ins().band(lhs.inner, rhs.inner),
            IrOp::Or => self.builder.ins().bor(lhs.inner, rhs.inner),
            IrOp::Xor => self.builder.ins().bxor(lhs.inner, rhs.inner),
            IrOp::Not => self.builder.ins().bnot(lhs.inner),
            IrOp::ShiftLeft => self.builder.ins().ishl(lhs.inner, rhs.inner),
            IrOp::ShiftRightLogical => self.builder.ins().ushr(lhs.inner, rhs.inner),
            IrOp::ShiftRightArithmetic => self.builder.ins().sshr(lhs.inner, rhs.inner),
        };
        Value { inner, ty }
    }

    pub fn icmp(&mut self, cmp: IntCmp, lhs: Value, rhs: Value) -> Value {
        let cc = match cmp {
            IntCmp::Eq => IntCC::Equal,
            IntCmp::Ne => IntCC::NotEqual,
            IntCmp::ULt => IntCC::UnsignedLessThan,
            IntCmp::ULe => IntCC::UnsignedLessThanOrEqual,
            IntCmp::UGt => IntCC::UnsignedGreaterThan,
            IntCmp::UGe => IntCC::UnsignedGreaterThanOrEqual,
            IntCmp::SLt => IntCC::SignedLessThan,
            IntCmp::SLe => IntCC::SignedLessThanOrEqual,
            IntCmp::SGt => IntCC::SignedGreaterThan,
            IntCmp::SGe => IntCC::SignedGreaterThanOrEqual,
        };
        Value { inner: self.builder.ins().icmp(cc, lhs.inner, rhs.inner), ty: IrType::Bool }
    }

    pub fn fcmp(&mut self, cmp: FloatCmp, lhs: Value, rhs: Value) -> Value {
        let cc = match cmp {
            FloatCmp::OrdEq => FloatCC::Equal,
            FloatCmp::OrdNe => FloatCC::OrderedNotEqual,
            FloatCmp::OrdLt => FloatCC::LessThan,
            FloatCmp::OrdLe => FloatCC::LessThanOrEqual,
            FloatCmp::OrdGt => FloatCC::GreaterThan,
            FloatCmp::OrdGe => FloatCC::GreaterThanOrEqual,
            FloatCmp::UnordEq => FloatCC::UnorderedOrEqual,
            FloatCmp::UnordNe => FloatCC::NotEqual,
            FloatCmp::UnordLt => FloatCC::UnorderedOrLessThan,
            FloatCmp::UnordLe => FloatCC::UnorderedOrLessThanOrEqual,
            FloatCmp::UnordGt => FloatCC::UnorderedOrGreaterThan,
            FloatCmp::UnordGe => FloatCC::UnorderedOrGreaterThanOrEqual,
        };
        Value { inner: self.builder.ins().fcmp(cc, lhs.inner, rhs.inner), ty: IrType::Bool }
    }

    // ----- bitcast -----
    pub fn bitcast(&mut self, value: Value, to: IrType) -> Value {
        let inner = self.builder.ins().bitcast(to.to_clif(), MemFlags::new(), value.inner);
        Value { inner, ty: to }
    }

    // ----- memory access -----
    pub fn load(&mut self, ty: &IrType, addr: Value, offset: i32) -> Value {
        let inner = self.builder.ins().load(ty.to_clif(), MemFlags::trusted(), addr.inner, offset);
        Value { inner, ty: ty.clone() }
    }
    pub fn store(&mut self, value: Value, addr: Value, offset: i32) {
        self.builder.ins().store(MemFlags::trusted(), value.inner, addr.inner, offset);
    }

    /// `OpAccessChain` with a compile-time-constant index path.
    pub fn gep(&mut self, base: Value, byte_offset: i64) -> Value {
        if byte_offset == 0 {
            return base;
        }
        Value { inner: self.builder.ins().iadd_imm(base.inner, byte_offset), ty: IrType::Pointer }
    }
    /// `OpAccessChain` with a runtime index (array/vector indexing).
    pub fn gep_dynamic(&mut self, base: Value, index: Value, stride: i64) -> Value {
        let scaled = self.builder.ins().imul_imm(index.inner, stride);
        Value { inner: self.builder.ins().iadd(base.inner, scaled), ty: IrType::Pointer }
    }

    pub fn global_addr(&mut self, gv: ir::GlobalValue) -> Value {
        Value { inner: self.builder.ins().global_value(ir::types::I64, gv), ty: IrType::Pointer }
    }

    pub fn stack_alloc(&mut self, ty: &IrType) -> Value {
        let size = ty.size_of().max(1);
        let slot = self.builder.create_sized_stack_slot(StackSlotData::new(StackSlotKind::ExplicitSlot, size, 0));
        Value { inner: self.builder.ins().stack_addr(ir::types::I64, slot, 0), ty: IrType::Pointer }
    }

    // ----- control flow -----
    pub fn jump(&mut self, block: ir::Block, args: &[Value]) {
        let args: Vec<ir::Value> = args.iter().map(|v| v.inner).collect();
        self.builder.ins().jump(block, &args);
    }
    pub fn brif(&mut self, cond: Value, then_block: ir::Block, then_args: &[Value], else_block: ir::Block, else_args: &[Value]) {
        let then_args: Vec<ir::Value> = then_args.iter().map(|v| v.inner).collect();
        let else_args: Vec<ir::Value> = else_args.iter().map(|v| v.inner).collect();
        self.builder.ins().brif(cond.inner, then_block, &then_args, else_block, &else_args);
    }
    pub fn ret(&mut self, values: &[Value]) {
        let values: Vec<ir::Value> = values.iter().map(|v| v.inner).collect();
        self.builder.ins().return_(&values);
    }
    pub fn call(&mut self, func_ref: ir::FuncRef, args: &[Value], ret_ty: Option<IrType>) -> Option<Value> {
        let args: Vec<ir::Value> = args.iter().map(|v| v.inner).collect();
        let call = self.builder.ins().call(func_ref, &args);
        let results = self.builder.inst_results(call).to_vec();
        ret_ty.map(|ty| Value { inner: results[0], ty })
    }

    // ----- vectors -----
    pub fn splat(&mut self, value: Value, lanes: u32) -> Value {
        let ty = IrType::Vector(Box::new(value.ty.clone()), lanes);
        Value { inner: self.builder.ins().splat(ty.to_clif(), value.inner), ty }
    }
    pub fn extractlane(&mut self, vector: Value, lane: u8, elem_ty: IrType) -> Value {
        Value { inner: self.builder.ins().extractlane(vector.inner, lane), ty: elem_ty }
    }
    pub fn insertlane(&mut self, vector: Value, lane: u8, elem: Value) -> Value {
        let ty = vector.ty.clone();
        Value { inner: self.builder.ins().insertlane(vector.inner, elem.inner, lane), ty }
    }

    // ----- atomics -----
    pub fn atomic_load(&mut self, ty: &IrType, addr: Value) -> Value {
        Value { inner: self.builder.ins().atomic_load(ty.to_clif(), MemFlags::trusted(), addr.inner), ty: ty.clone() }
    }
    pub fn atomic_store(&mut self, value: Value, addr: Value) {
        self.builder.ins().atomic_store(MemFlags::trusted(), value.inner, addr.inner);
    }
    pub fn atomic_rmw(&mut self, op: ir::AtomicRmwOp, addr: Value, value: Value) -> Value {
        let ty = value.ty.clone();
        Value { inner: self.builder.ins().atomic_rmw(ty.to_clif(), MemFlags::trusted(), op, addr.inner, value.inner), ty }
    }
    pub fn atomic_cas(&mut self, addr: Value, expected: Value, replacement: Value) -> Value {
        let ty = expected.ty.clone();
        Value { inner: self.builder.ins().atomic_cas(MemFlags::trusted(), addr.inner, expected.inner, replacement.inner), ty }
    }

    pub fn finalize(self) {
        self.builder.finalize();
    }
}

pub fn make_signature(call_conv: ir::CallConv, params: &[IrType], returns: &[IrType]) -> Signature {
    let mut sig = Signature::new(call_conv);
    for p in params {
        sig.params.push(AbiParam::new(p.to_clif()));
    }
    for r in returns {
        sig.returns.push(AbiParam::new(r.to_clif()));
    }
    sig
}
