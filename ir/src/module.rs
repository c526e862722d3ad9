//! A thin generic wrapper over `cranelift_module::Module`, parameterised
//! over the backend (`cranelift_jit::JITModule` in production, or any other
//! `Module` impl in tests) so this crate stays link-time agnostic about how
//! code actually gets mapped executable.
use crate::builder::make_signature;
use crate::types::IrType;
use cranelift_codegen::ir::{self, Function, UserFuncName};
use cranelift_codegen::Context;
use cranelift_frontend::FunctionBuilderContext;
use cranelift_module::{DataDescription, DataId, FuncId, Linkage, Module, ModuleError};
use fxhash::FxHashMap;

pub struct IrModule<M: Module> {
    module: M,
    ctx: Context,
    builder_ctx: FunctionBuilderContext,
    data_desc: DataDescription,
    functions: FxHashMap<String, FuncId>,
    data: FxHashMap<String, DataId>,
}

impl<M: Module> IrModule<M> {
    pub fn new(module: M) -> Self {
        IrModule {
            ctx: module.make_context(),
            module,
            builder_ctx: FunctionBuilderContext::new(),
            data_desc: DataDescription::new(),
            functions: FxHashMap::default(),
            data: FxHashMap::default(),
        }
    }

    pub fn declare_function(&mut self, name: &str, params: &[IrType], returns: &[IrType], linkage: Linkage) -> Result<FuncId, ModuleError> {
        let sig = make_signature(self.module.isa().default_call_conv(), params, returns);
        let id = self.module.declare_function(name, linkage, &sig)?;
        self.functions.insert(name.to_string(), id);
        Ok(id)
    }

    pub fn func_id(&self, name: &str) -> Option<FuncId> {
        self.functions.get(name).copied()
    }

    /// Runs `build` against a fresh `Function`/builder pair for `id`, then
    /// defines it in the module. `build` also gets `&mut M` so a translator
    /// can declare cross-function references (other functions, module data
    /// globals) into the body it is constructing via
    /// `declare_func_in_func`/`declare_data_in_func` as it goes.
    pub fn define_function(
        &mut self,
        id: FuncId,
        sig: cranelift_codegen::ir::Signature,
        build: impl FnOnce(&mut M, &mut Function, &mut FunctionBuilderContext),
    ) -> Result<(), ModuleError> {
        let mut func = Function::with_name_signature(UserFuncName::user(0, id.as_u32()), sig);
        build(&mut self.module, &mut func, &mut self.builder_ctx);
        self.ctx.func = func;
        self.module.define_function(id, &mut self.ctx)?;
        self.module.clear_context(&mut self.ctx);
        Ok(())
    }

    pub fn declare_data_in_func(&mut self, id: DataId, func: &mut Function) -> ir::GlobalValue {
        self.module.declare_data_in_func(id, func)
    }

    pub fn declare_data(&mut self, name: &str, writable: bool, size: usize) -> Result<DataId, ModuleError> {
        let id = self.module.declare_data(name, Linkage::Export, writable, false)?;
        self.data_desc.clear();
        self.data_desc.define_zeroinit(size);
        self.module.define_data(id, &self.data_desc)?;
        self.data.insert(name.to_string(), id);
        Ok(id)
    }

    pub fn data_id(&self, name: &str) -> Option<DataId> {
        self.data.get(name).copied()
    }

    pub fn declare_func_in_func(&mut self, id: FuncId, func: &mut Function) -> ir::FuncRef {
        self.module.declare_func_in_func(id, func)
    }

    pub fn inner(&self) -> &M {
        &self.module
    }
    pub fn inner_mut(&mut self) -> &mut M {
        &mut self.module
    }

    pub fn finalize_definitions(&mut self) -> Result<(), ModuleError> {
        self.module.finalize_definitions()
    }
}
