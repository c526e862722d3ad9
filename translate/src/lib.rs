//! SPIR-V -> cranelift-IR translation entry point.
//!
//! Builds the module-wide tables (types, constants, globals) once, then
//! walks each `OpFunction` region into a [`function::FunctionBody`] and
//! lowers it through [`function::translate_function`]. One cranelift
//! function is produced per `OpFunction`; functions named by an
//! `OpEntryPoint` are exported under that entry point's name, everything
//! else (ordinary callees) stays module-local.
pub mod builtins;
pub mod constants;
pub mod extinst;
pub mod function;
pub mod globals;
pub mod mangle;
pub mod reflect;
pub mod types;

use cranelift_module::{FuncId, Linkage, Module as ClifModule};
use fxhash::FxHashMap;
use typed_arena::Arena;
use vkcpu_ir::builder::make_signature;
use vkcpu_ir::module::IrModule;
use vkcpu_spirv::decoration::DecorationTable;
use vkcpu_spirv::inst::Instruction;
use vkcpu_spirv::{IPtr, Module};

use crate::constants::{ConstantTable, SpecializationInfo};
use crate::function::{translate_function, FunctionBody, TranslateCtx};
use crate::globals::GlobalTable;
use crate::types::{TypeDesc, TypeTable};

/// Walks `module`'s instruction stream once, slicing out each `OpFunction`
/// region into a `FunctionBody` keyed by the function's result id. SPIR-V
/// requires functions to be fully self-contained between `OpFunction` and
/// `OpFunctionEnd`, so a single linear pass is always enough — the same
/// assumption `TypeTable`/`ConstantTable` make about `OpType*`/`OpConstant*`.
fn collect_function_bodies(module: &Module) -> FxHashMap<u32, (u32, u32, FunctionBody<'_>)> {
    let mut bodies = FxHashMap::default();

    let mut current: Option<(u32, u32, u32, Vec<u32>)> = None; // (id, result_type, function_type, params)
    let mut blocks: Vec<(u32, Vec<(IPtr, Instruction)>)> = Vec::new();
    let mut block_label: Option<u32> = None;

    for (iptr, inst) in module.decode() {
        match inst {
            Instruction::Function(f) => {
                current = Some((f.result_id, f.result_type_id, f.function_type_id, Vec::new()));
                blocks = Vec::new();
                block_label = None;
            }
            Instruction::FunctionParameter(p) => {
                if let Some((_, _, _, params)) = current.as_mut() {
                    params.push(p.result_id);
                }
            }
            Instruction::Label(l) => {
                block_label = Some(l.result_id);
                blocks.push((l.result_id, Vec::new()));
            }
            Instruction::FunctionEnd => {
                let (id, result_type_id, function_type_id, params) =
                    current.take().expect("OpFunctionEnd without a matching OpFunction");
                bodies.insert(id, (result_type_id, function_type_id, FunctionBody { param_ids: params, blocks: std::mem::take(&mut blocks) }));
                block_label = None;
            }
            other if current.is_some() => {
                if block_label.is_some() {
                    blocks.last_mut().expect("block started").1.push((iptr, other));
                }
                // instructions between OpFunction and the first OpLabel are
                // only ever OpFunctionParameter, already handled above.
            }
            _ => {}
        }
    }

    bodies
}

/// Translates every function in `module` onto `irm`, resolving
/// specialization constants from `spec_info` (pass `SpecializationInfo::default()`
/// for a module compiled with no overrides). Entry-point functions are
/// exported under their `OpEntryPoint` name; every other function is
/// module-local, reachable only via `OpFunctionCall`.
pub fn translate_module<M: ClifModule>(module: &Module, irm: &mut IrModule<M>, spec_info: &SpecializationInfo) {
    let arena = Arena::new();
    let decorations = DecorationTable::build(module);
    let types = TypeTable::build(module, &decorations, &arena);
    let consts = ConstantTable::build(module, &types, &decorations, spec_info);
    let model = module_execution_model(module);
    let globals = GlobalTable::build(module, &types, &decorations, irm, model);

    let entry_names: FxHashMap<u32, String> = module
        .decode()
        .filter_map(|(_, inst)| match inst {
            Instruction::EntryPoint(e) => Some((e.id, e.name.clone())),
            _ => None,
        })
        .collect();

    let bodies = collect_function_bodies(module);

    let mut func_ids: FxHashMap<u32, FuncId> = FxHashMap::default();
    for (&func_id, (result_type_id, function_type_id, _)) in &bodies {
        let (params, ret) = signature_of(&types, *function_type_id, *result_type_id, func_id);
        let linkage = if entry_names.contains_key(&func_id) { Linkage::Export } else { Linkage::Local };
        let name = entry_names.get(&func_id).cloned().unwrap_or_else(|| format!("func{}", func_id));
        let id = irm
            .declare_function(&name, &params, std::slice::from_ref(&ret), linkage)
            .unwrap_or_else(|e| panic!("failed to declare function {} (%{}): {}", name, func_id, e));
        func_ids.insert(func_id, id);
    }

    let mut externs: FxHashMap<String, FuncId> = FxHashMap::default();
    for (func_id, (result_type_id, function_type_id, body)) in &bodies {
        let (param_types, ret) = signature_of(&types, *function_type_id, *result_type_id, *func_id);
        let id = func_ids[func_id];
        let call_conv = irm.inner().isa().default_call_conv();
        let sig = make_signature(call_conv, &param_types, std::slice::from_ref(&ret));

        irm.define_function(id, sig, |module, func, fctx| {
            let mut ctx = TranslateCtx {
                types: &types,
                consts: &consts,
                decorations: &decorations,
                globals: &globals,
                func_ids: &func_ids,
                externs: &mut externs,
                value_type_id: FxHashMap::default(),
            };
            translate_function(module, func, fctx, body, &param_types, &mut ctx);
        })
        .unwrap_or_else(|e| panic!("failed to define function %{}: {}", func_id, e));
    }
}

fn signature_of(types: &TypeTable, function_type_id: u32, result_type_id: u32, func_id: u32) -> (Vec<vkcpu_ir::types::IrType>, vkcpu_ir::types::IrType) {
    let params = match types.get(function_type_id) {
        TypeDesc::Function(params, _) => params.iter().map(|p| p.to_ir()).collect(),
        other => panic!("OpFunction %{} type is not OpTypeFunction, got {:?}", func_id, other),
    };
    (params, types.get(result_type_id).to_ir())
}

/// A parsed module is expected to carry exactly one `OpEntryPoint` (one
/// shader stage per compiled module, as every producer in this pipeline
/// assumes); its execution model picks which builtin cell layout
/// `GlobalTable::build` wires `BuiltIn` variables against.
fn module_execution_model(module: &Module) -> builtins::ExecutionModel {
    module
        .decode()
        .find_map(|(_, inst)| match inst {
            Instruction::EntryPoint(e) => Some(execution_model(e.execution)),
            _ => None,
        })
        .unwrap_or_else(|| panic!("module has no OpEntryPoint to determine its execution model"))
}

/// Maps a SPIR-V `OpEntryPoint`'s execution model to the translator's own
/// enum (§6 built-in cell layouts are keyed by this, not by
/// `spirv_headers::ExecutionModel` directly, since the built-in tables treat
/// tessellation/geometry stages uniformly).
pub fn execution_model(model: spirv_headers::ExecutionModel) -> builtins::ExecutionModel {
    use spirv_headers::ExecutionModel as E;
    match model {
        E::Vertex => builtins::ExecutionModel::Vertex,
        E::TessellationControl => builtins::ExecutionModel::TessControl,
        E::TessellationEvaluation => builtins::ExecutionModel::TessEval,
        E::Geometry => builtins::ExecutionModel::Geometry,
        E::Fragment => builtins::ExecutionModel::Fragment,
        E::GLCompute => builtins::ExecutionModel::GLCompute,
        other => panic!("unsupported SPIR-V execution model {:?}", other),
    }
}
