//! Module-scope `OpVariable`s lowered to cranelift data objects.
//!
//! Per §4.4 "Values": `UniformConstant`/`Uniform` variables whose pointee is
//! not opaque become *pointer-to-pointer* globals — the slot this crate
//! allocates holds a pointer the resource binder (`vkcpu-core`) overwrites
//! at `CmdBindDescriptorSets` time, so every function referencing one must
//! load through it once before using the address. Opaque pointees
//! (image/sampler/sampled-image) are filled directly and never re-indirected.
//!
//! `Input`/`Output` variables carrying a `BuiltIn` decoration do not get a
//! dedicated cell each: they are a field offset into the two synthesised
//! per-invocation cells `_builtin_input`/`_builtin_output` (§4.4, §6), whose
//! field order for the module's execution model comes from `crate::builtins`
//! — the same layout the pipeline executor (`vkcpu-raster`) writes/reads
//! around each shader invocation, so the two sides can never disagree about
//! where e.g. `FragCoord` or `Position` lives.
use cranelift_module::{DataId, Module as ClifModule};
use fxhash::FxHashMap;
use spirv_headers::StorageClass;
use vkcpu_ir::module::IrModule;
use vkcpu_spirv::decoration::DecorationTable;
use vkcpu_spirv::inst::Instruction;
use vkcpu_spirv::Module;

use crate::builtins::{self, ExecutionModel};
use crate::types::TypeDesc;
use crate::types::TypeTable;

pub struct Global {
    pub spirv_id: u32,
    pub storage_class: StorageClass,
    /// SPIR-V id of the variable's pointer type (its `OpVariable` result
    /// type), used by the function translator to resume normal
    /// `TypeDesc` traversal after materialising the address.
    pub pointer_type_id: u32,
    pub data_id: DataId,
    pub indirect: bool,
    pub mangled_name: String,
    /// Byte offset into the shared builtin cell `data_id` points at; 0 and
    /// unused for every non-`BuiltIn` global (those own their cell outright).
    pub builtin_offset: u32,
}

pub struct GlobalTable {
    by_id: FxHashMap<u32, Global>,
    /// A 4-byte i32 cell, zeroed by the pipeline executor before each
    /// fragment invocation: `OpKill` stores 1 here and returns instead of
    /// trapping, so the executor can skip that sample's attachment writes
    /// without tearing down the whole process (§4.8 step 9, `discard`).
    /// Declared for every module, not just fragment ones, since `OpKill`
    /// is only legal in a fragment shader but the translator has no reason
    /// to special-case the declaration by execution model.
    pub discard_flag: DataId,
}

impl GlobalTable {
    pub fn get(&self, id: u32) -> Option<&Global> {
        self.by_id.get(&id)
    }
    pub fn iter(&self) -> impl Iterator<Item = &Global> {
        self.by_id.values()
    }

    pub fn build<M: ClifModule>(
        module: &Module,
        types: &TypeTable,
        decorations: &DecorationTable,
        irm: &mut IrModule<M>,
        model: ExecutionModel,
    ) -> GlobalTable {
        let mut by_id = FxHashMap::default();
        let mut input_cell: Option<DataId> = None;
        let mut output_cell: Option<DataId> = None;
        let discard_flag = irm.declare_data("_discard_flag", true, 4).expect("failed to declare _discard_flag cell");

        for (_, inst) in module.decode() {
            let Instruction::Variable(v) = inst else { continue };
            if v.storage_class == StorageClass::Function {
                continue;
            }
            let pointee = match types.get(v.result_type_id) {
                TypeDesc::Pointer(p) => p,
                _ => panic!("module-scope OpVariable %{} does not have a pointer type", v.result_id),
            };

            if let Some(builtin) = decorations.builtin(v.result_id) {
                let is_input = v.storage_class == StorageClass::Input;
                let offset = if is_input { builtins::input_offset(model, builtin) } else { builtins::output_offset(model, builtin) }
                    .unwrap_or_else(|| panic!("BuiltIn {:?} has no cell slot for execution model {:?}", builtin, model));
                let (cell, name) = if is_input {
                    let id = *input_cell.get_or_insert_with(|| {
                        irm.declare_data("_builtin_input", true, builtins::input_layout(model).size.max(4) as usize)
                            .expect("failed to declare _builtin_input cell")
                    });
                    (id, "_builtin_input")
                } else {
                    let id = *output_cell.get_or_insert_with(|| {
                        irm.declare_data("_builtin_output", true, builtins::output_layout(model).size.max(4) as usize)
                            .expect("failed to declare _builtin_output cell")
                    });
                    (id, "_builtin_output")
                };
                by_id.insert(
                    v.result_id,
                    Global {
                        spirv_id: v.result_id,
                        storage_class: v.storage_class,
                        pointer_type_id: v.result_type_id,
                        data_id: cell,
                        indirect: false,
                        mangled_name: name.to_string(),
                        builtin_offset: offset,
                    },
                );
                continue;
            }

            let opaque = pointee.is_opaque();
            let indirect = matches!(v.storage_class, StorageClass::Uniform | StorageClass::UniformConstant) && !opaque;

            let mangled = mangled_name_for(v.storage_class, v.result_id, decorations);
            // Location-based Input/Output cells are always sized to at
            // least a vec4<f32> (16 bytes): the pipeline executor
            // (`vkcpu-raster`) treats every vertex-to-fragment varying as a
            // uniform 4-float slot regardless of the SPIR-V type's actual
            // width, so under-allocating here would let it read past the
            // cell's end.
            let min_size = match v.storage_class {
                StorageClass::Input | StorageClass::Output => 16,
                _ => 8,
            };
            let size = if indirect || opaque { 8 } else { pointee.size_of().max(min_size) };
            let data_id = irm.declare_data(&mangled, true, size as usize).unwrap_or_else(|e| panic!("failed to declare global {}: {}", mangled, e));

            by_id.insert(
                v.result_id,
                Global {
                    spirv_id: v.result_id,
                    storage_class: v.storage_class,
                    pointer_type_id: v.result_type_id,
                    data_id,
                    indirect,
                    mangled_name: mangled,
                    builtin_offset: 0,
                },
            );
        }
        GlobalTable { by_id, discard_flag }
    }
}

pub(crate) fn mangled_name_for(storage_class: StorageClass, id: u32, decorations: &DecorationTable) -> String {
    let base = format!("var{}", id);
    match storage_class {
        StorageClass::Input => crate::mangle::input(&decorations.location(id).map(|l| l.to_string()).unwrap_or(base)),
        StorageClass::Output => match decorations.location(id) {
            Some(l) => crate::mangle::output_at_location(l),
            None => crate::mangle::output(&base),
        },
        StorageClass::Uniform if decorations.is_block(id) => crate::mangle::uniform(&base),
        StorageClass::UniformConstant => crate::mangle::uniform_constant(&base),
        StorageClass::PushConstant => crate::mangle::push_constant(&base),
        StorageClass::Uniform => crate::mangle::buffer(&base),
        StorageClass::StorageBuffer => crate::mangle::buffer(&base),
        _ => base,
    }
}
