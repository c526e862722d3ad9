//! Descriptor-binding reflection: walks a parsed module's module-scope
//! `OpVariable`s and reports the `(set, binding)` -> mangled-global-name
//! map the resource binder (`vkcpu-core`) needs to wire a `VkDescriptorSet`
//! update into a compiled stage's globals, without pulling in the
//! cranelift-coupled [`crate::globals::GlobalTable`] (which also declares
//! the data objects, something only the translator during compilation
//! should do). Both sides call through [`crate::globals::mangled_name_for`]
//! so the mangled string a binding resolves to can never drift from what
//! `translate_module` actually declared.
use spirv_headers::StorageClass;
use typed_arena::Arena;
use vkcpu_spirv::decoration::DecorationTable;
use vkcpu_spirv::inst::Instruction;
use vkcpu_spirv::Module;

use crate::globals::mangled_name_for;
use crate::types::{TypeDesc, TypeTable};

/// One module-scope resource variable's descriptor-set/binding slot plus
/// everything the binder needs to write into it.
#[derive(Clone, Debug)]
pub struct ResourceBinding {
    pub set: u32,
    pub binding: u32,
    pub spirv_id: u32,
    pub storage_class: StorageClass,
    /// The mangled cranelift data-object name `Pipeline::global_ptr` takes.
    pub mangled_name: String,
    /// True for `Image`/`Sampler`/`SampledImage` pointees: the binder writes
    /// an `OpaqueHandle` (or sampler/image descriptor pointer) directly into
    /// the cell. False means the cell holds a pointer-to-pointer the binder
    /// must indirect through once (see [`crate::globals`]).
    pub opaque: bool,
}

/// Collects every `DescriptorSet`/`Binding`-decorated module-scope variable.
/// `PushConstant` variables and plain `Input`/`Output` varyings carry no
/// descriptor-set decoration and are never returned here.
pub fn resource_bindings(module: &Module) -> Vec<ResourceBinding> {
    let decorations = DecorationTable::build(module);
    let arena = Arena::new();
    let types = TypeTable::build(module, &decorations, &arena);

    let mut out = Vec::new();
    for (_, inst) in module.decode() {
        let Instruction::Variable(v) = inst else { continue };
        if v.storage_class == StorageClass::Function {
            continue;
        }
        let Some((set, binding)) = decorations.descriptor_set_and_binding(v.result_id) else { continue };
        let pointee = match types.get(v.result_type_id) {
            TypeDesc::Pointer(p) => p,
            other => panic!("module-scope OpVariable %{} does not have a pointer type, got {:?}", v.result_id, other),
        };
        out.push(ResourceBinding {
            set,
            binding,
            spirv_id: v.result_id,
            storage_class: v.storage_class,
            mangled_name: mangled_name_for(v.storage_class, v.result_id, &decorations),
            opaque: pointee.is_opaque(),
        });
    }
    out
}

/// Collects the mangled names of every module-scope `PushConstant`
/// `OpVariable` (§4.4, `VkPushConstantRange`). A module ordinarily declares
/// at most one, but the table is returned as a list since SPIR-V does not
/// forbid more.
pub fn push_constant_globals(module: &Module) -> Vec<String> {
    let decorations = DecorationTable::build(module);
    module
        .decode()
        .filter_map(|(_, inst)| match inst {
            Instruction::Variable(v) if v.storage_class == StorageClass::PushConstant => Some(mangled_name_for(v.storage_class, v.result_id, &decorations)),
            _ => None,
        })
        .collect()
}
