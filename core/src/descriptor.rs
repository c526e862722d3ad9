//! Descriptor sets and the resource binder (§3, §6, C12): the bridge
//! between `VkDescriptorSet` updates and the mangled globals a compiled
//! shader stage actually reads. `update_descriptor_set` records what a set
//! is bound to; `bind_into_pipeline` is called once per draw/dispatch to
//! materialise those bindings as live pointers inside a stage's `JitHost`,
//! using `vkcpu_translate::reflect` so the two sides can never disagree
//! about a binding's mangled name (see `vkcpu-translate`'s own mangling
//! contract).
use fxhash::FxHashMap;
use vkcpu_format::codec::mip_extent;
use vkcpu_format::describe;
use vkcpu_format::runtime::{ImageDescriptor, OpaqueHandle, SamplerDescriptor};
use vkcpu_translate::reflect::ResourceBinding;

use crate::handle::Handle;
use crate::memory::DeviceMemory;
use crate::resource::{Buffer, BufferView, Image, ImageView, Sampler};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum DescriptorType {
    Sampler,
    CombinedImageSampler,
    SampledImage,
    StorageImage,
    UniformTexelBuffer,
    StorageTexelBuffer,
    UniformBuffer,
    StorageBuffer,
}

#[derive(Copy, Clone, Debug)]
pub struct DescriptorSetLayoutBinding {
    pub binding: u32,
    pub descriptor_type: DescriptorType,
    pub stage_flags: u32,
}

#[derive(Clone, Debug, Default)]
pub struct DescriptorSetLayout {
    pub bindings: Vec<DescriptorSetLayoutBinding>,
}

/// `vkCreateDescriptorPool`'s capacity cap. Descriptor sets allocated from
/// a pool live in the pool's own `sets` list so destroying the pool can
/// cascade, matching `vkDestroyDescriptorPool`'s "implicitly frees all
/// descriptor sets allocated from it" contract.
pub struct DescriptorPool {
    pub sets: Vec<Handle<DescriptorSet>>,
    pub max_sets: u32,
}

impl DescriptorPool {
    pub fn new(max_sets: u32) -> DescriptorPool {
        DescriptorPool { sets: Vec::new(), max_sets }
    }
}

#[derive(Clone)]
pub enum DescriptorSlot {
    Empty,
    Buffer { buffer: Handle<Buffer>, offset: u64, range: u64 },
    TexelBuffer { view: Handle<BufferView> },
    Image { view: Handle<ImageView>, sampler: Option<Handle<Sampler>> },
    Sampler { sampler: Handle<Sampler> },
}

#[derive(Clone)]
pub struct DescriptorSet {
    pub layout: DescriptorSetLayout,
    pub slots: FxHashMap<u32, DescriptorSlot>,
}

impl DescriptorSet {
    pub fn new(layout: DescriptorSetLayout) -> DescriptorSet {
        DescriptorSet { layout, slots: FxHashMap::default() }
    }

    pub fn write(&mut self, binding: u32, slot: DescriptorSlot) {
        self.slots.insert(binding, slot);
    }

    /// `vkCmdCopyDescriptorSet`'s single-binding form, used by
    /// `copy_descriptor_sets` below.
    pub fn copy_binding_from(&mut self, src: &DescriptorSet, binding: u32) {
        if let Some(slot) = src.slots.get(&binding) {
            self.slots.insert(binding, slot.clone());
        }
    }
}

/// `vkUpdateDescriptorSets`' write half — copies are expressed as
/// `DescriptorSet::copy_binding_from` calls by the caller, since a copy
/// needs a shared borrow of the source set alongside a mutable borrow of
/// the destination, which `vkcpu-core`'s single descriptor-set arena can't
/// hand out simultaneously through one helper.
pub fn update_descriptor_set(set: &mut DescriptorSet, binding: u32, slot: DescriptorSlot) {
    set.write(binding, slot);
}

/// Resolves a bound image view to the raw `ImageDescriptor` the runtime
/// sample/fetch intrinsics read, offsetting the backing pointer to the
/// view's base mip level. Views are assumed to cover every array layer
/// starting at layer 0 (the common case for every scenario in §8); a
/// sub-ranged array view is out of scope (see the design ledger).
fn resolve_image_descriptor(image: &Image, view: &ImageView, memory: &DeviceMemory) -> ImageDescriptor {
    let binding = image.binding.expect("image view bound before its image has memory");
    let info = describe(view.format);
    let base_mip = view.subresource_range.base_mip_level;
    let mip_levels = view.subresource_range.level_count.min(image.mip_levels.saturating_sub(base_mip)).max(1);
    let level_offset = vkcpu_format::codec::mip_offset(info, image.extent, image.array_layers, base_mip);
    let data = unsafe { memory.as_slice().as_ptr().add((binding.offset + level_offset) as usize) as *mut u8 };
    ImageDescriptor { data, format: view.format, extent: mip_extent(image.extent, base_mip), mip_levels, array_layers: image.array_layers }
}

/// Everything the binder needs read access to: the resource arenas a
/// `Device` owns (see `crate::device::Device`). Kept as a bundle of
/// borrows rather than a `Device` reference so command replay (which
/// already borrows the device mutably elsewhere) can call this without a
/// double-borrow.
pub struct BindContext<'a> {
    pub memories: &'a crate::handle::Arena<DeviceMemory>,
    pub buffers: &'a crate::handle::Arena<Buffer>,
    pub images: &'a crate::handle::Arena<Image>,
    pub image_views: &'a crate::handle::Arena<ImageView>,
    pub buffer_views: &'a crate::handle::Arena<BufferView>,
    pub samplers: &'a crate::handle::Arena<Sampler>,
    /// Owns the `ImageDescriptor`/`SamplerDescriptor`/`OpaqueHandle` values
    /// this bind pass allocates, so their addresses stay valid for the
    /// caller's subsequent draw/dispatch. Cleared and refilled once per
    /// `CmdBindDescriptorSets` (see `crate::command`).
    pub storage: &'a mut BindStorage,
}

/// Backing storage for the opaque descriptors a bind pass materialises.
/// `Box`-allocated so their addresses survive the `Vec` they're collected
/// through being dropped, and stable across re-allocation within this
/// storage's own lifetime since each entry is independently heap-allocated.
#[derive(Default)]
pub struct BindStorage {
    images: Vec<Box<ImageDescriptor>>,
    samplers: Vec<Box<SamplerDescriptor>>,
}

impl BindStorage {
    pub fn clear(&mut self) {
        self.images.clear();
        self.samplers.clear();
    }
}

/// Walks `bindings` (reflected once at pipeline-creation time, see
/// `crate::device::GraphicsPipelineObject`) and, for each one whose
/// `(set, binding)` has a matching slot in `sets[set]`, writes the
/// appropriate value into the compiled global `cell_for` resolves its
/// mangled name to (§4.4, §4.6). Buffer and uniform-constant bindings write
/// a pointer into the indirection cell `vkcpu-translate::globals` declared
/// for them; opaque bindings write a freshly built `OpaqueHandle` directly.
///
/// Takes a resolver closure rather than `&mut Pipeline` + `ShaderStage`
/// directly so the fragment stage — compiled once per fragment worker
/// (`vkcpu_raster::pipeline::Pipeline::fragment_global_ptr`), not once per
/// stage like every other stage (`Pipeline::global_ptr`) — can reuse this
/// same walk instead of silently skipping opaque bindings.
pub fn bind_into_pipeline(mut cell_for: impl FnMut(&str) -> Option<*mut u8>, bindings: &[ResourceBinding], sets: &[DescriptorSet], ctx: &mut BindContext) {
    for binding_info in bindings {
        let Some(set) = sets.get(binding_info.set as usize) else { continue };
        let Some(slot) = set.slots.get(&binding_info.binding) else { continue };

        let Some(cell) = cell_for(&binding_info.mangled_name) else { continue };

        match slot {
            DescriptorSlot::Buffer { buffer, offset, .. } => {
                let buf = ctx.buffers.get(*buffer).expect("descriptor references destroyed buffer");
                let binding = buf.binding.expect("buffer bound to a descriptor set before it has memory");
                let mem = ctx.memories.get(binding.memory).expect("buffer memory destroyed while bound");
                let ptr = unsafe { mem.as_slice().as_ptr().add((binding.offset + offset) as usize) as *mut u8 };
                unsafe { *(cell as *mut *mut u8) = ptr };
            }
            DescriptorSlot::TexelBuffer { view } => {
                let view = ctx.buffer_views.get(*view).expect("descriptor references destroyed buffer view");
                let buf = ctx.buffers.get(view.buffer).expect("buffer view references destroyed buffer");
                let binding = buf.binding.expect("buffer view's buffer has no memory bound");
                let mem = ctx.memories.get(binding.memory).expect("buffer memory destroyed while bound");
                let ptr = unsafe { mem.as_slice().as_ptr().add((binding.offset + view.offset) as usize) as *mut u8 };
                unsafe { *(cell as *mut *mut u8) = ptr };
            }
            DescriptorSlot::Image { view, sampler } => {
                let image_view = ctx.image_views.get(*view).expect("descriptor references destroyed image view");
                let image = ctx.images.get(image_view.image).expect("image view references destroyed image");
                let mem = ctx
                    .memories
                    .get(image.binding.expect("image bound to a descriptor set before it has memory").memory)
                    .expect("image memory destroyed while bound");
                let image_desc = Box::new(resolve_image_descriptor(image, image_view, mem));
                let image_ptr = Box::as_ref(&image_desc) as *const ImageDescriptor as *mut ImageDescriptor;
                ctx.storage.images.push(image_desc);

                let handle = match sampler {
                    Some(sampler_handle) => {
                        let sampler = ctx.samplers.get(*sampler_handle).expect("descriptor references destroyed sampler");
                        let sampler_desc = Box::new(sampler.descriptor);
                        let sampler_ptr = Box::as_ref(&sampler_desc) as *const SamplerDescriptor as *mut SamplerDescriptor;
                        ctx.storage.samplers.push(sampler_desc);
                        OpaqueHandle::sampled_image(image_ptr, sampler_ptr)
                    }
                    None => OpaqueHandle::image(image_ptr),
                };
                unsafe { *(cell as *mut OpaqueHandle) = handle };
            }
            DescriptorSlot::Sampler { sampler } => {
                let sampler = ctx.samplers.get(*sampler).expect("descriptor references destroyed sampler");
                let sampler_desc = Box::new(sampler.descriptor);
                let sampler_ptr = Box::as_ref(&sampler_desc) as *const SamplerDescriptor as *mut SamplerDescriptor;
                ctx.storage.samplers.push(sampler_desc);
                let handle = OpaqueHandle::sampler(sampler_ptr);
                unsafe { *(cell as *mut OpaqueHandle) = handle };
            }
            DescriptorSlot::Empty => {}
        }
    }
}
