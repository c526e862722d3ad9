//! Vulkan 1.1 CPU software ICD (§1 overview): the loader-facing surface
//! that turns `vk*` calls into `vkcpu-core`/`vkcpu-raster` work. Every
//! exported symbol is one of the three loader-negotiation entry points in
//! [`negotiate`] or a `vk*`-named trampoline reached only through
//! [`negotiate::icd_get_instance_proc_address`]'s name table — nothing
//! else in this crate is `#[no_mangle]`.
#[macro_use]
extern crate log;

pub mod dispatch;
pub mod entry_command;
pub mod entry_instance;
pub mod entry_pipeline;
pub mod entry_resource;
pub mod entry_sync;
pub mod ffi_types;
pub mod format_map;
pub mod header;
pub mod ndhandle;
pub mod negotiate;
pub mod result;
pub mod spec_info;
