//! Device/queue/resource object model, command-buffer state machine, and
//! descriptor binder (§3, §4.10-§4.12 "C10"-"C12"): everything the ICD
//! entry-point trampolines (`vkcpu-icd`) dispatch into once a caller has a
//! `Device` handle. Grounded on the teacher's own top-level `src/lib.rs`
//! module list (`device`, `resource`, `memory`, `sync`, `handle`) — this
//! crate keeps the same flat module layout rather than nesting everything
//! under one `device` submodule.
pub mod command;
pub mod config;
pub mod descriptor;
pub mod device;
pub mod error;
pub mod handle;
pub mod memory;
pub mod queue;
pub mod resource;
pub mod sync;

pub use device::{Device, Instance, PhysicalDevice};
pub use error::{Error, Result};
pub use handle::{Arena, Handle};
