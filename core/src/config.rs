//! Ambient runtime configuration (§1): the handful of knobs an operator
//! tunes from the environment rather than the Vulkan API surface itself —
//! how many host threads share fragment-shading work, and whether the JIT
//! should optimise compiled shaders or favour fast compile times. Read once
//! at `Device` creation, the way the teacher's boilerplate crates read
//! their `InstanceConfig` through the `config` crate rather than parsing
//! environment variables by hand.
use ::config::{Config, Environment};

const DEFAULT_FRAGMENT_WORKERS: usize = 4;

#[derive(Clone, Debug)]
pub struct DeviceConfig {
    pub fragment_workers: usize,
    pub jit_optimize: bool,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        DeviceConfig { fragment_workers: DEFAULT_FRAGMENT_WORKERS, jit_optimize: true }
    }
}

impl DeviceConfig {
    /// Reads `VKCPU_FRAGMENT_WORKERS` and `VKCPU_JIT_OPT_LEVEL` (`"speed"` or
    /// `"none"`) from the environment, falling back to the defaults above
    /// when unset or unparsable. A malformed override is logged and ignored
    /// rather than treated as an initialization failure — a driver shouldn't
    /// refuse to start over a typo in an unset-by-default tuning knob.
    pub fn from_env() -> DeviceConfig {
        let mut builder = Config::builder();
        builder = builder.set_default("fragment_workers", DEFAULT_FRAGMENT_WORKERS as i64).unwrap();
        builder = builder.set_default("jit_opt_level", "speed").unwrap();
        builder = builder.add_source(Environment::with_prefix("VKCPU"));

        let cfg = match builder.build() {
            Ok(cfg) => cfg,
            Err(e) => {
                log::warn!("failed to read VKCPU_* environment overrides, using defaults: {}", e);
                return DeviceConfig::default();
            }
        };

        let fragment_workers = cfg.get_int("fragment_workers").map(|v| v.max(1) as usize).unwrap_or(DEFAULT_FRAGMENT_WORKERS);
        let jit_optimize = match cfg.get_string("jit_opt_level").as_deref() {
            Ok("none") => false,
            Ok("speed") | Ok(_) | Err(_) => true,
        };

        DeviceConfig { fragment_workers, jit_optimize }
    }
}
