//! Configuration that the runtime, binding demos and CLI can serialize/deserialize.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AltvecConfig {
    /// Buffer size (elements) the host uses when iterating a vector by region.
    pub region_chunk: usize,

    /// Collect automatically after this many allocations. 0 disables it.
    pub gc_interval: usize,

    /// Run "on exit" finalizers when a runtime is dropped.
    pub finalize_on_exit: bool,

    /// Element count for the borrowed-buffer demo.
    pub demo_len: usize,

    /// Optional seed for the demo's random buffer.
    pub seed: Option<u64>,
}

impl Default for AltvecConfig {
    fn default() -> Self {
        Self {
            region_chunk: 512,
            gc_interval: 0,
            finalize_on_exit: true,
            demo_len: 10,
            seed: None,
        }
    }
}

/// Snapshot of the fields the host runtime consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    pub region_chunk: usize,
    pub gc_interval: usize,
    pub finalize_on_exit: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        AltvecConfig::default().runtime_config()
    }
}

impl AltvecConfig {
    /// Create a config from environment variables, falling back to defaults.
    ///
    /// Environment variables:
    /// - `ALTVEC_REGION_CHUNK`: region buffer size in elements
    /// - `ALTVEC_GC_INTERVAL`: allocations between automatic collections
    /// - `ALTVEC_FINALIZE_ON_EXIT`: `true`/`false`
    /// - `ALTVEC_DEMO_LEN`: borrowed demo length
    /// - `ALTVEC_SEED`: random seed
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(s) = std::env::var("ALTVEC_REGION_CHUNK") {
            if let Ok(v) = s.parse::<usize>() {
                cfg.region_chunk = v;
            }
        }

        if let Ok(s) = std::env::var("ALTVEC_GC_INTERVAL") {
            if let Ok(v) = s.parse::<usize>() {
                cfg.gc_interval = v;
            }
        }

        if let Ok(s) = std::env::var("ALTVEC_FINALIZE_ON_EXIT") {
            if let Ok(v) = s.parse::<bool>() {
                cfg.finalize_on_exit = v;
            }
        }

        if let Ok(s) = std::env::var("ALTVEC_DEMO_LEN") {
            if let Ok(v) = s.parse::<usize>() {
                cfg.demo_len = v;
            }
        }

        if let Ok(s) = std::env::var("ALTVEC_SEED") {
            if let Ok(v) = s.parse::<u64>() {
                cfg.seed = Some(v);
            }
        }

        cfg
    }

    /// Parse a JSON document; missing fields take their defaults.
    pub fn from_json_str(s: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.region_chunk == 0 {
            return Err(Error::Config("region_chunk must be at least 1".into()));
        }
        Ok(())
    }

    /// Produce the configuration snapshot used by the host runtime.
    pub fn runtime_config(&self) -> RuntimeConfig {
        RuntimeConfig {
            region_chunk: self.region_chunk.max(1),
            gc_interval: self.gc_interval,
            finalize_on_exit: self.finalize_on_exit,
        }
    }
}
