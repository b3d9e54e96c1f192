//! Execution context.
//!
//! A [`Handle`] owns the stream calls are enqueued on, the pointer-mode flag
//! and the call observer. Changing the pointer mode takes `&mut self`, so
//! calls sharing a handle cannot race with a mode switch.

use crate::observer::{CallObserver, LayerMode, LayerObserver, NoopObserver};
use numrus_core::{BlasResult, PointerMode};
use numrus_device::{device::DEFAULT_CAPACITY_BYTES, Device, Stream};
use serde::Deserialize;

/// Environment variable holding the layer-mode bitmask.
pub const ENV_LAYER: &str = "NUMRUS_LAYER";
/// Environment variable holding the initial pointer mode (`host` / `device`).
pub const ENV_POINTER_MODE: &str = "NUMRUS_POINTER_MODE";
/// Environment variable holding the device capacity in bytes.
pub const ENV_DEVICE_MEMORY: &str = "NUMRUS_DEVICE_MEMORY";

/// Handle construction settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HandleConfig {
    pub pointer_mode: PointerMode,
    pub layer_mode: u32,
    pub device_memory_bytes: usize,
}

impl Default for HandleConfig {
    fn default() -> Self {
        Self {
            pointer_mode: PointerMode::Host,
            layer_mode: 0,
            device_memory_bytes: DEFAULT_CAPACITY_BYTES,
        }
    }
}

impl HandleConfig {
    /// Defaults overridden by `NUMRUS_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`Self::from_env`] with an injectable variable source.
    /// Malformed values are ignored.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        if let Some(raw) = lookup(ENV_LAYER) {
            match raw.trim().parse::<u32>() {
                Ok(mode) => cfg.layer_mode = mode,
                Err(_) => tracing::warn!(var = ENV_LAYER, value = %raw, "ignoring malformed value"),
            }
        }
        if let Some(raw) = lookup(ENV_POINTER_MODE) {
            match PointerMode::parse(&raw) {
                Some(mode) => cfg.pointer_mode = mode,
                None => {
                    tracing::warn!(var = ENV_POINTER_MODE, value = %raw, "ignoring malformed value")
                }
            }
        }
        if let Some(raw) = lookup(ENV_DEVICE_MEMORY) {
            match raw.trim().parse::<usize>() {
                Ok(bytes) => cfg.device_memory_bytes = bytes,
                Err(_) => {
                    tracing::warn!(var = ENV_DEVICE_MEMORY, value = %raw, "ignoring malformed value")
                }
            }
        }
        cfg
    }
}

pub struct Handle {
    stream: Stream,
    pointer_mode: PointerMode,
    layer_mode: LayerMode,
    observer: Box<dyn CallObserver>,
}

impl Handle {
    /// Handle on a fresh default device.
    pub fn new() -> Self {
        Self::from_config(&HandleConfig::default())
    }

    pub fn from_env() -> Self {
        Self::from_config(&HandleConfig::from_env())
    }

    pub fn from_config(cfg: &HandleConfig) -> Self {
        let device = Device::new(cfg.device_memory_bytes);
        let mut handle = Self::with_device(&device);
        handle.pointer_mode = cfg.pointer_mode;
        handle.set_layer_mode(LayerMode(cfg.layer_mode));
        handle
    }

    /// Handle on an existing device, host pointer mode, no logging.
    pub fn with_device(device: &Device) -> Self {
        Self {
            stream: Stream::new(device),
            pointer_mode: PointerMode::Host,
            layer_mode: LayerMode::NONE,
            observer: Box::new(NoopObserver),
        }
    }

    pub fn device(&self) -> &Device {
        self.stream.device()
    }

    pub fn stream(&self) -> &Stream {
        &self.stream
    }

    pub fn pointer_mode(&self) -> PointerMode {
        self.pointer_mode
    }

    pub fn set_pointer_mode(&mut self, mode: PointerMode) {
        self.pointer_mode = mode;
    }

    pub fn layer_mode(&self) -> LayerMode {
        self.layer_mode
    }

    /// Switch layer logging; installs a [`LayerObserver`] (or the no-op one).
    pub fn set_layer_mode(&mut self, mode: LayerMode) {
        self.layer_mode = mode;
        self.observer = if mode.is_empty() {
            Box::new(NoopObserver)
        } else {
            Box::new(LayerObserver::new(mode))
        };
    }

    /// Replace the observer with a custom one.
    pub fn set_observer(&mut self, observer: Box<dyn CallObserver>) {
        self.observer = observer;
    }

    pub fn observer(&self) -> &dyn CallObserver {
        self.observer.as_ref()
    }

    /// Block until the stream drains; a deferred device fault becomes
    /// `internal_error` here.
    pub fn synchronize(&self) -> BlasResult<()> {
        self.stream.synchronize()?;
        Ok(())
    }
}

impl Default for Handle {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Handle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Handle")
            .field("stream", &self.stream.id())
            .field("device", self.device())
            .field("pointer_mode", &self.pointer_mode)
            .field("layer_mode", &self.layer_mode)
            .finish()
    }
}
