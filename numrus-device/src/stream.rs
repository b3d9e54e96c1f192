//! Ordered execution streams.
//!
//! Work enqueued on a [`Stream`] completes in enqueue order. The emulated
//! device executes each item as it is enqueued; a fault raised by the work
//! is held on the stream and only surfaces from [`Stream::synchronize`].
//! Until then the stream is poisoned and later work is dropped.

use crate::device::Device;
use crate::error::{DeviceError, Result};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

static NEXT_STREAM_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Default)]
struct StreamState {
    pending_fault: Option<DeviceError>,
    enqueued: u64,
    completed: u64,
}

#[derive(Debug)]
pub struct Stream {
    id: u64,
    device: Device,
    state: Mutex<StreamState>,
}

impl Stream {
    pub fn new(device: &Device) -> Self {
        Self {
            id: NEXT_STREAM_ID.fetch_add(1, Ordering::Relaxed),
            device: device.clone(),
            state: Mutex::new(StreamState::default()),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    fn state(&self) -> std::sync::MutexGuard<'_, StreamState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Enqueue `work`. Never reports the work's failure directly.
    pub fn enqueue<F>(&self, label: &'static str, work: F)
    where
        F: FnOnce() -> std::result::Result<(), String>,
    {
        let mut state = self.state();
        state.enqueued += 1;
        if state.pending_fault.is_some() {
            tracing::debug!(stream = self.id, label, "stream poisoned, work dropped");
            return;
        }
        match work() {
            Ok(()) => state.completed += 1,
            Err(message) => {
                tracing::warn!(stream = self.id, label, %message, "device fault");
                state.pending_fault = Some(DeviceError::Fault {
                    stream: self.id,
                    message,
                });
            }
        }
    }

    /// Wait for all enqueued work and report (then clear) a pending fault.
    pub fn synchronize(&self) -> Result<()> {
        match self.state().pending_fault.take() {
            Some(fault) => Err(fault),
            None => Ok(()),
        }
    }

    /// Record a fault as if raised by in-flight work.
    pub fn inject_fault(&self, message: impl Into<String>) {
        self.state().pending_fault = Some(DeviceError::Fault {
            stream: self.id,
            message: message.into(),
        });
    }

    /// Number of work items enqueued so far.
    pub fn enqueued(&self) -> u64 {
        self.state().enqueued
    }

    /// Number of work items that ran to completion.
    pub fn completed(&self) -> u64 {
        self.state().completed
    }
}
