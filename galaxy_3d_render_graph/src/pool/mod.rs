//! Resource pools
//!
//! Caches of target sets, buffers and textures keyed by descriptor. The
//! render graph acquires a resource for the span of passes that use it
//! and releases it as soon as the last reader ran, so later resources
//! with an equal descriptor reuse the same GPU memory within the frame.
//!
//! Resources registered with a `PersistentHandle` come back across frames
//! with their previous content, as long as their descriptor is unchanged.

mod resource_pool;
mod target_set_pool;
mod buffer_pool;
mod texture_pool;

pub use resource_pool::{PooledHandle, ResourcePool};
pub use target_set_pool::{TargetSetPool, TargetSetPoolKey};
pub use buffer_pool::BufferPool;
pub use texture_pool::TexturePool;

use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::Result;
use crate::render_system::RenderSystem;
use crate::rg_err;

/// Caller-chosen identity of a persistent resource, stable across frames
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PersistentHandle(pub u64);

/// Pool configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolConfig {
    /// Frames a released resource may stay unused before it is destroyed
    pub max_idle_frames: u32,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self { max_idle_frames: 4 }
    }
}

/// Pool occupancy and lifetime counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Entries currently acquired
    pub live: usize,
    /// Entries cached and available
    pub free: usize,
    /// Resources created through the render system
    pub created: u64,
    /// Acquisitions served from the cache
    pub reused: u64,
    /// Entries destroyed by cleanup, descriptor changes or `clear`
    pub evicted: u64,
}

/// Render system shared between the pools of a graph
pub type SharedRenderSystem = Arc<Mutex<dyn RenderSystem>>;

pub(crate) fn lock_render_system<'a>(
    render_system: &'a SharedRenderSystem,
    source: &str,
) -> Result<MutexGuard<'a, dyn RenderSystem + 'static>> {
    render_system
        .lock()
        .map_err(|_| rg_err!(source, "Render system lock poisoned"))
}
