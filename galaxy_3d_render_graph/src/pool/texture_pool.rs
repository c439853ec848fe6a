/// Texture pool
///
/// Keyed by the resolved texture info, so frame-sized descriptors map to a
/// different entry whenever the frame dimensions change.

use std::sync::Arc;

use crate::error::Result;
use crate::render_system::{Texture, TextureInfo};
use crate::rg_debug;
use super::{
    lock_render_system, PersistentHandle, PoolConfig, PoolStats, PooledHandle, ResourcePool,
    SharedRenderSystem,
};

const SOURCE: &str = "galaxy3d::TexturePool";

pub struct TexturePool {
    render_system: SharedRenderSystem,
    pool: ResourcePool<TextureInfo, dyn Texture>,
}

impl TexturePool {
    pub fn new(render_system: SharedRenderSystem, config: PoolConfig) -> Self {
        Self {
            render_system,
            pool: ResourcePool::new(SOURCE, config),
        }
    }

    pub fn acquire(
        &mut self,
        label: &str,
        info: &TextureInfo,
        persistent: Option<PersistentHandle>,
    ) -> Result<(PooledHandle, Arc<dyn Texture>)> {
        let render_system = &self.render_system;
        self.pool.acquire_with(info.clone(), persistent, || {
            rg_debug!(SOURCE, "Creating texture '{}' {}x{} {:?}",
                label, info.width, info.height, info.format);
            let mut system = lock_render_system(render_system, SOURCE)?;
            system.create_texture(label, info)
        })
    }

    /// Protect the entry of a persistent handle registered this frame
    pub fn reserve(&mut self, handle: PersistentHandle) {
        self.pool.reserve(handle);
    }

    pub fn release(&mut self, pooled: PooledHandle) -> Result<()> {
        self.pool.release(pooled)
    }

    pub fn get(&self, pooled: PooledHandle) -> Option<&Arc<dyn Texture>> {
        self.pool.get(pooled)
    }

    pub fn cleanup(&mut self) {
        self.pool.cleanup();
    }

    pub fn clear(&mut self) {
        self.pool.clear();
    }

    pub fn stats(&self) -> PoolStats {
        self.pool.stats()
    }
}
