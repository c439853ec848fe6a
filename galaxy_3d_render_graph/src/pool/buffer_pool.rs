/// Buffer pool, keyed by buffer descriptor

use std::sync::Arc;

use crate::error::Result;
use crate::render_system::{Buffer, BufferDesc};
use crate::rg_debug;
use super::{
    lock_render_system, PersistentHandle, PoolConfig, PoolStats, PooledHandle, ResourcePool,
    SharedRenderSystem,
};

const SOURCE: &str = "galaxy3d::BufferPool";

pub struct BufferPool {
    render_system: SharedRenderSystem,
    pool: ResourcePool<BufferDesc, dyn Buffer>,
}

impl BufferPool {
    pub fn new(render_system: SharedRenderSystem, config: PoolConfig) -> Self {
        Self {
            render_system,
            pool: ResourcePool::new(SOURCE, config),
        }
    }

    pub fn acquire(
        &mut self,
        label: &str,
        desc: &BufferDesc,
        persistent: Option<PersistentHandle>,
    ) -> Result<(PooledHandle, Arc<dyn Buffer>)> {
        let render_system = &self.render_system;
        self.pool.acquire_with(desc.clone(), persistent, || {
            rg_debug!(SOURCE, "Creating buffer '{}' ({} bytes)", label, desc.size);
            let mut system = lock_render_system(render_system, SOURCE)?;
            system.create_buffer(label, desc)
        })
    }

    /// Protect the entry of a persistent handle registered this frame
    pub fn reserve(&mut self, handle: PersistentHandle) {
        self.pool.reserve(handle);
    }

    pub fn release(&mut self, pooled: PooledHandle) -> Result<()> {
        self.pool.release(pooled)
    }

    pub fn get(&self, pooled: PooledHandle) -> Option<&Arc<dyn Buffer>> {
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
