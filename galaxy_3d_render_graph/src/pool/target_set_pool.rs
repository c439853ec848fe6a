/// Target set pool
///
/// Target sets are keyed by their resolved info plus the pooled entry whose
/// depth attachment they share. Sharing depth with a different physical
/// target set produces a different key, so a cached set never aliases the
/// wrong depth buffer.

use std::sync::Arc;

use crate::error::Result;
use crate::render_system::{TargetSet, TargetSetInfo};
use crate::{rg_bail, rg_debug};
use super::{
    lock_render_system, PersistentHandle, PoolConfig, PoolStats, PooledHandle, ResourcePool,
    SharedRenderSystem,
};

const SOURCE: &str = "galaxy3d::TargetSetPool";

/// Cache key of a pooled target set
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TargetSetPoolKey {
    pub info: TargetSetInfo,
    pub shared_depth: Option<PooledHandle>,
}

/// Pool of target sets created through the render system
pub struct TargetSetPool {
    render_system: SharedRenderSystem,
    pool: ResourcePool<TargetSetPoolKey, dyn TargetSet>,
}

impl TargetSetPool {
    pub fn new(render_system: SharedRenderSystem, config: PoolConfig) -> Self {
        Self {
            render_system,
            pool: ResourcePool::new(SOURCE, config),
        }
    }

    /// Acquire a target set with the given resolved info
    ///
    /// # Arguments
    ///
    /// * `label` - Debug name forwarded to the render system on creation
    /// * `info` - Size, sample count, layout and double buffering
    /// * `shared_depth` - Pooled target set providing the depth attachment;
    ///   must be acquired (in use) for the duration of this call
    /// * `persistent` - Handle under which the set survives across frames
    pub fn acquire(
        &mut self,
        label: &str,
        info: TargetSetInfo,
        shared_depth: Option<PooledHandle>,
        persistent: Option<PersistentHandle>,
    ) -> Result<(PooledHandle, Arc<dyn TargetSet>)> {
        let depth_provider = match shared_depth {
            Some(provider) => match self.pool.get(provider) {
                Some(target) => Some(target.clone()),
                None => rg_bail!(InvalidResource => SOURCE,
                    "Shared depth provider {:?} of '{}' is not pooled", provider, label),
            },
            None => None,
        };

        let key = TargetSetPoolKey { info: info.clone(), shared_depth };
        let render_system = &self.render_system;
        self.pool.acquire_with(key, persistent, || {
            rg_debug!(SOURCE, "Creating target set '{}' {}x{} ({} samples)",
                label, info.width, info.height, info.sample_count);
            let mut system = lock_render_system(render_system, SOURCE)?;
            system.create_target_set(label, &info, depth_provider.as_ref())
        })
    }

    /// Protect the entry of a persistent handle registered this frame
    pub fn reserve(&mut self, handle: PersistentHandle) {
        self.pool.reserve(handle);
    }

    pub fn release(&mut self, pooled: PooledHandle) -> Result<()> {
        self.pool.release(pooled)
    }

    pub fn get(&self, pooled: PooledHandle) -> Option<&Arc<dyn TargetSet>> {
        self.pool.get(pooled)
    }

    /// Age and evict idle target sets
    pub fn cleanup(&mut self) {
        self.pool.cleanup();
    }

    pub fn clear(&mut self) {
        self.pool.clear();
    }

    pub fn stats(&self) -> PoolStats {
        self.pool.stats()
    }

    pub fn persistent_handle(&self, handle: PersistentHandle) -> Option<PooledHandle> {
        self.pool.persistent_handle(handle)
    }
}

#[cfg(test)]
#[path = "target_set_pool_tests.rs"]
mod tests;
