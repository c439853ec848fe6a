/// Generic pooled-resource cache shared by the target set, buffer and texture pools.
///
/// Entries live in a `SlotMap` so the graph can hold a `PooledHandle` between
/// `acquire` and `release`; a handle from an evicted entry fails lookups
/// instead of aliasing another resource.
///
/// ```text
/// entries:    SlotMap<PooledHandle, PoolEntry>     all cached resources
/// free:       FxHashMap<Key, Vec<PooledHandle>>    released, reusable
/// persistent: FxHashMap<PersistentHandle, PooledHandle>
/// reserved:   FxHashSet<PersistentHandle>          registered this frame
/// ```

use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};
use slotmap::{new_key_type, SlotMap};

use crate::error::Result;
use crate::{rg_bail, rg_debug, rg_trace, rg_warn};
use super::{PersistentHandle, PoolConfig, PoolStats};

new_key_type! {
    /// Handle to a pooled resource, valid until the entry is evicted
    pub struct PooledHandle;
}

struct PoolEntry<K, T: ?Sized> {
    key: K,
    resource: Arc<T>,
    persistent: Option<PersistentHandle>,
    in_use: bool,
    /// Number of cleanup() calls since the entry was last released
    idle_frames: u32,
}

/// Keyed cache of GPU resources
pub struct ResourcePool<K, T: ?Sized> {
    source: &'static str,
    entries: SlotMap<PooledHandle, PoolEntry<K, T>>,
    free: FxHashMap<K, Vec<PooledHandle>>,
    persistent: FxHashMap<PersistentHandle, PooledHandle>,
    /// Handles whose entries transient requests must not take, until cleanup()
    reserved: FxHashSet<PersistentHandle>,
    config: PoolConfig,
    created: u64,
    reused: u64,
    evicted: u64,
}

impl<K, T> ResourcePool<K, T>
where
    K: Clone + Eq + Hash + Debug,
    T: ?Sized,
{
    /// Create an empty pool; `source` is the log source used for diagnostics
    pub fn new(source: &'static str, config: PoolConfig) -> Self {
        Self {
            source,
            entries: SlotMap::with_key(),
            free: FxHashMap::default(),
            persistent: FxHashMap::default(),
            reserved: FxHashSet::default(),
            config,
            created: 0,
            reused: 0,
            evicted: 0,
        }
    }

    /// Acquire a resource matching `key`
    ///
    /// Persistent requests return the entry cached under their handle when
    /// the key still matches; a changed key drops the old entry and a new one
    /// is adopted or created. Transient requests take any free entry with an
    /// equal key, preferring entries no persistent handle points at and never
    /// taking the entry of a reserved handle. `create` runs only when nothing
    /// in the cache fits.
    pub fn acquire_with<F>(
        &mut self,
        key: K,
        persistent: Option<PersistentHandle>,
        create: F,
    ) -> Result<(PooledHandle, Arc<T>)>
    where
        F: FnOnce() -> Result<Arc<T>>,
    {
        if let Some(handle) = persistent {
            if let Some(pooled) = self.persistent_entry(handle, &key)? {
                return Ok(self.mark_in_use(pooled));
            }
            // Adopt a free transient entry before creating a new one
            if let Some(pooled) = self.take_free(&key, false) {
                self.entries[pooled].persistent = Some(handle);
                self.persistent.insert(handle, pooled);
                return Ok(self.mark_in_use(pooled));
            }
        } else if let Some(pooled) = self.take_free(&key, true) {
            if let Some(stolen) = self.entries[pooled].persistent.take() {
                rg_debug!(self.source,
                    "Transient request reuses memory of unreferenced persistent {:?}", stolen);
                self.persistent.remove(&stolen);
            }
            return Ok(self.mark_in_use(pooled));
        }

        let resource = create()?;
        self.created += 1;
        let pooled = self.entries.insert(PoolEntry {
            key,
            resource: resource.clone(),
            persistent,
            in_use: true,
            idle_frames: 0,
        });
        if let Some(handle) = persistent {
            self.persistent.insert(handle, pooled);
        }
        rg_trace!(self.source, "Created pooled resource {:?}", pooled);
        Ok((pooled, resource))
    }

    /// Keep the entry of `handle` out of reach of transient requests
    ///
    /// Reservations hold until the next `cleanup()`, so a persistent resource
    /// used this frame keeps its content even when a transient with an equal
    /// key is acquired before it.
    pub fn reserve(&mut self, handle: PersistentHandle) {
        self.reserved.insert(handle);
    }

    /// Return a resource to the pool
    pub fn release(&mut self, pooled: PooledHandle) -> Result<()> {
        let entry = match self.entries.get_mut(pooled) {
            Some(entry) => entry,
            None => rg_bail!(InvalidResource => self.source,
                "Release of stale pooled handle {:?}", pooled),
        };
        if !entry.in_use {
            rg_bail!(InvalidResource => self.source,
                "Pooled handle {:?} released twice", pooled);
        }
        entry.in_use = false;
        entry.idle_frames = 0;
        self.free.entry(entry.key.clone()).or_default().push(pooled);
        Ok(())
    }

    /// Age free entries and evict those idle for more than `max_idle_frames`
    ///
    /// Call once per frame, after every resource of the frame was released.
    pub fn cleanup(&mut self) {
        self.reserved.clear();
        let max_idle = self.config.max_idle_frames;
        let mut stale = Vec::new();
        for (pooled, entry) in self.entries.iter_mut() {
            if entry.in_use {
                continue;
            }
            entry.idle_frames += 1;
            if entry.idle_frames > max_idle {
                stale.push(pooled);
            }
        }

        for pooled in stale {
            self.remove_entry(pooled);
        }

        let in_use = self.entries.values().filter(|e| e.in_use).count();
        if in_use > 0 {
            rg_warn!(self.source, "{} pooled resources still in use at cleanup", in_use);
        }
    }

    /// Resource behind a pooled handle
    pub fn get(&self, pooled: PooledHandle) -> Option<&Arc<T>> {
        self.entries.get(pooled).map(|e| &e.resource)
    }

    /// Whether the handle refers to a live entry currently acquired
    pub fn is_in_use(&self, pooled: PooledHandle) -> bool {
        self.entries.get(pooled).is_some_and(|e| e.in_use)
    }

    /// Pooled handle cached for a persistent handle, if any
    pub fn persistent_handle(&self, handle: PersistentHandle) -> Option<PooledHandle> {
        self.persistent.get(&handle).copied()
    }

    /// Counters and occupancy
    pub fn stats(&self) -> PoolStats {
        let live = self.entries.values().filter(|e| e.in_use).count();
        PoolStats {
            live,
            free: self.entries.len() - live,
            created: self.created,
            reused: self.reused,
            evicted: self.evicted,
        }
    }

    /// Drop every cached resource, acquired or not
    pub fn clear(&mut self) {
        self.evicted += self.entries.len() as u64;
        self.entries.clear();
        self.free.clear();
        self.persistent.clear();
        self.reserved.clear();
    }

    fn persistent_entry(&mut self, handle: PersistentHandle, key: &K) -> Result<Option<PooledHandle>> {
        let pooled = match self.persistent.get(&handle) {
            Some(&pooled) => pooled,
            None => return Ok(None),
        };
        let (in_use, same_key) = match self.entries.get(pooled) {
            Some(entry) => (entry.in_use, entry.key == *key),
            None => {
                self.persistent.remove(&handle);
                return Ok(None);
            }
        };
        if in_use {
            rg_bail!(InvalidResource => self.source,
                "Persistent handle {:?} acquired twice in one frame", handle);
        }
        if same_key {
            self.unlink_free(pooled);
            return Ok(Some(pooled));
        }

        rg_warn!(self.source,
            "Persistent handle {:?} requested with a new descriptor, recreating", handle);
        self.remove_entry(pooled);
        Ok(None)
    }

    /// Pop a free entry for `key`; unreserved persistent entries only when
    /// `allow_steal`
    fn take_free(&mut self, key: &K, allow_steal: bool) -> Option<PooledHandle> {
        let bucket = self.free.get_mut(key)?;
        let entries = &self.entries;
        let reserved = &self.reserved;
        let position = bucket
            .iter()
            .rposition(|&p| entries[p].persistent.is_none())
            .or_else(|| {
                if !allow_steal {
                    return None;
                }
                bucket
                    .iter()
                    .rposition(|&p| entries[p].persistent.is_some_and(|h| !reserved.contains(&h)))
            })?;
        Some(bucket.remove(position))
    }

    fn unlink_free(&mut self, pooled: PooledHandle) {
        let key = &self.entries[pooled].key;
        if let Some(bucket) = self.free.get_mut(key) {
            bucket.retain(|&p| p != pooled);
        }
    }

    fn mark_in_use(&mut self, pooled: PooledHandle) -> (PooledHandle, Arc<T>) {
        self.reused += 1;
        let entry = &mut self.entries[pooled];
        entry.in_use = true;
        entry.idle_frames = 0;
        (pooled, entry.resource.clone())
    }

    fn remove_entry(&mut self, pooled: PooledHandle) {
        self.unlink_free(pooled);
        if let Some(entry) = self.entries.remove(pooled) {
            if let Some(handle) = entry.persistent {
                self.persistent.remove(&handle);
            }
            self.evicted += 1;
            rg_trace!(self.source, "Evicted pooled resource {:?}", pooled);
        }
        self.free.retain(|_, bucket| !bucket.is_empty());
    }
}

#[cfg(test)]
#[path = "resource_pool_tests.rs"]
mod tests;
