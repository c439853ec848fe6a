/// Headless render system (no GPU required)
///
/// CPU-side implementation of the render system boundary. Resources only
/// track their properties and a small amount of "content" so tests can
/// observe persistence; the view records every command as a string.
///
/// Allocation counters and an optional memory budget make pool reuse and
/// out-of-memory paths observable.

use std::any::Any;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::{Error, Result};
use super::{
    Buffer, BufferDesc, ClearSpec, PassOps, RenderSystem, RenderView, TargetSet,
    TargetSetInfo, Texture, TextureInfo,
};

// ============================================================================
// Shared allocation tracking
// ============================================================================

/// Live byte counter shared between the system and the resources it created
#[derive(Debug, Default)]
struct MemoryTracker {
    live_bytes: AtomicU64,
}

impl MemoryTracker {
    fn free(&self, bytes: u64) {
        self.live_bytes.fetch_sub(bytes, Ordering::Relaxed);
    }
}

/// Creation counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeadlessStats {
    /// Target sets created since construction
    pub target_sets_created: u32,
    /// Buffers created since construction
    pub buffers_created: u32,
    /// Textures created since construction
    pub textures_created: u32,
    /// Bytes currently held by live resources
    pub live_bytes: u64,
}

// ============================================================================
// Headless Target Set
// ============================================================================

/// CPU-side target set
///
/// Each buffer of the set holds a single `u64` "content" value. Writes go to
/// the current buffer; `swap` flips current/previous for double-buffered sets.
#[derive(Debug)]
pub struct HeadlessTargetSet {
    info: TargetSetInfo,
    label: String,
    serial: u64,
    shared_depth_serial: Option<u64>,
    current: AtomicUsize,
    contents: Mutex<[u64; 2]>,
    memory: Arc<MemoryTracker>,
    bytes: u64,
}

impl HeadlessTargetSet {
    /// Unique creation number (stable identity across pool round trips)
    pub fn serial(&self) -> u64 {
        self.serial
    }

    /// Debug label given at creation
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Serial of the target set whose depth attachment this one shares
    pub fn shared_depth_serial(&self) -> Option<u64> {
        self.shared_depth_serial
    }

    /// Write content into the current buffer
    pub fn write_content(&self, value: u64) {
        let index = self.current.load(Ordering::Relaxed);
        if let Ok(mut contents) = self.contents.lock() {
            contents[index] = value;
        }
    }

    /// Content of the current buffer
    pub fn content(&self) -> u64 {
        let index = self.current.load(Ordering::Relaxed);
        self.contents.lock().map(|c| c[index]).unwrap_or(0)
    }

    /// Content of the other buffer of a double-buffered set
    pub fn previous_content(&self) -> u64 {
        let index = self.current.load(Ordering::Relaxed) ^ 1;
        self.contents.lock().map(|c| c[index]).unwrap_or(0)
    }

    fn swap(&self) {
        if self.info.double_buffered {
            self.current.fetch_xor(1, Ordering::Relaxed);
        }
    }
}

impl TargetSet for HeadlessTargetSet {
    fn info(&self) -> &TargetSetInfo {
        &self.info
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for HeadlessTargetSet {
    fn drop(&mut self) {
        self.memory.free(self.bytes);
    }
}

// ============================================================================
// Headless Buffer / Texture
// ============================================================================

#[derive(Debug)]
pub struct HeadlessBuffer {
    desc: BufferDesc,
    serial: u64,
    memory: Arc<MemoryTracker>,
}

impl HeadlessBuffer {
    pub fn serial(&self) -> u64 {
        self.serial
    }
}

impl Buffer for HeadlessBuffer {
    fn desc(&self) -> &BufferDesc {
        &self.desc
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for HeadlessBuffer {
    fn drop(&mut self) {
        self.memory.free(self.desc.size);
    }
}

#[derive(Debug)]
pub struct HeadlessTexture {
    info: TextureInfo,
    serial: u64,
    memory: Arc<MemoryTracker>,
}

impl HeadlessTexture {
    pub fn serial(&self) -> u64 {
        self.serial
    }
}

impl Texture for HeadlessTexture {
    fn info(&self) -> &TextureInfo {
        &self.info
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for HeadlessTexture {
    fn drop(&mut self) {
        self.memory.free(self.info.memory_size());
    }
}

// ============================================================================
// Headless Render System
// ============================================================================

/// CPU-only render system
pub struct HeadlessRenderSystem {
    stats: HeadlessStats,
    memory: Arc<MemoryTracker>,
    memory_budget: Option<u64>,
    max_sample_count: u32,
    next_serial: u64,
}

impl HeadlessRenderSystem {
    /// Create a headless system with no memory limit and up to 8x MSAA
    pub fn new() -> Self {
        Self {
            stats: HeadlessStats::default(),
            memory: Arc::new(MemoryTracker::default()),
            memory_budget: None,
            max_sample_count: 8,
            next_serial: 1,
        }
    }

    /// Fail creations that would push live memory above `bytes`
    pub fn with_memory_budget(mut self, bytes: u64) -> Self {
        self.memory_budget = Some(bytes);
        self
    }

    /// Change the memory budget (None = unlimited)
    pub fn set_memory_budget(&mut self, bytes: Option<u64>) {
        self.memory_budget = bytes;
    }

    /// Creation counters and live memory
    pub fn stats(&self) -> HeadlessStats {
        HeadlessStats {
            live_bytes: self.memory.live_bytes.load(Ordering::Relaxed),
            ..self.stats
        }
    }

    fn reserve(&mut self, bytes: u64) -> Result<u64> {
        let live = self.memory.live_bytes.load(Ordering::Relaxed);
        if let Some(budget) = self.memory_budget {
            if live + bytes > budget {
                return Err(Error::OutOfMemory);
            }
        }
        self.memory.live_bytes.fetch_add(bytes, Ordering::Relaxed);
        let serial = self.next_serial;
        self.next_serial += 1;
        Ok(serial)
    }
}

impl Default for HeadlessRenderSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderSystem for HeadlessRenderSystem {
    fn create_target_set(
        &mut self,
        label: &str,
        info: &TargetSetInfo,
        shared_depth: Option<&Arc<dyn TargetSet>>,
    ) -> Result<Arc<dyn TargetSet>> {
        if info.sample_count > self.max_sample_count {
            return Err(Error::BackendError(format!(
                "Sample count {} exceeds device maximum {}",
                info.sample_count, self.max_sample_count
            )));
        }

        let bytes = info.memory_size();
        let serial = self.reserve(bytes)?;
        self.stats.target_sets_created += 1;

        let shared_depth_serial = shared_depth
            .and_then(|t| t.as_any().downcast_ref::<HeadlessTargetSet>())
            .map(|t| t.serial());

        Ok(Arc::new(HeadlessTargetSet {
            info: info.clone(),
            label: label.to_string(),
            serial,
            shared_depth_serial,
            current: AtomicUsize::new(0),
            contents: Mutex::new([0; 2]),
            memory: self.memory.clone(),
            bytes,
        }))
    }

    fn create_buffer(&mut self, _label: &str, desc: &BufferDesc) -> Result<Arc<dyn Buffer>> {
        let serial = self.reserve(desc.size)?;
        self.stats.buffers_created += 1;
        Ok(Arc::new(HeadlessBuffer {
            desc: desc.clone(),
            serial,
            memory: self.memory.clone(),
        }))
    }

    fn create_texture(&mut self, _label: &str, info: &TextureInfo) -> Result<Arc<dyn Texture>> {
        let serial = self.reserve(info.memory_size())?;
        self.stats.textures_created += 1;
        Ok(Arc::new(HeadlessTexture {
            info: info.clone(),
            serial,
            memory: self.memory.clone(),
        }))
    }

    fn max_sample_count(&self) -> u32 {
        self.max_sample_count
    }
}

// ============================================================================
// Headless Render View
// ============================================================================

/// Render view that records every command as a string
///
/// Target sets are named by their label, the output surface is `output`.
#[derive(Debug, Default)]
pub struct HeadlessRenderView {
    pub commands: Vec<String>,
    pass_open: bool,
}

impl HeadlessRenderView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a backend command (used by render blocks after downcasting)
    pub fn record(&mut self, command: impl Into<String>) {
        self.commands.push(command.into());
    }

    /// Whether a pass is currently open
    pub fn is_pass_open(&self) -> bool {
        self.pass_open
    }

    fn target_name(target: Option<&dyn TargetSet>) -> String {
        match target {
            None => "output".to_string(),
            Some(t) => t
                .as_any()
                .downcast_ref::<HeadlessTargetSet>()
                .map(|h| h.label().to_string())
                .unwrap_or_else(|| "external".to_string()),
        }
    }
}

impl RenderView for HeadlessRenderView {
    fn begin_pass(&mut self, target: Option<&dyn TargetSet>, ops: &PassOps) -> Result<()> {
        if self.pass_open {
            return Err(Error::BackendError("begin_pass while a pass is open".to_string()));
        }
        self.pass_open = true;
        let name = Self::target_name(target);
        if ops.clear.is_none() {
            self.commands.push(format!("begin_pass:{}", name));
        } else {
            self.commands.push(format!("begin_pass:{}:clear", name));
        }
        Ok(())
    }

    fn end_pass(&mut self, target: Option<&dyn TargetSet>, resolve: bool) -> Result<()> {
        if !self.pass_open {
            return Err(Error::BackendError("end_pass without an open pass".to_string()));
        }
        self.pass_open = false;
        let name = Self::target_name(target);
        if resolve {
            self.commands.push(format!("resolve:{}", name));
        }
        self.commands.push(format!("end_pass:{}", name));
        Ok(())
    }

    fn clear(&mut self, _clear: &ClearSpec) -> Result<()> {
        self.commands.push("clear".to_string());
        Ok(())
    }

    fn swap_target_set(&mut self, target: &dyn TargetSet) -> Result<()> {
        if let Some(headless) = target.as_any().downcast_ref::<HeadlessTargetSet>() {
            headless.swap();
        }
        self.commands.push(format!("swap:{}", Self::target_name(Some(target))));
        Ok(())
    }

    fn debug_marker(&mut self, name: &str) -> Result<()> {
        self.commands.push(format!("marker:{}", name));
        Ok(())
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
#[path = "headless_tests.rs"]
mod tests;
