/// Render context - block arena plus command queues
///
/// ```text
///  compute ─────────────────────────────┐
///  draw ◄── merge_priority_into_draw ◄── priority[Setup..Overlay]
///    │                                  │
///    └──────────► render ◄──────────────┘ ◄── direct
/// ```
///
/// `render()` executes the render queue in order then flushes everything.

use crate::error::Result;
use crate::render_system::RenderView;
use crate::{rg_trace, rg_warn};
use super::priority::sort_bucket;
use super::{BlockArena, BlockId, PriorityBucket, PriorityMask, RenderBlock};

/// Render context configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderContextConfig {
    /// Byte budget of the block arena
    pub heap_size: usize,
    /// Distance bucket size for front-to-back sorting
    pub opaque_distance_quantum: f32,
}

impl Default for RenderContextConfig {
    fn default() -> Self {
        Self {
            heap_size: 4 * 1024 * 1024,
            opaque_distance_quantum: 10.0,
        }
    }
}

/// Per-frame command recording context
pub struct RenderContext {
    arena: BlockArena,
    compute_queue: Vec<BlockId>,
    draw_queue: Vec<BlockId>,
    priority_queues: [Vec<BlockId>; PriorityBucket::COUNT],
    render_queue: Vec<BlockId>,
    distance_quantum: f32,
}

impl RenderContext {
    /// Create a context with a `heap_size` byte arena and default sorting
    pub fn new(heap_size: usize) -> Self {
        Self::with_config(RenderContextConfig {
            heap_size,
            ..RenderContextConfig::default()
        })
    }

    pub fn with_config(config: RenderContextConfig) -> Self {
        Self {
            arena: BlockArena::new(config.heap_size),
            compute_queue: Vec::new(),
            draw_queue: Vec::new(),
            priority_queues: Default::default(),
            render_queue: Vec::new(),
            distance_quantum: config.opaque_distance_quantum,
        }
    }

    // ===== ALLOCATION =====

    /// Move a block into the arena
    ///
    /// # Panics
    ///
    /// Panics when the arena budget is exhausted.
    pub fn alloc<B: RenderBlock + 'static>(&mut self, block: B) -> BlockId {
        self.arena.alloc(block, None)
    }

    /// Move a block into the arena with a debug name
    ///
    /// The name is emitted as a debug marker right before the block executes.
    pub fn alloc_named<B: RenderBlock + 'static>(&mut self, name: &str, block: B) -> BlockId {
        self.arena.alloc(block, Some(name))
    }

    // ===== QUEUING =====

    pub fn compute(&mut self, block: BlockId) {
        self.check(block);
        self.compute_queue.push(block);
    }

    pub fn draw(&mut self, block: BlockId) {
        self.check(block);
        self.draw_queue.push(block);
    }

    pub fn draw_priority(&mut self, bucket: PriorityBucket, block: BlockId) {
        self.check(block);
        self.priority_queues[bucket.index()].push(block);
    }

    /// Append a block straight to the render queue
    pub fn direct(&mut self, block: BlockId) {
        self.check(block);
        self.render_queue.push(block);
    }

    // ===== MERGING =====

    /// Sort the selected priority buckets and append them to the draw queue
    ///
    /// Buckets are appended in `PriorityBucket` order and emptied.
    pub fn merge_priority_into_draw(&mut self, mask: PriorityMask) {
        for bucket in PriorityBucket::ALL {
            if !mask.contains(bucket.mask()) {
                continue;
            }
            let queue = &mut self.priority_queues[bucket.index()];
            if queue.is_empty() {
                continue;
            }
            sort_bucket(queue, bucket.order(), &self.arena, self.distance_quantum);
            self.draw_queue.append(queue);
        }
    }

    pub fn merge_compute_into_render(&mut self) {
        self.render_queue.append(&mut self.compute_queue);
    }

    pub fn merge_draw_into_render(&mut self) {
        self.render_queue.append(&mut self.draw_queue);
    }

    // ===== EXECUTION =====

    /// Execute the render queue against `view`, then flush
    ///
    /// Blocks still waiting in the compute, draw or priority queues are
    /// dropped with a warning. The context is flushed even when a block
    /// fails; the first error is returned.
    pub fn render(&mut self, view: &mut dyn RenderView) -> Result<()> {
        if self.have_pending_computes() || self.have_pending_draws() {
            rg_warn!("galaxy3d::RenderContext",
                "render() with unmerged compute or draw blocks, they are dropped");
        }

        rg_trace!("galaxy3d::RenderContext", "Executing {} blocks", self.render_queue.len());
        let result = self.execute_render_queue(view);
        self.flush();
        result
    }

    /// Drop every block and empty every queue
    pub fn flush(&mut self) {
        self.compute_queue.clear();
        self.draw_queue.clear();
        for queue in &mut self.priority_queues {
            queue.clear();
        }
        self.render_queue.clear();
        self.arena.reset();
    }

    // ===== QUERIES =====

    pub fn have_pending_computes(&self) -> bool {
        !self.compute_queue.is_empty()
    }

    /// Whether the draw queue or any priority bucket holds blocks
    pub fn have_pending_draws(&self) -> bool {
        !self.draw_queue.is_empty() || self.priority_queues.iter().any(|q| !q.is_empty())
    }

    pub fn render_queue_len(&self) -> usize {
        self.render_queue.len()
    }

    /// Blocks currently owned by the arena
    pub fn block_count(&self) -> usize {
        self.arena.len()
    }

    pub fn used_bytes(&self) -> usize {
        self.arena.used_bytes()
    }

    pub fn heap_size(&self) -> usize {
        self.arena.capacity()
    }

    fn check(&self, block: BlockId) {
        assert!(self.arena.contains(block), "BlockId {:?} used after flush", block);
    }

    fn execute_render_queue(&mut self, view: &mut dyn RenderView) -> Result<()> {
        for &id in &self.render_queue {
            if let Some(name) = self.arena.name(id) {
                view.debug_marker(name)?;
            }
            if let Some(block) = self.arena.get_mut(id) {
                block.execute(view)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "render_context_tests.rs"]
mod tests;
