/// Fixed-budget arena owning the blocks recorded for one frame
///
/// Blocks and their debug names are moved into a `bumpalo::Bump` sized once
/// to the budget, so a frame's recording normally lives in a single chunk.
/// The arena keeps a typed pointer per block and runs every destructor on
/// `reset()` or drop, before the bump memory is reused. Each allocation
/// charges its block size (rounded up to `BLOCK_ALIGN`) plus its name
/// against the byte budget.

use std::mem;
use std::ptr::{self, NonNull};

use bumpalo::Bump;

use super::RenderBlock;

/// Granularity of the byte budget
pub const BLOCK_ALIGN: usize = 16;

/// Index of a block in the arena, valid until the next reset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(pub(crate) u32);

impl BlockId {
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

/// Block and name living in the bump; valid until the next `reset()`
struct BlockSlot {
    block: NonNull<dyn RenderBlock>,
    name: Option<NonNull<str>>,
}

pub struct BlockArena {
    bump: Bump,
    slots: Vec<BlockSlot>,
    used_bytes: usize,
    capacity: usize,
}

impl BlockArena {
    pub fn new(capacity: usize) -> Self {
        Self {
            bump: Bump::with_capacity(capacity),
            slots: Vec::new(),
            used_bytes: 0,
            capacity,
        }
    }

    /// Store a block
    ///
    /// # Panics
    ///
    /// Panics when the block does not fit in the remaining budget.
    pub fn alloc<B: RenderBlock + 'static>(&mut self, block: B, name: Option<&str>) -> BlockId {
        let bytes = Self::charge::<B>(name);
        if self.used_bytes + bytes > self.capacity {
            panic!(
                "RenderContext arena overflow: {} bytes requested, {} of {} used",
                bytes, self.used_bytes, self.capacity
            );
        }
        self.used_bytes += bytes;

        let block: &mut (dyn RenderBlock + 'static) = self.bump.alloc(block);
        let block = NonNull::from(block);
        let name = name.map(|name| NonNull::from(self.bump.alloc_str(name)));

        let id = BlockId(self.slots.len() as u32);
        self.slots.push(BlockSlot { block, name });
        id
    }

    pub fn get_mut(&mut self, id: BlockId) -> Option<&mut (dyn RenderBlock + 'static)> {
        let slot = self.slots.get_mut(id.index())?;
        // SAFETY: the block lives in `bump` until reset(), which needs `&mut self`
        Some(unsafe { slot.block.as_mut() })
    }

    pub fn get(&self, id: BlockId) -> Option<&dyn RenderBlock> {
        let slot = self.slots.get(id.index())?;
        // SAFETY: see get_mut
        Some(unsafe { slot.block.as_ref() })
    }

    pub fn name(&self, id: BlockId) -> Option<&str> {
        let name = self.slots.get(id.index())?.name?;
        // SAFETY: names are copied into `bump` next to their block
        Some(unsafe { name.as_ref() })
    }

    pub fn contains(&self, id: BlockId) -> bool {
        id.index() < self.slots.len()
    }

    /// Drop every block and give the whole budget back
    ///
    /// The bump keeps its largest chunk for the next frame.
    pub fn reset(&mut self) {
        for slot in self.slots.drain(..) {
            // SAFETY: each block was moved into `bump` by alloc() and is
            // dropped exactly once, before the bump memory is reused
            unsafe { ptr::drop_in_place(slot.block.as_ptr()) };
        }
        self.bump.reset();
        self.used_bytes = 0;
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn used_bytes(&self) -> usize {
        self.used_bytes
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Bytes currently reserved by the bump allocator
    pub fn reserved_bytes(&self) -> usize {
        self.bump.allocated_bytes()
    }

    fn charge<B>(name: Option<&str>) -> usize {
        let size = mem::size_of::<B>().max(1) + name.map_or(0, str::len);
        size.div_ceil(BLOCK_ALIGN) * BLOCK_ALIGN
    }
}

impl Drop for BlockArena {
    fn drop(&mut self) {
        self.reset();
    }
}

#[cfg(test)]
#[path = "block_arena_tests.rs"]
mod tests;
