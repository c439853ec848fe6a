//! Render context
//!
//! Records render blocks into a fixed-budget arena and routes them through
//! compute, draw, priority and render queues before execution.

mod block_arena;
mod priority;
mod render_block;
mod render_context;

pub use block_arena::{BlockArena, BlockId};
pub use priority::{BucketOrder, PriorityBucket, PriorityMask};
pub use render_block::{CallbackBlock, DrawSortKey, RenderBlock};
pub use render_context::{RenderContext, RenderContextConfig};
