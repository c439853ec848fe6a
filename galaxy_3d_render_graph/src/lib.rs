/*!
# Galaxy 3D Render Graph

Frame-scoped render graph for the Galaxy 3D engine.

Every frame the application describes its passes and the resources that
connect them. The graph orders the passes by dependency, acquires target
sets, buffers and textures from descriptor-keyed pools, merges
consecutive passes on the same target set, and records everything into a
`RenderContext` that is then executed against a `RenderView`.

## Architecture

- **RenderSystem**: Factory trait for GPU resources (backend boundary)
- **Pools**: Descriptor-keyed caches of target sets, buffers and textures
- **RenderContext**: Block arena plus compute/draw/priority/render queues
- **RenderGraph**: Registration, scheduling, resource lifetimes, execution

A CPU-only backend (`render_system::headless`) is provided for tools and tests.
*/

// Internal modules
mod error;
pub mod log;
pub mod pool;
pub mod render_context;
pub mod render_graph;
pub mod render_system;

// Main galaxy3d namespace module
pub mod galaxy3d {
    // Error types
    pub use crate::error::{Error, Result};

    // Render graph
    pub use crate::render_graph::{
        BufferId, DependencyId, FrameStats, InputUsage, PassBuilder, PassProfiler, RenderGraph,
        RenderGraphConfig, RenderPass, ResourceRef, TargetSetDesc, TargetSetId, TextureId,
    };

    // Render context
    pub use crate::render_context::{
        BlockId, CallbackBlock, DrawSortKey, PriorityBucket, PriorityMask, RenderBlock,
        RenderContext, RenderContextConfig,
    };

    // Pools
    pub use crate::pool::{PersistentHandle, PoolConfig, PoolStats, SharedRenderSystem};

    // Logging sub-module (types only, NOT macros)
    pub mod log {
        pub use crate::log::{DefaultLogger, Log, LogEntry, LogSeverity, Logger};
    }

    // Render system boundary
    pub mod render {
        pub use crate::render_system::*;
    }
}

// Re-export math library at crate root
pub use glam;
