//! Render graph module
//!
//! A render graph is rebuilt every frame: resources and passes are
//! registered, `validate()` orders the passes by dependency depth, and
//! `build()` acquires pooled resources, records every pass into a
//! `RenderContext` and releases what is no longer needed.

mod blocks;
mod dimensions;
mod render_graph;
mod render_pass;
mod resource;
mod resource_id;
mod schedule;

pub use blocks::{BeginPassBlock, ClearBlock, EndPassBlock, SwapBlock};
pub use render_graph::{FrameStats, PassProfiler, RenderGraph, RenderGraphConfig};
pub use render_pass::{InputUsage, PassBuilder, PassInput, PassOutput, RenderPass};
pub use resource::TargetSetDesc;
pub use resource_id::{BufferId, DependencyId, ResourceRef, TargetSetId, TextureId};
pub use schedule::MAX_DEPTH_LEVELS;
