/// Render blocks emitted by the graph itself
///
/// Pass transitions are recorded as blocks like any other work, so they
/// interleave correctly with the blocks recorded by build callbacks.

use std::sync::Arc;

use crate::error::Result;
use crate::render_context::RenderBlock;
use crate::render_system::{ClearSpec, PassOps, RenderView, TargetSet};

/// Open a render pass on a target set (`None` = output surface)
pub struct BeginPassBlock {
    pub target: Option<Arc<dyn TargetSet>>,
    pub ops: PassOps,
}

impl RenderBlock for BeginPassBlock {
    fn execute(&mut self, view: &mut dyn RenderView) -> Result<()> {
        view.begin_pass(self.target.as_deref(), &self.ops)
    }
}

/// Close the open render pass, resolving multisampled attachments on request
pub struct EndPassBlock {
    pub target: Option<Arc<dyn TargetSet>>,
    pub resolve: bool,
}

impl RenderBlock for EndPassBlock {
    fn execute(&mut self, view: &mut dyn RenderView) -> Result<()> {
        view.end_pass(self.target.as_deref(), self.resolve)
    }
}

/// Clear requested by a pass merged into an already open render pass
pub struct ClearBlock {
    pub clear: ClearSpec,
}

impl RenderBlock for ClearBlock {
    fn execute(&mut self, view: &mut dyn RenderView) -> Result<()> {
        view.clear(&self.clear)
    }
}

/// Flip the front/back buffers of a double-buffered target set
pub struct SwapBlock {
    pub target: Arc<dyn TargetSet>,
}

impl RenderBlock for SwapBlock {
    fn execute(&mut self, view: &mut dyn RenderView) -> Result<()> {
        view.swap_target_set(self.target.as_ref())
    }
}
