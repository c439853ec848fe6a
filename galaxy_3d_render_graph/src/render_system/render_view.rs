/// RenderView trait - the surface render blocks are executed against
///
/// A render view is what `RenderContext::render()` replays the recorded
/// render queue into. Backends translate these calls into real command
/// buffer recording; `target == None` always means the swap-chain output.

use std::any::Any;
use crate::error::Result;
use super::{ClearSpec, PassOps, TargetSet};

pub trait RenderView {
    /// Begin a GPU render pass on `target` (None = output surface)
    fn begin_pass(&mut self, target: Option<&dyn TargetSet>, ops: &PassOps) -> Result<()>;

    /// End the current GPU render pass, resolving MSAA attachments if requested
    fn end_pass(&mut self, target: Option<&dyn TargetSet>, resolve: bool) -> Result<()>;

    /// Clear attachments of the currently open pass
    fn clear(&mut self, clear: &ClearSpec) -> Result<()>;

    /// Swap front/back of a double-buffered target set
    fn swap_target_set(&mut self, target: &dyn TargetSet) -> Result<()>;

    /// Debug label emitted before a named render block executes
    fn debug_marker(&mut self, _name: &str) -> Result<()> {
        Ok(())
    }

    /// Backend downcast hook (lets render blocks reach backend commands)
    fn as_any_mut(&mut self) -> &mut dyn Any;
}
