/// Render block trait and implementations.
///
/// A render block is one unit of recorded work (a draw, a dispatch, a pass
/// transition) executed against a `RenderView` when the context renders.

use crate::error::Result;
use crate::render_system::RenderView;

/// Sort inputs used by the priority buckets
///
/// Opaque buckets sort by quantized `distance` then `shader`, alpha
/// buckets by `distance` only. Blocks queued in insertion-ordered
/// buckets never look at their key.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DrawSortKey {
    /// Distance from the camera, in world units
    pub distance: f32,
    /// Shader (pipeline state) identifier used to batch opaque draws
    pub shader: u32,
}

impl DrawSortKey {
    pub fn new(distance: f32, shader: u32) -> Self {
        Self { distance, shader }
    }
}

/// Recorded unit of work
pub trait RenderBlock {
    /// Execute the block against the view
    fn execute(&mut self, view: &mut dyn RenderView) -> Result<()>;

    /// Key used when the block is sorted inside a priority bucket
    fn sort_key(&self) -> DrawSortKey {
        DrawSortKey::default()
    }
}

/// Closure-based render block
///
/// Used by pass build callbacks for ad-hoc work that does not warrant a
/// dedicated block type. The closure is stored inline, so its captures
/// live in the arena and count against the context budget.
pub struct CallbackBlock<F> {
    callback: F,
    sort_key: DrawSortKey,
}

impl<F> CallbackBlock<F>
where
    F: FnMut(&mut dyn RenderView) -> Result<()>,
{
    pub fn new(callback: F) -> Self {
        Self {
            callback,
            sort_key: DrawSortKey::default(),
        }
    }

    /// Attach a sort key (for blocks queued with `draw_priority`)
    pub fn with_sort_key(mut self, sort_key: DrawSortKey) -> Self {
        self.sort_key = sort_key;
        self
    }
}

impl<F> RenderBlock for CallbackBlock<F>
where
    F: FnMut(&mut dyn RenderView) -> Result<()>,
{
    fn execute(&mut self, view: &mut dyn RenderView) -> Result<()> {
        (self.callback)(view)
    }

    fn sort_key(&self) -> DrawSortKey {
        self.sort_key
    }
}
