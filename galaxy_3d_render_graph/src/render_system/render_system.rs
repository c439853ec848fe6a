/// RenderSystem trait - GPU resource factory used by the resource pools

use std::sync::Arc;
use crate::error::Result;
use super::{Buffer, BufferDesc, TargetSet, TargetSetInfo, Texture, TextureInfo};

/// GPU resource factory
///
/// This is the only backend entry point the render graph needs: the pools
/// call it when no cached resource matches a request. Implemented by
/// backend renderers and by `HeadlessRenderSystem`.
pub trait RenderSystem: Send + Sync {
    /// Create a target set
    ///
    /// # Arguments
    ///
    /// * `label` - Debug name of the graph resource that triggered creation
    /// * `info` - Resolved size, samples and attachment formats
    /// * `shared_depth` - Target set whose depth/stencil attachment must be
    ///   shared instead of allocating a new one
    fn create_target_set(
        &mut self,
        label: &str,
        info: &TargetSetInfo,
        shared_depth: Option<&Arc<dyn TargetSet>>,
    ) -> Result<Arc<dyn TargetSet>>;

    /// Create a buffer
    fn create_buffer(&mut self, label: &str, desc: &BufferDesc) -> Result<Arc<dyn Buffer>>;

    /// Create a texture
    fn create_texture(&mut self, label: &str, info: &TextureInfo) -> Result<Arc<dyn Texture>>;

    /// Highest MSAA sample count the device supports
    fn max_sample_count(&self) -> u32 {
        1
    }
}
