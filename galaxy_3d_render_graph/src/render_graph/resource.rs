/// Graph-side resource records
///
/// A record describes one target set, buffer or texture registered for the
/// current frame. It is either backed by an external object owned by the
/// caller, or by a descriptor resolved and acquired from a pool during
/// `build()`.

use std::sync::Arc;

use glam::UVec2;

use crate::pool::{PersistentHandle, PooledHandle};
use crate::render_system::{Buffer, BufferDesc, TargetSet, TargetSetLayout, Texture, TextureDesc};
use super::TargetSetId;

// ============================================================================
// Target set descriptor
// ============================================================================

/// Description of a pooled target set
///
/// Width and height of `0` are derived: from the size reference when one
/// is set, from the shared depth target otherwise, and from the frame size
/// passed to `build()` as a last resort. Derived axes are then scaled by
/// `mul / denom` (rounded up); explicit axes are not. Both are clamped to
/// `max` (0 = unlimited).
#[derive(Debug, Clone, PartialEq)]
pub struct TargetSetDesc {
    pub layout: TargetSetLayout,
    pub width: u32,
    pub height: u32,
    /// Use the graph's multisample count instead of a single sample
    pub multisample: bool,
    pub double_buffered: bool,
    pub width_mul: u32,
    pub width_denom: u32,
    pub height_mul: u32,
    pub height_denom: u32,
    pub max_width: u32,
    pub max_height: u32,
    /// Target whose depth/stencil attachment is shared
    pub shared_depth: TargetSetId,
    /// Target whose resolved size is inherited
    pub size_reference: TargetSetId,
}

impl TargetSetDesc {
    /// Frame-sized, single-sampled target set with the given attachments
    pub fn new(layout: TargetSetLayout) -> Self {
        Self {
            layout,
            width: 0,
            height: 0,
            multisample: false,
            double_buffered: false,
            width_mul: 1,
            width_denom: 1,
            height_mul: 1,
            height_denom: 1,
            max_width: 0,
            max_height: 0,
            shared_depth: TargetSetId::INVALID,
            size_reference: TargetSetId::INVALID,
        }
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Scale both axes of the derived size by `mul / denom`
    pub fn with_scale(mut self, mul: u32, denom: u32) -> Self {
        self.width_mul = mul;
        self.width_denom = denom;
        self.height_mul = mul;
        self.height_denom = denom;
        self
    }

    pub fn with_max_size(mut self, max_width: u32, max_height: u32) -> Self {
        self.max_width = max_width;
        self.max_height = max_height;
        self
    }

    pub fn with_multisample(mut self, multisample: bool) -> Self {
        self.multisample = multisample;
        self
    }

    pub fn with_double_buffering(mut self, double_buffered: bool) -> Self {
        self.double_buffered = double_buffered;
        self
    }

    pub fn with_shared_depth(mut self, target: TargetSetId) -> Self {
        self.shared_depth = target;
        self
    }

    pub fn with_size_reference(mut self, target: TargetSetId) -> Self {
        self.size_reference = target;
        self
    }
}

// ============================================================================
// Records
// ============================================================================

/// Where a resource comes from
pub(crate) enum ResourceSource<D, T: ?Sized> {
    /// Owned by the caller, never pooled
    External(Arc<T>),
    /// Acquired from a pool
    Described(D),
}

/// A resource held by the graph between acquire and release
pub(crate) struct Acquired<T: ?Sized> {
    /// Pool entry, `None` for external resources
    pub pooled: Option<PooledHandle>,
    pub resource: Arc<T>,
}

pub(crate) struct TargetResource {
    pub name: String,
    pub persistent: Option<PersistentHandle>,
    pub source: ResourceSource<TargetSetDesc, dyn TargetSet>,
    /// Passes of the schedule that read this target, decremented as they run
    pub input_refs: u32,
    pub output_refs: u32,
    pub resolved: Option<UVec2>,
    pub acquired: Option<Acquired<dyn TargetSet>>,
}

impl TargetResource {
    pub fn new(
        name: &str,
        persistent: Option<PersistentHandle>,
        source: ResourceSource<TargetSetDesc, dyn TargetSet>,
    ) -> Self {
        Self {
            name: name.to_string(),
            persistent,
            source,
            input_refs: 0,
            output_refs: 0,
            resolved: None,
            acquired: None,
        }
    }

    pub fn is_external(&self) -> bool {
        matches!(self.source, ResourceSource::External(_))
    }

    /// Neither external nor persistent
    pub fn is_transient(&self) -> bool {
        !self.is_external() && self.persistent.is_none()
    }

    pub fn desc(&self) -> Option<&TargetSetDesc> {
        match &self.source {
            ResourceSource::Described(desc) => Some(desc),
            ResourceSource::External(_) => None,
        }
    }

    pub fn shared_depth(&self) -> TargetSetId {
        self.desc().map_or(TargetSetId::INVALID, |d| d.shared_depth)
    }

    pub fn size_reference(&self) -> TargetSetId {
        self.desc().map_or(TargetSetId::INVALID, |d| d.size_reference)
    }
}

/// Buffer or texture record
pub(crate) struct GraphResource<D, T: ?Sized> {
    pub name: String,
    pub persistent: Option<PersistentHandle>,
    pub source: ResourceSource<D, T>,
    pub acquired: Option<Acquired<T>>,
}

impl<D, T: ?Sized> GraphResource<D, T> {
    pub fn new(name: &str, persistent: Option<PersistentHandle>, source: ResourceSource<D, T>) -> Self {
        Self {
            name: name.to_string(),
            persistent,
            source,
            acquired: None,
        }
    }
}

pub(crate) type BufferResource = GraphResource<BufferDesc, dyn Buffer>;
pub(crate) type TextureResource = GraphResource<TextureDesc, dyn Texture>;
