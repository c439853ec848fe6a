/// Buffer trait and buffer descriptor

use std::any::Any;
use bitflags::bitflags;

bitflags! {
    /// How a buffer will be bound
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BufferUsage: u32 {
        const VERTEX   = 1 << 0;
        const INDEX    = 1 << 1;
        const UNIFORM  = 1 << 2;
        const STORAGE  = 1 << 3;
        const INDIRECT = 1 << 4;
        const COPY_SRC = 1 << 5;
        const COPY_DST = 1 << 6;
    }
}

/// Descriptor for a graph-managed buffer
///
/// Buffers have no frame-size dependency, so the descriptor is also the
/// resolved info and the pool key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BufferDesc {
    /// Size in bytes
    pub size: u64,
    /// Usage flags
    pub usage: BufferUsage,
}

impl BufferDesc {
    pub fn new(size: u64, usage: BufferUsage) -> Self {
        Self { size, usage }
    }
}

/// Buffer resource trait
pub trait Buffer: Send + Sync {
    /// Properties the buffer was created with
    fn desc(&self) -> &BufferDesc;

    /// Backend downcast hook
    fn as_any(&self) -> &dyn Any;
}
