/// Clear / load / store configuration of a GPU render pass

use bitflags::bitflags;

bitflags! {
    /// Attachments to clear when a pass begins
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ClearFlags: u32 {
        const COLOR   = 1 << 0;
        const DEPTH   = 1 << 1;
        const STENCIL = 1 << 2;
    }
}

bitflags! {
    /// Attachments whose previous content is loaded when a pass begins
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct LoadMask: u32 {
        const COLOR   = 1 << 0;
        const DEPTH   = 1 << 1;
        const STENCIL = 1 << 2;
    }
}

bitflags! {
    /// Attachments whose content is stored when a pass ends
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct StoreMask: u32 {
        const COLOR   = 1 << 0;
        const DEPTH   = 1 << 1;
        const STENCIL = 1 << 2;
    }
}

/// What to clear and with which values
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClearSpec {
    /// Attachments to clear
    pub flags: ClearFlags,
    /// Clear color (RGBA)
    pub color: [f32; 4],
    /// Depth clear value
    pub depth: f32,
    /// Stencil clear value
    pub stencil: u32,
}

impl ClearSpec {
    /// Clear nothing
    pub const fn none() -> Self {
        Self {
            flags: ClearFlags::empty(),
            color: [0.0, 0.0, 0.0, 1.0],
            depth: 1.0,
            stencil: 0,
        }
    }

    /// Clear color attachments to `color`
    pub const fn color(color: [f32; 4]) -> Self {
        Self {
            flags: ClearFlags::COLOR,
            color,
            depth: 1.0,
            stencil: 0,
        }
    }

    /// Clear color, depth and stencil
    pub const fn all(color: [f32; 4], depth: f32, stencil: u32) -> Self {
        Self {
            flags: ClearFlags::all(),
            color,
            depth,
            stencil,
        }
    }

    /// Also clear depth to `depth`
    pub fn with_depth(mut self, depth: f32) -> Self {
        self.flags |= ClearFlags::DEPTH;
        self.depth = depth;
        self
    }

    /// Whether anything is cleared
    pub fn is_none(&self) -> bool {
        self.flags.is_empty()
    }
}

impl Default for ClearSpec {
    fn default() -> Self {
        Self::none()
    }
}

/// Complete attachment behavior for one GPU render pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PassOps {
    pub clear: ClearSpec,
    pub load: LoadMask,
    pub store: StoreMask,
}

impl Default for PassOps {
    fn default() -> Self {
        Self {
            clear: ClearSpec::none(),
            load: LoadMask::empty(),
            store: StoreMask::all(),
        }
    }
}
