/// Target set trait, formats, and target set layout/info
///
/// A target set is a group of render attachments (up to N color attachments
/// plus an optional depth/stencil attachment) that a render pass draws into.

use std::any::Any;

/// Pixel format of an attachment or texture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(non_camel_case_types)]
pub enum TextureFormat {
    R8G8B8A8_UNORM,
    R8G8B8A8_SRGB,
    B8G8R8A8_UNORM,
    B8G8R8A8_SRGB,
    R16G16B16A16_SFLOAT,
    R11G11B10_UFLOAT,
    R32_SFLOAT,
    R32G32_SFLOAT,
    D16_UNORM,
    D32_FLOAT,
    D24_UNORM_S8_UINT,
}

impl TextureFormat {
    /// Size of one texel in bytes
    pub fn bytes_per_pixel(&self) -> u64 {
        match self {
            TextureFormat::R8G8B8A8_UNORM
            | TextureFormat::R8G8B8A8_SRGB
            | TextureFormat::B8G8R8A8_UNORM
            | TextureFormat::B8G8R8A8_SRGB
            | TextureFormat::R11G11B10_UFLOAT
            | TextureFormat::R32_SFLOAT
            | TextureFormat::D32_FLOAT
            | TextureFormat::D24_UNORM_S8_UINT => 4,
            TextureFormat::R16G16B16A16_SFLOAT | TextureFormat::R32G32_SFLOAT => 8,
            TextureFormat::D16_UNORM => 2,
        }
    }

    /// Whether this is a depth (or depth/stencil) format
    pub fn is_depth(&self) -> bool {
        matches!(
            self,
            TextureFormat::D16_UNORM | TextureFormat::D32_FLOAT | TextureFormat::D24_UNORM_S8_UINT
        )
    }

    /// Whether this format carries a stencil aspect
    pub fn has_stencil(&self) -> bool {
        matches!(self, TextureFormat::D24_UNORM_S8_UINT)
    }
}

/// Attachment formats of a target set
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct TargetSetLayout {
    /// Color attachment formats, in attachment order
    pub color_formats: Vec<TextureFormat>,
    /// Depth/stencil attachment format, if the set owns one
    pub depth_stencil_format: Option<TextureFormat>,
}

impl TargetSetLayout {
    /// Layout with a single color attachment
    pub fn color(format: TextureFormat) -> Self {
        Self {
            color_formats: vec![format],
            depth_stencil_format: None,
        }
    }

    /// Layout with only a depth/stencil attachment
    pub fn depth(format: TextureFormat) -> Self {
        Self {
            color_formats: Vec::new(),
            depth_stencil_format: Some(format),
        }
    }

    /// Add a depth/stencil attachment to this layout
    pub fn with_depth(mut self, format: TextureFormat) -> Self {
        self.depth_stencil_format = Some(format);
        self
    }

    /// Bytes per pixel summed over all attachments (one sample)
    pub fn bytes_per_pixel(&self) -> u64 {
        self.color_formats.iter().map(|f| f.bytes_per_pixel()).sum::<u64>()
            + self.depth_stencil_format.map_or(0, |f| f.bytes_per_pixel())
    }
}

/// Resolved, concrete properties of a target set
///
/// Also used as the pool key for transient target sets: two requests with
/// equal info are interchangeable.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TargetSetInfo {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// MSAA sample count (1 = no MSAA)
    pub sample_count: u32,
    /// Attachment formats
    pub layout: TargetSetLayout,
    /// Front/back pair swapped after each write
    pub double_buffered: bool,
}

impl TargetSetInfo {
    /// Whether the attachments are multisampled
    pub fn is_multisampled(&self) -> bool {
        self.sample_count > 1
    }

    /// Approximate GPU memory footprint in bytes
    pub fn memory_size(&self) -> u64 {
        let buffers = if self.double_buffered { 2 } else { 1 };
        self.width as u64
            * self.height as u64
            * self.sample_count.max(1) as u64
            * self.layout.bytes_per_pixel()
            * buffers
    }
}

/// Target set resource trait
///
/// Implemented by backend-specific target sets. The backing memory is
/// released when the last `Arc` is dropped.
pub trait TargetSet: Send + Sync {
    /// Read-only properties of this target set
    fn info(&self) -> &TargetSetInfo;

    /// Backend downcast hook
    fn as_any(&self) -> &dyn Any;
}
