/// Texture trait, texture descriptor, and texture info

use std::any::Any;
use bitflags::bitflags;
use super::TextureFormat;

bitflags! {
    /// How a texture will be accessed
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TextureUsage: u32 {
        const SAMPLED       = 1 << 0;
        const STORAGE       = 1 << 1;
        const RENDER_TARGET = 1 << 2;
        const COPY_SRC      = 1 << 3;
        const COPY_DST      = 1 << 4;
    }
}

// ===== TEXTURE DESC =====

/// Descriptor for a graph-managed texture
///
/// A zero width or height means "use the frame size passed to build()".
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TextureDesc {
    /// Width in pixels (0 = frame width)
    pub width: u32,
    /// Height in pixels (0 = frame height)
    pub height: u32,
    /// Pixel format
    pub format: TextureFormat,
    /// Number of mip levels
    pub mip_levels: u32,
    /// Number of array layers
    pub array_layers: u32,
    /// Usage flags
    pub usage: TextureUsage,
}

impl TextureDesc {
    /// Frame-sized single-mip 2D texture
    pub fn frame_sized(format: TextureFormat, usage: TextureUsage) -> Self {
        Self {
            width: 0,
            height: 0,
            format,
            mip_levels: 1,
            array_layers: 1,
            usage,
        }
    }

    /// Resolve the descriptor against the frame size
    pub fn resolve(&self, frame_width: u32, frame_height: u32) -> TextureInfo {
        TextureInfo {
            width: if self.width == 0 { frame_width } else { self.width }.max(1),
            height: if self.height == 0 { frame_height } else { self.height }.max(1),
            format: self.format,
            mip_levels: self.mip_levels.max(1),
            array_layers: self.array_layers.max(1),
            usage: self.usage,
        }
    }
}

// ===== TEXTURE INFO =====

/// Resolved properties of a texture (also its pool key)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TextureInfo {
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    pub mip_levels: u32,
    pub array_layers: u32,
    pub usage: TextureUsage,
}

impl TextureInfo {
    /// Approximate GPU memory footprint in bytes (full mip chain)
    pub fn memory_size(&self) -> u64 {
        let mut total = 0;
        let (mut w, mut h) = (self.width as u64, self.height as u64);
        for _ in 0..self.mip_levels {
            total += w * h * self.format.bytes_per_pixel();
            w = (w / 2).max(1);
            h = (h / 2).max(1);
        }
        total * self.array_layers as u64
    }
}

// ===== TEXTURE TRAIT =====

/// Texture resource trait
pub trait Texture: Send + Sync {
    /// Read-only properties of this texture
    fn info(&self) -> &TextureInfo;

    /// Backend downcast hook
    fn as_any(&self) -> &dyn Any;
}
