/// Typed resource ids minted by the render graph
///
/// Every id carries the frame generation it was minted in. Ids are only
/// meaningful for the frame that created them: the graph bumps its
/// generation in `cleanup()`, so an id kept across frames is reported as
/// stale instead of silently aliasing a new resource.
///
/// All id types share a single counter, so a raw value identifies one
/// resource regardless of its type. Value `0` is `OUTPUT` (the final
/// output surface, or "no resource" for buffers and textures) and
/// `u32::MAX` is `INVALID`.

use std::fmt;

const OUTPUT_VALUE: u32 = 0;
const INVALID_VALUE: u32 = u32::MAX;

macro_rules! resource_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name {
            value: u32,
            generation: u32,
        }

        impl $name {
            /// The final output surface / no resource
            pub const OUTPUT: Self = Self { value: OUTPUT_VALUE, generation: 0 };
            /// Unset reference
            pub const INVALID: Self = Self { value: INVALID_VALUE, generation: 0 };

            pub(crate) fn new(value: u32, generation: u32) -> Self {
                Self { value, generation }
            }

            /// Raw value, unique across all id types of one frame
            pub fn value(&self) -> u32 {
                self.value
            }

            /// Frame generation the id was minted in
            pub fn generation(&self) -> u32 {
                self.generation
            }

            pub fn is_output(&self) -> bool {
                self.value == OUTPUT_VALUE
            }

            pub fn is_invalid(&self) -> bool {
                self.value == INVALID_VALUE
            }

            /// Neither `OUTPUT` nor `INVALID`
            pub fn is_resource(&self) -> bool {
                !self.is_output() && !self.is_invalid()
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::INVALID
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match self.value {
                    OUTPUT_VALUE => write!(f, "{}(output)", $label),
                    INVALID_VALUE => write!(f, "{}(invalid)", $label),
                    value => write!(f, "{}({}@{})", $label, value, self.generation),
                }
            }
        }

        impl From<$name> for ResourceRef {
            fn from(id: $name) -> Self {
                ResourceRef::$name(id)
            }
        }
    };
}

resource_id!(
    /// Id of a target set registered for the current frame
    TargetSetId, "TargetSet"
);
resource_id!(
    /// Id of a buffer registered for the current frame
    BufferId, "Buffer"
);
resource_id!(
    /// Id of a texture registered for the current frame
    TextureId, "Texture"
);
resource_id!(
    /// Ordering-only id with no backing resource
    DependencyId, "Dependency"
);

/// Any resource a pass can read or write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(clippy::enum_variant_names)]
pub enum ResourceRef {
    TargetSetId(TargetSetId),
    BufferId(BufferId),
    TextureId(TextureId),
    DependencyId(DependencyId),
}

impl ResourceRef {
    pub fn value(&self) -> u32 {
        match self {
            ResourceRef::TargetSetId(id) => id.value(),
            ResourceRef::BufferId(id) => id.value(),
            ResourceRef::TextureId(id) => id.value(),
            ResourceRef::DependencyId(id) => id.value(),
        }
    }

    pub fn generation(&self) -> u32 {
        match self {
            ResourceRef::TargetSetId(id) => id.generation(),
            ResourceRef::BufferId(id) => id.generation(),
            ResourceRef::TextureId(id) => id.generation(),
            ResourceRef::DependencyId(id) => id.generation(),
        }
    }

    pub fn is_output(&self) -> bool {
        self.value() == OUTPUT_VALUE
    }

    pub fn is_invalid(&self) -> bool {
        self.value() == INVALID_VALUE
    }

    /// Target set id, if this refers to a target set
    pub fn target_set(&self) -> Option<TargetSetId> {
        match self {
            ResourceRef::TargetSetId(id) => Some(*id),
            _ => None,
        }
    }
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceRef::TargetSetId(id) => id.fmt(f),
            ResourceRef::BufferId(id) => id.fmt(f),
            ResourceRef::TextureId(id) => id.fmt(f),
            ResourceRef::DependencyId(id) => id.fmt(f),
        }
    }
}

#[cfg(test)]
#[path = "resource_id_tests.rs"]
mod tests;
