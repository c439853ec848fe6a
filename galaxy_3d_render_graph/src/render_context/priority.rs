/// Priority buckets and draw sorting
///
/// Blocks queued with `draw_priority` land in one of six buckets, merged
/// into the draw queue in bucket order. Each bucket is sorted with a
/// radix sort over packed `u128` keys:
///
/// ```text
/// front-to-back:  [ quantized distance : 32 | shader : 32 | index : 32 ]
/// back-to-front:  [ !distance          : 32 | index  : 32 ]
/// ```
///
/// The trailing insertion index makes every key unique, so the unstable
/// radix sort yields a deterministic order.

use bitflags::bitflags;
use rdst::RadixSort;

use super::{BlockArena, BlockId};

/// Draw priority bucket, in merge order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PriorityBucket {
    /// State setup before any geometry
    Setup,
    /// Opaque geometry
    Opaque,
    /// Opaque work depending on the opaque pass (decals, outlines)
    PostOpaque,
    /// Alpha-blended geometry
    AlphaBlend,
    /// Blended work after transparency
    PostAlphaBlend,
    /// Screen-space overlays
    Overlay,
}

/// How a bucket orders its blocks when merged
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketOrder {
    Insertion,
    FrontToBack,
    BackToFront,
}

impl PriorityBucket {
    pub const COUNT: usize = 6;

    pub const ALL: [PriorityBucket; Self::COUNT] = [
        PriorityBucket::Setup,
        PriorityBucket::Opaque,
        PriorityBucket::PostOpaque,
        PriorityBucket::AlphaBlend,
        PriorityBucket::PostAlphaBlend,
        PriorityBucket::Overlay,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn order(self) -> BucketOrder {
        match self {
            PriorityBucket::Setup | PriorityBucket::Overlay => BucketOrder::Insertion,
            PriorityBucket::Opaque | PriorityBucket::PostOpaque => BucketOrder::FrontToBack,
            PriorityBucket::AlphaBlend | PriorityBucket::PostAlphaBlend => BucketOrder::BackToFront,
        }
    }

    pub fn mask(self) -> PriorityMask {
        PriorityMask::from_bits_truncate(1 << self.index())
    }
}

bitflags! {
    /// Set of priority buckets selected for a merge
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PriorityMask: u8 {
        const SETUP = 1 << 0;
        const OPAQUE = 1 << 1;
        const POST_OPAQUE = 1 << 2;
        const ALPHA_BLEND = 1 << 3;
        const POST_ALPHA_BLEND = 1 << 4;
        const OVERLAY = 1 << 5;
    }
}

/// Map an f32 onto a u32 whose unsigned order matches the float order
fn ordered_bits(value: f32) -> u32 {
    let bits = value.to_bits();
    if bits & 0x8000_0000 != 0 {
        !bits
    } else {
        bits | 0x8000_0000
    }
}

/// Sort one bucket in place according to its order
pub(crate) fn sort_bucket(
    blocks: &mut Vec<BlockId>,
    order: BucketOrder,
    arena: &BlockArena,
    distance_quantum: f32,
) {
    if order == BucketOrder::Insertion || blocks.len() < 2 {
        return;
    }

    let mut keys: Vec<u128> = blocks
        .iter()
        .enumerate()
        .map(|(index, &id)| {
            let key = arena.get(id).map(|b| b.sort_key()).unwrap_or_default();
            let index = index as u128;
            match order {
                BucketOrder::FrontToBack => {
                    let quantized = if distance_quantum > 0.0 {
                        (key.distance / distance_quantum).floor()
                    } else {
                        key.distance
                    };
                    (ordered_bits(quantized) as u128) << 64 | (key.shader as u128) << 32 | index
                }
                BucketOrder::BackToFront => (!ordered_bits(key.distance) as u128) << 32 | index,
                BucketOrder::Insertion => index,
            }
        })
        .collect();

    keys.radix_sort_unstable();

    let original = std::mem::take(blocks);
    blocks.extend(keys.iter().map(|&key| original[(key as u32) as usize]));
}

#[cfg(test)]
#[path = "priority_tests.rs"]
mod tests;
