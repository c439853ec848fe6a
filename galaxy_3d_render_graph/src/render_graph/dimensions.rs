/// Target set size resolution
///
/// Sizes are resolved once per frame and memoized on the record. A target
/// derives each zero axis from its size reference, or from the target it
/// shares depth with, or from the frame size; explicit axes win. Derived
/// axes are scaled by `mul / denom` rounded up, then both are clamped to
/// the max.

use glam::UVec2;
use rustc_hash::FxHashMap;

use crate::error::Result;
use crate::rg_bail;
use super::resource::{ResourceSource, TargetResource};
use super::TargetSetId;

const SOURCE: &str = "galaxy3d::RenderGraph";

/// `ceil(value * mul / denom)`, with a zero denominator treated as 1
pub(crate) fn scale_ceil(value: u32, mul: u32, denom: u32) -> u32 {
    let denom = denom.max(1) as u64;
    let scaled = (value as u64 * mul as u64).div_ceil(denom);
    scaled.min(u32::MAX as u64) as u32
}

/// Resolve (and memoize) the size of target `id`
pub(crate) fn resolve_size(
    targets: &mut FxHashMap<u32, TargetResource>,
    id: TargetSetId,
    frame_size: UVec2,
) -> Result<UVec2> {
    let mut visiting = Vec::new();
    resolve_recursive(targets, id, frame_size, &mut visiting)
}

fn resolve_recursive(
    targets: &mut FxHashMap<u32, TargetResource>,
    id: TargetSetId,
    frame_size: UVec2,
    visiting: &mut Vec<u32>,
) -> Result<UVec2> {
    if !id.is_resource() {
        return Ok(frame_size);
    }
    let target = match targets.get(&id.value()) {
        Some(target) => target,
        None => rg_bail!(InvalidResource => SOURCE, "Unknown target set {}", id),
    };
    if let Some(size) = target.resolved {
        return Ok(size);
    }
    if visiting.contains(&id.value()) {
        let chain = visiting
            .iter()
            .chain(std::iter::once(&id.value()))
            .filter_map(|v| targets.get(v).map(|t| t.name.as_str()))
            .collect::<Vec<_>>()
            .join(" -> ");
        rg_bail!(ValidationFailed => SOURCE, "Target size reference cycle: {}", chain);
    }

    let desc = match &target.source {
        ResourceSource::External(external) => {
            let info = external.info();
            let size = UVec2::new(info.width, info.height);
            store(targets, id, size);
            return Ok(size);
        }
        ResourceSource::Described(desc) => desc.clone(),
    };

    let reference = if desc.size_reference.is_resource() {
        desc.size_reference
    } else {
        desc.shared_depth
    };
    let base = if desc.width == 0 || desc.height == 0 {
        visiting.push(id.value());
        let base = resolve_recursive(targets, reference, frame_size, visiting)?;
        visiting.pop();
        base
    } else {
        frame_size
    };

    // Explicit axes are taken as is; only derived axes are scaled
    let mut width = match desc.width {
        0 => scale_ceil(base.x, desc.width_mul, desc.width_denom),
        width => width,
    };
    let mut height = match desc.height {
        0 => scale_ceil(base.y, desc.height_mul, desc.height_denom),
        height => height,
    };
    if desc.max_width != 0 {
        width = width.min(desc.max_width);
    }
    if desc.max_height != 0 {
        height = height.min(desc.max_height);
    }

    let size = UVec2::new(width.max(1), height.max(1));
    store(targets, id, size);
    Ok(size)
}

fn store(targets: &mut FxHashMap<u32, TargetResource>, id: TargetSetId, size: UVec2) {
    if let Some(target) = targets.get_mut(&id.value()) {
        target.resolved = Some(size);
    }
}

#[cfg(test)]
#[path = "dimensions_tests.rs"]
mod tests;
