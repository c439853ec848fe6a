/// Pass scheduling
///
/// Passes are placed on depth levels by a depth-first traversal starting
/// at the root passes (the passes whose result leaves the graph). A pass
/// depends on every pass whose output it reads; its depth is the longest
/// chain from a root down to it. Producers sit on deeper levels than
/// their consumers, so execution walks the levels from the deepest one
/// back to level 0.
///
/// ```text
///   level 2:  shadow
///   level 1:  gbuffer     bloom
///   level 0:  compose (root, writes OUTPUT)
/// ```
///
/// A pass found again on the current traversal path closes a cycle; the
/// revisit is dropped and a warning is logged.

use std::cmp::Reverse;

use rustc_hash::FxHashMap;

use crate::{rg_debug, rg_warn};
use super::RenderPass;

/// Number of depth levels a schedule may use
pub const MAX_DEPTH_LEVELS: usize = 32;

/// Depth-ordered pass schedule of one frame
#[derive(Debug, Default, Clone)]
pub(crate) struct Schedule {
    /// Pass indices per depth level, sorted by descending output id
    pub levels: Vec<Vec<usize>>,
    /// Passes unreachable from any root
    pub culled: Vec<usize>,
    pub cycles_truncated: u32,
}

impl Schedule {
    /// `(depth, pass index)` in execution order
    pub fn execution_order(&self) -> impl Iterator<Item = (u32, usize)> + '_ {
        self.levels
            .iter()
            .enumerate()
            .rev()
            .flat_map(|(depth, passes)| passes.iter().map(move |&pass| (depth as u32, pass)))
    }

    pub fn scheduled_count(&self) -> usize {
        self.levels.iter().map(Vec::len).sum()
    }
}

struct Traversal<'a> {
    passes: &'a [RenderPass],
    producers: &'a FxHashMap<u32, Vec<usize>>,
    max_depth: Vec<Option<usize>>,
    path: Vec<usize>,
    cycles_truncated: u32,
}

impl<'a> Traversal<'a> {
    fn visit(&mut self, pass: usize, depth: usize) {
        if self.path.contains(&pass) {
            self.cycles_truncated += 1;
            rg_warn!("galaxy3d::RenderGraph",
                "Dependency cycle through pass '{}' truncated (path: {})",
                self.passes[pass].name(), self.path_names());
            return;
        }
        assert!(
            depth < MAX_DEPTH_LEVELS,
            "Render graph deeper than {} levels at pass '{}'",
            MAX_DEPTH_LEVELS,
            self.passes[pass].name()
        );
        if matches!(self.max_depth[pass], Some(reached) if reached >= depth) {
            return;
        }
        self.max_depth[pass] = Some(depth);

        let passes = self.passes;
        let producers = self.producers;
        self.path.push(pass);
        for input in passes[pass].inputs().iter().filter(|i| i.is_ordering()) {
            if let Some(writers) = producers.get(&input.resource.value()) {
                for &writer in writers {
                    self.visit(writer, depth + 1);
                }
            }
        }
        self.path.pop();
    }

    fn path_names(&self) -> String {
        self.path
            .iter()
            .map(|&p| self.passes[p].name())
            .collect::<Vec<_>>()
            .join(" -> ")
    }
}

/// Compute the depth-level schedule of `passes`
///
/// # Panics
///
/// Panics when a dependency chain is deeper than `MAX_DEPTH_LEVELS`.
pub(crate) fn build_schedule<F>(passes: &[RenderPass], is_root: F) -> Schedule
where
    F: Fn(&RenderPass) -> bool,
{
    let mut producers: FxHashMap<u32, Vec<usize>> = FxHashMap::default();
    for (index, pass) in passes.iter().enumerate() {
        if let Some(output) = pass.output() {
            if !output.resource.is_output() {
                producers.entry(output.resource.value()).or_default().push(index);
            }
        }
    }

    let mut traversal = Traversal {
        passes,
        producers: &producers,
        max_depth: vec![None; passes.len()],
        path: Vec::with_capacity(MAX_DEPTH_LEVELS),
        cycles_truncated: 0,
    };
    for (index, pass) in passes.iter().enumerate() {
        if is_root(pass) {
            traversal.visit(index, 0);
        }
    }

    let level_count = traversal.max_depth.iter().flatten().max().map_or(0, |d| d + 1);
    let mut schedule = Schedule {
        levels: vec![Vec::new(); level_count],
        culled: Vec::new(),
        cycles_truncated: traversal.cycles_truncated,
    };
    for (index, depth) in traversal.max_depth.iter().enumerate() {
        match depth {
            Some(depth) => schedule.levels[*depth].push(index),
            None => {
                rg_debug!("galaxy3d::RenderGraph",
                    "Pass '{}' is not reachable from any root, culled", passes[index].name());
                schedule.culled.push(index);
            }
        }
    }
    for level in &mut schedule.levels {
        level.sort_by_key(|&pass| Reverse(passes[pass].output_value()));
    }
    schedule
}

#[cfg(test)]
#[path = "schedule_tests.rs"]
mod tests;
