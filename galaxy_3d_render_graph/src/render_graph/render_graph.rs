/// Render graph - per-frame description of passes and the resources
/// connecting them.
///
/// Each frame the caller registers resources (`add_*`) and passes
/// (`add_pass`), calls `validate()` to compute the depth-level schedule,
/// then `build()` to acquire resources and record every pass into a
/// `RenderContext`. `build()` ends with `cleanup()`: the registries are
/// emptied and the frame generation advances, so ids never outlive their
/// frame. The pools persist across frames.
///
/// ```text
/// add_* / add_pass ──► validate() ──► build(ctx) ──► ctx.render(view)
///                      schedule       refcount, sizes, acquire,
///                                     passes deepest → 0, release
/// ```

use std::sync::Arc;
use std::time::Instant;

use glam::UVec2;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::error::{Error, Result};
use crate::pool::{
    BufferPool, PersistentHandle, PoolConfig, PoolStats, PooledHandle, SharedRenderSystem,
    TargetSetPool, TexturePool,
};
use crate::render_context::RenderContext;
use crate::render_system::{Buffer, BufferDesc, PassOps, StoreMask, TargetSet, TargetSetInfo, Texture, TextureDesc};
use crate::{rg_bail, rg_debug, rg_error, rg_info, rg_warn};
use super::blocks::{BeginPassBlock, ClearBlock, EndPassBlock, SwapBlock};
use super::dimensions;
use super::resource::{
    Acquired, BufferResource, GraphResource, ResourceSource, TargetResource, TargetSetDesc,
    TextureResource,
};
use super::schedule::{build_schedule, Schedule};
use super::{BufferId, DependencyId, RenderPass, ResourceRef, TargetSetId, TextureId};

const SOURCE: &str = "galaxy3d::RenderGraph";

/// Per-pass profiling callback
///
/// Called after each executed pass with `(ordinal, depth_level, pass_name,
/// start_seconds, duration_seconds)`; times are relative to the start of
/// `build()` and measure the pass's build callbacks.
pub type PassProfiler = Box<dyn FnMut(u32, u32, &str, f64, f64)>;

/// Render graph configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderGraphConfig {
    /// Sample count of target sets described with `multisample`
    pub multisample_count: u32,
    /// Frames an unused pooled resource is kept before being destroyed
    pub max_pool_idle_frames: u32,
    /// Never merge consecutive passes writing the same target set
    pub force_pass_boundaries: bool,
}

impl Default for RenderGraphConfig {
    fn default() -> Self {
        Self {
            multisample_count: 1,
            max_pool_idle_frames: PoolConfig::default().max_idle_frames,
            force_pass_boundaries: false,
        }
    }
}

/// Counters of the last built frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Passes placed on a depth level
    pub scheduled_passes: u32,
    /// Passes not reachable from any root
    pub culled_passes: u32,
    /// Passes whose build callbacks ran
    pub executed_passes: u32,
    /// GPU render passes opened
    pub render_passes_opened: u32,
    /// Passes recorded into an already open render pass
    pub merged_passes: u32,
    /// Transient target sets returned to the pool before the end of the frame
    pub targets_released_early: u32,
    /// Dependency cycles cut during scheduling
    pub cycles_truncated: u32,
}

/// Render pass currently open on a target set
struct OpenPass {
    target: TargetSetId,
    set: Option<Arc<dyn TargetSet>>,
    ops: PassOps,
}

/// Render graph
pub struct RenderGraph {
    config: RenderGraphConfig,
    profiler: Option<PassProfiler>,
    target_set_pool: TargetSetPool,
    buffer_pool: BufferPool,
    texture_pool: TexturePool,

    // ===== Frame state, reset by cleanup() =====
    generation: u32,
    next_id: u32,
    targets: FxHashMap<u32, TargetResource>,
    buffers: FxHashMap<u32, BufferResource>,
    textures: FxHashMap<u32, TextureResource>,
    dependencies: FxHashSet<u32>,
    passes: Vec<RenderPass>,
    schedule: Option<Schedule>,
    shared_depth_providers: Vec<TargetSetId>,
    building: bool,
    frame_size: UVec2,
    open: Option<OpenPass>,
    stats: FrameStats,
    last_stats: FrameStats,
}

impl RenderGraph {
    /// Create a render graph
    ///
    /// # Arguments
    ///
    /// * `render_system` - Resource factory used by the pools
    /// * `multisample_count` - Sample count of multisampled target sets
    /// * `profiler` - Optional per-pass profiling callback. Profiling forces
    ///   a render pass boundary on every pass so timings are per pass.
    pub fn new(
        render_system: SharedRenderSystem,
        multisample_count: u32,
        profiler: Option<PassProfiler>,
    ) -> Self {
        let config = RenderGraphConfig {
            multisample_count,
            ..RenderGraphConfig::default()
        };
        Self::with_config(render_system, config, profiler)
    }

    /// Create a render graph from a full configuration
    ///
    /// A multisample count above the render system's maximum is clamped.
    pub fn with_config(
        render_system: SharedRenderSystem,
        mut config: RenderGraphConfig,
        profiler: Option<PassProfiler>,
    ) -> Self {
        if let Ok(system) = render_system.lock() {
            let max = system.max_sample_count();
            if config.multisample_count > max {
                rg_warn!(SOURCE, "Multisample count {} above device maximum {}, clamped",
                    config.multisample_count, max);
                config.multisample_count = max;
            }
        }

        let pool_config = PoolConfig { max_idle_frames: config.max_pool_idle_frames };
        Self {
            config,
            profiler,
            target_set_pool: TargetSetPool::new(render_system.clone(), pool_config),
            buffer_pool: BufferPool::new(render_system.clone(), pool_config),
            texture_pool: TexturePool::new(render_system, pool_config),
            generation: 1,
            next_id: 1,
            targets: FxHashMap::default(),
            buffers: FxHashMap::default(),
            textures: FxHashMap::default(),
            dependencies: FxHashSet::default(),
            passes: Vec::new(),
            schedule: None,
            shared_depth_providers: Vec::new(),
            building: false,
            frame_size: UVec2::ZERO,
            open: None,
            stats: FrameStats::default(),
            last_stats: FrameStats::default(),
        }
    }

    // ===== RESOURCE REGISTRATION =====

    /// Register a target set owned by the caller
    pub fn add_explicit_target_set(&mut self, name: &str, target: Arc<dyn TargetSet>) -> TargetSetId {
        self.insert_target(name, None, ResourceSource::External(target))
    }

    /// Register a frame-scoped target set acquired from the pool
    pub fn add_transient_target_set(&mut self, name: &str, desc: TargetSetDesc) -> TargetSetId {
        self.insert_target(name, None, ResourceSource::Described(desc))
    }

    /// Register a target set whose content survives across frames
    pub fn add_persistent_target_set(
        &mut self,
        name: &str,
        handle: PersistentHandle,
        desc: TargetSetDesc,
    ) -> TargetSetId {
        self.insert_target(name, Some(handle), ResourceSource::Described(desc))
    }

    pub fn add_explicit_buffer(&mut self, name: &str, buffer: Arc<dyn Buffer>) -> BufferId {
        let value = self.mint();
        self.buffers.insert(value, GraphResource::new(name, None, ResourceSource::External(buffer)));
        BufferId::new(value, self.generation)
    }

    pub fn add_transient_buffer(&mut self, name: &str, desc: BufferDesc) -> BufferId {
        let value = self.mint();
        self.buffers.insert(value, GraphResource::new(name, None, ResourceSource::Described(desc)));
        BufferId::new(value, self.generation)
    }

    pub fn add_persistent_buffer(&mut self, name: &str, handle: PersistentHandle, desc: BufferDesc) -> BufferId {
        let value = self.mint();
        self.buffers.insert(value, GraphResource::new(name, Some(handle), ResourceSource::Described(desc)));
        BufferId::new(value, self.generation)
    }

    pub fn add_explicit_texture(&mut self, name: &str, texture: Arc<dyn Texture>) -> TextureId {
        let value = self.mint();
        self.textures.insert(value, GraphResource::new(name, None, ResourceSource::External(texture)));
        TextureId::new(value, self.generation)
    }

    /// Register a texture; zero width/height in `desc` follow the frame size
    pub fn add_transient_texture(&mut self, name: &str, desc: TextureDesc) -> TextureId {
        let value = self.mint();
        self.textures.insert(value, GraphResource::new(name, None, ResourceSource::Described(desc)));
        TextureId::new(value, self.generation)
    }

    pub fn add_persistent_texture(&mut self, name: &str, handle: PersistentHandle, desc: TextureDesc) -> TextureId {
        let value = self.mint();
        self.textures.insert(value, GraphResource::new(name, Some(handle), ResourceSource::Described(desc)));
        TextureId::new(value, self.generation)
    }

    /// Mint an id that only orders passes (writer before readers)
    pub fn add_dependency(&mut self) -> DependencyId {
        let value = self.mint();
        self.dependencies.insert(value);
        DependencyId::new(value, self.generation)
    }

    /// Append a pass; nothing is checked until `validate()`
    pub fn add_pass(&mut self, pass: RenderPass) {
        self.passes.push(pass);
    }

    // ===== VALIDATION =====

    /// Check every reference and compute the depth-level schedule
    ///
    /// Must be called once per frame, after the last `add_pass()` and before
    /// `build()`. Stale, unknown or invalid ids and shared depth chains that
    /// loop are reported as `Error::ValidationFailed`.
    pub fn validate(&mut self) -> Result<()> {
        self.check_references()?;

        let targets = &self.targets;
        let buffers = &self.buffers;
        let textures = &self.textures;
        let schedule = build_schedule(&self.passes, |pass| match pass.output() {
            None => true,
            Some(output) => match output.resource {
                ResourceRef::TargetSetId(id) if id.is_output() => true,
                ResourceRef::TargetSetId(id) => {
                    targets.get(&id.value()).is_some_and(|t| !t.is_transient())
                }
                ResourceRef::BufferId(id) => buffers
                    .get(&id.value())
                    .is_some_and(|b| b.persistent.is_some() || matches!(b.source, ResourceSource::External(_))),
                ResourceRef::TextureId(id) => textures
                    .get(&id.value())
                    .is_some_and(|t| t.persistent.is_some() || matches!(t.source, ResourceSource::External(_))),
                ResourceRef::DependencyId(_) => false,
            },
        });

        // Depth providers of every target a scheduled pass touches
        let mut providers = Vec::new();
        for (_, index) in schedule.execution_order() {
            let pass = &self.passes[index];
            let touched = pass
                .inputs()
                .iter()
                .map(|i| i.resource)
                .chain(pass.output().map(|o| o.resource));
            for resource in touched {
                let Some(id) = resource.target_set() else { continue };
                let mut provider = self.targets.get(&id.value()).map_or(TargetSetId::INVALID, |t| t.shared_depth());
                while provider.is_resource() && !providers.contains(&provider) {
                    providers.push(provider);
                    provider = self.targets.get(&provider.value()).map_or(TargetSetId::INVALID, |t| t.shared_depth());
                }
            }
        }

        self.stats.scheduled_passes = schedule.scheduled_count() as u32;
        self.stats.culled_passes = schedule.culled.len() as u32;
        self.stats.cycles_truncated = schedule.cycles_truncated;
        rg_debug!(SOURCE, "Validated {} passes on {} levels ({} culled)",
            self.stats.scheduled_passes, schedule.levels.len(), self.stats.culled_passes);

        self.shared_depth_providers = providers;
        self.schedule = Some(schedule);
        Ok(())
    }

    // ===== BUILD =====

    /// Acquire resources and record every scheduled pass into `ctx`
    ///
    /// `width`/`height` is the frame size that derived target sizes start
    /// from. On failure every acquired resource is released, `ctx` is
    /// flushed, the frame is cleaned up and the error is returned.
    ///
    /// # Panics
    ///
    /// Panics if `ctx` holds pending draw blocks.
    pub fn build(&mut self, ctx: &mut RenderContext, width: u32, height: u32) -> Result<()> {
        let schedule = match self.schedule.take() {
            Some(schedule) => schedule,
            None => rg_bail!(ValidationFailed => SOURCE, "build() called before validate()"),
        };
        assert!(!ctx.have_pending_draws(), "RenderGraph::build() with pending draws in the render context");

        let mut passes = std::mem::take(&mut self.passes);
        let result = self.execute_frame(ctx, &schedule, &mut passes, UVec2::new(width, height));
        self.building = false;

        match result {
            Ok(()) => {
                self.finish_frame()?;
                rg_debug!(SOURCE, "Built frame: {} passes, {} render passes, {} merged",
                    self.last_stats.executed_passes,
                    self.last_stats.render_passes_opened,
                    self.last_stats.merged_passes);
                Ok(())
            }
            Err(error) => {
                rg_warn!(SOURCE, "Frame dropped: {}", error);
                self.abort_frame(ctx);
                Err(error)
            }
        }
    }

    fn execute_frame(
        &mut self,
        ctx: &mut RenderContext,
        schedule: &Schedule,
        passes: &mut [RenderPass],
        frame_size: UVec2,
    ) -> Result<()> {
        self.frame_size = frame_size;
        self.count_references(schedule, passes);
        self.resolve_sizes(frame_size)?;
        self.reserve_persistent();
        self.acquire_eager()?;
        self.acquire_buffers_and_textures(frame_size)?;

        let force_boundaries = self.config.force_pass_boundaries || self.profiler.is_some();
        let start = Instant::now();
        self.building = true;

        for (ordinal, (depth, index)) in schedule.execution_order().enumerate() {
            let pass = &mut passes[index];
            self.prepare_output(ctx, pass, force_boundaries)?;

            let pass_start = start.elapsed().as_secs_f64();
            pass.run_builders(self, ctx);
            if pass.output_target().is_none() {
                // Not a render pass: recorded work goes straight to the render queue
                ctx.merge_compute_into_render();
                ctx.merge_draw_into_render();
            }
            let duration = start.elapsed().as_secs_f64() - pass_start;
            if let Some(profiler) = self.profiler.as_mut() {
                profiler(ordinal as u32, depth, pass.name(), pass_start, duration);
            }

            self.stats.executed_passes += 1;
            self.retire_pass(pass)?;
        }

        self.close_pass(ctx)
    }

    /// Open, continue or close the render pass for the pass about to run
    fn prepare_output(&mut self, ctx: &mut RenderContext, pass: &RenderPass, force_boundary: bool) -> Result<()> {
        let (target, ops) = match (pass.output_target(), pass.output()) {
            (Some(target), Some(output)) => (target, output.ops),
            _ => return self.close_pass(ctx),
        };

        let continues = self.open.as_ref().is_some_and(|open| open.target == target);
        if continues && !force_boundary {
            self.stats.merged_passes += 1;
            if !ops.clear.is_none() {
                let clear = ctx.alloc(ClearBlock { clear: ops.clear });
                ctx.draw(clear);
            }
            return Ok(());
        }

        self.close_pass(ctx)?;
        self.open_pass(target, ops)
    }

    fn open_pass(&mut self, target: TargetSetId, mut ops: PassOps) -> Result<()> {
        let set = if target.is_output() {
            None
        } else {
            let set = self.acquire_target(target)?;
            if let Some(record) = self.targets.get(&target.value()) {
                if record.is_transient() && record.input_refs == 0 {
                    // Nobody reads the result
                    ops.store = StoreMask::empty();
                }
            }
            Some(set)
        };

        self.open = Some(OpenPass { target, set, ops });
        self.stats.render_passes_opened += 1;
        Ok(())
    }

    /// Emit the open render pass into the render queue
    ///
    /// Compute blocks recorded while the pass was open run before it begins,
    /// draw blocks between begin and end.
    fn close_pass(&mut self, ctx: &mut RenderContext) -> Result<()> {
        let Some(open) = self.open.take() else {
            return Ok(());
        };

        ctx.merge_compute_into_render();
        let begin = ctx.alloc(BeginPassBlock { target: open.set.clone(), ops: open.ops });
        ctx.direct(begin);
        ctx.merge_draw_into_render();

        let resolve = self.needs_resolve(&open);
        let end = ctx.alloc(EndPassBlock { target: open.set.clone(), resolve });
        ctx.direct(end);

        if let Some(set) = open.set {
            if set.info().double_buffered {
                let swap = ctx.alloc(SwapBlock { target: set });
                ctx.direct(swap);
            }
        }

        if self.is_retired(open.target) {
            self.release_target(open.target)?;
            self.stats.targets_released_early += 1;
        }
        Ok(())
    }

    fn needs_resolve(&self, open: &OpenPass) -> bool {
        if open.target.is_output() {
            return self.config.multisample_count > 1;
        }
        let multisampled = open.set.as_ref().is_some_and(|s| s.info().is_multisampled());
        let record = self.targets.get(&open.target.value());
        multisampled && record.is_some_and(|t| t.input_refs > 0 || !t.is_transient())
    }

    /// Update reference counts after a pass ran and release finished targets
    fn retire_pass(&mut self, pass: &RenderPass) -> Result<()> {
        if let Some(target) = pass.output_target() {
            if let Some(record) = self.targets.get_mut(&target.value()).filter(|_| target.is_resource()) {
                record.output_refs = record.output_refs.saturating_sub(1);
            }
        }

        for input in pass.inputs() {
            let Some(id) = input.resource.target_set().filter(TargetSetId::is_resource) else {
                continue;
            };
            if let Some(record) = self.targets.get_mut(&id.value()) {
                record.input_refs = record.input_refs.saturating_sub(1);
            }
            let is_open = self.open.as_ref().is_some_and(|o| o.target == id);
            if !is_open && self.is_retired(id) {
                self.release_target(id)?;
                self.stats.targets_released_early += 1;
            }
        }
        Ok(())
    }

    /// Transient, acquired, not a depth provider, and no reader or writer left
    fn is_retired(&self, id: TargetSetId) -> bool {
        if !id.is_resource() || self.shared_depth_providers.contains(&id) {
            return false;
        }
        self.targets.get(&id.value()).is_some_and(|t| {
            t.is_transient() && t.acquired.is_some() && t.input_refs == 0 && t.output_refs == 0
        })
    }

    fn count_references(&mut self, schedule: &Schedule, passes: &[RenderPass]) {
        for record in self.targets.values_mut() {
            record.input_refs = 0;
            record.output_refs = 0;
        }
        for (_, index) in schedule.execution_order() {
            let pass = &passes[index];
            for input in pass.inputs() {
                if let Some(record) = input.resource.target_set().and_then(|id| self.targets.get_mut(&id.value())) {
                    record.input_refs += 1;
                }
            }
            if let Some(record) = pass.output_target().and_then(|id| self.targets.get_mut(&id.value())) {
                record.output_refs += 1;
            }
        }
    }

    fn resolve_sizes(&mut self, frame_size: UVec2) -> Result<()> {
        let ids: Vec<TargetSetId> = self
            .targets
            .keys()
            .map(|&value| TargetSetId::new(value, self.generation))
            .collect();
        for id in ids {
            dimensions::resolve_size(&mut self.targets, id, frame_size)?;
        }
        Ok(())
    }

    /// Keep every persistent resource registered this frame out of reach of
    /// transient requests with an equal pool key
    fn reserve_persistent(&mut self) {
        for handle in self.targets.values().filter_map(|t| t.persistent) {
            self.target_set_pool.reserve(handle);
        }
        for handle in self.buffers.values().filter_map(|b| b.persistent) {
            self.buffer_pool.reserve(handle);
        }
        for handle in self.textures.values().filter_map(|t| t.persistent) {
            self.texture_pool.reserve(handle);
        }
    }

    /// Persistent targets referenced this frame, then depth providers
    fn acquire_eager(&mut self) -> Result<()> {
        let persistent: Vec<TargetSetId> = self
            .targets
            .iter()
            .filter(|(_, t)| t.persistent.is_some() && (t.input_refs > 0 || t.output_refs > 0))
            .map(|(&value, _)| TargetSetId::new(value, self.generation))
            .collect();
        for id in persistent {
            self.acquire_target(id)?;
        }

        for provider in self.shared_depth_providers.clone() {
            self.acquire_target(provider)?;
        }
        Ok(())
    }

    fn acquire_target(&mut self, id: TargetSetId) -> Result<Arc<dyn TargetSet>> {
        let record = match self.targets.get(&id.value()) {
            Some(record) => record,
            None => rg_bail!(InvalidResource => SOURCE, "Unknown target set {}", id),
        };
        if let Some(acquired) = &record.acquired {
            return Ok(acquired.resource.clone());
        }

        let desc = match &record.source {
            ResourceSource::External(target) => {
                let target = target.clone();
                self.set_acquired(id, None, target.clone());
                return Ok(target);
            }
            ResourceSource::Described(desc) => desc.clone(),
        };
        let name = record.name.clone();
        let persistent = record.persistent;
        let size = match record.resolved {
            Some(size) => size,
            None => rg_bail!(InvalidResource => SOURCE, "Target set '{}' has no resolved size", name),
        };

        let shared_depth = if desc.shared_depth.is_resource() {
            self.acquire_target(desc.shared_depth)?;
            self.targets
                .get(&desc.shared_depth.value())
                .and_then(|t| t.acquired.as_ref())
                .and_then(|a| a.pooled)
        } else {
            None
        };

        let info = TargetSetInfo {
            width: size.x,
            height: size.y,
            sample_count: if desc.multisample { self.config.multisample_count.max(1) } else { 1 },
            layout: desc.layout,
            double_buffered: desc.double_buffered,
        };
        let (pooled, target) = self.target_set_pool.acquire(&name, info, shared_depth, persistent)?;
        self.set_acquired(id, Some(pooled), target.clone());
        Ok(target)
    }

    fn set_acquired(&mut self, id: TargetSetId, pooled: Option<PooledHandle>, target: Arc<dyn TargetSet>) {
        if let Some(record) = self.targets.get_mut(&id.value()) {
            record.acquired = Some(Acquired { pooled, resource: target });
        }
    }

    fn release_target(&mut self, id: TargetSetId) -> Result<()> {
        let acquired = self.targets.get_mut(&id.value()).and_then(|t| t.acquired.take());
        if let Some(pooled) = acquired.and_then(|a| a.pooled) {
            self.target_set_pool.release(pooled)?;
        }
        Ok(())
    }

    fn acquire_buffers_and_textures(&mut self, frame_size: UVec2) -> Result<()> {
        for record in self.buffers.values_mut() {
            if record.acquired.is_some() {
                continue;
            }
            record.acquired = Some(match &record.source {
                ResourceSource::External(buffer) => Acquired { pooled: None, resource: buffer.clone() },
                ResourceSource::Described(desc) => {
                    let (pooled, buffer) = self.buffer_pool.acquire(&record.name, desc, record.persistent)?;
                    Acquired { pooled: Some(pooled), resource: buffer }
                }
            });
        }

        for record in self.textures.values_mut() {
            if record.acquired.is_some() {
                continue;
            }
            record.acquired = Some(match &record.source {
                ResourceSource::External(texture) => Acquired { pooled: None, resource: texture.clone() },
                ResourceSource::Described(desc) => {
                    let info = desc.resolve(frame_size.x, frame_size.y);
                    let (pooled, texture) = self.texture_pool.acquire(&record.name, &info, record.persistent)?;
                    Acquired { pooled: Some(pooled), resource: texture }
                }
            });
        }
        Ok(())
    }

    /// Release everything still held; reports the first failure
    fn release_all(&mut self) -> Result<()> {
        let mut first_error: Option<Error> = None;

        for record in self.targets.values_mut() {
            if let Some(pooled) = record.acquired.take().and_then(|a| a.pooled) {
                if let Err(e) = self.target_set_pool.release(pooled) {
                    first_error.get_or_insert(e);
                }
            }
        }
        for record in self.buffers.values_mut() {
            if let Some(pooled) = record.acquired.take().and_then(|a| a.pooled) {
                if let Err(e) = self.buffer_pool.release(pooled) {
                    first_error.get_or_insert(e);
                }
            }
        }
        for record in self.textures.values_mut() {
            if let Some(pooled) = record.acquired.take().and_then(|a| a.pooled) {
                if let Err(e) = self.texture_pool.release(pooled) {
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn cleanup_pools(&mut self) {
        self.target_set_pool.cleanup();
        self.buffer_pool.cleanup();
        self.texture_pool.cleanup();
    }

    fn finish_frame(&mut self) -> Result<()> {
        let released = self.release_all();
        self.cleanup_pools();
        self.last_stats = self.stats;
        self.cleanup();
        released
    }

    fn abort_frame(&mut self, ctx: &mut RenderContext) {
        self.open = None;
        ctx.flush();
        if let Err(error) = self.release_all() {
            rg_warn!(SOURCE, "Release failed while dropping the frame: {}", error);
        }
        self.cleanup_pools();
        self.last_stats = self.stats;
        self.cleanup();
    }

    /// Reset the per-frame registries and start a new frame generation
    ///
    /// Called automatically at the end of `build()`. Ids minted before this
    /// call are stale afterwards.
    pub fn cleanup(&mut self) {
        self.targets.clear();
        self.buffers.clear();
        self.textures.clear();
        self.dependencies.clear();
        self.passes.clear();
        self.schedule = None;
        self.shared_depth_providers.clear();
        self.building = false;
        self.open = None;
        self.stats = FrameStats::default();
        self.next_id = 1;
        self.generation = self.generation.wrapping_add(1).max(1);
    }

    // ===== ACCESSORS (valid while passes are built) =====

    /// Target set acquired for `id`
    ///
    /// Returns `None` for `OUTPUT`, stale ids, and targets not acquired at
    /// this point of the frame.
    ///
    /// # Panics
    ///
    /// Panics when called outside of a pass build callback.
    pub fn target_set(&self, id: TargetSetId) -> Option<&Arc<dyn TargetSet>> {
        self.assert_building("target_set");
        if id.generation() != self.generation {
            return None;
        }
        self.targets.get(&id.value())?.acquired.as_ref().map(|a| &a.resource)
    }

    /// Buffer acquired for `id`
    ///
    /// # Panics
    ///
    /// Panics when called outside of a pass build callback.
    pub fn buffer(&self, id: BufferId) -> Option<&Arc<dyn Buffer>> {
        self.assert_building("buffer");
        if id.generation() != self.generation {
            return None;
        }
        self.buffers.get(&id.value())?.acquired.as_ref().map(|a| &a.resource)
    }

    /// Texture acquired for `id`
    ///
    /// # Panics
    ///
    /// Panics when called outside of a pass build callback.
    pub fn texture(&self, id: TextureId) -> Option<&Arc<dyn Texture>> {
        self.assert_building("texture");
        if id.generation() != self.generation {
            return None;
        }
        self.textures.get(&id.value())?.acquired.as_ref().map(|a| &a.resource)
    }

    /// Resolved size of a target set (the frame size for `OUTPUT`)
    ///
    /// # Panics
    ///
    /// Panics when called outside of a pass build callback.
    pub fn target_size(&self, id: TargetSetId) -> Option<UVec2> {
        self.assert_building("target_size");
        if id.is_output() {
            return Some(self.frame_size);
        }
        if id.generation() != self.generation {
            return None;
        }
        self.targets.get(&id.value())?.resolved
    }

    fn assert_building(&self, accessor: &str) {
        assert!(
            self.building,
            "RenderGraph::{}() is only valid inside pass build callbacks",
            accessor
        );
    }

    // ===== QUERIES =====

    pub fn config(&self) -> &RenderGraphConfig {
        &self.config
    }

    /// Replace the profiling callback
    pub fn set_profiler(&mut self, profiler: Option<PassProfiler>) {
        self.profiler = profiler;
    }

    /// Generation ids minted now are tagged with
    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn pass_count(&self) -> usize {
        self.passes.len()
    }

    pub fn is_validated(&self) -> bool {
        self.schedule.is_some()
    }

    /// Statistics of the last `build()` (successful or not)
    pub fn last_frame_stats(&self) -> FrameStats {
        self.last_stats
    }

    pub fn target_set_pool_stats(&self) -> PoolStats {
        self.target_set_pool.stats()
    }

    pub fn buffer_pool_stats(&self) -> PoolStats {
        self.buffer_pool.stats()
    }

    pub fn texture_pool_stats(&self) -> PoolStats {
        self.texture_pool.stats()
    }

    /// Destroy every pooled resource, including persistent ones
    pub fn destroy_pools(&mut self) {
        self.target_set_pool.clear();
        self.buffer_pool.clear();
        self.texture_pool.clear();
        rg_info!(SOURCE, "Resource pools destroyed");
    }

    // ===== INTERNALS =====

    fn mint(&mut self) -> u32 {
        let value = self.next_id;
        self.next_id += 1;
        value
    }

    fn insert_target(
        &mut self,
        name: &str,
        persistent: Option<PersistentHandle>,
        source: ResourceSource<TargetSetDesc, dyn TargetSet>,
    ) -> TargetSetId {
        let value = self.mint();
        self.targets.insert(value, TargetResource::new(name, persistent, source));
        TargetSetId::new(value, self.generation)
    }

    /// Describe what is wrong with a reference, if anything
    fn reference_problem(&self, resource: ResourceRef) -> Option<String> {
        if resource.is_output() {
            return None;
        }
        if resource.is_invalid() {
            return Some(format!("invalid id {}", resource));
        }
        if resource.generation() != self.generation {
            return Some(format!(
                "stale id {} (current generation {})",
                resource, self.generation
            ));
        }
        let value = resource.value();
        let known = match resource {
            ResourceRef::TargetSetId(_) => self.targets.contains_key(&value),
            ResourceRef::BufferId(_) => self.buffers.contains_key(&value),
            ResourceRef::TextureId(_) => self.textures.contains_key(&value),
            ResourceRef::DependencyId(_) => self.dependencies.contains(&value),
        };
        if known {
            None
        } else {
            Some(format!("unknown id {}", resource))
        }
    }

    fn check_references(&self) -> Result<()> {
        for pass in &self.passes {
            for input in pass.inputs() {
                if let Some(problem) = self.reference_problem(input.resource) {
                    rg_bail!(ValidationFailed => SOURCE, "Pass '{}' reads {}", pass.name(), problem);
                }
            }
            if let Some(output) = pass.output() {
                if let Some(problem) = self.reference_problem(output.resource) {
                    rg_bail!(ValidationFailed => SOURCE, "Pass '{}' writes {}", pass.name(), problem);
                }
            }
        }

        for target in self.targets.values() {
            for (what, id) in [("size reference", target.size_reference()), ("shared depth", target.shared_depth())] {
                if id.is_invalid() {
                    continue;
                }
                if let Some(problem) = self.reference_problem(id.into()) {
                    rg_bail!(ValidationFailed => SOURCE, "Target '{}' {} is {}", target.name, what, problem);
                }
            }
            self.check_shared_depth_chain(target)?;
        }
        Ok(())
    }

    /// Depth providers must be pooled targets and must not loop
    fn check_shared_depth_chain(&self, target: &TargetResource) -> Result<()> {
        let mut provider = target.shared_depth();
        let mut steps = 0;
        while provider.is_resource() {
            let record = match self.targets.get(&provider.value()) {
                Some(record) => record,
                None => return Ok(()),
            };
            if record.is_external() {
                rg_bail!(ValidationFailed => SOURCE,
                    "Target '{}' shares depth with external target '{}'", target.name, record.name);
            }
            steps += 1;
            if steps > self.targets.len() {
                rg_bail!(ValidationFailed => SOURCE,
                    "Shared depth chain of target '{}' loops", target.name);
            }
            provider = record.shared_depth();
        }
        if target.shared_depth().is_output() {
            rg_debug!(SOURCE,
                "Target '{}' shares the output depth; it gets its own depth attachment", target.name);
        }
        Ok(())
    }
}

impl Drop for RenderGraph {
    fn drop(&mut self) {
        let pooled = [
            self.target_set_pool.stats(),
            self.buffer_pool.stats(),
            self.texture_pool.stats(),
        ]
        .iter()
        .map(|stats| stats.live + stats.free)
        .sum::<usize>();

        // Pools must be torn down before the render system goes away
        if pooled > 0 {
            rg_error!(SOURCE,
                "Render graph dropped with {} pooled resources; call destroy_pools() first", pooled);
            self.destroy_pools();
        }
    }
}

#[cfg(test)]
#[path = "render_graph_tests.rs"]
mod tests;
