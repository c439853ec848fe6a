//! Galaxy3D render graph demo
//!
//! Builds a few frames of a small deferred pipeline against the headless
//! render system and prints the recorded command stream and frame stats.
//! The window size changes after two frames to show pooled target sets
//! being recreated.
//!
//! Run with: RUST_LOG=debug cargo run -p galaxy3d_demo

use std::sync::{Arc, Mutex};

use galaxy_3d_render_graph::galaxy3d::log::{Log, LogEntry, LogSeverity, Logger};
use galaxy_3d_render_graph::galaxy3d::render::headless::{HeadlessRenderSystem, HeadlessRenderView};
use galaxy_3d_render_graph::galaxy3d::render::{
    ClearSpec, LoadMask, RenderView, StoreMask, TargetSetLayout, TextureFormat,
};
use galaxy_3d_render_graph::galaxy3d::{
    CallbackBlock, DrawSortKey, PersistentHandle, PriorityBucket, RenderContext, RenderGraph,
    RenderBlock, RenderPass, Result, TargetSetDesc, TargetSetId,
};

const FRAMES: usize = 4;
const TAA_HISTORY: PersistentHandle = PersistentHandle(1);

/// Forwards render graph log entries to the `log` facade
struct LogBridge;

impl Logger for LogBridge {
    fn log(&self, entry: &LogEntry) {
        let level = match entry.severity {
            LogSeverity::Trace => log::Level::Trace,
            LogSeverity::Debug => log::Level::Debug,
            LogSeverity::Info => log::Level::Info,
            LogSeverity::Warn => log::Level::Warn,
            LogSeverity::Error => log::Level::Error,
        };
        match (entry.file, entry.line) {
            (Some(file), Some(line)) => {
                log::log!(target: "galaxy3d", level, "[{}] {} ({}:{})", entry.source, entry.message, file, line)
            }
            _ => log::log!(target: "galaxy3d", level, "[{}] {}", entry.source, entry.message),
        }
    }
}

/// Block recording a named draw into the headless command stream
fn draw(name: &'static str, distance: f32, shader: u32) -> impl RenderBlock {
    CallbackBlock::new(move |view: &mut dyn RenderView| {
        if let Some(headless) = view.as_any_mut().downcast_mut::<HeadlessRenderView>() {
            headless.record(format!("draw:{}", name));
        }
        Ok(())
    })
    .with_sort_key(DrawSortKey::new(distance, shader))
}

fn register_frame(graph: &mut RenderGraph) {
    let hdr = TargetSetLayout::color(TextureFormat::R16G16B16A16_SFLOAT);

    let depth = graph.add_transient_target_set(
        "depth",
        TargetSetDesc::new(TargetSetLayout::depth(TextureFormat::D32_FLOAT)).with_multisample(true),
    );
    let scene = graph.add_transient_target_set(
        "scene",
        TargetSetDesc::new(hdr.clone()).with_multisample(true).with_shared_depth(depth),
    );
    let bloom = graph.add_transient_target_set("bloom", TargetSetDesc::new(hdr.clone()).with_scale(1, 2));
    let history = graph.add_persistent_target_set(
        "taa_history",
        TAA_HISTORY,
        TargetSetDesc::new(hdr.clone()).with_double_buffering(true),
    );

    let mut opaque = RenderPass::new("opaque");
    opaque.set_output(scene, ClearSpec::all([0.0, 0.0, 0.0, 1.0], 1.0, 0), LoadMask::empty(), StoreMask::all());
    opaque.add_build(|_: &RenderGraph, ctx: &mut RenderContext| {
        for (name, distance, shader) in [("rock", 40.0, 2), ("ship", 5.0, 1), ("planet", 900.0, 1)] {
            let block = ctx.alloc(draw(name, distance, shader));
            ctx.draw_priority(PriorityBucket::Opaque, block);
        }
        let sky = ctx.alloc(draw("skybox", 0.0, 0));
        ctx.draw_priority(PriorityBucket::PostOpaque, sky);
    });

    // Same target as opaque: recorded into the same render pass
    let mut transparent = RenderPass::new("transparent");
    transparent.set_output(scene, ClearSpec::none(), LoadMask::all(), StoreMask::all());
    transparent.add_build(|_: &RenderGraph, ctx: &mut RenderContext| {
        for (name, distance) in [("glass", 3.0), ("smoke", 30.0)] {
            let block = ctx.alloc(draw(name, distance, 0));
            ctx.draw_priority(PriorityBucket::AlphaBlend, block);
        }
    });

    let mut bright = RenderPass::new("bloom");
    bright.set_output(bloom, ClearSpec::none(), LoadMask::empty(), StoreMask::all());
    bright.add_input(scene);
    bright.add_build(move |graph: &RenderGraph, ctx: &mut RenderContext| {
        let size = graph.target_size(bloom).unwrap_or_default();
        log::debug!("bloom at {}x{}", size.x, size.y);
        let block = ctx.alloc_named("bloom_downsample", draw("fullscreen", 0.0, 0));
        ctx.draw(block);
    });

    let mut taa = RenderPass::new("taa");
    taa.set_output(history, ClearSpec::none(), LoadMask::empty(), StoreMask::all());
    taa.add_input(scene);
    taa.add_build(|_: &RenderGraph, ctx: &mut RenderContext| {
        let block = ctx.alloc(draw("resolve_taa", 0.0, 0));
        ctx.draw(block);
    });

    let mut present = RenderPass::new("present");
    present.set_output(TargetSetId::OUTPUT, ClearSpec::none(), LoadMask::empty(), StoreMask::COLOR);
    present.add_input(history).add_input(bloom);
    present.add_build(|_: &RenderGraph, ctx: &mut RenderContext| {
        let block = ctx.alloc(draw("tonemap", 0.0, 0));
        ctx.draw(block);
    });

    // Never reached from a root: culled
    let mut debug_overlay = RenderPass::new("debug_overlay");
    let overlay = graph.add_transient_target_set("overlay", TargetSetDesc::new(hdr.clone()));
    debug_overlay.set_output(overlay, ClearSpec::none(), LoadMask::empty(), StoreMask::all());

    graph.add_pass(present);
    graph.add_pass(debug_overlay);
    graph.add_pass(taa);
    graph.add_pass(bright);
    graph.add_pass(opaque);
    graph.add_pass(transparent);
}

fn run_frame(graph: &mut RenderGraph, ctx: &mut RenderContext, width: u32, height: u32) -> Result<Vec<String>> {
    register_frame(graph);
    graph.validate()?;
    graph.build(ctx, width, height)?;

    let mut view = HeadlessRenderView::new();
    ctx.render(&mut view)?;
    Ok(view.commands)
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    Log::set_logger(LogBridge);
    Log::set_min_severity(LogSeverity::Debug);

    let system = Arc::new(Mutex::new(HeadlessRenderSystem::new()));
    let mut graph = RenderGraph::new(system.clone(), 4, None);
    let mut ctx = RenderContext::new(1 << 20);

    for frame in 0..FRAMES {
        let (width, height) = if frame < 2 { (1280, 720) } else { (1920, 1080) };
        let commands = match run_frame(&mut graph, &mut ctx, width, height) {
            Ok(commands) => commands,
            Err(e) => {
                log::error!("Frame {} failed: {}", frame, e);
                continue;
            }
        };

        println!("=== Frame {} ({}x{}) ===", frame, width, height);
        for command in &commands {
            println!("  {}", command);
        }

        let stats = graph.last_frame_stats();
        println!(
            "  passes: {} executed, {} culled, {} merged; render passes: {}; early releases: {}",
            stats.executed_passes,
            stats.culled_passes,
            stats.merged_passes,
            stats.render_passes_opened,
            stats.targets_released_early,
        );
        let pool = graph.target_set_pool_stats();
        println!(
            "  target set pool: {} free, {} created, {} reused, {} evicted",
            pool.free, pool.created, pool.reused, pool.evicted
        );
    }

    match system.lock() {
        Ok(system) => {
            let stats = system.stats();
            println!(
                "Render system: {} target sets created, {} bytes live",
                stats.target_sets_created, stats.live_bytes
            );
        }
        Err(_) => log::error!("Render system lock poisoned"),
    }

    graph.destroy_pools();
    Log::reset_logger();
}
