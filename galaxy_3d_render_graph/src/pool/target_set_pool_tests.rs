/// Tests for the target set pool against the headless render system

use std::sync::Mutex;

use super::*;
use crate::error::Error;
use crate::render_system::headless::{HeadlessRenderSystem, HeadlessTargetSet};
use crate::render_system::{TargetSetLayout, TextureFormat};

fn setup(budget: Option<u64>) -> (Arc<Mutex<HeadlessRenderSystem>>, TargetSetPool) {
    let mut system = HeadlessRenderSystem::new();
    system.set_memory_budget(budget);
    let system = Arc::new(Mutex::new(system));
    let pool = TargetSetPool::new(system.clone(), PoolConfig::default());
    (system, pool)
}

fn info(width: u32, height: u32, layout: TargetSetLayout) -> TargetSetInfo {
    TargetSetInfo {
        width,
        height,
        sample_count: 1,
        layout,
        double_buffered: false,
    }
}

fn color(width: u32, height: u32) -> TargetSetInfo {
    info(width, height, TargetSetLayout::color(TextureFormat::R8G8B8A8_UNORM))
}

fn headless(target: &Arc<dyn TargetSet>) -> &HeadlessTargetSet {
    target.as_any().downcast_ref::<HeadlessTargetSet>().unwrap()
}

// ============================================================================
// Tests: Creation and reuse
// ============================================================================

#[test]
fn test_acquire_creates_through_render_system() {
    let (system, mut pool) = setup(None);
    let (_, target) = pool.acquire("hdr", color(8, 8), None, None).unwrap();

    assert_eq!(headless(&target).label(), "hdr");
    assert_eq!(system.lock().unwrap().stats().target_sets_created, 1);
}

#[test]
fn test_released_target_reused_for_equal_info() {
    let (system, mut pool) = setup(None);
    let (a, _) = pool.acquire("a", color(8, 8), None, None).unwrap();
    pool.release(a).unwrap();
    let (b, _) = pool.acquire("b", color(8, 8), None, None).unwrap();
    let (c, _) = pool.acquire("c", color(4, 4), None, None).unwrap();

    assert_eq!(a, b);
    assert_ne!(b, c);
    assert_eq!(system.lock().unwrap().stats().target_sets_created, 2);
}

// ============================================================================
// Tests: Shared depth
// ============================================================================

#[test]
fn test_shared_depth_passed_to_render_system() {
    let (_, mut pool) = setup(None);
    let depth_layout = TargetSetLayout::depth(TextureFormat::D32_FLOAT);
    let (depth, depth_target) = pool.acquire("depth", info(8, 8, depth_layout), None, None).unwrap();
    let (_, target) = pool.acquire("color", color(8, 8), Some(depth), None).unwrap();

    assert_eq!(
        headless(&target).shared_depth_serial(),
        Some(headless(&depth_target).serial())
    );
}

#[test]
fn test_shared_depth_is_part_of_the_key() {
    let (_, mut pool) = setup(None);
    let depth_layout = TargetSetLayout::depth(TextureFormat::D32_FLOAT);
    let (depth_a, _) = pool.acquire("da", info(8, 8, depth_layout.clone()), None, None).unwrap();
    let (depth_b, _) = pool.acquire("db", info(8, 8, depth_layout), None, None).unwrap();

    let (with_a, _) = pool.acquire("ca", color(8, 8), Some(depth_a), None).unwrap();
    pool.release(with_a).unwrap();
    let (with_b, _) = pool.acquire("cb", color(8, 8), Some(depth_b), None).unwrap();
    assert_ne!(with_a, with_b);
}

#[test]
fn test_unknown_shared_depth_provider_fails() {
    let (_, mut pool) = setup(None);
    let (depth, _) = pool.acquire("d", color(2, 2), None, None).unwrap();
    pool.clear();
    assert!(matches!(
        pool.acquire("c", color(2, 2), Some(depth), None),
        Err(Error::InvalidResource(_))
    ));
}

// ============================================================================
// Tests: Failures and persistence
// ============================================================================

#[test]
fn test_out_of_memory_propagates() {
    let (_, mut pool) = setup(Some(64));
    assert!(matches!(
        pool.acquire("big", color(64, 64), None, None),
        Err(Error::OutOfMemory)
    ));
    assert_eq!(pool.stats().live, 0);
}

#[test]
fn test_persistent_target_keeps_content() {
    let (_, mut pool) = setup(None);
    let handle = PersistentHandle(77);
    let (a, target) = pool.acquire("history", color(4, 4), None, Some(handle)).unwrap();
    headless(&target).write_content(123);
    pool.release(a).unwrap();
    pool.cleanup();

    // A transient request with a different size must not touch it
    let (t, _) = pool.acquire("scratch", color(2, 2), None, None).unwrap();
    pool.release(t).unwrap();

    let (_, again) = pool.acquire("history", color(4, 4), None, Some(handle)).unwrap();
    assert_eq!(headless(&again).content(), 123);
}

#[test]
fn test_eviction_frees_backend_memory() {
    let system = Arc::new(Mutex::new(HeadlessRenderSystem::new()));
    let mut pool = TargetSetPool::new(system.clone(), PoolConfig { max_idle_frames: 0 });
    let (a, target) = pool.acquire("a", color(4, 4), None, None).unwrap();
    drop(target);
    pool.release(a).unwrap();
    assert_eq!(system.lock().unwrap().stats().live_bytes, 64);

    pool.cleanup();
    assert_eq!(system.lock().unwrap().stats().live_bytes, 0);
}
