/// Tests for the generic resource pool
///
/// Uses `String` resources keyed by `u32` so only the caching rules are
/// exercised: reuse, persistence, descriptor changes, eviction and errors.

use super::*;
use crate::error::Error;

type TestPool = ResourcePool<u32, String>;

fn pool(max_idle_frames: u32) -> TestPool {
    ResourcePool::new("galaxy3d::PoolTest", PoolConfig { max_idle_frames })
}

fn make(name: &str) -> impl FnOnce() -> Result<Arc<String>> + '_ {
    move || Ok(Arc::new(name.to_string()))
}

// ============================================================================
// Tests: Transient reuse
// ============================================================================

#[test]
fn test_released_entry_is_reused_for_equal_key() {
    let mut pool = pool(4);
    let (a, first) = pool.acquire_with(7, None, make("a")).unwrap();
    pool.release(a).unwrap();

    let (b, second) = pool.acquire_with(7, None, make("b")).unwrap();
    assert_eq!(a, b);
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(pool.stats().created, 1);
    assert_eq!(pool.stats().reused, 1);
}

#[test]
fn test_different_key_creates_new_entry() {
    let mut pool = pool(4);
    let (a, _) = pool.acquire_with(1, None, make("a")).unwrap();
    pool.release(a).unwrap();
    let (b, value) = pool.acquire_with(2, None, make("b")).unwrap();

    assert_ne!(a, b);
    assert_eq!(value.as_str(), "b");
    assert_eq!(pool.stats().created, 2);
}

#[test]
fn test_in_use_entry_is_not_shared() {
    let mut pool = pool(4);
    let (a, _) = pool.acquire_with(3, None, make("a")).unwrap();
    let (b, _) = pool.acquire_with(3, None, make("b")).unwrap();
    assert_ne!(a, b);
    assert_eq!(pool.stats().live, 2);
}

#[test]
fn test_create_failure_leaves_pool_untouched() {
    let mut pool = pool(4);
    let result = pool.acquire_with(1, None, || Err(Error::OutOfMemory));
    assert!(matches!(result, Err(Error::OutOfMemory)));
    assert_eq!(pool.stats(), PoolStats::default());
}

// ============================================================================
// Tests: Persistent entries
// ============================================================================

#[test]
fn test_persistent_handle_returns_same_entry_across_frames() {
    let mut pool = pool(4);
    let handle = PersistentHandle(42);
    let (a, first) = pool.acquire_with(5, Some(handle), make("history")).unwrap();
    pool.release(a).unwrap();
    pool.cleanup();

    let (b, second) = pool.acquire_with(5, Some(handle), make("other")).unwrap();
    assert_eq!(a, b);
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(pool.persistent_handle(handle), Some(a));
}

#[test]
fn test_persistent_descriptor_change_recreates() {
    let mut pool = pool(4);
    let handle = PersistentHandle(1);
    let (a, _) = pool.acquire_with(5, Some(handle), make("old")).unwrap();
    pool.release(a).unwrap();

    let (b, value) = pool.acquire_with(6, Some(handle), make("new")).unwrap();
    assert_ne!(a, b);
    assert_eq!(value.as_str(), "new");
    assert!(pool.get(a).is_none());
    assert_eq!(pool.stats().evicted, 1);
}

#[test]
fn test_persistent_prefers_transient_free_entry() {
    let mut pool = pool(4);
    let (a, _) = pool.acquire_with(9, None, make("scratch")).unwrap();
    pool.release(a).unwrap();

    let (b, _) = pool.acquire_with(9, Some(PersistentHandle(3)), make("new")).unwrap();
    assert_eq!(a, b);
    assert_eq!(pool.stats().created, 1);
}

#[test]
fn test_transient_prefers_non_persistent_entries() {
    let mut pool = pool(4);
    let (p, _) = pool.acquire_with(9, Some(PersistentHandle(3)), make("kept")).unwrap();
    let (t, _) = pool.acquire_with(9, None, make("scratch")).unwrap();
    pool.release(t).unwrap();
    pool.release(p).unwrap();

    let (again, _) = pool.acquire_with(9, None, make("x")).unwrap();
    assert_eq!(again, t);
    assert_eq!(pool.persistent_handle(PersistentHandle(3)), Some(p));
}

#[test]
fn test_transient_steals_unreferenced_persistent_entry() {
    let mut pool = pool(4);
    let handle = PersistentHandle(3);
    let (p, _) = pool.acquire_with(9, Some(handle), make("kept")).unwrap();
    pool.release(p).unwrap();

    let (t, _) = pool.acquire_with(9, None, make("x")).unwrap();
    assert_eq!(t, p);
    assert_eq!(pool.persistent_handle(handle), None);
}

#[test]
fn test_transient_never_takes_reserved_persistent_entry() {
    let mut pool = pool(4);
    let handle = PersistentHandle(3);
    let (p, _) = pool.acquire_with(9, Some(handle), make("kept")).unwrap();
    pool.release(p).unwrap();
    pool.cleanup();

    pool.reserve(handle);
    let (t, _) = pool.acquire_with(9, None, make("scratch")).unwrap();
    assert_ne!(t, p);
    let (again, _) = pool.acquire_with(9, Some(handle), make("new")).unwrap();
    assert_eq!(again, p);
    pool.release(t).unwrap();
    pool.release(again).unwrap();

    // Reservations end with the frame
    pool.cleanup();
    pool.acquire_with(9, None, make("x")).unwrap();
    let (stolen, _) = pool.acquire_with(9, None, make("y")).unwrap();
    assert_eq!(stolen, p);
    assert_eq!(pool.persistent_handle(handle), None);
    assert_eq!(pool.stats().created, 2);
}

#[test]
fn test_persistent_acquired_twice_fails() {
    let mut pool = pool(4);
    let handle = PersistentHandle(8);
    pool.acquire_with(1, Some(handle), make("a")).unwrap();
    assert!(matches!(
        pool.acquire_with(1, Some(handle), make("b")),
        Err(Error::InvalidResource(_))
    ));
}

// ============================================================================
// Tests: Release and cleanup
// ============================================================================

#[test]
fn test_double_release_fails() {
    let mut pool = pool(4);
    let (a, _) = pool.acquire_with(1, None, make("a")).unwrap();
    pool.release(a).unwrap();
    assert!(matches!(pool.release(a), Err(Error::InvalidResource(_))));
}

#[test]
fn test_idle_entries_evicted_after_max_idle_frames() {
    let mut pool = pool(2);
    let (a, _) = pool.acquire_with(1, None, make("a")).unwrap();
    pool.release(a).unwrap();

    pool.cleanup();
    pool.cleanup();
    assert!(pool.get(a).is_some());

    pool.cleanup();
    assert!(pool.get(a).is_none());
    assert_eq!(pool.stats().evicted, 1);

    // Stale handle after eviction
    assert!(matches!(pool.release(a), Err(Error::InvalidResource(_))));
}

#[test]
fn test_reacquire_resets_idle_counter() {
    let mut pool = pool(1);
    let (a, _) = pool.acquire_with(1, None, make("a")).unwrap();
    for _ in 0..5 {
        pool.release(a).unwrap();
        pool.cleanup();
        let (b, _) = pool.acquire_with(1, None, make("b")).unwrap();
        assert_eq!(a, b);
    }
    assert_eq!(pool.stats().created, 1);
}

#[test]
fn test_in_use_entries_survive_cleanup() {
    let mut pool = pool(0);
    let (a, _) = pool.acquire_with(1, None, make("a")).unwrap();
    pool.cleanup();
    assert!(pool.is_in_use(a));
}

#[test]
fn test_clear_drops_everything() {
    let mut pool = pool(4);
    let (a, value) = pool.acquire_with(1, Some(PersistentHandle(1)), make("a")).unwrap();
    pool.clear();

    assert!(pool.get(a).is_none());
    assert_eq!(Arc::strong_count(&value), 1);
    assert_eq!(pool.persistent_handle(PersistentHandle(1)), None);
    assert_eq!(pool.stats().live, 0);
}
