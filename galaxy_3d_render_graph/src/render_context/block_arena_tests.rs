/// Tests for the block arena

use std::cell::Cell;
use std::rc::Rc;

use super::*;
use crate::error::Result;
use crate::render_context::CallbackBlock;
use crate::render_system::RenderView;

struct Noop;

impl RenderBlock for Noop {
    fn execute(&mut self, _view: &mut dyn RenderView) -> Result<()> {
        Ok(())
    }
}

struct Payload([u8; 17]);

impl RenderBlock for Payload {
    fn execute(&mut self, _view: &mut dyn RenderView) -> Result<()> {
        Ok(())
    }
}

/// Counts its own drops
struct DropCounter(Rc<Cell<u32>>);

impl RenderBlock for DropCounter {
    fn execute(&mut self, _view: &mut dyn RenderView) -> Result<()> {
        Ok(())
    }
}

impl Drop for DropCounter {
    fn drop(&mut self) {
        self.0.set(self.0.get() + 1);
    }
}

// ============================================================================
// Tests: Allocation
// ============================================================================

#[test]
fn test_alloc_returns_sequential_ids() {
    let mut arena = BlockArena::new(1024);
    let a = arena.alloc(Noop, None);
    let b = arena.alloc(Noop, Some("second"));

    assert_eq!(a.index(), 0);
    assert_eq!(b.index(), 1);
    assert_eq!(arena.len(), 2);
    assert_eq!(arena.name(a), None);
    assert_eq!(arena.name(b), Some("second"));
}

#[test]
fn test_alloc_charges_aligned_sizes() {
    let mut arena = BlockArena::new(1024);
    arena.alloc(Noop, None);
    assert_eq!(arena.used_bytes(), BLOCK_ALIGN);

    // 17 bytes round up to two units
    arena.alloc(Payload([0; 17]), None);
    assert_eq!(arena.used_bytes(), BLOCK_ALIGN * 3);

    // Names are charged too
    arena.alloc(Noop, Some("a-name-longer-than-16"));
    assert_eq!(arena.used_bytes(), BLOCK_ALIGN * 5);
}

#[test]
#[should_panic(expected = "arena overflow")]
fn test_alloc_past_budget_panics() {
    let mut arena = BlockArena::new(BLOCK_ALIGN * 2);
    arena.alloc(Noop, None);
    arena.alloc(Noop, None);
    arena.alloc(Noop, None);
}

// ============================================================================
// Tests: Reset
// ============================================================================

#[test]
fn test_reset_runs_destructors_and_restores_budget() {
    let drops = Rc::new(Cell::new(0));
    let mut arena = BlockArena::new(1024);
    let id = arena.alloc(DropCounter(drops.clone()), None);
    arena.alloc(DropCounter(drops.clone()), None);

    arena.reset();
    assert_eq!(drops.get(), 2);
    assert_eq!(arena.used_bytes(), 0);
    assert!(!arena.contains(id));
    assert!(arena.get(id).is_none());
}

#[test]
fn test_drop_runs_destructors() {
    let drops = Rc::new(Cell::new(0));
    {
        let mut arena = BlockArena::new(1024);
        arena.alloc(DropCounter(drops.clone()), None);
    }
    assert_eq!(drops.get(), 1);
}

#[test]
fn test_callback_captures_charged_against_budget() {
    let mut arena = BlockArena::new(1024);
    let captured = [7u8; 40];
    arena.alloc(
        CallbackBlock::new(move |view: &mut dyn RenderView| view.debug_marker(&captured.len().to_string())),
        None,
    );
    assert!(arena.used_bytes() >= captured.len());
}

#[test]
fn test_reset_keeps_bump_chunk() {
    let mut arena = BlockArena::new(4096);
    let reserved = arena.reserved_bytes();
    assert!(reserved > 0);

    for _ in 0..3 {
        for i in 0..8 {
            arena.alloc(Payload([i; 17]), Some("payload"));
        }
        arena.reset();
    }
    assert_eq!(arena.reserved_bytes(), reserved);
}
