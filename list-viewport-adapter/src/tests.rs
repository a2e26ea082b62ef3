use crate::*;

use list_viewport::{
    Align, ChildConstraint, ChildHost, GroupHost, GroupMetadata, ListHost, ListOptions, OffsetF,
    PrelayoutRequest, RestoreError, SavedScrollState, ScrollIntent, SizeF, ViewportWindow,
};
use std::cell::Cell;
use std::collections::BTreeSet;
use std::vec;
use std::vec::Vec;

#[derive(Debug, Default)]
struct NoGroup;

impl ChildHost for NoGroup {
    fn child_count(&self) -> usize {
        0
    }

    fn measure_child(&mut self, _: usize, _: &ChildConstraint) -> Option<SizeF> {
        None
    }

    fn place_child(&mut self, _: usize, _: OffsetF) {}

    fn remove_child(&mut self, _: usize) {}
}

impl GroupHost for NoGroup {
    fn metadata(&self) -> GroupMetadata {
        GroupMetadata::default()
    }
}

#[derive(Debug, Default)]
struct Rows {
    count: usize,
    missing: BTreeSet<usize>,
    realized: BTreeSet<usize>,
    measured: Vec<usize>,
}

impl ChildHost for Rows {
    fn child_count(&self) -> usize {
        self.count
    }

    fn measure_child(&mut self, index: usize, constraint: &ChildConstraint) -> Option<SizeF> {
        (index < self.count && !self.missing.contains(&index)).then(|| {
            self.realized.insert(index);
            self.measured.push(index);
            SizeF::new(constraint.cross_size, 20.0)
        })
    }

    fn place_child(&mut self, _: usize, _: OffsetF) {}

    fn remove_child(&mut self, index: usize) {
        self.realized.remove(&index);
    }
}

impl ListHost for Rows {
    type Group = NoGroup;

    fn is_group(&self, _: usize) -> bool {
        false
    }

    fn group_mut(&mut self, _: usize) -> Option<&mut NoGroup> {
        None
    }
}

fn window() -> ViewportWindow {
    ViewportWindow::new(200.0, 100.0)
}

#[test]
fn newer_intent_replaces_pending_and_deltas_accumulate() {
    let mut c = Controller::default();
    c.scroll_by(10.0);
    c.scroll_by(15.0);
    assert_eq!(c.pending_intent(), ScrollIntent::Delta(25.0));

    c.jump(40, Align::Start);
    assert_eq!(c.pending_intent(), ScrollIntent::jump(40, Align::Start));

    c.scroll_by(5.0);
    assert_eq!(c.pending_intent(), ScrollIntent::Delta(5.0));
}

#[test]
fn frame_consumes_the_pending_intent() {
    let mut rows = Rows {
        count: 100,
        ..Rows::default()
    };
    let mut c = Controller::default();
    c.jump(40, Align::Start);
    let out = c.frame(&mut rows, window());
    assert_eq!(out.indices.unwrap().start_index, 40);
    assert_eq!(c.pending_intent(), ScrollIntent::None);

    c.scroll_by(30.0);
    let out = c.frame(&mut rows, window());
    assert_eq!(out.indices.unwrap().start_index, 41);
}

#[test]
fn saved_state_restores_start_index() {
    let mut rows = Rows {
        count: 100,
        ..Rows::default()
    };
    let mut c = Controller::default();
    c.jump(17, Align::Start);
    c.frame(&mut rows, window());
    let saved = c.saved_state().unwrap().to_restore_string();
    assert_eq!(saved, "17");

    let mut restored = Controller::default();
    restored.restore(&saved).unwrap();
    let out = restored.frame(&mut rows, window());
    assert_eq!(out.indices.unwrap().start_index, 17);
    assert_eq!(
        restored.saved_state(),
        Some(SavedScrollState { start_index: 17 })
    );

    restored.scroll_by(3.0);
    assert!(matches!(
        restored.restore("seventeen"),
        Err(RestoreError::InvalidIndex(_))
    ));
    assert_eq!(restored.pending_intent(), ScrollIntent::Delta(3.0));
}

#[test]
fn idle_prelayout_respects_deadline_and_resumes() {
    let mut rows = Rows {
        count: 100,
        ..Rows::default()
    };
    let mut c = Controller::new(ListOptions::default().with_cache_count(3));
    c.frame(&mut rows, window());
    assert!(c.has_idle_work());
    rows.measured.clear();

    // Each clock read advances by 1ms; deadline allows two children.
    let clock = Cell::new(0u64);
    let now = || {
        let t = clock.get();
        clock.set(t + 1);
        t
    };
    let status = c.idle(&mut rows, 2, now);
    assert_eq!(status, PrelayoutStatus::Pending { remaining: 1 });
    assert_eq!(rows.measured, vec![10, 11]);

    let status = c.idle(&mut rows, u64::MAX, || 0);
    assert_eq!(status, PrelayoutStatus::Done);
    assert_eq!(rows.measured, vec![10, 11, 12]);
    assert!(!c.has_idle_work());

    // A new frame replaces the queue; cancel drops it.
    c.frame(&mut rows, window());
    c.cancel_idle();
    assert_eq!(c.idle(&mut rows, u64::MAX, || 0), PrelayoutStatus::Done);
}

#[test]
fn cursor_skips_indexes_past_the_current_count() {
    let mut rows = Rows {
        count: 5,
        ..Rows::default()
    };
    let mut cursor = PrelayoutCursor::from_request(PrelayoutRequest {
        indices: vec![3, 7, 4],
        constraint: ChildConstraint {
            axis: list_viewport::Axis::Vertical,
            cross_size: 100.0,
            main_reference: 200.0,
        },
    });
    assert_eq!(cursor.len(), 3);
    assert_eq!(cursor.run(&mut rows, u64::MAX, || 0), PrelayoutStatus::Done);
    assert_eq!(rows.measured, vec![3, 4]);
    assert!(cursor.is_empty());
    assert_eq!(
        cursor.measured(),
        &[(3, SizeF::new(100.0, 20.0)), (4, SizeF::new(100.0, 20.0))]
    );
}

#[test]
fn cursor_records_only_children_the_host_provides() {
    let mut rows = Rows {
        count: 10,
        missing: BTreeSet::from([5]),
        ..Rows::default()
    };
    let mut cursor = PrelayoutCursor::from_request(PrelayoutRequest {
        indices: vec![4, 5, 6],
        constraint: ChildConstraint {
            axis: list_viewport::Axis::Vertical,
            cross_size: 100.0,
            main_reference: 200.0,
        },
    });
    assert_eq!(cursor.run(&mut rows, u64::MAX, || 0), PrelayoutStatus::Done);
    let indices: Vec<usize> = cursor.measured().iter().map(|&(i, _)| i).collect();
    assert_eq!(indices, vec![4, 6]);
}

#[test]
fn unused_prelayout_children_are_released_by_the_next_frame() {
    let mut rows = Rows {
        count: 100,
        ..Rows::default()
    };
    let mut c = Controller::new(ListOptions::default().with_cache_count(2));
    c.frame(&mut rows, window());
    assert_eq!(c.idle(&mut rows, u64::MAX, || 0), PrelayoutStatus::Done);
    assert!(rows.realized.contains(&10) && rows.realized.contains(&11));

    c.jump(50, Align::Start);
    c.frame(&mut rows, window());
    assert_eq!(rows.realized, (50..60).collect::<BTreeSet<_>>());
}
