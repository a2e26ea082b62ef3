// Example: a plain list of fixed-height rows, scrolled and jumped.
use list_viewport::{
    Align, ChildConstraint, ChildHost, GroupHost, GroupMetadata, LaneConfig, ListEngine, ListHost,
    ListOptions, OffsetF, ScrollIntent, SizeF, ViewportWindow,
};

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

struct Rows {
    count: usize,
}

impl ChildHost for Rows {
    fn child_count(&self) -> usize {
        self.count
    }
    fn measure_child(&mut self, index: usize, c: &ChildConstraint) -> Option<SizeF> {
        // Every tenth row is taller.
        let h = if index % 10 == 0 { 80.0 } else { 50.0 };
        Some(SizeF::new(c.cross_size, h))
    }
    fn place_child(&mut self, _: usize, _: OffsetF) {}
    fn remove_child(&mut self, _: usize) {}
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

fn main() {
    let mut rows = Rows { count: 10_000 };
    let mut engine = ListEngine::new(ListOptions::default().with_spacing(4.0));
    let window = ViewportWindow::new(600.0, 320.0);
    let lanes = LaneConfig::single();

    let out = engine.measure(&mut rows, window, ScrollIntent::None, &lanes);
    println!("initial indices={:?}", out.indices);

    let out = engine.measure(&mut rows, window, ScrollIntent::Delta(1_234.0), &lanes);
    println!(
        "after delta indices={:?} estimated_offset={:?} estimated_total={:?}",
        out.indices, out.estimated_offset, out.estimated_total_size
    );

    let out = engine.measure(
        &mut rows,
        window,
        ScrollIntent::jump(5_000, Align::Center),
        &lanes,
    );
    println!("after jump indices={:?}", out.indices);
    println!("saved={:?}", engine.saved_state().map(|s| s.to_restore_string()));

    let grid = LaneConfig::fixed(4).with_gutter(8.0);
    let out = engine.measure(&mut rows, window, ScrollIntent::None, &grid);
    println!("as a 4-lane grid indices={:?}", out.indices);
}
