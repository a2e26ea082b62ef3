use list_viewport::{
    Align, ChildConstraint, ChildHost, GroupHost, GroupMetadata, ListHost, ListOptions, OffsetF,
    SizeF, ViewportWindow,
};
use list_viewport_adapter::{Controller, PrelayoutStatus};

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
    prebuilt: usize,
}

impl ChildHost for Rows {
    fn child_count(&self) -> usize {
        1_000
    }
    fn measure_child(&mut self, _: usize, c: &ChildConstraint) -> Option<SizeF> {
        self.prebuilt += 1;
        Some(SizeF::new(c.cross_size, 40.0))
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
    // Example: a frame loop feeding UI events into the controller.
    //
    // An adapter would:
    // - forward wheel/drag deltas and commands as they arrive (they coalesce until the frame)
    // - run `frame` once per vsync and place children from the engine positions
    // - spend leftover frame time in `idle`
    let mut rows = Rows { prebuilt: 0 };
    let mut c = Controller::new(ListOptions::default().with_cache_count(2));
    let window = ViewportWindow::new(400.0, 300.0);

    c.scroll_by(30.0);
    c.scroll_by(30.0);
    let out = c.frame(&mut rows, window);
    println!("frame 1 indices={:?}", out.indices);

    let mut clock = 0u64;
    let status = c.idle(&mut rows, 3, || {
        clock += 1;
        clock
    });
    println!("idle status={status:?} measured={}", rows.prebuilt);
    assert!(matches!(
        status,
        PrelayoutStatus::Done | PrelayoutStatus::Pending { .. }
    ));

    c.jump(500, Align::Center);
    let out = c.frame(&mut rows, window);
    println!("frame 2 indices={:?}", out.indices);

    let saved = c.saved_state().map(|s| s.to_restore_string());
    println!("saved={saved:?}");
    if let Some(saved) = saved {
        let mut restored = Controller::default();
        if restored.restore(&saved).is_ok() {
            let out = restored.frame(&mut rows, window);
            println!("restored indices={:?}", out.indices);
        }
    }
}
