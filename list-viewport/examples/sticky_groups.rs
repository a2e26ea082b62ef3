// Example: grouped sections with sticky headers.
use list_viewport::{
    Align, ChildConstraint, ChildHost, GroupHost, GroupMetadata, LaneConfig, ListEngine, ListHost,
    ListOptions, OffsetF, ScrollIntent, SizeF, StickyStyle, ViewportWindow,
};

const SECTION_ITEMS: usize = 25;

struct Section {
    header_at: OffsetF,
}

impl ChildHost for Section {
    fn child_count(&self) -> usize {
        SECTION_ITEMS + 1
    }
    fn measure_child(&mut self, index: usize, c: &ChildConstraint) -> Option<SizeF> {
        let h = if index == 0 { 32.0 } else { 48.0 };
        Some(SizeF::new(c.cross_size, h))
    }
    fn place_child(&mut self, index: usize, offset: OffsetF) {
        if index == 0 {
            self.header_at = offset;
        }
    }
    fn remove_child(&mut self, _: usize) {}
}

impl GroupHost for Section {
    fn metadata(&self) -> GroupMetadata {
        GroupMetadata {
            header_index: Some(0),
            footer_index: None,
            item_start_index: 1,
            total_item_count: SECTION_ITEMS,
            sticky: StickyStyle::HEADER,
            spacing: 2.0,
        }
    }
}

struct Sections {
    sections: Vec<Section>,
}

impl ChildHost for Sections {
    fn child_count(&self) -> usize {
        self.sections.len()
    }
    fn measure_child(&mut self, _: usize, _: &ChildConstraint) -> Option<SizeF> {
        // Every child is a group.
        None
    }
    fn place_child(&mut self, _: usize, _: OffsetF) {}
    fn remove_child(&mut self, _: usize) {}
}

impl ListHost for Sections {
    type Group = Section;
    fn is_group(&self, index: usize) -> bool {
        index < self.sections.len()
    }
    fn group_mut(&mut self, index: usize) -> Option<&mut Section> {
        self.sections.get_mut(index)
    }
}

fn main() {
    let mut host = Sections {
        sections: (0..40)
            .map(|_| Section {
                header_at: OffsetF::default(),
            })
            .collect(),
    };
    let mut engine = ListEngine::new(ListOptions::default().with_spacing(8.0));
    let window = ViewportWindow::new(480.0, 360.0);
    let lanes = LaneConfig::single();

    for intent in [
        ScrollIntent::None,
        ScrollIntent::Delta(300.0),
        ScrollIntent::Delta(300.0),
        ScrollIntent::JumpInGroup {
            index: 12,
            item: 20,
            align: Align::Start,
        },
    ] {
        let out = engine.measure(&mut host, window, intent, &lanes);
        engine.layout(&mut host);
        let Some(indices) = out.indices else {
            continue;
        };
        let first = indices.start_index;
        let origin = engine.positions()[&first].start;
        println!(
            "intent={intent:?} first_section={first} origin={origin} header_at={:?}",
            host.sections[first].header_at
        );
    }
}
