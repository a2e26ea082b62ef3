use crate::{Axis, OffsetF, SizeF, StickyStyle};

/// Constraint handed to the host when a child is measured.
///
/// Only the axis and the lane cross length are decided by the engine; padding and percent
/// references are the host's business.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChildConstraint {
    pub axis: Axis,
    /// Cross-axis length available to the child (one lane).
    pub cross_size: f32,
    /// Main-axis length of the viewport, for percent-based children.
    pub main_reference: f32,
}

/// Access to the children of one scrollable level (the list, or a single group).
///
/// The engines never allocate or free children themselves: `measure_child` realizes a child
/// (get-or-create) and `remove_child` tells the host it may destroy it.
pub trait ChildHost {
    fn child_count(&self) -> usize;

    /// Realizes and measures child `index`. `None` means the child is missing; growth stops.
    fn measure_child(&mut self, index: usize, constraint: &ChildConstraint) -> Option<SizeF>;

    fn place_child(&mut self, index: usize, offset: OffsetF);

    /// Also sent for children queued for pre-layout that the host never realized; unknown
    /// indexes are ignored.
    fn remove_child(&mut self, index: usize);
}

/// Host of the top-level list.
pub trait ListHost: ChildHost {
    type Group: GroupHost;

    fn is_group(&self, index: usize) -> bool;

    /// Realizes the group at `index` and returns its children. `None` for plain items or when
    /// the group cannot be created.
    fn group_mut(&mut self, index: usize) -> Option<&mut Self::Group>;
}

/// Host of one group. Child indexes cover the header, footer and items.
pub trait GroupHost: ChildHost {
    fn metadata(&self) -> GroupMetadata;
}

/// Static description of a group's children.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GroupMetadata {
    pub header_index: Option<usize>,
    pub footer_index: Option<usize>,
    /// Child index of item 0.
    pub item_start_index: usize,
    pub total_item_count: usize,
    pub sticky: StickyStyle,
    /// Space between items of this group.
    pub spacing: f32,
}

impl GroupMetadata {
    pub(crate) fn child_index(&self, item: usize) -> usize {
        self.item_start_index + item
    }
}
