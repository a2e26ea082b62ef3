use alloc::collections::BTreeMap;

/// Tolerance used when comparing main-axis positions.
pub(crate) const EPSILON: f32 = 0.001;

pub(crate) fn near_eq(a: f32, b: f32) -> bool {
    abs(a - b) <= EPSILON
}

// `f32::abs`/`f32::floor` need `std`; these keep the crate usable with `alloc` only.
pub(crate) fn abs(x: f32) -> f32 {
    if x < 0.0 { -x } else { x }
}

pub(crate) fn floor(x: f32) -> f32 {
    if !x.is_finite() {
        return x;
    }
    let t = x as i64 as f32;
    if t > x { t - 1.0 } else { t }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Axis {
    #[default]
    Vertical,
    Horizontal,
}

impl Axis {
    pub fn main(self, size: SizeF) -> f32 {
        match self {
            Self::Vertical => size.height,
            Self::Horizontal => size.width,
        }
    }

    pub fn cross(self, size: SizeF) -> f32 {
        match self {
            Self::Vertical => size.width,
            Self::Horizontal => size.height,
        }
    }

    /// Builds an offset from main/cross components.
    pub fn offset(self, main: f32, cross: f32) -> OffsetF {
        match self {
            Self::Vertical => OffsetF { x: cross, y: main },
            Self::Horizontal => OffsetF { x: main, y: cross },
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SizeF {
    pub width: f32,
    pub height: f32,
}

impl SizeF {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OffsetF {
    pub x: f32,
    pub y: f32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Align {
    #[default]
    Start,
    Center,
    End,
    Auto,
    None,
}

/// How a fling settles relative to item edges.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ScrollSnapAlign {
    #[default]
    None,
    Start,
    Center,
    End,
}

/// Placement of an item inside its lane on the cross axis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CrossAlign {
    #[default]
    Start,
    Center,
    End,
}

/// Which group pseudo-items pin to the viewport edges.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StickyStyle {
    pub header: bool,
    pub footer: bool,
}

impl StickyStyle {
    pub const NONE: Self = Self {
        header: false,
        footer: false,
    };
    pub const HEADER: Self = Self {
        header: true,
        footer: false,
    };
    pub const FOOTER: Self = Self {
        header: false,
        footer: true,
    };
    pub const BOTH: Self = Self {
        header: true,
        footer: true,
    };
}

/// One realized child along the main axis, in window-local coordinates (group-local for the
/// entries of a group).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PositionEntry {
    pub start: f32,
    /// Exclusive end (excludes spacing).
    pub end: f32,
    pub is_group: bool,
    /// Measured cross-axis size, used when placing the child inside its lane.
    pub cross_size: f32,
}

impl PositionEntry {
    pub fn main_size(&self) -> f32 {
        self.end - self.start
    }

    pub(crate) fn shifted(mut self, delta: f32) -> Self {
        self.start += delta;
        self.end += delta;
        self
    }
}

/// Realized children keyed by index. Iteration order is index order.
pub type PositionMap = BTreeMap<usize, PositionEntry>;

pub(crate) fn shift_all(map: &mut PositionMap, delta: f32) {
    if delta == 0.0 {
        return;
    }
    for entry in map.values_mut() {
        *entry = entry.shifted(delta);
    }
}

/// The main-axis span that must be covered by realized entries.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ViewportWindow {
    pub start_main_pos: f32,
    pub end_main_pos: f32,
    pub content_main_size: f32,
    /// For a group request: the group's start (`forward`) or end (`!forward`) in the outer
    /// window. Unused by the list engine itself.
    pub reference_pos: f32,
    pub forward: bool,
    pub cross_size: f32,
    /// When `false`, the reported content size shrinks to the laid-out extent if every child
    /// fits inside the window.
    pub fixed_main_size: bool,
}

impl ViewportWindow {
    /// A window covering `[0, content_main_size)`.
    pub fn new(content_main_size: f32, cross_size: f32) -> Self {
        Self {
            start_main_pos: 0.0,
            end_main_pos: content_main_size,
            content_main_size,
            reference_pos: 0.0,
            forward: true,
            cross_size,
            fixed_main_size: true,
        }
    }

    pub fn with_forward(mut self, forward: bool) -> Self {
        self.forward = forward;
        self
    }

    pub fn with_fixed_main_size(mut self, fixed: bool) -> Self {
        self.fixed_main_size = fixed;
        self
    }

    pub fn main_size(&self) -> f32 {
        (self.end_main_pos - self.start_main_pos).max(0.0)
    }

    pub fn center(&self) -> f32 {
        (self.start_main_pos + self.end_main_pos) / 2.0
    }
}

/// A jump/target index, with the `Last` sentinel resolved against the current child count.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum IndexTarget {
    At(usize),
    Last,
}

impl IndexTarget {
    pub fn resolve(self, count: usize) -> Option<usize> {
        match self {
            Self::At(index) if index < count => Some(index),
            Self::At(_) => None,
            Self::Last => count.checked_sub(1),
        }
    }
}

impl From<usize> for IndexTarget {
    fn from(index: usize) -> Self {
        Self::At(index)
    }
}

/// A one-shot scroll directive consumed by a single `measure` pass.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ScrollIntent {
    #[default]
    None,
    /// Immediate relayout around `index`.
    Jump { index: IndexTarget, align: Align },
    /// Immediate relayout around sub-item `item` of the group at `index`.
    JumpInGroup {
        index: usize,
        item: usize,
        align: Align,
    },
    /// Animated scroll-to; staged until the target is reached.
    Target { index: IndexTarget, align: Align },
    /// Drag/fling offset. Positive values scroll forward (content moves toward the start).
    Delta(f32),
}

impl ScrollIntent {
    pub fn jump(index: impl Into<IndexTarget>, align: Align) -> Self {
        Self::Jump {
            index: index.into(),
            align,
        }
    }

    pub fn target(index: impl Into<IndexTarget>, align: Align) -> Self {
        Self::Target {
            index: index.into(),
            align,
        }
    }
}

/// First/last/center realized indexes that intersect the window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IndexRange {
    pub start_index: usize,
    /// Inclusive.
    pub end_index: usize,
    pub center_index: usize,
}
