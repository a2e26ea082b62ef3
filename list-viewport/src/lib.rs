//! A headless viewport engine for virtualized lists.
//!
//! For frame-driving utilities (intent queueing, idle pre-layout), see the
//! `list-viewport-adapter` crate.
//!
//! The engine keeps positions only for the children around the visible window. Every pass it
//! shifts them by the scroll delta, grows outward from an anchor until the window is covered,
//! keeps the content inside its natural bounds and evicts what scrolled away. Items may be
//! arranged in lanes, and group children (with optional sticky header/footer) run a nested
//! engine of their own.
//!
//! It is UI-agnostic. A TUI/GUI layer is expected to provide:
//! - the window (main-axis span and cross size)
//! - child realization and measurement through [`ListHost`]/[`GroupHost`]
//! - a [`ScrollIntent`] per frame
#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

#[cfg(test)]
extern crate std;

#[macro_use]
mod macros;

mod estimate;
mod group;
mod host;
mod lanes;
mod list;
mod options;
mod snap;
mod state;
mod types;


pub use group::{GroupEngine, GroupLayout, GroupRequest};
pub use host::{ChildConstraint, ChildHost, GroupHost, GroupMetadata, ListHost};
pub use lanes::{LaneConfig, ResolvedLanes};
pub use list::{ListEngine, MeasureOutput, PrelayoutRequest, TargetPosition};
pub use options::{ChainOffsetFn, IndexChangeCallback, ListOptions};
pub use state::{RestoreError, SavedScrollState};
pub use types::{
    Align, Axis, CrossAlign, IndexRange, IndexTarget, OffsetF, PositionEntry, PositionMap,
    ScrollIntent, ScrollSnapAlign, SizeF, StickyStyle, ViewportWindow,
};
