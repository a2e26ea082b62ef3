use alloc::sync::Arc;

use crate::{Axis, CrossAlign, IndexRange, ScrollSnapAlign};

/// Externally computed per-index main-axis correction (spring "chain" propagation).
///
/// Read during placement and eviction checks only; the engine never stores spring state.
pub type ChainOffsetFn = Arc<dyn Fn(usize) -> f32 + Send + Sync>;

/// A callback fired when the start/end/center index changes between passes.
pub type IndexChangeCallback = Arc<dyn Fn(IndexRange) + Send + Sync>;

/// Configuration for [`crate::ListEngine`].
///
/// Cheap to clone: callbacks are stored in `Arc`s so hosts can tweak a field and call
/// `ListEngine::set_options` every frame.
pub struct ListOptions {
    pub axis: Axis,
    /// Space between consecutive lines. Ignored when it does not fit the viewport.
    pub spacing: f32,
    /// Lines beyond the realized range handed to idle pre-layout.
    pub cache_count: usize,
    /// Extra main-axis distance on both sides of the window that is laid out synchronously.
    pub cache_extent: f32,
    pub cross_align: CrossAlign,
    pub snap_align: ScrollSnapAlign,
    /// Allows content to be dragged past its natural bounds (no bounds reconciliation).
    pub over_scroll: bool,
    pub chain_offset: Option<ChainOffsetFn>,
    pub on_index_change: Option<IndexChangeCallback>,
}

impl Clone for ListOptions {
    fn clone(&self) -> Self {
        Self {
            axis: self.axis,
            spacing: self.spacing,
            cache_count: self.cache_count,
            cache_extent: self.cache_extent,
            cross_align: self.cross_align,
            snap_align: self.snap_align,
            over_scroll: self.over_scroll,
            chain_offset: self.chain_offset.clone(),
            on_index_change: self.on_index_change.clone(),
        }
    }
}

impl Default for ListOptions {
    fn default() -> Self {
        Self::new(Axis::Vertical)
    }
}

impl ListOptions {
    pub fn new(axis: Axis) -> Self {
        Self {
            axis,
            spacing: 0.0,
            cache_count: 1,
            cache_extent: 0.0,
            cross_align: CrossAlign::Start,
            snap_align: ScrollSnapAlign::None,
            over_scroll: false,
            chain_offset: None,
            on_index_change: None,
        }
    }

    pub fn with_spacing(mut self, spacing: f32) -> Self {
        self.spacing = spacing;
        self
    }

    pub fn with_cache_count(mut self, cache_count: usize) -> Self {
        self.cache_count = cache_count;
        self
    }

    pub fn with_cache_extent(mut self, cache_extent: f32) -> Self {
        self.cache_extent = cache_extent.max(0.0);
        self
    }

    pub fn with_cross_align(mut self, cross_align: CrossAlign) -> Self {
        self.cross_align = cross_align;
        self
    }

    pub fn with_snap_align(mut self, snap_align: ScrollSnapAlign) -> Self {
        self.snap_align = snap_align;
        self
    }

    pub fn with_over_scroll(mut self, over_scroll: bool) -> Self {
        self.over_scroll = over_scroll;
        self
    }

    pub fn with_chain_offset(
        mut self,
        chain_offset: Option<impl Fn(usize) -> f32 + Send + Sync + 'static>,
    ) -> Self {
        self.chain_offset = chain_offset.map(|f| Arc::new(f) as _);
        self
    }

    pub fn with_on_index_change(
        mut self,
        on_index_change: Option<impl Fn(IndexRange) + Send + Sync + 'static>,
    ) -> Self {
        self.on_index_change = on_index_change.map(|f| Arc::new(f) as _);
        self
    }

    pub(crate) fn chain_offset(&self, index: usize) -> f32 {
        self.chain_offset.as_ref().map_or(0.0, |f| f(index))
    }

    /// Spacing actually applied for a viewport of `main_size`.
    pub(crate) fn effective_spacing(&self, main_size: f32) -> f32 {
        effective_spacing(self.spacing, main_size)
    }
}

pub(crate) fn effective_spacing(spacing: f32, main_size: f32) -> f32 {
    if spacing < 0.0 || spacing >= main_size {
        0.0
    } else {
        spacing
    }
}

impl core::fmt::Debug for ListOptions {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ListOptions")
            .field("axis", &self.axis)
            .field("spacing", &self.spacing)
            .field("cache_count", &self.cache_count)
            .field("cache_extent", &self.cache_extent)
            .field("cross_align", &self.cross_align)
            .field("snap_align", &self.snap_align)
            .field("over_scroll", &self.over_scroll)
            .field("chain_offset", &self.chain_offset.is_some())
            .finish_non_exhaustive()
    }
}
