use alloc::collections::{BTreeMap, BTreeSet};
use alloc::vec::Vec;

use crate::estimate::LineEstimator;
use crate::group::{GroupEngine, GroupLayout, GroupRequest};
use crate::snap::SnapContext;
use crate::state::SavedScrollState;
use crate::types::{EPSILON, abs, shift_all};
use crate::{
    Align, ChildConstraint, GroupHost, IndexRange, IndexTarget, LaneConfig, ListHost,
    ListOptions, PositionEntry, PositionMap, ResolvedLanes, ScrollIntent, ScrollSnapAlign,
    ViewportWindow,
};

/// Remaining distance to a staged scroll target.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TargetPosition {
    pub index: usize,
    /// Scroll delta that aligns the target. Positive values scroll forward.
    pub offset: f32,
    /// `false` when the target is not realized yet and `offset` is estimated.
    pub exact: bool,
}

/// Indexes to pre-measure when the host is idle.
#[derive(Clone, Debug, PartialEq)]
pub struct PrelayoutRequest {
    pub indices: Vec<usize>,
    pub constraint: ChildConstraint,
}

/// Derived scalars of one `measure` pass.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeasureOutput {
    pub content_main_size: f32,
    pub indices: Option<IndexRange>,
    /// Whether start/end/center differ from the previous pass.
    pub index_changed: bool,
    /// Estimated distance from the content start to the window start (scrollbar thumb).
    pub estimated_offset: Option<f32>,
    pub estimated_total_size: Option<f32>,
    /// Shift applied to keep the content inside its natural bounds.
    pub offset_correction: f32,
    pub target: Option<TargetPosition>,
    pub predict_snap_offset: Option<f32>,
    pub prelayout: Option<PrelayoutRequest>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct StagedTarget {
    index: IndexTarget,
    align: Align,
}

/// Geometry fixed for one pass.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Pass {
    count: usize,
    spacing: f32,
    lanes: ResolvedLanes,
    window: ViewportWindow,
    /// The window widened by the cache extent.
    lo: f32,
    hi: f32,
    constraint: ChildConstraint,
}

/// The viewport engine of a list.
///
/// Each [`measure`](Self::measure) pass grows the position map from an anchor until the window is
/// covered, reconciles the content with its natural bounds and evicts what fell outside.
/// Groups are delegated to one [`GroupEngine`] per realized group child.
#[derive(Clone, Debug)]
pub struct ListEngine {
    options: ListOptions,
    positions: PositionMap,
    groups: BTreeMap<usize, GroupEngine>,
    staged_target: Option<StagedTarget>,
    pending_snap: Option<f32>,
    last_indices: Option<IndexRange>,
    /// First entry of the previous pass, used when the map empties after a data change.
    anchor: Option<(usize, f32)>,
    estimator: LineEstimator,
    last_pass: Option<Pass>,
    /// Indexes realized during the current pass.
    touched: BTreeSet<usize>,
    /// Indexes handed out in the last pre-layout request.
    prelayout: Vec<usize>,
    relayout: bool,
}

impl Default for ListEngine {
    fn default() -> Self {
        Self::new(ListOptions::default())
    }
}

impl ListEngine {
    pub fn new(options: ListOptions) -> Self {
        vdebug!(options = ?options, "ListEngine::new");
        Self {
            options,
            positions: PositionMap::new(),
            groups: BTreeMap::new(),
            staged_target: None,
            pending_snap: None,
            last_indices: None,
            anchor: None,
            estimator: LineEstimator::default(),
            last_pass: None,
            touched: BTreeSet::new(),
            prelayout: Vec::new(),
            relayout: false,
        }
    }

    pub fn options(&self) -> &ListOptions {
        &self.options
    }

    pub fn set_options(&mut self, options: ListOptions) {
        if options.axis != self.options.axis {
            self.estimator.reset();
        }
        self.options = options;
    }

    /// Clones the current options, applies `f`, then delegates to `set_options`.
    pub fn update_options(&mut self, f: impl FnOnce(&mut ListOptions)) {
        let mut next = self.options.clone();
        f(&mut next);
        self.set_options(next);
    }

    /// Realized children of the last pass.
    pub fn positions(&self) -> &PositionMap {
        &self.positions
    }

    pub fn group(&self, index: usize) -> Option<&GroupEngine> {
        self.groups.get(&index)
    }

    pub fn indices(&self) -> Option<IndexRange> {
        self.last_indices
    }

    pub fn saved_state(&self) -> Option<SavedScrollState> {
        self.last_indices.map(|r| SavedScrollState {
            start_index: r.start_index,
        })
    }

    /// Requests a snap prediction for a fling that would scroll `fling_delta` further.
    ///
    /// Consumed by the next pass that can resolve it.
    pub fn request_snap_prediction(&mut self, fling_delta: f32) {
        self.pending_snap = Some(fling_delta);
    }

    /// Makes the next pass lay out from scratch around the current first index, e.g. after
    /// children changed size.
    pub fn invalidate(&mut self) {
        self.relayout = true;
    }

    pub fn measure<H: ListHost>(
        &mut self,
        host: &mut H,
        window: ViewportWindow,
        intent: ScrollIntent,
        lanes: &LaneConfig,
    ) -> MeasureOutput {
        let count = host.child_count();
        vtrace!(count, intent = ?intent, "ListEngine::measure");
        let before: Vec<usize> = self.positions.keys().copied().collect();
        let pass = self.begin_pass(count, window, lanes);
        self.last_pass = Some(pass);
        self.touched.clear();
        if core::mem::take(&mut self.relayout) {
            if let Some((&index, entry)) = self.positions.iter().next() {
                self.anchor = Some((index, entry.start));
            }
            self.positions.clear();
            for (index, mut engine) in core::mem::take(&mut self.groups) {
                if let Some(group) = host.group_mut(index) {
                    engine.release(group);
                }
            }
        }

        if count == 0 {
            self.positions.clear();
            self.groups.clear();
            self.prelayout.clear();
            self.staged_target = None;
            self.pending_snap = None;
            self.anchor = None;
            let index_changed = self.last_indices.take().is_some();
            return MeasureOutput {
                index_changed,
                ..MeasureOutput::default()
            };
        }

        if self.positions.keys().next_back().is_some_and(|&last| last >= count) {
            self.positions.split_off(&count);
            self.groups.split_off(&count);
        }

        let delta = match intent {
            ScrollIntent::Delta(delta) => delta,
            _ => 0.0,
        };
        shift_all(&mut self.positions, -delta);
        if let Some(pending) = self.pending_snap.as_mut() {
            *pending -= delta;
        }

        match intent {
            ScrollIntent::Jump { index, align } => {
                self.staged_target = None;
                match index.resolve(count) {
                    Some(index) => self.jump(host, &pass, index, align),
                    None => {
                        vwarn!(index = ?index, count, "jump index out of range, dropped");
                        self.grow_incremental(host, &pass, window.forward);
                    }
                }
            }
            ScrollIntent::JumpInGroup { index, item, align } => {
                self.staged_target = None;
                if !self.jump_in_group(host, &pass, index, item, align) {
                    vwarn!(index, item, count, "group jump index out of range, dropped");
                    self.grow_incremental(host, &pass, window.forward);
                }
            }
            ScrollIntent::Target { index, align } => {
                self.staged_target = Some(StagedTarget { index, align });
                self.grow_incremental(host, &pass, window.forward);
            }
            ScrollIntent::Delta(delta) => {
                let forward = if delta > 0.0 {
                    true
                } else if delta < 0.0 {
                    false
                } else {
                    window.forward
                };
                self.grow_incremental(host, &pass, forward);
            }
            ScrollIntent::None => self.grow_incremental(host, &pass, window.forward),
        }

        let offset_correction = if self.options.over_scroll {
            0.0
        } else {
            self.reconcile_bounds(host, &pass)
        };
        self.evict(host, &pass);
        let prelayout = self.prelayout_request(host, &pass);
        self.release_dropped(host, &pass, &before, prelayout.as_ref());

        let indices = self.compute_indices(&pass);
        let index_changed = indices != self.last_indices;
        if index_changed {
            if let (Some(range), Some(cb)) = (indices, &self.options.on_index_change) {
                cb(range);
            }
        }
        self.last_indices = indices;
        self.anchor = self
            .positions
            .iter()
            .next()
            .map(|(&index, entry)| (index, entry.start));

        let (estimated_offset, estimated_total_size) = self.estimate(&pass).unzip();
        MeasureOutput {
            content_main_size: self.fit_content(&pass),
            indices,
            index_changed,
            estimated_offset,
            estimated_total_size,
            offset_correction,
            target: self.resolve_target(&pass),
            predict_snap_offset: self.resolve_snap(&pass),
            prelayout,
        }
    }

    /// Places every realized child.
    pub fn layout<H: ListHost>(&self, host: &mut H) {
        let Some(pass) = self.last_pass else {
            return;
        };
        let axis = self.options.axis;
        let align = self.options.cross_align;
        for (&index, entry) in &self.positions {
            let main = entry.start + self.options.chain_offset(index);
            if entry.is_group {
                host.place_child(index, axis.offset(main, 0.0));
                if let (Some(engine), Some(group)) = (self.groups.get(&index), host.group_mut(index))
                {
                    engine.layout(group, main, &pass.window, align);
                }
                continue;
            }
            let lane = pass.lanes.lane_of(index);
            let cross = pass.lanes.cross_offset(lane, entry.cross_size, align);
            host.place_child(index, axis.offset(main, cross));
        }
    }

    fn begin_pass(&self, count: usize, window: ViewportWindow, lanes: &LaneConfig) -> Pass {
        let resolved = lanes.resolve(window.cross_size);
        let extent = self.options.cache_extent.max(0.0);
        Pass {
            count,
            spacing: self.options.effective_spacing(window.main_size()),
            lanes: resolved,
            window,
            lo: window.start_main_pos - extent,
            hi: window.end_main_pos + extent,
            constraint: ChildConstraint {
                axis: self.options.axis,
                cross_size: resolved.lane_length,
                main_reference: window.content_main_size,
            },
        }
    }

    fn line_start<H: ListHost>(host: &H, pass: &Pass, index: usize) -> usize {
        pass.lanes.line_start(index, |i| host.is_group(i))
    }

    fn line_end<H: ListHost>(host: &H, pass: &Pass, index: usize) -> usize {
        pass.lanes.line_end(index, pass.count, |i| host.is_group(i))
    }

    /// Span of the line containing `index`, if any of its entries is realized.
    fn line_span<H: ListHost>(&self, host: &H, pass: &Pass, index: usize) -> Option<(f32, f32)> {
        let first = Self::line_start(host, pass, index);
        let last = Self::line_end(host, pass, index);
        self.positions
            .range(first..=last)
            .map(|(_, e)| (e.start, e.end))
            .reduce(|(s0, e0), (s1, e1)| (s0.min(s1), e0.max(e1)))
    }

    fn grow_incremental<H: ListHost>(&mut self, host: &mut H, pass: &Pass, forward: bool) {
        let spacing = pass.spacing;

        if self.positions.is_empty() {
            let (index, start) = match self.anchor {
                Some((index, start)) => (index.min(pass.count - 1), start),
                None => (0, pass.window.start_main_pos),
            };
            let index = Self::line_start(host, pass, index);
            self.layout_forward(host, pass, index, start);
            if index > 0 && start - spacing > pass.lo {
                self.layout_backward(host, pass, index - 1, start - spacing);
            }
            return;
        }

        if forward {
            let Some((&first_key, first)) = self.positions.iter().next() else {
                return;
            };
            let start = first.start;
            let index = Self::line_start(host, pass, first_key);
            self.layout_forward(host, pass, index, start);
            if index > 0 && start - spacing > pass.lo {
                self.layout_backward(host, pass, index - 1, start - spacing);
            }
        } else {
            let Some(&last_key) = self.positions.keys().next_back() else {
                return;
            };
            let Some((_, end)) = self.line_span(host, pass, last_key) else {
                return;
            };
            let index = Self::line_end(host, pass, last_key);
            self.layout_backward(host, pass, index, end);
            if index + 1 < pass.count && end + spacing < pass.hi {
                self.layout_forward(host, pass, index + 1, end + spacing);
            }
        }
    }

    fn jump<H: ListHost>(&mut self, host: &mut H, pass: &Pass, index: usize, align: Align) {
        let align = match align {
            Align::Auto => match self.classify_auto(host, pass, index) {
                Some(align) => align,
                None => {
                    self.grow_incremental(host, pass, pass.window.forward);
                    return;
                }
            },
            align => align,
        };
        vdebug!(index, align = ?align, "jump");

        self.positions.clear();
        let spacing = pass.spacing;
        let window = pass.window;
        match align {
            Align::End => {
                let last = Self::line_end(host, pass, index);
                self.layout_backward(host, pass, last, window.end_main_pos);
                if last + 1 < pass.count {
                    self.layout_forward(host, pass, last + 1, window.end_main_pos + spacing);
                }
            }
            Align::Center => {
                let first = Self::line_start(host, pass, index);
                let Some((next, size)) = self.measure_center_line(host, pass, first) else {
                    return;
                };
                let start = window.center() - size / 2.0;
                for entry in self.positions.values_mut() {
                    *entry = entry.shifted(start);
                }
                self.layout_forward(host, pass, next, start + size + spacing);
                if first > 0 {
                    self.layout_backward(host, pass, first - 1, start - spacing);
                }
            }
            Align::Start | Align::None | Align::Auto => {
                let first = Self::line_start(host, pass, index);
                self.layout_forward(host, pass, first, window.start_main_pos);
                if first > 0 {
                    self.layout_backward(host, pass, first - 1, window.start_main_pos - spacing);
                }
            }
        }
    }

    /// Measures the line starting at `first` at offset 0; groups are fully realized.
    fn measure_center_line<H: ListHost>(
        &mut self,
        host: &mut H,
        pass: &Pass,
        first: usize,
    ) -> Option<(usize, f32)> {
        if host.is_group(first) {
            let layout = self.measure_group(host, pass, first, 0.0, true, true)?;
            self.insert_group(first, 0.0, &layout);
            return Some((first + 1, layout.total_main_size));
        }
        self.measure_line_forward(host, pass, first, 0.0)
    }

    /// `None` when the line of `index` is already fully visible.
    fn classify_auto<H: ListHost>(&self, host: &H, pass: &Pass, index: usize) -> Option<Align> {
        let window = pass.window;
        if let Some((start, end)) = self.line_span(host, pass, index) {
            if start >= window.start_main_pos - EPSILON && end <= window.end_main_pos + EPSILON {
                return None;
            }
            return Some(if start < window.start_main_pos {
                Align::Start
            } else {
                Align::End
            });
        }
        match self.positions.keys().next() {
            Some(&first) if index > first => Some(Align::End),
            _ => Some(Align::Start),
        }
    }

    fn jump_in_group<H: ListHost>(
        &mut self,
        host: &mut H,
        pass: &Pass,
        index: usize,
        item: usize,
        align: Align,
    ) -> bool {
        if index >= pass.count || !host.is_group(index) {
            return false;
        }
        let Some(group) = host.group_mut(index) else {
            return false;
        };
        self.touched.insert(index);
        let meta = group.metadata();
        if item >= meta.total_item_count {
            return false;
        }
        let request = self.group_request(pass, 0.0, true, true);
        let engine = self.groups.entry(index).or_default();
        let layout = engine.measure(group, &request);
        let Some(origin) = engine.item_group_position(item, align, &pass.window, meta.sticky)
        else {
            return false;
        };
        vdebug!(index, item, origin, "jump into group");

        self.positions.clear();
        self.insert_group(index, origin, &layout);
        let spacing = pass.spacing;
        if index + 1 < pass.count {
            self.layout_forward(host, pass, index + 1, origin + layout.total_main_size + spacing);
        }
        if index > 0 {
            self.layout_backward(host, pass, index - 1, origin - spacing);
        }
        true
    }

    fn group_request(
        &self,
        pass: &Pass,
        reference_pos: f32,
        forward: bool,
        layout_all: bool,
    ) -> GroupRequest {
        GroupRequest {
            window: ViewportWindow {
                start_main_pos: pass.lo,
                end_main_pos: pass.hi,
                reference_pos,
                forward,
                ..pass.window
            },
            lanes: pass.lanes,
            axis: self.options.axis,
            layout_all,
        }
    }

    fn measure_group<H: ListHost>(
        &mut self,
        host: &mut H,
        pass: &Pass,
        index: usize,
        reference_pos: f32,
        forward: bool,
        layout_all: bool,
    ) -> Option<GroupLayout> {
        let request = self.group_request(pass, reference_pos, forward, layout_all);
        let group = host.group_mut(index)?;
        self.touched.insert(index);
        let engine = self.groups.entry(index).or_default();
        Some(engine.measure(group, &request))
    }

    fn insert_group(&mut self, index: usize, start: f32, layout: &GroupLayout) {
        self.positions.insert(
            index,
            PositionEntry {
                start,
                end: start + layout.total_main_size,
                is_group: true,
                cross_size: layout.cross_size,
            },
        );
    }

    /// Places one line starting at `index`. Returns the next index and the line end.
    fn measure_line_forward<H: ListHost>(
        &mut self,
        host: &mut H,
        pass: &Pass,
        index: usize,
        start: f32,
    ) -> Option<(usize, f32)> {
        debug_assert!(index < pass.count);
        if host.is_group(index) {
            let layout = self.measure_group(host, pass, index, start, true, false)?;
            self.insert_group(index, start, &layout);
            return Some((index + 1, start + layout.total_main_size));
        }

        let last = Self::line_end(host, pass, index);
        let axis = self.options.axis;
        let mut line_size = 0.0f32;
        let mut next = index;
        for i in index..=last {
            let Some(size) = host.measure_child(i, &pass.constraint) else {
                break;
            };
            self.touched.insert(i);
            let main = axis.main(size);
            self.positions.insert(
                i,
                PositionEntry {
                    start,
                    end: start + main,
                    is_group: false,
                    cross_size: axis.cross(size),
                },
            );
            line_size = line_size.max(main);
            next = i + 1;
        }
        if next == index {
            vtrace!(index, "child missing, forward growth stopped");
            return None;
        }
        self.estimator.record(line_size);
        Some((next, start + line_size))
    }

    /// Places the line ending at `index`, ending at `end`. Returns its first index and start.
    fn measure_line_backward<H: ListHost>(
        &mut self,
        host: &mut H,
        pass: &Pass,
        index: usize,
        end: f32,
    ) -> Option<(usize, f32)> {
        if host.is_group(index) {
            let layout = self.measure_group(host, pass, index, end, false, false)?;
            let start = end - layout.total_main_size;
            self.insert_group(index, start, &layout);
            return Some((index, start));
        }

        let first = Self::line_start(host, pass, index);
        let axis = self.options.axis;
        let mut measured = Vec::with_capacity(index + 1 - first);
        for i in first..=index {
            if let Some(size) = host.measure_child(i, &pass.constraint) {
                self.touched.insert(i);
                measured.push((i, size));
            }
        }
        if measured.is_empty() {
            vtrace!(index, "child missing, backward growth stopped");
            return None;
        }
        let line_size = measured
            .iter()
            .map(|&(_, size)| axis.main(size))
            .fold(0.0f32, f32::max);
        let start = end - line_size;
        for (i, size) in measured {
            self.positions.insert(
                i,
                PositionEntry {
                    start,
                    end: start + axis.main(size),
                    is_group: false,
                    cross_size: axis.cross(size),
                },
            );
        }
        self.estimator.record(line_size);
        Some((first, start))
    }

    /// Grows forward from the line starting at `index` until the window end is passed. Entries
    /// after the last placed line are dropped.
    fn layout_forward<H: ListHost>(
        &mut self,
        host: &mut H,
        pass: &Pass,
        mut index: usize,
        mut start: f32,
    ) {
        while index < pass.count && start < pass.hi {
            let Some((next, end)) = self.measure_line_forward(host, pass, index, start) else {
                break;
            };
            index = next;
            start = end + pass.spacing;
        }
        self.positions.split_off(&index);
    }

    /// Grows backward from the line ending at `index` until the window start is passed. Entries
    /// before the first placed line are dropped.
    fn layout_backward<H: ListHost>(
        &mut self,
        host: &mut H,
        pass: &Pass,
        mut index: usize,
        mut end: f32,
    ) {
        let mut first = index + 1;
        while end > pass.lo {
            let Some((line_first, start)) = self.measure_line_backward(host, pass, index, end)
            else {
                break;
            };
            first = line_first;
            if line_first == 0 {
                break;
            }
            index = line_first - 1;
            end = start - pass.spacing;
        }
        self.positions = self.positions.split_off(&first);
    }

    /// Keeps content inside its natural bounds. Returns the applied shift.
    fn reconcile_bounds<H: ListHost>(&mut self, host: &mut H, pass: &Pass) -> f32 {
        let window = pass.window;
        let spacing = pass.spacing;
        let mut correction = 0.0;

        let first = self.positions.iter().next().map(|(&i, e)| (i, *e));
        let last = self.positions.keys().next_back().copied();
        if let (Some((first_key, first)), Some(last_key)) = (first, last) {
            let first_start = first.start;
            let last_end = self.line_span(host, pass, last_key).map_or(first.end, |s| s.1);
            let at_top = first_key == 0 && first_start >= window.start_main_pos - EPSILON;
            if last_key + 1 == pass.count && last_end < window.end_main_pos - EPSILON && !at_top {
                let mut shift = window.end_main_pos - last_end;
                if first_key == 0 {
                    shift = shift.min(window.start_main_pos - first_start);
                }
                if shift > EPSILON {
                    vtrace!(shift, "content ends early, shifted toward the end");
                    shift_all(&mut self.positions, shift);
                    correction += shift;
                    let line_first = Self::line_start(host, pass, first_key);
                    if line_first > 0 {
                        self.layout_backward(
                            host,
                            pass,
                            line_first - 1,
                            first_start + shift - spacing,
                        );
                    }
                }
            }
        }

        if let Some((first_key, first)) = self.positions.iter().next().map(|(&i, e)| (i, *e)) {
            if first_key == 0 && first.start > window.start_main_pos + EPSILON {
                let shift = window.start_main_pos - first.start;
                vtrace!(shift, "content starts late, shifted toward the start");
                shift_all(&mut self.positions, shift);
                correction += shift;
                if let Some(&last_key) = self.positions.keys().next_back() {
                    let last = Self::line_end(host, pass, last_key);
                    if let Some((_, end)) = self.line_span(host, pass, last_key) {
                        if last + 1 < pass.count && end + spacing < pass.hi {
                            self.layout_forward(host, pass, last + 1, end + spacing);
                        }
                    }
                }
            }
        }

        if correction != 0.0 {
            self.refresh_groups(host, pass);
        }
        correction
    }

    /// Re-measures realized groups in place after a shift moved them relative to the window.
    fn refresh_groups<H: ListHost>(&mut self, host: &mut H, pass: &Pass) {
        let keys: Vec<usize> = self
            .positions
            .iter()
            .filter(|(_, e)| e.is_group)
            .map(|(&i, _)| i)
            .collect();
        for index in keys {
            let Some(entry) = self.positions.get(&index).copied() else {
                continue;
            };
            if entry.end <= pass.lo || entry.start >= pass.hi {
                continue;
            }
            let Some(layout) = self.measure_group(host, pass, index, entry.start, true, false)
            else {
                continue;
            };
            let diff = layout.total_main_size - entry.main_size();
            self.insert_group(index, entry.start, &layout);
            if abs(diff) > EPSILON {
                for (_, e) in self.positions.range_mut(index + 1..) {
                    *e = e.shifted(diff);
                }
            }
        }
    }

    /// Removes whole lines outside the window, and recycles the out-of-view items of groups
    /// straddling its edges.
    fn evict<H: ListHost>(&mut self, host: &mut H, pass: &Pass) {
        let lines = pass.lanes.lines(&self.positions);
        let chain = |i: usize| self.options.chain_offset(i);

        let mut evicted: Vec<(usize, usize)> = Vec::new();
        let mut front = 0;
        for line in &lines {
            if line.end + chain(line.last) > pass.lo {
                break;
            }
            evicted.push((line.first, line.last));
            front += 1;
        }
        for line in lines[front..].iter().rev() {
            if line.start + chain(line.first) < pass.hi {
                break;
            }
            evicted.push((line.first, line.last));
        }
        for (first, last) in evicted {
            vtrace!(first, last, "evicted");
            for index in first..=last {
                self.positions.remove(&index);
            }
        }

        let window = ViewportWindow {
            start_main_pos: pass.lo,
            end_main_pos: pass.hi,
            ..pass.window
        };
        let straddling: Vec<(usize, f32)> = self
            .positions
            .iter()
            .filter(|(_, e)| e.is_group)
            .map(|(&i, e)| (i, e.start + self.options.chain_offset(i)))
            .filter(|&(i, origin)| {
                let size = self.positions[&i].main_size();
                origin < pass.lo || origin + size > pass.hi
            })
            .collect();
        for (index, origin) in straddling {
            if let (Some(engine), Some(group)) = (self.groups.get_mut(&index), host.group_mut(index))
            {
                engine.check_recycle(group, &window, origin);
            }
        }
    }

    /// De-realizes every child realized before or during the pass, or queued by the previous
    /// pre-layout request, that is absent after it. Dropped groups release their own children
    /// first. `next` is remembered for the following pass.
    fn release_dropped<H: ListHost>(
        &mut self,
        host: &mut H,
        pass: &Pass,
        before: &[usize],
        next: Option<&PrelayoutRequest>,
    ) {
        let mut dropped: BTreeSet<usize> = before.iter().copied().collect();
        dropped.append(&mut self.touched);
        dropped.extend(self.prelayout.drain(..));
        if let Some(next) = next {
            self.prelayout.extend_from_slice(&next.indices);
        }
        for index in dropped {
            if self.positions.contains_key(&index) || index >= pass.count {
                continue;
            }
            if let Some(mut engine) = self.groups.remove(&index) {
                if let Some(group) = host.group_mut(index) {
                    vtrace!(index, "group evicted, released");
                    engine.release(group);
                }
            }
            host.remove_child(index);
        }
        let positions = &self.positions;
        self.groups
            .retain(|index, _| positions.get(index).is_some_and(|e| e.is_group));
    }

    fn compute_indices(&self, pass: &Pass) -> Option<IndexRange> {
        let window = pass.window;
        let center = window.center();
        let mut start = None;
        let mut end = None;
        let mut center_index = None;
        for (&index, entry) in &self.positions {
            if entry.end > window.start_main_pos && entry.start < window.end_main_pos {
                start.get_or_insert(index);
                end = Some(index);
            }
            if center_index.is_none() && entry.start <= center && center < entry.end + pass.spacing
            {
                center_index = Some(index);
            }
        }
        let (start, end) = match (start, end) {
            (Some(start), Some(end)) => (start, end),
            _ => (
                *self.positions.keys().next()?,
                *self.positions.keys().next_back()?,
            ),
        };
        Some(IndexRange {
            start_index: start,
            end_index: end,
            center_index: center_index.unwrap_or(start),
        })
    }

    fn fit_content(&self, pass: &Pass) -> f32 {
        let window = pass.window;
        if window.fixed_main_size {
            return window.content_main_size;
        }
        let (Some((&first_key, first)), Some((&last_key, _))) = (
            self.positions.iter().next(),
            self.positions.iter().next_back(),
        ) else {
            return window.content_main_size;
        };
        if first_key != 0 || last_key + 1 != pass.count {
            return window.content_main_size;
        }
        let end = self
            .positions
            .values()
            .map(|e| e.end)
            .fold(f32::NEG_INFINITY, f32::max);
        window.content_main_size.min((end - first.start).max(0.0))
    }

    fn pitch(&self, pass: &Pass) -> Option<f32> {
        self.estimator.average().map(|avg| avg + pass.spacing)
    }

    fn line_number(pass: &Pass, index: usize) -> f32 {
        (index / pass.lanes.lanes.max(1)) as f32
    }

    /// Estimated (offset, total size) for scrollbar sizing.
    fn estimate(&self, pass: &Pass) -> Option<(f32, f32)> {
        let (&first_key, first) = self.positions.iter().next()?;
        let (&last_key, _) = self.positions.iter().next_back()?;
        let window = pass.window;
        let end = self
            .positions
            .values()
            .map(|e| e.end)
            .fold(f32::NEG_INFINITY, f32::max);
        let pitch = self.pitch(pass).unwrap_or(0.0);

        let leading = Self::line_number(pass, first_key) * pitch;
        let offset = leading + window.start_main_pos - first.start;
        let trailing_lines = pass
            .lanes
            .lines_for(pass.count)
            .saturating_sub(Self::line_number(pass, last_key) as usize + 1);
        let trailing = trailing_lines as f32 * pitch;
        let total = leading + (end - first.start) + trailing;
        Some((offset, total.max(0.0)))
    }

    fn align_offset(align: Align, start: f32, end: f32, window: &ViewportWindow) -> f32 {
        match align {
            Align::Start | Align::None => start - window.start_main_pos,
            Align::Center => (start + end) / 2.0 - window.center(),
            Align::End => end - window.end_main_pos,
            Align::Auto => {
                if start >= window.start_main_pos - EPSILON && end <= window.end_main_pos + EPSILON
                {
                    0.0
                } else if start < window.start_main_pos {
                    start - window.start_main_pos
                } else {
                    end - window.end_main_pos
                }
            }
        }
    }

    fn resolve_target(&mut self, pass: &Pass) -> Option<TargetPosition> {
        let staged = self.staged_target?;
        let Some(index) = staged.index.resolve(pass.count) else {
            vwarn!(count = pass.count, "target index out of range, dropped");
            self.staged_target = None;
            return None;
        };
        let window = pass.window;

        if let Some(entry) = self.positions.get(&index) {
            let offset = Self::align_offset(staged.align, entry.start, entry.end, &window);
            let (first_key, first) = self.positions.iter().next()?;
            let (last_key, _) = self.positions.iter().next_back()?;
            let last_end = self
                .positions
                .values()
                .map(|e| e.end)
                .fold(f32::NEG_INFINITY, f32::max);
            let blocked = (offset > 0.0
                && *last_key + 1 == pass.count
                && last_end <= window.end_main_pos + EPSILON)
                || (offset < 0.0 && *first_key == 0 && first.start >= window.start_main_pos - EPSILON);
            if abs(offset) <= EPSILON || blocked {
                vdebug!(index, "target reached");
                self.staged_target = None;
            }
            return Some(TargetPosition {
                index,
                offset,
                exact: true,
            });
        }

        let (&first_key, first) = self.positions.iter().next()?;
        let pitch = self.pitch(pass)?;
        let size = self.estimator.average()?;
        let lines = Self::line_number(pass, index) - Self::line_number(pass, first_key);
        let start = first.start + lines * pitch;
        Some(TargetPosition {
            index,
            offset: Self::align_offset(staged.align, start, start + size, &window),
            exact: false,
        })
    }

    fn resolve_snap(&mut self, pass: &Pass) -> Option<f32> {
        if self.options.snap_align == ScrollSnapAlign::None {
            self.pending_snap = None;
            return None;
        }
        let delta = self.pending_snap?;
        let lines = pass.lanes.lines(&self.positions);
        let has_group = lines.iter().any(|l| l.is_group);
        let ctx = SnapContext {
            lines: &lines,
            window: &pass.window,
            spacing: pass.spacing,
            align: self.options.snap_align,
            lanes: pass.lanes.lanes,
            count: pass.count,
            uniform_line: if has_group {
                None
            } else {
                self.estimator.uniform()
            },
        };
        let predicted = ctx.predict(delta);
        if predicted.is_some() {
            vtrace!(requested = delta, offset = ?predicted, "snap predicted");
            self.pending_snap = None;
        } else {
            vtrace!(requested = delta, "snap prediction deferred");
        }
        predicted
    }

    fn prelayout_request<H: ListHost>(&self, host: &H, pass: &Pass) -> Option<PrelayoutRequest> {
        let cache = self.options.cache_count;
        if cache == 0 {
            return None;
        }
        let first = *self.positions.keys().next()?;
        let last = *self.positions.keys().next_back()?;
        let budget = cache * pass.lanes.lanes.max(1);

        let after = (last + 1..pass.count)
            .take(budget)
            .filter(|&i| !host.is_group(i));
        let before = (0..first).rev().take(budget).filter(|&i| !host.is_group(i));
        let indices: Vec<usize> = if pass.window.forward {
            after.chain(before).collect()
        } else {
            before.chain(after).collect()
        };
        (!indices.is_empty()).then(|| PrelayoutRequest {
            indices,
            constraint: pass.constraint,
        })
    }
}
