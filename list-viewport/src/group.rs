use alloc::vec::Vec;

use crate::estimate::LineEstimator;
use crate::options::effective_spacing;
use crate::types::{EPSILON, abs, floor, shift_all};
use crate::{
    Align, Axis, ChildConstraint, CrossAlign, GroupHost, GroupMetadata, PositionEntry,
    PositionMap, ResolvedLanes, StickyStyle, ViewportWindow,
};

/// Growth passes allowed after an edge clamp moved the realized items.
const MAX_REGROW: usize = 4;

/// A request to lay out one group.
///
/// `window` is the outer list window (already widened by the cache extent). Its
/// `reference_pos` is the group's start when `forward` is set, the group's end otherwise.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GroupRequest {
    pub window: ViewportWindow,
    pub lanes: ResolvedLanes,
    pub axis: Axis,
    /// Realize every item of the group.
    pub layout_all: bool,
}

/// The result of laying out one group: an immutable snapshot the list engine consumes.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GroupLayout {
    /// Item positions relative to the group start, keyed by item index.
    pub positions: PositionMap,
    pub total_main_size: f32,
    pub header_main_size: f32,
    pub footer_main_size: f32,
    pub cross_size: f32,
}

/// The viewport engine of one group: header, footer and virtualized items.
///
/// Positions are kept relative to the group start across passes. A pass anchored at the group
/// start keeps them as-is; a pass anchored at the group end lays out relative to the end and
/// derives the start from the estimated size of the unrealized leading lines. Kept items that no
/// longer reach the window are dropped and growth restarts from the estimated line.
#[derive(Clone, Debug)]
pub struct GroupEngine {
    positions: PositionMap,
    total_main_size: f32,
    header_main_size: f32,
    footer_main_size: f32,
    cross_size: f32,
    spacing: f32,
    item_count: usize,
    axis: Axis,
    lanes: ResolvedLanes,
    estimator: LineEstimator,
    measured: bool,
}

impl Default for GroupEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl GroupEngine {
    pub fn new() -> Self {
        Self {
            positions: PositionMap::new(),
            total_main_size: 0.0,
            header_main_size: 0.0,
            footer_main_size: 0.0,
            cross_size: 0.0,
            spacing: 0.0,
            item_count: 0,
            axis: Axis::Vertical,
            lanes: ResolvedLanes::single(0.0),
            estimator: LineEstimator::default(),
            measured: false,
        }
    }

    pub fn positions(&self) -> &PositionMap {
        &self.positions
    }

    pub fn total_main_size(&self) -> f32 {
        self.total_main_size
    }

    pub fn header_main_size(&self) -> f32 {
        self.header_main_size
    }

    pub fn footer_main_size(&self) -> f32 {
        self.footer_main_size
    }

    pub fn measure<G: GroupHost + ?Sized>(
        &mut self,
        host: &mut G,
        request: &GroupRequest,
    ) -> GroupLayout {
        let meta = host.metadata();
        let window = request.window;
        let items = meta
            .total_item_count
            .min(host.child_count().saturating_sub(meta.item_start_index));

        if items < self.item_count {
            let stale = self.positions.split_off(&items);
            for &item in stale.keys() {
                host.remove_child(meta.child_index(item));
            }
        }
        self.item_count = items;
        self.axis = request.axis;
        self.lanes = request.lanes;
        self.cross_size = window.cross_size;
        self.spacing = effective_spacing(meta.spacing, window.content_main_size);

        let pseudo_fits =
            self.header_main_size + self.footer_main_size < window.content_main_size;
        if !request.layout_all && self.measured && pseudo_fits && !self.can_intersect(&window) {
            vtrace!(
                reference = window.reference_pos,
                total = self.total_main_size,
                "group outside window, skipped"
            );
            self.recycle_items(host, &meta);
            return self.snapshot();
        }

        let full = ChildConstraint {
            axis: self.axis,
            cross_size: window.cross_size,
            main_reference: window.content_main_size,
        };
        self.header_main_size = meta
            .header_index
            .and_then(|i| host.measure_child(i, &full))
            .map_or(0.0, |size| self.axis.main(size));
        self.footer_main_size = meta
            .footer_index
            .and_then(|i| host.measure_child(i, &full))
            .map_or(0.0, |size| self.axis.main(size));
        self.measured = true;

        let item_constraint = ChildConstraint {
            cross_size: self.lanes.lane_length,
            ..full
        };

        if request.layout_all {
            self.layout_all(host, &meta, &item_constraint);
            self.total_main_size = self.total_from_end_side();
            return self.snapshot();
        }

        // Frame coordinates: group start == 0 when anchored forward, group end == 0 otherwise.
        let forward = window.forward;
        let lo = window.start_main_pos - window.reference_pos;
        let hi = window.end_main_pos - window.reference_pos;
        if !forward {
            shift_all(&mut self.positions, -self.total_main_size);
        }
        self.clamp_to_edges(forward);
        if !self.positions.is_empty() && !self.reaches(lo, hi) {
            vtrace!(lo, hi, "kept group items out of reach, restarting from the estimate");
            self.recycle_items(host, &meta);
        }

        let always = !pseudo_fits;
        if always || self.need_measure_item(lo, hi, forward) {
            for _ in 0..MAX_REGROW {
                self.grow(host, &meta, &item_constraint, lo, hi, forward);
                if abs(self.clamp_to_edges(forward)) <= EPSILON {
                    break;
                }
            }
            self.trim(host, &meta, lo, hi);
        } else {
            self.recycle_items(host, &meta);
        }

        if forward {
            self.total_main_size = self.total_from_end_side();
        } else {
            self.total_main_size = self.total_from_start_side();
            shift_all(&mut self.positions, self.total_main_size);
        }
        self.snapshot()
    }

    /// Whether any item could intersect `[lo, hi)` (frame coordinates).
    pub fn need_measure_item(&self, lo: f32, hi: f32, forward: bool) -> bool {
        if self.item_count == 0 {
            return false;
        }
        let estimated = self.estimator.average().is_some();
        let (start, end) = if forward {
            let end = if estimated {
                self.estimated_total() - self.footer_main_size
            } else {
                f32::INFINITY
            };
            (self.header_main_size, end)
        } else {
            let start = if estimated {
                self.header_main_size - self.estimated_total()
            } else {
                f32::NEG_INFINITY
            };
            (start, -self.footer_main_size)
        };
        start < hi && end > lo
    }

    /// Removes sub-items whose lines fell outside `window`, with the group start at `origin`.
    pub fn check_recycle<G: GroupHost + ?Sized>(
        &mut self,
        host: &mut G,
        window: &ViewportWindow,
        origin: f32,
    ) {
        let meta = host.metadata();
        let lo = window.start_main_pos - origin;
        let hi = window.end_main_pos - origin;
        self.trim(host, &meta, lo, hi);
    }

    /// Releases every realized child of the group (items, header and footer).
    pub fn release<G: GroupHost + ?Sized>(&mut self, host: &mut G) {
        let meta = host.metadata();
        self.recycle_items(host, &meta);
        if let Some(header) = meta.header_index {
            host.remove_child(header);
        }
        if let Some(footer) = meta.footer_index {
            host.remove_child(footer);
        }
    }

    /// Window-local position the group start must take so that `item` aligns with the outer
    /// window. Requires `item` to be realized.
    pub fn item_group_position(
        &self,
        item: usize,
        align: Align,
        window: &ViewportWindow,
        sticky: StickyStyle,
    ) -> Option<f32> {
        let entry = self.positions.get(&item)?;
        let header = if sticky.header {
            self.header_main_size
        } else {
            0.0
        };
        let footer = if sticky.footer {
            self.footer_main_size
        } else {
            0.0
        };
        Some(match align {
            Align::Center => window.center() - (entry.start + entry.end) / 2.0,
            Align::End => window.end_main_pos - footer - entry.end,
            Align::Start | Align::Auto | Align::None => {
                window.start_main_pos + header - entry.start
            }
        })
    }

    /// Header and footer offsets relative to the group start, pinned when sticky.
    pub fn sticky_offsets(
        &self,
        sticky: StickyStyle,
        origin: f32,
        window: &ViewportWindow,
    ) -> (f32, f32) {
        let total = self.total_main_size;
        let header = self.header_main_size;
        let footer = self.footer_main_size;

        let mut header_offset = 0.0;
        if sticky.header && origin < window.start_main_pos {
            header_offset = (window.start_main_pos - origin)
                .min(total - footer - header)
                .max(0.0);
        }

        let resting = (total - footer).max(0.0);
        let mut footer_offset = resting;
        if sticky.footer && origin + total > window.end_main_pos {
            footer_offset = (window.end_main_pos - origin - footer)
                .max(header)
                .min(resting);
        }
        (header_offset, footer_offset)
    }

    /// Places header, items and footer relative to the group origin.
    pub fn layout<G: GroupHost + ?Sized>(
        &self,
        host: &mut G,
        origin: f32,
        window: &ViewportWindow,
        cross_align: CrossAlign,
    ) {
        let meta = host.metadata();
        let (header_offset, footer_offset) = self.sticky_offsets(meta.sticky, origin, window);
        if let Some(header) = meta.header_index {
            host.place_child(header, self.axis.offset(header_offset, 0.0));
        }
        for (&item, entry) in &self.positions {
            let lane = self.lanes.lane_of(item);
            let cross = self.lanes.cross_offset(lane, entry.cross_size, cross_align);
            host.place_child(meta.child_index(item), self.axis.offset(entry.start, cross));
        }
        if let Some(footer) = meta.footer_index {
            host.place_child(footer, self.axis.offset(footer_offset, 0.0));
        }
    }

    fn snapshot(&self) -> GroupLayout {
        GroupLayout {
            positions: self.positions.clone(),
            total_main_size: self.total_main_size,
            header_main_size: self.header_main_size,
            footer_main_size: self.footer_main_size,
            cross_size: self.cross_size,
        }
    }

    fn can_intersect(&self, window: &ViewportWindow) -> bool {
        let (start, end) = if window.forward {
            (window.reference_pos, window.reference_pos + self.total_main_size)
        } else {
            (window.reference_pos - self.total_main_size, window.reference_pos)
        };
        start < window.end_main_pos && end > window.start_main_pos
    }

    fn pitch(&self) -> Option<f32> {
        self.estimator.average().map(|avg| avg + self.spacing)
    }

    fn lines(&self) -> usize {
        self.lanes.lines_for(self.item_count)
    }

    fn line_of(&self, item: usize) -> usize {
        item / self.lanes.lanes.max(1)
    }

    fn estimated_total(&self) -> f32 {
        let lines = self.lines();
        let body = match (lines, self.estimator.average()) {
            (0, _) | (_, None) => 0.0,
            (lines, Some(avg)) => lines as f32 * avg + (lines - 1) as f32 * self.spacing,
        };
        self.header_main_size + body + self.footer_main_size
    }

    /// Distance from the end of `item`'s line to the group end.
    fn trailing_extent(&self, item: usize) -> f32 {
        let remaining = self.lines().saturating_sub(self.line_of(item) + 1);
        let body = match self.pitch() {
            Some(pitch) if remaining > 0 => remaining as f32 * pitch,
            _ => 0.0,
        };
        body + self.footer_main_size
    }

    /// Expected start of `item`'s line measured from the group start.
    fn leading_extent(&self, item: usize) -> f32 {
        let before = self.line_of(item);
        let body = match self.pitch() {
            Some(pitch) if before > 0 => before as f32 * pitch,
            _ => 0.0,
        };
        self.header_main_size + body
    }

    fn line_max_end(&self, line_first: usize) -> f32 {
        let last = self.lanes.line_end(line_first, self.item_count, |_| false);
        self.positions
            .range(line_first..=last)
            .map(|(_, e)| e.end)
            .fold(f32::NEG_INFINITY, f32::max)
    }

    fn total_from_end_side(&self) -> f32 {
        match self.positions.iter().next_back() {
            Some((&last, _)) => {
                let first_of_line = self.lanes.line_start(last, |_| false);
                self.line_max_end(first_of_line) + self.trailing_extent(last)
            }
            None => self.estimated_total(),
        }
    }

    fn total_from_start_side(&self) -> f32 {
        match self.positions.iter().next() {
            Some((&first, entry)) => self.leading_extent(first) - entry.start,
            None => self.estimated_total(),
        }
    }

    /// Whether a kept line lies within one line pitch of `[lo, hi)`.
    fn reaches(&self, lo: f32, hi: f32) -> bool {
        let margin = self.pitch().unwrap_or(0.0) + self.spacing;
        self.positions
            .values()
            .any(|e| e.end > lo - margin && e.start < hi + margin)
    }

    /// Pins the realized lines to the edges of the group in the current frame. Returns the shift.
    ///
    /// Forward frames start at 0: the first line starts right after the header, and no line starts
    /// before it. Backward frames end at 0: the last line ends right before the footer, and no
    /// line ends after it.
    fn clamp_to_edges(&mut self, forward: bool) -> f32 {
        let shift = if forward {
            let Some((&first, entry)) = self.positions.iter().next() else {
                return 0.0;
            };
            let header = self.header_main_size;
            if self.line_of(first) == 0 || entry.start < header {
                header - entry.start
            } else {
                0.0
            }
        } else {
            let Some(&last) = self.positions.keys().next_back() else {
                return 0.0;
            };
            let tail = -self.footer_main_size;
            let end = self.line_max_end(self.lanes.line_start(last, |_| false));
            if self.line_of(last) + 1 == self.lines() || end > tail {
                tail - end
            } else {
                0.0
            }
        };
        if abs(shift) <= EPSILON {
            return 0.0;
        }
        vtrace!(shift, forward, "group items pinned to the group edge");
        shift_all(&mut self.positions, shift);
        shift
    }

    fn grow<G: GroupHost + ?Sized>(
        &mut self,
        host: &mut G,
        meta: &GroupMetadata,
        constraint: &ChildConstraint,
        lo: f32,
        hi: f32,
        forward: bool,
    ) {
        let items = self.item_count;
        let spacing = self.spacing;
        if items == 0 {
            return;
        }

        if self.positions.is_empty() {
            let lanes = self.lanes.lanes.max(1);
            if forward {
                let (line, start) = match self.pitch() {
                    Some(pitch) if pitch > 0.0 && lo > self.header_main_size => {
                        let line = (floor((lo - self.header_main_size) / pitch) as usize)
                            .min(self.lines().saturating_sub(1));
                        (line, self.header_main_size + line as f32 * pitch)
                    }
                    _ => (0, self.header_main_size),
                };
                let index = line * lanes;
                self.layout_forward(host, meta, constraint, index, start, hi);
                if index > 0 {
                    self.layout_backward(host, meta, constraint, index - 1, start - spacing, lo);
                }
            } else {
                let tail = -self.footer_main_size;
                let (line, end) = match self.pitch() {
                    Some(pitch) if pitch > 0.0 && hi < tail => {
                        let back = (floor((tail - hi) / pitch) as usize)
                            .min(self.lines().saturating_sub(1));
                        (self.lines() - 1 - back, tail - back as f32 * pitch)
                    }
                    _ => (self.lines().saturating_sub(1), tail),
                };
                let index = (line * lanes + lanes - 1).min(items - 1);
                self.layout_backward(host, meta, constraint, index, end, lo);
                if index + 1 < items {
                    self.layout_forward(host, meta, constraint, index + 1, end + spacing, hi);
                }
            }
            return;
        }

        if forward {
            let Some((&first_key, first)) = self.positions.iter().next() else {
                return;
            };
            let first_index = self.lanes.line_start(first_key, |_| false);
            let start = first.start;
            self.layout_forward(host, meta, constraint, first_index, start, hi);
            if first_index > 0 && start - spacing > lo {
                self.layout_backward(host, meta, constraint, first_index - 1, start - spacing, lo);
            }
        } else {
            let Some(&last_key) = self.positions.keys().next_back() else {
                return;
            };
            let last_index = self.lanes.line_end(last_key, items, |_| false);
            let end = self.line_max_end(self.lanes.line_start(last_key, |_| false));
            self.layout_backward(host, meta, constraint, last_index, end, lo);
            if last_index + 1 < items && end + spacing < hi {
                self.layout_forward(host, meta, constraint, last_index + 1, end + spacing, hi);
            }
        }
    }

    fn layout_all<G: GroupHost + ?Sized>(
        &mut self,
        host: &mut G,
        meta: &GroupMetadata,
        constraint: &ChildConstraint,
    ) {
        vdebug!(items = self.item_count, "group layout all");
        self.layout_forward(host, meta, constraint, 0, self.header_main_size, f32::INFINITY);
    }

    fn layout_forward<G: GroupHost + ?Sized>(
        &mut self,
        host: &mut G,
        meta: &GroupMetadata,
        constraint: &ChildConstraint,
        mut index: usize,
        mut start: f32,
        hi: f32,
    ) {
        while index < self.item_count && start < hi {
            let Some((next, end)) = self.measure_line_forward(host, meta, constraint, index, start)
            else {
                break;
            };
            index = next;
            start = end + self.spacing;
        }
        let stale = self.positions.split_off(&index);
        for &item in stale.keys() {
            host.remove_child(meta.child_index(item));
        }
    }

    fn layout_backward<G: GroupHost + ?Sized>(
        &mut self,
        host: &mut G,
        meta: &GroupMetadata,
        constraint: &ChildConstraint,
        mut index: usize,
        mut end: f32,
        lo: f32,
    ) {
        let mut first = index + 1;
        while end > lo {
            let Some((line_first, start)) =
                self.measure_line_backward(host, meta, constraint, index, end)
            else {
                break;
            };
            first = line_first;
            if line_first == 0 {
                break;
            }
            index = line_first - 1;
            end = start - self.spacing;
        }
        let kept = self.positions.split_off(&first);
        let stale = core::mem::replace(&mut self.positions, kept);
        for &item in stale.keys() {
            host.remove_child(meta.child_index(item));
        }
    }

    fn measure_line_forward<G: GroupHost + ?Sized>(
        &mut self,
        host: &mut G,
        meta: &GroupMetadata,
        constraint: &ChildConstraint,
        index: usize,
        start: f32,
    ) -> Option<(usize, f32)> {
        let line_last = self.lanes.line_end(index, self.item_count, |_| false);
        let mut line_size = 0.0f32;
        let mut next = index;
        for item in index..=line_last {
            let Some(size) = host.measure_child(meta.child_index(item), constraint) else {
                break;
            };
            let main = self.axis.main(size);
            self.positions.insert(
                item,
                PositionEntry {
                    start,
                    end: start + main,
                    is_group: false,
                    cross_size: self.axis.cross(size),
                },
            );
            line_size = line_size.max(main);
            next = item + 1;
        }
        if next == index {
            return None;
        }
        self.estimator.record(line_size);
        Some((next, start + line_size))
    }

    fn measure_line_backward<G: GroupHost + ?Sized>(
        &mut self,
        host: &mut G,
        meta: &GroupMetadata,
        constraint: &ChildConstraint,
        index: usize,
        end: f32,
    ) -> Option<(usize, f32)> {
        let line_first = self.lanes.line_start(index, |_| false);
        let mut measured = Vec::with_capacity(index + 1 - line_first);
        for item in line_first..=index {
            if let Some(size) = host.measure_child(meta.child_index(item), constraint) {
                measured.push((item, size));
            }
        }
        if measured.is_empty() {
            return None;
        }
        let line_size = measured
            .iter()
            .map(|&(_, size)| self.axis.main(size))
            .fold(0.0f32, f32::max);
        let start = end - line_size;
        for (item, size) in measured {
            self.positions.insert(
                item,
                PositionEntry {
                    start,
                    end: start + self.axis.main(size),
                    is_group: false,
                    cross_size: self.axis.cross(size),
                },
            );
        }
        self.estimator.record(line_size);
        Some((line_first, start))
    }

    /// Removes whole lines that do not intersect `[lo, hi)`.
    fn trim<G: GroupHost + ?Sized>(
        &mut self,
        host: &mut G,
        meta: &GroupMetadata,
        lo: f32,
        hi: f32,
    ) {
        while let Some(&first) = self.positions.keys().next() {
            let line_last = self.lanes.line_end(first, self.item_count, |_| false);
            if self.line_max_end(first) > lo {
                break;
            }
            self.remove_range(host, meta, first, line_last);
        }
        while let Some((&last, entry)) = self.positions.iter().next_back() {
            if entry.start < hi {
                break;
            }
            let line_first = self.lanes.line_start(last, |_| false);
            self.remove_range(host, meta, line_first, last);
        }
    }

    fn remove_range<G: GroupHost + ?Sized>(
        &mut self,
        host: &mut G,
        meta: &GroupMetadata,
        first: usize,
        last: usize,
    ) {
        for item in first..=last {
            if self.positions.remove(&item).is_some() {
                host.remove_child(meta.child_index(item));
            }
        }
    }

    fn recycle_items<G: GroupHost + ?Sized>(&mut self, host: &mut G, meta: &GroupMetadata) {
        for &item in self.positions.keys() {
            host.remove_child(meta.child_index(item));
        }
        self.positions.clear();
    }
}
