use alloc::vec::Vec;

use crate::types::near_eq;
use crate::{CrossAlign, PositionMap};

/// Multi-lane (multi-column) policy.
///
/// `min_lane_length`/`max_lane_length` derive the lane count from the content cross size; when
/// neither is set, `lanes` is used as-is.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LaneConfig {
    pub lanes: usize,
    pub lane_gutter: f32,
    pub min_lane_length: Option<f32>,
    pub max_lane_length: Option<f32>,
}

impl Default for LaneConfig {
    fn default() -> Self {
        Self::single()
    }
}

impl LaneConfig {
    pub fn single() -> Self {
        Self::fixed(1)
    }

    pub fn fixed(lanes: usize) -> Self {
        Self {
            lanes,
            lane_gutter: 0.0,
            min_lane_length: None,
            max_lane_length: None,
        }
    }

    pub fn with_gutter(mut self, lane_gutter: f32) -> Self {
        self.lane_gutter = lane_gutter;
        self
    }

    pub fn with_lane_length(mut self, min: Option<f32>, max: Option<f32>) -> Self {
        self.min_lane_length = min;
        self.max_lane_length = max;
        self
    }

    /// Resolves the lane count and per-lane cross length for a content cross size.
    pub fn resolve(&self, cross_size: f32) -> ResolvedLanes {
        let cross_size = cross_size.max(0.0);
        let mut gutter = self.lane_gutter.max(0.0);
        if gutter >= cross_size {
            gutter = 0.0;
        }

        let min = self
            .min_lane_length
            .or(self.max_lane_length)
            .filter(|&v| v > 0.0);
        let max = self
            .max_lane_length
            .or(self.min_lane_length)
            .filter(|&v| v > 0.0);

        let lanes = match (min, max) {
            (Some(min), Some(max)) => {
                let min = min.min(max);
                if min >= cross_size {
                    1
                } else {
                    let fit = crate::types::floor((cross_size + gutter) / (min + gutter));
                    if fit.is_finite() && fit >= 1.0 {
                        fit as usize
                    } else {
                        1
                    }
                }
            }
            _ => self.lanes.max(1),
        };

        if lanes <= 1 {
            let lane_length = match max {
                Some(max) => cross_size.min(max.max(min.unwrap_or(max))),
                None => cross_size,
            };
            return ResolvedLanes {
                lanes: 1,
                gutter: 0.0,
                lane_length,
            };
        }

        let mut lane_length =
            ((cross_size - gutter * (lanes - 1) as f32) / lanes as f32).max(0.0);
        if let Some(max) = max {
            lane_length = lane_length.min(max.max(min.unwrap_or(max)));
        }
        ResolvedLanes {
            lanes,
            gutter,
            lane_length,
        }
    }
}

/// Lane geometry fixed for one layout pass.
///
/// Lines are aligned to multiples of `lanes` and broken by group children, which always occupy
/// a line of their own. These strategy functions are shared by the list and group engines.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ResolvedLanes {
    pub lanes: usize,
    pub gutter: f32,
    pub lane_length: f32,
}

impl ResolvedLanes {
    pub fn single(cross_size: f32) -> Self {
        Self {
            lanes: 1,
            gutter: 0.0,
            lane_length: cross_size.max(0.0),
        }
    }

    /// First index of the line containing `index`.
    pub fn line_start(&self, index: usize, is_group: impl Fn(usize) -> bool) -> usize {
        if self.lanes <= 1 || is_group(index) {
            return index;
        }
        let base = index - index % self.lanes;
        (base..index)
            .rev()
            .find(|&i| is_group(i))
            .map_or(base, |group| group + 1)
    }

    /// Last index of the line containing `index` (inclusive).
    pub fn line_end(&self, index: usize, count: usize, is_group: impl Fn(usize) -> bool) -> usize {
        if self.lanes <= 1 || is_group(index) {
            return index;
        }
        let base = index - index % self.lanes;
        let limit = (base + self.lanes).min(count);
        (index + 1..limit)
            .find(|&i| is_group(i))
            .map_or(limit.saturating_sub(1).max(index), |group| group - 1)
    }

    pub fn lane_of(&self, index: usize) -> usize {
        if self.lanes <= 1 { 0 } else { index % self.lanes }
    }

    /// Number of lines needed for `count` plain items.
    pub fn lines_for(&self, count: usize) -> usize {
        count.div_ceil(self.lanes.max(1))
    }

    /// Cross offset of a child of `child_cross` size placed in `lane`.
    pub fn cross_offset(&self, lane: usize, child_cross: f32, align: CrossAlign) -> f32 {
        let lane_start = lane as f32 * (self.lane_length + self.gutter);
        let free = (self.lane_length - child_cross).max(0.0);
        lane_start
            + match align {
                CrossAlign::Start => 0.0,
                CrossAlign::Center => free / 2.0,
                CrossAlign::End => free,
            }
    }
}

/// A run of entries sharing one line of a position map.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct LineSpan {
    pub first: usize,
    pub last: usize,
    pub start: f32,
    /// Max end over the line's entries.
    pub end: f32,
    pub is_group: bool,
}

impl ResolvedLanes {
    /// Splits a position map into lines, relying on same-line entries sharing `start`.
    pub(crate) fn lines(&self, map: &PositionMap) -> Vec<LineSpan> {
        let mut lines: Vec<LineSpan> = Vec::new();
        for (&index, entry) in map {
            if let Some(line) = lines.last_mut() {
                let joins = self.lanes > 1
                    && !entry.is_group
                    && !line.is_group
                    && index == line.last + 1
                    && index % self.lanes != 0
                    && near_eq(entry.start, line.start);
                if joins {
                    line.last = index;
                    line.end = line.end.max(entry.end);
                    continue;
                }
            }
            lines.push(LineSpan {
                first: index,
                last: index,
                start: entry.start,
                end: entry.end,
                is_group: entry.is_group,
            });
        }
        lines
    }
}
