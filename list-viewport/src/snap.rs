//! Fling-settle prediction for scroll-snap alignment.

use crate::lanes::LineSpan;
use crate::types::floor;
use crate::{ScrollSnapAlign, ViewportWindow};

pub(crate) struct SnapContext<'a> {
    pub lines: &'a [LineSpan],
    pub window: &'a ViewportWindow,
    pub spacing: f32,
    pub align: ScrollSnapAlign,
    pub lanes: usize,
    pub count: usize,
    /// Line size when every measured line had the same size and no group is realized.
    pub uniform_line: Option<f32>,
}

/// Rounds to the nearest integer; ties go toward negative infinity so the map search and the
/// uniform estimate pick the same line.
fn round_half_down(x: f32) -> f32 {
    -floor(-x + 0.5)
}

impl SnapContext<'_> {
    /// The point of the requested end window that must land on a snap position.
    fn anchor(&self, delta: f32) -> Option<f32> {
        let w = self.window;
        match self.align {
            ScrollSnapAlign::None => None,
            ScrollSnapAlign::Start => Some(w.start_main_pos + delta),
            ScrollSnapAlign::Center => Some(w.center() + delta),
            ScrollSnapAlign::End => Some(w.end_main_pos + delta),
        }
    }

    /// Converts a snap position into a scroll delta from the current window.
    fn to_delta(&self, position: f32) -> f32 {
        let w = self.window;
        match self.align {
            ScrollSnapAlign::None | ScrollSnapAlign::Start => position - w.start_main_pos,
            ScrollSnapAlign::Center => position - w.center(),
            ScrollSnapAlign::End => position - w.end_main_pos,
        }
    }

    /// Predicts the exact delta at which a fling requesting `delta` should stop.
    ///
    /// Returns `None` when no realized line covers the requested position and line sizes are
    /// not uniform: the caller retries on a later pass.
    pub(crate) fn predict(&self, delta: f32) -> Option<f32> {
        let point = self.anchor(delta)?;
        let (first, last) = (self.lines.first()?, self.lines.last()?);

        if let Some(position) = self.search(point) {
            return Some(self.to_delta(position));
        }
        // Past the natural bounds: settle on the first/last line.
        if first.first == 0 && point < first.start {
            return Some(self.to_delta(self.snap_point(first)));
        }
        if last.last + 1 >= self.count && point > last.end {
            return Some(self.to_delta(self.snap_point(last)));
        }
        self.estimate_uniform(point, first)
            .map(|position| self.to_delta(position))
    }

    fn snap_point(&self, line: &LineSpan) -> f32 {
        match self.align {
            ScrollSnapAlign::None | ScrollSnapAlign::Start => line.start,
            ScrollSnapAlign::Center => (line.start + line.end) / 2.0,
            ScrollSnapAlign::End => line.end,
        }
    }

    fn search(&self, point: f32) -> Option<f32> {
        let spacing = self.spacing;
        for line in self.lines {
            let pitch = line.end - line.start + spacing;
            match self.align {
                ScrollSnapAlign::None => return None,
                ScrollSnapAlign::Start => {
                    if point >= line.start && point < line.end + spacing {
                        return Some(if point - line.start <= pitch / 2.0 {
                            line.start
                        } else {
                            line.end + spacing
                        });
                    }
                }
                ScrollSnapAlign::Center => {
                    if point >= line.start - spacing / 2.0 && point < line.end + spacing / 2.0 {
                        return Some((line.start + line.end) / 2.0);
                    }
                }
                ScrollSnapAlign::End => {
                    if point > line.start - spacing && point <= line.end {
                        return Some(if line.end - point <= pitch / 2.0 {
                            line.end
                        } else {
                            line.start - spacing
                        });
                    }
                }
            }
        }
        None
    }

    fn estimate_uniform(&self, point: f32, base: &LineSpan) -> Option<f32> {
        let size = self.uniform_line?;
        let pitch = size + self.spacing;
        if pitch <= 0.0 {
            return None;
        }
        let lanes = self.lanes.max(1);
        let base_line = (base.first / lanes) as f32;
        let total_lines = self.count.div_ceil(lanes) as f32;
        let clamp = |k: f32| k.max(-base_line).min(total_lines - 1.0 - base_line);

        Some(match self.align {
            ScrollSnapAlign::None | ScrollSnapAlign::Start => {
                let k = clamp(round_half_down((point - base.start) / pitch));
                base.start + k * pitch
            }
            ScrollSnapAlign::Center => {
                let k = clamp(floor((point - base.start + self.spacing / 2.0) / pitch));
                base.start + k * pitch + size / 2.0
            }
            ScrollSnapAlign::End => {
                let k = clamp(-round_half_down(-(point - base.end) / pitch));
                base.end + k * pitch
            }
        })
    }
}
