/// Running statistics over measured line sizes, used to estimate the extent of lines that are
/// not realized.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct LineEstimator {
    total: f64,
    lines: u64,
    min: f32,
    max: f32,
}

impl LineEstimator {
    pub(crate) fn record(&mut self, size: f32) {
        if !size.is_finite() || size < 0.0 {
            return;
        }
        if self.lines == 0 {
            self.min = size;
            self.max = size;
        } else {
            self.min = self.min.min(size);
            self.max = self.max.max(size);
        }
        self.total += size as f64;
        self.lines += 1;
    }

    pub(crate) fn average(&self) -> Option<f32> {
        (self.lines > 0).then(|| (self.total / self.lines as f64) as f32)
    }

    /// The common line size, when every recorded line had the same size.
    pub(crate) fn uniform(&self) -> Option<f32> {
        (self.lines > 0 && crate::types::near_eq(self.min, self.max)).then_some(self.max)
    }

    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }
}
