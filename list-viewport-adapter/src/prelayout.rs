use alloc::collections::VecDeque;
use alloc::vec::Vec;

use list_viewport::{ChildConstraint, ChildHost, PrelayoutRequest, SizeF};

/// Outcome of one idle slice.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PrelayoutStatus {
    Done,
    /// The deadline passed with `remaining` indexes still queued.
    Pending { remaining: usize },
}

/// Resumable idle pre-layout of the children just past the realized range.
///
/// The host keeps the children measured here as a cache so the next pass that scrolls onto them
/// finds them ready. The engine releases the ones still unused after its next pass. Dropping the
/// cursor cancels the work.
#[derive(Clone, Debug, PartialEq)]
pub struct PrelayoutCursor {
    remaining: VecDeque<usize>,
    constraint: ChildConstraint,
    measured: Vec<(usize, SizeF)>,
}

impl PrelayoutCursor {
    pub fn from_request(request: PrelayoutRequest) -> Self {
        Self {
            remaining: request.indices.into(),
            constraint: request.constraint,
            measured: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.remaining.len()
    }

    pub fn is_empty(&self) -> bool {
        self.remaining.is_empty()
    }

    pub fn constraint(&self) -> &ChildConstraint {
        &self.constraint
    }

    /// Children measured so far, in measurement order.
    pub fn measured(&self) -> &[(usize, SizeF)] {
        &self.measured
    }

    /// Measures queued children one at a time until the queue is empty or `now_ms()` reaches
    /// `deadline_ms`. The deadline is checked before every child.
    pub fn run<H: ChildHost + ?Sized>(
        &mut self,
        host: &mut H,
        deadline_ms: u64,
        mut now_ms: impl FnMut() -> u64,
    ) -> PrelayoutStatus {
        while let Some(&index) = self.remaining.front() {
            if now_ms() >= deadline_ms {
                #[cfg(feature = "tracing")]
                tracing::trace!(
                    target: "list_viewport_adapter",
                    remaining = self.remaining.len(),
                    "prelayout deadline reached"
                );
                return PrelayoutStatus::Pending {
                    remaining: self.remaining.len(),
                };
            }
            self.remaining.pop_front();
            // The count may have shrunk since the request was made.
            if index >= host.child_count() {
                continue;
            }
            match host.measure_child(index, &self.constraint) {
                Some(size) => self.measured.push((index, size)),
                None => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(
                        target: "list_viewport_adapter",
                        index,
                        "prelayout child missing"
                    );
                }
            }
        }
        PrelayoutStatus::Done
    }
}
