use list_viewport::{
    Align, ChildHost, IndexTarget, LaneConfig, ListEngine, ListHost, ListOptions, MeasureOutput,
    RestoreError, SavedScrollState, ScrollIntent, ViewportWindow,
};

use crate::{PrelayoutCursor, PrelayoutStatus};

/// A framework-neutral controller that wraps a `list_viewport::ListEngine` and provides common
/// adapter workflows (intent queueing, state restore, idle pre-layout).
///
/// This type does not hold any UI objects. Adapters drive it by calling:
/// - `jump` / `scroll_to` / `scroll_by` / `fling` when UI events occur
/// - `frame(host, window)` once per frame
/// - `idle(host, deadline_ms, now_ms)` when the frame finished early
///
/// Only one intent is pending at a time: a newer one replaces it, except that consecutive
/// deltas add up.
#[derive(Clone, Debug)]
pub struct Controller {
    engine: ListEngine,
    lanes: LaneConfig,
    pending: ScrollIntent,
    idle: Option<PrelayoutCursor>,
}

impl Default for Controller {
    fn default() -> Self {
        Self::new(ListOptions::default())
    }
}

impl Controller {
    pub fn new(options: ListOptions) -> Self {
        Self::from_engine(ListEngine::new(options))
    }

    pub fn from_engine(engine: ListEngine) -> Self {
        Self {
            engine,
            lanes: LaneConfig::single(),
            pending: ScrollIntent::None,
            idle: None,
        }
    }

    pub fn with_lanes(mut self, lanes: LaneConfig) -> Self {
        self.lanes = lanes;
        self
    }

    pub fn engine(&self) -> &ListEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut ListEngine {
        &mut self.engine
    }

    pub fn into_engine(self) -> ListEngine {
        self.engine
    }

    pub fn lanes(&self) -> &LaneConfig {
        &self.lanes
    }

    pub fn set_lanes(&mut self, lanes: LaneConfig) {
        self.lanes = lanes;
    }

    pub fn pending_intent(&self) -> ScrollIntent {
        self.pending
    }

    pub fn jump(&mut self, index: impl Into<IndexTarget>, align: Align) {
        self.pending = ScrollIntent::jump(index, align);
    }

    pub fn jump_in_group(&mut self, index: usize, item: usize, align: Align) {
        self.pending = ScrollIntent::JumpInGroup { index, item, align };
    }

    /// Stages an animated scroll-to. Each frame reports the remaining distance in
    /// `MeasureOutput::target`; the adapter turns it into deltas.
    pub fn scroll_to(&mut self, index: impl Into<IndexTarget>, align: Align) {
        self.pending = ScrollIntent::target(index, align);
    }

    pub fn scroll_by(&mut self, delta: f32) {
        self.pending = match self.pending {
            ScrollIntent::Delta(pending) => ScrollIntent::Delta(pending + delta),
            _ => ScrollIntent::Delta(delta),
        };
    }

    /// Requests the snap position for a fling expected to travel `delta`.
    pub fn fling(&mut self, delta: f32) {
        self.engine.request_snap_prediction(delta);
    }

    pub fn saved_state(&self) -> Option<SavedScrollState> {
        self.engine.saved_state()
    }

    /// Parses a string produced by `SavedScrollState::to_restore_string` and queues the jump
    /// that restores it. The pending intent is left untouched on error.
    pub fn restore(&mut self, saved: &str) -> Result<(), RestoreError> {
        let state: SavedScrollState = saved.parse()?;
        self.pending = state.into_intent();
        Ok(())
    }

    /// Runs one measure + layout pass with the pending intent and queues its idle pre-layout.
    pub fn frame<H: ListHost>(&mut self, host: &mut H, window: ViewportWindow) -> MeasureOutput {
        let intent = core::mem::take(&mut self.pending);
        let out = self.engine.measure(host, window, intent, &self.lanes);
        self.engine.layout(host);
        self.idle = out.prelayout.clone().map(PrelayoutCursor::from_request);
        out
    }

    pub fn has_idle_work(&self) -> bool {
        self.idle.as_ref().is_some_and(|c| !c.is_empty())
    }

    pub fn cancel_idle(&mut self) {
        self.idle = None;
    }

    /// Continues the queued pre-layout until `deadline_ms`.
    pub fn idle<H: ChildHost + ?Sized>(
        &mut self,
        host: &mut H,
        deadline_ms: u64,
        now_ms: impl FnMut() -> u64,
    ) -> PrelayoutStatus {
        let Some(cursor) = self.idle.as_mut() else {
            return PrelayoutStatus::Done;
        };
        let status = cursor.run(host, deadline_ms, now_ms);
        if status == PrelayoutStatus::Done {
            self.idle = None;
        }
        status
    }
}
