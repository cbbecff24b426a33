//! FIFO of feature-matching model mutations.
//!
//! The engine's model set must not change while a photo is in flight, so each
//! operation pauses capture, waits (across ticks) until capture reports it is
//! idle, mutates, and resumes. Only one operation is in flight at a time.

use std::collections::VecDeque;

use artscan_capture::CaptureControl;
use artscan_core::ArtworkId;
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "op", content = "id", rename_all = "snake_case")]
pub enum ModelOperation {
    /// Add the model of one artwork.
    Add(ArtworkId),
    /// Add models of every eligible artwork without a scan-area anchor.
    AddNew,
    Remove(ArtworkId),
    RemoveAll,
}

#[derive(Debug, Default)]
pub struct ModelOpQueue {
    queue: VecDeque<ModelOperation>,
    in_flight: Option<ModelOperation>,
}

impl ModelOpQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, op: ModelOperation) {
        log::debug!("queued model operation {op:?}");
        self.queue.push_back(op);
    }

    /// Queued operations, not counting the one in flight.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn in_flight(&self) -> Option<ModelOperation> {
        self.in_flight
    }

    pub fn is_idle(&self) -> bool {
        self.in_flight.is_none() && self.queue.is_empty()
    }

    /// Drop everything, including a paused in-flight operation.
    ///
    /// The pause taken for the in-flight operation is released.
    pub fn clear(&mut self, capture: &mut dyn CaptureControl) {
        self.queue.clear();
        if self.in_flight.take().is_some() {
            capture.wait(false);
        }
    }

    /// Advance by one tick.
    ///
    /// `apply` performs the mutation and returns how many feature-matching
    /// models remain; capture stays active only if that is non-zero. Returns
    /// the operation completed during this tick, if any.
    pub fn advance<F>(
        &mut self,
        capture: &mut dyn CaptureControl,
        apply: F,
    ) -> Option<ModelOperation>
    where
        F: FnOnce(ModelOperation) -> usize,
    {
        if self.in_flight.is_none() {
            let op = self.queue.pop_front()?;
            capture.wait(true);
            self.in_flight = Some(op);
        }

        if !capture.is_waiting() {
            return None;
        }
        let op = self.in_flight.take()?;
        let remaining = apply(op);
        capture.set_active(remaining > 0);
        capture.wait(false);
        log::debug!("model operation {op:?} done, {remaining} models left");
        Some(op)
    }
}
