//! Collaborator seams for a recognition session.
//!
//! This module is intentionally small and policy-light:
//! - No IO of its own
//! - No async
//! - No inference or rendering
//!
//! Products provide a `FrameClassifier` (frames in, probability vectors out) and a
//! `Presenter` (states and history lines out). The stabilizer never sees frames.

use gesture_stabilizer_core::{HistoryEntry, PresentationState, Tone};
use tracing::{info, warn};

/// Error type classifiers report. Opaque to the session; it is only logged or propagated.
pub type ClassifierError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Trait: turn one opaque frame into a probability distribution over the label catalog.
pub trait FrameClassifier {
    /// Whatever the frame source hands over; never inspected by the session.
    type Frame;

    /// Prepare the model. Called once per session object, on the first `start`.
    fn load(&mut self) -> Result<(), ClassifierError> {
        Ok(())
    }

    /// Readiness gate checked before each tick (camera warm-up, zero-size frames, ...).
    fn is_ready(&self, _frame: &Self::Frame) -> bool {
        true
    }

    /// Classify one frame. The result must be aligned with the label catalog.
    fn classify(&mut self, frame: &Self::Frame) -> Result<Vec<f32>, ClassifierError>;
}

/// Trait: surface stabilizer output to a user, a log, or a metric sink.
pub trait Presenter {
    /// Called once per step with the state to display.
    fn present(&mut self, state: &PresentationState);

    /// Called only when a new stable label is confirmed.
    fn append_history(&mut self, entry: &HistoryEntry);
}

/// Presenter that writes log lines. State lines are emitted only when the message changes.
#[derive(Debug, Default)]
pub struct TracingPresenter {
    last_message: Option<String>,
}

impl TracingPresenter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Presenter for TracingPresenter {
    fn present(&mut self, state: &PresentationState) {
        let msg = state.message();
        if self.last_message.as_deref() == Some(msg.as_str()) {
            return;
        }
        match state.tone() {
            Tone::Alert | Tone::Caution => warn!(tone = ?state.tone(), "{msg}"),
            Tone::Neutral => info!("{msg}"),
        }
        self.last_message = Some(msg);
    }

    fn append_history(&mut self, entry: &HistoryEntry) {
        info!(label = %entry.label, confidence = entry.confidence, "history: {entry}");
    }
}

/// Presenters can be borrowed, so callers keep access to what they rendered.
impl<P: Presenter + ?Sized> Presenter for &mut P {
    fn present(&mut self, state: &PresentationState) {
        (**self).present(state)
    }

    fn append_history(&mut self, entry: &HistoryEntry) {
        (**self).append_history(entry)
    }
}
