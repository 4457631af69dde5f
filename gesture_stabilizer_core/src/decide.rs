use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::{
    cfg::StabilizerCfg,
    error::StabilizerError,
    labels::LabelCatalog,
    observation::{round_to_hundredths, Observation},
    state::{RestoreStats, StabilizerSnapshot, StabilizerState},
    window::ObservationWindow,
};

/// What the presenter should show for one step.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum PresentationState {
    Loading,
    Started,
    Detected { label: String, confidence: f32 },
    NoGesture { confidence: f32 },
    Unrecognized,
    /// Too few same-label samples, or smoothed confidence between the two thresholds.
    InsufficientSignal,
    Stopped,
}

/// Presenter color hint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tone {
    Neutral,
    Alert,
    Caution,
}

impl PresentationState {
    pub fn message(&self) -> String {
        match self {
            PresentationState::Loading => "Loading model...".to_string(),
            PresentationState::Started => "Model started. Move your hand...".to_string(),
            PresentationState::Detected { label, confidence } => {
                format!("Detected: {label} (Accuracy: {confidence:.2}%)")
            }
            PresentationState::NoGesture { confidence } => {
                format!("No gesture (Confidence: {confidence:.2}%)")
            }
            PresentationState::Unrecognized => "Unrecognized Gesture".to_string(),
            PresentationState::InsufficientSignal => "Move hand closer...".to_string(),
            PresentationState::Stopped => "Model stopped".to_string(),
        }
    }

    pub fn tone(&self) -> Tone {
        match self {
            PresentationState::Unrecognized => Tone::Alert,
            PresentationState::InsufficientSignal => Tone::Caution,
            _ => Tone::Neutral,
        }
    }

    #[inline]
    pub fn is_detected(&self) -> bool {
        matches!(self, PresentationState::Detected { .. })
    }
}

/// Append-only record of a confirmed detection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub label: String,
    /// Smoothed confidence, kept to two decimals.
    pub confidence: f32,
}

impl fmt::Display for HistoryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {:.2}%", self.label, self.confidence)
    }
}

/// Result of one `ingest` call.
#[derive(Clone, Debug, PartialEq)]
pub struct Tick {
    pub state: PresentationState,
    /// Present only on a stable-label change.
    pub history: Option<HistoryEntry>,
    /// The raw observation appended this tick.
    pub observation: Observation,
}

/// Map one tick's candidate label and its same-label statistics to a state.
///
/// `matching` is the number of window entries carrying `label` (including the
/// one just appended) and `avg` their mean confidence.
pub fn classify_tick(label: &str, matching: usize, avg: f32, cfg: &StabilizerCfg) -> PresentationState {
    if matching < cfg.confirm_majority {
        return PresentationState::InsufficientSignal;
    }

    let is_no_gesture = cfg
        .no_gesture_label
        .as_deref()
        .is_some_and(|ng| ng.to_lowercase() == label.to_lowercase());

    if is_no_gesture && avg >= cfg.confidence_threshold {
        PresentationState::NoGesture { confidence: avg }
    } else if avg >= cfg.confidence_threshold {
        PresentationState::Detected {
            label: label.to_string(),
            confidence: avg,
        }
    } else if avg < cfg.unrecognized_threshold {
        PresentationState::Unrecognized
    } else {
        PresentationState::InsufficientSignal
    }
}

/// Temporal stabilizer over per-frame classifier output.
#[derive(Clone, Debug)]
pub struct Stabilizer {
    cfg: StabilizerCfg,
    state: StabilizerState,
}

impl Stabilizer {
    pub fn new(cfg: StabilizerCfg) -> Result<Self, StabilizerError> {
        cfg.validate()?;
        let state = StabilizerState::new(cfg.window_capacity);
        Ok(Self { cfg, state })
    }

    /// Consume one probability vector and decide what to present.
    ///
    /// Fails only on contract violations (empty catalog, length mismatch,
    /// non-finite values); the window is left untouched in that case.
    pub fn ingest(&mut self, distribution: &[f32], catalog: &LabelCatalog) -> Result<Tick, StabilizerError> {
        let observation = Observation::from_distribution(distribution, catalog)?;
        self.state.window.push(observation.clone());

        let (matching, avg) = self
            .state
            .window
            .mean_confidence(&observation.label)
            .unwrap_or((1, observation.confidence));

        let state = classify_tick(&observation.label, matching, avg, &self.cfg);

        let history = match &state {
            PresentationState::Detected { label, confidence } if self.state.confirm(label) => {
                debug!(label = %label, confidence = *confidence, "stable label changed");
                Some(HistoryEntry {
                    label: label.clone(),
                    confidence: round_to_hundredths(*confidence),
                })
            }
            _ => None,
        };

        trace!(
            label = %observation.label,
            confidence = observation.confidence,
            matching,
            avg,
            ?state,
            "tick"
        );

        Ok(Tick {
            state,
            history,
            observation,
        })
    }

    /// Clear the window. The last confirmed label is cleared too unless
    /// `retain_stable_label_on_reset` is set.
    pub fn reset(&mut self) {
        self.state.reset(self.cfg.retain_stable_label_on_reset);
        debug!(
            retained = ?self.state.last_stable_label,
            "stabilizer reset"
        );
    }

    pub fn snapshot(&self) -> StabilizerSnapshot {
        self.state.snapshot()
    }

    /// Load a snapshot taken against `catalog`. Rejects out-of-range confidences
    /// and unknown labels without touching the current state.
    pub fn restore(
        &mut self,
        snap: StabilizerSnapshot,
        catalog: &LabelCatalog,
    ) -> Result<RestoreStats, StabilizerError> {
        self.state.restore(snap, catalog)
    }

    #[inline]
    pub fn cfg(&self) -> &StabilizerCfg {
        &self.cfg
    }

    #[inline]
    pub fn window(&self) -> &ObservationWindow {
        &self.state.window
    }

    #[inline]
    pub fn last_stable_label(&self) -> Option<&str> {
        self.state.last_stable_label.as_deref()
    }
}
