use crate::error::StabilizerError;
use crate::labels::LabelCatalog;
use crate::observation::Observation;
use crate::window::ObservationWindow;

/// Mutable state carried across ticks. Owned by one `Stabilizer`.
#[derive(Clone, Debug)]
pub(crate) struct StabilizerState {
    pub(crate) window: ObservationWindow,
    pub(crate) last_stable_label: Option<String>,
}

impl StabilizerState {
    pub(crate) fn new(window_capacity: usize) -> Self {
        Self {
            window: ObservationWindow::new(window_capacity),
            last_stable_label: None,
        }
    }

    /// Record a confirmed label. Returns true when it differs from the previous one.
    #[inline]
    pub(crate) fn confirm(&mut self, label: &str) -> bool {
        if self.last_stable_label.as_deref() == Some(label) {
            return false;
        }
        self.last_stable_label = Some(label.to_string());
        true
    }

    #[inline]
    pub(crate) fn reset(&mut self, retain_stable_label: bool) {
        self.window.clear();
        if !retain_stable_label {
            self.last_stable_label = None;
        }
    }

    pub(crate) fn snapshot(&self) -> StabilizerSnapshot {
        StabilizerSnapshot {
            window: self.window.iter().cloned().collect(),
            last_stable_label: self.last_stable_label.clone(),
        }
    }

    /// Replace the state with `snap`. Only the newest `capacity` observations survive.
    /// The state is left unchanged when the snapshot does not fit `catalog`.
    pub(crate) fn restore(
        &mut self,
        snap: StabilizerSnapshot,
        catalog: &LabelCatalog,
    ) -> Result<RestoreStats, StabilizerError> {
        snap.validate(catalog)?;

        self.window.clear();
        let mut stats = RestoreStats::default();
        for obs in snap.window {
            if self.window.push(obs).is_some() {
                stats.dropped += 1;
            }
            stats.applied += 1;
        }
        stats.applied -= stats.dropped;
        self.last_stable_label = snap.last_stable_label;
        Ok(stats)
    }
}

/// Storage-agnostic copy of the stabilizer state. Callers decide where it lives.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StabilizerSnapshot {
    /// Observations oldest first.
    pub window: Vec<Observation>,
    pub last_stable_label: Option<String>,
}

impl StabilizerSnapshot {
    /// Every label must come from `catalog` and every confidence must be a percentage.
    pub fn validate(&self, catalog: &LabelCatalog) -> Result<(), StabilizerError> {
        for (i, obs) in self.window.iter().enumerate() {
            if !obs.confidence.is_finite() || !(0.0..=100.0).contains(&obs.confidence) {
                return Err(StabilizerError::InvalidSnapshot(format!(
                    "observation {i} has confidence {} outside [0, 100]",
                    obs.confidence
                )));
            }
            if catalog.position(&obs.label).is_none() {
                return Err(StabilizerError::InvalidSnapshot(format!(
                    "observation {i} has unknown label {:?}",
                    obs.label
                )));
            }
        }
        if let Some(label) = &self.last_stable_label {
            if catalog.position(label).is_none() {
                return Err(StabilizerError::InvalidSnapshot(format!(
                    "unknown stable label {label:?}"
                )));
            }
        }
        Ok(())
    }
}

/// Counters returned by `restore`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RestoreStats {
    /// Observations retained in the window.
    pub applied: usize,
    /// Oldest observations dropped because the snapshot exceeded the window capacity.
    pub dropped: usize,
}
