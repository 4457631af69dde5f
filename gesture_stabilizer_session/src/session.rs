//! Recognition session driver.
//!
//! Owns exactly one `Stabilizer` plus its collaborators and runs the per-tick loop:
//! frame -> classifier -> stabilizer -> presenter.
//!
//! No async. One tick is in flight at a time: `tick` takes `&mut self`, and the
//! running latch rejects a second `start` while a session is live. A `StopHandle`
//! lets another thread request a stop; the loop honors it before the next tick.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use gesture_stabilizer_core::{
    HistoryEntry, LabelCatalog, PresentationState, RestoreStats, Stabilizer, StabilizerCfg,
    StabilizerError, StabilizerSnapshot,
};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::adapter::{ClassifierError, FrameClassifier, Presenter};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("recognition session is already running")]
    AlreadyRunning,

    #[error("failed to load classifier model")]
    ModelLoad(#[source] ClassifierError),

    #[error(transparent)]
    Stabilizer(#[from] StabilizerError),
}

/// Result of one `tick` call.
#[derive(Clone, Debug, PartialEq)]
pub enum TickOutcome {
    /// The session is stopped; nothing was classified.
    NotRunning,
    /// The classifier reported the frame as not ready.
    NotReady,
    /// The classifier failed or produced nothing; the stabilizer was not fed.
    Skipped,
    Presented {
        state: PresentationState,
        history: Option<HistoryEntry>,
    },
}

/// Counters for one `run` call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RunSummary {
    /// Ticks that reached the stabilizer.
    pub ticks: usize,
    pub not_ready: usize,
    pub skipped: usize,
    pub history_appended: usize,
}

/// Cloneable handle that stops a running session from anywhere.
#[derive(Clone, Debug)]
pub struct StopHandle {
    running: Arc<AtomicBool>,
}

impl StopHandle {
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

pub struct RecognitionSession<C, P> {
    stabilizer: Stabilizer,
    catalog: LabelCatalog,
    classifier: C,
    presenter: P,
    history: Vec<HistoryEntry>,
    running: Arc<AtomicBool>,
    // Started and not yet torn down; may lag `running` after a remote stop.
    active: bool,
    model_loaded: bool,
}

impl<C, P> RecognitionSession<C, P>
where
    C: FrameClassifier,
    P: Presenter,
{
    pub fn new(
        cfg: StabilizerCfg,
        catalog: LabelCatalog,
        classifier: C,
        presenter: P,
    ) -> Result<Self, SessionError> {
        Ok(Self {
            stabilizer: Stabilizer::new(cfg)?,
            catalog,
            classifier,
            presenter,
            history: Vec::new(),
            running: Arc::new(AtomicBool::new(false)),
            active: false,
            model_loaded: false,
        })
    }

    /// Load the model (first time only) and begin accepting ticks.
    pub fn start(&mut self) -> Result<(), SessionError> {
        if self.is_running() {
            return Err(SessionError::AlreadyRunning);
        }
        if self.active {
            self.finish_stop();
        }

        self.presenter.present(&PresentationState::Loading);
        if !self.model_loaded {
            self.classifier.load().map_err(SessionError::ModelLoad)?;
            self.model_loaded = true;
            debug!(labels = self.catalog.len(), "classifier model loaded");
        }

        self.presenter.present(&PresentationState::Started);
        self.active = true;
        self.running.store(true, Ordering::SeqCst);
        info!("recognition session started");
        Ok(())
    }

    /// Stop the session, clear the stabilizer, and present `Stopped`.
    /// Returns whether a session was live.
    pub fn stop(&mut self) -> bool {
        self.running.store(false, Ordering::SeqCst);
        let was_active = self.active;
        self.finish_stop();
        was_active
    }

    fn finish_stop(&mut self) {
        self.active = false;
        self.stabilizer.reset();
        self.presenter.present(&PresentationState::Stopped);
        info!(history = self.history.len(), "recognition session stopped");
    }

    /// Run one classification cycle for `frame`.
    pub fn tick(&mut self, frame: &C::Frame) -> Result<TickOutcome, SessionError> {
        if !self.is_running() {
            if self.active {
                self.finish_stop();
            }
            return Ok(TickOutcome::NotRunning);
        }

        if !self.classifier.is_ready(frame) {
            debug!("frame not ready; waiting");
            return Ok(TickOutcome::NotReady);
        }

        let distribution = match self.classifier.classify(frame) {
            Ok(d) if d.is_empty() => {
                warn!("classifier returned an empty distribution; skipping tick");
                return Ok(TickOutcome::Skipped);
            }
            Ok(d) => d,
            Err(e) => {
                warn!(error = %e, "classification failed; skipping tick");
                return Ok(TickOutcome::Skipped);
            }
        };

        let tick = self.stabilizer.ingest(&distribution, &self.catalog)?;

        self.presenter.present(&tick.state);
        if let Some(entry) = &tick.history {
            self.presenter.append_history(entry);
            self.history.push(entry.clone());
        }

        Ok(TickOutcome::Presented {
            state: tick.state,
            history: tick.history,
        })
    }

    /// Drive ticks until the frames run out or the session is stopped.
    ///
    /// The running flag is checked before each frame is pulled, so a stop is
    /// honored between ticks, never mid-tick.
    pub fn run<I>(&mut self, frames: I) -> Result<RunSummary, SessionError>
    where
        I: IntoIterator<Item = C::Frame>,
    {
        let mut summary = RunSummary::default();
        let mut frames = frames.into_iter();

        while self.is_running() {
            let Some(frame) = frames.next() else { break };
            match self.tick(&frame)? {
                TickOutcome::NotRunning => break,
                TickOutcome::NotReady => summary.not_ready += 1,
                TickOutcome::Skipped => summary.skipped += 1,
                TickOutcome::Presented { history, .. } => {
                    summary.ticks += 1;
                    if history.is_some() {
                        summary.history_appended += 1;
                    }
                }
            }
        }

        if !self.is_running() && self.active {
            self.finish_stop();
        }
        Ok(summary)
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            running: Arc::clone(&self.running),
        }
    }

    /// Confirmed detections for this session object, oldest first.
    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    pub fn catalog(&self) -> &LabelCatalog {
        &self.catalog
    }

    pub fn stabilizer(&self) -> &Stabilizer {
        &self.stabilizer
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn classifier(&self) -> &C {
        &self.classifier
    }

    /// Export the stabilizer state. No IO: callers decide how to persist it.
    pub fn snapshot(&self) -> StabilizerSnapshot {
        self.stabilizer.snapshot()
    }

    /// Load a snapshot into the stabilizer. Rejected snapshots leave the state as is.
    pub fn restore(&mut self, snap: StabilizerSnapshot) -> Result<RestoreStats, SessionError> {
        Ok(self.stabilizer.restore(snap, &self.catalog)?)
    }
}
