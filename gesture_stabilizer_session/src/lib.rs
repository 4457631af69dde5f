//! gesture_stabilizer_session
//!
//! Outside-world facing orchestration layer for `gesture_stabilizer_core`.
//!
//! Responsibilities:
//! - own one `Stabilizer` per recognition session
//! - gate ticks on the running latch and classifier readiness
//! - feed classifier output into the stabilizer
//! - hand states and history lines to a presenter
//!
//! Non-goals:
//! - no frame capture or decoding
//! - no inference
//! - no async

pub mod adapter;
pub mod session;

pub use adapter::{
    ClassifierError,
    FrameClassifier,
    Presenter,
    TracingPresenter,
};

pub use session::{
    RecognitionSession,
    RunSummary,
    SessionError,
    StopHandle,
    TickOutcome,
};
