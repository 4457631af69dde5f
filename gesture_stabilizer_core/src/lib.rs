pub mod error;
pub mod cfg;
pub mod labels;

pub mod observation;
pub mod window;
pub mod state;
pub mod decide;

pub use error::StabilizerError;
pub use cfg::StabilizerCfg;
pub use labels::{LabelCatalog, LabelToken};

pub use observation::{Observation, arg_max, probability_to_percent, round_to_hundredths};
pub use window::ObservationWindow;
pub use state::{StabilizerSnapshot, RestoreStats};
pub use decide::{PresentationState, Tone, HistoryEntry, Tick, Stabilizer, classify_tick};
