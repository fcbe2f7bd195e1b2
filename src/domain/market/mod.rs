// Raw market observations
pub mod observation;

pub use observation::{Observation, ObservationSequence};
