pub mod feature_registry;
pub mod prediction;

pub use feature_registry::{FEATURE_NAMES, FeatureRow};
pub use prediction::{IngestOutcome, Prediction, TrainingReport};
