// Feature derivation and scaling
pub mod feature_pipeline;
pub mod standard_scaler;

// Estimators
pub mod random_forest;

// Per-symbol model lifecycle
pub mod model_registry;
pub mod symbol_model;
