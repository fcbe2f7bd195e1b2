// Raw market observations
pub mod market;

// Feature layout and model outputs
pub mod ml;

// Port interfaces
pub mod ports;

// Domain-specific error types
pub mod errors;
