// Background model maintenance
pub mod retrain_scheduler;
