use crate::config::{Config, ModelEnvConfig, SchedulerEnvConfig, ServerEnvConfig};
use std::env;
use std::sync::Mutex;
use std::sync::OnceLock;

// Global lock to prevent race conditions when modifying environment variables in tests
static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

fn get_env_lock() -> &'static Mutex<()> {
    ENV_LOCK.get_or_init(|| Mutex::new(()))
}

const VARS: &[&str] = &[
    "ML_PORT",
    "PORT",
    "BIND_ADDRESS",
    "RETRAIN_ENABLED",
    "RETRAIN_INTERVAL_SECS",
    "RETRAIN_MIN_OBSERVATIONS",
    "FOREST_N_TREES",
    "FOREST_MAX_DEPTH",
    "FOREST_MIN_SAMPLES_SPLIT",
    "FOREST_SEED",
    "OBSERVABILITY_ENABLED",
    "OBSERVABILITY_INTERVAL",
];

fn clear_env() {
    for var in VARS {
        // SAFETY: env mutation is serialized by ENV_LOCK
        unsafe { env::remove_var(var) };
    }
}

fn set(key: &str, value: &str) {
    // SAFETY: env mutation is serialized by ENV_LOCK
    unsafe { env::set_var(key, value) };
}

#[test]
fn test_config_defaults() {
    let _guard = get_env_lock().lock().unwrap_or_else(|e| e.into_inner());
    clear_env();

    let config = Config::from_env().unwrap();

    assert_eq!(config, Config::default());
    assert_eq!(config.server.port, 5001);
    assert_eq!(config.server.bind_address, "0.0.0.0");
    assert!(config.scheduler.enabled);
    assert_eq!(config.scheduler.interval_secs, 30);
    assert_eq!(config.scheduler.min_observations, 20);
    assert_eq!(config.model.n_trees, 100);
    assert_eq!(config.model.max_depth, None);
    assert_eq!(config.model.seed, 42);
    assert!(config.observability.enabled);
    assert_eq!(config.observability.interval_secs, 60);
}

#[test]
fn test_ml_port_takes_precedence() {
    let _guard = get_env_lock().lock().unwrap_or_else(|e| e.into_inner());
    clear_env();

    set("PORT", "8080");
    assert_eq!(ServerEnvConfig::from_env().unwrap().port, 8080);

    set("ML_PORT", "6001");
    let server = ServerEnvConfig::from_env().unwrap();
    assert_eq!(server.port, 6001);
    assert_eq!(server.socket_addr(), "0.0.0.0:6001");

    clear_env();
}

#[test]
fn test_scheduler_overrides() {
    let _guard = get_env_lock().lock().unwrap_or_else(|e| e.into_inner());
    clear_env();

    set("RETRAIN_INTERVAL_SECS", "5");
    set("RETRAIN_MIN_OBSERVATIONS", "40");
    set("RETRAIN_ENABLED", "false");

    let scheduler = SchedulerEnvConfig::from_env().unwrap();
    assert!(!scheduler.enabled);
    let retrain = scheduler.to_retrain_config();
    assert_eq!(retrain.interval, std::time::Duration::from_secs(5));
    assert_eq!(retrain.min_observations, 40);

    clear_env();
}

#[test]
fn test_invalid_values_are_errors() {
    let _guard = get_env_lock().lock().unwrap_or_else(|e| e.into_inner());
    clear_env();

    set("RETRAIN_INTERVAL_SECS", "0");
    assert!(SchedulerEnvConfig::from_env().is_err());

    set("RETRAIN_INTERVAL_SECS", "soon");
    let err = Config::from_env().unwrap_err();
    assert!(err.to_string().contains("RETRAIN_INTERVAL_SECS"));

    clear_env();
    set("FOREST_N_TREES", "0");
    assert!(ModelEnvConfig::from_env().is_err());

    clear_env();
    set("ML_PORT", "99999");
    assert!(ServerEnvConfig::from_env().is_err());

    clear_env();
}

#[test]
fn test_model_overrides() {
    let _guard = get_env_lock().lock().unwrap_or_else(|e| e.into_inner());
    clear_env();

    set("FOREST_N_TREES", "25");
    set("FOREST_MAX_DEPTH", "8");
    set("FOREST_SEED", "7");

    let params = ModelEnvConfig::from_env().unwrap().to_forest_params();
    assert_eq!(params.n_trees, 25);
    assert_eq!(params.max_depth, Some(8));
    assert_eq!(params.min_samples_split, 2);
    assert_eq!(params.seed, 7);

    clear_env();
}
