//! HTTP transport for the forecasting service.
//!
//! Routes:
//! - `POST /predict` ingest a history snapshot and forecast the next price
//! - `GET /data/{symbol}` stored history for a symbol
//! - `GET /models/{symbol}` model status for a symbol
//! - `GET /health` liveness and population counts

use crate::application::forecast_service::ForecastService;
use crate::domain::errors::ForecastError;
use crate::domain::market::observation::Observation;
use crate::domain::ml::prediction::IngestOutcome;
use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, error};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct ApiState {
    pub service: Arc<ForecastService>,
    pub started_at: Instant,
}

/// Body of `POST /predict`. Both fields are checked by the service, so a
/// missing field reports the same error as an empty one.
#[derive(Debug, Default, Deserialize)]
pub struct PredictRequest {
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub data: Option<Vec<Observation>>,
}

pub fn router(service: Arc<ForecastService>) -> Router {
    let state = ApiState {
        service,
        started_at: Instant::now(),
    };

    Router::new()
        .route("/predict", post(predict_handler))
        .route("/data/{symbol}", get(history_handler))
        .route("/models/{symbol}", get(model_status_handler))
        .route("/health", get(health_handler))
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .with_state(state)
}

/// POST /predict
pub async fn predict_handler(
    State(state): State<ApiState>,
    payload: Result<Json<PredictRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            debug!("Rejected predict body: {}", rejection.body_text());
            return error_response(ForecastError::invalid_input(rejection.body_text()));
        }
    };
    let symbol = request.symbol.unwrap_or_default();
    let data = request.data.unwrap_or_default();
    debug!("Received predict request for {} ({} observations)", symbol, data.len());

    let service = state.service.clone();
    let result =
        tokio::task::spawn_blocking(move || service.ingest_and_predict(&symbol, data)).await;

    match result {
        Ok(Ok(IngestOutcome::Predicted(prediction))) => {
            (StatusCode::OK, Json(prediction)).into_response()
        }
        Ok(Ok(IngestOutcome::PendingTraining { reason })) => (
            StatusCode::OK,
            Json(json!({ "error": reason, "status": "pending_training" })),
        )
            .into_response(),
        Ok(Ok(IngestOutcome::NotReady { reason })) => (
            StatusCode::OK,
            Json(json!({ "error": reason, "status": "not_ready" })),
        )
            .into_response(),
        Ok(Err(e)) => error_response(e),
        Err(e) => {
            error!("Predict task failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "prediction task failed" })),
            )
                .into_response()
        }
    }
}

/// GET /data/{symbol}
pub async fn history_handler(
    State(state): State<ApiState>,
    Path(symbol): Path<String>,
) -> Response {
    match state.service.read_history(&symbol) {
        Ok(sequence) => (StatusCode::OK, Json(sequence.as_ref().clone())).into_response(),
        Err(ForecastError::NotFound { .. }) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "No data for this symbol" })),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

/// GET /models/{symbol}
pub async fn model_status_handler(
    State(state): State<ApiState>,
    Path(symbol): Path<String>,
) -> Response {
    match state.service.model_status(&symbol) {
        Some(status) => (StatusCode::OK, Json(status)).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "No model for this symbol" })),
        )
            .into_response(),
    }
}

/// GET /health
pub async fn health_handler(State(state): State<ApiState>) -> Response {
    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "symbols_tracked": state.service.symbols_tracked(),
            "models_fitted": state.service.models_fitted(),
            "uptime_seconds": state.started_at.elapsed().as_secs(),
        })),
    )
        .into_response()
}

fn error_response(err: ForecastError) -> Response {
    let status = match &err {
        ForecastError::InvalidInput { .. } => StatusCode::BAD_REQUEST,
        ForecastError::NotFound { .. } => StatusCode::NOT_FOUND,
        ForecastError::InsufficientData { .. } | ForecastError::NotFitted { .. } => StatusCode::OK,
        ForecastError::Estimator { .. } => {
            error!("Estimator failure: {}", err);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, Json(json!({ "error": err.to_string() }))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::market_data::history_store::HistoryStore;
    use crate::application::ml::model_registry::ModelRegistry;
    use crate::application::ml::random_forest::{RandomForestEstimator, RandomForestParams};
    use crate::infrastructure::observability::Metrics;
    use axum::body::Body;
    use axum::extract::FromRequest;
    use axum::http::Request;
    use chrono::{Duration, TimeZone, Utc};
    use serde_json::Value;

    fn state() -> ApiState {
        let estimator = RandomForestEstimator::new(RandomForestParams {
            n_trees: 10,
            ..Default::default()
        });
        ApiState {
            service: Arc::new(ForecastService::new(
                Arc::new(HistoryStore::new()),
                Arc::new(ModelRegistry::new(Arc::new(estimator))),
                Metrics::new().unwrap(),
            )),
            started_at: Instant::now(),
        }
    }

    fn ramp(symbol: &str, n: usize) -> Vec<Observation> {
        let start = Utc.with_ymd_and_hms(2024, 6, 3, 13, 30, 0).unwrap();
        (0..n)
            .map(|i| {
                Observation::new(
                    symbol,
                    100.0 + i as f64,
                    10.0 + i as f64,
                    start + Duration::minutes(i as i64),
                )
            })
            .collect()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn predict(state: &ApiState, symbol: Option<&str>, data: Option<Vec<Observation>>) -> Response {
        predict_handler(
            State(state.clone()),
            Ok(Json(PredictRequest {
                symbol: symbol.map(str::to_string),
                data,
            })),
        )
        .await
    }

    async fn predict_raw(state: &ApiState, body: &'static str) -> Response {
        let request = Request::builder()
            .method("POST")
            .uri("/predict")
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap();
        let payload = Json::<PredictRequest>::from_request(request, &()).await;
        predict_handler(State(state.clone()), payload).await
    }

    #[tokio::test]
    async fn test_missing_fields_are_bad_request() {
        let state = state();

        let response = predict(&state, None, Some(ramp("AAA", 20))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("Symbol and data required"));

        let response = predict(&state, Some("AAA"), None).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_malformed_body_is_json_bad_request() {
        let state = state();

        for body in [
            r#"{"symbol": "AAA", "data": [{"price": 1.0, "volume": 2.0}]}"#,
            r#"{"symbol": "AAA", "data": [{"price": "high", "volume": 2.0, "timestamp": "2024-06-03T13:30:00Z"}]}"#,
            r#"{"symbol": "AAA", "data": "not a list"}"#,
            "not json",
        ] {
            let response = predict_raw(&state, body).await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body: {}", body);
            let json = body_json(response).await;
            assert!(
                json["error"].as_str().unwrap().starts_with("Invalid input:"),
                "body: {}",
                body
            );
        }
        assert_eq!(state.service.symbols_tracked(), 0);
    }

    #[tokio::test]
    async fn test_pending_training_response() {
        let state = state();
        let response = predict(&state, Some("AAA"), Some(ramp("AAA", 10))).await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "pending_training");
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_prediction_response() {
        let state = state();
        let response = predict(&state, Some("BBB"), Some(ramp("BBB", 25))).await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["symbol"], "BBB");
        assert_eq!(body["current_price"], 124.0);
        assert!(body["predicted_price"].is_number());
        assert!(body["predicted_change_percent"].is_number());
        assert!(body["timestamp"].is_string());
    }

    #[tokio::test]
    async fn test_history_round_trip_and_not_found() {
        let state = state();
        let data = ramp("AAA", 10);
        predict(&state, Some("AAA"), Some(data.clone())).await;

        let response = history_handler(State(state.clone()), Path("AAA".to_string())).await;
        assert_eq!(response.status(), StatusCode::OK);
        let stored: Vec<Observation> = serde_json::from_value(body_json(response).await).unwrap();
        assert_eq!(stored, data);

        let response = history_handler(State(state.clone()), Path("ZZZ".to_string())).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["error"], "No data for this symbol");
    }

    #[tokio::test]
    async fn test_model_status_and_health() {
        let state = state();
        let response = model_status_handler(State(state.clone()), Path("BBB".to_string())).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        predict(&state, Some("BBB"), Some(ramp("BBB", 25))).await;

        let response = model_status_handler(State(state.clone()), Path("BBB".to_string())).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["fitted"], true);
        assert_eq!(body["trained_rows"], 20);

        let body = body_json(health_handler(State(state)).await).await;
        assert_eq!(body["symbols_tracked"], 1);
        assert_eq!(body["models_fitted"], 1);
    }
}
