use crate::domain::errors::ForecastError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One timestamped (price, volume) data point for a symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Filled from the request symbol when a producer omits it.
    #[serde(default)]
    pub symbol: String,
    pub price: f64,
    pub volume: f64,
    pub timestamp: DateTime<Utc>,
}

impl Observation {
    pub fn new(symbol: impl Into<String>, price: f64, volume: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            symbol: symbol.into(),
            price,
            volume,
            timestamp,
        }
    }
}

/// Ordered (timestamp ascending) history of a single symbol.
///
/// Shared behind an `Arc` so readers take cheap point-in-time snapshots
/// while writers swap in a whole new sequence.
pub type ObservationSequence = Arc<Vec<Observation>>;

/// Returns a copy of `observations` ordered by timestamp.
///
/// The sort is stable, so observations sharing a timestamp keep their
/// submission order. Duplicates are kept.
pub fn sorted_by_timestamp(observations: &[Observation]) -> Vec<Observation> {
    let mut sorted = observations.to_vec();
    sorted.sort_by_key(|o| o.timestamp);
    sorted
}

/// Validates an ingestion batch for `symbol` and returns it in timestamp order.
///
/// Rejects an empty symbol, an empty batch, observations tagged with another
/// symbol, non-finite prices or volumes, and negative volumes. Untagged
/// observations adopt `symbol`.
pub fn prepare_batch(
    symbol: &str,
    observations: Vec<Observation>,
) -> Result<Vec<Observation>, ForecastError> {
    if symbol.trim().is_empty() || observations.is_empty() {
        return Err(ForecastError::invalid_input("Symbol and data required"));
    }

    let mut batch = Vec::with_capacity(observations.len());
    for (idx, mut obs) in observations.into_iter().enumerate() {
        if obs.symbol.is_empty() {
            obs.symbol = symbol.to_string();
        } else if obs.symbol != symbol {
            return Err(ForecastError::invalid_input(format!(
                "observation {} belongs to {}, expected {}",
                idx, obs.symbol, symbol
            )));
        }

        if !obs.price.is_finite() || !obs.volume.is_finite() {
            return Err(ForecastError::invalid_input(format!(
                "observation {} has a non-finite price or volume",
                idx
            )));
        }

        if obs.volume < 0.0 {
            return Err(ForecastError::invalid_input(format!(
                "observation {} has negative volume {}",
                idx, obs.volume
            )));
        }

        batch.push(obs);
    }

    batch.sort_by_key(|o| o.timestamp);
    Ok(batch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn ts(minutes: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 2, 9, 30, 0).unwrap() + Duration::minutes(minutes)
    }

    #[test]
    fn test_prepare_batch_sorts_and_tags() {
        let batch = vec![
            Observation::new("", 101.0, 11.0, ts(1)),
            Observation::new("AAPL", 100.0, 10.0, ts(0)),
            Observation::new("", 102.0, 12.0, ts(2)),
        ];

        let prepared = prepare_batch("AAPL", batch).unwrap();

        let prices: Vec<f64> = prepared.iter().map(|o| o.price).collect();
        assert_eq!(prices, vec![100.0, 101.0, 102.0]);
        assert!(prepared.iter().all(|o| o.symbol == "AAPL"));
    }

    #[test]
    fn test_prepare_batch_keeps_duplicate_timestamps() {
        let batch = vec![
            Observation::new("AAPL", 100.0, 10.0, ts(0)),
            Observation::new("AAPL", 100.5, 10.0, ts(0)),
        ];

        let prepared = prepare_batch("AAPL", batch).unwrap();
        assert_eq!(prepared.len(), 2);
        assert_eq!(prepared[0].price, 100.0);
        assert_eq!(prepared[1].price, 100.5);
    }

    #[test]
    fn test_prepare_batch_rejects_missing_fields() {
        let obs = vec![Observation::new("AAPL", 100.0, 10.0, ts(0))];

        assert!(matches!(
            prepare_batch("", obs.clone()),
            Err(ForecastError::InvalidInput { .. })
        ));
        assert!(matches!(
            prepare_batch("AAPL", vec![]),
            Err(ForecastError::InvalidInput { .. })
        ));
        assert!(prepare_batch("AAPL", obs).is_ok());
    }

    #[test]
    fn test_prepare_batch_rejects_foreign_symbol() {
        let batch = vec![
            Observation::new("AAPL", 100.0, 10.0, ts(0)),
            Observation::new("MSFT", 300.0, 10.0, ts(1)),
        ];

        let err = prepare_batch("AAPL", batch).unwrap_err();
        assert!(err.to_string().contains("MSFT"));
    }

    #[test]
    fn test_prepare_batch_rejects_non_finite_price() {
        let batch = vec![Observation::new("AAPL", f64::NAN, 10.0, ts(0))];
        assert!(matches!(
            prepare_batch("AAPL", batch),
            Err(ForecastError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_prepare_batch_rejects_negative_volume() {
        let batch = vec![
            Observation::new("AAPL", 100.0, 0.0, ts(0)),
            Observation::new("AAPL", 101.0, -5.0, ts(1)),
        ];

        let err = prepare_batch("AAPL", batch).unwrap_err();
        assert!(matches!(err, ForecastError::InvalidInput { .. }));
        assert!(err.to_string().contains("negative volume"));

        let zero_volume = vec![Observation::new("AAPL", 100.0, 0.0, ts(0))];
        assert!(prepare_batch("AAPL", zero_volume).is_ok());
    }

    #[test]
    fn test_observation_json_shape() {
        let json = r#"{"price": 101.5, "volume": 1200, "timestamp": "2024-01-02T09:30:00Z"}"#;
        let obs: Observation = serde_json::from_str(json).unwrap();

        assert_eq!(obs.symbol, "");
        assert_eq!(obs.price, 101.5);
        assert_eq!(obs.volume, 1200.0);
        assert_eq!(obs.timestamp, ts(0));
    }
}
