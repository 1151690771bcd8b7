use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ephemeris::types::{Body, BodyState, ChartRequest};

/// Errors that can occur while obtaining state vectors.
#[derive(Error, Debug)]
pub enum EphemerisError {
    #[error("Ephemeris provider {provider} unavailable: {message}")]
    Unavailable { provider: String, message: String },
    #[error("Ephemeris returned no state for {body} at {datetime}")]
    MissingBody {
        body: Body,
        datetime: DateTime<Utc>,
    },
    #[error("Ephemeris returned an invalid state for {body} at {datetime}: {message}")]
    InvalidState {
        body: Body,
        datetime: DateTime<Utc>,
        message: String,
    },
    #[error("Failed to parse ephemeris snapshot: {0}")]
    Snapshot(#[from] serde_json::Error),
}

/// Source of geocentric sidereal state vectors.
pub trait EphemerisProvider: Send + Sync {
    fn name(&self) -> &str;

    fn body_states(
        &self,
        request: &ChartRequest,
    ) -> Result<BTreeMap<Body, BodyState>, EphemerisError>;
}

/// Rejects non-finite values before any engine sees them.
pub fn check_state(
    body: Body,
    state: &BodyState,
    request: &ChartRequest,
) -> Result<(), EphemerisError> {
    let fields = [
        ("longitude", state.longitude),
        ("latitude", state.latitude),
        ("distance", state.distance),
        ("speed", state.speed),
    ];
    for (field, value) in fields {
        if !value.is_finite() {
            return Err(EphemerisError::InvalidState {
                body,
                datetime: request.timestamp,
                message: format!("{field} is not finite"),
            });
        }
    }
    Ok(())
}

/// Fixed state vectors, returned for any request.
#[derive(Debug, Clone, Default)]
pub struct StaticEphemeris {
    states: BTreeMap<Body, BodyState>,
}

impl StaticEphemeris {
    pub fn new(states: BTreeMap<Body, BodyState>) -> Self {
        Self { states }
    }

    /// Convenience constructor: direct motion at the given speeds.
    pub fn from_longitudes(entries: &[(Body, f64, f64)]) -> Self {
        let states = entries
            .iter()
            .map(|&(body, longitude, speed)| (body, BodyState::new(longitude, 0.0, 1.0, speed)))
            .collect();
        Self { states }
    }

    pub fn with(mut self, body: Body, state: BodyState) -> Self {
        self.states.insert(body, state);
        self
    }

    pub fn without(mut self, body: Body) -> Self {
        self.states.remove(&body);
        self
    }
}

impl EphemerisProvider for StaticEphemeris {
    fn name(&self) -> &str {
        "static"
    }

    fn body_states(
        &self,
        request: &ChartRequest,
    ) -> Result<BTreeMap<Body, BodyState>, EphemerisError> {
        if self.states.is_empty() {
            return Err(EphemerisError::Unavailable {
                provider: self.name().to_string(),
                message: "snapshot holds no bodies".to_string(),
            });
        }
        for (body, state) in &self.states {
            check_state(*body, state, request)?;
        }
        Ok(self.states.clone())
    }
}

/// On-disk JSON form consumed by the CLI: one request plus its state vectors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EphemerisSnapshot {
    pub request: ChartRequest,
    pub bodies: BTreeMap<Body, BodyState>,
}

impl EphemerisSnapshot {
    pub fn from_json_str(text: &str) -> Result<Self, EphemerisError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn into_provider(self) -> (ChartRequest, StaticEphemeris) {
        (self.request, StaticEphemeris::new(self.bodies))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ephemeris::types::{Ayanamsa, GeoLocation, HouseSystem};
    use chrono::TimeZone;

    fn request() -> ChartRequest {
        ChartRequest::new(
            Utc.with_ymd_and_hms(1990, 5, 17, 4, 30, 0).unwrap(),
            GeoLocation::new(28.6139, 77.209, 216.0),
            Ayanamsa::Lahiri,
            HouseSystem::WholeSign,
        )
    }

    #[test]
    fn test_static_rejects_nan() {
        let provider = StaticEphemeris::from_longitudes(&[(Body::Sun, 10.0, 1.0)])
            .with(Body::Moon, BodyState::new(f64::NAN, 0.0, 1.0, 13.0));
        let err = provider.body_states(&request()).unwrap_err();
        assert!(matches!(err, EphemerisError::InvalidState { body: Body::Moon, .. }));
    }

    #[test]
    fn test_snapshot_parse() {
        let text = r#"{
            "request": {
                "timestamp": "1990-05-17T04:30:00Z",
                "location": {"lat": 28.6139, "lon": 77.209},
                "ayanamsa": "lahiri",
                "house_system": "whole_sign"
            },
            "bodies": {
                "sun": {"longitude": 32.4, "speed": 0.96},
                "moon": {"longitude": 211.0, "speed": 13.2}
            }
        }"#;
        let snapshot = EphemerisSnapshot::from_json_str(text).unwrap();
        assert_eq!(snapshot.request, request_with_zero_alt());
        assert_eq!(snapshot.bodies.len(), 2);
        assert_eq!(snapshot.bodies[&Body::Moon].longitude, 211.0);
    }

    fn request_with_zero_alt() -> ChartRequest {
        let mut r = request();
        r.location.alt = 0.0;
        r
    }
}
