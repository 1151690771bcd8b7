#![allow(dead_code)]

use chrono::{TimeZone, Utc};
use vedanga::{Ayanamsa, Body, BodyState, ChartRequest, GeoLocation, HouseSystem, StaticEphemeris};

/// New Delhi, 17 May 1990 04:30 UTC.
pub fn delhi_request() -> ChartRequest {
    ChartRequest::new(
        Utc.with_ymd_and_hms(1990, 5, 17, 4, 30, 0).unwrap(),
        GeoLocation::new(28.6139, 77.209, 216.0),
        Ayanamsa::Lahiri,
        HouseSystem::WholeSign,
    )
}

/// Sidereal positions for every body, Saturn and the nodes retrograde.
pub fn delhi_ephemeris() -> StaticEphemeris {
    StaticEphemeris::from_longitudes(&[
        (Body::Sun, 32.4, 0.96),
        (Body::Moon, 211.0, 13.2),
        (Body::Mars, 330.5, 0.72),
        (Body::Mercury, 45.1, 1.4),
        (Body::Jupiter, 84.2, 0.23),
        (Body::Venus, 5.7, 1.2),
        (Body::Rahu, 298.0, -0.053),
        (Body::Ketu, 118.0, -0.053),
    ])
    .with(Body::Saturn, BodyState::new(270.3, 0.4, 10.1, -0.02))
}

pub fn position_state(longitude: f64, speed: f64) -> BodyState {
    BodyState::new(longitude, 0.0, 1.0, speed)
}
