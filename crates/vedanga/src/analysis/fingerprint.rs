//! Content-addressed cache keys.

use std::fmt;

use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::ephemeris::ChartRequest;
use crate::vedic::vargas::Division;

/// Bumped whenever the canonical form below changes.
const FINGERPRINT_VERSION: u32 = 1;

/// SHA-256 over the canonical form of a request, hex encoded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Key for a full chart analysis.
    pub fn of_request(request: &ChartRequest) -> Self {
        Self::compute(&canonical(request, None))
    }

    /// Key for one divisional chart of a request.
    pub fn of_division(request: &ChartRequest, division: Division) -> Self {
        Self::compute(&canonical(request, Some(division)))
    }

    pub(crate) fn compute(canonical: &str) -> Self {
        let digest = Sha256::digest(canonical.as_bytes());
        Self(hex::encode(digest))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn canonical(request: &ChartRequest, division: Option<Division>) -> String {
    let mut text = format!(
        "v{}|ts={}|lat={}|lon={}|alt={}|ayanamsa={}|houses={}",
        FINGERPRINT_VERSION,
        request
            .timestamp
            .to_rfc3339_opts(SecondsFormat::Nanos, true),
        fixed(request.location.lat, 9),
        fixed(request.location.lon, 9),
        fixed(request.location.alt, 3),
        request.ayanamsa.slug(),
        request.house_system.slug(),
    );
    if let Some(division) = division {
        text.push_str(&format!("|division=D{}", division.number()));
    }
    text
}

/// Fixed-point text with negative zero folded into zero, so `-0.0` and
/// values rounding to it share a key with `0.0`.
fn fixed(value: f64, precision: usize) -> String {
    let text = format!("{value:.precision$}");
    match text.strip_prefix('-') {
        Some(unsigned) if unsigned.bytes().all(|b| b == b'0' || b == b'.') => unsigned.to_string(),
        _ => text,
    }
}
