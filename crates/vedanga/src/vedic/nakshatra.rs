//! Nakshatra utilities.
//!
//! Nakshatras are 27 lunar mansions, each spanning 13°20' (360/27 degrees).
//! Each nakshatra is divided into 4 padas (quarters).

use serde::{Deserialize, Serialize};

use crate::ephemeris::Body;
use crate::zodiac::normalize_degrees;

pub const NAKSHATRA_SEGMENT_SIZE: f64 = 360.0 / 27.0;
pub const PADA_SIZE: f64 = NAKSHATRA_SEGMENT_SIZE / 4.0;

// (display name, planetary lord)
pub const NAKSHATRA_ORDER: [(&str, Body); 27] = [
    ("Ashwini", Body::Ketu),
    ("Bharani", Body::Venus),
    ("Krittika", Body::Sun),
    ("Rohini", Body::Moon),
    ("Mrigashira", Body::Mars),
    ("Ardra", Body::Rahu),
    ("Punarvasu", Body::Jupiter),
    ("Pushya", Body::Saturn),
    ("Ashlesha", Body::Mercury),
    ("Magha", Body::Ketu),
    ("Purva Phalguni", Body::Venus),
    ("Uttara Phalguni", Body::Sun),
    ("Hasta", Body::Moon),
    ("Chitra", Body::Mars),
    ("Swati", Body::Rahu),
    ("Vishakha", Body::Jupiter),
    ("Anuradha", Body::Saturn),
    ("Jyeshtha", Body::Mercury),
    ("Mula", Body::Ketu),
    ("Purva Ashadha", Body::Venus),
    ("Uttara Ashadha", Body::Sun),
    ("Shravana", Body::Moon),
    ("Dhanishta", Body::Mars),
    ("Shatabhisha", Body::Rahu),
    ("Purva Bhadrapada", Body::Jupiter),
    ("Uttara Bhadrapada", Body::Saturn),
    ("Revati", Body::Mercury),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NakshatraPlacement {
    pub longitude: f64,
    /// 0 = Ashwini .. 26 = Revati
    pub index: usize,
    pub name: String,
    pub lord: Body,
    pub start_degree: f64,
    pub end_degree: f64,
    /// Fraction of the nakshatra already traversed, in [0, 1).
    pub progress: f64,
    /// 1..=4
    pub pada: u8,
    pub pada_fraction: f64,
}

/// Nakshatra index of a longitude: `floor(lon * 27 / 360)`.
pub fn nakshatra_index(longitude: f64) -> usize {
    let lon = normalize_degrees(longitude);
    ((lon * 27.0 / 360.0).floor() as usize).min(26)
}

pub fn nakshatra_placement(longitude: f64) -> NakshatraPlacement {
    let lon = normalize_degrees(longitude);
    let index = nakshatra_index(lon);
    let (name, lord) = NAKSHATRA_ORDER[index];
    let start_degree = index as f64 * NAKSHATRA_SEGMENT_SIZE;
    let offset = (lon - start_degree).max(0.0);
    let progress = (offset / NAKSHATRA_SEGMENT_SIZE).min(1.0 - f64::EPSILON);
    let pada_position = offset / PADA_SIZE;
    let pada = (pada_position.floor() as u8).min(3) + 1;
    NakshatraPlacement {
        longitude: lon,
        index,
        name: name.to_string(),
        lord,
        start_degree,
        end_degree: start_degree + NAKSHATRA_SEGMENT_SIZE,
        progress,
        pada,
        pada_fraction: pada_position - f64::from(pada - 1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_nakshatra() {
        let placement = nakshatra_placement(0.0);
        assert_eq!(placement.index, 0);
        assert_eq!(placement.name, "Ashwini");
        assert_eq!(placement.lord, Body::Ketu);
        assert_eq!(placement.pada, 1);
        assert_eq!(placement.progress, 0.0);
    }

    #[test]
    fn test_last_nakshatra_and_pada() {
        let placement = nakshatra_placement(359.9);
        assert_eq!(placement.index, 26);
        assert_eq!(placement.name, "Revati");
        assert_eq!(placement.pada, 4);
    }

    #[test]
    fn test_progress_midway() {
        let placement = nakshatra_placement(NAKSHATRA_SEGMENT_SIZE * 3.6);
        assert_eq!(placement.index, 3);
        assert!((placement.progress - 0.6).abs() < 1e-9);
        assert_eq!(placement.pada, 3);
    }
}
