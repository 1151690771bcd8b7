use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;
use crate::zodiac::{normalize_degrees, sign_of};

/// Grahas used by the classical Vedic engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Body {
    Sun,
    Moon,
    Mars,
    Mercury,
    Jupiter,
    Venus,
    Saturn,
    Rahu,
    Ketu,
}

impl Body {
    pub const ALL: [Body; 9] = [
        Body::Sun,
        Body::Moon,
        Body::Mars,
        Body::Mercury,
        Body::Jupiter,
        Body::Venus,
        Body::Saturn,
        Body::Rahu,
        Body::Ketu,
    ];

    /// The seven visible planets, without the lunar nodes.
    pub const SEVEN: [Body; 7] = [
        Body::Sun,
        Body::Moon,
        Body::Mars,
        Body::Mercury,
        Body::Jupiter,
        Body::Venus,
        Body::Saturn,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn slug(self) -> &'static str {
        match self {
            Body::Sun => "sun",
            Body::Moon => "moon",
            Body::Mars => "mars",
            Body::Mercury => "mercury",
            Body::Jupiter => "jupiter",
            Body::Venus => "venus",
            Body::Saturn => "saturn",
            Body::Rahu => "rahu",
            Body::Ketu => "ketu",
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Body::Sun => "Sun",
            Body::Moon => "Moon",
            Body::Mars => "Mars",
            Body::Mercury => "Mercury",
            Body::Jupiter => "Jupiter",
            Body::Venus => "Venus",
            Body::Saturn => "Saturn",
            Body::Rahu => "Rahu",
            Body::Ketu => "Ketu",
        }
    }

    pub const fn is_node(self) -> bool {
        matches!(self, Body::Rahu | Body::Ketu)
    }
}

impl fmt::Display for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Body {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Body::ALL
            .into_iter()
            .find(|body| body.slug() == wanted)
            .ok_or_else(|| AnalysisError::invalid("body", format!("unknown body `{s}`")))
    }
}

/// Geographic location (WGS84 degrees, altitude in metres).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub alt: f64,
}

impl GeoLocation {
    pub fn new(lat: f64, lon: f64, alt: f64) -> Self {
        Self { lat, lon, alt }
    }

    pub fn validate(&self) -> Result<(), AnalysisError> {
        if !self.lat.is_finite() || !(-90.0..=90.0).contains(&self.lat) {
            return Err(AnalysisError::invalid(
                "latitude",
                format!("must be within [-90, 90], got {}", self.lat),
            ));
        }
        if !self.lon.is_finite() || !(-180.0..=180.0).contains(&self.lon) {
            return Err(AnalysisError::invalid(
                "longitude",
                format!("must be within [-180, 180], got {}", self.lon),
            ));
        }
        if !self.alt.is_finite() {
            return Err(AnalysisError::invalid("altitude", "must be finite"));
        }
        Ok(())
    }
}

/// Sidereal zodiac offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ayanamsa {
    Lahiri,
    Raman,
    Krishnamurti,
    FaganBradley,
}

const J2000: f64 = 2_451_545.0;
/// General precession in longitude, degrees per Julian year.
const PRECESSION_PER_YEAR: f64 = 50.290_966 / 3600.0;

impl Ayanamsa {
    pub const ALL: [Ayanamsa; 4] = [
        Ayanamsa::Lahiri,
        Ayanamsa::Raman,
        Ayanamsa::Krishnamurti,
        Ayanamsa::FaganBradley,
    ];

    pub const fn slug(self) -> &'static str {
        match self {
            Ayanamsa::Lahiri => "lahiri",
            Ayanamsa::Raman => "raman",
            Ayanamsa::Krishnamurti => "krishnamurti",
            Ayanamsa::FaganBradley => "fagan_bradley",
        }
    }

    /// Offset at J2000.0 in degrees.
    const fn at_j2000(self) -> f64 {
        match self {
            Ayanamsa::Lahiri => 23.853_0,
            Ayanamsa::Raman => 22.410_8,
            Ayanamsa::Krishnamurti => 23.757_9,
            Ayanamsa::FaganBradley => 24.740_3,
        }
    }

    /// Linear approximation of the offset at a Julian day.
    pub fn offset(self, julian_day: f64) -> f64 {
        let years = (julian_day - J2000) / 365.25;
        self.at_j2000() + years * PRECESSION_PER_YEAR
    }
}

impl fmt::Display for Ayanamsa {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for Ayanamsa {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        Ayanamsa::ALL
            .into_iter()
            .find(|a| a.slug() == wanted)
            .ok_or_else(|| {
                AnalysisError::invalid(
                    "ayanamsa",
                    format!(
                        "unknown ayanamsa `{s}`, expected one of {:?}",
                        Ayanamsa::ALL.map(Ayanamsa::slug)
                    ),
                )
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HouseSystem {
    Placidus,
    Koch,
    Equal,
    WholeSign,
    Regiomontanus,
    Campanus,
}

impl HouseSystem {
    pub const ALL: [HouseSystem; 6] = [
        HouseSystem::Placidus,
        HouseSystem::Koch,
        HouseSystem::Equal,
        HouseSystem::WholeSign,
        HouseSystem::Regiomontanus,
        HouseSystem::Campanus,
    ];

    pub const fn slug(self) -> &'static str {
        match self {
            HouseSystem::Placidus => "placidus",
            HouseSystem::Koch => "koch",
            HouseSystem::Equal => "equal",
            HouseSystem::WholeSign => "whole_sign",
            HouseSystem::Regiomontanus => "regiomontanus",
            HouseSystem::Campanus => "campanus",
        }
    }

    /// Systems whose cusps come from time-trisection of diurnal arcs.
    pub const fn is_time_based(self) -> bool {
        matches!(self, HouseSystem::Placidus | HouseSystem::Koch)
    }
}

impl fmt::Display for HouseSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for HouseSystem {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        HouseSystem::ALL
            .into_iter()
            .find(|h| h.slug() == wanted)
            .ok_or_else(|| {
                AnalysisError::invalid(
                    "house_system",
                    format!(
                        "unknown house system `{s}`, expected one of {:?}",
                        HouseSystem::ALL.map(HouseSystem::slug)
                    ),
                )
            })
    }
}

/// One birth input: the unit every cache is keyed on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartRequest {
    pub timestamp: DateTime<Utc>,
    pub location: GeoLocation,
    pub ayanamsa: Ayanamsa,
    pub house_system: HouseSystem,
}

impl ChartRequest {
    pub fn new(
        timestamp: DateTime<Utc>,
        location: GeoLocation,
        ayanamsa: Ayanamsa,
        house_system: HouseSystem,
    ) -> Self {
        Self {
            timestamp,
            location,
            ayanamsa,
            house_system,
        }
    }

    pub fn validate(&self) -> Result<(), AnalysisError> {
        self.location.validate()
    }

    /// Julian day (UT) of the request instant.
    pub fn julian_day(&self) -> f64 {
        self.timestamp.timestamp_millis() as f64 / 86_400_000.0 + 2_440_587.5
    }

    pub fn ayanamsa_offset(&self) -> f64 {
        self.ayanamsa.offset(self.julian_day())
    }
}

/// Raw state vector from an ephemeris provider. Longitudes are sidereal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodyState {
    pub longitude: f64,
    #[serde(default)]
    pub latitude: f64,
    #[serde(default)]
    pub distance: f64,
    /// Degrees per day; negative means retrograde.
    pub speed: f64,
}

impl BodyState {
    pub fn new(longitude: f64, latitude: f64, distance: f64, speed: f64) -> Self {
        Self {
            longitude,
            latitude,
            distance,
            speed,
        }
    }
}

/// Immutable per-body snapshot shared by every engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlanetaryPosition {
    pub body: Body,
    /// Sidereal longitude in [0, 360).
    pub longitude: f64,
    pub latitude: f64,
    pub distance: f64,
    pub speed: f64,
    pub retrograde: bool,
    /// 0 = Aries .. 11 = Pisces.
    pub sign: u8,
    /// 1..=12
    pub house: u8,
}

impl PlanetaryPosition {
    pub fn from_state(body: Body, state: &BodyState, house: u8) -> Self {
        let longitude = normalize_degrees(state.longitude);
        Self {
            body,
            longitude,
            latitude: state.latitude,
            distance: state.distance,
            speed: state.speed,
            retrograde: state.speed < 0.0,
            sign: sign_of(longitude),
            house,
        }
    }
}
