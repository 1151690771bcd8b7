//! Divisional chart (varga) helpers.
//!
//! Vargas are derived charts that divide each sign into `d` equal parts and
//! map each part onto a sign of its own. Hora (D2) and Nakshatramsa (D27)
//! follow their classical rules; every other division uses the general
//! harmonic mapping.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::analysis::cache::{Cacheable, ComputeCache};
use crate::analysis::fingerprint::Fingerprint;
use crate::analysis::metrics::{Engine, EngineMetrics};
use crate::chart::NatalChart;
use crate::ephemeris::{Ayanamsa, Body, ChartRequest, EphemerisProvider, GeoLocation};
use crate::error::AnalysisError;
use crate::houses::HouseCalculator;
use crate::vedic::nakshatra::{nakshatra_index, NAKSHATRA_SEGMENT_SIZE};
use crate::zodiac::{normalize_degrees, sign_of, SIGN_SPAN};

const LEO: u8 = 4;
const CANCER: u8 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Division {
    D1,
    D2,
    D3,
    D4,
    D7,
    D9,
    D10,
    D12,
    D16,
    D20,
    D24,
    D27,
    D30,
    D40,
    D45,
    D60,
}

impl Division {
    pub const ALL: [Division; 16] = [
        Division::D1,
        Division::D2,
        Division::D3,
        Division::D4,
        Division::D7,
        Division::D9,
        Division::D10,
        Division::D12,
        Division::D16,
        Division::D20,
        Division::D24,
        Division::D27,
        Division::D30,
        Division::D40,
        Division::D45,
        Division::D60,
    ];

    pub const fn number(self) -> u8 {
        match self {
            Division::D1 => 1,
            Division::D2 => 2,
            Division::D3 => 3,
            Division::D4 => 4,
            Division::D7 => 7,
            Division::D9 => 9,
            Division::D10 => 10,
            Division::D12 => 12,
            Division::D16 => 16,
            Division::D20 => 20,
            Division::D24 => 24,
            Division::D27 => 27,
            Division::D30 => 30,
            Division::D40 => 40,
            Division::D45 => 45,
            Division::D60 => 60,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Division::D1 => "Rasi",
            Division::D2 => "Hora",
            Division::D3 => "Drekkana",
            Division::D4 => "Chaturthamsa",
            Division::D7 => "Saptamsa",
            Division::D9 => "Navamsa",
            Division::D10 => "Dasamsa",
            Division::D12 => "Dvadasamsa",
            Division::D16 => "Shodasamsa",
            Division::D20 => "Vimsamsa",
            Division::D24 => "ChaturVimsamsa",
            Division::D27 => "Bhamsa",
            Division::D30 => "Trimsamsa",
            Division::D40 => "Khavedamsa",
            Division::D45 => "Akshavedamsa",
            Division::D60 => "Shashtiamsa",
        }
    }

    pub fn from_number(number: u8) -> Result<Self, AnalysisError> {
        Division::ALL
            .into_iter()
            .find(|d| d.number() == number)
            .ok_or_else(|| {
                AnalysisError::invalid(
                    "division",
                    format!(
                        "D{number} is not supported, expected one of {:?}",
                        Division::ALL.map(Division::number)
                    ),
                )
            })
    }
}

impl fmt::Display for Division {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "D{}", self.number())
    }
}

/// Position of one body (or the ascendant) in a divisional chart.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VargaPosition {
    pub longitude: f64,
    pub sign: u8,
    /// Index of the part of the natal sign the body falls in.
    pub part: u32,
    /// Whole-sign house from the divisional ascendant.
    pub house: u8,
    pub retrograde: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DivisionalChart {
    pub division: Division,
    pub label: String,
    pub positions: BTreeMap<Body, VargaPosition>,
    pub ascendant: f64,
    pub ascendant_sign: u8,
    pub cusps: [f64; 12],
    pub ayanamsa: Ayanamsa,
    pub timestamp: DateTime<Utc>,
    pub location: GeoLocation,
}

impl Cacheable for DivisionalChart {}

/// Part index of a longitude within its sign.
pub fn varga_part(longitude: f64, division: Division) -> u32 {
    let lon = normalize_degrees(longitude);
    match division {
        Division::D27 => nakshatra_index(lon) as u32,
        other => {
            let d = f64::from(other.number());
            ((lon % SIGN_SPAN) * d / SIGN_SPAN).floor() as u32
        }
    }
}

/// Divisional longitude of a natal longitude.
pub fn varga_longitude(longitude: f64, division: Division) -> f64 {
    let lon = normalize_degrees(longitude);
    match division {
        Division::D2 => hora_longitude(lon),
        Division::D27 => nakshatramsa_longitude(lon),
        other => general_varga_longitude(lon, other.number()),
    }
}

/// `((sign*d + part) * 360/(12d)) mod 360`. The result sits on the start of
/// the part's arc; the position inside the part is not carried over.
pub fn general_varga_longitude(longitude: f64, d: u8) -> f64 {
    let lon = normalize_degrees(longitude);
    let d = f64::from(d.max(1));
    let sign = (lon / SIGN_SPAN).floor();
    let part = ((lon % SIGN_SPAN) * d / SIGN_SPAN).floor();
    ((sign * d + part) * (360.0 / (12.0 * d))) % 360.0
}

/// First half of an even-indexed sign (Aries, Gemini, ...) is Leo's hora,
/// second half Cancer's; odd-indexed signs are reversed.
fn hora_longitude(lon: f64) -> f64 {
    let sign = sign_of(lon);
    let degree = lon % SIGN_SPAN;
    let first_half = degree < SIGN_SPAN / 2.0;
    let hora_sign = if first_half == (sign % 2 == 0) {
        LEO
    } else {
        CANCER
    };
    (f64::from(hora_sign) * SIGN_SPAN + (degree % 15.0) * 2.0) % 360.0
}

/// One sign per nakshatra, counted from Aries and wrapping after Pisces.
fn nakshatramsa_longitude(lon: f64) -> f64 {
    let index = nakshatra_index(lon);
    let within = (lon - index as f64 * NAKSHATRA_SEGMENT_SIZE).max(0.0);
    let fraction = (within / NAKSHATRA_SEGMENT_SIZE).min(1.0);
    (index as f64 * SIGN_SPAN + fraction * SIGN_SPAN) % 360.0
}

/// Pure projection of a natal chart into one division.
pub fn project_chart(natal: &NatalChart, division: Division) -> DivisionalChart {
    let ascendant = varga_longitude(natal.houses.ascendant, division);
    let ascendant_sign = sign_of(ascendant);
    let cusps: [f64; 12] = std::array::from_fn(|i| {
        (f64::from(ascendant_sign) * SIGN_SPAN + i as f64 * SIGN_SPAN) % 360.0
    });
    let positions = natal
        .positions
        .values()
        .map(|position| {
            let longitude = varga_longitude(position.longitude, division);
            let sign = sign_of(longitude);
            let house = (sign + 12 - ascendant_sign) % 12 + 1;
            (
                position.body,
                VargaPosition {
                    longitude,
                    sign,
                    part: varga_part(position.longitude, division),
                    house,
                    retrograde: position.retrograde,
                },
            )
        })
        .collect();
    DivisionalChart {
        division,
        label: division.label().to_string(),
        positions,
        ascendant,
        ascendant_sign,
        cusps,
        ayanamsa: natal.request.ayanamsa,
        timestamp: natal.request.timestamp,
        location: natal.request.location,
    }
}

/// Memoized divisional charts keyed by request fingerprint and division.
pub struct DivisionalChartEngine {
    provider: Arc<dyn EphemerisProvider>,
    houses: HouseCalculator,
    cache: ComputeCache<DivisionalChart>,
    metrics: Arc<EngineMetrics>,
}

impl DivisionalChartEngine {
    pub fn new(
        provider: Arc<dyn EphemerisProvider>,
        cache: ComputeCache<DivisionalChart>,
        metrics: Arc<EngineMetrics>,
    ) -> Self {
        Self {
            provider,
            houses: HouseCalculator::new(),
            cache,
            metrics,
        }
    }

    /// Divisional chart for a request, fetching positions on a cache miss.
    pub fn calculate_chart(
        &self,
        request: &ChartRequest,
        division: Division,
    ) -> Result<Arc<DivisionalChart>, AnalysisError> {
        request.validate()?;
        let key = Fingerprint::of_division(request, division);
        self.cache.get_or_compute(&key, || {
            self.metrics.record(Engine::Ephemeris);
            self.metrics.record(Engine::Houses);
            let natal = NatalChart::build(self.provider.as_ref(), &self.houses, request)?;
            self.metrics.record(Engine::Vargas);
            Ok(project_chart(&natal, division))
        })
    }

    /// Divisional chart of an already-built natal chart, memoized the same way.
    pub fn chart_for(
        &self,
        natal: &NatalChart,
        division: Division,
    ) -> Result<Arc<DivisionalChart>, AnalysisError> {
        let key = Fingerprint::of_division(&natal.request, division);
        self.cache.get_or_compute(&key, || {
            self.metrics.record(Engine::Vargas);
            Ok(project_chart(natal, division))
        })
    }

    pub fn cache(&self) -> &ComputeCache<DivisionalChart> {
        &self.cache
    }
}
