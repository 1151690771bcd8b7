//! Vimshottari and Yogini dasha calculations.
//!
//! Dashas are time periods ruled by planets, seeded by the Moon's nakshatra.
//! A cycle is split into major periods in a fixed lord sequence; every period
//! splits again into the same sequence starting from its own lord, in
//! proportion to the lords' years, to any depth.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::ephemeris::Body;
use crate::error::AnalysisError;
use crate::vedic::nakshatra::{nakshatra_placement, NakshatraPlacement};

pub const YEAR_DAYS: f64 = 365.25;
const MS_PER_YEAR: f64 = YEAR_DAYS * 86_400_000.0;

type LordYears = (Body, f64);

const VIMSHOTTARI_SEQUENCE: [LordYears; 9] = [
    (Body::Ketu, 7.0),
    (Body::Venus, 20.0),
    (Body::Sun, 6.0),
    (Body::Moon, 10.0),
    (Body::Mars, 7.0),
    (Body::Rahu, 18.0),
    (Body::Jupiter, 16.0),
    (Body::Saturn, 19.0),
    (Body::Mercury, 17.0),
];

// Mangala, Pingala, Dhanya, Bhramari, Bhadrika, Ulka, Siddha, Sankata
const YOGINI_SEQUENCE: [LordYears; 8] = [
    (Body::Moon, 1.0),
    (Body::Sun, 2.0),
    (Body::Jupiter, 3.0),
    (Body::Mars, 4.0),
    (Body::Mercury, 5.0),
    (Body::Saturn, 6.0),
    (Body::Venus, 7.0),
    (Body::Rahu, 8.0),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DashaSystem {
    Vimshottari,
    Yogini,
}

impl DashaSystem {
    pub fn sequence(self) -> &'static [LordYears] {
        match self {
            DashaSystem::Vimshottari => &VIMSHOTTARI_SEQUENCE,
            DashaSystem::Yogini => &YOGINI_SEQUENCE,
        }
    }

    pub fn total_years(self) -> f64 {
        self.sequence().iter().map(|(_, years)| years).sum()
    }

    /// Sequence index of the first major period for a birth nakshatra.
    pub fn start_index(self, nakshatra: usize) -> usize {
        match self {
            DashaSystem::Vimshottari => nakshatra % 9,
            DashaSystem::Yogini => (nakshatra + 3) % 8,
        }
    }

    fn position_of(self, lord: Body) -> Option<usize> {
        self.sequence().iter().position(|(body, _)| *body == lord)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DashaLevel {
    Mahadasha,
    Antardasha,
    Pratyantardasha,
    Sookshma,
    Prana,
    Deha,
}

impl DashaLevel {
    pub fn from_depth(depth: usize) -> Self {
        match depth {
            0 | 1 => DashaLevel::Mahadasha,
            2 => DashaLevel::Antardasha,
            3 => DashaLevel::Pratyantardasha,
            4 => DashaLevel::Sookshma,
            5 => DashaLevel::Prana,
            _ => DashaLevel::Deha,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashaPeriod {
    pub system: DashaSystem,
    /// Major lord first, then sub, sub-sub, ...
    pub lords: Vec<Body>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub years: f64,
    /// Mean strength percentage of the chain's lords, when strengths are known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strength: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<DashaPeriod>,
}

impl DashaPeriod {
    pub fn major(&self) -> Option<Body> {
        self.lords.first().copied()
    }

    pub fn sub(&self) -> Option<Body> {
        self.lords.get(1).copied()
    }

    pub fn sub_sub(&self) -> Option<Body> {
        self.lords.get(2).copied()
    }

    /// Innermost lord of the chain.
    pub fn lord(&self) -> Option<Body> {
        self.lords.last().copied()
    }

    pub fn depth(&self) -> usize {
        self.lords.len()
    }

    pub fn level(&self) -> DashaLevel {
        DashaLevel::from_depth(self.depth())
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }

    fn without_children(&self) -> Self {
        Self {
            children: Vec::new(),
            ..self.clone()
        }
    }
}

/// Position of an instant within the timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state")]
pub enum DashaState {
    BeforeBirth,
    Major {
        major: DashaPeriod,
    },
    Sub {
        major: DashaPeriod,
        sub: DashaPeriod,
    },
    SubSub {
        major: DashaPeriod,
        sub: DashaPeriod,
        sub_sub: DashaPeriod,
    },
    /// The first cycle has run out; see [`DashaTimeline::cycles`].
    Elapsed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashaTimeline {
    pub system: DashaSystem,
    pub birth: DateTime<Utc>,
    pub moon_longitude: f64,
    pub nakshatra: NakshatraPlacement,
    /// Remaining fraction of the first major period at birth.
    pub balance: f64,
    pub depth: usize,
    pub strengths: BTreeMap<Body, f64>,
    /// Majors of the first cycle, expanded to `depth`.
    pub periods: Vec<DashaPeriod>,
}

fn offset(birth: DateTime<Utc>, years: f64) -> DateTime<Utc> {
    birth + Duration::milliseconds((years * MS_PER_YEAR).round() as i64)
}

impl DashaTimeline {
    /// Major periods of cycle `cycle` (0 = the birth cycle), unexpanded.
    pub fn cycle_periods(&self, cycle: usize) -> Vec<DashaPeriod> {
        let len = self.system.sequence().len();
        self.cycles(cycle + 1).split_off(cycle * len)
    }

    /// Majors of the first `n` cycles, each cycle re-wrapping the sequence.
    /// Only the very first period is shortened by the birth balance.
    pub fn cycles(&self, n: usize) -> Vec<DashaPeriod> {
        let sequence = self.system.sequence();
        let start_index = self.system.start_index(self.nakshatra.index);
        let mut elapsed = 0.0;
        let mut periods = Vec::with_capacity(n * sequence.len());
        for cycle in 0..n {
            for k in 0..sequence.len() {
                let (lord, full) = sequence[(start_index + k) % sequence.len()];
                let years = if cycle == 0 && k == 0 {
                    full * self.balance
                } else {
                    full
                };
                let start = offset(self.birth, elapsed);
                elapsed += years;
                let lords = vec![lord];
                periods.push(DashaPeriod {
                    system: self.system,
                    strength: self.chain_strength(&lords),
                    lords,
                    start,
                    end: offset(self.birth, elapsed),
                    years,
                    children: Vec::new(),
                });
            }
        }
        periods
    }

    /// Split a period into the full lord sequence starting at its own lord.
    pub fn sub_periods(&self, parent: &DashaPeriod) -> Vec<DashaPeriod> {
        let sequence = self.system.sequence();
        let Some(start_index) = parent.lord().and_then(|lord| self.system.position_of(lord)) else {
            log::debug!("{:?} has no {:?} lord to split", parent.lords, self.system);
            return Vec::new();
        };
        let total = self.system.total_years();
        let span_ms = (parent.end - parent.start).num_milliseconds() as f64;
        let mut cumulative = 0.0;
        let mut start = parent.start;

        (0..sequence.len())
            .map(|k| {
                let (lord, weight) = sequence[(start_index + k) % sequence.len()];
                cumulative += weight;
                let end = if k + 1 == sequence.len() {
                    parent.end
                } else {
                    parent.start
                        + Duration::milliseconds((span_ms * cumulative / total).round() as i64)
                };
                let mut lords = parent.lords.clone();
                lords.push(lord);
                let period = DashaPeriod {
                    system: self.system,
                    strength: self.chain_strength(&lords),
                    lords,
                    start,
                    end,
                    years: parent.years * weight / total,
                    children: Vec::new(),
                };
                start = end;
                period
            })
            .collect()
    }

    /// Recursively attach children until periods reach `depth` lords.
    pub fn expand(&self, period: &mut DashaPeriod, depth: usize) {
        if period.depth() >= depth {
            return;
        }
        let mut children = self.sub_periods(period);
        for child in &mut children {
            self.expand(child, depth);
        }
        period.children = children;
    }

    /// Chain of periods (major first) containing `instant`, `depth` levels deep.
    pub fn chain_at(&self, instant: DateTime<Utc>, depth: usize) -> Option<Vec<DashaPeriod>> {
        let mut current = self.periods.iter().find(|p| p.contains(instant))?.without_children();
        let mut chain = vec![current.clone()];
        while chain.len() < depth.max(1) {
            current = self
                .sub_periods(&current)
                .into_iter()
                .find(|p| p.contains(instant))?;
            chain.push(current.clone());
        }
        Some(chain)
    }

    /// State machine view: before birth, running at some depth, or elapsed.
    pub fn active_at(&self, instant: DateTime<Utc>, depth: usize) -> DashaState {
        if instant < self.birth {
            return DashaState::BeforeBirth;
        }
        let Some(mut chain) = self.chain_at(instant, depth.clamp(1, 3)) else {
            return DashaState::Elapsed;
        };
        let sub_sub = if chain.len() > 2 { chain.pop() } else { None };
        let sub = if chain.len() > 1 { chain.pop() } else { None };
        let Some(major) = chain.pop() else {
            return DashaState::Elapsed;
        };
        match (sub, sub_sub) {
            (Some(sub), Some(sub_sub)) => DashaState::SubSub {
                major,
                sub,
                sub_sub,
            },
            (Some(sub), None) => DashaState::Sub { major, sub },
            _ => DashaState::Major { major },
        }
    }

    /// End of the birth cycle.
    pub fn end(&self) -> Option<DateTime<Utc>> {
        self.periods.last().map(|p| p.end)
    }

    fn chain_strength(&self, lords: &[Body]) -> Option<f64> {
        let known: Vec<f64> = lords
            .iter()
            .filter_map(|lord| self.strengths.get(lord).copied())
            .collect();
        if known.is_empty() {
            None
        } else {
            Some(known.iter().sum::<f64>() / known.len() as f64)
        }
    }
}

/// Deepest level expanded eagerly; deeper chains come from
/// [`DashaTimeline::sub_periods`] and [`DashaTimeline::chain_at`].
pub const MAX_DASHA_DEPTH: usize = 5;

#[derive(Debug, Clone, Copy)]
pub struct DashaEngine {
    system: DashaSystem,
    depth: usize,
}

impl DashaEngine {
    pub fn new(system: DashaSystem, depth: usize) -> Result<Self, AnalysisError> {
        if !(1..=MAX_DASHA_DEPTH).contains(&depth) {
            return Err(AnalysisError::invalid(
                "dasha_depth",
                format!("must be within [1, {MAX_DASHA_DEPTH}], got {depth}"),
            ));
        }
        Ok(Self { system, depth })
    }

    pub fn system(&self) -> DashaSystem {
        self.system
    }

    /// Timeline from the Moon's sidereal longitude at birth.
    pub fn calculate(
        &self,
        birth: DateTime<Utc>,
        moon_longitude: f64,
        strengths: &BTreeMap<Body, f64>,
    ) -> Result<DashaTimeline, AnalysisError> {
        if !moon_longitude.is_finite() {
            return Err(AnalysisError::invalid(
                "moon_longitude",
                format!("must be finite, got {moon_longitude}"),
            ));
        }
        let nakshatra = nakshatra_placement(moon_longitude);
        let mut timeline = DashaTimeline {
            system: self.system,
            birth,
            moon_longitude: nakshatra.longitude,
            balance: 1.0 - nakshatra.progress,
            nakshatra,
            depth: self.depth,
            strengths: strengths.clone(),
            periods: Vec::new(),
        };
        let mut periods = timeline.cycle_periods(0);
        for period in &mut periods {
            timeline.expand(period, self.depth);
        }
        timeline.periods = periods;
        Ok(timeline)
    }
}
