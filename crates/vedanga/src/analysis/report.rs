use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::analysis::cache::Cacheable;
use crate::aspects::{Aspect, SpecialAspect};
use crate::ephemeris::{Body, ChartRequest, PlanetaryPosition};
use crate::error::ErrorReport;
use crate::houses::HouseCusps;
use crate::vedic::dashas::DashaTimeline;
use crate::vedic::house_analysis::{HouseCombination, HouseStrength};
use crate::vedic::strength::StrengthResult;
use crate::vedic::vargas::DivisionalChart;
use crate::vedic::yogas::{YogaKind, YogaResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedPlanet {
    pub body: Body,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedHouse {
    pub house: u8,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedYoga {
    pub kind: YogaKind,
    pub name: String,
    pub strength: f64,
}

/// Top three planets, houses and yogas.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrimaryInfluences {
    pub planets: Vec<RankedPlanet>,
    pub houses: Vec<RankedHouse>,
    pub yogas: Vec<RankedYoga>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationSubject {
    Planet(Body),
    House(u8),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub subject: RecommendationSubject,
    pub score: f64,
    pub message: String,
}

/// Everything derived from one birth input. Never mutated once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartAnalysis {
    pub fingerprint: String,
    pub request: ChartRequest,
    pub positions: BTreeMap<Body, PlanetaryPosition>,
    pub houses: HouseCusps,
    pub aspects: Vec<Aspect>,
    pub special_aspects: Vec<SpecialAspect>,
    pub divisional_charts: Vec<DivisionalChart>,
    pub strengths: BTreeMap<Body, StrengthResult>,
    pub house_strengths: Vec<HouseStrength>,
    pub house_combinations: Vec<HouseCombination>,
    /// Top-N yogas, strongest first.
    pub yogas: Vec<YogaResult>,
    pub dasha: DashaTimeline,
    /// 0-100
    pub chart_strength: f64,
    pub primary_influences: PrimaryInfluences,
    pub recommendations: Vec<Recommendation>,
    /// Some yoga rules failed; the analysis is usable but incomplete.
    pub degraded: bool,
    pub failures: Vec<ErrorReport>,
}

impl Cacheable for ChartAnalysis {
    fn is_cacheable(&self) -> bool {
        !self.degraded
    }
}

impl ChartAnalysis {
    pub fn strength_of(&self, body: Body) -> Option<&StrengthResult> {
        self.strengths.get(&body)
    }

    pub fn house(&self, house: u8) -> Option<&HouseStrength> {
        self.house_strengths.iter().find(|h| h.house == house)
    }
}
