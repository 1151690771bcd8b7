//! Yoga detection.
//!
//! Yogas are planetary combinations that indicate specific life outcomes.
//! Each yoga is a [`YogaDefinition`] pairing a kind with a declarative
//! [`YogaRule`]; rules are evaluated independently, so one failing rule
//! only removes its own yoga from the result.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::aspects::Aspect;
use crate::chart::NatalChart;
use crate::ephemeris::{Body, PlanetaryPosition};
use crate::error::{AnalysisError, ErrorReport};
use crate::vedic::dignity::{DignityTables, MAX_DIGNITY_SCORE};
use crate::zodiac::{is_kendra, is_trikona, DUSTHANA, KENDRA, TRIKONA};

const ASPECT_BONUS: f64 = 3.0;
const KENDRA_BONUS: f64 = 3.0;
const TRIKONA_BONUS: f64 = 2.0;
const MAX_PER_PLANET: f64 = MAX_DIGNITY_SCORE + ASPECT_BONUS + KENDRA_BONUS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum YogaCategory {
    Benefic,
    Malefic,
    Mixed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum YogaKind {
    Raja,
    GajaKesari,
    BudhaAditya,
    Dhana,
    ChandraMangala,
    Ruchaka,
    Bhadra,
    Hamsa,
    Malavya,
    Sasa,
    NeechaBhanga,
    ViparitaRaja,
    Kemadruma,
}

impl YogaKind {
    pub const fn name(self) -> &'static str {
        match self {
            YogaKind::Raja => "Raja Yoga",
            YogaKind::GajaKesari => "Gaja Kesari Yoga",
            YogaKind::BudhaAditya => "Budha Aditya Yoga",
            YogaKind::Dhana => "Dhana Yoga",
            YogaKind::ChandraMangala => "Chandra Mangala Yoga",
            YogaKind::Ruchaka => "Ruchaka Yoga",
            YogaKind::Bhadra => "Bhadra Yoga",
            YogaKind::Hamsa => "Hamsa Yoga",
            YogaKind::Malavya => "Malavya Yoga",
            YogaKind::Sasa => "Sasa Yoga",
            YogaKind::NeechaBhanga => "Neecha Bhanga Raja Yoga",
            YogaKind::ViparitaRaja => "Viparita Raja Yoga",
            YogaKind::Kemadruma => "Kemadruma Yoga",
        }
    }

    pub const fn category(self) -> YogaCategory {
        match self {
            YogaKind::Kemadruma => YogaCategory::Malefic,
            YogaKind::ChandraMangala | YogaKind::ViparitaRaja => YogaCategory::Mixed,
            _ => YogaCategory::Benefic,
        }
    }

    pub const fn description(self) -> &'static str {
        match self {
            YogaKind::Raja => "A trine lord in close aspect with a quadrant lord",
            YogaKind::GajaKesari => "Jupiter in a quadrant from the Moon",
            YogaKind::BudhaAditya => "Sun and Mercury in the same sign",
            YogaKind::Dhana => "Lords of the 2nd and 11th houses together",
            YogaKind::ChandraMangala => "Moon and Mars in the same sign",
            YogaKind::Ruchaka => "Mars in a quadrant in its own or exaltation sign",
            YogaKind::Bhadra => "Mercury in a quadrant in its own or exaltation sign",
            YogaKind::Hamsa => "Jupiter in a quadrant in its own or exaltation sign",
            YogaKind::Malavya => "Venus in a quadrant in its own or exaltation sign",
            YogaKind::Sasa => "Saturn in a quadrant in its own or exaltation sign",
            YogaKind::NeechaBhanga => {
                "A debilitated planet whose sign lord or exaltation lord holds a quadrant"
            }
            YogaKind::ViparitaRaja => "A lord of the 6th, 8th or 12th placed in a dusthana",
            YogaKind::Kemadruma => "No planet in the 2nd or 12th sign from the Moon",
        }
    }

    pub const fn effects(self) -> &'static [&'static str] {
        match self {
            YogaKind::Raja => &["authority", "recognition"],
            YogaKind::GajaKesari => &["wisdom", "reputation"],
            YogaKind::BudhaAditya => &["intelligence", "skill in speech"],
            YogaKind::Dhana => &["wealth accumulation"],
            YogaKind::ChandraMangala => &["earning through enterprise", "restlessness"],
            YogaKind::Ruchaka => &["courage", "leadership"],
            YogaKind::Bhadra => &["eloquence", "learning"],
            YogaKind::Hamsa => &["righteousness", "respect"],
            YogaKind::Malavya => &["comfort", "artistic refinement"],
            YogaKind::Sasa => &["discipline", "command over people"],
            YogaKind::NeechaBhanga => &["rise after setbacks"],
            YogaKind::ViparitaRaja => &["gain through adversity"],
            YogaKind::Kemadruma => &["isolation", "financial strain"],
        }
    }
}

/// Declarative yoga conditions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum YogaRule {
    /// A lord of `lords_of` within `max_orb` of an aspect with a distinct lord
    /// of `with_lords_of`.
    LordsInAspect {
        lords_of: &'static [u8],
        with_lords_of: &'static [u8],
        max_orb: f64,
    },
    /// `planet` in a quadrant counted from the Moon's sign.
    KendraFromMoon { planet: Body },
    SameSign { planets: [Body; 2] },
    /// Lords of both houses occupy the same house.
    LordsConjoined { houses: [u8; 2] },
    /// Angular and in own or exaltation sign.
    Mahapurusha { planet: Body },
    DebilitationCancelled,
    /// A lord of any of `lords_of` placed in any of `houses`.
    LordsInHouses {
        lords_of: &'static [u8],
        houses: &'static [u8],
    },
    /// No planet besides the Sun and the nodes flanks the Moon.
    UnsupportedMoon,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YogaDefinition {
    pub kind: YogaKind,
    pub rule: YogaRule,
}

pub static CLASSICAL_YOGAS: &[YogaDefinition] = &[
    YogaDefinition {
        kind: YogaKind::Raja,
        rule: YogaRule::LordsInAspect {
            lords_of: &TRIKONA,
            with_lords_of: &KENDRA,
            max_orb: 3.0,
        },
    },
    YogaDefinition {
        kind: YogaKind::GajaKesari,
        rule: YogaRule::KendraFromMoon {
            planet: Body::Jupiter,
        },
    },
    YogaDefinition {
        kind: YogaKind::BudhaAditya,
        rule: YogaRule::SameSign {
            planets: [Body::Sun, Body::Mercury],
        },
    },
    YogaDefinition {
        kind: YogaKind::Dhana,
        rule: YogaRule::LordsConjoined { houses: [2, 11] },
    },
    YogaDefinition {
        kind: YogaKind::ChandraMangala,
        rule: YogaRule::SameSign {
            planets: [Body::Moon, Body::Mars],
        },
    },
    YogaDefinition {
        kind: YogaKind::Ruchaka,
        rule: YogaRule::Mahapurusha { planet: Body::Mars },
    },
    YogaDefinition {
        kind: YogaKind::Bhadra,
        rule: YogaRule::Mahapurusha {
            planet: Body::Mercury,
        },
    },
    YogaDefinition {
        kind: YogaKind::Hamsa,
        rule: YogaRule::Mahapurusha {
            planet: Body::Jupiter,
        },
    },
    YogaDefinition {
        kind: YogaKind::Malavya,
        rule: YogaRule::Mahapurusha {
            planet: Body::Venus,
        },
    },
    YogaDefinition {
        kind: YogaKind::Sasa,
        rule: YogaRule::Mahapurusha {
            planet: Body::Saturn,
        },
    },
    YogaDefinition {
        kind: YogaKind::NeechaBhanga,
        rule: YogaRule::DebilitationCancelled,
    },
    YogaDefinition {
        kind: YogaKind::ViparitaRaja,
        rule: YogaRule::LordsInHouses {
            lords_of: &DUSTHANA,
            houses: &DUSTHANA,
        },
    },
    YogaDefinition {
        kind: YogaKind::Kemadruma,
        rule: YogaRule::UnsupportedMoon,
    },
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YogaResult {
    pub kind: YogaKind,
    pub name: String,
    pub category: YogaCategory,
    pub planets: Vec<Body>,
    pub houses: Vec<u8>,
    /// 0-100
    pub strength: f64,
    pub description: String,
    pub effects: Vec<String>,
}

/// Detected yogas plus the rules that could not be evaluated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct YogaDetection {
    pub yogas: Vec<YogaResult>,
    pub failures: Vec<ErrorReport>,
}

impl YogaDetection {
    pub fn is_degraded(&self) -> bool {
        !self.failures.is_empty()
    }

    /// Strongest `n` yogas.
    pub fn top(&self, n: usize) -> Vec<YogaResult> {
        self.yogas.iter().take(n).cloned().collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct YogaMatch {
    planets: Vec<Body>,
    houses: Vec<u8>,
}

struct YogaContext<'a> {
    natal: &'a NatalChart,
    aspects: &'a [Aspect],
    tables: &'a DignityTables,
}

impl<'a> YogaContext<'a> {
    fn require(&self, body: Body) -> Result<&'a PlanetaryPosition, AnalysisError> {
        self.natal.require(body, "yoga")
    }

    fn lord_of(&self, house: u8) -> Body {
        self.tables.sign_lord(self.natal.houses.sign_of_house(house))
    }

    fn aspect_between(&self, a: Body, b: Body) -> Option<&'a Aspect> {
        self.aspects
            .iter()
            .find(|aspect| aspect.involves(a) && aspect.partner_of(a) == Some(b))
    }
}

/// Inclusive sign count from `from` to `to`: the same sign is the 1st.
fn sign_count(from: u8, to: u8) -> u8 {
    (to + 12 - from) % 12 + 1
}

#[derive(Debug, Clone)]
pub struct YogaDetector {
    definitions: Vec<YogaDefinition>,
    tables: Arc<DignityTables>,
}

impl YogaDetector {
    pub fn new(tables: Arc<DignityTables>) -> Self {
        Self::with_definitions(tables, CLASSICAL_YOGAS.to_vec())
    }

    pub fn with_definitions(tables: Arc<DignityTables>, definitions: Vec<YogaDefinition>) -> Self {
        Self {
            definitions,
            tables,
        }
    }

    pub fn definitions(&self) -> &[YogaDefinition] {
        &self.definitions
    }

    /// Evaluate every rule; failures are logged and reported, never fatal.
    pub fn detect(&self, natal: &NatalChart, aspects: &[Aspect]) -> YogaDetection {
        let ctx = YogaContext {
            natal,
            aspects,
            tables: &self.tables,
        };
        let mut detection = YogaDetection::default();
        for definition in &self.definitions {
            match self.evaluate(&definition.rule, &ctx) {
                Ok(matches) => {
                    for m in matches {
                        let strength = self.strength(&m, &ctx);
                        detection.yogas.push(YogaResult {
                            kind: definition.kind,
                            name: definition.kind.name().to_string(),
                            category: definition.kind.category(),
                            planets: m.planets,
                            houses: m.houses,
                            strength,
                            description: definition.kind.description().to_string(),
                            effects: definition
                                .kind
                                .effects()
                                .iter()
                                .map(|e| e.to_string())
                                .collect(),
                        });
                    }
                }
                Err(err) => {
                    log::warn!("{} detection failed: {}", definition.kind.name(), err);
                    detection.failures.push(err.report());
                }
            }
        }
        detection.yogas.sort_by(|a, b| {
            b.strength
                .total_cmp(&a.strength)
                .then_with(|| a.kind.cmp(&b.kind))
        });
        detection
    }

    fn evaluate(
        &self,
        rule: &YogaRule,
        ctx: &YogaContext<'_>,
    ) -> Result<Vec<YogaMatch>, AnalysisError> {
        match *rule {
            YogaRule::LordsInAspect {
                lords_of,
                with_lords_of,
                max_orb,
            } => {
                let mut seen = BTreeSet::new();
                let mut matches = Vec::new();
                for &first_house in lords_of {
                    let first = ctx.lord_of(first_house);
                    for &second_house in with_lords_of {
                        let second = ctx.lord_of(second_house);
                        if first == second || !seen.insert((first.min(second), first.max(second))) {
                            continue;
                        }
                        ctx.require(first)?;
                        ctx.require(second)?;
                        if let Some(aspect) = ctx.aspect_between(first, second) {
                            if aspect.orb <= max_orb {
                                matches.push(YogaMatch {
                                    planets: vec![first, second],
                                    houses: vec![first_house, second_house],
                                });
                            }
                        }
                    }
                }
                Ok(matches)
            }
            YogaRule::KendraFromMoon { planet } => {
                let moon = ctx.require(Body::Moon)?;
                let target = ctx.require(planet)?;
                Ok(is_kendra(sign_count(moon.sign, target.sign))
                    .then(|| YogaMatch {
                        planets: vec![planet, Body::Moon],
                        houses: vec![target.house, moon.house],
                    })
                    .into_iter()
                    .collect())
            }
            YogaRule::SameSign { planets: [a, b] } => {
                let first = ctx.require(a)?;
                let second = ctx.require(b)?;
                Ok((first.sign == second.sign)
                    .then(|| YogaMatch {
                        planets: vec![a, b],
                        houses: vec![first.house],
                    })
                    .into_iter()
                    .collect())
            }
            YogaRule::LordsConjoined { houses: [h1, h2] } => {
                let first = ctx.require(ctx.lord_of(h1))?;
                let second = ctx.require(ctx.lord_of(h2))?;
                let mut planets = vec![first.body];
                if second.body != first.body {
                    planets.push(second.body);
                }
                Ok((first.house == second.house)
                    .then(|| YogaMatch {
                        planets,
                        houses: vec![h1, h2],
                    })
                    .into_iter()
                    .collect())
            }
            YogaRule::Mahapurusha { planet } => {
                let position = ctx.require(planet)?;
                let dignified = ctx.tables.is_own_sign(planet, position.sign)
                    || ctx.tables.is_exalted(planet, position.sign);
                Ok((dignified && is_kendra(position.house))
                    .then(|| YogaMatch {
                        planets: vec![planet],
                        houses: vec![position.house],
                    })
                    .into_iter()
                    .collect())
            }
            YogaRule::DebilitationCancelled => {
                let moon = ctx.require(Body::Moon)?;
                let mut matches = Vec::new();
                for body in Body::SEVEN {
                    let Some(position) = ctx.natal.position(body) else {
                        continue;
                    };
                    if !ctx.tables.is_debilitated(body, position.sign) {
                        continue;
                    }
                    let cancellers = [
                        ctx.tables.sign_lord(position.sign),
                        ctx.tables.sign_lord(ctx.tables.exaltation_sign(body)),
                    ];
                    for canceller in cancellers {
                        if canceller == body {
                            continue;
                        }
                        let placement = ctx.require(canceller)?;
                        if is_kendra(placement.house)
                            || is_kendra(sign_count(moon.sign, placement.sign))
                        {
                            matches.push(YogaMatch {
                                planets: vec![body, canceller],
                                houses: vec![position.house, placement.house],
                            });
                            break;
                        }
                    }
                }
                Ok(matches)
            }
            YogaRule::LordsInHouses { lords_of, houses } => {
                let mut matches = Vec::new();
                for &house in lords_of {
                    let position = ctx.require(ctx.lord_of(house))?;
                    if houses.contains(&position.house) {
                        matches.push(YogaMatch {
                            planets: vec![position.body],
                            houses: vec![house, position.house],
                        });
                    }
                }
                Ok(matches)
            }
            YogaRule::UnsupportedMoon => {
                let moon = ctx.require(Body::Moon)?;
                let mut flanked = false;
                for body in [Body::Mars, Body::Mercury, Body::Jupiter, Body::Venus, Body::Saturn] {
                    let count = sign_count(moon.sign, ctx.require(body)?.sign);
                    flanked |= count == 2 || count == 12;
                }
                Ok((!flanked)
                    .then(|| YogaMatch {
                        planets: vec![Body::Moon],
                        houses: vec![moon.house],
                    })
                    .into_iter()
                    .collect())
            }
        }
    }

    /// `Σ(dignity + aspect bonus + house bonus) / max_possible`, as 0-100.
    fn strength(&self, m: &YogaMatch, ctx: &YogaContext<'_>) -> f64 {
        if m.planets.is_empty() {
            return 0.0;
        }
        let score: f64 = m
            .planets
            .iter()
            .filter_map(|&body| ctx.natal.position(body))
            .map(|position| {
                let dignity = self
                    .tables
                    .dignity_score(position.body, position.sign, position.house)
                    .max(0.0);
                let aspected = if m.planets.len() > 1 {
                    m.planets
                        .iter()
                        .any(|&other| other != position.body && ctx.aspect_between(position.body, other).is_some())
                } else {
                    ctx.aspects
                        .iter()
                        .any(|a| a.involves(position.body) && a.is_beneficial())
                };
                let aspect_bonus = if aspected { ASPECT_BONUS } else { 0.0 };
                let house_bonus = if is_kendra(position.house) {
                    KENDRA_BONUS
                } else if is_trikona(position.house) {
                    TRIKONA_BONUS
                } else {
                    0.0
                };
                dignity + aspect_bonus + house_bonus
            })
            .sum();
        (score / (MAX_PER_PLANET * m.planets.len() as f64) * 100.0).clamp(0.0, 100.0)
    }
}

/// The `n` strongest yogas of an already sorted list.
pub fn top_yogas(yogas: &[YogaResult], n: usize) -> Vec<YogaResult> {
    yogas.iter().take(n).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_count() {
        assert_eq!(sign_count(0, 0), 1);
        assert_eq!(sign_count(0, 3), 4);
        assert_eq!(sign_count(10, 1), 4);
        assert_eq!(sign_count(5, 4), 12);
    }

    #[test]
    fn test_catalogue_has_every_kind_once() {
        let kinds: BTreeSet<YogaKind> = CLASSICAL_YOGAS.iter().map(|d| d.kind).collect();
        assert_eq!(kinds.len(), CLASSICAL_YOGAS.len());
        assert_eq!(kinds.len(), 13);
    }

    #[test]
    fn test_per_planet_maximum() {
        assert_eq!(MAX_PER_PLANET, 20.0);
    }
}
