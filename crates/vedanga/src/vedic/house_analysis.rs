//! Per-house composite strength.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::aspects::{Aspect, AspectKind, SpecialAspect};
use crate::chart::NatalChart;
use crate::ephemeris::{Body, PlanetaryPosition};
use crate::error::AnalysisError;
use crate::vedic::dignity::DignityTables;
use crate::vedic::strength::StrengthResult;
use crate::zodiac::{is_dusthana, is_kendra, is_trikona, DUSTHANA, KENDRA, MARAKA, TRIKONA, UPACHAYA};

const NATURAL_BASE: f64 = 60.0;
/// Score of a house with no occupants or no incoming aspects.
const NEUTRAL_SCORE: f64 = 50.0;
const RETROGRADE_OCCUPANT: f64 = 0.9;
const APPLYING_BONUS: f64 = 1.1;
const SPECIAL_ASPECT_WEIGHT: f64 = 0.85;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FunctionalNature {
    Auspicious,
    Growth,
    Maraka,
    Inauspicious,
}

const FUNCTIONAL_NATURE: [FunctionalNature; 12] = [
    FunctionalNature::Auspicious,
    FunctionalNature::Maraka,
    FunctionalNature::Growth,
    FunctionalNature::Auspicious,
    FunctionalNature::Auspicious,
    FunctionalNature::Inauspicious,
    FunctionalNature::Maraka,
    FunctionalNature::Inauspicious,
    FunctionalNature::Auspicious,
    FunctionalNature::Auspicious,
    FunctionalNature::Growth,
    FunctionalNature::Inauspicious,
];

pub const HOUSE_SIGNIFICATIONS: [&[&str]; 12] = [
    &["self", "body", "vitality"],
    &["wealth", "family", "speech"],
    &["courage", "siblings", "communication"],
    &["home", "mother", "comfort"],
    &["children", "intellect", "creativity"],
    &["health", "service", "obstacles"],
    &["partnership", "marriage", "contracts"],
    &["longevity", "transformation", "inheritance"],
    &["fortune", "dharma", "teachers"],
    &["career", "status", "action"],
    &["gains", "friends", "aspirations"],
    &["losses", "liberation", "foreign lands"],
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncomingKind {
    Angular(AspectKind),
    Special,
}

impl IncomingKind {
    fn weight(self) -> f64 {
        match self {
            IncomingKind::Angular(AspectKind::Conjunction) => 1.0,
            IncomingKind::Angular(AspectKind::Trine) => 0.9,
            IncomingKind::Angular(AspectKind::Sextile) => 0.8,
            IncomingKind::Angular(AspectKind::Opposition) => 0.6,
            IncomingKind::Angular(AspectKind::Square) => 0.5,
            IncomingKind::Special => SPECIAL_ASPECT_WEIGHT,
        }
    }
}

/// An aspect touching a house.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IncomingAspect {
    pub kind: IncomingKind,
    pub from: Body,
    /// 0-100
    pub strength: f64,
    pub applying: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct Occupant<'a> {
    pub position: &'a PlanetaryPosition,
    pub strength: &'a StrengthResult,
}

#[derive(Debug, Clone, Copy)]
pub struct LordPlacement<'a> {
    pub position: &'a PlanetaryPosition,
    pub strength: &'a StrengthResult,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HouseStrength {
    pub house: u8,
    pub natural: f64,
    pub occupant: f64,
    pub aspect: f64,
    pub lord_score: f64,
    /// 0-100
    pub total: f64,
    pub functional_nature: FunctionalNature,
    pub significations: Vec<String>,
    pub lord: Body,
    pub occupants: Vec<Body>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HouseGroup {
    Kendra,
    Trikona,
    Upachaya,
    Dusthana,
    Maraka,
}

impl HouseGroup {
    pub const ALL: [HouseGroup; 5] = [
        HouseGroup::Kendra,
        HouseGroup::Trikona,
        HouseGroup::Upachaya,
        HouseGroup::Dusthana,
        HouseGroup::Maraka,
    ];

    pub fn houses(self) -> &'static [u8] {
        match self {
            HouseGroup::Kendra => &KENDRA,
            HouseGroup::Trikona => &TRIKONA,
            HouseGroup::Upachaya => &UPACHAYA,
            HouseGroup::Dusthana => &DUSTHANA,
            HouseGroup::Maraka => &MARAKA,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HouseCombination {
    pub group: HouseGroup,
    pub houses: Vec<u8>,
    pub average: f64,
    pub strongest: u8,
    pub weakest: u8,
}

#[derive(Debug, Clone)]
pub struct HouseAnalysisEngine {
    tables: Arc<DignityTables>,
}

impl HouseAnalysisEngine {
    pub fn new(tables: Arc<DignityTables>) -> Self {
        Self { tables }
    }

    pub fn analyze_house(
        &self,
        house: u8,
        occupants: &[Occupant<'_>],
        aspects: &[IncomingAspect],
        lord: LordPlacement<'_>,
    ) -> HouseStrength {
        let natural = natural_score(house);
        let occupant = self.occupant_score(occupants);
        let aspect = aspect_score(aspects);
        let lord_dignity = self.tables.dignity(lord.position.body, lord.position.sign);
        let lord_score = (lord.strength.percentage * lord_dignity.lord_factor()).clamp(0.0, 100.0);
        let total =
            (0.2 * natural + 0.3 * occupant + 0.2 * aspect + 0.3 * lord_score).clamp(0.0, 100.0);

        let index = usize::from(house.clamp(1, 12) - 1);
        HouseStrength {
            house,
            natural,
            occupant,
            aspect,
            lord_score,
            total,
            functional_nature: FUNCTIONAL_NATURE[index],
            significations: HOUSE_SIGNIFICATIONS[index]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            lord: lord.position.body,
            occupants: occupants.iter().map(|o| o.position.body).collect(),
        }
    }

    /// All twelve houses of a chart.
    pub fn analyze_chart(
        &self,
        natal: &NatalChart,
        strengths: &BTreeMap<Body, StrengthResult>,
        aspects: &[Aspect],
        special: &[SpecialAspect],
    ) -> Result<Vec<HouseStrength>, AnalysisError> {
        let strength_of = |body: Body| {
            strengths.get(&body).ok_or_else(|| {
                AnalysisError::calculation(
                    "house_analysis",
                    format!("body={}", body.slug()),
                    format!("no strength result for {body}"),
                )
            })
        };

        (1..=12u8)
            .map(|house| {
                let occupants = natal
                    .occupants(house)
                    .map(|position| {
                        Ok(Occupant {
                            position,
                            strength: strength_of(position.body)?,
                        })
                    })
                    .collect::<Result<Vec<_>, AnalysisError>>()?;

                let mut incoming: Vec<IncomingAspect> = aspects
                    .iter()
                    .filter_map(|aspect| {
                        let from = natal.position(aspect.from)?;
                        let to = natal.position(aspect.to)?;
                        let source = if to.house == house {
                            aspect.from
                        } else if from.house == house {
                            aspect.to
                        } else {
                            return None;
                        };
                        Some(IncomingAspect {
                            kind: IncomingKind::Angular(aspect.kind()),
                            from: source,
                            strength: aspect.influence,
                            applying: aspect.applying,
                        })
                    })
                    .collect();
                for drishti in special.iter().filter(|s| s.target_house == house) {
                    incoming.push(IncomingAspect {
                        kind: IncomingKind::Special,
                        from: drishti.planet,
                        strength: strength_of(drishti.planet)?.percentage,
                        applying: false,
                    });
                }

                let lord_body = self.tables.sign_lord(natal.houses.sign_of_house(house));
                let lord = LordPlacement {
                    position: natal.require(lord_body, "house_analysis")?,
                    strength: strength_of(lord_body)?,
                };
                Ok(self.analyze_house(house, &occupants, &incoming, lord))
            })
            .collect()
    }

    fn occupant_score(&self, occupants: &[Occupant<'_>]) -> f64 {
        if occupants.is_empty() {
            return NEUTRAL_SCORE;
        }
        let (weighted, weights) =
            occupants
                .iter()
                .fold((0.0, 0.0), |(weighted, weights), occupant| {
                    let position = occupant.position;
                    let weight = (self.tables.dignity(position.body, position.sign).percent()
                        / 100.0)
                        .max(0.05);
                    let retro = if position.retrograde {
                        RETROGRADE_OCCUPANT
                    } else {
                        1.0
                    };
                    (
                        weighted + weight * occupant.strength.percentage * retro,
                        weights + weight,
                    )
                });
        (weighted / weights).clamp(0.0, 100.0)
    }
}

fn natural_score(house: u8) -> f64 {
    let multiplier = if is_kendra(house) {
        1.2
    } else if is_trikona(house) {
        1.1
    } else if is_dusthana(house) {
        0.8
    } else {
        1.0
    };
    NATURAL_BASE * multiplier
}

fn aspect_score(aspects: &[IncomingAspect]) -> f64 {
    if aspects.is_empty() {
        return NEUTRAL_SCORE;
    }
    let (weighted, weights) = aspects.iter().fold((0.0, 0.0), |(weighted, weights), a| {
        let weight = a.kind.weight();
        let bonus = if a.applying { APPLYING_BONUS } else { 1.0 };
        (weighted + weight * a.strength * bonus, weights + weight)
    });
    (weighted / weights).clamp(0.0, 100.0)
}

fn ranked(houses: &[HouseStrength]) -> Vec<&HouseStrength> {
    let mut ranked: Vec<&HouseStrength> = houses.iter().collect();
    ranked.sort_by(|a, b| b.total.total_cmp(&a.total).then(a.house.cmp(&b.house)));
    ranked
}

pub fn strongest(houses: &[HouseStrength], n: usize) -> Vec<&HouseStrength> {
    ranked(houses).into_iter().take(n).collect()
}

pub fn weakest(houses: &[HouseStrength], n: usize) -> Vec<&HouseStrength> {
    let mut ranked = ranked(houses);
    ranked.reverse();
    ranked.into_iter().take(n).collect()
}

/// Averages over the classical house groups.
pub fn analyze_house_combinations(houses: &[HouseStrength]) -> Vec<HouseCombination> {
    HouseGroup::ALL
        .into_iter()
        .filter_map(|group| {
            let members: Vec<&HouseStrength> = houses
                .iter()
                .filter(|h| group.houses().contains(&h.house))
                .collect();
            let first = *members.first()?;
            let average = members.iter().map(|h| h.total).sum::<f64>() / members.len() as f64;
            let (strongest, weakest) = members.iter().copied().fold((first, first), |(hi, lo), h| {
                (
                    if h.total > hi.total { h } else { hi },
                    if h.total < lo.total { h } else { lo },
                )
            });
            Some(HouseCombination {
                group,
                houses: group.houses().to_vec(),
                average,
                strongest: strongest.house,
                weakest: weakest.house,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ephemeris::BodyState;
    use crate::vedic::dignity::Dignity;

    fn position(body: Body, longitude: f64, speed: f64, house: u8) -> PlanetaryPosition {
        PlanetaryPosition::from_state(body, &BodyState::new(longitude, 0.0, 1.0, speed), house)
    }

    fn strength(body: Body, percentage: f64) -> StrengthResult {
        StrengthResult {
            body,
            positional: 0.5,
            directional: 0.5,
            temporal: 0.5,
            motional: 0.5,
            natural: 0.5,
            aspectual: 0.5,
            total: percentage * 6.0 / 100.0,
            percentage,
            dignity: Dignity::Neutral,
            dignity_score: 0.0,
        }
    }

    #[test]
    fn test_empty_house_uses_neutral_scores() {
        let engine = HouseAnalysisEngine::new(Arc::new(DignityTables::classical()));
        // Mercury in Sagittarius: neutral dignity
        let lord_pos = position(Body::Mercury, 250.0, 1.0, 9);
        let lord_strength = strength(Body::Mercury, 60.0);
        let result = engine.analyze_house(
            3,
            &[],
            &[],
            LordPlacement {
                position: &lord_pos,
                strength: &lord_strength,
            },
        );
        assert_eq!(result.natural, 60.0);
        assert_eq!(result.occupant, 50.0);
        assert_eq!(result.aspect, 50.0);
        assert_eq!(result.lord_score, 60.0);
        let expected = 0.2 * 60.0 + 0.3 * 50.0 + 0.2 * 50.0 + 0.3 * 60.0;
        assert!((result.total - expected).abs() < 1e-9);
        assert_eq!(result.functional_nature, FunctionalNature::Growth);
    }

    #[test]
    fn test_kendra_and_exalted_lord() {
        let engine = HouseAnalysisEngine::new(Arc::new(DignityTables::classical()));
        let sun = position(Body::Sun, 10.0, 1.0, 10);
        let sun_strength = strength(Body::Sun, 70.0);
        let aspects = [IncomingAspect {
            kind: IncomingKind::Angular(AspectKind::Trine),
            from: Body::Jupiter,
            strength: 80.0,
            applying: true,
        }];
        let result = engine.analyze_house(
            10,
            &[Occupant {
                position: &sun,
                strength: &sun_strength,
            }],
            &aspects,
            LordPlacement {
                position: &sun,
                strength: &sun_strength,
            },
        );
        assert_eq!(result.natural, 72.0);
        assert_eq!(result.occupant, 70.0);
        assert!((result.aspect - 88.0).abs() < 1e-9);
        assert!((result.lord_score - 91.0).abs() < 1e-9);
        assert!(result.total <= 100.0);
        assert_eq!(result.occupants, vec![Body::Sun]);
    }

    fn house(house: u8, total: f64) -> HouseStrength {
        HouseStrength {
            house,
            natural: 60.0,
            occupant: 50.0,
            aspect: 50.0,
            lord_score: 50.0,
            total,
            functional_nature: FUNCTIONAL_NATURE[usize::from(house - 1)],
            significations: vec![],
            lord: Body::Sun,
            occupants: vec![],
        }
    }

    #[test]
    fn test_selectors_and_combinations() {
        let houses: Vec<HouseStrength> =
            (1..=12u8).map(|h| house(h, f64::from(h) * 5.0)).collect();
        let top: Vec<u8> = strongest(&houses, 3).iter().map(|h| h.house).collect();
        assert_eq!(top, vec![12, 11, 10]);
        let bottom: Vec<u8> = weakest(&houses, 2).iter().map(|h| h.house).collect();
        assert_eq!(bottom, vec![1, 2]);

        let combos = analyze_house_combinations(&houses);
        let kendra = combos.iter().find(|c| c.group == HouseGroup::Kendra).unwrap();
        assert!((kendra.average - 27.5).abs() < 1e-9);
        assert_eq!(kendra.strongest, 10);
        assert_eq!(kendra.weakest, 1);
        assert_eq!(combos.len(), 5);
    }
}
