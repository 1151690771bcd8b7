use std::collections::BTreeMap;
use std::sync::Arc;

use crate::aspects::types::{Aspect, AspectDefinition, AspectFactors, AspectTable, SpecialAspect};
use crate::ephemeris::{Body, PlanetaryPosition};
use crate::vedic::dignity::DignityTables;
use crate::zodiac::{angular_distance, house_class, nth_house_from, signed_separation, HouseClass};

/// Relative speed (deg/day) at which the speed factor bottoms out.
const SPEED_SCALE: f64 = 15.0;
const APPLYING_MULTIPLIER: f64 = 1.2;
const SEPARATING_MULTIPLIER: f64 = 0.8;

/// Extra whole-house aspects, counted inclusively from the planet's house.
pub const fn special_aspect_houses(body: Body) -> &'static [u8] {
    match body {
        Body::Mars => &[4, 8],
        Body::Jupiter => &[5, 7, 9],
        Body::Saturn => &[3, 7, 10],
        _ => &[],
    }
}

/// Pairwise aspect detection and scoring.
#[derive(Debug, Clone)]
pub struct AspectEngine {
    table: Arc<AspectTable>,
    dignities: Arc<DignityTables>,
}

impl Default for AspectEngine {
    fn default() -> Self {
        Self::new(
            Arc::new(AspectTable::classical()),
            Arc::new(DignityTables::classical()),
        )
    }
}

impl AspectEngine {
    pub fn new(table: Arc<AspectTable>, dignities: Arc<DignityTables>) -> Self {
        Self { table, dignities }
    }

    pub fn table(&self) -> &AspectTable {
        &self.table
    }

    /// All aspects between distinct bodies, strongest first.
    pub fn calculate_aspects(&self, positions: &BTreeMap<Body, PlanetaryPosition>) -> Vec<Aspect> {
        let bodies: Vec<&PlanetaryPosition> = positions.values().collect();
        let mut aspects = Vec::new();
        for i in 0..bodies.len() {
            for j in (i + 1)..bodies.len() {
                for definition in self.table.definitions() {
                    if let Some(aspect) = self.calculate_aspect(bodies[i], bodies[j], definition) {
                        aspects.push(aspect);
                    }
                }
            }
        }
        aspects.sort_by(|a, b| {
            b.strength
                .total_cmp(&a.strength)
                .then_with(|| a.from.cmp(&b.from))
                .then_with(|| a.to.cmp(&b.to))
        });
        aspects
    }

    /// The aspect of one type between two bodies, if within orb.
    pub fn calculate_aspect(
        &self,
        p1: &PlanetaryPosition,
        p2: &PlanetaryPosition,
        definition: &AspectDefinition,
    ) -> Option<Aspect> {
        let angle = angular_distance(p1.longitude, p2.longitude);
        let orb = (angle - definition.angle).abs();
        if orb > definition.orb {
            return None;
        }

        let strength = orb_strength(definition, orb);
        let applying = is_applying(p1, p2, definition.angle);
        let factors = AspectFactors {
            orb: (1.0 - orb / definition.orb) * 100.0,
            speed: speed_factor(p1, p2),
            dignity: (self.dignity_percent(p1) + self.dignity_percent(p2)) / 2.0,
            relationship: (self.dignities.relationship(p1.body, p2.body).percent()
                + self.dignities.relationship(p2.body, p1.body).percent())
                / 2.0,
            house: (house_factor(p1.house) + house_factor(p2.house)) / 2.0,
        };
        let motion = if applying {
            APPLYING_MULTIPLIER
        } else {
            SEPARATING_MULTIPLIER
        };
        let influence = (factors.composite() * definition.base_strength / 100.0
            * motion
            * (1.0 + definition.nature / 100.0))
            .clamp(0.0, 100.0);

        Some(Aspect {
            from: p1.body,
            to: p2.body,
            definition: *definition,
            angle,
            orb,
            applying,
            strength,
            factors,
            influence,
        })
    }

    /// Mars, Jupiter and Saturn special house aspects.
    pub fn special_aspects(
        &self,
        positions: &BTreeMap<Body, PlanetaryPosition>,
    ) -> Vec<SpecialAspect> {
        positions
            .values()
            .flat_map(|position| {
                special_aspect_houses(position.body)
                    .iter()
                    .map(move |&nth| SpecialAspect {
                        planet: position.body,
                        from_house: position.house,
                        nth,
                        target_house: nth_house_from(position.house, nth),
                    })
            })
            .collect()
    }

    fn dignity_percent(&self, position: &PlanetaryPosition) -> f64 {
        self.dignities.dignity(position.body, position.sign).percent()
    }
}

/// `base * (1 - orb/allowed)`: equals base when exact, zero at the orb edge.
pub fn orb_strength(definition: &AspectDefinition, orb: f64) -> f64 {
    (definition.base_strength * (1.0 - orb / definition.orb)).clamp(0.0, 100.0)
}

/// Retrograde bodies move backwards regardless of the sign convention of the
/// provider's speed.
fn directed_speed(position: &PlanetaryPosition) -> f64 {
    if position.retrograde {
        -position.speed.abs()
    } else {
        position.speed.abs()
    }
}

/// True while the separation is moving towards the exact angle.
pub fn is_applying(p1: &PlanetaryPosition, p2: &PlanetaryPosition, target: f64) -> bool {
    let separation = signed_separation(p1.longitude, p2.longitude);
    let relative = directed_speed(p1) - directed_speed(p2);
    // rate of change of |separation|
    let rate = if separation >= 0.0 { relative } else { -relative };
    let distance = separation.abs() - target;
    if distance == 0.0 {
        return false;
    }
    distance * rate < 0.0
}

fn speed_factor(p1: &PlanetaryPosition, p2: &PlanetaryPosition) -> f64 {
    let relative = (p1.speed - p2.speed).abs();
    100.0 * (1.0 - (relative / SPEED_SCALE).min(1.0))
}

fn house_factor(house: u8) -> f64 {
    match house_class(house) {
        HouseClass::Angular => 100.0,
        HouseClass::Succedent => 70.0,
        HouseClass::Cadent => 40.0,
    }
}

/// Aspects at or above `min_strength`.
pub fn dominant_aspects(aspects: &[Aspect], min_strength: f64) -> Vec<&Aspect> {
    aspects.iter().filter(|a| a.strength >= min_strength).collect()
}

pub fn challenging_aspects(aspects: &[Aspect]) -> Vec<&Aspect> {
    aspects.iter().filter(|a| a.is_challenging()).collect()
}

pub fn harmonious_aspects(aspects: &[Aspect]) -> Vec<&Aspect> {
    aspects.iter().filter(|a| a.is_beneficial()).collect()
}
