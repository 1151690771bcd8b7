//! Six-fold planetary strength (Shadbala), each component in rupas [0, 1].

use std::sync::Arc;

use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::aspects::Aspect;
use crate::chart::NatalChart;
use crate::ephemeris::{Body, PlanetaryPosition};
use crate::vedic::dignity::{Dignity, DignityTables, Nature};
use crate::zodiac::{house_class, HouseClass};

/// Six components at one rupa each.
pub const SHADBALA_MAX: f64 = 6.0;

/// Naisargika bala in virupas out of 60.
const NATURAL_STRENGTH: [f64; 7] = [60.0, 51.43, 17.14, 25.71, 34.29, 42.86, 8.57];
const NODE_NATURAL: f64 = 0.4;

/// Fastest typical daily motion, degrees per day.
const MAX_SPEED: [f64; 7] = [1.02, 15.0, 0.8, 2.2, 0.25, 1.26, 0.13];

/// House in which each planet gains full directional strength.
const fn directional_house(body: Body) -> Option<u8> {
    match body {
        Body::Sun | Body::Mars => Some(10),
        Body::Moon | Body::Venus => Some(4),
        Body::Mercury | Body::Jupiter => Some(1),
        Body::Saturn => Some(7),
        Body::Rahu | Body::Ketu => None,
    }
}

/// Time-of-birth inputs shared by every planet of a chart.
#[derive(Debug, Clone, Copy)]
pub struct StrengthContext<'a> {
    pub is_daytime: bool,
    /// 0, 1 or 2: which third of the day (or night) the birth falls in.
    pub third: u8,
    pub aspects: &'a [Aspect],
}

impl<'a> StrengthContext<'a> {
    /// Day/night from the Sun's house when known, else from local mean time.
    pub fn from_chart(natal: &NatalChart, aspects: &'a [Aspect]) -> Self {
        let hour = local_solar_hour(natal.request.timestamp, natal.request.location.lon);
        let is_daytime = match natal.position(Body::Sun) {
            Some(sun) => sun.house >= 7,
            None => (6.0..18.0).contains(&hour),
        };
        let elapsed = if is_daytime {
            (hour - 6.0).rem_euclid(24.0)
        } else {
            (hour - 18.0).rem_euclid(24.0)
        };
        Self {
            is_daytime,
            third: ((elapsed / 4.0).floor() as u8).min(2),
            aspects,
        }
    }
}

fn local_solar_hour(timestamp: DateTime<Utc>, longitude: f64) -> f64 {
    let utc_hour = f64::from(timestamp.hour())
        + f64::from(timestamp.minute()) / 60.0
        + f64::from(timestamp.second()) / 3600.0;
    (utc_hour + longitude / 15.0).rem_euclid(24.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrengthResult {
    pub body: Body,
    pub positional: f64,
    pub directional: f64,
    pub temporal: f64,
    pub motional: f64,
    pub natural: f64,
    pub aspectual: f64,
    /// Sum of the six components, 0-6
    pub total: f64,
    /// `total / 6 * 100`
    pub percentage: f64,
    pub dignity: Dignity,
    pub dignity_score: f64,
}

#[derive(Debug, Clone)]
pub struct StrengthEngine {
    tables: Arc<DignityTables>,
}

impl StrengthEngine {
    pub fn new(tables: Arc<DignityTables>) -> Self {
        Self { tables }
    }

    pub fn calculate_strength(
        &self,
        position: &PlanetaryPosition,
        context: &StrengthContext<'_>,
    ) -> StrengthResult {
        let dignity = self.tables.dignity(position.body, position.sign);
        let components = [
            dignity.positional_rupa(),
            directional(position),
            self.temporal(position.body, context),
            motional(position),
            natural(position.body),
            self.aspectual(position.body, context.aspects),
        ]
        .map(|c| c.clamp(0.0, 1.0));
        let total: f64 = components.iter().sum();

        StrengthResult {
            body: position.body,
            positional: components[0],
            directional: components[1],
            temporal: components[2],
            motional: components[3],
            natural: components[4],
            aspectual: components[5],
            total,
            percentage: (total / SHADBALA_MAX * 100.0).clamp(0.0, 100.0),
            dignity,
            dignity_score: self
                .tables
                .dignity_score(position.body, position.sign, position.house),
        }
    }

    /// Diurnal planets are strong by day, nocturnal ones by night; the ruler
    /// of the current third gains a quarter rupa.
    fn temporal(&self, body: Body, context: &StrengthContext<'_>) -> f64 {
        let base = match body {
            Body::Sun | Body::Jupiter | Body::Venus => {
                if context.is_daytime {
                    0.75
                } else {
                    0.25
                }
            }
            Body::Moon | Body::Mars | Body::Saturn => {
                if context.is_daytime {
                    0.25
                } else {
                    0.75
                }
            }
            Body::Mercury | Body::Rahu | Body::Ketu => 0.5,
        };
        let ruler = if context.is_daytime {
            [Body::Mercury, Body::Sun, Body::Saturn][usize::from(context.third)]
        } else {
            [Body::Moon, Body::Venus, Body::Mars][usize::from(context.third)]
        };
        if ruler == body {
            base + 0.25
        } else {
            base
        }
    }

    /// Net benefic minus malefic influence received through aspects.
    fn aspectual(&self, body: Body, aspects: &[Aspect]) -> f64 {
        let net: f64 = aspects
            .iter()
            .filter_map(|aspect| {
                let partner = aspect.partner_of(body)?;
                let sign = if aspect.definition.nature > 0.0 {
                    1.0
                } else if aspect.definition.nature < 0.0 {
                    -1.0
                } else {
                    match self.tables.natural_nature(partner) {
                        Nature::Benefic => 1.0,
                        Nature::Malefic => -1.0,
                    }
                };
                Some(sign * aspect.influence / 100.0)
            })
            .sum();
        0.5 + 0.25 * net
    }
}

fn directional(position: &PlanetaryPosition) -> f64 {
    if directional_house(position.body) == Some(position.house) {
        return 1.0;
    }
    match house_class(position.house) {
        HouseClass::Angular => 0.75,
        HouseClass::Succedent => 0.5,
        HouseClass::Cadent => 0.25,
    }
}

fn motional(position: &PlanetaryPosition) -> f64 {
    if position.body.is_node() {
        return 0.5;
    }
    if position.retrograde {
        return 1.0;
    }
    let max = MAX_SPEED[position.body.index()];
    0.25 + 0.5 * (position.speed.abs() / max).min(1.0)
}

fn natural(body: Body) -> f64 {
    if body.is_node() {
        NODE_NATURAL
    } else {
        NATURAL_STRENGTH[body.index()] / 60.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ephemeris::BodyState;

    fn position(body: Body, longitude: f64, speed: f64, house: u8) -> PlanetaryPosition {
        PlanetaryPosition::from_state(body, &BodyState::new(longitude, 0.0, 1.0, speed), house)
    }

    fn context(is_daytime: bool, third: u8) -> StrengthContext<'static> {
        StrengthContext {
            is_daytime,
            third,
            aspects: &[],
        }
    }

    #[test]
    fn test_exalted_sun_in_tenth_by_day() {
        let engine = StrengthEngine::new(Arc::new(DignityTables::classical()));
        let result = engine.calculate_strength(&position(Body::Sun, 10.0, 1.0, 10), &context(true, 1));
        assert_eq!(result.positional, 1.0);
        assert_eq!(result.directional, 1.0);
        assert_eq!(result.temporal, 1.0);
        assert_eq!(result.natural, 1.0);
        assert_eq!(result.dignity, Dignity::Exalted);
        assert!(result.percentage > 80.0);
    }

    #[test]
    fn test_retrograde_motional() {
        let engine = StrengthEngine::new(Arc::new(DignityTables::classical()));
        let result =
            engine.calculate_strength(&position(Body::Saturn, 200.0, -0.05, 3), &context(false, 0));
        assert_eq!(result.motional, 1.0);
        assert_eq!(result.directional, 0.25);
        assert_eq!(result.temporal, 0.75);
    }

    #[test]
    fn test_percentage_bounds() {
        let engine = StrengthEngine::new(Arc::new(DignityTables::classical()));
        for body in Body::ALL {
            for house in 1..=12u8 {
                for &speed in &[-2.0, 0.0, 0.5, 20.0] {
                    let lon = f64::from(house) * 29.0;
                    let result =
                        engine.calculate_strength(&position(body, lon, speed, house), &context(house % 2 == 0, house % 3));
                    assert!((0.0..=100.0).contains(&result.percentage));
                    assert!((result.total / SHADBALA_MAX * 100.0 - result.percentage).abs() < 1e-9);
                }
            }
        }
    }
}
