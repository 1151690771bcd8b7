use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ephemeris::Body;
use crate::error::AnalysisError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AspectKind {
    Conjunction,
    Opposition,
    Trine,
    Square,
    Sextile,
}

impl AspectKind {
    pub const ALL: [AspectKind; 5] = [
        AspectKind::Conjunction,
        AspectKind::Opposition,
        AspectKind::Trine,
        AspectKind::Square,
        AspectKind::Sextile,
    ];

    pub const fn slug(self) -> &'static str {
        match self {
            AspectKind::Conjunction => "conjunction",
            AspectKind::Opposition => "opposition",
            AspectKind::Trine => "trine",
            AspectKind::Square => "square",
            AspectKind::Sextile => "sextile",
        }
    }
}

impl fmt::Display for AspectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for AspectKind {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        AspectKind::ALL
            .into_iter()
            .find(|k| k.slug() == wanted)
            .ok_or_else(|| AnalysisError::invalid("aspect", format!("unknown aspect `{s}`")))
    }
}

/// Target angle, allowed orb, base strength and polarity of one aspect type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AspectDefinition {
    pub kind: AspectKind,
    /// Exact angle in degrees
    pub angle: f64,
    /// Largest deviation from `angle` still counted
    pub orb: f64,
    /// Strength at an exact aspect, 0-100
    pub base_strength: f64,
    /// Polarity in [-100, 100]; positive is benefic
    pub nature: f64,
}

/// Immutable aspect configuration, built once and shared.
#[derive(Debug, Clone, PartialEq)]
pub struct AspectTable {
    definitions: Vec<AspectDefinition>,
}

impl Default for AspectTable {
    fn default() -> Self {
        Self::classical()
    }
}

impl AspectTable {
    pub fn classical() -> Self {
        let def = |kind, angle, orb, base_strength, nature| AspectDefinition {
            kind,
            angle,
            orb,
            base_strength,
            nature,
        };
        Self {
            definitions: vec![
                def(AspectKind::Conjunction, 0.0, 10.0, 100.0, 0.0),
                def(AspectKind::Opposition, 180.0, 10.0, 95.0, -40.0),
                def(AspectKind::Trine, 120.0, 8.0, 85.0, 50.0),
                def(AspectKind::Square, 90.0, 8.0, 75.0, -50.0),
                def(AspectKind::Sextile, 60.0, 6.0, 65.0, 30.0),
            ],
        }
    }

    /// Replace allowed orbs; kinds not named keep their default.
    pub fn with_orbs(mut self, orbs: &BTreeMap<AspectKind, f64>) -> Result<Self, AnalysisError> {
        for (kind, orb) in orbs {
            if !orb.is_finite() || *orb <= 0.0 || *orb > 30.0 {
                return Err(AnalysisError::invalid(
                    format!("aspect_orbs.{kind}"),
                    format!("orb must be within (0, 30], got {orb}"),
                ));
            }
            for definition in self.definitions.iter_mut().filter(|d| d.kind == *kind) {
                definition.orb = *orb;
            }
        }
        Ok(self)
    }

    pub fn definitions(&self) -> &[AspectDefinition] {
        &self.definitions
    }

    pub fn get(&self, kind: AspectKind) -> Option<&AspectDefinition> {
        self.definitions.iter().find(|d| d.kind == kind)
    }
}

/// The five sub-scores behind an aspect's composite, each 0-100.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AspectFactors {
    pub orb: f64,
    pub speed: f64,
    pub dignity: f64,
    pub relationship: f64,
    pub house: f64,
}

impl AspectFactors {
    pub fn composite(&self) -> f64 {
        0.30 * self.orb
            + 0.15 * self.speed
            + 0.20 * self.dignity
            + 0.20 * self.relationship
            + 0.15 * self.house
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aspect {
    pub from: Body,
    pub to: Body,
    pub definition: AspectDefinition,
    /// Measured angular distance, 0-180
    pub angle: f64,
    /// |angle - target|
    pub orb: f64,
    pub applying: bool,
    /// Orb-proximity strength, 0-100
    pub strength: f64,
    pub factors: AspectFactors,
    /// Total influence, 0-100
    pub influence: f64,
}

impl Aspect {
    pub fn kind(&self) -> AspectKind {
        self.definition.kind
    }

    pub fn is_beneficial(&self) -> bool {
        self.definition.nature > 0.0
    }

    pub fn is_challenging(&self) -> bool {
        self.definition.nature < 0.0
    }

    pub fn involves(&self, body: Body) -> bool {
        self.from == body || self.to == body
    }

    pub fn partner_of(&self, body: Body) -> Option<Body> {
        if self.from == body {
            Some(self.to)
        } else if self.to == body {
            Some(self.from)
        } else {
            None
        }
    }
}

/// Whole-house graha drishti beyond the universal 7th.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialAspect {
    pub planet: Body,
    pub from_house: u8,
    /// Counted inclusively: the 4th aspect falls on the 4th house from `from_house`.
    pub nth: u8,
    pub target_house: u8,
}
