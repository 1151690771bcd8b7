//! Classical dignity and relationship tables.
//!
//! One [`DignityTables`] value is built at startup and shared through `Arc`
//! by the strength, aspect, house and yoga engines, so the rulership and
//! exaltation rules are defined exactly once.

use serde::{Deserialize, Serialize};

use crate::ephemeris::Body;

/// Rulership +5, exaltation +4, plus house placement.
pub const RULERSHIP_SCORE: f64 = 5.0;
pub const EXALTATION_SCORE: f64 = 4.0;
/// Highest value [`DignityTables::dignity_score`] can produce.
pub const MAX_DIGNITY_SCORE: f64 = RULERSHIP_SCORE + EXALTATION_SCORE + 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dignity {
    Exalted,
    OwnSign,
    Friendly,
    Neutral,
    Enemy,
    Debilitated,
}

impl Dignity {
    /// Pairing score used by the aspect engine.
    pub const fn percent(self) -> f64 {
        match self {
            Dignity::Exalted => 100.0,
            Dignity::OwnSign => 90.0,
            Dignity::Friendly => 75.0,
            Dignity::Neutral => 50.0,
            Dignity::Enemy => 25.0,
            Dignity::Debilitated => 5.0,
        }
    }

    /// Multiplier applied to a house lord's strength.
    pub const fn lord_factor(self) -> f64 {
        match self {
            Dignity::Exalted => 1.3,
            Dignity::OwnSign => 1.2,
            Dignity::Friendly => 1.1,
            Dignity::Neutral => 1.0,
            Dignity::Enemy => 0.8,
            Dignity::Debilitated => 0.7,
        }
    }

    /// Sthana bala in rupas.
    pub const fn positional_rupa(self) -> f64 {
        match self {
            Dignity::Exalted => 1.0,
            Dignity::OwnSign => 0.9,
            Dignity::Friendly => 0.65,
            Dignity::Neutral => 0.5,
            Dignity::Enemy => 0.3,
            Dignity::Debilitated => 0.1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relationship {
    Friend,
    Neutral,
    Enemy,
}

impl Relationship {
    pub const fn percent(self) -> f64 {
        match self {
            Relationship::Friend => 100.0,
            Relationship::Neutral => 50.0,
            Relationship::Enemy => 10.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Nature {
    Benefic,
    Malefic,
}

#[derive(Debug, Clone)]
pub struct DignityTables {
    sign_lords: [Body; 12],
    own_signs: [&'static [u8]; 9],
    exaltation: [u8; 9],
    friends: [&'static [Body]; 9],
    enemies: [&'static [Body]; 9],
    /// Placement bonus by house, 1st house first.
    house_placement: [f64; 12],
}

impl Default for DignityTables {
    fn default() -> Self {
        Self::classical()
    }
}

impl DignityTables {
    /// Parashari tables. Nodes take Taurus/Scorpio exaltation and no own sign.
    pub fn classical() -> Self {
        use Body::*;
        Self {
            sign_lords: [
                Mars, Venus, Mercury, Moon, Sun, Mercury, Venus, Mars, Jupiter, Saturn, Saturn,
                Jupiter,
            ],
            own_signs: [&[4], &[3], &[0, 7], &[2, 5], &[8, 11], &[1, 6], &[9, 10], &[], &[]],
            exaltation: [0, 1, 9, 5, 3, 11, 6, 1, 7],
            friends: [
                &[Moon, Mars, Jupiter],
                &[Sun, Mercury],
                &[Sun, Moon, Jupiter],
                &[Sun, Venus],
                &[Sun, Moon, Mars],
                &[Mercury, Saturn],
                &[Mercury, Venus],
                &[Mercury, Venus, Saturn],
                &[Mercury, Venus, Saturn],
            ],
            enemies: [
                &[Venus, Saturn],
                &[],
                &[Mercury],
                &[Moon],
                &[Mercury, Venus],
                &[Sun, Moon],
                &[Sun, Moon, Mars],
                &[Sun, Moon, Mars],
                &[Sun, Moon, Mars],
            ],
            house_placement: [5.0, 1.0, 0.0, 4.0, 3.0, -2.0, 4.0, -2.0, 3.0, 5.0, 2.0, -2.0],
        }
    }

    pub fn sign_lord(&self, sign: u8) -> Body {
        self.sign_lords[usize::from(sign % 12)]
    }

    pub fn is_own_sign(&self, body: Body, sign: u8) -> bool {
        self.own_signs[body.index()].contains(&(sign % 12))
    }

    pub fn exaltation_sign(&self, body: Body) -> u8 {
        self.exaltation[body.index()]
    }

    pub fn debilitation_sign(&self, body: Body) -> u8 {
        (self.exaltation[body.index()] + 6) % 12
    }

    pub fn is_exalted(&self, body: Body, sign: u8) -> bool {
        self.exaltation_sign(body) == sign % 12
    }

    pub fn is_debilitated(&self, body: Body, sign: u8) -> bool {
        self.debilitation_sign(body) == sign % 12
    }

    /// Natural (naisargika) relationship of `body` towards `other`.
    pub fn relationship(&self, body: Body, other: Body) -> Relationship {
        if self.friends[body.index()].contains(&other) {
            Relationship::Friend
        } else if self.enemies[body.index()].contains(&other) {
            Relationship::Enemy
        } else {
            Relationship::Neutral
        }
    }

    pub fn dignity(&self, body: Body, sign: u8) -> Dignity {
        if self.is_exalted(body, sign) {
            Dignity::Exalted
        } else if self.is_debilitated(body, sign) {
            Dignity::Debilitated
        } else if self.is_own_sign(body, sign) {
            Dignity::OwnSign
        } else {
            let lord = self.sign_lord(sign);
            if lord == body {
                return Dignity::OwnSign;
            }
            match self.relationship(body, lord) {
                Relationship::Friend => Dignity::Friendly,
                Relationship::Neutral => Dignity::Neutral,
                Relationship::Enemy => Dignity::Enemy,
            }
        }
    }

    /// Shared dignity primitive: rulership +5, exaltation +4, house table.
    pub fn dignity_score(&self, body: Body, sign: u8, house: u8) -> f64 {
        let mut score = 0.0;
        if self.is_own_sign(body, sign) {
            score += RULERSHIP_SCORE;
        }
        if self.is_exalted(body, sign) {
            score += EXALTATION_SCORE;
        }
        score + self.house_placement[usize::from(house.clamp(1, 12) - 1)]
    }

    pub fn natural_nature(&self, body: Body) -> Nature {
        match body {
            Body::Moon | Body::Mercury | Body::Jupiter | Body::Venus => Nature::Benefic,
            _ => Nature::Malefic,
        }
    }
}
