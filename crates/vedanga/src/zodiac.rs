//! Zodiac arithmetic shared by every engine.

pub const SIGN_SPAN: f64 = 30.0;

pub const SIGN_NAMES: [&str; 12] = [
    "Aries",
    "Taurus",
    "Gemini",
    "Cancer",
    "Leo",
    "Virgo",
    "Libra",
    "Scorpio",
    "Sagittarius",
    "Capricorn",
    "Aquarius",
    "Pisces",
];

/// Normalize degrees to [0, 360).
pub fn normalize_degrees(value: f64) -> f64 {
    let mut normalized = value % 360.0;
    if normalized < 0.0 {
        normalized += 360.0;
    }
    // -1e-17 % 360 + 360 rounds to 360.0
    if normalized >= 360.0 {
        normalized -= 360.0;
    }
    normalized
}

/// Shortest arc between two longitudes, in [0, 180].
pub fn angular_distance(lon1: f64, lon2: f64) -> f64 {
    let diff = (normalize_degrees(lon1) - normalize_degrees(lon2)).abs();
    diff.min(360.0 - diff)
}

/// `lon1 - lon2` folded into (-180, 180].
pub fn signed_separation(lon1: f64, lon2: f64) -> f64 {
    let diff = normalize_degrees(lon1 - lon2);
    if diff > 180.0 {
        diff - 360.0
    } else {
        diff
    }
}

/// Sign index (0 = Aries .. 11 = Pisces).
pub fn sign_of(longitude: f64) -> u8 {
    ((normalize_degrees(longitude) / SIGN_SPAN).floor() as u8).min(11)
}

pub fn degree_in_sign(longitude: f64) -> f64 {
    normalize_degrees(longitude) % SIGN_SPAN
}

pub fn sign_name(sign: u8) -> &'static str {
    SIGN_NAMES[usize::from(sign % 12)]
}

/// Count houses forward inclusively: the 1st from `house` is `house` itself.
pub fn nth_house_from(house: u8, nth: u8) -> u8 {
    let offset = nth.saturating_sub(1);
    (house + offset - 1) % 12 + 1
}

/// Angular/succedent/cadent classification of a house.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HouseClass {
    Angular,
    Succedent,
    Cadent,
}

pub fn house_class(house: u8) -> HouseClass {
    match house {
        1 | 4 | 7 | 10 => HouseClass::Angular,
        2 | 5 | 8 | 11 => HouseClass::Succedent,
        _ => HouseClass::Cadent,
    }
}

pub const KENDRA: [u8; 4] = [1, 4, 7, 10];
pub const TRIKONA: [u8; 3] = [1, 5, 9];
pub const DUSTHANA: [u8; 3] = [6, 8, 12];
pub const UPACHAYA: [u8; 4] = [3, 6, 10, 11];
pub const MARAKA: [u8; 2] = [2, 7];

pub fn is_kendra(house: u8) -> bool {
    KENDRA.contains(&house)
}

pub fn is_trikona(house: u8) -> bool {
    TRIKONA.contains(&house)
}

pub fn is_dusthana(house: u8) -> bool {
    DUSTHANA.contains(&house)
}
