use serde::{Deserialize, Serialize};

use crate::ephemeris::{ChartRequest, HouseSystem};
use crate::error::AnalysisError;
use crate::zodiac::{normalize_degrees, sign_of, SIGN_SPAN};

const J2000: f64 = 2_451_545.0;
/// Beyond this latitude some ecliptic degrees never rise, so time-based
/// systems have no solution.
const POLAR_LIMIT: f64 = 66.0;
const PLACIDUS_MAX_ITERATIONS: usize = 50;
const PLACIDUS_TOLERANCE: f64 = 1e-9;

/// Sidereal house cusps and angles for one chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HouseCusps {
    /// System actually used (differs from the request after a polar fallback).
    pub system: HouseSystem,
    pub requested_system: HouseSystem,
    /// `cusps[0]` is the 1st house.
    pub cusps: [f64; 12],
    pub ascendant: f64,
    pub midheaven: f64,
    pub vertex: f64,
    pub ayanamsa_offset: f64,
}

impl HouseCusps {
    /// House (1..=12) containing a sidereal longitude.
    pub fn house_of(&self, longitude: f64) -> u8 {
        let lon = normalize_degrees(longitude);
        for i in 0..12 {
            let start = self.cusps[i];
            let span = normalize_degrees(self.cusps[(i + 1) % 12] - start);
            if normalize_degrees(lon - start) < span {
                return i as u8 + 1;
            }
        }
        // only reachable through rounding on the 12th cusp
        12
    }

    pub fn cusp(&self, house: u8) -> f64 {
        self.cusps[usize::from((house.clamp(1, 12)) - 1)]
    }

    /// Sign on the cusp of a house; its lord rules the house.
    pub fn sign_of_house(&self, house: u8) -> u8 {
        sign_of(self.cusp(house))
    }

    pub fn ascendant_sign(&self) -> u8 {
        sign_of(self.ascendant)
    }

    pub fn fell_back(&self) -> bool {
        self.system != self.requested_system
    }
}

/// Computes cusps from sidereal time, obliquity and latitude.
#[derive(Debug, Clone, Copy, Default)]
pub struct HouseCalculator;

struct Frame {
    ramc: f64,
    obliquity: f64,
    latitude: f64,
}

impl HouseCalculator {
    pub fn new() -> Self {
        Self
    }

    pub fn calculate(&self, request: &ChartRequest) -> Result<HouseCusps, AnalysisError> {
        request.validate()?;
        let jd = request.julian_day();
        let t = (jd - J2000) / 36_525.0;
        let frame = Frame {
            ramc: normalize_degrees(greenwich_sidereal_time(jd) + request.location.lon),
            obliquity: 23.439_291 - 0.013_004_2 * t,
            latitude: request.location.lat,
        };

        let ascendant = oblique_to_ecliptic(frame.ramc + 90.0, frame.latitude, frame.obliquity);
        let midheaven = oblique_to_ecliptic(frame.ramc, 0.0, frame.obliquity);
        let colatitude = if frame.latitude >= 0.0 {
            90.0 - frame.latitude
        } else {
            -90.0 - frame.latitude
        };
        let vertex = oblique_to_ecliptic(frame.ramc - 90.0, colatitude, frame.obliquity);

        let requested = request.house_system;
        let system = if requested.is_time_based() && frame.latitude.abs() > POLAR_LIMIT {
            log::warn!(
                "{} houses undefined at latitude {:.2}, falling back to equal houses",
                requested,
                frame.latitude
            );
            HouseSystem::Equal
        } else {
            requested
        };

        let tropical = match system {
            HouseSystem::Equal => equal_cusps(ascendant),
            HouseSystem::WholeSign => whole_sign_cusps(ascendant),
            HouseSystem::Placidus => {
                let c11 = placidus_cusp(&frame, 1.0 / 3.0, true);
                let c12 = placidus_cusp(&frame, 2.0 / 3.0, true);
                let c2 = placidus_cusp(&frame, 2.0 / 3.0, false);
                let c3 = placidus_cusp(&frame, 1.0 / 3.0, false);
                quadrant_cusps(ascendant, midheaven, [c11, c12, c2, c3])
            }
            HouseSystem::Koch => quadrant_cusps(ascendant, midheaven, koch_cusps(&frame, midheaven)),
            HouseSystem::Regiomontanus => {
                let cusp = |h: f64| {
                    let pole = (frame.latitude.to_radians().tan() * h.to_radians().sin())
                        .atan()
                        .to_degrees();
                    oblique_to_ecliptic(frame.ramc + h, pole, frame.obliquity)
                };
                quadrant_cusps(
                    ascendant,
                    midheaven,
                    [cusp(30.0), cusp(60.0), cusp(120.0), cusp(150.0)],
                )
            }
            HouseSystem::Campanus => {
                let cusp = |h: f64| {
                    let (sin_h, cos_h) = h.to_radians().sin_cos();
                    let phi = frame.latitude.to_radians();
                    let pole = (phi.sin() * sin_h).asin().to_degrees();
                    let offset = (sin_h * phi.cos()).atan2(cos_h).to_degrees();
                    oblique_to_ecliptic(frame.ramc + offset, pole, frame.obliquity)
                };
                quadrant_cusps(
                    ascendant,
                    midheaven,
                    [cusp(30.0), cusp(60.0), cusp(120.0), cusp(150.0)],
                )
            }
        };

        let offset = request.ayanamsa_offset();
        let sidereal = |lon: f64| normalize_degrees(lon - offset);
        let cusps = if system == HouseSystem::WholeSign {
            // whole-sign cusps stay on sidereal sign boundaries
            whole_sign_cusps(sidereal(ascendant))
        } else {
            tropical.map(sidereal)
        };

        for (i, cusp) in cusps.iter().enumerate() {
            if !cusp.is_finite() {
                return Err(AnalysisError::calculation(
                    "houses",
                    format!(
                        "system={system} lat={} lon={} ts={}",
                        request.location.lat, request.location.lon, request.timestamp
                    ),
                    format!("cusp {} is not finite", i + 1),
                ));
            }
        }

        Ok(HouseCusps {
            system,
            requested_system: requested,
            cusps,
            ascendant: sidereal(ascendant),
            midheaven: sidereal(midheaven),
            vertex: sidereal(vertex),
            ayanamsa_offset: offset,
        })
    }
}

/// Greenwich mean sidereal time in degrees (IAU 1982).
fn greenwich_sidereal_time(jd: f64) -> f64 {
    let d = jd - J2000;
    let t = d / 36_525.0;
    normalize_degrees(
        280.460_618_37 + 360.985_647_366_29 * d + 0.000_387_933 * t * t - t * t * t / 38_710_000.0,
    )
}

/// Ecliptic longitude whose oblique ascension under `pole` equals `ra`.
fn oblique_to_ecliptic(ra: f64, pole: f64, obliquity: f64) -> f64 {
    let (sin_r, cos_r) = ra.to_radians().sin_cos();
    let (sin_e, cos_e) = obliquity.to_radians().sin_cos();
    let y = sin_r;
    let x = cos_r * cos_e - pole.to_radians().tan() * sin_e;
    normalize_degrees(y.atan2(x).to_degrees())
}

/// Ecliptic longitude with the given right ascension.
fn ecliptic_from_right_ascension(ra: f64, obliquity: f64) -> f64 {
    let (sin_r, cos_r) = ra.to_radians().sin_cos();
    normalize_degrees(sin_r.atan2(cos_r * obliquity.to_radians().cos()).to_degrees())
}

/// Ascensional difference of an ecliptic point.
fn ascensional_difference(longitude: f64, obliquity: f64, latitude: f64) -> f64 {
    let declination = (obliquity.to_radians().sin() * longitude.to_radians().sin()).asin();
    (latitude.to_radians().tan() * declination.tan())
        .clamp(-1.0, 1.0)
        .asin()
        .to_degrees()
}

fn equal_cusps(ascendant: f64) -> [f64; 12] {
    std::array::from_fn(|i| normalize_degrees(ascendant + i as f64 * SIGN_SPAN))
}

fn whole_sign_cusps(ascendant: f64) -> [f64; 12] {
    let start = f64::from(sign_of(ascendant)) * SIGN_SPAN;
    std::array::from_fn(|i| normalize_degrees(start + i as f64 * SIGN_SPAN))
}

/// Assemble twelve cusps from the angles and the cusps of houses 11, 12, 2, 3.
fn quadrant_cusps(ascendant: f64, midheaven: f64, [c11, c12, c2, c3]: [f64; 4]) -> [f64; 12] {
    let mut cusps = [0.0; 12];
    cusps[0] = ascendant;
    cusps[1] = c2;
    cusps[2] = c3;
    cusps[9] = midheaven;
    cusps[10] = c11;
    cusps[11] = c12;
    for i in 3..9 {
        cusps[i] = normalize_degrees(cusps[(i + 6) % 12] + 180.0);
    }
    cusps
}

/// Placidus cusp by fixed-point iteration on the cusp's own semi-arc.
fn placidus_cusp(frame: &Frame, fraction: f64, above_horizon: bool) -> f64 {
    let project = |ad: f64| {
        if above_horizon {
            frame.ramc + fraction * (90.0 + ad)
        } else {
            frame.ramc + 180.0 - fraction * (90.0 - ad)
        }
    };
    let mut ra = project(0.0);
    let mut longitude = ecliptic_from_right_ascension(ra, frame.obliquity);
    for _ in 0..PLACIDUS_MAX_ITERATIONS {
        let ad = ascensional_difference(longitude, frame.obliquity, frame.latitude);
        let next = project(ad);
        let converged = (next - ra).abs() < PLACIDUS_TOLERANCE;
        ra = next;
        longitude = ecliptic_from_right_ascension(ra, frame.obliquity);
        if converged {
            break;
        }
    }
    longitude
}

/// Koch cusps trisect the midheaven degree's semi-arcs in oblique ascension.
fn koch_cusps(frame: &Frame, midheaven: f64) -> [f64; 4] {
    let ad = ascensional_difference(midheaven, frame.obliquity, frame.latitude);
    let diurnal = 90.0 + ad;
    let nocturnal = 90.0 - ad;
    let oa_mc = frame.ramc - ad;
    let rising = |oa: f64| oblique_to_ecliptic(oa, frame.latitude, frame.obliquity);
    let ascendant_oa = oa_mc + diurnal;
    [
        rising(oa_mc + diurnal / 3.0),
        rising(oa_mc + 2.0 * diurnal / 3.0),
        rising(ascendant_oa + nocturnal / 3.0),
        rising(ascendant_oa + 2.0 * nocturnal / 3.0),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ephemeris::{Ayanamsa, GeoLocation};
    use crate::zodiac::angular_distance;
    use chrono::{TimeZone, Utc};

    fn request(lat: f64, system: HouseSystem) -> ChartRequest {
        ChartRequest::new(
            Utc.with_ymd_and_hms(2000, 1, 1, 12, 0, 0).unwrap(),
            GeoLocation::new(lat, 0.0, 0.0),
            Ayanamsa::Lahiri,
            system,
        )
    }

    #[test]
    fn test_gmst_at_j2000() {
        assert!((greenwich_sidereal_time(J2000) - 280.460_618_37).abs() < 1e-6);
    }

    #[test]
    fn test_quadrant_systems_share_angles() {
        for system in [
            HouseSystem::Placidus,
            HouseSystem::Koch,
            HouseSystem::Regiomontanus,
            HouseSystem::Campanus,
        ] {
            let houses = HouseCalculator::new().calculate(&request(40.0, system)).unwrap();
            assert!(angular_distance(houses.cusps[0], houses.ascendant) < 1e-9, "{system}");
            assert!(angular_distance(houses.cusps[9], houses.midheaven) < 1e-9, "{system}");
            assert!(angular_distance(houses.cusps[6], houses.cusps[0]) > 179.999, "{system}");
        }
    }

    #[test]
    fn test_cusps_progress_around_the_zodiac() {
        for system in HouseSystem::ALL {
            let houses = HouseCalculator::new().calculate(&request(35.0, system)).unwrap();
            let total: f64 = (0..12)
                .map(|i| normalize_degrees(houses.cusps[(i + 1) % 12] - houses.cusps[i]))
                .sum();
            assert!((total - 360.0).abs() < 1e-6, "{system}: {total}");
        }
    }

    #[test]
    fn test_equal_houses_are_thirty_degrees() {
        let houses = HouseCalculator::new()
            .calculate(&request(51.5, HouseSystem::Equal))
            .unwrap();
        for i in 0..12 {
            let span = normalize_degrees(houses.cusps[(i + 1) % 12] - houses.cusps[i]);
            assert!((span - 30.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_whole_sign_cusps_on_boundaries() {
        let houses = HouseCalculator::new()
            .calculate(&request(12.0, HouseSystem::WholeSign))
            .unwrap();
        for cusp in houses.cusps {
            assert!((cusp % 30.0).abs() < 1e-9);
        }
        assert_eq!(houses.house_of(houses.ascendant), 1);
    }

    #[test]
    fn test_polar_fallback_to_equal() {
        let houses = HouseCalculator::new()
            .calculate(&request(70.0, HouseSystem::Placidus))
            .unwrap();
        assert_eq!(houses.system, HouseSystem::Equal);
        assert_eq!(houses.requested_system, HouseSystem::Placidus);
        assert!(houses.fell_back());
    }

    #[test]
    fn test_house_of_wraps_past_pisces() {
        let mut cusps = [0.0; 12];
        for (i, c) in cusps.iter_mut().enumerate() {
            *c = normalize_degrees(345.0 + i as f64 * 30.0);
        }
        let houses = HouseCusps {
            system: HouseSystem::Equal,
            requested_system: HouseSystem::Equal,
            cusps,
            ascendant: 345.0,
            midheaven: 255.0,
            vertex: 165.0,
            ayanamsa_offset: 0.0,
        };
        assert_eq!(houses.house_of(350.0), 1);
        assert_eq!(houses.house_of(5.0), 1);
        assert_eq!(houses.house_of(15.0), 2);
        assert_eq!(houses.house_of(344.0), 12);
    }

    #[test]
    fn test_invalid_latitude_rejected() {
        let err = HouseCalculator::new()
            .calculate(&request(95.0, HouseSystem::Equal))
            .unwrap_err();
        assert_eq!(err.code(), "INVALID_INPUT");
    }
}
