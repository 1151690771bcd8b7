mod common;

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{TimeZone, Utc};
use vedanga::aspects::AspectEngine;
use vedanga::houses::HouseCalculator;
use vedanga::vedic::house_analysis::{strongest, weakest, HouseGroup};
use vedanga::vedic::{
    analyze_house_combinations, DignityTables, HouseAnalysisEngine, StrengthContext,
    StrengthEngine, StrengthResult,
};
use vedanga::zodiac::{angular_distance, normalize_degrees, sign_of};
use vedanga::{Ayanamsa, Body, ChartRequest, GeoLocation, HouseSystem, NatalChart};

fn request(lat: f64, system: HouseSystem, ayanamsa: Ayanamsa) -> ChartRequest {
    ChartRequest::new(
        Utc.with_ymd_and_hms(2001, 9, 9, 14, 45, 0).unwrap(),
        GeoLocation::new(lat, -0.1276, 11.0),
        ayanamsa,
        system,
    )
}

#[test]
fn test_all_systems_produce_valid_cusps() {
    let calculator = HouseCalculator::new();
    for system in HouseSystem::ALL {
        for lat in [-45.0, -10.0, 0.0, 28.6, 51.5, 60.0] {
            let cusps = calculator
                .calculate(&request(lat, system, Ayanamsa::Lahiri))
                .unwrap();
            assert_eq!(cusps.requested_system, system);
            for cusp in cusps.cusps {
                assert!((0.0..360.0).contains(&cusp), "{system} at {lat}: {cusp}");
            }
            assert!((0.0..360.0).contains(&cusps.ascendant));
            assert!((0.0..360.0).contains(&cusps.midheaven));
        }
    }
}

#[test]
fn test_whole_sign_starts_at_ascendant_sign() {
    let cusps = HouseCalculator::new()
        .calculate(&request(51.5, HouseSystem::WholeSign, Ayanamsa::Lahiri))
        .unwrap();
    let first = cusps.ascendant_sign();
    for (i, cusp) in cusps.cusps.iter().enumerate() {
        assert_eq!(*cusp, f64::from((first + i as u8) % 12) * 30.0);
    }
    assert_eq!(cusps.house_of(cusps.ascendant), 1);
    assert_eq!(sign_of(cusps.cusp(1)), first);
}

#[test]
fn test_polar_latitude_falls_back_to_equal() {
    let cusps = HouseCalculator::new()
        .calculate(&request(70.0, HouseSystem::Placidus, Ayanamsa::Lahiri))
        .unwrap();
    assert!(cusps.fell_back());
    assert_eq!(cusps.system, HouseSystem::Equal);
    assert_eq!(cusps.requested_system, HouseSystem::Placidus);
}

#[test]
fn test_ayanamsa_shifts_every_angle() {
    let calculator = HouseCalculator::new();
    let lahiri = calculator
        .calculate(&request(28.6, HouseSystem::Equal, Ayanamsa::Lahiri))
        .unwrap();
    let raman = calculator
        .calculate(&request(28.6, HouseSystem::Equal, Ayanamsa::Raman))
        .unwrap();

    let expected = lahiri.ayanamsa_offset - raman.ayanamsa_offset;
    let shift = normalize_degrees(raman.ascendant - lahiri.ascendant);
    assert!((shift - expected).abs() < 1e-9);
    assert!((angular_distance(raman.midheaven, lahiri.midheaven) - expected).abs() < 1e-9);
}

#[test]
fn test_invalid_location_rejected() {
    let err = HouseCalculator::new()
        .calculate(&request(91.0, HouseSystem::Koch, Ayanamsa::Lahiri))
        .unwrap_err();
    assert_eq!(err.code(), "INVALID_INPUT");
}

fn analyzed_houses() -> Vec<vedanga::vedic::HouseStrength> {
    let tables = Arc::new(DignityTables::classical());
    let natal = NatalChart::build(
        &common::delhi_ephemeris(),
        &HouseCalculator::new(),
        &common::delhi_request(),
    )
    .unwrap();
    let engine = AspectEngine::default();
    let aspects = engine.calculate_aspects(&natal.positions);
    let special = engine.special_aspects(&natal.positions);
    let context = StrengthContext::from_chart(&natal, &aspects);
    let strength = StrengthEngine::new(Arc::clone(&tables));
    let strengths: BTreeMap<Body, StrengthResult> = natal
        .positions
        .values()
        .map(|p| (p.body, strength.calculate_strength(p, &context)))
        .collect();

    HouseAnalysisEngine::new(tables)
        .analyze_chart(&natal, &strengths, &aspects, &special)
        .unwrap()
}

#[test]
fn test_chart_houses_scored() {
    let houses = analyzed_houses();
    assert_eq!(houses.len(), 12);
    for (i, house) in houses.iter().enumerate() {
        assert_eq!(usize::from(house.house), i + 1);
        assert!((0.0..=100.0).contains(&house.total));
        assert!(!house.significations.is_empty());
    }
    let occupied: usize = houses.iter().map(|h| h.occupants.len()).sum();
    assert_eq!(occupied, 9);
}

#[test]
fn test_ranking_and_groups() {
    let houses = analyzed_houses();
    let best = strongest(&houses, 3);
    let worst = weakest(&houses, 3);
    assert_eq!(best.len(), 3);
    assert!(best[0].total >= best[1].total && best[1].total >= best[2].total);
    assert!(worst[0].total <= worst[1].total);
    assert!(best[0].total >= worst[0].total);

    let combinations = analyze_house_combinations(&houses);
    assert_eq!(combinations.len(), HouseGroup::ALL.len());
    let kendra = combinations
        .iter()
        .find(|c| c.group == HouseGroup::Kendra)
        .unwrap();
    assert_eq!(kendra.houses, vec![1, 4, 7, 10]);
}
