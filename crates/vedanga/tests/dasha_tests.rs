use std::collections::BTreeMap;

use chrono::{DateTime, Duration, TimeZone, Utc};
use vedanga::vedic::{DashaEngine, DashaState, DashaSystem};
use vedanga::Body;

fn birth() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(1985, 3, 21, 6, 15, 0).unwrap()
}

#[test]
fn test_moon_at_zero_begins_with_ketu() {
    let engine = DashaEngine::new(DashaSystem::Vimshottari, 1).unwrap();
    let timeline = engine.calculate(birth(), 0.0, &BTreeMap::new()).unwrap();

    assert_eq!(timeline.nakshatra.index, 0);
    assert_eq!(timeline.periods[0].major(), Some(Body::Ketu));
    assert_eq!(timeline.periods[0].start, birth());
}

#[test]
fn test_full_cycle_is_120_years() {
    let engine = DashaEngine::new(DashaSystem::Vimshottari, 1).unwrap();
    let timeline = engine.calculate(birth(), 0.0, &BTreeMap::new()).unwrap();

    let total: f64 = timeline.periods.iter().map(|p| p.years).sum();
    assert!((total - 120.0).abs() < 1e-9);
    assert_eq!(timeline.periods.len(), 9);
}

#[test]
fn test_first_major_truncated_by_birth_balance() {
    let engine = DashaEngine::new(DashaSystem::Vimshottari, 1).unwrap();
    // halfway through Bharani (Venus, 20 years)
    let moon = 13.0 + 1.0 / 3.0 + 20.0 / 3.0;
    let timeline = engine.calculate(birth(), moon, &BTreeMap::new()).unwrap();

    assert_eq!(timeline.periods[0].major(), Some(Body::Venus));
    assert!((timeline.periods[0].years - 10.0).abs() < 1e-9);
    let rest: f64 = timeline.periods[1..].iter().map(|p| p.years).sum();
    assert!((rest - 100.0).abs() < 1e-9);
}

#[test]
fn test_periods_are_contiguous() {
    let engine = DashaEngine::new(DashaSystem::Vimshottari, 3).unwrap();
    let timeline = engine.calculate(birth(), 211.0, &BTreeMap::new()).unwrap();

    for pair in timeline.periods.windows(2) {
        assert_eq!(pair[0].end, pair[1].start);
    }
    for major in &timeline.periods {
        assert_eq!(major.children.first().unwrap().start, major.start);
        assert_eq!(major.children.last().unwrap().end, major.end);
        for pair in major.children.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
        }
    }
}

#[test]
fn test_sub_periods_sum_to_major() {
    let engine = DashaEngine::new(DashaSystem::Vimshottari, 2).unwrap();
    let timeline = engine.calculate(birth(), 211.0, &BTreeMap::new()).unwrap();

    for major in &timeline.periods {
        assert_eq!(major.children.len(), 9);
        assert_eq!(major.children[0].sub(), major.major());
        let sum: f64 = major.children.iter().map(|c| c.years).sum();
        assert!((sum - major.years).abs() < 1e-9, "{:?}", major.major());
    }
}

#[test]
fn test_cycles_repeat_the_sequence() {
    let engine = DashaEngine::new(DashaSystem::Vimshottari, 1).unwrap();
    let timeline = engine.calculate(birth(), 0.0, &BTreeMap::new()).unwrap();

    let majors = timeline.cycles(2);
    assert_eq!(majors.len(), 18);
    assert_eq!(majors[9].major(), Some(Body::Ketu));
    assert_eq!(majors[8].end, majors[9].start);
    assert!((majors[9].years - 7.0).abs() < 1e-9);
}

#[test]
fn test_yogini_cycle_is_36_years() {
    let engine = DashaEngine::new(DashaSystem::Yogini, 1).unwrap();
    let timeline = engine.calculate(birth(), 0.0, &BTreeMap::new()).unwrap();

    assert_eq!(timeline.periods.len(), 8);
    let total: f64 = timeline.periods.iter().map(|p| p.years).sum();
    assert!((total - 36.0).abs() < 1e-9);
}

#[test]
fn test_active_state() {
    let engine = DashaEngine::new(DashaSystem::Vimshottari, 2).unwrap();
    let timeline = engine.calculate(birth(), 0.0, &BTreeMap::new()).unwrap();

    assert_eq!(
        timeline.active_at(birth() - Duration::days(1), 2),
        DashaState::BeforeBirth
    );
    match timeline.active_at(birth() + Duration::days(3650), 2) {
        DashaState::Sub { major, sub } => {
            assert_eq!(major.major(), Some(Body::Venus));
            assert!(sub.contains(birth() + Duration::days(3650)));
        }
        other => panic!("unexpected state {other:?}"),
    }
    assert_eq!(
        timeline.active_at(birth() + Duration::days(365 * 130), 1),
        DashaState::Elapsed
    );
}

#[test]
fn test_strengths_attached_to_periods() {
    let mut strengths = BTreeMap::new();
    strengths.insert(Body::Ketu, 40.0);
    strengths.insert(Body::Venus, 80.0);
    let engine = DashaEngine::new(DashaSystem::Vimshottari, 2).unwrap();
    let timeline = engine.calculate(birth(), 0.0, &strengths).unwrap();

    let ketu = &timeline.periods[0];
    assert_eq!(ketu.strength, Some(40.0));
    // Ketu/Venus averages both lords
    assert_eq!(ketu.children[1].strength, Some(60.0));
    // Ketu/Sun only knows Ketu
    assert_eq!(ketu.children[2].strength, Some(40.0));
}

#[test]
fn test_rejects_non_finite_moon() {
    let engine = DashaEngine::new(DashaSystem::Vimshottari, 1).unwrap();
    assert!(engine.calculate(birth(), f64::NAN, &BTreeMap::new()).is_err());
    assert!(DashaEngine::new(DashaSystem::Vimshottari, 0).is_err());
}
