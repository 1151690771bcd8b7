mod common;

use std::sync::Arc;

use vedanga::aspects::AspectEngine;
use vedanga::houses::HouseCalculator;
use vedanga::vedic::{DignityTables, StrengthContext, StrengthEngine};
use vedanga::{Body, BodyState, NatalChart, PlanetaryPosition};

#[test]
fn test_percentage_bounded_everywhere() {
    let engine = StrengthEngine::new(Arc::new(DignityTables::classical()));
    let speeds = [-2.0, -0.01, 0.0, 0.05, 1.0, 15.0, 40.0];

    for body in Body::ALL {
        for step in 0..72 {
            let longitude = f64::from(step) * 5.0 + 0.25;
            for (i, &speed) in speeds.iter().enumerate() {
                let house = (step as u8 + i as u8) % 12 + 1;
                let position = PlanetaryPosition::from_state(
                    body,
                    &BodyState::new(longitude, 0.0, 1.0, speed),
                    house,
                );
                for is_daytime in [true, false] {
                    for third in 0..3 {
                        let context = StrengthContext {
                            is_daytime,
                            third,
                            aspects: &[],
                        };
                        let result = engine.calculate_strength(&position, &context);
                        assert!(
                            (0.0..=100.0).contains(&result.percentage),
                            "{body} at {longitude} speed {speed}: {}",
                            result.percentage
                        );
                        assert!((0.0..=6.0).contains(&result.total));
                    }
                }
            }
        }
    }
}

#[test]
fn test_exalted_sun_outscores_debilitated_sun() {
    let engine = StrengthEngine::new(Arc::new(DignityTables::classical()));
    let context = StrengthContext {
        is_daytime: true,
        third: 0,
        aspects: &[],
    };
    let exalted = PlanetaryPosition::from_state(Body::Sun, &BodyState::new(10.0, 0.0, 1.0, 1.0), 10);
    let debilitated =
        PlanetaryPosition::from_state(Body::Sun, &BodyState::new(190.0, 0.0, 1.0, 1.0), 10);

    let exalted = engine.calculate_strength(&exalted, &context);
    let debilitated = engine.calculate_strength(&debilitated, &context);
    assert!(exalted.percentage > debilitated.percentage);
    assert!(exalted.positional > debilitated.positional);
    assert_eq!(exalted.directional, 1.0);
}

#[test]
fn test_chart_strengths_with_aspects() {
    let request = common::delhi_request();
    let natal = NatalChart::build(
        &common::delhi_ephemeris(),
        &HouseCalculator::new(),
        &request,
    )
    .unwrap();
    let aspects = AspectEngine::default().calculate_aspects(&natal.positions);
    let context = StrengthContext::from_chart(&natal, &aspects);
    let engine = StrengthEngine::new(Arc::new(DignityTables::classical()));

    for position in natal.positions.values() {
        let result = engine.calculate_strength(position, &context);
        assert_eq!(result.body, position.body);
        assert!((0.0..=100.0).contains(&result.percentage));
        assert!((0.0..=1.0).contains(&result.aspectual));
        assert!(context.third <= 2);
    }
}
