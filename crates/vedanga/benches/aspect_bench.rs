use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::collections::BTreeMap;
use vedanga::aspects::{AspectEngine, AspectKind};
use vedanga::{Body, BodyState, PlanetaryPosition};

fn positions() -> BTreeMap<Body, PlanetaryPosition> {
    Body::ALL
        .iter()
        .enumerate()
        .map(|(i, &body)| {
            let state = BodyState::new(i as f64 * 41.3, 0.0, 1.0, 1.0 - i as f64 * 0.2);
            (body, PlanetaryPosition::from_state(body, &state, (i % 12) as u8 + 1))
        })
        .collect()
}

fn bench_calculate_aspect(c: &mut Criterion) {
    let engine = AspectEngine::default();
    let sun = PlanetaryPosition::from_state(Body::Sun, &BodyState::new(100.0, 0.0, 1.0, 1.0), 1);
    let moon = PlanetaryPosition::from_state(Body::Moon, &BodyState::new(102.0, 0.0, 1.0, 13.0), 1);
    let conjunction = *engine.table().get(AspectKind::Conjunction).unwrap();

    c.bench_function("calculate_aspect", |b| {
        b.iter(|| engine.calculate_aspect(black_box(&sun), black_box(&moon), black_box(&conjunction)))
    });
}

fn bench_calculate_aspects(c: &mut Criterion) {
    let engine = AspectEngine::default();
    let positions = positions();

    c.bench_function("calculate_aspects", |b| {
        b.iter(|| engine.calculate_aspects(black_box(&positions)))
    });
}

criterion_group!(benches, bench_calculate_aspect, bench_calculate_aspects);
criterion_main!(benches);
