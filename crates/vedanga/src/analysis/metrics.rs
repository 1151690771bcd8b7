use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Engine {
    Ephemeris,
    Houses,
    Aspects,
    Vargas,
    Strength,
    HouseAnalysis,
    Yogas,
    Dashas,
}

/// Engine invocation counters.
#[derive(Debug, Default)]
pub struct EngineMetrics {
    ephemeris: AtomicU64,
    houses: AtomicU64,
    aspects: AtomicU64,
    vargas: AtomicU64,
    strength: AtomicU64,
    house_analysis: AtomicU64,
    yogas: AtomicU64,
    dashas: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub ephemeris: u64,
    pub houses: u64,
    pub aspects: u64,
    pub vargas: u64,
    pub strength: u64,
    pub house_analysis: u64,
    pub yogas: u64,
    pub dashas: u64,
}

impl MetricsSnapshot {
    pub fn total(&self) -> u64 {
        self.ephemeris
            + self.houses
            + self.aspects
            + self.vargas
            + self.strength
            + self.house_analysis
            + self.yogas
            + self.dashas
    }
}

impl EngineMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    fn counter(&self, engine: Engine) -> &AtomicU64 {
        match engine {
            Engine::Ephemeris => &self.ephemeris,
            Engine::Houses => &self.houses,
            Engine::Aspects => &self.aspects,
            Engine::Vargas => &self.vargas,
            Engine::Strength => &self.strength,
            Engine::HouseAnalysis => &self.house_analysis,
            Engine::Yogas => &self.yogas,
            Engine::Dashas => &self.dashas,
        }
    }

    pub fn record(&self, engine: Engine) {
        self.record_n(engine, 1);
    }

    pub fn record_n(&self, engine: Engine, n: u64) {
        self.counter(engine).fetch_add(n, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let load = |engine| self.counter(engine).load(Ordering::Relaxed);
        MetricsSnapshot {
            ephemeris: load(Engine::Ephemeris),
            houses: load(Engine::Houses),
            aspects: load(Engine::Aspects),
            vargas: load(Engine::Vargas),
            strength: load(Engine::Strength),
            house_analysis: load(Engine::HouseAnalysis),
            yogas: load(Engine::Yogas),
            dashas: load(Engine::Dashas),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_snapshot() {
        let metrics = EngineMetrics::new();
        metrics.record(Engine::Aspects);
        metrics.record_n(Engine::Strength, 9);
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.aspects, 1);
        assert_eq!(snapshot.strength, 9);
        assert_eq!(snapshot.total(), 10);
    }
}
