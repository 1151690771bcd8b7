//! Orchestration, caching and instrumentation.

pub mod analyzer;
pub mod cache;
pub mod fingerprint;
pub mod metrics;
pub mod report;

pub use analyzer::UnifiedAnalyzer;
pub use cache::{CacheBackend, CacheError, CacheStats, Cacheable, ComputeCache, MemoryBackend};
pub use fingerprint::Fingerprint;
pub use metrics::{Engine, EngineMetrics, MetricsSnapshot};
pub use report::{
    ChartAnalysis, PrimaryInfluences, RankedHouse, RankedPlanet, RankedYoga, Recommendation,
    RecommendationSubject,
};
