use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::analysis::cache::{CacheBackend, CacheStats, ComputeCache, MemoryBackend};
use crate::analysis::fingerprint::Fingerprint;
use crate::analysis::metrics::{Engine, EngineMetrics, MetricsSnapshot};
use crate::analysis::report::{
    ChartAnalysis, PrimaryInfluences, RankedHouse, RankedPlanet, RankedYoga, Recommendation,
    RecommendationSubject,
};
use crate::aspects::{Aspect, AspectEngine, AspectTable};
use crate::chart::NatalChart;
use crate::config::AnalyzerConfig;
use crate::ephemeris::{Body, ChartRequest, EphemerisProvider};
use crate::error::AnalysisError;
use crate::houses::HouseCalculator;
use crate::vedic::dashas::DashaEngine;
use crate::vedic::dignity::DignityTables;
use crate::vedic::house_analysis::{analyze_house_combinations, strongest, HouseAnalysisEngine, HouseStrength};
use crate::vedic::strength::{StrengthContext, StrengthEngine, StrengthResult};
use crate::vedic::vargas::{Division, DivisionalChart, DivisionalChartEngine};
use crate::vedic::yogas::{top_yogas, YogaDetector, YogaResult};

const PRIMARY_COUNT: usize = 3;

const PLANET_WEIGHT: f64 = 0.35;
const HOUSE_WEIGHT: f64 = 0.25;
const ASPECT_WEIGHT: f64 = 0.20;
const YOGA_WEIGHT: f64 = 0.20;

const PLANET_SIGNIFICATIONS: [&str; 9] = [
    "vitality and authority",
    "mind and emotional steadiness",
    "drive and courage",
    "intellect and communication",
    "wisdom and growth",
    "relationships and comforts",
    "discipline and endurance",
    "ambition and worldly desire",
    "detachment and insight",
];

/// Orchestrates every engine into one cached [`ChartAnalysis`].
pub struct UnifiedAnalyzer {
    config: AnalyzerConfig,
    divisions: Vec<Division>,
    provider: Arc<dyn EphemerisProvider>,
    houses: HouseCalculator,
    aspects: AspectEngine,
    vargas: DivisionalChartEngine,
    strength: StrengthEngine,
    house_analysis: HouseAnalysisEngine,
    yogas: YogaDetector,
    dashas: DashaEngine,
    cache: ComputeCache<ChartAnalysis>,
    metrics: Arc<EngineMetrics>,
}

impl UnifiedAnalyzer {
    /// Analyzer with an in-memory cache when `config.cache.enabled`.
    pub fn new(
        provider: Arc<dyn EphemerisProvider>,
        config: AnalyzerConfig,
    ) -> Result<Self, AnalysisError> {
        config.validate()?;
        let backend: Option<Arc<dyn CacheBackend>> = if config.cache.enabled {
            Some(Arc::new(MemoryBackend::new(config.cache_capacity()?)))
        } else {
            None
        };
        Self::with_backend(provider, config, backend)
    }

    /// Analyzer over an explicit cache backend (`None` disables caching).
    pub fn with_backend(
        provider: Arc<dyn EphemerisProvider>,
        config: AnalyzerConfig,
        backend: Option<Arc<dyn CacheBackend>>,
    ) -> Result<Self, AnalysisError> {
        config.validate()?;
        let divisions = config.resolved_divisions()?;
        let tables = Arc::new(DignityTables::classical());
        let aspect_table = Arc::new(AspectTable::classical().with_orbs(&config.resolved_orbs()?)?);
        let metrics = Arc::new(EngineMetrics::new());
        let ttl = config.cache.ttl();
        let (analysis_cache, varga_cache) = match backend {
            Some(backend) => (
                ComputeCache::new("analysis", Arc::clone(&backend), ttl),
                ComputeCache::new("varga", backend, ttl),
            ),
            None => (
                ComputeCache::disabled("analysis"),
                ComputeCache::disabled("varga"),
            ),
        };

        Ok(Self {
            divisions,
            houses: HouseCalculator::new(),
            aspects: AspectEngine::new(aspect_table, Arc::clone(&tables)),
            vargas: DivisionalChartEngine::new(
                Arc::clone(&provider),
                varga_cache,
                Arc::clone(&metrics),
            ),
            strength: StrengthEngine::new(Arc::clone(&tables)),
            house_analysis: HouseAnalysisEngine::new(Arc::clone(&tables)),
            yogas: YogaDetector::new(tables),
            dashas: DashaEngine::new(config.dasha_system, config.dasha_depth)?,
            cache: analysis_cache,
            metrics,
            provider,
            config,
        })
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn analyze_chart(&self, request: &ChartRequest) -> Result<Arc<ChartAnalysis>, AnalysisError> {
        self.analyze(request, None)
    }

    /// Like [`analyze_chart`](Self::analyze_chart) but aborts between stages
    /// once `deadline` has passed. Aborted runs are never cached.
    pub fn analyze_chart_with_deadline(
        &self,
        request: &ChartRequest,
        deadline: Duration,
    ) -> Result<Arc<ChartAnalysis>, AnalysisError> {
        self.analyze(request, Some(Instant::now() + deadline))
    }

    /// One memoized divisional chart, outside a full analysis.
    pub fn divisional_chart(
        &self,
        request: &ChartRequest,
        division: Division,
    ) -> Result<Arc<DivisionalChart>, AnalysisError> {
        self.vargas.calculate_chart(request, division)
    }

    fn analyze(
        &self,
        request: &ChartRequest,
        deadline: Option<Instant>,
    ) -> Result<Arc<ChartAnalysis>, AnalysisError> {
        request.validate()?;
        let key = Fingerprint::of_request(request);
        self.cache
            .get_or_compute(&key, || self.compute(request, &key, deadline))
    }

    fn compute(
        &self,
        request: &ChartRequest,
        key: &Fingerprint,
        deadline: Option<Instant>,
    ) -> Result<ChartAnalysis, AnalysisError> {
        let started = Instant::now();
        let checkpoint = |stage: &'static str| -> Result<(), AnalysisError> {
            log::debug!("analysis {key}: {stage} at {:?}", started.elapsed());
            match deadline {
                Some(deadline) if Instant::now() >= deadline => {
                    log::warn!("analysis {key} aborted before {stage}: deadline exceeded");
                    Err(AnalysisError::Timeout { stage })
                }
                _ => Ok(()),
            }
        };

        checkpoint("ephemeris")?;
        self.metrics.record(Engine::Ephemeris);
        self.metrics.record(Engine::Houses);
        let natal = NatalChart::build(self.provider.as_ref(), &self.houses, request)?;

        checkpoint("aspects")?;
        self.metrics.record(Engine::Aspects);
        let aspects = self.aspects.calculate_aspects(&natal.positions);
        let special_aspects = if self.config.special_aspects {
            self.aspects.special_aspects(&natal.positions)
        } else {
            Vec::new()
        };

        checkpoint("vargas")?;
        let divisional_charts = self
            .divisions
            .iter()
            .map(|&division| {
                self.vargas
                    .chart_for(&natal, division)
                    .map(|chart| chart.as_ref().clone())
            })
            .collect::<Result<Vec<_>, _>>()?;

        checkpoint("strength")?;
        let context = StrengthContext::from_chart(&natal, &aspects);
        let strengths: BTreeMap<Body, StrengthResult> = natal
            .positions
            .values()
            .map(|position| (position.body, self.strength.calculate_strength(position, &context)))
            .collect();
        self.metrics.record_n(Engine::Strength, strengths.len() as u64);

        checkpoint("house_analysis")?;
        self.metrics.record(Engine::HouseAnalysis);
        let house_strengths =
            self.house_analysis
                .analyze_chart(&natal, &strengths, &aspects, &special_aspects)?;
        let house_combinations = analyze_house_combinations(&house_strengths);

        checkpoint("yogas")?;
        self.metrics.record(Engine::Yogas);
        let detection = self.yogas.detect(&natal, &aspects);
        let yogas = top_yogas(&detection.yogas, self.config.top_yogas);

        checkpoint("dashas")?;
        self.metrics.record(Engine::Dashas);
        let moon = natal.require(Body::Moon, "dasha")?;
        let percentages: BTreeMap<Body, f64> = strengths
            .iter()
            .map(|(body, result)| (*body, result.percentage))
            .collect();
        let dasha = self
            .dashas
            .calculate(request.timestamp, moon.longitude, &percentages)?;

        let chart_strength = chart_strength(&strengths, &house_strengths, &aspects, &yogas);
        let primary_influences = primary_influences(&strengths, &house_strengths, &yogas);
        let recommendations = recommendations(
            &strengths,
            &house_strengths,
            self.config.recommendation_threshold,
        );
        let degraded = detection.is_degraded();
        if degraded {
            log::warn!(
                "analysis {key} is degraded: {} yoga rule(s) failed",
                detection.failures.len()
            );
        }
        log::info!(
            "analysis {key} computed in {:?} (chart strength {:.1})",
            started.elapsed(),
            chart_strength
        );

        Ok(ChartAnalysis {
            fingerprint: key.to_string(),
            request: request.clone(),
            positions: natal.positions,
            houses: natal.houses,
            aspects,
            special_aspects,
            divisional_charts,
            strengths,
            house_strengths,
            house_combinations,
            yogas,
            dasha,
            chart_strength,
            primary_influences,
            recommendations,
            degraded,
            failures: detection.failures,
        })
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

/// 0.35 planets + 0.25 houses + 0.20 aspects + 0.20 yogas.
fn chart_strength(
    strengths: &BTreeMap<Body, StrengthResult>,
    houses: &[HouseStrength],
    aspects: &[Aspect],
    yogas: &[YogaResult],
) -> f64 {
    let planets = mean(strengths.values().map(|s| s.percentage));
    let houses = mean(houses.iter().map(|h| h.total));
    let aspects = mean(aspects.iter().map(|a| a.influence));
    let yogas = mean(yogas.iter().map(|y| y.strength));
    (PLANET_WEIGHT * planets + HOUSE_WEIGHT * houses + ASPECT_WEIGHT * aspects + YOGA_WEIGHT * yogas)
        .clamp(0.0, 100.0)
}

fn primary_influences(
    strengths: &BTreeMap<Body, StrengthResult>,
    houses: &[HouseStrength],
    yogas: &[YogaResult],
) -> PrimaryInfluences {
    let mut planets: Vec<RankedPlanet> = strengths
        .values()
        .map(|s| RankedPlanet {
            body: s.body,
            percentage: s.percentage,
        })
        .collect();
    planets.sort_by(|a, b| {
        b.percentage
            .total_cmp(&a.percentage)
            .then(a.body.cmp(&b.body))
    });
    planets.truncate(PRIMARY_COUNT);

    PrimaryInfluences {
        planets,
        houses: strongest(houses, PRIMARY_COUNT)
            .into_iter()
            .map(|h| RankedHouse {
                house: h.house,
                total: h.total,
            })
            .collect(),
        yogas: yogas
            .iter()
            .take(PRIMARY_COUNT)
            .map(|y| RankedYoga {
                kind: y.kind,
                name: y.name.clone(),
                strength: y.strength,
            })
            .collect(),
    }
}

fn recommendations(
    strengths: &BTreeMap<Body, StrengthResult>,
    houses: &[HouseStrength],
    threshold: f64,
) -> Vec<Recommendation> {
    let planets = strengths
        .values()
        .filter(|s| s.percentage < threshold)
        .map(|s| Recommendation {
            subject: RecommendationSubject::Planet(s.body),
            score: s.percentage,
            message: format!(
                "{} is weak ({:.1}%): support {} through its remedial practices",
                s.body,
                s.percentage,
                PLANET_SIGNIFICATIONS[s.body.index()]
            ),
        });
    let houses = houses.iter().filter(|h| h.total < threshold).map(|h| Recommendation {
        subject: RecommendationSubject::House(h.house),
        score: h.total,
        message: format!(
            "House {} is weak ({:.1}): give attention to {}",
            h.house,
            h.total,
            h.significations.join(", ")
        ),
    });
    planets.chain(houses).collect()
}
