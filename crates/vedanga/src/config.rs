use std::collections::BTreeMap;
use std::num::NonZeroUsize;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::aspects::AspectKind;
use crate::error::AnalysisError;
use crate::vedic::dashas::{DashaSystem, MAX_DASHA_DEPTH};
use crate::vedic::vargas::Division;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    pub capacity: usize,
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            capacity: 256,
            ttl_secs: 86_400,
        }
    }
}

/// Ten years.
pub const MAX_CACHE_TTL_SECS: u64 = 10 * 365 * 86_400;

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Divisional charts to compute, by number.
    pub divisions: Vec<u8>,
    pub dasha_system: DashaSystem,
    /// 1 = majors only, 2 = with sub-periods, ...
    pub dasha_depth: usize,
    pub top_yogas: usize,
    /// Planets and houses scoring below this get a recommendation.
    pub recommendation_threshold: f64,
    pub special_aspects: bool,
    /// Allowed orb per aspect name, overriding the classical table.
    pub aspect_orbs: BTreeMap<String, f64>,
    pub cache: CacheConfig,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            divisions: Division::ALL.iter().map(|d| d.number()).collect(),
            dasha_system: DashaSystem::Vimshottari,
            dasha_depth: 2,
            top_yogas: 5,
            recommendation_threshold: 50.0,
            special_aspects: true,
            aspect_orbs: BTreeMap::new(),
            cache: CacheConfig::default(),
        }
    }
}

impl AnalyzerConfig {
    /// Resolved divisions, in configured order without duplicates.
    pub fn resolved_divisions(&self) -> Result<Vec<Division>, AnalysisError> {
        let mut divisions = Vec::with_capacity(self.divisions.len());
        for &number in &self.divisions {
            let division = Division::from_number(number)?;
            if !divisions.contains(&division) {
                divisions.push(division);
            }
        }
        Ok(divisions)
    }

    pub fn resolved_orbs(&self) -> Result<BTreeMap<AspectKind, f64>, AnalysisError> {
        self.aspect_orbs
            .iter()
            .map(|(name, orb)| Ok((name.parse::<AspectKind>()?, *orb)))
            .collect()
    }

    pub fn cache_capacity(&self) -> Result<NonZeroUsize, AnalysisError> {
        NonZeroUsize::new(self.cache.capacity)
            .ok_or_else(|| AnalysisError::invalid("cache.capacity", "must be at least 1"))
    }

    pub fn validate(&self) -> Result<(), AnalysisError> {
        self.resolved_divisions()?;
        self.resolved_orbs()?;
        if !(1..=MAX_DASHA_DEPTH).contains(&self.dasha_depth) {
            return Err(AnalysisError::invalid(
                "dasha_depth",
                format!("must be within [1, {MAX_DASHA_DEPTH}], got {}", self.dasha_depth),
            ));
        }
        if !(0.0..=100.0).contains(&self.recommendation_threshold) {
            return Err(AnalysisError::invalid(
                "recommendation_threshold",
                format!("must be within [0, 100], got {}", self.recommendation_threshold),
            ));
        }
        if self.cache.enabled {
            self.cache_capacity()?;
            if self.cache.ttl_secs > MAX_CACHE_TTL_SECS {
                return Err(AnalysisError::invalid(
                    "cache.ttl_secs",
                    format!("must be at most {MAX_CACHE_TTL_SECS}, got {}", self.cache.ttl_secs),
                ));
            }
        }
        Ok(())
    }
}
