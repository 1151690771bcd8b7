pub mod dashas;
pub mod dignity;
pub mod house_analysis;
pub mod nakshatra;
pub mod strength;
pub mod vargas;
pub mod yogas;

pub use dashas::{
    DashaEngine, DashaLevel, DashaPeriod, DashaState, DashaSystem, DashaTimeline, MAX_DASHA_DEPTH,
};
pub use dignity::{Dignity, DignityTables, Nature, Relationship};
pub use house_analysis::{
    analyze_house_combinations, strongest, weakest, FunctionalNature, HouseAnalysisEngine,
    HouseCombination, HouseGroup, HouseStrength,
};
pub use nakshatra::{nakshatra_placement, NakshatraPlacement};
pub use strength::{StrengthContext, StrengthEngine, StrengthResult};
pub use vargas::{varga_longitude, DivisionalChart, DivisionalChartEngine, Division};
pub use yogas::{YogaDetection, YogaDetector, YogaKind, YogaResult, YogaRule};
