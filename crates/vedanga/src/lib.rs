//! Vedic chart analysis.
//!
//! Raw planetary state vectors come in through an [`ephemeris::EphemerisProvider`];
//! the engines in [`houses`], [`aspects`] and [`vedic`] derive houses, aspects,
//! divisional charts, shadbala, house strengths, yogas and dashas, and
//! [`analysis::UnifiedAnalyzer`] aggregates them into one cached
//! [`analysis::ChartAnalysis`].

pub mod analysis;
pub mod aspects;
pub mod chart;
pub mod config;
pub mod ephemeris;
pub mod error;
pub mod houses;
pub mod vedic;
pub mod zodiac;

pub use analysis::{ChartAnalysis, UnifiedAnalyzer};
pub use chart::NatalChart;
pub use config::AnalyzerConfig;
pub use ephemeris::{
    Ayanamsa, Body, BodyState, ChartRequest, EphemerisProvider, GeoLocation, HouseSystem,
    PlanetaryPosition, StaticEphemeris,
};
pub use error::{AnalysisError, ErrorReport};
