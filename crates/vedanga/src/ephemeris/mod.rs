pub mod provider;
pub mod types;

pub use provider::{EphemerisError, EphemerisProvider, EphemerisSnapshot, StaticEphemeris};
pub use types::{
    Ayanamsa, Body, BodyState, ChartRequest, GeoLocation, HouseSystem, PlanetaryPosition,
};
