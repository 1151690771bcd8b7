//! House cusps and chart angles from time and location.

pub mod calculator;

pub use calculator::{HouseCalculator, HouseCusps};
