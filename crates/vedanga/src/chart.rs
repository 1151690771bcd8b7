use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ephemeris::{Body, ChartRequest, EphemerisProvider, PlanetaryPosition};
use crate::error::AnalysisError;
use crate::houses::{HouseCalculator, HouseCusps};

/// Positions and houses for one request: the input to every downstream engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NatalChart {
    pub request: ChartRequest,
    pub positions: BTreeMap<Body, PlanetaryPosition>,
    pub houses: HouseCusps,
}

impl NatalChart {
    pub fn build(
        provider: &dyn EphemerisProvider,
        calculator: &HouseCalculator,
        request: &ChartRequest,
    ) -> Result<Self, AnalysisError> {
        request.validate()?;
        let states = provider.body_states(request)?;
        let houses = calculator.calculate(request)?;
        let positions = states
            .iter()
            .map(|(body, state)| {
                let house = houses.house_of(state.longitude);
                (*body, PlanetaryPosition::from_state(*body, state, house))
            })
            .collect();
        log::debug!(
            "built natal chart from {} ({} bodies, {} houses)",
            provider.name(),
            states.len(),
            houses.system
        );
        Ok(Self {
            request: request.clone(),
            positions,
            houses,
        })
    }

    pub fn position(&self, body: Body) -> Option<&PlanetaryPosition> {
        self.positions.get(&body)
    }

    /// Position lookup that names the engine needing the body on failure.
    pub fn require(&self, body: Body, engine: &str) -> Result<&PlanetaryPosition, AnalysisError> {
        self.positions.get(&body).ok_or_else(|| {
            AnalysisError::calculation(
                engine,
                format!("ts={} body={}", self.request.timestamp, body.slug()),
                format!("{body} is missing from the ephemeris snapshot"),
            )
        })
    }

    pub fn occupants(&self, house: u8) -> impl Iterator<Item = &PlanetaryPosition> {
        self.positions.values().filter(move |p| p.house == house)
    }
}
