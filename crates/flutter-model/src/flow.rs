//! Free-stream flow conditions.

use serde::{Deserialize, Serialize};

use crate::atmosphere::{AtmosphereState, GAS_CONSTANT_AIR, SEA_LEVEL_TEMPERATURE, standard_atmosphere};
use crate::error::{Result, ValidationError, ensure_positive};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlowConditions {
    pub mach: f64,
    pub atmosphere: AtmosphereState,
    /// Explicit free-stream velocity [m/s]; defaults to M·a
    #[serde(default)]
    pub velocity: Option<f64>,
}

impl FlowConditions {
    /// Flow at a standard-atmosphere altitude.
    pub fn at_altitude(mach: f64, altitude: f64) -> Result<Self> {
        let flow = Self {
            mach,
            atmosphere: standard_atmosphere(altitude)?,
            velocity: None,
        };
        flow.validate()?;
        Ok(flow)
    }

    /// Flow with an explicit air density; temperature is taken at sea level.
    pub fn with_density(mach: f64, density: f64) -> Result<Self> {
        ensure_positive("air density", density)?;
        let flow = Self {
            mach,
            atmosphere: AtmosphereState {
                altitude: None,
                temperature: SEA_LEVEL_TEMPERATURE,
                pressure: density * GAS_CONSTANT_AIR * SEA_LEVEL_TEMPERATURE,
                density,
            },
            velocity: None,
        };
        flow.validate()?;
        Ok(flow)
    }

    /// Flow from a dynamic pressure and velocity pair; density = 2q / V².
    pub fn from_dynamic_pressure(mach: f64, dynamic_pressure: f64, velocity: f64) -> Result<Self> {
        ensure_positive("dynamic pressure", dynamic_pressure)?;
        ensure_positive("velocity", velocity)?;
        let mut flow = Self::with_density(mach, 2.0 * dynamic_pressure / (velocity * velocity))?;
        flow.velocity = Some(velocity);
        Ok(flow)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.mach.is_finite() || self.mach < 0.0 {
            return Err(ValidationError::Flow(format!(
                "Mach number must be non-negative (received {})",
                self.mach
            )));
        }
        ensure_positive("air density", self.atmosphere.density)?;
        ensure_positive("air temperature", self.atmosphere.temperature)?;
        if let Some(v) = self.velocity {
            ensure_positive("velocity", v)?;
        }
        Ok(())
    }

    pub fn density(&self) -> f64 {
        self.atmosphere.density
    }

    pub fn speed_of_sound(&self) -> f64 {
        self.atmosphere.speed_of_sound()
    }

    pub fn velocity(&self) -> f64 {
        self.velocity.unwrap_or(self.mach * self.speed_of_sound())
    }

    /// q = ½ρV²
    pub fn dynamic_pressure(&self) -> f64 {
        0.5 * self.density() * self.velocity().powi(2)
    }
}
