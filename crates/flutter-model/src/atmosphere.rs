//! International Standard Atmosphere lookup.
//!
//! Linear temperature lapse in the troposphere, isothermal exponential
//! stratosphere above the tropopause.

use serde::{Deserialize, Serialize};

use crate::error::{Result, ValidationError};

pub const SEA_LEVEL_TEMPERATURE: f64 = 288.15;
pub const SEA_LEVEL_PRESSURE: f64 = 101_325.0;
pub const SEA_LEVEL_DENSITY: f64 = 1.225;
/// Troposphere temperature lapse rate [K/m]
pub const LAPSE_RATE: f64 = 0.0065;
/// Tropopause altitude [m]
pub const TROPOPAUSE_ALTITUDE: f64 = 11_000.0;
pub const STRATOSPHERE_TEMPERATURE: f64 = 216.65;
/// Specific gas constant of dry air [J/(kg·K)]
pub const GAS_CONSTANT_AIR: f64 = 287.052_87;
pub const GRAVITY: f64 = 9.806_65;
pub const HEAT_CAPACITY_RATIO: f64 = 1.4;

const MIN_ALTITUDE: f64 = -1_000.0;
const MAX_ALTITUDE: f64 = 50_000.0;

/// Static air state at one altitude (SI units).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AtmosphereState {
    /// Geometric altitude [m], when derived from the standard atmosphere
    #[serde(default)]
    pub altitude: Option<f64>,
    /// [K]
    pub temperature: f64,
    /// [Pa]
    pub pressure: f64,
    /// [kg/m³]
    pub density: f64,
}

impl AtmosphereState {
    /// Speed of sound a = sqrt(γ R T) [m/s]
    pub fn speed_of_sound(&self) -> f64 {
        (HEAT_CAPACITY_RATIO * GAS_CONSTANT_AIR * self.temperature).sqrt()
    }

    /// ρ / ρ₀
    pub fn density_ratio(&self) -> f64 {
        self.density / SEA_LEVEL_DENSITY
    }

    pub fn sea_level() -> Self {
        Self {
            altitude: Some(0.0),
            temperature: SEA_LEVEL_TEMPERATURE,
            pressure: SEA_LEVEL_PRESSURE,
            density: SEA_LEVEL_DENSITY,
        }
    }
}

/// Standard atmosphere at `altitude` metres.
pub fn standard_atmosphere(altitude: f64) -> Result<AtmosphereState> {
    if !altitude.is_finite() || !(MIN_ALTITUDE..=MAX_ALTITUDE).contains(&altitude) {
        return Err(ValidationError::OutOfRange {
            name: "altitude",
            value: altitude,
            min: MIN_ALTITUDE,
            max: MAX_ALTITUDE,
        });
    }

    let exponent = GRAVITY / (LAPSE_RATE * GAS_CONSTANT_AIR);
    let (temperature, pressure) = if altitude <= TROPOPAUSE_ALTITUDE {
        let t = SEA_LEVEL_TEMPERATURE - LAPSE_RATE * altitude;
        (t, SEA_LEVEL_PRESSURE * (t / SEA_LEVEL_TEMPERATURE).powf(exponent))
    } else {
        let p_tropopause =
            SEA_LEVEL_PRESSURE * (STRATOSPHERE_TEMPERATURE / SEA_LEVEL_TEMPERATURE).powf(exponent);
        let scale = GRAVITY / (GAS_CONSTANT_AIR * STRATOSPHERE_TEMPERATURE);
        (
            STRATOSPHERE_TEMPERATURE,
            p_tropopause * (-scale * (altitude - TROPOPAUSE_ALTITUDE)).exp(),
        )
    };

    Ok(AtmosphereState {
        altitude: Some(altitude),
        temperature,
        pressure,
        density: pressure / (GAS_CONSTANT_AIR * temperature),
    })
}
