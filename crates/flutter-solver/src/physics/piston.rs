//! First-order piston theory for supersonic panel flutter.
//!
//! ```text
//! β = sqrt(M² − 1)      λ = 2M/β      μ = ρh / (ρ_air a)
//! q_f = K · sqrt(D ρh) · ω² / (λ sqrt(μ))
//! V   = sqrt(2 q_f / ρ_air) · (1 + 0.1 (mode − 1))
//! ```
//!
//! evaluated for the lowest [`PISTON_MODE_COUNT`] plate modes; the slowest
//! mode is critical.

use std::f64::consts::PI;

use flutter_model::{BoundaryEdgeCode, EdgeSupport, FlowConditions};

use super::plate::natural_frequencies;
use super::{
    FlutterMethod, FlutterMethodSolver, FlutterResult, PanelProperties, PhysicsError, Result,
    validate_flow,
};

pub const PISTON_MODE_COUNT: usize = 6;

/// Calibration constants of the flutter dynamic pressure by boundary code
pub const K_SIMPLY_SUPPORTED: f64 = 0.5;
pub const K_CLAMPED: f64 = 0.7;
pub const K_MIXED: f64 = 0.6;

/// Velocity increment per mode above the first
pub const MODE_CORRECTION: f64 = 0.1;

pub fn boundary_factor(code: &BoundaryEdgeCode) -> f64 {
    if code.is_all(EdgeSupport::SimplySupported) {
        K_SIMPLY_SUPPORTED
    } else if code.is_all(EdgeSupport::Clamped) {
        K_CLAMPED
    } else {
        K_MIXED
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PistonTheorySolver {
    pub mode_count: usize,
}

impl Default for PistonTheorySolver {
    fn default() -> Self {
        Self {
            mode_count: PISTON_MODE_COUNT,
        }
    }
}

impl FlutterMethodSolver for PistonTheorySolver {
    fn method(&self) -> FlutterMethod {
        FlutterMethod::PistonTheory
    }

    fn solve(&self, panel: &PanelProperties, flow: &FlowConditions) -> Result<FlutterResult> {
        panel.validate()?;
        validate_flow(flow)?;
        let mach = flow.mach;
        if mach <= 1.0 {
            return Err(PhysicsError::NotApplicable {
                method: FlutterMethod::PistonTheory,
                mach,
                reason: "piston theory requires supersonic flow".to_string(),
            });
        }

        let rho_air = flow.density();
        let rho_h = panel.mass_per_area();
        let beta = (mach * mach - 1.0).sqrt();
        let lambda = 2.0 * mach / beta;
        let mu = rho_h / (rho_air * panel.length);
        let k = boundary_factor(&panel.boundary);
        let stiffness_mass = (panel.flexural_rigidity() * rho_h).sqrt();

        let frequencies = natural_frequencies(panel, self.mode_count)?;
        let mut critical: Option<(usize, f64)> = None;
        for (index, &f) in frequencies.iter().enumerate() {
            let omega = 2.0 * PI * f;
            let q_flutter = k * stiffness_mass * omega * omega / (lambda * mu.sqrt());
            let velocity =
                (2.0 * q_flutter / rho_air).sqrt() * (1.0 + MODE_CORRECTION * index as f64);
            if !velocity.is_finite() || velocity <= 0.0 {
                return Err(PhysicsError::Degenerate(format!(
                    "mode {} gives non-physical flutter velocity {velocity}",
                    index + 1
                )));
            }
            if critical.is_none_or(|(_, v)| velocity < v) {
                critical = Some((index, velocity));
            }
        }

        let Some((index, velocity)) = critical else {
            return Err(PhysicsError::Degenerate(
                "no natural frequency available".to_string(),
            ));
        };
        Ok(FlutterResult {
            method: FlutterMethod::PistonTheory,
            critical_velocity: velocity,
            critical_frequency: frequencies[index],
            critical_mode: index + 1,
            dynamic_pressure: 0.5 * rho_air * velocity * velocity,
            mach,
            natural_frequencies: frequencies,
        })
    }
}
