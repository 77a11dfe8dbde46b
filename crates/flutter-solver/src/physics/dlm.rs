//! Subsonic flutter surrogate calibrated against doublet-lattice results.
//!
//! `V_f = sqrt(4 ω₁ sqrt(D ρh) / (ρ_air C_Lα))` with `C_Lα = 2π`, and the
//! flutter frequency placed 15 % above the fundamental.

use std::f64::consts::PI;

use flutter_model::FlowConditions;

use super::plate::natural_frequencies;
use super::{
    FlutterMethod, FlutterMethodSolver, FlutterResult, PanelProperties, PhysicsError, Result,
    validate_flow,
};

/// Thin-aerofoil lift-curve slope [1/rad]
pub const LIFT_CURVE_SLOPE: f64 = 2.0 * PI;
/// Flutter frequency over fundamental frequency
pub const DLM_FREQUENCY_FACTOR: f64 = 1.15;
/// Frequencies reported alongside the estimate
const REPORTED_MODES: usize = 6;

#[derive(Debug, Clone, Copy, Default)]
pub struct DoubletLatticeSolver;

impl FlutterMethodSolver for DoubletLatticeSolver {
    fn method(&self) -> FlutterMethod {
        FlutterMethod::DoubletLattice
    }

    fn solve(&self, panel: &PanelProperties, flow: &FlowConditions) -> Result<FlutterResult> {
        panel.validate()?;
        validate_flow(flow)?;

        let frequencies = natural_frequencies(panel, REPORTED_MODES)?;
        let f1 = frequencies[0];
        let omega = 2.0 * PI * f1;
        let rho_air = flow.density();
        let stiffness_mass = (panel.flexural_rigidity() * panel.mass_per_area()).sqrt();
        let velocity = (4.0 * omega * stiffness_mass / (rho_air * LIFT_CURVE_SLOPE)).sqrt();
        if !velocity.is_finite() || velocity <= 0.0 {
            return Err(PhysicsError::Degenerate(format!(
                "non-physical flutter velocity {velocity}"
            )));
        }

        Ok(FlutterResult {
            method: FlutterMethod::DoubletLattice,
            critical_velocity: velocity,
            critical_frequency: DLM_FREQUENCY_FACTOR * f1,
            critical_mode: 1,
            dynamic_pressure: 0.5 * rho_air * velocity * velocity,
            mach: flow.mach,
            natural_frequencies: frequencies,
        })
    }
}
