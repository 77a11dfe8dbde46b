//! Analytic flutter estimates that run without the external solver.
//!
//! Two interchangeable strategies share the [`FlutterMethodSolver`] trait:
//!
//! - [`PistonTheorySolver`]: first-order piston theory for supersonic flow
//! - [`DoubletLatticeSolver`]: an analytic surrogate of the subsonic
//!   doublet-lattice result (not a panel-influence-coefficient method)
//!
//! [`select_method`] picks one from the Mach number; the threshold is
//! [`SUPERSONIC_MACH_THRESHOLD`] and the switch is inclusive.

mod dlm;
mod piston;
pub mod plate;

use std::fmt;

use flutter_model::{
    BendingStiffness, BoundaryEdgeCode, FlowConditions, PanelGeometry, SectionProperties,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use dlm::{DLM_FREQUENCY_FACTOR, DoubletLatticeSolver, LIFT_CURVE_SLOPE};
pub use piston::{
    K_CLAMPED, K_MIXED, K_SIMPLY_SUPPORTED, MODE_CORRECTION, PISTON_MODE_COUNT,
    PistonTheorySolver, boundary_factor,
};
pub use plate::{MAX_MODE_INDEX, ModeShape, natural_frequencies, plate_modes};

/// Mach number from which piston theory is selected
pub const SUPERSONIC_MACH_THRESHOLD: f64 = 1.2;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PhysicsError {
    #[error("invalid panel input: {0}")]
    InvalidInput(String),

    #[error("{method} is not applicable at Mach {mach}: {reason}")]
    NotApplicable {
        method: FlutterMethod,
        mach: f64,
        reason: String,
    },

    #[error("degenerate panel: {0}")]
    Degenerate(String),
}

pub type Result<T> = std::result::Result<T, PhysicsError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlutterMethod {
    PistonTheory,
    DoubletLattice,
}

impl FlutterMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlutterMethod::PistonTheory => "piston theory",
            FlutterMethod::DoubletLattice => "doublet lattice",
        }
    }
}

impl fmt::Display for FlutterMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn select_method(mach: f64) -> FlutterMethod {
    if mach >= SUPERSONIC_MACH_THRESHOLD {
        FlutterMethod::PistonTheory
    } else {
        FlutterMethod::DoubletLattice
    }
}

/// Panel quantities resolved once for the physics methods (SI).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PanelProperties {
    pub length: f64,
    pub width: f64,
    pub thickness: f64,
    pub elastic_modulus: f64,
    pub poissons_ratio: f64,
    pub density: f64,
    pub bending: BendingStiffness,
    pub boundary: BoundaryEdgeCode,
}

impl PanelProperties {
    pub fn isotropic(
        geometry: &PanelGeometry,
        elastic_modulus: f64,
        poissons_ratio: f64,
        density: f64,
        boundary: BoundaryEdgeCode,
    ) -> Self {
        Self {
            length: geometry.length,
            width: geometry.width,
            thickness: geometry.thickness,
            elastic_modulus,
            poissons_ratio,
            density,
            bending: BendingStiffness::isotropic(elastic_modulus, poissons_ratio, geometry.thickness),
            boundary,
        }
    }

    /// Planform from `geometry`, everything through the thickness from `section`.
    pub fn from_section(
        geometry: &PanelGeometry,
        section: &SectionProperties,
        boundary: BoundaryEdgeCode,
    ) -> Self {
        Self {
            length: geometry.length,
            width: geometry.width,
            thickness: section.thickness,
            elastic_modulus: section.elastic_modulus,
            poissons_ratio: section.poissons_ratio,
            density: section.density,
            bending: section.bending,
            boundary,
        }
    }

    pub fn validate(&self) -> Result<()> {
        let checks = [
            ("length", self.length),
            ("width", self.width),
            ("thickness", self.thickness),
            ("elastic modulus", self.elastic_modulus),
            ("density", self.density),
            ("D11", self.bending.d11),
            ("D22", self.bending.d22),
        ];
        for (name, value) in checks {
            if !(value.is_finite() && value > 0.0) {
                return Err(PhysicsError::InvalidInput(format!(
                    "{name} must be positive and finite (received {value})"
                )));
            }
        }
        if !(self.poissons_ratio > -1.0 && self.poissons_ratio < 0.5) {
            return Err(PhysicsError::InvalidInput(format!(
                "poisson's ratio {} outside (-1, 0.5)",
                self.poissons_ratio
            )));
        }
        Ok(())
    }

    /// Reference flexural rigidity sqrt(D11·D22) [N·m]
    pub fn flexural_rigidity(&self) -> f64 {
        self.bending.reference()
    }

    /// ρh [kg/m²]
    pub fn mass_per_area(&self) -> f64 {
        self.density * self.thickness
    }
}

/// Outcome of one analytic flutter estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlutterResult {
    pub method: FlutterMethod,
    /// [m/s]
    pub critical_velocity: f64,
    /// [Hz]
    pub critical_frequency: f64,
    /// 1-based index into `natural_frequencies`
    pub critical_mode: usize,
    /// ½ρV² at the critical velocity [Pa]
    pub dynamic_pressure: f64,
    pub mach: f64,
    /// Lowest natural frequencies used by the method [Hz]
    pub natural_frequencies: Vec<f64>,
}

impl FlutterResult {
    /// V_flutter / V_flight − 1; positive means flutter-free at the flight speed.
    pub fn flutter_margin(&self, flight_velocity: f64) -> f64 {
        self.critical_velocity / flight_velocity - 1.0
    }
}

pub trait FlutterMethodSolver: Send + Sync {
    fn method(&self) -> FlutterMethod;

    fn solve(&self, panel: &PanelProperties, flow: &FlowConditions) -> Result<FlutterResult>;
}

pub fn solver_for(method: FlutterMethod) -> Box<dyn FlutterMethodSolver> {
    match method {
        FlutterMethod::PistonTheory => Box::new(PistonTheorySolver::default()),
        FlutterMethod::DoubletLattice => Box::new(DoubletLatticeSolver),
    }
}

/// Solves with the method selected for the flow Mach number.
pub fn solve(panel: &PanelProperties, flow: &FlowConditions) -> Result<FlutterResult> {
    solver_for(select_method(flow.mach)).solve(panel, flow)
}

fn validate_flow(flow: &FlowConditions) -> Result<()> {
    flow.validate()
        .map_err(|e| PhysicsError::InvalidInput(e.to_string()))
}
