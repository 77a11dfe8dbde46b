//! JSON description of one panel case.
//!
//! ```json
//! {
//!   "geometry": { "length": 0.3, "width": 0.3, "thickness": 0.0015 },
//!   "mesh": { "nx": 10, "ny": 10, "element_kind": "Quad4" },
//!   "boundary": "SSSS",
//!   "material": { "type": "isotropic", "name": "AL", "elastic_modulus": 71.7e9,
//!                 "poissons_ratio": 0.33, "density": 2810.0 },
//!   "flow": { "altitude": { "mach": 2.0, "altitude": 10000.0 } }
//! }
//! ```

use std::fs;
use std::path::Path;

use flutter_model::{
    BoundaryEdgeCode, FlowConditions, Material, MeshParameters, PanelGeometry, ValidationError,
};
use flutter_solver::StructuralModel;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowInput {
    /// Standard atmosphere at `altitude` [m]
    Altitude { mach: f64, altitude: f64 },
    /// Explicit air density [kg/m³]
    Density { mach: f64, density: f64 },
    /// Dynamic pressure [Pa] and velocity [m/s]
    DynamicPressure {
        mach: f64,
        dynamic_pressure: f64,
        velocity: f64,
    },
}

impl FlowInput {
    pub fn conditions(&self) -> Result<FlowConditions, ValidationError> {
        match *self {
            FlowInput::Altitude { mach, altitude } => FlowConditions::at_altitude(mach, altitude),
            FlowInput::Density { mach, density } => FlowConditions::with_density(mach, density),
            FlowInput::DynamicPressure {
                mach,
                dynamic_pressure,
                velocity,
            } => FlowConditions::from_dynamic_pressure(mach, dynamic_pressure, velocity),
        }
    }
}

fn default_mesh() -> MeshParameters {
    MeshParameters::quad4(10, 10)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelCase {
    pub geometry: PanelGeometry,
    #[serde(default = "default_mesh")]
    pub mesh: MeshParameters,
    #[serde(default)]
    pub boundary: BoundaryEdgeCode,
    pub material: Material,
    pub flow: FlowInput,
}

impl PanelCase {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, String> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|err| format!("cannot read {}: {err}", path.display()))?;
        serde_json::from_str(&text).map_err(|err| format!("invalid case {}: {err}", path.display()))
    }

    pub fn model(&self) -> Result<StructuralModel, ValidationError> {
        Ok(
            StructuralModel::new(self.geometry, self.material.clone(), self.boundary)?
                .with_mesh_parameters(self.mesh),
        )
    }
}
