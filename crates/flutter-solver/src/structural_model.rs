//! Panel definition plus the mesh generated from it.
//!
//! The effective section is resolved once on construction. Any change to
//! the geometry, material, boundary code or mesh density clears the mesh and
//! moves it to [`MeshState::Stale`] until it is rebuilt.

use flutter_model::{
    BoundaryEdgeCode, Diagnostics, Material, MeshParameters, PanelGeometry, PanelMesh,
    SectionProperties, ValidationError,
};
use serde::{Deserialize, Serialize};

use crate::mesh_builder::MeshBuilder;
use crate::physics::PanelProperties;

const SOURCE: &str = "model";

/// Mesh density used until one is set explicitly
pub const DEFAULT_MESH_DIVISIONS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MeshState {
    /// Never built
    Empty,
    Built,
    /// Built once, invalidated by an input change since
    Stale,
}

#[derive(Debug, Clone)]
pub struct StructuralModel {
    geometry: PanelGeometry,
    nominal_thickness: f64,
    material: Material,
    section: SectionProperties,
    boundary: BoundaryEdgeCode,
    mesh_parameters: MeshParameters,
    mesh: Option<PanelMesh>,
    state: MeshState,
}

impl StructuralModel {
    /// Validates the inputs and resolves the effective section. Laminates and
    /// sandwiches override `geometry.thickness` with their own stack height.
    pub fn new(
        geometry: PanelGeometry,
        material: Material,
        boundary: BoundaryEdgeCode,
    ) -> Result<Self, ValidationError> {
        let (effective, section) = resolve(&geometry, &material)?;
        Ok(Self {
            geometry: effective,
            nominal_thickness: geometry.thickness,
            material,
            section,
            boundary,
            mesh_parameters: MeshParameters::quad4(DEFAULT_MESH_DIVISIONS, DEFAULT_MESH_DIVISIONS),
            mesh: None,
            state: MeshState::Empty,
        })
    }

    pub fn with_mesh_parameters(mut self, params: MeshParameters) -> Self {
        self.mesh_parameters = params;
        self
    }

    /// Geometry with the effective section thickness.
    pub fn geometry(&self) -> &PanelGeometry {
        &self.geometry
    }

    pub fn material(&self) -> &Material {
        &self.material
    }

    pub fn section(&self) -> &SectionProperties {
        &self.section
    }

    pub fn boundary(&self) -> BoundaryEdgeCode {
        self.boundary
    }

    pub fn mesh_parameters(&self) -> &MeshParameters {
        &self.mesh_parameters
    }

    pub fn state(&self) -> MeshState {
        self.state
    }

    /// The mesh, only while it matches the current inputs.
    pub fn mesh(&self) -> Option<&PanelMesh> {
        self.mesh
            .as_ref()
            .filter(|_| self.state == MeshState::Built)
    }

    pub fn set_geometry(&mut self, geometry: PanelGeometry) -> Result<(), ValidationError> {
        let (effective, section) = resolve(&geometry, &self.material)?;
        self.geometry = effective;
        self.nominal_thickness = geometry.thickness;
        self.section = section;
        self.invalidate();
        Ok(())
    }

    pub fn set_material(&mut self, material: Material) -> Result<(), ValidationError> {
        let nominal = PanelGeometry {
            thickness: self.nominal_thickness,
            ..self.geometry
        };
        let (effective, section) = resolve(&nominal, &material)?;
        self.geometry = effective;
        self.material = material;
        self.section = section;
        self.invalidate();
        Ok(())
    }

    pub fn set_boundary(&mut self, boundary: BoundaryEdgeCode) {
        self.boundary = boundary;
        self.invalidate();
    }

    pub fn set_mesh_parameters(&mut self, params: MeshParameters) {
        self.mesh_parameters = params;
        self.invalidate();
    }

    /// Regenerates the mesh regardless of its state.
    pub fn build_mesh(
        &mut self,
        diagnostics: &mut Diagnostics,
    ) -> Result<&PanelMesh, ValidationError> {
        self.mesh = None;
        self.ensure_mesh(diagnostics)
    }

    /// Returns the current mesh, generating it first when empty or stale.
    pub fn ensure_mesh(
        &mut self,
        diagnostics: &mut Diagnostics,
    ) -> Result<&PanelMesh, ValidationError> {
        let mesh = match self.mesh.take() {
            Some(mesh) if self.state == MeshState::Built => mesh,
            _ => {
                if (self.nominal_thickness - self.geometry.thickness).abs()
                    > 1e-9 * self.geometry.thickness
                {
                    diagnostics.warn(
                        SOURCE,
                        format!(
                            "{} '{}' sets the thickness to {:.4e} m (panel thickness {:.4e} m ignored)",
                            self.material.kind(),
                            self.material.name(),
                            self.geometry.thickness,
                            self.nominal_thickness
                        ),
                    );
                }
                MeshBuilder::build(
                    &self.geometry,
                    &self.mesh_parameters,
                    &self.boundary,
                    diagnostics,
                )?
            }
        };
        self.state = MeshState::Built;
        Ok(self.mesh.insert(mesh))
    }

    /// Inputs for the analytic flutter methods.
    pub fn panel_properties(&self) -> PanelProperties {
        PanelProperties::from_section(&self.geometry, &self.section, self.boundary)
    }

    fn invalidate(&mut self) {
        self.mesh = None;
        if self.state == MeshState::Built {
            self.state = MeshState::Stale;
        }
    }
}

fn resolve(
    geometry: &PanelGeometry,
    material: &Material,
) -> Result<(PanelGeometry, SectionProperties), ValidationError> {
    let section = material.section(geometry.thickness)?;
    let effective = PanelGeometry {
        thickness: section.thickness,
        ..*geometry
    };
    effective.validate()?;
    Ok((effective, section))
}
