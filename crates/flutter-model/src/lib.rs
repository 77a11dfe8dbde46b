//! Value types for rectangular panel flutter analysis.
//!
//! Everything here is plain data owned by the caller: panel geometry, mesh
//! density, materials, the generated mesh, edge boundary codes, flow
//! conditions and the diagnostics list threaded through the pipeline.
//! All quantities are SI; unit conversion happens only at the bulk-data
//! boundary in `flutter-io`.

pub mod atmosphere;
pub mod boundary;
pub mod diagnostics;
pub mod error;
pub mod flow;
pub mod geometry;
pub mod material;
pub mod mesh;

pub use atmosphere::{AtmosphereState, standard_atmosphere};
pub use boundary::{BoundaryEdgeCode, Edge, EdgeSupport, merge_dofs};
pub use diagnostics::{Diagnostics, Event, Severity};
pub use error::{Result, ValidationError};
pub use flow::FlowConditions;
pub use geometry::{ElementKind, MeshParameters, PanelGeometry};
pub use material::{
    BendingStiffness, CompositeLaminate, EquivalentIsotropic, IsotropicMaterial, Material,
    OrthotropicMaterial, Ply, SandwichPanel, SectionProperties, flexural_rigidity,
};
pub use mesh::{BoundaryConstraint, Element, MeshStatistics, Node, PanelMesh};
