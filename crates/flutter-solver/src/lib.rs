//! Panel flutter analysis: mesh generation, analytic flutter estimates and
//! the pipeline that cross-checks them against the external solver.

pub mod analysis;
pub mod external;
pub mod mesh_builder;
pub mod physics;
pub mod structural_model;

pub use analysis::{
    AnalysisConfig, AnalysisError, AnalysisReport, BatchCase, CrossValidation, FlutterAnalyzer,
    VALIDATION_UNAVAILABLE, ValidationGrade, unique_job_dir,
};
pub use external::{
    ExternalSolverError, ProcessRunner, SolverInvocation, SolverRun, SolverRunner, listing_path,
};
pub use mesh_builder::MeshBuilder;
pub use physics::{
    DoubletLatticeSolver, FlutterMethod, FlutterMethodSolver, FlutterResult, PanelProperties,
    PhysicsError, PistonTheorySolver, SUPERSONIC_MACH_THRESHOLD, natural_frequencies,
    select_method, solve, solver_for,
};
pub use structural_model::{MeshState, StructuralModel};
