//! Flutter analysis pipeline.
//!
//! The analytic estimate always runs first and never depends on the external
//! solver. Bulk-data generation and solver execution are optional stages;
//! when both sources produce a flutter speed they are compared and graded,
//! and both raw results are kept in the report.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use flutter_io::{BulkDataConfig, BulkDataError, BulkDataWriter, ResultListing, ResultParser};
use flutter_model::{Diagnostics, FlowConditions, ValidationError};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::external::{ExternalSolverError, ProcessRunner, SolverInvocation, SolverRunner};
use crate::physics::{
    FlutterMethod, FlutterResult, PhysicsError, natural_frequencies, select_method, solver_for,
};
use crate::structural_model::StructuralModel;

const SOURCE: &str = "analysis";

/// Warning attached whenever the external cross-check could not be made
pub const VALIDATION_UNAVAILABLE: &str = "NASTRAN validation: unavailable";

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("physics error: {0}")]
    Physics(#[from] PhysicsError),

    #[error("bulk data error: {0}")]
    BulkData(#[from] BulkDataError),

    #[error("external solver error: {0}")]
    External(#[from] ExternalSolverError),

    #[error("no solver invocation configured")]
    NoSolver,
}

/// Pipeline switches and settings, stored as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub generate_bulk_data: bool,
    /// Requires `generate_bulk_data`
    pub execute_solver: bool,
    pub working_dir: PathBuf,
    pub job_name: String,
    /// Natural frequencies listed in the report
    pub n_modes: usize,
    /// Give every run its own directory under `working_dir`
    pub unique_job_dir: bool,
    pub bulk_data: BulkDataConfig,
    pub solver: Option<SolverInvocation>,
    /// Forces a physics method instead of selecting it from the Mach number
    pub method_override: Option<FlutterMethod>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            generate_bulk_data: false,
            execute_solver: false,
            working_dir: PathBuf::from("flutter_runs"),
            job_name: "panel_flutter".to_string(),
            n_modes: 10,
            unique_job_dir: true,
            bulk_data: BulkDataConfig::default(),
            solver: None,
            method_override: None,
        }
    }
}

impl AnalysisConfig {
    pub fn load(path: impl AsRef<Path>) -> io::Result<Self> {
        let bytes = fs::read(path)?;
        serde_json::from_slice(&bytes).map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))
    }

    pub fn save(&self, path: impl AsRef<Path>) -> io::Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let bytes = serde_json::to_vec_pretty(self)
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;
        fs::write(path, bytes)
    }
}

/// Agreement between the analytic and external flutter speeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationGrade {
    /// Below 5 %
    Excellent,
    /// Below 10 %
    Good,
    /// Below 20 %
    Acceptable,
    Poor,
    /// No external result to compare with
    Unavailable,
}

impl ValidationGrade {
    pub fn from_difference(percent: f64) -> Self {
        match percent.abs() {
            d if d < 5.0 => ValidationGrade::Excellent,
            d if d < 10.0 => ValidationGrade::Good,
            d if d < 20.0 => ValidationGrade::Acceptable,
            _ => ValidationGrade::Poor,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationGrade::Excellent => "EXCELLENT",
            ValidationGrade::Good => "GOOD",
            ValidationGrade::Acceptable => "ACCEPTABLE",
            ValidationGrade::Poor => "POOR",
            ValidationGrade::Unavailable => "UNAVAILABLE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CrossValidation {
    /// |V_physics − V_external| / V_external [%]
    pub velocity_difference: Option<f64>,
    /// |f_physics − f_external| / f_external [%]
    pub frequency_difference: Option<f64>,
    pub grade: ValidationGrade,
}

impl CrossValidation {
    pub fn unavailable() -> Self {
        Self {
            velocity_difference: None,
            frequency_difference: None,
            grade: ValidationGrade::Unavailable,
        }
    }

    /// Graded on the velocity difference; the external result is the reference.
    pub fn compare(physics: Option<&FlutterResult>, listing: Option<&ResultListing>) -> Self {
        let (Some(physics), Some(listing)) = (physics, listing) else {
            return Self::unavailable();
        };
        if !listing.success {
            return Self::unavailable();
        }
        let Some(velocity_difference) =
            listing.critical_velocity().and_then(|v| percent_difference(physics.critical_velocity, v))
        else {
            return Self::unavailable();
        };
        Self {
            velocity_difference: Some(velocity_difference),
            frequency_difference: listing
                .critical_frequency()
                .and_then(|f| percent_difference(physics.critical_frequency, f)),
            grade: ValidationGrade::from_difference(velocity_difference),
        }
    }
}

fn percent_difference(value: f64, reference: f64) -> Option<f64> {
    (reference.is_finite() && reference > 0.0 && value.is_finite())
        .then(|| (value - reference).abs() / reference * 100.0)
}

/// Everything one analysis produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub job_name: String,
    /// RFC 3339 start time
    pub started_at: String,
    pub method: FlutterMethod,
    pub physics: Option<FlutterResult>,
    /// Lowest plate frequencies [Hz]
    pub natural_frequencies: Vec<f64>,
    pub bulk_data_path: Option<PathBuf>,
    pub listing_path: Option<PathBuf>,
    pub listing: Option<ResultListing>,
    pub validation: CrossValidation,
    pub success: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub diagnostics: Diagnostics,
}

impl AnalysisReport {
    pub fn physics_velocity(&self) -> Option<f64> {
        self.physics.as_ref().map(|r| r.critical_velocity)
    }

    pub fn external_velocity(&self) -> Option<f64> {
        self.listing.as_ref().and_then(|l| l.critical_velocity())
    }
}

/// One independent case of a batch run.
#[derive(Debug, Clone)]
pub struct BatchCase {
    pub name: String,
    pub model: StructuralModel,
    pub flow: FlowConditions,
}

static JOB_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// A working directory under `base` that no other run of this or any
/// concurrent process will pick: job name, process id, timestamp and a
/// process-wide counter. The directory is not created.
pub fn unique_job_dir(base: impl AsRef<Path>, job_name: &str) -> PathBuf {
    let count = JOB_COUNTER.fetch_add(1, Ordering::Relaxed);
    let stamp = chrono::Local::now().format("%Y%m%dT%H%M%S%.6f");
    base.as_ref()
        .join(format!("{job_name}_{}_{stamp}_{count}", std::process::id()))
}

#[derive(Default)]
pub struct FlutterAnalyzer {
    runner: Option<Box<dyn SolverRunner>>,
}

impl FlutterAnalyzer {
    /// Analyzer that spawns the solver described by the config, if any.
    pub fn new() -> Self {
        Self::default()
    }

    /// Analyzer that hands every solver run to `runner`.
    pub fn with_runner(runner: Box<dyn SolverRunner>) -> Self {
        Self {
            runner: Some(runner),
        }
    }

    pub fn analyze(
        &self,
        model: &mut StructuralModel,
        flow: &FlowConditions,
        config: &AnalysisConfig,
    ) -> AnalysisReport {
        let mut diagnostics = Diagnostics::new();
        let mut errors = Vec::new();
        let mut warnings = Vec::new();
        let started_at = chrono::Local::now().to_rfc3339();

        let panel = model.panel_properties();
        let method = config
            .method_override
            .unwrap_or_else(|| select_method(flow.mach));
        let physics = match solver_for(method).solve(&panel, flow) {
            Ok(result) => {
                diagnostics.info(
                    SOURCE,
                    format!(
                        "{method}: flutter at {:.1} m/s, {:.2} Hz (mode {})",
                        result.critical_velocity, result.critical_frequency, result.critical_mode
                    ),
                );
                Some(result)
            }
            Err(err) => {
                errors.push(AnalysisError::from(err).to_string());
                None
            }
        };
        let natural_frequencies = match natural_frequencies(&panel, config.n_modes) {
            Ok(f) => f,
            Err(err) => {
                warnings.push(format!("natural frequencies unavailable: {err}"));
                Vec::new()
            }
        };

        let mut bulk_data_path = None;
        let mut listing_path = None;
        let mut listing = None;
        if config.generate_bulk_data {
            let job_dir = if config.unique_job_dir {
                unique_job_dir(&config.working_dir, &config.job_name)
            } else {
                config.working_dir.clone()
            };
            let deck = job_dir.join(format!("{}.bdf", config.job_name));
            match write_bulk_data(model, flow, config, &deck, &mut diagnostics) {
                Ok(()) => bulk_data_path = Some(deck),
                Err(err) => errors.push(err.to_string()),
            }

            if config.execute_solver
                && let Some(deck) = &bulk_data_path
            {
                match self.run_solver(config, deck, &job_dir) {
                    Ok(run) => {
                        for line in &run.progress {
                            diagnostics.info("solver", line.clone());
                        }
                        let parsed = ResultParser::new().parse_file(&run.listing);
                        if !parsed.success {
                            warnings.extend(parsed.errors.iter().cloned());
                        }
                        warnings.extend(parsed.warnings.iter().cloned());
                        listing_path = Some(run.listing);
                        listing = Some(parsed);
                    }
                    Err(err) => warnings.push(err.to_string()),
                }
            }
        }
        if config.execute_solver && !config.generate_bulk_data {
            warnings.push("solver execution requested without bulk-data generation".to_string());
        }

        let validation = CrossValidation::compare(physics.as_ref(), listing.as_ref());
        if config.execute_solver && validation.grade == ValidationGrade::Unavailable {
            warnings.push(VALIDATION_UNAVAILABLE.to_string());
        }
        if let Some(diff) = validation.velocity_difference {
            diagnostics.info(
                SOURCE,
                format!(
                    "cross-validation {}: velocity differs by {diff:.1} %",
                    validation.grade.as_str()
                ),
            );
        }

        warnings.extend(diagnostics.warnings());
        let external_ok = listing.as_ref().is_some_and(|l| l.success);
        AnalysisReport {
            job_name: config.job_name.clone(),
            started_at,
            method,
            success: errors.is_empty() && (physics.is_some() || external_ok),
            physics,
            natural_frequencies,
            bulk_data_path,
            listing_path,
            listing,
            validation,
            errors,
            warnings,
            diagnostics,
        }
    }

    /// Runs independent cases in parallel. Each case gets its own job name
    /// and, when bulk data is written, its own unique working directory.
    pub fn analyze_batch(
        &self,
        cases: Vec<BatchCase>,
        config: &AnalysisConfig,
    ) -> Vec<AnalysisReport> {
        cases
            .into_par_iter()
            .map(|mut case| {
                let case_config = AnalysisConfig {
                    job_name: case.name.clone(),
                    unique_job_dir: true,
                    ..config.clone()
                };
                self.analyze(&mut case.model, &case.flow, &case_config)
            })
            .collect()
    }

    fn run_solver(
        &self,
        config: &AnalysisConfig,
        deck: &Path,
        job_dir: &Path,
    ) -> Result<crate::external::SolverRun, AnalysisError> {
        let run = match (&self.runner, &config.solver) {
            (Some(runner), _) => runner.run(deck, job_dir)?,
            (None, Some(invocation)) => ProcessRunner::new(invocation.clone()).run(deck, job_dir)?,
            (None, None) => return Err(AnalysisError::NoSolver),
        };
        Ok(run)
    }
}

fn write_bulk_data(
    model: &mut StructuralModel,
    flow: &FlowConditions,
    config: &AnalysisConfig,
    deck: &Path,
    diagnostics: &mut Diagnostics,
) -> Result<(), AnalysisError> {
    let writer = BulkDataWriter::new(config.bulk_data.clone());
    let mesh = model.ensure_mesh(diagnostics)?.clone();
    writer.write_file(
        deck,
        &mesh,
        model.geometry(),
        model.material(),
        flow,
        diagnostics,
    )?;
    Ok(())
}
