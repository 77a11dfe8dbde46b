use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::time::Duration;

use flutter_io::{cards_named, read_file};
use flutter_model::{
    BoundaryEdgeCode, FlowConditions, IsotropicMaterial, Material, MeshParameters, PanelGeometry,
};
use flutter_solver::{
    AnalysisConfig, BatchCase, ExternalSolverError, FlutterAnalyzer, FlutterMethod, SolverRun,
    SolverRunner, StructuralModel, VALIDATION_UNAVAILABLE, ValidationGrade, listing_path,
};

const LISTING: &str = "\
                                              R E A L   E I G E N V A L U E S
   MODE    EXTRACTION      EIGENVALUE            RADIANS             CYCLES            GENERALIZED         GENERALIZED
    NO.       ORDER                                                                       MASS              STIFFNESS
        1         1        1.579137E+05        3.973836E+02        6.324555E+01        1.000000E+00        1.579137E+05
        2         2        9.869604E+05        9.934588E+02        1.581139E+02        1.000000E+00        9.869604E+05

                                       FLUTTER  SUMMARY
    POINT =    1     MACH NUMBER = 2.0000     DENSITY RATIO = 1.0000E+00     METHOD = PK

     KFREQ       1./KFREQ       VELOCITY       DAMPING     FREQUENCY       COMPLEX   EIGENVALUE
     0.1000      1.0000E+01     4.8000E+05    -3.0000E-02    2.0000E+01   -1.8850E+00    1.2566E+02
     0.0980      1.0204E+01     5.0000E+05    -2.0000E-02    2.0000E+01   -1.2566E+00    1.2566E+02
     0.0960      1.0417E+01     5.2000E+05     1.0000E-02    2.0500E+01    6.4403E-01    1.2881E+02

";

/// Stands in for the solver: drops a canned listing next to the deck.
struct CannedRunner;

impl SolverRunner for CannedRunner {
    fn run(&self, bulk_data: &Path, work_dir: &Path) -> Result<SolverRun, ExternalSolverError> {
        assert!(bulk_data.is_file(), "deck must exist before the solver runs");
        let listing = listing_path(bulk_data, work_dir);
        fs::write(&listing, LISTING)?;
        Ok(SolverRun {
            listing,
            progress: vec!["BEGIN".to_string(), "END OF JOB".to_string()],
            elapsed: Duration::from_millis(1),
        })
    }
}

struct TimedOutRunner;

impl SolverRunner for TimedOutRunner {
    fn run(&self, _: &Path, _: &Path) -> Result<SolverRun, ExternalSolverError> {
        Err(ExternalSolverError::Timeout { secs: 60 })
    }
}

fn aluminium_panel() -> StructuralModel {
    StructuralModel::new(
        PanelGeometry::new(0.3, 0.3, 0.0015),
        Material::Isotropic(IsotropicMaterial::aluminum()),
        BoundaryEdgeCode::simply_supported(),
    )
    .unwrap()
}

fn supersonic() -> FlowConditions {
    FlowConditions::at_altitude(2.0, 10_000.0).unwrap()
}

fn full_pipeline(dir: &Path) -> AnalysisConfig {
    AnalysisConfig {
        generate_bulk_data: true,
        execute_solver: true,
        working_dir: dir.to_path_buf(),
        job_name: "skin".to_string(),
        ..Default::default()
    }
}

#[test]
fn physics_only_analysis_needs_no_solver() {
    let mut model = aluminium_panel();
    let report = FlutterAnalyzer::new().analyze(&mut model, &supersonic(), &AnalysisConfig::default());

    assert!(report.success, "errors: {:?}", report.errors);
    assert_eq!(report.method, FlutterMethod::PistonTheory);
    assert!(report.physics_velocity().unwrap() > 0.0);
    assert_eq!(report.natural_frequencies.len(), 10);
    assert_eq!(report.validation.grade, ValidationGrade::Unavailable);
    assert!(report.bulk_data_path.is_none());
    assert!(!report.warnings.iter().any(|w| w == VALIDATION_UNAVAILABLE));
}

#[test]
fn method_follows_mach_threshold() {
    let analyzer = FlutterAnalyzer::new();
    let config = AnalysisConfig::default();
    let mut model = aluminium_panel();

    let below = FlowConditions::at_altitude(1.19, 10_000.0).unwrap();
    let at = FlowConditions::at_altitude(1.2, 10_000.0).unwrap();
    assert_eq!(
        analyzer.analyze(&mut model, &below, &config).method,
        FlutterMethod::DoubletLattice
    );
    assert_eq!(
        analyzer.analyze(&mut model, &at, &config).method,
        FlutterMethod::PistonTheory
    );
}

#[test]
fn full_pipeline_writes_runs_parses_and_grades() {
    let dir = tempfile::tempdir().unwrap();
    let mut model = aluminium_panel();
    let report = FlutterAnalyzer::with_runner(Box::new(CannedRunner)).analyze(
        &mut model,
        &supersonic(),
        &full_pipeline(dir.path()),
    );

    assert!(report.success, "errors: {:?}", report.errors);
    let deck = report.bulk_data_path.as_ref().expect("deck path");
    assert!(deck.starts_with(dir.path()));
    let cards = read_file(deck).unwrap();
    assert_eq!(cards_named(&cards, "GRID").count(), 121);
    assert_eq!(cards_named(&cards, "CQUAD4").count(), 100);

    let external = report.external_velocity().expect("external crossing");
    assert!((external - 513.333).abs() < 0.01);

    let physics = report.physics_velocity().unwrap();
    let expected = (physics - external).abs() / external * 100.0;
    let diff = report.validation.velocity_difference.unwrap();
    assert!((diff - expected).abs() < 1e-9);
    assert_eq!(report.validation.grade, ValidationGrade::from_difference(diff));
    assert!(!report.warnings.iter().any(|w| w == VALIDATION_UNAVAILABLE));
    assert!(
        report
            .diagnostics
            .events()
            .iter()
            .any(|e| e.source == "solver" && e.message == "END OF JOB")
    );
}

#[test]
fn solver_failure_keeps_physics_result() {
    let dir = tempfile::tempdir().unwrap();
    let mut model = aluminium_panel();
    let report = FlutterAnalyzer::with_runner(Box::new(TimedOutRunner)).analyze(
        &mut model,
        &supersonic(),
        &full_pipeline(dir.path()),
    );

    assert!(report.success);
    assert!(report.physics.is_some());
    assert!(report.listing.is_none());
    assert!(report.bulk_data_path.is_some());
    assert_eq!(report.validation.grade, ValidationGrade::Unavailable);
    assert!(report.warnings.iter().any(|w| w == VALIDATION_UNAVAILABLE));
    assert!(report.warnings.iter().any(|w| w.contains("killed")));
}

#[test]
fn missing_solver_configuration_is_a_warning() {
    let dir = tempfile::tempdir().unwrap();
    let mut model = aluminium_panel();
    let report = FlutterAnalyzer::new().analyze(&mut model, &supersonic(), &full_pipeline(dir.path()));

    assert!(report.success);
    assert!(report.warnings.iter().any(|w| w.contains("no solver invocation")));
    assert!(report.warnings.iter().any(|w| w == VALIDATION_UNAVAILABLE));
}

#[test]
fn invalid_mesh_fails_generation_but_not_physics() {
    let dir = tempfile::tempdir().unwrap();
    let mut model = aluminium_panel().with_mesh_parameters(MeshParameters::quad4(30, 1));
    let config = AnalysisConfig {
        generate_bulk_data: true,
        working_dir: dir.path().to_path_buf(),
        ..Default::default()
    };
    let report = FlutterAnalyzer::new().analyze(&mut model, &supersonic(), &config);

    assert!(!report.success);
    assert!(report.physics.is_some());
    assert!(report.bulk_data_path.is_none());
    assert!(report.errors[0].contains("aspect ratio"));
}

#[test]
fn forced_method_outside_its_range_is_an_error() {
    let mut model = aluminium_panel();
    let config = AnalysisConfig {
        method_override: Some(FlutterMethod::PistonTheory),
        ..Default::default()
    };
    let subsonic = FlowConditions::at_altitude(0.8, 5_000.0).unwrap();
    let report = FlutterAnalyzer::new().analyze(&mut model, &subsonic, &config);

    assert!(!report.success);
    assert!(report.physics.is_none());
    assert!(report.errors[0].contains("not applicable"));
}

#[test]
fn concurrent_batch_uses_distinct_working_directories() {
    let dir = tempfile::tempdir().unwrap();
    let cases: Vec<BatchCase> = (0..6)
        .map(|i| BatchCase {
            // identical names on purpose: only the unique directory separates them
            name: "panel".to_string(),
            model: aluminium_panel(),
            flow: FlowConditions::at_altitude(1.5 + 0.25 * i as f64, 10_000.0).unwrap(),
        })
        .collect();
    let config = AnalysisConfig {
        generate_bulk_data: true,
        working_dir: dir.path().to_path_buf(),
        unique_job_dir: false,
        ..Default::default()
    };

    let reports = FlutterAnalyzer::new().analyze_batch(cases, &config);
    assert_eq!(reports.len(), 6);
    assert!(reports.iter().all(|r| r.success));

    let decks: HashSet<_> = reports
        .iter()
        .map(|r| r.bulk_data_path.clone().expect("deck path"))
        .collect();
    assert_eq!(decks.len(), 6);
    assert!(decks.iter().all(|d| d.is_file()));

    // results stay in input order
    let machs: Vec<f64> = reports.iter().map(|r| r.physics.as_ref().unwrap().mach).collect();
    assert!(machs.windows(2).all(|w| w[0] < w[1]));
}
