use flutter_io::{CrossingKind, ResultParser};

const HEADER: &str = "\
1    PANEL FLUTTER ANALYSIS                                               OCTOBER  15, 2026  NASTRAN                 PAGE     7
0                                                                                                            SUBCASE 1
";

const EIGENVALUES: &str = "\
                                              R E A L   E I G E N V A L U E S
   MODE    EXTRACTION      EIGENVALUE            RADIANS             CYCLES            GENERALIZED         GENERALIZED
    NO.       ORDER                                                                       MASS              STIFFNESS
        1         1        1.579137E+05        3.973836E+02        6.324555E+01        1.000000E+00        1.579137E+05
        2         2        9.869604E+05        9.934588E+02        1.581139E+02        1.000000E+00        9.869604E+05
        3         3        2.526619E+06        1.589534E+03        2.529822E+02        1.000000E+00        2.526619E+06

";

fn flutter_block(point: usize, rows: &[&str]) -> String {
    let mut s = String::from(
        "                                       FLUTTER  SUMMARY\n\
         \x20   CONFIGURATION = AEROSG2D     XY-SYMMETRY = ASYMMETRIC     XZ-SYMMETRY = ASYMMETRIC\n",
    );
    s.push_str(&format!(
        "    POINT = {point:4}     MACH NUMBER = 0.8000     DENSITY RATIO = 1.0000E+00     METHOD = PK\n\n"
    ));
    s.push_str(
        "     KFREQ       1./KFREQ       VELOCITY       DAMPING     FREQUENCY       COMPLEX   EIGENVALUE\n",
    );
    for row in rows {
        s.push_str(row);
        s.push('\n');
    }
    s.push('\n');
    s
}

fn crossing_listing() -> String {
    let mut text = String::new();
    text.push_str(HEADER);
    text.push_str(EIGENVALUES);
    text.push_str(&flutter_block(
        1,
        &[
            "     0.1000      1.0000E+01     4.8000E+05    -3.0000E-02    2.0000E+01   -1.8850E+00    1.2566E+02",
            "     0.0980      1.0204E+01     5.0000E+05    -2.0000E-02    2.0000E+01   -1.2566E+00    1.2566E+02",
            "     0.0960      1.0417E+01     5.2000E+05     1.0000E-02    2.0500E+01    6.4403E-01    1.2881E+02",
        ],
    ));
    text.push_str(&flutter_block(
        2,
        &[
            "     0.3000      3.3333E+00     4.8000E+05    -1.0000E-01    6.0000E+01   -1.8850E+01    3.7699E+02",
            "     0.2900      3.4483E+00     5.0000E+05    -9.0000E-02    6.1000E+01   -1.7247E+01    3.8327E+02",
            "     0.2800      3.5714E+00     5.2000E+05    -8.0000E-02    6.2000E+01   -1.5582E+01    3.8956E+02",
        ],
    ));
    text
}

#[test]
fn parses_modes_points_and_crossing() {
    let listing = ResultParser::new().parse(&crossing_listing());
    assert!(listing.success, "errors: {:?}", listing.errors);
    assert!(listing.errors.is_empty());

    assert_eq!(listing.modal_results.len(), 3);
    assert!((listing.frequencies()[0] - 63.24555).abs() < 1e-4);
    assert_eq!(listing.modal_results[2].mode, 3);

    assert_eq!(listing.flutter_points.len(), 6);
    let first = listing.flutter_points[0];
    assert_eq!(first.mode, 1);
    assert_eq!(first.mach, 0.8);
    assert!((first.velocity - 480.0).abs() < 1e-9);
    assert_eq!(listing.flutter_points[3].mode, 2);

    let critical = listing.critical.expect("flutter crossing");
    assert_eq!(critical.kind, CrossingKind::Interpolated);
    assert!((critical.velocity - 513.333).abs() < 0.01);
    assert!((critical.frequency - 20.333).abs() < 0.01);
    assert_eq!(listing.critical_velocity(), Some(critical.velocity));
}

#[test]
fn fatal_message_fails_the_listing() {
    let mut text = crossing_listing();
    text.push_str(
        " *** USER FATAL MESSAGE 9050 (SEKRRS)\n\n     RUN TERMINATED DUE TO EXCESSIVE PIVOT RATIOS IN MATRIX KLL.\n",
    );
    let listing = ResultParser::new().parse(&text);
    assert!(!listing.success);
    assert!(listing.modal_results.is_empty());
    assert!(listing.flutter_points.is_empty());
    assert!(listing.critical.is_none());
    assert_eq!(listing.errors.len(), 1);
    assert!(listing.errors[0].contains("FATAL MESSAGE 9050"));
    assert!(listing.errors[0].contains("EXCESSIVE PIVOT RATIOS"));
}

#[test]
fn warnings_are_collected_without_failing() {
    let mut text = String::from(
        " *** USER WARNING MESSAGE 6080 (FA1PKE)\n     THE PK METHOD DID NOT CONVERGE FOR ONE ROOT.\n",
    );
    text.push_str(&crossing_listing());
    let listing = ResultParser::new().parse(&text);
    assert!(listing.success);
    assert_eq!(listing.warnings.len(), 1);
    assert!(listing.warnings[0].contains("DID NOT CONVERGE"));
}

#[test]
fn overflow_reduced_frequency_is_infinite() {
    let text = flutter_block(
        1,
        &[
            "   OVERFLOW      0.0000E+00     1.0000E+05    -1.0000E+00    0.0000E+00    0.0000E+00    0.0000E+00",
            "     0.0500      2.0000E+01     2.0000E+05    -5.0000E-01    1.0000E+01   -3.1416E+01    6.2832E+01",
        ],
    );
    let listing = ResultParser::new().parse(&text);
    assert_eq!(listing.flutter_points.len(), 2);
    assert!(listing.flutter_points[0].reduced_frequency.is_infinite());
    assert!((listing.flutter_points[1].velocity - 200.0).abs() < 1e-9);
    assert!(listing.critical.is_none());
}

#[test]
fn malformed_rows_are_skipped_with_warning() {
    let text = flutter_block(
        1,
        &[
            "     0.1000      1.0000E+01     4.8000E+05    -3.0000E-02    2.0000E+01   -1.8850E+00    1.2566E+02",
            "     0.0980      1.0204E+01     5.0000E+05    -2.0000E-02",
            "     0.0960      1.0417E+01     5.2000E+05     1.0000E-02    2.0500E+01    6.4403E-01    1.2881E+02",
        ],
    );
    let listing = ResultParser::new().parse(&text);
    assert_eq!(listing.flutter_points.len(), 2);
    assert_eq!(listing.warnings.len(), 1);
    assert!(listing.warnings[0].contains("malformed flutter row"));
    // the 480 → 520 bracket still brackets the crossing
    assert!(listing.critical.is_some());
}

#[test]
fn listing_without_tables_is_not_a_success() {
    let listing = ResultParser::new().parse("nothing useful here\n");
    assert!(!listing.success);
    assert!(listing.flutter_points.is_empty());
    assert!(!listing.errors.is_empty());
}

#[test]
fn missing_file_reports_explicit_error() {
    let dir = tempfile::tempdir().unwrap();
    let listing = ResultParser::new().parse_file(dir.path().join("absent.f06"));
    assert!(!listing.success);
    assert!(listing.errors[0].contains("not found"));
}

#[test]
fn parse_file_reads_listing_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("panel.f06");
    std::fs::write(&path, crossing_listing()).unwrap();
    let listing = ResultParser::new().parse_file(&path);
    assert!(listing.success);
    assert!(listing.critical.is_some());
}
