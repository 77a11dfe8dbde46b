mod case;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use flutter_io::{BulkDataWriter, ResultListing, ResultParser, read_file};
use flutter_model::{Diagnostics, Event, PanelMesh, Severity};
use flutter_solver::{AnalysisConfig, AnalysisReport, FlutterAnalyzer};

use crate::case::PanelCase;

#[derive(Parser, Debug)]
#[command(name = "flutter-cli", version, about = "Panel flutter analysis")]
struct Args {
    #[command(subcommand)]
    command: Commands,

    /// Also print info events
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Estimate the flutter speed of a panel case, optionally cross-checked
    /// against the external solver
    Analyze {
        case: PathBuf,
        /// Analysis configuration (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Print the full report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Write the SOL 145 bulk-data deck for a panel case
    Bdf {
        case: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        /// Analysis configuration (JSON); only its bulk-data section is used
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Summarize a result listing
    Parse {
        listing: PathBuf,
        #[arg(long)]
        json: bool,
    },
}

fn print_events(events: &[Event], verbose: bool) {
    for event in events {
        if verbose || event.severity != Severity::Info {
            eprintln!("{event}");
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<AnalysisConfig, String> {
    match path {
        Some(path) => AnalysisConfig::load(path)
            .map_err(|err| format!("cannot load config {}: {err}", path.display())),
        None => Ok(AnalysisConfig::default()),
    }
}

fn print_report(report: &AnalysisReport) {
    println!("job: {} ({})", report.job_name, report.started_at);
    println!("method: {}", report.method);
    match &report.physics {
        Some(result) => {
            println!("flutter_speed: {:.2} m/s", result.critical_velocity);
            println!("flutter_frequency: {:.3} Hz", result.critical_frequency);
            println!("flutter_mode: {}", result.critical_mode);
            println!("dynamic_pressure: {:.1} Pa", result.dynamic_pressure);
        }
        None => println!("flutter_speed: unavailable"),
    }
    if !report.natural_frequencies.is_empty() {
        let list: Vec<String> = report
            .natural_frequencies
            .iter()
            .map(|f| format!("{f:.2}"))
            .collect();
        println!("natural_frequencies: {}", list.join(", "));
    }
    if let Some(path) = &report.bulk_data_path {
        println!("bulk_data: {}", path.display());
    }
    if let Some(v) = report.external_velocity() {
        println!("external_flutter_speed: {v:.2} m/s");
    }
    match report.validation.velocity_difference {
        Some(diff) => println!(
            "validation: {} ({diff:.1} % velocity difference)",
            report.validation.grade.as_str()
        ),
        None => println!("validation: {}", report.validation.grade.as_str()),
    }
    for warning in &report.warnings {
        eprintln!("warning: {warning}");
    }
    for error in &report.errors {
        eprintln!("error: {error}");
    }
}

fn print_listing(listing: &ResultListing) {
    println!("success: {}", listing.success);
    println!("modes: {}", listing.modal_results.len());
    for mode in &listing.modal_results {
        println!("  mode {:>3}: {:.3} Hz", mode.mode, mode.frequency);
    }
    println!("flutter_points: {}", listing.flutter_points.len());
    match listing.critical {
        Some(c) => println!(
            "critical: {:.2} m/s at {:.3} Hz (point {}, {:?})",
            c.velocity, c.frequency, c.mode, c.kind
        ),
        None => println!("critical: no flutter in tested range"),
    }
    for warning in &listing.warnings {
        eprintln!("warning: {warning}");
    }
    for error in &listing.errors {
        eprintln!("error: {error}");
    }
}

fn analyze(case: &Path, config: Option<&Path>, json: bool, verbose: bool) -> Result<bool, String> {
    let case = PanelCase::load(case)?;
    let config = load_config(config)?;
    let flow = case.flow.conditions().map_err(|err| err.to_string())?;
    let mut model = case.model().map_err(|err| err.to_string())?;

    let report = FlutterAnalyzer::new().analyze(&mut model, &flow, &config);
    print_events(report.diagnostics.events(), verbose);
    if json {
        let text = serde_json::to_string_pretty(&report).map_err(|err| err.to_string())?;
        println!("{text}");
    } else {
        print_report(&report);
    }
    Ok(report.success)
}

fn write_bdf(case: &Path, output: &Path, config: Option<&Path>, verbose: bool) -> Result<bool, String> {
    let case = PanelCase::load(case)?;
    let config = load_config(config)?;
    let flow = case.flow.conditions().map_err(|err| err.to_string())?;
    let mut model = case.model().map_err(|err| err.to_string())?;

    let mut diagnostics = Diagnostics::new();
    let mesh = model
        .ensure_mesh(&mut diagnostics)
        .map_err(|err| err.to_string())?
        .clone();
    let writer = BulkDataWriter::new(config.bulk_data);
    let written = writer.write_file(
        output,
        &mesh,
        model.geometry(),
        model.material(),
        &flow,
        &mut diagnostics,
    );
    print_events(diagnostics.events(), verbose);
    written.map_err(|err| err.to_string())?;

    let cards = read_file(output).map_err(|err| err.to_string())?;
    println!("{}", deck_summary(output, cards.len(), &mesh, verbose));
    Ok(true)
}

fn deck_summary(output: &Path, cards: usize, mesh: &PanelMesh, verbose: bool) -> String {
    let mut lines = vec![
        format!("written: {}", output.display()),
        format!("cards: {cards}"),
    ];
    if verbose {
        lines.push(mesh.statistics().format());
    } else {
        lines.push(format!("nodes: {}", mesh.nodes.len()));
        lines.push(format!("elements: {}", mesh.elements.len()));
    }
    lines.join("\n")
}

fn parse(listing: &Path, json: bool) -> Result<bool, String> {
    let listing = ResultParser::new().parse_file(listing);
    if json {
        let text = serde_json::to_string_pretty(&listing).map_err(|err| err.to_string())?;
        println!("{text}");
    } else {
        print_listing(&listing);
    }
    Ok(listing.success)
}

fn main() -> ExitCode {
    let args = Args::parse();
    let outcome = match &args.command {
        Commands::Analyze { case, config, json } => {
            analyze(case, config.as_deref(), *json, args.verbose)
        }
        Commands::Bdf {
            case,
            output,
            config,
        } => write_bdf(case, output, config.as_deref(), args.verbose),
        Commands::Parse { listing, json } => parse(listing, *json),
    };

    match outcome {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(2)
        }
    }
}
