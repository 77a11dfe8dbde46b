//! Result listing (F06) parser.
//!
//! Extracts the real eigenvalue table and the flutter summary blocks with a
//! line-driven state machine:
//!
//! ```text
//! Scanning ──"REAL EIGENVALUES"──▶ EigenHeader ──numeric row──▶ EigenRows
//! Scanning ──"FLUTTER SUMMARY"───▶ FlutterHeader ─numeric row─▶ FlutterRows
//! *Rows ──blank line / page eject / non-numeric line──▶ Scanning
//! ```
//!
//! Any fatal message in the listing invalidates the run: tables are not
//! parsed and the listing is reported as failed. Malformed rows are skipped
//! with a warning; the parser never panics or raises on bad input.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::critical::{CriticalPoint, FlutterPoint, NEAR_ZERO_FREQUENCY, find_critical_point};
use crate::bdf::field::parse_real;
use crate::units;

const FATAL_MARKERS: [&str; 2] = ["FATAL MESSAGE", "FATAL ERROR"];
const WARNING_MARKER: &str = "WARNING MESSAGE";
const OVERFLOW: &str = "OVERFLOW";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModalResult {
    /// Renumbered from 1 after rigid-body modes are discarded
    pub mode: usize,
    pub eigenvalue: f64,
    /// [rad/s]
    pub circular_frequency: f64,
    /// [Hz]
    pub frequency: f64,
    pub generalized_mass: f64,
    pub generalized_stiffness: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ResultListing {
    pub success: bool,
    pub modal_results: Vec<ModalResult>,
    pub flutter_points: Vec<FlutterPoint>,
    pub critical: Option<CriticalPoint>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ResultListing {
    fn failed(error: String) -> Self {
        Self {
            success: false,
            errors: vec![error],
            ..Default::default()
        }
    }

    pub fn critical_velocity(&self) -> Option<f64> {
        self.critical.map(|c| c.velocity)
    }

    pub fn critical_frequency(&self) -> Option<f64> {
        self.critical.map(|c| c.frequency)
    }

    pub fn frequencies(&self) -> Vec<f64> {
        self.modal_results.iter().map(|m| m.frequency).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Scanning,
    EigenHeader,
    EigenRows,
    FlutterHeader,
    FlutterRows,
}

#[derive(Debug, Clone, Copy)]
struct FlutterBlock {
    point: usize,
    mach: f64,
    density_ratio: f64,
}

impl Default for FlutterBlock {
    fn default() -> Self {
        Self {
            point: 0,
            mach: 0.0,
            density_ratio: 1.0,
        }
    }
}

pub struct ResultParser {
    /// Multiplier from listing velocity units to m/s
    velocity_scale: f64,
}

impl Default for ResultParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultParser {
    /// Parser for listings in the mm–tonne–s system.
    pub fn new() -> Self {
        Self {
            velocity_scale: units::velocity_from_solver(1.0),
        }
    }

    pub fn with_velocity_scale(velocity_scale: f64) -> Self {
        Self { velocity_scale }
    }

    pub fn parse_file(&self, path: impl AsRef<Path>) -> ResultListing {
        let path = path.as_ref();
        if !path.exists() {
            return ResultListing::failed(format!("result listing not found: {}", path.display()));
        }
        match fs::read(path) {
            // listings occasionally carry stray non-UTF-8 bytes
            Ok(bytes) => self.parse(&String::from_utf8_lossy(&bytes)),
            Err(e) => ResultListing::failed(format!("failed to read {}: {e}", path.display())),
        }
    }

    pub fn parse(&self, text: &str) -> ResultListing {
        let lines: Vec<&str> = text.lines().collect();
        let mut listing = ResultListing::default();

        collect_messages(&lines, &FATAL_MARKERS, &mut listing.errors);
        collect_messages(&lines, &[WARNING_MARKER], &mut listing.warnings);
        if !listing.errors.is_empty() {
            listing.success = false;
            return listing;
        }

        let mut state = State::Scanning;
        let mut block = FlutterBlock::default();
        let mut raw_modes: Vec<ModalResult> = Vec::new();

        for (i, line) in lines.iter().enumerate() {
            let line_no = i + 1;
            let compact: String = line
                .chars()
                .filter(|c| !c.is_whitespace())
                .collect::<String>()
                .to_ascii_uppercase();

            if compact.contains("REALEIGENVALUES") {
                state = State::EigenHeader;
                continue;
            }
            if compact.contains("FLUTTERSUMMARY") {
                state = State::FlutterHeader;
                block = FlutterBlock::default();
                continue;
            }

            let tokens: Vec<&str> = line.split_whitespace().collect();
            match state {
                State::Scanning => {}
                State::EigenHeader | State::EigenRows => {
                    if tokens.is_empty() || is_page_eject(line) {
                        if state == State::EigenRows {
                            state = State::Scanning;
                        }
                        continue;
                    }
                    if tokens[0].parse::<usize>().is_err() {
                        // column headings sit between the title and the rows
                        if state == State::EigenRows {
                            state = State::Scanning;
                        }
                        continue;
                    }
                    state = State::EigenRows;
                    match parse_eigen_row(&tokens) {
                        Some(mode) => raw_modes.push(mode),
                        None => listing
                            .warnings
                            .push(format!("line {line_no}: malformed eigenvalue row skipped")),
                    }
                }
                State::FlutterHeader | State::FlutterRows => {
                    if line.contains("POINT") && line.contains('=') {
                        if state == State::FlutterRows {
                            block = FlutterBlock::default();
                        }
                        parse_block_header(line, &mut block);
                        state = State::FlutterHeader;
                        continue;
                    }
                    if tokens.is_empty() || is_page_eject(line) {
                        if state == State::FlutterRows {
                            state = State::Scanning;
                        }
                        continue;
                    }
                    if !looks_like_flutter_row(&tokens) {
                        if state == State::FlutterRows {
                            state = State::Scanning;
                        }
                        continue;
                    }
                    state = State::FlutterRows;
                    match self.parse_flutter_row(&tokens, &block) {
                        Some(point) => listing.flutter_points.push(point),
                        None => listing
                            .warnings
                            .push(format!("line {line_no}: malformed flutter row skipped")),
                    }
                }
            }
        }

        listing.modal_results = raw_modes
            .into_iter()
            .filter(|m| m.frequency > NEAR_ZERO_FREQUENCY)
            .enumerate()
            .map(|(i, m)| ModalResult { mode: i + 1, ..m })
            .collect();

        if listing.flutter_points.is_empty() {
            listing
                .errors
                .push("no flutter summary found in result listing".to_string());
        }
        listing.critical = find_critical_point(&listing.flutter_points);
        listing.success = listing.errors.is_empty();
        listing
    }

    fn parse_flutter_row(&self, tokens: &[&str], block: &FlutterBlock) -> Option<FlutterPoint> {
        if tokens.len() < 5 {
            return None;
        }
        let reduced_frequency = parse_overflowing(tokens[0])?;
        let velocity = parse_real(tokens[2])? * self.velocity_scale;
        let damping = parse_real(tokens[3])?;
        let frequency = parse_real(tokens[4])?;
        Some(FlutterPoint {
            mode: block.point,
            mach: block.mach,
            density_ratio: block.density_ratio,
            reduced_frequency,
            velocity,
            damping,
            frequency,
        })
    }
}

/// Each marker line plus the next non-blank line.
fn collect_messages(lines: &[&str], markers: &[&str], out: &mut Vec<String>) {
    for (i, line) in lines.iter().enumerate() {
        let upper = line.to_ascii_uppercase();
        if !markers.iter().any(|m| upper.contains(m)) {
            continue;
        }
        let mut message = line.trim().to_string();
        if let Some(next) = lines[i + 1..]
            .iter()
            .map(|l| l.trim())
            .find(|l| !l.is_empty())
        {
            message.push(' ');
            message.push_str(next);
        }
        out.push(message);
    }
}

/// Listing pages start with a `1` carriage-control character.
fn is_page_eject(line: &str) -> bool {
    line.starts_with('1') && line[1..].starts_with(char::is_whitespace)
}

fn parse_eigen_row(tokens: &[&str]) -> Option<ModalResult> {
    if tokens.len() < 7 {
        return None;
    }
    let mode = tokens[0].parse::<usize>().ok()?;
    tokens[1].parse::<usize>().ok()?;
    Some(ModalResult {
        mode,
        eigenvalue: parse_real(tokens[2])?,
        circular_frequency: parse_real(tokens[3])?,
        frequency: parse_real(tokens[4])?,
        generalized_mass: parse_real(tokens[5])?,
        generalized_stiffness: parse_real(tokens[6])?,
    })
}

fn parse_overflowing(token: &str) -> Option<f64> {
    if token.eq_ignore_ascii_case(OVERFLOW) {
        Some(f64::INFINITY)
    } else {
        parse_real(token)
    }
}

fn looks_like_flutter_row(tokens: &[&str]) -> bool {
    tokens.len() >= 3 && parse_overflowing(tokens[0]).is_some() && parse_real(tokens[2]).is_some()
}

/// Reads `POINT = n  MACH NUMBER = m  DENSITY RATIO = r` into `block`.
fn parse_block_header(line: &str, block: &mut FlutterBlock) {
    let upper = line.to_ascii_uppercase();
    if let Some(v) = value_after(&upper, "POINT") {
        block.point = v.parse().unwrap_or(block.point);
    }
    if let Some(v) = value_after(&upper, "MACH NUMBER").and_then(parse_real) {
        block.mach = v;
    }
    if let Some(v) = value_after(&upper, "DENSITY RATIO").and_then(parse_real) {
        block.density_ratio = v;
    }
}

fn value_after<'a>(line: &'a str, key: &str) -> Option<&'a str> {
    let start = line.find(key)? + key.len();
    let rest = line[start..].trim_start().strip_prefix('=')?;
    rest.split_whitespace().next()
}
