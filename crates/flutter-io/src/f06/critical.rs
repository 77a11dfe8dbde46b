//! Flutter onset detection from a velocity sweep.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// Relative frequency change under which two points at adjacent velocities
/// are taken to be the same structural mode.
pub const MODE_MATCH_TOLERANCE: f64 = 0.3;
/// Frequencies at or below this are rigid-body or numerical noise [Hz].
pub const NEAR_ZERO_FREQUENCY: f64 = 0.1;

/// One (velocity, damping, frequency) sample of a flutter summary [SI].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlutterPoint {
    /// Flutter summary block (POINT = n) the sample came from
    pub mode: usize,
    pub mach: f64,
    pub density_ratio: f64,
    /// `+∞` when the listing prints OVERFLOW
    pub reduced_frequency: f64,
    /// [m/s]
    pub velocity: f64,
    pub damping: f64,
    /// [Hz]
    pub frequency: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrossingKind {
    /// Damping of one mode changes sign between two velocities
    Interpolated,
    /// Positive damping with no bracketing stable point
    FirstUnstable,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CriticalPoint {
    /// [m/s]
    pub velocity: f64,
    /// [Hz]
    pub frequency: f64,
    pub mode: usize,
    pub kind: CrossingKind,
}

fn same_mode(f1: f64, f2: f64) -> bool {
    if f1 < NEAR_ZERO_FREQUENCY && f2 < NEAR_ZERO_FREQUENCY {
        return true;
    }
    if f1 <= 0.0 {
        return false;
    }
    ((f2 - f1) / f1).abs() < MODE_MATCH_TOLERANCE
}

/// Lowest velocity at which a tracked mode's damping crosses zero upward.
///
/// Points are grouped by velocity and each adjacent pair of velocities is
/// scanned for mode-matched samples with `d1 < 0 < d2`; the crossing is
/// linearly interpolated. Ties keep the first crossing found. Without any
/// crossing, the lowest velocity carrying positive damping is reported;
/// `None` means no instability in the tested range.
pub fn find_critical_point(points: &[FlutterPoint]) -> Option<CriticalPoint> {
    let mut velocities: Vec<f64> = points
        .iter()
        .map(|p| p.velocity)
        .filter(|v| v.is_finite())
        .collect();
    velocities.sort_by(f64::total_cmp);
    velocities.dedup();

    let at = |v: f64| points.iter().filter(move |p| p.velocity == v);

    let mut best: Option<CriticalPoint> = None;
    for pair in velocities.windows(2) {
        let (v1, v2) = (pair[0], pair[1]);
        for p1 in at(v1) {
            for p2 in at(v2) {
                if !same_mode(p1.frequency, p2.frequency) {
                    continue;
                }
                if p1.damping < 0.0 && p2.damping > 0.0 {
                    let t = -p1.damping / (p2.damping - p1.damping);
                    let candidate = CriticalPoint {
                        velocity: v1 + t * (v2 - v1),
                        frequency: p1.frequency + t * (p2.frequency - p1.frequency),
                        mode: p1.mode,
                        kind: CrossingKind::Interpolated,
                    };
                    let better = best.is_none_or(|b| {
                        candidate.velocity.partial_cmp(&b.velocity) == Some(Ordering::Less)
                    });
                    if better {
                        best = Some(candidate);
                    }
                }
            }
        }
    }
    if best.is_some() {
        return best;
    }

    velocities.iter().find_map(|&v| {
        at(v).find(|p| p.damping > 0.0).map(|p| CriticalPoint {
            velocity: v,
            frequency: p.frequency,
            mode: p.mode,
            kind: CrossingKind::FirstUnstable,
        })
    })
}
