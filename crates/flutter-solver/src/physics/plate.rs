//! Natural frequencies of a rectangular plate.
//!
//! Uses the simply-supported orthotropic closed form for every boundary code;
//! boundary effects enter the flutter methods through their calibration
//! constants instead.
//!
//! ```text
//! f_mn = 1/(2π) · sqrt( π⁴/(ρh) · [D11 (m/a)⁴ + 2(D12 + 2 D66)(m/a)²(n/b)² + D22 (n/b)⁴] )
//! ```
//!
//! For an isotropic plate the bracket collapses to `D((m/a)² + (n/b)²)²`.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use super::{PanelProperties, PhysicsError, Result};

/// Half-wave numbers m, n are enumerated in 1..=MAX_MODE_INDEX
pub const MAX_MODE_INDEX: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModeShape {
    /// Streamwise half-waves
    pub m: usize,
    /// Spanwise half-waves
    pub n: usize,
    /// [Hz]
    pub frequency: f64,
}

fn mode_frequency(panel: &PanelProperties, m: usize, n: usize) -> f64 {
    let d = &panel.bending;
    let alpha = m as f64 / panel.length;
    let beta = n as f64 / panel.width;
    let stiffness = d.d11 * alpha.powi(4)
        + 2.0 * (d.d12 + 2.0 * d.d66) * alpha.powi(2) * beta.powi(2)
        + d.d22 * beta.powi(4);
    (PI.powi(4) / panel.mass_per_area() * stiffness).sqrt() / (2.0 * PI)
}

/// The `count` lowest plate modes, ascending by frequency.
pub fn plate_modes(panel: &PanelProperties, count: usize) -> Result<Vec<ModeShape>> {
    panel.validate()?;
    if count == 0 {
        return Err(PhysicsError::InvalidInput(
            "at least one mode must be requested".to_string(),
        ));
    }
    if count > MAX_MODE_INDEX * MAX_MODE_INDEX {
        return Err(PhysicsError::InvalidInput(format!(
            "at most {} modes are available (requested {count})",
            MAX_MODE_INDEX * MAX_MODE_INDEX
        )));
    }

    let mut modes = Vec::with_capacity(MAX_MODE_INDEX * MAX_MODE_INDEX);
    for m in 1..=MAX_MODE_INDEX {
        for n in 1..=MAX_MODE_INDEX {
            let frequency = mode_frequency(panel, m, n);
            if !frequency.is_finite() || frequency <= 0.0 {
                return Err(PhysicsError::Degenerate(format!(
                    "mode ({m},{n}) has no real positive frequency ({frequency})"
                )));
            }
            modes.push(ModeShape { m, n, frequency });
        }
    }
    modes.sort_by(|a, b| a.frequency.total_cmp(&b.frequency));
    modes.truncate(count);
    Ok(modes)
}

/// The `count` lowest natural frequencies [Hz], ascending.
pub fn natural_frequencies(panel: &PanelProperties, count: usize) -> Result<Vec<f64>> {
    Ok(plate_modes(panel, count)?
        .into_iter()
        .map(|mode| mode.frequency)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flutter_model::{BendingStiffness, BoundaryEdgeCode, PanelGeometry, flexural_rigidity};

    fn aluminium(a: f64, b: f64, h: f64) -> PanelProperties {
        PanelProperties::isotropic(
            &PanelGeometry::new(a, b, h),
            71.7e9,
            0.33,
            2810.0,
            BoundaryEdgeCode::default(),
        )
    }

    #[test]
    fn fundamental_matches_closed_form() {
        let panel = aluminium(0.3, 0.3, 0.0015);
        let d = flexural_rigidity(71.7e9, 0.33, 0.0015);
        let rho_h = 2810.0 * 0.0015;
        let k = (1.0 / 0.3_f64).powi(2) * 2.0;
        let expected = (PI.powi(4) * d / rho_h * k * k).sqrt() / (2.0 * PI);

        let f = natural_frequencies(&panel, 1).unwrap();
        assert!((f[0] - expected).abs() / expected < 1e-12);
        assert!((f[0] - 80.9).abs() < 0.5);
    }

    #[test]
    fn square_plate_degenerate_pair_follows_fundamental() {
        let panel = aluminium(0.3, 0.3, 0.0015);
        let modes = plate_modes(&panel, 3).unwrap();
        assert_eq!((modes[0].m, modes[0].n), (1, 1));
        // (1,2) and (2,1) share a frequency on a square plate
        assert!((modes[1].frequency - modes[2].frequency).abs() < 1e-9);
        assert!((modes[1].frequency / modes[0].frequency - 2.5).abs() < 1e-9);
    }

    #[test]
    fn frequencies_are_sorted_and_counted() {
        let panel = aluminium(0.5, 0.25, 0.002);
        let f = natural_frequencies(&panel, 20).unwrap();
        assert_eq!(f.len(), 20);
        assert!(f.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn orthotropic_stiffness_raises_streamwise_modes() {
        let mut panel = aluminium(0.3, 0.3, 0.0015);
        let iso = natural_frequencies(&panel, 1).unwrap()[0];
        let d = panel.bending;
        panel.bending = BendingStiffness {
            d11: 4.0 * d.d11,
            ..d
        };
        let stiff = natural_frequencies(&panel, 1).unwrap()[0];
        assert!(stiff > iso);
    }

    #[test]
    fn rejects_degenerate_requests() {
        let panel = aluminium(0.3, 0.3, 0.0015);
        assert!(natural_frequencies(&panel, 0).is_err());
        assert!(natural_frequencies(&panel, 101).is_err());

        let mut negative = panel;
        negative.bending.d12 = -10.0 * panel.bending.d11;
        assert!(matches!(
            natural_frequencies(&negative, 5),
            Err(PhysicsError::Degenerate(_))
        ));
    }
}
