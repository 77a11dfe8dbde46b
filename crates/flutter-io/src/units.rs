//! Unit conversion between SI and the solver's mm–tonne–s system.
//!
//! | quantity         | SI        | solver        | factor (SI → solver) |
//! |------------------|-----------|---------------|----------------------|
//! | length           | m         | mm            | × 1e3                |
//! | modulus/pressure | Pa        | MPa (N/mm²)   | ÷ 1e6                |
//! | density          | kg/m³     | tonne/mm³     | × 1e-12              |
//! | velocity         | m/s       | mm/s          | × 1e3                |
//! | frequency        | Hz        | Hz            | × 1                  |
//!
//! A wrong exponent here gives silently wrong physics, so every factor is a
//! named constant and the conversions are plain multiplications/divisions.

pub const LENGTH_TO_SOLVER: f64 = 1.0e3;
/// Divisor applied to moduli and pressures
pub const MODULUS_DIVISOR: f64 = 1.0e6;
pub const DENSITY_TO_SOLVER: f64 = 1.0e-12;
pub const VELOCITY_TO_SOLVER: f64 = 1.0e3;

pub fn length_to_solver(metres: f64) -> f64 {
    metres * LENGTH_TO_SOLVER
}

pub fn length_from_solver(millimetres: f64) -> f64 {
    millimetres / LENGTH_TO_SOLVER
}

pub fn modulus_to_solver(pascals: f64) -> f64 {
    pascals / MODULUS_DIVISOR
}

pub fn modulus_from_solver(megapascals: f64) -> f64 {
    megapascals * MODULUS_DIVISOR
}

pub fn density_to_solver(kg_per_m3: f64) -> f64 {
    kg_per_m3 * DENSITY_TO_SOLVER
}

pub fn density_from_solver(tonne_per_mm3: f64) -> f64 {
    tonne_per_mm3 / DENSITY_TO_SOLVER
}

pub fn velocity_to_solver(metres_per_second: f64) -> f64 {
    metres_per_second * VELOCITY_TO_SOLVER
}

pub fn velocity_from_solver(mm_per_second: f64) -> f64 {
    mm_per_second / VELOCITY_TO_SOLVER
}
