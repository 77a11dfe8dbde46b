//! Result listing parsing and flutter onset detection.

pub mod critical;
pub mod parser;

pub use critical::{
    CriticalPoint, CrossingKind, FlutterPoint, MODE_MATCH_TOLERANCE, NEAR_ZERO_FREQUENCY,
    find_critical_point,
};
pub use parser::{ModalResult, ResultListing, ResultParser};
