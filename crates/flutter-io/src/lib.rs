//! Solver file formats for panel flutter analysis.
//!
//! - [`bdf`]: SOL 145 bulk-data deck writer (fixed 8-column fields) and a
//!   reader for the same format
//! - [`f06`]: result listing parser with eigenvalue/flutter summary
//!   extraction and critical flutter point detection
//! - [`units`]: SI ↔ mm–tonne–s conversion constants
//!
//! ## Usage
//!
//! ```rust,no_run
//! use flutter_io::ResultParser;
//!
//! let listing = ResultParser::new().parse_file("panel.f06");
//! if let Some(v) = listing.critical_velocity() {
//!     println!("flutter onset at {v:.1} m/s");
//! }
//! ```

pub mod bdf;
pub mod error;
pub mod f06;
pub mod units;

pub use bdf::{
    BulkCard, BulkDataConfig, BulkDataWriter, DeckIds, FlutterSolutionMethod, cards_named,
    read_cards, read_file,
};
pub use error::{BulkDataError, EncodingError, Result};
pub use f06::{
    CriticalPoint, CrossingKind, FlutterPoint, ModalResult, ResultListing, ResultParser,
    find_critical_point,
};
