//! Nastran bulk-data deck writing and reading.

pub mod field;
pub mod reader;
pub mod writer;

pub use field::{Card, Field, format_real, parse_real};
pub use reader::{BulkCard, cards_named, read_cards, read_file};
pub use writer::{BulkDataConfig, BulkDataWriter, DeckIds, FlutterSolutionMethod, velocity_sweep};
