//! Historical bar input.

mod csv_source;

pub use csv_source::{validate_order, CsvBarSource};
