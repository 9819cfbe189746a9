//! Turning fetched sheet pages into typed records.

pub mod sheet;

pub use sheet::{ExtractError, SheetExtractor};
