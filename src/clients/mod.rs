//! HTTP boundary. The store and the extractor never perform network I/O;
//! this module hands them raw pages.

pub mod site;

pub use site::{SheetFetcher, SiteClient};
