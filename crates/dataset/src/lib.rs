//! # Retail Dataset Crate
//!
//! Reads the sales fact table from a CSV export and turns it into validated
//! `SalesRecord`s. This is the only crate that touches the input file.
//!
//! ## Public API
//!
//! - `load_sales` / `read_sales`: Load a table from a path or any reader.
//! - `LoadOptions`: Date format, parse-error policy and total tolerance.
//! - `SalesTable`: The immutable, validated table plus the rows it rejected.
//! - `DatasetError`: Schema, row-level and I/O failures.

// Declare the modules that constitute this crate.
pub mod error;
pub mod loader;
pub mod schema;

// Re-export the key components to create a clean, public-facing API.
pub use error::DatasetError;
pub use loader::{load_sales, read_sales, LoadOptions, RejectedRow, SalesTable};
pub use schema::{Column, ColumnMap};
