//! # Retail Core Types
//!
//! Layer 0 of the workspace: the sales record, its categorical fields, and the
//! date handling every other crate shares. Nothing in here performs I/O.

pub mod dates;
pub mod enums;
pub mod error;
pub mod structs;

// Re-export the core types to provide a clean public API.
pub use dates::{weekday_name, DateNormalizer, YearMonth, YearStyle};
pub use enums::{CustomerType, Gender, PaymentMethod, PercentileMethod, ProductLine, RepeatDefinition};
pub use error::CoreError;
pub use structs::SalesRecord;
