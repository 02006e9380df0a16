//! # Retail Analytics Engine
//!
//! This crate computes the named sales reports over the fact table.
//!
//! ## Architectural Principles
//!
//! - **Layer 1 Logic:** This is a pure logic crate. It has no knowledge of files,
//!   configuration or output formats. It depends only on `core-types` (Layer 0).
//! - **Stateless Calculation:** The `AnalyticsEngine` borrows the table and
//!   nothing else. Each report is an independent function returning its own rows,
//!   so reports can be run in any order, or in isolation.
//! - **Deterministic Ranking:** Groups live in ordered maps and every ranking
//!   documents its tie-break, so the same table always yields the same report.
//!
//! ## Public API
//!
//! - `AnalyticsEngine`: One method per report.
//! - `report`: The typed result rows, and `ReportTable` for rendering them.
//! - `AnalyticsError`: Rejected report parameters.

// Declare the modules that constitute this crate.
pub mod aggregate;
pub mod engine;
pub mod error;
pub mod report;
pub mod stats;

// Re-export the key components to create a clean, public-facing API.
pub use engine::{AnalyticsEngine, TierThresholds};
pub use error::AnalyticsError;
pub use report::{
    AnomalyFlag, BranchMonthGrowth, Cell, CustomerSegment, CustomerSpend, CustomerTypePreference,
    DatasetSummary, GenderMonthlySales, PaymentPopularity, ProductLineProfit, RepeatCustomer,
    ReportTable, SpendTier, Tabular, TransactionAnomaly, WeekdaySales,
};
