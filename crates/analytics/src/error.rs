use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum AnalyticsError {
    #[error("Invalid report parameter: {0}")]
    InvalidParameter(String),

    #[error("Error in calculation: {0}")]
    Calculation(String),
}
