use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("Invalid input for {0}: {1}")]
    InvalidInput(String, String),

    #[error("'{text}' is not a day-month-year date in any accepted format")]
    DateParse { text: String },

    #[error("'{value}' is not a recognised {field}")]
    InvalidCategory { field: &'static str, value: String },
}
