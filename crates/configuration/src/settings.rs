use crate::error::ConfigError;
use core_types::{CoreError, DateNormalizer, PercentileMethod, RepeatDefinition, YearStyle};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use std::path::PathBuf;

/// The root configuration structure for the entire application.
///
/// Every section is optional in `retail.toml`; anything left out falls back
/// to the defaults below.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub dataset: DatasetSettings,
    pub reports: ReportSettings,
    pub output: OutputSettings,
    pub logging: LoggingSettings,
}

/// What to do with a row that fails to parse or validate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum ParseErrorPolicy {
    /// Log the row, leave it out of every aggregate, and keep going.
    #[default]
    Skip,
    /// Stop the load at the first bad row.
    Abort,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum OutputFormat {
    #[default]
    Table,
    Csv,
    Json,
}

/// Where the fact table lives and how its rows are read.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatasetSettings {
    /// Path to the CSV export of the sales table.
    pub path: Option<PathBuf>,
    /// Separator between day, month and year in the `Date` column.
    pub date_separator: String,
    /// Year widths accepted in the `Date` column.
    pub year_styles: Vec<YearStyle>,
    pub on_parse_error: ParseErrorPolicy,
    /// Largest accepted gap between `total` and `cogs + gross income`.
    pub total_tolerance: Decimal,
}

/// Parameters for the individual reports.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReportSettings {
    /// Number of standard deviations from the mean before a total is anomalous.
    pub stddev_factor: Decimal,
    pub high_tier_threshold: Decimal,
    pub medium_tier_threshold: Decimal,
    pub percentile_method: PercentileMethod,
    /// Days within which a second purchase counts as a repeat.
    pub repeat_window_days: i64,
    pub repeat_definition: RepeatDefinition,
    pub top_customers: usize,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Filter used when `RUST_LOG` is not set.
    pub level: String,
    /// When set, logs are also written to a daily-rolling file in this directory.
    pub directory: Option<PathBuf>,
}

// --- Default Implementations ---

impl Default for DatasetSettings {
    fn default() -> Self {
        Self {
            path: None,
            date_separator: "/".to_string(),
            year_styles: vec![YearStyle::Long, YearStyle::Short],
            on_parse_error: ParseErrorPolicy::Skip,
            total_tolerance: dec!(0.01),
        }
    }
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            stddev_factor: dec!(2),
            high_tier_threshold: dec!(0.66),
            medium_tier_threshold: dec!(0.33),
            percentile_method: PercentileMethod::CumeDist,
            repeat_window_days: 30,
            repeat_definition: RepeatDefinition::PairsWithinWindow,
            top_customers: 5,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            directory: None,
        }
    }
}

impl DatasetSettings {
    /// Builds the date parser described by `date_separator` and `year_styles`.
    pub fn date_normalizer(&self) -> Result<DateNormalizer, ConfigError> {
        let mut chars = self.date_separator.chars();
        let separator = match (chars.next(), chars.next()) {
            (Some(c), None) => c,
            _ => {
                return Err(ConfigError::ValidationError(format!(
                    "dataset.date_separator must be a single character, got '{}'",
                    self.date_separator
                )));
            }
        };
        DateNormalizer::new(separator, self.year_styles.clone())
            .map_err(|e: CoreError| ConfigError::ValidationError(e.to_string()))
    }
}

impl Settings {
    /// Checks cross-field constraints that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.dataset.date_normalizer()?;

        if self.dataset.total_tolerance.is_sign_negative() {
            return Err(ConfigError::ValidationError(
                "dataset.total_tolerance must not be negative".to_string(),
            ));
        }

        let r = &self.reports;
        if r.stddev_factor.is_sign_negative() {
            return Err(ConfigError::ValidationError(
                "reports.stddev_factor must not be negative".to_string(),
            ));
        }
        let in_unit_range = |v: Decimal| v >= Decimal::ZERO && v <= Decimal::ONE;
        if !in_unit_range(r.high_tier_threshold) || !in_unit_range(r.medium_tier_threshold) {
            return Err(ConfigError::ValidationError(
                "tier thresholds must lie between 0 and 1".to_string(),
            ));
        }
        if r.medium_tier_threshold > r.high_tier_threshold {
            return Err(ConfigError::ValidationError(format!(
                "reports.medium_tier_threshold ({}) exceeds reports.high_tier_threshold ({})",
                r.medium_tier_threshold, r.high_tier_threshold
            )));
        }
        if r.repeat_window_days < 0 {
            return Err(ConfigError::ValidationError(
                "reports.repeat_window_days must not be negative".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let settings = Settings::default();
        settings.validate().unwrap();
        assert_eq!(settings.reports.stddev_factor, dec!(2));
        assert_eq!(settings.reports.top_customers, 5);
        assert_eq!(settings.dataset.on_parse_error, ParseErrorPolicy::Skip);
    }

    #[test]
    fn thresholds_out_of_order_are_rejected() {
        let mut settings = Settings::default();
        settings.reports.medium_tier_threshold = dec!(0.8);
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn multi_character_separator_is_rejected() {
        let mut settings = Settings::default();
        settings.dataset.date_separator = "//".to_string();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn negative_factor_is_rejected() {
        let mut settings = Settings::default();
        settings.reports.stddev_factor = dec!(-1);
        assert!(settings.validate().is_err());
    }
}
