use crate::error::ConfigError;
use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod logging;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use settings::{
    DatasetSettings, LoggingSettings, OutputFormat, OutputSettings, ParseErrorPolicy,
    ReportSettings, Settings,
};

/// Loads and validates the application configuration.
///
/// Sources are layered: built-in defaults, then the TOML file, then
/// `RETAIL__<SECTION>__<KEY>` environment variables. Without an explicit
/// `path`, an optional `retail.toml` in the working directory is read; an
/// explicit path must exist.
pub fn load_config(path: Option<&Path>) -> Result<Settings, ConfigError> {
    let file = match path {
        Some(p) => config::File::from(p).required(true),
        None => config::File::with_name("retail").required(false),
    };

    let builder = config::Config::builder()
        .add_source(file)
        .add_source(
            config::Environment::with_prefix("RETAIL")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    // Attempt to deserialize the entire configuration into our `Settings` struct
    let settings = builder.try_deserialize::<Settings>()?;
    settings.validate()?;

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::{PercentileMethod, YearStyle};
    use rust_decimal_macros::dec;
    use std::io::Write;

    #[test]
    fn reads_partial_toml_over_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[dataset]
path = "data/sales.csv"
year_styles = ["long"]
on_parse_error = "abort"

[reports]
stddev_factor = 3
percentile_method = "percent_rank"
high_tier_threshold = 0.75

[output]
format = "json"
"#
        )
        .unwrap();

        let settings = load_config(Some(file.path())).unwrap();
        assert_eq!(settings.dataset.on_parse_error, ParseErrorPolicy::Abort);
        assert_eq!(settings.dataset.year_styles, vec![YearStyle::Long]);
        assert_eq!(settings.reports.stddev_factor, dec!(3));
        assert_eq!(settings.reports.high_tier_threshold, dec!(0.75));
        assert_eq!(settings.reports.medium_tier_threshold, dec!(0.33));
        assert_eq!(settings.reports.percentile_method, PercentileMethod::PercentRank);
        assert_eq!(settings.reports.repeat_window_days, 30);
        assert_eq!(settings.output.format, OutputFormat::Json);
    }

    #[test]
    fn invalid_file_contents_fail_validation() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[reports]\nmedium_tier_threshold = 0.9").unwrap();

        assert!(matches!(
            load_config(Some(file.path())),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let missing = Path::new("definitely/not/here.toml");
        assert!(matches!(
            load_config(Some(missing)),
            Err(ConfigError::LoadError(_))
        ));
    }
}
