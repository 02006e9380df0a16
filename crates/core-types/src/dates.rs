use crate::error::CoreError;
use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The width of the year token in a day-month-year date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum YearStyle {
    /// Four digits, e.g. `05/01/2019`.
    Long,
    /// Two digits, e.g. `05/01/19`.
    Short,
}

impl YearStyle {
    fn digits(&self) -> usize {
        match self {
            YearStyle::Long => 4,
            YearStyle::Short => 2,
        }
    }

    fn specifier(&self) -> &'static str {
        match self {
            YearStyle::Long => "%Y",
            YearStyle::Short => "%y",
        }
    }
}

/// Parses day-month-year dates where the source mixes two- and four-digit years.
///
/// chrono's `%Y` happily reads `19` as the year 19 AD, so the style is chosen
/// from the width of the year token before the text is handed to chrono.
#[derive(Debug, Clone)]
pub struct DateNormalizer {
    separator: char,
    styles: Vec<YearStyle>,
}

impl Default for DateNormalizer {
    fn default() -> Self {
        Self {
            separator: '/',
            styles: vec![YearStyle::Long, YearStyle::Short],
        }
    }
}

impl DateNormalizer {
    pub fn new(separator: char, styles: Vec<YearStyle>) -> Result<Self, CoreError> {
        if separator.is_ascii_alphanumeric() || separator == '%' {
            return Err(CoreError::InvalidInput(
                "date separator".to_string(),
                separator.to_string(),
            ));
        }
        if styles.is_empty() {
            return Err(CoreError::InvalidInput(
                "year styles".to_string(),
                "at least one style must be accepted".to_string(),
            ));
        }
        Ok(Self { separator, styles })
    }

    pub fn parse(&self, text: &str) -> Result<NaiveDate, CoreError> {
        let text = text.trim();
        let err = || CoreError::DateParse {
            text: text.to_string(),
        };

        let year_token = text.rsplit(self.separator).next().ok_or_else(err)?;
        let style = self
            .styles
            .iter()
            .find(|s| s.digits() == year_token.len())
            .ok_or_else(err)?;

        let format = format!(
            "%d{sep}%m{sep}{year}",
            sep = self.separator,
            year = style.specifier()
        );
        NaiveDate::parse_from_str(text, &format).map_err(|_| err())
    }
}

/// A calendar month, used as the bucket key for monthly grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Full English name of the day of the week.
pub fn weekday_name(date: NaiveDate) -> &'static str {
    match date.weekday() {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parses_both_year_widths() {
        let normalizer = DateNormalizer::default();
        assert_eq!(normalizer.parse("05/01/2019").unwrap(), date(2019, 1, 5));
        assert_eq!(normalizer.parse("05/01/19").unwrap(), date(2019, 1, 5));
        assert_eq!(normalizer.parse(" 28/02/2019 ").unwrap(), date(2019, 2, 28));
    }

    #[test]
    fn rejects_month_day_order_and_garbage() {
        let normalizer = DateNormalizer::default();
        assert!(normalizer.parse("01/25/2019").is_err());
        assert!(normalizer.parse("2019-01-05").is_err());
        assert!(normalizer.parse("5/1/201").is_err());
        assert!(normalizer.parse("").is_err());
    }

    #[test]
    fn restricted_styles_reject_the_other_width() {
        let normalizer = DateNormalizer::new('-', vec![YearStyle::Long]).unwrap();
        assert_eq!(normalizer.parse("05-01-2019").unwrap(), date(2019, 1, 5));
        assert_eq!(
            normalizer.parse("05-01-19"),
            Err(CoreError::DateParse {
                text: "05-01-19".to_string()
            })
        );
    }

    #[test]
    fn alphanumeric_separator_is_refused() {
        assert!(DateNormalizer::new('x', vec![YearStyle::Long]).is_err());
        assert!(DateNormalizer::new('/', vec![]).is_err());
    }

    #[test]
    fn buckets_and_weekdays() {
        let d = date(2019, 3, 4);
        assert_eq!(YearMonth::of(d).to_string(), "2019-03");
        assert!(YearMonth::of(date(2018, 12, 31)) < YearMonth::of(date(2019, 1, 1)));
        assert_eq!(weekday_name(d), "Monday");
        assert_eq!(weekday_name(date(2019, 3, 10)), "Sunday");
    }
}
