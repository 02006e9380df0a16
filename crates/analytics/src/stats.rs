use crate::error::AnalyticsError;
use core_types::PercentileMethod;
use rust_decimal::prelude::*;
use rust_decimal::Decimal;

pub(crate) fn overflow(what: &str) -> AnalyticsError {
    AnalyticsError::Calculation(format!("{what} is outside the decimal range"))
}

/// Adds up `values`, failing instead of wrapping or panicking on overflow.
pub fn checked_sum<I>(values: I) -> Result<Decimal, AnalyticsError>
where
    I: IntoIterator<Item = Decimal>,
{
    values.into_iter().try_fold(Decimal::ZERO, |acc, v| {
        acc.checked_add(v).ok_or_else(|| overflow("sum"))
    })
}

pub fn mean(values: &[Decimal]) -> Result<Decimal, AnalyticsError> {
    if values.is_empty() {
        return Err(AnalyticsError::InvalidParameter(
            "mean of an empty group".to_string(),
        ));
    }
    let sum = checked_sum(values.iter().copied())?;
    sum.checked_div(Decimal::from(values.len()))
        .ok_or_else(|| overflow("mean"))
}

/// Sample standard deviation (`n - 1` denominator).
///
/// Fewer than two values have no spread to measure and yield zero. Deviations
/// are divided by the largest one before squaring, so totals whose squares do
/// not fit in a `Decimal` still have a spread.
pub fn sample_std_dev(values: &[Decimal], mean: Decimal) -> Result<Decimal, AnalyticsError> {
    if values.len() < 2 {
        return Ok(Decimal::ZERO);
    }

    let deviations = values
        .iter()
        .map(|v| v.checked_sub(mean).ok_or_else(|| overflow("deviation from the mean")))
        .collect::<Result<Vec<Decimal>, _>>()?;

    let scale = deviations.iter().map(|d| d.abs()).max().unwrap_or_default();
    if scale.is_zero() {
        return Ok(Decimal::ZERO);
    }

    let squares = checked_sum(deviations.iter().map(|d| {
        let unit = *d / scale;
        unit * unit
    }))?;
    let variance = squares / Decimal::from(values.len() - 1);

    let unit_std_dev = variance.sqrt().ok_or_else(|| {
        AnalyticsError::Calculation(format!("no square root for variance {variance}"))
    })?;
    unit_std_dev
        .checked_mul(scale)
        .ok_or_else(|| overflow("standard deviation"))
}

/// Percentage change from `previous` to `current`, or `None` when there is
/// nothing to compare against.
pub fn growth_pct(previous: Decimal, current: Decimal) -> Result<Option<Decimal>, AnalyticsError> {
    if previous.is_zero() {
        return Ok(None);
    }
    current
        .checked_sub(previous)
        .and_then(|change| change.checked_div(previous))
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .map(Some)
        .ok_or_else(|| overflow("growth rate"))
}

/// Percentile rank of every value within `values`, returned in input order.
pub fn percentile_ranks(values: &[Decimal], method: PercentileMethod) -> Vec<Decimal> {
    let n = values.len();
    let mut sorted = values.to_vec();
    sorted.sort();

    values
        .iter()
        .map(|v| match method {
            PercentileMethod::CumeDist => {
                let at_or_below = sorted.partition_point(|s| s <= v);
                Decimal::from(at_or_below) / Decimal::from(n)
            }
            PercentileMethod::PercentRank => {
                if n < 2 {
                    return Decimal::ZERO;
                }
                let below = sorted.partition_point(|s| s < v);
                Decimal::from(below) / Decimal::from(n - 1)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn mean_of_empty_is_rejected() {
        assert!(matches!(mean(&[]), Err(AnalyticsError::InvalidParameter(_))));
        assert_eq!(mean(&[dec!(2), dec!(4)]), Ok(dec!(3)));
    }

    #[test]
    fn sums_past_the_decimal_range_fail() {
        assert!(matches!(
            checked_sum([Decimal::MAX, Decimal::ONE]),
            Err(AnalyticsError::Calculation(_))
        ));
        assert!(mean(&[Decimal::MAX, Decimal::MAX]).is_err());
    }

    #[test]
    fn std_dev_uses_sample_denominator() {
        let values = [dec!(2), dec!(4), dec!(4), dec!(4), dec!(5), dec!(5), dec!(7), dec!(9)];
        let m = mean(&values).unwrap();
        assert_eq!(m, dec!(5));
        // Sum of squared deviations is 32; 32 / 7 = 4.571428...
        let sd = sample_std_dev(&values, m).unwrap();
        assert_eq!(sd.round_dp(4), dec!(2.1381));
    }

    #[test]
    fn std_dev_of_single_value_is_zero() {
        assert_eq!(sample_std_dev(&[dec!(42)], dec!(42)).unwrap(), Decimal::ZERO);
        assert_eq!(sample_std_dev(&[dec!(3), dec!(3)], dec!(3)).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn std_dev_of_totals_with_huge_squares() {
        // The squared deviations (~2.5e29) do not fit in a Decimal.
        let values = [dec!(1), dec!(1000000000000000)];
        let m = mean(&values).unwrap();
        let sd = sample_std_dev(&values, m).unwrap();
        // (1e15 - 1) / sqrt(2)
        assert!(sd > dec!(707106781186546) && sd < dec!(707106781186548));
    }

    #[test]
    fn std_dev_beyond_the_decimal_range_fails() {
        let values = [Decimal::MAX, Decimal::MIN];
        let m = mean(&values).unwrap();
        assert!(matches!(
            sample_std_dev(&values, m),
            Err(AnalyticsError::Calculation(_))
        ));
    }

    #[test]
    fn growth_against_zero_is_undefined() {
        assert_eq!(growth_pct(Decimal::ZERO, dec!(10)), Ok(None));
        assert_eq!(growth_pct(dec!(100), dec!(150)), Ok(Some(dec!(50))));
        assert_eq!(growth_pct(dec!(200), dec!(150)), Ok(Some(dec!(-25))));
        assert!(growth_pct(dec!(0.0001), Decimal::MAX).is_err());
    }

    #[test]
    fn cume_dist_counts_ties_at_or_below() {
        let ranks = percentile_ranks(&[dec!(10), dec!(20), dec!(20), dec!(40)], PercentileMethod::CumeDist);
        assert_eq!(ranks, vec![dec!(0.25), dec!(0.75), dec!(0.75), dec!(1)]);
    }

    #[test]
    fn percent_rank_uses_minimum_rank() {
        let ranks = percentile_ranks(
            &[dec!(10), dec!(20), dec!(20), dec!(40), dec!(50)],
            PercentileMethod::PercentRank,
        );
        assert_eq!(ranks, vec![dec!(0), dec!(0.25), dec!(0.25), dec!(0.75), dec!(1)]);
        assert_eq!(percentile_ranks(&[dec!(7)], PercentileMethod::PercentRank), vec![dec!(0)]);
    }
}
