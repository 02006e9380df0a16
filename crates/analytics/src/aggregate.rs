//! Grouping and ranking primitives shared by the reports.
//!
//! Groups are kept in `BTreeMap`s so every report iterates its buckets in a
//! fixed order and ties resolve the same way on every run.

use crate::error::AnalyticsError;
use crate::stats::overflow;
use core_types::SalesRecord;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

/// Sums `value` over every record, grouped by `key`.
pub fn sum_by<K, F, V>(records: &[SalesRecord], key: F, value: V) -> Result<BTreeMap<K, Decimal>, AnalyticsError>
where
    K: Ord,
    F: Fn(&SalesRecord) -> K,
    V: Fn(&SalesRecord) -> Decimal,
{
    let mut groups = BTreeMap::new();
    for record in records {
        let total = groups.entry(key(record)).or_insert(Decimal::ZERO);
        *total = total
            .checked_add(value(record))
            .ok_or_else(|| overflow("group total"))?;
    }
    Ok(groups)
}

/// Counts records grouped by `key`.
pub fn count_by<K, F>(records: &[SalesRecord], key: F) -> BTreeMap<K, usize>
where
    K: Ord,
    F: Fn(&SalesRecord) -> K,
{
    let mut groups = BTreeMap::new();
    for record in records {
        *groups.entry(key(record)).or_insert(0) += 1;
    }
    groups
}

/// Keeps the highest-valued key within each partition.
///
/// `grouped` is keyed by `(partition, key)`. Within a partition keys are
/// visited in ascending order and only a strictly greater value replaces the
/// current best, so ties go to the smallest key.
pub fn top_per_partition<P, K, V>(grouped: &BTreeMap<(P, K), V>) -> BTreeMap<P, (K, V)>
where
    P: Ord + Clone,
    K: Clone,
    V: PartialOrd + Copy,
{
    let mut best: BTreeMap<P, (K, V)> = BTreeMap::new();
    for ((partition, key), value) in grouped {
        match best.get_mut(partition) {
            Some(current) if *value > current.1 => *current = (key.clone(), *value),
            Some(_) => {}
            None => {
                best.insert(partition.clone(), (key.clone(), *value));
            }
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use core_types::{CustomerType, Gender, PaymentMethod, ProductLine};
    use rust_decimal_macros::dec;

    fn record(customer: &str, total: Decimal) -> SalesRecord {
        SalesRecord {
            invoice_id: format!("{customer}-{total}"),
            branch: "A".to_string(),
            city: "Yangon".to_string(),
            customer_id: customer.to_string(),
            customer_type: CustomerType::Normal,
            gender: Gender::Male,
            product_line: ProductLine::SportsAndTravel,
            unit_price: total,
            quantity: 1,
            tax: Decimal::ZERO,
            total,
            date: NaiveDate::from_ymd_opt(2019, 1, 1).unwrap(),
            payment: PaymentMethod::Cash,
            cogs: total,
            gross_margin_pct: Decimal::ZERO,
            gross_income: Decimal::ZERO,
            rating: dec!(5),
        }
    }

    #[test]
    fn sum_by_groups_and_adds() {
        let records = [record("a", dec!(1.5)), record("b", dec!(2)), record("a", dec!(3))];
        let sums = sum_by(&records, |r| r.customer_id.clone(), |r| r.total).unwrap();
        assert_eq!(sums["a"], dec!(4.5));
        assert_eq!(sums["b"], dec!(2));
        assert_eq!(count_by(&records, |r| r.customer_id.clone())["a"], 2);
    }

    #[test]
    fn sum_by_reports_overflow() {
        let records = [record("a", Decimal::MAX), record("a", Decimal::MAX)];
        assert!(matches!(
            sum_by(&records, |r| r.customer_id.clone(), |r| r.total),
            Err(AnalyticsError::Calculation(_))
        ));
    }

    #[test]
    fn top_per_partition_prefers_larger_then_smaller_key() {
        let mut grouped = BTreeMap::new();
        grouped.insert(("A", "x"), 5);
        grouped.insert(("A", "y"), 9);
        grouped.insert(("A", "z"), 9);
        grouped.insert(("B", "b"), 3);
        grouped.insert(("B", "a"), 3);

        let top = top_per_partition(&grouped);
        assert_eq!(top.len(), 2);
        assert_eq!(top["A"], ("y", 9));
        assert_eq!(top["B"], ("a", 3));
    }

    #[test]
    fn top_per_partition_of_nothing_is_empty() {
        let grouped: BTreeMap<(u8, u8), u32> = BTreeMap::new();
        assert!(top_per_partition(&grouped).is_empty());
    }
}
