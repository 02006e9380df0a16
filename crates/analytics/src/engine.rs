use crate::aggregate::{count_by, sum_by, top_per_partition};
use crate::error::AnalyticsError;
use crate::report::{
    AnomalyFlag, BranchMonthGrowth, CustomerSegment, CustomerSpend, CustomerTypePreference,
    DatasetSummary, GenderMonthlySales, PaymentPopularity, ProductLineProfit, RepeatCustomer,
    SpendTier, TransactionAnomaly, WeekdaySales,
};
use crate::stats;
use chrono::{Datelike, NaiveDate};
use core_types::{weekday_name, PercentileMethod, ProductLine, RepeatDefinition, SalesRecord};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, BTreeSet};

/// Percentile cut-offs for the spend tiers. A customer at exactly a cut-off
/// belongs to the higher tier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TierThresholds {
    pub high: Decimal,
    pub medium: Decimal,
}

impl Default for TierThresholds {
    fn default() -> Self {
        Self {
            high: Decimal::new(66, 2),
            medium: Decimal::new(33, 2),
        }
    }
}

impl TierThresholds {
    fn validate(&self) -> Result<(), AnalyticsError> {
        let unit = |v: Decimal| v >= Decimal::ZERO && v <= Decimal::ONE;
        if !unit(self.high) || !unit(self.medium) || self.medium > self.high {
            return Err(AnalyticsError::InvalidParameter(format!(
                "tier thresholds must satisfy 0 <= medium ({}) <= high ({}) <= 1",
                self.medium, self.high
            )));
        }
        Ok(())
    }

    fn tier(&self, percentile: Decimal) -> SpendTier {
        if percentile >= self.high {
            SpendTier::High
        } else if percentile >= self.medium {
            SpendTier::Medium
        } else {
            SpendTier::Low
        }
    }
}

/// A stateless calculator for the sales reports.
///
/// The engine only borrows the fact table. Every report is a pure function of
/// that table and its arguments, and returns freshly built rows; an empty
/// table (or a report with no qualifying rows) yields an empty result rather
/// than an error.
#[derive(Debug, Clone, Copy)]
pub struct AnalyticsEngine<'a> {
    records: &'a [SalesRecord],
}

impl<'a> AnalyticsEngine<'a> {
    pub fn new(records: &'a [SalesRecord]) -> Self {
        Self { records }
    }

    /// Headline figures for the whole table.
    pub fn summary(&self) -> Result<DatasetSummary, AnalyticsError> {
        let customers: BTreeSet<&str> = self.records.iter().map(|r| r.customer_id.as_str()).collect();
        let branches: BTreeSet<&str> = self.records.iter().map(|r| r.branch.as_str()).collect();

        Ok(DatasetSummary {
            transactions: self.records.len(),
            customers: customers.len(),
            branches: branches.len(),
            first_date: self.records.iter().map(|r| r.date).min(),
            last_date: self.records.iter().map(|r| r.date).max(),
            total_sales: stats::checked_sum(self.records.iter().map(|r| r.total))?,
            total_cogs: stats::checked_sum(self.records.iter().map(|r| r.cogs))?,
            total_gross_income: stats::checked_sum(self.records.iter().map(|r| r.gross_income))?,
        })
    }

    /// Monthly sales per branch with month-over-month growth.
    ///
    /// Growth compares each month with the branch's previous month *in the
    /// data*. The first month of a branch has no growth rate, and neither does
    /// a month following one that sold nothing. Rows are ordered by branch,
    /// then month.
    pub fn branch_monthly_growth(&self) -> Result<Vec<BranchMonthGrowth>, AnalyticsError> {
        let monthly = sum_by(self.records, |r| (r.branch.clone(), r.month()), |r| r.total)?;

        let mut rows = Vec::with_capacity(monthly.len());
        let mut previous: Option<(&str, Decimal)> = None;
        for ((branch, month), total) in &monthly {
            let growth_pct = match previous {
                Some((prev_branch, prev_total)) if prev_branch == branch.as_str() => {
                    stats::growth_pct(prev_total, *total)?
                }
                _ => None,
            };
            rows.push(BranchMonthGrowth {
                branch: branch.clone(),
                month: *month,
                total_sales: *total,
                growth_pct,
            });
            previous = Some((branch.as_str(), *total));
        }
        Ok(rows)
    }

    /// The (branch, month) with the highest month-over-month growth.
    ///
    /// Ties go to the earliest month, then the lowest branch id. `None` when no
    /// branch has two comparable months.
    pub fn top_branch_growth(&self) -> Result<Option<BranchMonthGrowth>, AnalyticsError> {
        let mut best: Option<(Decimal, BranchMonthGrowth)> = None;
        for row in self.branch_monthly_growth()? {
            let Some(growth) = row.growth_pct else {
                continue;
            };
            let better = match &best {
                None => true,
                Some((best_growth, current)) => {
                    growth > *best_growth
                        || (growth == *best_growth
                            && (row.month, &row.branch) < (current.month, &current.branch))
                }
            };
            if better {
                best = Some((growth, row));
            }
        }
        Ok(best.map(|(_, row)| row))
    }

    /// Profit (`sum(gross income) - sum(cogs)`) for every branch and product line.
    pub fn product_line_profit(&self) -> Result<Vec<ProductLineProfit>, AnalyticsError> {
        Ok(self
            .profit_by_branch_line()?
            .into_iter()
            .map(|((branch, product_line), profit)| ProductLineProfit {
                branch,
                product_line,
                profit,
            })
            .collect())
    }

    /// The most profitable product line of each branch. Ties go to the product
    /// line whose name sorts first.
    pub fn top_product_line_by_branch(&self) -> Result<Vec<ProductLineProfit>, AnalyticsError> {
        Ok(top_per_partition(&self.profit_by_branch_line()?)
            .into_iter()
            .map(|(branch, (product_line, profit))| ProductLineProfit {
                branch,
                product_line,
                profit,
            })
            .collect())
    }

    fn profit_by_branch_line(&self) -> Result<BTreeMap<(String, ProductLine), Decimal>, AnalyticsError> {
        let key = |r: &SalesRecord| (r.branch.clone(), r.product_line);
        let income = sum_by(self.records, key, |r| r.gross_income)?;
        let cogs = sum_by(self.records, key, |r| r.cogs)?;

        income
            .into_iter()
            .map(|(k, gross_income)| {
                let line_cogs = cogs.get(&k).copied().unwrap_or_default();
                let profit = gross_income
                    .checked_sub(line_cogs)
                    .ok_or_else(|| stats::overflow("profit"))?;
                Ok((k, profit))
            })
            .collect()
    }

    /// Places every customer in exactly one spend tier by percentile rank.
    ///
    /// Rows are ordered by spend, highest first, then customer id.
    pub fn spend_segments(
        &self,
        thresholds: TierThresholds,
        method: PercentileMethod,
    ) -> Result<Vec<CustomerSegment>, AnalyticsError> {
        thresholds.validate()?;

        let spend = sum_by(self.records, |r| r.customer_id.clone(), |r| r.total)?;
        let totals: Vec<Decimal> = spend.values().copied().collect();
        let percentiles = stats::percentile_ranks(&totals, method);

        let mut rows: Vec<CustomerSegment> = spend
            .into_iter()
            .zip(percentiles)
            .map(|((customer_id, total_spend), percentile)| CustomerSegment {
                customer_id,
                total_spend,
                percentile,
                tier: thresholds.tier(percentile),
            })
            .collect();

        rows.sort_by(|a, b| {
            b.total_spend
                .cmp(&a.total_spend)
                .then_with(|| a.customer_id.cmp(&b.customer_id))
        });
        Ok(rows)
    }

    /// Flags every transaction whose total lies more than `std_dev_factor`
    /// sample standard deviations from its product line's mean.
    ///
    /// Rows follow table order. A product line with a single transaction has a
    /// standard deviation of zero, so its transaction is always `Normal`. A
    /// band wider than the decimal range flags nothing.
    pub fn anomalies(&self, std_dev_factor: Decimal) -> Result<Vec<TransactionAnomaly>, AnalyticsError> {
        if std_dev_factor.is_sign_negative() {
            return Err(AnalyticsError::InvalidParameter(format!(
                "standard deviation factor must not be negative, got {std_dev_factor}"
            )));
        }

        let mut totals_by_line: BTreeMap<ProductLine, Vec<Decimal>> = BTreeMap::new();
        for record in self.records {
            totals_by_line.entry(record.product_line).or_default().push(record.total);
        }

        let mut line_stats = BTreeMap::new();
        for (line, totals) in &totals_by_line {
            let mean = stats::mean(totals)?;
            let std_dev = stats::sample_std_dev(totals, mean)?;
            let band = std_dev.checked_mul(std_dev_factor);
            tracing::debug!(product_line = %line, %mean, %std_dev, count = totals.len(), "Product line spread");
            line_stats.insert(*line, (mean, std_dev, band));
        }

        let mut rows = Vec::with_capacity(self.records.len());
        for record in self.records {
            let Some(&(mean, std_dev, band)) = line_stats.get(&record.product_line) else {
                continue;
            };
            let deviation = record
                .total
                .checked_sub(mean)
                .ok_or_else(|| stats::overflow("deviation from the mean"))?;
            let flag = match band {
                Some(band) if deviation > band => AnomalyFlag::HighAnomaly,
                Some(band) if deviation < -band => AnomalyFlag::LowAnomaly,
                _ => AnomalyFlag::Normal,
            };
            rows.push(TransactionAnomaly {
                invoice_id: record.invoice_id.clone(),
                product_line: record.product_line,
                total: record.total,
                line_mean: mean,
                line_std_dev: std_dev,
                flag,
            });
        }
        Ok(rows)
    }

    /// The most used payment method in each city.
    ///
    /// Equal counts go to the method declared first (Cash, Credit card,
    /// Ewallet), which keeps the answer independent of row order.
    pub fn payment_popularity(&self) -> Vec<PaymentPopularity> {
        let counts = count_by(self.records, |r| (r.city.clone(), r.payment));
        top_per_partition(&counts)
            .into_iter()
            .map(|(city, (payment, transactions))| PaymentPopularity {
                city,
                payment,
                transactions,
            })
            .collect()
    }

    /// Sales cross-tabulated by month and gender, ordered by month then gender.
    pub fn gender_monthly_sales(&self) -> Result<Vec<GenderMonthlySales>, AnalyticsError> {
        Ok(sum_by(self.records, |r| (r.month(), r.gender), |r| r.total)?
            .into_iter()
            .map(|((month, gender), total_sales)| GenderMonthlySales {
                month,
                gender,
                total_sales,
            })
            .collect())
    }

    /// The highest-revenue product line for each customer type.
    pub fn customer_type_preference(&self) -> Result<Vec<CustomerTypePreference>, AnalyticsError> {
        let revenue = sum_by(self.records, |r| (r.customer_type, r.product_line), |r| r.total)?;
        Ok(top_per_partition(&revenue)
            .into_iter()
            .map(|(customer_type, (product_line, revenue))| CustomerTypePreference {
                customer_type,
                product_line,
                revenue,
            })
            .collect())
    }

    /// Customers who came back, ordered by customer id.
    ///
    /// Under [`RepeatDefinition::PairsWithinWindow`] every ordered pair of
    /// distinct purchases at most `window_days` apart counts (same-day
    /// purchases included). The row carries the earliest purchase that starts
    /// such a pair, its nearest partner, and the number of pairs. Customers
    /// without a pair are left out, which includes everyone with a single
    /// purchase.
    ///
    /// Under [`RepeatDefinition::MultiplePurchases`] any second purchase
    /// qualifies; the row carries the first two purchase dates and the number
    /// of follow-up purchases.
    pub fn repeat_customers(
        &self,
        window_days: i64,
        definition: RepeatDefinition,
    ) -> Result<Vec<RepeatCustomer>, AnalyticsError> {
        if window_days < 0 {
            return Err(AnalyticsError::InvalidParameter(format!(
                "repeat window must not be negative, got {window_days} days"
            )));
        }

        let mut purchases: BTreeMap<&str, Vec<NaiveDate>> = BTreeMap::new();
        for record in self.records {
            purchases.entry(record.customer_id.as_str()).or_default().push(record.date);
        }

        let mut rows = Vec::new();
        for (customer_id, mut dates) in purchases {
            dates.sort();
            let row = match definition {
                RepeatDefinition::PairsWithinWindow => pairs_within_window(&dates, window_days),
                RepeatDefinition::MultiplePurchases if dates.len() >= 2 => {
                    Some((dates[0], dates[1], dates.len() - 1))
                }
                RepeatDefinition::MultiplePurchases => None,
            };
            if let Some((first_purchase, paired_purchase, frequency)) = row {
                rows.push(RepeatCustomer {
                    customer_id: customer_id.to_string(),
                    first_purchase,
                    paired_purchase,
                    frequency,
                });
            }
        }
        Ok(rows)
    }

    /// The `limit` biggest spenders, highest first; equal spend goes to the
    /// lower customer id.
    pub fn top_customers(&self, limit: usize) -> Result<Vec<CustomerSpend>, AnalyticsError> {
        let spend = sum_by(self.records, |r| r.customer_id.clone(), |r| r.total)?;
        let counts = count_by(self.records, |r| r.customer_id.clone());

        let mut rows: Vec<CustomerSpend> = spend
            .into_iter()
            .map(|(customer_id, total_spend)| {
                let transactions = counts.get(&customer_id).copied().unwrap_or_default();
                CustomerSpend {
                    customer_id,
                    total_spend,
                    transactions,
                }
            })
            .collect();

        rows.sort_by(|a, b| {
            b.total_spend
                .cmp(&a.total_spend)
                .then_with(|| a.customer_id.cmp(&b.customer_id))
        });
        rows.truncate(limit);
        Ok(rows)
    }

    /// Sales by day of the week, highest first; ties follow Monday to Sunday.
    pub fn weekday_trend(&self) -> Result<Vec<WeekdaySales>, AnalyticsError> {
        let day = |r: &SalesRecord| r.date.weekday().num_days_from_monday();
        let totals = sum_by(self.records, day, |r| r.total)?;
        let counts = count_by(self.records, day);
        let names: BTreeMap<u32, &str> = self.records.iter().map(|r| (day(r), weekday_name(r.date))).collect();

        let mut days: Vec<(u32, Decimal)> = totals.into_iter().collect();
        days.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

        Ok(days
            .into_iter()
            .map(|(index, total_sales)| WeekdaySales {
                weekday: names.get(&index).copied().unwrap_or_default().to_string(),
                total_sales,
                transactions: counts.get(&index).copied().unwrap_or_default(),
            })
            .collect())
    }
}

/// Counts ordered pairs `(i, j)`, `i < j`, with `dates[j] - dates[i] <= window_days`
/// over ascending `dates`, returning the first pair's dates and the count.
fn pairs_within_window(dates: &[NaiveDate], window_days: i64) -> Option<(NaiveDate, NaiveDate, usize)> {
    let mut first: Option<(NaiveDate, NaiveDate)> = None;
    let mut pairs = 0;
    let mut end = 0;

    for (i, start) in dates.iter().enumerate() {
        end = end.max(i + 1);
        while end < dates.len() && (dates[end] - *start).num_days() <= window_days {
            end += 1;
        }
        let partners = end - i - 1;
        if partners > 0 && first.is_none() {
            first = Some((*start, dates[i + 1]));
        }
        pairs += partners;
    }

    first.map(|(earlier, later)| (earlier, later, pairs))
}
