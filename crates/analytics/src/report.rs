use chrono::NaiveDate;
use core_types::{CustomerType, Gender, PaymentMethod, ProductLine, YearMonth};
use rust_decimal::Decimal;
use std::fmt;

/// A report row that can be laid out as a table.
pub trait Tabular {
    fn headers() -> &'static [&'static str];
    fn cells(&self) -> Vec<Cell>;
}

/// One value in a report table, already rounded for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cell {
    Text(String),
    Number(Decimal),
    Count(u64),
    /// A value that does not exist, such as the growth of a first month.
    Empty,
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Text(text) => f.write_str(text),
            Cell::Number(value) => write!(f, "{value}"),
            Cell::Count(n) => write!(f, "{n}"),
            Cell::Empty => Ok(()),
        }
    }
}

/// A rendered-ready report: a title, named columns, and typed cells.
///
/// Produced from typed rows so that every output format (terminal table,
/// CSV, JSON) prints exactly the same values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportTable {
    pub title: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl ReportTable {
    pub fn new<T: Tabular>(title: impl Into<String>, rows: &[T]) -> Self {
        Self {
            title: title.into(),
            headers: T::headers().iter().map(|h| h.to_string()).collect(),
            rows: rows.iter().map(Tabular::cells).collect(),
        }
    }
}

fn text(value: impl fmt::Display) -> Cell {
    Cell::Text(value.to_string())
}

fn money(value: Decimal) -> Cell {
    Cell::Number(value.round_dp(2))
}

fn optional(value: Option<Decimal>, dp: u32) -> Cell {
    value.map_or(Cell::Empty, |v| Cell::Number(v.round_dp(dp)))
}

fn count(n: usize) -> Cell {
    Cell::Count(n as u64)
}

/// Sales for one branch in one month, with the change from its previous month.
#[derive(Debug, Clone, PartialEq)]
pub struct BranchMonthGrowth {
    pub branch: String,
    pub month: YearMonth,
    pub total_sales: Decimal,
    /// `None` for a branch's first month, or when the previous month sold nothing.
    pub growth_pct: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProductLineProfit {
    pub branch: String,
    pub product_line: ProductLine,
    pub profit: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SpendTier {
    High,
    Medium,
    Low,
}

impl fmt::Display for SpendTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SpendTier::High => "High",
            SpendTier::Medium => "Medium",
            SpendTier::Low => "Low",
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CustomerSegment {
    pub customer_id: String,
    pub total_spend: Decimal,
    pub percentile: Decimal,
    pub tier: SpendTier,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnomalyFlag {
    HighAnomaly,
    LowAnomaly,
    Normal,
}

impl fmt::Display for AnomalyFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AnomalyFlag::HighAnomaly => "High Anomaly",
            AnomalyFlag::LowAnomaly => "Low Anomaly",
            AnomalyFlag::Normal => "Normal",
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransactionAnomaly {
    pub invoice_id: String,
    pub product_line: ProductLine,
    pub total: Decimal,
    pub line_mean: Decimal,
    pub line_std_dev: Decimal,
    pub flag: AnomalyFlag,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PaymentPopularity {
    pub city: String,
    pub payment: PaymentMethod,
    pub transactions: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenderMonthlySales {
    pub month: YearMonth,
    pub gender: Gender,
    pub total_sales: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CustomerTypePreference {
    pub customer_type: CustomerType,
    pub product_line: ProductLine,
    pub revenue: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RepeatCustomer {
    pub customer_id: String,
    pub first_purchase: NaiveDate,
    pub paired_purchase: NaiveDate,
    /// Qualifying purchase pairs, or follow-up purchases, depending on the
    /// repeat definition in use.
    pub frequency: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CustomerSpend {
    pub customer_id: String,
    pub total_spend: Decimal,
    pub transactions: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeekdaySales {
    pub weekday: String,
    pub total_sales: Decimal,
    pub transactions: usize,
}

/// Headline figures for the whole table.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetSummary {
    pub transactions: usize,
    pub customers: usize,
    pub branches: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub total_sales: Decimal,
    pub total_cogs: Decimal,
    pub total_gross_income: Decimal,
}

impl Tabular for BranchMonthGrowth {
    fn headers() -> &'static [&'static str] {
        &["Branch", "Month", "Total Sales", "Growth %"]
    }

    fn cells(&self) -> Vec<Cell> {
        vec![
            Cell::Text(self.branch.clone()),
            text(self.month),
            money(self.total_sales),
            optional(self.growth_pct, 2),
        ]
    }
}

impl Tabular for ProductLineProfit {
    fn headers() -> &'static [&'static str] {
        &["Branch", "Product Line", "Profit"]
    }

    fn cells(&self) -> Vec<Cell> {
        vec![
            Cell::Text(self.branch.clone()),
            text(self.product_line),
            money(self.profit),
        ]
    }
}

impl Tabular for CustomerSegment {
    fn headers() -> &'static [&'static str] {
        &["Customer", "Total Spend", "Percentile", "Tier"]
    }

    fn cells(&self) -> Vec<Cell> {
        vec![
            Cell::Text(self.customer_id.clone()),
            money(self.total_spend),
            Cell::Number(self.percentile.round_dp(4)),
            text(self.tier),
        ]
    }
}

impl Tabular for TransactionAnomaly {
    fn headers() -> &'static [&'static str] {
        &["Invoice", "Product Line", "Total", "Line Mean", "Line Std Dev", "Flag"]
    }

    fn cells(&self) -> Vec<Cell> {
        vec![
            Cell::Text(self.invoice_id.clone()),
            text(self.product_line),
            money(self.total),
            money(self.line_mean),
            money(self.line_std_dev),
            text(self.flag),
        ]
    }
}

impl Tabular for PaymentPopularity {
    fn headers() -> &'static [&'static str] {
        &["City", "Payment Method", "Transactions"]
    }

    fn cells(&self) -> Vec<Cell> {
        vec![
            Cell::Text(self.city.clone()),
            text(self.payment),
            count(self.transactions),
        ]
    }
}

impl Tabular for GenderMonthlySales {
    fn headers() -> &'static [&'static str] {
        &["Month", "Gender", "Total Sales"]
    }

    fn cells(&self) -> Vec<Cell> {
        vec![
            text(self.month),
            text(self.gender),
            money(self.total_sales),
        ]
    }
}

impl Tabular for CustomerTypePreference {
    fn headers() -> &'static [&'static str] {
        &["Customer Type", "Product Line", "Revenue"]
    }

    fn cells(&self) -> Vec<Cell> {
        vec![
            text(self.customer_type),
            text(self.product_line),
            money(self.revenue),
        ]
    }
}

impl Tabular for RepeatCustomer {
    fn headers() -> &'static [&'static str] {
        &["Customer", "First Purchase", "Paired Purchase", "Frequency"]
    }

    fn cells(&self) -> Vec<Cell> {
        vec![
            Cell::Text(self.customer_id.clone()),
            text(self.first_purchase),
            text(self.paired_purchase),
            count(self.frequency),
        ]
    }
}

impl Tabular for CustomerSpend {
    fn headers() -> &'static [&'static str] {
        &["Customer", "Total Spend", "Transactions"]
    }

    fn cells(&self) -> Vec<Cell> {
        vec![
            Cell::Text(self.customer_id.clone()),
            money(self.total_spend),
            count(self.transactions),
        ]
    }
}

impl Tabular for WeekdaySales {
    fn headers() -> &'static [&'static str] {
        &["Weekday", "Total Sales", "Transactions"]
    }

    fn cells(&self) -> Vec<Cell> {
        vec![
            Cell::Text(self.weekday.clone()),
            money(self.total_sales),
            count(self.transactions),
        ]
    }
}

impl Tabular for DatasetSummary {
    fn headers() -> &'static [&'static str] {
        &[
            "Transactions",
            "Customers",
            "Branches",
            "First Date",
            "Last Date",
            "Total Sales",
            "Total COGS",
            "Gross Income",
        ]
    }

    fn cells(&self) -> Vec<Cell> {
        let date = |d: Option<NaiveDate>| d.map_or(Cell::Empty, text);
        vec![
            count(self.transactions),
            count(self.customers),
            count(self.branches),
            date(self.first_date),
            date(self.last_date),
            money(self.total_sales),
            money(self.total_cogs),
            money(self.total_gross_income),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn missing_growth_renders_as_empty_cell() {
        let rows = [
            BranchMonthGrowth {
                branch: "A".to_string(),
                month: YearMonth { year: 2019, month: 1 },
                total_sales: dec!(100.456),
                growth_pct: None,
            },
            BranchMonthGrowth {
                branch: "A".to_string(),
                month: YearMonth { year: 2019, month: 2 },
                total_sales: dec!(150),
                growth_pct: Some(dec!(49.3243)),
            },
        ];
        let table = ReportTable::new("Branch growth", &rows);
        assert_eq!(table.headers, vec!["Branch", "Month", "Total Sales", "Growth %"]);
        assert_eq!(table.rows[0][2], Cell::Number(dec!(100.46)));
        assert_eq!(table.rows[0][3], Cell::Empty);

        let printed: Vec<Vec<String>> = table
            .rows
            .iter()
            .map(|row| row.iter().map(ToString::to_string).collect())
            .collect();
        assert_eq!(printed[0], vec!["A", "2019-01", "100.46", ""]);
        assert_eq!(printed[1], vec!["A", "2019-02", "150", "49.32"]);
    }

    #[test]
    fn counts_and_dates_are_typed() {
        let summary = DatasetSummary {
            transactions: 3,
            customers: 2,
            branches: 1,
            first_date: NaiveDate::from_ymd_opt(2019, 1, 5),
            last_date: None,
            total_sales: dec!(10.005),
            total_cogs: dec!(9),
            total_gross_income: dec!(1.005),
        };
        let cells = summary.cells();
        assert_eq!(cells[0], Cell::Count(3));
        assert_eq!(cells[3], Cell::Text("2019-01-05".to_string()));
        assert_eq!(cells[4], Cell::Empty);
        assert_eq!(cells[5], Cell::Number(dec!(10.00)));
    }

    #[test]
    fn flags_render_with_spaces() {
        assert_eq!(AnomalyFlag::HighAnomaly.to_string(), "High Anomaly");
        assert_eq!(SpendTier::Medium.to_string(), "Medium");
    }
}
