use crate::dates::YearMonth;
use crate::enums::{CustomerType, Gender, PaymentMethod, ProductLine};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One row of the sales fact table.
///
/// Records only exist once they have passed validation in the loader, so the
/// categorical fields are already typed and `total == cogs + gross_income`
/// within the configured tolerance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesRecord {
    pub invoice_id: String,
    pub branch: String,
    pub city: String,
    pub customer_id: String,
    pub customer_type: CustomerType,
    pub gender: Gender,
    pub product_line: ProductLine,
    pub unit_price: Decimal,
    pub quantity: u32,
    pub tax: Decimal,
    pub total: Decimal,
    pub date: NaiveDate,
    pub payment: PaymentMethod,
    pub cogs: Decimal,
    pub gross_margin_pct: Decimal,
    pub gross_income: Decimal,
    pub rating: Decimal,
}

impl SalesRecord {
    pub fn month(&self) -> YearMonth {
        YearMonth::of(self.date)
    }
}
