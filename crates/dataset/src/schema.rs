use crate::error::DatasetError;
use csv::StringRecord;

/// The columns the loader needs. Anything else in the file is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    InvoiceId,
    Branch,
    City,
    CustomerId,
    CustomerType,
    Gender,
    ProductLine,
    UnitPrice,
    Quantity,
    Tax,
    Total,
    Date,
    Payment,
    Cogs,
    GrossMarginPct,
    GrossIncome,
    Rating,
}

impl Column {
    pub const ALL: [Column; 17] = [
        Column::InvoiceId,
        Column::Branch,
        Column::City,
        Column::CustomerId,
        Column::CustomerType,
        Column::Gender,
        Column::ProductLine,
        Column::UnitPrice,
        Column::Quantity,
        Column::Tax,
        Column::Total,
        Column::Date,
        Column::Payment,
        Column::Cogs,
        Column::GrossMarginPct,
        Column::GrossIncome,
        Column::Rating,
    ];

    /// The canonical header name, used in error messages.
    pub fn name(&self) -> &'static str {
        self.aliases()[0]
    }

    /// Header spellings accepted for this column, canonical name first.
    fn aliases(&self) -> &'static [&'static str] {
        match self {
            Column::InvoiceId => &["Invoice ID"],
            Column::Branch => &["Branch"],
            Column::City => &["City"],
            Column::CustomerId => &["Customer ID"],
            Column::CustomerType => &["Customer type"],
            Column::Gender => &["Gender"],
            Column::ProductLine => &["Product line"],
            Column::UnitPrice => &["Unit price"],
            Column::Quantity => &["Quantity"],
            Column::Tax => &["Tax 5%", "Tax"],
            Column::Total => &["Total"],
            Column::Date => &["Date"],
            Column::Payment => &["Payment"],
            Column::Cogs => &["cogs"],
            Column::GrossMarginPct => &["gross margin percentage"],
            Column::GrossIncome => &["gross income"],
            Column::Rating => &["Rating"],
        }
    }

    fn matches(&self, header: &str) -> bool {
        let header = header.trim();
        self.aliases().iter().any(|a| a.eq_ignore_ascii_case(header))
    }
}

/// Position of every required column within a record.
#[derive(Debug, Clone)]
pub struct ColumnMap {
    positions: [usize; Column::ALL.len()],
}

impl ColumnMap {
    /// Resolves every required column against the header row. The first
    /// missing column is reported; no data row is read before this succeeds.
    pub fn from_headers(headers: &StringRecord) -> Result<Self, DatasetError> {
        let mut positions = [0usize; Column::ALL.len()];
        for (slot, column) in positions.iter_mut().zip(Column::ALL) {
            *slot = headers
                .iter()
                .position(|h| column.matches(h))
                .ok_or_else(|| DatasetError::Schema {
                    column: column.name().to_string(),
                })?;
        }
        Ok(Self { positions })
    }

    pub fn index(&self, column: Column) -> usize {
        self.positions[column as usize]
    }
}
