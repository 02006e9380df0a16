use crate::error::DatasetError;
use crate::schema::{Column, ColumnMap};
use configuration::{DatasetSettings, ParseErrorPolicy};
use core_types::{DateNormalizer, SalesRecord};
use csv::{ByteRecord, ReaderBuilder, StringRecord, Trim};
use rust_decimal::Decimal;
use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

/// How rows are parsed and what happens to the ones that fail.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    pub normalizer: DateNormalizer,
    pub policy: ParseErrorPolicy,
    /// Largest accepted gap between `total` and `cogs + gross_income`.
    pub total_tolerance: Decimal,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            normalizer: DateNormalizer::default(),
            policy: ParseErrorPolicy::Skip,
            total_tolerance: Decimal::new(1, 2),
        }
    }
}

impl LoadOptions {
    pub fn from_settings(settings: &DatasetSettings) -> Result<Self, configuration::error::ConfigError> {
        Ok(Self {
            normalizer: settings.date_normalizer()?,
            policy: settings.on_parse_error,
            total_tolerance: settings.total_tolerance,
        })
    }
}

/// A row that was left out of the table, with the reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedRow {
    /// 1-based data row, header excluded.
    pub row: usize,
    /// Physical line in the file, when the reader knows it.
    pub line: Option<u64>,
    pub reason: String,
}

/// The validated fact table. Immutable once loaded.
#[derive(Debug, Clone, Default)]
pub struct SalesTable {
    records: Vec<SalesRecord>,
    rejected: Vec<RejectedRow>,
}

impl SalesTable {
    pub fn records(&self) -> &[SalesRecord] {
        &self.records
    }

    /// Rows dropped under [`ParseErrorPolicy::Skip`].
    pub fn rejected(&self) -> &[RejectedRow] {
        &self.rejected
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Opens `path` and loads it with [`read_sales`].
pub fn load_sales(path: &Path, options: &LoadOptions) -> Result<SalesTable, DatasetError> {
    let file = File::open(path).map_err(|source| DatasetError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::info!(path = %path.display(), policy = ?options.policy, "Loading sales table");
    read_sales(file, options)
}

/// Reads CSV sales data with a header row.
///
/// The header is checked before any data row is read, so a missing column
/// aborts regardless of policy. Row-level failures (text that is not UTF-8,
/// bad dates, numbers or categories, duplicate invoices, inconsistent totals)
/// either abort the load or are logged and recorded in
/// [`SalesTable::rejected`].
pub fn read_sales<R: Read>(reader: R, options: &LoadOptions) -> Result<SalesTable, DatasetError> {
    let mut csv_reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    let columns = ColumnMap::from_headers(&headers)?;

    let mut table = SalesTable::default();
    let mut seen_invoices = HashSet::new();

    for (i, result) in csv_reader.byte_records().enumerate() {
        let row = i + 1;
        let bytes = result?;
        let line = bytes.position().map(|p| p.line());

        let parsed = decode_row(row, &headers, bytes)
            .and_then(|record| parse_row(row, &record, &columns, options))
            .and_then(|sale| {
                if seen_invoices.insert(sale.invoice_id.clone()) {
                    Ok(sale)
                } else {
                    Err(DatasetError::Invariant {
                        row,
                        reason: format!("duplicate invoice id '{}'", sale.invoice_id),
                    })
                }
            });

        match parsed {
            Ok(sale) => table.records.push(sale),
            Err(e) if e.is_row_level() && options.policy == ParseErrorPolicy::Skip => {
                tracing::warn!(row, line = ?line, error = %e, "Skipping invalid row");
                table.rejected.push(RejectedRow {
                    row,
                    line,
                    reason: e.to_string(),
                });
            }
            Err(e) => return Err(e),
        }
    }

    tracing::info!(
        loaded = table.records.len(),
        rejected = table.rejected.len(),
        "Sales table loaded"
    );

    Ok(table)
}

/// Decodes a raw record as UTF-8, blaming the first field that is not.
fn decode_row(row: usize, headers: &StringRecord, bytes: ByteRecord) -> Result<StringRecord, DatasetError> {
    StringRecord::from_byte_record(bytes).map_err(|e| {
        let field = e.utf8_error().field();
        let bytes = e.into_byte_record();
        DatasetError::Parse {
            row,
            column: headers
                .get(field)
                .map(str::to_string)
                .unwrap_or_else(|| format!("field {}", field + 1)),
            value: bytes
                .get(field)
                .map(|raw| String::from_utf8_lossy(raw).into_owned())
                .unwrap_or_default(),
            reason: "not valid UTF-8".to_string(),
        }
    })
}

/// Reads the cells of one record for a given row number.
struct RowReader<'a> {
    row: usize,
    record: &'a StringRecord,
    columns: &'a ColumnMap,
}

impl RowReader<'_> {
    fn raw(&self, column: Column) -> Result<&str, DatasetError> {
        match self.record.get(self.columns.index(column)) {
            Some(value) if !value.is_empty() => Ok(value),
            Some(_) => Err(self.error(column, "", "empty value")),
            None => Err(self.error(column, "", "missing field")),
        }
    }

    fn text(&self, column: Column) -> Result<String, DatasetError> {
        self.raw(column).map(str::to_string)
    }

    /// Parses a cell with `FromStr`, keeping the parser's message as the reason.
    fn parse<T>(&self, column: Column) -> Result<T, DatasetError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        let value = self.raw(column)?;
        value
            .parse::<T>()
            .map_err(|e| self.error(column, value, &e.to_string()))
    }

    fn error(&self, column: Column, value: &str, reason: &str) -> DatasetError {
        DatasetError::Parse {
            row: self.row,
            column: column.name().to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

fn parse_row(
    row: usize,
    record: &StringRecord,
    columns: &ColumnMap,
    options: &LoadOptions,
) -> Result<SalesRecord, DatasetError> {
    let cells = RowReader {
        row,
        record,
        columns,
    };

    let date_text = cells.raw(Column::Date)?;
    let date = options
        .normalizer
        .parse(date_text)
        .map_err(|e| cells.error(Column::Date, date_text, &e.to_string()))?;

    let sale = SalesRecord {
        invoice_id: cells.text(Column::InvoiceId)?,
        branch: cells.text(Column::Branch)?,
        city: cells.text(Column::City)?,
        customer_id: cells.text(Column::CustomerId)?,
        customer_type: cells.parse(Column::CustomerType)?,
        gender: cells.parse(Column::Gender)?,
        product_line: cells.parse(Column::ProductLine)?,
        unit_price: cells.parse(Column::UnitPrice)?,
        quantity: cells.parse(Column::Quantity)?,
        tax: cells.parse(Column::Tax)?,
        total: cells.parse(Column::Total)?,
        date,
        payment: cells.parse(Column::Payment)?,
        cogs: cells.parse(Column::Cogs)?,
        gross_margin_pct: cells.parse(Column::GrossMarginPct)?,
        gross_income: cells.parse(Column::GrossIncome)?,
        rating: cells.parse(Column::Rating)?,
    };

    let drift = sale
        .cogs
        .checked_add(sale.gross_income)
        .and_then(|expected| sale.total.checked_sub(expected))
        .map(|d| d.abs())
        .ok_or_else(|| DatasetError::Invariant {
            row,
            reason: format!(
                "total {}, cogs {} and gross income {} are outside the decimal range",
                sale.total, sale.cogs, sale.gross_income
            ),
        })?;
    if drift > options.total_tolerance {
        return Err(DatasetError::Invariant {
            row,
            reason: format!(
                "total {} differs from cogs {} + gross income {} by {}",
                sale.total, sale.cogs, sale.gross_income, drift
            ),
        });
    }

    Ok(sale)
}
