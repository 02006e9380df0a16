use analytics::{Cell, ReportTable};
use anyhow::Result;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};
use configuration::OutputFormat;
use serde_json::{Map, Number, Value};
use std::str::FromStr;
use std::io::Write;

/// Writes every report in `tables` to `out` in the requested format.
pub fn write_reports(tables: &[ReportTable], format: OutputFormat, out: &mut dyn Write) -> Result<()> {
    match format {
        OutputFormat::Table => write_terminal(tables, out),
        OutputFormat::Csv => write_csv(tables, out),
        OutputFormat::Json => write_json(tables, out),
    }
}

fn write_terminal(tables: &[ReportTable], out: &mut dyn Write) -> Result<()> {
    for report in tables {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(&report.headers);
        for row in &report.rows {
            table.add_row(printed(row));
        }

        writeln!(out, "{}", report.title)?;
        writeln!(out, "{table}")?;
        if report.rows.is_empty() {
            writeln!(out, "(no rows)")?;
        }
        writeln!(out)?;
    }
    Ok(())
}

/// One CSV block per report. When several reports are written, each block is
/// introduced by a `# title` line and blocks are separated by a blank line.
fn write_csv(tables: &[ReportTable], out: &mut dyn Write) -> Result<()> {
    let titled = tables.len() > 1;
    for (i, report) in tables.iter().enumerate() {
        if titled {
            if i > 0 {
                writeln!(out)?;
            }
            writeln!(out, "# {}", report.title)?;
        }
        let mut writer = csv::Writer::from_writer(&mut *out);
        writer.write_record(&report.headers)?;
        for row in &report.rows {
            writer.write_record(printed(row))?;
        }
        writer.flush()?;
    }
    Ok(())
}

fn printed(row: &[Cell]) -> Vec<String> {
    row.iter().map(ToString::to_string).collect()
}

fn cell_to_json(cell: &Cell) -> Value {
    match cell {
        Cell::Text(text) => Value::String(text.clone()),
        Cell::Number(value) => Number::from_str(&value.to_string())
            .map(Value::Number)
            .unwrap_or_else(|_| Value::String(value.to_string())),
        Cell::Count(n) => Value::from(*n),
        Cell::Empty => Value::Null,
    }
}

fn table_to_json(report: &ReportTable) -> Value {
    let rows = report
        .rows
        .iter()
        .map(|row| {
            let object: Map<String, Value> = report
                .headers
                .iter()
                .zip(row)
                .map(|(header, cell)| (header.clone(), cell_to_json(cell)))
                .collect();
            Value::Object(object)
        })
        .collect();

    let mut object = Map::new();
    object.insert("title".to_string(), Value::String(report.title.clone()));
    object.insert("rows".to_string(), Value::Array(rows));
    Value::Object(object)
}

/// A single report is written as one object, several as an array.
fn write_json(tables: &[ReportTable], out: &mut dyn Write) -> Result<()> {
    let value = match tables {
        [single] => table_to_json(single),
        many => Value::Array(many.iter().map(table_to_json).collect()),
    };
    serde_json::to_writer_pretty(&mut *out, &value)?;
    writeln!(out)?;
    Ok(())
}
