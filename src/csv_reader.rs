// CSV loading for the command-line host

use crate::data::{parse_iso, Column, ColumnType, Primitive, Row, SelectionId, Table};
use anyhow::{Context, Result};
use indexmap::IndexMap;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Read a table from CSV on stdin
pub fn read_csv_from_stdin() -> Result<Table> {
    read_csv(io::stdin().lock())
}

/// Read a table from a CSV file
pub fn read_csv_from_path(path: &Path) -> Result<Table> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    read_csv(file)
}

/// Read CSV with a header row. Each column's type is inferred from its non-empty cells;
/// empty cells become null.
pub fn read_csv<R: Read>(reader: R) -> Result<Table> {
    let mut reader = csv::Reader::from_reader(reader);
    let headers: Vec<String> = reader
        .headers()
        .context("Failed to read CSV headers")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut records = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("Failed to read CSV record {}", index + 1))?;
        records.push(record.iter().map(|c| c.trim().to_string()).collect::<Vec<_>>());
    }

    let columns: Vec<Column> = headers
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let cells = records.iter().filter_map(|r| r.get(i)).map(String::as_str);
            Column::new(name.clone(), i).with_kind(infer_type(cells))
        })
        .collect();

    let rows = records
        .iter()
        .enumerate()
        .map(|(row_index, record)| {
            let mut values = IndexMap::with_capacity(columns.len());
            for column in &columns {
                let cell = record.get(column.index).map(String::as_str).unwrap_or("");
                values.insert(column.display_name.clone(), convert_cell(cell, column.kind));
            }
            Row::new(values).with_selection(SelectionId(format!("row:{}", row_index)))
        })
        .collect();

    Table::new(columns, rows).context("Invalid CSV table")
}

fn infer_type<'a>(cells: impl Iterator<Item = &'a str>) -> ColumnType {
    let mut kind: Option<ColumnType> = None;
    for cell in cells.filter(|c| !c.is_empty()) {
        let cell_kind = if cell.parse::<f64>().is_ok() {
            ColumnType::Number
        } else if cell == "true" || cell == "false" {
            ColumnType::Boolean
        } else if parse_iso(cell).is_some() {
            ColumnType::DateTime
        } else {
            return ColumnType::Text;
        };
        match kind {
            None => kind = Some(cell_kind),
            Some(k) if k == cell_kind => {}
            Some(_) => return ColumnType::Text,
        }
    }
    kind.unwrap_or(ColumnType::Text)
}

fn convert_cell(cell: &str, kind: Option<ColumnType>) -> Primitive {
    if cell.is_empty() {
        return Primitive::Null;
    }
    match kind {
        Some(ColumnType::Number) => cell.parse().map(Primitive::Number).unwrap_or(Primitive::Null),
        Some(ColumnType::Boolean) => Primitive::Bool(cell == "true"),
        Some(ColumnType::DateTime) => parse_iso(cell).map(Primitive::Date).unwrap_or(Primitive::Null),
        _ => Primitive::Text(cell.to_string()),
    }
}
