use chrono::{DateTime, SecondsFormat, Utc};
use indexmap::IndexMap;
use serde_json::{json, Value};
use std::collections::HashSet;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DataError {
    #[error("Duplicate column name '{0}'")]
    DuplicateColumn(String),

    #[error("Row {row} has no value for column '{column}'")]
    MissingValue { row: usize, column: String },

    #[error("Row {row} has {found} values but the table declares {expected} columns")]
    RowWidth { row: usize, found: usize, expected: usize },

    #[error("Input data must be a JSON array of objects")]
    NotAnArray,

    #[error("Unsupported value type for field '{0}'")]
    UnsupportedValue(String),
}

/// A single cell value delivered by the host.
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    Date(DateTime<Utc>),
}

impl Primitive {
    pub fn is_null(&self) -> bool {
        matches!(self, Primitive::Null)
    }

    /// JSON form handed to the renderer. Dates serialize as ISO-8601 strings.
    pub fn to_json(&self) -> Value {
        match self {
            Primitive::Null => Value::Null,
            Primitive::Bool(b) => Value::Bool(*b),
            Primitive::Number(n) => number_to_json(*n),
            Primitive::Text(s) => Value::String(s.clone()),
            Primitive::Date(d) => Value::String(format_iso(d)),
        }
    }

    /// Converts a raw JSON cell, parsing strings as dates when the column is temporal.
    pub fn from_json(value: &Value, kind: Option<ColumnType>) -> Result<Self, DataError> {
        Ok(match value {
            Value::Null => Primitive::Null,
            Value::Bool(b) => Primitive::Bool(*b),
            Value::Number(n) => n.as_f64().map(Primitive::Number).unwrap_or(Primitive::Null),
            Value::String(s) if kind == Some(ColumnType::DateTime) => {
                parse_iso(s).map(Primitive::Date).unwrap_or(Primitive::Null)
            }
            Value::String(s) => Primitive::Text(s.clone()),
            other => return Err(DataError::UnsupportedValue(other.to_string())),
        })
    }
}

/// Integral numbers serialize without a fraction; non-finite numbers become null.
pub fn number_to_json(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 {
        Value::from(n as i64)
    } else {
        serde_json::Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null)
    }
}

pub fn format_iso(date: &DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parses the ISO timestamps hosts emit (`2024-01-31T00:00:00.000Z` and friends).
pub fn parse_iso(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(d) = DateTime::parse_from_rfc3339(text) {
        return Some(d.with_timezone(&Utc));
    }
    chrono::NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .or_else(|| {
            chrono::NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .map(|naive| naive.and_utc())
}

/// Declared semantic type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Text,
    Number,
    Boolean,
    DateTime,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub display_name: String,
    pub index: usize,
    pub kind: Option<ColumnType>,
}

impl Column {
    pub fn new(display_name: impl Into<String>, index: usize) -> Self {
        Self { display_name: display_name.into(), index, kind: None }
    }

    pub fn with_kind(mut self, kind: ColumnType) -> Self {
        self.kind = Some(kind);
        self
    }
}

/// Opaque per-row identifier supplied by the host for selection round-trips.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SelectionId(pub String);

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    values: IndexMap<String, Primitive>,
    pub selection: Option<SelectionId>,
}

impl Row {
    pub fn new(values: IndexMap<String, Primitive>) -> Self {
        Self { values, selection: None }
    }

    pub fn with_selection(mut self, selection: SelectionId) -> Self {
        self.selection = Some(selection);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Primitive> {
        self.values.get(name)
    }

    pub fn values(&self) -> impl Iterator<Item = (&String, &Primitive)> {
        self.values.iter()
    }

    /// Cell values by column name, plus `selection` when the host supplied one.
    pub fn to_json(&self) -> Value {
        let mut map: serde_json::Map<String, Value> =
            self.values.iter().map(|(k, v)| (k.clone(), v.to_json())).collect();
        if let Some(SelectionId(selection)) = &self.selection {
            map.insert("selection".to_string(), Value::String(selection.clone()));
        }
        Value::Object(map)
    }
}

/// Columnar view of the host's data. Rebuilt wholesale on every refresh.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<Column>,
    rows: Vec<Row>,
}

impl Table {
    /// Builds a table, checking that column names are unique and every row covers every column.
    pub fn new(columns: Vec<Column>, rows: Vec<Row>) -> Result<Self, DataError> {
        let mut seen = HashSet::new();
        for column in &columns {
            if !seen.insert(column.display_name.as_str()) {
                return Err(DataError::DuplicateColumn(column.display_name.clone()));
            }
        }
        for (index, row) in rows.iter().enumerate() {
            if let Some(missing) = columns.iter().find(|c| row.get(&c.display_name).is_none()) {
                return Err(DataError::MissingValue {
                    row: index,
                    column: missing.display_name.clone(),
                });
            }
        }
        Ok(Self { columns, rows })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a table from typed column headers and positional row arrays, the way
    /// hosts deliver a table view. Temporal columns are parsed from ISO strings.
    pub fn from_raw(columns: Vec<Column>, raw_rows: &[Vec<Value>]) -> Result<Self, DataError> {
        let mut rows = Vec::with_capacity(raw_rows.len());
        for (row_index, raw) in raw_rows.iter().enumerate() {
            if raw.len() != columns.len() {
                return Err(DataError::RowWidth {
                    row: row_index,
                    found: raw.len(),
                    expected: columns.len(),
                });
            }
            let mut values = IndexMap::with_capacity(columns.len());
            for (column, cell) in columns.iter().zip(raw) {
                values.insert(column.display_name.clone(), Primitive::from_json(cell, column.kind)?);
            }
            rows.push(Row::new(values).with_selection(SelectionId(format!("row:{}", row_index))));
        }
        Self::new(columns, rows)
    }

    /// Create a table from a JSON Array of Objects
    pub fn from_json(value: &Value) -> Result<Self, DataError> {
        let array = value.as_array().ok_or(DataError::NotAnArray)?;

        let mut columns: Vec<Column> = Vec::new();
        for item in array {
            let obj = item.as_object().ok_or(DataError::NotAnArray)?;
            for key in obj.keys() {
                if !columns.iter().any(|c| &c.display_name == key) {
                    let index = columns.len();
                    columns.push(Column::new(key.clone(), index));
                }
            }
        }

        let mut rows = Vec::with_capacity(array.len());
        for (row_index, item) in array.iter().enumerate() {
            let obj = item.as_object().ok_or(DataError::NotAnArray)?;
            let mut values = IndexMap::with_capacity(columns.len());
            for column in &columns {
                let cell = obj.get(&column.display_name).unwrap_or(&Value::Null);
                values.insert(column.display_name.clone(), Primitive::from_json(cell, None)?);
            }
            rows.push(Row::new(values).with_selection(SelectionId(format!("row:{}", row_index))));
        }

        Self::new(columns, rows)
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn find_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.display_name == name)
    }

    /// Values of `name` across all rows, in row order. Unknown names yield nulls.
    pub fn column(&self, name: &str) -> Vec<Primitive> {
        self.rows
            .iter()
            .map(|row| row.get(name).cloned().unwrap_or(Primitive::Null))
            .collect()
    }

    /// `{ rows: [...], columns: [{ displayName, index }] }` as templates see it.
    pub fn to_json(&self) -> Value {
        let columns: Vec<Value> = self
            .columns
            .iter()
            .map(|c| json!({ "displayName": c.display_name, "index": c.index }))
            .collect();
        json!({
            "rows": self.rows.iter().map(Row::to_json).collect::<Vec<_>>(),
            "columns": columns,
        })
    }

    /// Positional projection used when rewriting specifications.
    pub fn dataset(&self) -> Dataset {
        Dataset {
            dimensions: self.columns.iter().map(|c| c.display_name.clone()).collect(),
            source: self
                .rows
                .iter()
                .map(|row| {
                    self.columns
                        .iter()
                        .map(|c| row.get(&c.display_name).cloned().unwrap_or(Primitive::Null))
                        .collect()
                })
                .collect(),
        }
    }
}

/// Dimension names plus positional rows.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dataset {
    pub dimensions: Vec<String>,
    pub source: Vec<Vec<Primitive>>,
}

impl Dataset {
    pub fn to_json(&self) -> Value {
        let source: Vec<Value> = self
            .source
            .iter()
            .map(|row| Value::Array(row.iter().map(Primitive::to_json).collect()))
            .collect();
        json!({ "dimensions": self.dimensions, "source": source })
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.dimensions.iter().position(|d| d == name)
    }

    /// Values at dimension `name` across the source rows; nulls when the name is unknown.
    pub fn vector(&self, name: &str) -> Vec<Value> {
        let index = self.position(name);
        self.source
            .iter()
            .map(|row| {
                index
                    .and_then(|i| row.get(i))
                    .map(Primitive::to_json)
                    .unwrap_or(Value::Null)
            })
            .collect()
    }
}
