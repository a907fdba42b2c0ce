//! Cell values and column types.

use std::fmt;

use serde::Serialize;
use time::{PrimitiveDateTime, format_description::BorrowedFormatItem, macros::format_description};

/// The format used when writing timestamps to text, e.g. `2023-01-02 13:45:00`.
pub(crate) const TIMESTAMP_FORMAT: &[BorrowedFormatItem] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

/// The type of a column, inferred once when the dataset is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    /// `true`/`false` values.
    Boolean,
    /// Whole numbers without any missing values.
    Integer,
    /// Floating point numbers, or whole numbers with missing values.
    Float,
    /// Free text. These are the categorical columns.
    Text,
    /// Date-times, only produced by temporal normalization.
    Temporal,
}

impl ColumnType {
    /// Whether values of this type can be averaged and correlated.
    pub fn is_numeric(self) -> bool {
        matches!(self, ColumnType::Integer | ColumnType::Float)
    }

    /// Whether the column holds categories that can be filtered by value.
    pub fn is_categorical(self) -> bool {
        self == ColumnType::Text
    }
}

/// A named, typed column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    /// The column name from the CSV header.
    pub name: String,
    /// The inferred type of the column.
    pub dtype: ColumnType,
}

impl Column {
    /// Create a column named `name` of type `dtype`.
    pub fn new(name: &str, dtype: ColumnType) -> Self {
        Self {
            name: name.to_owned(),
            dtype,
        }
    }
}

/// A single cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// An empty cell, or a value that could not be parsed.
    Missing,
    /// A boolean cell.
    Bool(bool),
    /// An integer cell.
    Integer(i64),
    /// A floating point cell.
    Float(f64),
    /// A text cell.
    Text(String),
    /// A normalized date-time cell.
    Timestamp(PrimitiveDateTime),
}

impl Value {
    /// The value as a float if it is numeric.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(number) => Some(*number as f64),
            Value::Float(number) => Some(*number),
            _ => None,
        }
    }

    /// The value as a timestamp if it is temporal.
    pub fn as_timestamp(&self) -> Option<PrimitiveDateTime> {
        match self {
            Value::Timestamp(timestamp) => Some(*timestamp),
            _ => None,
        }
    }

    /// Whether the cell is empty.
    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    /// The key used to match this value against a categorical selection.
    ///
    /// Missing values map to the empty string so they can still be selected.
    pub fn category_key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Value {
    /// Formats the value the way it is written to CSV.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Missing => Ok(()),
            Value::Bool(true) => write!(f, "True"),
            Value::Bool(false) => write!(f, "False"),
            Value::Integer(number) => write!(f, "{number}"),
            // Debug formatting keeps the decimal point on whole floats, e.g. "1000.0".
            Value::Float(number) => write!(f, "{number:?}"),
            Value::Text(text) => write!(f, "{text}"),
            Value::Timestamp(timestamp) => {
                let text = timestamp.format(TIMESTAMP_FORMAT).map_err(|_| fmt::Error)?;
                write!(f, "{text}")
            }
        }
    }
}
