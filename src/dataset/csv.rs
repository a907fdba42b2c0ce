//! Reading a [Dataset] from CSV text and writing it back out.
//!
//! Column types are inferred from the text: integer, float, boolean, and
//! text as the fallback. Empty cells and the usual placeholders for missing
//! data, such as `NA`, `null` and `NaN`, become [Value::Missing].
//! Repeated header names get a numeric suffix, so `type,type` is read as
//! `type,type.1`.

use std::{
    collections::{HashMap, HashSet},
    io::Read,
};

use crate::{
    Error,
    dataset::{Column, ColumnType, Dataset, Value},
};

/// Parses CSV data with a header row into a [Dataset].
///
/// # Errors
/// Returns [Error::DataUnavailable] if the data is not valid UTF-8, has no
/// header row, or has rows with a different number of fields to the header.
pub fn parse_csv(reader: impl Read) -> Result<Dataset, Error> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(reader);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|error| Error::DataUnavailable(format!("could not read CSV header: {error}")))?
        .iter()
        .map(|header| header.to_owned())
        .collect();

    if headers.is_empty() || headers.iter().all(|header| header.is_empty()) {
        return Err(Error::DataUnavailable("CSV has no header row".to_owned()));
    }

    let headers = deduplicate_headers(headers);

    let mut cells: Vec<Vec<String>> = vec![Vec::new(); headers.len()];

    for (row_number, record) in reader.records().enumerate() {
        let record = record.map_err(|error| {
            Error::DataUnavailable(format!("could not read CSV row {}: {error}", row_number + 1))
        })?;

        for (column, field) in cells.iter_mut().zip(record.iter()) {
            column.push(field.to_owned());
        }
    }

    let row_count = cells.first().map_or(0, Vec::len);
    let mut rows: Vec<Vec<Value>> = (0..row_count)
        .map(|_| Vec::with_capacity(headers.len()))
        .collect();
    let mut columns = Vec::with_capacity(headers.len());

    for (name, column_cells) in headers.iter().zip(cells) {
        let dtype = infer_column_type(&column_cells);

        for (row, cell) in rows.iter_mut().zip(column_cells) {
            row.push(parse_value(cell, dtype));
        }

        columns.push(Column::new(name, dtype));
    }

    Ok(Dataset::new(columns, rows))
}

/// Writes `dataset` as UTF-8 CSV with a header row.
///
/// # Errors
/// Returns [Error::CsvExportError] if a record cannot be written.
pub fn write_csv(dataset: &Dataset) -> Result<Vec<u8>, Error> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer
        .write_record(dataset.columns().iter().map(|column| column.name.as_str()))
        .map_err(|error| Error::CsvExportError(error.to_string()))?;

    for row in dataset.rows() {
        writer
            .write_record(row.iter().map(Value::to_string))
            .map_err(|error| Error::CsvExportError(error.to_string()))?;
    }

    writer
        .into_inner()
        .map_err(|error| Error::CsvExportError(error.to_string()))
}

/// Cell contents that mean "no value", matched exactly.
const MISSING_TOKENS: [&str; 19] = [
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

fn is_missing(cell: &str) -> bool {
    MISSING_TOKENS.contains(&cell)
}

/// Suffixes repeated names with `.1`, `.2` and so on, skipping names already taken.
fn deduplicate_headers(headers: Vec<String>) -> Vec<String> {
    let mut taken: HashSet<String> = headers.iter().cloned().collect();
    let mut seen: HashSet<String> = HashSet::with_capacity(headers.len());
    let mut suffixes: HashMap<String, usize> = HashMap::new();

    headers
        .into_iter()
        .map(|header| {
            if seen.insert(header.clone()) {
                return header;
            }

            let suffix = suffixes.entry(header.clone()).or_insert(0);
            let renamed = loop {
                *suffix += 1;
                let candidate = format!("{header}.{suffix}");
                if !taken.contains(&candidate) {
                    break candidate;
                }
            };

            taken.insert(renamed.clone());
            seen.insert(renamed.clone());
            renamed
        })
        .collect()
}

fn infer_column_type(cells: &[String]) -> ColumnType {
    let has_missing = cells.iter().any(|cell| is_missing(cell));
    let mut present = cells.iter().filter(|cell| !is_missing(cell)).peekable();

    // A column of only empty cells has nothing to go on and is treated as numbers.
    if present.peek().is_none() {
        return ColumnType::Float;
    }

    let present: Vec<&String> = present.collect();

    if present.iter().all(|cell| cell.parse::<i64>().is_ok()) {
        if has_missing {
            ColumnType::Float
        } else {
            ColumnType::Integer
        }
    } else if present.iter().all(|cell| cell.parse::<f64>().is_ok()) {
        ColumnType::Float
    } else if !has_missing && present.iter().all(|cell| parse_bool(cell).is_some()) {
        ColumnType::Boolean
    } else {
        ColumnType::Text
    }
}

fn parse_value(cell: String, dtype: ColumnType) -> Value {
    if is_missing(&cell) {
        return Value::Missing;
    }

    match dtype {
        ColumnType::Integer => cell.parse().map_or(Value::Missing, Value::Integer),
        ColumnType::Float => match cell.parse::<f64>() {
            Ok(number) if !number.is_nan() => Value::Float(number),
            _ => Value::Missing,
        },
        ColumnType::Boolean => parse_bool(&cell).map_or(Value::Missing, Value::Bool),
        ColumnType::Text | ColumnType::Temporal => Value::Text(cell),
    }
}

fn parse_bool(cell: &str) -> Option<bool> {
    if cell.eq_ignore_ascii_case("true") {
        Some(true)
    } else if cell.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}
