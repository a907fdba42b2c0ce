//! Timestamp parsing and the date range filter.

use serde::Serialize;
use time::{
    Date, OffsetDateTime, PrimitiveDateTime, UtcOffset,
    format_description::{BorrowedFormatItem, well_known::Rfc3339},
    macros::format_description,
};

use crate::dataset::{ColumnType, Dataset, Value};

time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

const LOCAL_FORMATS: &[&[BorrowedFormatItem]] = &[
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]"),
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second].[subsecond]"),
    format_description!("[year]-[month]-[day] [hour]:[minute]"),
];

const OFFSET_FORMATS: &[&[BorrowedFormatItem]] = &[format_description!(
    "[year]-[month]-[day] [hour]:[minute]:[second][offset_hour sign:mandatory]:[offset_minute]"
)];

const DATE_FORMATS: &[&[BorrowedFormatItem]] = &[
    format_description!("[year]-[month]-[day]"),
    format_description!("[year]/[month]/[day]"),
];

/// The earliest and latest dates in the temporal column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateBounds {
    /// The date of the earliest timestamp.
    #[serde(with = "iso_date")]
    pub min: Date,
    /// The date of the latest timestamp.
    #[serde(with = "iso_date")]
    pub max: Date,
}

/// Parses `text` as a date-time.
///
/// Timestamps with a UTC offset are converted to UTC. Plain dates are taken
/// as midnight. Returns `None` if no known format matches.
pub fn parse_timestamp(text: &str) -> Option<PrimitiveDateTime> {
    let text = text.trim();

    if let Ok(timestamp) = OffsetDateTime::parse(text, &Rfc3339) {
        return Some(to_utc(timestamp));
    }

    for format in OFFSET_FORMATS {
        if let Ok(timestamp) = OffsetDateTime::parse(text, format) {
            return Some(to_utc(timestamp));
        }
    }

    for format in LOCAL_FORMATS {
        if let Ok(timestamp) = PrimitiveDateTime::parse(text, format) {
            return Some(timestamp);
        }
    }

    DATE_FORMATS
        .iter()
        .find_map(|format| Date::parse(text, format).ok())
        .map(Date::midnight)
}

fn to_utc(timestamp: OffsetDateTime) -> PrimitiveDateTime {
    let timestamp = timestamp.to_offset(UtcOffset::UTC);
    PrimitiveDateTime::new(timestamp.date(), timestamp.time())
}

/// Converts the column called `column` to timestamps and drops the rows
/// whose value could not be parsed.
///
/// Returns the column's index, or `None` if the dataset has no such column.
pub(super) fn normalize_temporal(dataset: &mut Dataset, column: &str) -> Option<usize> {
    let index = dataset.column_index(column)?;

    let values: Vec<Value> = dataset
        .values(index)
        .map(|value| match value {
            Value::Timestamp(timestamp) => Value::Timestamp(*timestamp),
            Value::Text(text) => parse_timestamp(text).map_or(Value::Missing, Value::Timestamp),
            _ => Value::Missing,
        })
        .collect();

    let unparsed = values.iter().filter(|value| value.is_missing()).count();
    if unparsed > 0 {
        tracing::debug!("Dropping {unparsed} rows with missing or invalid '{column}' values");
    }

    dataset.replace_column(index, ColumnType::Temporal, values);
    dataset.retain(|row| !row[index].is_missing());

    Some(index)
}

/// Keeps rows whose timestamp lies between midnight of the first date and
/// midnight of the second date, inclusive.
///
/// Anything other than exactly two dates leaves the dataset unchanged.
pub(super) fn filter_date_range(dataset: &mut Dataset, index: usize, date_range: &[Date]) {
    let [start, end] = date_range else {
        return;
    };

    let start = start.midnight();
    let end = end.midnight();

    dataset.retain(|row| {
        row[index]
            .as_timestamp()
            .is_some_and(|timestamp| start <= timestamp && timestamp <= end)
    });
}

/// The first and last date in the temporal column at `index`, `None` if there are no rows.
pub(super) fn date_bounds(dataset: &Dataset, index: usize) -> Option<DateBounds> {
    let timestamps = dataset.values(index).filter_map(Value::as_timestamp);

    timestamps.fold(None, |bounds, timestamp| {
        let date = timestamp.date();
        Some(match bounds {
            None => DateBounds {
                min: date,
                max: date,
            },
            Some(DateBounds { min, max }) => DateBounds {
                min: min.min(date),
                max: max.max(date),
            },
        })
    })
}
