//! The user's filter and chart choices for one pass of the pipeline.
//!
//! Selections arrive as the query string of the dashboard form. Multi-selects
//! that the user emptied send no values at all, so the form also sends a
//! marker field for each multi-select to tell "nothing selected" apart from
//! "never touched".

use std::collections::BTreeMap;

use time::{Date, format_description::BorrowedFormatItem, macros::format_description};

use crate::Error;

/// Query key for the first day of the date range.
pub const DATE_START: &str = "date_start";
/// Query key for the last day of the date range.
pub const DATE_END: &str = "date_end";
/// Query key for the "exclude negative amounts" checkbox.
pub const EXCLUDE_NEGATIVE: &str = "exclude_negative";
/// Prefix of the query key for the selected values of a categorical column.
pub const CATEGORY_PREFIX: &str = "category:";
/// Query key naming a categorical column whose selection was submitted.
pub const CATEGORY_PRESENT: &str = "category_present";
/// Prefix of the key holding the JSON list of values a category widget offered, e.g. `category_offered:ChannelId`.
pub const CATEGORY_OFFERED_PREFIX: &str = "category_offered:";
/// Query key for the X (categorical) chart column.
pub const X: &str = "x";
/// Query key for the Y (numeric) chart column.
pub const Y: &str = "y";
/// Query key for the optional color (categorical) chart column.
pub const COLOR: &str = "color";
/// Query key for the column the summary table is grouped by.
pub const GROUP_BY: &str = "group_by";
/// Query key for the numeric columns aggregated in the summary table.
pub const AGG: &str = "agg";
/// Query key marking that the aggregation columns were submitted.
pub const AGG_PRESENT: &str = "agg_present";

pub(crate) const DATE_FORMAT: &[BorrowedFormatItem] = format_description!("[year]-[month]-[day]");

/// Everything the user can choose on the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSelection {
    /// Zero, one or two dates. Only a complete range of two dates filters rows.
    pub date_range: Vec<Date>,
    /// Drop rows with a negative amount.
    pub exclude_negative: bool,
    /// The selected values per categorical column. Columns that are absent keep all values.
    pub categories: BTreeMap<String, Vec<String>>,
    /// The values each category widget offered when the form was submitted.
    ///
    /// A column whose offered values have changed since goes back to all values.
    pub offered: BTreeMap<String, Vec<String>>,
    /// The requested X (categorical) column.
    pub x: Option<String>,
    /// The requested Y (numeric) column.
    pub y: Option<String>,
    /// The requested color (categorical) column.
    pub color: Option<String>,
    /// The requested group-by (categorical) column.
    pub group_by: Option<String>,
    /// The requested aggregation (numeric) columns, `None` for the default.
    pub agg_columns: Option<Vec<String>>,
}

impl FilterSelection {
    /// Parses a URL encoded query string such as `x=ProductCategory&y=Amount`.
    ///
    /// Unknown keys are ignored.
    ///
    /// # Errors
    /// Returns [Error::InvalidSelection] if the query is not URL encoded or a
    /// date is not in `YYYY-MM-DD` format.
    pub fn from_query(query: &str) -> Result<Self, Error> {
        let pairs: Vec<(String, String)> = serde_urlencoded::from_str(query)
            .map_err(|error| Error::InvalidSelection(format!("malformed query string: {error}")))?;

        Self::from_pairs(pairs)
    }

    /// Builds a selection from decoded key-value pairs in submission order.
    ///
    /// # Errors
    /// Returns [Error::InvalidSelection] if a date is not in `YYYY-MM-DD` format
    /// or a list of offered values is not a JSON array of strings.
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Result<Self, Error> {
        let mut selection = FilterSelection::default();
        let mut start = None;
        let mut end = None;

        for (key, value) in pairs {
            match key.as_str() {
                DATE_START => start = parse_date(&value)?,
                DATE_END => end = parse_date(&value)?,
                EXCLUDE_NEGATIVE => {
                    selection.exclude_negative = matches!(value.as_str(), "on" | "true" | "1")
                }
                CATEGORY_PRESENT => {
                    selection.categories.entry(value).or_default();
                }
                X => selection.x = non_empty(value),
                Y => selection.y = non_empty(value),
                COLOR => selection.color = non_empty(value),
                GROUP_BY => selection.group_by = non_empty(value),
                AGG => selection.agg_columns.get_or_insert_default().push(value),
                AGG_PRESENT => {
                    selection.agg_columns.get_or_insert_default();
                }
                _ => {
                    if let Some(column) = key.strip_prefix(CATEGORY_OFFERED_PREFIX) {
                        let values = serde_json::from_str(&value).map_err(|error| {
                            Error::InvalidSelection(format!(
                                "could not read the values offered for '{column}': {error}"
                            ))
                        })?;
                        selection.offered.insert(column.to_owned(), values);
                    } else if let Some(column) = key.strip_prefix(CATEGORY_PREFIX) {
                        selection
                            .categories
                            .entry(column.to_owned())
                            .or_default()
                            .push(value);
                    }
                }
            }
        }

        selection.date_range = start.into_iter().chain(end).collect();

        Ok(selection)
    }
}

fn parse_date(text: &str) -> Result<Option<Date>, Error> {
    if text.is_empty() {
        return Ok(None);
    }

    Date::parse(text, DATE_FORMAT)
        .map(Some)
        .map_err(|error| Error::InvalidSelection(format!("could not parse '{text}' as a date: {error}")))
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() { None } else { Some(value) }
}
