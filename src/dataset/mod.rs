//! The in-memory table that the dashboard analyses.
//!
//! A [Dataset] is loaded from a [DataSource], memoized by a [DatasetCache]
//! and cloned for every pipeline pass, so filtering never touches the cached
//! copy.

mod cache;
mod csv;
mod source;
mod value;

pub use cache::DatasetCache;
pub use self::csv::{parse_csv, write_csv};
pub use source::{CsvFileSource, DataSource};
pub use value::{Column, ColumnType, Value};

pub(crate) use value::TIMESTAMP_FORMAT;

/// A row of cells, one per column.
pub type Row = Vec<Value>;

/// An ordered set of typed columns and the rows that fill them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    columns: Vec<Column>,
    rows: Vec<Row>,
}

impl Dataset {
    /// Create a dataset from columns and rows.
    ///
    /// Every row must have exactly one value per column.
    pub fn new(columns: Vec<Column>, rows: Vec<Row>) -> Self {
        debug_assert!(rows.iter().all(|row| row.len() == columns.len()));

        Self { columns, rows }
    }

    /// The columns in declaration order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// The rows in their original order.
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// The number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the dataset has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The position of the column called `name`.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column.name == name)
    }

    /// Keep only the rows for which `predicate` returns `true`.
    pub fn retain(&mut self, mut predicate: impl FnMut(&Row) -> bool) {
        self.rows.retain(|row| predicate(row));
    }

    /// Replace the type and values of the column at `index`.
    ///
    /// `values` must contain one value per row.
    pub fn replace_column(&mut self, index: usize, dtype: ColumnType, values: Vec<Value>) {
        debug_assert_eq!(values.len(), self.rows.len());

        self.columns[index].dtype = dtype;
        for (row, value) in self.rows.iter_mut().zip(values) {
            row[index] = value;
        }
    }

    /// The values of the column at `index`, top to bottom.
    pub fn values(&self, index: usize) -> impl Iterator<Item = &Value> {
        self.rows.iter().map(move |row| &row[index])
    }

    /// The distinct category keys of the column at `index` in order of first appearance.
    pub fn unique_categories(&self, index: usize) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();

        self.values(index)
            .map(Value::category_key)
            .filter(|key| seen.insert(key.clone()))
            .collect()
    }

    /// The first `count` rows as a new dataset.
    pub fn head(&self, count: usize) -> Dataset {
        Dataset {
            columns: self.columns.clone(),
            rows: self.rows.iter().take(count).cloned().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Column, ColumnType, Dataset, Value};

    fn text(value: &str) -> Value {
        Value::Text(value.to_owned())
    }

    fn get_test_dataset() -> Dataset {
        Dataset::new(
            vec![
                Column::new("type", ColumnType::Text),
                Column::new("amount", ColumnType::Integer),
            ],
            vec![
                vec![text("B"), Value::Integer(1)],
                vec![text("A"), Value::Integer(2)],
                vec![text("B"), Value::Integer(3)],
                vec![Value::Missing, Value::Integer(4)],
            ],
        )
    }

    #[test]
    fn unique_categories_keep_first_appearance_order() {
        let dataset = get_test_dataset();

        assert_eq!(dataset.unique_categories(0), vec!["B", "A", ""]);
    }

    #[test]
    fn retain_filters_rows() {
        let mut dataset = get_test_dataset();

        dataset.retain(|row| row[1].as_f64().is_some_and(|amount| amount > 2.0));

        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.rows()[0][1], Value::Integer(3));
    }

    #[test]
    fn replace_column_changes_type_and_values() {
        let mut dataset = get_test_dataset();

        dataset.replace_column(
            1,
            ColumnType::Float,
            vec![Value::Float(1.5), Value::Missing, Value::Float(0.0), Value::Float(-1.0)],
        );

        assert_eq!(dataset.columns()[1].dtype, ColumnType::Float);
        assert_eq!(dataset.rows()[1][1], Value::Missing);
    }

    #[test]
    fn head_takes_at_most_count_rows() {
        let dataset = get_test_dataset();

        assert_eq!(dataset.head(2).len(), 2);
        assert_eq!(dataset.head(10).len(), 4);
        assert_eq!(dataset.head(2).columns(), dataset.columns());
    }
}
