//! In-memory table model and feature extraction.
//!
//! A `Table` is a list of named columns sharing one row count. Columns are
//! either numeric or categorical as read from disk; after
//! `preprocessing::encode_categoricals` every column is numeric and the
//! table can be turned into a feature matrix for the models.
use anyhow::{bail, Result};

use crate::math::Array2;

#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    /// Missing cells are NaN.
    Numeric(Vec<f64>),
    /// Missing cells are `None`.
    Categorical(Vec<Option<String>>),
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Numeric(values) => values.len(),
            ColumnData::Categorical(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub data: ColumnData,
}

impl Column {
    pub fn numeric(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            data: ColumnData::Numeric(values),
        }
    }

    pub fn categorical(name: impl Into<String>, values: Vec<Option<String>>) -> Self {
        Self {
            name: name.into(),
            data: ColumnData::Categorical(values),
        }
    }

    pub fn is_categorical(&self) -> bool {
        matches!(self.data, ColumnData::Categorical(_))
    }

    pub fn as_numeric(&self) -> Option<&[f64]> {
        match &self.data {
            ColumnData::Numeric(values) => Some(values),
            ColumnData::Categorical(_) => None,
        }
    }

    /// Cell rendered as text, used for group keys.
    pub fn cell_string(&self, row: usize) -> String {
        match &self.data {
            ColumnData::Numeric(values) => values[row].to_string(),
            ColumnData::Categorical(values) => values[row].clone().unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
    rows: usize,
}

impl Table {
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        let rows = columns.first().map(|c| c.data.len()).unwrap_or(0);
        for column in &columns {
            if column.data.len() != rows {
                bail!(
                    "Column '{}' has {} rows, expected {}",
                    column.name,
                    column.data.len(),
                    rows
                );
            }
        }
        Ok(Self { columns, rows })
    }

    pub fn nrows(&self) -> usize {
        self.rows
    }

    pub fn ncols(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn columns_mut(&mut self) -> &mut [Column] {
        &mut self.columns
    }

    pub fn column(&self, idx: usize) -> Option<&Column> {
        self.columns.get(idx)
    }

    pub fn names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Build the `f32` feature matrix from every column not in `exclude`.
    ///
    /// Fails if any selected column is still categorical.
    pub fn feature_matrix(&self, exclude: &[usize]) -> Result<(Array2<f32>, Vec<String>)> {
        let selected: Vec<&Column> = self
            .columns
            .iter()
            .enumerate()
            .filter(|(idx, _)| !exclude.contains(idx))
            .map(|(_, c)| c)
            .collect();

        let mut numeric = Vec::with_capacity(selected.len());
        for column in &selected {
            match column.as_numeric() {
                Some(values) => numeric.push(values),
                None => bail!("Column '{}' is not numeric; encode it first", column.name),
            }
        }

        let mut data = Vec::with_capacity(self.rows * numeric.len());
        for row in 0..self.rows {
            data.extend(numeric.iter().map(|values| values[row] as f32));
        }
        let x = Array2::from_shape_vec((self.rows, numeric.len()), data)?;
        let names = selected.iter().map(|c| c.name.clone()).collect();
        Ok((x, names))
    }

    /// One key per row joining the values of `group_cols`.
    pub fn group_keys(&self, group_cols: &[usize]) -> Vec<String> {
        (0..self.rows)
            .map(|row| {
                group_cols
                    .iter()
                    .map(|&c| self.columns[c].cell_string(row))
                    .collect::<Vec<_>>()
                    .join("\u{1f}")
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> Table {
        Table::new(vec![
            Column::numeric("y", vec![1.0, 2.0, 3.0]),
            Column::numeric("a", vec![0.5, 1.5, 2.5]),
            Column::numeric("b", vec![10.0, 20.0, 30.0]),
        ])
        .unwrap()
    }

    #[test]
    fn rejects_ragged_columns() {
        let result = Table::new(vec![
            Column::numeric("a", vec![1.0, 2.0]),
            Column::numeric("b", vec![1.0]),
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn feature_matrix_skips_excluded_columns() {
        let (x, names) = table().feature_matrix(&[0]).unwrap();
        assert_eq!(names, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(x.shape(), (3, 2));
        assert_eq!(x.row_slice(1), &[1.5, 20.0]);
    }

    #[test]
    fn feature_matrix_refuses_categorical() {
        let t = Table::new(vec![Column::categorical(
            "c",
            vec![Some("x".into()), None],
        )])
        .unwrap();
        assert!(t.feature_matrix(&[]).is_err());
    }

    #[test]
    fn group_keys_join_columns() {
        let t = Table::new(vec![
            Column::categorical("cell", vec![Some("A".into()), Some("B".into())]),
            Column::numeric("drug", vec![1.0, 1.0]),
        ])
        .unwrap();
        let keys = t.group_keys(&[0, 1]);
        assert_ne!(keys[0], keys[1]);
        assert!(keys[0].starts_with('A'));
    }
}
