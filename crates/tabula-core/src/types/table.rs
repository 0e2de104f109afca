//! Table type for the TABULA Feature Engine
//!
//! A `Table` is an ordered set of named columns, all of the same length.
//! Column order is preserved across inserts and concatenation so engine
//! output is deterministic. There are no row-index semantics beyond
//! positional order.

use crate::error::{CoreError, Result};
use crate::types::Value;
use log::debug;
use std::collections::HashMap;

/// Ordered, named columns of runtime values
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    /// Column names in insertion order
    names: Vec<String>,
    /// Column data indexed by name
    data: HashMap<String, Vec<Value>>,
    /// Number of rows (shared by every column)
    rows: usize,
}

impl Table {
    /// Create a new empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from `(name, values)` pairs
    ///
    /// Fails on duplicate column names or mismatched column lengths.
    pub fn from_columns(columns: Vec<(String, Vec<Value>)>) -> Result<Self> {
        let mut table = Self::new();
        for (name, values) in columns {
            if table.contains_column(&name) {
                return Err(CoreError::DuplicateColumn(name));
            }
            table.insert_column(name, values)?;
        }
        Ok(table)
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows
    }

    /// True if the table has no rows
    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Number of columns
    pub fn column_count(&self) -> usize {
        self.names.len()
    }

    /// Column names in insertion order
    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    /// True if a column with this name exists
    pub fn contains_column(&self, name: &str) -> bool {
        self.data.contains_key(name)
    }

    /// Get a column's values by name
    pub fn column(&self, name: &str) -> Option<&[Value]> {
        self.data.get(name).map(|v| v.as_slice())
    }

    /// Get a single cell
    pub fn value(&self, name: &str, row: usize) -> Option<&Value> {
        self.data.get(name).and_then(|col| col.get(row))
    }

    /// Insert a column, or overwrite an existing one in place
    ///
    /// The first column inserted into an empty table fixes the row count;
    /// every later column must match it.
    pub fn insert_column(&mut self, name: impl Into<String>, values: Vec<Value>) -> Result<()> {
        let name = name.into();
        if self.names.is_empty() {
            self.rows = values.len();
        } else if values.len() != self.rows {
            return Err(CoreError::LengthMismatch {
                column: name,
                expected: self.rows,
                actual: values.len(),
            });
        }

        if !self.data.contains_key(&name) {
            self.names.push(name.clone());
        }
        self.data.insert(name, values);
        Ok(())
    }

    /// Insert a column with the same scalar value in every row
    pub fn insert_broadcast(&mut self, name: impl Into<String>, value: Value) -> Result<()> {
        let rows = self.rows;
        self.insert_column(name, vec![value; rows])
    }

    /// Build a new table containing the given rows, in the given order
    pub fn select_rows(&self, indices: &[usize]) -> Result<Table> {
        if let Some(&bad) = indices.iter().find(|&&i| i >= self.rows) {
            return Err(CoreError::TypeError(format!(
                "Row index {} out of bounds for table with {} rows",
                bad, self.rows
            )));
        }

        let mut table = Table::new();
        for name in &self.names {
            let col = &self.data[name];
            let values: Vec<Value> = indices.iter().map(|&i| col[i].clone()).collect();
            table.insert_column(name.clone(), values)?;
        }
        // A selection from a table with no columns still carries a row count
        if table.names.is_empty() {
            table.rows = indices.len();
        }
        Ok(table)
    }

    /// Concatenate tables row-wise
    ///
    /// The output column order is first-appearance order across the pieces;
    /// a piece missing a column contributes `Null` for its rows.
    pub fn concat(pieces: &[Table]) -> Table {
        let mut names: Vec<String> = Vec::new();
        for piece in pieces {
            for name in &piece.names {
                if !names.contains(name) {
                    names.push(name.clone());
                }
            }
        }

        let total_rows: usize = pieces.iter().map(|p| p.rows).sum();
        let mut data: HashMap<String, Vec<Value>> = HashMap::with_capacity(names.len());

        for name in &names {
            let mut out = Vec::with_capacity(total_rows);
            for piece in pieces {
                match piece.data.get(name) {
                    Some(col) => out.extend(col.iter().cloned()),
                    None => out.extend(std::iter::repeat(Value::Null).take(piece.rows)),
                }
            }
            data.insert(name.clone(), out);
        }

        debug!(
            "Concatenated {} tables into {} rows x {} columns",
            pieces.len(),
            total_rows,
            names.len()
        );

        Table {
            names,
            data,
            rows: total_rows,
        }
    }
}
