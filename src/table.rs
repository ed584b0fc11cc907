// Copyright 2023 Greptime Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Table schema and row data used to build SQL statements

use derive_builder::Builder;

use crate::writer::quote;

/// A table definition: name, columns in schema order and primary key column
#[derive(Debug, Clone, PartialEq, Eq, Builder)]
#[builder(setter(into))]
pub struct Table {
    /// Table name
    pub name: String,
    /// Column names in schema order
    #[builder(default)]
    pub columns: Vec<String>,
    /// Primary key column, expected to be one of `columns`
    pub primary_key: String,
}

impl Table {
    /// Create a new table builder
    pub fn builder() -> TableBuilder {
        TableBuilder::default()
    }

    /// Create a table from its name, columns and primary key
    pub fn new<N, C, P>(name: N, columns: impl IntoIterator<Item = C>, primary_key: P) -> Self
    where
        N: Into<String>,
        C: Into<String>,
        P: Into<String>,
    {
        Self {
            name: name.into(),
            columns: columns.into_iter().map(Into::into).collect(),
            primary_key: primary_key.into(),
        }
    }

    /// Backtick-quoted, comma separated column list, e.g. `` `id`, `name` ``
    pub fn quoted_column_list(&self) -> String {
        self.columns
            .iter()
            .map(|column| quote(column))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Position of `column` in schema order
    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }
}

impl TableBuilder {
    /// Append a single column
    pub fn column<T: Into<String>>(&mut self, name: T) -> &mut Self {
        self.columns.get_or_insert_with(Vec::new).push(name.into());
        self
    }
}

/// One table record: SQL literal values positionally matching [`Table::columns`].
///
/// Values are written verbatim, so they must already be valid SQL literals
/// (quoted strings, `NULL`, numbers, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    values: Vec<String>,
}

impl Row {
    /// Create a new empty row
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new row with pre-allocated capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            values: Vec::with_capacity(capacity),
        }
    }

    /// Create a row directly from values
    pub fn from_values(values: Vec<String>) -> Self {
        Self { values }
    }

    /// Add a value to the row
    pub fn add_value<T: Into<String>>(mut self, value: T) -> Self {
        self.values.push(value.into());
        self
    }

    /// Add multiple values to the row
    pub fn add_values<T: Into<String>>(mut self, values: impl IntoIterator<Item = T>) -> Self {
        self.values.extend(values.into_iter().map(Into::into));
        self
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// Get the value at index
    pub fn get(&self, index: usize) -> Option<&str> {
        self.values.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Total bytes of all values, used to pre-size statements
    pub(crate) fn value_bytes(&self) -> usize {
        self.values.iter().map(String::len).sum()
    }
}

impl<T: Into<String>> From<Vec<T>> for Row {
    fn from(values: Vec<T>) -> Self {
        values.into_iter().collect()
    }
}

impl<T: Into<String>> FromIterator<T> for Row {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(Into::into).collect(),
        }
    }
}
