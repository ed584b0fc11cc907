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

use std::io;
use std::sync::Arc;

use tracing::trace;

use super::{quote, BaseWriter, WriteOptions, Writer};
use crate::table::{Row, Table};
use crate::Result;

/// Writes one `UPDATE` statement per row, keyed by the table's primary key.
///
/// Nothing is buffered, so [`Writer::flush`] is a no-op.
#[derive(Debug)]
pub struct UpdateWriter<W> {
    base: BaseWriter<W>,
    columns: Vec<String>,
}

impl<W: io::Write> UpdateWriter<W> {
    /// Create an update writer for `columns`. An empty list updates every column.
    pub fn new<C: Into<String>>(
        table: impl Into<Arc<Table>>,
        out: W,
        columns: impl IntoIterator<Item = C>,
    ) -> Self {
        Self::with_options(table, out, columns, WriteOptions::default())
    }

    pub fn with_options<C: Into<String>>(
        table: impl Into<Arc<Table>>,
        out: W,
        columns: impl IntoIterator<Item = C>,
        options: WriteOptions,
    ) -> Self {
        Self {
            base: BaseWriter::new(table.into(), out, &options),
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }

    /// Columns in the SET clause: the configured ones, or all table columns
    pub fn columns(&self) -> &[String] {
        if self.columns.is_empty() {
            &self.base.table().columns
        } else {
            &self.columns
        }
    }

    pub fn quoted_columns(&self) -> Vec<String> {
        self.columns().iter().map(|column| quote(column)).collect()
    }

    pub fn statements_written(&self) -> usize {
        self.base.statements_written()
    }

    pub fn table(&self) -> &Table {
        self.base.table()
    }

    pub fn get_ref(&self) -> &W {
        self.base.get_ref()
    }

    pub fn into_inner(self) -> W {
        self.base.into_inner()
    }

    fn build_statement(&self, row: &Row) -> Result<String> {
        let table = self.base.table();
        // Resolved against the full schema, so the key need not be updated
        let primary_key_value = self.base.find_column_value(row, &table.primary_key)?;

        let mut sql = String::with_capacity(64 + table.name.len() + 2 * row.value_bytes());
        sql.push_str("UPDATE `");
        sql.push_str(&table.name);
        sql.push_str("` SET ");

        for (i, column) in self.columns().iter().enumerate() {
            let value = self.base.find_column_value(row, column)?;
            if i > 0 {
                sql.push_str(" , ");
            }
            sql.push_str(&quote(column));
            sql.push_str(" = ");
            sql.push_str(value);
        }

        // The key name is left unquoted in WHERE, unlike the SET columns.
        sql.push_str(" WHERE ");
        sql.push_str(&table.primary_key);
        sql.push_str(" = ");
        sql.push_str(primary_key_value);
        sql.push_str(";\n");

        Ok(sql)
    }
}

impl<W: io::Write> Writer for UpdateWriter<W> {
    /// Write the `UPDATE` statement for a row immediately.
    ///
    /// Fails without writing anything if the primary key or an update column
    /// is missing from the table.
    fn write(&mut self, row: Row) -> Result<()> {
        self.base.check_row(&row)?;

        let statement = self.build_statement(&row)?;
        self.base.emit(&statement)?;
        trace!("Wrote update for table {}: {}", self.base.table().name, statement.trim_end());

        Ok(())
    }
}
