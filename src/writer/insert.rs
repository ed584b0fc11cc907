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

use tracing::{debug, warn};

use super::{BaseWriter, WriteOptions, Writer, DEFAULT_BULK_SIZE};
use crate::error::Error;
use crate::table::{Row, Table};
use crate::Result;

// Room for "INSERT INTO ``", " (", ") VALUES " and ";\n".
const STATEMENT_OVERHEAD: usize = 100;

// Larger buffers grow on demand.
const MAX_PREALLOCATED_ROWS: usize = DEFAULT_BULK_SIZE * 10;

/// Buffers rows and writes them as multi-row `INSERT` statements.
///
/// The buffer is flushed automatically once it holds `bulk_size` rows. The
/// caller must call [`Writer::flush`] after the last row, otherwise a
/// partially filled buffer is never written.
#[derive(Debug)]
pub struct InsertWriter<W> {
    base: BaseWriter<W>,
    buffer: Vec<Row>,
    bulk_size: usize,
}

impl<W: io::Write> InsertWriter<W> {
    /// Create an insert writer flushing every `bulk_size` rows
    pub fn new(table: impl Into<Arc<Table>>, out: W, bulk_size: usize) -> Self {
        Self::with_options(
            table,
            out,
            WriteOptions::default().with_bulk_size(bulk_size),
        )
    }

    pub fn with_options(table: impl Into<Arc<Table>>, out: W, options: WriteOptions) -> Self {
        Self {
            base: BaseWriter::new(table.into(), out, &options),
            buffer: Vec::with_capacity(options.bulk_size.min(MAX_PREALLOCATED_ROWS)),
            bulk_size: options.bulk_size,
        }
    }

    pub fn bulk_size(&self) -> usize {
        self.bulk_size
    }

    /// Number of rows waiting for the next flush
    pub fn buffered_rows(&self) -> usize {
        self.buffer.len()
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

    /// Return the sink. Rows still buffered are dropped, so flush first.
    pub fn into_inner(self) -> W {
        if !self.buffer.is_empty() {
            warn!(
                "Dropping {} unflushed rows for table {}",
                self.buffer.len(),
                self.base.table().name
            );
        }
        self.base.into_inner()
    }

    /// Upper bound of the statement length for the buffered rows
    fn statement_capacity(&self, quoted_columns: &str) -> usize {
        let mut n = STATEMENT_OVERHEAD + self.base.table().name.len() + quoted_columns.len();
        for row in &self.buffer {
            // "(" + ")" + ", " after the row, and ", " between values
            n += row.value_bytes() + 4 + 2 * row.len();
        }
        n
    }

    fn build_statement(&self) -> String {
        let table = self.base.table();
        let quoted_columns = table.quoted_column_list();

        let mut sql = String::with_capacity(self.statement_capacity(&quoted_columns));
        sql.push_str("INSERT INTO `");
        sql.push_str(&table.name);
        sql.push_str("` (");
        sql.push_str(&quoted_columns);
        sql.push_str(") VALUES ");
        for (i, row) in self.buffer.iter().enumerate() {
            if i > 0 {
                sql.push_str(", ");
            }
            sql.push('(');
            for (j, value) in row.values().iter().enumerate() {
                if j > 0 {
                    sql.push_str(", ");
                }
                sql.push_str(value);
            }
            sql.push(')');
        }
        sql.push_str(";\n");
        sql
    }
}

impl<W: io::Write> Writer for InsertWriter<W> {
    /// Buffer a row, flushing once the buffer reaches the bulk size
    fn write(&mut self, row: Row) -> Result<()> {
        self.base.check_row(&row)?;

        self.buffer.push(row);
        if self.buffer.len() >= self.bulk_size {
            self.flush()?;
        }

        Ok(())
    }

    /// Write all buffered rows as a single `INSERT` statement.
    ///
    /// If the sink rejects the statement outright the rows stay buffered and
    /// the flush can be retried. If only part of it was written the rows are
    /// dropped and the error is not retriable.
    fn flush(&mut self) -> Result<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }

        let statement = self.build_statement();
        if let Err(err) = self.base.emit(&statement) {
            if matches!(err, Error::PartialStatement { .. }) {
                warn!(
                    "Dropping {} rows for table {} after a partial write",
                    self.buffer.len(),
                    self.base.table().name
                );
                self.buffer.clear();
            }
            return Err(err);
        }

        debug!(
            "Flushed {} rows into table {} ({} bytes)",
            self.buffer.len(),
            self.base.table().name,
            statement.len()
        );
        self.buffer.clear();

        Ok(())
    }
}
