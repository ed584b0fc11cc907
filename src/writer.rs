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

//! Statement writers for bulk export
//!
//! A [`Writer`] turns table rows into SQL statements and writes them to any
//! [`io::Write`] sink. [`InsertWriter`] batches rows into multi-row `INSERT`
//! statements, [`UpdateWriter`] emits one `UPDATE` per row.
//!
//! Writers are not thread-safe; use one writer per sink from a single caller.

pub mod insert;
pub mod update;

use std::io;
use std::sync::Arc;

use snafu::{ensure, IntoError, OptionExt};

pub use self::insert::InsertWriter;
pub use self::update::UpdateWriter;
use crate::table::{Row, Table};
use crate::{error, Result};

/// Default number of rows per `INSERT` statement
pub const DEFAULT_BULK_SIZE: usize = 100;

/// Common interface of the statement writers
pub trait Writer {
    /// Write a single row
    fn write(&mut self, row: Row) -> Result<()>;

    /// Flush the buffered rows. Writers that do not buffer have nothing to do.
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<T: Writer + ?Sized> Writer for Box<T> {
    fn write(&mut self, row: Row) -> Result<()> {
        (**self).write(row)
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }
}

/// Wrap an identifier in backticks. Embedded backticks are not escaped.
pub fn quote(identifier: &str) -> String {
    format!("`{identifier}`")
}

/// Configuration options for statement writers
#[derive(Debug, Clone)]
pub struct WriteOptions {
    pub bulk_size: usize,
    pub validate_rows: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            bulk_size: DEFAULT_BULK_SIZE,
            validate_rows: false,
        }
    }
}

impl WriteOptions {
    /// Set the number of rows per `INSERT` statement.
    /// A bulk size of zero flushes after every row.
    #[must_use]
    pub fn with_bulk_size(mut self, bulk_size: usize) -> Self {
        self.bulk_size = bulk_size;
        self
    }

    /// Reject rows whose length differs from the table column count
    #[must_use]
    pub fn with_validate_rows(mut self, validate_rows: bool) -> Self {
        self.validate_rows = validate_rows;
        self
    }
}

/// Which kind of statements to emit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteMode {
    Insert,
    /// Update the given columns, or every column when empty
    Update { columns: Vec<String> },
}

impl WriteMode {
    /// Create the writer for this mode
    pub fn into_writer<'a, W>(
        self,
        table: impl Into<Arc<Table>>,
        out: W,
        options: WriteOptions,
    ) -> Box<dyn Writer + 'a>
    where
        W: io::Write + 'a,
    {
        match self {
            WriteMode::Insert => Box::new(InsertWriter::with_options(table, out, options)),
            WriteMode::Update { columns } => {
                Box::new(UpdateWriter::with_options(table, out, columns, options))
            }
        }
    }
}

/// State and helpers shared by the concrete writers
#[derive(Debug)]
pub struct BaseWriter<W> {
    out: W,
    table: Arc<Table>,
    validate_rows: bool,
    statements_written: usize,
}

impl<W: io::Write> BaseWriter<W> {
    pub fn new(table: Arc<Table>, out: W, options: &WriteOptions) -> Self {
        Self {
            out,
            table,
            validate_rows: options.validate_rows,
            statements_written: 0,
        }
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    /// Look up the value of `column` in `row` by the column's schema position.
    ///
    /// Fails if the table has no such column: the row must not be emitted
    /// and the caller should stop the batch.
    pub fn find_column_value<'r>(&self, row: &'r Row, column: &str) -> Result<&'r str> {
        let index = self
            .table
            .column_index(column)
            .context(error::ColumnNotFoundSnafu {
                column,
                table: &self.table.name,
            })?;

        row.get(index).context(error::InvalidColumnCountSnafu {
            expected: self.table.columns.len(),
            actual: row.len(),
        })
    }

    /// Check the row length against the table when validation is enabled
    pub fn check_row(&self, row: &Row) -> Result<()> {
        if self.validate_rows {
            ensure!(
                row.len() == self.table.columns.len(),
                error::InvalidColumnCountSnafu {
                    expected: self.table.columns.len(),
                    actual: row.len(),
                }
            );
        }
        Ok(())
    }

    /// Write a complete statement to the sink.
    ///
    /// Fails with `WriteStatement` if the sink took nothing, or with
    /// `PartialStatement` if a prefix of the statement already reached it.
    pub fn emit(&mut self, statement: &str) -> Result<()> {
        let bytes = statement.as_bytes();
        let mut written = 0;
        while written < bytes.len() {
            match self.out.write(&bytes[written..]) {
                Ok(0) => {
                    let source = io::Error::from(io::ErrorKind::WriteZero);
                    return Err(self.write_error(written, bytes.len(), source));
                }
                Ok(n) => written += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(self.write_error(written, bytes.len(), e)),
            }
        }
        self.statements_written += 1;
        Ok(())
    }

    fn write_error(&self, written: usize, total: usize, source: io::Error) -> error::Error {
        if written == 0 {
            error::WriteStatementSnafu {
                table: &self.table.name,
            }
            .into_error(source)
        } else {
            error::PartialStatementSnafu {
                table: &self.table.name,
                written,
                total,
            }
            .into_error(source)
        }
    }

    /// Number of statements successfully written so far
    pub fn statements_written(&self) -> usize {
        self.statements_written
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
