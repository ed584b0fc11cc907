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

use snafu::{Location, Snafu};

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    #[snafu(display("Column {} not found in table {}", column, table))]
    ColumnNotFound {
        column: String,
        table: String,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("Invalid column count: expected {}, got {}", expected, actual))]
    InvalidColumnCount {
        expected: usize,
        actual: usize,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("Failed to write statement for table {}", table))]
    WriteStatement {
        table: String,
        source: io::Error,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display(
        "Statement for table {} partially written: {} of {} bytes",
        table,
        written,
        total
    ))]
    PartialStatement {
        table: String,
        written: usize,
        total: usize,
        source: io::Error,
        #[snafu(implicit)]
        location: Location,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Indicate if the error is retriable.
    ///
    /// A partially written statement is not: the sink already holds a
    /// truncated statement, and writing it again would corrupt the output.
    pub fn is_retriable(&self) -> bool {
        matches!(self, Self::WriteStatement { .. })
    }
}
