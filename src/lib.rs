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

//! Batches table rows into SQL `INSERT` and `UPDATE` statements for bulk export.
//!
//! ```
//! use sql_bulk_writer::{InsertWriter, Row, Table, Writer};
//!
//! let table = Table::new("users", ["id", "name"], "id");
//! let mut out = Vec::new();
//! let mut writer = InsertWriter::new(table, &mut out, 100);
//! writer.write(Row::from(vec!["1", "'Alice'"]))?;
//! writer.write(Row::from(vec!["2", "'Bob'"]))?;
//! writer.flush()?;
//! drop(writer);
//!
//! assert_eq!(
//!     String::from_utf8(out).unwrap(),
//!     "INSERT INTO `users` (`id`, `name`) VALUES (1, 'Alice'), (2, 'Bob');\n"
//! );
//! # Ok::<(), sql_bulk_writer::Error>(())
//! ```

pub mod error;
pub mod table;
pub mod writer;

pub use self::error::{Error, Result};
pub use self::table::{Row, Table, TableBuilder};
pub use self::writer::{
    InsertWriter, UpdateWriter, WriteMode, WriteOptions, Writer, DEFAULT_BULK_SIZE,
};
