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

// End-to-end tests of the statement writers through the public API

use std::io;

use derive_new::new;
use sql_bulk_writer::{
    Error, InsertWriter, Result, Row, Table, UpdateWriter, WriteMode, WriteOptions, Writer,
};

// Sink that rejects the first `failures` writes
#[derive(new)]
struct FlakySink {
    failures: usize,
    #[new(default)]
    data: Vec<u8>,
}

impl io::Write for FlakySink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.failures > 0 {
            self.failures -= 1;
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "sink closed"));
        }
        self.data.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

// Sink that accepts `accept` bytes, rejects the next `failures` writes, then
// accepts everything
#[derive(new)]
struct TruncatingSink {
    accept: usize,
    failures: usize,
    #[new(default)]
    data: Vec<u8>,
}

impl io::Write for TruncatingSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.accept > 0 {
            let n = buf.len().min(self.accept);
            self.accept -= n;
            self.data.extend_from_slice(&buf[..n]);
            return Ok(n);
        }
        if self.failures > 0 {
            self.failures -= 1;
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "sink closed"));
        }
        self.data.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn users_table() -> Table {
    Table::builder()
        .name("users")
        .column("id")
        .column("name")
        .column("age")
        .primary_key("id")
        .build()
        .expect("Failed to build users table")
}

fn user_row(id: usize) -> Row {
    Row::new()
        .add_value(id.to_string())
        .add_value(format!("'user-{id}'"))
        .add_value((20 + id).to_string())
}

fn statements(out: &[u8]) -> Vec<String> {
    String::from_utf8(out.to_vec())
        .expect("statements are utf-8")
        .lines()
        .map(str::to_string)
        .collect()
}

#[test]
fn test_insert_statement_count_follows_bulk_size() -> Result<()> {
    for (total_rows, bulk_size) in [(7, 3), (9, 3), (1, 5), (10, 1), (0, 4)] {
        let mut out = Vec::new();
        let mut writer = InsertWriter::new(users_table(), &mut out, bulk_size);
        for id in 0..total_rows {
            writer.write(user_row(id))?;
        }

        // Only full batches are written before the explicit flush
        assert_eq!(writer.statements_written(), total_rows / bulk_size);
        assert_eq!(writer.buffered_rows(), total_rows % bulk_size);

        writer.flush()?;
        assert_eq!(writer.buffered_rows(), 0);
        drop(writer);

        let lines = statements(&out);
        assert_eq!(lines.len(), total_rows.div_ceil(bulk_size));
    }
    Ok(())
}

#[test]
fn test_insert_preserves_write_order() -> Result<()> {
    let mut out = Vec::new();
    let mut writer = InsertWriter::new(users_table(), &mut out, 2);
    for id in [5, 3, 9] {
        writer.write(user_row(id))?;
    }
    writer.flush()?;
    drop(writer);

    assert_eq!(
        statements(&out),
        [
            "INSERT INTO `users` (`id`, `name`, `age`) VALUES (5, 'user-5', 25), (3, 'user-3', 23);",
            "INSERT INTO `users` (`id`, `name`, `age`) VALUES (9, 'user-9', 29);",
        ]
    );
    Ok(())
}

#[test]
fn test_failed_flush_keeps_rows_buffered() -> Result<()> {
    let mut writer = InsertWriter::new(users_table(), FlakySink::new(1), 2);
    writer.write(user_row(1))?;

    let err = writer.write(user_row(2)).unwrap_err();
    assert!(matches!(err, Error::WriteStatement { .. }));
    assert!(err.is_retriable());
    assert_eq!(writer.buffered_rows(), 2);
    assert_eq!(writer.statements_written(), 0);

    writer.flush()?;
    assert_eq!(writer.buffered_rows(), 0);

    let sink = writer.into_inner();
    assert_eq!(
        statements(&sink.data),
        ["INSERT INTO `users` (`id`, `name`, `age`) VALUES (1, 'user-1', 21), (2, 'user-2', 22);"]
    );
    Ok(())
}

#[test]
fn test_partial_flush_is_not_written_twice() -> Result<()> {
    let mut writer = InsertWriter::new(users_table(), TruncatingSink::new(10, 1), 10);
    writer.write(user_row(1))?;

    let err = writer.flush().unwrap_err();
    assert!(matches!(
        err,
        Error::PartialStatement { written: 10, .. }
    ));
    assert!(!err.is_retriable());
    assert_eq!(writer.buffered_rows(), 0);

    // Nothing left to write for the failed batch
    writer.flush()?;
    writer.write(user_row(2))?;
    writer.flush()?;
    assert_eq!(writer.statements_written(), 1);

    let sink = writer.into_inner();
    assert_eq!(
        String::from_utf8(sink.data).expect("statements are utf-8"),
        "INSERT INTINSERT INTO `users` (`id`, `name`, `age`) VALUES (2, 'user-2', 22);\n"
    );
    Ok(())
}

#[test]
fn test_update_writer_targets_primary_key() -> Result<()> {
    let mut out = Vec::new();
    let mut writer = UpdateWriter::new(users_table(), &mut out, ["name"]);
    writer.write(user_row(1))?;
    writer.write(user_row(2))?;
    drop(writer);

    assert_eq!(
        statements(&out),
        [
            "UPDATE `users` SET `name` = 'user-1' WHERE id = 1;",
            "UPDATE `users` SET `name` = 'user-2' WHERE id = 2;",
        ]
    );
    Ok(())
}

#[test]
fn test_missing_primary_key_stops_batch() {
    let table = Table::new("users", ["name", "age"], "id");
    let mut out = Vec::new();
    let mut writer = UpdateWriter::new(table, &mut out, Vec::<String>::new());

    let rows = vec![Row::from(vec!["'a'", "1"]), Row::from(vec!["'b'", "2"])];
    let result: Result<()> = rows.into_iter().try_for_each(|row| writer.write(row));

    let err = result.unwrap_err();
    assert!(!err.is_retriable());
    assert_eq!(err.to_string(), "Column id not found in table users");
    drop(writer);
    assert!(out.is_empty());
}

#[test]
fn test_write_mode_selects_writer() -> Result<()> {
    let mut out = Vec::new();
    let options = WriteOptions::default().with_bulk_size(2);

    let mut insert = WriteMode::Insert.into_writer(users_table(), &mut out, options.clone());
    for id in 0..3 {
        insert.write(user_row(id))?;
    }
    insert.flush()?;
    drop(insert);

    let update_mode = WriteMode::Update {
        columns: vec!["age".to_string(), "name".to_string()],
    };
    let mut update = update_mode.into_writer(users_table(), &mut out, options);
    update.write(user_row(7))?;
    update.flush()?;
    drop(update);

    assert_eq!(
        statements(&out),
        [
            "INSERT INTO `users` (`id`, `name`, `age`) VALUES (0, 'user-0', 20), (1, 'user-1', 21);",
            "INSERT INTO `users` (`id`, `name`, `age`) VALUES (2, 'user-2', 22);",
            "UPDATE `users` SET `age` = 27 , `name` = 'user-7' WHERE id = 7;",
        ]
    );
    Ok(())
}

#[test]
fn test_validate_rows_option() {
    let options = WriteOptions::default().with_validate_rows(true);
    let mut out = Vec::new();
    let mut writer = UpdateWriter::with_options(users_table(), &mut out, ["name"], options);

    let err = writer.write(Row::from(vec!["1", "'short'"])).unwrap_err();
    assert!(matches!(
        err,
        Error::InvalidColumnCount {
            expected: 3,
            actual: 2,
            ..
        }
    ));
    drop(writer);
    assert!(out.is_empty());
}
