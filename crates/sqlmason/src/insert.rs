//! INSERT statement construction.
//!
//! Accepts a single keyed row or a `{cols, rows}` batch. Declared columns
//! with a default that the caller did not supply are backfilled: the default
//! is cleaned once when the statement is built (which is when the `now`
//! keyword family resolves for temporal columns) and bound for every row.
//! The output is one placeholder-bearing statement plus the bindings in
//! row-major order; literals never enter the SQL text.

use crate::dialect::Dialect;
use crate::error::{SqlError, SqlResult};
use crate::schema::{Column, Table};
use crate::value::{Binding, Value};

/// Builds one `insert into ... values ...` statement for a table.
#[derive(Debug)]
pub struct InsertBuilder<'a> {
    dialect: Dialect,
    table: &'a Table,
    keys: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl<'a> InsertBuilder<'a> {
    pub fn new(dialect: Dialect, table: &'a Table) -> Self {
        Self {
            dialect,
            table,
            keys: Vec::new(),
            rows: Vec::new(),
        }
    }

    /// Add one keyed row. The first row fixes the column list; later rows
    /// must supply the same keys in the same order.
    pub fn row(mut self, values: &[(&str, Value)]) -> SqlResult<Self> {
        if values.is_empty() {
            return Err(SqlError::EmptyValues("insert row with no values".into()));
        }
        let keys: Vec<String> = values.iter().map(|(k, _)| k.to_string()).collect();
        if self.keys.is_empty() {
            self.keys = keys;
        } else if self.keys != keys {
            return Err(SqlError::invalid_operator(
                "insert",
                "rows supply different column lists",
            ));
        }
        self.rows.push(values.iter().map(|(_, v)| v.clone()).collect());
        Ok(self)
    }

    /// Add a `{cols, rows}` batch. Every row must match the column list's
    /// length.
    pub fn rows(mut self, cols: &[&str], rows: Vec<Vec<Value>>) -> SqlResult<Self> {
        if cols.is_empty() {
            return Err(SqlError::EmptyValues("insert with no columns".into()));
        }
        if rows.is_empty() {
            return Err(SqlError::EmptyValues("insert with no rows".into()));
        }
        let keys: Vec<String> = cols.iter().map(|k| k.to_string()).collect();
        if self.keys.is_empty() {
            self.keys = keys;
        } else if self.keys != keys {
            return Err(SqlError::invalid_operator(
                "insert",
                "rows supply different column lists",
            ));
        }
        for (idx, row) in rows.iter().enumerate() {
            if row.len() != cols.len() {
                return Err(SqlError::invalid_operator(
                    "insert",
                    format!(
                        "row {idx} supplies {} values for {} columns",
                        row.len(),
                        cols.len()
                    ),
                ));
            }
        }
        self.rows.extend(rows);
        Ok(self)
    }

    /// Render the statement and bindings.
    pub fn build(self) -> SqlResult<(String, Vec<Binding>)> {
        if self.rows.is_empty() {
            return Err(SqlError::EmptyValues("insert with no rows".into()));
        }

        // Resolve supplied keys to columns up front; unknown keys fail fast.
        let mut columns: Vec<Column> = Vec::with_capacity(self.keys.len());
        for key in &self.keys {
            let col = self
                .table
                .col_by_key(key)
                .ok_or_else(|| SqlError::unknown_column(self.table.name(), key))?;
            columns.push(col.clone());
        }

        // Backfill: declared defaults not supplied by the caller, resolved
        // once so every row binds the same moment.
        let mut backfill: Vec<(Column, Value)> = Vec::new();
        for col in self.table.cols() {
            if self.keys.iter().any(|k| k == col.key()) {
                continue;
            }
            if let Some(default) = col.default_value() {
                let resolved = col.clean(default.clone());
                backfill.push((col.clone(), resolved));
            }
        }

        let names = columns
            .iter()
            .chain(backfill.iter().map(|(c, _)| c))
            .map(|c| c.quoted_name())
            .collect::<Vec<_>>()
            .join(", ");

        let mut bindings: Vec<Binding> = Vec::new();
        let mut groups: Vec<String> = Vec::with_capacity(self.rows.len());
        for row in &self.rows {
            let mut placeholders: Vec<String> = Vec::with_capacity(row.len() + backfill.len());
            for (col, value) in columns.iter().zip(row) {
                let cleaned = col.clean(value.clone());
                placeholders.push(self.dialect.placeholder(bindings.len() + 1));
                bindings.push(Binding {
                    column: col.clone(),
                    value: cleaned,
                });
            }
            for (col, resolved) in &backfill {
                placeholders.push(self.dialect.placeholder(bindings.len() + 1));
                bindings.push(Binding {
                    column: col.clone(),
                    value: resolved.clone(),
                });
            }
            groups.push(format!("({})", placeholders.join(", ")));
        }

        let sql = format!(
            "insert into {} ({names}) values {}",
            self.table.quoted_qualified_name(),
            groups.join(", ")
        );
        Ok((sql, bindings))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ColumnSpec, DataType};

    fn hello() -> Table {
        let mut t = Table::new(Dialect::MySql, "hello").unwrap();
        t.add_columns([
            ("user-id", ColumnSpec::new(DataType::Int).primary()),
            ("username", ColumnSpec::new(DataType::Varchar).size(50)),
            (
                "created-on",
                ColumnSpec::new(DataType::DateTime).default_value("now"),
            ),
        ])
        .unwrap();
        t
    }

    #[test]
    fn single_row_backfills_default() {
        let table = hello();
        let (sql, bindings) = InsertBuilder::new(Dialect::MySql, &table)
            .row(&[("user-id", Value::Int(1)), ("username", Value::from("alice"))])
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(
            sql,
            "insert into `hello` (`user_id`, `username`, `created_on`) values (?, ?, ?)"
        );
        assert_eq!(bindings.len(), 3);
        assert_eq!(bindings[0].value, Value::Int(1));
        assert_eq!(bindings[1].value, Value::Text("alice".into()));
        // The 'now' default resolves to a concrete datetime at build time.
        assert!(matches!(bindings[2].value, Value::DateTime(_)));
        assert!(!sql.contains("alice"));
    }

    #[test]
    fn supplied_default_is_not_backfilled() {
        let table = hello();
        let stamp = chrono::NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(3, 4, 5)
            .unwrap();
        let (sql, bindings) = InsertBuilder::new(Dialect::MySql, &table)
            .row(&[
                ("user-id", Value::Int(1)),
                ("username", Value::from("bob")),
                ("created-on", Value::DateTime(stamp)),
            ])
            .unwrap()
            .build()
            .unwrap();
        assert!(sql.ends_with("values (?, ?, ?)"));
        assert_eq!(bindings[2].value, Value::DateTime(stamp));
    }

    #[test]
    fn multi_row_bindings_are_row_major() {
        let table = hello();
        let (sql, bindings) = InsertBuilder::new(Dialect::MySql, &table)
            .rows(
                &["user-id", "username"],
                vec![
                    vec![Value::Int(1), Value::from("a")],
                    vec![Value::Int(2), Value::from("b")],
                ],
            )
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(
            sql,
            "insert into `hello` (`user_id`, `username`, `created_on`) \
             values (?, ?, ?), (?, ?, ?)"
        );
        assert_eq!(bindings.len(), 6);
        assert_eq!(bindings[0].value, Value::Int(1));
        assert_eq!(bindings[3].value, Value::Int(2));
        assert_eq!(bindings[4].value, Value::Text("b".into()));
    }

    #[test]
    fn shared_backfill_timestamp_across_rows() {
        let table = hello();
        let (_, bindings) = InsertBuilder::new(Dialect::MySql, &table)
            .rows(
                &["user-id", "username"],
                vec![
                    vec![Value::Int(1), Value::from("a")],
                    vec![Value::Int(2), Value::from("b")],
                ],
            )
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(bindings[2].value, bindings[5].value);
    }

    #[test]
    fn mssql_numbered_placeholders() {
        let mut table = Table::new(Dialect::MsSql, "hello").unwrap();
        table
            .add_columns([
                ("user-id", ColumnSpec::new(DataType::Int)),
                ("username", ColumnSpec::new(DataType::NVarchar)),
            ])
            .unwrap();
        let (sql, _) = InsertBuilder::new(Dialect::MsSql, &table)
            .row(&[("user-id", Value::Int(1)), ("username", Value::from("a"))])
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(
            sql,
            "insert into [hello] ([user_id], [username]) values (@P1, @P2)"
        );
    }

    #[test]
    fn unknown_key_fails() {
        let table = hello();
        let err = InsertBuilder::new(Dialect::MySql, &table)
            .row(&[("nope", Value::Int(1))])
            .unwrap()
            .build()
            .unwrap_err();
        assert!(err.is_unknown());
    }

    #[test]
    fn empty_inputs_fail() {
        let table = hello();
        assert!(InsertBuilder::new(Dialect::MySql, &table).row(&[]).is_err());
        assert!(InsertBuilder::new(Dialect::MySql, &table)
            .rows(&["user-id"], vec![])
            .is_err());
        assert!(InsertBuilder::new(Dialect::MySql, &table).build().is_err());
    }

    #[test]
    fn mismatched_row_shape_fails() {
        let table = hello();
        let err = InsertBuilder::new(Dialect::MySql, &table)
            .rows(&["user-id", "username"], vec![vec![Value::Int(1)]])
            .unwrap_err();
        assert!(matches!(err, SqlError::InvalidOperator { .. }));
    }
}
