//! DDL statement generators.
//!
//! Everything here renders from the metadata model alone, so a statement can
//! be produced for a table that does not exist yet. Keywords are lowercase
//! to match the statement renderer; the dialect decides quoting, the
//! existence guard and the MySQL table tail.

use crate::dialect::Dialect;
use crate::error::{SqlError, SqlResult};
use crate::schema::{Column, ForeignKey, Table};

/// `create table` for the whole table definition: column fragments, the
/// primary key constraint, and every validated foreign key.
pub fn create_table(table: &Table) -> String {
    let dialect = table.dialect();
    let mut parts: Vec<String> = table.cols().iter().map(Column::ddl_fragment).collect();

    let primary = table.primary_cols();
    if !primary.is_empty() {
        let cols = primary
            .iter()
            .map(|c| c.quoted_name())
            .collect::<Vec<_>>()
            .join(", ");
        parts.push(format!(
            "constraint {} primary key ({cols})",
            dialect.quote(&format!("{}_pk", table.name()))
        ));
    }
    for fk in table.foreign_keys() {
        parts.push(fk.constraint_sql(dialect));
    }
    let body = parts.join(", ");

    match dialect {
        Dialect::MySql => {
            let mut sql = format!(
                "create table if not exists {} ({body}) engine = InnoDB \
                 default charset = utf8mb4 collate = utf8mb4_unicode_ci",
                table.quoted_qualified_name()
            );
            if let Some(comment) = table.comment() {
                sql.push_str(&format!(" comment '{}'", dialect.escape_text(comment)));
            }
            sql
        }
        Dialect::MsSql => format!(
            "if not exists (select * from sysobjects where name = '{name}' and xtype = 'U') \
             create table {quoted} ({body})",
            name = dialect.escape_text(table.name()),
            quoted = table.quoted_qualified_name(),
        ),
    }
}

/// `drop table`, guarded against the table being absent.
pub fn drop_table(table: &Table) -> String {
    let dialect = table.dialect();
    match dialect {
        Dialect::MySql => format!("drop table if exists {}", table.quoted_qualified_name()),
        Dialect::MsSql => format!(
            "if exists (select * from sysobjects where name = '{name}' and xtype = 'U') \
             drop table {quoted}",
            name = dialect.escape_text(table.name()),
            quoted = table.quoted_qualified_name(),
        ),
    }
}

/// `alter table ... add [column]` for a column already present in the
/// metadata.
pub fn add_col(table: &Table, key: &str) -> SqlResult<String> {
    let col = table
        .col_by_key(key)
        .ok_or_else(|| SqlError::unknown_column(table.name(), key))?;
    let sql = match table.dialect() {
        Dialect::MySql => format!(
            "alter table {} add column {}",
            table.quoted_qualified_name(),
            col.ddl_fragment()
        ),
        Dialect::MsSql => format!(
            "alter table {} add {}",
            table.quoted_qualified_name(),
            col.ddl_fragment()
        ),
    };
    Ok(sql)
}

/// `alter table ... drop column`.
pub fn drop_col(table: &Table, key: &str) -> SqlResult<String> {
    let col = table
        .col_by_key(key)
        .ok_or_else(|| SqlError::unknown_column(table.name(), key))?;
    Ok(format!(
        "alter table {} drop column {}",
        table.quoted_qualified_name(),
        col.quoted_name()
    ))
}

/// `alter table ... add constraint ... foreign key ...`.
pub fn add_foreign_key(table: &Table, fk: &ForeignKey) -> String {
    format!(
        "alter table {} add {}",
        table.quoted_qualified_name(),
        fk.constraint_sql(table.dialect())
    )
}

/// Drop a foreign key. The verbs diverge: MySQL has `drop foreign key`,
/// SQL Server drops the constraint.
pub fn drop_foreign_key(table: &Table, name: &str) -> SqlResult<String> {
    let fk = table
        .foreign_key(name)
        .ok_or_else(|| SqlError::foreign_key(format!(
            "no foreign key named '{name}' on table '{}'",
            table.name()
        )))?;
    let dialect = table.dialect();
    let sql = match dialect {
        Dialect::MySql => format!(
            "alter table {} drop foreign key {}",
            table.quoted_qualified_name(),
            dialect.quote(fk.name())
        ),
        Dialect::MsSql => format!(
            "alter table {} drop constraint {}",
            table.quoted_qualified_name(),
            dialect.quote(fk.name())
        ),
    };
    Ok(sql)
}
