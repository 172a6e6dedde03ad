//! Schema modeling: tables, columns, datatypes and foreign keys.
//!
//! A [`Schema`] is an insertion-ordered registry of [`Table`] definitions
//! sharing one dialect. Tables added with a different dialect are re-typed
//! through the migration table on the way in, so a schema is always
//! internally consistent. Foreign keys declared inline on a column spec stay
//! pending on the table until it joins a schema, which is the first point
//! the referenced table can be resolved.

pub mod column;
pub mod datatype;
pub mod foreign_key;
pub mod join;
pub mod table;

pub use column::{Column, ColumnSpec};
pub use datatype::{DataType, MSSQL_TYPES, MYSQL_TYPES};
pub use foreign_key::{FkAction, FkLink, FkSpec, ForeignKey};
pub use join::{JoinKind, JoinSide, JoinTable};
pub use table::Table;

use crate::dialect::Dialect;
use crate::error::{SqlError, SqlResult};
use crate::ident;
use crate::query::QueryBuilder;

/// A named (or anonymous) collection of table definitions.
#[derive(Debug, Clone)]
pub struct Schema {
    name: Option<String>,
    dialect: Dialect,
    tables: Vec<Table>,
}

impl Schema {
    /// Create an anonymous schema. Tables render unqualified.
    pub fn new(dialect: Dialect) -> Self {
        Self {
            name: None,
            dialect,
            tables: Vec::new(),
        }
    }

    /// Create a named schema. Tables added to it render as
    /// `schema.table`.
    pub fn named(dialect: Dialect, name: impl Into<String>) -> SqlResult<Self> {
        let name = name.into();
        ident::validate_key("schema name", &name)?;
        Ok(Self {
            name: Some(ident::normalize(&name)),
            dialect,
            tables: Vec::new(),
        })
    }

    /// Create an anonymous schema from a dialect name string.
    pub fn for_dialect(name: &str) -> SqlResult<Self> {
        Ok(Self::new(Dialect::parse(name)?))
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    pub fn has_table(&self, name: &str) -> bool {
        let name = ident::normalize(name);
        self.tables.iter().any(|t| t.name() == name)
    }

    /// Look up a table by name (normalized before comparison).
    pub fn table(&self, name: &str) -> SqlResult<&Table> {
        let normalized = ident::normalize(name);
        self.tables
            .iter()
            .find(|t| t.name() == normalized)
            .ok_or_else(|| SqlError::UnknownTable(name.to_string()))
    }

    pub fn table_mut(&mut self, name: &str) -> SqlResult<&mut Table> {
        let normalized = ident::normalize(name);
        self.tables
            .iter_mut()
            .find(|t| t.name() == normalized)
            .ok_or_else(|| SqlError::UnknownTable(name.to_string()))
    }

    /// Add a table. A table built for the other dialect is re-typed through
    /// [`Table::to_dialect`] first; pending inline foreign keys are resolved
    /// against the tables already present (self-references included) and
    /// validated all-or-nothing.
    pub fn add_table(&mut self, table: Table) -> SqlResult<&mut Self> {
        let mut table = if table.dialect() == self.dialect {
            table
        } else {
            table.to_dialect(self.dialect)?
        };
        if self.has_table(table.name()) {
            return Err(SqlError::invalid_identifier(
                "table name",
                table.name(),
                "already present in schema",
            ));
        }
        if let Some(schema) = &self.name {
            table.set_schema_name(schema.clone());
        }

        let pending = std::mem::take(&mut table.pending_fks);
        for spec in pending {
            let source_name = ident::normalize(&spec.table);
            let fk = if source_name == table.name() {
                let snapshot = table.clone();
                table.build_foreign_key(&snapshot, spec)?
            } else {
                let source = self
                    .tables
                    .iter()
                    .find(|t| t.name() == source_name)
                    .ok_or_else(|| SqlError::UnknownTable(spec.table.clone()))?;
                table.build_foreign_key(source, spec)?
            };
            table.push_foreign_key(fk);
        }

        self.tables.push(table);
        Ok(self)
    }

    pub fn remove_table(&mut self, name: &str) -> Option<Table> {
        let normalized = ident::normalize(name);
        let pos = self.tables.iter().position(|t| t.name() == normalized)?;
        Some(self.tables.remove(pos))
    }

    /// Start building a statement. The builder takes a clone of this schema,
    /// so nothing it does can touch the definitions here.
    pub fn query(&self) -> QueryBuilder {
        QueryBuilder::with_schema(self.clone())
    }

    /// Re-type the whole schema for another dialect.
    pub fn to_dialect(&self, target: Dialect) -> SqlResult<Schema> {
        if target == self.dialect {
            return Ok(self.clone());
        }
        let mut schema = Schema {
            name: self.name.clone(),
            dialect: target,
            tables: Vec::new(),
        };
        for table in &self.tables {
            let mut migrated = table.to_dialect(target)?;
            if let Some(name) = &schema.name {
                migrated.set_schema_name(name.clone());
            }
            schema.tables.push(migrated);
        }
        Ok(schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn users(dialect: Dialect) -> Table {
        let mut t = Table::new(dialect, "users").unwrap();
        t.add_columns([
            ("id", ColumnSpec::new(DataType::Int).primary()),
            ("username", ColumnSpec::new(DataType::Varchar).size(50)),
        ])
        .unwrap();
        t
    }

    #[test]
    fn lookup_by_normalized_name() {
        let mut schema = Schema::new(Dialect::MySql);
        schema.add_table(users(Dialect::MySql)).unwrap();
        assert!(schema.table("users").is_ok());
        assert!(matches!(
            schema.table("missing").unwrap_err(),
            SqlError::UnknownTable(_)
        ));
    }

    #[test]
    fn from_dialect_name() {
        let schema = Schema::for_dialect("MSSQL").unwrap();
        assert_eq!(schema.dialect(), Dialect::MsSql);
        assert!(schema.name().is_none());
        assert!(matches!(
            Schema::for_dialect("postgres").unwrap_err(),
            SqlError::UnsupportedDialect(_)
        ));
    }

    #[test]
    fn rejects_duplicate_table() {
        let mut schema = Schema::new(Dialect::MySql);
        schema.add_table(users(Dialect::MySql)).unwrap();
        let err = schema.add_table(users(Dialect::MySql)).unwrap_err();
        assert!(err.is_invalid_identifier());
    }

    #[test]
    fn named_schema_qualifies_tables() {
        let mut schema = Schema::named(Dialect::MySql, "app").unwrap();
        schema.add_table(users(Dialect::MySql)).unwrap();
        assert_eq!(
            schema.table("users").unwrap().quoted_qualified_name(),
            "`app`.`users`"
        );
    }

    #[test]
    fn mismatched_dialect_is_migrated_on_add() {
        let mut mssql_table = Table::new(Dialect::MsSql, "notes").unwrap();
        mssql_table
            .add_column("body", ColumnSpec::new(DataType::NVarchar))
            .unwrap();
        let mut schema = Schema::new(Dialect::MySql);
        schema.add_table(mssql_table).unwrap();
        assert_eq!(
            schema
                .table("notes")
                .unwrap()
                .col_by_key("body")
                .unwrap()
                .datatype(),
            DataType::Text
        );
    }

    #[test]
    fn inline_fk_resolves_when_table_joins_schema() {
        let mut schema = Schema::new(Dialect::MySql);
        schema.add_table(users(Dialect::MySql)).unwrap();

        let mut posts = Table::new(Dialect::MySql, "posts").unwrap();
        posts
            .add_column("id", ColumnSpec::new(DataType::Int).primary())
            .unwrap();
        posts
            .add_column(
                "author-id",
                ColumnSpec::new(DataType::Int).references(
                    FkSpec::new("users", "id")
                        .name("fk-post-author")
                        .on_delete(FkAction::Cascade),
                ),
            )
            .unwrap();
        schema.add_table(posts).unwrap();

        let fk = schema
            .table("posts")
            .unwrap()
            .foreign_key("fk-post-author")
            .unwrap();
        assert_eq!(fk.source_table(), "users");
        assert_eq!(fk.links()[0].name, "author_id");
        assert_eq!(fk.on_delete(), Some(FkAction::Cascade));
    }

    #[test]
    fn inline_fk_to_missing_table_rejects_the_add() {
        let mut schema = Schema::new(Dialect::MySql);
        let mut posts = Table::new(Dialect::MySql, "posts").unwrap();
        posts
            .add_column(
                "author-id",
                ColumnSpec::new(DataType::Int).references(FkSpec::new("users", "id")),
            )
            .unwrap();
        let err = schema.add_table(posts).unwrap_err();
        assert!(matches!(err, SqlError::UnknownTable(_)));
        assert!(!schema.has_table("posts"));
    }

    #[test]
    fn self_referencing_fk() {
        let mut schema = Schema::new(Dialect::MySql);
        let mut cats = Table::new(Dialect::MySql, "categories").unwrap();
        cats.add_column("id", ColumnSpec::new(DataType::Int).primary())
            .unwrap();
        cats.add_column(
            "parent-id",
            ColumnSpec::new(DataType::Int)
                .nullable(true)
                .references(FkSpec::new("categories", "id").name("fk-cat-parent")),
        )
        .unwrap();
        schema.add_table(cats).unwrap();
        let fk = schema
            .table("categories")
            .unwrap()
            .foreign_key("fk-cat-parent")
            .unwrap();
        assert_eq!(fk.source_table(), "categories");
    }

    #[test]
    fn schema_migration_preserves_tables() {
        let mut schema = Schema::new(Dialect::MySql);
        schema.add_table(users(Dialect::MySql)).unwrap();
        let ms = schema.to_dialect(Dialect::MsSql).unwrap();
        assert_eq!(ms.table_count(), 1);
        assert_eq!(ms.dialect(), Dialect::MsSql);
        assert_eq!(ms.table("users").unwrap().dialect(), Dialect::MsSql);
    }
}
