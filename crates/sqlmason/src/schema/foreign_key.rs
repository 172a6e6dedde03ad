//! Foreign key constraints.

use serde::{Deserialize, Serialize};

use crate::dialect::Dialect;

/// A referential action for `on update` / `on delete`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FkAction {
    Cascade,
    Restrict,
    SetNull,
    SetDefault,
    NoAction,
}

impl FkAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cascade => "cascade",
            Self::Restrict => "restrict",
            Self::SetNull => "set null",
            Self::SetDefault => "set default",
            Self::NoAction => "no action",
        }
    }
}

impl std::fmt::Display for FkAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One owning-column to referenced-column pairing inside a foreign key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FkLink {
    /// Logical key of the owning column.
    pub key: String,
    /// Database name of the owning column.
    pub name: String,
    /// Database name of the referenced column.
    pub references: String,
}

/// A validated foreign key. Only [`Table::add_foreign_key`]
/// (crate::schema::Table::add_foreign_key) constructs these; validation is
/// all-or-nothing, so an instance always references columns that existed
/// with matching datatypes when it was added.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKey {
    pub(crate) name: String,
    pub(crate) source_table: String,
    pub(crate) links: Vec<FkLink>,
    pub(crate) on_update: Option<FkAction>,
    pub(crate) on_delete: Option<FkAction>,
}

impl ForeignKey {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Database name of the referenced table.
    pub fn source_table(&self) -> &str {
        &self.source_table
    }

    pub fn links(&self) -> &[FkLink] {
        &self.links
    }

    pub fn on_update(&self) -> Option<FkAction> {
        self.on_update
    }

    pub fn on_delete(&self) -> Option<FkAction> {
        self.on_delete
    }

    /// The `constraint ... foreign key ... references ...` fragment used by
    /// both `create table` and `alter table add`.
    pub fn constraint_sql(&self, dialect: Dialect) -> String {
        let owning = self
            .links
            .iter()
            .map(|l| dialect.quote(&l.name))
            .collect::<Vec<_>>()
            .join(", ");
        let referenced = self
            .links
            .iter()
            .map(|l| dialect.quote(&l.references))
            .collect::<Vec<_>>()
            .join(", ");
        let mut sql = format!(
            "constraint {} foreign key ({owning}) references {} ({referenced})",
            dialect.quote(&self.name),
            dialect.quote(&self.source_table),
        );
        if let Some(action) = self.on_update {
            sql.push_str(&format!(" on update {action}"));
        }
        if let Some(action) = self.on_delete {
            sql.push_str(&format!(" on delete {action}"));
        }
        sql
    }
}

/// Declaration-time description of a foreign key, attached to a
/// [`ColumnSpec`](crate::schema::ColumnSpec) or passed to
/// [`Table::add_foreign_key`](crate::schema::Table::add_foreign_key).
#[derive(Debug, Clone)]
pub struct FkSpec {
    pub(crate) table: String,
    pub(crate) columns: Vec<(String, String)>,
    pub(crate) name: Option<String>,
    pub(crate) on_update: Option<FkAction>,
    pub(crate) on_delete: Option<FkAction>,
}

impl FkSpec {
    /// Reference `column_key` of `table`. When attached to a column spec the
    /// owning side is the column being declared; additional pairs can be
    /// added with [`Self::and_column`].
    pub fn new(table: impl Into<String>, column_key: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: vec![(String::new(), column_key.into())],
            name: None,
            on_update: None,
            on_delete: None,
        }
    }

    /// Owning-table key for the first pair. Required when the spec is passed
    /// to `Table::add_foreign_key` directly; a spec attached via
    /// `ColumnSpec::references` gets the declaring column's key instead.
    pub fn owning(mut self, key: impl Into<String>) -> Self {
        if let Some(first) = self.columns.first_mut() {
            first.0 = key.into();
        }
        self
    }

    /// Pair `owning_key` of the owning table with `source_key` of the
    /// referenced table (composite keys).
    pub fn and_column(mut self, owning_key: impl Into<String>, source_key: impl Into<String>) -> Self {
        self.columns.push((owning_key.into(), source_key.into()));
        self
    }

    /// Constraint name. Derived from the owning table and column when not
    /// given.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn on_update(mut self, action: FkAction) -> Self {
        self.on_update = Some(action);
        self
    }

    pub fn on_delete(mut self, action: FkAction) -> Self {
        self.on_delete = Some(action);
        self
    }
}
