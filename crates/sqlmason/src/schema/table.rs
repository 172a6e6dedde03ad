//! Table metadata.
//!
//! Columns live in insertion order; every lookup is by logical key. Foreign
//! keys declared inline on a [`ColumnSpec`] stay pending until the table
//! joins a [`Schema`](crate::schema::Schema), which is the first point the
//! referenced table can be resolved; [`Table::add_foreign_key`] with an
//! explicit source table validates immediately. Either way validation is
//! all-or-nothing: a failing foreign key leaves the table untouched.

use crate::dialect::Dialect;
use crate::error::{SqlError, SqlResult};
use crate::ident;
use crate::schema::column::{Column, ColumnSpec};
use crate::schema::foreign_key::{FkLink, FkSpec, ForeignKey};

/// An in-memory table definition.
#[derive(Debug, Clone)]
pub struct Table {
    name: String,
    old_name: Option<String>,
    dialect: Dialect,
    columns: Vec<Column>,
    foreign_keys: Vec<ForeignKey>,
    comment: Option<String>,
    schema: Option<String>,
    pub(crate) pending_fks: Vec<FkSpec>,
}

impl Table {
    pub fn new(dialect: Dialect, name: impl Into<String>) -> SqlResult<Self> {
        let name = name.into();
        ident::validate_key("table name", &name)?;
        Ok(Self {
            name: ident::normalize(&name),
            old_name: None,
            dialect,
            columns: Vec::new(),
            foreign_keys: Vec::new(),
            comment: None,
            schema: None,
            pending_fks: Vec::new(),
        })
    }

    // ==================== Accessors ====================

    /// The normalized table name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The name this table had before the last rename.
    pub fn old_name(&self) -> Option<&str> {
        self.old_name.as_deref()
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    /// Name of the owning schema, when attached.
    pub fn schema_name(&self) -> Option<&str> {
        self.schema.as_deref()
    }

    pub fn cols(&self) -> &[Column] {
        &self.columns
    }

    pub fn col_keys(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.key()).collect()
    }

    pub fn col_count(&self) -> usize {
        self.columns.len()
    }

    pub fn col_by_key(&self, key: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.key() == key)
    }

    pub fn col_by_key_mut(&mut self, key: &str) -> Option<&mut Column> {
        self.columns.iter_mut().find(|c| c.key() == key)
    }

    pub fn col_by_name(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name() == name)
    }

    pub fn has_column(&self, key: &str) -> bool {
        self.col_by_key(key).is_some()
    }

    /// Columns flagged as primary, in declaration order.
    pub fn primary_cols(&self) -> Vec<&Column> {
        self.columns.iter().filter(|c| c.is_primary()).collect()
    }

    pub fn foreign_keys(&self) -> &[ForeignKey] {
        &self.foreign_keys
    }

    pub fn foreign_key(&self, name: &str) -> Option<&ForeignKey> {
        self.foreign_keys.iter().find(|fk| fk.name() == name)
    }

    /// The quoted table name, schema-qualified when attached to a named
    /// schema.
    pub fn quoted_qualified_name(&self) -> String {
        match &self.schema {
            Some(schema) => format!(
                "{}.{}",
                self.dialect.quote(schema),
                self.dialect.quote(&self.name)
            ),
            None => self.dialect.quote(&self.name),
        }
    }

    // ==================== Mutators ====================

    /// Rename the table; the previous name is retained and column owner
    /// references are updated.
    pub fn set_name(&mut self, name: impl Into<String>) -> SqlResult<()> {
        let name = name.into();
        ident::validate_key("table name", &name)?;
        let normalized = ident::normalize(&name);
        self.old_name = Some(std::mem::replace(&mut self.name, normalized));
        for (idx, col) in self.columns.iter_mut().enumerate() {
            col.attach(self.name.clone(), idx);
        }
        Ok(())
    }

    pub fn set_comment(&mut self, comment: impl Into<String>) {
        self.comment = Some(comment.into());
    }

    pub(crate) fn set_schema_name(&mut self, schema: impl Into<String>) {
        self.schema = Some(schema.into());
    }

    /// Add a column. Duplicate keys and duplicate normalized names are both
    /// rejected. A foreign key attached to the spec is kept pending until
    /// the table joins a schema.
    pub fn add_column(&mut self, key: impl Into<String>, spec: ColumnSpec) -> SqlResult<&mut Self> {
        let key = key.into();
        let mut spec = spec;
        let fk = spec.fk.take();
        let mut column = Column::from_spec(self.dialect, &key, spec)?;

        if self.has_column(column.key()) {
            return Err(SqlError::DuplicateColumn {
                table: self.name.clone(),
                key: column.key().to_string(),
            });
        }
        if self.col_by_name(column.name()).is_some() {
            return Err(SqlError::DuplicateColumn {
                table: self.name.clone(),
                key: column.name().to_string(),
            });
        }

        column.attach(self.name.clone(), self.columns.len());
        if let Some(mut fk) = fk {
            if let Some(first) = fk.columns.first_mut() {
                if first.0.is_empty() {
                    first.0 = column.key().to_string();
                }
            }
            self.pending_fks.push(fk);
        }
        self.columns.push(column);
        Ok(self)
    }

    /// Add several columns in order.
    pub fn add_columns(
        &mut self,
        columns: impl IntoIterator<Item = (impl Into<String>, ColumnSpec)>,
    ) -> SqlResult<&mut Self> {
        for (key, spec) in columns {
            self.add_column(key, spec)?;
        }
        Ok(self)
    }

    /// Remove a column by key. The returned column is detached: owner
    /// cleared (previous owner retained for diagnostics) and index reset.
    pub fn remove_col_by_key(&mut self, key: &str) -> Option<Column> {
        let pos = self.columns.iter().position(|c| c.key() == key)?;
        let mut removed = self.columns.remove(pos);
        removed.detach();
        for (idx, col) in self.columns.iter_mut().enumerate() {
            col.set_index(idx);
        }
        Some(removed)
    }

    /// Validate and add a foreign key referencing `source`. All pairs must
    /// resolve and match datatypes exactly, or nothing is added.
    pub fn add_foreign_key(&mut self, source: &Table, spec: FkSpec) -> SqlResult<&mut Self> {
        let fk = self.build_foreign_key(source, spec)?;
        self.foreign_keys.push(fk);
        Ok(self)
    }

    pub(crate) fn push_foreign_key(&mut self, fk: ForeignKey) {
        self.foreign_keys.push(fk);
    }

    pub fn remove_foreign_key(&mut self, name: &str) -> Option<ForeignKey> {
        let pos = self.foreign_keys.iter().position(|fk| fk.name() == name)?;
        Some(self.foreign_keys.remove(pos))
    }

    pub(crate) fn build_foreign_key(
        &self,
        source: &Table,
        spec: FkSpec,
    ) -> SqlResult<ForeignKey> {
        let name = match spec.name {
            Some(name) => name,
            None => match spec.columns.first() {
                Some((owning, _)) => {
                    format!("{}_{}_fk", self.name, ident::normalize(owning))
                }
                None => format!("{}_fk", self.name),
            },
        };
        ident::validate_constraint_name("foreign key name", &name)?;
        if self.foreign_key(&name).is_some() {
            return Err(SqlError::foreign_key(format!(
                "table '{}' already has a foreign key named '{name}'",
                self.name
            )));
        }
        if spec.columns.is_empty() {
            return Err(SqlError::foreign_key(format!(
                "foreign key '{name}' references no columns"
            )));
        }

        let mut links = Vec::with_capacity(spec.columns.len());
        for (owning_key, source_key) in &spec.columns {
            if owning_key.is_empty() {
                return Err(SqlError::foreign_key(format!(
                    "foreign key '{name}': owning column not set; call `FkSpec::owning` \
                     or attach the spec with `ColumnSpec::references`"
                )));
            }
            let owning = self.col_by_key(owning_key).ok_or_else(|| {
                SqlError::foreign_key(format!(
                    "foreign key '{name}': no column '{owning_key}' in table '{}'",
                    self.name
                ))
            })?;
            let referenced = source.col_by_key(source_key).ok_or_else(|| {
                SqlError::foreign_key(format!(
                    "foreign key '{name}': no column '{source_key}' in table '{}'",
                    source.name
                ))
            })?;
            if owning.datatype() != referenced.datatype() {
                return Err(SqlError::foreign_key(format!(
                    "foreign key '{name}': datatype mismatch between '{}' ({}) and '{}' ({})",
                    owning.key(),
                    owning.datatype(),
                    referenced.key(),
                    referenced.datatype(),
                )));
            }
            links.push(FkLink {
                key: owning.key().to_string(),
                name: owning.name().to_string(),
                references: referenced.name().to_string(),
            });
        }

        Ok(ForeignKey {
            name,
            source_table: source.name.clone(),
            links,
            on_update: spec.on_update,
            on_delete: spec.on_delete,
        })
    }

    // ==================== Migration ====================

    /// Re-type this table for another dialect. Column count, keys, order
    /// and flags are preserved; each datatype goes through
    /// [`DataType::translate`](crate::schema::DataType::translate). Foreign
    /// keys carry over unchanged (their column names do not depend on the
    /// dialect).
    pub fn to_dialect(&self, target: Dialect) -> SqlResult<Table> {
        if target == self.dialect {
            return Ok(self.clone());
        }
        let mut table = Table::new(target, self.name.clone())?;
        table.comment = self.comment.clone();
        for col in &self.columns {
            let mut spec = ColumnSpec::new(col.datatype().translate(target))
                .nullable(col.is_nullable())
                .db_name(col.name());
            if let Some(size) = col.size() {
                spec = spec.size(size);
            }
            if let Some(scale) = col.scale() {
                spec = spec.scale(scale);
            }
            if col.is_primary() {
                spec = spec.primary();
            }
            if col.is_unique() {
                spec = spec.unique();
            }
            if col.is_auto_increment() {
                spec = spec.auto_increment();
            }
            if col.is_auto_update() {
                spec = spec.auto_update();
            }
            if let Some(default) = col.default_value() {
                spec = spec.default_value(default.clone());
            }
            if let Some(comment) = col.comment() {
                spec = spec.comment(comment);
            }
            if col.with_table_prefix() {
                spec = spec.with_table_prefix();
            }
            table.add_column(col.key(), spec)?;
        }
        table.foreign_keys = self.foreign_keys.clone();
        table.pending_fks = self.pending_fks.clone();
        Ok(table)
    }
}
