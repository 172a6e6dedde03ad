//! Column metadata.
//!
//! A column is addressed by its logical key (`'user-id'`) everywhere in the
//! builder API; the stored database name (`user_id`) is derived from the key
//! unless explicitly overridden. Columns are value types: the query builder
//! works on clones, so statement construction never mutates a schema.

use std::fmt;
use std::sync::Arc;

use crate::dialect::Dialect;
use crate::error::{SqlError, SqlResult};
use crate::ident;
use crate::schema::datatype::DataType;
use crate::schema::foreign_key::FkSpec;
use crate::value::{DefaultCleaner, Value, ValueCleaner};

/// Declaration options for a column, one setter per recognized option.
#[derive(Clone)]
pub struct ColumnSpec {
    datatype: DataType,
    size: Option<u32>,
    scale: Option<u32>,
    primary: bool,
    unique: bool,
    auto_increment: bool,
    auto_update: bool,
    nullable: bool,
    default: Option<Value>,
    name: Option<String>,
    comment: Option<String>,
    with_table_prefix: bool,
    cleaner: Option<Arc<dyn ValueCleaner>>,
    pub(crate) fk: Option<FkSpec>,
}

impl ColumnSpec {
    pub fn new(datatype: DataType) -> Self {
        Self {
            datatype,
            size: None,
            scale: None,
            primary: false,
            unique: false,
            auto_increment: false,
            auto_update: false,
            nullable: false,
            default: None,
            name: None,
            comment: None,
            with_table_prefix: false,
            cleaner: None,
            fk: None,
        }
    }

    pub fn size(mut self, size: u32) -> Self {
        self.size = Some(size);
        self
    }

    pub fn scale(mut self, scale: u32) -> Self {
        self.scale = Some(scale);
        self
    }

    /// Mark as (part of) the primary key. Primary columns are never
    /// nullable, whatever the `nullable` setting says.
    pub fn primary(mut self) -> Self {
        self.primary = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// MySQL `auto_increment` / SQL Server `identity(1, 1)`.
    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    /// Refresh this temporal column to the current moment on `update`
    /// statements that do not set it explicitly.
    pub fn auto_update(mut self) -> Self {
        self.auto_update = true;
        self
    }

    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// Declared default. Temporal columns accept the `now` keyword family
    /// here; inserts resolve it when the statement is built.
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Override the derived database name.
    pub fn db_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Qualify this column with its table name when rendered in select
    /// lists.
    pub fn with_table_prefix(mut self) -> Self {
        self.with_table_prefix = true;
        self
    }

    /// Inject a custom cleaner applied to every value bound against this
    /// column.
    pub fn cleaner(mut self, cleaner: Arc<dyn ValueCleaner>) -> Self {
        self.cleaner = Some(cleaner);
        self
    }

    /// Declare a foreign key from this column. The owning side of the
    /// spec's first pair is filled in with this column's key.
    pub fn references(mut self, fk: FkSpec) -> Self {
        self.fk = Some(fk);
        self
    }
}

impl fmt::Debug for ColumnSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnSpec")
            .field("datatype", &self.datatype)
            .field("size", &self.size)
            .field("primary", &self.primary)
            .field("nullable", &self.nullable)
            .finish_non_exhaustive()
    }
}

/// A column attached to (or detached from) a table.
#[derive(Clone)]
pub struct Column {
    key: String,
    name: String,
    dialect: Dialect,
    datatype: DataType,
    size: Option<u32>,
    scale: Option<u32>,
    nullable: bool,
    primary: bool,
    unique: bool,
    auto_increment: bool,
    auto_update: bool,
    default: Option<Value>,
    comment: Option<String>,
    alias: Option<String>,
    with_table_prefix: bool,
    cleaner: Option<Arc<dyn ValueCleaner>>,
    owner: Option<String>,
    prev_owner: Option<String>,
    index: Option<usize>,
}

impl Column {
    /// Create a detached column.
    pub fn new(dialect: Dialect, key: impl Into<String>, datatype: DataType) -> SqlResult<Self> {
        Self::from_spec(dialect, key, ColumnSpec::new(datatype))
    }

    /// Create a detached column from a full spec.
    pub fn from_spec(
        dialect: Dialect,
        key: impl Into<String>,
        spec: ColumnSpec,
    ) -> SqlResult<Self> {
        let key = key.into();
        ident::validate_key("column key", &key)?;
        let key = key.trim().to_string();
        if !spec.datatype.supported_by(dialect) {
            return Err(SqlError::UnsupportedDatatype {
                column: key,
                datatype: spec.datatype.as_str().to_string(),
            });
        }
        let name = match spec.name {
            Some(name) => {
                ident::validate_db_name("column name", &name)?;
                name.trim().to_string()
            }
            None => ident::normalize(&key),
        };
        Ok(Self {
            key,
            name,
            dialect,
            datatype: spec.datatype,
            size: spec.size,
            scale: spec.scale,
            nullable: spec.nullable && !spec.primary,
            primary: spec.primary,
            unique: spec.unique,
            auto_increment: spec.auto_increment,
            auto_update: spec.auto_update,
            default: spec.default,
            comment: spec.comment,
            alias: None,
            with_table_prefix: spec.with_table_prefix,
            cleaner: spec.cleaner,
            owner: None,
            prev_owner: None,
            index: None,
        })
    }

    /// Create a column whose datatype is inferred from a comparison value.
    /// Used when a `where` call names a key the table does not declare.
    pub(crate) fn inferred(dialect: Dialect, key: &str, value: &Value) -> SqlResult<Self> {
        let datatype = match value {
            Value::Int(_) => DataType::Int,
            Value::Float(_) => DataType::Decimal,
            Value::Bool(_) => DataType::Boolean,
            Value::DateTime(_) => DataType::DateTime.translate(dialect),
            Value::Date(_) => DataType::Date.translate(dialect),
            Value::Time(_) => DataType::Time.translate(dialect),
            _ => dialect.default_text_type(),
        };
        Column::new(dialect, key, datatype)
    }

    // ==================== Accessors ====================

    pub fn key(&self) -> &str {
        &self.key
    }

    /// The stored database name (normalized key unless overridden).
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn datatype(&self) -> DataType {
        self.datatype
    }

    pub fn size(&self) -> Option<u32> {
        self.size
    }

    pub fn scale(&self) -> Option<u32> {
        self.scale
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn is_primary(&self) -> bool {
        self.primary
    }

    pub fn is_unique(&self) -> bool {
        self.unique
    }

    pub fn is_auto_increment(&self) -> bool {
        self.auto_increment
    }

    pub fn is_auto_update(&self) -> bool {
        self.auto_update
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    pub fn with_table_prefix(&self) -> bool {
        self.with_table_prefix
    }

    /// Name of the owning table, when attached.
    pub fn owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    /// Name of the table this column last belonged to, kept for diagnostics
    /// after a detach.
    pub fn prev_owner(&self) -> Option<&str> {
        self.prev_owner.as_deref()
    }

    /// Ordinal position within the owning table, `None` when detached.
    pub fn index(&self) -> Option<usize> {
        self.index
    }

    // ==================== Mutators ====================

    /// Change the datatype; rejected if the dialect does not support it.
    pub fn set_datatype(&mut self, datatype: DataType) -> SqlResult<()> {
        if !datatype.supported_by(self.dialect) {
            return Err(SqlError::UnsupportedDatatype {
                column: self.key.clone(),
                datatype: datatype.as_str().to_string(),
            });
        }
        self.datatype = datatype;
        Ok(())
    }

    pub fn set_name(&mut self, name: impl Into<String>) -> SqlResult<()> {
        let name = name.into();
        ident::validate_db_name("column name", &name)?;
        self.name = name.trim().to_string();
        Ok(())
    }

    /// Set nullability. Silently ignored on primary key columns, which are
    /// never nullable.
    pub fn set_nullable(&mut self, nullable: bool) {
        if !self.primary {
            self.nullable = nullable;
        }
    }

    /// Mark as (part of) the primary key; forces the column non-nullable.
    pub fn set_primary(&mut self, primary: bool) {
        self.primary = primary;
        if primary {
            self.nullable = false;
        }
    }

    pub fn set_unique(&mut self, unique: bool) {
        self.unique = unique;
    }

    pub fn set_default(&mut self, value: impl Into<Value>) {
        self.default = Some(value.into());
    }

    pub fn set_comment(&mut self, comment: impl Into<String>) {
        self.comment = Some(comment.into());
    }

    pub fn set_alias(&mut self, alias: impl Into<String>) -> SqlResult<()> {
        let alias = alias.into();
        ident::validate_db_name("column alias", &alias)?;
        self.alias = Some(alias.trim().to_string());
        Ok(())
    }

    pub fn set_with_table_prefix(&mut self, with_prefix: bool) {
        self.with_table_prefix = with_prefix;
    }

    pub fn set_cleaner(&mut self, cleaner: Arc<dyn ValueCleaner>) {
        self.cleaner = Some(cleaner);
    }

    pub(crate) fn set_key(&mut self, key: impl Into<String>) {
        self.key = key.into();
    }

    pub(crate) fn attach(&mut self, owner: impl Into<String>, index: usize) {
        self.owner = Some(owner.into());
        self.index = Some(index);
    }

    pub(crate) fn detach(&mut self) {
        self.prev_owner = self.owner.take();
        self.index = None;
    }

    pub(crate) fn set_index(&mut self, index: usize) {
        self.index = Some(index);
    }

    // ==================== Rendering ====================

    /// The quoted database name.
    pub fn quoted_name(&self) -> String {
        self.dialect.quote(&self.name)
    }

    /// The owner-qualified quoted name (`` `users`.`user_id` ``), falling
    /// back to the bare quoted name for detached columns.
    pub fn prefixed_name(&self) -> String {
        match &self.owner {
            Some(owner) => format!("{}.{}", self.dialect.quote(owner), self.quoted_name()),
            None => self.quoted_name(),
        }
    }

    /// The name as it appears in a select list, honoring the table-prefix
    /// flag.
    pub fn select_name(&self) -> String {
        if self.with_table_prefix {
            self.prefixed_name()
        } else {
            self.quoted_name()
        }
    }

    /// Run a raw value through this column's cleaner.
    pub fn clean(&self, value: Value) -> Value {
        match &self.cleaner {
            Some(cleaner) => cleaner.clean(value),
            None => DefaultCleaner::new(self.datatype).clean(value),
        }
    }

    /// The column definition fragment used inside `create table` and
    /// `alter table add`.
    pub fn ddl_fragment(&self) -> String {
        let type_name = self.datatype.sql_name(self.dialect);
        let suffix = self
            .datatype
            .size_suffix(self.dialect, self.size, self.scale);
        let mut sql = match self.dialect {
            Dialect::MySql => format!("{} {type_name}{suffix}", self.quoted_name()),
            Dialect::MsSql => format!("{} [{type_name}]{suffix}", self.quoted_name()),
        };

        if self.dialect == Dialect::MsSql && self.auto_increment {
            sql.push_str(" identity(1, 1)");
        }
        sql.push_str(if self.nullable { " null" } else { " not null" });
        if let Some(default) = &self.default {
            if default.is_now_keyword() && self.datatype.is_temporal() {
                match self.dialect {
                    Dialect::MySql => sql.push_str(" default current_timestamp"),
                    Dialect::MsSql => sql.push_str(" default getdate()"),
                }
            } else {
                sql.push_str(&format!(" default {}", default.sql_literal(self.dialect)));
            }
        }
        if self.dialect == Dialect::MySql {
            if self.auto_update && self.datatype.is_temporal() {
                sql.push_str(" on update current_timestamp");
            }
            if self.auto_increment {
                sql.push_str(" auto_increment");
            }
        }
        if self.unique {
            sql.push_str(" unique");
        }
        if self.dialect == Dialect::MySql {
            if let Some(comment) = &self.comment {
                sql.push_str(&format!(" comment '{}'", self.dialect.escape_text(comment)));
            }
        }
        sql
    }
}

impl fmt::Debug for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Column")
            .field("key", &self.key)
            .field("name", &self.name)
            .field("dialect", &self.dialect)
            .field("datatype", &self.datatype)
            .field("nullable", &self.nullable)
            .field("primary", &self.primary)
            .field("owner", &self.owner)
            .field("index", &self.index)
            .finish_non_exhaustive()
    }
}
