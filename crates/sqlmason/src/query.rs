//! The statement orchestrator.
//!
//! A [`QueryBuilder`] drives one statement at a time against a clone of its
//! schema: `table()` activates a table (snapshotting the previous one, which
//! is what `join` consumes), a statement verb fixes the [`QueryKind`], and
//! the `where` family folds conditions into the select expression's tree.
//! Every mutation re-renders the statement eagerly, so [`QueryBuilder::sql`]
//! is free and returns identical text however often it is called.
//!
//! Literal values never reach the statement text: each one is cleaned by its
//! column, appended to the ordered binding list and represented by the
//! dialect's placeholder. [`QueryBuilder::inline_sql`] is the display form
//! that substitutes the bindings back in as escaped literals.

use serde::{Deserialize, Serialize};

use crate::ddl;
use crate::dialect::Dialect;
use crate::error::{SqlError, SqlResult};
use crate::expr::{Condition, Expression, Logic, Op};
use crate::insert::InsertBuilder;
use crate::schema::{Column, ColumnSpec, JoinKind, JoinSide, JoinTable, Schema, Table};
use crate::select::{Aggregate, SelectExpression, SortOrder};
use crate::value::{now_for, Binding, Value};

/// The kind of statement currently being built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QueryKind {
    Select,
    Insert,
    Update,
    Delete,
    CreateTable,
    AlterTable,
    DropTable,
}

impl QueryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Select => "select",
            Self::Insert => "insert",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::CreateTable => "create table",
            Self::AlterTable => "alter table",
            Self::DropTable => "drop table",
        }
    }

    /// Kinds the `where` family may extend.
    pub fn accepts_where(&self) -> bool {
        matches!(self, Self::Select | Self::Update | Self::Delete)
    }
}

impl std::fmt::Display for QueryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
enum ActiveTable {
    Plain(Table),
    Join(JoinTable),
}

/// Builds one SQL statement at a time.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    schema: Option<Schema>,
    dialect: Dialect,
    active: Option<ActiveTable>,
    previous: Option<ActiveTable>,
    select: SelectExpression,
    kind: Option<QueryKind>,
    head: String,
    limit: Option<u64>,
    offset: Option<u64>,
    bindings: Vec<Binding>,
    statement: String,
    group_depth: usize,
}

impl QueryBuilder {
    /// A builder with no schema attached; `table()` fails until one is set.
    pub fn new(dialect: Dialect) -> Self {
        Self {
            schema: None,
            dialect,
            active: None,
            previous: None,
            select: SelectExpression::new(),
            kind: None,
            head: String::new(),
            limit: None,
            offset: None,
            bindings: Vec::new(),
            statement: String::new(),
            group_depth: 0,
        }
    }

    /// A builder over a schema clone; this is what [`Schema::query`] hands
    /// out.
    pub fn with_schema(schema: Schema) -> Self {
        let mut qb = Self::new(schema.dialect());
        qb.schema = Some(schema);
        qb
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    // ==================== Table selection ====================

    /// Activate a table by name, snapshotting the previously active table
    /// (which is what a following `join` consumes) and resetting all
    /// statement state.
    pub fn table(&mut self, name: &str) -> SqlResult<&mut Self> {
        self.ensure_no_group("table")?;
        let schema = self.schema.as_ref().ok_or_else(|| {
            SqlError::MissingSchema(format!("cannot resolve table '{name}'"))
        })?;
        let table = schema.table(name)?.clone();
        self.previous = self.active.take();
        self.active = Some(ActiveTable::Plain(table));
        self.reset_statement();
        Ok(self)
    }

    /// Name of the active table: the table name, or the alias of a join.
    pub fn table_name(&self) -> Option<&str> {
        match &self.active {
            Some(ActiveTable::Plain(t)) => Some(t.name()),
            Some(ActiveTable::Join(j)) => Some(j.alias()),
            None => None,
        }
    }

    // ==================== Statement verbs ====================

    /// Start a `select *` statement.
    pub fn select_all(&mut self) -> SqlResult<&mut Self> {
        self.begin(QueryKind::Select, "select")?;
        self.rerender();
        Ok(self)
    }

    /// Start a select (or extend one already in progress, which is how
    /// columns are chosen against a join) naming specific columns. Unknown
    /// keys are auto-created with the dialect's default text type.
    pub fn select(&mut self, keys: &[&str]) -> SqlResult<&mut Self> {
        if self.kind != Some(QueryKind::Select) {
            self.begin(QueryKind::Select, "select")?;
        } else {
            self.ensure_no_group("select")?;
        }
        for key in keys {
            let col = self.resolve_col("select", key, None)?;
            self.select.add_column(col, None, None);
        }
        self.rerender();
        Ok(self)
    }

    /// Select one column with alias and/or aggregate decoration.
    pub fn select_col(
        &mut self,
        key: &str,
        alias: Option<&str>,
        aggregate: Option<Aggregate>,
    ) -> SqlResult<&mut Self> {
        if self.kind != Some(QueryKind::Select) {
            self.begin(QueryKind::Select, "select")?;
        } else {
            self.ensure_no_group("select")?;
        }
        let col = self.resolve_col("select", key, None)?;
        self.select
            .add_column(col, alias.map(str::to_string), aggregate);
        self.rerender();
        Ok(self)
    }

    /// Select a free expression under a key.
    pub fn select_expr(
        &mut self,
        key: &str,
        expr: impl Into<String>,
        alias: Option<&str>,
    ) -> SqlResult<&mut Self> {
        if self.kind != Some(QueryKind::Select) {
            self.begin(QueryKind::Select, "select")?;
        } else {
            self.ensure_no_group("select")?;
        }
        self.select
            .add_expression(key, Expression::new(expr), alias.map(str::to_string));
        self.rerender();
        Ok(self)
    }

    /// Start an `insert` statement for one keyed row, backfilling declared
    /// defaults.
    pub fn insert(&mut self, row: &[(&str, Value)]) -> SqlResult<&mut Self> {
        self.begin(QueryKind::Insert, "insert")?;
        let dialect = self.dialect;
        let (sql, bindings) = {
            let table = self.active_plain("insert")?;
            InsertBuilder::new(dialect, table).row(row)?.build()?
        };
        self.head = sql;
        self.bindings = bindings;
        self.rerender();
        Ok(self)
    }

    /// Start a multi-row `insert` statement from a column list and rows.
    pub fn insert_rows(&mut self, cols: &[&str], rows: Vec<Vec<Value>>) -> SqlResult<&mut Self> {
        self.begin(QueryKind::Insert, "insert")?;
        let dialect = self.dialect;
        let (sql, bindings) = {
            let table = self.active_plain("insert")?;
            InsertBuilder::new(dialect, table).rows(cols, rows)?.build()?
        };
        self.head = sql;
        self.bindings = bindings;
        self.rerender();
        Ok(self)
    }

    /// Start an `update` statement. Temporal columns flagged auto-update
    /// that the caller does not set are refreshed to the current moment.
    pub fn update(&mut self, pairs: &[(&str, Value)]) -> SqlResult<&mut Self> {
        if pairs.is_empty() {
            return Err(SqlError::EmptyValues("update with no assignments".into()));
        }
        self.begin(QueryKind::Update, "update")?;
        let qualified = self.active_plain("update")?.quoted_qualified_name();
        let mut sets = Vec::with_capacity(pairs.len());
        for (key, value) in pairs {
            let col = self.resolve_col("update", key, Some(value))?;
            let placeholder = self.bind(&col, value.clone());
            sets.push(format!("{} = {placeholder}", col.quoted_name()));
        }
        let refresh: Vec<Column> = self
            .active_plain("update")?
            .cols()
            .iter()
            .filter(|c| {
                c.is_auto_update()
                    && c.datatype().is_temporal()
                    && !pairs.iter().any(|(k, _)| *k == c.key())
            })
            .cloned()
            .collect();
        for col in refresh {
            let placeholder = self.bind(&col, now_for(col.datatype()));
            sets.push(format!("{} = {placeholder}", col.quoted_name()));
        }
        self.head = format!("update {qualified} set {}", sets.join(", "));
        self.rerender();
        Ok(self)
    }

    /// Start a `delete` statement.
    pub fn delete(&mut self) -> SqlResult<&mut Self> {
        self.begin(QueryKind::Delete, "delete")?;
        let qualified = self.active_plain("delete")?.quoted_qualified_name();
        self.head = format!("delete from {qualified}");
        self.rerender();
        Ok(self)
    }

    // ==================== Where family ====================

    /// Add `col op value`, joined to the chain with `and`.
    pub fn where_(&mut self, key: &str, op: Op, value: impl Into<Value>) -> SqlResult<&mut Self> {
        self.add_where(key, op, value.into(), Logic::And)
    }

    /// Add `col op value`, joined to the chain with `or`.
    pub fn or_where(&mut self, key: &str, op: Op, value: impl Into<Value>) -> SqlResult<&mut Self> {
        self.add_where(key, op, value.into(), Logic::Or)
    }

    fn add_where(&mut self, key: &str, op: Op, value: Value, logic: Logic) -> SqlResult<&mut Self> {
        self.ensure_where_allowed(op.as_str())?;
        if value.is_null() {
            return Err(SqlError::invalid_operator(
                op.as_str(),
                "null values have no ordering; use where_null / where_not_null",
            ));
        }
        let col = self.resolve_col("where", key, Some(&value))?;
        let placeholder = self.bind(&col, value);
        let cond = Condition::compare(col.prefixed_name(), op, placeholder);
        self.select.where_mut().add_condition(cond, logic);
        self.rerender();
        Ok(self)
    }

    /// Open a parenthesized sub-group, fill it inside the closure and attach
    /// it to the surrounding chain with `logic`. Statement verbs are not
    /// allowed while a group is open.
    pub fn where_group<F>(&mut self, logic: Logic, f: F) -> SqlResult<&mut Self>
    where
        F: FnOnce(&mut QueryBuilder) -> SqlResult<()>,
    {
        self.ensure_where_allowed("where_group")?;
        let token = self.select.where_mut().open_group();
        self.group_depth += 1;
        let result = f(self);
        self.group_depth -= 1;
        self.select.where_mut().close_group(token, logic);
        result?;
        self.rerender();
        Ok(self)
    }

    /// `col in(?, ...)`. The list must be non-empty.
    pub fn where_in(&mut self, key: &str, values: &[Value]) -> SqlResult<&mut Self> {
        self.add_where_in(key, values, false, Logic::And)
    }

    /// `col not in(?, ...)`.
    pub fn where_not_in(&mut self, key: &str, values: &[Value]) -> SqlResult<&mut Self> {
        self.add_where_in(key, values, true, Logic::And)
    }

    fn add_where_in(
        &mut self,
        key: &str,
        values: &[Value],
        negate: bool,
        logic: Logic,
    ) -> SqlResult<&mut Self> {
        let keyword = if negate { "not in" } else { "in" };
        self.ensure_where_allowed(keyword)?;
        if values.is_empty() {
            return Err(SqlError::EmptyValues(format!(
                "'{key}' {keyword}() with no values"
            )));
        }
        let col = self.resolve_col("where_in", key, values.first())?;
        let mut placeholders = Vec::with_capacity(values.len());
        for value in values {
            placeholders.push(self.bind(&col, value.clone()));
        }
        let expr = Expression::new(format!(
            "{} {keyword}({})",
            col.prefixed_name(),
            placeholders.join(", ")
        ));
        self.select.where_mut().add_expression(expr, logic);
        self.rerender();
        Ok(self)
    }

    /// `col between ? and ?`.
    pub fn where_between(
        &mut self,
        key: &str,
        low: impl Into<Value>,
        high: impl Into<Value>,
    ) -> SqlResult<&mut Self> {
        self.add_where_between(key, low.into(), high.into(), false, Logic::And)
    }

    /// `col not between ? and ?`.
    pub fn where_not_between(
        &mut self,
        key: &str,
        low: impl Into<Value>,
        high: impl Into<Value>,
    ) -> SqlResult<&mut Self> {
        self.add_where_between(key, low.into(), high.into(), true, Logic::And)
    }

    fn add_where_between(
        &mut self,
        key: &str,
        low: Value,
        high: Value,
        negate: bool,
        logic: Logic,
    ) -> SqlResult<&mut Self> {
        let keyword = if negate { "not between" } else { "between" };
        self.ensure_where_allowed(keyword)?;
        let col = self.resolve_col("where_between", key, Some(&low))?;
        let low_ph = self.bind(&col, low);
        let high_ph = self.bind(&col, high);
        let expr = Expression::new(format!(
            "{} {keyword} {low_ph} and {high_ph}",
            col.prefixed_name()
        ));
        self.select.where_mut().add_expression(expr, logic);
        self.rerender();
        Ok(self)
    }

    /// `col like ?`. The pattern must be a text value.
    pub fn where_like(&mut self, key: &str, pattern: impl Into<Value>) -> SqlResult<&mut Self> {
        self.add_where_like(key, pattern.into(), false, Logic::And)
    }

    /// `col not like ?`.
    pub fn where_not_like(&mut self, key: &str, pattern: impl Into<Value>) -> SqlResult<&mut Self> {
        self.add_where_like(key, pattern.into(), true, Logic::And)
    }

    fn add_where_like(
        &mut self,
        key: &str,
        pattern: Value,
        negate: bool,
        logic: Logic,
    ) -> SqlResult<&mut Self> {
        let keyword = if negate { "not like" } else { "like" };
        self.ensure_where_allowed(keyword)?;
        if !matches!(pattern, Value::Text(_)) {
            return Err(SqlError::invalid_operator(
                keyword,
                format!("requires a text pattern, got {}", pattern.kind()),
            ));
        }
        let col = self.resolve_col("where_like", key, Some(&pattern))?;
        let placeholder = self.bind(&col, pattern);
        let expr = Expression::new(format!("{} {keyword} {placeholder}", col.prefixed_name()));
        self.select.where_mut().add_expression(expr, logic);
        self.rerender();
        Ok(self)
    }

    /// `col is null`.
    pub fn where_null(&mut self, key: &str) -> SqlResult<&mut Self> {
        self.add_where_null(key, false, Logic::And)
    }

    /// `col is not null`.
    pub fn where_not_null(&mut self, key: &str) -> SqlResult<&mut Self> {
        self.add_where_null(key, true, Logic::And)
    }

    fn add_where_null(&mut self, key: &str, negate: bool, logic: Logic) -> SqlResult<&mut Self> {
        let keyword = if negate { "is not null" } else { "is null" };
        self.ensure_where_allowed(keyword)?;
        let col = self.resolve_col("where_null", key, None)?;
        let expr = Expression::new(format!("{} {keyword}", col.prefixed_name()));
        self.select.where_mut().add_expression(expr, logic);
        self.rerender();
        Ok(self)
    }

    /// Prefix match: `left(col, n) op ?`. Only `=` and `!=` apply.
    pub fn where_left(
        &mut self,
        key: &str,
        len: u32,
        op: Op,
        value: impl Into<Value>,
    ) -> SqlResult<&mut Self> {
        self.add_where_side("left", key, len, op, value.into())
    }

    /// Suffix match: `right(col, n) op ?`. Only `=` and `!=` apply.
    pub fn where_right(
        &mut self,
        key: &str,
        len: u32,
        op: Op,
        value: impl Into<Value>,
    ) -> SqlResult<&mut Self> {
        self.add_where_side("right", key, len, op, value.into())
    }

    fn add_where_side(
        &mut self,
        func: &str,
        key: &str,
        len: u32,
        op: Op,
        value: Value,
    ) -> SqlResult<&mut Self> {
        self.ensure_where_allowed(func)?;
        if !matches!(op, Op::Eq | Op::Ne) {
            return Err(SqlError::invalid_operator(
                op.as_str(),
                format!("only = and != apply to {func}() matching"),
            ));
        }
        if !matches!(value, Value::Text(_)) {
            return Err(SqlError::invalid_operator(
                func,
                format!("requires a text value, got {}", value.kind()),
            ));
        }
        let col = self.resolve_col(func, key, Some(&value))?;
        let placeholder = self.bind(&col, value);
        let expr = Expression::new(format!(
            "{func}({}, {len}) {op} {placeholder}",
            col.prefixed_name()
        ));
        self.select.where_mut().add_expression(expr, Logic::And);
        self.rerender();
        Ok(self)
    }

    // ==================== group by / order by / pagination ====================

    pub fn group_by(&mut self, key: &str) -> SqlResult<&mut Self> {
        self.ensure_kind(QueryKind::Select, "group_by")?;
        let col = self.resolve_col("group_by", key, None)?;
        self.select.group_by(col);
        self.rerender();
        Ok(self)
    }

    /// Order by a column. The direction token is normalized from its first
    /// character: anything starting with `d`/`D` is descending.
    pub fn order_by(&mut self, key: &str, direction: &str) -> SqlResult<&mut Self> {
        self.ensure_kind(QueryKind::Select, "order_by")?;
        let col = self.resolve_col("order_by", key, None)?;
        self.select.order_by(col, SortOrder::from_token(direction));
        self.rerender();
        Ok(self)
    }

    pub fn limit(&mut self, limit: u64) -> SqlResult<&mut Self> {
        self.ensure_kind(QueryKind::Select, "limit")?;
        self.limit = Some(limit);
        self.rerender();
        Ok(self)
    }

    pub fn offset(&mut self, offset: u64) -> SqlResult<&mut Self> {
        self.ensure_kind(QueryKind::Select, "offset")?;
        self.offset = Some(offset);
        self.rerender();
        Ok(self)
    }

    /// Pagination sugar: limit = `size`, offset = `(page - 1) * size`.
    /// Pages are 1-based; page 0 is treated as page 1.
    pub fn page(&mut self, page: u64, size: u64) -> SqlResult<&mut Self> {
        self.ensure_kind(QueryKind::Select, "page")?;
        self.limit = Some(size);
        self.offset = Some((page.max(1) - 1) * size);
        self.rerender();
        Ok(self)
    }

    // ==================== Joins ====================

    pub fn inner_join(&mut self, name: &str) -> SqlResult<&mut Self> {
        self.join_with(name, JoinKind::Inner)
    }

    pub fn left_join(&mut self, name: &str) -> SqlResult<&mut Self> {
        self.join_with(name, JoinKind::Left)
    }

    pub fn right_join(&mut self, name: &str) -> SqlResult<&mut Self> {
        self.join_with(name, JoinKind::Right)
    }

    /// Join the active build to `name`: the current table becomes the left
    /// side of a [`JoinTable`], carrying over the select items and `where`
    /// fragment accumulated against it, and the named table becomes the
    /// right side.
    pub fn join_with(&mut self, name: &str, kind: JoinKind) -> SqlResult<&mut Self> {
        self.ensure_no_group("join")?;
        self.ensure_kind(QueryKind::Select, "join")?;

        let captured_cols = self.select.rendered_entries();
        let captured_where = self.select.where_sql();
        // A left side that is itself a join gets its derived table frozen
        // with the columns chosen against it so far.
        let sealed = match &self.active {
            Some(ActiveTable::Join(j)) => {
                let (left, right) = self.select.partition_for_join(j);
                Some(j.derived_table(&left, &right))
            }
            _ => None,
        };

        let saved_bindings = std::mem::take(&mut self.bindings);
        self.table(name)?;
        self.bindings = saved_bindings;

        let right = match self.active.take() {
            Some(ActiveTable::Plain(t)) => t,
            _ => return Err(SqlError::sequence("join", "joined table must be plain")),
        };
        let (left_side, carried_where, carried_cols) = match self.previous.take() {
            Some(ActiveTable::Plain(t)) => (JoinSide::Plain(t), captured_where, captured_cols),
            Some(ActiveTable::Join(mut j)) => {
                if let Some(text) = sealed {
                    j.seal(text);
                }
                j.fold_left_where(&captured_where);
                let merged = j.left_where().to_string();
                (JoinSide::Join(Box::new(j)), merged, Vec::new())
            }
            None => return Err(SqlError::sequence("join", "no previous table to join")),
        };

        let join = JoinTable::new(
            self.dialect,
            left_side,
            right,
            kind,
            carried_cols,
            carried_where,
        )?;
        self.active = Some(ActiveTable::Join(join));
        self.kind = Some(QueryKind::Select);
        self.rerender();
        Ok(self)
    }

    /// `on left = right`, resolving each key on its own side of the join.
    pub fn on(&mut self, left_key: &str, right_key: &str) -> SqlResult<&mut Self> {
        self.on_op(left_key, Op::Eq, right_key)
    }

    /// `on left op right`.
    pub fn on_op(&mut self, left_key: &str, op: Op, right_key: &str) -> SqlResult<&mut Self> {
        let state = self.state_name();
        let join = match self.active.as_mut() {
            Some(ActiveTable::Join(j)) => j,
            _ => return Err(SqlError::sequence("on", state)),
        };
        let left = join
            .left_col(left_key)
            .cloned()
            .ok_or_else(|| SqlError::unknown_column(join.left_name(), left_key))?;
        let right = join
            .right_col(right_key)
            .cloned()
            .ok_or_else(|| SqlError::unknown_column(join.right_name(), right_key))?;
        join.add_join_condition(Condition::compare(
            left.prefixed_name(),
            op,
            right.prefixed_name(),
        ));
        self.rerender();
        Ok(self)
    }

    // ==================== DDL verbs ====================

    pub fn create_table(&mut self) -> SqlResult<&mut Self> {
        self.begin(QueryKind::CreateTable, "create_table")?;
        let sql = ddl::create_table(self.active_plain("create_table")?);
        self.head = sql;
        self.rerender();
        Ok(self)
    }

    pub fn drop_table(&mut self) -> SqlResult<&mut Self> {
        self.begin(QueryKind::DropTable, "drop_table")?;
        let sql = ddl::drop_table(self.active_plain("drop_table")?);
        self.head = sql;
        self.rerender();
        Ok(self)
    }

    pub fn add_col(&mut self, key: &str) -> SqlResult<&mut Self> {
        self.begin(QueryKind::AlterTable, "add_col")?;
        let sql = ddl::add_col(self.active_plain("add_col")?, key)?;
        self.head = sql;
        self.rerender();
        Ok(self)
    }

    pub fn drop_col(&mut self, key: &str) -> SqlResult<&mut Self> {
        self.begin(QueryKind::AlterTable, "drop_col")?;
        let sql = ddl::drop_col(self.active_plain("drop_col")?, key)?;
        self.head = sql;
        self.rerender();
        Ok(self)
    }

    /// `alter table add constraint` for a foreign key already declared on
    /// the table metadata.
    pub fn add_foreign_key(&mut self, name: &str) -> SqlResult<&mut Self> {
        self.begin(QueryKind::AlterTable, "add_foreign_key")?;
        let sql = {
            let table = self.active_plain("add_foreign_key")?;
            let fk = table.foreign_key(name).ok_or_else(|| {
                SqlError::foreign_key(format!(
                    "no foreign key named '{name}' on table '{}'",
                    table.name()
                ))
            })?;
            ddl::add_foreign_key(table, fk)
        };
        self.head = sql;
        self.rerender();
        Ok(self)
    }

    pub fn drop_foreign_key(&mut self, name: &str) -> SqlResult<&mut Self> {
        self.begin(QueryKind::AlterTable, "drop_foreign_key")?;
        let sql = ddl::drop_foreign_key(self.active_plain("drop_foreign_key")?, name)?;
        self.head = sql;
        self.rerender();
        Ok(self)
    }

    // ==================== Output ====================

    /// The rendered, placeholder-bearing statement. Literal values never
    /// appear here.
    pub fn sql(&self) -> &str {
        &self.statement
    }

    /// The ordered bindings, one per placeholder.
    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    pub fn last_kind(&self) -> Option<QueryKind> {
        self.kind
    }

    /// The display form: bindings substituted into the placeholders as
    /// escaped literals. For logs and tests, never for execution.
    pub fn inline_sql(&self) -> String {
        match self.dialect {
            Dialect::MySql => {
                let mut parts = self.statement.split('?');
                let mut out = String::with_capacity(self.statement.len());
                if let Some(first) = parts.next() {
                    out.push_str(first);
                }
                let mut bindings = self.bindings.iter();
                for part in parts {
                    match bindings.next() {
                        Some(b) => out.push_str(&b.value.sql_literal(self.dialect)),
                        None => out.push('?'),
                    }
                    out.push_str(part);
                }
                out
            }
            Dialect::MsSql => {
                // Highest index first so @P1 cannot eat the front of @P12.
                let mut out = self.statement.clone();
                for (idx, binding) in self.bindings.iter().enumerate().rev() {
                    out = out.replace(
                        &format!("@P{}", idx + 1),
                        &binding.value.sql_literal(self.dialect),
                    );
                }
                out
            }
        }
    }

    /// Drop all statement state, keeping the schema association.
    pub fn clear(&mut self) -> &mut Self {
        self.active = None;
        self.previous = None;
        self.reset_statement();
        self
    }

    // ==================== Internals ====================

    fn reset_statement(&mut self) {
        self.select.clear();
        self.kind = None;
        self.head.clear();
        self.limit = None;
        self.offset = None;
        self.bindings.clear();
        self.statement.clear();
        self.group_depth = 0;
    }

    fn begin(&mut self, kind: QueryKind, op: &str) -> SqlResult<()> {
        self.ensure_no_group(op)?;
        if self.active.is_none() {
            return Err(SqlError::sequence(op, "no table selected"));
        }
        self.select.clear();
        self.bindings.clear();
        self.head.clear();
        self.limit = None;
        self.offset = None;
        self.kind = Some(kind);
        Ok(())
    }

    fn state_name(&self) -> &'static str {
        match self.kind {
            Some(kind) => kind.as_str(),
            None => "empty",
        }
    }

    fn ensure_no_group(&self, op: &str) -> SqlResult<()> {
        if self.group_depth > 0 {
            return Err(SqlError::sequence(op, "open where-group"));
        }
        Ok(())
    }

    fn ensure_kind(&self, kind: QueryKind, op: &str) -> SqlResult<()> {
        if self.kind != Some(kind) {
            return Err(SqlError::sequence(op, self.state_name()));
        }
        Ok(())
    }

    fn ensure_where_allowed(&self, op: &str) -> SqlResult<()> {
        match self.kind {
            Some(kind) if kind.accepts_where() => Ok(()),
            _ => Err(SqlError::sequence(op, self.state_name())),
        }
    }

    fn active_plain(&self, op: &str) -> SqlResult<&Table> {
        match &self.active {
            Some(ActiveTable::Plain(t)) => Ok(t),
            Some(ActiveTable::Join(_)) => Err(SqlError::sequence(
                op,
                "a join table cannot be the statement target",
            )),
            None => Err(SqlError::sequence(op, "no table selected")),
        }
    }

    /// Resolve a key on the active table, auto-creating an unknown column
    /// on the builder's table clone with a datatype inferred from `value`
    /// (text fallback when there is none). Join namespaces never
    /// auto-create. The returned column renders table-prefixed.
    fn resolve_col(&mut self, op: &str, key: &str, value: Option<&Value>) -> SqlResult<Column> {
        let dialect = self.dialect;
        match self.active.as_mut() {
            Some(ActiveTable::Plain(table)) => {
                if table.col_by_key(key).is_none() {
                    let datatype = match value {
                        Some(v) => Column::inferred(dialect, key, v)?.datatype(),
                        None => dialect.default_text_type(),
                    };
                    table.add_column(key, ColumnSpec::new(datatype).nullable(true))?;
                }
                let mut col = table
                    .col_by_key(key)
                    .cloned()
                    .ok_or_else(|| SqlError::unknown_column(table.name(), key))?;
                col.set_with_table_prefix(true);
                Ok(col)
            }
            Some(ActiveTable::Join(join)) => {
                let mut col = join
                    .col_by_key(key)
                    .cloned()
                    .ok_or_else(|| SqlError::unknown_column(join.alias(), key))?;
                col.set_with_table_prefix(true);
                Ok(col)
            }
            None => Err(SqlError::sequence(op, "no table selected")),
        }
    }

    /// Clean a value through its column, append it to the binding list and
    /// hand back the placeholder that stands for it.
    fn bind(&mut self, col: &Column, value: Value) -> String {
        let cleaned = col.clean(value);
        let placeholder = self.dialect.placeholder(self.bindings.len() + 1);
        self.bindings.push(Binding {
            column: col.clone(),
            value: cleaned,
        });
        placeholder
    }

    fn rerender(&mut self) {
        self.statement = self.render_statement();
        #[cfg(feature = "tracing")]
        tracing::debug!(
            sql = %self.statement,
            bindings = self.bindings.len(),
            "statement rendered"
        );
    }

    fn render_statement(&self) -> String {
        let Some(kind) = self.kind else {
            return String::new();
        };
        match kind {
            QueryKind::Select => self.render_select(),
            QueryKind::Update | QueryKind::Delete => {
                let clause = self.select.where_sql();
                if clause.is_empty() {
                    self.head.clone()
                } else {
                    format!("{} where {clause}", self.head)
                }
            }
            _ => self.head.clone(),
        }
    }

    fn render_select(&self) -> String {
        let top = match self.dialect {
            Dialect::MsSql if self.offset.is_none() => self.limit,
            _ => None,
        };
        let (mut sql, clause) = match &self.active {
            Some(ActiveTable::Plain(table)) => (
                self.select.select_from(table, top),
                self.select.where_sql(),
            ),
            Some(ActiveTable::Join(join)) => (
                self.select.select_from_join(join, top),
                merge_and(join.left_where(), &self.select.where_sql()),
            ),
            None => return String::new(),
        };
        if !clause.is_empty() {
            sql.push_str(&format!(" where {clause}"));
        }
        sql.push_str(&self.select.group_sql());
        sql.push_str(&self.select.order_sql());
        match self.dialect {
            Dialect::MySql => {
                if let Some(limit) = self.limit {
                    sql.push_str(&format!(" limit {limit}"));
                    if let Some(offset) = self.offset {
                        sql.push_str(&format!(" offset {offset}"));
                    }
                }
            }
            Dialect::MsSql => {
                if let Some(offset) = self.offset {
                    if !self.select.has_order() {
                        sql.push_str(" order by (select null)");
                    }
                    sql.push_str(&format!(" offset {offset} rows"));
                    if let Some(limit) = self.limit {
                        sql.push_str(&format!(" fetch next {limit} rows only"));
                    }
                }
            }
        }
        sql
    }
}

fn merge_and(left: &str, right: &str) -> String {
    if left.is_empty() {
        right.to_string()
    } else if right.is_empty() {
        left.to_string()
    } else {
        format!("{left} and {right}")
    }
}
