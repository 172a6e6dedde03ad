//! The select-list and clause accumulator.
//!
//! One [`SelectExpression`] lives on the query builder for the statement
//! currently being built: it owns the ordered select map, the `group by` and
//! `order by` maps (keyed by column key, so re-adding a key overwrites) and
//! the `where` tree. [`SelectExpression::clear`] resets it between
//! independent statements.

use serde::{Deserialize, Serialize};

use crate::expr::Expression;
use crate::schema::{Column, JoinTable, Table};
use crate::where_expr::WhereExpr;

/// An aggregate function wrapped around a selected column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregate {
    Max,
    Min,
    Sum,
    Avg,
    Count,
}

impl Aggregate {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Max => "max",
            Self::Min => "min",
            Self::Sum => "sum",
            Self::Avg => "avg",
            Self::Count => "count",
        }
    }
}

impl std::fmt::Display for Aggregate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sort direction, normalized from the first character of a caller token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    /// `"desc"`, `"DESC"`, `"d"`, `"Descending"` all come out [`Desc`];
    /// anything else is [`Asc`].
    ///
    /// [`Desc`]: Self::Desc
    /// [`Asc`]: Self::Asc
    pub fn from_token(token: &str) -> Self {
        match token.trim().chars().next() {
            Some('d') | Some('D') => Self::Desc,
            _ => Self::Asc,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

impl std::fmt::Display for SortOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a select entry renders: a column or a free expression.
#[derive(Debug, Clone)]
enum SelectItem {
    Col(Column),
    Expr(Expression),
}

#[derive(Debug, Clone)]
struct SelectEntry {
    key: String,
    item: SelectItem,
    alias: Option<String>,
    aggregate: Option<Aggregate>,
}

impl SelectEntry {
    fn render(&self) -> String {
        let base = match &self.item {
            SelectItem::Col(col) => col.select_name(),
            SelectItem::Expr(expr) => expr.to_string(),
        };
        let base = match self.aggregate {
            Some(agg) => format!("{agg}({base})"),
            None => base,
        };
        match &self.alias {
            Some(alias) => format!("{base} as {alias}"),
            None => base,
        }
    }

    fn owner(&self) -> Option<&str> {
        match &self.item {
            SelectItem::Col(col) => col.owner(),
            SelectItem::Expr(_) => None,
        }
    }
}

/// Accumulated select state for one statement.
#[derive(Debug, Clone, Default)]
pub struct SelectExpression {
    entries: Vec<SelectEntry>,
    group_by: Vec<Column>,
    order_by: Vec<(Column, SortOrder)>,
    where_expr: WhereExpr,
}

impl SelectExpression {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset between independent statements.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.group_by.clear();
        self.order_by.clear();
        self.where_expr = WhereExpr::new();
    }

    /// Whether the select map is empty (renders `*`).
    pub fn is_select_all(&self) -> bool {
        self.entries.is_empty()
    }

    /// Record a column in the select map. Re-adding a key replaces the
    /// earlier entry in place.
    pub fn add_column(&mut self, col: Column, alias: Option<String>, aggregate: Option<Aggregate>) {
        let entry = SelectEntry {
            key: col.key().to_string(),
            item: SelectItem::Col(col),
            alias,
            aggregate,
        };
        match self.entries.iter_mut().find(|e| e.key == entry.key) {
            Some(slot) => *slot = entry,
            None => self.entries.push(entry),
        }
    }

    /// Record a free expression in the select map.
    pub fn add_expression(&mut self, key: impl Into<String>, expr: Expression, alias: Option<String>) {
        let entry = SelectEntry {
            key: key.into(),
            item: SelectItem::Expr(expr),
            alias,
            aggregate: None,
        };
        match self.entries.iter_mut().find(|e| e.key == entry.key) {
            Some(slot) => *slot = entry,
            None => self.entries.push(entry),
        }
    }

    /// The rendered select list; `*` when the map is empty.
    pub fn cols_str(&self) -> String {
        if self.entries.is_empty() {
            return "*".to_string();
        }
        self.entries
            .iter()
            .map(SelectEntry::render)
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Rendered entries split by which side of `join` owns them. Entries
    /// owned by the right table land in the second list; everything else
    /// (left side and free expressions) in the first.
    pub fn partition_for_join(&self, join: &JoinTable) -> (Vec<String>, Vec<String>) {
        let mut left = Vec::new();
        let mut right = Vec::new();
        for entry in &self.entries {
            if entry.owner() == Some(join.right_name()) {
                right.push(entry.render());
            } else {
                left.push(entry.render());
            }
        }
        (left, right)
    }

    /// All rendered entries, in order. Used to capture a side's select list
    /// when it becomes half of a join.
    pub fn rendered_entries(&self) -> Vec<String> {
        self.entries.iter().map(SelectEntry::render).collect()
    }

    // ==================== group by / order by ====================

    /// Add a `group by` column; re-adding a key overwrites.
    pub fn group_by(&mut self, col: Column) {
        match self.group_by.iter_mut().find(|c| c.key() == col.key()) {
            Some(slot) => *slot = col,
            None => self.group_by.push(col),
        }
    }

    /// Add an `order by` column; re-adding a key overwrites direction too.
    pub fn order_by(&mut self, col: Column, order: SortOrder) {
        match self
            .order_by
            .iter_mut()
            .find(|(c, _)| c.key() == col.key())
        {
            Some(slot) => *slot = (col, order),
            None => self.order_by.push((col, order)),
        }
    }

    pub fn has_order(&self) -> bool {
        !self.order_by.is_empty()
    }

    /// The ` group by ...` clause, empty when no columns were added.
    pub fn group_sql(&self) -> String {
        if self.group_by.is_empty() {
            return String::new();
        }
        let cols = self
            .group_by
            .iter()
            .map(|c| c.select_name())
            .collect::<Vec<_>>()
            .join(", ");
        format!(" group by {cols}")
    }

    /// The ` order by ...` clause, empty when no columns were added.
    pub fn order_sql(&self) -> String {
        if self.order_by.is_empty() {
            return String::new();
        }
        let cols = self
            .order_by
            .iter()
            .map(|(c, o)| format!("{} {o}", c.select_name()))
            .collect::<Vec<_>>()
            .join(", ");
        format!(" order by {cols}")
    }

    // ==================== where ====================

    pub fn where_mut(&mut self) -> &mut WhereExpr {
        &mut self.where_expr
    }

    pub fn where_sql(&self) -> String {
        self.where_expr.render()
    }

    // ==================== statement heads ====================

    /// `select [top n ]{cols} from {table}` for a plain table. `top` is the
    /// SQL Server limit form; MySQL passes `None` and appends `limit`.
    pub fn select_from(&self, table: &Table, top: Option<u64>) -> String {
        format!(
            "select {}{} from {}",
            top_prefix(top),
            self.cols_str(),
            table.quoted_qualified_name()
        )
    }

    /// The select head for a join: columns are pushed into the derived
    /// subquery (partitioned left/right, each empty side becoming that
    /// side's `*`) and the outer select reads `*` from the aliased derived
    /// table.
    pub fn select_from_join(&self, join: &JoinTable, top: Option<u64>) -> String {
        let (left, right) = self.partition_for_join(join);
        format!(
            "select {}* from {}",
            top_prefix(top),
            join.derived_table(&left, &right)
        )
    }
}

fn top_prefix(top: Option<u64>) -> String {
    match top {
        Some(n) => format!("top {n} "),
        None => String::new(),
    }
}
