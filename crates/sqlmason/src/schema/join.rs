//! Synthetic join tables.
//!
//! A [`JoinTable`] stands in for the result of joining two tables: it merges
//! the column namespaces of both sides (key conflicts on the right side get a
//! `-right` key suffix and a `{name}_right` alias), derives a deterministic
//! `T{n}` alias, and accumulates `on` conditions with the same left-fold
//! discipline as the `where` tree.
//!
//! Rendering wraps the join as a derived subquery aliased to the join
//! table's own name; the select layer decides which columns land inside it.

use serde::{Deserialize, Serialize};

use crate::dialect::Dialect;
use crate::error::SqlResult;
use crate::expr::{Condition, Logic};
use crate::schema::column::Column;
use crate::schema::table::Table;

/// The join flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JoinKind {
    Inner,
    Left,
    Right,
}

impl JoinKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inner => "inner join",
            Self::Left => "left join",
            Self::Right => "right join",
        }
    }
}

impl std::fmt::Display for JoinKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The left operand of a join: a plain table or an earlier join.
#[derive(Debug, Clone)]
pub enum JoinSide {
    Plain(Table),
    Join(Box<JoinTable>),
}

/// A synthetic table representing `left {kind} right on ...`.
#[derive(Debug, Clone)]
pub struct JoinTable {
    dialect: Dialect,
    alias: String,
    kind: JoinKind,
    left: JoinSide,
    right: Table,
    on_chain: Option<Condition>,
    columns: Vec<Column>,
    left_cols: Vec<String>,
    left_where: String,
    sealed: Option<String>,
}

impl JoinTable {
    /// Join `left` to `right`. `left_cols` and `left_where` carry the select
    /// items and the rendered `where` fragment accumulated against the left
    /// side before the join was made.
    pub fn new(
        dialect: Dialect,
        left: JoinSide,
        right: Table,
        kind: JoinKind,
        left_cols: Vec<String>,
        left_where: String,
    ) -> SqlResult<Self> {
        let alias = next_alias(match &left {
            JoinSide::Plain(t) => t.name(),
            JoinSide::Join(j) => j.alias(),
        });

        let mut columns: Vec<Column> = match &left {
            JoinSide::Plain(t) => t.cols().to_vec(),
            JoinSide::Join(j) => j.columns.clone(),
        };
        for col in right.cols() {
            if columns.iter().any(|c| c.key() == col.key()) {
                let mut renamed = col.clone();
                renamed.set_key(format!("{}-right", col.key()));
                renamed.set_alias(format!("{}_right", col.name()))?;
                columns.push(renamed);
            } else {
                columns.push(col.clone());
            }
        }

        Ok(Self {
            dialect,
            alias,
            kind,
            left,
            right,
            on_chain: None,
            columns,
            left_cols,
            left_where,
            sealed: None,
        })
    }

    // ==================== Accessors ====================

    /// The generated `T{n}` alias, used as the derived table's name.
    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn kind(&self) -> JoinKind {
        self.kind
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn right(&self) -> &Table {
        &self.right
    }

    pub fn right_name(&self) -> &str {
        self.right.name()
    }

    /// Name of the left side: the table name, or the alias of a nested join.
    pub fn left_name(&self) -> &str {
        match &self.left {
            JoinSide::Plain(t) => t.name(),
            JoinSide::Join(j) => j.alias(),
        }
    }

    /// The merged column namespace, left side first.
    pub fn cols(&self) -> &[Column] {
        &self.columns
    }

    pub fn col_by_key(&self, key: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.key() == key)
    }

    /// Look a key up on the left side only.
    pub fn left_col(&self, key: &str) -> Option<&Column> {
        match &self.left {
            JoinSide::Plain(t) => t.col_by_key(key),
            JoinSide::Join(j) => j.col_by_key(key),
        }
    }

    /// Look a key up on the right side only.
    pub fn right_col(&self, key: &str) -> Option<&Column> {
        self.right.col_by_key(key)
    }

    /// The `where` fragment carried over from the left side's build.
    pub fn left_where(&self) -> &str {
        &self.left_where
    }

    pub(crate) fn fold_left_where(&mut self, fragment: &str) {
        if fragment.is_empty() {
            return;
        }
        if self.left_where.is_empty() {
            self.left_where = fragment.to_string();
        } else {
            self.left_where = format!("{} and {fragment}", self.left_where);
        }
    }

    // ==================== ON conditions ====================

    /// Fold one `on` condition onto the chain. Multiple calls join with
    /// `and`, insertion order preserved.
    pub fn add_join_condition(&mut self, cond: Condition) {
        self.on_chain = Some(match self.on_chain.take() {
            Some(existing) => Condition::fold(existing, cond, Logic::And),
            None => cond,
        });
    }

    pub fn on_sql(&self) -> Option<String> {
        self.on_chain.as_ref().map(|c| c.to_string())
    }

    // ==================== Rendering ====================

    /// The `left {kind} right on ...` expression, left side rendered as its
    /// sealed derived table when it is itself a join.
    pub fn from_clause(&self) -> String {
        let left = match &self.left {
            JoinSide::Plain(t) => t.quoted_qualified_name(),
            JoinSide::Join(j) => match &j.sealed {
                Some(sealed) => sealed.clone(),
                None => j.derived_table(&[], &[]),
            },
        };
        let mut sql = format!(
            "{left} {} {}",
            self.kind,
            self.dialect.quote(self.right.name())
        );
        if let Some(on) = self.on_sql() {
            sql.push_str(&format!(" on {on}"));
        }
        sql
    }

    /// The inner column list, composed from the left side's captured items
    /// plus the caller's partitioned items. An empty side selects that
    /// side's `*`; both empty selects a bare `*`.
    pub fn inner_cols(&self, extra_left: &[String], right_items: &[String]) -> String {
        let mut left: Vec<String> = self.left_cols.clone();
        left.extend(extra_left.iter().cloned());
        match (left.is_empty(), right_items.is_empty()) {
            (true, true) => "*".to_string(),
            (true, false) => format!(
                "{}.*, {}",
                self.dialect.quote(self.left_name()),
                right_items.join(", ")
            ),
            (false, true) => format!(
                "{}, {}.*",
                left.join(", "),
                self.dialect.quote(self.right.name())
            ),
            (false, false) => format!("{}, {}", left.join(", "), right_items.join(", ")),
        }
    }

    /// The full derived-table text: `(select ... from ...) as alias`.
    pub fn derived_table(&self, extra_left: &[String], right_items: &[String]) -> String {
        format!(
            "(select {} from {}) as {}",
            self.inner_cols(extra_left, right_items),
            self.from_clause(),
            self.dialect.quote(&self.alias)
        )
    }

    /// Freeze this join's derived-table text. Done when the join becomes the
    /// left side of a further join, so the columns chosen against it stop
    /// moving.
    pub(crate) fn seal(&mut self, text: String) {
        self.sealed = Some(text);
    }
}

fn next_alias(left_name: &str) -> String {
    if let Some(digits) = left_name.strip_prefix('T') {
        if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
            if let Ok(n) = digits.parse::<u32>() {
                return format!("T{}", n.saturating_add(1));
            }
        }
    }
    "T1".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Op;
    use crate::schema::column::ColumnSpec;
    use crate::schema::datatype::DataType;

    fn table(name: &str, keys: &[&str]) -> Table {
        let mut t = Table::new(Dialect::MySql, name).unwrap();
        for key in keys {
            t.add_column(*key, ColumnSpec::new(DataType::Int)).unwrap();
        }
        t
    }

    fn join(left: Table, right: Table, kind: JoinKind) -> JoinTable {
        JoinTable::new(
            Dialect::MySql,
            JoinSide::Plain(left),
            right,
            kind,
            Vec::new(),
            String::new(),
        )
        .unwrap()
    }

    #[test]
    fn alias_derivation() {
        assert_eq!(next_alias("hello"), "T1");
        assert_eq!(next_alias("T1"), "T2");
        assert_eq!(next_alias("T9"), "T10");
        assert_eq!(next_alias("Tx"), "T1");
        assert_eq!(next_alias("T"), "T1");
        assert_eq!(next_alias("T4294967295"), "T4294967295");
    }

    #[test]
    fn nested_join_increments_alias() {
        let j1 = join(table("a", &["id"]), table("b", &["bid"]), JoinKind::Inner);
        assert_eq!(j1.alias(), "T1");
        let j2 = JoinTable::new(
            Dialect::MySql,
            JoinSide::Join(Box::new(j1)),
            table("c", &["cid"]),
            JoinKind::Left,
            Vec::new(),
            String::new(),
        )
        .unwrap();
        assert_eq!(j2.alias(), "T2");
        assert_eq!(j2.left_name(), "T1");
    }

    #[test]
    fn conflicting_right_keys_are_suffixed() {
        let j = join(
            table("users", &["id", "name"]),
            table("roles", &["id", "label"]),
            JoinKind::Inner,
        );
        let keys: Vec<&str> = j.cols().iter().map(|c| c.key()).collect();
        assert_eq!(keys, vec!["id", "name", "id-right", "label"]);
        let renamed = j.col_by_key("id-right").unwrap();
        assert_eq!(renamed.alias(), Some("id_right"));
        assert_eq!(renamed.owner(), Some("roles"));
    }

    #[test]
    fn on_conditions_fold_with_and() {
        let mut j = join(table("a", &["id"]), table("b", &["aid"]), JoinKind::Inner);
        j.add_join_condition(Condition::compare("`a`.`id`", Op::Eq, "`b`.`aid`"));
        assert_eq!(j.on_sql().unwrap(), "`a`.`id` = `b`.`aid`");
        j.add_join_condition(Condition::compare("`a`.`id`", Op::Gt, "0"));
        assert_eq!(j.on_sql().unwrap(), "`a`.`id` = `b`.`aid` and `a`.`id` > 0");
    }

    #[test]
    fn from_clause_renders_join() {
        let mut j = join(table("a", &["id"]), table("b", &["aid"]), JoinKind::Left);
        j.add_join_condition(Condition::compare("`a`.`id`", Op::Eq, "`b`.`aid`"));
        assert_eq!(j.from_clause(), "`a` left join `b` on `a`.`id` = `b`.`aid`");
    }

    #[test]
    fn inner_cols_star_cases() {
        let j = join(table("a", &["id"]), table("b", &["aid"]), JoinKind::Inner);
        assert_eq!(j.inner_cols(&[], &[]), "*");
        assert_eq!(
            j.inner_cols(&[], &["`b`.`aid`".to_string()]),
            "`a`.*, `b`.`aid`"
        );
        assert_eq!(
            j.inner_cols(&["`a`.`id`".to_string()], &[]),
            "`a`.`id`, `b`.*"
        );
        assert_eq!(
            j.inner_cols(&["`a`.`id`".to_string()], &["`b`.`aid`".to_string()]),
            "`a`.`id`, `b`.`aid`"
        );
    }

    #[test]
    fn derived_table_wraps_and_aliases() {
        let mut j = join(table("a", &["id"]), table("b", &["aid"]), JoinKind::Inner);
        j.add_join_condition(Condition::compare("`a`.`id`", Op::Eq, "`b`.`aid`"));
        assert_eq!(
            j.derived_table(&[], &[]),
            "(select * from `a` inner join `b` on `a`.`id` = `b`.`aid`) as `T1`"
        );
    }
}
