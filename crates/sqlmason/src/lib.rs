//! # sqlmason
//!
//! A dialect-aware SQL query builder and schema modeler for MySQL and
//! SQL Server.
//!
//! ## Features
//!
//! - **Schema first**: tables and columns are declared once and every
//!   statement is built against that metadata
//! - **Dialect aware**: one schema renders MySQL or SQL Server SQL; the
//!   migration table re-types columns when a schema moves between them
//! - **Parameterized by construction**: literal values never appear in
//!   statement text, only dialect placeholders backed by an ordered
//!   binding list
//! - **Composable where clauses**: conditions chain left to right, with
//!   sub-groups for explicit parenthesization
//! - **Joins as derived tables**: joined tables merge their column
//!   namespaces and render as aliased subqueries that can be joined again
//! - **DDL included**: `create table`, `alter table` and foreign key
//!   statements come from the same table metadata
//!
//! ## Building a query
//!
//! ```ignore
//! use sqlmason::{ColumnSpec, DataType, Dialect, Op, Schema, Table};
//!
//! let mut schema = Schema::new(Dialect::MySql);
//! let mut users = Table::new(Dialect::MySql, "users")?;
//! users.add_columns([
//!     ("user-id", ColumnSpec::new(DataType::Int).primary().auto_increment()),
//!     ("username", ColumnSpec::new(DataType::Varchar).size(50)),
//!     ("created-on", ColumnSpec::new(DataType::DateTime).default_value("now")),
//! ])?;
//! schema.add_table(users)?;
//!
//! let mut qb = schema.query();
//! qb.table("users")?
//!     .select_all()?
//!     .where_("username", Op::Eq, "alice")?
//!     .page(2, 25)?;
//!
//! assert_eq!(
//!     qb.sql(),
//!     "select * from `users` where `users`.`username` = ? limit 25 offset 25"
//! );
//! ```

pub mod ddl;
pub mod dialect;
pub mod error;
pub mod expr;
pub mod ident;
pub mod insert;
pub mod prelude;
pub mod query;
pub mod schema;
pub mod select;
pub mod value;
pub mod where_expr;

pub use dialect::Dialect;
pub use error::{SqlError, SqlResult};
pub use expr::{Condition, Expression, Logic, Op, Operand};
pub use insert::InsertBuilder;
pub use query::{QueryBuilder, QueryKind};
pub use schema::{
    Column, ColumnSpec, DataType, FkAction, FkLink, FkSpec, ForeignKey, JoinKind, JoinSide,
    JoinTable, Schema, Table,
};
pub use select::{Aggregate, SelectExpression, SortOrder};
pub use value::{Binding, DefaultCleaner, Value, ValueCleaner};
