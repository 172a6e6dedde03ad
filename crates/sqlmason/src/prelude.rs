//! Convenient imports for typical `sqlmason` usage.
//!
//! This module is intentionally small and focused on the most common APIs so
//! examples can start with:
//!
//! ```ignore
//! use sqlmason::prelude::*;
//! ```

pub use crate::{
    Aggregate, Column, ColumnSpec, DataType, Dialect, FkAction, FkSpec, JoinKind, Logic, Op,
    QueryBuilder, QueryKind, Schema, SortOrder, SqlError, SqlResult, Table, Value,
};
