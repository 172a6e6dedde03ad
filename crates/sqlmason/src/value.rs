//! Bound values and value cleaning.
//!
//! Every literal that enters a statement goes through a [`ValueCleaner`]
//! and lands on the builder's ordered binding list; the statement text only
//! ever carries the dialect placeholder. [`Value::sql_literal`] is the
//! inline rendering used for display output and DDL defaults.

use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::dialect::Dialect;
use crate::schema::{Column, DataType};

/// Date format used when rendering and resolving date values.
pub const DATE_FORMAT: &str = "%Y-%m-%d";
/// Time format used when rendering and resolving time values.
pub const TIME_FORMAT: &str = "%H:%M:%S";
/// Datetime format used when rendering and resolving datetime values.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A typed SQL value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(NaiveDateTime),
}

impl Value {
    /// The value kind name, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Text(_) => "text",
            Self::Date(_) => "date",
            Self::Time(_) => "time",
            Self::DateTime(_) => "datetime",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Render as an inline SQL literal: quoted and escaped text, bare
    /// numbers, `1`/`0` booleans, quoted `%Y-%m-%d %H:%M:%S` datetimes.
    pub fn sql_literal(&self, dialect: Dialect) -> String {
        match self {
            Self::Null => "null".to_string(),
            Self::Bool(b) => if *b { "1" } else { "0" }.to_string(),
            Self::Int(i) => i.to_string(),
            Self::Float(f) => f.to_string(),
            Self::Text(s) => format!("'{}'", dialect.escape_text(s)),
            Self::Date(d) => format!("'{}'", d.format(DATE_FORMAT)),
            Self::Time(t) => format!("'{}'", t.format(TIME_FORMAT)),
            Self::DateTime(dt) => format!("'{}'", dt.format(DATETIME_FORMAT)),
        }
    }

    /// Whether a text value is one of the `now` keywords that temporal
    /// columns resolve at build time.
    pub fn is_now_keyword(&self) -> bool {
        match self {
            Self::Text(s) => matches!(
                s.trim().to_ascii_lowercase().as_str(),
                "now" | "now()" | "current_timestamp" | "current_timestamp()"
            ),
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

macro_rules! value_from_int {
    ($($t:ty),*) => {
        $(impl From<$t> for Value {
            fn from(v: $t) -> Self {
                Self::Int(v as i64)
            }
        })*
    };
}

value_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Self::Float(v as f64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Self::Date(v)
    }
}

impl From<NaiveTime> for Value {
    fn from(v: NaiveTime) -> Self {
        Self::Time(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Self::DateTime(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(inner) => inner.into(),
            None => Self::Null,
        }
    }
}

/// Cleans a raw value before it is bound to a statement.
///
/// Columns carry one of these; the default implementation resolves the
/// `now` keyword family for temporal columns. Custom cleaners can be
/// injected per column for domain-specific sanitation.
pub trait ValueCleaner: Send + Sync {
    fn clean(&self, value: Value) -> Value;
}

/// The stock cleaner for a given datatype.
#[derive(Debug, Clone, Copy)]
pub struct DefaultCleaner {
    datatype: DataType,
}

impl DefaultCleaner {
    pub fn new(datatype: DataType) -> Self {
        Self { datatype }
    }
}

impl ValueCleaner for DefaultCleaner {
    fn clean(&self, value: Value) -> Value {
        if self.datatype.is_temporal() && value.is_now_keyword() {
            return now_for(self.datatype);
        }
        value
    }
}

/// The current moment, shaped for `datatype`. Captured once per call, so
/// multi-row statements built in one go share the same timestamp.
pub(crate) fn now_for(datatype: DataType) -> Value {
    let now = Local::now().naive_local();
    match datatype {
        DataType::Date => Value::Date(now.date()),
        DataType::Time => Value::Time(now.time()),
        _ => Value::DateTime(now),
    }
}

/// One placeholder's worth of bound data: the column it belongs to (which
/// carries the datatype the driver needs) and the cleaned value.
#[derive(Debug, Clone)]
pub struct Binding {
    pub column: Column,
    pub value: Value,
}
