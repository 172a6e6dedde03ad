//! Database dialects.
//!
//! The dialect fixes everything syntax-level about rendered SQL: identifier
//! quoting, placeholder tokens, string-literal escaping and the fallback
//! text datatype used when a column is created implicitly.
//!
//! The set is closed. Everything else the crate does branches on [`Dialect`]
//! rather than on free-form strings.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{SqlError, SqlResult};
use crate::schema::DataType;

/// A supported SQL dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// MySQL / MariaDB: backtick quoting, `?` placeholders.
    MySql,
    /// Microsoft SQL Server: bracket quoting, numbered `@P{n}` placeholders.
    MsSql,
}

impl Dialect {
    /// Parse a dialect name. Accepts `mysql` and `mssql`, case-insensitive.
    pub fn parse(name: &str) -> SqlResult<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "mysql" => Ok(Self::MySql),
            "mssql" => Ok(Self::MsSql),
            _ => Err(SqlError::UnsupportedDialect(name.to_string())),
        }
    }

    /// The canonical lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MySql => "mysql",
            Self::MsSql => "mssql",
        }
    }

    /// Quote an identifier: backticks on MySQL, square brackets on SQL Server.
    pub fn quote(&self, name: &str) -> String {
        match self {
            Self::MySql => format!("`{name}`"),
            Self::MsSql => format!("[{name}]"),
        }
    }

    /// The placeholder token for the binding at 1-based position `index`.
    pub fn placeholder(&self, index: usize) -> String {
        match self {
            Self::MySql => "?".to_string(),
            Self::MsSql => format!("@P{index}"),
        }
    }

    /// Escape a string for embedding as a single-quoted SQL literal.
    /// Both dialects double embedded single quotes.
    pub fn escape_text(&self, value: &str) -> String {
        value.replace('\'', "''")
    }

    /// The datatype used when a column has to be invented from a text value.
    pub fn default_text_type(&self) -> DataType {
        match self {
            Self::MySql => DataType::Varchar,
            Self::MsSql => DataType::NVarchar,
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
