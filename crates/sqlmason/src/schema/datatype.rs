//! Column datatypes and the cross-dialect translation table.
//!
//! One enum covers the union of both dialects' supported sets; a column is
//! only ever constructed with a type that its own dialect supports. The
//! translation table drives [`Table::to_dialect`](crate::schema::Table::to_dialect):
//! re-typing a table for the other dialect maps every column through
//! [`DataType::translate`], which keeps re-translated types inside the same
//! equivalence class (`text` and `nvarchar`, `blob` and `binary`, and so on).

use serde::{Deserialize, Serialize};

use crate::dialect::Dialect;

/// A column datatype. The union of the MySQL and SQL Server sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Int,
    BigInt,
    Char,
    NChar,
    Varchar,
    NVarchar,
    Text,
    MediumText,
    TinyBlob,
    Blob,
    MediumBlob,
    LongBlob,
    Binary,
    VarBinary,
    Date,
    Time,
    DateTime,
    DateTime2,
    Timestamp,
    Decimal,
    Double,
    Float,
    Money,
    Bit,
    Boolean,
}

/// Types accepted by MySQL columns.
pub const MYSQL_TYPES: &[DataType] = &[
    DataType::Int,
    DataType::Char,
    DataType::Varchar,
    DataType::Timestamp,
    DataType::TinyBlob,
    DataType::Blob,
    DataType::MediumBlob,
    DataType::LongBlob,
    DataType::DateTime,
    DataType::Text,
    DataType::MediumText,
    DataType::Decimal,
    DataType::Double,
    DataType::Float,
    DataType::Boolean,
    DataType::Bit,
];

/// Types accepted by SQL Server columns.
pub const MSSQL_TYPES: &[DataType] = &[
    DataType::Int,
    DataType::BigInt,
    DataType::Varchar,
    DataType::NVarchar,
    DataType::Char,
    DataType::NChar,
    DataType::Binary,
    DataType::VarBinary,
    DataType::Date,
    DataType::DateTime2,
    DataType::Time,
    DataType::Money,
    DataType::Bit,
    DataType::Decimal,
    DataType::Float,
    DataType::Boolean,
];

impl DataType {
    /// Whether `dialect` accepts this type on its columns.
    pub fn supported_by(&self, dialect: Dialect) -> bool {
        match dialect {
            Dialect::MySql => MYSQL_TYPES.contains(self),
            Dialect::MsSql => MSSQL_TYPES.contains(self),
        }
    }

    /// The canonical lowercase spelling.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Int => "int",
            Self::BigInt => "bigint",
            Self::Char => "char",
            Self::NChar => "nchar",
            Self::Varchar => "varchar",
            Self::NVarchar => "nvarchar",
            Self::Text => "text",
            Self::MediumText => "mediumtext",
            Self::TinyBlob => "tinyblob",
            Self::Blob => "blob",
            Self::MediumBlob => "mediumblob",
            Self::LongBlob => "longblob",
            Self::Binary => "binary",
            Self::VarBinary => "varbinary",
            Self::Date => "date",
            Self::Time => "time",
            Self::DateTime => "datetime",
            Self::DateTime2 => "datetime2",
            Self::Timestamp => "timestamp",
            Self::Decimal => "decimal",
            Self::Double => "double",
            Self::Float => "float",
            Self::Money => "money",
            Self::Bit => "bit",
            Self::Boolean => "boolean",
        }
    }

    /// The spelling used in DDL for `dialect`. Identical to [`Self::as_str`]
    /// except that SQL Server has no `boolean` keyword and renders it as `bit`.
    pub fn sql_name(&self, dialect: Dialect) -> &'static str {
        match (self, dialect) {
            (Self::Boolean, Dialect::MsSql) => "bit",
            _ => self.as_str(),
        }
    }

    /// The `(size)` / `(size, scale)` suffix for DDL, with the per-type
    /// fallbacks applied (`varchar` defaults to 255 characters, `char` and
    /// the binary types to 1).
    pub fn size_suffix(&self, dialect: Dialect, size: Option<u32>, scale: Option<u32>) -> String {
        match self {
            Self::Varchar | Self::NVarchar => format!("({})", size.unwrap_or(255)),
            Self::Char | Self::NChar | Self::Binary | Self::VarBinary => {
                format!("({})", size.unwrap_or(1))
            }
            Self::Decimal => match size {
                Some(s) => format!("({}, {})", s, scale.unwrap_or(0)),
                None => String::new(),
            },
            Self::Bit if dialect == Dialect::MySql => format!("({})", size.unwrap_or(1)),
            _ => String::new(),
        }
    }

    /// Map this type onto the closest type of `target`.
    pub fn translate(&self, target: Dialect) -> DataType {
        if self.supported_by(target) {
            return *self;
        }
        match target {
            Dialect::MsSql => match self {
                Self::Timestamp | Self::DateTime => Self::DateTime2,
                Self::TinyBlob | Self::Blob => Self::Binary,
                Self::MediumBlob | Self::LongBlob => Self::VarBinary,
                Self::Text | Self::MediumText => Self::NVarchar,
                Self::Double => Self::Float,
                other => *other,
            },
            Dialect::MySql => match self {
                Self::BigInt => Self::Int,
                Self::NVarchar => Self::Text,
                Self::NChar => Self::Char,
                Self::Binary => Self::Blob,
                Self::VarBinary => Self::MediumBlob,
                Self::Date | Self::DateTime2 | Self::Time => Self::DateTime,
                Self::Money => Self::Decimal,
                other => *other,
            },
        }
    }

    /// Character types (sized and unsized).
    pub fn is_text(&self) -> bool {
        matches!(
            self,
            Self::Char | Self::NChar | Self::Varchar | Self::NVarchar | Self::Text | Self::MediumText
        )
    }

    /// Date, time and datetime types.
    pub fn is_temporal(&self) -> bool {
        matches!(
            self,
            Self::Date | Self::Time | Self::DateTime | Self::DateTime2 | Self::Timestamp
        )
    }

    /// Numeric types, including money.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            Self::Int | Self::BigInt | Self::Decimal | Self::Double | Self::Float | Self::Money
        )
    }

    /// Boolean-valued types.
    pub fn is_boolean(&self) -> bool {
        matches!(self, Self::Bit | Self::Boolean)
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
