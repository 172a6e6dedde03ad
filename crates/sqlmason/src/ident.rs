//! Identifier validation and normalization.
//!
//! Table names, column keys and constraint names are validated before they
//! ever reach rendered SQL. Column keys are the logical, dash-separated
//! handles used throughout the builder API (`'user-id'`); the stored
//! database name is derived from the key by [`normalize`] unless an explicit
//! name override is given.
//!
//! - Keys and table names: letters, digits, dash and space, non-empty.
//! - Constraint (foreign key) names: same set, but must not start with a digit.

use crate::error::{SqlError, SqlResult};

/// Validate a table name or column key.
///
/// `kind` names what is being validated ("table name", "column key", ...)
/// and is carried into the error.
pub fn validate_key(kind: &str, value: &str) -> SqlResult<()> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(SqlError::invalid_identifier(kind, value, "cannot be empty"));
    }
    for c in trimmed.chars() {
        if !(c.is_ascii_alphanumeric() || c == '-' || c == ' ') {
            return Err(SqlError::invalid_identifier(
                kind,
                value,
                format!("character '{c}' is not allowed"),
            ));
        }
    }
    Ok(())
}

/// Validate a constraint name. Same character set as [`validate_key`] with
/// a leading digit rejected.
pub fn validate_constraint_name(kind: &str, value: &str) -> SqlResult<()> {
    validate_key(kind, value)?;
    if value
        .trim()
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_digit())
    {
        return Err(SqlError::invalid_identifier(
            kind,
            value,
            "cannot start with a digit",
        ));
    }
    Ok(())
}

/// Validate an explicit database-name override. Unlike logical keys these
/// are stored verbatim, so the character set is the plain identifier one:
/// letters, digits and underscore.
pub fn validate_db_name(kind: &str, value: &str) -> SqlResult<()> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(SqlError::invalid_identifier(kind, value, "cannot be empty"));
    }
    for c in trimmed.chars() {
        if !(c.is_ascii_alphanumeric() || c == '_') {
            return Err(SqlError::invalid_identifier(
                kind,
                value,
                format!("character '{c}' is not allowed"),
            ));
        }
    }
    Ok(())
}

/// Derive the stored database name from a logical key: dashes and spaces
/// become underscores (`'user-id'` becomes `user_id`).
pub fn normalize(key: &str) -> String {
    key.trim()
        .chars()
        .map(|c| if c == '-' || c == ' ' { '_' } else { c })
        .collect()
}
