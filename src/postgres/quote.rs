//! PostgreSQL quoting for statements that cannot take bind parameters.
//!
//! DDL such as `CREATE ROLE` or `CREATE DATABASE` does not accept `$n`
//! placeholders, so externally supplied names and passwords are embedded as
//! quoted tokens instead.

/// Quote `name` as an identifier: wrap in double quotes and double any
/// embedded double quote. Input is cut at the first NUL byte, which the
/// server cannot represent.
#[must_use]
pub fn quote_identifier(name: &str) -> String {
    let name = truncate_at_nul(name);
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Quote `value` as a string literal: wrap in single quotes and double any
/// embedded single quote. Values containing backslashes use the `E'...'`
/// escape-string form with backslashes doubled, so the result reads the same
/// whatever `standard_conforming_strings` is set to.
#[must_use]
pub fn quote_literal(value: &str) -> String {
    let value = truncate_at_nul(value);
    let escaped = value.replace('\'', "''");
    if escaped.contains('\\') {
        format!(" E'{}'", escaped.replace('\\', "\\\\"))
    } else {
        format!("'{escaped}'")
    }
}

fn truncate_at_nul(s: &str) -> &str {
    match s.find('\0') {
        Some(idx) => &s[..idx],
        None => s,
    }
}
