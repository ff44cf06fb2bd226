//! Backend-specific SQL spelling.

use std::fmt;

/// Relational backends the translator can target.
///
/// Identifier quoting is the only textual difference between them;
/// type-specific rewrites are registered separately on a `Backend`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    Sqlite,
    SqlServer,
}

impl Dialect {
    /// Quote an identifier, escaping embedded quote characters
    pub fn quote_identifier(&self, identifier: &str) -> String {
        match self {
            Dialect::Sqlite => format!("\"{}\"", identifier.replace('"', "\"\"")),
            Dialect::SqlServer => format!("[{}]", identifier.replace(']', "]]")),
        }
    }

    /// Quote `table.column`
    pub fn qualify(&self, table: &str, column: &str) -> String {
        format!(
            "{}.{}",
            self.quote_identifier(table),
            self.quote_identifier(column)
        )
    }

    /// Character that introduces a named parameter
    pub fn parameter_marker(&self) -> char {
        '@'
    }

    pub fn name(&self) -> &'static str {
        match self {
            Dialect::Sqlite => "sqlite",
            Dialect::SqlServer => "sqlserver",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
