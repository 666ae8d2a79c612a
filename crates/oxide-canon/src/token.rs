//! Canonical token shapes.
//!
//! Canonical SQL is ordinary SQL text in which every table, field and
//! parameter reference has been rewritten into one of three markers:
//!
//! | Marker            | Meaning                                   |
//! |-------------------|-------------------------------------------|
//! | `{COMMAND#name}`  | table `name` used by statement `COMMAND`  |
//! | `[name]`          | field, alias or otherwise quoted name     |
//! | `{name}`          | bound parameter                           |

use std::fmt;
use std::str::FromStr;

use crate::error::SqlError;

/// The statement kind that owns a table reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// `SELECT ... FROM name`
    Select,
    /// `... JOIN name`
    Join,
    /// `INSERT INTO name`
    Insert,
    /// `UPDATE name`
    Update,
    /// `DELETE FROM name`
    Delete,
    /// `CREATE TABLE|VIEW name`
    Create,
    /// `DROP TABLE|VIEW name`
    Drop,
    /// `ALTER TABLE|VIEW name`
    Alter,
}

impl Command {
    /// Returns the upper-case keyword used inside the token.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Select => "SELECT",
            Self::Join => "JOIN",
            Self::Insert => "INSERT",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
            Self::Create => "CREATE",
            Self::Drop => "DROP",
            Self::Alter => "ALTER",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Command {
    type Err = SqlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "SELECT" => Ok(Self::Select),
            "JOIN" => Ok(Self::Join),
            "INSERT" => Ok(Self::Insert),
            "UPDATE" => Ok(Self::Update),
            "DELETE" => Ok(Self::Delete),
            "CREATE" => Ok(Self::Create),
            "DROP" => Ok(Self::Drop),
            "ALTER" => Ok(Self::Alter),
            other => Err(SqlError::syntax(format!("unknown table command `{other}`"))),
        }
    }
}

/// A `{COMMAND#name}` table reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableToken {
    /// The statement kind.
    pub command: Command,
    /// The table name, possibly schema-qualified (`dbo.users`).
    pub name: String,
}

impl TableToken {
    /// Creates a table token.
    pub fn new(command: Command, name: impl Into<String>) -> Self {
        Self {
            command,
            name: name.into(),
        }
    }

    /// Parses a `{COMMAND#name}` marker.
    #[must_use]
    pub fn parse(marker: &str) -> Option<Self> {
        let inner = marker.strip_prefix('{')?.strip_suffix('}')?;
        let (command, name) = inner.split_once('#')?;
        if name.is_empty() || !command.chars().all(|c| c.is_ascii_alphabetic()) {
            return None;
        }
        Some(Self::new(command.parse().ok()?, name))
    }
}

impl fmt::Display for TableToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}#{}}}", self.command, self.name)
    }
}

/// Renders a `[name]` field token.
#[must_use]
pub fn field_token(name: &str) -> String {
    format!("[{name}]")
}

/// Renders a `{name}` parameter token.
#[must_use]
pub fn parameter_token(name: &str) -> String {
    format!("{{{name}}}")
}

/// Parses a `{name}` parameter marker, returning the name.
#[must_use]
pub fn parse_parameter(marker: &str) -> Option<&str> {
    let name = marker.strip_prefix('{')?.strip_suffix('}')?;
    is_parameter_name(name).then_some(name)
}

/// Returns whether `name` is a legal parameter name.
///
/// Parameter names match `[A-Za-z0-9_][A-Za-z0-9_@]*`.
#[must_use]
pub fn is_parameter_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphanumeric() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '@')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_round_trip_is_case_insensitive() {
        assert_eq!("select".parse::<Command>().unwrap(), Command::Select);
        assert_eq!("Join".parse::<Command>().unwrap(), Command::Join);
        assert!("merge".parse::<Command>().is_err());
    }

    #[test]
    fn test_table_token_display() {
        let token = TableToken::new(Command::Delete, "users");
        assert_eq!(token.to_string(), "{DELETE#users}");
    }

    #[test]
    fn test_parse_markers() {
        assert_eq!(
            TableToken::parse("{join#dbo.orders}"),
            Some(TableToken::new(Command::Join, "dbo.orders"))
        );
        assert_eq!(TableToken::parse("{MERGE#t}"), None);
        assert_eq!(TableToken::parse("{id}"), None);
        assert_eq!(parse_parameter("{id}"), Some("id"));
        assert_eq!(parse_parameter("{SELECT#t}"), None);
        assert_eq!(parse_parameter("{fn NOW()}"), None);
    }

    #[test]
    fn test_field_and_parameter_tokens() {
        assert_eq!(field_token("name"), "[name]");
        assert_eq!(parameter_token("id"), "{id}");
    }

    #[test]
    fn test_parameter_name_rules() {
        assert!(is_parameter_name("id"));
        assert!(is_parameter_name("1"));
        assert!(is_parameter_name("_a@b"));
        assert!(!is_parameter_name("@a"));
        assert!(!is_parameter_name(""));
        assert!(!is_parameter_name("a-b"));
    }
}
