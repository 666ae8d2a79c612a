//! Word lists driving the positional heuristics.

/// Reserved words, builtin names usable without parentheses, aggregate
/// names and data types. None of these is ever tagged as an identifier.
const RESERVED: &[&str] = &[
    "ADD", "AFTER", "ALL", "ALTER", "AND", "ANY", "APPLY", "AS", "ASC", "AUTOINCREMENT",
    "AUTO_INCREMENT", "AVG", "BEGIN", "BETWEEN", "BIGINT", "BIGSERIAL", "BINARY", "BIT", "BLOB",
    "BOOL", "BOOLEAN", "BOTH", "BREAK", "BY", "BYTEA", "CASCADE", "CASE", "CAST", "CHAR",
    "CHARSET", "CHECK", "CLOB", "COLLATE", "COLUMN", "COMMIT", "CONSTRAINT", "CONTINUE",
    "CONVERT", "COUNT", "CREATE", "CROSS", "CURRENT_DATE", "CURRENT_TIME", "CURRENT_TIMESTAMP",
    "CURRENT_USER", "DATETIME", "DATETIME2", "DATETIMEOFFSET", "DECIMAL", "DECLARE", "DEFAULT",
    "DELETE", "DESC", "DISTINCT", "DIV", "DOUBLE", "DROP", "DUAL", "ELSE", "END", "ENGINE",
    "ESCAPE", "EXCEPT", "EXEC", "EXECUTE", "EXISTS", "FALSE", "FETCH", "FIRST", "FLOAT", "FOR",
    "FOREIGN", "FROM", "FULL", "GLOB", "GO", "GROUP", "HAVING", "IDENTITY", "IDENTITY_INSERT",
    "IF", "ILIKE", "IMAGE", "IN", "INDEX", "INNER", "INSERT", "INT", "INTEGER", "INTERSECT",
    "INTO", "IS", "JOIN", "JSONB", "KEY", "LAST", "LATERAL", "LEADING", "LEFT", "LIKE", "LIMIT",
    "LONGTEXT", "MATCHED", "MAX", "MEDIUMINT", "MEDIUMTEXT", "MERGE", "MIN", "MOD", "MONEY",
    "NATURAL", "NCHAR", "NCLOB", "NEXT", "NOCOUNT", "NOT", "NTEXT", "NULL", "NULLS", "NUMBER",
    "NUMERIC", "NVARCHAR", "NVARCHAR2", "OF", "OFFSET", "ON", "ONLY", "OR", "ORDER", "OUTER",
    "OVER", "PARTITION", "PERCENT", "PIVOT", "PRECISION", "PRIMARY", "PROCEDURE", "REAL",
    "REFERENCES", "REGEXP", "REPLACE", "RETURN", "RETURNING", "RIGHT", "ROLLBACK", "ROW",
    "ROWNUM", "ROWS", "SELECT", "SERIAL", "SET", "SMALLDATETIME", "SMALLINT", "SOME", "SUM",
    "SYSDATE", "TABLE", "TEMP", "TEMPORARY", "THEN", "TIES", "TINYINT", "TINYTEXT", "TO", "TOP",
    "TRAILING", "TRANSACTION", "TRIGGER", "TRUE", "TRUNCATE", "UNION", "UNIQUE",
    "UNIQUEIDENTIFIER", "UNPIVOT", "UNSIGNED", "UPDATE", "USING", "VALUES", "VARBINARY",
    "VARCHAR", "VARCHAR2", "VIEW", "WHEN", "WHERE", "WHILE", "WITH", "XML", "XOR",
];

/// Returns true if `word` is never an identifier.
pub(super) fn is_keyword(word: &str) -> bool {
    RESERVED.iter().any(|k| k.eq_ignore_ascii_case(word))
}

/// Calls whose `FROM` is not a table source.
pub(super) const NON_SOURCE_CALLS: &[&str] =
    &["EXTRACT", "SUBSTRING", "SUBSTR", "TRIM", "POSITION", "OVERLAY"];

/// Calls whose first argument is a date part keyword, not a column.
pub(super) const DATE_PART_CALLS: &[&str] =
    &["DATEPART", "DATEADD", "DATEDIFF", "DATENAME", "DATE_PART", "EXTRACT"];

/// Calls whose `AS` introduces a type, not an alias.
pub(super) const TYPE_CALLS: &[&str] = &["CAST", "TRY_CAST", "CONVERT", "TRY_CONVERT"];

/// Leading words of table-level entries in a `CREATE TABLE` column list.
pub(super) const CONSTRAINT_WORDS: &[&str] = &[
    "PRIMARY", "CONSTRAINT", "UNIQUE", "FOREIGN", "KEY", "CHECK", "INDEX", "PERIOD",
];

/// Keywords after which a bare word is a field reference.
pub(super) const FIELD_AFTER_WORDS: &[&str] = &[
    "SELECT", "DISTINCT", "SET", "CASE", "WHEN", "THEN", "ELSE", "BY", "WHERE", "AND", "OR",
    "BETWEEN", "ON", "NOT", "HAVING", "LIKE", "ILIKE", "RETURNING", "COLUMN", "AFTER",
];

/// Keywords before which a bare word is a field reference.
pub(super) const FIELD_BEFORE_WORDS: &[&str] = &[
    "AND", "OR", "THEN", "ELSE", "END", "WHEN", "IS", "IN", "LIKE", "ILIKE", "NOT", "BETWEEN",
    "ASC", "DESC", "FROM", "AS", "WHERE", "GROUP", "ORDER", "HAVING", "UNION", "EXCEPT",
    "INTERSECT", "LIMIT", "OFFSET", "FETCH", "INNER", "LEFT", "RIGHT", "FULL", "CROSS", "JOIN",
    "ON", "SET", "COLLATE", "NULLS", "INTO", "RETURNING",
];

/// Keywords after which a bare word is a field whatever follows it.
pub(super) const FIELD_DEFINITION_WORDS: &[&str] = &["COLUMN", "AFTER"];

/// Operators and punctuation adjacent to field references.
pub(super) const FIELD_OPERATORS: &[&str] = &[
    "=", "<>", "!=", "<", ">", "<=", ">=", "+", "-", "*", "/", "%", "&", "|", "^", "||", "~",
];
