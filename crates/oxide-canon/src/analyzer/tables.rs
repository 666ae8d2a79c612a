//! Table tagging: DDL targets, INSERT/UPDATE/DELETE targets and
//! `FROM`/`JOIN` sources.

use tracing::trace;

use crate::lexer::{Rewriter, Span, TokenKind, TokenStream};
use crate::token::{field_token, Command, TableToken};

use super::keywords::{is_keyword, CONSTRAINT_WORDS, NON_SOURCE_CALLS};

/// A table name, alias or other identifier located in the token stream.
#[derive(Debug)]
struct Ident {
    span: Span,
    text: String,
    last: usize,
    tagged: bool,
}

/// One entry of a `FROM` list or `JOIN` clause.
#[derive(Debug)]
struct TableEntry {
    /// `None` for a derived table.
    name: Option<Ident>,
    alias: Option<Ident>,
}

fn unquote(text: &str) -> String {
    text.strip_prefix('[')
        .and_then(|t| t.strip_suffix(']'))
        .map_or_else(|| text.to_string(), |t| t.replace("]]", "]"))
}

fn is_name_part(ts: &TokenStream<'_>, i: usize) -> bool {
    matches!(ts.kind(i), TokenKind::Word | TokenKind::Quoted)
}

/// Reads a possibly dotted table name starting at `i`.
///
/// An already tagged `{COMMAND#name}` marker is returned with `tagged` set.
/// With `allow_call` unset a name followed by `(` is a function call and is
/// rejected.
fn table_name_at(ts: &TokenStream<'_>, i: usize, allow_call: bool) -> Option<Ident> {
    if ts.kind(i) == TokenKind::Brace {
        let token = TableToken::parse(ts.text(i))?;
        return Some(Ident {
            span: ts.span(i),
            text: token.name,
            last: i,
            tagged: true,
        });
    }
    if !is_name_part(ts, i) || (ts.kind(i) == TokenKind::Word && is_keyword(ts.text(i))) {
        return None;
    }
    let mut parts = vec![unquote(ts.text(i))];
    let mut last = i;
    while last + 2 < ts.len() && ts.is_punct(last + 1, ".") && is_name_part(ts, last + 2) {
        last += 2;
        parts.push(unquote(ts.text(last)));
    }
    if !allow_call && ts.next_sig(last).is_some_and(|n| ts.is_punct(n, "(")) {
        return None;
    }
    Some(Ident {
        span: ts.span(i).to(ts.span(last)),
        text: parts.join("."),
        last,
        tagged: false,
    })
}

/// Reads an optional `[AS] alias` after token `after`.
fn alias_at(ts: &TokenStream<'_>, after: usize) -> Option<Ident> {
    let mut j = ts.next_sig(after)?;
    let explicit = ts.is_word(j, "AS");
    if explicit {
        j = ts.next_sig(j)?;
    }
    let tagged = match ts.kind(j) {
        TokenKind::Quoted => true,
        TokenKind::Word if explicit || !is_keyword(ts.text(j)) => false,
        _ => return None,
    };
    if ts.next_sig(j).is_some_and(|n| ts.is_punct(n, "(") || ts.is_punct(n, ".")) {
        return None;
    }
    Some(Ident {
        span: ts.span(j),
        text: unquote(ts.text(j)),
        last: j,
        tagged,
    })
}

/// Reads the comma-separated table list starting at `start`.
fn table_list(ts: &TokenStream<'_>, start: usize) -> Vec<TableEntry> {
    let mut entries = Vec::new();
    let mut j = start;
    loop {
        let (name, mut last) = if ts.is_punct(j, "(") {
            match ts.matching_close(j) {
                Some(close) => (None, close),
                None => break,
            }
        } else {
            match table_name_at(ts, j, false) {
                Some(name) => {
                    let last = name.last;
                    (Some(name), last)
                }
                None => break,
            }
        };
        let alias = alias_at(ts, last);
        if let Some(alias) = &alias {
            last = alias.last;
        }
        // Table hints: `WITH (NOLOCK)`.
        if let Some(w) = ts.next_sig(last).filter(|&w| ts.is_word(w, "WITH")) {
            if let Some(close) = ts
                .next_sig(w)
                .filter(|&o| ts.is_punct(o, "("))
                .and_then(|o| ts.matching_close(o))
            {
                last = close;
            }
        }
        entries.push(TableEntry { name, alias });
        match ts.next_sig(last) {
            Some(comma) if ts.is_punct(comma, ",") => match ts.next_sig(comma) {
                Some(next) => j = next,
                None => break,
            },
            _ => break,
        }
    }
    entries
}

fn tag_entry(rw: &mut Rewriter<'_>, entry: &TableEntry, command: Command) {
    if let Some(name) = entry.name.as_ref().filter(|n| !n.tagged) {
        if !rw.touches(name.span) {
            rw.replace(name.span, TableToken::new(command, name.text.as_str()).to_string());
        }
    }
    if let Some(alias) = entry.alias.as_ref().filter(|a| !a.tagged) {
        if !rw.touches(alias.span) {
            rw.replace(alias.span, field_token(&alias.text));
        }
    }
}

/// Matches `words` at consecutive significant tokens starting at `i` and
/// returns the index of the last one.
fn words_at(ts: &TokenStream<'_>, i: usize, words: &[&str]) -> Option<usize> {
    let mut j = i;
    for (n, word) in words.iter().enumerate() {
        if n > 0 {
            j = ts.next_sig(j)?;
        }
        if !ts.is_word(j, word) {
            return None;
        }
    }
    Some(j)
}

/// Skips `words` if they are present at `i`; returns the next significant
/// token after them, or `i` itself when absent.
fn skip_words(ts: &TokenStream<'_>, i: usize, words: &[&str]) -> Option<usize> {
    match words_at(ts, i, words) {
        Some(last) => ts.next_sig(last),
        None => Some(i),
    }
}

/// Tags `CREATE`/`DROP`/`ALTER` `TABLE|VIEW` targets, `CREATE TABLE`
/// column names and `INSERT INTO` targets.
pub(super) fn tag_definitions(text: &str) -> String {
    let ts = TokenStream::new(text);
    let mut rw = Rewriter::new(text);
    for i in 0..ts.len() {
        let Some(command) = definition_command(&ts, i) else {
            continue;
        };
        let Some(mut j) = ts.next_sig(i) else { continue };
        let mut is_table = true;
        if command == Command::Insert {
            if !ts.is_word(j, "INTO") {
                continue;
            }
        } else {
            if command == Command::Create {
                let Some(k) = skip_words(&ts, j, &["OR", "REPLACE"]) else { continue };
                j = k;
                if ts.is_any_word(j, &["TEMP", "TEMPORARY"]) {
                    let Some(k) = ts.next_sig(j) else { continue };
                    j = k;
                }
            }
            if ts.is_word(j, "VIEW") {
                is_table = false;
            } else if !ts.is_word(j, "TABLE") {
                continue;
            }
        }
        let Some(k) = ts.next_sig(j) else { continue };
        let Some(k) = (match command {
            Command::Create => skip_words(&ts, k, &["IF", "NOT", "EXISTS"]),
            Command::Drop => skip_words(&ts, k, &["IF", "EXISTS"]),
            _ => Some(k),
        }) else {
            continue;
        };
        let Some(name) = table_name_at(&ts, k, true) else { continue };
        if !name.tagged {
            rw.replace(name.span, TableToken::new(command, name.text.as_str()).to_string());
        }
        if command == Command::Create && is_table {
            tag_column_definitions(&ts, &mut rw, name.last);
        }
    }
    rw.finish()
}

fn definition_command(ts: &TokenStream<'_>, i: usize) -> Option<Command> {
    if ts.kind(i) != TokenKind::Word {
        return None;
    }
    match ts.text(i).to_ascii_uppercase().as_str() {
        "CREATE" => Some(Command::Create),
        "DROP" => Some(Command::Drop),
        "ALTER" => Some(Command::Alter),
        "INSERT" => Some(Command::Insert),
        _ => None,
    }
}

/// Tags the leading word of each column definition after a `CREATE TABLE`
/// name ending at `name_last`.
fn tag_column_definitions(ts: &TokenStream<'_>, rw: &mut Rewriter<'_>, name_last: usize) {
    let Some(open) = ts.next_sig(name_last).filter(|&o| ts.is_punct(o, "(")) else {
        return;
    };
    let Some(close) = ts.matching_close(open) else { return };
    let mut depth = 0usize;
    let mut expect_column = true;
    for j in open + 1..close {
        if ts.kind(j) == TokenKind::Space {
            continue;
        }
        if ts.is_punct(j, "(") {
            depth += 1;
        } else if ts.is_punct(j, ")") {
            depth = depth.saturating_sub(1);
        } else if depth == 0 && ts.is_punct(j, ",") {
            expect_column = true;
            continue;
        }
        if expect_column {
            expect_column = false;
            if ts.kind(j) == TokenKind::Word && !ts.is_any_word(j, CONSTRAINT_WORDS) {
                rw.replace(ts.span(j), field_token(ts.text(j)));
            }
        }
    }
}

enum MutationTarget {
    /// The leading identifier is the alias of this `FROM`/`JOIN` entry.
    Alias(TableEntry),
    /// The leading identifier names a table of the `FROM` clause.
    Table,
}

/// Looks for the leading identifier of an `UPDATE x` / `DELETE x` among
/// the aliases and table names of the statement's top-level `FROM` and
/// `JOIN` clauses.
fn mutation_target(ts: &TokenStream<'_>, after: usize, leading: &str) -> Option<MutationTarget> {
    let mut depth = 0usize;
    let mut by_name = false;
    let mut j = after + 1;
    while j < ts.len() {
        if ts.is_punct(j, "(") {
            depth += 1;
        } else if ts.is_punct(j, ")") {
            if depth == 0 {
                break;
            }
            depth -= 1;
        } else if depth == 0 && ts.is_punct(j, ";") {
            break;
        } else if depth == 0 && ts.is_any_word(j, &["FROM", "JOIN"]) {
            if let Some(start) = ts.next_sig(j) {
                for entry in table_list(ts, start) {
                    if entry
                        .alias
                        .as_ref()
                        .is_some_and(|a| a.text.eq_ignore_ascii_case(leading))
                    {
                        return Some(MutationTarget::Alias(entry));
                    }
                    by_name |= entry
                        .name
                        .as_ref()
                        .is_some_and(|n| n.text.eq_ignore_ascii_case(leading));
                }
            }
        }
        j += 1;
    }
    by_name.then_some(MutationTarget::Table)
}

/// Tags `UPDATE` and `DELETE` targets, simple and aliased forms.
pub(super) fn tag_mutations(text: &str) -> String {
    let ts = TokenStream::new(text);
    let mut rw = Rewriter::new(text);
    for i in 0..ts.len() {
        let command = if ts.is_word(i, "UPDATE") {
            Command::Update
        } else if ts.is_word(i, "DELETE") {
            Command::Delete
        } else {
            continue;
        };
        // ON DUPLICATE KEY UPDATE, SELECT ... FOR UPDATE
        if ts.prev_sig(i).is_some_and(|p| ts.is_any_word(p, &["KEY", "FOR"])) {
            continue;
        }
        let Some(mut j) = ts.next_sig(i) else { continue };
        if command == Command::Delete && ts.is_word(j, "FROM") {
            // DELETE FROM name [alias]
            let Some(k) = ts.next_sig(j) else { continue };
            j = k;
            let Some(name) = table_name_at(&ts, j, false) else { continue };
            let entry = TableEntry {
                alias: alias_at(&ts, name.last),
                name: Some(name),
            };
            tag_entry(&mut rw, &entry, command);
            continue;
        }
        let Some(leading) = table_name_at(&ts, j, false) else { continue };
        if leading.tagged {
            continue;
        }
        match mutation_target(&ts, leading.last, &leading.text) {
            Some(MutationTarget::Alias(entry)) => {
                trace!(alias = %leading.text, "aliased mutation target");
                if ts.kind(j) == TokenKind::Word {
                    rw.replace(leading.span, field_token(&leading.text));
                }
                tag_entry(&mut rw, &entry, command);
            }
            Some(MutationTarget::Table) => {
                rw.replace(leading.span, TableToken::new(command, leading.text).to_string());
            }
            None => {
                let entry = TableEntry {
                    alias: alias_at(&ts, leading.last),
                    name: Some(leading),
                };
                tag_entry(&mut rw, &entry, command);
            }
        }
    }
    rw.finish()
}

/// Tags `FROM` and `JOIN` sources with `{SELECT#name}` / `{JOIN#name}` and
/// brackets their aliases.
pub(super) fn tag_sources(text: &str) -> String {
    let ts = TokenStream::new(text);
    let mut rw = Rewriter::new(text);
    for i in 0..ts.len() {
        let command = if ts.is_word(i, "FROM") {
            Command::Select
        } else if ts.is_word(i, "JOIN") {
            Command::Join
        } else if ts.is_word(i, "USING") {
            // USING (col) in a join is a column list, handled elsewhere.
            Command::Select
        } else {
            continue;
        };
        if ts.inside_call(i, NON_SOURCE_CALLS) || is_distinct_from(&ts, i) {
            continue;
        }
        let Some(start) = ts.next_sig(i) else { continue };
        if ts.is_word(i, "USING") && ts.is_punct(start, "(") {
            continue;
        }
        for entry in table_list(&ts, start) {
            tag_entry(&mut rw, &entry, command);
        }
    }
    rw.finish()
}

/// `a IS [NOT] DISTINCT FROM b`
fn is_distinct_from(ts: &TokenStream<'_>, i: usize) -> bool {
    ts.prev_sig(i)
        .filter(|&d| ts.is_word(d, "DISTINCT"))
        .and_then(|d| ts.prev_sig(d))
        .is_some_and(|p| ts.is_any_word(p, &["IS", "NOT"]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_table_with_columns() {
        assert_eq!(
            tag_definitions(
                "CREATE TABLE IF NOT EXISTS users (id INT PRIMARY KEY, name VARCHAR(20), PRIMARY KEY (id))"
            ),
            "CREATE TABLE IF NOT EXISTS {CREATE#users} ([id] INT PRIMARY KEY, [name] VARCHAR(20), PRIMARY KEY (id))"
        );
    }

    #[test]
    fn test_view_and_drop() {
        assert_eq!(
            tag_definitions("CREATE OR REPLACE VIEW v AS SELECT 1"),
            "CREATE OR REPLACE VIEW {CREATE#v} AS SELECT 1"
        );
        assert_eq!(tag_definitions("DROP TABLE IF EXISTS dbo.t"), "DROP TABLE IF EXISTS {DROP#dbo.t}");
        assert_eq!(tag_definitions("ALTER VIEW [v] AS"), "ALTER VIEW {ALTER#v} AS");
    }

    #[test]
    fn test_insert_into() {
        assert_eq!(
            tag_definitions("INSERT INTO users(a, b) VALUES (1, 2)"),
            "INSERT INTO {INSERT#users}(a, b) VALUES (1, 2)"
        );
    }

    #[test]
    fn test_simple_update_and_delete() {
        assert_eq!(tag_mutations("UPDATE users SET a = 1"), "UPDATE {UPDATE#users} SET a = 1");
        assert_eq!(tag_mutations("UPDATE users u SET a = 1"), "UPDATE {UPDATE#users} [u] SET a = 1");
        assert_eq!(tag_mutations("DELETE FROM users WHERE a = 1"), "DELETE FROM {DELETE#users} WHERE a = 1");
        assert_eq!(tag_mutations("DELETE users WHERE a = 1"), "DELETE {DELETE#users} WHERE a = 1");
    }

    #[test]
    fn test_aliased_update() {
        assert_eq!(
            tag_mutations("UPDATE u SET a = 1 FROM users u JOIN orders o ON u.id = o.uid"),
            "UPDATE [u] SET a = 1 FROM {UPDATE#users} [u] JOIN orders o ON u.id = o.uid"
        );
        assert_eq!(
            tag_mutations("INSERT INTO t (a) VALUES (1) ON DUPLICATE KEY UPDATE a = 2"),
            "INSERT INTO t (a) VALUES (1) ON DUPLICATE KEY UPDATE a = 2"
        );
    }

    #[test]
    fn test_aliased_delete_from_join() {
        assert_eq!(
            tag_mutations("DELETE o FROM users u JOIN orders o ON u.id = o.uid"),
            "DELETE [o] FROM users u JOIN {DELETE#orders} [o] ON u.id = o.uid"
        );
    }

    #[test]
    fn test_update_target_named_in_from() {
        assert_eq!(
            tag_mutations("UPDATE users SET a = 1 FROM users JOIN t ON 1 = 1"),
            "UPDATE {UPDATE#users} SET a = 1 FROM users JOIN t ON 1 = 1"
        );
    }

    #[test]
    fn test_sources() {
        assert_eq!(
            tag_sources("SELECT * FROM users AS u, dbo.orders o INNER JOIN items i ON 1 = 1 WHERE x"),
            "SELECT * FROM {SELECT#users} AS [u], {SELECT#dbo.orders} [o] INNER JOIN {JOIN#items} [i] ON 1 = 1 WHERE x"
        );
    }

    #[test]
    fn test_derived_table_alias() {
        assert_eq!(
            tag_sources("SELECT * FROM (SELECT a FROM t) d"),
            "SELECT * FROM (SELECT a FROM {SELECT#t}) [d]"
        );
    }

    #[test]
    fn test_non_source_from() {
        let sql = "SELECT EXTRACT(YEAR FROM created), SUBSTRING(a FROM 2) FROM t";
        assert_eq!(
            tag_sources(sql),
            "SELECT EXTRACT(YEAR FROM created), SUBSTRING(a FROM 2) FROM {SELECT#t}"
        );
        assert_eq!(tag_sources("a IS DISTINCT FROM b"), "a IS DISTINCT FROM b");
    }

    #[test]
    fn test_function_source_is_skipped() {
        assert_eq!(tag_sources("SELECT * FROM fn(1)"), "SELECT * FROM fn(1)");
        assert_eq!(tag_sources("SELECT 1 FROM DUAL"), "SELECT 1 FROM DUAL");
    }

    #[test]
    fn test_table_hint() {
        assert_eq!(
            tag_sources("SELECT * FROM t WITH (NOLOCK), s"),
            "SELECT * FROM {SELECT#t} WITH (NOLOCK), {SELECT#s}"
        );
    }

    #[test]
    fn test_tagged_sources_are_stable() {
        let sql = "UPDATE [u] SET [a] = 1 FROM {UPDATE#users} [u]";
        assert_eq!(tag_mutations(sql), sql);
        assert_eq!(tag_sources(sql), sql);
    }
}
