//! Parameter, qualified-name, field and alias tagging.

use crate::lexer::{Rewriter, TokenKind, TokenStream};
use crate::token::{field_token, is_parameter_name, parameter_token};

use super::keywords::{
    is_keyword, DATE_PART_CALLS, FIELD_AFTER_WORDS, FIELD_BEFORE_WORDS, FIELD_DEFINITION_WORDS,
    FIELD_OPERATORS, TYPE_CALLS,
};

/// Tags `:name`, `@name` and `?name` parameter markers as `{name}`.
///
/// The marker must not directly follow an identifier character or another
/// marker character, so `@@ROWCOUNT`, `a::int` and `x@y` are left alone.
pub(super) fn tag_parameters(text: &str) -> String {
    let ts = TokenStream::new(text);
    let mut rw = Rewriter::new(text);
    let mut i = 0;
    while i + 1 < ts.len() {
        if !(ts.is_punct(i, "@") || ts.is_punct(i, ":") || ts.is_punct(i, "?")) {
            i += 1;
            continue;
        }
        let before = text[..ts.span(i).start].chars().next_back();
        if before.is_some_and(|c| c.is_alphanumeric() || matches!(c, '_' | '@' | ':' | '?')) {
            i += 1;
            continue;
        }
        let is_part = |j: usize| matches!(ts.kind(j), TokenKind::Word | TokenKind::Number);
        if !is_part(i + 1) {
            i += 1;
            continue;
        }
        let mut last = i + 1;
        while last + 2 < ts.len() && ts.is_punct(last + 1, "@") && is_part(last + 2) {
            last += 2;
        }
        let name = &text[ts.span(i + 1).start..ts.span(last).end];
        if is_parameter_name(name) {
            rw.replace(ts.span(i).to(ts.span(last)), parameter_token(name));
        }
        i = last + 1;
    }
    rw.finish()
}

/// Tags `alias.field`, `schema.table.column` and `alias.*` chains.
pub(super) fn tag_qualified(text: &str) -> String {
    let ts = TokenStream::new(text);
    let mut rw = Rewriter::new(text);
    let is_part = |j: usize| matches!(ts.kind(j), TokenKind::Word | TokenKind::Quoted);
    let mut i = 0;
    while i < ts.len() {
        if !is_part(i) || (i > 0 && ts.is_punct(i - 1, ".")) {
            i += 1;
            continue;
        }
        let mut parts = vec![i];
        let mut last = i;
        while last + 2 < ts.len() && ts.is_punct(last + 1, ".") {
            if is_part(last + 2) {
                last += 2;
                parts.push(last);
            } else if ts.is_punct(last + 2, "*") {
                last += 2;
                break;
            } else {
                break;
            }
        }
        let is_call = ts.next_sig(last).is_some_and(|n| ts.is_punct(n, "("));
        if last > i && !is_call {
            for p in parts {
                if ts.kind(p) == TokenKind::Word {
                    rw.replace(ts.span(p), field_token(ts.text(p)));
                }
            }
        }
        i = last + 1;
    }
    rw.finish()
}

/// Tags a lone identifier in parentheses: `(name)` becomes `([name])`.
pub(super) fn tag_parenthesized(text: &str) -> String {
    let ts = TokenStream::new(text);
    let mut rw = Rewriter::new(text);
    for open in 0..ts.len() {
        if !ts.is_punct(open, "(") {
            continue;
        }
        let Some(word) = ts.next_sig(open) else { continue };
        let closed = ts.next_sig(word).is_some_and(|c| ts.is_punct(c, ")"));
        if closed
            && ts.kind(word) == TokenKind::Word
            && !is_keyword(ts.text(word))
            && !ts.inside_call(word, DATE_PART_CALLS)
        {
            rw.replace(ts.span(word), field_token(ts.text(word)));
        }
    }
    rw.finish()
}

fn is_operator(ts: &TokenStream<'_>, i: usize) -> bool {
    ts.kind(i) == TokenKind::Punct && FIELD_OPERATORS.contains(&ts.text(i))
}

/// Whether the token before a bare word marks it as a field.
fn field_context_before(ts: &TokenStream<'_>, prev: usize) -> bool {
    if ts.is_punct(prev, ",") || ts.is_punct(prev, "(") || is_operator(ts, prev) {
        return true;
    }
    if ts.is_any_word(prev, FIELD_AFTER_WORDS) {
        return true;
    }
    // SELECT TOP 10 name / SELECT TOP (10) name
    let top = if ts.kind(prev) == TokenKind::Number {
        ts.prev_sig(prev)
    } else if ts.is_punct(prev, ")") {
        ts.enclosing_open(prev).and_then(|open| ts.prev_sig(open))
    } else {
        None
    };
    top.is_some_and(|t| ts.is_word(t, "TOP"))
}

/// Whether the token after a bare word marks it as a field.
fn field_context_after(ts: &TokenStream<'_>, next: Option<usize>) -> bool {
    let Some(next) = next else { return true };
    ts.is_punct(next, ",")
        || ts.is_punct(next, ")")
        || ts.is_punct(next, ";")
        || is_operator(ts, next)
        || ts.is_any_word(next, FIELD_BEFORE_WORDS)
}

/// Tags remaining bare identifiers whose neighbors mark them as fields.
///
/// A bare word is a field when the token before it is a clause keyword,
/// an operator, `,` or `(`, and the token after it is a clause keyword, an
/// operator, `,`, `)` or the end of the text. After `COLUMN` and `AFTER` the
/// following token does not matter.
pub(super) fn tag_positional(text: &str) -> String {
    let ts = TokenStream::new(text);
    let mut rw = Rewriter::new(text);
    for i in 0..ts.len() {
        if ts.kind(i) != TokenKind::Word || is_keyword(ts.text(i)) {
            continue;
        }
        let adjacent = |j: usize, p: &str| j < ts.len() && ts.is_punct(j, p);
        if (i > 0 && (adjacent(i - 1, ".") || adjacent(i - 1, "@"))) || adjacent(i + 1, ".") {
            continue;
        }
        let next = ts.next_sig(i);
        if next.is_some_and(|n| ts.is_punct(n, "(") || ts.is_punct(n, ".")) {
            continue;
        }
        let Some(prev) = ts.prev_sig(i) else { continue };
        if ts.is_punct(prev, "(") && ts.inside_call(i, DATE_PART_CALLS) {
            continue;
        }
        let tagged = if ts.is_any_word(prev, FIELD_DEFINITION_WORDS) {
            true
        } else {
            field_context_before(&ts, prev) && field_context_after(&ts, next)
        };
        if tagged {
            rw.replace(ts.span(i), field_token(ts.text(i)));
        }
    }
    rw.finish()
}

/// Tags `AS alias` and `(...) alias` aliases.
pub(super) fn tag_aliases(text: &str) -> String {
    let ts = TokenStream::new(text);
    let mut rw = Rewriter::new(text);
    for i in 0..ts.len() {
        let is_as = ts.is_word(i, "AS");
        if !is_as && !ts.is_punct(i, ")") {
            continue;
        }
        if is_as && ts.inside_call(i, TYPE_CALLS) {
            continue;
        }
        let Some(alias) = ts.next_sig(i) else { continue };
        if ts.kind(alias) != TokenKind::Word || is_keyword(ts.text(alias)) {
            continue;
        }
        if !is_as && ts.span(i).end == ts.span(alias).start {
            continue;
        }
        if ts
            .next_sig(alias)
            .is_some_and(|n| ts.is_punct(n, "(") || ts.is_punct(n, "."))
        {
            continue;
        }
        rw.replace(ts.span(alias), field_token(ts.text(alias)));
    }
    rw.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameters() {
        assert_eq!(
            tag_parameters("a = @id AND b = :name AND c = ?x AND d = @a@b"),
            "a = {id} AND b = {name} AND c = {x} AND d = {a@b}"
        );
    }

    #[test]
    fn test_parameter_lookbehind() {
        let sql = "SELECT @@ROWCOUNT, a::int, x@y, '--#0', ? FROM t";
        assert_eq!(tag_parameters(sql), sql);
    }

    #[test]
    fn test_qualified() {
        assert_eq!(
            tag_qualified("u.id = [o].uid AND s.t.c = 1 AND u.* AND dbo.fn(x) AND 1.5"),
            "[u].[id] = [o].[uid] AND [s].[t].[c] = 1 AND [u].* AND dbo.fn(x) AND 1.5"
        );
    }

    #[test]
    fn test_parenthesized() {
        assert_eq!(
            tag_parenthesized("COUNT(id), VARCHAR(max), (10), ( name ), DATEPART(year)"),
            "COUNT([id]), VARCHAR(max), (10), ( [name] ), DATEPART(year)"
        );
    }

    #[test]
    fn test_aliases() {
        assert_eq!(
            tag_aliases("SELECT a AS total, COUNT(*) n, CAST(b AS money) FROM (x) d"),
            "SELECT a AS [total], COUNT(*) [n], CAST(b AS money) FROM (x) [d]"
        );
    }
}
