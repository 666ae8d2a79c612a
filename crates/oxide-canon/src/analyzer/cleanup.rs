//! Whitespace collapsing and `TRIM` rewriting.

use crate::lexer::{Rewriter, TokenStream};

/// Trims trailing whitespace from every line, drops blank lines and trims
/// the whole text.
pub(super) fn collapse_blank_lines(text: &str) -> String {
    text.lines()
        .map(str::trim_end)
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Rewrites `TRIM(x)` into `LTRIM(RTRIM(x))`.
///
/// Calls using the ANSI `TRIM(BOTH ' ' FROM x)` form are left alone.
pub(super) fn rewrite_trim(text: &str) -> String {
    let ts = TokenStream::new(text);
    let mut rw = Rewriter::new(text);
    let mut i = 0;
    while i < ts.len() {
        if let Some(close) = trim_call(&ts, i) {
            let inner = &text[ts.span(i).end..ts.span(close).start];
            let open = inner.find('(').map_or(0, |p| p + 1);
            let argument = rewrite_trim(&inner[open..]);
            rw.replace(ts.span(i).to(ts.span(close)), format!("LTRIM(RTRIM({argument}))"));
            i = close;
        }
        i += 1;
    }
    rw.finish()
}

/// Returns the closing parenthesis of a plain `TRIM(` call at `i`.
fn trim_call(ts: &TokenStream<'_>, i: usize) -> Option<usize> {
    if !ts.is_word(i, "TRIM") {
        return None;
    }
    let open = ts.next_sig(i).filter(|&o| ts.is_punct(o, "("))?;
    let close = ts.matching_close(open)?;
    let mut depth = 0usize;
    for j in open + 1..close {
        if ts.is_punct(j, "(") {
            depth += 1;
        } else if ts.is_punct(j, ")") {
            depth = depth.saturating_sub(1);
        } else if depth == 0 && ts.is_any_word(j, &["FROM", "BOTH", "LEADING", "TRAILING"]) {
            return None;
        }
    }
    Some(close)
}
