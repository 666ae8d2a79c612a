//! Rendering canonical SQL for a concrete dialect.

use tracing::debug;

use crate::dialect::Dialect;
use crate::error::Result;
use crate::lexer::{Rewriter, TokenKind, TokenStream};
use crate::token::{parse_parameter, TableToken};

/// Renders canonical SQL for `dialect`.
///
/// Builtin names are substituted first (`LEN`/`LENGTH`, `SUBSTR`/`SUBSTRING`
/// and `INDEXOF`, whose two leading arguments are swapped when the dialect
/// asks for it), then every `{COMMAND#name}`, `[name]` and `{name}` token is
/// quoted, then the dialect's formatters run in order. Quoted literals are
/// never touched.
///
/// # Errors
///
/// Returns an unsupported-construct error if a dialect rule set has no rule
/// for one of its matches.
pub fn format(canonical: &str, dialect: &dyn Dialect) -> Result<String> {
    let text = substitute_builtins(canonical, dialect);
    let mut text = quote_tokens(&text, dialect);
    for formatter in dialect.formatters() {
        text = formatter.format(&text)?;
    }
    debug!(engine = %dialect.engine(), len = text.len(), "formatted sql");
    Ok(text)
}

fn substitute_builtins(text: &str, dialect: &dyn Dialect) -> String {
    let ts = TokenStream::new(text);
    let mut rw = Rewriter::new(text);
    let mut i = 0;
    while i < ts.len() {
        let open = ts.next_sig(i).filter(|&o| ts.is_punct(o, "("));
        if ts.kind(i) != TokenKind::Word || open.is_none() {
            i += 1;
            continue;
        }
        let word = ts.text(i).to_ascii_uppercase();
        match word.as_str() {
            "LEN" | "LENGTH" => rw.replace(ts.span(i), dialect.length()),
            "SUBSTR" | "SUBSTRING" => rw.replace(ts.span(i), dialect.substring()),
            "INDEXOF" => {
                let call = open
                    .and_then(|o| ts.matching_close(o).map(|c| (o, c)))
                    .filter(|_| dialect.index_of_swap_places());
                if let Some((open, close)) = call {
                    let swapped = swap_leading_arguments(&ts, open, close, dialect);
                    rw.replace(
                        ts.span(i).to(ts.span(close)),
                        format!("{}({swapped})", dialect.index_of()),
                    );
                    i = close;
                } else {
                    rw.replace(ts.span(i), dialect.index_of());
                }
            }
            _ => {}
        }
        i += 1;
    }
    rw.finish()
}

/// Returns the argument list between `open` and `close` with its first two
/// arguments exchanged. Arguments are rendered recursively.
fn swap_leading_arguments(
    ts: &TokenStream<'_>,
    open: usize,
    close: usize,
    dialect: &dyn Dialect,
) -> String {
    let text = ts.input();
    let mut bounds = vec![ts.span(open).end];
    let mut depth = 0usize;
    for j in open + 1..close {
        if ts.is_punct(j, "(") {
            depth += 1;
        } else if ts.is_punct(j, ")") {
            depth = depth.saturating_sub(1);
        } else if depth == 0 && ts.is_punct(j, ",") {
            bounds.push(ts.span(j).start);
            bounds.push(ts.span(j).end);
        }
    }
    bounds.push(ts.span(close).start);
    let mut args: Vec<String> = bounds
        .chunks(2)
        .map(|b| substitute_builtins(text[b[0]..b[1]].trim(), dialect))
        .collect();
    if args.len() >= 2 {
        args.swap(0, 1);
    }
    args.join(", ")
}

fn quote_tokens(text: &str, dialect: &dyn Dialect) -> String {
    let ts = TokenStream::new(text);
    let mut rw = Rewriter::new(text);
    for i in 0..ts.len() {
        let marker = ts.text(i);
        match ts.kind(i) {
            TokenKind::Quoted => {
                let name = marker[1..marker.len() - 1].replace("]]", "]");
                rw.replace(ts.span(i), dialect.name(&name));
            }
            TokenKind::Brace => {
                if let Some(table) = TableToken::parse(marker) {
                    let quoted: Vec<String> =
                        table.name.split('.').map(|part| dialect.name(part)).collect();
                    rw.replace(ts.span(i), quoted.join("."));
                } else if let Some(name) = parse_parameter(marker) {
                    rw.replace(ts.span(i), dialect.parameter_name(name));
                }
            }
            _ => {}
        }
    }
    rw.finish()
}
