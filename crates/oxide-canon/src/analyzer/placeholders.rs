//! Indexed `'--#N'` placeholders for text the passes must not touch.

use crate::error::{Result, SqlError};
use crate::lexer::{Rewriter, TokenKind, TokenStream};

#[derive(Debug, Default)]
pub(super) struct Placeholders {
    entries: Vec<String>,
}

impl Placeholders {
    /// Stores `content` and returns the placeholder standing in for it.
    pub(super) fn push(&mut self, content: &str) -> String {
        let token = format!("'--#{}'", self.entries.len());
        self.entries.push(content.to_string());
        token
    }

    #[cfg(test)]
    pub(super) fn get(&self, index: usize) -> Option<&str> {
        self.entries.get(index).map(String::as_str)
    }

    /// Moves every `DECLARE ...;` block into a placeholder.
    pub(super) fn extract_declarations(&mut self, text: &str) -> String {
        let ts = TokenStream::new(text);
        let mut rw = Rewriter::new(text);
        let mut i = 0;
        while i < ts.len() {
            if ts.is_word(i, "DECLARE") {
                let base = ts.depth(i);
                let end = (i + 1..ts.len())
                    .find(|&j| ts.is_punct(j, ";") && ts.depth(j) == base);
                if let Some(end) = end {
                    let span = ts.span(i).to(ts.span(end));
                    let token = self.push(span.slice(text));
                    rw.replace(span, token);
                    i = end;
                }
            }
            i += 1;
        }
        rw.finish()
    }

    /// Substitutes placeholders back until none is left.
    ///
    /// Restored text may itself contain placeholders (a `DECLARE` block
    /// holding string literals), so substitution repeats. Each slot is
    /// restored at most once and the number of rounds is bounded by the
    /// number of slots.
    pub(super) fn restore(&self, text: &str) -> Result<String> {
        let mut restored = vec![false; self.entries.len()];
        let mut text = text.to_string();
        for _ in 0..=self.entries.len() {
            let next = {
                let ts = TokenStream::new(&text);
                let mut rw = Rewriter::new(&text);
                for i in 0..ts.len() {
                    if ts.kind(i) != TokenKind::Literal {
                        continue;
                    }
                    let Some(index) = placeholder_index(ts.text(i)) else {
                        continue;
                    };
                    if index < self.entries.len() && !restored[index] {
                        restored[index] = true;
                        rw.replace(ts.span(i), self.entries[index].as_str());
                    }
                }
                if rw.is_empty() {
                    None
                } else {
                    Some(rw.finish())
                }
            };
            match next {
                Some(next) => text = next,
                None => return Ok(text),
            }
        }
        Err(SqlError::syntax("placeholder restoration did not converge"))
    }
}

fn placeholder_index(literal: &str) -> Option<usize> {
    literal
        .strip_prefix("'--#")?
        .strip_suffix('\'')?
        .parse()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declarations_are_extracted() {
        let mut placeholders = Placeholders::default();
        let lit = placeholders.push("'x'");
        let text = format!("DECLARE @a VARCHAR(10) = {lit}; SELECT 1");
        let out = placeholders.extract_declarations(&text);
        assert_eq!(out, "'--#1' SELECT 1");
        assert_eq!(placeholders.get(1), Some("DECLARE @a VARCHAR(10) = '--#0';"));
    }

    #[test]
    fn test_restore_nested_only() {
        let mut placeholders = Placeholders::default();
        placeholders.push("'x'");
        placeholders.push("DECLARE @a INT = '--#0';");
        let out = placeholders.restore("'--#1' SELECT 1").unwrap();
        assert_eq!(out, "DECLARE @a INT = 'x'; SELECT 1");
    }

    #[test]
    fn test_user_text_resembling_placeholder_survives() {
        let mut placeholders = Placeholders::default();
        placeholders.push("'--#0'");
        let out = placeholders.restore("SELECT '--#0'").unwrap();
        assert_eq!(out, "SELECT '--#0'");
    }
}
