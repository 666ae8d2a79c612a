//! Navigation over a token list and span-based rewriting.

use super::{tokenize, Span, Token, TokenKind};

/// A tokenized text with helpers for looking around a token.
pub struct TokenStream<'a> {
    input: &'a str,
    tokens: Vec<Token>,
}

impl<'a> TokenStream<'a> {
    /// Tokenizes `input`.
    #[must_use]
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            tokens: tokenize(input),
        }
    }

    /// Returns the source text.
    #[must_use]
    pub const fn input(&self) -> &'a str {
        self.input
    }

    /// Returns the number of tokens.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Returns true if there are no tokens.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Returns the kind of token `i`.
    #[must_use]
    pub fn kind(&self, i: usize) -> TokenKind {
        self.tokens[i].kind
    }

    /// Returns the span of token `i`.
    #[must_use]
    pub fn span(&self, i: usize) -> Span {
        self.tokens[i].span
    }

    /// Returns the text of token `i`.
    #[must_use]
    pub fn text(&self, i: usize) -> &'a str {
        self.tokens[i].span.slice(self.input)
    }

    /// Returns true if token `i` is the word `keyword` (any case).
    #[must_use]
    pub fn is_word(&self, i: usize, keyword: &str) -> bool {
        self.kind(i) == TokenKind::Word && self.text(i).eq_ignore_ascii_case(keyword)
    }

    /// Returns true if token `i` is the word of one of `keywords`.
    #[must_use]
    pub fn is_any_word(&self, i: usize, keywords: &[&str]) -> bool {
        keywords.iter().any(|k| self.is_word(i, k))
    }

    /// Returns true if token `i` is the punctuation `p`.
    #[must_use]
    pub fn is_punct(&self, i: usize, p: &str) -> bool {
        self.kind(i) == TokenKind::Punct && self.text(i) == p
    }

    /// Returns the next non-whitespace token after `i`.
    #[must_use]
    pub fn next_sig(&self, i: usize) -> Option<usize> {
        (i + 1..self.tokens.len()).find(|&j| self.tokens[j].is_significant())
    }

    /// Returns the previous non-whitespace token before `i`.
    #[must_use]
    pub fn prev_sig(&self, i: usize) -> Option<usize> {
        (0..i).rev().find(|&j| self.tokens[j].is_significant())
    }

    /// Returns the first non-whitespace token at or after `i`.
    #[must_use]
    pub fn sig_from(&self, i: usize) -> Option<usize> {
        (i..self.tokens.len()).find(|&j| self.tokens[j].is_significant())
    }

    /// Returns the `)` matching the `(` at `open`.
    #[must_use]
    pub fn matching_close(&self, open: usize) -> Option<usize> {
        let mut depth = 0usize;
        for j in open..self.tokens.len() {
            if self.is_punct(j, "(") {
                depth += 1;
            } else if self.is_punct(j, ")") {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(j);
                }
            }
        }
        None
    }

    /// Returns the innermost unclosed `(` before `i`.
    #[must_use]
    pub fn enclosing_open(&self, i: usize) -> Option<usize> {
        let mut depth = 0usize;
        for j in (0..i).rev() {
            if self.is_punct(j, ")") {
                depth += 1;
            } else if self.is_punct(j, "(") {
                if depth == 0 {
                    return Some(j);
                }
                depth -= 1;
            }
        }
        None
    }

    /// Returns the function name whose argument list contains token `i`.
    #[must_use]
    pub fn enclosing_call(&self, i: usize) -> Option<&'a str> {
        let open = self.enclosing_open(i)?;
        let name = self.prev_sig(open)?;
        (self.kind(name) == TokenKind::Word).then(|| self.text(name))
    }

    /// Returns true if token `i` sits inside a call to one of `functions`.
    #[must_use]
    pub fn inside_call(&self, i: usize, functions: &[&str]) -> bool {
        self.enclosing_call(i)
            .is_some_and(|name| functions.iter().any(|f| f.eq_ignore_ascii_case(name)))
    }

    /// Returns the parenthesis depth at token `i`.
    #[must_use]
    pub fn depth(&self, i: usize) -> usize {
        let mut depth = 0usize;
        for j in 0..i {
            if self.is_punct(j, "(") {
                depth += 1;
            } else if self.is_punct(j, ")") {
                depth = depth.saturating_sub(1);
            }
        }
        depth
    }
}

/// Collects span replacements and applies them to the source text.
///
/// Of two overlapping edits the one starting first is kept; ties go to the
/// one recorded first.
pub struct Rewriter<'a> {
    input: &'a str,
    edits: Vec<(Span, String)>,
}

impl<'a> Rewriter<'a> {
    /// Creates a rewriter over `input`.
    #[must_use]
    pub const fn new(input: &'a str) -> Self {
        Self {
            input,
            edits: Vec::new(),
        }
    }

    /// Records the replacement of `span` with `text`.
    pub fn replace(&mut self, span: Span, text: impl Into<String>) {
        self.edits.push((span, text.into()));
    }

    /// Returns true if no edit was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    /// Returns true if `span` overlaps a recorded edit.
    #[must_use]
    pub fn touches(&self, span: Span) -> bool {
        self.edits
            .iter()
            .any(|(s, _)| s.start < span.end && span.start < s.end)
    }

    /// Applies the edits and returns the rewritten text.
    #[must_use]
    pub fn finish(self) -> String {
        let mut edits: Vec<(usize, (Span, String))> = self.edits.into_iter().enumerate().collect();
        edits.sort_by_key(|(order, (span, _))| (span.start, *order));
        let mut out = String::with_capacity(self.input.len());
        let mut last = 0;
        for (_, (span, text)) in edits {
            if span.start < last {
                continue;
            }
            out.push_str(&self.input[last..span.start]);
            out.push_str(&text);
            last = span.end;
        }
        out.push_str(&self.input[last..]);
        out
    }
}
