//! Token types for the SQL lexer.

/// A byte range in the source text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Span {
    /// Start byte offset (inclusive).
    pub start: usize,
    /// End byte offset (exclusive).
    pub end: usize,
}

impl Span {
    /// Creates a new span.
    #[must_use]
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Returns the length of the span in bytes.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.end - self.start
    }

    /// Returns true if the span is empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Returns the span covering `self` through `other`.
    #[must_use]
    pub const fn to(self, other: Self) -> Self {
        Self::new(self.start, other.end)
    }

    /// Returns the spanned text.
    #[must_use]
    pub fn slice(self, input: &str) -> &str {
        &input[self.start..self.end]
    }
}

/// Token categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Identifier or keyword.
    Word,
    /// Numeric literal.
    Number,
    /// Single- or double-quoted literal.
    Literal,
    /// `[name]`
    Quoted,
    /// `{...}`
    Brace,
    /// Operator or punctuation.
    Punct,
    /// Whitespace run.
    Space,
}

/// A lexed token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    /// The category.
    pub kind: TokenKind,
    /// The source range.
    pub span: Span,
}

impl Token {
    /// Creates a new token.
    #[must_use]
    pub const fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Returns true unless the token is whitespace.
    #[must_use]
    pub fn is_significant(&self) -> bool {
        self.kind != TokenKind::Space
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_slice_and_join() {
        let text = "SELECT a";
        let select = Span::new(0, 6);
        let a = Span::new(7, 8);
        assert_eq!(select.slice(text), "SELECT");
        assert_eq!(select.to(a).slice(text), "SELECT a");
        assert_eq!(select.to(a).len(), 8);
        assert!(Span::new(3, 3).is_empty());
    }
}
