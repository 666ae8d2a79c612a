//! SQL tokenizer implementation.

use super::{Span, Token, TokenKind};

/// A lexer that splits SQL text into tokens without losing any input.
pub struct Lexer<'a> {
    /// The input source code.
    input: &'a str,
    /// The current byte position.
    pos: usize,
    /// The byte position of the start of the current token.
    start: usize,
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer for the given input.
    #[must_use]
    pub const fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            start: 0,
        }
    }

    /// Returns the current character without advancing.
    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    /// Returns the next character without advancing.
    fn peek_next(&self) -> Option<char> {
        let mut chars = self.input[self.pos..].chars();
        chars.next();
        chars.next()
    }

    /// Advances to the next character and returns it.
    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn advance_while(&mut self, pred: impl Fn(char) -> bool) {
        while self.peek().is_some_and(&pred) {
            self.advance();
        }
    }

    fn make_token(&self, kind: TokenKind) -> Token {
        Token::new(kind, Span::new(self.start, self.pos))
    }

    /// Consumes through `close`. When `doubled` is set a doubled `close`
    /// is an escaped character. Runs to the end of input if unterminated.
    fn scan_delimited(&mut self, close: char, doubled: bool) {
        while let Some(c) = self.advance() {
            if c == close {
                if doubled && self.peek() == Some(close) {
                    self.advance();
                    continue;
                }
                return;
            }
        }
    }

    /// Scans a number (integer, decimal or exponent form).
    fn scan_number(&mut self) {
        self.advance_while(|c| c.is_ascii_digit());
        if self.peek() == Some('.') && self.peek_next().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
            self.advance_while(|c| c.is_ascii_digit());
        }
        if self.peek().is_some_and(|c| c == 'e' || c == 'E')
            && self
                .peek_next()
                .is_some_and(|c| c.is_ascii_digit() || c == '+' || c == '-')
        {
            self.advance();
            if self.peek().is_some_and(|c| c == '+' || c == '-') {
                self.advance();
            }
            self.advance_while(|c| c.is_ascii_digit());
        }
    }

    /// Scans the next token.
    pub fn next_token(&mut self) -> Option<Token> {
        self.start = self.pos;
        let c = self.advance()?;

        let kind = match c {
            c if c.is_whitespace() => {
                self.advance_while(char::is_whitespace);
                TokenKind::Space
            }
            '\'' | '"' => {
                self.scan_delimited(c, true);
                TokenKind::Literal
            }
            '[' => {
                self.scan_delimited(']', true);
                TokenKind::Quoted
            }
            '{' => {
                self.scan_delimited('}', false);
                TokenKind::Brace
            }
            c if c.is_ascii_digit() => {
                self.pos = self.start;
                self.scan_number();
                TokenKind::Number
            }
            c if c.is_alphabetic() || c == '_' || c == '#' => {
                self.advance_while(is_word_char);
                TokenKind::Word
            }
            '<' => {
                if matches!(self.peek(), Some('=' | '>')) {
                    self.advance();
                }
                TokenKind::Punct
            }
            '>' | '!' => {
                if self.peek() == Some('=') {
                    self.advance();
                }
                TokenKind::Punct
            }
            '|' | ':' => {
                if self.peek() == Some(c) {
                    self.advance();
                }
                TokenKind::Punct
            }
            _ => TokenKind::Punct,
        };
        Some(self.make_token(kind))
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        self.next_token()
    }
}

/// Returns true for characters that continue an identifier.
pub(crate) fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$' || c == '#'
}

/// Tokenizes `input` completely.
#[must_use]
pub fn tokenize(input: &str) -> Vec<Token> {
    Lexer::new(input).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<(TokenKind, &str)> {
        tokenize(input)
            .into_iter()
            .map(|t| (t.kind, t.span.slice(input)))
            .collect()
    }

    #[test]
    fn test_markers_are_single_tokens() {
        assert_eq!(
            kinds("{SELECT#a}.[b c]={p}"),
            vec![
                (TokenKind::Brace, "{SELECT#a}"),
                (TokenKind::Punct, "."),
                (TokenKind::Quoted, "[b c]"),
                (TokenKind::Punct, "="),
                (TokenKind::Brace, "{p}"),
            ]
        );
    }

    #[test]
    fn test_literals_with_escapes() {
        assert_eq!(
            kinds("'it''s' \"a\"\"b\""),
            vec![
                (TokenKind::Literal, "'it''s'"),
                (TokenKind::Space, " "),
                (TokenKind::Literal, "\"a\"\"b\""),
            ]
        );
    }

    #[test]
    fn test_operators() {
        let ops: Vec<_> = kinds("a<=b<>c!=d||e::f@g")
            .into_iter()
            .filter(|(k, _)| *k == TokenKind::Punct)
            .map(|(_, t)| t)
            .collect();
        assert_eq!(ops, vec!["<=", "<>", "!=", "||", "::", "@"]);
    }

    #[test]
    fn test_numbers() {
        assert_eq!(
            kinds("1.5e3 2.x"),
            vec![
                (TokenKind::Number, "1.5e3"),
                (TokenKind::Space, " "),
                (TokenKind::Number, "2"),
                (TokenKind::Punct, "."),
                (TokenKind::Word, "x"),
            ]
        );
    }

    #[test]
    fn test_lossless() {
        let input = "SELECT  #tmp.[a],\n'x' FROM {SELECT#t} WHERE a >= 1.0";
        let rebuilt: String = tokenize(input).iter().map(|t| t.span.slice(input)).collect();
        assert_eq!(rebuilt, input);
    }
}
