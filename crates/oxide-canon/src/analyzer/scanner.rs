//! Comment and literal scanner.
//!
//! Removes `--` and `/* */` comments, moves every quoted literal out of the
//! text into a [`Placeholders`] slot, and rewrites backtick identifiers into
//! `[name]` tokens. Bracketed identifiers and `{...}` markers are copied
//! unchanged so comment markers inside them survive.

use crate::error::{Result, SqlError};

use super::placeholders::Placeholders;

pub(super) struct Scanner<'a> {
    input: &'a str,
    pos: usize,
    out: String,
}

impl<'a> Scanner<'a> {
    pub(super) fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            out: String::with_capacity(input.len()),
        }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn peek_next(&self) -> Option<char> {
        let mut chars = self.input[self.pos..].chars();
        chars.next();
        chars.next()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    /// Consumes a delimited run starting at the opening delimiter and
    /// returns it, delimiters included.
    fn take_delimited(&mut self, close: char, doubled: bool, what: &str) -> Result<&'a str> {
        let start = self.pos;
        self.advance();
        loop {
            match self.advance() {
                Some(c) if c == close => {
                    if doubled && self.peek() == Some(close) {
                        self.advance();
                        continue;
                    }
                    return Ok(&self.input[start..self.pos]);
                }
                Some(_) => {}
                None => {
                    return Err(SqlError::syntax(format!(
                        "unterminated {what} starting at byte {start}"
                    )))
                }
            }
        }
    }

    fn skip_line_comment(&mut self) {
        while self.peek().is_some_and(|c| c != '\n') {
            self.advance();
        }
    }

    fn skip_block_comment(&mut self) -> Result<()> {
        let start = self.pos;
        self.advance();
        self.advance();
        loop {
            match self.advance() {
                Some('*') if self.peek() == Some('/') => {
                    self.advance();
                    return Ok(());
                }
                Some(_) => {}
                None => {
                    return Err(SqlError::syntax(format!(
                        "unterminated comment starting at byte {start}"
                    )))
                }
            }
        }
    }

    /// Runs the scan, registering literals in `placeholders`.
    pub(super) fn scan(mut self, placeholders: &mut Placeholders) -> Result<String> {
        while let Some(c) = self.peek() {
            match c {
                '-' if self.peek_next() == Some('-') => self.skip_line_comment(),
                '/' if self.peek_next() == Some('*') => {
                    self.skip_block_comment()?;
                    self.out.push(' ');
                }
                '\'' | '"' => {
                    let literal = self.take_delimited(c, true, "string literal")?;
                    let token = placeholders.push(literal);
                    self.out.push_str(&token);
                }
                '`' => {
                    let quoted = self.take_delimited('`', true, "quoted identifier")?;
                    let name = quoted[1..quoted.len() - 1].replace("``", "`");
                    self.out.push('[');
                    self.out.push_str(&name.replace(']', "]]"));
                    self.out.push(']');
                }
                '[' => {
                    let quoted = self.take_delimited(']', true, "bracketed identifier")?;
                    self.out.push_str(quoted);
                }
                '{' => {
                    let marker = self.take_delimited('}', false, "brace marker")?;
                    self.out.push_str(marker);
                }
                _ => {
                    self.advance();
                    self.out.push(c);
                }
            }
        }
        Ok(self.out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(sql: &str) -> (String, Placeholders) {
        let mut placeholders = Placeholders::default();
        let text = Scanner::new(sql).scan(&mut placeholders).unwrap();
        (text, placeholders)
    }

    #[test]
    fn test_comments_are_removed() {
        let (text, _) = scan("SELECT a -- trailing\nFROM t /* block */ WHERE b = 1");
        assert_eq!(text, "SELECT a \nFROM t   WHERE b = 1");
    }

    #[test]
    fn test_literals_become_placeholders() {
        let (text, placeholders) = scan("SELECT 'a -- b', \"x\" FROM t WHERE c = 'it''s'");
        assert_eq!(text, "SELECT '--#0', '--#1' FROM t WHERE c = '--#2'");
        assert_eq!(placeholders.get(0), Some("'a -- b'"));
        assert_eq!(placeholders.get(2), Some("'it''s'"));
    }

    #[test]
    fn test_backticks_become_brackets() {
        let (text, _) = scan("SELECT `order` FROM `my table`");
        assert_eq!(text, "SELECT [order] FROM [my table]");
    }

    #[test]
    fn test_brackets_are_opaque() {
        let (text, _) = scan("SELECT [a--b] FROM {SELECT#t}");
        assert_eq!(text, "SELECT [a--b] FROM {SELECT#t}");
    }

    #[test]
    fn error_unterminated_literal() {
        let mut placeholders = Placeholders::default();
        let err = Scanner::new("SELECT 'abc").scan(&mut placeholders).unwrap_err();
        assert!(matches!(err, SqlError::Syntax(_)));
    }

    #[test]
    fn error_unterminated_comment() {
        let mut placeholders = Placeholders::default();
        let err = Scanner::new("SELECT 1 /* open").scan(&mut placeholders).unwrap_err();
        assert!(matches!(err, SqlError::Syntax(_)));
    }
}
