//! Text-preserving SQL lexer.
//!
//! Unlike a parser front end, this lexer never drops input: every byte of
//! the source belongs to exactly one token, whitespace included. Rewriting
//! passes walk the token list, decide which spans to replace, and splice
//! the replacements into the original text with a [`Rewriter`].
//!
//! Canonical markers are single tokens: `[name]` is [`TokenKind::Quoted`],
//! `{COMMAND#name}` and `{name}` are [`TokenKind::Brace`], and quoted
//! literals (including `'--#N'` placeholders) are [`TokenKind::Literal`].

mod stream;
mod token;
mod tokenizer;

pub use stream::{Rewriter, TokenStream};
pub use token::{Span, Token, TokenKind};
pub use tokenizer::{tokenize, Lexer};
