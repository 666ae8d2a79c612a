//! Regex-driven text substitution rules used by the dialects.
//!
//! A [`RuleSet`] pairs one pattern with an ordered list of rules. Every rule
//! declares the parameters it reads; a rule applies to a match when every
//! named group it reads took part in the match. Rules are tried in order of
//! descending parameter count (ties keep their registration order) and the
//! first applicable rule produces the replacement text.
//!
//! ```rust
//! use oxide_canon::formatter::{Param, RuleSet, SqlFormatter};
//!
//! let rules = RuleSet::builder("booleans", r"(?i)\b(?:(?P<t>TRUE)|(?P<f>FALSE))\b")
//!     .rule(&[Param::Group("t")], |_| "1".to_string())
//!     .rule(&[Param::Group("f")], |_| "0".to_string())
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(rules.format("SELECT TRUE, 'TRUE'").unwrap(), "SELECT 1, 'TRUE'");
//! ```

use std::fmt;
use std::ops::Range;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use tracing::trace;

use crate::error::{Result, SqlError};

/// A text-to-text rewrite applied to dialect SQL after token quoting.
pub trait SqlFormatter: Send + Sync {
    /// Rewrites `sql`.
    fn format(&self, sql: &str) -> Result<String>;
}

/// A parameter declared by a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Param {
    /// The whole matched text. Always available.
    Whole,
    /// A named group that must take part in the match.
    Group(&'static str),
    /// The text of a named group that must take part in the match.
    Text(&'static str),
    /// Whether a named group captured non-empty text. The group must take
    /// part in the match; rules that treat the flag as optional register a
    /// shorter overload without it.
    Flag(&'static str),
}

impl Param {
    fn is_satisfied_by(self, caps: &Captures<'_>) -> bool {
        match self {
            Self::Whole => true,
            Self::Group(name) | Self::Text(name) | Self::Flag(name) => caps.name(name).is_some(),
        }
    }
}

/// What to do with a match that no rule applies to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Fallback {
    /// Raise an unsupported-construct error.
    #[default]
    Fail,
    /// Keep the matched text unchanged.
    Passthrough,
}

/// The captures of one match, as seen by a rule action.
pub struct RuleArgs<'a, 'h> {
    caps: &'a Captures<'h>,
}

impl<'h> RuleArgs<'_, 'h> {
    /// Returns the whole matched text.
    #[must_use]
    pub fn whole(&self) -> &'h str {
        self.caps.get(0).map_or("", |m| m.as_str())
    }

    /// Returns the text of a named group, or `""` when it did not match.
    #[must_use]
    pub fn text(&self, name: &str) -> &'h str {
        self.caps.name(name).map_or("", |m| m.as_str())
    }

    /// Returns whether a named group captured non-empty text.
    #[must_use]
    pub fn flag(&self, name: &str) -> bool {
        !self.text(name).is_empty()
    }

    /// Returns whether a named group took part in the match.
    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.caps.name(name).is_some()
    }
}

type Action = Box<dyn Fn(&RuleArgs<'_, '_>) -> String + Send + Sync>;

struct Rule {
    params: Vec<Param>,
    action: Action,
}

impl Rule {
    fn applies(&self, caps: &Captures<'_>) -> bool {
        self.params.iter().all(|p| p.is_satisfied_by(caps))
    }
}

/// A compiled pattern with its dispatch table.
pub struct RuleSet {
    name: &'static str,
    pattern: Regex,
    rules: Vec<Rule>,
    fallback: Fallback,
}

impl RuleSet {
    /// Starts building a rule set for `pattern`.
    #[must_use]
    pub fn builder(name: &'static str, pattern: &str) -> RuleSetBuilder {
        RuleSetBuilder {
            name,
            pattern: pattern.to_string(),
            rules: Vec::new(),
            fallback: Fallback::default(),
        }
    }

    /// Returns the rule set name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the number of registered rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns whether no rule is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    fn dispatch(&self, caps: &Captures<'_>) -> Result<String> {
        let args = RuleArgs { caps };
        if let Some(rule) = self.rules.iter().find(|rule| rule.applies(caps)) {
            return Ok((rule.action)(&args));
        }
        trace!(rules = self.name, matched = args.whole(), "no applicable rule");
        match self.fallback {
            Fallback::Passthrough => Ok(args.whole().to_string()),
            Fallback::Fail => Err(SqlError::unsupported(format!(
                "no `{}` rule applies to `{}`",
                self.name,
                args.whole()
            ))),
        }
    }
}

impl SqlFormatter for RuleSet {
    fn format(&self, sql: &str) -> Result<String> {
        let quoted = quoted_spans(sql);
        let mut out = String::with_capacity(sql.len());
        let mut last = 0;
        for caps in self.pattern.captures_iter(sql) {
            let Some(whole) = caps.get(0) else { continue };
            if is_quoted(&quoted, whole.start()) {
                continue;
            }
            out.push_str(&sql[last..whole.start()]);
            out.push_str(&self.dispatch(&caps)?);
            last = whole.end();
        }
        out.push_str(&sql[last..]);
        Ok(out)
    }
}

impl fmt::Debug for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleSet")
            .field("name", &self.name)
            .field("pattern", &self.pattern.as_str())
            .field("rules", &self.rules.len())
            .field("fallback", &self.fallback)
            .finish()
    }
}

static CONCAT_CALL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bCONCAT\s*\(").expect("concat pattern compiles"));

/// Rewrites every `CONCAT(a, b, ...)` call into `(a || b || ...)`.
///
/// The call is delimited by balanced parentheses, so arguments may hold
/// nested calls; nested `CONCAT` calls are rewritten too.
///
/// ```rust
/// use oxide_canon::formatter::{ConcatPipes, SqlFormatter};
///
/// assert_eq!(
///     ConcatPipes.format("CONCAT('%', LOWER(\"a\"), '%')").unwrap(),
///     "('%' || LOWER(\"a\") || '%')"
/// );
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct ConcatPipes;

impl SqlFormatter for ConcatPipes {
    fn format(&self, sql: &str) -> Result<String> {
        let quoted = quoted_spans(sql);
        let mut out = String::with_capacity(sql.len());
        let mut last = 0;
        for call in CONCAT_CALL.find_iter(sql) {
            if call.start() < last || is_quoted(&quoted, call.start()) {
                continue;
            }
            let open = call.end() - 1;
            let Some(close) = closing_paren(sql, open, &quoted) else {
                return Err(SqlError::syntax(format!(
                    "unclosed `CONCAT(` at byte {}",
                    call.start()
                )));
            };
            let args = split_arguments(&sql[open + 1..close])
                .into_iter()
                .map(|arg| self.format(arg))
                .collect::<Result<Vec<_>>>()?;
            out.push_str(&sql[last..call.start()]);
            out.push('(');
            out.push_str(&args.join(" || "));
            out.push(')');
            last = close + 1;
        }
        out.push_str(&sql[last..]);
        Ok(out)
    }
}

/// Returns the position of the `)` closing the `(` at `open`.
fn closing_paren(sql: &str, open: usize, quoted: &[Range<usize>]) -> Option<usize> {
    let mut depth = 0usize;
    for (offset, c) in sql[open..].char_indices() {
        let i = open + offset;
        if is_quoted(quoted, i) {
            continue;
        }
        match c {
            '(' => depth += 1,
            ')' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Builder for [`RuleSet`].
pub struct RuleSetBuilder {
    name: &'static str,
    pattern: String,
    rules: Vec<Rule>,
    fallback: Fallback,
}

impl RuleSetBuilder {
    /// Registers a rule reading `params`.
    #[must_use]
    pub fn rule<F>(mut self, params: &[Param], action: F) -> Self
    where
        F: Fn(&RuleArgs<'_, '_>) -> String + Send + Sync + 'static,
    {
        self.rules.push(Rule {
            params: params.to_vec(),
            action: Box::new(action),
        });
        self
    }

    /// Sets the behavior for matches no rule applies to.
    #[must_use]
    pub const fn fallback(mut self, fallback: Fallback) -> Self {
        self.fallback = fallback;
        self
    }

    /// Compiles the pattern and orders the rules.
    pub fn build(mut self) -> std::result::Result<RuleSet, regex::Error> {
        let pattern = Regex::new(&self.pattern)?;
        self.rules.sort_by(|a, b| b.params.len().cmp(&a.params.len()));
        Ok(RuleSet {
            name: self.name,
            pattern,
            rules: self.rules,
            fallback: self.fallback,
        })
    }
}

/// Returns the byte ranges of string literals and quoted identifiers in
/// `sql`: `'..'`, `".."`, `` `..` `` and `[..]`.
///
/// A doubled closing quote inside a span is an escaped quote. An
/// unterminated span extends to the end of the text.
#[must_use]
pub fn quoted_spans(sql: &str) -> Vec<Range<usize>> {
    let bytes = sql.as_bytes();
    let mut spans = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        let close = match bytes[i] {
            b'\'' | b'"' | b'`' => bytes[i],
            b'[' => b']',
            _ => {
                i += 1;
                continue;
            }
        };
        let start = i;
        i += 1;
        loop {
            if i >= bytes.len() {
                break;
            }
            if bytes[i] == close {
                if bytes.get(i + 1) == Some(&close) {
                    i += 2;
                    continue;
                }
                i += 1;
                break;
            }
            i += 1;
        }
        spans.push(start..i);
    }
    spans
}

fn is_quoted(spans: &[Range<usize>], at: usize) -> bool {
    spans.iter().any(|span| span.contains(&at))
}

/// Splits a flat argument list on top-level commas, ignoring commas inside
/// literals, quoted identifiers or parentheses. Arguments are trimmed.
#[must_use]
pub fn split_arguments(args: &str) -> Vec<&str> {
    let quoted = quoted_spans(args);
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in args.char_indices() {
        if is_quoted(&quoted, i) {
            continue;
        }
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(args[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(args[start..].trim());
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dates() -> RuleSet {
        RuleSet::builder(
            "dates",
            r"(?i)\b(?:(?P<now>NOW)|(?P<today>TODAY))\s*\((?P<arg>[^()]*)\)",
        )
        .rule(&[Param::Group("now")], |_| "GETDATE()".to_string())
        .rule(&[Param::Group("now"), Param::Text("arg")], |a| {
            format!("GETDATE({})", a.text("arg"))
        })
        .build()
        .unwrap()
    }

    #[test]
    fn test_rules_sorted_by_parameter_count() {
        // The two-parameter rule wins even though it was registered last.
        assert_eq!(dates().format("SELECT NOW()").unwrap(), "SELECT GETDATE()");
        assert_eq!(dates().format("SELECT now(1)").unwrap(), "SELECT GETDATE(1)");
    }

    #[test]
    fn error_no_applicable_rule() {
        let err = dates().format("SELECT TODAY()").unwrap_err();
        assert!(matches!(err, SqlError::Unsupported(_)), "{err}");
    }

    #[test]
    fn test_passthrough_fallback() {
        let rules = RuleSet::builder("dates", r"(?i)\b(?:(?P<now>NOW)|TODAY)\(\)")
            .rule(&[Param::Group("now")], |_| "SYSDATE".to_string())
            .fallback(Fallback::Passthrough)
            .build()
            .unwrap();
        assert_eq!(
            rules.format("NOW() < TODAY()").unwrap(),
            "SYSDATE < TODAY()"
        );
    }

    const TOP: &str = r"(?i)\bTOP\s+(?P<pct>PERCENT\s+)?(?P<n>\d+)";

    #[test]
    fn test_flag_parameter_needs_its_group() {
        let rules = RuleSet::builder("top", TOP)
            .rule(&[Param::Text("n"), Param::Flag("pct")], |a| {
                format!("TOP {} PERCENT", a.text("n"))
            })
            .build()
            .unwrap();
        assert_eq!(rules.format("TOP PERCENT 5").unwrap(), "TOP 5 PERCENT");
        let err = rules.format("TOP 5").unwrap_err();
        assert!(matches!(err, SqlError::Unsupported(_)), "{err}");
    }

    #[test]
    fn test_missing_flag_falls_through_to_shorter_rule() {
        let rules = RuleSet::builder("top", TOP)
            .rule(&[Param::Text("n")], |a| format!("TOP({})", a.text("n")))
            .rule(&[Param::Text("n"), Param::Flag("pct")], |a| {
                format!("TOP {} PERCENT", a.text("n"))
            })
            .build()
            .unwrap();
        assert_eq!(rules.format("TOP 5").unwrap(), "TOP(5)");
        assert_eq!(rules.format("TOP PERCENT 5").unwrap(), "TOP 5 PERCENT");
    }

    #[test]
    fn test_matches_inside_literals_are_skipped() {
        assert_eq!(
            dates().format("SELECT 'it''s NOW()', NOW()").unwrap(),
            "SELECT 'it''s NOW()', GETDATE()"
        );
    }

    #[test]
    fn test_quoted_identifiers_are_skipped() {
        let booleans = RuleSet::builder("booleans", r"(?i)\b(?:(?P<t>TRUE)|(?P<f>FALSE))\b")
            .rule(&[Param::Group("t")], |_| "1".to_string())
            .rule(&[Param::Group("f")], |_| "0".to_string())
            .build()
            .unwrap();
        assert_eq!(
            booleans.format("SELECT [t].[false], \"true\", `false` WHERE [a] = TRUE").unwrap(),
            "SELECT [t].[false], \"true\", `false` WHERE [a] = 1"
        );
        assert_eq!(dates().format("SELECT [now()], NOW()").unwrap(), "SELECT [now()], GETDATE()");
    }

    #[test]
    fn test_quoted_spans() {
        assert_eq!(quoted_spans("a 'b' c 'd''e'"), vec![2..5, 8..14]);
        assert_eq!(quoted_spans("'open"), vec![0..5]);
        assert_eq!(quoted_spans("[a].\"b\"\"c\" `d`"), vec![0..3, 4..10, 11..14]);
    }

    #[test]
    fn test_concat_pipes_balances_parentheses() {
        assert_eq!(
            ConcatPipes
                .format("WHERE \"a\" LIKE CONCAT('%', LOWER(SUBSTR(\"b\", 1, 2)), '%')")
                .unwrap(),
            "WHERE \"a\" LIKE ('%' || LOWER(SUBSTR(\"b\", 1, 2)) || '%')"
        );
        assert_eq!(
            ConcatPipes.format("CONCAT(CONCAT(a, b), 'concat(x)')").unwrap(),
            "((a || b) || 'concat(x)')"
        );
    }

    #[test]
    fn error_concat_unclosed() {
        let err = ConcatPipes.format("SELECT CONCAT(a, b").unwrap_err();
        assert!(matches!(err, SqlError::Syntax(_)), "{err}");
    }

    #[test]
    fn test_split_arguments() {
        assert_eq!(
            split_arguments("a, 'x,y', f(b, c)"),
            vec!["a", "'x,y'", "f(b, c)"]
        );
    }
}
