//! Recursive-descent compiler from grammar strings to [`PatternNode`] trees.
//!
//! Works on byte offsets so diagnostics can label the offending part of the
//! grammar string. Every failure is a recoverable [`Diagnostic`]: the
//! registry drops the pattern alternative and carries on.

use quill_diagnostic::{Diagnostic, ErrorCode, Span};
use smallvec::SmallVec;

use crate::{Acceptance, ChoiceAlternative, ExpressionSlot, PatternNode, RegexCapture};

/// Separator between a choice alternative's parse mark and its text.
const MARK_SEPARATOR: char = '¦';

/// Compile a grammar string.
#[tracing::instrument(level = "trace", skip_all, fields(pattern = source))]
pub fn parse_pattern(source: &str) -> Result<PatternNode, Diagnostic> {
    let mut parser = PatternParser { source, pos: 0 };
    parser
        .sequence(Group::Root)
        .map_err(|diag| diag.with_source(source))
}

/// What encloses the sequence being parsed.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
enum Group {
    Root,
    /// `[` at the given offset.
    Optional(usize),
    /// `(` at the given offset.
    Choice(usize),
}

impl Group {
    /// Offset of the opener, the opener and the expected closer.
    fn delimiters(self) -> Option<(usize, char, char)> {
        match self {
            Group::Root => None,
            Group::Optional(open) => Some((open, '[', ']')),
            Group::Choice(open) => Some((open, '(', ')')),
        }
    }
}

struct PatternParser<'a> {
    source: &'a str,
    pos: usize,
}

impl PatternParser<'_> {
    fn peek(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    fn bump(&mut self, c: char) {
        self.pos += c.len_utf8();
    }

    /// Parse until the end of `group`, leaving `|` and the closer for
    /// [`Self::alternatives`].
    fn sequence(&mut self, group: Group) -> Result<PatternNode, Diagnostic> {
        let mut nodes = Vec::new();
        let mut text = String::new();

        loop {
            let start = self.pos;
            let Some(c) = self.peek() else {
                return match group.delimiters() {
                    None => Ok(finish(nodes, text)),
                    Some((open, opener, closer)) => Err(unclosed(open, opener, closer)),
                };
            };
            match c {
                '\\' => {
                    self.bump(c);
                    let Some(escaped) = self.peek() else {
                        return Err(Diagnostic::error(ErrorCode::E1005)
                            .with_message("the pattern ends with an escape character")
                            .with_label(Span::from_range(start..start + 1), "nothing to escape"));
                    };
                    self.bump(escaped);
                    text.push(escaped);
                }
                '[' => {
                    self.bump(c);
                    let mut alternatives = self.alternatives(Group::Optional(start))?;
                    let inner = match alternatives.pop() {
                        Some(only) if alternatives.is_empty() && only.parse_mark == 0 => only.node,
                        Some(last) => {
                            alternatives.push(last);
                            PatternNode::Choice(alternatives)
                        }
                        None => PatternNode::Text(String::new()),
                    };
                    flush(&mut nodes, &mut text);
                    nodes.push(PatternNode::Optional(Box::new(inner)));
                }
                '(' => {
                    self.bump(c);
                    let alternatives = self.alternatives(Group::Choice(start))?;
                    flush(&mut nodes, &mut text);
                    nodes.push(PatternNode::Choice(alternatives));
                }
                '<' => {
                    self.bump(c);
                    let regex = self.regex(start)?;
                    flush(&mut nodes, &mut text);
                    nodes.push(regex);
                }
                '%' => {
                    self.bump(c);
                    let slot = self.slot(start)?;
                    flush(&mut nodes, &mut text);
                    nodes.push(PatternNode::Expression(slot));
                }
                ']' | '|' if matches!(group, Group::Optional(_)) => {
                    return Ok(finish(nodes, text));
                }
                ')' | '|' if matches!(group, Group::Choice(_)) => {
                    return Ok(finish(nodes, text));
                }
                ']' | ')' | '|' => {
                    let message = if c == '|' {
                        "`|` outside of a choice group".to_string()
                    } else {
                        format!("unmatched closing `{c}`")
                    };
                    return Err(Diagnostic::error(ErrorCode::E1002)
                        .with_message(message)
                        .with_label(Span::from_range(start..start + 1), "no group to close here"));
                }
                _ => {
                    self.bump(c);
                    text.push(c);
                }
            }
        }
    }

    /// Parse the `|`-separated alternatives of a group, consuming its closer.
    fn alternatives(&mut self, group: Group) -> Result<Vec<ChoiceAlternative>, Diagnostic> {
        let Some((open, opener, closer)) = group.delimiters() else {
            let node = self.sequence(group)?;
            return Ok(vec![ChoiceAlternative { node, parse_mark: 0 }]);
        };
        let mut alternatives = Vec::new();
        loop {
            let parse_mark = self.parse_mark();
            let node = self.sequence(group)?;
            alternatives.push(ChoiceAlternative { node, parse_mark });
            match self.peek() {
                Some('|') => self.bump('|'),
                Some(c) if c == closer => {
                    self.bump(c);
                    return Ok(alternatives);
                }
                // `sequence` only stops early on `|` or the closer.
                _ => return Err(unclosed(open, opener, closer)),
            }
        }
    }

    /// Consume a leading `N¦` and return `N`, or 0 when absent.
    fn parse_mark(&mut self) -> u32 {
        let rest = &self.source[self.pos..];
        let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
        if digits == 0 || !rest[digits..].starts_with(MARK_SEPARATOR) {
            return 0;
        }
        let Ok(mark) = rest[..digits].parse() else {
            return 0;
        };
        self.pos += digits + MARK_SEPARATOR.len_utf8();
        mark
    }

    /// Parse a regex capture opened at `open`, up to the first unescaped `>`.
    fn regex(&mut self, open: usize) -> Result<PatternNode, Diagnostic> {
        let mut body = String::new();
        loop {
            let Some(c) = self.peek() else {
                return Err(unclosed(open, '<', '>'));
            };
            self.bump(c);
            match c {
                '>' => break,
                '\\' if self.peek() == Some('>') => {
                    self.bump('>');
                    body.push('>');
                }
                _ => body.push(c),
            }
        }
        match regex::Regex::new(&body) {
            Ok(regex) => Ok(PatternNode::Regex(RegexCapture::new(regex))),
            Err(err) => Err(Diagnostic::error(ErrorCode::E1003)
                .with_message(format!("`{body}` is not a valid regular expression"))
                .with_label(Span::from_range(open..self.pos), "in this capture")
                .with_note(err.to_string())),
        }
    }

    /// Parse an expression slot opened at `open`.
    fn slot(&mut self, open: usize) -> Result<ExpressionSlot, Diagnostic> {
        let Some(len) = self.source[self.pos..].find('%') else {
            return Err(unclosed(open, '%', '%'));
        };
        let body = &self.source[self.pos..self.pos + len];
        self.pos += len + 1;
        let span = Span::from_range(open..self.pos);

        let mut slot = ExpressionSlot {
            types: SmallVec::new(),
            acceptance: Acceptance::Both,
            accepts_conditional: false,
            nullable: false,
        };
        let mut rest = body.trim();
        while let Some(c) = rest.chars().next() {
            match c {
                '-' => slot.nullable = true,
                '=' => slot.accepts_conditional = true,
                '~' | '*' => {
                    let acceptance = if c == '~' {
                        Acceptance::ExpressionsOnly
                    } else {
                        Acceptance::LiteralsOnly
                    };
                    if slot.acceptance != Acceptance::Both && slot.acceptance != acceptance {
                        return Err(Diagnostic::error(ErrorCode::E1006)
                            .with_message("an expression slot cannot take only literals and only expressions")
                            .with_label(span, "`~` and `*` both given"));
                    }
                    slot.acceptance = acceptance;
                }
                _ => break,
            }
            rest = &rest[c.len_utf8()..];
        }

        for name in rest.split('/') {
            let name = name.trim();
            if name.is_empty() {
                return Err(Diagnostic::error(ErrorCode::E1004)
                    .with_message("expression slot names no type")
                    .with_label(span, "expected a type name"));
            }
            if let Some(bad) = name
                .chars()
                .find(|c| !(c.is_alphanumeric() || *c == ' ' || *c == '_'))
            {
                return Err(Diagnostic::error(ErrorCode::E1006)
                    .with_message(format!("unexpected `{bad}` in expression slot `{name}`"))
                    .with_label(span, "modifiers go before the first type")
                    .with_note("valid modifiers are `-`, `~`, `*` and `=`"));
            }
            slot.types.push(name.to_string());
        }
        Ok(slot)
    }
}

fn unclosed(open: usize, opener: char, closer: char) -> Diagnostic {
    Diagnostic::error(ErrorCode::E1001)
        .with_message(format!("unclosed `{opener}`"))
        .with_label(
            Span::from_range(open..open + opener.len_utf8()),
            format!("expected a matching `{closer}`"),
        )
}

fn flush(nodes: &mut Vec<PatternNode>, text: &mut String) {
    if !text.is_empty() {
        nodes.push(PatternNode::Text(std::mem::take(text)));
    }
}

fn finish(mut nodes: Vec<PatternNode>, mut text: String) -> PatternNode {
    flush(&mut nodes, &mut text);
    match nodes.len() {
        0 => PatternNode::Text(String::new()),
        1 => nodes.remove(0),
        _ => PatternNode::Compound(nodes),
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]
