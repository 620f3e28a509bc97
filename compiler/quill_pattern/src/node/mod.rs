//! Pattern tree node types.

use std::fmt;

use smallvec::SmallVec;

/// Which kinds of parsed input an expression slot takes.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub enum Acceptance {
    #[default]
    Both,
    ExpressionsOnly,
    LiteralsOnly,
}

/// An expression slot: `%~objects/text%`.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct ExpressionSlot {
    /// Accepted type names, singular or plural, as written.
    pub types: SmallVec<[String; 2]>,
    pub acceptance: Acceptance,
    /// `=`: a conditional expression may fill the slot.
    pub accepts_conditional: bool,
    /// `-`: the slot may be left without a value.
    pub nullable: bool,
}

impl ExpressionSlot {
    fn write_modifiers(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.nullable {
            f.write_str("-")?;
        }
        match self.acceptance {
            Acceptance::Both => {}
            Acceptance::ExpressionsOnly => f.write_str("~")?,
            Acceptance::LiteralsOnly => f.write_str("*")?,
        }
        if self.accepts_conditional {
            f.write_str("=")?;
        }
        Ok(())
    }
}

/// A compiled regex capture, compared by its source text.
#[derive(Clone, Debug)]
pub struct RegexCapture(regex::Regex);

impl RegexCapture {
    pub(crate) fn new(regex: regex::Regex) -> Self {
        RegexCapture(regex)
    }

    pub fn regex(&self) -> &regex::Regex {
        &self.0
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl PartialEq for RegexCapture {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for RegexCapture {}

/// One alternative of a choice group.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct ChoiceAlternative {
    pub node: PatternNode,
    /// Reported to the syntax element when this alternative matched.
    pub parse_mark: u32,
}

/// A compiled grammar string.
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum PatternNode {
    Text(String),
    Optional(Box<PatternNode>),
    Choice(Vec<ChoiceAlternative>),
    Regex(RegexCapture),
    Expression(ExpressionSlot),
    Compound(Vec<PatternNode>),
}

impl PatternNode {
    /// Whether this is literal text made only of whitespace (or nothing).
    pub fn is_blank_text(&self) -> bool {
        matches!(self, PatternNode::Text(text) if text.trim().is_empty())
    }

    /// Every expression slot in the tree, in source order.
    pub fn expression_slots(&self) -> Vec<&ExpressionSlot> {
        let mut slots = Vec::new();
        self.collect_slots(&mut slots);
        slots
    }

    fn collect_slots<'a>(&'a self, out: &mut Vec<&'a ExpressionSlot>) {
        match self {
            PatternNode::Text(_) | PatternNode::Regex(_) => {}
            PatternNode::Optional(inner) => inner.collect_slots(out),
            PatternNode::Choice(alternatives) => {
                for alternative in alternatives {
                    alternative.node.collect_slots(out);
                }
            }
            PatternNode::Expression(slot) => out.push(slot),
            PatternNode::Compound(children) => {
                for child in children {
                    child.collect_slots(out);
                }
            }
        }
    }
}

fn write_escaped_text(f: &mut fmt::Formatter<'_>, text: &str) -> fmt::Result {
    for c in text.chars() {
        if matches!(c, '[' | ']' | '(' | ')' | '<' | '%' | '|' | '\\') {
            f.write_str("\\")?;
        }
        write!(f, "{c}")?;
    }
    Ok(())
}

fn write_alternatives(f: &mut fmt::Formatter<'_>, alternatives: &[ChoiceAlternative]) -> fmt::Result {
    for (i, alternative) in alternatives.iter().enumerate() {
        if i > 0 {
            f.write_str("|")?;
        }
        if alternative.parse_mark != 0 {
            write!(f, "{}¦", alternative.parse_mark)?;
        }
        write!(f, "{}", alternative.node)?;
    }
    Ok(())
}

/// Renders the node back as a grammar string that compiles to an equal tree.
impl fmt::Display for PatternNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternNode::Text(text) => write_escaped_text(f, text),
            PatternNode::Optional(inner) => match inner.as_ref() {
                // `[a|b]` and `[1¦not]` compile to an optional choice
                PatternNode::Choice(alternatives)
                    if alternatives.len() > 1 || alternatives.iter().any(|a| a.parse_mark != 0) =>
                {
                    f.write_str("[")?;
                    write_alternatives(f, alternatives)?;
                    f.write_str("]")
                }
                _ => write!(f, "[{inner}]"),
            },
            PatternNode::Choice(alternatives) => {
                f.write_str("(")?;
                write_alternatives(f, alternatives)?;
                f.write_str(")")
            }
            PatternNode::Regex(capture) => {
                f.write_str("<")?;
                for c in capture.as_str().chars() {
                    if c == '>' {
                        f.write_str("\\")?;
                    }
                    write!(f, "{c}")?;
                }
                f.write_str(">")
            }
            PatternNode::Expression(slot) => {
                f.write_str("%")?;
                slot.write_modifiers(f)?;
                f.write_str(&slot.types.join("/"))?;
                f.write_str("%")
            }
            PatternNode::Compound(children) => {
                for child in children {
                    write!(f, "{child}")?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]
