//! Match priority inference.
//!
//! Syntaxes registered without an explicit priority are ranked from the
//! shape of their patterns. Higher priorities are attempted first:
//!
//! | Node | Priority |
//! |---|---|
//! | literal text | 5 |
//! | expression slot | 2 |
//! | regex capture | 1 |
//! | choice | lowest alternative |
//! | compound | lowest of the leading optional/blank run, capped at 3 with a regex child |

use crate::PatternNode;

/// Priority of a syntax whose patterns are all plain text, and of tags.
pub const DEFAULT_PRIORITY: i32 = 5;

const EXPRESSION_PRIORITY: i32 = 2;
const REGEX_PRIORITY: i32 = 1;
/// Ceiling for a compound with a regex capture among its children.
const REGEX_COMPOUND_CAP: i32 = 3;

/// A pattern tree the inferencer cannot rank.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("an optional group cannot be ranked on its own; wrap it in a compound pattern")]
pub struct UnrankablePattern;

/// Infer the priority of one compiled pattern.
///
/// A compound is ranked by its leading run: children are inspected from the
/// left, optional groups unwrapped, and the scan stops after the first child
/// that is neither optional nor blank text. An optional group standing alone
/// (the whole pattern, a choice alternative, or directly inside another
/// optional) has no leading run and is rejected.
pub fn infer_priority(node: &PatternNode) -> Result<i32, UnrankablePattern> {
    match node {
        PatternNode::Text(_) => Ok(DEFAULT_PRIORITY),
        PatternNode::Regex(_) => Ok(REGEX_PRIORITY),
        PatternNode::Expression(_) => Ok(EXPRESSION_PRIORITY),
        PatternNode::Choice(alternatives) => {
            alternatives
                .iter()
                .try_fold(DEFAULT_PRIORITY, |priority, alternative| {
                    Ok(priority.min(infer_priority(&alternative.node)?))
                })
        }
        PatternNode::Optional(_) => Err(UnrankablePattern),
        PatternNode::Compound(children) => {
            let mut priority = DEFAULT_PRIORITY;
            for child in children {
                let (inner, optional) = match child {
                    PatternNode::Optional(inner) => (inner.as_ref(), true),
                    other => (other, false),
                };
                priority = priority.min(infer_priority(inner)?);
                if !(optional || inner.is_blank_text()) {
                    break;
                }
            }
            if children.iter().any(|c| matches!(c, PatternNode::Regex(_))) {
                priority = priority.min(REGEX_COMPOUND_CAP);
            }
            Ok(priority)
        }
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]
