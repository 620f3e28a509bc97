//! Quill Pattern - grammar strings compiled into matchable trees.
//!
//! A grammar string such as `"[the] (first|last) %objects% of %text%"` is
//! compiled once, at registration time, into a [`PatternNode`] tree. The
//! matcher walks that tree; the registry ranks ambiguous syntaxes with
//! [`infer_priority`].
//!
//! # Grammar
//!
//! - literal words, matched verbatim
//! - `[...]` optional segment
//! - `(a|b|c)` ordered choice; `2¦b` gives an alternative the parse mark `2`
//! - `<regex>` regular-expression capture
//! - `%type1/type2%` expression slot; leading `~` accepts expressions only,
//!   `*` literals only, `=` accepts a conditional, `-` accepts no value
//! - `\` escapes the next character

mod node;
mod parser;
mod priority;

pub use node::{Acceptance, ChoiceAlternative, ExpressionSlot, PatternNode, RegexCapture};
pub use parser::parse_pattern;
pub use priority::{infer_priority, UnrankablePattern, DEFAULT_PRIORITY};
