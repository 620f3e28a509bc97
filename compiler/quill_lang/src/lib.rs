//! Quill Lang - syntax elements and how compiled triggers run.
//!
//! This crate provides:
//! - The syntax element traits addons implement: [`Expression`], [`Effect`],
//!   [`Section`], [`Event`] and [`Tag`], all sharing [`SyntaxElement`]
//! - [`TriggerContext`], the payload a trigger fires with
//! - [`TriggerBuilder`], which initializes elements against the
//!   [`ParserState`] and assembles them into a [`Trigger`]
//! - The walk engine: [`Trigger::run`] executes a statement chain, letting
//!   sections decide what runs next
//! - The core vocabulary: `loop`, `if`, `continue`, `whether`, `loop-value`
//!
//! # Walk model
//!
//! Execution is a loop over a cursor, not recursion. Each step asks the
//! current statement what runs next. Effects run and hand over to their
//! successor; sections enter their body or step past themselves. The engine
//! keeps the stack of active sections and all section state (loop cursors)
//! in a [`WalkContext`] created per invocation, so one compiled trigger can
//! run from several threads at once.

mod context;
mod element;
mod state;
mod trigger;
mod vocabulary;
mod walk;

#[cfg(test)]
mod test_helpers;

pub use context::{ContextKind, TriggerContext};
pub use element::{
    Effect, Entry, Event, Expression, Literal, ParseContext, ParseInfo, Section, SectionNode,
    Step, SyntaxElement, Tag,
};
pub use state::{OpenSection, ParserState};
pub use trigger::{StmtId, Trigger, TriggerBuilder};
pub use vocabulary::{EffContinue, ExprLoopValue, ExprWhether, SecConditional, SecLoop};
pub use walk::WalkContext;
