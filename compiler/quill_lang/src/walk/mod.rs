//! The control-flow walk engine.
//!
//! Runs a [`Trigger`] as an explicit loop over a `(statement, entry)`
//! cursor. The stack of active sections mirrors the ancestors of the current
//! statement: a section is pushed when it enters its body and popped when it
//! hands control past itself. `continue` unwinds this stack to its target
//! loop, dropping whatever inner sections were active.

use std::any::Any;

use quill_types::{TypeSystem, Value};
use rustc_hash::FxHashMap;

use crate::trigger::Statement;
use crate::vocabulary::LoopState;
use crate::{Entry, Step, StmtId, Trigger, TriggerContext};

#[derive(Copy, Clone, Debug)]
struct ActiveSection {
    id: StmtId,
    is_loop: bool,
}

/// Execution state of one trigger invocation.
pub struct WalkContext<'a> {
    context: &'a dyn TriggerContext,
    types: &'a TypeSystem,
    /// Innermost last.
    active: Vec<ActiveSection>,
    /// Per-section state such as loop cursors, never shared between invocations.
    section_state: FxHashMap<StmtId, Box<dyn Any>>,
}

impl<'a> WalkContext<'a> {
    pub fn new(context: &'a dyn TriggerContext, types: &'a TypeSystem) -> Self {
        WalkContext {
            context,
            types,
            active: Vec::new(),
            section_state: FxHashMap::default(),
        }
    }

    pub fn context(&self) -> &'a dyn TriggerContext {
        self.context
    }

    pub fn types(&self) -> &'a TypeSystem {
        self.types
    }

    /// Active sections, innermost first.
    pub fn active_sections(&self) -> impl Iterator<Item = StmtId> + '_ {
        self.active.iter().rev().map(|s| s.id)
    }

    /// The innermost active loop.
    pub fn innermost_loop(&self) -> Option<StmtId> {
        self.active.iter().rev().find(|s| s.is_loop).map(|s| s.id)
    }

    pub fn is_active(&self, id: StmtId) -> bool {
        self.active.iter().any(|s| s.id == id)
    }

    pub fn section_state<T: Any>(&self, id: StmtId) -> Option<&T> {
        self.section_state.get(&id)?.downcast_ref()
    }

    pub fn section_state_mut<T: Any>(&mut self, id: StmtId) -> Option<&mut T> {
        self.section_state.get_mut(&id)?.downcast_mut()
    }

    pub fn set_section_state<T: Any>(&mut self, id: StmtId, state: T) {
        self.section_state.insert(id, Box::new(state));
    }

    pub fn clear_section_state(&mut self, id: StmtId) {
        self.section_state.remove(&id);
    }

    /// The value the innermost active loop is on.
    pub fn loop_value(&self) -> Option<&Value> {
        let id = self.innermost_loop()?;
        self.section_state::<LoopState>(id)?.current()
    }

    fn push_active(&mut self, id: StmtId, is_loop: bool) {
        self.active.push(ActiveSection { id, is_loop });
    }

    /// Pop `id` if it is the innermost active section.
    fn leave(&mut self, id: StmtId) {
        if self.active.last().is_some_and(|s| s.id == id) {
            self.active.pop();
        }
    }

    /// Drop every active section nested inside `id`.
    fn unwind_to(&mut self, id: StmtId) {
        while let Some(top) = self.active.last() {
            if top.id == id {
                break;
            }
            let popped = top.id;
            self.active.pop();
            self.section_state.remove(&popped);
        }
    }
}

impl Trigger {
    /// Fire the trigger with `context`.
    ///
    /// Returns `false` without running anything when the event's check fails.
    pub fn run(&self, context: &dyn TriggerContext, types: &TypeSystem) -> bool {
        let mut cx = WalkContext::new(context, types);
        if let Some(event) = self.event() {
            if !event.check(&cx) {
                tracing::trace!(context = context.name(), "event check failed");
                return false;
            }
        }
        self.walk(&mut cx);
        true
    }

    /// Walk the statement chain from the first statement.
    ///
    /// Returns the number of steps taken.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn walk(&self, cx: &mut WalkContext<'_>) -> usize {
        let mut cursor = self.first().map(|id| (id, Entry::Enter));
        let mut steps = 0usize;
        while let Some((id, entry)) = cursor {
            steps += 1;
            tracing::trace!(?id, ?entry, "walk");
            cursor = match &self.node(id).statement {
                Statement::Effect(effect) => match effect.walk(cx) {
                    Step::Next => self.successor(id).map(|next| self.arrive(next, cx)),
                    Step::Redirect {
                        section,
                        skip_to_next,
                    } => {
                        cx.unwind_to(section);
                        let entry = if skip_to_next {
                            Entry::NextIteration
                        } else {
                            Entry::Resume
                        };
                        Some((section, entry))
                    }
                    Step::Halt => None,
                },
                Statement::Section(section) => {
                    let node = self.section_node(id);
                    match section.walk(cx, node, entry) {
                        Some(target) if Some(target) == node.body => {
                            if entry == Entry::Enter {
                                cx.push_active(id, section.is_loop());
                            }
                            Some((target, Entry::Enter))
                        }
                        Some(target) => {
                            cx.leave(id);
                            Some(self.arrive(target, cx))
                        }
                        None => {
                            cx.leave(id);
                            None
                        }
                    }
                }
            };
        }
        tracing::debug!(steps, "walk finished");
        steps
    }

    /// Control moves to `target`: resume it when it is an active section,
    /// enter it otherwise.
    fn arrive(&self, target: StmtId, cx: &mut WalkContext<'_>) -> (StmtId, Entry) {
        if cx.is_active(target) {
            cx.unwind_to(target);
            (target, Entry::Resume)
        } else {
            (target, Entry::Enter)
        }
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]
