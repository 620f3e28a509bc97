//! Compiled triggers and their assembly.
//!
//! A [`Trigger`] stores its statements in a flat arena. Each node links to
//! its syntactic successor, its enclosing section and, for sections, the
//! first statement of its body.

use std::fmt;
use std::fmt::Write as _;

use quill_diagnostic::{Diagnostic, DiagnosticConfig, DiagnosticQueue, ErrorCode};
use quill_types::TypeSystem;

use crate::{
    Effect, Event, Expression, OpenSection, ParseContext, ParseInfo, ParserState, Section,
    SectionNode,
};

/// Index of a statement within its trigger.
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct StmtId(u32);

impl StmtId {
    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for StmtId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StmtId({})", self.0)
    }
}

pub(crate) enum Statement {
    Effect(Box<dyn Effect>),
    Section(Box<dyn Section>),
}

pub(crate) struct Node {
    pub(crate) statement: Statement,
    next: Option<StmtId>,
    parent: Option<StmtId>,
    body: Option<StmtId>,
}

/// A compiled statement chain, optionally guarded by an event.
pub struct Trigger {
    event: Option<Box<dyn Event>>,
    nodes: Vec<Node>,
    first: Option<StmtId>,
}

impl Trigger {
    pub fn event(&self) -> Option<&dyn Event> {
        self.event.as_deref()
    }

    pub fn first(&self) -> Option<StmtId> {
        self.first
    }

    /// Number of statements, at every depth.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub(crate) fn node(&self, id: StmtId) -> &Node {
        &self.nodes[id.index()]
    }

    /// What runs after `id` when it completes normally.
    pub fn successor(&self, id: StmtId) -> Option<StmtId> {
        let node = self.node(id);
        node.next.or(node.parent)
    }

    pub fn parent(&self, id: StmtId) -> Option<StmtId> {
        self.node(id).parent
    }

    pub(crate) fn section_node(&self, id: StmtId) -> SectionNode {
        SectionNode {
            id,
            body: self.node(id).body,
            after: self.successor(id),
        }
    }

    /// Whether the statement is a section that `continue` may target.
    pub fn is_loop(&self, id: StmtId) -> bool {
        matches!(&self.node(id).statement, Statement::Section(s) if s.is_loop())
    }

    /// Render the statement tree, one statement per line.
    pub fn describe(&self) -> String {
        let mut out = String::new();
        if let Some(event) = &self.event {
            let _ = writeln!(out, "on {}:", event.describe(false));
        }
        let base = usize::from(self.event.is_some());
        self.describe_chain(self.first, base, &mut out);
        out
    }

    fn describe_chain(&self, mut cursor: Option<StmtId>, depth: usize, out: &mut String) {
        while let Some(id) = cursor {
            let node = self.node(id);
            let indent = "    ".repeat(depth);
            match &node.statement {
                Statement::Effect(effect) => {
                    let _ = writeln!(out, "{indent}{}", effect.describe(false));
                }
                Statement::Section(section) => {
                    let _ = writeln!(out, "{indent}{}:", section.describe(false));
                    self.describe_chain(node.body, depth + 1, out);
                }
            }
            cursor = node.next;
        }
    }
}

impl fmt::Debug for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Trigger")
            .field("statements", &self.nodes.len())
            .field("has_event", &self.event.is_some())
            .finish()
    }
}

/// Assembles a [`Trigger`] statement by statement.
///
/// The matcher feeds elements in source order, opening and closing sections
/// as indentation changes. Each element is initialized against the current
/// [`ParserState`]; an element failing initialization is dropped with its
/// diagnostic, and a section failing initialization drops its whole body.
pub struct TriggerBuilder<'a> {
    types: &'a TypeSystem,
    state: ParserState,
    nodes: Vec<Node>,
    event: Option<Box<dyn Event>>,
    first: Option<StmtId>,
    /// Last statement appended at each open depth; index 0 is the top level.
    tails: Vec<Option<StmtId>>,
    /// Nesting depth inside a rejected section; statements there are skipped.
    rejected_depth: usize,
    diagnostics: DiagnosticQueue,
}

impl<'a> TriggerBuilder<'a> {
    pub fn new(types: &'a TypeSystem) -> Self {
        Self::with_config(types, DiagnosticConfig::default())
    }

    pub fn with_config(types: &'a TypeSystem, config: DiagnosticConfig) -> Self {
        TriggerBuilder {
            types,
            state: ParserState::new(),
            nodes: Vec::new(),
            event: None,
            first: None,
            tails: vec![None],
            rejected_depth: 0,
            diagnostics: DiagnosticQueue::with_config(config),
        }
    }

    pub fn state(&self) -> &ParserState {
        &self.state
    }

    fn parse_context(&self, info: ParseInfo) -> ParseContext<'_> {
        ParseContext {
            types: self.types,
            state: &self.state,
            info,
        }
    }

    fn reject(&mut self, what: &str, diagnostic: Diagnostic) {
        tracing::debug!(%diagnostic, "{what} rejected");
        self.diagnostics.add(diagnostic);
    }

    /// Set the event guarding the trigger.
    pub fn event(
        &mut self,
        mut event: Box<dyn Event>,
        expressions: Vec<Box<dyn Expression>>,
        info: ParseInfo,
    ) -> bool {
        match event.init(expressions, &self.parse_context(info)) {
            Ok(()) => {
                self.event = Some(event);
                true
            }
            Err(diagnostic) => {
                self.reject("event", diagnostic);
                false
            }
        }
    }

    /// Initialize a sub-expression at the current position.
    ///
    /// Returns `None`, with the diagnostic recorded, when it is rejected.
    pub fn expression(
        &mut self,
        mut expression: Box<dyn Expression>,
        expressions: Vec<Box<dyn Expression>>,
        info: ParseInfo,
    ) -> Option<Box<dyn Expression>> {
        match expression.init(expressions, &self.parse_context(info)) {
            Ok(()) => Some(expression),
            Err(diagnostic) => {
                self.reject("expression", diagnostic);
                None
            }
        }
    }

    /// Append an effect to the innermost open body.
    pub fn effect(
        &mut self,
        mut effect: Box<dyn Effect>,
        expressions: Vec<Box<dyn Expression>>,
        info: ParseInfo,
    ) -> bool {
        if self.rejected_depth > 0 {
            return false;
        }
        match effect.init(expressions, &self.parse_context(info)) {
            Ok(()) => {
                self.append(Statement::Effect(effect));
                true
            }
            Err(diagnostic) => {
                self.reject("effect", diagnostic);
                false
            }
        }
    }

    /// Append a section and make its body the innermost open body.
    pub fn open_section(
        &mut self,
        mut section: Box<dyn Section>,
        expressions: Vec<Box<dyn Expression>>,
        info: ParseInfo,
    ) -> bool {
        if self.rejected_depth > 0 {
            self.rejected_depth += 1;
            return false;
        }
        if let Err(diagnostic) = section.init(expressions, &self.parse_context(info)) {
            self.reject("section", diagnostic);
            self.rejected_depth = 1;
            return false;
        }
        let is_loop = section.is_loop();
        let description = section.describe(false);
        let id = self.append(Statement::Section(section));
        self.state.push(OpenSection {
            id,
            is_loop,
            description,
        });
        self.tails.push(None);
        true
    }

    /// Close the innermost open section.
    pub fn close_section(&mut self) {
        if self.rejected_depth > 0 {
            self.rejected_depth -= 1;
            return;
        }
        if self.state.pop().is_some() {
            self.tails.pop();
        } else {
            self.diagnostics.add(
                Diagnostic::error(ErrorCode::E3003)
                    .with_message("a section was closed, but none is open"),
            );
        }
    }

    fn append(&mut self, statement: Statement) -> StmtId {
        let id = StmtId(u32::try_from(self.nodes.len()).unwrap_or(u32::MAX));
        let parent = self.state.innermost_id();
        match self.tails.last().copied().flatten() {
            Some(previous) => self.nodes[previous.index()].next = Some(id),
            None => match parent {
                Some(section) => self.nodes[section.index()].body = Some(id),
                None => self.first = Some(id),
            },
        }
        if let Some(tail) = self.tails.last_mut() {
            *tail = Some(id);
        }
        self.nodes.push(Node {
            statement,
            next: None,
            parent,
            body: None,
        });
        id
    }

    /// Finish the trigger; sections still open are closed.
    ///
    /// Any error diagnostic produced along the way rejects the trigger.
    pub fn build(mut self) -> Result<Trigger, Vec<Diagnostic>> {
        if self.diagnostics.has_errors() {
            return Err(self.diagnostics.flush());
        }
        tracing::debug!(statements = self.nodes.len(), "trigger built");
        Ok(Trigger {
            event: self.event,
            nodes: self.nodes,
            first: self.first,
        })
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]
