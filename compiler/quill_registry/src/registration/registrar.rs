//! Builders for single declarations.
//!
//! A registrar borrows its [`SyntaxRegistration`](super::SyntaxRegistration)
//! and queues the declaration on [`register`](SyntaxRegistrar::register).
//! Dropping a registrar without registering discards the declaration.

use std::sync::Arc;

use quill_lang::{ContextKind, Event, TriggerContext};
use quill_types::{Arithmetic, Changer, Data, TypeDecl, Value};

use super::{
    PendingContextValue, PendingEvent, PendingExpression, PendingSyntax, SyntaxRegistration,
};
use crate::error::check_priority;
use crate::{RegistrationError, Timeline, Usage};

/// Registrar for effects and sections.
#[must_use = "a declaration is only queued by `register`"]
pub struct SyntaxRegistrar<'r, T: ?Sized> {
    pub(super) target: &'r mut Vec<PendingSyntax<T>>,
    pub(super) pending: PendingSyntax<T>,
}

impl<T: ?Sized> SyntaxRegistrar<'_, T> {
    pub fn add_patterns(mut self, patterns: &[&str]) -> Self {
        self.pending.add_patterns(patterns);
        self
    }

    /// Use `priority` instead of inferring one from the patterns.
    pub fn priority(mut self, priority: i32) -> Result<Self, RegistrationError> {
        self.pending.priority = Some(check_priority(priority)?);
        Ok(self)
    }

    pub fn register(self) {
        self.target.push(self.pending);
    }
}

/// Registrar for expressions.
#[must_use = "a declaration is only queued by `register`"]
pub struct ExpressionRegistrar<'r> {
    pub(super) target: &'r mut Vec<PendingExpression>,
    pub(super) pending: PendingExpression,
}

impl ExpressionRegistrar<'_> {
    pub fn add_patterns(mut self, patterns: &[&str]) -> Self {
        self.pending.syntax.add_patterns(patterns);
        self
    }

    pub fn priority(mut self, priority: i32) -> Result<Self, RegistrationError> {
        self.pending.syntax.priority = Some(check_priority(priority)?);
        Ok(self)
    }

    pub fn register(self) {
        self.target.push(self.pending);
    }
}

/// Registrar for events.
///
/// Context values declared here belong to a context the event handles, which
/// is added to the handled contexts.
#[must_use = "a declaration is only queued by `register`"]
pub struct EventRegistrar<'r> {
    pub(super) registration: &'r mut SyntaxRegistration,
    pub(super) pending: PendingSyntax<dyn Event>,
    pub(super) handled: Vec<ContextKind>,
}

impl EventRegistrar<'_> {
    /// Event patterns get an implicit `[on] ` prefix unless they start with
    /// `*`, which is removed instead.
    pub fn add_patterns(mut self, patterns: &[&str]) -> Self {
        for pattern in patterns {
            self.pending.patterns.push(event_pattern(pattern));
        }
        self
    }

    pub fn priority(mut self, priority: i32) -> Result<Self, RegistrationError> {
        self.pending.priority = Some(check_priority(priority)?);
        Ok(self)
    }

    pub fn handled_contexts(mut self, contexts: &[ContextKind]) -> Self {
        for &kind in contexts {
            if !self.handled.contains(&kind) {
                self.handled.push(kind);
            }
        }
        self
    }

    /// A single, present-time context value of `C`.
    pub fn context_value<C, F>(mut self, name: &str, return_type: &str, extractor: F) -> Self
    where
        C: TriggerContext,
        F: Fn(&C) -> Vec<Data> + Send + Sync + 'static,
    {
        let kind = ContextKind::of::<C>();
        self = self.handled_contexts(&[kind]);
        self.registration
            .new_context_value::<C, F>(name, return_type, extractor)
            .register();
        self
    }

    pub fn register(self) {
        let EventRegistrar {
            registration,
            pending,
            handled,
        } = self;
        registration.events.push(PendingEvent {
            syntax: pending,
            handled,
        });
    }
}

pub(super) fn event_pattern(pattern: &str) -> String {
    match pattern.strip_prefix('*') {
        Some(verbatim) => verbatim.to_string(),
        None => format!("[on] {pattern}"),
    }
}

/// Registrar for types.
#[must_use = "a declaration is only queued by `register`"]
pub struct TypeRegistrar<'r> {
    pub(super) target: &'r mut Vec<TypeDecl>,
    pub(super) decl: TypeDecl,
}

impl TypeRegistrar<'_> {
    pub fn supertype(mut self, name: &str) -> Self {
        self.decl.supertype = Some(name.to_string());
        self
    }

    pub fn literal_parser<F>(mut self, parser: F) -> Self
    where
        F: Fn(&str) -> Option<Data> + Send + Sync + 'static,
    {
        self.decl.parser = Some(Arc::new(parser));
        self
    }

    pub fn display<F>(mut self, display: F) -> Self
    where
        F: Fn(&Value) -> String + Send + Sync + 'static,
    {
        self.decl.display = Some(Arc::new(display));
        self
    }

    pub fn changer(mut self, changer: impl Changer + 'static) -> Self {
        self.decl.changer = Some(Arc::new(changer));
        self
    }

    pub fn arithmetic(mut self, arithmetic: impl Arithmetic + 'static) -> Self {
        self.decl.arithmetic = Some(Arc::new(arithmetic));
        self
    }

    pub fn register(self) {
        self.target.push(self.decl);
    }
}

/// Registrar for context values.
#[must_use = "a declaration is only queued by `register`"]
pub struct ContextValueRegistrar<'r> {
    pub(super) target: &'r mut Vec<PendingContextValue>,
    pub(super) pending: PendingContextValue,
}

impl ContextValueRegistrar<'_> {
    pub fn single(mut self, is_single: bool) -> Self {
        self.pending.is_single = is_single;
        self
    }

    pub fn timeline(mut self, timeline: Timeline) -> Self {
        self.pending.timeline = timeline;
        self
    }

    pub fn usage(mut self, usage: Usage) -> Self {
        self.pending.usage = usage;
        self
    }

    /// Hide the value from triggers whose event handles any of `contexts`.
    pub fn excluded(mut self, contexts: &[ContextKind]) -> Self {
        self.pending.excluded.extend_from_slice(contexts);
        self
    }

    pub fn register(self) {
        self.target.push(self.pending);
    }
}

/// Builds the `(owner, property)` pattern pair of a property expression.
pub(super) fn property_patterns(owner: &str, property: &str) -> [String; 2] {
    let owner = owner_form(owner);
    [
        format!("{owner}'[s] {property}"),
        format!("[the] {property} of {owner}"),
    ]
}

/// `*text` is literal owner text; anything else names the owner types.
fn owner_form(owner: &str) -> String {
    match owner.strip_prefix('*') {
        Some(literal) => literal.to_string(),
        None => format!("%{owner}%"),
    }
}

/// The verb a property conditional is phrased with.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ConditionalType {
    /// `x is y`, `x isn't y`
    Be,
    /// `x can y`, `x can't y`
    Can,
    /// `x has y`, `x doesn't have y`
    Have,
}

/// Affirmative and negated patterns of a property conditional.
///
/// Every negated alternative carries parse mark 1.
pub(super) fn conditional_patterns(
    performer: &str,
    conditional: ConditionalType,
    property: &str,
) -> [String; 2] {
    let performer = owner_form(performer);
    match conditional {
        ConditionalType::Be => [
            format!("{performer} (is|are) {property}"),
            format!("{performer} (1¦isn't|1¦is not|1¦aren't|1¦are not) {property}"),
        ],
        ConditionalType::Can => [
            format!("{performer} can {property}"),
            format!("{performer} (1¦can't|1¦cannot|1¦can not) {property}"),
        ],
        ConditionalType::Have => [
            format!("{performer} (has|have) {property}"),
            format!("{performer} (1¦doesn't|1¦does not|1¦don't|1¦do not) have {property}"),
        ],
    }
}
