//! Published syntax entries.
//!
//! Every entry keeps its compiled patterns, its priority and a factory
//! producing fresh, uninitialized element instances. Within a category the
//! matcher tries entries in the order [`sort_by_priority`] leaves them:
//! highest priority first, registration order among equals.

use std::fmt;
use std::sync::Arc;

use quill_lang::{ContextKind, Effect, Event, Expression, Section, Tag};
use quill_pattern::PatternNode;
use quill_types::TypeId;

/// One grammar string and its compiled tree.
#[derive(Clone, Debug, PartialEq)]
pub struct CompiledPattern {
    pub source: String,
    pub node: PatternNode,
}

/// A published syntax element of category `T`.
pub struct SyntaxInfo<T: ?Sized> {
    pub(crate) element: &'static str,
    pub(crate) factory: fn() -> Box<T>,
    pub(crate) patterns: Vec<CompiledPattern>,
    pub(crate) priority: i32,
    pub(crate) addon: Arc<str>,
}

impl<T: ?Sized> SyntaxInfo<T> {
    /// Rust type name of the element.
    pub fn element(&self) -> &'static str {
        self.element
    }

    pub fn patterns(&self) -> &[CompiledPattern] {
        &self.patterns
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// Name of the addon that registered the element.
    pub fn addon(&self) -> &str {
        &self.addon
    }

    /// A fresh instance, ready for `init`.
    pub fn create(&self) -> Box<T> {
        (self.factory)()
    }
}

impl<T: ?Sized> fmt::Debug for SyntaxInfo<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sources: Vec<&str> = self.patterns.iter().map(|p| p.source.as_str()).collect();
        f.debug_struct("SyntaxInfo")
            .field("element", &self.element)
            .field("patterns", &sources)
            .field("priority", &self.priority)
            .field("addon", &self.addon)
            .finish()
    }
}

/// A published expression.
#[derive(Debug)]
pub struct ExpressionInfo {
    pub(crate) syntax: SyntaxInfo<dyn Expression>,
    pub(crate) return_type: TypeId,
    pub(crate) is_single: bool,
}

impl ExpressionInfo {
    pub fn syntax(&self) -> &SyntaxInfo<dyn Expression> {
        &self.syntax
    }

    pub fn return_type(&self) -> TypeId {
        self.return_type
    }

    pub fn is_single(&self) -> bool {
        self.is_single
    }
}

/// A published event.
#[derive(Debug)]
pub struct EventInfo {
    pub(crate) syntax: SyntaxInfo<dyn Event>,
    pub(crate) handled_contexts: Vec<ContextKind>,
}

impl EventInfo {
    pub fn syntax(&self) -> &SyntaxInfo<dyn Event> {
        &self.syntax
    }

    /// Contexts a trigger on this event can fire with.
    pub fn handled_contexts(&self) -> &[ContextKind] {
        &self.handled_contexts
    }

    pub fn handles(&self, kind: ContextKind) -> bool {
        self.handled_contexts.contains(&kind)
    }
}

/// A published formatting tag.
pub struct TagInfo {
    pub(crate) name: &'static str,
    pub(crate) factory: fn() -> Box<dyn Tag>,
    pub(crate) priority: i32,
    pub(crate) addon: Arc<str>,
}

impl TagInfo {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn addon(&self) -> &str {
        &self.addon
    }

    pub fn create(&self) -> Box<dyn Tag> {
        (self.factory)()
    }
}

impl fmt::Debug for TagInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TagInfo")
            .field("name", &self.name)
            .field("priority", &self.priority)
            .finish_non_exhaustive()
    }
}

pub type EffectInfo = SyntaxInfo<dyn Effect>;
pub type SectionInfo = SyntaxInfo<dyn Section>;

/// Anything ranked by priority.
pub(crate) trait Ranked {
    fn rank(&self) -> i32;
}

impl<T: ?Sized> Ranked for SyntaxInfo<T> {
    fn rank(&self) -> i32 {
        self.priority
    }
}

impl Ranked for ExpressionInfo {
    fn rank(&self) -> i32 {
        self.syntax.priority
    }
}

impl Ranked for EventInfo {
    fn rank(&self) -> i32 {
        self.syntax.priority
    }
}

impl Ranked for TagInfo {
    fn rank(&self) -> i32 {
        self.priority
    }
}

/// Order for match attempts: descending priority, stable on registration
/// order.
pub(crate) fn sort_by_priority<T: Ranked>(entries: &mut [T]) {
    entries.sort_by_key(|entry| std::cmp::Reverse(entry.rank()));
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]
