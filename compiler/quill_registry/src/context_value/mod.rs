//! Context values: named values a trigger reads from the context it fires
//! with, such as `the event-entity` or `past event-block`.
//!
//! A lookup names the context kind, the value name and a timeline. Matching
//! is exact on the kind (no covariance), case-insensitive on the name, and
//! compares the sign of the timeline only.

use std::fmt;
use std::sync::Arc;

use quill_diagnostic::{Diagnostic, ErrorCode};
use quill_lang::{ContextKind, TriggerContext};
use quill_types::{Data, TypeId, Value};
use rustc_hash::FxHashMap;

/// Extracts the raw values from a context of the registered kind.
pub type ContextValueFn = Arc<dyn Fn(&dyn TriggerContext) -> Vec<Data> + Send + Sync>;

/// When, relative to the firing, a context value is read.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub enum Timeline {
    Past,
    #[default]
    Present,
    Future,
}

impl Timeline {
    /// Normalize a signed offset: only its sign matters.
    pub fn from_offset(offset: i32) -> Self {
        match offset.signum() {
            -1 => Timeline::Past,
            1 => Timeline::Future,
            _ => Timeline::Present,
        }
    }

    pub fn offset(self) -> i32 {
        match self {
            Timeline::Past => -1,
            Timeline::Present => 0,
            Timeline::Future => 1,
        }
    }
}

/// Where a context value may be written in a script.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub enum Usage {
    /// Only as `[the] context-<name>` style expression.
    #[default]
    ExpressionOnly,
    /// Only as the bare name.
    StandaloneOnly,
    Both,
}

impl Usage {
    pub fn allows_standalone(self) -> bool {
        matches!(self, Usage::StandaloneOnly | Usage::Both)
    }

    pub fn allows_expression(self) -> bool {
        matches!(self, Usage::ExpressionOnly | Usage::Both)
    }
}

/// A registered context value.
pub struct ContextValue {
    pub(crate) context: ContextKind,
    pub(crate) name: String,
    pub(crate) return_type: TypeId,
    pub(crate) is_single: bool,
    pub(crate) timeline: Timeline,
    pub(crate) usage: Usage,
    pub(crate) excluded: Vec<ContextKind>,
    pub(crate) extractor: ContextValueFn,
}

impl ContextValue {
    pub fn context(&self) -> ContextKind {
        self.context
    }

    /// Lowercase name, without the standalone `*` marker.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn return_type(&self) -> TypeId {
        self.return_type
    }

    pub fn is_single(&self) -> bool {
        self.is_single
    }

    pub fn timeline(&self) -> Timeline {
        self.timeline
    }

    pub fn usage(&self) -> Usage {
        self.usage
    }

    pub fn excluded(&self) -> &[ContextKind] {
        &self.excluded
    }

    pub fn matches(&self, context: ContextKind, name: &str, timeline: Timeline) -> bool {
        self.matches_lowered(context, &name.to_lowercase(), timeline)
    }

    /// `name` must already be lowercased.
    fn matches_lowered(&self, context: ContextKind, name: &str, timeline: Timeline) -> bool {
        self.context == context && self.timeline == timeline && self.name == name
    }

    /// Read the value from `context`, typed with the registered return type.
    ///
    /// A context of another kind yields nothing.
    pub fn values(&self, context: &dyn TriggerContext) -> Vec<Value> {
        if context.kind() != self.context {
            return Vec::new();
        }
        (self.extractor)(context)
            .into_iter()
            .map(|data| Value::new(self.return_type, data))
            .collect()
    }
}

impl fmt::Debug for ContextValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextValue")
            .field("context", &self.context)
            .field("name", &self.name)
            .field("return_type", &self.return_type)
            .field("timeline", &self.timeline)
            .field("usage", &self.usage)
            .finish_non_exhaustive()
    }
}

/// All registered context values, indexed by context kind.
#[derive(Default)]
pub struct ContextValueRegistry {
    values: Vec<Arc<ContextValue>>,
    by_context: FxHashMap<ContextKind, Vec<usize>>,
}

impl ContextValueRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a value; a second registration of the same triple is rejected.
    pub fn add(&mut self, mut value: ContextValue) -> Result<(), Diagnostic> {
        value.name = value.name.to_lowercase();
        if self
            .find(value.context, &value.name, value.timeline)
            .is_some()
        {
            return Err(Diagnostic::error(ErrorCode::E2006).with_message(format!(
                "context value `{}` ({:?}) is already registered for `{}`",
                value.name,
                value.timeline,
                value.context.name()
            )));
        }
        let index = self.values.len();
        self.by_context.entry(value.context).or_default().push(index);
        self.values.push(Arc::new(value));
        Ok(())
    }

    /// The first registered value matching the triple.
    pub fn find(
        &self,
        context: ContextKind,
        name: &str,
        timeline: Timeline,
    ) -> Option<&Arc<ContextValue>> {
        let name = name.to_lowercase();
        self.by_context
            .get(&context)?
            .iter()
            .map(|&index| &self.values[index])
            .find(|value| value.matches_lowered(context, &name, timeline))
    }

    /// Values usable by a trigger whose event handles `contexts`.
    ///
    /// A value is usable when its kind is handled and none of the handled
    /// kinds is on its excluded list.
    pub fn available_for<'a>(
        &'a self,
        contexts: &'a [ContextKind],
    ) -> impl Iterator<Item = &'a Arc<ContextValue>> + 'a {
        self.values.iter().filter(move |value| {
            contexts.contains(&value.context)
                && !contexts.iter().any(|kind| value.excluded.contains(kind))
        })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<ContextValue>> {
        self.values.iter()
    }
}

impl fmt::Debug for ContextValueRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.values.iter()).finish()
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]
