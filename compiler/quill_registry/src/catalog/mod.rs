//! The shared catalog of everything addons registered.
//!
//! A [`Catalog`] is cheap to clone and shared between the registering side
//! and every parser. Registration takes the write lock once per batch;
//! parsing only ever reads. Entries are never removed.

use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard};
use quill_diagnostic::{Diagnostic, DiagnosticConfig, DiagnosticQueue, ErrorCode};
use quill_pattern::PatternNode;
use quill_types::{TypeId, TypeRegistry, TypeSystem};

use crate::context_value::{ContextValue, ContextValueRegistry};
use crate::registration::{PendingContextValue, StagedBatch};
use crate::syntax::{
    sort_by_priority, EffectInfo, EventInfo, ExpressionInfo, SectionInfo, SyntaxInfo, TagInfo,
};

/// Catalog-wide settings.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CatalogConfig {
    /// Derive chained converters after every registration.
    pub derive_chained_converters: bool,
    /// Limits for the diagnostics of one registration.
    pub diagnostics: DiagnosticConfig,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        CatalogConfig {
            derive_chained_converters: true,
            diagnostics: DiagnosticConfig::default(),
        }
    }
}

/// An addon that registered with the catalog.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AddonInfo {
    name: Arc<str>,
    handled_events: Vec<&'static str>,
}

impl AddonInfo {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Element names of the events the addon registered.
    pub fn handled_events(&self) -> &[&'static str] {
        &self.handled_events
    }

    pub fn handles_event(&self, element: &str) -> bool {
        self.handled_events.contains(&element)
    }
}

/// Catalog contents, seen through [`Catalog::read`].
#[derive(Default)]
pub struct CatalogState {
    types: TypeSystem,
    expressions: Vec<ExpressionInfo>,
    effects: Vec<EffectInfo>,
    sections: Vec<SectionInfo>,
    events: Vec<EventInfo>,
    context_values: ContextValueRegistry,
    tags: Vec<TagInfo>,
    addons: Vec<AddonInfo>,
}

impl CatalogState {
    pub fn types(&self) -> &TypeSystem {
        &self.types
    }

    /// Expressions, in match order.
    pub fn expressions(&self) -> &[ExpressionInfo] {
        &self.expressions
    }

    /// Expressions whose values fit where `ty` is expected, in match order.
    pub fn expressions_returning(&self, ty: TypeId) -> impl Iterator<Item = &ExpressionInfo> {
        let types = self.types.types();
        self.expressions
            .iter()
            .filter(move |info| types.is_assignable(ty, info.return_type))
    }

    pub fn effects(&self) -> &[EffectInfo] {
        &self.effects
    }

    pub fn sections(&self) -> &[SectionInfo] {
        &self.sections
    }

    pub fn events(&self) -> &[EventInfo] {
        &self.events
    }

    pub fn context_values(&self) -> &ContextValueRegistry {
        &self.context_values
    }

    pub fn tags(&self) -> &[TagInfo] {
        &self.tags
    }

    pub fn tag(&self, name: &str) -> Option<&TagInfo> {
        let name = name.to_lowercase();
        self.tags.iter().find(|tag| tag.name.to_lowercase() == name)
    }

    pub fn addons(&self) -> &[AddonInfo] {
        &self.addons
    }

    pub fn addon(&self, name: &str) -> Option<&AddonInfo> {
        self.addons.iter().find(|addon| &*addon.name == name)
    }

    fn publish(&mut self, batch: StagedBatch, config: &CatalogConfig, diagnostics: &mut DiagnosticQueue) {
        let StagedBatch {
            addon,
            types,
            converters,
            comparators,
            expressions,
            effects,
            sections,
            events,
            context_values,
            tags,
        } = batch;

        let mut published = 0;
        for decl in types {
            match self.types.register_type(decl) {
                Ok(_) => published += 1,
                Err(diagnostic) => dropped(diagnostics, "type", diagnostic),
            }
        }
        tracing::debug!(count = published, "types published");

        let mut published = 0;
        for decl in converters {
            match self.types.register_converter(decl) {
                Ok(()) => published += 1,
                Err(diagnostic) => dropped(diagnostics, "converter", diagnostic),
            }
        }
        tracing::debug!(count = published, "converters published");

        let mut published = 0;
        for decl in comparators {
            match self.types.register_comparator(decl) {
                Ok(()) => published += 1,
                Err(diagnostic) => dropped(diagnostics, "comparator", diagnostic),
            }
        }
        tracing::debug!(count = published, "comparators published");

        let registry = self.types.types();
        let before = self.expressions.len();
        for staged in expressions {
            let Some(return_type) = registry.by_name(&staged.return_type).map(|d| d.id()) else {
                let diagnostic = Diagnostic::error(ErrorCode::E2001).with_message(format!(
                    "`{}` returns unknown type `{}`",
                    staged.syntax.element, staged.return_type
                ));
                dropped(diagnostics, "expression", diagnostic);
                continue;
            };
            if let Some(syntax) = check_slots(staged.syntax, registry, diagnostics) {
                self.expressions.push(ExpressionInfo {
                    syntax,
                    return_type,
                    is_single: staged.is_single,
                });
            }
        }
        tracing::debug!(count = self.expressions.len() - before, "expressions published");

        let before = self.effects.len();
        self.effects
            .extend(effects.into_iter().filter_map(|s| check_slots(s, registry, diagnostics)));
        tracing::debug!(count = self.effects.len() - before, "effects published");

        let before = self.sections.len();
        self.sections
            .extend(sections.into_iter().filter_map(|s| check_slots(s, registry, diagnostics)));
        tracing::debug!(count = self.sections.len() - before, "sections published");

        let before = self.events.len();
        let mut handled_events = Vec::new();
        for event in events {
            if let Some(syntax) = check_slots(event.syntax, registry, diagnostics) {
                handled_events.push(syntax.element);
                self.events.push(EventInfo {
                    syntax,
                    handled_contexts: event.handled_contexts,
                });
            }
        }
        tracing::debug!(count = self.events.len() - before, "events published");

        let before = self.context_values.len();
        for pending in context_values {
            match resolve_context_value(pending, registry) {
                Ok(value) => {
                    if let Err(diagnostic) = self.context_values.add(value) {
                        dropped(diagnostics, "context value", diagnostic);
                    }
                }
                Err(diagnostic) => dropped(diagnostics, "context value", diagnostic),
            }
        }
        tracing::debug!(
            count = self.context_values.len() - before,
            "context values published"
        );

        tracing::debug!(count = tags.len(), "tags published");
        self.tags.extend(tags);

        sort_by_priority(&mut self.expressions);
        sort_by_priority(&mut self.effects);
        sort_by_priority(&mut self.sections);
        sort_by_priority(&mut self.events);
        sort_by_priority(&mut self.tags);

        if config.derive_chained_converters {
            let derived = self.types.derive_chained_converters();
            tracing::debug!(count = derived, "chained converters derived");
        }

        match self.addons.iter_mut().find(|known| known.name == addon) {
            Some(known) => known.handled_events.extend(handled_events),
            None => self.addons.push(AddonInfo {
                name: addon,
                handled_events,
            }),
        }
    }
}

impl std::fmt::Debug for CatalogState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogState")
            .field("types", &self.types.types().len())
            .field("expressions", &self.expressions.len())
            .field("effects", &self.effects.len())
            .field("sections", &self.sections.len())
            .field("events", &self.events.len())
            .field("context_values", &self.context_values.len())
            .field("tags", &self.tags.len())
            .finish()
    }
}

fn dropped(diagnostics: &mut DiagnosticQueue, what: &str, diagnostic: Diagnostic) {
    tracing::warn!(code = %diagnostic.code, message = %diagnostic.message, "{what} dropped");
    diagnostics.add(diagnostic);
}

/// Drop the patterns whose slots name an unknown type.
///
/// `None`, with E2007, when no pattern is left.
fn check_slots<T: ?Sized>(
    mut syntax: SyntaxInfo<T>,
    types: &TypeRegistry,
    diagnostics: &mut DiagnosticQueue,
) -> Option<SyntaxInfo<T>> {
    let element = syntax.element;
    syntax.patterns.retain(|pattern| match unknown_slot_type(&pattern.node, types) {
        None => true,
        Some(name) => {
            let diagnostic = Diagnostic::error(ErrorCode::E2008)
                .with_message(format!("unknown type `{name}` in an expression slot of `{element}`"))
                .with_source(pattern.source.clone());
            dropped(diagnostics, "pattern", diagnostic);
            false
        }
    });
    if syntax.patterns.is_empty() {
        let diagnostic = Diagnostic::error(ErrorCode::E2007)
            .with_message(format!("`{element}` has no valid pattern left"));
        dropped(diagnostics, "syntax", diagnostic);
        return None;
    }
    Some(syntax)
}

fn unknown_slot_type(node: &PatternNode, types: &TypeRegistry) -> Option<String> {
    node.expression_slots()
        .into_iter()
        .flat_map(|slot| slot.types.iter())
        .find(|name| types.pattern_type(name).is_none())
        .cloned()
}

fn resolve_context_value(
    pending: PendingContextValue,
    types: &TypeRegistry,
) -> Result<ContextValue, Diagnostic> {
    let Some(return_type) = types.by_name(&pending.return_type).map(|d| d.id()) else {
        return Err(Diagnostic::error(ErrorCode::E2001).with_message(format!(
            "context value `{}` returns unknown type `{}`",
            pending.name, pending.return_type
        )));
    };
    Ok(ContextValue {
        context: pending.context,
        name: pending.name,
        return_type,
        is_single: pending.is_single,
        timeline: pending.timeline,
        usage: pending.usage,
        excluded: pending.excluded,
        extractor: pending.extractor,
    })
}

/// The process-wide vocabulary, shared by handle.
#[derive(Clone, Default)]
pub struct Catalog {
    config: Arc<CatalogConfig>,
    state: Arc<RwLock<CatalogState>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: CatalogConfig) -> Self {
        Catalog {
            config: Arc::new(config),
            state: Arc::default(),
        }
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    /// Read access for parsing and lookups.
    ///
    /// Registration blocks while a guard is alive.
    pub fn read(&self) -> RwLockReadGuard<'_, CatalogState> {
        self.state.read()
    }

    #[tracing::instrument(level = "debug", skip_all, fields(addon = %batch.addon))]
    pub(crate) fn publish(&self, batch: StagedBatch, diagnostics: &mut DiagnosticQueue) {
        self.state.write().publish(batch, &self.config, diagnostics);
    }
}

impl std::fmt::Debug for Catalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Catalog({:?})", &*self.state.read())
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]
