//! Per-addon registration.
//!
//! An addon fills a [`SyntaxRegistration`] with declarations and hands it to
//! [`register`](SyntaxRegistration::register), the only point where anything
//! reaches the shared [`Catalog`].
//!
//! # Registration is staged
//!
//! 1. Every grammar string is compiled and every priority inferred or
//!    checked, without touching the catalog. A malformed pattern is reported
//!    and dropped; an unrankable one fails the whole batch.
//! 2. The staged batch is published under the catalog write lock: types,
//!    converters, comparators, syntaxes, context values, then tags.
//!    Declarations naming unknown types are reported and dropped.

mod registrar;

use std::sync::Arc;

use quill_diagnostic::{Diagnostic, DiagnosticQueue, ErrorCode};
use quill_lang::{ContextKind, Effect, Event, Expression, Section, Tag, TriggerContext};
use quill_pattern::{infer_priority, parse_pattern, DEFAULT_PRIORITY};
use quill_types::{
    ComparatorDecl, ConverterDecl, ConverterOptions, Data, Relation, TypeDecl, Value,
};

pub use registrar::{
    ConditionalType, ContextValueRegistrar, EventRegistrar, ExpressionRegistrar,
    SyntaxRegistrar, TypeRegistrar,
};

use crate::error::check_priority;
use crate::syntax::{CompiledPattern, EventInfo, SyntaxInfo, TagInfo};
use crate::{Catalog, ContextValueFn, RegistrationError, Timeline, Usage};

/// Name of the type property conditionals return.
pub(crate) const BOOLEAN: &str = "boolean";

/// A syntax declaration whose patterns are not compiled yet.
pub(crate) struct PendingSyntax<T: ?Sized> {
    element: &'static str,
    factory: fn() -> Box<T>,
    patterns: Vec<String>,
    priority: Option<i32>,
}

impl<T: ?Sized> PendingSyntax<T> {
    fn new(element: &'static str, factory: fn() -> Box<T>, patterns: &[&str]) -> Self {
        PendingSyntax {
            element,
            factory,
            patterns: patterns.iter().map(|p| (*p).to_string()).collect(),
            priority: None,
        }
    }

    fn add_patterns(&mut self, patterns: &[&str]) {
        self.patterns.extend(patterns.iter().map(|p| (*p).to_string()));
    }
}

pub(crate) struct PendingExpression {
    syntax: PendingSyntax<dyn Expression>,
    return_type: String,
    is_single: bool,
}

pub(crate) struct PendingEvent {
    syntax: PendingSyntax<dyn Event>,
    handled: Vec<ContextKind>,
}

pub(crate) struct PendingContextValue {
    pub(crate) context: ContextKind,
    pub(crate) name: String,
    pub(crate) return_type: String,
    pub(crate) is_single: bool,
    pub(crate) timeline: Timeline,
    pub(crate) usage: Usage,
    pub(crate) excluded: Vec<ContextKind>,
    pub(crate) extractor: ContextValueFn,
}

struct PendingTag {
    name: &'static str,
    factory: fn() -> Box<dyn Tag>,
    priority: i32,
}

/// Declarations of one addon, waiting to be registered.
pub struct SyntaxRegistration {
    addon: Arc<str>,
    types: Vec<TypeDecl>,
    converters: Vec<ConverterDecl>,
    comparators: Vec<ComparatorDecl>,
    expressions: Vec<PendingExpression>,
    effects: Vec<PendingSyntax<dyn Effect>>,
    sections: Vec<PendingSyntax<dyn Section>>,
    events: Vec<PendingEvent>,
    context_values: Vec<PendingContextValue>,
    tags: Vec<PendingTag>,
}

fn expression_instance<E: Expression + Default + 'static>() -> Box<dyn Expression> {
    Box::new(E::default())
}

fn effect_instance<E: Effect + Default + 'static>() -> Box<dyn Effect> {
    Box::new(E::default())
}

fn section_instance<S: Section + Default + 'static>() -> Box<dyn Section> {
    Box::new(S::default())
}

fn event_instance<E: Event + Default + 'static>() -> Box<dyn Event> {
    Box::new(E::default())
}

fn tag_instance<T: Tag + Default + 'static>() -> Box<dyn Tag> {
    Box::new(T::default())
}

impl SyntaxRegistration {
    pub fn new(addon: &str) -> Self {
        SyntaxRegistration {
            addon: Arc::from(addon),
            types: Vec::new(),
            converters: Vec::new(),
            comparators: Vec::new(),
            expressions: Vec::new(),
            effects: Vec::new(),
            sections: Vec::new(),
            events: Vec::new(),
            context_values: Vec::new(),
            tags: Vec::new(),
        }
    }

    pub fn addon(&self) -> &str {
        &self.addon
    }

    // Expressions

    pub fn new_expression<E: Expression + Default + 'static>(
        &mut self,
        return_type: &str,
        is_single: bool,
        patterns: &[&str],
    ) -> ExpressionRegistrar<'_> {
        ExpressionRegistrar {
            target: &mut self.expressions,
            pending: PendingExpression {
                syntax: PendingSyntax::new(
                    std::any::type_name::<E>(),
                    expression_instance::<E>,
                    patterns,
                ),
                return_type: return_type.to_string(),
                is_single,
            },
        }
    }

    pub fn add_expression<E: Expression + Default + 'static>(
        &mut self,
        return_type: &str,
        is_single: bool,
        patterns: &[&str],
    ) {
        self.new_expression::<E>(return_type, is_single, patterns)
            .register();
    }

    pub fn add_expression_with_priority<E: Expression + Default + 'static>(
        &mut self,
        return_type: &str,
        is_single: bool,
        priority: i32,
        patterns: &[&str],
    ) -> Result<(), RegistrationError> {
        self.new_expression::<E>(return_type, is_single, patterns)
            .priority(priority)?
            .register();
        Ok(())
    }

    /// An expression reading `property` of `owner`, matched as
    /// `owner's property` and `the property of owner`.
    ///
    /// `owner` names the owner types; a leading `*` makes it literal text.
    /// Property expressions are never single.
    pub fn new_property_expression<E: Expression + Default + 'static>(
        &mut self,
        return_type: &str,
        owner: &str,
        property: &str,
    ) -> ExpressionRegistrar<'_> {
        let [possessive, of] = registrar::property_patterns(owner, property);
        self.new_expression::<E>(return_type, false, &[&possessive, &of])
    }

    pub fn add_property_expression<E: Expression + Default + 'static>(
        &mut self,
        return_type: &str,
        owner: &str,
        property: &str,
    ) {
        self.new_property_expression::<E>(return_type, owner, property)
            .register();
    }

    pub fn add_property_expression_with_priority<E: Expression + Default + 'static>(
        &mut self,
        return_type: &str,
        owner: &str,
        property: &str,
        priority: i32,
    ) -> Result<(), RegistrationError> {
        self.new_property_expression::<E>(return_type, owner, property)
            .priority(priority)?
            .register();
        Ok(())
    }

    /// A boolean expression phrased with `conditional`, such as
    /// `%players% (is|are) flying`.
    ///
    /// Negated forms report parse mark 1.
    pub fn add_property_conditional<E: Expression + Default + 'static>(
        &mut self,
        performer: &str,
        conditional: ConditionalType,
        property: &str,
    ) {
        let [affirmative, negated] =
            registrar::conditional_patterns(performer, conditional, property);
        self.add_expression::<E>(BOOLEAN, true, &[&affirmative, &negated]);
    }

    pub fn add_property_conditional_with_priority<E: Expression + Default + 'static>(
        &mut self,
        performer: &str,
        conditional: ConditionalType,
        property: &str,
        priority: i32,
    ) -> Result<(), RegistrationError> {
        let [affirmative, negated] =
            registrar::conditional_patterns(performer, conditional, property);
        self.add_expression_with_priority::<E>(BOOLEAN, true, priority, &[&affirmative, &negated])
    }

    /// An element usable both as an expression and as an effect.
    pub fn add_executable_expression<E>(&mut self, return_type: &str, is_single: bool, patterns: &[&str])
    where
        E: Expression + Effect + Default + 'static,
    {
        self.add_expression::<E>(return_type, is_single, patterns);
        self.add_effect::<E>(patterns);
    }

    pub fn add_executable_expression_with_priority<E>(
        &mut self,
        return_type: &str,
        is_single: bool,
        priority: i32,
        patterns: &[&str],
    ) -> Result<(), RegistrationError>
    where
        E: Expression + Effect + Default + 'static,
    {
        self.add_expression_with_priority::<E>(return_type, is_single, priority, patterns)?;
        self.add_effect_with_priority::<E>(priority, patterns)
    }

    // Effects and sections

    pub fn new_effect<E: Effect + Default + 'static>(
        &mut self,
        patterns: &[&str],
    ) -> SyntaxRegistrar<'_, dyn Effect> {
        SyntaxRegistrar {
            target: &mut self.effects,
            pending: PendingSyntax::new(std::any::type_name::<E>(), effect_instance::<E>, patterns),
        }
    }

    pub fn add_effect<E: Effect + Default + 'static>(&mut self, patterns: &[&str]) {
        self.new_effect::<E>(patterns).register();
    }

    pub fn add_effect_with_priority<E: Effect + Default + 'static>(
        &mut self,
        priority: i32,
        patterns: &[&str],
    ) -> Result<(), RegistrationError> {
        self.new_effect::<E>(patterns).priority(priority)?.register();
        Ok(())
    }

    pub fn new_section<S: Section + Default + 'static>(
        &mut self,
        patterns: &[&str],
    ) -> SyntaxRegistrar<'_, dyn Section> {
        SyntaxRegistrar {
            target: &mut self.sections,
            pending: PendingSyntax::new(std::any::type_name::<S>(), section_instance::<S>, patterns),
        }
    }

    pub fn add_section<S: Section + Default + 'static>(&mut self, patterns: &[&str]) {
        self.new_section::<S>(patterns).register();
    }

    pub fn add_section_with_priority<S: Section + Default + 'static>(
        &mut self,
        priority: i32,
        patterns: &[&str],
    ) -> Result<(), RegistrationError> {
        self.new_section::<S>(patterns).priority(priority)?.register();
        Ok(())
    }

    // Events

    pub fn new_event<E: Event + Default + 'static>(&mut self, patterns: &[&str]) -> EventRegistrar<'_> {
        let pending = PendingSyntax::new(std::any::type_name::<E>(), event_instance::<E>, &[]);
        EventRegistrar {
            registration: self,
            pending,
            handled: Vec::new(),
        }
        .add_patterns(patterns)
    }

    // Types, converters and comparators

    /// A type named `name`; `pattern` spells its forms, as in `number¦s`.
    pub fn new_type(&mut self, name: &str, pattern: &str) -> TypeRegistrar<'_> {
        TypeRegistrar {
            target: &mut self.types,
            decl: TypeDecl::new(name, pattern),
        }
    }

    pub fn add_type(&mut self, name: &str, pattern: &str) {
        self.new_type(name, pattern).register();
    }

    pub fn add_converter<F>(&mut self, from: &str, to: &str, function: F)
    where
        F: Fn(&Value) -> Option<Data> + Send + Sync + 'static,
    {
        self.add_converter_with_options(from, to, ConverterOptions::empty(), function);
    }

    pub fn add_converter_with_options<F>(
        &mut self,
        from: &str,
        to: &str,
        options: ConverterOptions,
        function: F,
    ) where
        F: Fn(&Value) -> Option<Data> + Send + Sync + 'static,
    {
        self.converters.push(ConverterDecl {
            from: from.to_string(),
            to: to.to_string(),
            function: Arc::new(function),
            options,
        });
    }

    pub fn add_comparator<F>(&mut self, first: &str, second: &str, supports_ordering: bool, function: F)
    where
        F: Fn(&Value, &Value) -> Relation + Send + Sync + 'static,
    {
        self.comparators.push(ComparatorDecl {
            first: first.to_string(),
            second: second.to_string(),
            function: Arc::new(function),
            supports_ordering,
        });
    }

    // Context values and tags

    /// A value of contexts of kind `C`.
    ///
    /// A name starting with `*` may also be written on its own; the `*` is
    /// not part of the name.
    pub fn new_context_value<C, F>(
        &mut self,
        name: &str,
        return_type: &str,
        extractor: F,
    ) -> ContextValueRegistrar<'_>
    where
        C: TriggerContext,
        F: Fn(&C) -> Vec<Data> + Send + Sync + 'static,
    {
        let (name, usage) = match name.strip_prefix('*') {
            Some(bare) => (bare, Usage::Both),
            None => (name, Usage::ExpressionOnly),
        };
        let extractor: ContextValueFn = Arc::new(move |context: &dyn TriggerContext| {
            context.downcast_ref::<C>().map(&extractor).unwrap_or_default()
        });
        ContextValueRegistrar {
            target: &mut self.context_values,
            pending: PendingContextValue {
                context: ContextKind::of::<C>(),
                name: name.to_lowercase(),
                return_type: return_type.to_string(),
                is_single: true,
                timeline: Timeline::Present,
                usage,
                excluded: Vec::new(),
                extractor,
            },
        }
    }

    pub fn add_tag<T: Tag + Default + 'static>(&mut self, name: &'static str) {
        self.tags.push(PendingTag {
            name,
            factory: tag_instance::<T>,
            priority: DEFAULT_PRIORITY,
        });
    }

    pub fn add_tag_with_priority<T: Tag + Default + 'static>(
        &mut self,
        name: &'static str,
        priority: i32,
    ) -> Result<(), RegistrationError> {
        self.tags.push(PendingTag {
            name,
            factory: tag_instance::<T>,
            priority: check_priority(priority)?,
        });
        Ok(())
    }

    /// Publish every declaration into `catalog`.
    ///
    /// Returns the diagnostics of the declarations that were dropped. On a
    /// hard error nothing is published.
    #[tracing::instrument(level = "debug", skip_all, fields(addon = %self.addon))]
    pub fn register(self, catalog: &Catalog) -> Result<Vec<Diagnostic>, RegistrationError> {
        let mut diagnostics = DiagnosticQueue::with_config(catalog.config().diagnostics.clone());
        let batch = self.stage(&mut diagnostics)?;
        catalog.publish(batch, &mut diagnostics);
        Ok(diagnostics.flush())
    }

    fn stage(self, diagnostics: &mut DiagnosticQueue) -> Result<StagedBatch, RegistrationError> {
        let addon = self.addon;
        let mut expressions = Vec::with_capacity(self.expressions.len());
        for pending in self.expressions {
            if let Some(syntax) = compile(pending.syntax, &addon, diagnostics)? {
                expressions.push(StagedExpression {
                    syntax,
                    return_type: pending.return_type,
                    is_single: pending.is_single,
                });
            }
        }
        let effects = compile_all(self.effects, &addon, diagnostics)?;
        let sections = compile_all(self.sections, &addon, diagnostics)?;
        let mut events = Vec::with_capacity(self.events.len());
        for pending in self.events {
            if let Some(syntax) = compile(pending.syntax, &addon, diagnostics)? {
                events.push(EventInfo {
                    syntax,
                    handled_contexts: pending.handled,
                });
            }
        }
        let tags = self
            .tags
            .into_iter()
            .map(|tag| TagInfo {
                name: tag.name,
                factory: tag.factory,
                priority: tag.priority,
                addon: Arc::clone(&addon),
            })
            .collect();
        Ok(StagedBatch {
            addon,
            types: self.types,
            converters: self.converters,
            comparators: self.comparators,
            expressions,
            effects,
            sections,
            events,
            context_values: self.context_values,
            tags,
        })
    }
}

impl std::fmt::Debug for SyntaxRegistration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyntaxRegistration")
            .field("addon", &self.addon)
            .field("types", &self.types.len())
            .field("expressions", &self.expressions.len())
            .field("effects", &self.effects.len())
            .field("sections", &self.sections.len())
            .field("events", &self.events.len())
            .finish_non_exhaustive()
    }
}

pub(crate) struct StagedExpression {
    pub(crate) syntax: SyntaxInfo<dyn Expression>,
    pub(crate) return_type: String,
    pub(crate) is_single: bool,
}

/// A compiled batch, ready to publish.
pub(crate) struct StagedBatch {
    pub(crate) addon: Arc<str>,
    pub(crate) types: Vec<TypeDecl>,
    pub(crate) converters: Vec<ConverterDecl>,
    pub(crate) comparators: Vec<ComparatorDecl>,
    pub(crate) expressions: Vec<StagedExpression>,
    pub(crate) effects: Vec<SyntaxInfo<dyn Effect>>,
    pub(crate) sections: Vec<SyntaxInfo<dyn Section>>,
    pub(crate) events: Vec<EventInfo>,
    pub(crate) context_values: Vec<PendingContextValue>,
    pub(crate) tags: Vec<TagInfo>,
}

fn compile_all<T: ?Sized>(
    pending: Vec<PendingSyntax<T>>,
    addon: &Arc<str>,
    diagnostics: &mut DiagnosticQueue,
) -> Result<Vec<SyntaxInfo<T>>, RegistrationError> {
    let mut compiled = Vec::with_capacity(pending.len());
    for syntax in pending {
        if let Some(info) = compile(syntax, addon, diagnostics)? {
            compiled.push(info);
        }
    }
    Ok(compiled)
}

/// Compile the patterns of one declaration and settle its priority.
///
/// `Ok(None)` when no pattern compiled.
fn compile<T: ?Sized>(
    pending: PendingSyntax<T>,
    addon: &Arc<str>,
    diagnostics: &mut DiagnosticQueue,
) -> Result<Option<SyntaxInfo<T>>, RegistrationError> {
    let element = pending.element;
    let mut patterns = Vec::with_capacity(pending.patterns.len());
    let mut inferred = DEFAULT_PRIORITY;
    for source in pending.patterns {
        let node = match parse_pattern(&source) {
            Ok(node) => node,
            Err(diagnostic) => {
                tracing::warn!(element, pattern = %source, "dropping malformed pattern");
                diagnostics.add(diagnostic.with_note(format!("in a pattern of `{element}`")));
                continue;
            }
        };
        if pending.priority.is_none() {
            let priority =
                infer_priority(&node).map_err(|source_error| RegistrationError::InvalidPatternTree {
                    element,
                    pattern: source.clone(),
                    source: source_error,
                })?;
            inferred = inferred.min(priority);
        }
        patterns.push(CompiledPattern { source, node });
    }
    if patterns.is_empty() {
        tracing::warn!(element, "dropping declaration without a valid pattern");
        diagnostics.add(
            Diagnostic::error(ErrorCode::E2007)
                .with_message(format!("`{element}` has no valid pattern left")),
        );
        return Ok(None);
    }
    Ok(Some(SyntaxInfo {
        element,
        factory: pending.factory,
        patterns,
        priority: pending.priority.unwrap_or(inferred),
        addon: Arc::clone(addon),
    }))
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]
