//! Comparator resolution engine.
//!
//! Resolves how to compare two runtime types, in this order:
//! 1. Cache lookup by the exact `(first, second)` type pair
//! 2. Perfect match against a registered comparator, directly or inverted
//! 3. Equality fallback for two values of the same non-universal type
//! 4. Single conversion of one operand into a registered comparator's type
//! 5. Double conversion of both operands
//! 6. Conversion of one operand into the other's type, then equality
//!
//! The outcome, including "no comparator", is memoized per pair. The memo is
//! append-only between registrations and is cleared whenever a comparator or
//! converter is published.

mod relation;

use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use quill_diagnostic::{Diagnostic, ErrorCode};
use rustc_hash::FxBuildHasher;

pub use relation::Relation;

use crate::{ConverterEntry, ConverterRegistry, TypeId, TypeRegistry, Value};

/// Comparison function of a registered comparator.
pub type CompareFn = Arc<dyn Fn(&Value, &Value) -> Relation + Send + Sync>;

/// A pending comparator declaration, by type name.
#[derive(Clone)]
pub struct ComparatorDecl {
    pub first: String,
    pub second: String,
    pub function: CompareFn,
    pub supports_ordering: bool,
}

impl fmt::Debug for ComparatorDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComparatorDecl")
            .field("first", &self.first)
            .field("second", &self.second)
            .field("supports_ordering", &self.supports_ordering)
            .finish_non_exhaustive()
    }
}

/// A registered comparator between two declared types.
pub struct ComparatorEntry {
    first: TypeId,
    second: TypeId,
    function: CompareFn,
    supports_ordering: bool,
}

impl ComparatorEntry {
    pub fn new(first: TypeId, second: TypeId, function: CompareFn, supports_ordering: bool) -> Self {
        ComparatorEntry {
            first,
            second,
            function,
            supports_ordering,
        }
    }

    pub fn first(&self) -> TypeId {
        self.first
    }

    pub fn second(&self) -> TypeId {
        self.second
    }

    /// Declared type on the first (`true`) or second (`false`) side.
    pub fn type_at(&self, first: bool) -> TypeId {
        if first {
            self.first
        } else {
            self.second
        }
    }

    pub fn supports_ordering(&self) -> bool {
        self.supports_ordering
    }

    pub fn apply(&self, a: &Value, b: &Value) -> Relation {
        (self.function)(a, b)
    }
}

impl fmt::Debug for ComparatorEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComparatorEntry")
            .field("first", &self.first)
            .field("second", &self.second)
            .field("supports_ordering", &self.supports_ordering)
            .finish_non_exhaustive()
    }
}

/// A resolved comparator: registered, or derived from one.
#[derive(Clone, Debug)]
pub enum Comparator {
    /// A registered comparator used as is.
    Registered(Arc<ComparatorEntry>),
    /// Value equality for two operands of the same type. Never orders.
    Equality,
    /// Swaps the operands and inverts the outcome.
    Inverse(Box<Comparator>),
    /// Converts either operand before delegating to `base`.
    Converted {
        first: Option<Arc<ConverterEntry>>,
        base: Box<Comparator>,
        second: Option<Arc<ConverterEntry>>,
    },
}

impl Comparator {
    /// Compare two present values.
    ///
    /// A conversion that fails for this particular value yields `NotEqual`.
    pub fn apply(&self, a: &Value, b: &Value) -> Relation {
        match self {
            Comparator::Registered(entry) => entry.apply(a, b),
            Comparator::Equality => Relation::get(a == b),
            Comparator::Inverse(inner) => inner.apply(b, a).inverse(),
            Comparator::Converted {
                first,
                base,
                second,
            } => {
                let Some(a) = convert_operand(first.as_deref(), a) else {
                    return Relation::NotEqual;
                };
                let Some(b) = convert_operand(second.as_deref(), b) else {
                    return Relation::NotEqual;
                };
                base.apply(&a, &b)
            }
        }
    }

    /// Whether `Smaller`/`Greater` outcomes are meaningful.
    ///
    /// Conversions and inversion keep the base comparator's capability.
    pub fn supports_ordering(&self) -> bool {
        match self {
            Comparator::Registered(entry) => entry.supports_ordering(),
            Comparator::Equality => false,
            Comparator::Inverse(inner) => inner.supports_ordering(),
            Comparator::Converted { base, .. } => base.supports_ordering(),
        }
    }

    /// Number of conversion hops applied before the base comparator runs.
    pub fn conversion_count(&self) -> usize {
        match self {
            Comparator::Registered(_) | Comparator::Equality => 0,
            Comparator::Inverse(inner) => inner.conversion_count(),
            Comparator::Converted {
                first,
                base,
                second,
            } => usize::from(first.is_some()) + usize::from(second.is_some()) + base.conversion_count(),
        }
    }

    /// Whether this comparator was synthesized rather than registered.
    pub fn is_derived(&self) -> bool {
        !matches!(self, Comparator::Registered(_))
    }

    fn inverse(self) -> Self {
        Comparator::Inverse(Box::new(self))
    }

    fn converted(
        first: Option<Arc<ConverterEntry>>,
        base: Comparator,
        second: Option<Arc<ConverterEntry>>,
    ) -> Self {
        Comparator::Converted {
            first,
            base: Box::new(base),
            second,
        }
    }
}

fn convert_operand(converter: Option<&ConverterEntry>, value: &Value) -> Option<Value> {
    match converter {
        Some(converter) => converter.convert(value),
        None => Some(value.clone()),
    }
}

type ResolutionCache = DashMap<(TypeId, TypeId), Option<Arc<Comparator>>, FxBuildHasher>;

/// Registered comparators plus the per-pair resolution memo.
#[derive(Default)]
pub struct ComparatorRegistry {
    entries: Vec<Arc<ComparatorEntry>>,
    cache: ResolutionCache,
}

impl ComparatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a comparator.
    ///
    /// Comparators between two universal types and second comparators for an
    /// already covered pair are rejected.
    pub fn add(&mut self, entry: ComparatorEntry, types: &TypeRegistry) -> Result<(), Diagnostic> {
        if entry.first == TypeId::OBJECT && entry.second == TypeId::OBJECT {
            return Err(Diagnostic::error(ErrorCode::E2005)
                .with_message("a comparator between two `object`s would shadow every other comparator"));
        }
        if self
            .entries
            .iter()
            .any(|e| e.first == entry.first && e.second == entry.second)
        {
            return Err(Diagnostic::error(ErrorCode::E2004).with_message(format!(
                "a comparator between `{}` and `{}` is already registered",
                types.name_of(entry.first),
                types.name_of(entry.second)
            )));
        }
        self.entries.push(Arc::new(entry));
        self.clear_cache();
        Ok(())
    }

    /// Forget every memoized resolution.
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// Number of memoized type pairs, including negative results.
    pub fn cached_pairs(&self) -> usize {
        self.cache.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolve a comparator for `(first, second)`, consulting the memo.
    ///
    /// Concurrent resolution of the same unseen pair may compute it twice;
    /// the first stored result wins and both callers get it.
    pub fn resolve(
        &self,
        first: TypeId,
        second: TypeId,
        types: &TypeRegistry,
        converters: &ConverterRegistry,
    ) -> Option<Arc<Comparator>> {
        let key = (first, second);
        if let Some(hit) = self.cache.get(&key) {
            tracing::trace!(?first, ?second, found = hit.is_some(), "comparator cache hit");
            return hit.value().clone();
        }
        let resolved = self.resolve_uncached(first, second, types, converters).map(Arc::new);
        self.cache.entry(key).or_insert(resolved).value().clone()
    }

    fn resolve_uncached(
        &self,
        f: TypeId,
        s: TypeId,
        types: &TypeRegistry,
        converters: &ConverterRegistry,
    ) -> Option<Comparator> {
        // Perfect match
        for entry in &self.entries {
            if types.is_assignable(entry.first, f) && types.is_assignable(entry.second, s) {
                tracing::trace!(?f, ?s, "comparator: perfect match");
                return Some(Comparator::Registered(Arc::clone(entry)));
            }
            if types.is_assignable(entry.first, s) && types.is_assignable(entry.second, f) {
                tracing::trace!(?f, ?s, "comparator: inverted match");
                return Some(Comparator::Registered(Arc::clone(entry)).inverse());
            }
        }

        // Same type, no comparator
        if f == s && f != TypeId::OBJECT {
            tracing::trace!(?f, "comparator: equality fallback");
            return Some(Comparator::Equality);
        }

        // Single conversion
        for entry in &self.entries {
            for first in [true, false] {
                if types.is_assignable(entry.type_at(first), f) {
                    if let Some(c2) = converters.get_comparison_converter(s, entry.type_at(!first), types) {
                        tracing::trace!(?f, ?s, "comparator: second operand converted");
                        let base = Comparator::Registered(Arc::clone(entry));
                        return Some(if first {
                            Comparator::converted(None, base, Some(c2))
                        } else {
                            Comparator::converted(Some(c2), base, None).inverse()
                        });
                    }
                }
                if types.is_assignable(entry.type_at(first), s) {
                    if let Some(c1) = converters.get_comparison_converter(f, entry.type_at(!first), types) {
                        tracing::trace!(?f, ?s, "comparator: first operand converted");
                        let base = Comparator::Registered(Arc::clone(entry));
                        return Some(if first {
                            Comparator::converted(None, base, Some(c1)).inverse()
                        } else {
                            Comparator::converted(Some(c1), base, None)
                        });
                    }
                }
            }
        }

        // Double conversion
        for entry in &self.entries {
            for first in [true, false] {
                let c1 = converters.get_comparison_converter(f, entry.type_at(first), types);
                let c2 = converters.get_comparison_converter(s, entry.type_at(!first), types);
                if let (Some(c1), Some(c2)) = (c1, c2) {
                    tracing::trace!(?f, ?s, "comparator: both operands converted");
                    let base = Comparator::Registered(Arc::clone(entry));
                    return Some(if first {
                        Comparator::converted(Some(c1), base, Some(c2))
                    } else {
                        Comparator::converted(Some(c2), base, Some(c1)).inverse()
                    });
                }
            }
        }

        // Last resort: convert into the other operand's type, then equality
        if f != TypeId::OBJECT && s != TypeId::OBJECT {
            if let Some(c2) = converters.get_comparison_converter(s, f, types) {
                tracing::trace!(?f, ?s, "comparator: converted equality");
                return Some(Comparator::converted(None, Comparator::Equality, Some(c2)));
            }
            if let Some(c1) = converters.get_comparison_converter(f, s, types) {
                tracing::trace!(?f, ?s, "comparator: converted equality");
                return Some(Comparator::converted(Some(c1), Comparator::Equality, None));
            }
        }

        tracing::trace!(?f, ?s, "comparator: none");
        None
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]
mod tests;
