//! Converter registry.
//!
//! A converter is a directed, partial function between two registered types.
//! Lookup is first-registered-wins: an exact `(from, to)` pair is preferred,
//! then the first converter whose source accepts `from` and whose destination
//! is usable as `to`.

use std::fmt;
use std::sync::Arc;

use bitflags::bitflags;
use quill_diagnostic::{Diagnostic, ErrorCode};

use crate::{Data, TypeId, TypeRegistry, Value};

/// Partial conversion from a value of the source type.
pub type ConverterFn = Arc<dyn Fn(&Value) -> Option<Data> + Send + Sync>;

bitflags! {
    /// Capability flags of a converter.
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
    pub struct ConverterOptions: u8 {
        /// Must not follow another converter in a chain.
        const NO_LEFT_CHAINING = 1;
        /// Must not be followed by another converter in a chain.
        const NO_RIGHT_CHAINING = 1 << 1;
        const NO_CHAINING = Self::NO_LEFT_CHAINING.bits() | Self::NO_RIGHT_CHAINING.bits();
        /// Not usable when synthesizing comparators.
        const NO_COMPARISON = 1 << 2;
        /// Loses information; never chained.
        const LOSSY = 1 << 3;
    }
}

/// A pending converter declaration, by type name.
#[derive(Clone)]
pub struct ConverterDecl {
    pub from: String,
    pub to: String,
    pub function: ConverterFn,
    pub options: ConverterOptions,
}

impl fmt::Debug for ConverterDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConverterDecl")
            .field("from", &self.from)
            .field("to", &self.to)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// A registered converter.
pub struct ConverterEntry {
    from: TypeId,
    to: TypeId,
    function: ConverterFn,
    options: ConverterOptions,
    /// Built by chaining two registered converters.
    derived: bool,
}

impl ConverterEntry {
    pub fn new(from: TypeId, to: TypeId, function: ConverterFn, options: ConverterOptions) -> Self {
        ConverterEntry {
            from,
            to,
            function,
            options,
            derived: false,
        }
    }

    pub fn from(&self) -> TypeId {
        self.from
    }

    pub fn to(&self) -> TypeId {
        self.to
    }

    pub fn options(&self) -> ConverterOptions {
        self.options
    }

    pub fn is_derived(&self) -> bool {
        self.derived
    }

    /// Convert `value`, stamping the result with the destination type.
    pub fn convert(&self, value: &Value) -> Option<Value> {
        (self.function)(value).map(|data| Value::new(self.to, data))
    }

    fn chains_on_right(&self) -> bool {
        !self.derived
            && !self
                .options
                .intersects(ConverterOptions::NO_RIGHT_CHAINING | ConverterOptions::LOSSY)
    }

    fn chains_on_left(&self) -> bool {
        !self.derived
            && !self
                .options
                .intersects(ConverterOptions::NO_LEFT_CHAINING | ConverterOptions::LOSSY)
    }

    fn chain(first: &Arc<ConverterEntry>, second: &Arc<ConverterEntry>) -> ConverterEntry {
        let (a, b) = (Arc::clone(first), Arc::clone(second));
        let function: ConverterFn =
            Arc::new(move |value: &Value| b.convert(&a.convert(value)?).map(Value::into_data));
        let inherited = (first.options | second.options) & ConverterOptions::NO_COMPARISON;
        ConverterEntry {
            from: first.from,
            to: second.to,
            function,
            options: ConverterOptions::NO_CHAINING | inherited,
            derived: true,
        }
    }
}

impl fmt::Debug for ConverterEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConverterEntry")
            .field("from", &self.from)
            .field("to", &self.to)
            .field("options", &self.options)
            .field("derived", &self.derived)
            .finish_non_exhaustive()
    }
}

/// All registered converters, in registration order.
#[derive(Default)]
pub struct ConverterRegistry {
    entries: Vec<Arc<ConverterEntry>>,
}

impl ConverterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a converter. A second converter for the same pair is rejected.
    pub fn add(&mut self, entry: ConverterEntry, types: &TypeRegistry) -> Result<(), Diagnostic> {
        if self.exact(entry.from, entry.to).is_some() {
            return Err(Diagnostic::error(ErrorCode::E2003).with_message(format!(
                "a converter from `{}` to `{}` is already registered",
                types.name_of(entry.from),
                types.name_of(entry.to)
            )));
        }
        self.entries.push(Arc::new(entry));
        Ok(())
    }

    fn exact(&self, from: TypeId, to: TypeId) -> Option<&Arc<ConverterEntry>> {
        self.entries.iter().find(|e| e.from == from && e.to == to)
    }

    fn find_where(
        &self,
        from: TypeId,
        to: TypeId,
        types: &TypeRegistry,
        accept: impl Fn(&ConverterEntry) -> bool,
    ) -> Option<Arc<ConverterEntry>> {
        if let Some(exact) = self.exact(from, to).filter(|e| accept(e)) {
            return Some(Arc::clone(exact));
        }
        self.entries
            .iter()
            .find(|e| accept(e) && types.is_assignable(e.from, from) && types.is_assignable(to, e.to))
            .cloned()
    }

    /// Find a converter turning values of `from` into values usable as `to`.
    pub fn get_converter(
        &self,
        from: TypeId,
        to: TypeId,
        types: &TypeRegistry,
    ) -> Option<Arc<ConverterEntry>> {
        self.find_where(from, to, types, |_| true)
    }

    /// Like [`get_converter`](Self::get_converter), skipping converters
    /// flagged `NO_COMPARISON`.
    pub fn get_comparison_converter(
        &self,
        from: TypeId,
        to: TypeId,
        types: &TypeRegistry,
    ) -> Option<Arc<ConverterEntry>> {
        self.find_where(from, to, types, |e| {
            !e.options.contains(ConverterOptions::NO_COMPARISON)
        })
    }

    /// Convert `value` to `to`, returning it unchanged when already assignable.
    pub fn convert(&self, value: &Value, to: TypeId, types: &TypeRegistry) -> Option<Value> {
        if types.is_assignable(to, value.ty()) {
            return Some(value.clone());
        }
        self.get_converter(value.ty(), to, types)?.convert(value)
    }

    /// Add `A -> C` for every chainable `A -> B`, `B -> C` pair with no
    /// existing `A -> C` converter. Returns the number of converters added.
    pub fn derive_chained(&mut self, types: &TypeRegistry) -> usize {
        let mut derived = Vec::new();
        for first in self.entries.iter().filter(|e| e.chains_on_right()) {
            for second in self.entries.iter().filter(|e| e.chains_on_left()) {
                if first.from == second.to || !types.is_assignable(second.from, first.to) {
                    continue;
                }
                let exists = self.exact(first.from, second.to).is_some()
                    || derived
                        .iter()
                        .any(|d: &ConverterEntry| d.from == first.from && d.to == second.to);
                if !exists {
                    derived.push(ConverterEntry::chain(first, second));
                }
            }
        }
        let count = derived.len();
        self.entries.extend(derived.into_iter().map(Arc::new));
        if count > 0 {
            tracing::debug!(count, "derived chained converters");
        }
        count
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<ConverterEntry>> {
        self.entries.iter()
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]
