//! The aggregate type system: types, converters and comparators.

use std::cmp::Ordering;
use std::sync::Arc;

use quill_diagnostic::{Diagnostic, ErrorCode};

use crate::{
    Comparator, ComparatorDecl, ComparatorEntry, ComparatorRegistry, ConverterDecl,
    ConverterEntry, ConverterRegistry, Relation, TypeDecl, TypeDescriptor, TypeId, TypeRegistry,
    Value, NULL_REPRESENTATION,
};

/// Types, converters and comparators of one process.
///
/// Written only while a registration is being published; read by everything
/// else. The comparator memo is the one piece of interior mutability.
#[derive(Default)]
pub struct TypeSystem {
    types: TypeRegistry,
    converters: ConverterRegistry,
    comparators: ComparatorRegistry,
}

fn unknown_type(name: &str, role: &str) -> Diagnostic {
    Diagnostic::error(ErrorCode::E2001)
        .with_message(format!("{role} type `{name}` is not registered"))
}

impl TypeSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn types(&self) -> &TypeRegistry {
        &self.types
    }

    pub fn converters(&self) -> &ConverterRegistry {
        &self.converters
    }

    pub fn comparators(&self) -> &ComparatorRegistry {
        &self.comparators
    }

    /// Look up a type id by any of its name forms.
    pub fn type_id(&self, name: &str) -> Option<TypeId> {
        self.types.by_name(name).map(TypeDescriptor::id)
    }

    pub fn register_type(&mut self, decl: TypeDecl) -> Result<TypeId, Diagnostic> {
        self.types.register(decl)
    }

    pub fn register_converter(&mut self, decl: ConverterDecl) -> Result<(), Diagnostic> {
        let from = self
            .type_id(&decl.from)
            .ok_or_else(|| unknown_type(&decl.from, "converter source"))?;
        let to = self
            .type_id(&decl.to)
            .ok_or_else(|| unknown_type(&decl.to, "converter destination"))?;
        self.converters
            .add(ConverterEntry::new(from, to, decl.function, decl.options), &self.types)?;
        self.comparators.clear_cache();
        Ok(())
    }

    pub fn register_comparator(&mut self, decl: ComparatorDecl) -> Result<(), Diagnostic> {
        let first = self
            .type_id(&decl.first)
            .ok_or_else(|| unknown_type(&decl.first, "comparator"))?;
        let second = self
            .type_id(&decl.second)
            .ok_or_else(|| unknown_type(&decl.second, "comparator"))?;
        self.comparators.add(
            ComparatorEntry::new(first, second, decl.function, decl.supports_ordering),
            &self.types,
        )
    }

    /// Derive chained converters for every chainable pair.
    pub fn derive_chained_converters(&mut self) -> usize {
        let added = self.converters.derive_chained(&self.types);
        if added > 0 {
            self.comparators.clear_cache();
        }
        added
    }

    /// Resolve the comparator for a pair of types.
    pub fn comparator(&self, first: TypeId, second: TypeId) -> Option<Arc<Comparator>> {
        self.comparators
            .resolve(first, second, &self.types, &self.converters)
    }

    /// Compare two possibly missing values.
    ///
    /// Total: a missing operand, an unresolvable pair or a failed conversion
    /// all give `NotEqual`.
    pub fn compare(&self, a: Option<&Value>, b: Option<&Value>) -> Relation {
        let (Some(a), Some(b)) = (a, b) else {
            return Relation::NotEqual;
        };
        match self.comparator(a.ty(), b.ty()) {
            Some(comparator) => comparator.apply(a, b),
            None => Relation::NotEqual,
        }
    }

    /// Order two values, when the resolved comparator supports ordering.
    pub fn ordering(&self, a: &Value, b: &Value) -> Option<Ordering> {
        let comparator = self.comparator(a.ty(), b.ty())?;
        if !comparator.supports_ordering() {
            return None;
        }
        comparator.apply(a, b).to_ordering()
    }

    /// Convert a value so it can be used as `to`.
    pub fn convert(&self, value: &Value, to: TypeId) -> Option<Value> {
        self.converters.convert(value, to, &self.types)
    }

    /// Parse literal text as a value of `ty`.
    pub fn parse_literal(&self, text: &str, ty: TypeId) -> Option<Value> {
        self.types.get(ty)?.parse(text)
    }

    /// Render a value with its type's display function.
    pub fn display(&self, value: Option<&Value>) -> String {
        let Some(value) = value else {
            return NULL_REPRESENTATION.to_string();
        };
        match self.types.get(value.ty()) {
            Some(descriptor) => descriptor.display(Some(value)),
            None => value.data().to_string(),
        }
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]
