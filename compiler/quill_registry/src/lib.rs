//! Quill Registry - how addons contribute vocabulary.
//!
//! This crate provides:
//! - [`SyntaxRegistration`], the per-addon builder, and its registrars for
//!   expressions, effects, sections, events, types, converters, comparators,
//!   context values and tags
//! - [`Catalog`], the shared, append-only collection of everything
//!   registered, ordered for matching by priority
//! - The context value registry, looked up by context kind, name and
//!   [`Timeline`]
//! - [`register_core`], the built-in control-flow vocabulary
//!
//! # Failure model
//!
//! A declaration that is wrong on its own (malformed pattern, unknown type,
//! duplicate) is reported as a diagnostic and dropped; the rest of the batch
//! is published. A [`RegistrationError`] rejects the whole batch before the
//! catalog is touched.

mod builtin;
mod catalog;
mod context_value;
mod error;
mod registration;
mod syntax;

#[cfg(test)]
mod test_helpers;

pub use builtin::{register_core, CORE_ADDON};
pub use catalog::{AddonInfo, Catalog, CatalogConfig, CatalogState};
pub use context_value::{ContextValue, ContextValueFn, ContextValueRegistry, Timeline, Usage};
pub use error::RegistrationError;
pub use registration::{
    ConditionalType, ContextValueRegistrar, EventRegistrar, ExpressionRegistrar,
    SyntaxRegistrar, SyntaxRegistration, TypeRegistrar,
};
pub use syntax::{
    CompiledPattern, EffectInfo, EventInfo, ExpressionInfo, SectionInfo, SyntaxInfo, TagInfo,
};
