//! Quill Types - the dynamic type layer of the Quill grammar engine.
//!
//! This crate provides:
//! - Runtime values (`Value`, `Data`) tagged with their registered `TypeId`
//! - The type registry (`TypeRegistry`, `TypeDescriptor`) with parse, display,
//!   mutation and arithmetic capabilities
//! - The converter registry (`ConverterRegistry`) of partial functions between
//!   type pairs, including derived chained converters
//! - The comparator resolution engine (`ComparatorRegistry`) which finds, on
//!   demand, how to compare two arbitrary types through zero, one or two
//!   conversions, memoizing the outcome per type pair
//!
//! # Architecture
//!
//! All of it is aggregated in [`TypeSystem`], one explicit object that is
//! written during registration and only read afterwards. Comparison is a total
//! function: anything that cannot be compared is reported as
//! [`Relation::NotEqual`], never as an error.

mod compare;
mod convert;
mod registry;
mod system;
mod value;

pub use compare::{CompareFn, Comparator, ComparatorDecl, ComparatorEntry, ComparatorRegistry, Relation};
pub use convert::{ConverterDecl, ConverterEntry, ConverterFn, ConverterOptions, ConverterRegistry};
pub use registry::{
    Arithmetic, ChangeMode, Changer, DisplayFn, LiteralParser, TypeDecl, TypeDescriptor,
    TypeRegistry, NULL_REPRESENTATION,
};
pub use system::TypeSystem;
pub use value::{Data, Handle, TypeId, Value};
