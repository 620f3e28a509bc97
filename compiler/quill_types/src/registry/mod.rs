//! Registry of semantic types.
//!
//! The `TypeRegistry` stores one [`TypeDescriptor`] per registered type,
//! indexed by `TypeId` and by name (singular and plural forms).
//!
//! # Design
//!
//! - `Vec` storage indexed by `TypeId` for O(1) descriptor access
//! - `FxHashMap` from lowercase name form to `(TypeId, single)`
//! - Assignability follows the declared supertype chain; everything is
//!   assignable to `TypeId::OBJECT`

use std::fmt;
use std::sync::Arc;

use quill_diagnostic::{Diagnostic, ErrorCode};
use rustc_hash::FxHashMap;

use crate::{Data, TypeId, Value};

/// How a missing value is displayed.
pub const NULL_REPRESENTATION: &str = "<none>";

/// Parses literal text into data of the owning type.
pub type LiteralParser = Arc<dyn Fn(&str) -> Option<Data> + Send + Sync>;

/// Renders a value of the owning type.
pub type DisplayFn = Arc<dyn Fn(&Value) -> String + Send + Sync>;

/// The ways a script may change a value.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ChangeMode {
    Set,
    Add,
    Remove,
    RemoveAll,
    Delete,
    Reset,
}

/// Default mutation capability of a type.
pub trait Changer: Send + Sync {
    /// Whether `mode` is supported at all.
    fn accepts(&self, mode: ChangeMode) -> bool;

    /// Apply `mode` to `targets` using `delta` as the right-hand side.
    fn change(&self, targets: &mut [Value], delta: &[Value], mode: ChangeMode);
}

/// Arithmetic capability of a type.
///
/// `difference` produces a value of the relative type, which `add` and
/// `subtract` accept back.
pub trait Arithmetic: Send + Sync {
    fn difference(&self, first: &Value, second: &Value) -> Value;

    fn add(&self, value: &Value, difference: &Value) -> Value;

    fn subtract(&self, value: &Value, difference: &Value) -> Value;

    /// Name of the type `difference` returns.
    fn relative_type(&self) -> &str;
}

/// A pending type declaration, named but not yet assigned a `TypeId`.
#[derive(Clone)]
pub struct TypeDecl {
    pub name: String,
    /// Name pattern: `base¦plural-suffix` or `base¦singular-suffix¦plural-suffix`.
    pub pattern: String,
    pub supertype: Option<String>,
    pub parser: Option<LiteralParser>,
    pub display: Option<DisplayFn>,
    pub changer: Option<Arc<dyn Changer>>,
    pub arithmetic: Option<Arc<dyn Arithmetic>>,
}

impl TypeDecl {
    pub fn new(name: impl Into<String>, pattern: impl Into<String>) -> Self {
        TypeDecl {
            name: name.into(),
            pattern: pattern.into(),
            supertype: None,
            parser: None,
            display: None,
            changer: None,
            arithmetic: None,
        }
    }
}

impl fmt::Debug for TypeDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDecl")
            .field("name", &self.name)
            .field("pattern", &self.pattern)
            .field("supertype", &self.supertype)
            .finish_non_exhaustive()
    }
}

/// A registered semantic type. Immutable once registered.
pub struct TypeDescriptor {
    id: TypeId,
    name: String,
    singular: String,
    plural: String,
    supertype: Option<TypeId>,
    parser: Option<LiteralParser>,
    display: Option<DisplayFn>,
    changer: Option<Arc<dyn Changer>>,
    arithmetic: Option<Arc<dyn Arithmetic>>,
}

impl TypeDescriptor {
    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn singular(&self) -> &str {
        &self.singular
    }

    pub fn plural(&self) -> &str {
        &self.plural
    }

    pub fn supertype(&self) -> Option<TypeId> {
        self.supertype
    }

    pub fn changer(&self) -> Option<&dyn Changer> {
        self.changer.as_deref()
    }

    pub fn arithmetic(&self) -> Option<&dyn Arithmetic> {
        self.arithmetic.as_deref()
    }

    /// Whether literal text can be parsed into this type.
    pub fn has_parser(&self) -> bool {
        self.parser.is_some()
    }

    /// Parse literal text into a value of this type.
    pub fn parse(&self, text: &str) -> Option<Value> {
        let parser = self.parser.as_ref()?;
        parser(text).map(|data| Value::new(self.id, data))
    }

    /// Render a value, or [`NULL_REPRESENTATION`] for a missing one.
    pub fn display(&self, value: Option<&Value>) -> String {
        match (value, &self.display) {
            (None, _) => NULL_REPRESENTATION.to_string(),
            (Some(v), Some(display)) => display(v),
            (Some(v), None) => v.data().to_string(),
        }
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("singular", &self.singular)
            .field("plural", &self.plural)
            .field("supertype", &self.supertype)
            .finish_non_exhaustive()
    }
}

/// Split a name pattern into its singular and plural forms.
///
/// `number¦s` gives `number`/`numbers`, `cact¦us¦i` gives `cactus`/`cacti`,
/// and a pattern without `¦` uses the same text for both.
pub(crate) fn plural_forms(pattern: &str) -> (String, String) {
    let parts: Vec<&str> = pattern.split('¦').collect();
    match parts.as_slice() {
        [base, plural] => ((*base).to_string(), format!("{base}{plural}")),
        [base, singular, plural, ..] => (format!("{base}{singular}"), format!("{base}{plural}")),
        _ => (pattern.to_string(), pattern.to_string()),
    }
}

/// Registry of all semantic types.
pub struct TypeRegistry {
    descriptors: Vec<TypeDescriptor>,
    /// Lowercase name form -> (type, whether the form is singular).
    by_form: FxHashMap<String, (TypeId, bool)>,
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeRegistry {
    /// Create a registry holding only the universal `object` type.
    pub fn new() -> Self {
        let mut registry = TypeRegistry {
            descriptors: Vec::new(),
            by_form: FxHashMap::default(),
        };
        registry.insert(TypeDecl::new("object", "object¦s"), None);
        registry
    }

    fn insert(&mut self, decl: TypeDecl, supertype: Option<TypeId>) -> TypeId {
        let id = TypeId::from_raw(u32::try_from(self.descriptors.len()).unwrap_or(u32::MAX));
        let (singular, plural) = plural_forms(&decl.pattern);
        self.by_form.insert(decl.name.to_lowercase(), (id, true));
        self.by_form.entry(singular.to_lowercase()).or_insert((id, true));
        self.by_form.entry(plural.to_lowercase()).or_insert((id, false));
        self.descriptors.push(TypeDescriptor {
            id,
            name: decl.name,
            singular,
            plural,
            supertype,
            parser: decl.parser,
            display: decl.display,
            changer: decl.changer,
            arithmetic: decl.arithmetic,
        });
        id
    }

    /// Register a type declaration.
    ///
    /// Fails with a diagnostic when the name is taken or the supertype is
    /// unknown; the registry is left untouched in that case.
    pub fn register(&mut self, decl: TypeDecl) -> Result<TypeId, Diagnostic> {
        if self.by_name(&decl.name).is_some() {
            return Err(Diagnostic::error(ErrorCode::E2002)
                .with_message(format!("type `{}` is already registered", decl.name)));
        }
        let supertype = match &decl.supertype {
            Some(name) => Some(self.by_name(name).map(TypeDescriptor::id).ok_or_else(|| {
                Diagnostic::error(ErrorCode::E2001).with_message(format!(
                    "supertype `{name}` of type `{}` is not registered",
                    decl.name
                ))
            })?),
            None => None,
        };
        let id = self.insert(decl, supertype);
        tracing::trace!(?id, name = %self.descriptors[id.index()].name, "registered type");
        Ok(id)
    }

    pub fn get(&self, id: TypeId) -> Option<&TypeDescriptor> {
        self.descriptors.get(id.index())
    }

    /// Look up a type by its name or either of its name forms.
    pub fn by_name(&self, name: &str) -> Option<&TypeDescriptor> {
        let (id, _) = self.by_form.get(&name.to_lowercase())?;
        self.get(*id)
    }

    /// Resolve a name as written in an expression slot.
    ///
    /// Returns the type and whether the singular form was used.
    pub fn pattern_type(&self, name: &str) -> Option<(TypeId, bool)> {
        self.by_form.get(&name.to_lowercase()).copied()
    }

    /// Name of a type, or `<unknown>`.
    pub fn name_of(&self, id: TypeId) -> &str {
        self.get(id).map_or("<unknown>", TypeDescriptor::name)
    }

    /// Whether a value of type `source` may be used where `target` is expected.
    pub fn is_assignable(&self, target: TypeId, source: TypeId) -> bool {
        if target == TypeId::OBJECT {
            return true;
        }
        let mut current = Some(source);
        while let Some(id) = current {
            if id == target {
                return true;
            }
            current = self.get(id).and_then(TypeDescriptor::supertype);
        }
        false
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Always false: the universal type is pre-registered.
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TypeDescriptor> {
        self.descriptors.iter()
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]
