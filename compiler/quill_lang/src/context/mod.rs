//! Trigger contexts: what a trigger fires with.

use std::any::{type_name, Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

/// The payload of one trigger firing.
///
/// Events declare which context kinds they handle; context values are bound
/// to one exact kind.
pub trait TriggerContext: Any {
    /// Human-readable name, used in diagnostics and logs.
    fn name(&self) -> &'static str;

    fn as_any(&self) -> &dyn Any;
}

impl dyn TriggerContext + '_ {
    /// The concrete kind of this context.
    pub fn kind(&self) -> ContextKind {
        ContextKind {
            id: (*self.as_any()).type_id(),
            name: self.name(),
        }
    }

    pub fn downcast_ref<C: TriggerContext>(&self) -> Option<&C> {
        self.as_any().downcast_ref()
    }
}

/// Identity of a concrete trigger context type.
///
/// Two kinds are equal only when they name the exact same type; there is
/// no covariance between context kinds.
#[derive(Copy, Clone)]
pub struct ContextKind {
    id: TypeId,
    name: &'static str,
}

impl ContextKind {
    pub fn of<C: TriggerContext>() -> Self {
        let full = type_name::<C>();
        ContextKind {
            id: TypeId::of::<C>(),
            name: full.rsplit("::").next().unwrap_or(full),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for ContextKind {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ContextKind {}

impl Hash for ContextKind {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for ContextKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContextKind({})", self.name)
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]
mod tests;
