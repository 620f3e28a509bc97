//! Outcome of a comparison.

use std::cmp::Ordering;
use std::fmt;

/// Result of comparing two values.
///
/// `Smaller` and `Greater` are only produced by comparators that support
/// ordering; equality-only comparators produce `Equal` or `NotEqual`.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Relation {
    Equal,
    NotEqual,
    Smaller,
    Greater,
}

impl Relation {
    /// `Equal` when `equal`, else `NotEqual`.
    #[inline]
    pub fn get(equal: bool) -> Self {
        if equal {
            Relation::Equal
        } else {
            Relation::NotEqual
        }
    }

    #[inline]
    pub fn from_ordering(ordering: Ordering) -> Self {
        match ordering {
            Ordering::Less => Relation::Smaller,
            Ordering::Equal => Relation::Equal,
            Ordering::Greater => Relation::Greater,
        }
    }

    /// The relation seen from the other operand.
    #[must_use]
    #[inline]
    pub fn inverse(self) -> Self {
        match self {
            Relation::Smaller => Relation::Greater,
            Relation::Greater => Relation::Smaller,
            Relation::Equal | Relation::NotEqual => self,
        }
    }

    /// Whether this outcome satisfies `query`.
    ///
    /// A `NotEqual` query holds for any outcome other than `Equal`.
    pub fn is(self, query: Relation) -> bool {
        match query {
            Relation::NotEqual => self != Relation::Equal,
            _ => self == query,
        }
    }

    /// Boolean coercion for equality-only checks.
    #[inline]
    pub fn is_equal(self) -> bool {
        self == Relation::Equal
    }

    /// `None` for `NotEqual`, which carries no order.
    pub fn to_ordering(self) -> Option<Ordering> {
        match self {
            Relation::Smaller => Some(Ordering::Less),
            Relation::Equal => Some(Ordering::Equal),
            Relation::Greater => Some(Ordering::Greater),
            Relation::NotEqual => None,
        }
    }
}

impl From<bool> for Relation {
    fn from(equal: bool) -> Self {
        Relation::get(equal)
    }
}

impl From<Ordering> for Relation {
    fn from(ordering: Ordering) -> Self {
        Relation::from_ordering(ordering)
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Relation::Equal => write!(f, "equal to"),
            Relation::NotEqual => write!(f, "not equal to"),
            Relation::Smaller => write!(f, "smaller than"),
            Relation::Greater => write!(f, "greater than"),
        }
    }
}
