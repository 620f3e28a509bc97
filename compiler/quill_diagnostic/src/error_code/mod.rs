//! Error codes for all registration and parse-time diagnostics.
//!
//! Each error code is a unique identifier (e.g., `E1001`) with the first digit
//! indicating the phase that produced it.

use std::fmt;

/// Error codes for all diagnostics.
///
/// Format: E#### where first digit indicates phase:
/// - E1xxx: Pattern compilation errors
/// - E2xxx: Registration errors
/// - E3xxx: Semantic errors found while initializing syntax elements
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ErrorCode {
    // Pattern Errors (E1xxx)
    /// Unclosed `[`, `(`, `<` or `%` group
    E1001,
    /// Closing delimiter without a matching opener
    E1002,
    /// Regex capture that does not compile
    E1003,
    /// Expression slot naming no type
    E1004,
    /// Escape character at the end of the pattern
    E1005,
    /// Unknown or misplaced expression slot modifier
    E1006,

    // Registration Errors (E2xxx)
    /// Unknown type
    E2001,
    /// Duplicate type name
    E2002,
    /// Duplicate converter for a type pair
    E2003,
    /// Duplicate comparator for a type pair
    E2004,
    /// Comparator declared between two universal types
    E2005,
    /// Duplicate context value
    E2006,
    /// Declaration has no valid pattern left
    E2007,
    /// Unknown type in an expression slot
    E2008,

    // Semantic Errors (E3xxx)
    /// `continue` used outside of a loop
    E3001,
    /// Syntax element rejected its initialization
    E3002,
    /// Section closed without being opened
    E3003,
}

impl ErrorCode {
    /// Get the string representation of this error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::E1001 => "E1001",
            ErrorCode::E1002 => "E1002",
            ErrorCode::E1003 => "E1003",
            ErrorCode::E1004 => "E1004",
            ErrorCode::E1005 => "E1005",
            ErrorCode::E1006 => "E1006",
            ErrorCode::E2001 => "E2001",
            ErrorCode::E2002 => "E2002",
            ErrorCode::E2003 => "E2003",
            ErrorCode::E2004 => "E2004",
            ErrorCode::E2005 => "E2005",
            ErrorCode::E2006 => "E2006",
            ErrorCode::E2007 => "E2007",
            ErrorCode::E2008 => "E2008",
            ErrorCode::E3001 => "E3001",
            ErrorCode::E3002 => "E3002",
            ErrorCode::E3003 => "E3003",
        }
    }

    /// Check if this is a pattern compilation error (E1xxx).
    pub fn is_pattern_error(&self) -> bool {
        self.as_str().starts_with("E1")
    }

    /// Check if this is a registration error (E2xxx).
    pub fn is_registration_error(&self) -> bool {
        self.as_str().starts_with("E2")
    }

    /// Check if this is a semantic error (E3xxx).
    pub fn is_semantic_error(&self) -> bool {
        self.as_str().starts_with("E3")
    }

    /// One-line description used when a diagnostic carries no message.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::E1001 => "unclosed group in pattern",
            ErrorCode::E1002 => "unmatched closing delimiter in pattern",
            ErrorCode::E1003 => "invalid regex in pattern",
            ErrorCode::E1004 => "expression slot names no type",
            ErrorCode::E1005 => "dangling escape at end of pattern",
            ErrorCode::E1006 => "invalid expression slot modifier",
            ErrorCode::E2001 => "unknown type",
            ErrorCode::E2002 => "duplicate type",
            ErrorCode::E2003 => "duplicate converter",
            ErrorCode::E2004 => "duplicate comparator",
            ErrorCode::E2005 => "comparator between universal types",
            ErrorCode::E2006 => "duplicate context value",
            ErrorCode::E2007 => "no valid pattern",
            ErrorCode::E2008 => "unknown type in expression slot",
            ErrorCode::E3001 => "`continue` outside of a loop",
            ErrorCode::E3002 => "syntax element failed to initialize",
            ErrorCode::E3003 => "section closed without being opened",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
