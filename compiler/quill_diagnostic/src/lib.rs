//! Diagnostic system for registration and parse-time error reporting.
//!
//! Every recoverable problem found while an addon registers its vocabulary,
//! or while a script is assembled into a trigger, is reported as a
//! [`Diagnostic`]:
//! - Error codes for searchability
//! - Clear messages (what went wrong)
//! - Labeled spans into the offending grammar string (where it went wrong)
//! - Notes (why it's wrong)
//!
//! Diagnostics never abort a registration batch. The offending declaration is
//! dropped and the rest of the batch proceeds.

mod diagnostic;
mod error_code;
pub mod queue;
mod span;

pub use diagnostic::{Diagnostic, Label, Severity};
pub use error_code::ErrorCode;
pub use queue::{DiagnosticConfig, DiagnosticQueue};
pub use span::Span;
