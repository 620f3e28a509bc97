//! The vocabulary every catalog starts with.

use quill_diagnostic::Diagnostic;
use quill_lang::{EffContinue, ExprLoopValue, ExprWhether, SecConditional, SecLoop};
use quill_types::{Data, Value};

use crate::registration::BOOLEAN;
use crate::{Catalog, RegistrationError, SyntaxRegistration};

/// Addon name of the core vocabulary.
pub const CORE_ADDON: &str = "quill";

/// `continue` outranks expression-led effects.
const CONTINUE_PRIORITY: i32 = 4;

fn parse_boolean(text: &str) -> Option<Data> {
    match text.to_ascii_lowercase().as_str() {
        "true" | "yes" => Some(Data::Boolean(true)),
        "false" | "no" => Some(Data::Boolean(false)),
        _ => None,
    }
}

fn display_boolean(value: &Value) -> String {
    match value.as_bool() {
        Some(true) => "true".to_string(),
        Some(false) => "false".to_string(),
        None => value.data().to_string(),
    }
}

/// Register the `boolean` type and the control-flow vocabulary:
/// `loop`, `if`, `continue`, `whether` and `loop-value`.
pub fn register_core(catalog: &Catalog) -> Result<Vec<Diagnostic>, RegistrationError> {
    let mut registration = SyntaxRegistration::new(CORE_ADDON);
    registration
        .new_type(BOOLEAN, "boolean¦s")
        .literal_parser(parse_boolean)
        .display(display_boolean)
        .register();
    registration.add_section::<SecLoop>(&["loop %objects%"]);
    registration.add_section::<SecConditional>(&["if %=boolean%"]);
    registration.add_effect_with_priority::<EffContinue>(CONTINUE_PRIORITY, &["continue"])?;
    registration.add_expression::<ExprWhether>(BOOLEAN, true, &["whether %~boolean%"]);
    registration.add_expression::<ExprLoopValue>("object", true, &["[the] loop-value"]);
    registration.register(catalog)
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]
