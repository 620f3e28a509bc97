//! Registration through a runtime.

use pretty_assertions::assert_eq;
use quill::diagnostic::ErrorCode;
use quill::lang::ContextKind;
use quill::registry::{ConditionalType, RegistrationError, SyntaxRegistration, Timeline, Usage};

use crate::common::{runtime, IsEven, Recorder, Say};

fn priority_of(runtime: &quill::Runtime, pattern: &str) -> i32 {
    let state = runtime.catalog().read();
    state
        .effects()
        .iter()
        .find(|e| e.patterns().iter().any(|p| p.source == pattern))
        .unwrap()
        .priority()
}

#[test]
fn inferred_priorities() {
    let runtime = runtime();
    let mut registration = SyntaxRegistration::new("priorities");
    registration.add_effect::<Say>(&["hello"]);
    registration.add_effect::<Say>(&["<[0-9]+>"]);
    registration.add_effect::<Say>(&["[hello] <world>"]);
    registration.add_effect::<Say>(&["shout %text%"]);
    registration.add_effect::<Say>(&["%text% echoes"]);
    assert!(runtime.register(registration).unwrap().is_empty());

    assert_eq!(priority_of(&runtime, "hello"), 5);
    assert_eq!(priority_of(&runtime, "<[0-9]+>"), 1);
    assert!(priority_of(&runtime, "[hello] <world>") <= 3);
    assert_eq!(priority_of(&runtime, "shout %text%"), 5);
    assert_eq!(priority_of(&runtime, "%text% echoes"), 2);
    assert_eq!(priority_of(&runtime, "continue"), 4);
}

#[test]
fn hard_failures_leave_the_catalog_untouched() {
    let runtime = runtime();
    let before = runtime.catalog().read().effects().len();

    let mut registration = SyntaxRegistration::new("broken");
    assert_eq!(
        registration.add_effect_with_priority::<Say>(-2, &["yell"]),
        Err(RegistrationError::NegativePriority(-2))
    );
    registration.add_effect::<Say>(&["whisper"]);
    registration.add_effect::<Say>(&["[maybe]"]);
    let err = runtime.register(registration).unwrap_err();
    assert!(matches!(err, RegistrationError::InvalidPatternTree { .. }));

    let state = runtime.catalog().read();
    assert_eq!(state.effects().len(), before);
    assert!(state.addon("broken").is_none());
}

#[test]
fn recoverable_problems_are_reported() {
    let runtime = runtime();
    let mut registration = SyntaxRegistration::new("sloppy");
    registration.add_expression::<IsEven>("colour", true, &["tint"]);
    registration.add_effect::<Say>(&["say (twice"]);
    registration.add_effect::<Say>(&["sing %number%"]);
    let diagnostics = runtime.register(registration).unwrap();

    let codes: Vec<ErrorCode> = diagnostics.iter().map(|d| d.code).collect();
    assert_eq!(codes, [ErrorCode::E1001, ErrorCode::E2007, ErrorCode::E2001]);
    assert_eq!(diagnostics[0].source.as_deref(), Some("say (twice"));

    let state = runtime.catalog().read();
    assert!(state
        .effects()
        .iter()
        .any(|e| e.patterns()[0].source == "sing %number%"));
}

#[test]
fn property_syntaxes_expand_to_patterns() {
    let runtime = runtime();
    let mut registration = SyntaxRegistration::new("properties");
    registration.add_property_expression::<IsEven>("text", "numbers", "digits");
    registration.add_property_conditional::<IsEven>("numbers", ConditionalType::Have, "digits");
    assert!(runtime.register(registration).unwrap().is_empty());

    let state = runtime.catalog().read();
    let sources: Vec<&str> = state
        .expressions()
        .iter()
        .filter(|e| e.syntax().addon() == "properties")
        .flat_map(|e| e.syntax().patterns().iter().map(|p| p.source.as_str()))
        .collect();
    assert_eq!(
        sources,
        [
            "%numbers%'[s] digits",
            "[the] digits of %numbers%",
            "%numbers% (has|have) digits",
            "%numbers% (1¦doesn't|1¦does not|1¦don't|1¦do not) have digits",
        ]
    );
}

#[test]
fn event_context_values_are_looked_up_exactly() {
    let runtime = runtime();
    let state = runtime.catalog().read();
    let recorder = ContextKind::of::<Recorder>();

    let event = &state.events()[0];
    assert_eq!(event.handled_contexts(), [recorder]);
    assert!(state.addon("test").unwrap().handles_event(event.syntax().element()));

    let values = state.context_values();
    let message = values.find(recorder, "MESSAGE", Timeline::Present).unwrap();
    assert_eq!(message.usage(), Usage::Both);
    assert!(values.find(recorder, "message", Timeline::Future).is_none());

    let context = Recorder::with_message("hi");
    assert_eq!(message.values(&context)[0].as_text(), Some("hi"));
    assert_eq!(values.available_for(&[recorder]).count(), 1);
}
