//! Test helpers for registration tests.
//!
//! Provides two trigger contexts, an element implementing every syntax
//! category, a tag, and an addon declaring `number` and `text`.

#![allow(clippy::unwrap_used)]

use std::any::Any;

use quill_diagnostic::Diagnostic;
use quill_lang::{
    Effect, Entry, Event, Expression, ParseContext, Section, SectionNode, StmtId, SyntaxElement,
    Tag, TriggerContext, WalkContext,
};
use quill_types::{Data, Value};

use crate::SyntaxRegistration;

/// Context of a greeting, carrying who is greeted.
pub struct Greeting {
    pub who: String,
}

impl TriggerContext for Greeting {
    fn name(&self) -> &'static str {
        "greeting"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A second, unrelated context.
pub struct Farewell;

impl TriggerContext for Farewell {
    fn name(&self) -> &'static str {
        "farewell"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Accepts anything and does nothing, in every category.
#[derive(Default)]
pub struct Stub;

impl SyntaxElement for Stub {
    fn init(&mut self, _: Vec<Box<dyn Expression>>, _: &ParseContext<'_>) -> Result<(), Diagnostic> {
        Ok(())
    }

    fn describe(&self, _debug: bool) -> String {
        "stub".to_string()
    }
}

impl Expression for Stub {
    fn values(&self, _: &WalkContext<'_>) -> Vec<Value> {
        Vec::new()
    }
}

impl Effect for Stub {
    fn execute(&self, _: &mut WalkContext<'_>) {}
}

impl Section for Stub {
    fn walk(&self, _: &mut WalkContext<'_>, node: SectionNode, _: Entry) -> Option<StmtId> {
        node.after
    }
}

impl Event for Stub {
    fn check(&self, _: &WalkContext<'_>) -> bool {
        true
    }
}

/// Wraps text in `**`.
#[derive(Default)]
pub struct Bold;

impl Tag for Bold {
    fn init(&mut self, key: &str, parameters: &[String]) -> bool {
        key == "bold" && parameters.is_empty()
    }

    fn apply(&self, text: &str) -> String {
        format!("**{text}**")
    }
}

fn parse_number(text: &str) -> Option<Data> {
    text.parse().ok().map(Data::Integer)
}

/// An addon declaring `number` (digit literals) and `text`, with a
/// `number -> text` converter.
pub fn number_addon() -> SyntaxRegistration {
    let mut registration = SyntaxRegistration::new("numbers");
    registration
        .new_type("number", "number¦s")
        .literal_parser(parse_number)
        .register();
    registration
        .new_type("text", "text¦s")
        .literal_parser(|s| Some(Data::text(s)))
        .register();
    registration.add_converter("number", "text", |v| {
        v.as_integer().map(|n| Data::text(n.to_string()))
    });
    registration
}
