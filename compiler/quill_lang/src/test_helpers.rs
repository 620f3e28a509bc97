//! Test helpers for trigger assembly and walk tests.
//!
//! Provides a recording trigger context and a `say` effect that writes into
//! it, so a test can assert the exact order statements ran in.

#![allow(clippy::unwrap_used)]

use std::any::Any;
use std::cell::RefCell;

use quill_diagnostic::Diagnostic;
use quill_types::{Data, TypeDecl, TypeId, TypeSystem, Value};

use crate::{
    Effect, Expression, Literal, ParseContext, ParseInfo, SyntaxElement, TriggerBuilder,
    TriggerContext, WalkContext,
};

/// Trigger context collecting what `say` effects printed.
#[derive(Default)]
pub struct Recorder {
    log: RefCell<Vec<String>>,
}

impl Recorder {
    pub fn lines(&self) -> Vec<String> {
        self.log.borrow().clone()
    }
}

impl TriggerContext for Recorder {
    fn name(&self) -> &'static str {
        "recorder"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// `say %objects%`: appends its values to the [`Recorder`].
#[derive(Default)]
pub struct Say {
    message: Option<Box<dyn Expression>>,
}

impl Say {
    pub fn new(message: impl Expression + 'static) -> Self {
        Say {
            message: Some(Box::new(message)),
        }
    }
}

impl SyntaxElement for Say {
    fn init(
        &mut self,
        expressions: Vec<Box<dyn Expression>>,
        _: &ParseContext<'_>,
    ) -> Result<(), Diagnostic> {
        if let Some(first) = expressions.into_iter().next() {
            self.message = Some(first);
        }
        Ok(())
    }

    fn describe(&self, debug: bool) -> String {
        let message = self.message.as_ref().map(|m| m.describe(debug)).unwrap_or_default();
        format!("say {message}")
    }
}

impl Effect for Say {
    fn execute(&self, cx: &mut WalkContext<'_>) {
        let Some(message) = &self.message else {
            return;
        };
        let line: Vec<String> = message
            .values(cx)
            .iter()
            .map(|v| v.data().to_string())
            .collect();
        if let Some(recorder) = cx.context().downcast_ref::<Recorder>() {
            recorder.log.borrow_mut().push(line.join(", "));
        }
    }
}

/// A type system with `boolean`, `number` and `text`.
pub struct Fixture {
    pub types: TypeSystem,
    pub boolean: TypeId,
    pub number: TypeId,
    pub text: TypeId,
}

impl Fixture {
    pub fn new() -> Self {
        let mut types = TypeSystem::new();
        let boolean = types.register_type(TypeDecl::new("boolean", "boolean¦s")).unwrap();
        let number = types.register_type(TypeDecl::new("number", "number¦s")).unwrap();
        let text = types.register_type(TypeDecl::new("text", "text¦s")).unwrap();
        Fixture {
            types,
            boolean,
            number,
            text,
        }
    }

    pub fn builder(&self) -> TriggerBuilder<'_> {
        TriggerBuilder::new(&self.types)
    }

    pub fn text(&self, s: &str) -> Literal {
        Literal::new(Value::new(self.text, Data::text(s)))
    }

    pub fn numbers(&self, range: std::ops::RangeInclusive<i64>) -> Literal {
        Literal::list(range.map(|n| Value::new(self.number, Data::Integer(n))).collect())
    }

    pub fn boolean(&self, b: bool) -> Literal {
        Literal::new(Value::new(self.boolean, Data::Boolean(b)))
    }
}

/// `say "<text>"`, appended to the innermost open body.
pub fn say(builder: &mut TriggerBuilder<'_>, fixture: &Fixture, text: &str) {
    assert!(builder.effect(Box::new(Say::new(fixture.text(text))), vec![], ParseInfo::default()));
}
