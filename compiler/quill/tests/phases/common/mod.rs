//! Shared test vocabulary and a small trigger-assembly harness.
//!
//! The harness stands in for a script matcher: it looks syntaxes up in the
//! catalog by grammar string and feeds them to a `TriggerBuilder`.

use std::any::Any;
use std::cell::RefCell;

use quill::diagnostic::Diagnostic;
use quill::lang::{
    Effect, Event, Expression, Literal, ParseContext, ParseInfo, Section, SyntaxElement, Trigger,
    TriggerBuilder, TriggerContext, WalkContext,
};
use quill::registry::{CatalogState, SyntaxRegistration};
use quill::types::{Data, Value};
use quill::Runtime;

/// Trigger context collecting what `say` printed.
#[derive(Default)]
pub struct Recorder {
    pub message: String,
    log: RefCell<Vec<String>>,
}

impl Recorder {
    pub fn with_message(message: &str) -> Self {
        Recorder {
            message: message.to_string(),
            log: RefCell::default(),
        }
    }

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

/// A context no test event handles.
pub struct Silence;

impl TriggerContext for Silence {
    fn name(&self) -> &'static str {
        "silence"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// `say %objects%`
#[derive(Default)]
pub struct Say {
    message: Option<Box<dyn Expression>>,
}

impl SyntaxElement for Say {
    fn init(
        &mut self,
        expressions: Vec<Box<dyn Expression>>,
        _: &ParseContext<'_>,
    ) -> Result<(), Diagnostic> {
        self.message = expressions.into_iter().next();
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
        let parts: Vec<String> = message
            .values(cx)
            .iter()
            .map(|value| cx.types().display(Some(value)))
            .collect();
        if let Some(recorder) = cx.context().downcast_ref::<Recorder>() {
            recorder.log.borrow_mut().push(parts.join(", "));
        }
    }
}

/// `%number% is even`
#[derive(Default)]
pub struct IsEven {
    number: Option<Box<dyn Expression>>,
}

impl SyntaxElement for IsEven {
    fn init(
        &mut self,
        expressions: Vec<Box<dyn Expression>>,
        _: &ParseContext<'_>,
    ) -> Result<(), Diagnostic> {
        self.number = expressions.into_iter().next();
        Ok(())
    }

    fn describe(&self, debug: bool) -> String {
        let number = self.number.as_ref().map(|n| n.describe(debug)).unwrap_or_default();
        format!("{number} is even")
    }
}

impl Expression for IsEven {
    fn values(&self, cx: &WalkContext<'_>) -> Vec<Value> {
        let Some(boolean) = cx.types().type_id("boolean") else {
            return Vec::new();
        };
        let even = self
            .number
            .as_ref()
            .and_then(|n| n.single(cx))
            .and_then(|v| v.as_integer())
            .is_some_and(|n| n % 2 == 0);
        vec![Value::new(boolean, Data::Boolean(even))]
    }
}

/// `[on] message`: fires for recorders only.
#[derive(Default)]
pub struct OnMessage;

impl SyntaxElement for OnMessage {
    fn init(&mut self, _: Vec<Box<dyn Expression>>, _: &ParseContext<'_>) -> Result<(), Diagnostic> {
        Ok(())
    }

    fn describe(&self, _debug: bool) -> String {
        "message".to_string()
    }
}

impl Event for OnMessage {
    fn check(&self, cx: &WalkContext<'_>) -> bool {
        cx.context().downcast_ref::<Recorder>().is_some()
    }
}

fn parse_number(text: &str) -> Option<Data> {
    text.parse().ok().map(Data::Integer)
}

/// Numbers, text, `say`, `%number% is even` and the `message` event.
pub fn test_addon() -> SyntaxRegistration {
    let mut registration = SyntaxRegistration::new("test");
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
    registration.add_effect::<Say>(&["say %objects%"]);
    registration.add_expression::<IsEven>("boolean", true, &["%number% is even"]);
    registration
        .new_event::<OnMessage>(&["message"])
        .context_value::<Recorder, _>("*message", "text", |r| vec![Data::text(&r.message)])
        .register();
    registration
}

/// A runtime with the core and test vocabularies.
pub fn runtime() -> Runtime {
    quill::init_tracing();
    let runtime = Runtime::new().unwrap();
    let diagnostics = runtime.register(test_addon()).unwrap();
    assert!(diagnostics.is_empty(), "{diagnostics:?}");
    runtime
}

/// Assembles triggers from catalog vocabulary.
pub struct Script<'a> {
    state: &'a CatalogState,
    builder: TriggerBuilder<'a>,
}

impl<'a> Script<'a> {
    pub fn new(state: &'a CatalogState) -> Self {
        Script {
            state,
            builder: TriggerBuilder::new(state.types()),
        }
    }

    fn section_for(&self, pattern: &str) -> Box<dyn Section> {
        self.state
            .sections()
            .iter()
            .find(|s| s.patterns().iter().any(|p| p.source == pattern))
            .unwrap_or_else(|| panic!("no section `{pattern}`"))
            .create()
    }

    fn effect_for(&self, pattern: &str) -> Box<dyn Effect> {
        self.state
            .effects()
            .iter()
            .find(|e| e.patterns().iter().any(|p| p.source == pattern))
            .unwrap_or_else(|| panic!("no effect `{pattern}`"))
            .create()
    }

    fn expression_for(&self, pattern: &str) -> Box<dyn Expression> {
        self.state
            .expressions()
            .iter()
            .find(|e| e.syntax().patterns().iter().any(|p| p.source == pattern))
            .unwrap_or_else(|| panic!("no expression `{pattern}`"))
            .syntax()
            .create()
    }

    fn event_for(&self, pattern: &str) -> Box<dyn Event> {
        self.state
            .events()
            .iter()
            .find(|e| e.syntax().patterns().iter().any(|p| p.source == pattern))
            .unwrap_or_else(|| panic!("no event `{pattern}`"))
            .syntax()
            .create()
    }

    pub fn on(&mut self, pattern: &str) -> bool {
        let event = self.event_for(pattern);
        self.builder.event(event, Vec::new(), ParseInfo::default())
    }

    pub fn open(&mut self, pattern: &str, expressions: Vec<Box<dyn Expression>>) -> bool {
        let section = self.section_for(pattern);
        self.builder
            .open_section(section, expressions, ParseInfo::default())
    }

    pub fn close(&mut self) {
        self.builder.close_section();
    }

    pub fn effect(&mut self, pattern: &str, expressions: Vec<Box<dyn Expression>>) -> bool {
        let effect = self.effect_for(pattern);
        self.builder.effect(effect, expressions, ParseInfo::default())
    }

    pub fn expression(
        &mut self,
        pattern: &str,
        expressions: Vec<Box<dyn Expression>>,
    ) -> Option<Box<dyn Expression>> {
        let expression = self.expression_for(pattern);
        self.builder
            .expression(expression, expressions, ParseInfo::default())
    }

    pub fn say(&mut self, text: &str) {
        let text = self.text(text);
        assert!(self.effect("say %objects%", vec![text]));
    }

    pub fn text(&self, text: &str) -> Box<dyn Expression> {
        let ty = self.state.types().type_id("text").unwrap();
        Box::new(Literal::new(Value::new(ty, Data::text(text))))
    }

    pub fn numbers(&self, range: std::ops::RangeInclusive<i64>) -> Box<dyn Expression> {
        let ty = self.state.types().type_id("number").unwrap();
        Box::new(Literal::list(
            range.map(|n| Value::new(ty, Data::Integer(n))).collect(),
        ))
    }

    pub fn build(self) -> Result<Trigger, Vec<Diagnostic>> {
        self.builder.build()
    }
}
