//! Syntax element traits.
//!
//! Every piece of vocabulary an addon contributes implements
//! [`SyntaxElement`] plus one of the category traits. Instances are created
//! per occurrence in a script, initialized once by the [`TriggerBuilder`],
//! and then shared by every firing of the compiled trigger.
//!
//! [`TriggerBuilder`]: crate::TriggerBuilder

use quill_diagnostic::Diagnostic;
use quill_types::{TypeSystem, Value};

use crate::{ParserState, StmtId, WalkContext};

/// Which pattern of a declaration matched, and the parse mark it produced.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
pub struct ParseInfo {
    /// Index into the declaration's pattern list.
    pub matched_pattern: usize,
    /// Sum of the marks of the choice alternatives taken.
    pub parse_mark: u32,
}

/// Everything an element sees while initializing.
pub struct ParseContext<'a> {
    pub types: &'a TypeSystem,
    pub state: &'a ParserState,
    pub info: ParseInfo,
}

/// Common behaviour of all syntax elements.
pub trait SyntaxElement: Send + Sync {
    /// Take the matched sub-expressions and validate them.
    ///
    /// An error drops the element; the trigger it belongs to is rejected.
    fn init(
        &mut self,
        expressions: Vec<Box<dyn Expression>>,
        cx: &ParseContext<'_>,
    ) -> Result<(), Diagnostic>;

    /// Script-like rendering, for logs and debugging.
    fn describe(&self, debug: bool) -> String;
}

/// A syntax element producing values.
pub trait Expression: SyntaxElement {
    fn values(&self, cx: &WalkContext<'_>) -> Vec<Value>;

    /// The value, when there is exactly one.
    fn single(&self, cx: &WalkContext<'_>) -> Option<Value> {
        let mut values = self.values(cx);
        if values.len() == 1 {
            values.pop()
        } else {
            None
        }
    }

    fn is_single(&self) -> bool {
        true
    }
}

/// What the walk engine does after an effect.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Step {
    /// Proceed to the syntactic successor.
    Next,
    /// Hand control back to an active section.
    Redirect {
        section: StmtId,
        /// Advance the section to its next iteration.
        skip_to_next: bool,
    },
    /// Stop this invocation.
    Halt,
}

/// A statement with a side effect.
pub trait Effect: SyntaxElement {
    fn execute(&self, cx: &mut WalkContext<'_>);

    /// Run the effect and say what comes next.
    ///
    /// Overridden by effects that redirect control flow.
    fn walk(&self, cx: &mut WalkContext<'_>) -> Step {
        self.execute(cx);
        Step::Next
    }
}

/// How control arrives at a section.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Entry {
    /// Normal sequencing reached the section.
    Enter,
    /// The section's body ran to its end.
    Resume,
    /// A `continue` targeted the section.
    NextIteration,
}

/// Where a section sits in its trigger.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct SectionNode {
    pub id: StmtId,
    /// First statement of the body.
    pub body: Option<StmtId>,
    /// What runs once the section is done: the next statement, or the
    /// enclosing section when this one ends its body.
    pub after: Option<StmtId>,
}

/// A statement owning a body.
pub trait Section: SyntaxElement {
    /// Whether `continue` may target this section.
    fn is_loop(&self) -> bool {
        false
    }

    /// Decide what runs next: `node.body` to run the body, anything else to
    /// leave the section.
    fn walk(&self, cx: &mut WalkContext<'_>, node: SectionNode, entry: Entry) -> Option<StmtId>;
}

/// The condition a trigger fires on.
pub trait Event: SyntaxElement {
    fn check(&self, cx: &WalkContext<'_>) -> bool;
}

/// A text-formatting tag.
pub trait Tag: Send + Sync {
    /// Validate the tag parameters.
    fn init(&mut self, key: &str, parameters: &[String]) -> bool;

    fn apply(&self, text: &str) -> String;
}

/// A constant expression.
#[derive(Clone, Debug)]
pub struct Literal {
    values: Vec<Value>,
}

impl Literal {
    pub fn new(value: Value) -> Self {
        Literal { values: vec![value] }
    }

    pub fn list(values: Vec<Value>) -> Self {
        Literal { values }
    }
}

impl SyntaxElement for Literal {
    fn init(&mut self, _: Vec<Box<dyn Expression>>, _: &ParseContext<'_>) -> Result<(), Diagnostic> {
        Ok(())
    }

    fn describe(&self, _debug: bool) -> String {
        let parts: Vec<String> = self.values.iter().map(|v| v.data().to_string()).collect();
        parts.join(", ")
    }
}

impl Expression for Literal {
    fn values(&self, _: &WalkContext<'_>) -> Vec<Value> {
        self.values.clone()
    }

    fn is_single(&self) -> bool {
        self.values.len() == 1
    }
}
