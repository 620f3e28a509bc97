//! Core vocabulary: loops, conditionals, `continue`, `whether`, `loop-value`.

use quill_diagnostic::{Diagnostic, ErrorCode};
use quill_types::Value;

use crate::{
    Effect, Entry, Expression, ParseContext, Section, SectionNode, Step, StmtId, SyntaxElement,
    WalkContext,
};

/// Cursor of one loop in one invocation.
#[derive(Debug)]
pub(crate) struct LoopState {
    values: Vec<Value>,
    index: usize,
}

impl LoopState {
    pub(crate) fn current(&self) -> Option<&Value> {
        self.values.get(self.index)
    }

    /// Move to the next value; `false` once exhausted.
    fn advance(&mut self) -> bool {
        self.index += 1;
        self.index < self.values.len()
    }
}

fn describe_or_missing(expression: Option<&dyn Expression>, debug: bool) -> String {
    expression.map_or_else(|| "<missing>".to_string(), |e| e.describe(debug))
}

fn single_expression(
    expressions: Vec<Box<dyn Expression>>,
    element: &str,
) -> Result<Box<dyn Expression>, Diagnostic> {
    let count = expressions.len();
    let mut iter = expressions.into_iter();
    match (iter.next(), count) {
        (Some(expression), 1) => Ok(expression),
        _ => Err(Diagnostic::error(ErrorCode::E3002)
            .with_message(format!("`{element}` takes one expression, got {count}"))),
    }
}

/// `loop %objects%`: runs its body once per value.
#[derive(Default)]
pub struct SecLoop {
    looped: Option<Box<dyn Expression>>,
}

impl SyntaxElement for SecLoop {
    fn init(
        &mut self,
        expressions: Vec<Box<dyn Expression>>,
        _: &ParseContext<'_>,
    ) -> Result<(), Diagnostic> {
        self.looped = Some(single_expression(expressions, "loop")?);
        Ok(())
    }

    fn describe(&self, debug: bool) -> String {
        format!("loop {}", describe_or_missing(self.looped.as_deref(), debug))
    }
}

impl Section for SecLoop {
    fn is_loop(&self) -> bool {
        true
    }

    fn walk(&self, cx: &mut WalkContext<'_>, node: SectionNode, entry: Entry) -> Option<StmtId> {
        match entry {
            Entry::Enter => {
                let values = self.looped.as_ref().map(|e| e.values(cx)).unwrap_or_default();
                if values.is_empty() || node.body.is_none() {
                    cx.clear_section_state(node.id);
                    return node.after;
                }
                cx.set_section_state(node.id, LoopState { values, index: 0 });
                node.body
            }
            Entry::Resume | Entry::NextIteration => {
                let more = cx
                    .section_state_mut::<LoopState>(node.id)
                    .is_some_and(LoopState::advance);
                if more {
                    node.body
                } else {
                    cx.clear_section_state(node.id);
                    node.after
                }
            }
        }
    }
}

/// `if %=boolean%`: runs its body once when the condition holds.
#[derive(Default)]
pub struct SecConditional {
    condition: Option<Box<dyn Expression>>,
}

impl SyntaxElement for SecConditional {
    fn init(
        &mut self,
        expressions: Vec<Box<dyn Expression>>,
        _: &ParseContext<'_>,
    ) -> Result<(), Diagnostic> {
        self.condition = Some(single_expression(expressions, "if")?);
        Ok(())
    }

    fn describe(&self, debug: bool) -> String {
        format!("if {}", describe_or_missing(self.condition.as_deref(), debug))
    }
}

impl Section for SecConditional {
    fn walk(&self, cx: &mut WalkContext<'_>, node: SectionNode, entry: Entry) -> Option<StmtId> {
        if entry != Entry::Enter {
            return node.after;
        }
        let holds = self
            .condition
            .as_ref()
            .and_then(|c| c.single(cx))
            .and_then(|v| v.as_bool())
            .unwrap_or(false);
        if holds && node.body.is_some() {
            node.body
        } else {
            node.after
        }
    }
}

/// `continue`: skips to the next iteration of the innermost loop.
#[derive(Default)]
pub struct EffContinue;

impl SyntaxElement for EffContinue {
    fn init(
        &mut self,
        _: Vec<Box<dyn Expression>>,
        cx: &ParseContext<'_>,
    ) -> Result<(), Diagnostic> {
        if cx.state.innermost_loop().is_none() {
            return Err(Diagnostic::error(ErrorCode::E3001)
                .with_message("you can only use `continue` in a loop"));
        }
        Ok(())
    }

    fn describe(&self, _debug: bool) -> String {
        "continue".to_string()
    }
}

impl Effect for EffContinue {
    fn execute(&self, _: &mut WalkContext<'_>) {}

    fn walk(&self, cx: &mut WalkContext<'_>) -> Step {
        match cx.innermost_loop() {
            Some(section) => Step::Redirect {
                section,
                skip_to_next: true,
            },
            None => Step::Halt,
        }
    }
}

/// `whether %~boolean%`: a condition used as a boolean value.
#[derive(Default)]
pub struct ExprWhether {
    condition: Option<Box<dyn Expression>>,
}

impl SyntaxElement for ExprWhether {
    fn init(
        &mut self,
        expressions: Vec<Box<dyn Expression>>,
        _: &ParseContext<'_>,
    ) -> Result<(), Diagnostic> {
        self.condition = Some(single_expression(expressions, "whether")?);
        Ok(())
    }

    fn describe(&self, debug: bool) -> String {
        format!("whether {}", describe_or_missing(self.condition.as_deref(), debug))
    }
}

impl Expression for ExprWhether {
    fn values(&self, cx: &WalkContext<'_>) -> Vec<Value> {
        self.condition
            .as_ref()
            .map(|c| c.values(cx))
            .unwrap_or_default()
    }
}

/// `[the] loop-value`: the value the innermost loop is on.
#[derive(Default)]
pub struct ExprLoopValue;

impl SyntaxElement for ExprLoopValue {
    fn init(
        &mut self,
        _: Vec<Box<dyn Expression>>,
        cx: &ParseContext<'_>,
    ) -> Result<(), Diagnostic> {
        if cx.state.innermost_loop().is_none() {
            return Err(Diagnostic::error(ErrorCode::E3002)
                .with_message("`loop-value` can only be used in a loop"));
        }
        Ok(())
    }

    fn describe(&self, _debug: bool) -> String {
        "loop-value".to_string()
    }
}

impl Expression for ExprLoopValue {
    fn values(&self, cx: &WalkContext<'_>) -> Vec<Value> {
        cx.loop_value().cloned().into_iter().collect()
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]
