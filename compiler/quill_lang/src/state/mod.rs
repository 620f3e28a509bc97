//! Parse-time state shared by the elements of one trigger.

use crate::StmtId;

/// A section whose body is being assembled.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OpenSection {
    pub id: StmtId,
    pub is_loop: bool,
    pub description: String,
}

/// Sections currently open while a trigger is being built.
#[derive(Clone, Debug, Default)]
pub struct ParserState {
    /// Outermost first.
    sections: Vec<OpenSection>,
}

impl ParserState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open sections, innermost first.
    pub fn current_sections(&self) -> impl Iterator<Item = &OpenSection> {
        self.sections.iter().rev()
    }

    /// The innermost open loop.
    pub fn innermost_loop(&self) -> Option<&OpenSection> {
        self.current_sections().find(|s| s.is_loop)
    }

    pub fn depth(&self) -> usize {
        self.sections.len()
    }

    pub(crate) fn innermost_id(&self) -> Option<StmtId> {
        self.sections.last().map(|s| s.id)
    }

    pub(crate) fn push(&mut self, section: OpenSection) {
        self.sections.push(section);
    }

    pub(crate) fn pop(&mut self) -> Option<OpenSection> {
        self.sections.pop()
    }
}
