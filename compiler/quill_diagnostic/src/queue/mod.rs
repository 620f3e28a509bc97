//! Per-batch collection of diagnostics.
//!
//! One registration batch or one trigger build owns a queue and flushes it
//! when done. Errors past the configured limit are counted but not kept.

use std::collections::HashSet;

use crate::{Diagnostic, ErrorCode};

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct DiagnosticConfig {
    /// Errors kept per batch; 0 keeps all of them.
    pub error_limit: usize,
    /// Drop a report equal in code, message and source to a kept one.
    pub deduplicate: bool,
}

impl Default for DiagnosticConfig {
    fn default() -> Self {
        DiagnosticConfig {
            error_limit: 100,
            deduplicate: true,
        }
    }
}

impl DiagnosticConfig {
    /// Keep everything, repeats included.
    pub fn unlimited() -> Self {
        DiagnosticConfig {
            error_limit: 0,
            deduplicate: false,
        }
    }
}

type RepeatKey = (ErrorCode, String, Option<String>);

fn repeat_key(diagnostic: &Diagnostic) -> RepeatKey {
    (
        diagnostic.code,
        diagnostic.message.clone(),
        diagnostic.source.clone(),
    )
}

/// Diagnostics of one batch, in report order.
#[derive(Clone, Debug, Default)]
pub struct DiagnosticQueue {
    kept: Vec<Diagnostic>,
    reported: HashSet<RepeatKey>,
    /// Every error reported, kept or not.
    errors: usize,
    config: DiagnosticConfig,
}

impl DiagnosticQueue {
    pub fn new() -> Self {
        Self::with_config(DiagnosticConfig::default())
    }

    pub fn with_config(config: DiagnosticConfig) -> Self {
        DiagnosticQueue {
            config,
            ..DiagnosticQueue::default()
        }
    }

    /// Report a diagnostic; `false` when the limit or deduplication dropped it.
    pub fn add(&mut self, diagnostic: Diagnostic) -> bool {
        if diagnostic.is_error() {
            self.errors += 1;
            if self.config.error_limit != 0 && self.errors > self.config.error_limit {
                return false;
            }
        }
        if self.config.deduplicate && !self.reported.insert(repeat_key(&diagnostic)) {
            return false;
        }
        self.kept.push(diagnostic);
        true
    }

    pub fn error_count(&self) -> usize {
        self.errors
    }

    pub fn has_errors(&self) -> bool {
        self.errors != 0
    }

    pub fn len(&self) -> usize {
        self.kept.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kept.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.kept.iter()
    }

    /// Hand the kept diagnostics over and start a new batch.
    pub fn flush(&mut self) -> Vec<Diagnostic> {
        self.reported.clear();
        self.errors = 0;
        std::mem::take(&mut self.kept)
    }
}

impl Extend<Diagnostic> for DiagnosticQueue {
    fn extend<I: IntoIterator<Item = Diagnostic>>(&mut self, iter: I) {
        for diagnostic in iter {
            self.add(diagnostic);
        }
    }
}
