//! Accumulating diagnostics across a resolution pass.

use crate::diagnostic::DiagnosticMessage;
use std::collections::HashSet;

/// Ordered, duplicate-free list of diagnostics.
///
/// The same file can be reached over several import paths; each problem is
/// still reported once, at the position it was first seen.
#[derive(Debug, Clone, Default)]
pub struct DiagnosticCollector {
    diagnostics: Vec<DiagnosticMessage>,
    seen: HashSet<DiagnosticMessage>,
}

impl DiagnosticCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a diagnostic; returns false if an identical one was already added.
    pub fn add(&mut self, diagnostic: DiagnosticMessage) -> bool {
        if self.seen.contains(&diagnostic) {
            return false;
        }
        self.seen.insert(diagnostic.clone());
        self.diagnostics.push(diagnostic);
        true
    }

    pub fn extend(&mut self, diagnostics: impl IntoIterator<Item = DiagnosticMessage>) {
        for diagnostic in diagnostics {
            self.add(diagnostic);
        }
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(DiagnosticMessage::is_error)
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DiagnosticMessage> {
        self.diagnostics.iter()
    }

    pub fn into_diagnostics(self) -> Vec<DiagnosticMessage> {
        self.diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn test_duplicates_are_dropped_in_order() {
        let mut collector = DiagnosticCollector::new();
        let a = ErrorKind::CannotReadFile.diagnostic().add_detail("a").build();
        let b = ErrorKind::ImportsMismatch.diagnostic().build();

        assert!(collector.add(a.clone()));
        assert!(collector.add(b.clone()));
        assert!(!collector.add(a.clone()));

        assert_eq!(collector.into_diagnostics(), vec![a, b]);
    }

    #[test]
    fn test_has_errors() {
        let mut collector = DiagnosticCollector::new();
        collector.add(ErrorKind::ImportsMismatch.diagnostic().build());
        assert!(!collector.has_errors());
        collector.add(ErrorKind::ImportCycle.diagnostic().build());
        assert!(collector.has_errors());
    }
}
