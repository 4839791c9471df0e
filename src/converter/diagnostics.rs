use log::{Level, log};
use std::fmt;

/// The kind of non-fatal event reported while converting dependencies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    /// A version clause that does not follow the version specifier grammar
    BadVersionSpec,
    /// A `===` clause converted to `==`
    ArbitraryEquality,
    /// A dependency that only applies when one of the wheel's extras is selected
    ExtraDependencySkipped,
    /// A dependency gated by an environment marker other than an extra
    MarkerDependencySkipped,
    /// The python version constraint was replaced or supplied by an override
    PythonVersionOverride,
    /// A dependency removed by a rename rule with an empty replacement
    DependencyDropped,
    /// A dependency passed through with its pypi name
    DependencyCopied,
    /// A dependency whose conda name differs from its pypi name
    DependencyRenamed,
    /// An extra conda dependency appended verbatim
    DependencyAdded,
    /// A `Requires-Dist` entry that could not be parsed
    BadRequiresDist,
}

impl DiagnosticKind {
    /// Log level at which this kind is reported
    pub fn level(self) -> Level {
        match self {
            DiagnosticKind::BadVersionSpec
            | DiagnosticKind::ArbitraryEquality
            | DiagnosticKind::MarkerDependencySkipped
            | DiagnosticKind::BadRequiresDist => Level::Warn,
            DiagnosticKind::PythonVersionOverride => Level::Info,
            DiagnosticKind::ExtraDependencySkipped
            | DiagnosticKind::DependencyDropped
            | DiagnosticKind::DependencyCopied
            | DiagnosticKind::DependencyRenamed
            | DiagnosticKind::DependencyAdded => Level::Debug,
        }
    }
}

/// A single recorded event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
}

impl Diagnostic {
    pub fn level(&self) -> Level {
        self.kind.level()
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.level(), self.message)
    }
}

/// Ordered collection of diagnostics.
///
/// Every diagnostic pushed here is also sent to the `log` facade, so a CLI run
/// shows the same messages that callers of the library can inspect.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a diagnostic and logs it at the level implied by its kind
    pub fn push(&mut self, kind: DiagnosticKind, message: impl Into<String>) {
        let message = message.into();
        log!(kind.level(), "{}", message);
        self.entries.push(Diagnostic { kind, message });
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Diagnostics reported at warning level
    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter().filter(|d| d.level() == Level::Warn)
    }

    pub fn of_kind(&self, kind: DiagnosticKind) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter().filter(move |d| d.kind == kind)
    }

    /// Moves all diagnostics of `other` to the end of this collection
    pub fn extend(&mut self, other: Diagnostics) {
        self.entries.extend(other.entries);
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levels_and_filters() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.push(DiagnosticKind::DependencyCopied, "Dependency copied: 'foo '");
        diagnostics.push(
            DiagnosticKind::MarkerDependencySkipped,
            "Skipping dependency with environment marker: bar ; sys_platform == 'win32'",
        );

        assert_eq!(diagnostics.len(), 2);
        assert_eq!(diagnostics.warnings().count(), 1);
        assert_eq!(
            diagnostics
                .of_kind(DiagnosticKind::DependencyCopied)
                .count(),
            1
        );

        let warning = diagnostics.warnings().next().unwrap();
        assert!(warning.to_string().starts_with("WARN: Skipping"));
    }
}
