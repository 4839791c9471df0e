use crate::models::RequiresDistEntry;

pub mod diagnostics;
pub mod index;
pub mod rename;
pub mod stdrename;
pub mod version;

pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
pub use rename::{DependencyRename, DependencyRenamer};
pub use stdrename::StdRenames;
pub use version::translate_version_spec;

/// Result of converting the dependencies of one wheel
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Conversion {
    /// Conda dependency strings in `"<name> <version>"` form
    pub dependencies: Vec<String>,
    /// Everything noteworthy that happened along the way
    pub diagnostics: Diagnostics,
}

/// Converts parsed pypi dependencies into conda dependency strings.
#[derive(Debug, Clone, Default)]
pub struct DependencyConverter {
    renamer: DependencyRenamer,
    extra_dependencies: Vec<String>,
    python_version: String,
}

impl DependencyConverter {
    pub fn new(renamer: DependencyRenamer) -> Self {
        Self {
            renamer,
            ..Self::default()
        }
    }

    /// Conda dependencies appended verbatim after the converted ones
    pub fn with_extra_dependencies(mut self, extra_dependencies: Vec<String>) -> Self {
        self.extra_dependencies = extra_dependencies;
        self
    }

    /// Python version spec that overrides or supplies the `python` dependency
    pub fn with_python_version(mut self, python_version: impl Into<String>) -> Self {
        self.python_version = python_version.into();
        self
    }

    pub fn renamer(&self) -> &DependencyRenamer {
        &self.renamer
    }

    /// Converts `entries`, plus a `python` dependency built from the wheel's
    /// `Requires-Python` value when it is not empty.
    ///
    /// Output order follows the input, then a synthesized python dependency,
    /// then the extra dependencies. Nothing is sorted or deduplicated.
    pub fn convert(&self, entries: &[RequiresDistEntry], requires_python: &str) -> Conversion {
        let mut diagnostics = Diagnostics::new();
        let mut dependencies = Vec::new();
        let mut saw_python = false;

        let python_entry = (!requires_python.trim().is_empty())
            .then(|| RequiresDistEntry::with_version("python", requires_python.trim()));

        for entry in entries.iter().chain(python_entry.as_ref()) {
            if !entry.extra_marker_name.is_empty() {
                diagnostics.push(
                    DiagnosticKind::ExtraDependencySkipped,
                    format!("Skipping extra dependency: {}", entry),
                );
                continue;
            }
            if !entry.generic {
                diagnostics.push(
                    DiagnosticKind::MarkerDependencySkipped,
                    format!("Skipping dependency with environment marker: {}", entry),
                );
                continue;
            }

            let (conda_name, renamed) = self.renamer.resolve(&entry.name);
            let mut version = translate_version_spec(&entry.version, &mut diagnostics);

            if conda_name == "python" {
                if !self.python_version.is_empty() && self.python_version != version {
                    diagnostics.push(
                        DiagnosticKind::PythonVersionOverride,
                        format!(
                            "Overriding python version '{}' with '{}'",
                            version, self.python_version
                        ),
                    );
                    version = self.python_version.clone();
                }
                saw_python = true;
            }

            if conda_name.is_empty() {
                diagnostics.push(
                    DiagnosticKind::DependencyDropped,
                    format!("Dependency dropped: {}", entry),
                );
                continue;
            }

            let conda_dep = format!("{} {}", conda_name, version);
            if conda_name == entry.name {
                diagnostics.push(
                    DiagnosticKind::DependencyCopied,
                    format!("Dependency copied: '{}'", conda_dep),
                );
            } else {
                let source = if renamed { "rule" } else { "standard renames" };
                diagnostics.push(
                    DiagnosticKind::DependencyRenamed,
                    format!("Dependency renamed ({}): '{}' -> '{}'", source, entry, conda_dep),
                );
            }
            dependencies.push(conda_dep);
        }

        if !saw_python && !self.python_version.is_empty() {
            let conda_dep = format!("python {}", self.python_version);
            diagnostics.push(
                DiagnosticKind::PythonVersionOverride,
                format!("Added python dependency: '{}'", conda_dep),
            );
            dependencies.push(conda_dep);
        }

        for dep in &self.extra_dependencies {
            diagnostics.push(
                DiagnosticKind::DependencyAdded,
                format!("Dependency added: '{}'", dep),
            );
            dependencies.push(dep.clone());
        }

        Conversion {
            dependencies,
            diagnostics,
        }
    }
}

/// Strips the trailing separator left by an empty version clause
pub fn normalize_conda_dependency(dep: &str) -> &str {
    dep.trim_end()
}
