use crate::converter::diagnostics::{DiagnosticKind, Diagnostics};
use regex::Regex;
use std::sync::LazyLock;

/// One pip version clause: operator followed by a PEP 440 style version.
static VERSION_CLAUSE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?i)^\s*(?P<operator>===|~=|==|!=|<=|>=|<|>)\s*v?",
        r"(?P<version>",
        r"(?:(?P<epoch>\d+)!)?",
        r"(?P<release>\d+(?:\.\d+)*)",
        r"(?:\.\*)?",
        r"(?:[-_.]?(?:a|b|c|rc|alpha|beta|pre|preview)[-_.]?\d*)?",
        r"(?:-\d+|[-_.]?(?:post|rev|r)[-_.]?\d*)?",
        r"(?:[-_.]?dev[-_.]?\d*)?",
        r"(?:\+[a-z0-9]+(?:[-_.][a-z0-9]+)*)?",
        r")\s*$",
    ))
    .unwrap()
});

/// Converts a pip version specifier into conda's version spec syntax.
///
/// Clauses are translated independently and joined with `,` in their original
/// order. Problems are reported through `diagnostics`; this never fails.
pub fn translate_version_spec(pip_version: &str, diagnostics: &mut Diagnostics) -> String {
    let mut conda_clauses: Vec<String> = Vec::new();

    for clause in pip_version.split(',') {
        let clause = clause.trim();
        if clause.is_empty() {
            continue;
        }

        let Some(captures) = VERSION_CLAUSE_RE.captures(clause) else {
            diagnostics.push(
                DiagnosticKind::BadVersionSpec,
                format!("Cannot convert bad version spec: '{}'", clause),
            );
            conda_clauses.push(clause.to_string());
            continue;
        };

        let operator = &captures["operator"];
        let version = &captures["version"];

        match operator {
            "~=" => {
                conda_clauses.push(format!(">={}", version));
                if let Some(wildcard) = compatible_release_wildcard(
                    captures.name("epoch").map(|m| m.as_str()),
                    &captures["release"],
                ) {
                    conda_clauses.push(format!("=={}", wildcard));
                }
            }
            "===" => {
                diagnostics.push(
                    DiagnosticKind::ArbitraryEquality,
                    format!(
                        "Converted arbitrary equality clause '{}' to '=={}' - may not match!",
                        clause, version
                    ),
                );
                conda_clauses.push(format!("=={}", version));
            }
            _ => conda_clauses.push(format!("{}{}", operator, version)),
        }
    }

    conda_clauses.join(",")
}

/// `1.2.3` becomes `1.2.*`; a single component release has no wildcard form.
fn compatible_release_wildcard(epoch: Option<&str>, release: &str) -> Option<String> {
    let (prefix, _last) = release.rsplit_once('.')?;
    Some(match epoch {
        Some(epoch) => format!("{}!{}.*", epoch, prefix),
        None => format!("{}.*", prefix),
    })
}
