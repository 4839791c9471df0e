//! `[tool.whl2conda]` settings in a project's `pyproject.toml`.

use crate::error::{Error, Result};
use crate::models::{CondaPackageFormat, PyProject};
use crate::utils::toml::{ensure_table, read_toml, write_toml};
use log::{debug, info, warn};
use std::fs;
use std::path::{Path, PathBuf};
use toml_edit::{Array, DocumentMut};

/// Settings read from `pyproject.toml`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PyProjInfo {
    /// Directory holding the `pyproject.toml` file
    pub project_dir: PathBuf,
    /// The file itself, if one was found
    pub toml_file: Option<PathBuf>,
    /// `build-system.build-backend`
    pub build_backend: String,
    /// Overrides the name of the conda package
    pub conda_name: String,
    pub conda_format: Option<CondaPackageFormat>,
    /// Where to look for wheels, resolved against `project_dir`
    pub wheel_dir: Option<PathBuf>,
    /// Where to write conda packages, resolved against `project_dir`
    pub out_dir: Option<PathBuf>,
    /// `(pattern, replacement)` pairs in file order
    pub dependency_rename: Vec<(String, String)>,
    pub extra_dependencies: Vec<String>,
}

/// Reads project settings from a directory or a `.toml` file.
///
/// A directory without a `pyproject.toml` yields the defaults. Values of the
/// wrong type are ignored with a warning.
pub fn read_pyproject(path: &Path) -> Result<PyProjInfo> {
    let (project_dir, toml_file) = if path.is_dir() {
        (path.to_path_buf(), path.join("pyproject.toml"))
    } else {
        if path.extension().and_then(|e| e.to_str()) != Some("toml") {
            return Err(Error::General(format!(
                "'{}' lacks .toml suffix",
                path.display()
            )));
        }
        let project_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        (project_dir, path.to_path_buf())
    };

    let mut info = PyProjInfo {
        project_dir,
        ..PyProjInfo::default()
    };

    if !toml_file.is_file() {
        debug!("No pyproject.toml in {}", info.project_dir.display());
        return Ok(info);
    }

    let content = fs::read_to_string(&toml_file).map_err(|e| Error::FileOperation {
        path: toml_file.clone(),
        message: format!("Failed to read pyproject.toml: {}", e),
    })?;
    let pyproject: PyProject = toml::from_str(&content)?;

    info.build_backend = pyproject
        .build_system
        .and_then(|b| b.build_backend)
        .unwrap_or_default();

    let settings = pyproject
        .tool
        .and_then(|t| t.whl2conda)
        .unwrap_or_default();
    let reader = SettingsReader {
        file: &toml_file,
        settings: &settings,
    };

    for key in settings.keys().filter(|k| !is_known_setting(k)) {
        reader.ignored_key(key, "unknown setting");
    }

    info.conda_name = reader.string("conda-name");

    let wheel_dir = reader.string("wheel-dir");
    if !wheel_dir.is_empty() {
        info.wheel_dir = Some(info.project_dir.join(wheel_dir));
    }
    let out_dir = reader.string("out-dir");
    if !out_dir.is_empty() {
        info.out_dir = Some(info.project_dir.join(out_dir));
    }

    let conda_format = reader.string("conda-format");
    if !conda_format.is_empty() {
        match conda_format.parse() {
            Ok(format) => info.conda_format = Some(format),
            Err(_) => reader.ignored_key(
                "conda-format",
                &format!("{} is not a valid conda output format", conda_format),
            ),
        }
    }

    info.dependency_rename = reader
        .array("dependency-rename")
        .iter()
        .filter_map(|entry| match entry.as_array().map(Vec::as_slice) {
            Some([toml::Value::String(pattern), toml::Value::String(replacement)]) => {
                Some((pattern.clone(), replacement.clone()))
            }
            _ => {
                reader.ignored_value(
                    "dependency-rename",
                    &format!("Expected pair of strings but got '{}'", entry),
                );
                None
            }
        })
        .collect();

    info.extra_dependencies = reader
        .array("extra-dependencies")
        .iter()
        .filter_map(|dep| match dep {
            toml::Value::String(dep) => Some(dep.clone()),
            _ => {
                reader.ignored_value(
                    "extra-dependencies",
                    &format!("Expected string but got '{}'", dep),
                );
                None
            }
        })
        .collect();

    debug!("Read whl2conda settings from {}", toml_file.display());
    info.toml_file = Some(toml_file);
    Ok(info)
}

struct SettingsReader<'a> {
    file: &'a Path,
    settings: &'a toml::Table,
}

impl SettingsReader<'_> {
    fn string(&self, key: &str) -> String {
        match self.settings.get(key) {
            None => String::new(),
            Some(toml::Value::String(s)) => s.clone(),
            Some(other) => {
                self.ignored_key(key, &format!("value is not a string: {}", other));
                String::new()
            }
        }
    }

    fn array(&self, key: &str) -> &[toml::Value] {
        match self.settings.get(key) {
            None => &[],
            Some(toml::Value::Array(values)) => values,
            Some(other) => {
                self.ignored_key(key, &format!("value is not an array: {}", other));
                &[]
            }
        }
    }

    fn ignored_key(&self, key: &str, msg: &str) {
        warn!(
            "Ignoring pyproject key 'tool.whl2conda.{}': {} from {}",
            key,
            msg,
            self.file.display()
        );
    }

    fn ignored_value(&self, key: &str, msg: &str) {
        warn!(
            "Ignoring value in pyproject key 'tool.whl2conda.{}': {} from {}",
            key,
            msg,
            self.file.display()
        );
    }
}

enum DefaultValue {
    Str(&'static str),
    EmptyArray,
}

const TOOL_DEFAULTS: &[(&str, DefaultValue, &[&str])] = &[
    (
        "conda-name",
        DefaultValue::Str(""),
        &[
            "Overrides name of conda package generated by whl2conda",
            "If empty, default is taken from project.name",
        ],
    ),
    (
        "wheel-dir",
        DefaultValue::Str("dist"),
        &[
            "The default directory for whl2conda to look for wheels.",
            "Specified relative to the project root.",
        ],
    ),
    (
        "out-dir",
        DefaultValue::Str(""),
        &[
            "The default directory for writing conda packages",
            "If not specified, this will be the wheel directory.",
        ],
    ),
    (
        "conda-format",
        DefaultValue::Str("V2"),
        &[
            "The default output conda package format.",
            "Valid values are:",
            "   \"V1\" / \".tar.bz2\": original .tar.bz2 package format",
            "   \"V2\" / \".conda\": new V2 .conda package format",
            "   \"TREE\":  output package as directory tree (debug)",
        ],
    ),
    (
        "dependency-rename",
        DefaultValue::EmptyArray,
        &[
            "An optional list of pypi/conda rename patterns",
            "Each entry should be a two element list of the form",
            "   [\"<pypi-name-pattern>\", \"<conda-name>\"]",
            "Where <pypi-name-pattern> may either just be the pypi package name",
            "or is a regular expression that will match the full name,",
            "and where <conda-name> can refer to groups in the pattern.",
            "For example, to rename all `acme-<foo>` packages to `acme.<foo>`:",
            "   [\"acme-(.*)\", \"acme.\\\\1\"]",
        ],
    ),
    (
        "extra-dependencies",
        DefaultValue::EmptyArray,
        &["An optional list of extra conda dependencies."],
    ),
];

/// Adds every missing `[tool.whl2conda]` key, with explanatory comments, to
/// `doc`. Keys already present are left untouched.
pub fn add_whl2conda_defaults(doc: &mut DocumentMut) {
    let table = ensure_table(doc, &["tool", "whl2conda"]);

    for (key, default, comments) in TOOL_DEFAULTS {
        if table.contains_key(key) {
            continue;
        }
        let separator = if table.is_empty() { "" } else { "\n" };
        let item = match default {
            DefaultValue::Str(s) => toml_edit::value(*s),
            DefaultValue::EmptyArray => toml_edit::value(Array::new()),
        };
        table.insert(key, item);

        let prefix: String = comments.iter().map(|c| format!("# {}\n", c)).collect();
        if let Some(mut inserted) = table.key_mut(key) {
            inserted
                .leaf_decor_mut()
                .set_prefix(format!("{}{}", separator, prefix));
        }
    }
}

/// Renders `existing` pyproject content with the default settings added
pub fn pyproject_with_defaults(existing: &str) -> Result<String> {
    let mut doc = existing.parse::<DocumentMut>()?;
    add_whl2conda_defaults(&mut doc);
    Ok(doc.to_string())
}

/// Writes the default `[tool.whl2conda]` settings into a `pyproject.toml`.
///
/// `path` is either the file or the directory containing it. The file is
/// created when missing. Returns the path of the written file.
pub fn add_pyproject_defaults(path: &Path) -> Result<PathBuf> {
    let toml_file = if path.is_dir() {
        path.join("pyproject.toml")
    } else {
        path.to_path_buf()
    };
    if toml_file.extension().and_then(|e| e.to_str()) != Some("toml") {
        return Err(Error::General(format!(
            "Cannot write to non .toml file {}",
            toml_file.display()
        )));
    }

    let mut doc = if toml_file.is_file() {
        read_toml(&toml_file)?
    } else {
        DocumentMut::new()
    };
    add_whl2conda_defaults(&mut doc);
    write_toml(&toml_file, &doc)?;

    info!("Wrote whl2conda defaults to {}", toml_file.display());
    Ok(toml_file)
}

/// True if `key` is a `[tool.whl2conda]` setting this tool knows about
pub fn is_known_setting(key: &str) -> bool {
    TOOL_DEFAULTS.iter().any(|(k, _, _)| *k == key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_on_empty_document() {
        let rendered = pyproject_with_defaults("").unwrap();
        assert!(rendered.contains("[tool.whl2conda]"));
        assert!(rendered.contains("# Overrides name of conda package generated by whl2conda\n"));
        assert!(rendered.contains("wheel-dir = \"dist\""));
        assert!(rendered.contains("dependency-rename = []"));
        assert!(rendered.contains("conda-format = \"V2\""));
    }

    #[test]
    fn test_defaults_keep_existing_values() {
        let rendered = pyproject_with_defaults(
            "[project]\nname = \"foo\"\n\n[tool.whl2conda]\nconda-name = \"bar\"\n",
        )
        .unwrap();
        assert!(rendered.starts_with("[project]\nname = \"foo\"\n"));
        assert!(rendered.contains("conda-name = \"bar\""));
        assert_eq!(
            rendered
                .lines()
                .filter(|l| l.trim_start().starts_with("conda-name"))
                .count(),
            1
        );
        assert!(rendered.contains("extra-dependencies = []"));
    }

    #[test]
    fn test_defaults_parse_back() {
        let temp_dir = TempDir::new().unwrap();
        add_pyproject_defaults(temp_dir.path()).unwrap();
        let info = read_pyproject(temp_dir.path()).unwrap();
        assert_eq!(info.wheel_dir, Some(temp_dir.path().join("dist")));
        assert_eq!(info.out_dir, None);
        assert_eq!(info.conda_format, Some(CondaPackageFormat::V2));
        assert!(info.dependency_rename.is_empty());
    }

    #[test]
    fn test_add_defaults_rejects_non_toml() {
        let temp_dir = TempDir::new().unwrap();
        let err = add_pyproject_defaults(&temp_dir.path().join("setup.cfg")).unwrap_err();
        assert!(err.contains("non .toml file"));
    }

    #[test]
    fn test_is_known_setting() {
        assert!(is_known_setting("dependency-rename"));
        assert!(!is_known_setting("dependency_rename"));
    }
}
