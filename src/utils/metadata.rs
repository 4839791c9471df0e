use crate::converter::{DiagnosticKind, Diagnostics};
use crate::error::{Error, Result};
use crate::models::RequiresDistEntry;
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};

/// Metadata versions this tool knows how to read
pub const SUPPORTED_METADATA_VERSIONS: &[&str] = &["1.0", "1.1", "1.2", "2.1", "2.2", "2.3", "2.4"];

/// Wheel format versions this tool knows how to read
pub const SUPPORTED_WHEEL_VERSIONS: &[&str] = &["1.0"];

/// Name of the extra that base dependencies are moved to by
/// [`rewrite_requires_dist`]
pub const ORIGINAL_EXTRA: &str = "original";

/// Headers and body of an RFC 822 style metadata file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, String)>,
    pub body: String,
}

impl Headers {
    /// First value of header `key`, compared case-insensitively
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    /// All values of header `key` in file order
    pub fn get_all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.entries
            .iter()
            .filter(move |(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Parses `Key: value` header lines up to the first blank line. Lines starting
/// with whitespace continue the previous value.
pub fn parse_headers(text: &str) -> Headers {
    let mut headers = Headers::default();
    let mut lines = text.lines();

    for line in lines.by_ref() {
        if line.trim().is_empty() {
            break;
        }
        if line.starts_with([' ', '\t']) {
            if let Some((_, value)) = headers.entries.last_mut() {
                value.push('\n');
                value.push_str(line.trim());
            }
            continue;
        }
        match line.split_once(':') {
            Some((key, value)) => headers
                .entries
                .push((key.trim().to_string(), value.trim().to_string())),
            None => debug!("Ignoring malformed metadata line: {}", line),
        }
    }

    headers.body = lines.collect::<Vec<_>>().join("\n");
    headers
}

/// Information from a wheel's `WHEEL` file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WheelInfo {
    pub wheel_version: String,
    pub root_is_purelib: bool,
    /// Optional build tag, used as the default conda build number
    pub build: String,
}

impl WheelInfo {
    pub fn parse(text: &str) -> Self {
        let headers = parse_headers(text);
        Self {
            wheel_version: headers.get("Wheel-Version").unwrap_or_default().to_string(),
            root_is_purelib: headers
                .get("Root-Is-Purelib")
                .is_some_and(|v| v.eq_ignore_ascii_case("true")),
            build: headers.get("Build").unwrap_or_default().to_string(),
        }
    }

    /// Only pure python wheels of a known format can become noarch packages
    pub fn validate(&self) -> Result<()> {
        if !SUPPORTED_WHEEL_VERSIONS.contains(&self.wheel_version.as_str()) {
            return Err(Error::UnsupportedWheel(format!(
                "unsupported wheel version '{}'",
                self.wheel_version
            )));
        }
        if !self.root_is_purelib {
            return Err(Error::UnsupportedWheel("wheel is not pure python".to_string()));
        }
        Ok(())
    }
}

/// Core metadata from a wheel's `METADATA` file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WheelMetadata {
    pub metadata_version: String,
    pub name: String,
    pub version: String,
    pub summary: Option<String>,
    pub license: Option<String>,
    pub requires_python: String,
    /// Raw `Requires-Dist` values, or legacy `Requires` values if there are none
    pub requires_dist: Vec<String>,
    pub provides_extra: Vec<String>,
}

impl WheelMetadata {
    pub fn parse(text: &str) -> Result<Self> {
        let headers = parse_headers(text);

        let metadata_version = headers.get("Metadata-Version").unwrap_or_default().to_string();
        if !SUPPORTED_METADATA_VERSIONS.contains(&metadata_version.as_str()) {
            return Err(Error::UnsupportedWheel(format!(
                "unsupported metadata version '{}'",
                metadata_version
            )));
        }

        let name = headers
            .get("Name")
            .filter(|n| !n.is_empty())
            .ok_or_else(|| Error::UnsupportedWheel("metadata has no Name".to_string()))?
            .to_string();
        let version = headers
            .get("Version")
            .filter(|v| !v.is_empty())
            .ok_or_else(|| Error::UnsupportedWheel("metadata has no Version".to_string()))?
            .to_string();

        let mut requires_dist: Vec<String> =
            headers.get_all("Requires-Dist").map(str::to_string).collect();
        if requires_dist.is_empty() {
            requires_dist = headers.get_all("Requires").map(str::to_string).collect();
        }

        Ok(Self {
            metadata_version,
            name,
            version,
            summary: headers.get("Summary").map(str::to_string),
            license: headers
                .get("License-Expression")
                .or_else(|| headers.get("License"))
                .filter(|l| !l.is_empty())
                .map(str::to_string),
            requires_python: headers.get("Requires-Python").unwrap_or_default().to_string(),
            requires_dist,
            provides_extra: headers.get_all("Provides-Extra").map(str::to_string).collect(),
        })
    }

    /// Parses every raw dependency entry. Entries that cannot be parsed are
    /// reported and left out instead of failing the whole wheel.
    pub fn dependencies(&self, diagnostics: &mut Diagnostics) -> Vec<RequiresDistEntry> {
        let mut entries = Vec::with_capacity(self.requires_dist.len());
        for raw in &self.requires_dist {
            match RequiresDistEntry::parse(raw) {
                Ok(entry) => entries.push(entry),
                Err(e) => diagnostics.push(DiagnosticKind::BadRequiresDist, e.to_string()),
            }
        }
        entries
    }
}

/// Rewrites `METADATA` so that pip does not see the wheel's base dependencies.
///
/// Every dependency that is not already tied to an extra is moved under the
/// `original` extra, and `Provides-Extra: original` is declared.
pub fn rewrite_requires_dist(metadata: &str, entries: &[RequiresDistEntry]) -> String {
    let headers = parse_headers(metadata);
    let mut lines: Vec<String> = headers
        .iter()
        .filter(|(k, _)| {
            !k.eq_ignore_ascii_case("Requires-Dist") && !k.eq_ignore_ascii_case("Requires")
        })
        .map(|(k, v)| format!("{}: {}", k, v.replace('\n', "\n        ")))
        .collect();

    for entry in entries {
        let entry = if entry.extra_marker_name.is_empty() {
            entry.with_extra(ORIGINAL_EXTRA)
        } else {
            entry.clone()
        };
        lines.push(format!("Requires-Dist: {}", entry));
    }
    lines.push(format!("Provides-Extra: {}", ORIGINAL_EXTRA));

    let mut rewritten = lines.join("\n");
    rewritten.push_str("\n\n");
    rewritten.push_str(&headers.body);
    if !headers.body.is_empty() && !headers.body.ends_with('\n') {
        rewritten.push('\n');
    }
    rewritten
}

/// Raw text of the metadata files of an unpacked wheel
#[derive(Debug, Clone)]
pub struct DistInfo {
    pub dir: PathBuf,
    pub metadata: String,
    pub wheel: String,
}

impl DistInfo {
    pub fn metadata_path(&self) -> PathBuf {
        self.dir.join("METADATA")
    }
}

/// Reads `METADATA` and `WHEEL` from a `.dist-info` directory, or from the
/// single `.dist-info` directory inside an unpacked wheel.
pub fn read_dist_info(dir: &Path) -> Result<DistInfo> {
    let dir = find_dist_info_dir(dir)?;
    let read = |name: &str| {
        let path = dir.join(name);
        fs::read_to_string(&path).map_err(|e| Error::FileOperation {
            path,
            message: format!("Failed to read {}: {}", name, e),
        })
    };
    let metadata = read("METADATA")?;
    let wheel = read("WHEEL")?;
    Ok(DistInfo {
        dir,
        metadata,
        wheel,
    })
}

fn find_dist_info_dir(dir: &Path) -> Result<PathBuf> {
    if dir.join("METADATA").is_file() {
        return Ok(dir.to_path_buf());
    }
    let entries = fs::read_dir(dir).map_err(|e| Error::FileOperation {
        path: dir.to_path_buf(),
        message: format!("Failed to read directory: {}", e),
    })?;
    entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .find(|path| {
            path.is_dir()
                && path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.ends_with(".dist-info"))
        })
        .ok_or_else(|| Error::FileOperation {
            path: dir.to_path_buf(),
            message: "No .dist-info directory found".to_string(),
        })
}
