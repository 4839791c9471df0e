use crate::error::{Error, Result};
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

/// Grammar of one `Requires-Dist` value. It is forgiving on purpose and will
/// accept some syntax that PEP 508 rejects.
static REQUIRES_DIST_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^(?P<name>[a-zA-Z0-9_.-]+)\s*",
        r"(?:\[(?P<extras>.+?)\])?\s*",
        r"(?:\(?(?P<version>[^;]*?)\)?)?\s*",
        r"(?:;\s*(?P<marker>.*?)\s*)?$",
    ))
    .unwrap()
});

static EXTRAS_SEPARATOR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*,\s*").unwrap());

/// `extra == 'name'` and the reversed `'name' == extra`
static EXTRA_MARKER_RES: LazyLock<[Regex; 2]> = LazyLock::new(|| {
    [
        Regex::new(r#"\bextra\s*==\s*(?:'(?P<single>\w+)'|"(?P<double>\w+)")"#).unwrap(),
        Regex::new(r#"(?:'(?P<single>\w+)'|"(?P<double>\w+)")\s*==\s*extra\b"#).unwrap(),
    ]
});

/// A dependency declared by a `Requires-Dist` (or legacy `Requires`) header of
/// a wheel's METADATA file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequiresDistEntry {
    /// The pypi package name
    pub name: String,

    /// Extras requested on the dependency (e.g. ["s3", "test"])
    pub extras: Vec<String>,

    /// Version clause as written, empty for any version
    pub version: String,

    /// Environment marker (e.g. "python_version > '3.7'"), empty if none
    pub marker: String,

    /// Name bound by an `extra == '<name>'` test in the marker, empty if none
    pub extra_marker_name: String,

    /// True if the marker is empty or consists only of an extra test
    pub generic: bool,
}

impl RequiresDistEntry {
    /// Creates an unconditional dependency with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            extras: Vec::new(),
            version: String::new(),
            marker: String::new(),
            extra_marker_name: String::new(),
            generic: true,
        }
    }

    /// Creates an unconditional dependency with a version clause
    pub fn with_version(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            ..Self::new(name)
        }
    }

    /// Adds extras to the dependency
    pub fn with_extras(mut self, extras: Vec<String>) -> Self {
        self.extras = extras;
        self
    }

    /// Sets the environment marker and reclassifies it
    pub fn with_marker(mut self, marker: impl Into<String>) -> Self {
        self.set_marker(marker.into());
        self
    }

    /// Parses an entry from the raw value of a `Requires-Dist` header.
    ///
    /// Fails with [`Error::RequiresDistSyntax`] only when the input does not
    /// match the dependency grammar at all.
    pub fn parse(raw: &str) -> Result<Self> {
        let captures = REQUIRES_DIST_RE
            .captures(raw)
            .ok_or_else(|| Error::RequiresDistSyntax(raw.to_string()))?;

        let mut entry = Self::new(&captures["name"]);
        if let Some(extras) = captures.name("extras") {
            entry.extras = EXTRAS_SEPARATOR_RE
                .split(extras.as_str())
                .map(str::to_string)
                .collect();
        }
        if let Some(version) = captures.name("version") {
            entry.version = version.as_str().to_string();
        }
        if let Some(marker) = captures.name("marker") {
            entry.set_marker(marker.as_str().to_string());
        }
        Ok(entry)
    }

    /// Returns a copy of this entry that additionally requires `extra` to be
    /// selected.
    ///
    /// Only meant for entries without an extra test of their own. If the
    /// marker already names an extra, the copy reports `extra` but its text
    /// still starts with the old test, so parsing it back yields the old name.
    pub fn with_extra(&self, extra: &str) -> Self {
        let extra_clause = format!("extra == '{}'", extra);
        let marker = if self.marker.is_empty() {
            extra_clause
        } else {
            format!("({}) and {}", self.marker, extra_clause)
        };
        Self {
            name: self.name.clone(),
            extras: self.extras.clone(),
            version: self.version.clone(),
            extra_marker_name: extra.to_string(),
            generic: self.marker.is_empty(),
            marker,
        }
    }

    fn set_marker(&mut self, marker: String) {
        let (extra_marker_name, generic) = classify_marker(&marker);
        self.extra_marker_name = extra_marker_name;
        self.generic = generic;
        self.marker = marker;
    }
}

/// Finds the extra named by `marker` and decides whether the marker is
/// nothing but that extra test.
fn classify_marker(marker: &str) -> (String, bool) {
    if marker.is_empty() {
        return (String::new(), true);
    }
    for pattern in EXTRA_MARKER_RES.iter() {
        if let Some(captures) = pattern.captures(marker) {
            let name = captures
                .name("single")
                .or_else(|| captures.name("double"))
                .map(|m| m.as_str().to_string())
                .unwrap_or_default();
            let whole = captures.get(0).map(|m| m.as_str() == marker).unwrap_or(false);
            return (name, whole);
        }
    }
    (String::new(), false)
}

impl fmt::Display for RequiresDistEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.extras.is_empty() {
            write!(f, " [{}]", self.extras.join(","))?;
        }
        if !self.version.is_empty() {
            write!(f, " {}", self.version)?;
        }
        if !self.marker.is_empty() {
            write!(f, " ; {}", self.marker)?;
        }
        Ok(())
    }
}

impl FromStr for RequiresDistEntry {
    type Err = Error;

    fn from_str(raw: &str) -> Result<Self> {
        Self::parse(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_parenthesized_version() {
        let entry = RequiresDistEntry::parse("pytz (>=2020.1)").unwrap();
        assert_eq!(entry.name, "pytz");
        assert_eq!(entry.version, ">=2020.1");
        assert!(entry.generic);
    }

    #[test]
    fn test_parse_extras_with_spaces() {
        let entry = RequiresDistEntry::parse("dask[array , dataframe]>=2023.1").unwrap();
        assert_eq!(entry.name, "dask");
        assert_eq!(entry.extras, vec!["array", "dataframe"]);
        assert_eq!(entry.version, ">=2023.1");
    }

    #[test]
    fn test_classify_double_quoted_and_reversed() {
        assert_eq!(classify_marker(r#"extra == "test""#), ("test".to_string(), true));
        assert_eq!(classify_marker("'docs' == extra"), ("docs".to_string(), true));
        assert_eq!(
            classify_marker("python_version < '3.9' and 'docs' == extra"),
            ("docs".to_string(), false)
        );
        assert_eq!(classify_marker("sys_platform == 'linux'"), (String::new(), false));
    }

    #[test]
    fn test_extra_in_tuple_is_not_recognized() {
        let entry = RequiresDistEntry::parse("foo ; extra in ('a', 'b')").unwrap();
        assert!(entry.extra_marker_name.is_empty());
        assert!(!entry.generic);
    }

    #[test]
    fn test_with_extra_on_marked_entry() {
        let entry = RequiresDistEntry::parse("sam ; python_version >= '3.10'").unwrap();
        let with_extra = entry.with_extra("original");
        assert_eq!(
            with_extra.marker,
            "(python_version >= '3.10') and extra == 'original'"
        );
        assert_eq!(with_extra.extra_marker_name, "original");
        assert!(!with_extra.generic);
        assert_eq!(
            RequiresDistEntry::parse(&with_extra.to_string()).unwrap(),
            with_extra
        );
    }
}
