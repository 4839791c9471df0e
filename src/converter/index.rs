use crate::converter::normalize_conda_dependency;
use crate::error::Result;
use serde::Serialize;
use std::collections::HashSet;
use std::time::{SystemTime, UNIX_EPOCH};

/// Contents of a noarch python conda package's `info/index.json`
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct IndexJson {
    pub arch: Option<String>,
    pub build: String,
    pub build_number: u64,
    pub depends: Vec<String>,
    pub license: Option<String>,
    pub name: String,
    pub noarch: String,
    pub platform: Option<String>,
    pub subdir: String,
    pub timestamp: u64,
    pub version: String,
}

impl IndexJson {
    /// Builds the index for a converted wheel.
    ///
    /// The build number comes from `build_number` if given, otherwise from the
    /// wheel's `Build` tag when it is numeric, otherwise 0. Duplicate
    /// dependencies are dropped, keeping the first occurrence.
    pub fn new(
        name: &str,
        version: &str,
        license: Option<&str>,
        depends: &[String],
        wheel_build_tag: &str,
        build_number: Option<u64>,
    ) -> Self {
        let build_number = build_number
            .or_else(|| wheel_build_tag.trim().parse().ok())
            .unwrap_or(0);

        let mut seen = HashSet::new();
        let depends = depends
            .iter()
            .filter(|dep| seen.insert(normalize_conda_dependency(dep).to_string()))
            .cloned()
            .collect();

        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);

        Self {
            arch: None,
            build: "py_0".to_string(),
            build_number,
            depends,
            license: license.map(str::to_string),
            name: name.to_string(),
            noarch: "python".to_string(),
            platform: None,
            subdir: "noarch".to_string(),
            timestamp,
            version: version.to_string(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
