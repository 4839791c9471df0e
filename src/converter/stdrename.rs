//! Standard pypi to conda renames drawn from conda-forge.
//!
//! conda-forge bots publish a `name_mapping.json` file listing the pypi and
//! conda names of every package they know about. The subset of entries whose
//! names differ is kept as a simple JSON object keyed by pypi name, together
//! with a few `$`-prefixed keys describing where and when it was downloaded.

use crate::error::{Error, Result};
use log::{debug, info, warn};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Minimum number of seconds before a cached table is considered stale
pub const DEFAULT_MIN_EXPIRATION: u64 = 300;

const BUNDLED_STD_RENAMES: &str = include_str!("stdrename.json");

const SOURCE_KEY: &str = "$source";
const DATE_KEY: &str = "$date";
const ETAG_KEY: &str = "$etag";
const MAX_AGE_KEY: &str = "$max-age";

/// One entry of the conda-forge `name_mapping.json` array
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct NameMapping {
    pub pypi_name: Option<String>,
    pub conda_name: Option<String>,
    pub import_name: Option<String>,
}

/// Read-only table mapping pypi package names to conda package names
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StdRenames {
    renames: BTreeMap<String, String>,
    metadata: BTreeMap<String, String>,
}

impl StdRenames {
    /// Parses the JSON object format used by the cached rename file.
    pub fn from_json(json: &str) -> Result<Self> {
        let object: Map<String, Value> = serde_json::from_str(json)?;
        let mut table = Self::default();

        for (key, value) in object {
            let Value::String(value) = value else {
                warn!("Ignoring non-string value for standard rename '{}'", key);
                continue;
            };
            if key.starts_with('$') {
                table.metadata.insert(key, value);
            } else if key != value {
                table.renames.insert(key, value);
            }
        }

        debug!("Loaded {} standard renames", table.renames.len());
        Ok(table)
    }

    /// Builds a table from downloaded conda-forge name mappings, keeping only
    /// the entries where the pypi and conda names differ.
    pub fn from_name_mappings(
        source: &str,
        date: &str,
        etag: &str,
        max_age: Option<u64>,
        mappings: &[NameMapping],
    ) -> Self {
        let mut table = Self::default();
        let max_age = max_age.unwrap_or(0).max(DEFAULT_MIN_EXPIRATION);
        table.metadata.insert(SOURCE_KEY.to_string(), source.to_string());
        table.metadata.insert(DATE_KEY.to_string(), date.to_string());
        table.metadata.insert(ETAG_KEY.to_string(), etag.trim_matches('"').to_string());
        table.metadata.insert(MAX_AGE_KEY.to_string(), max_age.to_string());

        for mapping in mappings {
            if let (Some(pypi_name), Some(conda_name)) = (&mapping.pypi_name, &mapping.conda_name) {
                if !pypi_name.is_empty() && !conda_name.is_empty() && pypi_name != conda_name {
                    table.renames.insert(pypi_name.clone(), conda_name.clone());
                }
            }
        }

        table
    }

    /// Parses the raw `name_mapping.json` array and builds a table from it
    pub fn from_name_mappings_json(
        source: &str,
        date: &str,
        etag: &str,
        max_age: Option<u64>,
        json: &str,
    ) -> Result<Self> {
        let mappings: Vec<NameMapping> = serde_json::from_str(json)?;
        Ok(Self::from_name_mappings(source, date, etag, max_age, &mappings))
    }

    /// The table bundled with this program
    pub fn bundled() -> Result<Self> {
        Self::from_json(BUNDLED_STD_RENAMES)
    }

    /// Reads a table from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| Error::FileOperation {
            path: path.to_path_buf(),
            message: format!("Failed to read standard renames: {}", e),
        })?;
        Self::from_json(&content)
    }

    /// Serializes the table, metadata keys included, as pretty printed JSON
    /// with sorted keys.
    pub fn to_json(&self) -> Result<String> {
        let merged: BTreeMap<&str, &str> = self
            .metadata
            .iter()
            .chain(self.renames.iter())
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        Ok(serde_json::to_string_pretty(&merged)?)
    }

    /// Writes the table to `path`, creating parent directories as needed
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_json()?).map_err(|e| Error::FileOperation {
            path: path.to_path_buf(),
            message: format!("Failed to write standard renames: {}", e),
        })
    }

    /// Conda name for `pypi_name`, if it is renamed
    pub fn get(&self, pypi_name: &str) -> Option<&str> {
        self.renames.get(pypi_name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.renames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.renames.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.renames.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// URL the table was computed from
    pub fn source(&self) -> Option<&str> {
        self.metadata.get(SOURCE_KEY).map(String::as_str)
    }

    /// HTTP date of the download the table was computed from
    pub fn date(&self) -> Option<&str> {
        self.metadata.get(DATE_KEY).map(String::as_str)
    }

    /// ETag of the download the table was computed from
    pub fn etag(&self) -> Option<&str> {
        self.metadata.get(ETAG_KEY).map(String::as_str)
    }

    /// Seconds after `date` at which the table should be refreshed
    pub fn max_age(&self) -> Option<u64> {
        self.metadata.get(MAX_AGE_KEY).and_then(|s| s.parse().ok())
    }
}

impl FromIterator<(String, String)> for StdRenames {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        let renames = iter
            .into_iter()
            .filter(|(k, v)| !k.starts_with('$') && k != v)
            .collect();
        Self {
            renames,
            metadata: BTreeMap::new(),
        }
    }
}

/// Path to the user's cached copy of the standard renames file.
///
/// * Linux: `~/.cache/whl2conda/stdrename.json`
/// * MacOS: `~/Library/Caches/whl2conda/stdrename.json`
/// * Windows: `~\AppData\Local\whl2conda\stdrename.json`
pub fn user_stdrenames_path() -> Option<PathBuf> {
    dirs::cache_dir().map(|dir| dir.join("whl2conda").join("stdrename.json"))
}

/// Loads the standard rename table from the user cache, seeding the cache
/// with the bundled table when it does not exist yet.
pub fn load_std_renames() -> Result<StdRenames> {
    let Some(path) = user_stdrenames_path() else {
        debug!("No user cache directory, using bundled standard renames");
        return StdRenames::bundled();
    };
    load_std_renames_from(&path)
}

/// Same as [`load_std_renames`] with an explicit cache file location
pub fn load_std_renames_from(path: &Path) -> Result<StdRenames> {
    if !path.exists() {
        info!("Writing standard renames to {}", path.display());
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, BUNDLED_STD_RENAMES).map_err(|e| Error::FileOperation {
            path: path.to_path_buf(),
            message: format!("Failed to write standard renames: {}", e),
        })?;
    }
    StdRenames::load(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_table() {
        let table = StdRenames::bundled().unwrap();
        assert!(!table.is_empty());
        assert_eq!(table.get("torch"), Some("pytorch"));
        assert_eq!(table.get("$source"), None);
        assert!(table.source().unwrap().ends_with("name_mapping.json"));
        assert!(table.iter().all(|(pypi, conda)| pypi != conda));
    }

    #[test]
    fn test_from_json_ignores_reserved_and_identity_keys() {
        let table = StdRenames::from_json(
            r#"{"$etag": "abc", "$date": "", "foo": "foo", "bar": "conda-bar", "n": 3}"#,
        )
        .unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.get("bar"), Some("conda-bar"));
        assert_eq!(table.get("foo"), None);
        assert_eq!(table.etag(), Some("abc"));
    }

    #[test]
    fn test_from_iter() {
        let table: StdRenames = vec![
            ("a".to_string(), "b".to_string()),
            ("$x".to_string(), "y".to_string()),
            ("c".to_string(), "c".to_string()),
        ]
        .into_iter()
        .collect();
        assert_eq!(table.len(), 1);
        assert_eq!(table.get("a"), Some("b"));
    }
}
