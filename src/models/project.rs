use crate::error::Error;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// Represents the parts of pyproject.toml this tool looks at
#[derive(Deserialize, Debug, Default)]
pub struct PyProject {
    pub tool: Option<Tool>,
    #[serde(rename = "build-system")]
    pub build_system: Option<BuildSystem>,
}

/// Represents the [tool] section of pyproject.toml
#[derive(Deserialize, Debug, Default)]
pub struct Tool {
    /// Kept untyped so that one bad value does not hide the others
    pub whl2conda: Option<toml::Table>,
}

/// Represents the [build-system] section
#[derive(Deserialize, Debug, Default)]
pub struct BuildSystem {
    #[serde(rename = "build-backend")]
    pub build_backend: Option<String>,
}

/// Format of the conda package written for a wheel
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum CondaPackageFormat {
    /// Original `.tar.bz2` package
    V1,
    /// Zip based `.conda` package
    #[default]
    V2,
    /// Unpacked directory tree, mostly useful for debugging
    Tree,
}

impl CondaPackageFormat {
    pub fn extension(self) -> &'static str {
        match self {
            CondaPackageFormat::V1 => ".tar.bz2",
            CondaPackageFormat::V2 => ".conda",
            CondaPackageFormat::Tree => "",
        }
    }

    /// File name of a noarch python package, e.g. `foo-1.2-py_0.conda`
    pub fn package_file_name(self, name: &str, version: &str, build: &str) -> String {
        format!("{}-{}-{}{}", name, version, build, self.extension())
    }
}

impl fmt::Display for CondaPackageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CondaPackageFormat::V1 => "V1",
            CondaPackageFormat::V2 => "V2",
            CondaPackageFormat::Tree => "TREE",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for CondaPackageFormat {
    type Err = Error;

    /// Accepts the format name or the package file extension
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "v1" | ".tar.bz2" | "tar.bz2" => Ok(CondaPackageFormat::V1),
            "v2" | ".conda" | "conda" => Ok(CondaPackageFormat::V2),
            "tree" => Ok(CondaPackageFormat::Tree),
            _ => Err(Error::General(format!("Unknown conda package format '{}'", s))),
        }
    }
}
