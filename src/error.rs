use std::fmt;
use std::io;
use std::path::PathBuf;

/// Custom error type for whl2conda operations
#[derive(Debug)]
pub enum Error {
    /// I/O errors (file access, permissions, etc.)
    Io(io::Error),

    /// TOML parsing errors
    Toml(toml_edit::TomlError),

    /// TOML serialization/deserialization errors
    TomlSerde(toml::de::Error),

    /// JSON parsing or serialization errors
    Json(serde_json::Error),

    /// A `Requires-Dist` entry that does not match the dependency grammar at all
    RequiresDistSyntax(String),

    /// A dependency rename pattern that is not a valid regular expression
    RenamePattern { pattern: String, message: String },

    /// A dependency rename replacement with a malformed group reference
    RenameReplacement {
        pattern: String,
        replacement: String,
        message: String,
    },

    /// Wheel or metadata that cannot be converted
    UnsupportedWheel(String),

    /// Errors related to file operations
    FileOperation { path: PathBuf, message: String },

    /// General errors
    General(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(err) => write!(f, "I/O error: {}", err),
            Error::Toml(err) => write!(f, "TOML parsing error: {}", err),
            Error::TomlSerde(err) => write!(f, "TOML serialization error: {}", err),
            Error::Json(err) => write!(f, "JSON error: {}", err),
            Error::RequiresDistSyntax(raw) => {
                write!(f, "Cannot parse Requires-Dist entry: '{}'", raw)
            }
            Error::RenamePattern { pattern, message } => {
                write!(f, "Bad dependency rename pattern '{}': {}", pattern, message)
            }
            Error::RenameReplacement {
                pattern,
                replacement,
                message,
            } => write!(
                f,
                "Bad dependency replacement '{}' for pattern '{}': {}",
                replacement, pattern, message
            ),
            Error::UnsupportedWheel(msg) => write!(f, "Unsupported wheel: {}", msg),
            Error::FileOperation { path, message } => {
                write!(f, "File operation error on {}: {}", path.display(), message)
            }
            Error::General(msg) => write!(f, "{}", msg),
        }
    }
}

impl Error {
    /// Check if the error message contains a specific string
    pub fn contains(&self, needle: &str) -> bool {
        match self {
            Error::FileOperation { path: _, message } => message.contains(needle),
            _ => self.to_string().contains(needle),
        }
    }

    /// True for errors caused by invalid rename configuration
    pub fn is_rename_error(&self) -> bool {
        matches!(
            self,
            Error::RenamePattern { .. } | Error::RenameReplacement { .. }
        )
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            Error::Toml(err) => Some(err),
            Error::TomlSerde(err) => Some(err),
            Error::Json(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<toml_edit::TomlError> for Error {
    fn from(err: toml_edit::TomlError) -> Self {
        Error::Toml(err)
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::TomlSerde(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json(err)
    }
}

impl From<String> for Error {
    fn from(err: String) -> Self {
        Error::General(err)
    }
}

impl From<&str> for Error {
    fn from(err: &str) -> Self {
        Error::General(err.to_string())
    }
}

/// Result type alias for whl2conda operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rename_error_messages() {
        let err = Error::RenamePattern {
            pattern: "[foo".to_string(),
            message: "unclosed character class".to_string(),
        };
        assert!(err.is_rename_error());
        assert!(err.contains("Bad dependency rename pattern '[foo'"));

        let err = Error::RenameReplacement {
            pattern: "foo".to_string(),
            replacement: r"\1".to_string(),
            message: "invalid group reference 1".to_string(),
        };
        assert!(err.is_rename_error());
        assert_eq!(
            err.to_string(),
            r"Bad dependency replacement '\1' for pattern 'foo': invalid group reference 1"
        );
    }

    #[test]
    fn test_file_operation_contains() {
        let err = Error::FileOperation {
            path: PathBuf::from("METADATA"),
            message: "Failed to read metadata".to_string(),
        };
        assert!(err.contains("Failed to read"));
        assert!(!err.is_rename_error());
    }
}
