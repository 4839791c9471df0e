// Declare modules for the library build
pub mod cli;
pub mod converter;
pub mod error;
pub mod models;
pub mod utils;

pub use converter::{
    Conversion, DependencyConverter, DependencyRename, DependencyRenamer, Diagnostic,
    DiagnosticKind, Diagnostics, StdRenames, translate_version_spec,
};
pub use error::{Error, Result};
pub use models::RequiresDistEntry;

