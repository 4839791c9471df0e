pub mod dependency;
pub mod project;

pub use dependency::RequiresDistEntry;
pub use project::{CondaPackageFormat, PyProject};
