pub mod metadata;
pub mod pyproject;
pub mod toml;

pub use metadata::{WheelInfo, WheelMetadata, read_dist_info, rewrite_requires_dist};
pub use pyproject::{PyProjInfo, add_pyproject_defaults, read_pyproject};
