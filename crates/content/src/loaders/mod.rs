//! Loaders for reading stack rules and battle data from files.
//!
//! Each loader converts a TOML file in the formats defined in
//! [`crate::formats`] into the corresponding core types, parsing note
//! tags once on the way in.

pub mod catalog;
pub mod equipment;
pub mod items;
pub mod states;

pub use catalog::CatalogLoader;
pub use equipment::EquipmentLoader;
pub use items::{ItemLoader, StackItem};
pub use states::StateLoader;

use std::path::Path;

/// Common result type for loaders.
pub type LoadResult<T> = anyhow::Result<T>;

/// Helper function to read file contents.
pub(crate) fn read_file(path: &Path) -> LoadResult<String> {
    std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read file {}: {}", path.display(), e))
}
