//! Usable item loader.

use std::path::Path;

use stack_core::UseEffect;

use crate::formats::ItemFile;
use crate::loaders::{LoadResult, read_file};
use crate::notes;

/// A usable item's stack effects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackItem {
    pub name: String,
    pub effect: UseEffect,
}

/// Loader for item stack effects from TOML files.
pub struct ItemLoader;

impl ItemLoader {
    /// Load items from a TOML file, parsing the `GainStack` /
    /// `GainStackOwn` tags out of each note.
    pub fn load(path: &Path) -> LoadResult<Vec<StackItem>> {
        let content = read_file(path)?;
        let file: ItemFile = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse item TOML: {}", e))?;
        Ok(Self::build(file))
    }

    /// Build items from already-parsed file data.
    pub fn build(file: ItemFile) -> Vec<StackItem> {
        file.items
            .into_iter()
            .map(|entry| StackItem {
                effect: notes::parse_use_effect(&entry.note),
                name: entry.name,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stack_core::{StackGain, StateId};

    #[test]
    fn builds_items_with_use_effects() {
        let data = r#"
[[items]]
name = "charge crystal"
note = "<GainStackOwn[5]: 3>"

[[items]]
name = "plain potion"
"#;
        let file: ItemFile = toml::from_str(data).unwrap();
        let items = ItemLoader::build(file);

        assert_eq!(items.len(), 2);
        assert_eq!(
            items[0].effect.user_gains,
            vec![StackGain {
                state: StateId(5),
                delta: 3
            }]
        );
        assert!(items[1].effect.target_gains.is_empty());
        assert!(items[1].effect.user_gains.is_empty());
    }
}
