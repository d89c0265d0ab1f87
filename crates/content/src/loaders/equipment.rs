//! Equipment loader.

use std::path::Path;

use stack_core::{Equipment, ParamId};

use crate::formats::EquipmentFile;
use crate::loaders::{LoadResult, read_file};
use crate::notes;

/// Loader for equipment data from TOML files.
pub struct EquipmentLoader;

impl EquipmentLoader {
    /// Load equipment from a TOML file. Parameter bonuses are keyed by
    /// short stat name; unknown names are load errors.
    pub fn load(path: &Path) -> LoadResult<Vec<Equipment>> {
        let content = read_file(path)?;
        let file: EquipmentFile = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse equipment TOML: {}", e))?;
        Self::build(file)
    }

    /// Build equipment from already-parsed file data.
    pub fn build(file: EquipmentFile) -> LoadResult<Vec<Equipment>> {
        file.equipment
            .into_iter()
            .map(|entry| {
                let mut equip = Equipment::new(entry.name);
                for (name, value) in &entry.params {
                    let param = name.parse::<ParamId>().map_err(|_| {
                        anyhow::anyhow!("Unknown parameter '{}' on equipment '{}'", name, equip.name)
                    })?;
                    equip.params[param.index()] = *value;
                }
                equip.triggers = notes::parse_triggers(&entry.note);
                Ok(equip)
            })
            .collect()
    }
}
