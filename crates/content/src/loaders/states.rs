//! Status library loader.

use std::path::Path;

use stack_core::{StateId, StateLibrary, StateSpec};

use crate::formats::StateFile;
use crate::loaders::{LoadResult, read_file};
use crate::notes;

/// Loader for status definitions from TOML files.
pub struct StateLoader;

impl StateLoader {
    /// Load the status library from a TOML file, parsing each entry's
    /// note tags into typed triggers.
    pub fn load(path: &Path) -> LoadResult<StateLibrary> {
        let content = read_file(path)?;
        let file: StateFile = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse state TOML: {}", e))?;
        Self::build(file)
    }

    /// Build the library from already-parsed file data.
    pub fn build(file: StateFile) -> LoadResult<StateLibrary> {
        let specs = file.states.into_iter().map(|entry| {
            let mut spec = StateSpec::new(StateId(entry.id), entry.name);
            spec.battle_scoped = entry.battle_scoped;
            spec.default_turns = entry.turns;
            spec.triggers = notes::parse_triggers(&entry.note);
            spec
        });
        StateLibrary::from_specs(specs)
            .map_err(|e| anyhow::anyhow!("Invalid status library: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stack_core::{Trigger, TriggerEvent};

    #[test]
    fn builds_specs_with_parsed_triggers() {
        let data = r#"
[[states]]
id = 5
name = "Charge"
battle_scoped = true
turns = 3
note = "<StackCritical[5]: 2>"

[[states]]
id = 9
name = "Poison"
"#;
        let file: StateFile = toml::from_str(data).unwrap();
        let library = StateLoader::build(file).unwrap();

        assert!(library.is_battle_scoped(StateId(5)));
        assert_eq!(library.default_turns(StateId(5)), 3);
        assert_eq!(
            library.triggers_of(StateId(5)),
            &[Trigger::new(TriggerEvent::Critical, StateId(5), 2)]
        );
        assert!(!library.is_battle_scoped(StateId(9)));
        assert!(library.triggers_of(StateId(9)).is_empty());
    }

    #[test]
    fn duplicate_ids_fail_the_load() {
        let data = r#"
[[states]]
id = 5
name = "Charge"
[[states]]
id = 5
name = "Charge again"
"#;
        let file: StateFile = toml::from_str(data).unwrap();
        assert!(StateLoader::build(file).is_err());
    }
}
