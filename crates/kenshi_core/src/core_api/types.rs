use serde::{Deserialize, Serialize};

use crate::record::Record;

pub const DEFAULT_IGNORED_MODS: [&str; 1] = ["-KenshiFixer_Fix-.mod"];
pub const DEFAULT_BASE_MODS: [&str; 4] = [
    "gamedata.base",
    "rebirth.mod",
    "Newwworld.mod",
    "Dialogue.mod",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ContextConfig {
    /// File names `add_or_update` refuses to register.
    pub ignored_mods: Vec<String>,
    /// Files whose new records are assumed to be present in every game.
    pub base_mods: Vec<String>,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            ignored_mods: DEFAULT_IGNORED_MODS.iter().map(|s| s.to_string()).collect(),
            base_mods: DEFAULT_BASE_MODS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// One reconciled record and the file that created it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergedRecord {
    pub owner: String,
    pub record: Record,
}

/// A file's own copy of a record, as seen by `record_evolution`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RecordLayer<'a> {
    pub mod_name: &'a str,
    pub record: &'a Record,
}
