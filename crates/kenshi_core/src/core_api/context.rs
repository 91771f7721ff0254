use std::collections::HashMap;
use std::path::Path;

use indexmap::IndexMap;

use crate::deps;
use crate::document::ModFile;
use crate::error::{ModError, Result};
use crate::record::Record;
use crate::record_type::RecordType;

use super::merge::merge_records;
use super::types::{ContextConfig, MergedRecord, RecordLayer};

/// The set of loaded mod files plus the per-type merge cache.
///
/// The cache is never invalidated implicitly: after loading, replacing or
/// removing files call [`ModContext::clear_merge_cache`]. Mutation requires
/// `&mut self`; callers sharing a context across threads must wrap it in a
/// lock.
#[derive(Debug, Default)]
pub struct ModContext {
    config: ContextConfig,
    files: IndexMap<String, ModFile>,
    merge_cache: HashMap<RecordType, IndexMap<String, MergedRecord>>,
}

impl ModContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ContextConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &ContextConfig {
        &self.config
    }

    /// Registers `file` under its name, replacing any previous file of that
    /// name in place. Ignored names are refused and `false` is returned.
    pub fn add_or_update(&mut self, file: ModFile) -> bool {
        if self.config.ignored_mods.iter().any(|m| *m == file.name) {
            log::debug!("context: ignoring {}", file.name);
            return false;
        }
        self.files.insert(file.name.clone(), file);
        true
    }

    /// Loads the file at `path` and registers it. Returns the registered
    /// name, or `None` when the name is on the ignore list.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<Option<String>> {
        let file = ModFile::load(path)?;
        let name = file.name.clone();
        Ok(self.add_or_update(file).then_some(name))
    }

    pub fn remove(&mut self, name: &str) -> Option<ModFile> {
        self.files.shift_remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&ModFile> {
        self.files.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut ModFile> {
        self.files.get_mut(name)
    }

    /// Loaded files in load order.
    pub fn files(&self) -> impl Iterator<Item = &ModFile> {
        self.files.values()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Forgets every loaded file. The merge cache is kept until cleared.
    pub fn clear(&mut self) {
        self.files.clear();
    }

    pub fn clear_merge_cache(&mut self) {
        self.merge_cache.clear();
    }

    /// Merges `record_type` across the named files, in the order given, or
    /// across every loaded file in load order when `mod_names` is `None`.
    /// Unknown names are skipped. `filter` is applied to merged records and
    /// at most `limit` are returned.
    pub fn merge<S: AsRef<str>>(
        &self,
        mod_names: Option<&[S]>,
        record_type: RecordType,
        filter: Option<&dyn Fn(&Record) -> bool>,
        limit: Option<usize>,
    ) -> Vec<MergedRecord> {
        let merged = match mod_names {
            Some(names) => merge_records(
                names.iter().filter_map(|n| self.files.get(n.as_ref())),
                record_type,
            ),
            None => merge_records(self.files.values(), record_type),
        };
        merged
            .into_values()
            .filter(|m| filter.is_none_or(|keep| keep(&m.record)))
            .take(limit.unwrap_or(usize::MAX))
            .collect()
    }

    /// Every merged record of `record_type` across all loaded files, keyed by
    /// StringId. Computed once per type until the cache is cleared.
    pub fn all_records_merged(&mut self, record_type: RecordType) -> &IndexMap<String, MergedRecord> {
        let files = &self.files;
        self.merge_cache.entry(record_type).or_insert_with(|| {
            let merged = merge_records(files.values(), record_type);
            log::debug!(
                "merge cache: {} {record_type} records from {} files",
                merged.len(),
                files.len()
            );
            merged
        })
    }

    pub fn has_merged_record(&mut self, record_type: RecordType, string_id: &str) -> bool {
        self.all_records_merged(record_type).contains_key(string_id)
    }

    /// Each loaded file's own copy of the record, in load order. Fails with
    /// [`ModError::RecordNotFound`] when no loaded file has it.
    pub fn record_evolution(&self, string_id: &str) -> Result<Vec<RecordLayer<'_>>> {
        let layers: Vec<RecordLayer<'_>> = self
            .files
            .values()
            .filter_map(|file| {
                file.find_by_string_id(string_id).map(|record| RecordLayer {
                    mod_name: file.name.as_str(),
                    record,
                })
            })
            .collect();
        if layers.is_empty() {
            return Err(ModError::RecordNotFound(string_id.to_string()));
        }
        Ok(layers)
    }

    /// Owners of the new records declared by the configured base files.
    pub fn assumed_required_records(&self) -> Vec<String> {
        let mut owners: Vec<String> = Vec::new();
        for base in &self.config.base_mods {
            let Some(file) = self.files.get(base) else {
                continue;
            };
            for owner in file.mods_with_new_records() {
                if !owners.contains(&owner) {
                    owners.push(owner);
                }
            }
        }
        owners
    }

    /// Resolves a selector: `"all"`, a comma list of file names, or a comma
    /// list prefixed with `*` meaning every loaded file except those.
    /// Results follow load order.
    pub fn select_mods(&self, selector: &str) -> Vec<&ModFile> {
        if selector == "all" {
            return self.files.values().collect();
        }
        let (exclude, list) = match selector.strip_prefix('*') {
            Some(rest) => (true, rest),
            None => (false, selector),
        };
        let names = deps::split_mod_list(Some(list));
        let selected: Vec<&ModFile> = self
            .files
            .values()
            .filter(|file| names.contains(&file.name) != exclude)
            .collect();
        log::debug!("selector '{selector}' matched {} files", selected.len());
        selected
    }
}
