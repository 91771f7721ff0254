use indexmap::IndexMap;

use crate::document::ModFile;
use crate::record::Record;
use crate::record_type::RecordType;

use super::types::MergedRecord;

/// Reconciles every record of `record_type` across `files`.
///
/// Records are grouped by StringId in first-appearance order. Each group is
/// rebuilt from a clone of its creator (the first member flagged new) with
/// every other member layered on top in enumeration order. Groups without a
/// creator are dropped.
pub fn merge_records<'a>(
    files: impl IntoIterator<Item = &'a ModFile>,
    record_type: RecordType,
) -> IndexMap<String, MergedRecord> {
    let mut groups: IndexMap<&'a str, Vec<(&'a str, &'a Record)>> = IndexMap::new();
    for file in files {
        for record in file.records_of_type(record_type) {
            groups
                .entry(record.string_id.as_str())
                .or_default()
                .push((file.name.as_str(), record));
        }
    }

    let mut merged = IndexMap::with_capacity(groups.len());
    for (string_id, members) in groups {
        let Some(creator) = members.iter().position(|(_, r)| r.is_new()) else {
            log::debug!("merge: {string_id} has no creator, dropped");
            continue;
        };
        let (owner, base) = members[creator];
        let mut record = base.clone();
        for (i, (_, layer)) in members.iter().enumerate() {
            if i != creator {
                record.apply_changes_from(layer);
            }
        }
        merged.insert(
            string_id.to_string(),
            MergedRecord {
                owner: owner.to_string(),
                record,
            },
        );
    }
    merged
}
