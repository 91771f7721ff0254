use kenshi_core::core_api::{DiffReport, FieldChange, MergedRecord, RecordLayer};
use kenshi_core::{FieldValue, ModFile, ModHeader, Record, ValidationFinding};
use serde_json::{Map as JsonMap, Value as JsonValue};

/// Which parts of a record to include.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordSelection {
    /// Field names to keep; empty keeps every field.
    pub fields: Vec<String>,
    pub extra_data: bool,
    pub instances: bool,
}

impl RecordSelection {
    pub fn everything() -> Self {
        Self {
            fields: Vec::new(),
            extra_data: true,
            instances: true,
        }
    }

    fn keeps(&self, field: &str) -> bool {
        self.fields.is_empty() || self.fields.iter().any(|f| f == field)
    }
}

pub fn render_file_summary(file: &ModFile) -> JsonValue {
    let mut out = JsonMap::new();
    out.insert("name".to_string(), JsonValue::from(file.name.as_str()));
    out.insert("header".to_string(), header_to_json(&file.header));
    out.insert("record_count".to_string(), JsonValue::from(file.records().len()));
    out.insert(
        "leftover_bytes".to_string(),
        JsonValue::from(file.leftover.len()),
    );
    out.insert(
        "new_record_owners".to_string(),
        JsonValue::from(file.mods_with_new_records()),
    );
    JsonValue::Object(out)
}

fn header_to_json(header: &ModHeader) -> JsonValue {
    let mut out = JsonMap::new();
    out.insert(
        "file_type".to_string(),
        JsonValue::from(header.file_type.raw()),
    );
    out.insert("version".to_string(), JsonValue::from(header.version));
    out.insert("author".to_string(), JsonValue::from(header.author.clone()));
    out.insert(
        "description".to_string(),
        JsonValue::from(header.description.clone()),
    );
    out.insert(
        "dependencies".to_string(),
        JsonValue::from(header.dependency_list()),
    );
    out.insert(
        "references".to_string(),
        JsonValue::from(header.reference_list()),
    );
    if let Some(save_count) = header.save_count {
        out.insert("save_count".to_string(), JsonValue::from(save_count));
    }
    if let Some(last_merge) = header.last_merge {
        out.insert("last_merge".to_string(), JsonValue::from(last_merge));
    }
    if let Some(entries) = &header.merge_entries {
        let map: JsonMap<String, JsonValue> = entries
            .iter()
            .map(|(name, e)| {
                let mut entry = JsonMap::new();
                entry.insert("save_count".to_string(), JsonValue::from(e.save_count));
                entry.insert("last_merge".to_string(), JsonValue::from(e.last_merge));
                (name.clone(), JsonValue::Object(entry))
            })
            .collect();
        out.insert("merge_entries".to_string(), JsonValue::Object(map));
    }
    if let Some(requests) = &header.delete_requests {
        let map: JsonMap<String, JsonValue> = requests
            .iter()
            .map(|(name, r)| {
                let mut entry = JsonMap::new();
                entry.insert("save_count".to_string(), JsonValue::from(r.save_count));
                entry.insert("target".to_string(), JsonValue::from(r.target.as_str()));
                (name.clone(), JsonValue::Object(entry))
            })
            .collect();
        out.insert("delete_requests".to_string(), JsonValue::Object(map));
    }
    out.insert(
        "details_tail_bytes".to_string(),
        JsonValue::from(header.details_tail.len()),
    );
    JsonValue::Object(out)
}

pub fn render_record(record: &Record, selection: &RecordSelection) -> JsonValue {
    let mut out = JsonMap::new();
    out.insert("name".to_string(), JsonValue::from(record.name.as_str()));
    out.insert(
        "string_id".to_string(),
        JsonValue::from(record.string_id.as_str()),
    );
    out.insert(
        "type".to_string(),
        JsonValue::from(record.record_type.to_string()),
    );
    out.insert("id".to_string(), JsonValue::from(record.id));
    out.insert("status".to_string(), status_to_json(record));

    let mut fields = JsonMap::new();
    for name in record.all_field_names() {
        if !selection.keeps(&name) {
            continue;
        }
        if let Some(value) = record.field(&name) {
            fields.insert(name, field_value_to_json(&value));
        }
    }
    out.insert("fields".to_string(), JsonValue::Object(fields));

    if selection.extra_data {
        out.insert("extra_data".to_string(), extra_data_to_json(record));
    }
    if selection.instances {
        let instances = record
            .instances
            .iter()
            .map(|i| {
                let mut obj = JsonMap::new();
                obj.insert("id".to_string(), JsonValue::from(i.id.as_str()));
                obj.insert("target".to_string(), JsonValue::from(i.target.as_str()));
                obj.insert("position".to_string(), JsonValue::from(i.position.to_vec()));
                obj.insert("rotation".to_string(), JsonValue::from(i.rotation.to_vec()));
                obj.insert("states".to_string(), JsonValue::from(i.states.clone()));
                JsonValue::Object(obj)
            })
            .collect();
        out.insert("instances".to_string(), JsonValue::Array(instances));
    }
    JsonValue::Object(out)
}

pub fn render_records<'a>(
    records: impl IntoIterator<Item = &'a Record>,
    selection: &RecordSelection,
) -> JsonValue {
    JsonValue::Array(
        records
            .into_iter()
            .map(|r| render_record(r, selection))
            .collect(),
    )
}

pub fn render_merged(merged: &[MergedRecord], selection: &RecordSelection) -> JsonValue {
    JsonValue::Array(
        merged
            .iter()
            .map(|m| {
                let mut obj = JsonMap::new();
                obj.insert("owner".to_string(), JsonValue::from(m.owner.as_str()));
                obj.insert("record".to_string(), render_record(&m.record, selection));
                JsonValue::Object(obj)
            })
            .collect(),
    )
}

pub fn render_evolution(layers: &[RecordLayer<'_>], selection: &RecordSelection) -> JsonValue {
    JsonValue::Array(
        layers
            .iter()
            .map(|layer| {
                let mut obj = JsonMap::new();
                obj.insert("mod".to_string(), JsonValue::from(layer.mod_name));
                obj.insert("record".to_string(), render_record(layer.record, selection));
                JsonValue::Object(obj)
            })
            .collect(),
    )
}

pub fn render_diff(report: &DiffReport) -> JsonValue {
    let records = report
        .records
        .iter()
        .map(|r| {
            let mut obj = JsonMap::new();
            obj.insert("name".to_string(), JsonValue::from(r.name.as_str()));
            obj.insert("type".to_string(), JsonValue::from(r.record_type.to_string()));
            obj.insert("string_id_a".to_string(), JsonValue::from(r.string_id_a.as_str()));
            obj.insert("string_id_b".to_string(), JsonValue::from(r.string_id_b.as_str()));
            obj.insert("status_a".to_string(), JsonValue::from(r.status_a.as_str()));
            obj.insert("status_b".to_string(), JsonValue::from(r.status_b.as_str()));
            let fields = r
                .fields
                .iter()
                .map(|f| {
                    let mut field = JsonMap::new();
                    field.insert("field".to_string(), JsonValue::from(f.field.as_str()));
                    match &f.change {
                        FieldChange::OnlyInA { value } => {
                            field.insert("only_in".to_string(), JsonValue::from("a"));
                            field.insert("value".to_string(), JsonValue::from(value.as_str()));
                        }
                        FieldChange::OnlyInB { value } => {
                            field.insert("only_in".to_string(), JsonValue::from("b"));
                            field.insert("value".to_string(), JsonValue::from(value.as_str()));
                        }
                        FieldChange::Both {
                            before,
                            after,
                            equal,
                        } => {
                            field.insert("before".to_string(), JsonValue::from(before.as_str()));
                            field.insert("after".to_string(), JsonValue::from(after.as_str()));
                            field.insert("equal".to_string(), JsonValue::from(*equal));
                        }
                    }
                    JsonValue::Object(field)
                })
                .collect();
            obj.insert("fields".to_string(), JsonValue::Array(fields));
            JsonValue::Object(obj)
        })
        .collect();

    let mut out = JsonMap::new();
    out.insert("records".to_string(), JsonValue::Array(records));
    out.insert("only_in_a".to_string(), JsonValue::from(report.only_in_a.clone()));
    out.insert("only_in_b".to_string(), JsonValue::from(report.only_in_b.clone()));
    let numeric = match &report.numeric {
        Some(summary) => {
            let mut obj = JsonMap::new();
            obj.insert("compared".to_string(), JsonValue::from(summary.compared));
            obj.insert("min".to_string(), JsonValue::from(summary.min_delta));
            obj.insert("max".to_string(), JsonValue::from(summary.max_delta));
            obj.insert("mean".to_string(), JsonValue::from(summary.mean_delta));
            JsonValue::Object(obj)
        }
        None => JsonValue::Null,
    };
    out.insert("numeric".to_string(), numeric);
    JsonValue::Object(out)
}

pub fn render_findings(findings: &[ValidationFinding]) -> JsonValue {
    JsonValue::Array(
        findings
            .iter()
            .map(|f| {
                let mut obj = JsonMap::new();
                let kind = match f {
                    ValidationFinding::StatusAssumption { .. } => "status_assumption",
                    ValidationFinding::UnknownRecordType { .. } => "unknown_record_type",
                    ValidationFinding::LeftoverBytes { .. } => "leftover_bytes",
                    ValidationFinding::UnparsedDetailsTail { .. } => "unparsed_details_tail",
                };
                obj.insert("kind".to_string(), JsonValue::from(kind));
                obj.insert("message".to_string(), JsonValue::from(f.to_string()));
                JsonValue::Object(obj)
            })
            .collect(),
    )
}

pub fn render_dependencies(file: &ModFile) -> JsonValue {
    let mut out = JsonMap::new();
    out.insert("name".to_string(), JsonValue::from(file.name.as_str()));
    out.insert("dependencies".to_string(), JsonValue::from(file.dependencies()));
    out.insert("references".to_string(), JsonValue::from(file.references()));
    JsonValue::Object(out)
}

fn status_to_json(record: &Record) -> JsonValue {
    let status = record.change_status;
    let mut out = JsonMap::new();
    out.insert("raw".to_string(), JsonValue::from(status.raw()));
    out.insert("new".to_string(), JsonValue::from(status.is_new()));
    out.insert(
        "change_counter".to_string(),
        JsonValue::from(status.change_counter()),
    );
    out.insert("removed".to_string(), JsonValue::from(record.is_removed()));
    JsonValue::Object(out)
}

fn field_value_to_json(value: &FieldValue) -> JsonValue {
    match value {
        FieldValue::Bool(v) => JsonValue::from(*v),
        FieldValue::Float(v) => JsonValue::from(*v),
        FieldValue::Int(v) => JsonValue::from(*v),
        FieldValue::Vec3(v) => JsonValue::from(v.to_vec()),
        FieldValue::Vec4(v) => JsonValue::from(v.to_vec()),
        FieldValue::String(s) | FieldValue::Filename(s) => JsonValue::from(s.as_str()),
    }
}

fn extra_data_to_json(record: &Record) -> JsonValue {
    let categories = record
        .extra_data
        .iter()
        .map(|(category, items)| {
            let items = items
                .iter()
                .map(|(key, values)| {
                    let value = if kenshi_core::record::is_deleted(values) {
                        JsonValue::from("deleted")
                    } else {
                        JsonValue::from(values.to_vec())
                    };
                    (key.clone(), value)
                })
                .collect::<JsonMap<String, JsonValue>>();
            (category.clone(), JsonValue::Object(items))
        })
        .collect::<JsonMap<String, JsonValue>>();
    JsonValue::Object(categories)
}
