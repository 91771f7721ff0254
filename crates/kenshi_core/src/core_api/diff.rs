use std::collections::{BTreeSet, HashMap};

use serde::Serialize;

use crate::document::ModFile;
use crate::field::FieldValue;
use crate::record::Record;
use crate::record_type::RecordType;

const RELATIVE_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldChange {
    OnlyInA { value: String },
    OnlyInB { value: String },
    Both { before: String, after: String, equal: bool },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldDiff {
    pub field: String,
    #[serde(flatten)]
    pub change: FieldChange,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordDiff {
    pub name: String,
    pub record_type: RecordType,
    pub string_id_a: String,
    pub string_id_b: String,
    pub status_a: String,
    pub status_b: String,
    pub fields: Vec<FieldDiff>,
}

/// Absolute deltas over every numeric field present in both records.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NumericSummary {
    pub compared: usize,
    pub min_delta: f64,
    pub max_delta: f64,
    pub mean_delta: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct DiffReport {
    pub records: Vec<RecordDiff>,
    pub only_in_a: Vec<String>,
    pub only_in_b: Vec<String>,
    pub numeric: Option<NumericSummary>,
}

#[derive(Default)]
struct DeltaAccumulator {
    count: usize,
    min: f64,
    max: f64,
    sum: f64,
}

impl DeltaAccumulator {
    fn add(&mut self, delta: f64) {
        if self.count == 0 {
            self.min = delta;
            self.max = delta;
        } else {
            self.min = self.min.min(delta);
            self.max = self.max.max(delta);
        }
        self.sum += delta;
        self.count += 1;
    }

    fn finish(self) -> Option<NumericSummary> {
        (self.count > 0).then(|| NumericSummary {
            compared: self.count,
            min_delta: self.min,
            max_delta: self.max,
            mean_delta: self.sum / self.count as f64,
        })
    }
}

fn numbers_equal(a: f64, b: f64) -> bool {
    (a - b).abs() <= RELATIVE_TOLERANCE * 1f64.max(a.abs()).max(b.abs())
}

/// Equality used by diff reports: numeric scalars and vector components
/// within a relative tolerance, everything else by exact value.
pub fn values_equal(a: &FieldValue, b: &FieldValue) -> bool {
    if let (Some(x), Some(y)) = (a.as_f64(), b.as_f64()) {
        return numbers_equal(x, y);
    }
    match (a, b) {
        (FieldValue::Vec3(x), FieldValue::Vec3(y)) => components_equal(x, y),
        (FieldValue::Vec4(x), FieldValue::Vec4(y)) => components_equal(x, y),
        _ => a.to_plain_string() == b.to_plain_string(),
    }
}

fn components_equal(a: &[f32], b: &[f32]) -> bool {
    a.iter()
        .zip(b)
        .all(|(x, y)| numbers_equal(f64::from(*x), f64::from(*y)))
}

fn index_by_name(file: &ModFile, record_type: Option<RecordType>) -> HashMap<&str, &Record> {
    let mut index = HashMap::new();
    for record in file.records() {
        if record_type.is_some_and(|t| t != record.record_type) {
            continue;
        }
        index.entry(record.name.as_str()).or_insert(record);
    }
    index
}

/// Compares the records `a` and `b` have in common by name. `a` is the
/// "before" side. An empty `fields` list means every field.
pub fn diff_files(
    a: &ModFile,
    b: &ModFile,
    record_type: Option<RecordType>,
    fields: &[String],
) -> DiffReport {
    let by_name_a = index_by_name(a, record_type);
    let by_name_b = index_by_name(b, record_type);

    let names_a: BTreeSet<&str> = by_name_a.keys().copied().collect();
    let names_b: BTreeSet<&str> = by_name_b.keys().copied().collect();

    let mut report = DiffReport {
        only_in_a: names_a.difference(&names_b).map(|s| s.to_string()).collect(),
        only_in_b: names_b.difference(&names_a).map(|s| s.to_string()).collect(),
        ..DiffReport::default()
    };
    let mut deltas = DeltaAccumulator::default();

    for name in names_a.intersection(&names_b) {
        let ra = by_name_a[name];
        let rb = by_name_b[name];
        report.records.push(diff_records(ra, rb, fields, &mut deltas));
    }
    report.numeric = deltas.finish();
    report
}

fn diff_records(a: &Record, b: &Record, filter: &[String], deltas: &mut DeltaAccumulator) -> RecordDiff {
    let mut names: BTreeSet<String> = a.all_field_names().into_iter().collect();
    names.extend(b.all_field_names());
    if !filter.is_empty() {
        names.retain(|n| filter.contains(n));
    }

    let mut fields = Vec::with_capacity(names.len());
    for name in names {
        let change = match (a.field(&name), b.field(&name)) {
            (Some(va), Some(vb)) => {
                if let (Some(x), Some(y)) = (va.as_f64(), vb.as_f64()) {
                    deltas.add((x - y).abs());
                }
                FieldChange::Both {
                    equal: values_equal(&va, &vb),
                    before: va.to_string(),
                    after: vb.to_string(),
                }
            }
            (Some(va), None) => FieldChange::OnlyInA {
                value: va.to_string(),
            },
            (None, Some(vb)) => FieldChange::OnlyInB {
                value: vb.to_string(),
            },
            (None, None) => continue,
        };
        fields.push(FieldDiff {
            field: name,
            change,
        });
    }

    RecordDiff {
        name: a.name.clone(),
        record_type: a.record_type,
        string_id_a: a.string_id.clone(),
        string_id_b: b.string_id.clone(),
        status_a: a.describe_status(),
        status_b: b.describe_status(),
        fields,
    }
}

impl FieldDiff {
    /// `"before → after"` for fields present on both sides.
    pub fn arrow(&self) -> Option<String> {
        match &self.change {
            FieldChange::Both { before, after, .. } => Some(format!("{before} → {after}")),
            _ => None,
        }
    }
}
