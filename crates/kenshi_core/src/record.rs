use std::collections::BTreeSet;
use std::io::{self, Read, Seek, Write};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{ModError, Result};
use crate::field::{FieldKind, FieldValue};
use crate::reader::LittleEndianReader;
use crate::record_type::RecordType;
use crate::status::ChangeStatus;
use crate::types::{BASE_EXTENSION, DELETED_TRIPLE, MOD_EXTENSION, REMOVED_FIELD};
use crate::writer::LittleEndianWriter;

pub type ExtraDataCategory = IndexMap<String, [i32; 3]>;

/// A placed instance: position plus rotation stored as (w, x, y, z).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    pub id: String,
    pub target: String,
    pub position: [f32; 3],
    pub rotation: [f32; 4],
    pub states: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Record {
    /// Instance count as read from disk; emit writes `instances.len()`.
    pub instance_count: i32,
    pub record_type: RecordType,
    pub id: i32,
    pub name: String,
    pub string_id: String,
    pub change_status: ChangeStatus,
    pub bool_fields: IndexMap<String, bool>,
    pub float_fields: IndexMap<String, f32>,
    pub int_fields: IndexMap<String, i32>,
    pub vec3_fields: IndexMap<String, [f32; 3]>,
    pub vec4_fields: IndexMap<String, [f32; 4]>,
    pub string_fields: IndexMap<String, String>,
    pub filename_fields: IndexMap<String, String>,
    pub extra_data: IndexMap<String, ExtraDataCategory>,
    pub instances: Vec<Instance>,
}

struct VirtualField {
    name: &'static str,
    get: fn(&Record) -> &str,
    set: fn(&mut Record, &str),
}

/// Pseudo-fields resolved before the typed containers.
const VIRTUAL_FIELDS: [VirtualField; 2] = [
    VirtualField {
        name: "_stringId_",
        get: |r| r.string_id.as_str(),
        set: |r, v| r.string_id = v.to_string(),
    },
    VirtualField {
        name: "_name_",
        get: |r| r.name.as_str(),
        set: |r, v| r.name = v.to_string(),
    },
];

fn virtual_field(name: &str) -> Option<&'static VirtualField> {
    VIRTUAL_FIELDS.iter().find(|v| v.name == name)
}

pub fn is_deleted(values: &[i32; 3]) -> bool {
    *values == DELETED_TRIPLE
}

impl Record {
    pub fn new(record_type: RecordType, name: impl Into<String>, string_id: impl Into<String>) -> Self {
        Self {
            record_type,
            name: name.into(),
            string_id: string_id.into(),
            ..Self::default()
        }
    }

    pub fn is_new(&self) -> bool {
        self.change_status.is_new()
    }

    pub fn is_removed(&self) -> bool {
        self.bool_fields.get(REMOVED_FIELD).copied().unwrap_or(false)
    }

    pub fn same_record(&self, other: &Record) -> bool {
        self.string_id == other.string_id
    }

    /// Status summary, suffixed with `REMOVED` for tombstoned records.
    pub fn describe_status(&self) -> String {
        let mut out = self.change_status.describe();
        if self.is_removed() {
            out.push_str(" REMOVED");
        }
        out
    }

    /// Owning mod file encoded in the StringId (`"<n>-<file>.mod"`), if any.
    pub fn owner_mod_name(&self) -> Option<&str> {
        let (_, owner) = self.string_id.split_once('-')?;
        if owner.is_empty() {
            return None;
        }
        if owner.ends_with(MOD_EXTENSION) || owner.ends_with(BASE_EXTENSION) {
            Some(owner)
        } else {
            None
        }
    }

    /// Numeric StringId prefix, when the StringId starts with digits and a dash.
    pub fn string_id_number(&self) -> Option<u32> {
        let (prefix, _) = self.string_id.split_once('-')?;
        if prefix.is_empty() || !prefix.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        prefix.parse().ok()
    }

    // --- typed field access ---

    pub fn field_kind(&self, field: &str) -> Option<FieldKind> {
        FieldKind::ALL
            .into_iter()
            .find(|kind| self.contains_in(*kind, field))
    }

    fn contains_in(&self, kind: FieldKind, field: &str) -> bool {
        match kind {
            FieldKind::Bool => self.bool_fields.contains_key(field),
            FieldKind::Float => self.float_fields.contains_key(field),
            FieldKind::Int => self.int_fields.contains_key(field),
            FieldKind::Vec3 => self.vec3_fields.contains_key(field),
            FieldKind::Vec4 => self.vec4_fields.contains_key(field),
            FieldKind::String => self.string_fields.contains_key(field),
            FieldKind::Filename => self.filename_fields.contains_key(field),
        }
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.field_kind(field).is_some()
    }

    /// Type-erased read. Virtual fields come back as strings.
    pub fn field(&self, field: &str) -> Option<FieldValue> {
        if let Some(v) = virtual_field(field) {
            return Some(FieldValue::String((v.get)(self).to_string()));
        }
        match self.field_kind(field)? {
            FieldKind::Bool => self.bool_fields.get(field).map(|v| FieldValue::Bool(*v)),
            FieldKind::Float => self.float_fields.get(field).map(|v| FieldValue::Float(*v)),
            FieldKind::Int => self.int_fields.get(field).map(|v| FieldValue::Int(*v)),
            FieldKind::Vec3 => self.vec3_fields.get(field).map(|v| FieldValue::Vec3(*v)),
            FieldKind::Vec4 => self.vec4_fields.get(field).map(|v| FieldValue::Vec4(*v)),
            FieldKind::String => self
                .string_fields
                .get(field)
                .map(|v| FieldValue::String(v.clone())),
            FieldKind::Filename => self
                .filename_fields
                .get(field)
                .map(|v| FieldValue::Filename(v.clone())),
        }
    }

    pub fn field_as_string(&self, field: &str) -> Option<String> {
        self.field(field).map(|v| v.to_plain_string())
    }

    /// Inserts or overwrites `field` with `value` in the container matching
    /// the value's kind, evicting the name from any other container.
    pub fn insert_field(&mut self, field: &str, value: FieldValue) {
        if let Some(kind) = self.field_kind(field)
            && kind != value.kind()
        {
            self.remove_field(field);
        }
        let key = field.to_string();
        match value {
            FieldValue::Bool(v) => {
                self.bool_fields.insert(key, v);
            }
            FieldValue::Float(v) => {
                self.float_fields.insert(key, v);
            }
            FieldValue::Int(v) => {
                self.int_fields.insert(key, v);
            }
            FieldValue::Vec3(v) => {
                self.vec3_fields.insert(key, v);
            }
            FieldValue::Vec4(v) => {
                self.vec4_fields.insert(key, v);
            }
            FieldValue::String(v) => {
                self.string_fields.insert(key, v);
            }
            FieldValue::Filename(v) => {
                self.filename_fields.insert(key, v);
            }
        }
    }

    pub fn remove_field(&mut self, field: &str) -> Option<FieldValue> {
        let value = self.field(field)?;
        match value.kind() {
            FieldKind::Bool => self.bool_fields.shift_remove(field).map(|_| ()),
            FieldKind::Float => self.float_fields.shift_remove(field).map(|_| ()),
            FieldKind::Int => self.int_fields.shift_remove(field).map(|_| ()),
            FieldKind::Vec3 => self.vec3_fields.shift_remove(field).map(|_| ()),
            FieldKind::Vec4 => self.vec4_fields.shift_remove(field).map(|_| ()),
            FieldKind::String => self.string_fields.shift_remove(field).map(|_| ()),
            FieldKind::Filename => self.filename_fields.shift_remove(field).map(|_| ()),
        }?;
        Some(value)
    }

    /// Copies `field` from `source` when `source` has it and this record does
    /// not. Returns whether a value was copied.
    pub fn ensure_field_exists(&mut self, source: &Record, field: &str) -> bool {
        if self.has_field(field) {
            return false;
        }
        match source.field(field) {
            Some(value) if virtual_field(field).is_none() => {
                self.insert_field(field, value);
                true
            }
            _ => false,
        }
    }

    /// Declares `field` with the zero value of `kind`.
    pub fn force_ensure_field_exists(&mut self, field: &str, kind: FieldKind) {
        self.insert_field(field, kind.default_value());
    }

    /// Sets a declared field from its text form.
    pub fn set_field(&mut self, field: &str, value: &str) -> Result<()> {
        if let Some(v) = virtual_field(field) {
            (v.set)(self, value);
            return Ok(());
        }
        let Some(kind) = self.field_kind(field) else {
            return Err(ModError::FieldNotDeclared {
                record: self.name.clone(),
                string_id: self.string_id.clone(),
                field: field.to_string(),
                value: value.to_string(),
            });
        };
        let parsed = FieldValue::parse_as(kind, value).ok_or_else(|| ModError::InvalidFieldValue {
            record: self.name.clone(),
            string_id: self.string_id.clone(),
            field: field.to_string(),
            value: value.to_string(),
        })?;
        self.insert_field(field, parsed);
        Ok(())
    }

    /// Every declared field name across the seven containers, in container
    /// order, each name once.
    pub fn all_field_names(&self) -> Vec<String> {
        let mut seen = BTreeSet::new();
        let names = self
            .bool_fields
            .keys()
            .chain(self.float_fields.keys())
            .chain(self.int_fields.keys())
            .chain(self.vec3_fields.keys())
            .chain(self.vec4_fields.keys())
            .chain(self.string_fields.keys())
            .chain(self.filename_fields.keys());
        names
            .filter(|name| seen.insert(name.as_str()))
            .cloned()
            .collect()
    }

    /// `"<kind>:<key>"` tags for every field and extra-data category touched.
    pub fn changed_fields(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        let mut tag = |kind: &str, key: &str| {
            out.insert(format!("{kind}:{key}"));
        };
        self.bool_fields.keys().for_each(|k| tag("bool", k));
        self.float_fields.keys().for_each(|k| tag("float", k));
        self.int_fields.keys().for_each(|k| tag("long", k));
        self.vec3_fields.keys().for_each(|k| tag("vec3", k));
        self.vec4_fields.keys().for_each(|k| tag("vec4", k));
        self.string_fields.keys().for_each(|k| tag("string", k));
        self.filename_fields.keys().for_each(|k| tag("filename", k));
        self.extra_data.keys().for_each(|k| tag("extradata", k));
        out
    }

    /// How much information the record carries. A heuristic, not identity.
    pub fn completeness(&self) -> usize {
        self.bool_fields.len()
            + self.float_fields.len()
            + self.int_fields.len()
            + self.vec3_fields.len()
            + self.vec4_fields.len()
            + self.string_fields.len()
            + self.filename_fields.len()
            + self.extra_data.values().map(IndexMap::len).sum::<usize>()
            + self.instances.len()
    }

    /// Field-granular last-writer-wins overlay of `other` onto `self`. A
    /// field re-typed by `other` moves to its new container.
    /// Extra data merges per (category, key), tombstones included.
    pub fn apply_changes_from(&mut self, other: &Record) {
        for (k, v) in &other.bool_fields {
            self.insert_field(k, FieldValue::Bool(*v));
        }
        for (k, v) in &other.float_fields {
            self.insert_field(k, FieldValue::Float(*v));
        }
        for (k, v) in &other.int_fields {
            self.insert_field(k, FieldValue::Int(*v));
        }
        for (k, v) in &other.vec3_fields {
            self.insert_field(k, FieldValue::Vec3(*v));
        }
        for (k, v) in &other.vec4_fields {
            self.insert_field(k, FieldValue::Vec4(*v));
        }
        for (k, v) in &other.string_fields {
            self.insert_field(k, FieldValue::String(v.clone()));
        }
        for (k, v) in &other.filename_fields {
            self.insert_field(k, FieldValue::Filename(v.clone()));
        }
        for (category, items) in &other.extra_data {
            let target = self.extra_data.entry(category.clone()).or_default();
            for (key, values) in items {
                target.insert(key.clone(), *values);
            }
        }
    }

    // --- extra data ---

    pub fn extra_data(&self, category: &str) -> Option<&ExtraDataCategory> {
        self.extra_data.get(category)
    }

    pub fn extra_data_value(&self, category: &str, key: &str) -> Option<[i32; 3]> {
        self.extra_data.get(category)?.get(key).copied()
    }

    /// Membership that treats a tombstoned item as absent.
    pub fn has_active_extra_data(&self, category: &str, key: &str) -> bool {
        self.extra_data_value(category, key)
            .is_some_and(|v| !is_deleted(&v))
    }

    /// Replaces `(category, key)` with the deletion tombstone. The entry moves
    /// to the end of its category.
    pub fn delete_extra_data(&mut self, category: &str, key: &str) {
        let cat = self.extra_data.entry(category.to_string()).or_default();
        cat.shift_remove(key);
        cat.insert(key.to_string(), DELETED_TRIPLE);
    }

    /// Whether this record lists `other` under `category` (any category when
    /// `None`). Without explicit `values`, tombstoned items do not count.
    pub fn lists_as_extra_data(
        &self,
        other: &Record,
        category: Option<&str>,
        values: Option<&[i32; 3]>,
    ) -> bool {
        lists_key(self, &other.string_id, category, values)
    }

    /// Whether `other` lists this record in its extra data.
    pub fn is_extra_data_of(
        &self,
        other: &Record,
        category: Option<&str>,
        values: Option<&[i32; 3]>,
    ) -> bool {
        lists_key(other, &self.string_id, category, values)
    }

    // --- codec ---

    pub fn parse<R: Read + Seek>(r: &mut LittleEndianReader<R>) -> io::Result<Self> {
        let instance_count = r.read_i32()?;
        let record_type = RecordType::from_raw(r.read_i32()?);
        let id = r.read_i32()?;
        let name = r.read_string()?;
        let string_id = r.read_string()?;
        let change_status = ChangeStatus::from_raw(r.read_i32()?);

        let bool_fields = r.read_map(|r| r.read_bool())?;
        let float_fields = r.read_map(|r| r.read_f32())?;
        let int_fields = r.read_map(|r| r.read_i32())?;
        let vec3_fields = r.read_map(|r| r.read_f32_array::<3>())?;
        let vec4_fields = r.read_map(|r| r.read_f32_array::<4>())?;
        let string_fields = r.read_map(|r| r.read_string())?;
        let filename_fields = r.read_map(|r| r.read_string())?;
        let extra_data = r.read_map(|r| r.read_map(|r| r.read_i32_array::<3>()))?;

        let count = r.read_count("instance")?;
        let mut instances = Vec::with_capacity(count.min(1024));
        for _ in 0..count {
            instances.push(Instance::parse(r)?);
        }

        Ok(Self {
            instance_count,
            record_type,
            id,
            name,
            string_id,
            change_status,
            bool_fields,
            float_fields,
            int_fields,
            vec3_fields,
            vec4_fields,
            string_fields,
            filename_fields,
            extra_data,
            instances,
        })
    }

    pub fn emit<W: Write>(&self, w: &mut LittleEndianWriter<W>) -> io::Result<()> {
        w.write_count(self.instances.len(), "instance")?;
        w.write_i32(self.record_type.raw())?;
        w.write_i32(self.id)?;
        w.write_string(&self.name)?;
        w.write_string(&self.string_id)?;
        w.write_i32(self.change_status.raw())?;

        w.write_map(&self.bool_fields, |w, v| w.write_bool(*v))?;
        w.write_map(&self.float_fields, |w, v| w.write_f32(*v))?;
        w.write_map(&self.int_fields, |w, v| w.write_i32(*v))?;
        w.write_map(&self.vec3_fields, |w, v| w.write_f32_slice(v))?;
        w.write_map(&self.vec4_fields, |w, v| w.write_f32_slice(v))?;
        w.write_map(&self.string_fields, |w, v| w.write_string(v))?;
        w.write_map(&self.filename_fields, |w, v| w.write_string(v))?;
        w.write_map(&self.extra_data, |w, cat| {
            w.write_map(cat, |w, v| w.write_i32_slice(v))
        })?;

        w.write_count(self.instances.len(), "instance")?;
        for instance in &self.instances {
            instance.emit(w)?;
        }
        Ok(())
    }
}

fn lists_key(holder: &Record, key: &str, category: Option<&str>, values: Option<&[i32; 3]>) -> bool {
    let matches = |cat: &ExtraDataCategory| match (cat.get(key), values) {
        (Some(stored), Some(wanted)) => stored == wanted,
        (Some(stored), None) => !is_deleted(stored),
        (None, _) => false,
    };
    match category {
        Some(name) => holder.extra_data.get(name).is_some_and(matches),
        None => holder.extra_data.values().any(matches),
    }
}

impl Instance {
    pub fn parse<R: Read + Seek>(r: &mut LittleEndianReader<R>) -> io::Result<Self> {
        let id = r.read_string()?;
        let target = r.read_string()?;
        let position = r.read_f32_array::<3>()?;
        let rotation = r.read_f32_array::<4>()?;
        let state_count = r.read_count("instance state")?;
        let mut states = Vec::with_capacity(state_count.min(1024));
        for _ in 0..state_count {
            states.push(r.read_string()?);
        }
        Ok(Self {
            id,
            target,
            position,
            rotation,
            states,
        })
    }

    pub fn emit<W: Write>(&self, w: &mut LittleEndianWriter<W>) -> io::Result<()> {
        w.write_string(&self.id)?;
        w.write_string(&self.target)?;
        w.write_f32_slice(&self.position)?;
        w.write_f32_slice(&self.rotation)?;
        w.write_count(self.states.len(), "instance state")?;
        for state in &self.states {
            w.write_string(state)?;
        }
        Ok(())
    }
}
