//! Authoring edits on a single target file.
//!
//! Edits to records owned by another file go through a local stub: a minimal
//! copy with the same StringId that carries only the fields this file changes.

use crate::document::ModFile;
use crate::error::{ModError, Result};
use crate::field::FieldKind;
use crate::header::FileType;
use crate::record::{Record, is_deleted};
use crate::record_type::RecordType;
use crate::status::{ChangeStatus, RecordStatus};
use crate::types::{
    FIRST_LOCAL_STRING_ID, NEW_RECORD_STATUS_V16, NEW_RECORD_STATUS_V17, REMOVED_FIELD,
    STUB_CHANGE_COUNTER,
};

fn new_record_status(file_type: FileType) -> ChangeStatus {
    ChangeStatus::from_raw(match file_type {
        FileType::V16 => NEW_RECORD_STATUS_V16,
        FileType::V17 => NEW_RECORD_STATUS_V17,
    })
}

impl ModFile {
    /// Returns the index of this file's copy of `source`, creating a stub if
    /// there is none. The flag is true when the stub was created here.
    fn ensure_owned(&mut self, source: &Record) -> (usize, bool) {
        if let Some(index) = self.position_of(&source.string_id) {
            return (index, false);
        }
        let mut status = ChangeStatus::from_raw(0);
        status.set_record_status(self.file_type(), RecordStatus::Existing);
        status.set_change_counter(STUB_CHANGE_COUNTER);

        let mut stub = Record::new(source.record_type, source.name.clone(), source.string_id.clone());
        stub.change_status = status;
        log::trace!("{}: stub created for {}", self.name, source.string_id);
        (self.push_record(stub), true)
    }

    fn roll_back_stub(&mut self, index: usize) {
        let stub = self.remove_record(index);
        log::trace!("{}: stub for {} rolled back", self.name, stub.string_id);
    }

    /// This file's copy of `source`, creating an "existing" stub mirroring
    /// its name, StringId and type when absent.
    pub fn ensure_record_exists(&mut self, source: &Record) -> &mut Record {
        let (index, _) = self.ensure_owned(source);
        &mut self.records_mut()[index]
    }

    /// Sets `field` on this file's copy of `source`. The inherited value is
    /// copied first, so the field must be declared on `source` or locally.
    pub fn set_field(&mut self, source: &Record, field: &str, value: &str) -> Result<()> {
        let (index, created) = self.ensure_owned(source);
        let owned = &mut self.records_mut()[index];
        owned.ensure_field_exists(source, field);
        let result = owned.set_field(field, value);
        if result.is_err() && created {
            self.roll_back_stub(index);
        }
        result
    }

    /// Like [`ModFile::set_field`], but declares the field as `kind` when
    /// neither the local copy nor `source` has it.
    pub fn force_set_field(
        &mut self,
        source: &Record,
        field: &str,
        value: &str,
        kind: FieldKind,
    ) -> Result<()> {
        let (index, created) = self.ensure_owned(source);
        let owned = &mut self.records_mut()[index];
        if !owned.ensure_field_exists(source, field) && !owned.has_field(field) {
            owned.force_ensure_field_exists(field, kind);
        }
        let result = owned.set_field(field, value);
        if result.is_err() && created {
            self.roll_back_stub(index);
        }
        result
    }

    /// Associates `source` with `target` under `category`, keyed by the
    /// source StringId. Values default to `[0, 0, 0]`.
    ///
    /// Without `force`, nothing is written when the effective association
    /// (local entry if present, otherwise the inherited one) is already
    /// active and either no values were requested or they are identical.
    /// Returns whether an entry was written.
    pub fn add_extra_data(
        &mut self,
        target: &Record,
        source: &Record,
        category: &str,
        values: Option<[i32; 3]>,
        force: bool,
    ) -> bool {
        let (index, created) = self.ensure_owned(target);
        let key = source.string_id.as_str();
        let owned = &mut self.records_mut()[index];

        let effective = owned
            .extra_data_value(category, key)
            .or_else(|| target.extra_data_value(category, key));
        let already_active = match effective {
            Some(current) if !is_deleted(&current) => values.is_none_or(|v| v == current),
            _ => false,
        };
        if already_active && !force {
            if created {
                self.roll_back_stub(index);
            }
            return false;
        }

        owned
            .extra_data
            .entry(category.to_string())
            .or_default()
            .insert(key.to_string(), values.unwrap_or([0, 0, 0]));
        true
    }

    /// Rewrites every inherited `(category, key)` item of `target` through
    /// `edit`, starting from the local value when one exists. Returning
    /// `None` leaves the item alone.
    ///
    /// A stub created by this call is removed again when no item actually
    /// changed. Returns whether anything changed.
    pub fn edit_extra_data(
        &mut self,
        target: &Record,
        category: &str,
        mut edit: impl FnMut(&str, [i32; 3]) -> Option<[i32; 3]>,
    ) -> bool {
        let (index, created) = self.ensure_owned(target);
        let Some(inherited) = target.extra_data(category) else {
            if created {
                self.roll_back_stub(index);
            }
            return false;
        };

        let owned = &mut self.records_mut()[index];
        let mut changed = false;
        for (key, base) in inherited {
            let current = owned.extra_data_value(category, key).unwrap_or(*base);
            let Some(next) = edit(key.as_str(), current) else {
                continue;
            };
            if next != current {
                owned
                    .extra_data
                    .entry(category.to_string())
                    .or_default()
                    .insert(key.clone(), next);
                changed = true;
            }
        }

        if !changed && created {
            self.roll_back_stub(index);
        }
        changed
    }

    /// Deletes `record` from this file's point of view.
    ///
    /// A local copy flagged new is removed outright. Otherwise the local copy
    /// (or a fresh stub) is reduced to a tombstone carrying `REMOVED = true`.
    pub fn delete_record(&mut self, record: &Record) {
        if let Some(index) = self.position_of(&record.string_id) {
            if self.records()[index].is_new() {
                self.remove_record(index);
                log::trace!("{}: removed own record {}", self.name, record.string_id);
                return;
            }
            let owned = &mut self.records_mut()[index];
            let tombstone = Record {
                change_status: owned.change_status,
                ..Record::new(owned.record_type, owned.name.clone(), owned.string_id.clone())
            };
            *owned = tombstone;
        }
        let owned = self.ensure_record_exists(record);
        owned.bool_fields.insert(REMOVED_FIELD.to_string(), true);
        log::trace!("tombstone written for {}", record.string_id);
    }

    /// Smallest numeric StringId prefix, starting at 10, not used by a record
    /// whose StringId names this file as owner.
    pub fn next_free_string_id_number(&self) -> u32 {
        let used: std::collections::BTreeSet<u32> = self
            .records()
            .iter()
            .filter(|r| r.owner_mod_name() == Some(self.name.as_str()))
            .filter_map(Record::string_id_number)
            .collect();
        (FIRST_LOCAL_STRING_ID..)
            .find(|n| !used.contains(n))
            .unwrap_or(FIRST_LOCAL_STRING_ID)
    }

    fn allocate_string_id(&self) -> String {
        format!("{}-{}", self.next_free_string_id_number(), self.name)
    }

    /// Appends a new record owned by this file.
    pub fn create_new_record(&mut self, record_type: RecordType, name: &str) -> &mut Record {
        let mut record = Record::new(record_type, name, self.allocate_string_id());
        record.change_status = new_record_status(self.file_type());
        log::trace!("{}: created {} ({record_type})", self.name, record.string_id);
        let index = self.push_record(record);
        &mut self.records_mut()[index]
    }

    /// Appends `count` copies of `source` as new records with fresh
    /// StringIds. Returns the StringIds handed out.
    pub fn clone_record(&mut self, source: &Record, count: usize) -> Vec<String> {
        let status = new_record_status(self.file_type());
        let mut ids = Vec::with_capacity(count);
        for _ in 0..count {
            let mut copy = source.clone();
            copy.string_id = self.allocate_string_id();
            copy.change_status = status;
            ids.push(copy.string_id.clone());
            self.push_record(copy);
        }
        ids
    }

    /// Creates a record named after `record_type` unless one of that type
    /// with that name already exists.
    pub fn ensure_placeholder_exists(&mut self, record_type: RecordType) -> Result<()> {
        let name = record_type
            .name()
            .ok_or_else(|| ModError::UnknownRecordType(record_type.raw().to_string()))?;
        if self
            .records_of_type(record_type)
            .iter()
            .any(|r| r.name == name)
        {
            return Ok(());
        }
        self.create_new_record(record_type, name);
        Ok(())
    }
}
