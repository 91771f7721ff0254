use std::fmt;

use serde::Serialize;

use crate::document::ModFile;
use crate::record_type::RecordType;
use crate::status::ChangeStatus;

/// A non-fatal observation about a loaded file. None of these block
/// loading or saving.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationFinding {
    /// The status word does not match the bit patterns seen so far for the
    /// file's format.
    StatusAssumption {
        name: String,
        string_id: String,
        record_type: RecordType,
        status: ChangeStatus,
    },
    UnknownRecordType {
        name: String,
        string_id: String,
        code: i32,
    },
    LeftoverBytes {
        len: usize,
    },
    UnparsedDetailsTail {
        len: usize,
    },
}

impl fmt::Display for ValidationFinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StatusAssumption {
                name,
                string_id,
                record_type,
                status,
            } => write!(f, "record {name} {string_id} ({record_type}): {status}"),
            Self::UnknownRecordType {
                name,
                string_id,
                code,
            } => write!(f, "record {name} {string_id}: unknown record type {code}"),
            Self::LeftoverBytes { len } => write!(f, "{len} leftover bytes after records"),
            Self::UnparsedDetailsTail { len } => {
                write!(f, "{len} details bytes kept as unparsed tail")
            }
        }
    }
}

impl ModFile {
    pub fn validate(&self) -> Vec<ValidationFinding> {
        let file_type = self.file_type();
        let mut findings = Vec::new();

        for record in self.records() {
            if !record.change_status.matches_assumptions(file_type) {
                findings.push(ValidationFinding::StatusAssumption {
                    name: record.name.clone(),
                    string_id: record.string_id.clone(),
                    record_type: record.record_type,
                    status: record.change_status,
                });
            }
            if !record.record_type.is_known() {
                findings.push(ValidationFinding::UnknownRecordType {
                    name: record.name.clone(),
                    string_id: record.string_id.clone(),
                    code: record.record_type.raw(),
                });
            }
        }
        if !self.leftover.is_empty() {
            findings.push(ValidationFinding::LeftoverBytes {
                len: self.leftover.len(),
            });
        }
        if !self.header.details_tail.is_empty() {
            findings.push(ValidationFinding::UnparsedDetailsTail {
                len: self.header.details_tail.len(),
            });
        }

        for finding in &findings {
            log::warn!("{}: {finding}", self.name);
        }
        findings
    }
}
