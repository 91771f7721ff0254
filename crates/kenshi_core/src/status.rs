//! The 32-bit change/status word carried by every record.
//!
//! Read most-significant bit first, the word splits into:
//!
//! ```text
//! [31..20] 12 bits  reserved; zero in format 17, leading nibble 1000 in format 16
//! [19..4]  16 bits  change counter, clamped to 0..=65535
//! [3..0]    4 bits  status code: 0001 existing, 0010 (v16) / 0000 (v17) new,
//!                   0011 name changed
//! ```
//!
//! `is_new` is a separate literal rule on bit 0 of the whole word. Reserved
//! bits are never normalised: whatever was read is written back.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ModError;
use crate::header::FileType;

const COUNTER_SHIFT: u32 = 4;
const COUNTER_MASK: u32 = 0xFFFF << COUNTER_SHIFT;
const STATUS_MASK: u32 = 0xF;
const RESERVED_SHIFT: u32 = 20;

pub const CHANGE_COUNTER_MAX: i32 = 0xFFFF;

pub const STATUS_CODE_EXISTING: u8 = 0b0001;
pub const STATUS_CODE_NEW_V16: u8 = 0b0010;
pub const STATUS_CODE_NEW_V17: u8 = 0b0000;
pub const STATUS_CODE_NAME_CHANGED: u8 = 0b0011;

const RESERVED_LEAD_NIBBLE_V16: u32 = 0b1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordStatus {
    Existing,
    New,
    NameChanged,
}

impl RecordStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Existing => "existing",
            Self::New => "new",
            Self::NameChanged => "namechanged",
        }
    }
}

impl FromStr for RecordStatus {
    type Err = ModError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "existing" => Ok(Self::Existing),
            "new" => Ok(Self::New),
            "namechanged" => Ok(Self::NameChanged),
            _ => Err(ModError::UnknownStatus(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChangeStatus(pub i32);

impl ChangeStatus {
    pub fn from_raw(raw: i32) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> i32 {
        self.0
    }

    fn bits(&self) -> u32 {
        self.0 as u32
    }

    fn set_bits(&mut self, bits: u32) {
        self.0 = bits as i32;
    }

    pub fn is_new(&self) -> bool {
        self.0 & 1 == 0
    }

    pub fn change_counter(&self) -> i32 {
        ((self.bits() & COUNTER_MASK) >> COUNTER_SHIFT) as i32
    }

    pub fn set_change_counter(&mut self, value: i32) {
        let clamped = value.clamp(0, CHANGE_COUNTER_MAX) as u32;
        let bits = (self.bits() & !COUNTER_MASK) | (clamped << COUNTER_SHIFT);
        self.set_bits(bits);
    }

    pub fn add_to_change_counter(&mut self, delta: i32) {
        let sum = i64::from(self.change_counter()) + i64::from(delta);
        let clamped = sum.clamp(0, i64::from(CHANGE_COUNTER_MAX)) as i32;
        self.set_change_counter(clamped);
    }

    pub fn status_code(&self) -> u8 {
        (self.bits() & STATUS_MASK) as u8
    }

    fn set_status_code(&mut self, code: u8) {
        let bits = (self.bits() & !STATUS_MASK) | (u32::from(code) & STATUS_MASK);
        self.set_bits(bits);
    }

    /// The 12 reserved high bits.
    pub fn reserved_bits(&self) -> u16 {
        (self.bits() >> RESERVED_SHIFT) as u16
    }

    /// Whether the status nibble holds the "new" code of `file_type`. This
    /// is distinct from [`ChangeStatus::is_new`], which only inspects bit 0.
    pub fn has_new_code(&self, file_type: FileType) -> bool {
        self.status_code() == new_status_code(file_type)
    }

    /// Rewrites the status nibble. `NameChanged` leaves the word untouched
    /// while the record carries the "new" code for `file_type`.
    pub fn set_record_status(&mut self, file_type: FileType, status: RecordStatus) {
        let code = match status {
            RecordStatus::Existing => STATUS_CODE_EXISTING,
            RecordStatus::New => new_status_code(file_type),
            RecordStatus::NameChanged => {
                if self.has_new_code(file_type) {
                    return;
                }
                STATUS_CODE_NAME_CHANGED
            }
        };
        self.set_status_code(code);
    }

    pub fn is_name_changed(&self) -> bool {
        self.status_code() == STATUS_CODE_NAME_CHANGED
    }

    /// Checks the historically observed bit patterns for `file_type`.
    pub fn matches_assumptions(&self, file_type: FileType) -> bool {
        let code = self.status_code();
        match file_type {
            FileType::V16 => {
                let lead_ok = u32::from(self.reserved_bits()) >> 8 == RESERVED_LEAD_NIBBLE_V16;
                let code_ok = matches!(
                    code,
                    STATUS_CODE_EXISTING | STATUS_CODE_NEW_V16 | STATUS_CODE_NAME_CHANGED
                );
                lead_ok && code_ok
            }
            FileType::V17 => {
                let reserved_ok = self.reserved_bits() == 0;
                let code_ok = matches!(
                    code,
                    STATUS_CODE_NEW_V17 | STATUS_CODE_EXISTING | STATUS_CODE_NAME_CHANGED
                );
                reserved_ok && code_ok
            }
        }
    }

    pub fn describe(&self) -> String {
        let mut out = format!(
            "Unknown Bits:{:012b} | Change Counter: {} | {:04b} ({})",
            self.reserved_bits(),
            self.change_counter(),
            self.status_code(),
            if self.is_new() { "New" } else { "Existing" }
        );
        if self.is_name_changed() {
            out.push_str(" (Name Changed)");
        }
        out
    }
}

impl fmt::Display for ChangeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

fn new_status_code(file_type: FileType) -> u8 {
    match file_type {
        FileType::V16 => STATUS_CODE_NEW_V16,
        FileType::V17 => STATUS_CODE_NEW_V17,
    }
}
