use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ModError;
use crate::types::RECORD_TYPE_NAMES;

/// Raw record category code. Codes missing from the name table are kept as-is
/// and reported by validation, never rejected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordType(pub i32);

impl RecordType {
    pub const BUILDING: Self = Self(0);
    pub const CHARACTER: Self = Self(1);
    pub const WEAPON: Self = Self(2);
    pub const ARMOUR: Self = Self(3);
    pub const ITEM: Self = Self(4);
    pub const RACE: Self = Self(7);
    pub const FACTION: Self = Self(10);
    pub const DIALOGUE: Self = Self(18);
    pub const SQUAD_TEMPLATE: Self = Self(52);

    pub fn from_raw(raw: i32) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> i32 {
        self.0
    }

    pub fn name(&self) -> Option<&'static str> {
        RECORD_TYPE_NAMES
            .iter()
            .find(|(code, _)| *code == self.0)
            .map(|(_, name)| *name)
    }

    pub fn from_name(name: &str) -> Option<Self> {
        RECORD_TYPE_NAMES
            .iter()
            .find(|(_, n)| *n == name)
            .map(|(code, _)| Self(*code))
    }

    pub fn is_known(&self) -> bool {
        self.name().is_some()
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "UNKNOWN:{}", self.0),
        }
    }
}

impl FromStr for RecordType {
    type Err = ModError;

    /// Accepts a table name (`"CHARACTER"`) or a bare integer code.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(t) = Self::from_name(s) {
            return Ok(t);
        }
        s.trim()
            .parse::<i32>()
            .map(Self)
            .map_err(|_| ModError::UnknownRecordType(s.to_string()))
    }
}
