use std::io;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ModError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    Io,
    Parse,
    Format,
    NotFound,
    UnsupportedOperation,
}

#[derive(Debug, Error)]
pub enum ModError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("failed to parse {context}: {source}")]
    Parse {
        context: String,
        #[source]
        source: io::Error,
    },

    #[error("unexpected file type {0}, expected 16 or 17")]
    UnknownFileType(i32),

    #[error("field not found: {field}={value} on record {record} ({string_id})")]
    FieldNotDeclared {
        record: String,
        string_id: String,
        field: String,
        value: String,
    },

    #[error("invalid value for field: {field}={value} on record {record} ({string_id})")]
    InvalidFieldValue {
        record: String,
        string_id: String,
        field: String,
        value: String,
    },

    #[error(
        "unknown field kind: {0} available kinds are: bool, float, int, string, filename, vec3field and vec4field"
    )]
    UnknownFieldKind(String),

    #[error("'{0}' is not a valid record type")]
    UnknownRecordType(String),

    #[error("unknown record status: {0}")]
    UnknownStatus(String),

    #[error("record not found: {0}")]
    RecordNotFound(String),

    #[error("unsupported operation: {0}")]
    Unsupported(String),
}

impl ModError {
    pub fn parse(context: impl Into<String>, source: io::Error) -> Self {
        Self::Parse {
            context: context.into(),
            source,
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Io(_) => ErrorCode::Io,
            Self::Parse { .. } | Self::UnknownFileType(_) => ErrorCode::Parse,
            Self::FieldNotDeclared { .. }
            | Self::InvalidFieldValue { .. }
            | Self::UnknownFieldKind(_)
            | Self::UnknownRecordType(_)
            | Self::UnknownStatus(_) => ErrorCode::Format,
            Self::RecordNotFound(_) => ErrorCode::NotFound,
            Self::Unsupported(_) => ErrorCode::UnsupportedOperation,
        }
    }
}
