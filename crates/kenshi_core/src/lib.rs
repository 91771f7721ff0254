pub mod core_api;
pub mod deps;
pub mod document;
pub mod error;
pub mod field;
pub mod header;
mod patch;
pub mod reader;
pub mod record;
pub mod record_type;
pub mod status;
pub mod types;
pub mod validation;
pub mod writer;

pub use document::{ModFile, canonical_mod_name, peek_version};
pub use error::{ErrorCode, ModError, Result};
pub use field::{FieldKind, FieldValue};
pub use header::{DeleteRequest, FileType, MergeEntry, ModHeader};
pub use record::{Instance, Record};
pub use record_type::RecordType;
pub use status::{ChangeStatus, RecordStatus};
pub use validation::ValidationFinding;
