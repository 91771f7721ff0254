mod context;
mod diff;
mod merge;
mod types;

pub use context::ModContext;
pub use diff::{
    DiffReport, FieldChange, FieldDiff, NumericSummary, RecordDiff, diff_files, values_equal,
};
pub use merge::merge_records;
pub use types::{ContextConfig, DEFAULT_BASE_MODS, DEFAULT_IGNORED_MODS, MergedRecord, RecordLayer};
