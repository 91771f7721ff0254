use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Cursor, Read, Seek, Write};
use std::path::Path;
use std::sync::OnceLock;

use byteorder::{LittleEndian, ReadBytesExt};

use crate::error::{ModError, Result};
use crate::header::{FileType, ModHeader};
use crate::reader::LittleEndianReader;
use crate::record::Record;
use crate::record_type::RecordType;
use crate::types::{BASE_EXTENSION, MOD_EXTENSION};
use crate::writer::LittleEndianWriter;

/// One loaded `.mod`/`.base` file. The file exclusively owns its records.
#[derive(Debug, Clone)]
pub struct ModFile {
    /// Canonical file name used as the StringId suffix of records created here.
    pub name: String,
    pub header: ModHeader,
    records: Vec<Record>,
    /// Bytes found after the declared record list, written back verbatim.
    pub leftover: Vec<u8>,
    type_index: OnceLock<BTreeMap<RecordType, Vec<usize>>>,
}

impl ModFile {
    pub fn new(name: impl Into<String>, header: ModHeader) -> Self {
        Self {
            name: name.into(),
            header,
            records: Vec::new(),
            leftover: Vec::new(),
            type_index: OnceLock::new(),
        }
    }

    pub fn parse<R: Read + Seek>(reader: R, name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let mut r = LittleEndianReader::new(reader);

        let raw_type = r.read_i32().map_err(|e| ModError::parse("file type", e))?;
        let file_type = FileType::from_raw(raw_type).ok_or(ModError::UnknownFileType(raw_type))?;
        let header =
            ModHeader::parse_body(&mut r, file_type).map_err(|e| ModError::parse("header", e))?;

        let declared = usize::try_from(header.record_count).map_err(|_| {
            ModError::parse(
                "header",
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("negative record count {}", header.record_count),
                ),
            )
        })?;
        let mut records = Vec::with_capacity(declared.min(4096));
        for index in 0..declared {
            let record =
                Record::parse(&mut r).map_err(|e| ModError::parse(format!("record {index}"), e))?;
            records.push(record);
        }

        let rest = r.remaining()?;
        let leftover = r.read_bytes(rest as usize)?;
        if !leftover.is_empty() {
            log::warn!(
                "{name}: {} leftover bytes after {declared} records",
                leftover.len()
            );
        }

        log::debug!(
            "{name}: parsed v{} file, version {}, {} records",
            file_type.raw(),
            header.version,
            records.len()
        );

        Ok(Self {
            name,
            header,
            records,
            leftover,
            type_index: OnceLock::new(),
        })
    }

    pub fn from_bytes(bytes: &[u8], name: impl Into<String>) -> Result<Self> {
        Self::parse(Cursor::new(bytes), name)
    }

    /// Reads and parses the file at `path`, naming it after the file name.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path)?;
        Self::from_bytes(&bytes, canonical_mod_name(path))
    }

    /// Emits the file. A format-16 header holding details-blob values is
    /// refused with [`ModError::Unsupported`] rather than silently dropped.
    pub fn write_to<W: Write>(&self, writer: W) -> Result<()> {
        if self.file_type() == FileType::V16 && self.header.has_details_only_fields() {
            return Err(ModError::Unsupported(format!(
                "{}: format 16 has no details blob for merge metadata",
                self.name
            )));
        }
        let mut w = LittleEndianWriter::new(writer);
        self.header.emit(&mut w, self.records.len())?;
        for record in &self.records {
            record.emit(&mut w)?;
        }
        w.write_bytes(&self.leftover)?;
        Ok(())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.write_to(&mut out)?;
        Ok(out)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let bytes = self.to_bytes()?;
        fs::write(path, &bytes)?;
        log::debug!(
            "{}: wrote {} records ({} bytes) to {}",
            self.name,
            self.records.len(),
            bytes.len(),
            path.display()
        );
        Ok(())
    }

    pub fn file_type(&self) -> FileType {
        self.header.file_type
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Mutable access to the whole record list. Drops the per-type index.
    pub fn records_mut(&mut self) -> &mut Vec<Record> {
        self.type_index.take();
        &mut self.records
    }

    pub fn push_record(&mut self, record: Record) -> usize {
        self.records_mut().push(record);
        self.records.len() - 1
    }

    pub fn remove_record(&mut self, index: usize) -> Record {
        self.records_mut().remove(index)
    }

    pub fn position_of(&self, string_id: &str) -> Option<usize> {
        self.records.iter().position(|r| r.string_id == string_id)
    }

    pub fn find_by_string_id(&self, string_id: &str) -> Option<&Record> {
        self.records.iter().find(|r| r.string_id == string_id)
    }

    pub fn find_by_string_id_mut(&mut self, string_id: &str) -> Option<&mut Record> {
        self.records_mut()
            .iter_mut()
            .find(|r| r.string_id == string_id)
    }

    /// Records of one type, served from a lazily built index.
    pub fn records_of_type(&self, record_type: RecordType) -> Vec<&Record> {
        let index = self.type_index.get_or_init(|| {
            let mut index: BTreeMap<RecordType, Vec<usize>> = BTreeMap::new();
            for (i, record) in self.records.iter().enumerate() {
                index.entry(record.record_type).or_default().push(i);
            }
            index
        });
        index
            .get(&record_type)
            .map(|positions| positions.iter().map(|&i| &self.records[i]).collect())
            .unwrap_or_default()
    }

    /// Uncached mutable view of the records of one type.
    pub fn records_of_type_mut(&mut self, record_type: RecordType) -> Vec<&mut Record> {
        self.records_mut()
            .iter_mut()
            .filter(|r| r.record_type == record_type)
            .collect()
    }

    /// Distinct owner names of every record this file flags as new.
    pub fn mods_with_new_records(&self) -> Vec<String> {
        let mut owners: Vec<String> = Vec::new();
        for record in self.records.iter().filter(|r| r.is_new()) {
            if let Some(owner) = record.owner_mod_name()
                && !owners.iter().any(|o| o == owner)
            {
                owners.push(owner.to_string());
            }
        }
        owners
    }

    /// Rewrites record names and string fields through `f`. The format-16
    /// description is rewritten as well.
    pub fn apply_to_strings(&mut self, mut f: impl FnMut(&str) -> String) {
        if self.header.file_type == FileType::V16
            && let Some(description) = self.header.description.as_mut()
        {
            *description = f(description);
        }
        for record in &mut self.records {
            record.name = f(&record.name);
            for value in record.string_fields.values_mut() {
                *value = f(value);
            }
        }
    }

    pub fn dependencies(&self) -> Vec<String> {
        self.header.dependency_list()
    }

    pub fn references(&self) -> Vec<String> {
        self.header.reference_list()
    }

    pub fn add_dependencies<S: AsRef<str>>(&mut self, names: &[S]) {
        for name in names {
            self.header.add_dependency(name.as_ref());
        }
    }

    pub fn add_references<S: AsRef<str>>(&mut self, names: &[S]) {
        for name in names {
            self.header.add_reference(name.as_ref());
        }
    }
}

/// File name used as the mod's identity. Anything that is not `.mod` or
/// `.base` (case-insensitive) is renamed to `<stem>.mod`.
pub fn canonical_mod_name(path: &Path) -> String {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let lower = file_name.to_ascii_lowercase();
    if lower.ends_with(MOD_EXTENSION) || lower.ends_with(BASE_EXTENSION) {
        return file_name;
    }
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("{stem}{MOD_EXTENSION}")
}

/// Reads only the FileType and version words.
pub fn peek_version<R: Read>(mut reader: R) -> Result<(FileType, i32)> {
    let mut next = |what: &str| -> Result<i32> {
        reader
            .read_i32::<LittleEndian>()
            .map_err(|e| ModError::parse(what, e))
    };
    let raw_type = next("file type")?;
    let file_type = FileType::from_raw(raw_type).ok_or(ModError::UnknownFileType(raw_type))?;
    if file_type == FileType::V17 {
        next("details length")?;
    }
    let version = next("version")?;
    Ok((file_type, version))
}
