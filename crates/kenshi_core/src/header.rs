use std::io::{self, Cursor, Read, Seek, Write};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::deps;
use crate::reader::LittleEndianReader;
use crate::types::{FILE_TYPE_V16, FILE_TYPE_V17};
use crate::writer::LittleEndianWriter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FileType {
    V16,
    V17,
}

impl FileType {
    pub fn from_raw(raw: i32) -> Option<Self> {
        match raw {
            FILE_TYPE_V16 => Some(Self::V16),
            FILE_TYPE_V17 => Some(Self::V17),
            _ => None,
        }
    }

    pub fn raw(&self) -> i32 {
        match self {
            Self::V16 => FILE_TYPE_V16,
            Self::V17 => FILE_TYPE_V17,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeEntry {
    pub save_count: u32,
    pub last_merge: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteRequest {
    pub save_count: u32,
    pub target: String,
}

/// File header. Format 16 stores author/description/lists inline and they are
/// always present; format 17 moves them into the details blob where every
/// field is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModHeader {
    pub file_type: FileType,
    pub version: i32,
    pub author: Option<String>,
    pub description: Option<String>,
    pub dependencies: Option<String>,
    pub references: Option<String>,
    /// Unidentified int32 between the lists and the record count (format 16).
    pub unknown_int: i32,
    /// Record count as declared on disk. Emit always uses the live count.
    pub record_count: i32,
    pub save_count: Option<u32>,
    pub last_merge: Option<u32>,
    pub merge_entries: Option<IndexMap<String, MergeEntry>>,
    pub delete_requests: Option<IndexMap<String, DeleteRequest>>,
    /// Details-blob bytes past the last field that decoded cleanly.
    pub details_tail: Vec<u8>,
}

impl ModHeader {
    pub fn new(file_type: FileType, version: i32) -> Self {
        let inline = |s: &str| match file_type {
            FileType::V16 => Some(s.to_string()),
            FileType::V17 => None,
        };
        Self {
            file_type,
            version,
            author: inline(""),
            description: inline(""),
            dependencies: inline(""),
            references: inline(""),
            unknown_int: 0,
            record_count: 0,
            save_count: None,
            last_merge: None,
            merge_entries: None,
            delete_requests: None,
            details_tail: Vec::new(),
        }
    }

    /// Parses everything after the leading FileType word.
    pub fn parse_body<R: Read + Seek>(
        r: &mut LittleEndianReader<R>,
        file_type: FileType,
    ) -> io::Result<Self> {
        let mut header = Self::new(file_type, 0);
        match file_type {
            FileType::V16 => {
                header.version = r.read_i32()?;
                header.author = Some(r.read_string()?);
                header.description = Some(r.read_string()?);
                header.dependencies = Some(r.read_string()?);
                header.references = Some(r.read_string()?);
                header.unknown_int = r.read_i32()?;
                header.record_count = r.read_i32()?;
            }
            FileType::V17 => {
                let details_len = r.read_count("details length")?;
                header.version = r.read_i32()?;
                let details = r.read_bytes(details_len)?;
                header.record_count = r.read_i32()?;
                header.apply_details(&details);
            }
        }
        Ok(header)
    }

    pub fn emit<W: Write>(&self, w: &mut LittleEndianWriter<W>, record_count: usize) -> io::Result<()> {
        w.write_i32(self.file_type.raw())?;
        match self.file_type {
            FileType::V16 => {
                w.write_i32(self.version)?;
                w.write_string(self.author.as_deref().unwrap_or_default())?;
                w.write_string(self.description.as_deref().unwrap_or_default())?;
                w.write_string(self.dependencies.as_deref().unwrap_or_default())?;
                w.write_string(self.references.as_deref().unwrap_or_default())?;
                w.write_i32(self.unknown_int)?;
            }
            FileType::V17 => {
                let details = self.build_details()?;
                w.write_count(details.len(), "details length")?;
                w.write_i32(self.version)?;
                w.write_bytes(&details)?;
            }
        }
        w.write_count(record_count, "record")
    }

    /// Best-effort decode of the format-17 details blob. Fields are read in
    /// order; decoding stops at the first field that fails or when the blob
    /// is exhausted, and the bytes from the last clean boundary onward are
    /// kept verbatim in `details_tail`.
    pub fn apply_details(&mut self, details: &[u8]) {
        let mut c = DetailsCursor::new(details);

        self.author = c.step(|r| r.read_string());
        self.description = c.step(|r| r.read_string());
        self.dependencies = c.step(|r| r.read_string());
        self.references = c.step(|r| r.read_string());
        self.save_count = c.step(|r| r.read_u32());
        self.last_merge = c.step(|r| r.read_u32());
        self.merge_entries = c.step(read_merge_entries);
        self.delete_requests = c.step(read_delete_requests);

        self.details_tail = details[c.last_good..].to_vec();
        if !self.details_tail.is_empty() {
            log::warn!(
                "details blob: {} of {} bytes kept as unparsed tail",
                self.details_tail.len(),
                details.len()
            );
        }
    }

    /// Rebuilds the details blob from the structured fields plus the tail.
    /// Fields are positional, so an absent field that precedes a present one
    /// is written as its empty value.
    pub fn build_details(&self) -> io::Result<Vec<u8>> {
        let present = [
            self.author.is_some(),
            self.description.is_some(),
            self.dependencies.is_some(),
            self.references.is_some(),
            self.save_count.is_some(),
            self.last_merge.is_some(),
            self.merge_entries.is_some(),
            self.delete_requests.is_some(),
        ];
        let upto = present.iter().rposition(|&p| p).map_or(0, |i| i + 1);

        let mut w = LittleEndianWriter::new(Vec::new());
        let strings = [
            &self.author,
            &self.description,
            &self.dependencies,
            &self.references,
        ];
        for s in strings.iter().take(upto) {
            w.write_string(s.as_deref().unwrap_or_default())?;
        }
        if upto > 4 {
            w.write_u32(self.save_count.unwrap_or_default())?;
        }
        if upto > 5 {
            w.write_u32(self.last_merge.unwrap_or_default())?;
        }
        if upto > 6 {
            write_merge_entries(&mut w, self.merge_entries.as_ref())?;
        }
        if upto > 7 {
            write_delete_requests(&mut w, self.delete_requests.as_ref())?;
        }
        w.write_bytes(&self.details_tail)?;
        Ok(w.into_inner())
    }

    /// Whether any value is set that only the format-17 details blob can
    /// carry.
    pub fn has_details_only_fields(&self) -> bool {
        self.save_count.is_some()
            || self.last_merge.is_some()
            || self.merge_entries.is_some()
            || self.delete_requests.is_some()
            || !self.details_tail.is_empty()
    }

    pub fn dependency_list(&self) -> Vec<String> {
        deps::split_mod_list(self.dependencies.as_deref())
    }

    pub fn reference_list(&self) -> Vec<String> {
        deps::split_mod_list(self.references.as_deref())
    }

    pub fn add_dependency(&mut self, mod_name: &str) {
        self.dependencies = Some(deps::add_mod_to_list(self.dependencies.as_deref(), mod_name));
    }

    pub fn add_reference(&mut self, mod_name: &str) {
        self.references = Some(deps::add_mod_to_list(self.references.as_deref(), mod_name));
    }
}

struct DetailsCursor<'a> {
    reader: LittleEndianReader<Cursor<&'a [u8]>>,
    len: usize,
    last_good: usize,
    stopped: bool,
}

impl<'a> DetailsCursor<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self {
            reader: LittleEndianReader::new(Cursor::new(bytes)),
            len: bytes.len(),
            last_good: 0,
            stopped: false,
        }
    }

    fn step<T>(
        &mut self,
        decode: impl FnOnce(&mut LittleEndianReader<Cursor<&'a [u8]>>) -> io::Result<T>,
    ) -> Option<T> {
        if self.stopped || self.last_good >= self.len {
            self.stopped = true;
            return None;
        }
        let decoded = decode(&mut self.reader).and_then(|v| Ok((v, self.reader.position()?)));
        match decoded {
            Ok((value, pos)) => {
                self.last_good = pos as usize;
                Some(value)
            }
            Err(_) => {
                self.stopped = true;
                None
            }
        }
    }
}

fn read_merge_entries<R: Read + Seek>(
    r: &mut LittleEndianReader<R>,
) -> io::Result<IndexMap<String, MergeEntry>> {
    let count = r.read_u8()?;
    let mut entries = IndexMap::with_capacity(usize::from(count));
    for _ in 0..count {
        let key = r.read_string()?;
        let save_count = r.read_u32()?;
        let last_merge = r.read_u32()?;
        entries.insert(
            key,
            MergeEntry {
                save_count,
                last_merge,
            },
        );
    }
    Ok(entries)
}

fn read_delete_requests<R: Read + Seek>(
    r: &mut LittleEndianReader<R>,
) -> io::Result<IndexMap<String, DeleteRequest>> {
    let count = r.read_u8()?;
    let mut requests = IndexMap::with_capacity(usize::from(count));
    for _ in 0..count {
        let key = r.read_string()?;
        let save_count = r.read_u32()?;
        let target = r.read_string()?;
        requests.insert(key, DeleteRequest { save_count, target });
    }
    Ok(requests)
}

fn byte_count(len: usize, what: &str) -> io::Result<u8> {
    u8::try_from(len).map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{len} {what} do not fit the one-byte count"),
        )
    })
}

fn write_merge_entries<W: Write>(
    w: &mut LittleEndianWriter<W>,
    entries: Option<&IndexMap<String, MergeEntry>>,
) -> io::Result<()> {
    let Some(entries) = entries else {
        return w.write_u8(0);
    };
    w.write_u8(byte_count(entries.len(), "merge entries")?)?;
    for (key, entry) in entries {
        w.write_string(key)?;
        w.write_u32(entry.save_count)?;
        w.write_u32(entry.last_merge)?;
    }
    Ok(())
}

fn write_delete_requests<W: Write>(
    w: &mut LittleEndianWriter<W>,
    requests: Option<&IndexMap<String, DeleteRequest>>,
) -> io::Result<()> {
    let Some(requests) = requests else {
        return w.write_u8(0);
    };
    w.write_u8(byte_count(requests.len(), "delete requests")?)?;
    for (key, request) in requests {
        w.write_string(key)?;
        w.write_u32(request.save_count)?;
        w.write_string(&request.target)?;
    }
    Ok(())
}
