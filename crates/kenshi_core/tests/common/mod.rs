#![allow(dead_code)]

/// Minimal little-endian byte builder for hand-made fixtures. Independent of
/// the crate's own writer so parse tests do not echo the emitter.
#[derive(Default)]
pub struct Bytes(pub Vec<u8>);

impl Bytes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn i32(mut self, v: i32) -> Self {
        self.0.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn u32(mut self, v: u32) -> Self {
        self.0.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn u8(mut self, v: u8) -> Self {
        self.0.push(v);
        self
    }

    pub fn f32(mut self, v: f32) -> Self {
        self.0.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn str(self, s: &str) -> Self {
        self.i32(s.len() as i32).raw(s.as_bytes())
    }

    pub fn raw(mut self, bytes: &[u8]) -> Self {
        self.0.extend_from_slice(bytes);
        self
    }

    pub fn build(self) -> Vec<u8> {
        self.0
    }
}

pub struct FieldSet<'a> {
    pub bools: &'a [(&'a str, bool)],
    pub floats: &'a [(&'a str, f32)],
    pub ints: &'a [(&'a str, i32)],
    pub strings: &'a [(&'a str, &'a str)],
    pub extra: &'a [(&'a str, &'a [(&'a str, [i32; 3])])],
}

pub const NO_FIELDS: FieldSet<'static> = FieldSet {
    bools: &[],
    floats: &[],
    ints: &[],
    strings: &[],
    extra: &[],
};

/// One record with the given typed fields and no vectors, filenames or
/// instances.
pub fn record_bytes(
    record_type: i32,
    name: &str,
    string_id: &str,
    status: i32,
    fields: &FieldSet<'_>,
) -> Vec<u8> {
    let mut b = Bytes::new()
        .i32(0)
        .i32(record_type)
        .i32(7)
        .str(name)
        .str(string_id)
        .i32(status);

    b = b.i32(fields.bools.len() as i32);
    for (k, v) in fields.bools {
        b = b.str(k).u8(u8::from(*v));
    }
    b = b.i32(fields.floats.len() as i32);
    for (k, v) in fields.floats {
        b = b.str(k).f32(*v);
    }
    b = b.i32(fields.ints.len() as i32);
    for (k, v) in fields.ints {
        b = b.str(k).i32(*v);
    }
    // vec3, vec4
    b = b.i32(0).i32(0);
    b = b.i32(fields.strings.len() as i32);
    for (k, v) in fields.strings {
        b = b.str(k).str(v);
    }
    // filenames
    b = b.i32(0);
    b = b.i32(fields.extra.len() as i32);
    for (category, items) in fields.extra {
        b = b.str(category).i32(items.len() as i32);
        for (key, values) in *items {
            b = b.str(key).i32(values[0]).i32(values[1]).i32(values[2]);
        }
    }
    // instances
    b.i32(0).build()
}

pub fn v16_file(records: &[Vec<u8>]) -> Vec<u8> {
    let mut b = Bytes::new()
        .i32(16)
        .i32(3)
        .str("someone")
        .str("a test mod")
        .str("gamedata.base")
        .str("")
        .i32(0)
        .i32(records.len() as i32);
    for r in records {
        b = b.raw(r);
    }
    b.build()
}

pub fn v17_file(details: &[u8], records: &[Vec<u8>]) -> Vec<u8> {
    let mut b = Bytes::new()
        .i32(17)
        .i32(details.len() as i32)
        .i32(5)
        .raw(details)
        .i32(records.len() as i32);
    for r in records {
        b = b.raw(r);
    }
    b.build()
}

/// Status word of a record created by a format-17 file.
pub const NEW_V17: i32 = 0x20;
/// A format-17 "existing" record with change counter 2.
pub const EXISTING_V17: i32 = 0x21;
