use std::io::{self, Write};

use byteorder::{LittleEndian, WriteBytesExt};
use indexmap::IndexMap;

pub struct LittleEndianWriter<W> {
    inner: W,
}

impl<W: Write> LittleEndianWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }

    pub fn write_u8(&mut self, v: u8) -> io::Result<()> {
        self.inner.write_u8(v)
    }

    pub fn write_bool(&mut self, v: bool) -> io::Result<()> {
        self.inner.write_u8(u8::from(v))
    }

    pub fn write_i32(&mut self, v: i32) -> io::Result<()> {
        self.inner.write_i32::<LittleEndian>(v)
    }

    pub fn write_u32(&mut self, v: u32) -> io::Result<()> {
        self.inner.write_u32::<LittleEndian>(v)
    }

    pub fn write_f32(&mut self, v: f32) -> io::Result<()> {
        self.inner.write_f32::<LittleEndian>(v)
    }

    pub fn write_f32_slice(&mut self, values: &[f32]) -> io::Result<()> {
        for &v in values {
            self.write_f32(v)?;
        }
        Ok(())
    }

    pub fn write_i32_slice(&mut self, values: &[i32]) -> io::Result<()> {
        for &v in values {
            self.write_i32(v)?;
        }
        Ok(())
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.inner.write_all(bytes)
    }

    pub fn write_count(&mut self, count: usize, what: &str) -> io::Result<()> {
        let raw = i32::try_from(count).map_err(|_| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{what} count {count} does not fit in int32"),
            )
        })?;
        self.write_i32(raw)
    }

    pub fn write_string(&mut self, s: &str) -> io::Result<()> {
        self.write_count(s.len(), "string length")?;
        self.inner.write_all(s.as_bytes())
    }

    pub fn write_map<T>(
        &mut self,
        map: &IndexMap<String, T>,
        mut write_value: impl FnMut(&mut Self, &T) -> io::Result<()>,
    ) -> io::Result<()> {
        self.write_count(map.len(), "map entry")?;
        for (key, value) in map {
            self.write_string(key)?;
            write_value(self, value)?;
        }
        Ok(())
    }
}
