use std::io::{self, Read, Seek, SeekFrom};

use byteorder::{LittleEndian, ReadBytesExt};
use indexmap::IndexMap;

pub struct LittleEndianReader<R> {
    inner: R,
}

impl<R: Read + Seek> LittleEndianReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    pub fn read_u8(&mut self) -> io::Result<u8> {
        self.inner.read_u8()
    }

    /// A single byte; any non-zero value reads as `true`.
    pub fn read_bool(&mut self) -> io::Result<bool> {
        Ok(self.inner.read_u8()? != 0)
    }

    pub fn read_i32(&mut self) -> io::Result<i32> {
        self.inner.read_i32::<LittleEndian>()
    }

    pub fn read_u32(&mut self) -> io::Result<u32> {
        self.inner.read_u32::<LittleEndian>()
    }

    pub fn read_f32(&mut self) -> io::Result<f32> {
        self.inner.read_f32::<LittleEndian>()
    }

    pub fn read_f32_array<const N: usize>(&mut self) -> io::Result<[f32; N]> {
        let mut result = [0f32; N];
        for item in &mut result {
            *item = self.read_f32()?;
        }
        Ok(result)
    }

    pub fn read_i32_array<const N: usize>(&mut self) -> io::Result<[i32; N]> {
        let mut result = [0i32; N];
        for item in &mut result {
            *item = self.read_i32()?;
        }
        Ok(result)
    }

    pub fn read_bytes(&mut self, n: usize) -> io::Result<Vec<u8>> {
        let remaining = self.remaining()?;
        if n as u64 > remaining {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("need {n} bytes, only {remaining} remain"),
            ));
        }
        let mut buf = vec![0u8; n];
        self.inner.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// Reads an `i32` element count, rejecting negative values.
    pub fn read_count(&mut self, what: &str) -> io::Result<usize> {
        let count = self.read_i32()?;
        usize::try_from(count).map_err(|_| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("negative {what} count {count}"),
            )
        })
    }

    /// `int32 byteLength` followed by that many UTF-8 bytes, no terminator.
    pub fn read_string(&mut self) -> io::Result<String> {
        let len = self.read_count("string length")?;
        let bytes = self.read_bytes(len)?;
        String::from_utf8(bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    /// `int32 count` followed by `count` (string key, value) pairs. A repeated
    /// key keeps its first position and takes the last value.
    pub fn read_map<T>(
        &mut self,
        mut read_value: impl FnMut(&mut Self) -> io::Result<T>,
    ) -> io::Result<IndexMap<String, T>> {
        let count = self.read_count("map entry")?;
        let mut map = IndexMap::with_capacity(count.min(1024));
        for _ in 0..count {
            let key = self.read_string()?;
            let value = read_value(self)?;
            map.insert(key, value);
        }
        Ok(map)
    }

    pub fn position(&mut self) -> io::Result<u64> {
        self.inner.stream_position()
    }

    pub fn seek_to(&mut self, pos: u64) -> io::Result<()> {
        self.inner.seek(SeekFrom::Start(pos))?;
        Ok(())
    }

    pub fn len(&mut self) -> io::Result<u64> {
        let cur = self.position()?;
        let end = self.inner.seek(SeekFrom::End(0))?;
        self.inner.seek(SeekFrom::Start(cur))?;
        Ok(end)
    }

    pub fn is_empty(&mut self) -> io::Result<bool> {
        Ok(self.len()? == 0)
    }

    pub fn remaining(&mut self) -> io::Result<u64> {
        let cur = self.position()?;
        Ok(self.len()?.saturating_sub(cur))
    }
}
