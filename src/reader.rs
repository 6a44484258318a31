use crate::error::ParseError;
use crate::options::ParseOptions;
use crate::prelude::*;
use crate::source::{ByteSource, MemorySource};
use byteorder::{BigEndian, ByteOrder, LittleEndian};

/// Random-access reader over a [`ByteSource`] with a single cached window.
///
/// Parsers walk containers roughly linearly but also jump around to read a
/// chunk header and then its body; one window the size of a typical metadata
/// block amortises the I/O without the complexity of a general cache. The
/// window is replaced wholesale by any read whose range it does not fully
/// contain.
pub struct WindowedReader {
    source: Box<dyn ByteSource>,
    window_offset: u64,
    window: Vec<u8>,
    bytes_read: u64,
    window_size: usize,
    max_read_bytes: usize,
}

impl WindowedReader {
    pub fn new(source: Box<dyn ByteSource>, options: &ParseOptions) -> Self {
        WindowedReader {
            source,
            window_offset: 0,
            window: Vec::new(),
            bytes_read: 0,
            window_size: options.window_size.max(ParseOptions::MIN_WINDOW_SIZE),
            max_read_bytes: options.max_read_bytes.max(ParseOptions::MIN_MAX_READ_BYTES),
        }
    }

    /// Sub-reader over an owned byte slice. Format parsers use this to
    /// re-parse an embedded tag block (an `ID3 ` chunk body, a DSF metadata
    /// region) through the same tag parsers that run against whole files.
    pub fn from_bytes(data: Vec<u8>, options: &ParseOptions) -> Self {
        Self::new(Box::new(MemorySource::new(data, None)), options)
    }

    /// Total source size, when the source knows it.
    pub fn source_len(&self) -> Option<u64> {
        self.source.len()
    }

    pub fn name_hint(&self) -> Option<&str> {
        self.source.name_hint()
    }

    /// Bytes fetched from the underlying source so far. Monotonically
    /// increasing; reads served from the cached window do not move it.
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// Read up to `len` bytes at `offset`. Returns fewer bytes when the
    /// source ends early; callers that require the full count use
    /// [`read_exact`](Self::read_exact).
    pub fn read(&mut self, offset: u64, len: usize) -> Result<Vec<u8>> {
        if len == 0 {
            return Ok(Vec::new());
        }
        let end = offset.checked_add(len as u64).ok_or_else(|| {
            ParseError::io("read range overflows u64").at_offset(offset)
        })?;

        // Window hit: serve the slice without touching the source.
        let window_end = self.window_offset + self.window.len() as u64;
        if offset >= self.window_offset && end <= window_end {
            let start = (offset - self.window_offset) as usize;
            return Ok(self.window[start..start + len].to_vec());
        }

        if len > self.max_read_bytes {
            return Err(ParseError::io("read request exceeds configured limit")
                .at_offset(offset)
                .with_context("requested", len.to_string())
                .with_context("max_read_bytes", self.max_read_bytes.to_string()));
        }

        let fetch = len.max(self.window_size);
        let data = self.source.read_at(offset, fetch)?;
        self.bytes_read += data.len() as u64;
        self.window_offset = offset;
        self.window = data;

        let served = len.min(self.window.len());
        Ok(self.window[..served].to_vec())
    }

    /// Read exactly `len` bytes at `offset`, failing on a short read.
    pub fn read_exact(&mut self, offset: u64, len: usize) -> Result<Vec<u8>> {
        let data = self.read(offset, len)?;
        if data.len() < len {
            return Err(ParseError::truncated("unexpected end of data")
                .at_offset(offset)
                .with_context("requested", len.to_string())
                .with_context("available", data.len().to_string()));
        }
        Ok(data)
    }

    pub fn read_u8(&mut self, offset: u64) -> Result<u8> {
        Ok(self.read_exact(offset, 1)?[0])
    }

    pub fn read_u16_le(&mut self, offset: u64) -> Result<u16> {
        Ok(LittleEndian::read_u16(&self.read_exact(offset, 2)?))
    }

    pub fn read_u16_be(&mut self, offset: u64) -> Result<u16> {
        Ok(BigEndian::read_u16(&self.read_exact(offset, 2)?))
    }

    pub fn read_u24_be(&mut self, offset: u64) -> Result<u32> {
        Ok(BigEndian::read_u24(&self.read_exact(offset, 3)?))
    }

    pub fn read_u32_le(&mut self, offset: u64) -> Result<u32> {
        Ok(LittleEndian::read_u32(&self.read_exact(offset, 4)?))
    }

    pub fn read_u32_be(&mut self, offset: u64) -> Result<u32> {
        Ok(BigEndian::read_u32(&self.read_exact(offset, 4)?))
    }

    pub fn read_u64_le(&mut self, offset: u64) -> Result<u64> {
        Ok(LittleEndian::read_u64(&self.read_exact(offset, 8)?))
    }

    pub fn read_u64_be(&mut self, offset: u64) -> Result<u64> {
        Ok(BigEndian::read_u64(&self.read_exact(offset, 8)?))
    }

    /// Exact-length ASCII read; bytes outside ASCII come through lossily.
    pub fn read_ascii(&mut self, offset: u64, len: usize) -> Result<String> {
        let data = self.read_exact(offset, len)?;
        Ok(String::from_utf8_lossy(&data).into_owned())
    }
}
