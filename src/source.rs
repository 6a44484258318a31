use crate::prelude::*;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

/// Abstract random-access byte provider with optional length and name hint.
///
/// One source is created per top-level parse and discarded with it. A read
/// returns at most `len` bytes from `offset`, or fewer if the source ends;
/// zero-length requests return empty without touching the underlying I/O.
pub trait ByteSource: Send {
    /// Total size in bytes, when known.
    fn len(&self) -> Option<u64>;

    /// Filename hint used by extension heuristics.
    fn name_hint(&self) -> Option<&str> {
        None
    }

    fn read_at(&mut self, offset: u64, len: usize) -> Result<Vec<u8>>;
}

/// Positional reads against an open file handle. The handle is closed when
/// the source is dropped.
pub struct FileSource {
    file: File,
    len: u64,
    name: Option<String>,
}

impl FileSource {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let len = file.metadata()?.len();
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned());
        Ok(FileSource { file, len, name })
    }
}

impl ByteSource for FileSource {
    fn len(&self) -> Option<u64> {
        Some(self.len)
    }

    fn name_hint(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn read_at(&mut self, offset: u64, len: usize) -> Result<Vec<u8>> {
        if len == 0 || offset >= self.len {
            return Ok(Vec::new());
        }
        self.file.seek(SeekFrom::Start(offset))?;
        let mut buf = Vec::with_capacity(len.min((self.len - offset) as usize));
        std::io::copy(&mut (&mut self.file).take(len as u64), &mut buf)?;
        Ok(buf)
    }
}

/// Serves slices of a pre-supplied buffer; never fails.
pub struct MemorySource {
    data: Vec<u8>,
    name: Option<String>,
}

impl MemorySource {
    pub fn new(data: Vec<u8>, name: Option<String>) -> Self {
        MemorySource { data, name }
    }

    /// Eagerly drain a forward-only stream into memory, reducing stream
    /// parsing to buffered parsing.
    pub fn from_stream<R: Read>(mut stream: R, name: Option<String>) -> Result<Self> {
        let mut data = Vec::new();
        stream.read_to_end(&mut data)?;
        Ok(MemorySource { data, name })
    }
}

impl ByteSource for MemorySource {
    fn len(&self) -> Option<u64> {
        Some(self.data.len() as u64)
    }

    fn name_hint(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn read_at(&mut self, offset: u64, len: usize) -> Result<Vec<u8>> {
        if len == 0 || offset >= self.data.len() as u64 {
            return Ok(Vec::new());
        }
        let start = offset as usize;
        let end = start.saturating_add(len).min(self.data.len());
        Ok(self.data[start..end].to_vec())
    }
}
