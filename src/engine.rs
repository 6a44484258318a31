use crate::error::ParseError;
use crate::formats::ParseContext;
use crate::metadata::ParsedAudioMetadata;
use crate::options::ParseOptions;
use crate::prelude::*;
use crate::reader::WindowedReader;
use crate::registry::ParserRegistry;
use crate::source::{ByteSource, FileSource, MemorySource};
use parking_lot::{Condvar, Mutex};
use std::io::Read;
use std::path::Path;

/// Length of the prefix handed to the format probe.
const PROBE_PREFIX_LEN: usize = 4096;

/// The parsing engine: a value object wrapping the parser registry and a
/// permit pool. Multiple engines may coexist with independent option sets;
/// there is no global state.
pub struct MetadataEngine {
    options: ParseOptions,
    registry: ParserRegistry,
    permits: PermitPool,
}

impl MetadataEngine {
    pub fn new() -> Self {
        Self::with_options(ParseOptions::new())
    }

    pub fn with_options(options: ParseOptions) -> Self {
        let registry = ParserRegistry::with_default_parsers(&options);
        let permits = PermitPool::new(options.max_concurrent_tasks.max(1));
        MetadataEngine {
            options,
            registry,
            permits,
        }
    }

    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    pub fn parse_file<P: AsRef<Path>>(&self, path: P) -> Result<ParsedAudioMetadata> {
        let source = FileSource::open(path)?;
        self.parse_source(Box::new(source))
    }

    pub fn parse_bytes(
        &self,
        data: Vec<u8>,
        name_hint: Option<&str>,
    ) -> Result<ParsedAudioMetadata> {
        let source = MemorySource::new(data, name_hint.map(str::to_owned));
        self.parse_source(Box::new(source))
    }

    /// Parse a forward-only stream by draining it into memory first.
    pub fn parse_stream<R: Read>(
        &self,
        stream: R,
        name_hint: Option<&str>,
    ) -> Result<ParsedAudioMetadata> {
        let source = MemorySource::from_stream(stream, name_hint.map(str::to_owned))?;
        self.parse_source(Box::new(source))
    }

    fn parse_source(&self, source: Box<dyn ByteSource>) -> Result<ParsedAudioMetadata> {
        let _permit = self.permits.acquire();

        let name_hint = source.name_hint().map(str::to_owned);
        let mut reader = WindowedReader::new(source, &self.options);
        let header = reader.read(0, PROBE_PREFIX_LEN)?;

        let parser = self
            .registry
            .resolve(&header, name_hint.as_deref())
            .ok_or_else(|| {
                ParseError::unsupported_format("no parser accepted the input")
                    .with_context("name_hint", name_hint.clone().unwrap_or_default())
            })?;
        log::debug!(
            "resolved parser {} for {:?}",
            parser.format(),
            name_hint.as_deref().unwrap_or("<unnamed>")
        );

        let mut ctx = ParseContext::new(&self.options, name_hint);
        let mut result = parser.parse(&mut reader, &mut ctx)?;
        result.diagnostics.parser_name = parser.format().name().to_owned();
        result.diagnostics.bytes_read = reader.bytes_read();
        result.diagnostics.warnings.append(&mut ctx.warnings);
        result.diagnostics.context.extend(ctx.context);
        Ok(result)
    }
}

impl Default for MetadataEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Counting semaphore with FIFO waiters. Every top-level parse holds one
/// permit for its full duration; the RAII guard releases on every exit path.
struct PermitPool {
    state: Mutex<PoolState>,
    available_cv: Condvar,
}

struct PoolState {
    available: usize,
    next_ticket: u64,
    now_serving: u64,
}

impl PermitPool {
    fn new(permits: usize) -> Self {
        PermitPool {
            state: Mutex::new(PoolState {
                available: permits,
                next_ticket: 0,
                now_serving: 0,
            }),
            available_cv: Condvar::new(),
        }
    }

    fn acquire(&self) -> Permit<'_> {
        let mut state = self.state.lock();
        let ticket = state.next_ticket;
        state.next_ticket += 1;
        while state.now_serving != ticket || state.available == 0 {
            self.available_cv.wait(&mut state);
        }
        state.available -= 1;
        state.now_serving += 1;
        drop(state);
        // The next ticket holder may already be eligible.
        self.available_cv.notify_all();
        Permit { pool: self }
    }
}

struct Permit<'a> {
    pool: &'a PermitPool,
}

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        let mut state = self.pool.state.lock();
        state.available += 1;
        drop(state);
        self.pool.available_cv.notify_all();
    }
}
