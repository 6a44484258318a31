/// Options to control how the engine parses a file.
///
/// All fields have defaults; setters apply the documented floors so a
/// mis-sized value can never break the reader invariants.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub struct ParseOptions {
    pub(crate) window_size: usize,
    pub(crate) parse_tags: bool,
    pub(crate) strict_mode: bool,
    pub(crate) max_read_bytes: usize,
    pub(crate) include_binary_data: bool,
    pub(crate) max_binary_tag_bytes: usize,
    pub(crate) allow_heuristic_fallback: bool,
    pub(crate) max_concurrent_tasks: usize,
}

impl ParseOptions {
    /// Target size of the reader's cached window.
    pub const DEFAULT_WINDOW_SIZE: usize = 64 * 1024;
    pub const MIN_WINDOW_SIZE: usize = 4096;

    /// Hard cap on a single read request to the reader.
    pub const DEFAULT_MAX_READ_BYTES: usize = 16 * 1024 * 1024;
    pub const MIN_MAX_READ_BYTES: usize = 256 * 1024;

    /// Maximum payload size eligible for embedding next to its digest.
    pub const DEFAULT_MAX_BINARY_TAG_BYTES: usize = 8 * 1024 * 1024;

    pub fn new() -> Self {
        Self {
            window_size: Self::DEFAULT_WINDOW_SIZE,
            parse_tags: true,
            strict_mode: false,
            max_read_bytes: Self::DEFAULT_MAX_READ_BYTES,
            include_binary_data: false,
            max_binary_tag_bytes: Self::DEFAULT_MAX_BINARY_TAG_BYTES,
            allow_heuristic_fallback: true,
            max_concurrent_tasks: default_concurrency(),
        }
    }

    pub fn window_size(&mut self, window_size: usize) -> Self {
        self.window_size = window_size.max(Self::MIN_WINDOW_SIZE);
        *self
    }

    /// Whether tag vocabularies are decoded at all.
    ///
    /// When disabled, parsers still walk tag blocks far enough to know their
    /// size (required to locate the audio data behind them) but emit nothing.
    pub fn parse_tags(&mut self, parse_tags: bool) -> Self {
        self.parse_tags = parse_tags;
        *self
    }

    /// Promote recoverable warnings to errors where a parser supports it.
    pub fn strict_mode(&mut self, strict_mode: bool) -> Self {
        self.strict_mode = strict_mode;
        *self
    }

    pub fn max_read_bytes(&mut self, max_read_bytes: usize) -> Self {
        self.max_read_bytes = max_read_bytes.max(Self::MIN_MAX_READ_BYTES);
        *self
    }

    /// Embed binary payload bytes alongside their digest.
    pub fn include_binary_data(&mut self, include_binary_data: bool) -> Self {
        self.include_binary_data = include_binary_data;
        *self
    }

    pub fn max_binary_tag_bytes(&mut self, max_binary_tag_bytes: usize) -> Self {
        self.max_binary_tag_bytes = max_binary_tag_bytes;
        *self
    }

    /// Permit the last-resort parser that accepts anything and recovers
    /// whatever ID3/APE tags it can.
    pub fn allow_heuristic_fallback(&mut self, allow_heuristic_fallback: bool) -> Self {
        self.allow_heuristic_fallback = allow_heuristic_fallback;
        *self
    }

    /// Number of permits in the engine's pool.
    pub fn max_concurrent_tasks(&mut self, max_concurrent_tasks: usize) -> Self {
        self.max_concurrent_tasks = max_concurrent_tasks.max(1);
        *self
    }
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self::new()
    }
}

fn default_concurrency() -> usize {
    let cpus = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    cpus.min(4).max(1)
}
