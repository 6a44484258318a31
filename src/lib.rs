//! Structural and descriptive metadata extraction for audio files.
//!
//! Feed a path, a byte buffer or a stream to [`MetadataEngine`] and get back
//! the container format, core audio parameters and decoded tag vocabularies
//! (ID3v2, APEv2, Vorbis comments, MP4 `ilst`, ASF content description).
//! Audio samples are never decoded and nothing is ever written back.

pub mod engine;
pub mod error;
pub mod formats;
pub mod metadata;
pub mod options;
pub mod prelude;
pub mod probe;
pub mod reader;
pub mod registry;
pub mod source;
pub mod tags;

pub use engine::MetadataEngine;
pub use error::{ErrorKind, ParseError};
pub use metadata::{
    AudioCoreInfo, AudioFormat, BinaryDigest, ParsedAudioMetadata, ParserDiagnostics, TagValue,
};
pub use options::ParseOptions;
pub use source::{ByteSource, FileSource, MemorySource};
