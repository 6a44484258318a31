use crate::options::ParseOptions;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;

/// Closed enumeration of recognised container/codec formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AudioFormat {
    Mp3,
    Id3,
    Flac,
    Mp4,
    M4a,
    Wave,
    Aiff,
    Asf,
    ApeV2,
    Musepack,
    WavPack,
    Tak,
    Dsf,
    Dsdiff,
    Aac,
    Ac3,
    Eac3,
    Ogg,
    OggVorbis,
    OggOpus,
    OggSpeex,
    OggTheora,
    OggFlac,
    TrueAudio,
    OptimFrog,
    Smf,
    MonkeysAudio,
    Unknown,
}

impl AudioFormat {
    pub fn name(&self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "mp3",
            AudioFormat::Id3 => "id3",
            AudioFormat::Flac => "flac",
            AudioFormat::Mp4 => "mp4",
            AudioFormat::M4a => "m4a",
            AudioFormat::Wave => "wave",
            AudioFormat::Aiff => "aiff",
            AudioFormat::Asf => "asf",
            AudioFormat::ApeV2 => "apev2",
            AudioFormat::Musepack => "musepack",
            AudioFormat::WavPack => "wavpack",
            AudioFormat::Tak => "tak",
            AudioFormat::Dsf => "dsf",
            AudioFormat::Dsdiff => "dsdiff",
            AudioFormat::Aac => "aac",
            AudioFormat::Ac3 => "ac3",
            AudioFormat::Eac3 => "eac3",
            AudioFormat::Ogg => "ogg",
            AudioFormat::OggVorbis => "ogg_vorbis",
            AudioFormat::OggOpus => "ogg_opus",
            AudioFormat::OggSpeex => "ogg_speex",
            AudioFormat::OggTheora => "ogg_theora",
            AudioFormat::OggFlac => "ogg_flac",
            AudioFormat::TrueAudio => "true_audio",
            AudioFormat::OptimFrog => "optimfrog",
            AudioFormat::Smf => "smf",
            AudioFormat::MonkeysAudio => "monkeys_audio",
            AudioFormat::Unknown => "unknown",
        }
    }

    /// Lowercase file extensions associated with the format, most common
    /// first. Used only as a probe heuristic, never as proof.
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            AudioFormat::Mp3 => &["mp3"],
            AudioFormat::Id3 => &["id3"],
            AudioFormat::Flac => &["flac"],
            AudioFormat::Mp4 => &["mp4", "m4v"],
            AudioFormat::M4a => &["m4a", "m4b", "m4p"],
            AudioFormat::Wave => &["wav", "wave"],
            AudioFormat::Aiff => &["aiff", "aif", "aifc"],
            AudioFormat::Asf => &["wma", "asf", "wmv"],
            AudioFormat::ApeV2 => &[],
            AudioFormat::Musepack => &["mpc", "mp+", "mpp"],
            AudioFormat::WavPack => &["wv"],
            AudioFormat::Tak => &["tak"],
            AudioFormat::Dsf => &["dsf"],
            AudioFormat::Dsdiff => &["dff", "dsdiff"],
            AudioFormat::Aac => &["aac", "adts"],
            AudioFormat::Ac3 => &["ac3"],
            AudioFormat::Eac3 => &["eac3", "ec3"],
            AudioFormat::Ogg => &["ogg", "oga", "ogx"],
            AudioFormat::OggVorbis => &["ogg", "oga"],
            AudioFormat::OggOpus => &["opus"],
            AudioFormat::OggSpeex => &["spx"],
            AudioFormat::OggTheora => &["oggtheora", "ogv"],
            AudioFormat::OggFlac => &["oggflac"],
            AudioFormat::TrueAudio => &["tta"],
            AudioFormat::OptimFrog => &["ofr", "ofs"],
            AudioFormat::Smf => &["mid", "midi", "smf"],
            AudioFormat::MonkeysAudio => &["ape", "apl"],
            AudioFormat::Unknown => &[],
        }
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Core audio parameters. Every field is independently optional; a parser
/// leaves unset whatever the container does not expose.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AudioCoreInfo {
    /// Duration in seconds.
    pub length: Option<f64>,
    /// Bits per second.
    pub bitrate: Option<u32>,
    /// Sample rate in Hz.
    pub sample_rate: Option<u32>,
    pub channels: Option<u32>,
    pub bits_per_sample: Option<u32>,
}

/// A decoded tag value.
///
/// Text values are always a list so that multi-value tags (Vorbis, ID3v2.4)
/// keep their shape; single-value tags carry a one-element list.
#[derive(Debug, Clone, PartialEq)]
pub enum TagValue {
    Text(Vec<String>),
    Int(i64),
    Double(f64),
    Bool(bool),
    Binary(BinaryDigest),
}

impl TagValue {
    /// Single-value text convenience.
    pub fn text(value: impl Into<String>) -> Self {
        TagValue::Text(vec![value.into()])
    }
}

/// Canonical representation of an embedded binary payload.
///
/// The SHA-256 is always computed; the payload itself is embedded only when
/// the options allow it and the payload fits under the configured ceiling.
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryDigest {
    /// Byte count of the decoded payload.
    pub size: u64,
    pub mime: Option<String>,
    /// Lowercase hex SHA-256 of the payload.
    pub sha256: String,
    pub data: Option<Vec<u8>>,
}

impl BinaryDigest {
    pub fn from_payload(payload: &[u8], mime: Option<String>, options: &ParseOptions) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(payload);
        let sha256 = hex::encode(hasher.finalize());
        let data = if options.include_binary_data && payload.len() <= options.max_binary_tag_bytes
        {
            Some(payload.to_vec())
        } else {
            None
        };
        BinaryDigest {
            size: payload.len() as u64,
            mime,
            sha256,
            data,
        }
    }
}

/// Bookkeeping about a single parse run.
#[derive(Debug, Clone, Default)]
pub struct ParserDiagnostics {
    pub parser_name: String,
    /// Bytes fetched from the underlying source, not bytes served from the
    /// reader's cached window.
    pub bytes_read: u64,
    pub warnings: Vec<String>,
    pub context: HashMap<String, String>,
}

/// The normalized result of a parse.
#[derive(Debug, Clone)]
pub struct ParsedAudioMetadata {
    pub format: AudioFormat,
    pub core: AudioCoreInfo,
    /// Tag vocabulary entries, keys preserved verbatim from the source
    /// (Vorbis keys uppercased, composite `FRAME:<desc>` keys synthesized
    /// for described ID3 frames).
    pub tags: HashMap<String, TagValue>,
    /// Format-specific supplementary fields (`bitrate_mode`, `mpeg_version`,
    /// `encoder_info`, `bsid`, `tracks`, `total_samples`, `version`,
    /// `stream_version`, `profile`, `flac_metadata_truncated`).
    pub extensions: HashMap<String, TagValue>,
    pub diagnostics: ParserDiagnostics,
}

impl ParsedAudioMetadata {
    pub fn new(format: AudioFormat) -> Self {
        ParsedAudioMetadata {
            format,
            core: AudioCoreInfo::default(),
            tags: HashMap::new(),
            extensions: HashMap::new(),
            diagnostics: ParserDiagnostics::default(),
        }
    }

    pub fn set_tag(&mut self, key: impl Into<String>, value: TagValue) {
        self.tags.insert(key.into(), value);
    }

    /// Append one value to a (possibly multi-value) text tag, creating the
    /// tag when absent. A non-text value under the same key is replaced.
    pub fn push_text_tag(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let entry = self
            .tags
            .entry(key.into())
            .or_insert_with(|| TagValue::Text(Vec::new()));
        match entry {
            TagValue::Text(values) => values.push(value.into()),
            other => *other = TagValue::text(value),
        }
    }

    pub fn set_extension(&mut self, key: impl Into<String>, value: TagValue) {
        self.extensions.insert(key.into(), value);
    }
}
