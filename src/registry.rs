use crate::formats::{self, FormatParser};
use crate::options::ParseOptions;
use crate::probe::probe;

/// Fixed, ordered list of format parsers.
///
/// Order matters only for the fallback path: when no probe candidate is
/// willing, the first parser in registration order whose `can_parse` accepts
/// wins. The always-accepting signature parser sits last.
pub struct ParserRegistry {
    parsers: Vec<Box<dyn FormatParser>>,
}

impl ParserRegistry {
    pub fn with_default_parsers(options: &ParseOptions) -> Self {
        let mut parsers: Vec<Box<dyn FormatParser>> = vec![
            Box::new(formats::mp3::Mp3Parser),
            Box::new(formats::id3file::Id3FileParser),
            Box::new(formats::flac::FlacParser),
            Box::new(formats::ogg::OggParser),
            Box::new(formats::mp4::Mp4Parser),
            Box::new(formats::wave::WaveParser),
            Box::new(formats::aiff::AiffParser),
            Box::new(formats::asf::AsfParser),
            Box::new(formats::aac::AacParser),
            Box::new(formats::ac3::Ac3Parser),
            Box::new(formats::wavpack::WavPackParser),
            Box::new(formats::musepack::MusepackParser),
            Box::new(formats::tak::TakParser),
            Box::new(formats::dsf::DsfParser),
            Box::new(formats::dsdiff::DsdiffParser),
            Box::new(formats::tta::TrueAudioParser),
            Box::new(formats::optimfrog::OptimFrogParser),
            Box::new(formats::smf::SmfParser),
            Box::new(formats::monkey::MonkeysAudioParser),
            Box::new(formats::apetag::ApeTagParser),
        ];
        if options.allow_heuristic_fallback {
            parsers.push(Box::new(formats::fallback::FallbackParser));
        }
        ParserRegistry { parsers }
    }

    /// Resolve a parser for the given header prefix and filename hint.
    ///
    /// Probe candidates are tried in score order; each one must both match a
    /// registered parser's format and survive that parser's own `can_parse`.
    /// When every candidate falls through, registration order decides.
    pub fn resolve(&self, header: &[u8], name_hint: Option<&str>) -> Option<&dyn FormatParser> {
        for candidate in probe(header, name_hint) {
            let hit = self
                .parsers
                .iter()
                .find(|p| p.format() == candidate.format && p.can_parse(header, name_hint));
            if let Some(parser) = hit {
                return Some(parser.as_ref());
            }
        }
        self.parsers
            .iter()
            .find(|p| p.can_parse(header, name_hint))
            .map(|p| p.as_ref())
    }
}
