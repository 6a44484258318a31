use crate::error::ParseError;
use crate::formats::{FormatParser, ParseContext};
use crate::metadata::{AudioFormat, ParsedAudioMetadata};
use crate::prelude::*;
use crate::reader::WindowedReader;
use crate::tags::id3;

/// A detached ID3v2 tag stored as its own file (the `.id3` sidecar case).
pub struct Id3FileParser;

impl FormatParser for Id3FileParser {
    fn format(&self) -> AudioFormat {
        AudioFormat::Id3
    }

    fn can_parse(&self, header: &[u8], _name_hint: Option<&str>) -> bool {
        header.starts_with(b"ID3")
    }

    fn parse(
        &self,
        reader: &mut WindowedReader,
        ctx: &mut ParseContext,
    ) -> Result<ParsedAudioMetadata> {
        let mut out = ParsedAudioMetadata::new(AudioFormat::Id3);
        if id3::parse_id3v2(reader, 0, &mut out, ctx)?.is_none() {
            return Err(ParseError::invalid_header("missing ID3 magic").at_offset(0));
        }
        Ok(out)
    }
}
