use crate::error::ParseError;
use crate::formats::{FormatParser, ParseContext};
use crate::metadata::{AudioFormat, ParsedAudioMetadata};
use crate::prelude::*;
use crate::reader::WindowedReader;
use crate::tags::ape;

/// TAK stream info is bit-packed and versioned; only the container identity
/// and the trailing APEv2 tag are recovered here.
pub struct TakParser;

impl FormatParser for TakParser {
    fn format(&self) -> AudioFormat {
        AudioFormat::Tak
    }

    fn can_parse(&self, header: &[u8], _name_hint: Option<&str>) -> bool {
        header.starts_with(b"tBaK")
    }

    fn parse(
        &self,
        reader: &mut WindowedReader,
        ctx: &mut ParseContext,
    ) -> Result<ParsedAudioMetadata> {
        let magic = reader.read(0, 4)?;
        if magic != b"tBaK" {
            return Err(ParseError::invalid_header("missing tBaK magic").at_offset(0));
        }
        let mut out = ParsedAudioMetadata::new(AudioFormat::Tak);
        ape::recover_footer(reader, &mut out, ctx);
        Ok(out)
    }
}
