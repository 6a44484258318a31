use crate::error::ParseError;
use crate::formats::{FormatParser, ParseContext};
use crate::metadata::{AudioFormat, ParsedAudioMetadata};
use crate::prelude::*;
use crate::reader::WindowedReader;

/// Identity check only; the OptimFROG header layout is proprietary.
pub struct OptimFrogParser;

impl FormatParser for OptimFrogParser {
    fn format(&self) -> AudioFormat {
        AudioFormat::OptimFrog
    }

    fn can_parse(&self, header: &[u8], _name_hint: Option<&str>) -> bool {
        header.starts_with(b"OFR ")
    }

    fn parse(
        &self,
        reader: &mut WindowedReader,
        _ctx: &mut ParseContext,
    ) -> Result<ParsedAudioMetadata> {
        let magic = reader.read(0, 4)?;
        if magic != b"OFR " {
            return Err(ParseError::invalid_header("missing OFR magic").at_offset(0));
        }
        Ok(ParsedAudioMetadata::new(AudioFormat::OptimFrog))
    }
}
