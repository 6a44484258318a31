use crate::formats::{FormatParser, ParseContext};
use crate::metadata::{AudioFormat, ParsedAudioMetadata};
use crate::prelude::*;
use crate::reader::WindowedReader;
use crate::tags::{ape, id3};

/// Last-resort parser: accepts anything, identifies nothing, and salvages
/// whatever ID3v2/APEv2 tags happen to surround the unknown payload.
pub struct FallbackParser;

impl FormatParser for FallbackParser {
    fn format(&self) -> AudioFormat {
        AudioFormat::Unknown
    }

    fn can_parse(&self, _header: &[u8], _name_hint: Option<&str>) -> bool {
        true
    }

    fn parse(
        &self,
        reader: &mut WindowedReader,
        ctx: &mut ParseContext,
    ) -> Result<ParsedAudioMetadata> {
        let mut out = ParsedAudioMetadata::new(AudioFormat::Unknown);
        if let Err(err) = id3::parse_id3v2(reader, 0, &mut out, ctx) {
            ctx.warn(format!("leading id3v2 tag unreadable: {}", err));
        }
        ape::recover_footer(reader, &mut out, ctx);
        Ok(out)
    }
}
