use crate::error::ParseError;
use crate::formats::{FormatParser, ParseContext};
use crate::metadata::{AudioFormat, ParsedAudioMetadata};
use crate::prelude::*;
use crate::reader::WindowedReader;
use crate::tags::ape;
use byteorder::{ByteOrder, LittleEndian};

/// A bare APEv2 tag stored as its own file: a header record at offset zero,
/// items, and usually a footer at the end.
pub struct ApeTagParser;

impl FormatParser for ApeTagParser {
    fn format(&self) -> AudioFormat {
        AudioFormat::ApeV2
    }

    fn can_parse(&self, header: &[u8], _name_hint: Option<&str>) -> bool {
        header.starts_with(b"APETAGEX")
    }

    fn parse(
        &self,
        reader: &mut WindowedReader,
        ctx: &mut ParseContext,
    ) -> Result<ParsedAudioMetadata> {
        let mut out = ParsedAudioMetadata::new(AudioFormat::ApeV2);

        if ape::parse_apev2_footer(reader, &mut out, ctx)? {
            return Ok(out);
        }

        // No footer: decode straight from the leading header record.
        let header = reader.read(0, 32)?;
        if header.len() < 32 || &header[..8] != b"APETAGEX" {
            return Err(ParseError::invalid_header("missing APETAGEX record").at_offset(0));
        }
        if !ctx.options.parse_tags {
            return Ok(out);
        }
        let size = LittleEndian::read_u32(&header[12..16]) as u64;
        let item_count = LittleEndian::read_u32(&header[16..20]);
        if size < 32 {
            return Err(ParseError::invalid_tag("apev2 header declares impossible size").at_offset(12));
        }
        let region = reader.read(32, (size - 32) as usize)?;
        ape::decode_items(&region, item_count.min(512), &mut out, ctx);
        Ok(out)
    }
}
