use crate::error::ParseError;
use crate::formats::{FormatParser, ParseContext};
use crate::metadata::{AudioFormat, ParsedAudioMetadata};
use crate::prelude::*;
use crate::reader::WindowedReader;
use crate::tags::id3;

pub struct DsfParser;

impl FormatParser for DsfParser {
    fn format(&self) -> AudioFormat {
        AudioFormat::Dsf
    }

    fn can_parse(&self, header: &[u8], _name_hint: Option<&str>) -> bool {
        header.starts_with(b"DSD ")
    }

    fn parse(
        &self,
        reader: &mut WindowedReader,
        ctx: &mut ParseContext,
    ) -> Result<ParsedAudioMetadata> {
        let dsd = reader.read(0, 28)?;
        if dsd.len() < 28 || &dsd[..4] != b"DSD " {
            return Err(ParseError::invalid_header("missing DSD chunk").at_offset(0));
        }
        let mut out = ParsedAudioMetadata::new(AudioFormat::Dsf);

        let metadata_pointer = reader.read_u64_le(20)?;

        // fmt chunk follows the 28-byte DSD chunk.
        let fmt = reader.read(28, 12)?;
        if fmt.len() < 12 || &fmt[..4] != b"fmt " {
            return Err(ParseError::invalid_header("missing fmt chunk").at_offset(28));
        }
        let channels = reader.read_u32_le(52)?;
        let sample_rate = reader.read_u32_le(56)?;
        let bits_per_sample = reader.read_u32_le(60)?;
        let sample_count = reader.read_u64_le(64)?;

        out.core.channels = Some(channels);
        out.core.sample_rate = Some(sample_rate);
        out.core.bits_per_sample = Some(bits_per_sample);
        if sample_rate > 0 {
            out.core.length = Some(sample_count as f64 / f64::from(sample_rate));
            out.core.bitrate = Some(
                sample_rate
                    .saturating_mul(bits_per_sample)
                    .saturating_mul(channels),
            );
        }

        // The DSD chunk points at a trailing ID3v2 block, if any.
        if metadata_pointer != 0 && ctx.options.parse_tags {
            if let Err(err) = id3::parse_id3v2(reader, metadata_pointer, &mut out, ctx) {
                ctx.warn(format!("dsf metadata block unreadable: {}", err));
            }
        }
        Ok(out)
    }
}
