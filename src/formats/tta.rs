use crate::error::ParseError;
use crate::formats::{FormatParser, ParseContext};
use crate::metadata::{AudioFormat, ParsedAudioMetadata};
use crate::prelude::*;
use crate::reader::WindowedReader;
use crate::tags::{ape, id3};

pub struct TrueAudioParser;

impl FormatParser for TrueAudioParser {
    fn format(&self) -> AudioFormat {
        AudioFormat::TrueAudio
    }

    fn can_parse(&self, header: &[u8], _name_hint: Option<&str>) -> bool {
        header.starts_with(b"TTA1") || header.starts_with(b"ID3")
    }

    fn parse(
        &self,
        reader: &mut WindowedReader,
        ctx: &mut ParseContext,
    ) -> Result<ParsedAudioMetadata> {
        let mut out = ParsedAudioMetadata::new(AudioFormat::TrueAudio);

        let mut offset = 0u64;
        if let Some(tag_size) = id3::parse_id3v2(reader, 0, &mut out, ctx)? {
            offset = tag_size;
        }

        let header = reader.read(offset, 18)?;
        if header.len() < 18 || &header[..4] != b"TTA1" {
            return Err(ParseError::invalid_header("missing TTA1 header").at_offset(offset));
        }
        let channels = u32::from(u16::from_le_bytes([header[6], header[7]]));
        let bits = u32::from(u16::from_le_bytes([header[8], header[9]]));
        let sample_rate = u32::from_le_bytes([header[10], header[11], header[12], header[13]]);
        let total_samples = u32::from_le_bytes([header[14], header[15], header[16], header[17]]);

        out.core.channels = Some(channels);
        out.core.bits_per_sample = Some(bits);
        out.core.sample_rate = Some(sample_rate);
        if sample_rate > 0 && total_samples > 0 {
            let length = f64::from(total_samples) / f64::from(sample_rate);
            out.core.length = Some(length);
            if let Some(file_len) = reader.source_len() {
                out.core.bitrate = Some((file_len as f64 * 8.0 / length).round() as u32);
            }
        }

        ape::recover_footer(reader, &mut out, ctx);
        Ok(out)
    }
}
