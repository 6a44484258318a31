use crate::error::ParseError;
use crate::formats::{FormatParser, ParseContext};
use crate::metadata::{AudioFormat, ParsedAudioMetadata, TagValue};
use crate::prelude::*;
use crate::reader::WindowedReader;
use crate::tags::{ape, id3};
use byteorder::{ByteOrder, LittleEndian};

/// First version using the split descriptor/header layout decoded here.
const MODERN_LAYOUT_VERSION: u16 = 3980;

pub struct MonkeysAudioParser;

impl FormatParser for MonkeysAudioParser {
    fn format(&self) -> AudioFormat {
        AudioFormat::MonkeysAudio
    }

    fn can_parse(&self, header: &[u8], _name_hint: Option<&str>) -> bool {
        header.starts_with(b"MAC ") || header.starts_with(b"ID3")
    }

    fn parse(
        &self,
        reader: &mut WindowedReader,
        ctx: &mut ParseContext,
    ) -> Result<ParsedAudioMetadata> {
        let mut out = ParsedAudioMetadata::new(AudioFormat::MonkeysAudio);

        let mut offset = 0u64;
        if let Some(tag_size) = id3::parse_id3v2(reader, 0, &mut out, ctx)? {
            offset = tag_size;
        }

        let descriptor = reader.read(offset, 12)?;
        if descriptor.len() < 12 || &descriptor[..4] != b"MAC " {
            return Err(ParseError::invalid_header("missing MAC magic").at_offset(offset));
        }
        let version = LittleEndian::read_u16(&descriptor[4..6]);
        out.set_extension(
            "version",
            TagValue::text(format!("{:.2}", f64::from(version) / 1000.0)),
        );

        if version < MODERN_LAYOUT_VERSION {
            ctx.warn(format!(
                "monkey's audio version {} predates the descriptor layout",
                version
            ));
            ape::recover_footer(reader, &mut out, ctx);
            return Ok(out);
        }

        let descriptor_bytes = LittleEndian::read_u32(&descriptor[8..12]);
        let header = reader.read(offset + u64::from(descriptor_bytes), 24)?;
        if header.len() < 24 {
            return Err(
                ParseError::truncated("monkey's audio header cut short")
                    .at_offset(offset + u64::from(descriptor_bytes)),
            );
        }
        let blocks_per_frame = LittleEndian::read_u32(&header[4..8]);
        let final_frame_blocks = LittleEndian::read_u32(&header[8..12]);
        let total_frames = LittleEndian::read_u32(&header[12..16]);
        let bits_per_sample = LittleEndian::read_u16(&header[16..18]);
        let channels = LittleEndian::read_u16(&header[18..20]);
        let sample_rate = LittleEndian::read_u32(&header[20..24]);

        out.core.bits_per_sample = Some(u32::from(bits_per_sample));
        out.core.channels = Some(u32::from(channels));
        out.core.sample_rate = Some(sample_rate);

        if total_frames > 0 && sample_rate > 0 {
            let total_blocks = u64::from(total_frames - 1) * u64::from(blocks_per_frame)
                + u64::from(final_frame_blocks);
            let length = total_blocks as f64 / f64::from(sample_rate);
            out.core.length = Some(length);
            if let Some(file_len) = reader.source_len() {
                if length > 0.0 {
                    out.core.bitrate = Some((file_len as f64 * 8.0 / length).round() as u32);
                }
            }
        }

        ape::recover_footer(reader, &mut out, ctx);
        Ok(out)
    }
}
