use crate::error::ParseError;
use crate::formats::{FormatParser, ParseContext};
use crate::metadata::{AudioFormat, BinaryDigest, ParsedAudioMetadata, TagValue};
use crate::prelude::*;
use crate::reader::WindowedReader;
use crate::tags::vorbis;
use byteorder::{BigEndian, ByteOrder};

const BLOCK_STREAMINFO: u8 = 0;
const BLOCK_VORBIS_COMMENT: u8 = 4;
const BLOCK_PICTURE: u8 = 6;

pub struct FlacParser;

impl FormatParser for FlacParser {
    fn format(&self) -> AudioFormat {
        AudioFormat::Flac
    }

    fn can_parse(&self, header: &[u8], _name_hint: Option<&str>) -> bool {
        header.starts_with(b"fLaC")
    }

    fn parse(
        &self,
        reader: &mut WindowedReader,
        ctx: &mut ParseContext,
    ) -> Result<ParsedAudioMetadata> {
        let magic = reader.read(0, 4)?;
        if magic != b"fLaC" {
            return Err(ParseError::invalid_header("missing fLaC magic").at_offset(0));
        }
        let mut out = ParsedAudioMetadata::new(AudioFormat::Flac);

        let mut offset = 4u64;
        loop {
            let header = reader.read(offset, 4)?;
            if header.len() < 4 {
                out.set_extension("flac_metadata_truncated", TagValue::Bool(true));
                ctx.warn(format!("flac metadata ends mid-header at {}", offset));
                break;
            }
            let is_last = header[0] & 0x80 != 0;
            let block_type = header[0] & 0x7F;
            let length = BigEndian::read_u24(&header[1..4]) as usize;

            let body = reader.read(offset + 4, length)?;
            if body.len() < length {
                // A torn STREAMINFO leaves us nothing to report; any other
                // torn block still lets the rest of the result stand.
                if block_type == BLOCK_STREAMINFO {
                    return Err(ParseError::truncated("flac STREAMINFO block cut short")
                        .at_offset(offset + 4));
                }
                out.set_extension("flac_metadata_truncated", TagValue::Bool(true));
                ctx.warn(format!(
                    "flac metadata block type {} truncated at {}",
                    block_type, offset
                ));
                break;
            }

            match block_type {
                BLOCK_STREAMINFO => decode_stream_info(&body, &mut out)?,
                BLOCK_VORBIS_COMMENT if ctx.options.parse_tags => {
                    if let Err(err) = vorbis::parse_vorbis_comments(&body, &mut out) {
                        ctx.warn(format!("flac vorbis comment block unreadable: {}", err));
                    }
                }
                BLOCK_PICTURE if ctx.options.parse_tags => decode_picture(&body, &mut out, ctx),
                _ => {}
            }

            offset += 4 + length as u64;
            if is_last {
                break;
            }
        }

        if let (Some(length), Some(file_len)) = (out.core.length, reader.source_len()) {
            if length > 0.0 {
                out.core.bitrate = Some((file_len as f64 * 8.0 / length).round() as u32);
            }
        }
        Ok(out)
    }
}

/// STREAMINFO packs sample rate (20 bits), channels (3, stored minus one),
/// bits per sample (5, minus one) and the 36-bit total sample count into the
/// eight bytes after the frame-size fields.
fn decode_stream_info(body: &[u8], out: &mut ParsedAudioMetadata) -> Result<()> {
    if body.len() < 18 {
        return Err(ParseError::truncated("flac STREAMINFO shorter than 18 bytes"));
    }
    let packed = &body[10..18];
    let sample_rate = ((packed[0] as u32) << 12) + ((packed[1] as u32) << 4) + ((packed[2] as u32) >> 4);
    let channels = ((packed[2] >> 1) & 0b0000_0111) + 1;
    let bits_per_sample = ((packed[2] & 0b0000_0001) << 4) + (packed[3] >> 4) + 1;
    let total_samples = ((packed[3] as u64 & 0b0000_1111) << 32)
        + ((packed[4] as u64) << 24)
        + ((packed[5] as u64) << 16)
        + ((packed[6] as u64) << 8)
        + (packed[7] as u64);

    out.core.sample_rate = Some(sample_rate);
    out.core.channels = Some(u32::from(channels));
    out.core.bits_per_sample = Some(u32::from(bits_per_sample));
    if total_samples > 0 && sample_rate > 0 {
        out.core.length = Some(total_samples as f64 / f64::from(sample_rate));
        out.set_extension("total_samples", TagValue::Int(total_samples as i64));
    }
    Ok(())
}

/// PICTURE block: picture type, mime, description, dimensions, then the
/// payload, all length-prefixed big-endian.
fn decode_picture(body: &[u8], out: &mut ParsedAudioMetadata, ctx: &mut ParseContext) {
    fn read_u32(body: &[u8], pos: &mut usize) -> Option<u32> {
        let value = body.get(*pos..*pos + 4).map(BigEndian::read_u32)?;
        *pos += 4;
        Some(value)
    }

    let mut pos = 0usize;
    let Some(_picture_type) = read_u32(body, &mut pos) else {
        return;
    };
    let Some(mime_len) = read_u32(body, &mut pos) else {
        return;
    };
    let Some(mime_bytes) = body.get(pos..pos + mime_len as usize) else {
        return;
    };
    let mime = String::from_utf8_lossy(mime_bytes).into_owned();
    pos += mime_len as usize;

    let Some(desc_len) = read_u32(body, &mut pos) else {
        return;
    };
    pos += desc_len as usize;
    // width, height, depth, colors
    pos += 16;

    let Some(data_len) = read_u32(body, &mut pos) else {
        return;
    };
    let Some(payload) = body.get(pos..pos + data_len as usize) else {
        return;
    };

    let mime = if mime.is_empty() { None } else { Some(mime) };
    let digest = BinaryDigest::from_payload(payload, mime, ctx.options);
    out.set_tag("PICTURE", TagValue::Binary(digest));
}
