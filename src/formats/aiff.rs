use crate::error::ParseError;
use crate::formats::{FormatParser, ParseContext};
use crate::metadata::{AudioFormat, ParsedAudioMetadata};
use crate::prelude::*;
use crate::reader::WindowedReader;
use crate::tags::id3;
use byteorder::{BigEndian, ByteOrder};

pub struct AiffParser;

impl FormatParser for AiffParser {
    fn format(&self) -> AudioFormat {
        AudioFormat::Aiff
    }

    fn can_parse(&self, header: &[u8], _name_hint: Option<&str>) -> bool {
        header.len() >= 12
            && &header[..4] == b"FORM"
            && (&header[8..12] == b"AIFF" || &header[8..12] == b"AIFC")
    }

    fn parse(
        &self,
        reader: &mut WindowedReader,
        ctx: &mut ParseContext,
    ) -> Result<ParsedAudioMetadata> {
        let header = reader.read(0, 12)?;
        if header.len() < 12
            || &header[..4] != b"FORM"
            || (&header[8..12] != b"AIFF" && &header[8..12] != b"AIFC")
        {
            return Err(ParseError::invalid_header("not a FORM/AIFF file").at_offset(0));
        }
        let mut out = ParsedAudioMetadata::new(AudioFormat::Aiff);

        let mut offset = 12u64;
        loop {
            let chunk_header = reader.read(offset, 8)?;
            if chunk_header.len() < 8 {
                break;
            }
            let chunk_id: [u8; 4] = [
                chunk_header[0],
                chunk_header[1],
                chunk_header[2],
                chunk_header[3],
            ];
            let chunk_size = u64::from(BigEndian::read_u32(&chunk_header[4..8]));
            let body_offset = offset + 8;

            match &chunk_id {
                b"COMM" => {
                    let body = reader.read(body_offset, chunk_size.min(18) as usize)?;
                    if body.len() >= 18 {
                        let channels = BigEndian::read_u16(&body[..2]);
                        let sample_frames = BigEndian::read_u32(&body[2..6]);
                        let bits = BigEndian::read_u16(&body[6..8]);
                        let sample_rate = decode_extended80(&body[8..18]);

                        out.core.channels = Some(u32::from(channels));
                        out.core.bits_per_sample = Some(u32::from(bits));
                        if sample_rate > 0.0 {
                            out.core.sample_rate = Some(sample_rate.round() as u32);
                            out.core.length = Some(f64::from(sample_frames) / sample_rate);
                            out.core.bitrate = Some(
                                (sample_rate * f64::from(channels) * f64::from(bits)) as u32,
                            );
                        }
                    } else {
                        ctx.warn("aiff COMM chunk shorter than 18 bytes");
                    }
                }
                b"ID3 " if ctx.options.parse_tags => {
                    let body = reader.read(body_offset, chunk_size as usize)?;
                    let mut sub = WindowedReader::from_bytes(body, ctx.options);
                    if let Err(err) = id3::parse_id3v2(&mut sub, 0, &mut out, ctx) {
                        ctx.warn(format!("aiff ID3 chunk unreadable: {}", err));
                    }
                }
                _ => {}
            }

            // Chunk bodies are padded to even length.
            offset = body_offset + chunk_size + (chunk_size & 1);
        }
        Ok(out)
    }
}

/// 80-bit IEEE 754 extended float: sign bit, 15-bit exponent biased by
/// 16383, explicit-one 64-bit mantissa normalized against 2^63.
fn decode_extended80(bytes: &[u8]) -> f64 {
    if bytes.len() < 10 {
        return 0.0;
    }
    let sign = if bytes[0] & 0x80 != 0 { -1.0 } else { 1.0 };
    let exponent = (u16::from(bytes[0] & 0x7F) << 8 | u16::from(bytes[1])) as i32;
    let mantissa = BigEndian::read_u64(&bytes[2..10]);
    if exponent == 0 && mantissa == 0 {
        return 0.0;
    }
    let fraction = mantissa as f64 / (1u64 << 63) as f64;
    sign * fraction * 2f64.powi(exponent - 16383)
}
