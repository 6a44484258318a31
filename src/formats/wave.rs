use crate::error::ParseError;
use crate::formats::{FormatParser, ParseContext};
use crate::metadata::{AudioFormat, ParsedAudioMetadata};
use crate::prelude::*;
use crate::reader::WindowedReader;
use crate::tags::id3;
use byteorder::{ByteOrder, LittleEndian};

pub struct WaveParser;

impl FormatParser for WaveParser {
    fn format(&self) -> AudioFormat {
        AudioFormat::Wave
    }

    fn can_parse(&self, header: &[u8], _name_hint: Option<&str>) -> bool {
        header.len() >= 12 && &header[..4] == b"RIFF" && &header[8..12] == b"WAVE"
    }

    fn parse(
        &self,
        reader: &mut WindowedReader,
        ctx: &mut ParseContext,
    ) -> Result<ParsedAudioMetadata> {
        let header = reader.read(0, 12)?;
        if header.len() < 12 || &header[..4] != b"RIFF" || &header[8..12] != b"WAVE" {
            return Err(ParseError::invalid_header("not a RIFF/WAVE file").at_offset(0));
        }
        let mut out = ParsedAudioMetadata::new(AudioFormat::Wave);

        let mut byte_rate = 0u32;
        let mut data_size: Option<u64> = None;

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
            let chunk_size = u64::from(LittleEndian::read_u32(&chunk_header[4..8]));
            let body_offset = offset + 8;

            match &chunk_id {
                b"fmt " => {
                    let body = reader.read(body_offset, chunk_size.min(16) as usize)?;
                    if body.len() >= 16 {
                        out.core.channels = Some(u32::from(LittleEndian::read_u16(&body[2..4])));
                        out.core.sample_rate = Some(LittleEndian::read_u32(&body[4..8]));
                        byte_rate = LittleEndian::read_u32(&body[8..12]);
                        out.core.bits_per_sample =
                            Some(u32::from(LittleEndian::read_u16(&body[14..16])));
                    } else {
                        ctx.warn("wave fmt chunk shorter than 16 bytes");
                    }
                }
                // The payload is never read; its size alone gives the length.
                b"data" => data_size = Some(chunk_size),
                b"id3 " | b"ID3 " if ctx.options.parse_tags => {
                    let body = reader.read(body_offset, chunk_size as usize)?;
                    let mut sub = WindowedReader::from_bytes(body, ctx.options);
                    if let Err(err) = id3::parse_id3v2(&mut sub, 0, &mut out, ctx) {
                        ctx.warn(format!("wave id3 chunk unreadable: {}", err));
                    }
                }
                _ => {}
            }

            // RIFF chunks are word-aligned.
            offset = body_offset + chunk_size + (chunk_size & 1);
        }

        derive_pcm_length(&mut out, data_size, byte_rate);
        Ok(out)
    }
}

fn derive_pcm_length(out: &mut ParsedAudioMetadata, data_size: Option<u64>, byte_rate: u32) {
    let (Some(rate), Some(channels), Some(bits)) = (
        out.core.sample_rate,
        out.core.channels,
        out.core.bits_per_sample,
    ) else {
        return;
    };
    let bytes_per_second = f64::from(rate) * f64::from(channels) * f64::from(bits) / 8.0;
    if let Some(data_size) = data_size {
        if bytes_per_second > 0.0 {
            out.core.length = Some(data_size as f64 / bytes_per_second);
        }
    }
    let bitrate = if byte_rate > 0 {
        byte_rate.saturating_mul(8)
    } else {
        (bytes_per_second * 8.0) as u32
    };
    if bitrate > 0 {
        out.core.bitrate = Some(bitrate);
    }
}
