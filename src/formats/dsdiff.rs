use crate::error::ParseError;
use crate::formats::{FormatParser, ParseContext};
use crate::metadata::{AudioFormat, ParsedAudioMetadata};
use crate::prelude::*;
use crate::reader::WindowedReader;
use crate::tags::id3;
use byteorder::{BigEndian, ByteOrder};

pub struct DsdiffParser;

impl FormatParser for DsdiffParser {
    fn format(&self) -> AudioFormat {
        AudioFormat::Dsdiff
    }

    fn can_parse(&self, header: &[u8], _name_hint: Option<&str>) -> bool {
        header.starts_with(b"FRM8")
    }

    fn parse(
        &self,
        reader: &mut WindowedReader,
        ctx: &mut ParseContext,
    ) -> Result<ParsedAudioMetadata> {
        let header = reader.read(0, 16)?;
        if header.len() < 16 || &header[..4] != b"FRM8" || &header[12..16] != b"DSD " {
            return Err(ParseError::invalid_header("not a DSDIFF form").at_offset(0));
        }
        let mut out = ParsedAudioMetadata::new(AudioFormat::Dsdiff);
        // DSD audio is a 1-bit stream.
        out.core.bits_per_sample = Some(1);

        let mut data_size: Option<u64> = None;

        let mut offset = 16u64;
        loop {
            let chunk_header = reader.read(offset, 12)?;
            if chunk_header.len() < 12 {
                break;
            }
            let chunk_id: [u8; 4] = [
                chunk_header[0],
                chunk_header[1],
                chunk_header[2],
                chunk_header[3],
            ];
            let chunk_size = BigEndian::read_u64(&chunk_header[4..12]);
            let body_offset = offset + 12;

            match &chunk_id {
                b"PROP" => {
                    let body = reader.read(body_offset, chunk_size as usize)?;
                    if body.starts_with(b"SND ") {
                        decode_sound_properties(&body[4..], &mut out);
                    }
                }
                b"DSD " => data_size = Some(chunk_size),
                b"ID3 " if ctx.options.parse_tags => {
                    let body = reader.read(body_offset, chunk_size as usize)?;
                    let mut sub = WindowedReader::from_bytes(body, ctx.options);
                    if let Err(err) = id3::parse_id3v2(&mut sub, 0, &mut out, ctx) {
                        ctx.warn(format!("dsdiff ID3 chunk unreadable: {}", err));
                    }
                }
                _ => {}
            }

            offset = body_offset + chunk_size + (chunk_size & 1);
        }

        if let (Some(data_size), Some(rate), Some(channels)) =
            (data_size, out.core.sample_rate, out.core.channels)
        {
            let bits_per_second = f64::from(rate) * f64::from(channels);
            if bits_per_second > 0.0 {
                out.core.length = Some(data_size as f64 * 8.0 / bits_per_second);
                out.core.bitrate = Some(bits_per_second as u32);
            }
        }
        Ok(out)
    }
}

/// `PROP/SND ` sub-chunks: `FS  ` carries the sample rate, `CHNL` the
/// channel list. Sizes are 64-bit and even-padded like the outer layer.
fn decode_sound_properties(body: &[u8], out: &mut ParsedAudioMetadata) {
    let mut pos = 0usize;
    while pos + 12 <= body.len() {
        let chunk_id = &body[pos..pos + 4];
        let chunk_size = BigEndian::read_u64(&body[pos + 4..pos + 12]) as usize;
        let Some(chunk_body) = body.get(pos + 12..pos + 12 + chunk_size) else {
            break;
        };
        match chunk_id {
            b"FS  " if chunk_body.len() >= 4 => {
                out.core.sample_rate = Some(BigEndian::read_u32(&chunk_body[..4]));
            }
            b"CHNL" if chunk_body.len() >= 2 => {
                out.core.channels = Some(u32::from(BigEndian::read_u16(&chunk_body[..2])));
            }
            _ => {}
        }
        pos += 12 + chunk_size + (chunk_size & 1);
    }
}
