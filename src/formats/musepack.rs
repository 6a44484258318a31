use crate::error::ParseError;
use crate::formats::{FormatParser, ParseContext};
use crate::metadata::{AudioFormat, ParsedAudioMetadata, TagValue};
use crate::prelude::*;
use crate::reader::WindowedReader;
use byteorder::{ByteOrder, LittleEndian};

const SAMPLE_RATES: [u32; 4] = [44100, 48000, 37800, 32000];

/// Samples per Musepack frame (SV7).
const FRAME_SAMPLES: f64 = 1152.0;

pub struct MusepackParser;

impl FormatParser for MusepackParser {
    fn format(&self) -> AudioFormat {
        AudioFormat::Musepack
    }

    fn can_parse(&self, header: &[u8], _name_hint: Option<&str>) -> bool {
        header.starts_with(b"MPCK") || (header.starts_with(b"MP+") && header.len() >= 4)
    }

    fn parse(
        &self,
        reader: &mut WindowedReader,
        ctx: &mut ParseContext,
    ) -> Result<ParsedAudioMetadata> {
        let header = reader.read(0, 16)?;
        if header.starts_with(b"MPCK") {
            return parse_sv8(reader, ctx);
        }
        if !header.starts_with(b"MP+") || header.len() < 12 {
            return Err(ParseError::invalid_header("missing Musepack marker").at_offset(0));
        }
        // SV7: stream version in the low nibble after the marker.
        let version = header[3] & 0x0F;
        if version != 7 {
            return Err(ParseError::invalid_header(format!(
                "unsupported Musepack SV{} stream",
                version
            ))
            .at_offset(3));
        }
        let mut out = ParsedAudioMetadata::new(AudioFormat::Musepack);
        out.set_extension("stream_version", TagValue::Int(7));

        let frame_count = LittleEndian::read_u32(&header[4..8]);
        let flags = LittleEndian::read_u32(&header[8..12]);
        let rate = SAMPLE_RATES[((flags >> 16) & 0b11) as usize];
        out.core.sample_rate = Some(rate);
        out.core.channels = Some(2);
        if frame_count > 0 {
            let length = f64::from(frame_count) * FRAME_SAMPLES / f64::from(rate);
            out.core.length = Some(length);
            if let Some(file_len) = reader.source_len() {
                out.core.bitrate = Some((file_len as f64 * 8.0 / length).round() as u32);
            }
        }
        Ok(out)
    }
}

/// SV8 is a packet stream; everything we need sits in the `SH` stream
/// header packet near the start.
fn parse_sv8(reader: &mut WindowedReader, ctx: &mut ParseContext) -> Result<ParsedAudioMetadata> {
    let mut out = ParsedAudioMetadata::new(AudioFormat::Musepack);
    out.set_extension("stream_version", TagValue::Int(8));

    let buf = reader.read(4, 4096)?;
    let mut pos = 0usize;
    while pos + 3 <= buf.len() {
        let key = &buf[pos..pos + 2];
        if !key.iter().all(u8::is_ascii_uppercase) {
            break;
        }
        let mut cursor = pos + 2;
        let Some(size) = read_varint(&buf, &mut cursor) else {
            break;
        };
        let packet_end = pos + size as usize;
        if key == b"SH" {
            decode_stream_header(&buf[cursor..buf.len().min(packet_end)], &mut out);
            break;
        }
        if key == b"SE" || packet_end <= pos {
            break; // stream end or nonsense size
        }
        pos = packet_end;
    }
    if out.core.sample_rate.is_none() {
        ctx.warn("musepack SV8 stream header not found near start");
    }
    Ok(out)
}

fn decode_stream_header(payload: &[u8], out: &mut ParsedAudioMetadata) {
    // CRC and stream version precede the sample counts.
    let mut pos = 5usize;
    let Some(sample_count) = read_varint(payload, &mut pos) else {
        return;
    };
    let Some(beginning_silence) = read_varint(payload, &mut pos) else {
        return;
    };
    let Some(&packed) = payload.get(pos) else {
        return;
    };
    let Some(&rate) = SAMPLE_RATES.get(((packed >> 5) & 0b111) as usize) else {
        return;
    };
    let channels = payload
        .get(pos + 1)
        .map(|&b| u32::from(b >> 4) + 1)
        .unwrap_or(2);

    out.core.sample_rate = Some(rate);
    out.core.channels = Some(channels);
    let samples = sample_count.saturating_sub(beginning_silence);
    if samples > 0 {
        out.core.length = Some(samples as f64 / f64::from(rate));
    }
}

/// Musepack variable-length integer: 7 bits per byte, MSB set on every byte
/// except the last.
fn read_varint(buf: &[u8], pos: &mut usize) -> Option<u64> {
    let mut value = 0u64;
    for _ in 0..9 {
        let &byte = buf.get(*pos)?;
        *pos += 1;
        value = (value << 7) | u64::from(byte & 0x7F);
        if byte & 0x80 == 0 {
            return Some(value);
        }
    }
    None
}
