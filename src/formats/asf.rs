use crate::error::ParseError;
use crate::formats::{FormatParser, ParseContext};
use crate::metadata::{AudioFormat, ParsedAudioMetadata, TagValue};
use crate::prelude::*;
use crate::probe::ASF_HEADER_GUID;
use crate::reader::WindowedReader;
use byteorder::{ByteOrder, LittleEndian};

/// GUIDs in on-disk byte order (the first three fields little-endian).
const FILE_PROPERTIES_GUID: [u8; 16] = [
    0xA1, 0xDC, 0xAB, 0x8C, 0x47, 0xA9, 0xCF, 0x11, 0x8E, 0xE4, 0x00, 0xC0, 0x0C, 0x20, 0x53, 0x65,
];
const STREAM_PROPERTIES_GUID: [u8; 16] = [
    0x91, 0x07, 0xDC, 0xB7, 0xB7, 0xA9, 0xCF, 0x11, 0x8E, 0xE6, 0x00, 0xC0, 0x0C, 0x20, 0x53, 0x65,
];
const CONTENT_DESCRIPTION_GUID: [u8; 16] = [
    0x33, 0x26, 0xB2, 0x75, 0x8E, 0x66, 0xCF, 0x11, 0xA6, 0xD9, 0x00, 0xAA, 0x00, 0x62, 0xCE, 0x6C,
];
const AUDIO_MEDIA_GUID: [u8; 16] = [
    0x40, 0x9E, 0x69, 0xF8, 0x4D, 0x5B, 0xCF, 0x11, 0xA8, 0xFD, 0x00, 0x80, 0x5F, 0x5C, 0x44, 0x2B,
];

/// Runaway guard for the object walk.
const MAX_OBJECTS: usize = 1024;

/// Offset of the codec-specific format block inside stream properties.
const STREAM_FORMAT_OFFSET: usize = 54;

pub struct AsfParser;

impl FormatParser for AsfParser {
    fn format(&self) -> AudioFormat {
        AudioFormat::Asf
    }

    fn can_parse(&self, header: &[u8], _name_hint: Option<&str>) -> bool {
        header.len() >= 16 && header[..16] == ASF_HEADER_GUID
    }

    fn parse(
        &self,
        reader: &mut WindowedReader,
        ctx: &mut ParseContext,
    ) -> Result<ParsedAudioMetadata> {
        let header = reader.read(0, 30)?;
        if header.len() < 30 || header[..16] != ASF_HEADER_GUID {
            return Err(ParseError::invalid_header("missing ASF header GUID").at_offset(0));
        }
        let mut out = ParsedAudioMetadata::new(AudioFormat::Asf);

        // Header object: GUID, size, object count, two reserved bytes.
        let mut offset = 30u64;
        for _ in 0..MAX_OBJECTS {
            let object_header = reader.read(offset, 24)?;
            if object_header.len() < 24 {
                break;
            }
            let mut guid = [0u8; 16];
            guid.copy_from_slice(&object_header[..16]);
            let object_size = LittleEndian::read_u64(&object_header[16..24]);
            if object_size < 24 {
                break;
            }
            let payload_offset = offset + 24;
            let payload_len = (object_size - 24) as usize;

            match guid {
                FILE_PROPERTIES_GUID => {
                    let payload = reader.read(payload_offset, payload_len.min(80))?;
                    decode_file_properties(&payload, &mut out);
                }
                STREAM_PROPERTIES_GUID => {
                    let payload = reader.read(payload_offset, payload_len.min(256))?;
                    decode_stream_properties(&payload, &mut out);
                }
                CONTENT_DESCRIPTION_GUID if ctx.options.parse_tags => {
                    let payload = reader.read(payload_offset, payload_len)?;
                    decode_content_description(&payload, &mut out, ctx);
                }
                _ => {}
            }
            offset += object_size;
        }
        Ok(out)
    }
}

/// Play duration is in 100 ns units and includes the preroll (milliseconds).
fn decode_file_properties(payload: &[u8], out: &mut ParsedAudioMetadata) {
    if payload.len() < 80 {
        return;
    }
    let play_duration = LittleEndian::read_u64(&payload[40..48]);
    let preroll = LittleEndian::read_u64(&payload[56..64]);
    let net = play_duration.saturating_sub(preroll.saturating_mul(10_000));
    if net > 0 {
        out.core.length = Some(net as f64 / 10_000_000.0);
    }
    let max_bitrate = LittleEndian::read_u32(&payload[76..80]);
    if max_bitrate > 0 && out.core.bitrate.is_none() {
        out.core.bitrate = Some(max_bitrate);
    }
}

fn decode_stream_properties(payload: &[u8], out: &mut ParsedAudioMetadata) {
    if payload.len() < 16 || payload[..16] != AUDIO_MEDIA_GUID {
        return;
    }
    let Some(format) = payload.get(STREAM_FORMAT_OFFSET..STREAM_FORMAT_OFFSET + 16) else {
        return;
    };
    out.core.channels = Some(u32::from(LittleEndian::read_u16(&format[2..4])));
    out.core.sample_rate = Some(LittleEndian::read_u32(&format[4..8]));
    let bytes_per_second = LittleEndian::read_u32(&format[8..12]);
    if bytes_per_second > 0 {
        out.core.bitrate = Some(bytes_per_second.saturating_mul(8));
    }
    let bits = LittleEndian::read_u16(&format[14..16]);
    if bits > 0 {
        out.core.bits_per_sample = Some(u32::from(bits));
    }
}

/// Five length-prefixed UTF-16LE strings: title, author, copyright,
/// description, rating. Only the spoken-for three become tags.
fn decode_content_description(
    payload: &[u8],
    out: &mut ParsedAudioMetadata,
    ctx: &mut ParseContext,
) {
    if payload.len() < 10 {
        ctx.warn("asf content description too short");
        return;
    }
    let lengths: Vec<usize> = (0..5)
        .map(|i| LittleEndian::read_u16(&payload[i * 2..i * 2 + 2]) as usize)
        .collect();
    let mut pos = 10usize;
    let keys = [Some("Title"), Some("Author"), None, Some("Description"), None];
    for (len, key) in lengths.into_iter().zip(keys) {
        let Some(raw) = payload.get(pos..pos + len) else {
            ctx.warn("asf content description strings cut short");
            return;
        };
        pos += len;
        let Some(key) = key else {
            continue;
        };
        let text = decode_utf16le(raw);
        if !text.is_empty() {
            out.set_tag(key, TagValue::text(text));
        }
    }
}

fn decode_utf16le(bytes: &[u8]) -> String {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    String::from_utf16_lossy(&units)
        .trim_end_matches('\0')
        .to_owned()
}
