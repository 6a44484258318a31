use crate::formats::{FormatParser, ParseContext};
use crate::metadata::{AudioFormat, BinaryDigest, ParsedAudioMetadata, TagValue};
use crate::prelude::*;
use crate::reader::WindowedReader;
use byteorder::{BigEndian, ByteOrder};

pub struct Mp4Parser;

/// Atoms whose payload is a list of child atoms.
const CONTAINER_ATOMS: &[&[u8; 4]] = &[
    b"moov", b"trak", b"mdia", b"minf", b"stbl", b"udta", b"meta", b"ilst", b"edts", b"moof",
    b"traf",
];

#[derive(Default, Clone)]
struct TrakInfo {
    is_audio: bool,
    timescale: Option<u32>,
    duration: Option<u64>,
    channels: Option<u32>,
    bits_per_sample: Option<u32>,
    sample_rate: Option<u32>,
}

#[derive(Default)]
struct WalkState {
    m4a_brand: bool,
    current_trak: Option<TrakInfo>,
    audio_trak: Option<TrakInfo>,
}

impl FormatParser for Mp4Parser {
    fn format(&self) -> AudioFormat {
        AudioFormat::Mp4
    }

    fn can_parse(&self, header: &[u8], _name_hint: Option<&str>) -> bool {
        header.len() >= 8 && &header[4..8] == b"ftyp"
    }

    fn parse(
        &self,
        reader: &mut WindowedReader,
        ctx: &mut ParseContext,
    ) -> Result<ParsedAudioMetadata> {
        let mut out = ParsedAudioMetadata::new(AudioFormat::Mp4);
        let mut state = WalkState::default();

        let end = reader.source_len().unwrap_or(u64::MAX);
        walk_children(reader, 0, end, false, &mut state, &mut out, ctx)?;

        if state.m4a_brand {
            out.format = AudioFormat::M4a;
        }
        if let Some(trak) = state.audio_trak {
            out.core.channels = trak.channels;
            out.core.bits_per_sample = trak.bits_per_sample;
            out.core.sample_rate = trak.sample_rate;
            if let (Some(duration), Some(timescale)) = (trak.duration, trak.timescale) {
                if timescale > 0 {
                    out.core.length = Some(duration as f64 / f64::from(timescale));
                }
            }
        }
        Ok(out)
    }
}

fn walk_children(
    reader: &mut WindowedReader,
    start: u64,
    end: u64,
    in_ilst: bool,
    state: &mut WalkState,
    out: &mut ParsedAudioMetadata,
    ctx: &mut ParseContext,
) -> Result<()> {
    let mut offset = start;
    while offset + 8 <= end {
        let header = reader.read(offset, 16)?;
        if header.len() < 8 {
            break;
        }
        let size32 = BigEndian::read_u32(&header[..4]);
        let atom_type: [u8; 4] = [header[4], header[5], header[6], header[7]];

        let (size, header_len) = match size32 {
            0 => (end - offset, 8u64), // atom extends to the end of its parent
            1 => {
                if header.len() < 16 {
                    break;
                }
                (BigEndian::read_u64(&header[8..16]), 16u64)
            }
            n => (u64::from(n), 8u64),
        };
        if size < header_len {
            break;
        }
        let atom_end = match offset.checked_add(size) {
            Some(e) if e <= end => e,
            // An overrunning child aborts this level.
            _ => break,
        };
        let payload_start = offset + header_len;

        if in_ilst {
            decode_ilst_item(reader, &atom_type, payload_start, atom_end, out, ctx)?;
        } else if CONTAINER_ATOMS.contains(&&atom_type) {
            // The meta payload begins with a version/flags word.
            let child_start = if &atom_type == b"meta" {
                payload_start + 4
            } else {
                payload_start
            };
            let entering_trak = &atom_type == b"trak";
            if entering_trak {
                state.current_trak = Some(TrakInfo::default());
            }
            walk_children(
                reader,
                child_start,
                atom_end,
                &atom_type == b"ilst" && ctx.options.parse_tags,
                state,
                out,
                ctx,
            )?;
            if entering_trak {
                if let Some(trak) = state.current_trak.take() {
                    if trak.is_audio && state.audio_trak.is_none() {
                        state.audio_trak = Some(trak);
                    }
                }
            }
        } else {
            decode_leaf(
                reader,
                &atom_type,
                payload_start,
                atom_end,
                state,
            )?;
        }

        offset = atom_end;
    }
    Ok(())
}

fn decode_leaf(
    reader: &mut WindowedReader,
    atom_type: &[u8; 4],
    payload_start: u64,
    atom_end: u64,
    state: &mut WalkState,
) -> Result<()> {
    let payload_len = (atom_end - payload_start) as usize;
    match atom_type {
        b"ftyp" => {
            let payload = reader.read(payload_start, payload_len.min(64))?;
            // Major brand plus any compatible brand may mark an audio-only file.
            if payload.chunks(4).any(|brand| brand.eq_ignore_ascii_case(b"M4A ")) {
                state.m4a_brand = true;
            }
        }
        b"hdlr" => {
            if let Some(trak) = state.current_trak.as_mut() {
                let payload = reader.read(payload_start, 12)?;
                if payload.len() >= 12 && &payload[8..12] == b"soun" {
                    trak.is_audio = true;
                }
            }
        }
        b"mdhd" => {
            if let Some(trak) = state.current_trak.as_mut() {
                let payload = reader.read(payload_start, 32)?;
                if payload.first() == Some(&1) {
                    if payload.len() >= 32 {
                        trak.timescale = Some(BigEndian::read_u32(&payload[20..24]));
                        trak.duration = Some(BigEndian::read_u64(&payload[24..32]));
                    }
                } else if payload.len() >= 20 {
                    trak.timescale = Some(BigEndian::read_u32(&payload[12..16]));
                    trak.duration = Some(u64::from(BigEndian::read_u32(&payload[16..20])));
                }
            }
        }
        b"stsd" => {
            if let Some(trak) = state.current_trak.as_mut() {
                // First sample entry: 8 bytes of size+format, then the audio
                // sample description fields.
                let payload = reader.read(payload_start, 44)?;
                if payload.len() >= 44 {
                    let entry = &payload[8..];
                    trak.channels = Some(u32::from(BigEndian::read_u16(&entry[24..26])));
                    trak.bits_per_sample = Some(u32::from(BigEndian::read_u16(&entry[26..28])));
                    // 16.16 fixed point; the integer part is the rate in Hz.
                    trak.sample_rate = Some(BigEndian::read_u32(&entry[32..36]) >> 16);
                }
            }
        }
        _ => {}
    }
    Ok(())
}

/// One `ilst` item: the atom type is the tag key, the value lives in nested
/// `data` atoms (several for multi-value text tags).
fn decode_ilst_item(
    reader: &mut WindowedReader,
    item_type: &[u8; 4],
    payload_start: u64,
    atom_end: u64,
    out: &mut ParsedAudioMetadata,
    ctx: &mut ParseContext,
) -> Result<()> {
    let key: String = item_type.iter().map(|&b| b as char).collect();
    let payload = reader.read(payload_start, (atom_end - payload_start) as usize)?;

    let mut pos = 0usize;
    while pos + 16 <= payload.len() {
        let size = BigEndian::read_u32(&payload[pos..pos + 4]) as usize;
        if size < 16 || pos + size > payload.len() {
            break;
        }
        if &payload[pos + 4..pos + 8] != b"data" {
            pos += size;
            continue;
        }
        let type_code = BigEndian::read_u32(&payload[pos + 8..pos + 12]);
        let value = &payload[pos + 16..pos + size];
        decode_data_value(&key, type_code, value, out, ctx);
        pos += size;
    }
    Ok(())
}

fn decode_data_value(
    key: &str,
    type_code: u32,
    value: &[u8],
    out: &mut ParsedAudioMetadata,
    ctx: &mut ParseContext,
) {
    // Track/disc pairs and the compilation flag ignore the declared type;
    // files in the wild write them under several codes.
    match key {
        "trkn" | "disk" => {
            if value.len() >= 6 {
                let number = BigEndian::read_u16(&value[2..4]);
                let total = BigEndian::read_u16(&value[4..6]);
                out.set_tag(key, TagValue::text(format!("{}/{}", number, total)));
            }
            return;
        }
        "cpil" => {
            out.set_tag(key, TagValue::Bool(value.first().map(|&b| b != 0).unwrap_or(false)));
            return;
        }
        _ => {}
    }

    match type_code {
        0 | 1 => {
            let text = String::from_utf8_lossy(value).into_owned();
            out.push_text_tag(key, text);
        }
        13 => {
            let digest =
                BinaryDigest::from_payload(value, Some("image/jpeg".to_owned()), ctx.options);
            out.set_tag(key, TagValue::Binary(digest));
        }
        14 => {
            let digest =
                BinaryDigest::from_payload(value, Some("image/png".to_owned()), ctx.options);
            out.set_tag(key, TagValue::Binary(digest));
        }
        21 => {
            if let Some(int) = decode_signed_be(value) {
                out.set_tag(key, TagValue::Int(int));
            }
        }
        _ => {
            let digest = BinaryDigest::from_payload(value, None, ctx.options);
            out.set_tag(key, TagValue::Binary(digest));
        }
    }
}

fn decode_signed_be(value: &[u8]) -> Option<i64> {
    match value.len() {
        1 => Some(i64::from(value[0] as i8)),
        2 => Some(i64::from(BigEndian::read_i16(value))),
        4 => Some(i64::from(BigEndian::read_i32(value))),
        8 => Some(BigEndian::read_i64(value)),
        _ => None,
    }
}
