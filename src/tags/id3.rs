use crate::formats::ParseContext;
use crate::metadata::{BinaryDigest, ParsedAudioMetadata, TagValue};
use crate::prelude::*;
use crate::reader::WindowedReader;
use byteorder::{BigEndian, ByteOrder};
use num_traits::FromPrimitive;

/// ID3v2 text encoding byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, num_derive::FromPrimitive)]
pub enum TextEncoding {
    /// ISO-8859-1.
    Latin1 = 0,
    /// UTF-16 with BOM.
    Utf16 = 1,
    /// UTF-16 big-endian, no BOM.
    Utf16Be = 2,
    Utf8 = 3,
}

/// Decode a 28-bit synchsafe integer: four bytes, 7 payload bits each, high
/// bit always clear so tag sizes can never fake an MPEG sync pattern.
pub fn parse_synchsafe_int(bytes: &[u8]) -> u32 {
    bytes
        .iter()
        .take(4)
        .fold(0u32, |acc, &b| (acc << 7) | u32::from(b & 0x7F))
}

/// Parse an ID3v2 tag starting at `offset`.
///
/// Returns the full tag size (header included) when a tag is present, so the
/// caller can skip past it, or `None` when the magic does not match. Frame
/// walking is lenient: a malformed frame id or an overrunning frame size
/// ends the walk without error.
pub fn parse_id3v2(
    reader: &mut WindowedReader,
    offset: u64,
    out: &mut ParsedAudioMetadata,
    ctx: &mut ParseContext,
) -> Result<Option<u64>> {
    let header = reader.read(offset, 10)?;
    if header.len() < 10 || &header[..3] != b"ID3" {
        return Ok(None);
    }
    let major = header[3];
    let declared = parse_synchsafe_int(&header[6..10]) as u64;
    let total = 10 + declared;
    if !ctx.options.parse_tags {
        return Ok(Some(total));
    }

    let payload = reader.read(offset + 10, declared as usize)?;
    if payload.len() < declared as usize {
        ctx.warn(format!(
            "id3v2 payload short: declared {} bytes, got {}",
            declared,
            payload.len()
        ));
    }
    walk_frames(&payload, major, out, ctx);
    Ok(Some(total))
}

fn walk_frames(payload: &[u8], major: u8, out: &mut ParsedAudioMetadata, ctx: &mut ParseContext) {
    let mut pos = 0usize;
    while pos + 10 <= payload.len() {
        let header = &payload[pos..pos + 10];
        if header.iter().all(|&b| b == 0) {
            // Padding area.
            break;
        }
        let id = &header[..4];
        if !id
            .iter()
            .all(|&b| b.is_ascii_uppercase() || b.is_ascii_digit())
        {
            break;
        }
        let size = if major >= 4 {
            parse_synchsafe_int(&header[4..8]) as usize
        } else {
            BigEndian::read_u32(&header[4..8]) as usize
        };
        let body_start = pos + 10;
        let Some(body_end) = body_start.checked_add(size) else {
            break;
        };
        if body_end > payload.len() {
            break;
        }
        let id = String::from_utf8_lossy(id).into_owned();
        let body = &payload[body_start..body_end];
        decode_frame(&id, body, out, ctx);
        pos = body_end;
    }
}

fn decode_frame(id: &str, body: &[u8], out: &mut ParsedAudioMetadata, ctx: &mut ParseContext) {
    match id {
        "TXXX" | "COMM" => decode_described_frame(id, body, out),
        "APIC" => decode_apic(body, out, ctx),
        _ if id.starts_with('T') => decode_text_frame(id, body, out),
        _ => log::trace!("skipping id3v2 frame {}", id),
    }
}

fn decode_text_frame(id: &str, body: &[u8], out: &mut ParsedAudioMetadata) {
    let Some((encoding, text)) = split_encoding(body) else {
        return;
    };
    let values = decode_text(encoding, text);
    if !values.is_empty() {
        out.set_tag(id, TagValue::Text(values));
    }
}

/// `TXXX` and `COMM` carry a description before the value; the key becomes
/// `"<FRAMEID>:<description>"`. `COMM` additionally has a 3-byte language
/// code between the encoding and the description.
fn decode_described_frame(id: &str, body: &[u8], out: &mut ParsedAudioMetadata) {
    let Some((encoding, mut rest)) = split_encoding(body) else {
        return;
    };
    if id == "COMM" {
        if rest.len() < 3 {
            return;
        }
        rest = &rest[3..];
    }
    let (description, consumed) = take_terminated(encoding, rest);
    let values = decode_text(encoding, &rest[consumed..]);
    let key = format!("{}:{}", id, description);
    out.set_tag(key, TagValue::Text(values));
}

/// Attached picture: encoding byte, Latin-1 mime up to NUL, picture-type
/// byte, description, then the image payload.
fn decode_apic(body: &[u8], out: &mut ParsedAudioMetadata, ctx: &mut ParseContext) {
    let Some((encoding, rest)) = split_encoding(body) else {
        return;
    };
    let Some(mime_end) = rest.iter().position(|&b| b == 0) else {
        return;
    };
    let mime: String = rest[..mime_end].iter().map(|&b| b as char).collect();
    let rest = &rest[mime_end + 1..];
    if rest.is_empty() {
        return;
    }
    // Picture-type byte, then the description in the frame encoding.
    let rest = &rest[1..];
    let (_description, consumed) = take_terminated(encoding, rest);
    let payload = &rest[consumed..];
    let mime = if mime.is_empty() { None } else { Some(mime) };
    let digest = BinaryDigest::from_payload(payload, mime, ctx.options);
    out.set_tag("APIC", TagValue::Binary(digest));
}

/// Split off the leading encoding byte. Unknown encoding bytes abort the
/// frame rather than guessing.
fn split_encoding(body: &[u8]) -> Option<(TextEncoding, &[u8])> {
    let (&first, rest) = body.split_first()?;
    let encoding = TextEncoding::from_u8(first)?;
    Some((encoding, rest))
}

/// Decode frame text into the value list. UTF-8 and UTF-16 variants split on
/// NUL into multiple values, dropping empties; Latin-1 yields one value with
/// control characters trimmed.
fn decode_text(encoding: TextEncoding, bytes: &[u8]) -> Vec<String> {
    match encoding {
        TextEncoding::Latin1 => {
            let text: String = bytes.iter().map(|&b| b as char).collect();
            vec![text.trim_matches(|c: char| c.is_control()).to_owned()]
        }
        TextEncoding::Utf8 => String::from_utf8_lossy(bytes)
            .split('\0')
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
            .collect(),
        TextEncoding::Utf16 | TextEncoding::Utf16Be => decode_utf16(bytes)
            .split('\0')
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
            .collect(),
    }
}

/// BOM-aware UTF-16 decode with a UTF-16BE fallback when no BOM is present.
fn decode_utf16(bytes: &[u8]) -> String {
    let (big_endian, data) = match bytes {
        [0xFF, 0xFE, rest @ ..] => (false, rest),
        [0xFE, 0xFF, rest @ ..] => (true, rest),
        _ => (true, bytes),
    };
    let units: Vec<u16> = data
        .chunks_exact(2)
        .map(|pair| {
            if big_endian {
                u16::from_be_bytes([pair[0], pair[1]])
            } else {
                u16::from_le_bytes([pair[0], pair[1]])
            }
        })
        .collect();
    String::from_utf16_lossy(&units)
}

/// Consume a NUL-terminated string in the given encoding. Returns the string
/// and the number of bytes consumed including the terminator run.
fn take_terminated(encoding: TextEncoding, bytes: &[u8]) -> (String, usize) {
    match encoding {
        TextEncoding::Latin1 | TextEncoding::Utf8 => {
            let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
            let text = decode_text(encoding, &bytes[..end])
                .into_iter()
                .next()
                .unwrap_or_default();
            (text, (end + 1).min(bytes.len()))
        }
        TextEncoding::Utf16 | TextEncoding::Utf16Be => {
            let mut end = bytes.len();
            let mut consumed = bytes.len();
            let mut i = 0;
            while i + 2 <= bytes.len() {
                if bytes[i] == 0 && bytes[i + 1] == 0 {
                    end = i;
                    consumed = i + 2;
                    break;
                }
                i += 2;
            }
            (decode_utf16(&bytes[..end]), consumed)
        }
    }
}
