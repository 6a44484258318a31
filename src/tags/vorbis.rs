use crate::error::ParseError;
use crate::metadata::ParsedAudioMetadata;
use crate::prelude::*;
use byteorder::{ByteOrder, LittleEndian};

/// Decode a Vorbis comment packet (framing bit excluded) into tags.
///
/// Keys are case-insensitive per the Vorbis comment rules, so they are
/// uppercased here; repeated keys accumulate into a multi-value list
/// preserving packet order. The vendor string is skipped.
pub fn parse_vorbis_comments(packet: &[u8], out: &mut ParsedAudioMetadata) -> Result<()> {
    let mut pos = 0usize;
    let vendor_len = read_u32(packet, &mut pos)? as usize;
    if pos + vendor_len > packet.len() {
        return Err(truncated("vendor string", pos));
    }
    pos += vendor_len;

    let comment_count = read_u32(packet, &mut pos)?;
    for _ in 0..comment_count {
        let len = read_u32(packet, &mut pos)? as usize;
        if pos + len > packet.len() {
            return Err(truncated("comment entry", pos));
        }
        let entry = String::from_utf8_lossy(&packet[pos..pos + len]);
        pos += len;

        let (key, value) = match entry.split_once('=') {
            Some((key, value)) => (key.to_owned(), value.to_owned()),
            None => (entry.into_owned(), String::new()),
        };
        out.push_text_tag(key.to_ascii_uppercase(), value);
    }
    Ok(())
}

fn read_u32(packet: &[u8], pos: &mut usize) -> Result<u32> {
    if *pos + 4 > packet.len() {
        return Err(truncated("length field", *pos));
    }
    let value = LittleEndian::read_u32(&packet[*pos..*pos + 4]);
    *pos += 4;
    Ok(value)
}

fn truncated(what: &str, pos: usize) -> ParseError {
    ParseError::invalid_tag(format!("vorbis comment truncated at {}", what)).at_offset(pos as u64)
}
