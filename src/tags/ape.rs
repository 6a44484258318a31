use crate::formats::ParseContext;
use crate::metadata::{BinaryDigest, ParsedAudioMetadata, TagValue};
use crate::prelude::*;
use crate::reader::WindowedReader;
use byteorder::{ByteOrder, LittleEndian};

const FOOTER_MAGIC: &[u8; 8] = b"APETAGEX";
const FOOTER_LEN: u64 = 32;

/// Hard ceiling on decoded items regardless of the declared count.
const MAX_ITEMS: u32 = 512;

/// Parse an APEv2 tag from the footer record at the end of the source.
///
/// Returns `true` when a tag was found. An absent tag is simply `false`;
/// only reader failures surface as errors.
pub fn parse_apev2_footer(
    reader: &mut WindowedReader,
    out: &mut ParsedAudioMetadata,
    ctx: &mut ParseContext,
) -> Result<bool> {
    let Some(file_len) = reader.source_len() else {
        return Ok(false);
    };
    if file_len < FOOTER_LEN {
        return Ok(false);
    }
    let footer = reader.read(file_len - FOOTER_LEN, FOOTER_LEN as usize)?;
    if footer.len() < FOOTER_LEN as usize || &footer[..8] != FOOTER_MAGIC {
        return Ok(false);
    }

    let size = LittleEndian::read_u32(&footer[12..16]) as u64;
    let item_count = LittleEndian::read_u32(&footer[16..20]);
    if size < FOOTER_LEN || size > file_len {
        ctx.warn(format!("apev2 footer declares impossible size {}", size));
        return Ok(false);
    }
    if !ctx.options.parse_tags {
        return Ok(true);
    }

    let tag_start = file_len - size;
    let region = reader.read_exact(tag_start, size as usize)?;
    decode_items(&region, item_count.min(MAX_ITEMS), out, ctx);
    Ok(true)
}

pub(crate) fn decode_items(
    region: &[u8],
    item_count: u32,
    out: &mut ParsedAudioMetadata,
    ctx: &mut ParseContext,
) {
    let mut pos = 0usize;
    let mut decoded = 0u32;
    while decoded < item_count && pos + 8 <= region.len() {
        // A header record means we walked into the tag's other bookend.
        if region[pos..].starts_with(FOOTER_MAGIC) {
            break;
        }
        let value_size = LittleEndian::read_u32(&region[pos..pos + 4]) as usize;
        let flags = LittleEndian::read_u32(&region[pos + 4..pos + 8]);
        let key_start = pos + 8;
        let Some(key_len) = region[key_start..].iter().position(|&b| b == 0) else {
            break;
        };
        let key = String::from_utf8_lossy(&region[key_start..key_start + key_len]).into_owned();
        let value_start = key_start + key_len + 1;
        let Some(value_end) = value_start.checked_add(value_size) else {
            break;
        };
        if value_end > region.len() {
            break;
        }
        let value = &region[value_start..value_end];

        // Flag bits 1..2 select the item type; 0 is UTF-8 text, anything
        // else is treated as an opaque payload.
        if (flags >> 1) & 0b11 == 0 {
            let text = String::from_utf8_lossy(value);
            let values: Vec<String> = text.split('\0').map(str::to_owned).collect();
            out.set_tag(key, TagValue::Text(values));
        } else {
            let digest = BinaryDigest::from_payload(value, None, ctx.options);
            out.set_tag(key, TagValue::Binary(digest));
        }
        decoded += 1;
        pos = value_end;
    }
}

/// Best-effort variant for formats where the APEv2 footer is optional: a
/// malformed tag becomes a diagnostic warning instead of a parse failure.
pub fn recover_footer(
    reader: &mut WindowedReader,
    out: &mut ParsedAudioMetadata,
    ctx: &mut ParseContext,
) {
    if let Err(err) = parse_apev2_footer(reader, out, ctx) {
        ctx.warn(format!("apev2 footer unreadable: {}", err));
    }
}
