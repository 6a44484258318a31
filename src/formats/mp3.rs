use crate::error::ParseError;
use crate::formats::{FormatParser, ParseContext};
use crate::metadata::{AudioFormat, ParsedAudioMetadata, TagValue};
use crate::prelude::*;
use crate::probe::extension_of;
use crate::reader::WindowedReader;
use crate::tags::{ape, id3};
use byteorder::{BigEndian, ByteOrder};

/// How far past the tag area we are willing to look for the first MPEG sync.
const SYNC_SCAN_LEN: usize = 128 * 1024;

pub struct Mp3Parser;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MpegVersion {
    V1,
    V2,
    V25,
}

impl MpegVersion {
    fn as_str(&self) -> &'static str {
        match self {
            MpegVersion::V1 => "1",
            MpegVersion::V2 => "2",
            MpegVersion::V25 => "2.5",
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct FrameHeader {
    version: MpegVersion,
    layer: u8,
    /// Bits per second from the header table.
    bitrate: u32,
    sample_rate: u32,
    /// 3 = single channel.
    channel_mode: u8,
}

impl FrameHeader {
    fn channels(&self) -> u32 {
        if self.channel_mode == 3 {
            1
        } else {
            2
        }
    }

    fn samples_per_frame(&self) -> u32 {
        match self.layer {
            1 => 384,
            2 => 1152,
            _ => match self.version {
                MpegVersion::V1 => 1152,
                _ => 576,
            },
        }
    }

    /// Side-information length decides where a Xing/Info header can sit.
    fn side_info_len(&self) -> usize {
        match (self.version, self.channel_mode) {
            (MpegVersion::V1, 3) => 17,
            (MpegVersion::V1, _) => 32,
            (_, 3) => 9,
            (_, _) => 17,
        }
    }
}

const BITRATES_V1: [[u32; 14]; 3] = [
    // Layer I
    [
        32, 64, 96, 128, 160, 192, 224, 256, 288, 320, 352, 384, 416, 448,
    ],
    // Layer II
    [
        32, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320, 384,
    ],
    // Layer III
    [
        32, 40, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320,
    ],
];

const BITRATES_V2: [[u32; 14]; 3] = [
    [
        32, 48, 56, 64, 80, 96, 112, 128, 144, 160, 176, 192, 224, 256,
    ],
    [8, 16, 24, 32, 40, 48, 56, 64, 80, 96, 112, 128, 144, 160],
    [8, 16, 24, 32, 40, 48, 56, 64, 80, 96, 112, 128, 144, 160],
];

fn decode_frame_header(bytes: &[u8]) -> Option<FrameHeader> {
    if bytes.len() < 4 || bytes[0] != 0xFF || bytes[1] & 0xE0 != 0xE0 {
        return None;
    }
    let version = match (bytes[1] >> 3) & 0b11 {
        0 => MpegVersion::V25,
        1 => return None, // reserved bit pattern
        2 => MpegVersion::V2,
        _ => MpegVersion::V1,
    };
    let layer = match (bytes[1] >> 1) & 0b11 {
        0 => return None,
        bits => 4 - bits,
    };
    let bitrate_index = bytes[2] >> 4;
    if bitrate_index == 0 || bitrate_index == 0xF {
        return None;
    }
    let sample_rate_index = (bytes[2] >> 2) & 0b11;
    if sample_rate_index == 3 {
        return None;
    }
    let table = match version {
        MpegVersion::V1 => &BITRATES_V1,
        _ => &BITRATES_V2,
    };
    let bitrate = table[layer as usize - 1][bitrate_index as usize - 1] * 1000;
    let sample_rate = match version {
        MpegVersion::V1 => [44100, 48000, 32000],
        MpegVersion::V2 => [22050, 24000, 16000],
        MpegVersion::V25 => [11025, 12000, 8000],
    }[sample_rate_index as usize];

    Some(FrameHeader {
        version,
        layer,
        bitrate,
        sample_rate,
        channel_mode: bytes[3] >> 6,
    })
}

fn find_frame(buf: &[u8]) -> Option<(usize, FrameHeader)> {
    let mut pos = 0;
    while pos + 4 <= buf.len() {
        if buf[pos] == 0xFF && buf[pos + 1] & 0xE0 == 0xE0 {
            if let Some(header) = decode_frame_header(&buf[pos..]) {
                return Some((pos, header));
            }
        }
        pos += 1;
    }
    None
}

#[derive(Default)]
struct VbrInfo {
    frame_count: Option<u32>,
    byte_count: Option<u32>,
    /// Xing implies VBR, Info implies CBR.
    is_vbr: bool,
    found: bool,
    encoder_info: Option<String>,
}

/// Xing/Info sits right behind the side information; VBRI sits at a fixed 32
/// bytes past the frame header.
fn read_vbr_headers(buf: &[u8], frame_pos: usize, header: &FrameHeader) -> VbrInfo {
    let mut info = VbrInfo::default();

    let xing_pos = frame_pos + 4 + header.side_info_len();
    if buf.len() >= xing_pos + 8 {
        let marker = &buf[xing_pos..xing_pos + 4];
        if marker == b"Xing" || marker == b"Info" {
            info.found = true;
            info.is_vbr = marker == b"Xing";
            let flags = BigEndian::read_u32(&buf[xing_pos + 4..xing_pos + 8]);
            let mut cursor = xing_pos + 8;
            if flags & 0x1 != 0 && buf.len() >= cursor + 4 {
                info.frame_count = Some(BigEndian::read_u32(&buf[cursor..cursor + 4]));
                cursor += 4;
            }
            if flags & 0x2 != 0 && buf.len() >= cursor + 4 {
                info.byte_count = Some(BigEndian::read_u32(&buf[cursor..cursor + 4]));
                cursor += 4;
            }
            if flags & 0x4 != 0 {
                cursor += 100; // TOC
            }
            if flags & 0x8 != 0 {
                cursor += 4; // quality
            }
            info.encoder_info = find_lame_tag(buf, cursor);
            return info;
        }
    }

    let vbri_pos = frame_pos + 4 + 32;
    if buf.len() >= vbri_pos + 18 && &buf[vbri_pos..vbri_pos + 4] == b"VBRI" {
        info.found = true;
        info.is_vbr = true;
        info.byte_count = Some(BigEndian::read_u32(&buf[vbri_pos + 10..vbri_pos + 14]));
        info.frame_count = Some(BigEndian::read_u32(&buf[vbri_pos + 14..vbri_pos + 18]));
    }
    info
}

/// Scan the next 16 bytes for `LAME` and record a 16-byte ASCII slice.
fn find_lame_tag(buf: &[u8], from: usize) -> Option<String> {
    let window_end = (from + 16).min(buf.len());
    let window = buf.get(from..window_end)?;
    let at = window.windows(4).position(|w| w == b"LAME")?;
    let start = from + at;
    let end = (start + 16).min(buf.len());
    let text = String::from_utf8_lossy(&buf[start..end]);
    Some(
        text.trim_end_matches(|c: char| c == '\0' || c.is_control() || c == ' ')
            .to_owned(),
    )
}

impl FormatParser for Mp3Parser {
    fn format(&self) -> AudioFormat {
        AudioFormat::Mp3
    }

    fn can_parse(&self, header: &[u8], name_hint: Option<&str>) -> bool {
        if header.starts_with(b"ID3") || find_frame(header).is_some() {
            return true;
        }
        name_hint
            .and_then(extension_of)
            .map(|ext| ext == "mp3")
            .unwrap_or(false)
    }

    fn parse(
        &self,
        reader: &mut WindowedReader,
        ctx: &mut ParseContext,
    ) -> Result<ParsedAudioMetadata> {
        let mut out = ParsedAudioMetadata::new(AudioFormat::Mp3);

        let mut offset = 0u64;
        if let Some(tag_size) = id3::parse_id3v2(reader, 0, &mut out, ctx)? {
            offset = tag_size;
        }

        let buf = reader.read(offset, SYNC_SCAN_LEN)?;
        let (frame_pos, header) = find_frame(&buf).ok_or_else(|| {
            ParseError::invalid_header("no MPEG frame sync found").at_offset(offset)
        })?;

        out.core.sample_rate = Some(header.sample_rate);
        out.core.channels = Some(header.channels());
        out.set_extension("mpeg_version", TagValue::text(header.version.as_str()));

        let vbr = read_vbr_headers(&buf, frame_pos, &header);
        let mode = if vbr.found && vbr.is_vbr { "VBR" } else { "CBR" };
        out.set_extension("bitrate_mode", TagValue::text(mode));
        if let Some(encoder) = vbr.encoder_info.clone() {
            out.set_extension("encoder_info", TagValue::text(encoder));
        }

        let mut length = None;
        if let Some(frames) = vbr.frame_count {
            length = Some(
                f64::from(frames) * f64::from(header.samples_per_frame())
                    / f64::from(header.sample_rate),
            );
        }
        let mut bitrate = None;
        if let (Some(bytes), Some(secs)) = (vbr.byte_count, length) {
            if secs > 0.0 {
                bitrate = Some((f64::from(bytes) * 8.0 / secs).round() as u32);
            }
        }
        if bitrate.is_none() {
            bitrate = Some(header.bitrate);
        }
        if length.is_none() {
            // No VBR accounting: assume constant bitrate over the audio data.
            if let Some(file_len) = reader.source_len() {
                let audio_bytes = file_len.saturating_sub(offset + frame_pos as u64);
                if header.bitrate > 0 {
                    length = Some(audio_bytes as f64 * 8.0 / f64::from(header.bitrate));
                }
            }
        }
        out.core.length = length;
        out.core.bitrate = bitrate;

        ape::recover_footer(reader, &mut out, ctx);
        Ok(out)
    }
}
