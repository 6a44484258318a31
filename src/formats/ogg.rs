use crate::error::ParseError;
use crate::formats::{FormatParser, ParseContext};
use crate::metadata::{AudioFormat, ParsedAudioMetadata};
use crate::prelude::*;
use crate::probe::extension_of;
use crate::reader::WindowedReader;
use crate::tags::vorbis;
use byteorder::{BigEndian, ByteOrder, LittleEndian};

const PAGE_HEADER_LEN: usize = 27;

/// Enough packets for codec identification plus the comment packet; later
/// packets only matter for their granule positions.
const MAX_PACKETS_PER_STREAM: usize = 8;

const FLAG_EOS: u8 = 0x04;

pub struct OggParser;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OggCodec {
    Vorbis,
    Opus,
    Speex,
    Theora,
    Flac,
}

impl OggCodec {
    fn format(&self) -> AudioFormat {
        match self {
            OggCodec::Vorbis => AudioFormat::OggVorbis,
            OggCodec::Opus => AudioFormat::OggOpus,
            OggCodec::Speex => AudioFormat::OggSpeex,
            OggCodec::Theora => AudioFormat::OggTheora,
            OggCodec::Flac => AudioFormat::OggFlac,
        }
    }
}

struct LogicalStream {
    serial: u32,
    packets: Vec<Vec<u8>>,
    partial: Vec<u8>,
    last_granule: Option<u64>,
    saw_eos: bool,
}

impl LogicalStream {
    fn new(serial: u32) -> Self {
        LogicalStream {
            serial,
            packets: Vec::new(),
            partial: Vec::new(),
            last_granule: None,
            saw_eos: false,
        }
    }

    fn codec(&self) -> Option<OggCodec> {
        let first = self.packets.first()?;
        if first.starts_with(b"\x01vorbis") {
            Some(OggCodec::Vorbis)
        } else if first.starts_with(b"OpusHead") {
            Some(OggCodec::Opus)
        } else if first.starts_with(b"Speex   ") {
            Some(OggCodec::Speex)
        } else if first.starts_with(b"\x80theora") {
            Some(OggCodec::Theora)
        } else if first.starts_with(b"\x7FFLAC") {
            Some(OggCodec::Flac)
        } else {
            None
        }
    }
}

impl FormatParser for OggParser {
    fn format(&self) -> AudioFormat {
        AudioFormat::Ogg
    }

    fn can_parse(&self, header: &[u8], _name_hint: Option<&str>) -> bool {
        header.starts_with(b"OggS")
    }

    fn parse(
        &self,
        reader: &mut WindowedReader,
        ctx: &mut ParseContext,
    ) -> Result<ParsedAudioMetadata> {
        let mut out = ParsedAudioMetadata::new(AudioFormat::Ogg);
        let mut streams: Vec<LogicalStream> = Vec::new();
        let mut any_packet = false;

        let mut offset = 0u64;
        loop {
            let header = reader.read(offset, PAGE_HEADER_LEN)?;
            if header.is_empty() {
                break; // end of file
            }
            if header.len() < PAGE_HEADER_LEN {
                recover_or_fail(
                    ctx,
                    any_packet,
                    ParseError::truncated("ogg page header cut short").at_offset(offset),
                )?;
                break;
            }
            if &header[..4] != b"OggS" {
                recover_or_fail(
                    ctx,
                    any_packet,
                    ParseError::invalid_header("ogg page magic missing").at_offset(offset),
                )?;
                break;
            }

            let flags = header[5];
            let granule = LittleEndian::read_u64(&header[6..14]);
            let serial = LittleEndian::read_u32(&header[14..18]);
            let segment_count = header[26] as usize;

            let segment_table = reader.read(offset + PAGE_HEADER_LEN as u64, segment_count)?;
            if segment_table.len() < segment_count {
                recover_or_fail(
                    ctx,
                    any_packet,
                    ParseError::truncated("ogg segment table cut short").at_offset(offset),
                )?;
                break;
            }
            let payload_len: usize = segment_table.iter().map(|&s| s as usize).sum();
            let payload_offset = offset + (PAGE_HEADER_LEN + segment_count) as u64;
            let payload = reader.read(payload_offset, payload_len)?;
            if payload.len() < payload_len {
                recover_or_fail(
                    ctx,
                    any_packet,
                    ParseError::truncated("ogg page payload cut short").at_offset(payload_offset),
                )?;
                break;
            }

            let index = match streams.iter().position(|s| s.serial == serial) {
                Some(index) => index,
                None => {
                    streams.push(LogicalStream::new(serial));
                    streams.len() - 1
                }
            };
            let stream = &mut streams[index];

            // A segment shorter than 255 terminates the packet it closes.
            let mut cursor = 0usize;
            for &segment in segment_table.iter() {
                let segment = segment as usize;
                stream.partial.extend_from_slice(&payload[cursor..cursor + segment]);
                cursor += segment;
                if segment < 255 {
                    let packet = std::mem::take(&mut stream.partial);
                    any_packet = true;
                    if stream.packets.len() < MAX_PACKETS_PER_STREAM {
                        stream.packets.push(packet);
                    }
                }
            }

            if granule != u64::MAX {
                stream.last_granule = Some(granule);
            }
            if flags & FLAG_EOS != 0 {
                stream.saw_eos = true;
            }

            offset = payload_offset + payload_len as u64;

            let selected_done = streams
                .iter()
                .find(|s| s.codec().is_some())
                .map(|s| s.saw_eos)
                .unwrap_or(false);
            if selected_done {
                break;
            }
        }

        let detected = streams
            .iter()
            .find_map(|s| s.codec().map(|codec| (s, codec)));
        let selected = detected.or_else(|| {
            let codec = codec_from_extension(ctx.name_hint.as_deref())?;
            streams.first().map(|s| (s, codec))
        });

        let Some((stream, codec)) = selected else {
            ctx.warn("no recognisable codec in any ogg stream");
            return Ok(out);
        };
        out.format = codec.format();
        extract_codec(codec, stream, &mut out, ctx);
        Ok(out)
    }
}

/// Partial recovery: once at least one packet has been reconstructed, a torn
/// or misframed page degrades to a warning (unless strict mode forbids it).
fn recover_or_fail(ctx: &mut ParseContext, any_packet: bool, err: ParseError) -> Result<()> {
    if any_packet && !ctx.options.strict_mode {
        ctx.warn(format!("ogg walk stopped early: {}", err));
        Ok(())
    } else {
        Err(err)
    }
}

fn codec_from_extension(name_hint: Option<&str>) -> Option<OggCodec> {
    match extension_of(name_hint?)?.as_str() {
        "opus" => Some(OggCodec::Opus),
        "spx" => Some(OggCodec::Speex),
        "oggflac" => Some(OggCodec::Flac),
        "oggtheora" | "ogv" => Some(OggCodec::Theora),
        "ogg" | "oga" => Some(OggCodec::Vorbis),
        _ => None,
    }
}

fn extract_codec(
    codec: OggCodec,
    stream: &LogicalStream,
    out: &mut ParsedAudioMetadata,
    ctx: &mut ParseContext,
) {
    let mut pre_skip = 0u64;
    match codec {
        OggCodec::Vorbis => {
            if let Some(ident) = stream.packets.first() {
                if ident.len() >= 16 {
                    out.core.channels = Some(u32::from(ident[11]));
                    out.core.sample_rate = Some(LittleEndian::read_u32(&ident[12..16]));
                }
            }
            if let Some(comment) = stream.packets.get(1) {
                if comment.len() > 7 {
                    decode_comments(&comment[7..], out, ctx);
                }
            }
        }
        OggCodec::Opus => {
            out.core.sample_rate = Some(48000);
            if let Some(head) = stream.packets.first() {
                if head.len() >= 12 {
                    out.core.channels = Some(u32::from(head[9]));
                    pre_skip = u64::from(LittleEndian::read_u16(&head[10..12]));
                }
            }
            if let Some(tags) = stream
                .packets
                .iter()
                .find(|p| p.starts_with(b"OpusTags"))
            {
                if tags.len() > 8 {
                    decode_comments(&tags[8..], out, ctx);
                }
            }
        }
        OggCodec::Speex => {
            if let Some(head) = stream.packets.first() {
                if head.len() >= 52 {
                    out.core.sample_rate = Some(LittleEndian::read_u32(&head[36..40]));
                    out.core.channels = Some(LittleEndian::read_u32(&head[48..52]));
                }
            }
            if let Some(comment) = stream.packets.get(1) {
                decode_comments(comment, out, ctx);
            }
        }
        OggCodec::Theora => {
            extract_theora(stream, out, ctx);
            return;
        }
        OggCodec::Flac => {
            if let Some(first) = stream.packets.first() {
                if let Some(at) = find_subslice(first, b"fLaC") {
                    // Skip the magic and the STREAMINFO block header.
                    let si_start = at + 8;
                    if let Some(info) = first.get(si_start..si_start + 18) {
                        decode_ogg_flac_stream_info(info, out);
                    }
                }
            }
            if let Some(comment) = stream.packets.get(1) {
                // Header packets carry bare FLAC metadata blocks.
                if comment.len() > 4 && comment[0] & 0x7F == 4 {
                    decode_comments(&comment[4..], out, ctx);
                }
            }
        }
    }

    if let (Some(granule), Some(rate)) = (stream.last_granule, out.core.sample_rate) {
        if rate > 0 {
            let samples = granule.saturating_sub(pre_skip);
            out.core.length = Some(samples as f64 / f64::from(rate));
        }
    }
}

fn extract_theora(stream: &LogicalStream, out: &mut ParsedAudioMetadata, ctx: &mut ParseContext) {
    let mut fps = None;
    let mut granule_shift = 0u32;
    if let Some(ident) = stream.packets.first() {
        if ident.len() >= 42 {
            let num = BigEndian::read_u32(&ident[22..26]);
            let den = BigEndian::read_u32(&ident[26..30]);
            if num > 0 && den > 0 {
                fps = Some(f64::from(num) / f64::from(den));
            }
            let bitrate = BigEndian::read_u24(&ident[37..40]);
            if bitrate > 0 {
                out.core.bitrate = Some(bitrate);
            }
            granule_shift = u32::from((BigEndian::read_u16(&ident[40..42]) >> 5) & 0x1F);
        }
    }
    if let Some(comment) = stream.packets.iter().find(|p| p.first() == Some(&0x81)) {
        if comment.len() > 7 {
            decode_comments(&comment[7..], out, ctx);
        }
    }
    if let (Some(fps), Some(granule)) = (fps, stream.last_granule) {
        // The granule splits into a keyframe count and an offset since it.
        let frames = (granule >> granule_shift) + (granule & ((1u64 << granule_shift) - 1));
        out.core.length = Some(frames as f64 / fps);
    }
}

/// Ogg-FLAC STREAMINFO prefix: the first 18 bytes, which end with the packed
/// rate/channels/bits/total-samples region.
fn decode_ogg_flac_stream_info(info: &[u8], out: &mut ParsedAudioMetadata) {
    let packed = &info[10..18];
    let sample_rate =
        ((packed[0] as u32) << 12) + ((packed[1] as u32) << 4) + ((packed[2] as u32) >> 4);
    let channels = ((packed[2] >> 1) & 0b0000_0111) + 1;
    let bits_per_sample = ((packed[2] & 0b0000_0001) << 4) + (packed[3] >> 4) + 1;
    out.core.sample_rate = Some(sample_rate);
    out.core.channels = Some(u32::from(channels));
    out.core.bits_per_sample = Some(u32::from(bits_per_sample));
}

fn decode_comments(packet: &[u8], out: &mut ParsedAudioMetadata, ctx: &mut ParseContext) {
    if !ctx.options.parse_tags {
        return;
    }
    if let Err(err) = vorbis::parse_vorbis_comments(packet, out) {
        ctx.warn(format!("ogg comment packet unreadable: {}", err));
    }
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}
