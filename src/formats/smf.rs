use crate::error::ParseError;
use crate::formats::{FormatParser, ParseContext};
use crate::metadata::{AudioFormat, ParsedAudioMetadata, TagValue};
use crate::prelude::*;
use crate::reader::WindowedReader;
use byteorder::{BigEndian, ByteOrder};

/// Default MIDI tempo: 120 beats per minute.
const DEFAULT_US_PER_QUARTER: u32 = 500_000;

pub struct SmfParser;

impl FormatParser for SmfParser {
    fn format(&self) -> AudioFormat {
        AudioFormat::Smf
    }

    fn can_parse(&self, header: &[u8], _name_hint: Option<&str>) -> bool {
        header.starts_with(b"MThd")
    }

    fn parse(
        &self,
        reader: &mut WindowedReader,
        ctx: &mut ParseContext,
    ) -> Result<ParsedAudioMetadata> {
        let header = reader.read(0, 14)?;
        if header.len() < 14 || &header[..4] != b"MThd" {
            return Err(ParseError::invalid_header("missing MThd header").at_offset(0));
        }
        let header_size = BigEndian::read_u32(&header[4..8]);
        let track_count = BigEndian::read_u16(&header[10..12]);
        let division = BigEndian::read_u16(&header[12..14]);

        let mut out = ParsedAudioMetadata::new(AudioFormat::Smf);
        out.set_extension("tracks", TagValue::Int(i64::from(track_count)));

        // SMPTE time division carries no musical tempo to integrate.
        if division & 0x8000 != 0 || division == 0 {
            return Ok(out);
        }
        let ticks_per_quarter = f64::from(division);

        let mut tempo_events: Vec<(u64, u32)> = Vec::new();
        let mut max_end_ticks = 0u64;

        let mut offset = 8 + u64::from(header_size);
        for _ in 0..track_count {
            let track_header = reader.read(offset, 8)?;
            if track_header.len() < 8 || &track_header[..4] != b"MTrk" {
                ctx.warn(format!("smf track chunk missing at {}", offset));
                break;
            }
            let track_len = BigEndian::read_u32(&track_header[4..8]) as usize;
            let body = reader.read(offset + 8, track_len)?;
            if body.len() < track_len {
                ctx.warn(format!("smf track body cut short at {}", offset + 8));
            }

            let (end_ticks, mut tempos) = walk_track(&body);
            max_end_ticks = max_end_ticks.max(end_ticks);
            tempo_events.append(&mut tempos);

            offset += 8 + track_len as u64;
        }

        tempo_events.sort_by_key(|&(tick, _)| tick);
        out.core.length = Some(integrate_tempo_map(
            &tempo_events,
            max_end_ticks,
            ticks_per_quarter,
        ));
        Ok(out)
    }
}

/// Walk one track's events, tracking running status, and collect the end
/// tick plus any `FF 51` set-tempo events.
fn walk_track(body: &[u8]) -> (u64, Vec<(u64, u32)>) {
    let mut pos = 0usize;
    let mut ticks = 0u64;
    let mut running_status: Option<u8> = None;
    let mut tempos = Vec::new();

    loop {
        let Some(delta) = read_vlq(body, &mut pos) else {
            break;
        };
        ticks += delta;

        let Some(&first) = body.get(pos) else {
            break;
        };
        let status = if first >= 0x80 {
            pos += 1;
            first
        } else {
            match running_status {
                Some(status) => status,
                None => break,
            }
        };

        match status {
            0xFF => {
                let Some(&meta_type) = body.get(pos) else {
                    break;
                };
                pos += 1;
                let Some(len) = read_vlq(body, &mut pos) else {
                    break;
                };
                let len = len as usize;
                if meta_type == 0x51 && len >= 3 && pos + 3 <= body.len() {
                    tempos.push((ticks, BigEndian::read_u24(&body[pos..pos + 3])));
                }
                let end_of_track = meta_type == 0x2F;
                pos += len;
                if end_of_track || pos > body.len() {
                    break;
                }
            }
            0xF0 | 0xF7 => {
                let Some(len) = read_vlq(body, &mut pos) else {
                    break;
                };
                pos += len as usize;
                if pos > body.len() {
                    break;
                }
            }
            _ => {
                running_status = Some(status);
                let data_bytes = match status & 0xF0 {
                    0xC0 | 0xD0 => 1,
                    _ => 2,
                };
                pos += data_bytes;
                if pos > body.len() {
                    break;
                }
            }
        }
    }
    (ticks, tempos)
}

/// Sum the per-segment durations between tempo changes.
fn integrate_tempo_map(
    tempo_events: &[(u64, u32)],
    end_ticks: u64,
    ticks_per_quarter: f64,
) -> f64 {
    let mut seconds = 0.0;
    let mut current_tempo = DEFAULT_US_PER_QUARTER;
    let mut last_tick = 0u64;
    for &(tick, tempo) in tempo_events {
        let tick = tick.min(end_ticks);
        seconds += (tick - last_tick) as f64 / ticks_per_quarter * f64::from(current_tempo) / 1e6;
        last_tick = tick;
        current_tempo = tempo;
    }
    seconds += (end_ticks.saturating_sub(last_tick)) as f64 / ticks_per_quarter
        * f64::from(current_tempo)
        / 1e6;
    seconds
}

/// MIDI variable-length quantity: up to four bytes, 7 bits each.
fn read_vlq(body: &[u8], pos: &mut usize) -> Option<u64> {
    let mut value = 0u64;
    for _ in 0..4 {
        let &byte = body.get(*pos)?;
        *pos += 1;
        value = (value << 7) | u64::from(byte & 0x7F);
        if byte & 0x80 == 0 {
            return Some(value);
        }
    }
    None
}
