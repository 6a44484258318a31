use crate::error::ParseError;
use crate::formats::{FormatParser, ParseContext};
use crate::metadata::{AudioFormat, ParsedAudioMetadata, TagValue};
use crate::prelude::*;
use crate::reader::WindowedReader;
use byteorder::{ByteOrder, LittleEndian};

const SAMPLE_RATES: [u32; 15] = [
    6000, 8000, 9600, 11025, 12000, 16000, 22050, 24000, 32000, 44100, 48000, 64000, 88200, 96000,
    192000,
];

const FLAG_MONO: u32 = 1 << 2;

pub struct WavPackParser;

impl FormatParser for WavPackParser {
    fn format(&self) -> AudioFormat {
        AudioFormat::WavPack
    }

    fn can_parse(&self, header: &[u8], _name_hint: Option<&str>) -> bool {
        header.starts_with(b"wvpk")
    }

    fn parse(
        &self,
        reader: &mut WindowedReader,
        _ctx: &mut ParseContext,
    ) -> Result<ParsedAudioMetadata> {
        let header = reader.read(0, 32)?;
        if header.len() < 32 || &header[..4] != b"wvpk" {
            return Err(ParseError::invalid_header("missing wvpk block header").at_offset(0));
        }
        let mut out = ParsedAudioMetadata::new(AudioFormat::WavPack);

        let version = LittleEndian::read_u16(&header[8..10]);
        let total_samples = LittleEndian::read_u32(&header[12..16]);
        let flags = LittleEndian::read_u32(&header[24..28]);

        out.set_extension("version", TagValue::text(format!("{:x}", version)));
        out.core.bits_per_sample = Some((flags & 0b11) * 8 + 8);
        out.core.channels = Some(if flags & FLAG_MONO != 0 { 1 } else { 2 });

        let rate_index = ((flags >> 23) & 0x0F) as usize;
        if let Some(&rate) = SAMPLE_RATES.get(rate_index) {
            out.core.sample_rate = Some(rate);
            if total_samples != u32::MAX && total_samples > 0 {
                let length = f64::from(total_samples) / f64::from(rate);
                out.core.length = Some(length);
                if let Some(file_len) = reader.source_len() {
                    out.core.bitrate = Some((file_len as f64 * 8.0 / length).round() as u32);
                }
            }
        }
        Ok(out)
    }
}
