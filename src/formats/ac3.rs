use crate::error::ParseError;
use crate::formats::{BitCursor, FormatParser, ParseContext};
use crate::metadata::{AudioFormat, ParsedAudioMetadata, TagValue};
use crate::prelude::*;
use crate::reader::WindowedReader;

const SAMPLE_RATES: [u32; 3] = [48000, 44100, 32000];

/// Nominal bitrates in kbit/s, indexed by `frmsizecod >> 1`.
const BITRATES: [u32; 19] = [
    32, 40, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320, 384, 448, 512, 576, 640,
];

/// Full-bandwidth channels per audio coding mode.
const ACMOD_CHANNELS: [u32; 8] = [2, 1, 2, 3, 3, 4, 4, 5];

pub struct Ac3Parser;

impl FormatParser for Ac3Parser {
    fn format(&self) -> AudioFormat {
        AudioFormat::Ac3
    }

    fn can_parse(&self, header: &[u8], _name_hint: Option<&str>) -> bool {
        header.len() >= 2 && header[0] == 0x0B && header[1] == 0x77
    }

    fn parse(
        &self,
        reader: &mut WindowedReader,
        _ctx: &mut ParseContext,
    ) -> Result<ParsedAudioMetadata> {
        let frame = reader.read(0, 8)?;
        if frame.len() < 8 || frame[0] != 0x0B || frame[1] != 0x77 {
            return Err(ParseError::invalid_header("missing AC-3 syncword").at_offset(0));
        }

        let fscod = frame[4] >> 6;
        let frmsizecod = frame[4] & 0x3F;
        let bsid = frame[5] >> 3;
        if fscod == 3 {
            return Err(ParseError::invalid_header("reserved AC-3 sample rate code").at_offset(4));
        }

        let format = if bsid > 10 {
            AudioFormat::Eac3
        } else {
            AudioFormat::Ac3
        };
        let mut out = ParsedAudioMetadata::new(format);
        out.set_extension("bsid", TagValue::Int(i64::from(bsid)));
        out.core.sample_rate = Some(SAMPLE_RATES[fscod as usize]);

        // The lfeon bit floats behind a handful of acmod-conditional fields.
        let mut bits = BitCursor::new(&frame[6..]);
        let acmod = bits.take(3);
        if acmod & 0x1 != 0 && acmod != 0x1 {
            bits.take(2); // cmixlev
        }
        if acmod & 0x4 != 0 {
            bits.take(2); // surmixlev
        }
        if acmod == 0x2 {
            bits.take(2); // dsurmod
        }
        let lfeon = bits.take(1);
        out.core.channels = Some(ACMOD_CHANNELS[acmod as usize] + u32::from(lfeon));

        if let Some(&kbps) = BITRATES.get((frmsizecod >> 1) as usize) {
            let bitrate = kbps * 1000;
            out.core.bitrate = Some(bitrate);
            if let Some(file_len) = reader.source_len() {
                out.core.length = Some(file_len as f64 * 8.0 / f64::from(bitrate));
            }
        }
        Ok(out)
    }
}
