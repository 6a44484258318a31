use crate::metadata::AudioFormat;
use std::collections::HashMap;

/// A probe hit: the more specific the signal, the higher the score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    pub format: AudioFormat,
    pub score: u32,
}

/// ASF header object GUID, stored in on-disk byte order.
pub(crate) const ASF_HEADER_GUID: [u8; 16] = [
    0x30, 0x26, 0xB2, 0x75, 0x8E, 0x66, 0xCF, 0x11, 0xA6, 0xD9, 0x00, 0xAA, 0x00, 0x62, 0xCE, 0x6C,
];

/// Score a header prefix (the engine passes 4 KiB) plus an optional filename
/// hint against every known format.
///
/// Returns candidates sorted by descending score; ties break by format name
/// ascending. The result is advisory only: the parser a candidate maps to
/// still gets to reject the input through its own `can_parse`.
pub fn probe(header: &[u8], name_hint: Option<&str>) -> Vec<Candidate> {
    let mut scores: HashMap<AudioFormat, u32> = HashMap::new();
    let mut bump = |format: AudioFormat, score: u32| {
        *scores.entry(format).or_insert(0) += score;
    };

    if header.starts_with(b"ID3") {
        bump(AudioFormat::Mp3, 80);
        bump(AudioFormat::Id3, 60);
    }
    if header.starts_with(b"fLaC") {
        bump(AudioFormat::Flac, 100);
    }
    if header.len() >= 12 && &header[..4] == b"RIFF" && &header[8..12] == b"WAVE" {
        bump(AudioFormat::Wave, 100);
    }
    if header.len() >= 12
        && &header[..4] == b"FORM"
        && (&header[8..12] == b"AIFF" || &header[8..12] == b"AIFC")
    {
        bump(AudioFormat::Aiff, 100);
    }
    if header.starts_with(b"OggS") {
        bump(AudioFormat::Ogg, 60);
    }
    if header.len() >= 8 && &header[4..8] == b"ftyp" {
        bump(AudioFormat::Mp4, 95);
        bump(AudioFormat::M4a, 95);
    }
    if header.len() >= 16 && header[..16] == ASF_HEADER_GUID {
        bump(AudioFormat::Asf, 100);
    }
    if header.starts_with(b"wvpk") {
        bump(AudioFormat::WavPack, 100);
    }
    if header.starts_with(b"MPCK") {
        bump(AudioFormat::Musepack, 100);
    }
    if header.starts_with(b"MAC ") {
        bump(AudioFormat::MonkeysAudio, 100);
    }
    if header.starts_with(b"TTA1") {
        bump(AudioFormat::TrueAudio, 100);
    }
    if header.starts_with(b"DSD ") {
        bump(AudioFormat::Dsf, 100);
    }
    if header.starts_with(b"FRM8") {
        bump(AudioFormat::Dsdiff, 100);
    }
    if header.starts_with(b"MThd") {
        bump(AudioFormat::Smf, 100);
    }
    if header.starts_with(b"OFR ") {
        bump(AudioFormat::OptimFrog, 100);
    }
    if header.starts_with(b"tBaK") {
        bump(AudioFormat::Tak, 100);
    }
    if header.starts_with(b"APET") {
        bump(AudioFormat::ApeV2, 90);
    }
    if header.len() >= 2 && header[0] == 0xFF && header[1] & 0xF0 == 0xF0 {
        // ADTS-like sync; plain MPEG audio also matches the wider pattern.
        bump(AudioFormat::Aac, 65);
        bump(AudioFormat::Mp3, 30);
    }
    if header.len() >= 2 && header[0] == 0x0B && header[1] == 0x77 {
        bump(AudioFormat::Ac3, 100);
        bump(AudioFormat::Eac3, 100);
    }

    if let Some(ext) = name_hint.and_then(extension_of) {
        for format in ALL_FORMATS {
            if format.extensions().contains(&ext.as_str()) {
                bump(*format, 25);
            }
        }
    }

    let mut candidates: Vec<Candidate> = scores
        .into_iter()
        .map(|(format, score)| Candidate { format, score })
        .collect();
    candidates.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| a.format.name().cmp(b.format.name()))
    });
    candidates
}

pub(crate) fn extension_of(name: &str) -> Option<String> {
    let (_, ext) = name.rsplit_once('.')?;
    if ext.is_empty() {
        None
    } else {
        Some(ext.to_ascii_lowercase())
    }
}

const ALL_FORMATS: &[AudioFormat] = &[
    AudioFormat::Mp3,
    AudioFormat::Id3,
    AudioFormat::Flac,
    AudioFormat::Mp4,
    AudioFormat::M4a,
    AudioFormat::Wave,
    AudioFormat::Aiff,
    AudioFormat::Asf,
    AudioFormat::ApeV2,
    AudioFormat::Musepack,
    AudioFormat::WavPack,
    AudioFormat::Tak,
    AudioFormat::Dsf,
    AudioFormat::Dsdiff,
    AudioFormat::Aac,
    AudioFormat::Ac3,
    AudioFormat::Eac3,
    AudioFormat::Ogg,
    AudioFormat::OggVorbis,
    AudioFormat::OggOpus,
    AudioFormat::OggSpeex,
    AudioFormat::OggTheora,
    AudioFormat::OggFlac,
    AudioFormat::TrueAudio,
    AudioFormat::OptimFrog,
    AudioFormat::Smf,
    AudioFormat::MonkeysAudio,
    AudioFormat::Unknown,
];
