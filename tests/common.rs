//! Hand-built fixtures shared by the integration tests.

#![allow(dead_code)]

/// `fLaC` + a single last STREAMINFO block: 44100 Hz, stereo, 16 bits,
/// 441000 total samples (ten seconds).
pub fn minimal_flac() -> Vec<u8> {
    let mut data = Vec::new();
    data.extend_from_slice(b"fLaC");
    data.extend_from_slice(&[0x80, 0x00, 0x00, 0x22]);
    data.extend_from_slice(&stream_info_body());
    data
}

pub fn stream_info_body() -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(&4608u16.to_be_bytes()); // min block size
    body.extend_from_slice(&4608u16.to_be_bytes()); // max block size
    body.extend_from_slice(&[0, 0, 0]); // min frame size
    body.extend_from_slice(&[0, 0, 0]); // max frame size
    // 44100 Hz, channels-1 = 1, bits-1 = 15, total samples 441000.
    body.extend_from_slice(&[0x0A, 0xC4, 0x42, 0xF0, 0x00, 0x06, 0xBA, 0xA8]);
    body.extend_from_slice(&[0u8; 16]); // md5
    body
}

/// FLAC with STREAMINFO plus one extra metadata block appended last.
pub fn flac_with_block(block_type: u8, body: &[u8]) -> Vec<u8> {
    let mut data = Vec::new();
    data.extend_from_slice(b"fLaC");
    data.extend_from_slice(&[0x00, 0x00, 0x00, 0x22]);
    data.extend_from_slice(&stream_info_body());
    data.push(0x80 | block_type);
    let len = (body.len() as u32).to_be_bytes();
    data.extend_from_slice(&len[1..4]);
    data.extend_from_slice(body);
    data
}

pub fn vorbis_comment_block(vendor: &str, comments: &[&str]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(&(vendor.len() as u32).to_le_bytes());
    body.extend_from_slice(vendor.as_bytes());
    body.extend_from_slice(&(comments.len() as u32).to_le_bytes());
    for comment in comments {
        body.extend_from_slice(&(comment.len() as u32).to_le_bytes());
        body.extend_from_slice(comment.as_bytes());
    }
    body
}

/// ID3v2.3 tag with a single TIT2 frame carrying UTF-8 `text`.
pub fn id3v2_with_tit2(text: &str) -> Vec<u8> {
    let frame_body_len = 1 + text.len();
    let payload_len = 10 + frame_body_len;
    let mut data = Vec::new();
    data.extend_from_slice(b"ID3");
    data.extend_from_slice(&[0x03, 0x00, 0x00]);
    data.extend_from_slice(&synchsafe(payload_len as u32));
    data.extend_from_slice(b"TIT2");
    data.extend_from_slice(&(frame_body_len as u32).to_be_bytes());
    data.extend_from_slice(&[0x00, 0x00]); // frame flags
    data.push(0x03); // UTF-8
    data.extend_from_slice(text.as_bytes());
    data
}

pub fn synchsafe(value: u32) -> [u8; 4] {
    [
        ((value >> 21) & 0x7F) as u8,
        ((value >> 14) & 0x7F) as u8,
        ((value >> 7) & 0x7F) as u8,
        (value & 0x7F) as u8,
    ]
}

/// MP3: empty ID3v2 header, then one MPEG-1 Layer III stereo frame at 44100
/// Hz with a Xing header declaring `frames` frames and `bytes` bytes.
pub fn mp3_with_xing(frames: u32, bytes: u32) -> Vec<u8> {
    let mut data = Vec::new();
    data.extend_from_slice(b"ID3");
    data.extend_from_slice(&[0x03, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00]);
    // Frame header: MPEG-1 Layer III, 128 kbps, 44100 Hz, stereo.
    data.extend_from_slice(&[0xFF, 0xFB, 0x90, 0x00]);
    data.extend_from_slice(&[0u8; 32]); // side information
    data.extend_from_slice(b"Xing");
    data.extend_from_slice(&3u32.to_be_bytes()); // frames + bytes flags
    data.extend_from_slice(&frames.to_be_bytes());
    data.extend_from_slice(&bytes.to_be_bytes());
    data.extend_from_slice(&[0u8; 256]);
    data
}

/// RIFF/WAVE with a 16-byte fmt chunk and an empty-bodied data chunk whose
/// declared size alone drives the length computation.
pub fn wave_pcm(channels: u16, sample_rate: u32, bits: u16, data_size: u32) -> Vec<u8> {
    let byte_rate = sample_rate * u32::from(channels) * u32::from(bits) / 8;
    let mut data = Vec::new();
    data.extend_from_slice(b"RIFF");
    data.extend_from_slice(&(36u32).to_le_bytes());
    data.extend_from_slice(b"WAVE");
    data.extend_from_slice(b"fmt ");
    data.extend_from_slice(&16u32.to_le_bytes());
    data.extend_from_slice(&1u16.to_le_bytes()); // PCM
    data.extend_from_slice(&channels.to_le_bytes());
    data.extend_from_slice(&sample_rate.to_le_bytes());
    data.extend_from_slice(&byte_rate.to_le_bytes());
    data.extend_from_slice(&(u32::from(channels) * u32::from(bits) / 8).to_le_bytes()[..2]);
    data.extend_from_slice(&bits.to_le_bytes());
    data.extend_from_slice(b"data");
    data.extend_from_slice(&data_size.to_le_bytes());
    data
}

pub fn atom(kind: &[u8; 4], payload: &[u8]) -> Vec<u8> {
    let mut data = Vec::new();
    data.extend_from_slice(&((payload.len() + 8) as u32).to_be_bytes());
    data.extend_from_slice(kind);
    data.extend_from_slice(payload);
    data
}

/// An M4A with one audio trak (44100 Hz, stereo, 16-bit, ten seconds) and a
/// `covr` ilst item holding `picture` as a JPEG.
pub fn m4a_with_cover(picture: &[u8]) -> Vec<u8> {
    let mut ftyp_payload = Vec::new();
    ftyp_payload.extend_from_slice(b"M4A ");
    ftyp_payload.extend_from_slice(&0u32.to_be_bytes());
    ftyp_payload.extend_from_slice(b"isom");

    // mdhd v0: timescale 44100, duration 441000.
    let mut mdhd_payload = vec![0u8; 12];
    mdhd_payload.extend_from_slice(&44100u32.to_be_bytes());
    mdhd_payload.extend_from_slice(&441000u32.to_be_bytes());
    mdhd_payload.extend_from_slice(&[0u8; 4]);

    let mut hdlr_payload = vec![0u8; 8];
    hdlr_payload.extend_from_slice(b"soun");
    hdlr_payload.extend_from_slice(&[0u8; 12]);

    // stsd with a single mp4a sample entry.
    let mut entry = Vec::new();
    entry.extend_from_slice(&36u32.to_be_bytes());
    entry.extend_from_slice(b"mp4a");
    entry.extend_from_slice(&[0u8; 8]); // reserved + data ref index
    entry.extend_from_slice(&[0u8; 8]); // version, revision, vendor
    entry.extend_from_slice(&2u16.to_be_bytes()); // channels
    entry.extend_from_slice(&16u16.to_be_bytes()); // bits per sample
    entry.extend_from_slice(&[0u8; 4]); // pre-defined, reserved
    entry.extend_from_slice(&(44100u32 << 16).to_be_bytes()); // 16.16 rate
    let mut stsd_payload = vec![0u8; 4];
    stsd_payload.extend_from_slice(&1u32.to_be_bytes());
    stsd_payload.extend_from_slice(&entry);

    let stbl = atom(b"stbl", &atom(b"stsd", &stsd_payload));
    let minf = atom(b"minf", &stbl);
    let mut mdia_children = atom(b"mdhd", &mdhd_payload);
    mdia_children.extend_from_slice(&atom(b"hdlr", &hdlr_payload));
    mdia_children.extend_from_slice(&minf);
    let trak = atom(b"trak", &atom(b"mdia", &mdia_children));

    let mut data_payload = Vec::new();
    data_payload.extend_from_slice(&13u32.to_be_bytes()); // JPEG type code
    data_payload.extend_from_slice(&0u32.to_be_bytes()); // locale
    data_payload.extend_from_slice(picture);
    let covr = atom(b"covr", &atom(b"data", &data_payload));
    let ilst = atom(b"ilst", &covr);
    let mut meta_payload = vec![0u8; 4]; // version/flags
    meta_payload.extend_from_slice(&ilst);
    let udta = atom(b"udta", &atom(b"meta", &meta_payload));

    let mut moov_children = trak;
    moov_children.extend_from_slice(&udta);
    let moov = atom(b"moov", &moov_children);

    let mut data = atom(b"ftyp", &ftyp_payload);
    data.extend_from_slice(&moov);
    data
}

/// `ilst` item atom wrapping a single `data` child.
pub fn ilst_item(key: &[u8; 4], type_code: u32, value: &[u8]) -> Vec<u8> {
    let mut data_payload = Vec::new();
    data_payload.extend_from_slice(&type_code.to_be_bytes());
    data_payload.extend_from_slice(&0u32.to_be_bytes()); // locale
    data_payload.extend_from_slice(value);
    atom(key, &atom(b"data", &data_payload))
}

/// An M4A carrying only tag items: ftyp plus `moov/udta/meta/ilst` built
/// from the given pre-assembled item atoms.
pub fn m4a_with_ilst_items(items: &[Vec<u8>]) -> Vec<u8> {
    let mut ftyp_payload = Vec::new();
    ftyp_payload.extend_from_slice(b"M4A ");
    ftyp_payload.extend_from_slice(&0u32.to_be_bytes());
    ftyp_payload.extend_from_slice(b"isom");

    let mut ilst_children = Vec::new();
    for item in items {
        ilst_children.extend_from_slice(item);
    }
    let ilst = atom(b"ilst", &ilst_children);
    let mut meta_payload = vec![0u8; 4]; // version/flags
    meta_payload.extend_from_slice(&ilst);
    let udta = atom(b"udta", &atom(b"meta", &meta_payload));
    let moov = atom(b"moov", &udta);

    let mut data = atom(b"ftyp", &ftyp_payload);
    data.extend_from_slice(&moov);
    data
}

/// FORM/AIFF with a COMM chunk: 44100 Hz (80-bit extended), stereo, 16
/// bits, 88200 sample frames (two seconds).
pub fn aiff_pcm() -> Vec<u8> {
    let mut data = Vec::new();
    data.extend_from_slice(b"FORM");
    data.extend_from_slice(&30u32.to_be_bytes());
    data.extend_from_slice(b"AIFF");
    data.extend_from_slice(b"COMM");
    data.extend_from_slice(&18u32.to_be_bytes());
    data.extend_from_slice(&2u16.to_be_bytes()); // channels
    data.extend_from_slice(&88200u32.to_be_bytes()); // sample frames
    data.extend_from_slice(&16u16.to_be_bytes()); // bits per sample
    data.extend_from_slice(&[0x40, 0x0E, 0xAC, 0x44, 0, 0, 0, 0, 0, 0]); // 44100
    data
}

pub fn utf16le_z(text: &str) -> Vec<u8> {
    let mut out = Vec::new();
    for unit in text.encode_utf16() {
        out.extend_from_slice(&unit.to_le_bytes());
    }
    out.extend_from_slice(&[0, 0]);
    out
}

fn asf_object(guid: &[u8; 16], payload: &[u8]) -> Vec<u8> {
    let mut object = Vec::new();
    object.extend_from_slice(guid);
    object.extend_from_slice(&((payload.len() + 24) as u64).to_le_bytes());
    object.extend_from_slice(payload);
    object
}

/// ASF with file properties (30 s net of a 3 s preroll), an audio stream
/// properties object (stereo, 44100 Hz, 16 bits, 16000 B/s) and a content
/// description.
pub fn asf_wma() -> Vec<u8> {
    const HEADER_GUID: [u8; 16] = [
        0x30, 0x26, 0xB2, 0x75, 0x8E, 0x66, 0xCF, 0x11, 0xA6, 0xD9, 0x00, 0xAA, 0x00, 0x62, 0xCE,
        0x6C,
    ];
    const FILE_PROPERTIES_GUID: [u8; 16] = [
        0xA1, 0xDC, 0xAB, 0x8C, 0x47, 0xA9, 0xCF, 0x11, 0x8E, 0xE4, 0x00, 0xC0, 0x0C, 0x20, 0x53,
        0x65,
    ];
    const STREAM_PROPERTIES_GUID: [u8; 16] = [
        0x91, 0x07, 0xDC, 0xB7, 0xB7, 0xA9, 0xCF, 0x11, 0x8E, 0xE6, 0x00, 0xC0, 0x0C, 0x20, 0x53,
        0x65,
    ];
    const CONTENT_DESCRIPTION_GUID: [u8; 16] = [
        0x33, 0x26, 0xB2, 0x75, 0x8E, 0x66, 0xCF, 0x11, 0xA6, 0xD9, 0x00, 0xAA, 0x00, 0x62, 0xCE,
        0x6C,
    ];
    const AUDIO_MEDIA_GUID: [u8; 16] = [
        0x40, 0x9E, 0x69, 0xF8, 0x4D, 0x5B, 0xCF, 0x11, 0xA8, 0xFD, 0x00, 0x80, 0x5F, 0x5C, 0x44,
        0x2B,
    ];

    let mut file_props = vec![0u8; 40];
    file_props.extend_from_slice(&330_000_000u64.to_le_bytes()); // play duration, 100 ns
    file_props.extend_from_slice(&0u64.to_le_bytes()); // send duration
    file_props.extend_from_slice(&3000u64.to_le_bytes()); // preroll, ms
    file_props.extend_from_slice(&[0u8; 12]); // flags + packet sizes
    file_props.extend_from_slice(&128_000u32.to_le_bytes()); // max bitrate

    let mut stream_props = Vec::new();
    stream_props.extend_from_slice(&AUDIO_MEDIA_GUID);
    stream_props.extend_from_slice(&[0u8; 16]); // error correction type
    stream_props.extend_from_slice(&[0u8; 8]); // time offset
    stream_props.extend_from_slice(&16u32.to_le_bytes()); // type-specific length
    stream_props.extend_from_slice(&0u32.to_le_bytes()); // error data length
    stream_props.extend_from_slice(&[0u8; 6]); // flags + reserved
    stream_props.extend_from_slice(&0x161u16.to_le_bytes()); // codec id
    stream_props.extend_from_slice(&2u16.to_le_bytes()); // channels
    stream_props.extend_from_slice(&44100u32.to_le_bytes());
    stream_props.extend_from_slice(&16000u32.to_le_bytes()); // bytes per second
    stream_props.extend_from_slice(&4u16.to_le_bytes()); // block align
    stream_props.extend_from_slice(&16u16.to_le_bytes()); // bits per sample

    let title = utf16le_z("Song");
    let author = utf16le_z("Band");
    let description = utf16le_z("Desc");
    let mut content = Vec::new();
    content.extend_from_slice(&(title.len() as u16).to_le_bytes());
    content.extend_from_slice(&(author.len() as u16).to_le_bytes());
    content.extend_from_slice(&0u16.to_le_bytes()); // copyright
    content.extend_from_slice(&(description.len() as u16).to_le_bytes());
    content.extend_from_slice(&0u16.to_le_bytes()); // rating
    content.extend_from_slice(&title);
    content.extend_from_slice(&author);
    content.extend_from_slice(&description);

    let mut data = Vec::new();
    data.extend_from_slice(&HEADER_GUID);
    data.extend_from_slice(&0u64.to_le_bytes()); // header object size
    data.extend_from_slice(&3u32.to_le_bytes()); // object count
    data.extend_from_slice(&[0x01, 0x02]); // reserved
    data.extend_from_slice(&asf_object(&FILE_PROPERTIES_GUID, &file_props));
    data.extend_from_slice(&asf_object(&STREAM_PROPERTIES_GUID, &stream_props));
    data.extend_from_slice(&asf_object(&CONTENT_DESCRIPTION_GUID, &content));
    data
}

/// One AC-3 syncframe (48 kHz, 192 kbps, 3/2 + LFE) padded out so that the
/// file length implies one second of audio.
pub fn ac3_frame_file() -> Vec<u8> {
    let mut data = vec![0x0B, 0x77, 0x00, 0x00, 0x14, 0x40, 0xE1, 0x00];
    data.resize(24_000, 0);
    data
}

/// One ADTS header (AAC LC, 44100 Hz, stereo, 768-byte frame) padded so
/// that the derived bitrate implies one second.
pub fn adts_file() -> Vec<u8> {
    let mut data = vec![0xFF, 0xF1, 0x50, 0x80, 0x60, 0x00, 0x00];
    data.resize(33_075, 0);
    data
}

/// WavPack block header: version 0x410, 16-bit stereo, 44100 Hz, 88200
/// total samples, padded to 320 bytes.
pub fn wavpack_file() -> Vec<u8> {
    let mut data = Vec::new();
    data.extend_from_slice(b"wvpk");
    data.extend_from_slice(&0u32.to_le_bytes()); // block size
    data.extend_from_slice(&0x410u16.to_le_bytes()); // version
    data.extend_from_slice(&[0, 0]); // upper index/sample bytes
    data.extend_from_slice(&88_200u32.to_le_bytes()); // total samples
    data.extend_from_slice(&0u32.to_le_bytes()); // block index
    data.extend_from_slice(&0u32.to_le_bytes()); // block samples
    data.extend_from_slice(&(1u32 | (9 << 23)).to_le_bytes()); // flags
    data.extend_from_slice(&0u32.to_le_bytes()); // crc
    data.resize(320, 0);
    data
}

/// Musepack SV7: 1000 frames at 44100 Hz.
pub fn mpc_sv7() -> Vec<u8> {
    let mut data = Vec::new();
    data.extend_from_slice(b"MP+");
    data.push(0x07);
    data.extend_from_slice(&1000u32.to_le_bytes()); // frame count
    data.extend_from_slice(&0u32.to_le_bytes()); // flags, rate index 0
    data.resize(1000, 0);
    data
}

/// Musepack SV8: an `SH` stream header packet declaring 441000 samples at
/// 44100 Hz, stereo.
pub fn mpc_sv8() -> Vec<u8> {
    let mut data = Vec::new();
    data.extend_from_slice(b"MPCK");
    data.extend_from_slice(b"SH");
    data.push(14); // packet size including key and size byte
    data.extend_from_slice(&[0u8; 4]); // crc
    data.push(8); // stream version
    data.extend_from_slice(&[0x9A, 0xF5, 0x28]); // 441000 samples
    data.push(0x00); // no leading silence
    data.push(0x00); // rate index 0, bands
    data.push(0x10); // stereo
    data
}

/// Format-0 MIDI, 480 ticks per quarter: tempo 120 bpm at tick 0, end of
/// track at tick 960 (one second).
pub fn smf_single_track() -> Vec<u8> {
    let track = [
        0x00, 0xFF, 0x51, 0x03, 0x07, 0xA1, 0x20, // set tempo 500000
        0x87, 0x40, 0xFF, 0x2F, 0x00, // 960 ticks later, end of track
    ];
    let mut data = Vec::new();
    data.extend_from_slice(b"MThd");
    data.extend_from_slice(&6u32.to_be_bytes());
    data.extend_from_slice(&0u16.to_be_bytes()); // format
    data.extend_from_slice(&1u16.to_be_bytes()); // tracks
    data.extend_from_slice(&480u16.to_be_bytes()); // division
    data.extend_from_slice(b"MTrk");
    data.extend_from_slice(&(track.len() as u32).to_be_bytes());
    data.extend_from_slice(&track);
    data
}

/// DSF: stereo DSD64 (2822400 Hz, 1 bit), two seconds of samples, with an
/// optional trailing metadata block pointed at by the DSD chunk.
pub fn dsf_file(metadata: Option<&[u8]>) -> Vec<u8> {
    let mut data = Vec::new();
    data.extend_from_slice(b"DSD ");
    data.extend_from_slice(&28u64.to_le_bytes());
    let file_size_at = data.len();
    data.extend_from_slice(&0u64.to_le_bytes());
    let pointer_at = data.len();
    data.extend_from_slice(&0u64.to_le_bytes());

    data.extend_from_slice(b"fmt ");
    data.extend_from_slice(&52u64.to_le_bytes());
    data.extend_from_slice(&1u32.to_le_bytes()); // format version
    data.extend_from_slice(&0u32.to_le_bytes()); // format id
    data.extend_from_slice(&2u32.to_le_bytes()); // channel type
    data.extend_from_slice(&2u32.to_le_bytes()); // channels
    data.extend_from_slice(&2_822_400u32.to_le_bytes());
    data.extend_from_slice(&1u32.to_le_bytes()); // bits per sample
    data.extend_from_slice(&5_644_800u64.to_le_bytes()); // sample count
    data.extend_from_slice(&4096u32.to_le_bytes()); // block size
    data.extend_from_slice(&0u32.to_le_bytes()); // reserved

    if let Some(metadata) = metadata {
        let pointer = (data.len() as u64).to_le_bytes();
        data[pointer_at..pointer_at + 8].copy_from_slice(&pointer);
        data.extend_from_slice(metadata);
    }
    let total = (data.len() as u64).to_le_bytes();
    data[file_size_at..file_size_at + 8].copy_from_slice(&total);
    data
}

fn dsdiff_chunk(id: &[u8; 4], body: &[u8]) -> Vec<u8> {
    let mut chunk = Vec::new();
    chunk.extend_from_slice(id);
    chunk.extend_from_slice(&(body.len() as u64).to_be_bytes());
    chunk.extend_from_slice(body);
    if body.len() % 2 == 1 {
        chunk.push(0);
    }
    chunk
}

/// DSDIFF: PROP/SND with FS and CHNL, an optional ID3 chunk, and a DSD
/// data chunk declaring two seconds of stereo DSD64.
pub fn dsdiff_file(id3: Option<&[u8]>) -> Vec<u8> {
    let mut chnl = Vec::new();
    chnl.extend_from_slice(&2u16.to_be_bytes());
    chnl.extend_from_slice(b"SLFT");
    chnl.extend_from_slice(b"SRGT");
    let mut snd = Vec::new();
    snd.extend_from_slice(b"SND ");
    snd.extend_from_slice(&dsdiff_chunk(b"FS  ", &2_822_400u32.to_be_bytes()));
    snd.extend_from_slice(&dsdiff_chunk(b"CHNL", &chnl));

    let mut body = Vec::new();
    body.extend_from_slice(&dsdiff_chunk(b"PROP", &snd));
    if let Some(id3) = id3 {
        body.extend_from_slice(&dsdiff_chunk(b"ID3 ", id3));
    }
    // Declared sample data size only; the payload itself is never read.
    body.extend_from_slice(b"DSD ");
    body.extend_from_slice(&1_411_200u64.to_be_bytes());

    let mut data = Vec::new();
    data.extend_from_slice(b"FRM8");
    data.extend_from_slice(&((body.len() + 4) as u64).to_be_bytes());
    data.extend_from_slice(b"DSD ");
    data.extend_from_slice(&body);
    data
}

/// Monkey's Audio descriptor + header: two frames of 44100 blocks at
/// 44100 Hz (two seconds), 16-bit stereo.
pub fn monkeys_audio(version: u16) -> Vec<u8> {
    let mut data = Vec::new();
    data.extend_from_slice(b"MAC ");
    data.extend_from_slice(&version.to_le_bytes());
    data.extend_from_slice(&0u16.to_le_bytes()); // padding
    data.extend_from_slice(&52u32.to_le_bytes()); // descriptor bytes
    data.extend_from_slice(&24u32.to_le_bytes()); // header bytes
    data.extend_from_slice(&0u32.to_le_bytes()); // seek table bytes
    data.extend_from_slice(&0u32.to_le_bytes()); // wav header bytes
    data.extend_from_slice(&0u32.to_le_bytes()); // frame data bytes
    data.extend_from_slice(&0u32.to_le_bytes()); // frame data bytes high
    data.extend_from_slice(&0u32.to_le_bytes()); // terminating data bytes
    data.extend_from_slice(&[0u8; 16]); // md5

    data.extend_from_slice(&2000u16.to_le_bytes()); // compression level
    data.extend_from_slice(&0u16.to_le_bytes()); // format flags
    data.extend_from_slice(&44_100u32.to_le_bytes()); // blocks per frame
    data.extend_from_slice(&44_100u32.to_le_bytes()); // final frame blocks
    data.extend_from_slice(&2u32.to_le_bytes()); // total frames
    data.extend_from_slice(&16u16.to_le_bytes());
    data.extend_from_slice(&2u16.to_le_bytes());
    data.extend_from_slice(&44_100u32.to_le_bytes());
    data.extend_from_slice(&[0u8; 256]);
    data
}

/// TrueAudio header: 16-bit stereo, 44100 Hz, 88200 samples (two seconds).
pub fn tta_file() -> Vec<u8> {
    let mut data = Vec::new();
    data.extend_from_slice(b"TTA1");
    data.extend_from_slice(&1u16.to_le_bytes()); // audio format
    data.extend_from_slice(&2u16.to_le_bytes());
    data.extend_from_slice(&16u16.to_le_bytes());
    data.extend_from_slice(&44_100u32.to_le_bytes());
    data.extend_from_slice(&88_200u32.to_le_bytes());
    data.extend_from_slice(&0u32.to_le_bytes()); // header crc
    data.resize(200, 0);
    data
}

/// A bare APEv2 tag file: header record, items, footer.
pub fn apev2_tag_file(items: &[(&str, &str)]) -> Vec<u8> {
    let items_len: usize = items
        .iter()
        .map(|(key, value)| 8 + key.len() + 1 + value.len())
        .sum();
    let size = (items_len + 32) as u32;
    let mut header = Vec::new();
    header.extend_from_slice(b"APETAGEX");
    header.extend_from_slice(&2000u32.to_le_bytes());
    header.extend_from_slice(&size.to_le_bytes());
    header.extend_from_slice(&(items.len() as u32).to_le_bytes());
    header.extend_from_slice(&0xA000_0000u32.to_le_bytes()); // header flags
    header.extend_from_slice(&[0u8; 8]);
    with_apev2_tag(header, items)
}

/// One Ogg page. `lacing` is the raw segment table.
pub fn ogg_page(flags: u8, granule: u64, serial: u32, seq: u32, lacing: &[u8], payload: &[u8]) -> Vec<u8> {
    let mut page = Vec::new();
    page.extend_from_slice(b"OggS");
    page.push(0); // version
    page.push(flags);
    page.extend_from_slice(&granule.to_le_bytes());
    page.extend_from_slice(&serial.to_le_bytes());
    page.extend_from_slice(&seq.to_le_bytes());
    page.extend_from_slice(&0u32.to_le_bytes()); // crc, unchecked
    page.push(lacing.len() as u8);
    page.extend_from_slice(lacing);
    page.extend_from_slice(payload);
    page
}

/// Segment table for a single packet of `len` bytes.
pub fn lacing_for(len: usize) -> Vec<u8> {
    let mut lacing = vec![255u8; len / 255];
    lacing.push((len % 255) as u8);
    lacing
}

/// Ogg Opus stream: OpusHead, OpusTags, one audio page carrying the final
/// granule position.
pub fn ogg_opus(channels: u8, pre_skip: u16, last_granule: u64) -> Vec<u8> {
    let mut head = Vec::new();
    head.extend_from_slice(b"OpusHead");
    head.push(1); // version
    head.push(channels);
    head.extend_from_slice(&pre_skip.to_le_bytes());
    head.extend_from_slice(&48000u32.to_le_bytes());
    head.extend_from_slice(&[0, 0, 0]); // gain + mapping family

    let mut tags = Vec::new();
    tags.extend_from_slice(b"OpusTags");
    tags.extend_from_slice(&0u32.to_le_bytes()); // vendor length
    tags.extend_from_slice(&0u32.to_le_bytes()); // comment count

    let audio = [0xAAu8; 20];

    let mut data = ogg_page(0x02, 0, 7, 0, &lacing_for(head.len()), &head);
    data.extend_from_slice(&ogg_page(0, 0, 7, 1, &lacing_for(tags.len()), &tags));
    data.extend_from_slice(&ogg_page(
        0x04,
        last_granule,
        7,
        2,
        &lacing_for(audio.len()),
        &audio,
    ));
    data
}

/// APEv2 tag (items + footer) appended to arbitrary leading bytes.
pub fn with_apev2_tag(mut data: Vec<u8>, items: &[(&str, &str)]) -> Vec<u8> {
    let mut items_blob = Vec::new();
    for (key, value) in items {
        items_blob.extend_from_slice(&(value.len() as u32).to_le_bytes());
        items_blob.extend_from_slice(&0u32.to_le_bytes()); // text item flags
        items_blob.extend_from_slice(key.as_bytes());
        items_blob.push(0);
        items_blob.extend_from_slice(value.as_bytes());
    }
    let size = (items_blob.len() + 32) as u32;
    data.extend_from_slice(&items_blob);
    data.extend_from_slice(b"APETAGEX");
    data.extend_from_slice(&2000u32.to_le_bytes());
    data.extend_from_slice(&size.to_le_bytes());
    data.extend_from_slice(&(items.len() as u32).to_le_bytes());
    data.extend_from_slice(&0u32.to_le_bytes()); // tag flags
    data.extend_from_slice(&[0u8; 8]); // reserved
    data
}
