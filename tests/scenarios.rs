use audiometa::{AudioFormat, MetadataEngine, ParseOptions, TagValue};

mod common;

#[test]
fn minimal_flac_stream_info() {
    let engine = MetadataEngine::new();
    let parsed = engine.parse_bytes(common::minimal_flac(), None).unwrap();

    assert_eq!(parsed.format, AudioFormat::Flac);
    assert_eq!(parsed.core.sample_rate, Some(44100));
    assert_eq!(parsed.core.channels, Some(2));
    assert_eq!(parsed.core.bits_per_sample, Some(16));
    let length = parsed.core.length.unwrap();
    assert!((length - 10.0).abs() < 1e-9);
    assert!(!parsed.extensions.contains_key("flac_metadata_truncated"));
}

#[test]
fn id3v2_text_frame() {
    let engine = MetadataEngine::new();
    let parsed = engine
        .parse_bytes(common::id3v2_with_tit2("Hi"), Some("note.id3"))
        .unwrap();

    assert_eq!(parsed.format, AudioFormat::Id3);
    assert_eq!(
        parsed.tags.get("TIT2"),
        Some(&TagValue::Text(vec!["Hi".to_owned()]))
    );
    assert!(!parsed.extensions.contains_key("flac_metadata_truncated"));
}

#[test]
fn mp3_with_xing_vbr_header() {
    let engine = MetadataEngine::new();
    let parsed = engine
        .parse_bytes(common::mp3_with_xing(1000, 200_000), Some("test.mp3"))
        .unwrap();

    assert_eq!(parsed.format, AudioFormat::Mp3);
    let length = parsed.core.length.unwrap();
    assert!((length - 1000.0 * 1152.0 / 44100.0).abs() < 1e-9);
    assert_eq!(parsed.core.bitrate, Some(61250));
    assert_eq!(
        parsed.extensions.get("bitrate_mode"),
        Some(&TagValue::Text(vec!["VBR".to_owned()]))
    );
    assert_eq!(
        parsed.extensions.get("mpeg_version"),
        Some(&TagValue::Text(vec!["1".to_owned()]))
    );
}

#[test]
fn wave_pcm_core_info() {
    let engine = MetadataEngine::new();
    let parsed = engine
        .parse_bytes(common::wave_pcm(1, 16000, 16, 32000), Some("take.wav"))
        .unwrap();

    assert_eq!(parsed.format, AudioFormat::Wave);
    assert_eq!(parsed.core.length, Some(1.0));
    assert_eq!(parsed.core.bitrate, Some(256_000));
    assert_eq!(parsed.core.bits_per_sample, Some(16));
    assert_eq!(parsed.core.channels, Some(1));
    assert_eq!(parsed.core.sample_rate, Some(16000));
}

#[test]
fn m4a_cover_digest_without_embedding() {
    let picture = vec![0xFFu8, 0xD8, 0xFF, 0xE0, 1, 2, 3, 4, 5, 6, 7, 8];
    let engine = MetadataEngine::new();
    let parsed = engine
        .parse_bytes(common::m4a_with_cover(&picture), Some("track.m4a"))
        .unwrap();

    assert_eq!(parsed.format, AudioFormat::M4a);
    assert_eq!(parsed.core.sample_rate, Some(44100));
    assert_eq!(parsed.core.channels, Some(2));
    assert!((parsed.core.length.unwrap() - 10.0).abs() < 1e-9);

    let Some(TagValue::Binary(digest)) = parsed.tags.get("covr") else {
        panic!("covr tag missing or not binary");
    };
    assert_eq!(digest.size, picture.len() as u64);
    assert_eq!(digest.mime.as_deref(), Some("image/jpeg"));
    assert!(digest.data.is_none());
}

#[test]
fn m4a_cover_embeds_when_allowed() {
    let picture = vec![0xFFu8, 0xD8, 0xFF, 0xE0, 9, 9, 9, 9];
    let engine = MetadataEngine::with_options(
        ParseOptions::new()
            .include_binary_data(true)
            .max_binary_tag_bytes(4 * 1024 * 1024),
    );
    let parsed = engine
        .parse_bytes(common::m4a_with_cover(&picture), Some("track.m4a"))
        .unwrap();

    let Some(TagValue::Binary(digest)) = parsed.tags.get("covr") else {
        panic!("covr tag missing or not binary");
    };
    assert_eq!(digest.data.as_deref(), Some(picture.as_slice()));
    assert_eq!(digest.data.as_ref().unwrap().len() as u64, digest.size);
}

#[test]
fn m4a_track_disc_and_compilation_items() {
    // trkn/disk arrive with type code 0 in the wild; the key, not the
    // declared type, decides their shape. cpil is a boolean under code 21.
    let items = vec![
        common::ilst_item(b"trkn", 0, &[0, 0, 0, 3, 0, 12, 0, 0]),
        common::ilst_item(b"disk", 0, &[0, 0, 0, 1, 0, 2]),
        common::ilst_item(b"cpil", 21, &[1]),
        common::ilst_item(b"\xA9nam", 1, b"Plain Song"),
    ];
    let engine = MetadataEngine::new();
    let parsed = engine
        .parse_bytes(common::m4a_with_ilst_items(&items), Some("tagged.m4a"))
        .unwrap();

    assert_eq!(parsed.format, AudioFormat::M4a);
    assert_eq!(
        parsed.tags.get("trkn"),
        Some(&TagValue::Text(vec!["3/12".to_owned()]))
    );
    assert_eq!(
        parsed.tags.get("disk"),
        Some(&TagValue::Text(vec!["1/2".to_owned()]))
    );
    assert_eq!(parsed.tags.get("cpil"), Some(&TagValue::Bool(true)));
    assert_eq!(
        parsed.tags.get("©nam"),
        Some(&TagValue::Text(vec!["Plain Song".to_owned()]))
    );
}

#[test]
fn ogg_opus_length_from_granule() {
    let engine = MetadataEngine::new();
    let parsed = engine
        .parse_bytes(common::ogg_opus(2, 312, 1_440_312), Some("voice.opus"))
        .unwrap();

    assert_eq!(parsed.format, AudioFormat::OggOpus);
    assert_eq!(parsed.core.sample_rate, Some(48000));
    assert_eq!(parsed.core.channels, Some(2));
    let length = parsed.core.length.unwrap();
    assert!((length - 30.0).abs() < 1e-9);
}
