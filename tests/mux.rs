// End-to-end muxing of synthetic FLAC and MP4 files through the public API

use muxtag::flac::{self, FLAC_SIGNATURE};
use muxtag::mp4::atom::{CO64, MDAT, MDIA, MINF, MOOV, STBL, STCO, TRAK};
use muxtag::mp4::{self, AtomTree};
use muxtag::utils::{ByteCursor, Endian};
use muxtag::{mux, AlbumRef, ArtistRef, ContainerMuxer, CoverArt, MuxError, MuxOutcome, TrackMetadata};

const AUDIO_FRAMES: [u8; 12] = [0xFF, 0xF8, 0x69, 0x18, 0x00, 0x00, 0xBF, 0x03, 0x58, 0xFD, 0x03, 0x12];

fn flac_block(type_code: u8, last: bool, payload: &[u8]) -> Vec<u8> {
    let len = payload.len() as u32;
    let mut out = vec![
        if last { 0x80 | type_code } else { type_code },
        (len >> 16) as u8,
        (len >> 8) as u8,
        len as u8,
    ];
    out.extend_from_slice(payload);
    out
}

/// STREAMINFO, SEEKTABLE, PADDING, then audio frames
fn flac_file() -> Vec<u8> {
    let mut data = FLAC_SIGNATURE.to_vec();
    data.extend(flac_block(0, false, &[0x12; 34]));
    data.extend(flac_block(3, false, &[0x00; 18]));
    data.extend(flac_block(1, true, &[0x00; 64]));
    data.extend_from_slice(&AUDIO_FRAMES);
    data
}

fn atom(kind: &[u8; 4], payload: &[u8]) -> Vec<u8> {
    let mut out = ((payload.len() + 8) as u32).to_be_bytes().to_vec();
    out.extend_from_slice(kind);
    out.extend_from_slice(payload);
    out
}

fn stco(entries: &[u32]) -> Vec<u8> {
    let mut payload = vec![0u8; 4];
    payload.extend_from_slice(&(entries.len() as u32).to_be_bytes());
    for e in entries {
        payload.extend_from_slice(&e.to_be_bytes());
    }
    atom(b"stco", &payload)
}

fn trak(table: &[u8]) -> Vec<u8> {
    atom(b"trak", &atom(b"mdia", &atom(b"minf", &atom(b"stbl", table))))
}

/// moov of exactly `size` bytes, padded with a `free` child
fn moov_of_size(size: usize, table: &[u8]) -> Vec<u8> {
    let mvhd = atom(b"mvhd", &[0u8; 100]);
    let trak = trak(table);
    let used = 8 + mvhd.len() + trak.len();
    let mut payload = mvhd;
    payload.extend(trak);
    payload.extend(atom(b"free", &vec![0u8; size - used - 8]));
    let moov = atom(b"moov", &payload);
    assert_eq!(moov.len(), size);
    moov
}

fn ftyp() -> Vec<u8> {
    atom(b"ftyp", b"M4A \x00\x00\x02\x00isomM4A ")
}

fn chunk_offsets(data: &[u8]) -> Vec<u64> {
    let tree = AtomTree::parse(data).unwrap();
    let cursor = ByteCursor::new(data);
    for (kind, wide) in [(STCO, false), (CO64, true)] {
        if let Some(id) = tree.find_path(&[MOOV, TRAK, MDIA, MINF, STBL, kind]) {
            let table = tree.atom(id).payload_offset();
            let count = cursor.read_u32(table + 4, Endian::Big).unwrap() as usize;
            return (0..count)
                .map(|i| {
                    if wide {
                        cursor.read_u64(table + 8 + i * 8, Endian::Big).unwrap()
                    } else {
                        u64::from(cursor.read_u32(table + 8 + i * 4, Endian::Big).unwrap())
                    }
                })
                .collect();
        }
    }
    panic!("no chunk offset table");
}

fn mdat_payload(data: &[u8]) -> Vec<u8> {
    let tree = AtomTree::parse(data).unwrap();
    let mdat = tree.atom(tree.find_root(MDAT).unwrap());
    data[mdat.payload_offset()..mdat.end()].to_vec()
}

fn full_track() -> TrackMetadata {
    serde_json::from_str(
        r#"{
            "title": "Midnight City",
            "trackNumber": 1,
            "volumeNumber": 1,
            "copyright": "(P) 2011 Naive",
            "isrc": "FR0NT1100010",
            "artist": {"name": "M83"},
            "album": {
                "title": "Hurry Up, We're Dreaming",
                "artist": {"name": "M83"},
                "numberOfTracks": 22,
                "numberOfVolumes": 2,
                "releaseDate": "2011-10-18",
                "upc": "5051083061752",
                "cover": "cover-1"
            }
        }"#,
    )
    .unwrap()
}

fn title_artist(title: &str, artist: &str) -> TrackMetadata {
    TrackMetadata {
        title: Some(title.to_string()),
        artist: Some(ArtistRef {
            name: Some(artist.to_string()),
        }),
        ..Default::default()
    }
}

fn jpeg() -> Vec<u8> {
    let mut image = vec![0xFF, 0xD8, 0xFF, 0xE0];
    image.extend_from_slice(&[0x42; 60]);
    image
}

#[test]
fn flac_output_keeps_signature_and_audio() {
    let data = flac_file();
    let out = mux(&data, "LOSSLESS", &full_track(), Some(&jpeg()[..])).unwrap();

    assert!(out.starts_with(FLAC_SIGNATURE));
    assert!(out.ends_with(&AUDIO_FRAMES));

    let summary = flac::inspect(&out).unwrap();
    assert_eq!(&out[summary.audio_offset..], &AUDIO_FRAMES[..]);
    let kinds: Vec<&str> = summary.blocks.iter().map(|b| b.kind).collect();
    assert_eq!(kinds, vec!["STREAMINFO", "SEEKTABLE", "PADDING", "VORBIS_COMMENT", "PICTURE"]);
}

#[test]
fn flac_has_exactly_one_last_block() {
    for cover in [None, Some(jpeg())] {
        let out = mux(&flac_file(), "HI_RES_LOSSLESS", &full_track(), cover.as_deref()).unwrap();
        let summary = flac::inspect(&out).unwrap();
        let last: Vec<bool> = summary.blocks.iter().map(|b| b.is_last).collect();
        assert_eq!(last.iter().filter(|&&l| l).count(), 1);
        assert_eq!(last.last(), Some(&true));
    }
}

#[test]
fn flac_full_tag_vocabulary() {
    let out = mux(&flac_file(), "LOSSLESS", &full_track(), None).unwrap();
    let comments = flac::inspect(&out).unwrap().comments;
    let expected = [
        ("TITLE", "Midnight City"),
        ("ARTIST", "M83"),
        ("ALBUM", "Hurry Up, We're Dreaming"),
        ("ALBUMARTIST", "M83"),
        ("TRACKNUMBER", "1"),
        ("TRACKTOTAL", "22"),
        ("DISCNUMBER", "1"),
        ("DISCTOTAL", "2"),
        ("DATE", "2011"),
        ("COPYRIGHT", "(P) 2011 Naive"),
        ("ISRC", "FR0NT1100010"),
        ("BARCODE", "5051083061752"),
    ];
    let expected: Vec<(String, String)> = expected
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    assert_eq!(comments, expected);
}

#[test]
fn flac_remux_replaces_blocks() {
    let first = mux(&flac_file(), "LOSSLESS", &full_track(), Some(&jpeg()[..])).unwrap();
    let second = mux(&first, "LOSSLESS", &title_artist("Other", "Someone"), Some(&jpeg()[..])).unwrap();

    let summary = flac::inspect(&second).unwrap();
    let count = |kind: &str| summary.blocks.iter().filter(|b| b.kind == kind).count();
    assert_eq!(count("VORBIS_COMMENT"), 1);
    assert!(count("PICTURE") <= 1);
    assert_eq!(
        summary.comments,
        vec![
            ("TITLE".to_string(), "Other".to_string()),
            ("ARTIST".to_string(), "Someone".to_string())
        ]
    );
    assert!(second.ends_with(&AUDIO_FRAMES));
}

#[test]
fn flac_minimal_track_writes_only_present_fields() {
    let out = mux(&flac_file(), "LOSSLESS", &title_artist("A", "B"), None).unwrap();
    let summary = flac::inspect(&out).unwrap();
    assert_eq!(
        summary.comments,
        vec![("TITLE".to_string(), "A".to_string()), ("ARTIST".to_string(), "B".to_string())]
    );
    assert!(summary.pictures.is_empty());
}

#[test]
fn random_bytes_are_returned_unchanged() {
    let mut state: u32 = 0x2545_F491;
    let noise: Vec<u8> = (0..16)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            (state >> 24) as u8
        })
        .collect();
    assert!(!noise.starts_with(FLAC_SIGNATURE));
    assert_ne!(&noise[4..8], b"ftyp");

    for quality in ["LOSSLESS", "HIGH", "LOW", "something-else"] {
        assert_eq!(mux(&noise, quality, &full_track(), Some(&jpeg()[..])).unwrap(), noise);
    }
}

#[test]
fn flac_without_audio_offset_is_a_hard_failure() {
    let mut data = FLAC_SIGNATURE.to_vec();
    data.extend(flac_block(0, false, &[0x12; 34]));

    let outcome = ContainerMuxer::new().mux_outcome(&data, "LOSSLESS", &full_track(), None);
    assert!(matches!(outcome, MuxOutcome::OriginalReturned(MuxError::MissingAudioOffset)));
    assert!(mux(&data, "LOSSLESS", &full_track(), None).is_err());
}

#[test]
fn mp4_moov_before_mdat_shifts_every_chunk_offset() {
    let ftyp = ftyp();
    let mdat_start = (ftyp.len() + 500) as u32;
    let original_offsets = [mdat_start + 8, mdat_start + 1008, mdat_start + 2008];
    let moov = moov_of_size(500, &stco(&original_offsets));

    let mut data = ftyp.clone();
    data.extend(&moov);
    data.extend(atom(b"mdat", &[0x77; 3000]));

    let out = mux(&data, "HIGH", &full_track(), Some(&jpeg()[..])).unwrap();
    let tree = AtomTree::parse(&out).unwrap();
    let new_moov_size = tree.atom(tree.find_root(MOOV).unwrap()).size as i64;
    let delta = new_moov_size - 500;
    assert!(delta > 0);

    let expected: Vec<u64> = original_offsets
        .iter()
        .map(|&o| (i64::from(o) + delta) as u64)
        .collect();
    assert_eq!(chunk_offsets(&out), expected);
    assert_eq!(mdat_payload(&out), vec![0x77u8; 3000]);
    assert_eq!(&out[..ftyp.len()], &ftyp[..]);
}

#[test]
fn mp4_moov_after_mdat_leaves_offsets_alone() {
    let ftyp = ftyp();
    let first_chunk = (ftyp.len() + 8) as u32;
    let mut data = ftyp.clone();
    data.extend(atom(b"mdat", &[0x31; 256]));
    data.extend(moov_of_size(400, &stco(&[first_chunk, first_chunk + 128])));

    let out = mux(&data, "LOW", &full_track(), None).unwrap();
    assert_ne!(out, data);
    assert_eq!(chunk_offsets(&out), vec![u64::from(first_chunk), u64::from(first_chunk) + 128]);
    assert_eq!(mdat_payload(&out), vec![0x31u8; 256]);
}

#[test]
fn mp4_tags_are_readable() {
    let mut data = ftyp();
    data.extend(moov_of_size(300, &stco(&[4096])));
    data.extend(atom(b"mdat", &[0u8; 32]));

    let out = mux(&data, "HIGH", &full_track(), Some(&jpeg()[..])).unwrap();
    let tags = mp4::inspect(&out).unwrap().tags;
    let find = |key: &str| tags.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str());
    assert_eq!(find("©nam"), Some("Midnight City"));
    assert_eq!(find("©ART"), Some("M83"));
    assert_eq!(find("©alb"), Some("Hurry Up, We're Dreaming"));
    assert_eq!(find("aART"), Some("M83"));
    assert_eq!(find("trkn"), Some("1"));
    assert_eq!(find("©day"), Some("2011"));
    assert_eq!(find("covr"), Some("<jpeg, 64 bytes>"));
}

#[test]
fn mp4_remux_keeps_single_udta() {
    let mut data = ftyp();
    data.extend(moov_of_size(300, &stco(&[4096])));
    data.extend(atom(b"mdat", &[0u8; 32]));

    let first = mux(&data, "HIGH", &full_track(), None).unwrap();
    let second = mux(&first, "HIGH", &title_artist("A", "B"), None).unwrap();

    let summary = mp4::inspect(&second).unwrap();
    assert_eq!(summary.atoms.iter().filter(|a| a.path == "moov/udta").count(), 1);
    assert_eq!(
        summary.tags,
        vec![("©nam".to_string(), "A".to_string()), ("©ART".to_string(), "B".to_string())]
    );
}

#[test]
fn mp4_without_moov_returns_original() {
    let mut data = ftyp();
    data.extend(atom(b"mdat", &[9u8; 40]));

    let outcome = ContainerMuxer::new().mux_outcome(&data, "HIGH", &full_track(), None);
    assert!(matches!(outcome, MuxOutcome::OriginalReturned(MuxError::MissingMoov)));
    assert_eq!(mux(&data, "HIGH", &full_track(), None).unwrap(), data);
}

#[test]
fn mp4_large_atom_returns_original() {
    let mut data = ftyp();
    data.extend_from_slice(&[0, 0, 0, 1]);
    data.extend_from_slice(b"mdat");
    data.extend_from_slice(&(5u64 << 32).to_be_bytes());
    data.extend_from_slice(&[0u8; 16]);

    let outcome = ContainerMuxer::new().mux_outcome(&data, "HIGH", &full_track(), None);
    assert!(matches!(
        outcome,
        MuxOutcome::OriginalReturned(MuxError::UnsupportedLargeAtom { .. })
    ));
    assert_eq!(mux(&data, "HIGH", &full_track(), None).unwrap(), data);
}

#[test]
fn stco_delta_of_300() {
    let mut data = atom(b"moov", &trak(&stco(&[600, 1200, 90])));
    let tree = AtomTree::parse(&data).unwrap();
    let shifted = mp4::shift_chunk_offsets(&mut data, &tree, 300, 500).unwrap();
    assert_eq!(shifted, 2);
    assert_eq!(chunk_offsets(&data), vec![900u64, 1500, 90]);
}

#[test]
fn co64_delta_carries_past_32_bits() {
    let entries = [0xFFFF_FF00u64, (3u64 << 32) | 0xFFFF_FFFF, 10];
    let mut payload = vec![0u8; 4];
    payload.extend_from_slice(&(entries.len() as u32).to_be_bytes());
    for e in entries {
        payload.extend_from_slice(&e.to_be_bytes());
    }
    let mut data = atom(b"moov", &trak(&atom(b"co64", &payload)));
    let tree = AtomTree::parse(&data).unwrap();

    let delta = (1i64 << 33) + 0x200;
    mp4::shift_chunk_offsets(&mut data, &tree, delta, 100).unwrap();
    assert_eq!(
        chunk_offsets(&data),
        vec![0xFFFF_FF00u64 + (1u64 << 33) + 0x200, ((3u64 << 32) | 0xFFFF_FFFF) + (1u64 << 33) + 0x200, 10]
    );
}

#[test]
fn cover_provider_supplies_artwork() {
    let provider = |id: &str| (id == "cover-1").then(|| CoverArt::new(jpeg()));
    let out = ContainerMuxer::new()
        .mux_track(&flac_file(), "LOSSLESS", &full_track(), &provider)
        .unwrap();
    let pictures = flac::inspect(&out).unwrap().pictures;
    assert_eq!(pictures.len(), 1);
    assert_eq!(pictures[0].picture_type, "Cover (front)");
    assert_eq!(pictures[0].size, 64);

    let mut no_cover = full_track();
    no_cover.album = Some(AlbumRef::default());
    let out = ContainerMuxer::new()
        .mux_track(&flac_file(), "LOSSLESS", &no_cover, &provider)
        .unwrap();
    assert!(flac::inspect(&out).unwrap().pictures.is_empty());
}
