//! Whole-file scenarios, scaled down from full clinical images to small
//! hand-built fixtures that exercise the same decode/encode paths.

use dicom_core::header::{Tag, VR};
use dicom_core::value::PrimitiveValue;
use dicom_object::file::{from_reader, from_reader_with_options, to_writer, OpenFileOptions, WriteOptions};
use dicom_object::mem::RescaleDirection;
use dicom_object::pixeldata::decode_pixel_data;
use dicom_parser::mode::VrOverrideMap;

const MODALITY: Tag = Tag(0x0008, 0x0060);
const PIXEL_DATA: Tag = Tag(0x7FE0, 0x0010);

fn push_explicit_short(buf: &mut Vec<u8>, group: u16, element: u16, vr: &[u8; 2], value: &[u8]) {
    buf.extend_from_slice(&group.to_le_bytes());
    buf.extend_from_slice(&element.to_le_bytes());
    buf.extend_from_slice(vr);
    buf.extend_from_slice(&(value.len() as u16).to_le_bytes());
    buf.extend_from_slice(value);
}

fn push_implicit(buf: &mut Vec<u8>, group: u16, element: u16, value: &[u8]) {
    buf.extend_from_slice(&group.to_le_bytes());
    buf.extend_from_slice(&element.to_le_bytes());
    buf.extend_from_slice(&(value.len() as u32).to_le_bytes());
    buf.extend_from_slice(value);
}

fn meta_prelude(ts_uid: &str) -> Vec<u8> {
    let mut bytes = vec![0u8; 128];
    bytes.extend_from_slice(b"DICM");
    let mut uid = ts_uid.as_bytes().to_vec();
    if uid.len() % 2 == 1 {
        uid.push(0);
    }
    push_explicit_short(&mut bytes, 0x0002, 0x0010, b"UI", &uid);
    bytes
}

/// Scenario 1: implicit VR little endian, modality "MR".
#[test]
fn scenario_1_implicit_little() {
    let mut bytes = meta_prelude("1.2.840.10008.1.2");
    push_implicit(&mut bytes, 0x0008, 0x0060, b"MR");
    push_implicit(&mut bytes, 0x7FE0, 0x0010, &vec![0u8; 64]);

    let obj = from_reader(&bytes[..]).unwrap();
    assert_eq!(obj.data.value(MODALITY), Some(&PrimitiveValue::Str("MR".to_string())));
    assert_eq!(obj.data.value(PIXEL_DATA).unwrap().multiplicity(), 32);
}

/// Scenario 2: explicit VR little endian, modality "CT".
#[test]
fn scenario_2_explicit_little() {
    let mut bytes = meta_prelude("1.2.840.10008.1.2.1");
    push_explicit_short(&mut bytes, 0x0008, 0x0060, b"CS", b"CT");
    push_explicit_short(&mut bytes, 0x7FE0, 0x0010, b"OW", &vec![0u8; 128]);

    let obj = from_reader(&bytes[..]).unwrap();
    assert_eq!(obj.data.value(MODALITY), Some(&PrimitiveValue::Str("CT".to_string())));
    assert_eq!(obj.data.value(PIXEL_DATA).unwrap().multiplicity(), 64);
}

/// Scenario 3: parse with a read-side aux_vr override, write back with a
/// write-side aux_vr override, re-parse, re-write — the two written
/// blobs are byte-equal.
#[test]
fn scenario_3_vr_override_round_trip_is_stable() {
    let mut bytes = meta_prelude("1.2.840.10008.1.2.1");
    push_explicit_short(&mut bytes, 0x0008, 0x0060, b"CS", b"MG");
    // (0009,0010) is a private creator slot; its wire VR is deliberately
    // wrong (UN, long-length form) so that only the read-side aux_vr
    // override below resolves it as text.
    bytes.extend_from_slice(&0x0009u16.to_le_bytes());
    bytes.extend_from_slice(&0x0010u16.to_le_bytes());
    bytes.extend_from_slice(b"UN");
    bytes.extend_from_slice(&[0, 0]);
    bytes.extend_from_slice(&4u32.to_le_bytes());
    bytes.extend_from_slice(b"ACME");

    let mut read_aux_vr = VrOverrideMap::new();
    read_aux_vr.insert(Tag(0x0009, 0x0010), Some(VR::LO));

    let obj = from_reader_with_options(
        &bytes[..],
        OpenFileOptions {
            aux_vr: read_aux_vr,
            ..OpenFileOptions::default()
        },
    )
    .unwrap();
    assert_eq!(
        obj.data.value(Tag(0x0009, 0x0010)),
        Some(&PrimitiveValue::Str("ACME".to_string()))
    );
    // the element still carries its wire VR, CS, until the write-side
    // override below re-tags it.
    assert_eq!(obj.data.get(MODALITY).unwrap().vr(), VR::CS);

    let mut write_aux_vr = VrOverrideMap::new();
    write_aux_vr.insert(MODALITY, Some(VR::LO));
    write_aux_vr.insert(Tag(0x0009, 0x0010), Some(VR::LO));

    let mut first = Vec::new();
    to_writer(
        &obj,
        &mut first,
        WriteOptions {
            aux_vr: write_aux_vr.clone(),
            ..WriteOptions::default()
        },
    )
    .unwrap();
    let reparsed = from_reader(&first[..]).unwrap();
    assert_eq!(reparsed.data.get(MODALITY).unwrap().vr(), VR::LO);

    let mut second = Vec::new();
    to_writer(
        &reparsed,
        &mut second,
        WriteOptions {
            aux_vr: write_aux_vr,
            ..WriteOptions::default()
        },
    )
    .unwrap();

    assert_eq!(first, second);
}

/// Scenario 4: headless implicit little endian stream.
#[test]
fn scenario_4_headless_implicit_little() {
    let mut bytes = Vec::new();
    push_implicit(&mut bytes, 0x0008, 0x0060, b"OT");

    let opts = OpenFileOptions {
        preamble: false,
        ..OpenFileOptions::default()
    };
    let obj = from_reader_with_options(&bytes[..], opts).unwrap();
    assert_eq!(obj.data.value(MODALITY), Some(&PrimitiveValue::Str("OT".to_string())));
}

/// Scenario 5: parse with an aux_vr override resolving (0018,1170) as
/// DS (it has no dictionary entry of its own), then rescale forward and
/// backward and check the extrema round-trip.
#[test]
fn scenario_5_rescale_round_trips_extrema() {
    let mut bytes = meta_prelude("1.2.840.10008.1.2");
    let pixels: Vec<u16> = vec![0, 50, 2081];
    let mut raw = Vec::new();
    for v in &pixels {
        raw.extend_from_slice(&v.to_le_bytes());
    }
    push_implicit(&mut bytes, 0x0028, 0x0010, &1u16.to_le_bytes());
    push_implicit(&mut bytes, 0x0028, 0x0011, &3u16.to_le_bytes());
    push_implicit(&mut bytes, 0x0028, 0x0100, &16u16.to_le_bytes());
    push_implicit(&mut bytes, 0x0028, 0x0103, &0u16.to_le_bytes());
    push_implicit(&mut bytes, 0x0028, 0x1052, b"-949");
    push_implicit(&mut bytes, 0x0028, 0x1053, b"1 ");
    push_implicit(&mut bytes, 0x0018, 0x1170, b"15 ");
    push_implicit(&mut bytes, 0x7FE0, 0x0010, &raw);

    let mut aux_vr = VrOverrideMap::new();
    aux_vr.insert(Tag(0x0018, 0x1170), Some(VR::DS));

    let mut obj = from_reader_with_options(
        &bytes[..],
        OpenFileOptions {
            aux_vr,
            ..OpenFileOptions::default()
        },
    )
    .unwrap();
    assert_eq!(
        obj.data.value(Tag(0x0018, 0x1170)),
        Some(&PrimitiveValue::F64(smallvec::smallvec![15.0]))
    );

    let before = decode_pixel_data(&obj.data).unwrap();
    let before_min = before
        .data
        .to_f64_vec()
        .iter()
        .cloned()
        .fold(f64::INFINITY, f64::min);

    obj.data.rescale(RescaleDirection::Forward).unwrap();
    let rescaled = obj.data.value(PIXEL_DATA).unwrap();
    let (min, max) = match rescaled {
        PrimitiveValue::F64(v) => (
            v.iter().cloned().fold(f64::INFINITY, f64::min),
            v.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
        ),
        other => panic!("unexpected rescaled value: {other:?}"),
    };
    assert_eq!(min, -949.0);
    assert_eq!(max, 1132.0);

    obj.data.rescale(RescaleDirection::Backward).unwrap();
    let restored = obj.data.value(PIXEL_DATA).unwrap();
    match restored {
        PrimitiveValue::U16(v) => {
            let restored_min = v.iter().cloned().min().unwrap();
            assert_eq!(restored_min as f64, before_min);
        }
        other => panic!("unexpected restored value: {other:?}"),
    }
}

/// Scenario 6: explicit VR big endian, RGB interleaved pixel data.
#[test]
fn scenario_6_explicit_big_endian_rgb_shape() {
    let mut bytes = meta_prelude("1.2.840.10008.1.2.2");
    let rows = 2u16;
    let cols = 2u16;
    let samples = 3u16;
    let raw = vec![0u8; (rows as usize) * (cols as usize) * (samples as usize)];

    push_explicit_short(&mut bytes, 0x0028, 0x0002, b"US", &samples.to_be_bytes());
    push_explicit_short(&mut bytes, 0x0028, 0x0010, b"US", &rows.to_be_bytes());
    push_explicit_short(&mut bytes, 0x0028, 0x0011, b"US", &cols.to_be_bytes());
    push_explicit_short(&mut bytes, 0x0028, 0x0100, b"US", &8u16.to_be_bytes());
    push_explicit_short(&mut bytes, 0x0028, 0x0103, b"US", &0u16.to_be_bytes());
    push_explicit_short(&mut bytes, 0x7FE0, 0x0010, b"OB", &raw);

    let obj = from_reader(&bytes[..]).unwrap();
    let decoded = decode_pixel_data(&obj.data).unwrap();
    assert_eq!(decoded.shape, vec![cols as usize, rows as usize, samples as usize]);
}

/// Scenario 7: implicit little endian, planar configuration 1
/// (already-planar wire order is preserved, not permuted again).
#[test]
fn scenario_7_implicit_little_planar_shape() {
    let mut bytes = meta_prelude("1.2.840.10008.1.2");
    let rows = 2u16;
    let cols = 3u16;
    let samples = 3u16;
    let raw = vec![0u8; (rows as usize) * (cols as usize) * (samples as usize)];

    push_implicit(&mut bytes, 0x0028, 0x0002, &samples.to_le_bytes());
    push_implicit(&mut bytes, 0x0028, 0x0006, &1u16.to_le_bytes());
    push_implicit(&mut bytes, 0x0028, 0x0010, &rows.to_le_bytes());
    push_implicit(&mut bytes, 0x0028, 0x0011, &cols.to_le_bytes());
    push_implicit(&mut bytes, 0x0028, 0x0100, &8u16.to_le_bytes());
    push_implicit(&mut bytes, 0x0028, 0x0103, &0u16.to_le_bytes());
    push_implicit(&mut bytes, 0x7FE0, 0x0010, &raw);

    let obj = from_reader(&bytes[..]).unwrap();
    let decoded = decode_pixel_data(&obj.data).unwrap();
    assert_eq!(decoded.shape, vec![cols as usize, rows as usize, samples as usize]);
}

/// Scenario 8: undefined-length encapsulated pixel data is parsed as a
/// fragment sequence rather than as native pixel samples.
#[test]
fn scenario_8_undefined_length_pixel_data_is_encapsulated() {
    let mut bytes = meta_prelude("1.2.840.10008.1.2.1");

    // (7FE0,0010) OB, undefined length -> encapsulated
    bytes.extend_from_slice(&0x7FE0u16.to_le_bytes());
    bytes.extend_from_slice(&0x0010u16.to_le_bytes());
    bytes.extend_from_slice(b"OB");
    bytes.extend_from_slice(&0u16.to_le_bytes());
    bytes.extend_from_slice(&0xFFFF_FFFFu32.to_le_bytes());

    // basic offset table item (empty)
    bytes.extend_from_slice(&0xFFFEu16.to_le_bytes());
    bytes.extend_from_slice(&0xE000u16.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());

    // one fragment
    let fragment = vec![1u8, 2, 3, 4];
    bytes.extend_from_slice(&0xFFFEu16.to_le_bytes());
    bytes.extend_from_slice(&0xE000u16.to_le_bytes());
    bytes.extend_from_slice(&(fragment.len() as u32).to_le_bytes());
    bytes.extend_from_slice(&fragment);

    // sequence delimiter
    bytes.extend_from_slice(&0xFFFEu16.to_le_bytes());
    bytes.extend_from_slice(&0xE0DDu16.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());

    let obj = from_reader(&bytes[..]).unwrap();
    let fragments = dicom_object::pixeldata::encapsulated_fragments(&obj.data).unwrap();
    assert_eq!(fragments.fragments, vec![fragment]);
}

/// Scenario 9: `max_group` stops the body parse before Pixel Data.
#[test]
fn scenario_9_max_group_excludes_pixel_data() {
    let mut bytes = meta_prelude("1.2.840.10008.1.2");
    push_implicit(&mut bytes, 0x0008, 0x0060, b"CT");
    push_implicit(&mut bytes, 0x7FE0, 0x0010, &vec![0u8; 16]);

    let opts = OpenFileOptions {
        max_group: Some(0x0008),
        ..OpenFileOptions::default()
    };
    let obj = from_reader_with_options(&bytes[..], opts).unwrap();
    assert!(obj.data.contains(MODALITY));
    assert!(!obj.data.contains(PIXEL_DATA));
}

/// Scenario 10: keyword lookup matches tag-based lookup.
#[test]
fn scenario_10_lookup_by_keyword_matches_lookup_by_tag() {
    let mut bytes = meta_prelude("1.2.840.10008.1.2");
    push_implicit(&mut bytes, 0x0008, 0x0060, b"MR");

    let obj = from_reader(&bytes[..]).unwrap();
    assert_eq!(obj.data.value_by_name("Modality"), obj.data.value(MODALITY));
}
