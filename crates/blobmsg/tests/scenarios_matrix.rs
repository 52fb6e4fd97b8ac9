//! End-to-end build, parse and render scenarios.

use blobmsg::{
    add_json_str, format_json, parse, parse_array, Blob, BlobBuf, BlobError, BlobmsgType,
    JsonFormat, Policy,
};

fn sample() -> Blob {
    let mut buf = BlobBuf::new();
    buf.add_string(Some("message"), "Hello, world!").unwrap();
    let testdata = buf.open_table(Some("testdata")).unwrap();
    buf.add_double(Some("double"), 133.7).unwrap();
    buf.add_u32(Some("hello"), 1).unwrap();
    buf.add_string(Some("world"), "2").unwrap();
    buf.close(testdata).unwrap();
    let list = buf.open_array(Some("list")).unwrap();
    buf.add_u32(None, 0).unwrap();
    buf.add_u32(None, 1).unwrap();
    buf.add_u32(None, 2).unwrap();
    buf.add_double(Some("double"), 133.7).unwrap();
    buf.close(list).unwrap();
    buf.finish().unwrap()
}

const SAMPLE_COMPACT: &str = r#"{"message":"Hello, world!","testdata":{"double":133.700000,"hello":1,"world":"2"},"list":[0,1,2,133.700000]}"#;

// ---------------------------------------------------------------------------
// Build and render
// ---------------------------------------------------------------------------

#[test]
fn sample_renders_compact() {
    assert_eq!(format_json(&sample(), false), SAMPLE_COMPACT);
}

#[test]
fn sample_renders_pretty() {
    let expected = "{\n\
        \t\"message\": \"Hello, world!\",\n\
        \t\"testdata\": {\n\
        \t\t\"double\": 133.700000,\n\
        \t\t\"hello\": 1,\n\
        \t\t\"world\": \"2\"\n\
        \t},\n\
        \t\"list\": [\n\
        \t\t0,\n\
        \t\t1,\n\
        \t\t2,\n\
        \t\t133.700000\n\
        \t]\n\
        }";
    assert_eq!(format_json(&sample(), true), expected);
}

#[test]
fn rendering_is_repeatable() {
    let blob = sample();
    let first = format_json(&blob, false);
    assert_eq!(format_json(&blob, false), first);
    assert_eq!(JsonFormat::compact().format_root(&blob.root()), first);
}

#[test]
fn rendered_json_reimports_to_the_same_text() {
    let mut buf = BlobBuf::new();
    add_json_str(&mut buf, SAMPLE_COMPACT).unwrap();
    let blob = buf.finish().unwrap();
    assert_eq!(format_json(&blob, false), SAMPLE_COMPACT);
}

#[test]
fn bytes_survive_a_copy() {
    let blob = sample();
    let copy = Blob::from_bytes(blob.as_bytes().to_vec()).unwrap();
    assert_eq!(copy, blob);
    assert_eq!(format_json(&copy, false), SAMPLE_COMPACT);
}

// ---------------------------------------------------------------------------
// Policy parse
// ---------------------------------------------------------------------------

#[test]
fn sample_parses_by_policy() {
    let blob = sample();
    let policy = [
        Policy::new("message", BlobmsgType::String),
        Policy::new("list", BlobmsgType::Array),
        Policy::new("testdata", BlobmsgType::Table),
    ];
    let tb = parse(&policy, blob.data());
    assert!(tb.is_complete());
    assert_eq!(tb.found(), 3);
    assert_eq!(tb[0].unwrap().as_str(), Ok("Hello, world!"));

    let list = tb[1].unwrap();
    assert_eq!(list.children().unwrap().count(), 4);

    let inner = parse(
        &[
            Policy::new("hello", BlobmsgType::Int32),
            Policy::new("world", BlobmsgType::String),
            Policy::new("double", BlobmsgType::Double),
        ],
        tb[2].unwrap().as_table().unwrap(),
    );
    assert_eq!(inner[0].unwrap().as_u32(), Ok(1));
    assert_eq!(inner[1].unwrap().as_str(), Ok("2"));
    assert_eq!(inner[2].unwrap().as_f64(), Ok(133.7));
}

#[test]
fn sample_list_parses_by_position() {
    let blob = sample();
    let tb = parse(&[Policy::new("list", BlobmsgType::Array)], blob.data());
    let items = parse_array(
        &[
            Policy::new("0", BlobmsgType::Int32),
            Policy::new("1", BlobmsgType::Int32),
            Policy::new("2", BlobmsgType::Int32),
            Policy::new("3", BlobmsgType::Double),
        ],
        tb[0].unwrap().as_array().unwrap(),
    );
    let values: Vec<u32> = items.iter().take(3).map(|a| a.unwrap().as_u32().unwrap()).collect();
    assert_eq!(values, [0, 1, 2]);
    assert_eq!(items[3].unwrap().as_f64(), Ok(133.7));
}

#[test]
fn wrong_types_stay_unbound() {
    let blob = sample();
    let tb = parse(
        &[
            Policy::new("message", BlobmsgType::Int32),
            Policy::new("list", BlobmsgType::Table),
            Policy::new("missing", BlobmsgType::String),
        ],
        blob.data(),
    );
    assert_eq!(tb.found(), 0);
    assert!(tb.is_complete());
}

// ---------------------------------------------------------------------------
// Truncation
// ---------------------------------------------------------------------------

fn single(build: impl FnOnce(&mut BlobBuf)) -> Blob {
    let mut buf = BlobBuf::new();
    build(&mut buf);
    buf.finish().unwrap()
}

fn truncation_cases() -> Vec<(&'static str, BlobmsgType, Blob)> {
    vec![
        ("int8", BlobmsgType::Int8, single(|b| b.add_u8(Some("test"), 0x42).unwrap())),
        ("int16", BlobmsgType::Int16, single(|b| b.add_u16(Some("test"), 0x4242).unwrap())),
        (
            "int32",
            BlobmsgType::Int32,
            single(|b| b.add_u32(Some("test"), 0x4242_4242).unwrap()),
        ),
        (
            "int64",
            BlobmsgType::Int64,
            single(|b| b.add_u64(Some("test"), 0x4242_4242_4242_4242).unwrap()),
        ),
        (
            "string",
            BlobmsgType::String,
            single(|b| b.add_string(Some("test"), "12345678").unwrap()),
        ),
        ("double", BlobmsgType::Double, single(|b| b.add_double(Some("test"), 42.42).unwrap())),
        (
            "table",
            BlobmsgType::Table,
            single(|b| {
                let t = b.open_table(Some("test")).unwrap();
                b.close(t).unwrap();
            }),
        ),
        (
            "array",
            BlobmsgType::Array,
            single(|b| {
                let a = b.open_array(Some("test")).unwrap();
                b.close(a).unwrap();
            }),
        ),
    ]
}

#[test]
fn full_length_binds_every_type() {
    for (label, kind, blob) in truncation_cases() {
        let tb = parse(&[Policy::new("test", kind)], blob.data());
        assert!(tb[0].is_some(), "{label}: expected a binding");
        assert!(tb.is_complete(), "{label}");
    }
}

#[test]
fn every_truncation_binds_nothing() {
    for (label, kind, blob) in truncation_cases() {
        let data = blob.data();
        for cut in 1..=data.len() {
            let short = &data[..data.len() - cut];
            let tb = parse(&[Policy::new("test", kind)], short);
            assert!(tb[0].is_none(), "{label}: bound with {cut} bytes cut");
            if !short.is_empty() {
                assert_eq!(tb.error(), Some(&BlobError::Truncated), "{label}: cut {cut}");
            }
        }
    }
}

#[test]
fn string_truncation_through_header_name_and_value() {
    let blob = single(|b| b.add_string(Some("test"), "12345678").unwrap());
    let data = blob.data();
    // header 4, name length 2, "test\0" padded to 8, value 9, padding 3
    assert_eq!(data.len(), 24);
    for len in 0..data.len() {
        let tb = parse(&[Policy::new("test", BlobmsgType::String)], &data[..len]);
        assert!(tb[0].is_none(), "bound at length {len}");
    }
    let tb = parse(&[Policy::new("test", BlobmsgType::String)], data);
    assert_eq!(tb[0].unwrap().as_str(), Ok("12345678"));
}

#[test]
fn truncated_root_is_rejected() {
    let bytes = sample().into_bytes();
    for len in 0..bytes.len() {
        assert!(Blob::from_bytes(bytes[..len].to_vec()).is_err(), "length {len}");
    }
}

#[test]
fn truncation_keeps_earlier_members() {
    let blob = sample();
    let data = blob.data();
    let policy = [
        Policy::new("message", BlobmsgType::String),
        Policy::new("testdata", BlobmsgType::Table),
        Policy::new("list", BlobmsgType::Array),
    ];
    let tb = parse(&policy, &data[..data.len() - 4]);
    assert!(tb[0].is_some());
    assert!(tb[1].is_some());
    assert!(tb[2].is_none());
    assert_eq!(tb.error(), Some(&BlobError::Truncated));
}

// ---------------------------------------------------------------------------
// Corruption
// ---------------------------------------------------------------------------

#[test]
fn corrupt_length_stops_the_walk() {
    let mut buf = BlobBuf::new();
    buf.add_u8(Some("a"), 1).unwrap();
    buf.add_u8(Some("b"), 2).unwrap();
    let mut bytes = buf.finish().unwrap().into_bytes();
    // second member starts after root header (4) and first member (12)
    bytes[16..20].copy_from_slice(&[0x07, 0x00, 0x00, 0x02]);
    let blob = Blob::from_bytes(bytes).unwrap();
    let tb = parse(
        &[Policy::any("a"), Policy::any("b")],
        blob.data(),
    );
    assert_eq!(tb[0].unwrap().as_u8(), Ok(1));
    assert!(tb[1].is_none());
    assert!(matches!(tb.error(), Some(BlobError::Corrupt(_))));
}

#[test]
fn overlong_member_is_truncated() {
    let mut buf = BlobBuf::new();
    buf.add_u8(Some("a"), 1).unwrap();
    let mut bytes = buf.finish().unwrap().into_bytes();
    bytes[4..8].copy_from_slice(&[0x07, 0x00, 0x01, 0x00]);
    let blob = Blob::from_bytes(bytes).unwrap();
    let tb = parse(&[Policy::any("a")], blob.data());
    assert!(tb[0].is_none());
    assert_eq!(tb.error(), Some(&BlobError::Truncated));
}
