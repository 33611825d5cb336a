use bytes::Bytes;
use num_bigint::BigInt;
use std::io;
use vlbin::prelude::*;

/// The stingiest legal scanner: every window holds exactly the minimum the
/// reader asked for (or whatever remains of the stream).
struct DripScanner {
    data: Vec<u8>,
    offset: usize,
}

impl DripScanner {
    fn new(data: Vec<u8>) -> DripScanner { DripScanner { data, offset: 0 } }
}

impl Scanner for DripScanner {
    fn read(&mut self, skip: usize, min_bytes: usize) -> Result<Bytes, Error> {
        self.offset += skip;
        let end = (self.offset + min_bytes).min(self.data.len());
        Ok(Bytes::from(self.data[self.offset..end].to_vec()))
    }
}

fn sample_stream() -> Vec<u8> {
    let mut w = Writer::new(Vec::new(), Options::default());
    w.write_u64(u64::max_value());
    w.write_i64(i64::min_value());
    w.write_str("streaming readers hold only a window");
    w.write_bitfield_u64(0xDEAD_BEEF, 37);
    w.write_bitfield_u64(0b101, 3);
    w.write_f64(-0.5);
    w.write_nullable_u32(None);
    w.write_bytes(&[0u8; 300]);
    w.write_bigint(&(BigInt::from(1u8) << 100)).unwrap();
    w.write_bool(true);
    w.finish()
}

fn drain<S: Scanner>(r: &mut Reader<S>) {
    assert_eq!(r.read_u64().unwrap(), u64::max_value());
    assert_eq!(r.read_i64().unwrap(), i64::min_value());
    assert_eq!(r.read_str().unwrap(), "streaming readers hold only a window");
    assert_eq!(r.read_bitfield_u64(37).unwrap(), 0xDEAD_BEEF);
    assert_eq!(r.read_bitfield_u64(3).unwrap(), 0b101);
    assert_eq!(r.read_f64().unwrap(), -0.5);
    assert_eq!(r.read_nullable_u32().unwrap(), None);
    assert_eq!(&r.read_bytes().unwrap()[..], &[0u8; 300][..]);
    assert_eq!(r.read_bigint().unwrap(), BigInt::from(1u8) << 100);
    assert_eq!(r.read_bool().unwrap(), true);
}

#[test]
fn streaming_decode_matches_whole_buffer_decode() {
    let enc = sample_stream();

    let mut whole = Reader::from_slice(&enc, Options::default());
    drain(&mut whole);
    assert_eq!(whole.position(), enc.len() as u64);

    let mut dripped = Reader::new(DripScanner::new(enc.clone()), Options::default());
    drain(&mut dripped);
    assert_eq!(dripped.position(), enc.len() as u64);
}

#[test]
fn io_scanner_decodes_from_any_reader() {
    let enc = sample_stream();
    let mut r = Reader::new(IoScanner::new(io::Cursor::new(enc)), Options::default());
    drain(&mut r);
}

#[test]
fn unexpected_eof_is_latched() {
    // a 3-byte value cut off after its tag
    let mut r = Reader::from_slice(&[0xC0, 0x12], Options::default());
    let first = r.read_u64().unwrap_err();
    match &first {
        Error::UnexpectedEof { .. } => (),
        other => panic!("expected UnexpectedEof, got {:?}", other),
    }
    // every later call returns the same latched error
    assert_eq!(r.read_u64().unwrap_err(), first);
    assert_eq!(r.read_bool().unwrap_err(), first);
    assert_eq!(r.read_str().unwrap_err(), first);
}

#[test]
fn overflow_reports_or_truncates_per_options() {
    let mut w = Writer::new(Vec::new(), Options::default());
    w.write_u32(300);
    let enc = w.finish();

    let mut r = Reader::from_slice(&enc, Options::default());
    match r.read_u8() {
        Err(Error::IntegerOverflow { expected: "u8", .. }) => (),
        other => panic!("expected IntegerOverflow, got {:?}", other),
    }
    // the failed read did not consume the value
    assert_eq!(r.read_u32().unwrap(), 300);

    let opt = Options {
        silently_truncate_large_numbers: true,
        ..Options::default()
    };
    let mut r = Reader::from_slice(&enc, opt);
    assert_eq!(r.read_u8().unwrap(), 44);
}

#[test]
fn large_format_overflow_respects_truncation() {
    let mut w = Writer::new(Vec::new(), Options::default());
    w.write_bigint(&(BigInt::from(1u8) << 64)).unwrap();
    let enc = w.finish();

    let mut r = Reader::from_slice(&enc, Options::default());
    match r.read_i64() {
        Err(Error::IntegerOverflow { expected: "i64", .. }) => (),
        other => panic!("expected IntegerOverflow, got {:?}", other),
    }

    let opt = Options {
        silently_truncate_large_numbers: true,
        ..Options::default()
    };
    let mut r = Reader::from_slice(&enc, opt);
    assert_eq!(r.read_i64().unwrap(), 0);
}

#[test]
fn number_size_cap_applies_on_both_sides() {
    let opt = Options {
        max_number_size: 8,
        ..Options::default()
    };

    let mut w = Writer::new(Vec::new(), opt.clone());
    match w.write_bigint(&(BigInt::from(1u8) << 100)) {
        Err(Error::OversizedNumber { size: 13, .. }) => (),
        other => panic!("expected OversizedNumber, got {:?}", other),
    }

    // a 9-byte large-format value against an 8-byte cap
    let mut enc = vec![0xFE, 9];
    enc.extend_from_slice(&[1u8; 9]);
    let mut r = Reader::from_slice(&enc, opt);
    match r.read_bigint() {
        Err(Error::OversizedNumber { size: 9, .. }) => (),
        other => panic!("expected OversizedNumber, got {:?}", other),
    }
}

#[test]
fn malformed_length_prefixes_are_reported() {
    let mut r = Reader::from_slice(&[0xFE, 0xFF], Options::default());
    match r.read_u64() {
        Err(Error::NullLengthPrefix { position: 1 }) => (),
        other => panic!("expected NullLengthPrefix, got {:?}", other),
    }

    let mut r = Reader::from_slice(&[0xFE, 0xFE, 0x01, 0x05], Options::default());
    match r.read_u64() {
        Err(Error::NestedLengthPrefix { position: 1, byte: 0xFE }) => (),
        other => panic!("expected NestedLengthPrefix, got {:?}", other),
    }
}

#[test]
fn missing_markers_are_reported() {
    let plain = {
        let mut w = Writer::new(Vec::new(), Options::default());
        w.write_str("x");
        w.finish()
    };
    let opt = Options {
        markers: Markers::LIST_START,
        ..Options::default()
    };
    let mut r = Reader::from_slice(&plain, opt);
    match r.read_str() {
        Err(Error::MissingMarker { expected: b'[', found: 0x01, .. }) => (),
        other => panic!("expected MissingMarker, got {:?}", other),
    }
}

#[test]
fn invalid_utf8_is_reported_but_bytes_pass_through() {
    let payload = [0xC0u8, 0x80];
    let enc = {
        let mut w = Writer::new(Vec::new(), Options::default());
        w.write_bytes(&payload);
        w.finish()
    };

    let mut r = Reader::from_slice(&enc, Options::default());
    match r.read_str() {
        Err(Error::InvalidUtf8 { position: 0 }) => (),
        other => panic!("expected InvalidUtf8, got {:?}", other),
    }

    let mut r = Reader::from_slice(&enc, Options::default());
    assert_eq!(&r.read_bytes().unwrap()[..], &payload[..]);
}

#[test]
fn bad_bool_bytes_are_reported() {
    let mut r = Reader::from_slice(&[0x02], Options::default());
    match r.read_bool() {
        Err(Error::BadBool { position: 0, byte: 0x02 }) => (),
        other => panic!("expected BadBool, got {:?}", other),
    }
}

#[test]
fn bad_presence_prefix_is_reported() {
    let mut r = Reader::from_slice(&[0x07, 0, 0, 0, 0], Options::default());
    match r.read_nullable_f32() {
        Err(Error::BadPresencePrefix { position: 0, byte: 0x07 }) => (),
        other => panic!("expected BadPresencePrefix, got {:?}", other),
    }
}
