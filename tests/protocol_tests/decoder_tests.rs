//! Decoder Tests
//!
//! Tests for value decoding across both protocol generations.

use std::io::{BufRead, Cursor};
use kvwire::protocol::{decode_value, encode_command, read_value, Data, Decoder, Value, ValueType};
use kvwire::{CodecConfig, KvWireError, Violation};

fn decode(bytes: &[u8]) -> Value {
    decode_value(bytes).unwrap()
}

fn violation(bytes: &[u8]) -> Violation {
    match decode_value(bytes) {
        Err(KvWireError::ProtocolViolation(v)) => v,
        other => panic!("Expected protocol violation, got {:?}", other),
    }
}

// =============================================================================
// Scalar Tests
// =============================================================================

#[test]
fn test_simple_string() {
    let value = decode(b"+OK\r\n");
    assert_eq!(value.value_type(), ValueType::SimpleString);
    assert_eq!(value.as_str(), Some("OK"));
}

#[test]
fn test_simple_error() {
    let value = decode(b"-ERR unknown command\r\n");
    assert_eq!(value.value_type(), ValueType::SimpleError);
    assert!(value.is_error());
    assert_eq!(value.error_message(), Some("ERR unknown command"));
}

#[test]
fn test_double_and_big_number_stay_textual() {
    let double = decode(b",3.14159\r\n");
    assert_eq!(double.value_type(), ValueType::Double);
    assert_eq!(double.as_str(), Some("3.14159"));

    let inf = decode(b",-inf\r\n");
    assert_eq!(inf.as_str(), Some("-inf"));

    let big = decode(b"(3492890328409238509324850943850943825024385\r\n");
    assert_eq!(big.value_type(), ValueType::BigNumber);
    assert_eq!(big.as_str(), Some("3492890328409238509324850943850943825024385"));
}

#[test]
fn test_integer() {
    assert_eq!(decode(b":1000\r\n").as_int(), Some(1000));
    assert_eq!(decode(b":0\r\n").as_int(), Some(0));
}

#[test]
fn test_negative_integer() {
    let value = decode(b":-123\r\n");
    assert_eq!(value.value_type(), ValueType::Integer);
    assert_eq!(value.as_int(), Some(-123));
}

#[test]
fn test_integer_extremes() {
    assert_eq!(decode(b":9223372036854775807\r\n").as_int(), Some(i64::MAX));
    assert_eq!(decode(b":-9223372036854775807\r\n").as_int(), Some(-i64::MAX));
    assert_eq!(decode(b":-9223372036854775808\r\n").as_int(), Some(i64::MIN));
    assert_eq!(violation(b":-9223372036854775809\r\n"), Violation::IntegerOverflow);
    assert_eq!(violation(b":9223372036854775808\r\n"), Violation::IntegerOverflow);
}

#[test]
fn test_null() {
    let value = decode(b"_\r\n");
    assert_eq!(value.value_type(), ValueType::Null);
    assert!(value.is_null());
}

#[test]
fn test_boolean() {
    let t = decode(b"#t\r\n");
    assert_eq!(t.value_type(), ValueType::Boolean);
    assert_eq!(t.as_int(), Some(1));
    assert_eq!(t.as_bool(), Some(true));

    let f = decode(b"#f\r\n");
    assert_eq!(f.as_int(), Some(0));
    assert_eq!(f.as_bool(), Some(false));
}

// =============================================================================
// Blob Tests
// =============================================================================

#[test]
fn test_blob_string() {
    let value = decode(b"$5\r\nhello\r\n");
    assert_eq!(value.value_type(), ValueType::BlobString);
    assert_eq!(value.as_bytes().unwrap().as_ref(), b"hello");
}

#[test]
fn test_empty_blob_string() {
    let value = decode(b"$0\r\n\r\n");
    assert_eq!(value.as_bytes().unwrap().len(), 0);
}

#[test]
fn test_blob_string_is_binary_safe() {
    // Payload contains CRLF and high bytes; the length prefix governs
    let mut bytes = b"$6\r\n".to_vec();
    bytes.extend_from_slice(&[b'a', b'\r', b'\n', 0x00, 0xFF, b'z']);
    bytes.extend_from_slice(b"\r\n");

    let value = decode(&bytes);
    assert_eq!(value.as_bytes().unwrap().as_ref(), &[b'a', b'\r', b'\n', 0x00, 0xFF, b'z']);
}

#[test]
fn test_blob_string_of_every_length_consumes_terminator() {
    let mut bytes = Vec::new();
    for n in 0..64usize {
        bytes.extend_from_slice(format!("${}\r\n", n).as_bytes());
        bytes.extend(std::iter::repeat(b'x').take(n));
        bytes.extend_from_slice(b"\r\n");
    }
    bytes.extend_from_slice(b":7\r\n");

    let mut cursor = Cursor::new(bytes);
    for n in 0..64usize {
        let value = read_value(&mut cursor).unwrap();
        assert_eq!(value.as_bytes().unwrap().len(), n);
        assert!(value.as_bytes().unwrap().iter().all(|&b| b == b'x'));
    }
    // Next read starts exactly at the following unit
    assert_eq!(read_value(&mut cursor).unwrap().as_int(), Some(7));
}

#[test]
fn test_blob_error_and_verbatim() {
    let err = decode(b"!21\r\nSYNTAX invalid syntax\r\n");
    assert_eq!(err.value_type(), ValueType::BlobError);
    assert_eq!(err.error_message(), Some("SYNTAX invalid syntax"));

    let verbatim = decode(b"=15\r\ntxt:Some string\r\n");
    assert_eq!(verbatim.value_type(), ValueType::VerbatimString);
    assert_eq!(verbatim.as_str(), Some("txt:Some string"));
}

#[test]
fn test_legacy_null_blob_and_array() {
    let blob = decode(b"$-1\r\n");
    assert!(blob.is_null());
    assert_eq!(blob.value_type(), ValueType::Null);

    let array = decode(b"*-1\r\n");
    assert!(array.is_null());
    assert_eq!(array.value_type(), ValueType::Null);
}

// =============================================================================
// Chunked Reassembly Tests
// =============================================================================

#[test]
fn test_chunked_blob_string() {
    let value = decode(b"$?\r\n;3\r\nabc\r\n;4\r\ndefg\r\n;0\r\n");
    assert_eq!(value.value_type(), ValueType::BlobString);
    assert_eq!(value.as_str(), Some("abcdefg"));
}

#[test]
fn test_chunked_blob_with_no_fragments() {
    let value = decode(b"$?\r\n;0\r\n");
    assert_eq!(value.as_bytes().unwrap().len(), 0);
}

#[test]
fn test_chunked_blob_followed_by_next_unit() {
    let mut cursor = Cursor::new(b"$?\r\n;2\r\nhi\r\n;0\r\n+NEXT\r\n".to_vec());
    assert_eq!(read_value(&mut cursor).unwrap().as_str(), Some("hi"));
    assert_eq!(read_value(&mut cursor).unwrap().as_str(), Some("NEXT"));
}

#[test]
fn test_chunked_blob_bad_delimiter() {
    assert_eq!(
        violation(b"$?\r\n:3\r\nabc\r\n;0\r\n"),
        Violation::UnexpectedByte { expected: b';', found: b':' }
    );
}

// =============================================================================
// Aggregate Tests
// =============================================================================

#[test]
fn test_array() {
    let value = decode(b"*3\r\n:1\r\n$3\r\nfoo\r\n_\r\n");
    assert_eq!(
        value,
        Value::array(vec![Value::integer(1), Value::blob_string("foo"), Value::null()])
    );
}

#[test]
fn test_empty_array() {
    let value = decode(b"*0\r\n");
    assert_eq!(value.elements().unwrap().len(), 0);
}

#[test]
fn test_nested_array() {
    let value = decode(b"*2\r\n*2\r\n:1\r\n:2\r\n*1\r\n+x\r\n");
    let outer = value.elements().unwrap();
    assert_eq!(outer.len(), 2);
    assert_eq!(outer[0].elements().unwrap().len(), 2);
    assert_eq!(outer[1].elements().unwrap()[0].as_str(), Some("x"));
}

#[test]
fn test_set_and_push() {
    let set = decode(b"~2\r\n+a\r\n+b\r\n");
    assert_eq!(set.value_type(), ValueType::Set);
    assert_eq!(set.elements().unwrap().len(), 2);

    let push = decode(b">3\r\n$7\r\nmessage\r\n$2\r\nch\r\n$5\r\nhello\r\n");
    assert_eq!(push.value_type(), ValueType::Push);
    assert_eq!(push.elements().unwrap()[2].as_str(), Some("hello"));
}

#[test]
fn test_bounded_map_has_interleaved_elements() {
    let value = decode(b"%2\r\n+first\r\n:1\r\n+second\r\n:2\r\n");
    assert_eq!(value.value_type(), ValueType::Map);
    assert_eq!(value.elements().unwrap().len(), 4);

    let entries: Vec<_> = value.map_entries().unwrap().collect();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].0.as_str(), Some("first"));
    assert_eq!(entries[1].1.as_int(), Some(2));
}

#[test]
fn test_streamed_array() {
    let value = decode(b"*?\r\n:1\r\n:2\r\n.\r\n");
    assert_eq!(value.value_type(), ValueType::Array);
    assert_eq!(value, Value::array(vec![Value::integer(1), Value::integer(2)]));
    assert!(value
        .elements()
        .unwrap()
        .iter()
        .all(|e| e.value_type() != ValueType::EndOfStream));
}

#[test]
fn test_streamed_map_runs_until_sentinel() {
    let value = decode(b"%?\r\n+a\r\n:1\r\n+b\r\n:2\r\n.\r\n");
    assert_eq!(value.value_type(), ValueType::Map);
    assert_eq!(value.elements().unwrap().len(), 4);
}

#[test]
fn test_streamed_map_with_dangling_key() {
    assert_eq!(
        violation(b"%?\r\n+a\r\n:1\r\n+dangling\r\n.\r\n"),
        Violation::OddMapLength(3)
    );
    assert_eq!(violation(b"|?\r\n+k\r\n.\r\n+OK\r\n"), Violation::OddMapLength(1));

    // Streamed sets and arrays have no pairing requirement
    assert_eq!(decode(b"~?\r\n+a\r\n+b\r\n+c\r\n.\r\n").elements().unwrap().len(), 3);
}

#[test]
fn test_streamed_array_nested_in_bounded() {
    let value = decode(b"*2\r\n*?\r\n+x\r\n.\r\n:5\r\n");
    let outer = value.elements().unwrap();
    assert_eq!(outer[0], Value::array(vec![Value::simple_string("x")]));
    assert_eq!(outer[1].as_int(), Some(5));
}

#[test]
fn test_empty_streamed_set() {
    let value = decode(b"~?\r\n.\r\n");
    assert_eq!(value.value_type(), ValueType::Set);
    assert_eq!(value.elements().unwrap().len(), 0);
}

#[test]
fn test_end_of_stream_outside_streamed_aggregate() {
    let value = decode(b".\r\n");
    assert_eq!(value.value_type(), ValueType::EndOfStream);
    assert!(value.is_null());
}

// =============================================================================
// Attribute Tests
// =============================================================================

#[test]
fn test_attributes_attach_to_following_value() {
    let value = decode(b"|1\r\n+ttl\r\n:3600\r\n$3\r\nbar\r\n");
    assert_eq!(value.value_type(), ValueType::BlobString);
    assert_eq!(value.as_str(), Some("bar"));

    let attrs = value.attributes().expect("attributes attached");
    assert_eq!(attrs.value_type(), ValueType::Attributes);
    assert_eq!(
        *attrs,
        Value::attributes_unit(vec![(Value::simple_string("ttl"), Value::integer(3600))])
    );
}

#[test]
fn test_value_without_attributes() {
    let value = decode(b"$3\r\nbar\r\n");
    assert!(value.attributes().is_none());
}

#[test]
fn test_attributes_are_never_returned_alone() {
    let mut cursor = Cursor::new(b"|1\r\n+k\r\n+v\r\n:1\r\n:2\r\n".to_vec());
    let first = read_value(&mut cursor).unwrap();
    assert_eq!(first.as_int(), Some(1));
    assert!(first.attributes().is_some());

    // The pending slot is cleared once attached
    let second = read_value(&mut cursor).unwrap();
    assert_eq!(second.as_int(), Some(2));
    assert!(second.attributes().is_none());
}

#[test]
fn test_newer_attributes_replace_pending() {
    let value = decode(b"|1\r\n+old\r\n:1\r\n|1\r\n+new\r\n:2\r\n+OK\r\n");
    let attrs = value.attributes().unwrap();
    let entries: Vec<_> = attrs.map_entries().unwrap().collect();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].0.as_str(), Some("new"));
}

#[test]
fn test_attributes_on_nested_element() {
    let value = decode(b"*2\r\n:1\r\n|1\r\n+key-popularity\r\n,0.5\r\n:2\r\n");
    assert!(value.attributes().is_none());

    let elements = value.elements().unwrap();
    assert_eq!(elements.len(), 2);
    assert!(elements[0].attributes().is_none());
    assert_eq!(elements[1].as_int(), Some(2));
    assert!(elements[1].attributes().is_some());
}

#[test]
fn test_streamed_attributes() {
    let value = decode(b"|?\r\n+a\r\n+b\r\n.\r\n#t\r\n");
    assert_eq!(value.as_bool(), Some(true));
    assert_eq!(value.attributes().unwrap().elements().unwrap().len(), 2);
}

// =============================================================================
// Error Handling Tests
// =============================================================================

#[test]
fn test_unknown_marker_is_protocol_violation() {
    let err = decode_value(b"@oops\r\n").unwrap_err();
    assert!(err.is_protocol_violation());
    assert!(!matches!(err, KvWireError::Io(_)));
    assert!(err.to_string().contains("unknown message type"));

    assert_eq!(violation(b"\x00\r\n"), Violation::UnknownMarker(0x00));
}

#[test]
fn test_unknown_marker_inside_aggregate() {
    assert_eq!(violation(b"*2\r\n:1\r\nX\r\n"), Violation::UnknownMarker(b'X'));
}

#[test]
fn test_line_without_crlf() {
    assert_eq!(violation(b"+OK\n"), Violation::MissingCrlf);
    assert_eq!(violation(b"+\n"), Violation::MissingCrlf);
}

#[test]
fn test_unexpected_number_byte() {
    assert_eq!(violation(b":12a\r\n"), Violation::UnexpectedNumberByte(b'a'));
    assert_eq!(violation(b"*x\r\n"), Violation::UnexpectedNumberByte(b'x'));
}

#[test]
fn test_empty_and_overflowing_numbers() {
    assert_eq!(violation(b":\r\n"), Violation::EmptyNumber);
    assert_eq!(violation(b":99999999999999999999\r\n"), Violation::IntegerOverflow);
}

#[test]
fn test_streamed_length_on_integer() {
    assert_eq!(violation(b":?\r\n"), Violation::UnexpectedStreamedLength(b':'));
}

#[test]
fn test_invalid_boolean() {
    assert_eq!(violation(b"#x\r\n"), Violation::InvalidBoolean(b'x'));
}

#[test]
fn test_missing_blob_terminator() {
    assert_eq!(
        violation(b"$3\r\nabcd\r\n"),
        Violation::UnexpectedByte { expected: b'\r', found: b'd' }
    );
}

#[test]
fn test_truncated_stream_is_io_error() {
    for bytes in [&b""[..], &b"$5\r\nhel"[..], &b"*2\r\n:1\r\n"[..], &b"+OK"[..], &b":12"[..]] {
        let err = decode_value(bytes).unwrap_err();
        match err {
            KvWireError::Io(ref e) => assert_eq!(e.kind(), std::io::ErrorKind::UnexpectedEof),
            other => panic!("Expected IO error for {:?}, got {:?}", bytes, other),
        }
        assert!(err.is_disconnect());
        assert!(!err.is_protocol_violation());
    }
}

#[test]
fn test_depth_limit() {
    let config = CodecConfig::builder().max_depth(2).build();

    let ok = b"*1\r\n*1\r\n:1\r\n";
    assert!(Decoder::with_config(&ok[..], &config).decode().is_ok());

    let too_deep = b"*1\r\n*1\r\n*1\r\n:1\r\n";
    match Decoder::with_config(&too_deep[..], &config).decode() {
        Err(KvWireError::ProtocolViolation(Violation::NestingTooDeep { max })) => assert_eq!(max, 2),
        other => panic!("Expected nesting violation, got {:?}", other),
    }
}

#[test]
fn test_blob_limit() {
    let config = CodecConfig::builder().max_blob_len(4).build();

    let bounded = b"$5\r\nhello\r\n";
    match Decoder::with_config(&bounded[..], &config).decode() {
        Err(KvWireError::ProtocolViolation(Violation::BlobTooLarge { len, max })) => {
            assert_eq!((len, max), (5, 4));
        }
        other => panic!("Expected blob limit violation, got {:?}", other),
    }

    // Chunked blobs are checked against the reassembled total
    let chunked = b"$?\r\n;3\r\nabc\r\n;3\r\ndef\r\n;0\r\n";
    match Decoder::with_config(&chunked[..], &config).decode() {
        Err(KvWireError::ProtocolViolation(Violation::BlobTooLarge { len, .. })) => {
            assert_eq!(len, 6);
        }
        other => panic!("Expected blob limit violation, got {:?}", other),
    }
}

#[test]
fn test_line_limit() {
    let config = CodecConfig::builder().max_blob_len(4).build();

    let fits = b"+abcd\r\n";
    let value = Decoder::with_config(&fits[..], &config).decode().unwrap();
    assert_eq!(value.as_str(), Some("abcd"));

    // No LF within the limit: rejected without buffering the rest
    let mut unterminated = b"-".to_vec();
    unterminated.extend(std::iter::repeat(b'e').take(1024));
    match Decoder::with_config(&unterminated[..], &config).decode() {
        Err(KvWireError::ProtocolViolation(Violation::BlobTooLarge { len, max })) => {
            assert_eq!((len, max), (6, 4));
        }
        other => panic!("Expected line limit violation, got {:?}", other),
    }
}

// =============================================================================
// Stream Behavior Tests
// =============================================================================

#[test]
fn test_decoder_reads_consecutive_values() {
    let bytes = b"+OK\r\n:42\r\n$3\r\nfoo\r\n*?\r\n#f\r\n.\r\n";
    let mut decoder = Decoder::new(&bytes[..]);

    assert_eq!(decoder.decode().unwrap(), Value::simple_string("OK"));
    assert_eq!(decoder.decode().unwrap(), Value::integer(42));
    assert_eq!(decoder.decode().unwrap(), Value::blob_string("foo"));
    assert_eq!(decoder.decode().unwrap(), Value::array(vec![Value::boolean(false)]));
    assert!(decoder.get_mut().fill_buf().unwrap().is_empty());
}

#[test]
fn test_decode_is_repeatable() {
    let bytes = b"|1\r\n+meta\r\n%?\r\n+a\r\n:1\r\n.\r\n*3\r\n$?\r\n;2\r\nab\r\n;0\r\n~1\r\n(12\r\n%1\r\n+k\r\n,1.5\r\n".to_vec();

    let first = read_value(&mut Cursor::new(bytes.clone())).unwrap();
    let second = read_value(&mut Cursor::new(bytes)).unwrap();
    assert_eq!(first, second);
    assert!(first.attributes().is_some());
}

#[test]
fn test_round_trip_with_encoder() {
    // A command's encoding decodes as an array of blob strings
    let encoded = encode_command(&["SET", "k", "v"]);
    let decoded = decode_value(&encoded).unwrap();
    assert_eq!(
        decoded,
        Value::array(vec![
            Value::blob_string("SET"),
            Value::blob_string("k"),
            Value::blob_string("v"),
        ])
    );

    // And the server's reply decodes to the directly constructed value
    let reply = decode_value(b"$3\r\nOK!\r\n").unwrap();
    assert_eq!(reply, Value::blob_string("OK!"));
    assert_eq!(reply.data(), &Data::Str("OK!".into()));
}
