use tremorlink::core::Sample;
use tremorlink::decode::{decode, DecodeError};

#[test]
fn test_decode_plain_payload() {
    assert_eq!(decode(b"12,34,56"), Ok(Sample::new(12, 34, 56)));
}

#[test]
fn test_decode_strips_nul_padding() {
    assert_eq!(decode(b"12,34,56\x00"), Ok(Sample::new(12, 34, 56)));
    assert_eq!(decode(b"1\x002,3\x004,5\x006"), Ok(Sample::new(12, 34, 56)));
}

#[test]
fn test_decode_negative_values() {
    assert_eq!(decode(b"-5,0,1023"), Ok(Sample::new(-5, 0, 1023)));
}

#[test]
fn test_decode_rejects_short_payload() {
    assert_eq!(decode(b"1,2"), Err(DecodeError::Length(2)));
}

#[test]
fn test_decode_rejects_long_payload() {
    assert_eq!(decode(b"1,2,3,4"), Err(DecodeError::Length(4)));
}

#[test]
fn test_decode_rejects_non_numeric_field() {
    assert_eq!(decode(b"a,2,3"), Err(DecodeError::Format("a".to_string())));
}

#[test]
fn test_decode_rejects_empty_field() {
    assert_eq!(decode(b"1,,3"), Err(DecodeError::Format(String::new())));
}

#[test]
fn test_decode_rejects_invalid_utf8() {
    assert_eq!(decode(&[0xff, 0xfe, 0x31]), Err(DecodeError::Encoding));
}
