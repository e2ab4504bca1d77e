//! Codec round-trip and corruption tests

mod common;

use common::line;
use linevault::codec::{
    decode_record, ByteOrder, LineRecord, RecordEncoder, LINES_PER_RECORD, LINE_LENGTH,
};
use linevault::error::CodecError;

fn compress_lines(lines: &[LineRecord]) -> Vec<u8> {
    let mut plain = Vec::with_capacity(lines.len() * LINE_LENGTH);
    for l in lines {
        plain.extend_from_slice(&l.encode());
    }
    RecordEncoder::new().compress(&plain)
}

#[test]
fn test_round_trip_single_line() {
    let mut original = line(5328.0384, 2600, -1.466);
    original.lande_lower = 1.5;
    original.gamma_stark = -6.16;
    original.set_forbid_flag(b'A');

    let decoded = decode_record(&compress_lines(&[original.clone()]), ByteOrder::Little).unwrap();
    assert_eq!(decoded.len(), 1);
    assert_eq!(decoded[0], original);
}

#[test]
fn test_round_trip_full_record() {
    let lines: Vec<LineRecord> = (0..LINES_PER_RECORD)
        .map(|i| line(4000.0 + i as f64 * 0.05, 100 + (i % 40) as i32, -(i as f32) * 0.01))
        .collect();
    let decoded = decode_record(&compress_lines(&lines), ByteOrder::Little).unwrap();
    assert_eq!(decoded, lines);
}

#[test]
fn test_round_trip_preserves_term_blob() {
    let mut original = line(6562.801, 100, -0.2);
    original.term_blob[..14].copy_from_slice(b"1s 2S         ");
    original.term_blob[88..102].copy_from_slice(b"2p 2P*        ");
    original.term_blob[176] = 1;
    original.term_blob[177..179].copy_from_slice(&42u16.to_le_bytes());

    let decoded = decode_record(&compress_lines(&[original.clone()]), ByteOrder::Little).unwrap();
    assert_eq!(decoded[0].lower_term(), "1s 2S");
    assert_eq!(decoded[0].upper_term(), "2p 2P*");
    assert_eq!(decoded[0].bib_refs(), vec![42]);
}

#[test]
fn test_truncated_stream_rejected() {
    let compressed = compress_lines(&[line(5000.0, 2600, -1.0), line(5000.1, 2600, -2.0)]);
    let result = decode_record(&compressed[..compressed.len() / 2], ByteOrder::Little);
    assert!(matches!(
        result,
        Err(CodecError::Truncated) | Err(CodecError::PartialLine(_))
    ));
}

#[test]
fn test_partial_line_rejected() {
    // 1.5 lines' worth of payload cannot form whole records
    let plain = vec![0x41u8; LINE_LENGTH + LINE_LENGTH / 2];
    let compressed = RecordEncoder::new().compress(&plain);
    assert!(matches!(
        decode_record(&compressed, ByteOrder::Little),
        Err(CodecError::PartialLine(_))
    ));
}

#[test]
fn test_oversized_record_rejected() {
    let plain = vec![0u8; (LINES_PER_RECORD + 1) * LINE_LENGTH];
    let compressed = RecordEncoder::new().compress(&plain);
    assert!(matches!(
        decode_record(&compressed, ByteOrder::Little),
        Err(CodecError::TooManyLines(_))
    ));
}

#[test]
fn test_repetitive_payload_compresses() {
    let lines: Vec<LineRecord> = (0..256).map(|_| line(5000.0, 2600, -1.0)).collect();
    let compressed = compress_lines(&lines);
    assert!(compressed.len() < 256 * LINE_LENGTH / 4);
}
