//! Property-based tests for the wire format.
//!
//! These tests use proptest to generate arbitrary packets, timestamps and
//! byte buffers and check invariants that must hold for all of them.

use bytes::BytesMut;
use chrono::{NaiveDate, NaiveDateTime};
use proptest::prelude::*;
use punchgate_protocol::{
    CommandCode, Packet, ZkCodec, decode_attendance, decode_time, decode_users, encode_time,
};
use tokio_util::codec::{Decoder, Encoder};

/// Strategy for commands the client and device exchange.
fn command() -> impl Strategy<Value = CommandCode> {
    prop_oneof![
        Just(CommandCode::Connect),
        Just(CommandCode::Exit),
        Just(CommandCode::ReadBuffer),
        Just(CommandCode::ReadyChunk),
        Just(CommandCode::PrepareData),
        Just(CommandCode::Data),
        Just(CommandCode::FreeData),
        Just(CommandCode::AckOk),
        Just(CommandCode::AckUnauth),
    ]
}

fn packet() -> impl Strategy<Value = Packet> {
    (
        command(),
        any::<u16>(),
        any::<u16>(),
        prop::collection::vec(any::<u8>(), 0..512),
    )
        .prop_map(|(command, session, reply, data)| Packet::new(command, session, reply, data))
}

/// Strategy for wall-clock times the packed format can represent.
fn device_time() -> impl Strategy<Value = NaiveDateTime> {
    (2000i32..=2130, 1u32..=12, 1u32..=28, 0u32..24, 0u32..60, 0u32..60).prop_map(
        |(y, m, d, h, min, s)| {
            NaiveDate::from_ymd_opt(y, m, d)
                .unwrap()
                .and_hms_opt(h, min, s)
                .unwrap()
        },
    )
}

proptest! {
    /// Property: a stream of packets decodes to the same packets no matter
    /// where the bytes are split between reads.
    #[test]
    fn prop_codec_reassembles_split_stream(
        packets in prop::collection::vec(packet(), 1..8),
        split in any::<prop::sample::Index>(),
    ) {
        let mut codec = ZkCodec::new();
        let mut wire = BytesMut::new();
        for packet in &packets {
            codec.encode(packet.clone(), &mut wire).unwrap();
        }

        let split_at = split.index(wire.len() + 1);
        let tail = wire.split_off(split_at);

        let mut buffer = BytesMut::new();
        let mut decoded = Vec::new();
        for part in [wire, tail] {
            buffer.extend_from_slice(&part);
            while let Some(packet) = codec.decode(&mut buffer).unwrap() {
                decoded.push(packet);
            }
        }

        prop_assert!(buffer.is_empty());
        prop_assert_eq!(decoded.len(), packets.len());
        for (got, sent) in decoded.iter().zip(&packets) {
            prop_assert!(got.has_valid_checksum());
            prop_assert_eq!(got.command, sent.command);
            prop_assert_eq!(got.session_id, sent.session_id);
            prop_assert_eq!(got.reply_id, sent.reply_id);
            prop_assert_eq!(&got.data, &sent.data);
        }
    }

    /// Property: every representable wall-clock time survives packing.
    #[test]
    fn prop_time_packing_is_lossless(time in device_time()) {
        prop_assert_eq!(decode_time(encode_time(time)), time);
    }

    /// Property: arbitrary table buffers never panic the decoders; they
    /// either decode or report invalid record data.
    #[test]
    fn prop_table_decoding_never_panics(buffer in prop::collection::vec(any::<u8>(), 0..400)) {
        let _ = decode_attendance(&buffer);
        let _ = decode_users(&buffer);
    }

    /// Property: a declared size that is not a whole number of records is
    /// always rejected.
    #[test]
    fn prop_partial_record_rejected(records in 0usize..20, extra in 1usize..40) {
        let declared = records * 40 + extra;
        let mut buffer = (declared as u32).to_le_bytes().to_vec();
        buffer.resize(4 + declared, 0);

        prop_assert!(decode_attendance(&buffer).is_err());
    }
}
