#![no_main]

use libfuzzer_sys::fuzz_target;
use tds_protocol::{PacketHeader, PacketType, frame_message};

fuzz_target!(|data: &[u8]| {
    // Fuzz packet header parsing
    if data.len() >= 8 {
        let mut cursor = data;
        let _ = PacketHeader::decode(&mut cursor);
    }

    // Framing any payload yields headers that decode and cover it exactly
    let framed = frame_message(PacketType::PreLogin, data, 512);
    let mut rest = &framed[..];
    let mut payload_len = 0;
    while !rest.is_empty() {
        let header = PacketHeader::decode(&mut rest).expect("framed header must decode");
        payload_len += header.payload_length();
        rest = &rest[header.payload_length()..];
    }
    assert_eq!(payload_len, data.len());
});
