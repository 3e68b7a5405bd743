#![no_main]

use bytes::Bytes;
use libfuzzer_sys::fuzz_target;
use tds_protocol::{OptionBlock, PreLogin};

fuzz_target!(|data: &[u8]| {
    // PRELOGIN responses come straight from the server before any
    // authentication, so decoding must never panic.
    let Ok(block) = OptionBlock::decode(Bytes::copy_from_slice(data)) else {
        return;
    };

    // Anything accepted re-encodes to a block with the same options
    if let Ok(encoded) = block.encode() {
        let decoded = OptionBlock::decode(encoded).expect("re-encoded block must decode");
        assert_eq!(decoded, block);
    }

    let _ = PreLogin::from_options(&block);
});
