//! Fuzz target for AsfMessage::decode and Pong parsing.

#![no_main]

use libfuzzer_sys::fuzz_target;

use bmclink_proto::{AsfMessage, Pong};

fuzz_target!(|data: &[u8]| {
    if let Ok(message) = AsfMessage::decode(data) {
        let _ = message.parse_data::<Pong>();
    }
});
