//! Fuzz target for Message::decode
//!
//! Arbitrary datagrams must never panic the frame parser: truncated
//! sections, inconsistent msg_len values, and corrupted checksums should
//! all come back as errors.

#![no_main]

use libfuzzer_sys::fuzz_target;

use bmclink_proto::Message;

fuzz_target!(|data: &[u8]| {
    let _ = Message::decode(data);
});
