//! Decode arbitrary bytes as a control block of every interface version.
//!
//! Decoding and display must never panic, whatever the buffer holds.

#![no_main]

use aci_proto::{Record, control_block, codes::API_VERSION_MAX};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    for version in 1..=API_VERSION_MAX {
        let Ok(layout) = control_block::layout(version) else {
            continue;
        };
        let Ok(record) = Record::from_bytes(layout, data) else {
            continue;
        };
        let _ = record.decode();
        let _ = record.display_fields(None);
    }
});
