//! Parse arbitrary bytes as a CIS response page for every info layout.
//!
//! A page either parses and yields at most `curobj` records, or is rejected
//! with an error.

#![no_main]

use aci_proto::cis::{ObjectType, Page, info};
use libfuzzer_sys::fuzz_target;

const TYPES: &[ObjectType] = &[
    ObjectType::Broker,
    ObjectType::Service,
    ObjectType::Server,
    ObjectType::Client,
    ObjectType::Conversation,
    ObjectType::Psf,
    ObjectType::UowStatistics,
];

fuzz_target!(|data: &[u8]| {
    for &object_type in TYPES {
        let Some(Ok(layout)) = info::layout(object_type) else {
            continue;
        };
        let Ok(page) = Page::parse(data, layout) else {
            continue;
        };
        let curobj = page.header().curobj() as usize;
        let mut count = 0;
        for record in page.records() {
            let Ok(record) = record else {
                break;
            };
            let _ = record.dump_fields(None);
            count += 1;
        }
        assert!(count <= curobj);
    }
});
