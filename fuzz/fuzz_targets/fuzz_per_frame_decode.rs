#![no_main]

use libfuzzer_sys::fuzz_target;
use xrm2nexus::xrm::decode::{decode_name_list, decode_texts, decode_with_fallback, PER_FRAME_STRATEGIES};

fuzz_target!(|data: &[u8]| {
    // First byte picks the declared frame count, the rest is the record
    let Some((&count, record)) = data.split_first() else {
        return;
    };
    let frame_count = count as usize;

    // Must never panic, only reject lengths that match no layout
    if let Ok((values, _)) = decode_with_fallback(record, frame_count, &PER_FRAME_STRATEGIES) {
        assert_eq!(values.len(), frame_count);
    }

    let _ = decode_texts(record);
    let _ = decode_name_list(record);
});
