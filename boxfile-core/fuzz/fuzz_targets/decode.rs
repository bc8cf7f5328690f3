#![no_main]
use libfuzzer_sys::fuzz_target;

use boxfile_core::ContainerSrc;

fuzz_target!(|data: &[u8]| {
    let mut src = data;
    let mut consumed = 0u64;
    while let Ok(Some((entry, payload))) = src.decode() {
        assert_eq!(entry.size(), payload.len() as u64);
        consumed += entry.framed_size().expect("decoded entry overflowed");
    }
    assert!(consumed <= data.len() as u64);
});
