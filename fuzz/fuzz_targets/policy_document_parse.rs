#![no_main]

use libfuzzer_sys::fuzz_target;
use simili_config::parse_policy_document;

fuzz_target!(|data: &[u8]| {
    let raw = String::from_utf8_lossy(data);
    if let Ok(policy) = parse_policy_document(&raw, "fuzz", |_| None) {
        let _ = policy.resolve();
    }
});
