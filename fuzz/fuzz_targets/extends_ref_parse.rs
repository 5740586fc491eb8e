#![no_main]

use libfuzzer_sys::fuzz_target;
use simili_config::ExtendsRef;

fuzz_target!(|data: &[u8]| {
    let raw = String::from_utf8_lossy(data);
    if let Ok(reference) = ExtendsRef::parse(&raw) {
        assert!(!reference.org.is_empty());
        assert!(!reference.repo.is_empty());
        assert!(!reference.branch.is_empty());
        assert!(!reference.path.is_empty());
        let reparsed = ExtendsRef::parse(&reference.to_string()).expect("canonical form parses");
        assert_eq!(reparsed, reference);
    }
});
