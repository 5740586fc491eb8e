#![no_main]

use libfuzzer_sys::fuzz_target;
use simili_github_issues::issue_comment::{html_comment_tokens, is_triage_report};

fuzz_target!(|data: &[u8]| {
    let body = String::from_utf8_lossy(data);
    for token in html_comment_tokens(&body) {
        assert!(body.contains(token));
    }
    let _ = is_triage_report(&body);
});
