#![no_main]

use issuer_service::models::TokenRequest;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(request) = serde_json::from_slice::<TokenRequest>(data) {
        // A subject, when present, is never blank
        if let Some(subject) = request.subject() {
            assert!(!subject.trim().is_empty());
        }
    }
});
