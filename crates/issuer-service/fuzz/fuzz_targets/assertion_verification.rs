#![no_main]

use common::jwt::{extract_kid, verify_assertion, JsonWebKey, Jwks};
use libfuzzer_sys::fuzz_target;

// Public point of a fixed P-256 test key
const X: &str = "dDWTnkgA-6hhMtCntA6omGOGgE-tke_h6Y165LQRNyU";
const Y: &str = "Fp_AkmS_3Doi5YYVRYavgO4rCpxWfi6-eb4Iyzvdwsg";

fuzz_target!(|data: &[u8]| {
    let Ok(token) = std::str::from_utf8(data) else {
        return;
    };

    let jwks = Jwks {
        keys: vec![JsonWebKey {
            kty: "EC".to_string(),
            use_: "sig".to_string(),
            crv: "P-256".to_string(),
            kid: "fuzz-key".to_string(),
            x: X.to_string(),
            y: Y.to_string(),
            alg: "ES256".to_string(),
        }],
    };

    // Neither may panic on any input
    let _ = extract_kid(token);
    let _ = verify_assertion(token, &jwks, 1_700_000_000);
});
