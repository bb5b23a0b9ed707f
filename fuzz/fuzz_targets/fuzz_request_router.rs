//! Fuzz target: `net::router::classify`
//!
//! Feeds arbitrary first-read buffers to the router.
//!
//! Invariants checked:
//! - No panics under any byte sequence
//! - Classification is deterministic
//! - Only `Upgrade` and `Reject` produce no canned response
//! - Anything without a `GET /` token is rejected
//!
//! cargo fuzz run fuzz_request_router

#![no_main]

use libfuzzer_sys::fuzz_target;
use tankbot::net::router::{classify, Route};

fuzz_target!(|data: &[u8]| {
    let route = classify(data);
    assert_eq!(route, classify(data));

    match route {
        Route::Upgrade | Route::Reject => assert!(route.response().is_none()),
        _ => assert!(route.response().is_some()),
    }

    if !data.windows(5).any(|w| w == b"GET /") {
        assert_eq!(route, Route::Reject);
    }
});
