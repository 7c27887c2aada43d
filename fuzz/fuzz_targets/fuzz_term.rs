//! Fuzz term parsing and the text codec
//!
//! Any token either parses or returns an error, and any string survives an
//! encode/decode cycle.

#![no_main]

use libfuzzer_sys::fuzz_target;

use anoi::{string_to_uid_vector, uid_vector_to_string, Term};

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        let _ = Term::parse(input);

        let uids = string_to_uid_vector(input);
        assert_eq!(uid_vector_to_string(&uids).ok().as_deref(), Some(input));
    }
});
