//! Fuzz anoi REPL execution
//!
//! Each line of input runs as a command against a fresh in-memory space.
//! Commands may fail, but never panic.

#![no_main]

use std::sync::Arc;

use libfuzzer_sys::fuzz_target;

use anoi::repl::{InputResult, ReplState};
use anoi::{bootstrap, MemorySpace};

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        let space = Arc::new(MemorySpace::new());
        if bootstrap(space.as_ref()).is_err() {
            return;
        }
        let state = ReplState::new(space);

        for line in input.lines() {
            if let InputResult::MetaCommand(cmd) = state.process_line(line) {
                let _ = state.execute(&cmd);
            }
        }
    }
});
