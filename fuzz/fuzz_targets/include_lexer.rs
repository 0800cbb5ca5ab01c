#![no_main]

use libfuzzer_sys::fuzz_target;
use syscall_hunter::lexer::{self, Lexer};

fuzz_target!(|data: &[u8]| {
    let input = String::from_utf8_lossy(data);
    // Neither pass may panic on arbitrary source text
    for _ in Lexer::new(&input) {}
    for (name, _) in lexer::includes(&input) {
        assert!(!name.is_empty());
    }
});
