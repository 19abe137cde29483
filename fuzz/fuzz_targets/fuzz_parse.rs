#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        // The parser must never panic on any input.
        if let Ok(formula) = ltlf_logic::parse(s, "fuzz.ltlf") {
            // Canonical output adds parentheses and may exceed the nesting limit.
            let printed = formula.to_string();
            if let Ok(reparsed) = ltlf_logic::parse(&printed, "fuzz.ltlf") {
                assert_eq!(formula, reparsed, "{printed}");
            }
        }
    }
});
