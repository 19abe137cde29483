#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(formula) = ltlf_logic::parse(s, "fuzz.ltlf") {
            let nnf = formula.to_nnf();
            assert!(nnf.is_nnf(), "{formula}");
            let _ = formula.negate();
            let _ = ltlf_logic::clausify(&formula).to_formula();

            // Encoders are total over parsed formulas; print to exercise the printer.
            let program = ltlf_mona::encode_program(&formula).expect("encodable");
            let _ = program.to_string();
            let _ = ltlf_mona::encode_equilibrium(&formula).expect("encodable");
            let strong = ltlf_mona::EquivalenceMode::Strong;
            let _ = ltlf_mona::encode_equivalence(&formula, &nnf, strong).expect("encodable");
        }
    }
});
