//! Second-order variable names for atomic symbols.
//!
//! Every symbol gets an upper-case identifier, unique within the signature.
//! Its primed companion appends a lower-case `_p`, which no upper-cased
//! name can end with, so primed and unprimed names never clash. Bound
//! position variables are lower case (`v_1`, ...) and cannot clash either.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use ltlf_logic::AtomSymbol;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Signature {
    names: BTreeMap<AtomSymbol, String>,
}

impl Signature {
    /// Assign names in symbol order, so the result does not depend on the
    /// order the symbols are supplied in.
    pub fn new<'a>(symbols: impl IntoIterator<Item = &'a AtomSymbol>) -> Self {
        let sorted: BTreeSet<&AtomSymbol> = symbols.into_iter().collect();
        let mut taken = HashSet::new();
        let mut names = BTreeMap::new();
        for symbol in sorted {
            let base = base_name(symbol);
            let mut name = base.clone();
            let mut suffix = 2;
            while !taken.insert(name.clone()) {
                name = format!("{base}_{suffix}");
                suffix += 1;
            }
            names.insert(symbol.clone(), name);
        }
        Signature { names }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn name(&self, symbol: &AtomSymbol) -> Option<&str> {
        self.names.get(symbol).map(String::as_str)
    }

    pub fn primed(&self, symbol: &AtomSymbol) -> Option<String> {
        self.name(symbol).map(primed_name)
    }

    pub fn symbols(&self) -> impl Iterator<Item = &AtomSymbol> {
        self.names.keys()
    }

    /// Names of `symbols` that belong to this signature, in symbol order.
    pub fn names_of<'a>(&self, symbols: impl IntoIterator<Item = &'a AtomSymbol>) -> Vec<String> {
        let sorted: BTreeSet<&AtomSymbol> = symbols.into_iter().collect();
        sorted
            .into_iter()
            .filter_map(|s| self.name(s).map(str::to_string))
            .collect()
    }

    pub fn primed_names_of<'a>(
        &self,
        symbols: impl IntoIterator<Item = &'a AtomSymbol>,
    ) -> Vec<String> {
        self.names_of(symbols).iter().map(|n| primed_name(n)).collect()
    }
}

pub fn primed_name(name: &str) -> String {
    format!("{name}_p")
}

fn base_name(symbol: &AtomSymbol) -> String {
    match symbol {
        AtomSymbol::Name(name) => {
            let upper = sanitize(name);
            if upper.starts_with(|c: char| c.is_ascii_alphabetic()) {
                upper
            } else {
                format!("P_{upper}")
            }
        }
        AtomSymbol::Quoted(quoted) => format!("Q_{}", sanitize(quoted.as_str())),
        AtomSymbol::Fresh(var) => format!("F_{}", var.index()),
    }
}

fn sanitize(text: &str) -> String {
    text.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect()
}
