//! Proptest strategies for formulas and traces over a small alphabet.

use std::collections::BTreeSet;
use std::sync::Arc;

use proptest::prelude::*;
use proptest::sample::{select, subsequence};

use crate::ast::{AtomSymbol, Formula, NaryOp, UnaryOp};
use crate::trace::{HtTrace, Trace};

/// Proposition names used by every generated formula and trace.
pub const LABELS: &[&str] = &["a", "b", "c"];

const ALL_UNARY: &[UnaryOp] = &UnaryOp::ALL;
const ALL_NARY: &[NaryOp] = &NaryOp::ALL;

/// Operators whose meaning does not depend on the valuation being classical.
const POSITIVE_UNARY: &[UnaryOp] = &[
    UnaryOp::Next,
    UnaryOp::WeakNext,
    UnaryOp::Eventually,
    UnaryOp::Always,
    UnaryOp::Before,
    UnaryOp::WeakBefore,
    UnaryOp::Once,
    UnaryOp::Historically,
];
const POSITIVE_NARY: &[NaryOp] = &[
    NaryOp::And,
    NaryOp::Or,
    NaryOp::Until,
    NaryOp::Release,
    NaryOp::Since,
    NaryOp::Trigger,
];

fn name(label: &str) -> AtomSymbol {
    AtomSymbol::Name(label.to_string())
}

fn arb_leaf() -> impl Strategy<Value = Formula> {
    prop_oneof![
        8 => select(LABELS).prop_map(|l| Formula::Atom(name(l))),
        1 => Just(Formula::True),
        1 => Just(Formula::False),
        1 => Just(Formula::Last),
        1 => Just(Formula::End),
        1 => Just(Formula::Init),
    ]
}

fn arb_tree(
    unary: &'static [UnaryOp],
    nary: &'static [NaryOp],
    depth: u32,
) -> BoxedStrategy<Formula> {
    arb_leaf()
        .prop_recursive(depth, 24, 3, move |inner| {
            prop_oneof![
                (select(unary), inner.clone()).prop_map(|(op, f)| Formula::unary(op, f)),
                (select(nary), proptest::collection::vec(inner, 2..=3)).prop_filter_map(
                    "n-ary nodes take two or more operands",
                    |(op, fs)| Formula::nary(op, fs.into_iter().map(Arc::new)).ok(),
                ),
            ]
        })
        .boxed()
}

/// Any formula over [`LABELS`], every operator and marker included.
pub fn arb_formula() -> BoxedStrategy<Formula> {
    arb_tree(ALL_UNARY, ALL_NARY, 4)
}

/// Formulas without `!`, `->` or `<->`.
///
/// On this fragment the here-and-there reading agrees with the classical
/// one up to the valuation, so `f` and `to_nnf(f)` are strongly equivalent.
pub fn arb_positive_formula() -> BoxedStrategy<Formula> {
    arb_tree(POSITIVE_UNARY, POSITIVE_NARY, 4)
}

/// Shallow formulas, cheap enough for brute-force model checking.
pub fn arb_small_formula() -> BoxedStrategy<Formula> {
    arb_tree(ALL_UNARY, ALL_NARY, 2)
}

fn arb_step() -> impl Strategy<Value = BTreeSet<AtomSymbol>> {
    subsequence(LABELS.to_vec(), 0..=LABELS.len())
        .prop_map(|labels| labels.into_iter().map(name).collect())
}

/// Traces of 1 to `max_len` positions over [`LABELS`].
pub fn arb_trace(max_len: usize) -> impl Strategy<Value = Trace> {
    proptest::collection::vec(arb_step(), 1..=max_len.max(1))
        .prop_filter_map("traces are never empty", |steps| Trace::new(steps).ok())
}

/// Here-and-there pairs; `here` is `there` with some labels removed.
pub fn arb_ht_trace(max_len: usize) -> impl Strategy<Value = HtTrace> {
    proptest::collection::vec((arb_step(), arb_step()), 1..=max_len.max(1)).prop_filter_map(
        "here must stay inside there",
        |steps| {
            let (there, keep): (Vec<_>, Vec<_>) = steps.into_iter().unzip();
            let here = there
                .iter()
                .zip(&keep)
                .map(|(t, k)| t.intersection(k).cloned().collect())
                .collect();
            HtTrace::new(Trace::new(here).ok()?, Trace::new(there).ok()?).ok()
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn generated_formulas_only_use_known_labels(f in arb_formula()) {
            for label in f.find_labels() {
                prop_assert!(LABELS.contains(&label.to_string().as_str()));
            }
        }

        #[test]
        fn positive_formulas_have_no_negation(f in arb_positive_formula()) {
            let rendered = f.to_string();
            prop_assert!(!rendered.contains('!'));
            prop_assert!(!rendered.contains("->"));
        }

        #[test]
        fn ht_traces_are_persistent(t in arb_ht_trace(4)) {
            for i in 0..t.there().len() {
                let here = t.here().labels_at(i).cloned().unwrap_or_default();
                let there = t.there().labels_at(i).cloned().unwrap_or_default();
                prop_assert!(here.is_subset(&there));
            }
        }
    }
}
