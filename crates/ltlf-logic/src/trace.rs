//! Finite-trace semantics used to state and check correctness properties.
//!
//! Evaluation is bottom-up over distinct subformulas: each node gets a truth
//! vector covering every position, computed from its children's vectors with
//! one forward or backward scan. No recursion on the call stack.

use std::collections::{BTreeSet, HashMap, HashSet};

use crate::ast::{AtomSymbol, Formula, NaryOp, UnaryOp};
use crate::errors::TraceError;

/// A non-empty sequence of positions, each labelled with the symbols true there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trace {
    steps: Vec<BTreeSet<AtomSymbol>>,
}

impl Trace {
    pub fn new(steps: Vec<BTreeSet<AtomSymbol>>) -> Result<Self, TraceError> {
        if steps.is_empty() {
            return Err(TraceError::Empty);
        }
        Ok(Trace { steps })
    }

    /// Build a trace from proposition names, one slice per position.
    pub fn from_names<S: AsRef<str>>(steps: &[&[S]]) -> Result<Self, TraceError> {
        let steps = steps
            .iter()
            .map(|names| {
                names
                    .iter()
                    .map(|n| AtomSymbol::name(n.as_ref()))
                    .collect::<Result<BTreeSet<_>, _>>()
            })
            .collect::<Result<Vec<_>, _>>()?;
        Trace::new(steps)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// Index of the final position.
    pub fn last(&self) -> usize {
        self.steps.len() - 1
    }

    pub fn labels_at(&self, position: usize) -> Option<&BTreeSet<AtomSymbol>> {
        self.steps.get(position)
    }

    pub fn contains(&self, position: usize, symbol: &AtomSymbol) -> bool {
        self.steps.get(position).is_some_and(|labels| labels.contains(symbol))
    }

    /// Make `symbol` true at `position`. Out-of-range positions are ignored.
    pub fn insert(&mut self, position: usize, symbol: AtomSymbol) {
        if let Some(labels) = self.steps.get_mut(position) {
            labels.insert(symbol);
        }
    }

    /// Every trace of `len` positions over `symbols`.
    pub fn enumerate(symbols: &[AtomSymbol], len: usize) -> Vec<Trace> {
        if len == 0 {
            return Vec::new();
        }
        let bits = symbols.len() * len;
        let Some(count) = 1usize.checked_shl(bits as u32) else {
            return Vec::new();
        };
        (0..count)
            .map(|mask| {
                let steps = (0..len)
                    .map(|pos| {
                        symbols
                            .iter()
                            .enumerate()
                            .filter(|(i, _)| (mask >> (pos * symbols.len() + i)) & 1 == 1)
                            .map(|(_, s)| s.clone())
                            .collect()
                    })
                    .collect();
                Trace { steps }
            })
            .collect()
    }
}

/// A pair of valuations over the same positions with `here ⊆ there`.
///
/// `there` is read classically. `here` is the weaker world: negation and
/// implication must hold in both worlds for them to hold here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtTrace {
    here: Trace,
    there: Trace,
}

impl HtTrace {
    pub fn new(here: Trace, there: Trace) -> Result<Self, TraceError> {
        if here.len() != there.len() {
            return Err(TraceError::LengthMismatch {
                here: here.len(),
                there: there.len(),
            });
        }
        for (position, (h, t)) in here.steps.iter().zip(&there.steps).enumerate() {
            if !h.is_subset(t) {
                return Err(TraceError::NotPersistent { position });
            }
        }
        Ok(HtTrace { here, there })
    }

    pub fn here(&self) -> &Trace {
        &self.here
    }

    pub fn there(&self) -> &Trace {
        &self.there
    }
}

/// Classical satisfaction of `formula` at `position`.
///
/// Positions past the end of the trace satisfy nothing.
pub fn holds(formula: &Formula, trace: &Trace, position: usize) -> bool {
    evaluate(formula, trace).get(position).copied().unwrap_or(false)
}

/// Truth value of `formula` at every position of `trace`.
pub fn evaluate(formula: &Formula, trace: &Trace) -> Vec<bool> {
    let values = evaluate_all(formula, trace.len(), |s, i| trace.contains(i, s), None);
    values.get(&key(formula)).cloned().unwrap_or_default()
}

/// Satisfaction in the `here` world of an [`HtTrace`].
pub fn holds_here(formula: &Formula, trace: &HtTrace, position: usize) -> bool {
    let len = trace.there.len();
    let there = evaluate_all(formula, len, |s, i| trace.there.contains(i, s), None);
    let here = evaluate_all(formula, len, |s, i| trace.here.contains(i, s), Some(&there));
    here.get(&key(formula))
        .and_then(|v| v.get(position).copied())
        .unwrap_or(false)
}

type Values = HashMap<*const Formula, Vec<bool>>;

fn key(formula: &Formula) -> *const Formula {
    formula as *const Formula
}

fn postorder(root: &Formula) -> Vec<&Formula> {
    let mut order = Vec::new();
    let mut seen = HashSet::new();
    let mut stack = vec![(root, false)];
    while let Some((node, expanded)) = stack.pop() {
        if expanded {
            order.push(node);
            continue;
        }
        if !seen.insert(key(node)) {
            continue;
        }
        stack.push((node, true));
        for child in node.children().iter().rev() {
            stack.push((child.as_ref(), false));
        }
    }
    order
}

/// With `there` present, `Not`, `Implies` and `Equivalence` use the
/// here-and-there reading; every other operator is the same in both worlds.
fn evaluate_all(
    root: &Formula,
    len: usize,
    atom: impl Fn(&AtomSymbol, usize) -> bool,
    there: Option<&Values>,
) -> Values {
    let mut values = Values::new();
    let last = len.saturating_sub(1);
    for node in postorder(root) {
        let result = {
            let kids: Vec<&[bool]> = node
                .children()
                .iter()
                .map(|c| values.get(&key(c)).map(Vec::as_slice).unwrap_or(&[]))
                .collect();
            let there_kids: Option<Vec<&[bool]>> = there.map(|t| {
                node.children()
                    .iter()
                    .map(|c| t.get(&key(c)).map(Vec::as_slice).unwrap_or(&[]))
                    .collect()
            });
            match node {
                Formula::True => vec![true; len],
                Formula::False | Formula::End => vec![false; len],
                Formula::Last => (0..len).map(|i| i == last).collect(),
                Formula::Init => (0..len).map(|i| i == 0).collect(),
                Formula::Atom(symbol) => (0..len).map(|i| atom(symbol, i)).collect(),
                Formula::Unary(op, _) => {
                    let c = kids.first().copied().unwrap_or(&[]);
                    unary(*op, c, there_kids.as_ref().and_then(|t| t.first().copied()), len)
                }
                Formula::Nary(op, _) => nary(*op, &kids, there_kids.as_deref(), len),
            }
        };
        values.insert(key(node), result);
    }
    values
}

fn unary(op: UnaryOp, c: &[bool], there: Option<&[bool]>, len: usize) -> Vec<bool> {
    let at = |i: usize| c.get(i).copied().unwrap_or(false);
    let last = len.saturating_sub(1);
    let mut r = vec![false; len];
    match op {
        UnaryOp::Not => {
            for (i, slot) in r.iter_mut().enumerate() {
                let there_too = there.is_some_and(|t| t.get(i).copied().unwrap_or(false));
                *slot = !at(i) && !there_too;
            }
        }
        UnaryOp::Next => (0..len).for_each(|i| r[i] = i < last && at(i + 1)),
        UnaryOp::WeakNext => (0..len).for_each(|i| r[i] = i == last || at(i + 1)),
        UnaryOp::Before => (0..len).for_each(|i| r[i] = i > 0 && at(i - 1)),
        UnaryOp::WeakBefore => (0..len).for_each(|i| r[i] = i == 0 || at(i - 1)),
        UnaryOp::Eventually => {
            for i in (0..len).rev() {
                r[i] = at(i) || (i < last && r[i + 1]);
            }
        }
        UnaryOp::Always => {
            for i in (0..len).rev() {
                r[i] = at(i) && (i == last || r[i + 1]);
            }
        }
        UnaryOp::Once => {
            for i in 0..len {
                r[i] = at(i) || (i > 0 && r[i - 1]);
            }
        }
        UnaryOp::Historically => {
            for i in 0..len {
                r[i] = at(i) && (i == 0 || r[i - 1]);
            }
        }
    }
    r
}

fn nary(op: NaryOp, kids: &[&[bool]], there: Option<&[&[bool]]>, len: usize) -> Vec<bool> {
    let at = |v: &[bool], i: usize| v.get(i).copied().unwrap_or(false);
    match op {
        NaryOp::And => (0..len).map(|i| kids.iter().all(|k| at(k, i))).collect(),
        NaryOp::Or => (0..len).map(|i| kids.iter().any(|k| at(k, i))).collect(),
        NaryOp::Implies => (0..len)
            .map(|i| {
                let Some((first, rest)) = kids.split_first() else {
                    return true;
                };
                let mut here = at(first, i);
                let mut there_acc = there.and_then(|t| t.first()).map(|t| at(t, i));
                for (j, next) in rest.iter().enumerate() {
                    let next_there = there.and_then(|t| t.get(j + 1)).map(|t| at(t, i));
                    let classical = !here || at(next, i);
                    here = match (there_acc, next_there) {
                        (Some(prev), Some(nt)) => (!prev || nt) && classical,
                        _ => classical,
                    };
                    there_acc = there_acc.zip(next_there).map(|(prev, nt)| !prev || nt);
                }
                here
            })
            .collect(),
        NaryOp::Equivalence => (0..len)
            .map(|i| {
                let agree = |vs: &[&[bool]]| vs.windows(2).all(|w| at(w[0], i) == at(w[1], i));
                agree(kids) && there.map_or(true, agree)
            })
            .collect(),
        NaryOp::Until | NaryOp::Release | NaryOp::Since | NaryOp::Trigger => {
            let Some((tail, init)) = kids.split_last() else {
                return vec![false; len];
            };
            let mut acc: Vec<bool> = tail.to_vec();
            for lhs in init.iter().rev() {
                acc = binary_temporal(op, lhs, &acc, len);
            }
            acc
        }
    }
}

/// Right-folds one temporal binary; callers dispatch only `U`, `R`, `S` and `T` here.
fn binary_temporal(op: NaryOp, a: &[bool], b: &[bool], len: usize) -> Vec<bool> {
    let at = |v: &[bool], i: usize| v.get(i).copied().unwrap_or(false);
    let last = len.saturating_sub(1);
    let mut r = vec![false; len];
    match op {
        NaryOp::Until => {
            for i in (0..len).rev() {
                r[i] = at(b, i) || (at(a, i) && i < last && r[i + 1]);
            }
        }
        NaryOp::Release => {
            for i in (0..len).rev() {
                r[i] = at(b, i) && (at(a, i) || i == last || r[i + 1]);
            }
        }
        NaryOp::Since => {
            for i in 0..len {
                r[i] = at(b, i) || (at(a, i) && i > 0 && r[i - 1]);
            }
        }
        NaryOp::Trigger => {
            for i in 0..len {
                r[i] = at(b, i) && (at(a, i) || i == 0 || r[i - 1]);
            }
        }
        NaryOp::And | NaryOp::Or | NaryOp::Implies | NaryOp::Equivalence => {}
    }
    r
}
