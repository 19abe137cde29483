//! Direct and primed M2L-Str encodings of LTLf/PLTLf formulas.
//!
//! The direct encoding `enc(f, v)` holds exactly when `f` holds at position
//! `v` of the string, reading each proposition `p` from the set variable
//! `P`. The primed encoding `enc_s(f, v)` reads a second valuation `P_p`
//! and mirrors the here-world of a here-and-there trace: negation and
//! implication must also hold under the direct valuation.
//!
//! Both encoders run an explicit work stack, so formula depth is bounded
//! only by memory.

use std::sync::Arc;

use ltlf_logic::{Formula, NaryOp, UnaryOp};
use thiserror::Error;
use tracing::debug;

use crate::signature::Signature;
use crate::terms::{MonaTerm, PosExpr};

mod variables;

pub use variables::Position;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    /// The formula mentions a symbol the signature was not built from.
    #[error("Symbol '{0}' is not declared in the signature")]
    UnknownSymbol(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Direct,
    Primed,
}

type Build = Box<dyn FnOnce(Vec<MonaTerm>) -> MonaTerm>;

enum Task {
    Visit(Arc<Formula>, Position, Mode),
    Combine(usize, Build),
}

enum Step {
    Done(MonaTerm),
    Expand(Build, Vec<(Arc<Formula>, Position, Mode)>),
}

/// `enc(formula, position)`.
pub fn encode(
    formula: &Formula,
    signature: &Signature,
    position: Position,
) -> Result<MonaTerm, EncodeError> {
    run(formula, signature, position, Mode::Direct)
}

/// `enc_s(formula, position)`, over the primed valuation.
pub fn encode_primed(
    formula: &Formula,
    signature: &Signature,
    position: Position,
) -> Result<MonaTerm, EncodeError> {
    run(formula, signature, position, Mode::Primed)
}

fn run(
    formula: &Formula,
    signature: &Signature,
    position: Position,
    mode: Mode,
) -> Result<MonaTerm, EncodeError> {
    let mut tasks = vec![Task::Visit(Arc::new(formula.clone()), position, mode)];
    let mut values: Vec<MonaTerm> = Vec::new();
    while let Some(task) = tasks.pop() {
        match task {
            Task::Combine(arity, build) => {
                let args = values.split_off(values.len().saturating_sub(arity));
                values.push(build(args));
            }
            Task::Visit(node, at, mode) => match step(&node, at, mode, signature)? {
                Step::Done(term) => values.push(term),
                Step::Expand(build, visits) => {
                    tasks.push(Task::Combine(visits.len(), build));
                    for (child, at, mode) in visits.into_iter().rev() {
                        tasks.push(Task::Visit(child, at, mode));
                    }
                }
            },
        }
    }
    debug_assert_eq!(values.len(), 1);
    let term = values.pop().unwrap_or(MonaTerm::False);
    debug!(?mode, size = term.size(), "encoded formula");
    Ok(term)
}

fn step(
    formula: &Formula,
    at: Position,
    mode: Mode,
    signature: &Signature,
) -> Result<Step, EncodeError> {
    let here = at.expr();
    Ok(match formula {
        Formula::True => Step::Done(MonaTerm::True),
        // `end` holds only after the trace, never at a real position.
        Formula::False | Formula::End => Step::Done(MonaTerm::False),
        Formula::Last => Step::Done(MonaTerm::eq(here, PosExpr::Max)),
        Formula::Init => Step::Done(MonaTerm::eq(here, PosExpr::Lit(0))),
        Formula::Atom(symbol) => {
            let name = match mode {
                Mode::Direct => signature.name(symbol).map(str::to_string),
                Mode::Primed => signature.primed(symbol),
            };
            let name = name.ok_or_else(|| EncodeError::UnknownSymbol(symbol.to_string()))?;
            Step::Done(MonaTerm::member(here, name))
        }
        Formula::Unary(op, child) => unary(*op, child, at, mode),
        Formula::Nary(op, children) => nary(*op, children, at, mode),
    })
}

fn unary(op: UnaryOp, child: &Arc<Formula>, at: Position, mode: Mode) -> Step {
    let here = at.expr();
    let visit = |position: Position| vec![(child.clone(), position, mode)];
    match op {
        UnaryOp::Not => match mode {
            Mode::Direct => Step::Expand(Box::new(|v| MonaTerm::not(one(v))), visit(at)),
            Mode::Primed => Step::Expand(
                Box::new(|v| {
                    let (primed, direct) = two(v);
                    MonaTerm::and(vec![MonaTerm::not(primed), MonaTerm::not(direct)])
                }),
                vec![(child.clone(), at, Mode::Primed), (child.clone(), at, Mode::Direct)],
            ),
        },
        UnaryOp::Next => next(at, child.clone(), mode, false),
        UnaryOp::WeakNext => next(at, child.clone(), mode, true),
        UnaryOp::Eventually => {
            let (e, name) = at.fresh();
            Step::Expand(
                Box::new(move |v| {
                    let bound = MonaTerm::le(here, e.expr());
                    MonaTerm::ex1(name, MonaTerm::and(vec![bound, one(v)]))
                }),
                visit(e),
            )
        }
        UnaryOp::Always => {
            let (e, name) = at.fresh();
            Step::Expand(
                Box::new(move |v| {
                    let bound = MonaTerm::le(here, e.expr());
                    MonaTerm::all1(name, MonaTerm::implies(bound, one(v)))
                }),
                visit(e),
            )
        }
        UnaryOp::Before if at == Position::Initial => Step::Done(MonaTerm::False),
        UnaryOp::WeakBefore if at == Position::Initial => Step::Done(MonaTerm::True),
        UnaryOp::Before | UnaryOp::WeakBefore => {
            let (w, name) = at.fresh();
            let weak = op == UnaryOp::WeakBefore;
            Step::Expand(
                Box::new(move |v| {
                    let strong = MonaTerm::ex1(
                        name,
                        MonaTerm::and(vec![
                            MonaTerm::gt(here.clone(), PosExpr::Lit(0)),
                            MonaTerm::eq(w.expr(), here.clone().minus(1)),
                            one(v),
                        ]),
                    );
                    if weak {
                        MonaTerm::or(vec![MonaTerm::eq(here, PosExpr::Lit(0)), strong])
                    } else {
                        strong
                    }
                }),
                visit(w),
            )
        }
        // Position 0 is the only one at or before position 0.
        UnaryOp::Once | UnaryOp::Historically if at == Position::Initial => {
            Step::Expand(Box::new(one), visit(at))
        }
        UnaryOp::Once => {
            let (e, name) = at.fresh();
            Step::Expand(
                Box::new(move |v| {
                    let bound = MonaTerm::le(e.expr(), here);
                    MonaTerm::ex1(name, MonaTerm::and(vec![bound, one(v)]))
                }),
                visit(e),
            )
        }
        UnaryOp::Historically => {
            let (e, name) = at.fresh();
            Step::Expand(
                Box::new(move |v| {
                    let bound = MonaTerm::le(e.expr(), here);
                    MonaTerm::all1(name, MonaTerm::implies(bound, one(v)))
                }),
                visit(e),
            )
        }
    }
}

/// `X f` is `ex1 w: w = v+1 & enc(f, w)`; `WX f` also holds at the last
/// position.
fn next(at: Position, child: Arc<Formula>, mode: Mode, weak: bool) -> Step {
    let (w, name) = at.fresh();
    let successor = at.successor();
    let here = at.expr();
    Step::Expand(
        Box::new(move |v| {
            let strong = MonaTerm::ex1(
                name,
                MonaTerm::and(vec![MonaTerm::eq(w.expr(), successor), one(v)]),
            );
            if weak {
                MonaTerm::or(vec![MonaTerm::eq(here, PosExpr::Max), strong])
            } else {
                strong
            }
        }),
        vec![(child, w, mode)],
    )
}

fn nary(op: NaryOp, children: &[Arc<Formula>], at: Position, mode: Mode) -> Step {
    let all = |mode: Mode| -> Vec<(Arc<Formula>, Position, Mode)> {
        children.iter().map(|c| (c.clone(), at, mode)).collect()
    };
    match op {
        NaryOp::And => Step::Expand(Box::new(MonaTerm::and), all(mode)),
        NaryOp::Or => Step::Expand(Box::new(MonaTerm::or), all(mode)),
        NaryOp::Implies => match mode {
            Mode::Direct => Step::Expand(Box::new(implication_chain), all(mode)),
            Mode::Primed => {
                let n = children.len();
                let mut visits = all(Mode::Primed);
                visits.extend(all(Mode::Direct));
                Step::Expand(
                    Box::new(move |mut v| {
                        let direct = v.split_off(n);
                        primed_implication_chain(v, direct)
                    }),
                    visits,
                )
            }
        },
        NaryOp::Equivalence => match mode {
            Mode::Direct => Step::Expand(Box::new(|v| MonaTerm::and(adjacent_iffs(v))), all(mode)),
            Mode::Primed => {
                let n = children.len();
                let mut visits = all(Mode::Primed);
                visits.extend(all(Mode::Direct));
                Step::Expand(
                    Box::new(move |mut v| {
                        let direct = v.split_off(n);
                        let mut iffs = adjacent_iffs(v);
                        iffs.extend(adjacent_iffs(direct));
                        MonaTerm::and(iffs)
                    }),
                    visits,
                )
            }
        },
        NaryOp::Until => {
            let (lhs, rhs) = split_right(op, children);
            until(lhs, rhs, at, mode)
        }
        NaryOp::Release => {
            let (lhs, rhs) = split_right(op, children);
            release(lhs, rhs, at, mode)
        }
        // Position 0 has no past, so only the right operand matters there.
        NaryOp::Since | NaryOp::Trigger if at == Position::Initial => {
            let (_, rhs) = split_right(op, children);
            Step::Expand(Box::new(one), vec![(rhs, at, mode)])
        }
        NaryOp::Since => {
            let (lhs, rhs) = split_right(op, children);
            since(lhs, rhs, at, mode)
        }
        NaryOp::Trigger => {
            let (lhs, rhs) = split_right(op, children);
            trigger(lhs, rhs, at, mode)
        }
    }
}

/// `a U b`: some e >= v satisfies b, and a holds on [v, e).
fn until(a: Arc<Formula>, b: Arc<Formula>, at: Position, mode: Mode) -> Step {
    let here = at.expr();
    let (e, e_name) = at.fresh();
    let (x, x_name) = e.fresh();
    Step::Expand(
        Box::new(move |v| {
            let (b, a) = two(v);
            let stretch = MonaTerm::and(vec![
                MonaTerm::le(here.clone(), x.expr()),
                MonaTerm::lt(x.expr(), e.expr()),
            ]);
            MonaTerm::ex1(
                e_name,
                MonaTerm::and(vec![
                    MonaTerm::le(here, e.expr()),
                    b,
                    MonaTerm::all1(x_name, MonaTerm::implies(stretch, a)),
                ]),
            )
        }),
        vec![(b, e, mode), (a, x, mode)],
    )
}

/// `a R b`: every x in [v, last] satisfies b, unless a held in [v, x).
fn release(a: Arc<Formula>, b: Arc<Formula>, at: Position, mode: Mode) -> Step {
    let here = at.expr();
    let (x, x_name) = at.fresh();
    let (e, e_name) = x.fresh();
    Step::Expand(
        Box::new(move |v| {
            let (b, a) = two(v);
            let released = MonaTerm::ex1(
                e_name,
                MonaTerm::and(vec![
                    MonaTerm::le(here.clone(), e.expr()),
                    MonaTerm::lt(e.expr(), x.expr()),
                    a,
                ]),
            );
            MonaTerm::all1(
                x_name,
                MonaTerm::implies(
                    MonaTerm::le(here, x.expr()),
                    MonaTerm::or(vec![b, released]),
                ),
            )
        }),
        vec![(b, x, mode), (a, e, mode)],
    )
}

/// `a S b`: some e <= v satisfies b, and a holds on (e, v].
fn since(a: Arc<Formula>, b: Arc<Formula>, at: Position, mode: Mode) -> Step {
    let here = at.expr();
    let (e, e_name) = at.fresh();
    let (x, x_name) = e.fresh();
    Step::Expand(
        Box::new(move |v| {
            let (b, a) = two(v);
            let stretch = MonaTerm::and(vec![
                MonaTerm::lt(e.expr(), x.expr()),
                MonaTerm::le(x.expr(), here.clone()),
            ]);
            MonaTerm::ex1(
                e_name,
                MonaTerm::and(vec![
                    MonaTerm::le(e.expr(), here),
                    b,
                    MonaTerm::all1(x_name, MonaTerm::implies(stretch, a)),
                ]),
            )
        }),
        vec![(b, e, mode), (a, x, mode)],
    )
}

/// `a T b`: every x <= v satisfies b, unless a held in (x, v].
fn trigger(a: Arc<Formula>, b: Arc<Formula>, at: Position, mode: Mode) -> Step {
    let here = at.expr();
    let (x, x_name) = at.fresh();
    let (e, e_name) = x.fresh();
    Step::Expand(
        Box::new(move |v| {
            let (b, a) = two(v);
            let triggered = MonaTerm::ex1(
                e_name,
                MonaTerm::and(vec![
                    MonaTerm::lt(x.expr(), e.expr()),
                    MonaTerm::le(e.expr(), here.clone()),
                    a,
                ]),
            );
            MonaTerm::all1(
                x_name,
                MonaTerm::implies(
                    MonaTerm::le(x.expr(), here),
                    MonaTerm::or(vec![b, triggered]),
                ),
            )
        }),
        vec![(b, x, mode), (a, e, mode)],
    )
}

/// `a op b op c` is `a op (b op c)`.
fn split_right(op: NaryOp, children: &[Arc<Formula>]) -> (Arc<Formula>, Arc<Formula>) {
    let Some((last, init)) = children.split_last() else {
        return (Arc::new(Formula::False), Arc::new(Formula::False));
    };
    let Some((first, middle)) = init.split_first() else {
        return (last.clone(), last.clone());
    };
    let rhs = middle.iter().rev().fold(last.clone(), |acc, lhs| {
        Arc::new(Formula::binary(op, lhs.clone(), acc))
    });
    (first.clone(), rhs)
}

/// Left fold `((t0 => t1) => t2) ...`.
fn implication_chain(terms: Vec<MonaTerm>) -> MonaTerm {
    let mut iter = terms.into_iter();
    let first = iter.next().unwrap_or(MonaTerm::True);
    iter.fold(first, MonaTerm::implies)
}

/// Each step of the chain must hold under both valuations.
fn primed_implication_chain(primed: Vec<MonaTerm>, direct: Vec<MonaTerm>) -> MonaTerm {
    let mut pairs = primed.into_iter().zip(direct);
    let Some((mut acc_primed, mut acc_direct)) = pairs.next() else {
        return MonaTerm::True;
    };
    for (p, d) in pairs {
        acc_primed = MonaTerm::and(vec![
            MonaTerm::implies(acc_primed, p),
            MonaTerm::implies(acc_direct.clone(), d.clone()),
        ]);
        acc_direct = MonaTerm::implies(acc_direct, d);
    }
    acc_primed
}

fn adjacent_iffs(terms: Vec<MonaTerm>) -> Vec<MonaTerm> {
    terms
        .windows(2)
        .map(|w| MonaTerm::iff(w[0].clone(), w[1].clone()))
        .collect()
}

fn one(values: Vec<MonaTerm>) -> MonaTerm {
    values.into_iter().next().unwrap_or(MonaTerm::False)
}

fn two(values: Vec<MonaTerm>) -> (MonaTerm, MonaTerm) {
    let mut iter = values.into_iter();
    let first = iter.next().unwrap_or(MonaTerm::False);
    let second = iter.next().unwrap_or(MonaTerm::False);
    (first, second)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::mona_printer::to_mona;
    use ltlf_logic::parse;

    fn enc(source: &str) -> String {
        let f = parse(source, "test.ltlf").unwrap();
        let sig = Signature::new(&f.find_labels());
        to_mona(&encode(&f, &sig, Position::Initial).unwrap())
    }

    fn enc_s(source: &str) -> String {
        let f = parse(source, "test.ltlf").unwrap();
        let sig = Signature::new(&f.find_labels());
        to_mona(&encode_primed(&f, &sig, Position::Initial).unwrap())
    }

    #[test]
    fn atom_at_initial_position() {
        assert_eq!(enc("a"), "(0 in A)");
        assert_eq!(enc_s("a"), "(0 in A_p)");
    }

    #[test]
    fn next_binds_a_witness_at_one() {
        assert_eq!(enc("X a"), "(ex1 v_1: ((v_1 = 1) & (v_1 in A)))");
        assert_eq!(
            enc("X X a"),
            "(ex1 v_1: ((v_1 = 1) & (ex1 v_2: ((v_2 = v_1+1) & (v_2 in A)))))"
        );
        assert_eq!(
            enc("WX a"),
            "((0 = max($)) | (ex1 v_1: ((v_1 = 1) & (v_1 in A))))"
        );
    }

    #[test]
    fn until_quantifies_witness_and_stretch() {
        assert_eq!(
            enc("a U b"),
            "(ex1 v_1: ((0 <= v_1) & (v_1 in B) & \
             (all1 v_2: (((0 <= v_2) & (v_2 < v_1)) => (v_2 in A)))))"
        );
    }

    #[test]
    fn release_quantifies_every_position() {
        assert_eq!(
            enc("a R b"),
            "(all1 v_1: ((0 <= v_1) => ((v_1 in B) | \
             (ex1 v_2: ((0 <= v_2) & (v_2 < v_1) & (v_2 in A))))))"
        );
    }

    #[test]
    fn markers() {
        assert_eq!(enc("last"), "(0 = max($))");
        assert_eq!(enc("init"), "(0 = 0)");
        assert_eq!(enc("end"), "false");
        assert_eq!(enc("true & false"), "(true & false)");
    }

    #[test]
    fn past_operators_at_initial_position() {
        assert_eq!(enc("Y a"), "false");
        assert_eq!(enc("WY a"), "true");
        assert_eq!(enc("O a"), "(0 in A)");
        assert_eq!(enc("H a"), "(0 in A)");
        assert_eq!(enc("a S b"), "(0 in B)");
        assert_eq!(enc("a T b"), "(0 in B)");
    }

    #[test]
    fn past_operators_below_a_variable() {
        assert_eq!(
            enc("F Y a"),
            "(ex1 v_1: ((0 <= v_1) & (ex1 v_2: ((v_1 > 0) & (v_2 = v_1-1) & (v_2 in A)))))"
        );
        assert_eq!(
            enc("G O a"),
            "(all1 v_1: ((0 <= v_1) => (ex1 v_2: ((v_2 <= v_1) & (v_2 in A)))))"
        );
    }

    #[test]
    fn past_operators_at_the_last_position() {
        let f = parse("Y a", "t").unwrap();
        let sig = Signature::new(&f.find_labels());
        let term = encode(&f, &sig, Position::Last).unwrap();
        assert_eq!(
            to_mona(&term),
            "(ex1 v_1: ((max($) > 0) & (v_1 = max($)-1) & (v_1 in A)))"
        );
    }

    #[test]
    fn implication_folds_left() {
        assert_eq!(enc("a -> b"), "((0 in A) => (0 in B))");
        assert_eq!(
            enc("a -> b -> c"),
            "(((0 in A) => (0 in B)) => (0 in C))"
        );
    }

    #[test]
    fn equivalence_chains_adjacent_pairs() {
        assert_eq!(enc("a <-> b"), "((0 in A) <=> (0 in B))");
        assert_eq!(
            enc("a <-> b <-> c"),
            "(((0 in A) <=> (0 in B)) & ((0 in B) <=> (0 in C)))"
        );
    }

    #[test]
    fn primed_negation_consults_both_valuations() {
        assert_eq!(enc_s("!a"), "(~((0 in A_p)) & ~((0 in A)))");
        assert_eq!(
            enc_s("a -> b"),
            "(((0 in A_p) => (0 in B_p)) & ((0 in A) => (0 in B)))"
        );
        assert_eq!(
            enc_s("a <-> b"),
            "(((0 in A_p) <=> (0 in B_p)) & ((0 in A) <=> (0 in B)))"
        );
    }

    #[test]
    fn temporal_operators_associate_right() {
        let nested = enc("a U (b U c)");
        assert_eq!(enc("a U b U c"), nested);
    }

    #[test]
    fn unknown_symbols_are_reported() {
        let f = parse("a & b", "t").unwrap();
        let sig = Signature::new(&[ltlf_logic::AtomSymbol::name("a").unwrap()]);
        assert_eq!(
            encode(&f, &sig, Position::Initial),
            Err(EncodeError::UnknownSymbol("b".into()))
        );
    }

    #[test]
    fn deep_formulas_encode_without_recursion() {
        let mut f = Arc::new(Formula::atom("a").unwrap());
        for _ in 0..20_000 {
            f = Arc::new(Formula::not(f));
        }
        let sig = Signature::new(&f.find_labels());
        let term = encode(&f, &sig, Position::Initial).unwrap();
        assert_eq!(term.size(), 20_001);
    }
}
