//! Brute-force evaluation of M2L-Str terms on explicit string models.
//!
//! Quantifiers are expanded over every position (first-order) or every
//! set of positions (second-order), so this is only usable on short
//! strings with few variables. It decides programs without the external
//! tool, up to a length bound.

use std::collections::{BTreeMap, BTreeSet};
use std::convert::Infallible;

use ltlf_logic::trace::{HtTrace, Trace};

use crate::program::MonaProgram;
use crate::signature::Signature;
use crate::solver::{MsoSolver, Verdict};
use crate::terms::{MonaTerm, PosExpr};

/// A string of `len` positions with a set of positions for each declared
/// second-order variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringModel {
    len: usize,
    sets: BTreeMap<String, BTreeSet<usize>>,
}

impl StringModel {
    pub fn new(len: usize) -> Self {
        StringModel {
            len,
            sets: BTreeMap::new(),
        }
    }

    /// Positions at or past `len` are dropped.
    pub fn with_set(
        mut self,
        name: impl Into<String>,
        positions: impl IntoIterator<Item = usize>,
    ) -> Self {
        let len = self.len;
        let set = positions.into_iter().filter(|&p| p < len).collect();
        self.sets.insert(name.into(), set);
        self
    }

    /// The model a trace induces: `P` holds the positions labelled `p`.
    pub fn from_trace(trace: &Trace, signature: &Signature) -> Self {
        signature.symbols().fold(StringModel::new(trace.len()), |model, symbol| {
            let name = signature.name(symbol).unwrap_or_default().to_string();
            let positions = (0..trace.len()).filter(|&i| trace.contains(i, symbol));
            model.with_set(name, positions)
        })
    }

    /// `P` reads the there-world and `P_p` the here-world.
    pub fn from_ht_trace(trace: &HtTrace, signature: &Signature) -> Self {
        let len = trace.there().len();
        signature
            .symbols()
            .fold(StringModel::from_trace(trace.there(), signature), |model, symbol| {
                let name = signature.primed(symbol).unwrap_or_default();
                let positions = (0..len).filter(|&i| trace.here().contains(i, symbol));
                model.with_set(name, positions)
            })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn set(&self, name: &str) -> Option<&BTreeSet<usize>> {
        self.sets.get(name)
    }

    /// Every model of length `len` over `vars`.
    pub fn enumerate(vars: &[String], len: usize) -> impl Iterator<Item = StringModel> + '_ {
        subsets(vars.len() * len).map(move |mask| {
            vars.iter().enumerate().fold(StringModel::new(len), |model, (v, name)| {
                let positions = (0..len).filter(|&p| mask & (1 << (v * len + p)) != 0);
                model.with_set(name.clone(), positions)
            })
        })
    }
}

/// All bitmasks over `bits` bits. Empty when the count does not fit a `u64`.
fn subsets(bits: usize) -> impl Iterator<Item = u64> {
    let count = u32::try_from(bits)
        .ok()
        .and_then(|b| 1u64.checked_shl(b))
        .unwrap_or(0);
    0..count
}

/// Truth of a closed term on `model`. Set variables the model does not
/// mention are empty.
pub fn evaluate(term: &MonaTerm, model: &StringModel) -> bool {
    Scope {
        model,
        first: Vec::new(),
        second: Vec::new(),
    }
    .holds(term)
}

struct Scope<'m> {
    model: &'m StringModel,
    first: Vec<(String, usize)>,
    second: Vec<(String, BTreeSet<usize>)>,
}

impl Scope<'_> {
    fn position(&self, expr: &PosExpr) -> Option<usize> {
        match expr {
            PosExpr::Lit(n) => usize::try_from(*n).ok(),
            PosExpr::Max => self.model.len.checked_sub(1),
            PosExpr::Var(name) => self
                .first
                .iter()
                .rev()
                .find(|(bound, _)| bound == name)
                .map(|(_, p)| *p),
            PosExpr::Plus(inner, n) => self.position(inner).map(|p| p + *n as usize),
            PosExpr::Minus(inner, n) => {
                self.position(inner).map(|p| p.saturating_sub(*n as usize))
            }
        }
    }

    fn set(&self, name: &str) -> Option<&BTreeSet<usize>> {
        self.second
            .iter()
            .rev()
            .find(|(bound, _)| bound == name)
            .map(|(_, s)| s)
            .or_else(|| self.model.sets.get(name))
    }

    fn set_or_empty(&self, name: &str) -> BTreeSet<usize> {
        self.set(name).cloned().unwrap_or_default()
    }

    fn contains(&self, name: &str, position: usize) -> bool {
        self.set(name).is_some_and(|s| s.contains(&position))
    }

    fn compare(&self, lhs: &PosExpr, rhs: &PosExpr, op: fn(&usize, &usize) -> bool) -> bool {
        match (self.position(lhs), self.position(rhs)) {
            (Some(l), Some(r)) => op(&l, &r),
            _ => false,
        }
    }

    fn holds(&mut self, term: &MonaTerm) -> bool {
        match term {
            MonaTerm::True => true,
            MonaTerm::False => false,
            MonaTerm::In(pos, set) => self
                .position(pos)
                .is_some_and(|p| p < self.model.len && self.contains(set, p)),
            MonaTerm::Eq(l, r) => self.compare(l, r, usize::eq),
            MonaTerm::Lt(l, r) => self.compare(l, r, usize::lt),
            MonaTerm::Le(l, r) => self.compare(l, r, usize::le),
            MonaTerm::Gt(l, r) => self.compare(l, r, usize::gt),
            MonaTerm::Ge(l, r) => self.compare(l, r, usize::ge),
            MonaTerm::Sub(l, r) => self.set_or_empty(l).is_subset(&self.set_or_empty(r)),
            MonaTerm::SetNe(l, r) => self.set_or_empty(l) != self.set_or_empty(r),
            MonaTerm::Not(inner) => !self.holds(inner),
            MonaTerm::And(terms) => terms.iter().all(|t| self.holds(t)),
            MonaTerm::Or(terms) => terms.iter().any(|t| self.holds(t)),
            MonaTerm::Implies(l, r) => !self.holds(l) || self.holds(r),
            MonaTerm::Iff(l, r) => self.holds(l) == self.holds(r),
            MonaTerm::Ex1(var, body) => {
                (0..self.model.len).any(|p| self.with_position(var, p, body))
            }
            MonaTerm::All1(var, body) => {
                (0..self.model.len).all(|p| self.with_position(var, p, body))
            }
            MonaTerm::Ex2(vars, body) => {
                let len = self.model.len;
                subsets(vars.len() * len).any(|mask| {
                    for (v, name) in vars.iter().enumerate() {
                        let set = (0..len)
                            .filter(|&p| mask & (1 << (v * len + p)) != 0)
                            .collect();
                        self.second.push((name.clone(), set));
                    }
                    let result = self.holds(body);
                    self.second.truncate(self.second.len() - vars.len());
                    result
                })
            }
        }
    }

    fn with_position(&mut self, var: &str, position: usize, body: &MonaTerm) -> bool {
        self.first.push((var.to_string(), position));
        let result = self.holds(body);
        self.first.pop();
        result
    }
}

/// Whether `model` satisfies the program's assertion.
pub fn satisfies(program: &MonaProgram, model: &StringModel) -> bool {
    evaluate(&program.body, model)
}

/// The shortest, then first enumerated, model of length `1..=max_len`.
pub fn find_model(program: &MonaProgram, max_len: usize) -> Option<StringModel> {
    (1..=max_len)
        .flat_map(|len| StringModel::enumerate(&program.vars, len))
        .find(|model| satisfies(program, model))
}

pub fn is_unsatisfiable_up_to(program: &MonaProgram, max_len: usize) -> bool {
    find_model(program, max_len).is_none()
}

/// Decides programs by enumerating every model up to a length bound.
///
/// Sound only for the strings it looks at: `Unsatisfiable` and `Valid`
/// mean "up to `max_len`".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundedSolver {
    pub max_len: usize,
}

impl BoundedSolver {
    pub fn new(max_len: usize) -> Self {
        BoundedSolver { max_len }
    }
}

impl Default for BoundedSolver {
    fn default() -> Self {
        BoundedSolver::new(3)
    }
}

impl MsoSolver for BoundedSolver {
    type Error = Infallible;

    fn check(&mut self, program: &MonaProgram) -> Result<Verdict, Infallible> {
        let mut satisfied = false;
        let mut refuted = false;
        for len in 1..=self.max_len {
            for model in StringModel::enumerate(&program.vars, len) {
                if satisfies(program, &model) {
                    satisfied = true;
                } else {
                    refuted = true;
                }
                if satisfied && refuted {
                    return Ok(Verdict::Satisfiable);
                }
            }
        }
        Ok(if !satisfied {
            Verdict::Unsatisfiable
        } else {
            Verdict::Valid
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(name: &str) -> PosExpr {
        PosExpr::var(name)
    }

    #[test]
    fn membership_and_positions() {
        let model = StringModel::new(3).with_set("A", [0, 2, 7]);
        assert_eq!(model.set("A").map(|s| s.len()), Some(2));
        assert!(evaluate(&MonaTerm::member(PosExpr::Lit(0), "A"), &model));
        assert!(!evaluate(&MonaTerm::member(PosExpr::Lit(1), "A"), &model));
        assert!(evaluate(&MonaTerm::member(PosExpr::Max, "A"), &model));
        assert!(!evaluate(&MonaTerm::member(PosExpr::Max.plus(1), "B"), &model));
    }

    #[test]
    fn first_order_quantifiers_range_over_positions() {
        let model = StringModel::new(3).with_set("A", [1]);
        let exists = MonaTerm::ex1("x", MonaTerm::member(v("x"), "A"));
        let all = MonaTerm::all1("x", MonaTerm::member(v("x"), "A"));
        assert!(evaluate(&exists, &model));
        assert!(!evaluate(&all, &model));
        // No position follows the last one.
        let past_end = MonaTerm::ex1("x", MonaTerm::eq(v("x"), PosExpr::Max.plus(1)));
        assert!(!evaluate(&past_end, &model));
    }

    #[test]
    fn inner_bindings_shadow_outer_ones() {
        let model = StringModel::new(2).with_set("A", [0]);
        let term = MonaTerm::ex1(
            "x",
            MonaTerm::and(vec![
                MonaTerm::eq(v("x"), PosExpr::Lit(1)),
                MonaTerm::ex1("x", MonaTerm::member(v("x"), "A")),
            ]),
        );
        assert!(evaluate(&term, &model));
    }

    #[test]
    fn second_order_quantifier_and_set_relations() {
        let model = StringModel::new(2).with_set("A", [0, 1]);
        let strict_subset = MonaTerm::ex2(
            vec!["B".into()],
            MonaTerm::and(vec![
                MonaTerm::Sub("B".into(), "A".into()),
                MonaTerm::SetNe("B".into(), "A".into()),
                MonaTerm::member(PosExpr::Lit(1), "B"),
            ]),
        );
        assert!(evaluate(&strict_subset, &model));
        let empty = StringModel::new(2);
        assert!(!evaluate(&strict_subset, &empty));
    }

    #[test]
    fn bounded_solver_verdicts() {
        let mut solver = BoundedSolver::default();
        let member = |body| MonaProgram::new("t", vec!["A".into()], body);
        let a = MonaTerm::member(PosExpr::Lit(0), "A");
        assert_eq!(solver.check(&member(a.clone())), Ok(Verdict::Satisfiable));
        assert_eq!(
            solver.check(&member(MonaTerm::or(vec![a.clone(), MonaTerm::not(a.clone())]))),
            Ok(Verdict::Valid)
        );
        assert_eq!(
            solver.check(&member(MonaTerm::and(vec![a.clone(), MonaTerm::not(a)]))),
            Ok(Verdict::Unsatisfiable)
        );
    }

    #[test]
    fn models_are_enumerated_exhaustively() {
        let vars = vec!["A".to_string(), "B".to_string()];
        assert_eq!(StringModel::enumerate(&vars, 2).count(), 16);
        let program = MonaProgram::new(
            "t",
            vars,
            MonaTerm::and(vec![
                MonaTerm::member(PosExpr::Max, "A"),
                MonaTerm::member(PosExpr::Lit(1), "B"),
            ]),
        );
        let model = find_model(&program, 3).unwrap();
        assert_eq!(model.len(), 2);
        assert!(is_unsatisfiable_up_to(&program, 1));
    }
}
