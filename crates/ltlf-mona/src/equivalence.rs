//! Equivalence of two formulas over possibly different alphabets.
//!
//! With `V1`, `V2` the labels of `f1`, `f2` and `shared = V1 ∩ V2`, each side
//! first hides its private labels behind `ex2`, then both are compared as
//! properties of the shared labels:
//!
//! - `D_i = ex2 private_i: enc(f_i)`
//! - `S_i = ex2 private_i, private_i': (private_i' sub private_i) & enc_s(f_i)`
//!
//! Strong mode asserts `~((shared' sub shared) => ((D1 <=> D2) & (S1 <=> S2)))`,
//! classical mode `~(D1 <=> D2)`. Either program is unsatisfiable exactly
//! when the formulas are equivalent in that mode. When the two label sets
//! coincide the `ex2` prefixes vanish, and when one contains the other only
//! the larger side quantifies anything.

use std::collections::BTreeSet;

use ltlf_logic::{AtomSymbol, Formula};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::encoder::{encode, encode_primed, EncodeError, Position};
use crate::program::{non_empty, MonaProgram};
use crate::signature::Signature;
use crate::solver::{MsoSolver, Verdict};
use crate::terms::MonaTerm;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EquivalenceMode {
    /// Agreement under the direct and the primed valuation.
    #[default]
    Strong,
    /// Agreement on every trace, ignoring the primed valuation.
    Classical,
}

/// How the two label sets relate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureRelation {
    Same,
    /// The left labels are a strict subset of the right ones.
    LeftSubset,
    RightSubset,
    /// Neither contains the other, including disjoint sets.
    Overlapping,
}

impl SignatureRelation {
    pub fn of(left: &BTreeSet<AtomSymbol>, right: &BTreeSet<AtomSymbol>) -> Self {
        match (left.is_subset(right), right.is_subset(left)) {
            (true, true) => SignatureRelation::Same,
            (true, false) => SignatureRelation::LeftSubset,
            (false, true) => SignatureRelation::RightSubset,
            (false, false) => SignatureRelation::Overlapping,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Equivalence {
    Equivalent,
    NotEquivalent,
}

#[derive(Debug, Error)]
pub enum CheckError<E: std::error::Error + 'static> {
    #[error(transparent)]
    Encode(#[from] EncodeError),
    #[error("Solver failed: {0}")]
    Solver(#[source] E),
}

struct Side {
    direct: MonaTerm,
    primed: MonaTerm,
}

fn side(
    formula: &Formula,
    private: &BTreeSet<&AtomSymbol>,
    signature: &Signature,
) -> Result<Side, EncodeError> {
    let names = signature.names_of(private.iter().copied());
    let primed_names = signature.primed_names_of(private.iter().copied());
    let direct = MonaTerm::ex2(
        names.clone(),
        encode(formula, signature, Position::Initial)?,
    );
    let mut hidden = primed_names.clone();
    hidden.extend(names.iter().cloned());
    let primed = MonaTerm::ex2(
        hidden,
        MonaTerm::and(vec![
            smaller(&names, &primed_names),
            encode_primed(formula, signature, Position::Initial)?,
        ]),
    );
    Ok(Side { direct, primed })
}

/// `P_p sub P` for every pair.
fn smaller(names: &[String], primed_names: &[String]) -> MonaTerm {
    MonaTerm::and(
        names
            .iter()
            .zip(primed_names)
            .map(|(n, p)| MonaTerm::Sub(p.clone(), n.clone()))
            .collect(),
    )
}

/// The program that is unsatisfiable exactly when `left` and `right` are
/// equivalent in `mode`.
pub fn encode_equivalence(
    left: &Formula,
    right: &Formula,
    mode: EquivalenceMode,
) -> Result<MonaProgram, EncodeError> {
    let left_labels = left.find_labels();
    let right_labels = right.find_labels();
    let relation = SignatureRelation::of(&left_labels, &right_labels);
    let signature = Signature::new(left_labels.union(&right_labels));
    let shared: BTreeSet<&AtomSymbol> = left_labels.intersection(&right_labels).collect();
    let left_private: BTreeSet<&AtomSymbol> = left_labels.difference(&right_labels).collect();
    let right_private: BTreeSet<&AtomSymbol> = right_labels.difference(&left_labels).collect();
    debug!(?relation, ?mode, shared = shared.len(), "encoding equivalence");

    let l = side(left, &left_private, &signature)?;
    let r = side(right, &right_private, &signature)?;
    let shared_names = signature.names_of(shared.iter().copied());
    let shared_primed = signature.primed_names_of(shared.iter().copied());
    let direct_agree = MonaTerm::iff(l.direct, r.direct);

    let (vars, claim) = match mode {
        EquivalenceMode::Classical => (shared_names, direct_agree),
        // No labels at all: the primed valuation is the direct one.
        EquivalenceMode::Strong if signature.is_empty() => (shared_names, direct_agree),
        EquivalenceMode::Strong => {
            let agree = MonaTerm::and(vec![direct_agree, MonaTerm::iff(l.primed, r.primed)]);
            let claim = if shared_names.is_empty() {
                agree
            } else {
                MonaTerm::implies(smaller(&shared_names, &shared_primed), agree)
            };
            let mut vars = shared_names;
            vars.extend(shared_primed);
            (vars, claim)
        }
    };
    let body = MonaTerm::and(vec![non_empty(), MonaTerm::not(claim)]);
    debug!(vars = vars.len(), size = body.size(), "encoded equivalence program");
    Ok(MonaProgram::new(format!("{left} == {right}"), vars, body))
}

/// Decide equivalence with `solver`: equivalent iff the program is
/// unsatisfiable.
pub fn check_equivalence<S: MsoSolver>(
    left: &Formula,
    right: &Formula,
    mode: EquivalenceMode,
    solver: &mut S,
) -> Result<Equivalence, CheckError<S::Error>> {
    let program = encode_equivalence(left, right, mode)?;
    let verdict = solver.check(&program).map_err(CheckError::Solver)?;
    let result = match verdict {
        Verdict::Unsatisfiable => Equivalence::Equivalent,
        Verdict::Satisfiable | Verdict::Valid => Equivalence::NotEquivalent,
    };
    info!(?mode, ?result, "equivalence decided");
    Ok(result)
}
