//! Complete MONA programs.

use std::fmt;

use ltlf_logic::Formula;
use tracing::debug;

use crate::backends::mona_printer::to_mona;
use crate::encoder::{encode, encode_primed, EncodeError, Position};
use crate::signature::Signature;
use crate::terms::{MonaTerm, PosExpr};

/// An M2L-Str program: a comment, the declared set variables and one
/// assertion.
///
/// Renders as
///
/// ```text
/// #comment;
/// m2l-str;
/// var2 A, B;
/// body;
/// ```
///
/// with the `var2` line left out when nothing is declared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonaProgram {
    pub comment: String,
    pub vars: Vec<String>,
    pub body: MonaTerm,
}

impl MonaProgram {
    pub fn new(comment: impl Into<String>, vars: Vec<String>, body: MonaTerm) -> Self {
        MonaProgram {
            // A newline would end the comment early.
            comment: comment.into().replace(['\n', '\r'], " "),
            vars,
            body,
        }
    }
}

impl fmt::Display for MonaProgram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "#{};", self.comment)?;
        writeln!(f, "m2l-str;")?;
        if !self.vars.is_empty() {
            writeln!(f, "var2 {};", self.vars.join(", "))?;
        }
        writeln!(f, "{};", to_mona(&self.body))
    }
}

/// Holds on every string with at least one position.
///
/// M2L-Str admits the empty string, which is not a trace. First-order
/// quantifiers range over positions only, so this fails on it.
pub fn non_empty() -> MonaTerm {
    MonaTerm::ex1("v_0", MonaTerm::eq(PosExpr::var("v_0"), PosExpr::Lit(0)))
}

/// The program satisfied by exactly the traces on which `formula` holds at
/// the initial position.
pub fn encode_program(formula: &Formula) -> Result<MonaProgram, EncodeError> {
    let labels = formula.find_labels();
    let signature = Signature::new(&labels);
    let body = MonaTerm::and(vec![
        non_empty(),
        encode(formula, &signature, Position::Initial)?,
    ]);
    let vars = signature.names_of(&labels);
    debug!(vars = vars.len(), size = body.size(), "encoded program");
    Ok(MonaProgram::new(formula.to_string(), vars, body))
}

/// The program satisfied by exactly the temporal equilibrium models of
/// `formula`.
///
/// A trace is an equilibrium model when it satisfies `formula` and no
/// strictly smaller primed valuation satisfies the primed encoding:
///
/// `enc(f) & ~(ex2 P_p..: (P_p sub P & ..) & (P_p ~= P | ..) & enc_s(f))`
pub fn encode_equilibrium(formula: &Formula) -> Result<MonaProgram, EncodeError> {
    let labels = formula.find_labels();
    if labels.is_empty() {
        return encode_program(formula);
    }
    let signature = Signature::new(&labels);
    let direct = encode(formula, &signature, Position::Initial)?;
    let primed = encode_primed(formula, &signature, Position::Initial)?;
    let names = signature.names_of(&labels);
    let primed_names = signature.primed_names_of(&labels);
    let smaller = MonaTerm::and(
        names
            .iter()
            .zip(&primed_names)
            .map(|(n, p)| MonaTerm::Sub(p.clone(), n.clone()))
            .collect(),
    );
    let differs = MonaTerm::or(
        names
            .iter()
            .zip(&primed_names)
            .map(|(n, p)| MonaTerm::SetNe(p.clone(), n.clone()))
            .collect(),
    );
    let witness = MonaTerm::ex2(primed_names, MonaTerm::and(vec![smaller, differs, primed]));
    let body = MonaTerm::and(vec![non_empty(), direct, MonaTerm::not(witness)]);
    debug!(vars = names.len(), size = body.size(), "encoded equilibrium program");
    Ok(MonaProgram::new(formula.to_string(), names, body))
}
