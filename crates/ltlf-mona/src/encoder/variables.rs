//! Position naming for the encoders.
//!
//! Bound first-order variables are `v_1`, `v_2`, ... and a quantifier
//! introduced below position `v_k` binds `v_{k+1}` or later. Variables in
//! scope at a node therefore always carry smaller indices than any the
//! node binds, so nested quantifiers never capture each other.

use crate::terms::PosExpr;

/// Where a subformula is evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Position {
    /// Position 0.
    Initial,
    /// The final position, `max($)`.
    Last,
    /// The first-order variable `v_k`.
    Var(u32),
}

impl Position {
    pub fn expr(self) -> PosExpr {
        match self {
            Position::Initial => PosExpr::Lit(0),
            Position::Last => PosExpr::Max,
            Position::Var(k) => PosExpr::Var(position_var(k)),
        }
    }

    /// The position one step later, as a term.
    pub(super) fn successor(self) -> PosExpr {
        match self {
            Position::Initial => PosExpr::Lit(1),
            other => other.expr().plus(1),
        }
    }

    /// The next variable to bind below this position.
    pub(super) fn fresh(self) -> (Position, String) {
        let k = match self {
            Position::Initial | Position::Last => 1,
            Position::Var(k) => k + 1,
        };
        (Position::Var(k), position_var(k))
    }
}

pub(super) fn position_var(k: u32) -> String {
    format!("v_{k}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_variables_increase() {
        assert_eq!(Position::Initial.fresh(), (Position::Var(1), "v_1".to_string()));
        assert_eq!(Position::Last.fresh().1, "v_1");
        assert_eq!(Position::Var(4).fresh(), (Position::Var(5), "v_5".to_string()));
    }

    #[test]
    fn successors() {
        assert_eq!(Position::Initial.successor(), PosExpr::Lit(1));
        assert_eq!(Position::Last.successor(), PosExpr::Max.plus(1));
        assert_eq!(Position::Var(2).successor(), PosExpr::var("v_2").plus(1));
    }
}
