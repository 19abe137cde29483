use serde::{Deserialize, Serialize};

use crate::program::MonaProgram;

/// Outcome of deciding an M2L-Str program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// Every string satisfies the program.
    Valid,
    /// Some string satisfies it and some does not.
    Satisfiable,
    Unsatisfiable,
}

impl Verdict {
    pub fn is_satisfiable(self) -> bool {
        !matches!(self, Verdict::Unsatisfiable)
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verdict::Valid => write!(f, "valid"),
            Verdict::Satisfiable => write!(f, "satisfiable"),
            Verdict::Unsatisfiable => write!(f, "unsatisfiable"),
        }
    }
}

/// A decision procedure for M2L-Str programs.
pub trait MsoSolver {
    type Error: std::error::Error + 'static;

    fn check(&mut self, program: &MonaProgram) -> Result<Verdict, Self::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verdicts_serialize_in_snake_case() {
        assert_eq!(serde_json::to_string(&Verdict::Unsatisfiable).unwrap(), "\"unsatisfiable\"");
        let v: Verdict = serde_json::from_str("\"valid\"").unwrap();
        assert_eq!(v, Verdict::Valid);
        assert!(Verdict::Satisfiable.is_satisfiable());
        assert!(!Verdict::Unsatisfiable.is_satisfiable());
    }
}
