#![doc = include_str!("../README.md")]

//! Second-order encodings of finite-trace temporal logic.
//!
//! Formulas from `ltlf-logic` are translated to monadic second-order logic
//! over finite strings (M2L-Str) and printed in MONA's input syntax. The
//! crate also compares formulas over different alphabets and talks to the
//! external `mona` executable.

pub mod backends;
pub mod encoder;
pub mod equivalence;
pub mod model;
pub mod program;
pub mod signature;
pub mod solver;
pub mod terms;

pub use backends::mona_backend::{MonaBackend, MonaConfig, MonaError};
pub use encoder::{encode, encode_primed, EncodeError, Position};
pub use equivalence::{
    check_equivalence, encode_equivalence, CheckError, Equivalence, EquivalenceMode,
};
pub use model::{BoundedSolver, StringModel};
pub use program::{encode_equilibrium, encode_program, MonaProgram};
pub use signature::Signature;
pub use solver::{MsoSolver, Verdict};
pub use terms::{MonaTerm, PosExpr};
