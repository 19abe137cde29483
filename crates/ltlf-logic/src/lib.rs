#![doc = include_str!("../README.md")]

//! Formula model for linear temporal logic over finite traces (LTLf) and its
//! past-time dual (PLTLf).
//!
//! This crate defines the immutable formula AST, the surface parser, the
//! negation-normal-form and duality transformations, the Fischer-Ladner
//! closure, the sharing-aware clausifier, and a reference finite-trace
//! evaluator used to state correctness properties of the encodings built on
//! top of it.

pub mod arena;
pub mod ast;
pub mod clausify;
mod closure;
pub mod errors;
mod nnf;
pub mod parser;
#[cfg(any(test, feature = "proptest"))]
pub mod proptest_generators;
pub mod trace;

pub use ast::{AtomSymbol, Formula, FreshVar, NaryOp, Operands, QuotedFormula, UnaryOp};
pub use clausify::{clausify, Clausification, ConstraintSet};
pub use errors::{FormulaError, ParseError, TraceError};
pub use parser::parse;
