//! Immutable formula trees for LTLf and its past-time dual PLTLf.
//!
//! Children are held behind [`Arc`], so a tree may share subtrees between
//! parents (a DAG) while staying acyclic and read-only. Equality, ordering and
//! hashing are structural: two separately built copies of `a U b` compare
//! equal and hash alike, which is what the clausifier's memo relies on.

use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, OnceLock};

use crate::errors::FormulaError;

/// One-child operators. The last four look into the past.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum UnaryOp {
    Not,
    Next,
    WeakNext,
    Eventually,
    Always,
    Before,
    WeakBefore,
    Once,
    Historically,
}

impl UnaryOp {
    pub const ALL: [UnaryOp; 9] = [
        UnaryOp::Not,
        UnaryOp::Next,
        UnaryOp::WeakNext,
        UnaryOp::Eventually,
        UnaryOp::Always,
        UnaryOp::Before,
        UnaryOp::WeakBefore,
        UnaryOp::Once,
        UnaryOp::Historically,
    ];

    /// Prefix symbol used by the surface syntax.
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Not => "!",
            UnaryOp::Next => "X",
            UnaryOp::WeakNext => "WX",
            UnaryOp::Eventually => "F",
            UnaryOp::Always => "G",
            UnaryOp::Before => "Y",
            UnaryOp::WeakBefore => "WY",
            UnaryOp::Once => "O",
            UnaryOp::Historically => "H",
        }
    }

    pub fn is_past(self) -> bool {
        matches!(
            self,
            UnaryOp::Before | UnaryOp::WeakBefore | UnaryOp::Once | UnaryOp::Historically
        )
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UnaryOp::Not => "Not",
            UnaryOp::Next => "Next",
            UnaryOp::WeakNext => "WeakNext",
            UnaryOp::Eventually => "Eventually",
            UnaryOp::Always => "Always",
            UnaryOp::Before => "Before",
            UnaryOp::WeakBefore => "WeakBefore",
            UnaryOp::Once => "Once",
            UnaryOp::Historically => "Historically",
        };
        f.write_str(name)
    }
}

/// Operators over an ordered list of two or more operands.
///
/// `And`/`Or` are flat. `Implies` folds to the left, `Equivalence` holds when
/// all operands agree, and the four temporal binaries associate to the right
/// (`a U b U c` is `a U (b U c)`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NaryOp {
    And,
    Or,
    Implies,
    Equivalence,
    Until,
    Release,
    Since,
    Trigger,
}

impl NaryOp {
    pub const ALL: [NaryOp; 8] = [
        NaryOp::And,
        NaryOp::Or,
        NaryOp::Implies,
        NaryOp::Equivalence,
        NaryOp::Until,
        NaryOp::Release,
        NaryOp::Since,
        NaryOp::Trigger,
    ];

    /// Infix separator used by the canonical rendering, spaces included.
    pub fn infix(self) -> &'static str {
        match self {
            NaryOp::And => " & ",
            NaryOp::Or => " | ",
            NaryOp::Implies => " -> ",
            NaryOp::Equivalence => " <-> ",
            NaryOp::Until => " U ",
            NaryOp::Release => " R ",
            NaryOp::Since => " S ",
            NaryOp::Trigger => " T ",
        }
    }

    pub fn is_past(self) -> bool {
        matches!(self, NaryOp::Since | NaryOp::Trigger)
    }
}

impl fmt::Display for NaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NaryOp::And => "And",
            NaryOp::Or => "Or",
            NaryOp::Implies => "Implies",
            NaryOp::Equivalence => "Equivalence",
            NaryOp::Until => "Until",
            NaryOp::Release => "Release",
            NaryOp::Since => "Since",
            NaryOp::Trigger => "Trigger",
        };
        f.write_str(name)
    }
}

/// Variable introduced by the clausifier; rendered as `_v<n>`.
///
/// Only [`crate::clausify`] can mint these, numbering from 0 within a single
/// call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FreshVar(u32);

impl FreshVar {
    pub(crate) fn new(index: u32) -> Self {
        FreshVar(index)
    }

    pub fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Display for FreshVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "_v{}", self.0)
    }
}

/// A formula used as an atomic symbol.
///
/// The quoted rendering is computed once when the value is built. Equality,
/// ordering and hashing look only at the wrapped formula.
#[derive(Debug, Clone)]
pub struct QuotedFormula {
    formula: Arc<Formula>,
    text: Arc<str>,
}

impl QuotedFormula {
    pub fn new(formula: impl Into<Arc<Formula>>) -> Self {
        let formula = formula.into();
        let text: Arc<str> = format!("\"{formula}\"").into();
        QuotedFormula { formula, text }
    }

    pub fn formula(&self) -> &Arc<Formula> {
        &self.formula
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl PartialEq for QuotedFormula {
    fn eq(&self, other: &Self) -> bool {
        self.formula == other.formula
    }
}

impl Eq for QuotedFormula {}

impl Hash for QuotedFormula {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.formula.hash(state);
    }
}

impl PartialOrd for QuotedFormula {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QuotedFormula {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.formula.cmp(&other.formula)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AtomSymbol {
    /// A validated proposition name, either a word or a quoted string.
    Name(String),
    Quoted(QuotedFormula),
    Fresh(FreshVar),
}

impl AtomSymbol {
    pub fn name(name: impl Into<String>) -> Result<Self, FormulaError> {
        let name = name.into();
        if is_valid_name(&name) {
            Ok(AtomSymbol::Name(name))
        } else {
            Err(FormulaError::InvalidName { name })
        }
    }
}

impl fmt::Display for AtomSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AtomSymbol::Name(name) => f.write_str(name),
            AtomSymbol::Quoted(quoted) => f.write_str(quoted.as_str()),
            AtomSymbol::Fresh(var) => write!(f, "{var}"),
        }
    }
}

/// Word characters, or a double-quoted string on a single line.
fn is_valid_name(name: &str) -> bool {
    let word = !name.is_empty() && name.chars().all(|c| c.is_alphanumeric() || c == '_');
    let quoted =
        name.len() >= 2 && name.starts_with('"') && name.ends_with('"') && !name.contains('\n');
    word || quoted
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Formula {
    True,
    False,
    Atom(AtomSymbol),
    /// Holds at the final position of the trace.
    Last,
    /// Holds only past the end of the trace, so never at a real position.
    End,
    /// Holds at position 0.
    Init,
    Unary(UnaryOp, Arc<Formula>),
    Nary(NaryOp, Operands),
}

/// Operands of an n-ary node, never fewer than two.
///
/// Outside this crate the only ways in are [`Formula::nary`], which checks
/// the count, and [`Formula::binary`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Operands(Vec<Arc<Formula>>);

impl Operands {
    /// Operands taken from, or rebuilt in step with, a well-formed node.
    pub(crate) fn from_vec(children: Vec<Arc<Formula>>) -> Self {
        debug_assert!(children.len() >= 2, "n-ary node with {} operands", children.len());
        Operands(children)
    }

    pub fn as_slice(&self) -> &[Arc<Formula>] {
        &self.0
    }

    pub(crate) fn map(&self, f: impl FnMut(&Arc<Formula>) -> Arc<Formula>) -> Self {
        Operands(self.0.iter().map(f).collect())
    }
}

impl std::ops::Deref for Operands {
    type Target = [Arc<Formula>];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[allow(clippy::should_implement_trait)]
impl Formula {
    pub fn atom(name: impl Into<String>) -> Result<Self, FormulaError> {
        AtomSymbol::name(name).map(Formula::Atom)
    }

    pub fn quote(formula: impl Into<Arc<Formula>>) -> Self {
        Formula::Atom(AtomSymbol::Quoted(QuotedFormula::new(formula)))
    }

    pub(crate) fn fresh(var: FreshVar) -> Self {
        Formula::Atom(AtomSymbol::Fresh(var))
    }

    pub fn unary(op: UnaryOp, child: impl Into<Arc<Formula>>) -> Self {
        Formula::Unary(op, child.into())
    }

    pub fn nary(
        op: NaryOp,
        children: impl IntoIterator<Item = Arc<Formula>>,
    ) -> Result<Self, FormulaError> {
        let children: Vec<Arc<Formula>> = children.into_iter().collect();
        if children.len() < 2 {
            return Err(FormulaError::Arity {
                operator: op,
                found: children.len(),
            });
        }
        Ok(Formula::Nary(op, Operands(children)))
    }

    pub fn binary(op: NaryOp, lhs: impl Into<Arc<Formula>>, rhs: impl Into<Arc<Formula>>) -> Self {
        Formula::Nary(op, Operands(vec![lhs.into(), rhs.into()]))
    }

    pub fn not(child: impl Into<Arc<Formula>>) -> Self {
        Formula::unary(UnaryOp::Not, child)
    }

    pub fn and(lhs: impl Into<Arc<Formula>>, rhs: impl Into<Arc<Formula>>) -> Self {
        Formula::binary(NaryOp::And, lhs, rhs)
    }

    pub fn or(lhs: impl Into<Arc<Formula>>, rhs: impl Into<Arc<Formula>>) -> Self {
        Formula::binary(NaryOp::Or, lhs, rhs)
    }

    pub fn children(&self) -> &[Arc<Formula>] {
        match self {
            Formula::Unary(_, child) => std::slice::from_ref(child),
            Formula::Nary(_, children) => children.as_slice(),
            _ => &[],
        }
    }

    /// Propositions, boolean constants and quoted formulas.
    pub fn is_atomic(&self) -> bool {
        matches!(self, Formula::True | Formula::False | Formula::Atom(_))
    }

    pub fn is_marker(&self) -> bool {
        matches!(self, Formula::Last | Formula::End | Formula::Init)
    }

    /// Nesting depth, counting leaves as 1.
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack: Vec<(&Formula, usize)> = vec![(self, 1)];
        while let Some((node, depth)) = stack.pop() {
            deepest = deepest.max(depth);
            for child in node.children() {
                stack.push((child, depth + 1));
            }
        }
        deepest
    }

    /// Atomic symbols occurring anywhere below this node, without duplicates.
    ///
    /// Boolean constants and the position markers are not symbols. Shared
    /// children are visited once.
    pub fn find_labels(&self) -> BTreeSet<AtomSymbol> {
        let mut labels = BTreeSet::new();
        let mut seen: HashSet<*const Formula> = HashSet::new();
        let mut stack: Vec<&Formula> = vec![self];
        while let Some(node) = stack.pop() {
            if let Formula::Atom(symbol) = node {
                labels.insert(symbol.clone());
                continue;
            }
            for child in node.children() {
                if seen.insert(Arc::as_ptr(child)) {
                    stack.push(child);
                }
            }
        }
        labels
    }
}

/// Dropping a long chain of uniquely owned nodes would otherwise recurse once
/// per level.
impl Drop for Formula {
    fn drop(&mut self) {
        let mut pending = Vec::new();
        detach_children(self, &mut pending);
        while let Some(node) = pending.pop() {
            if let Ok(mut inner) = Arc::try_unwrap(node) {
                detach_children(&mut inner, &mut pending);
            }
        }
    }
}

fn detach_children(node: &mut Formula, pending: &mut Vec<Arc<Formula>>) {
    static LEAF: OnceLock<Arc<Formula>> = OnceLock::new();
    match node {
        Formula::Unary(_, child) if Arc::strong_count(child) == 1 => {
            let leaf = LEAF.get_or_init(|| Arc::new(Formula::True)).clone();
            pending.push(std::mem::replace(child, leaf));
        }
        Formula::Nary(_, children) => pending.append(&mut children.0),
        _ => {}
    }
}

impl From<AtomSymbol> for Formula {
    fn from(symbol: AtomSymbol) -> Self {
        Formula::Atom(symbol)
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        enum Piece<'a> {
            Node(&'a Formula),
            Text(&'static str),
        }

        let mut stack = vec![Piece::Node(self)];
        while let Some(piece) = stack.pop() {
            let node = match piece {
                Piece::Text(text) => {
                    f.write_str(text)?;
                    continue;
                }
                Piece::Node(node) => node,
            };
            match node {
                Formula::True => f.write_str("true")?,
                Formula::False => f.write_str("false")?,
                Formula::Last => f.write_str("last")?,
                Formula::End => f.write_str("end")?,
                Formula::Init => f.write_str("init")?,
                Formula::Atom(symbol) => write!(f, "{symbol}")?,
                Formula::Unary(op, child) => {
                    f.write_str(op.symbol())?;
                    f.write_str("(")?;
                    stack.push(Piece::Text(")"));
                    stack.push(Piece::Node(child));
                }
                Formula::Nary(op, children) => {
                    f.write_str("(")?;
                    stack.push(Piece::Text(")"));
                    for (i, child) in children.iter().enumerate().rev() {
                        stack.push(Piece::Node(child));
                        if i > 0 {
                            stack.push(Piece::Text(op.infix()));
                        }
                    }
                }
            }
        }
        Ok(())
    }
}
