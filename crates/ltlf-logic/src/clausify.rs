//! Sharing-aware Tseitin-style flattening into globally quantified definitions.
//!
//! Each structurally distinct non-leaf subformula gets one fresh variable
//! `_vN` and one defining constraint `G(_vN <-> op(children))`, where the
//! children are replaced by their own variables. Temporal operators are unfolded
//! one step through their fixed-point identity, so the definitions only use
//! `X`, `WX`, `Y` and `WY` over variables:
//!
//! ```text
//! a U b  <->  b | (a & X(a U b))        a R b  <->  b & (a | WX(a R b))
//! a S b  <->  b | (a & Y(a S b))        a T b  <->  b & (a | WY(a T b))
//! ```
//!
//! The conjunction of all constraints with the root variable is
//! equisatisfiable with the input. Its size grows with the number of
//! distinct subformulas, not with the size of the unfolded tree.

use std::collections::HashMap;
use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};
use tracing::debug;

use crate::arena::{FormulaArena, Node, NodeId};
use crate::ast::{FreshVar, Formula, NaryOp, Operands, UnaryOp};

/// Defining constraints in the order they were produced, without duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConstraintSet {
    constraints: IndexSet<Formula>,
}

impl ConstraintSet {
    pub fn insert(&mut self, constraint: Formula) -> bool {
        self.constraints.insert(constraint)
    }

    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Formula> {
        self.constraints.iter()
    }

    pub fn contains(&self, constraint: &Formula) -> bool {
        self.constraints.contains(constraint)
    }
}

#[derive(Debug)]
pub struct Clausification {
    root: Arc<Formula>,
    constraints: ConstraintSet,
    definitions: IndexMap<FreshVar, NodeId>,
    arena: FormulaArena,
}

impl Clausification {
    /// The literal standing for the whole input: a fresh variable, or the
    /// input itself when it is a leaf.
    pub fn root(&self) -> &Arc<Formula> {
        &self.root
    }

    pub fn constraints(&self) -> &ConstraintSet {
        &self.constraints
    }

    /// Fresh variables in allocation order.
    pub fn fresh_vars(&self) -> impl Iterator<Item = FreshVar> + '_ {
        self.definitions.keys().copied()
    }

    /// The source subformula a fresh variable stands for.
    pub fn definition(&self, var: FreshVar) -> Option<Arc<Formula>> {
        self.definitions.get(&var).map(|&id| self.arena.to_formula(id))
    }

    /// Conjunction of every constraint followed by the root literal.
    pub fn to_formula(&self) -> Formula {
        if self.constraints.is_empty() {
            return self.root.as_ref().clone();
        }
        let conjuncts = self
            .constraints
            .iter()
            .map(|c| Arc::new(c.clone()))
            .chain(std::iter::once(self.root.clone()))
            .collect();
        Formula::Nary(NaryOp::And, Operands::from_vec(conjuncts))
    }
}

enum Step {
    Enter(NodeId),
    Exit {
        id: NodeId,
        var: FreshVar,
        operands: Vec<NodeId>,
    },
}

/// Flatten `formula` into fresh-variable definitions.
///
/// Variables are numbered in pre-order from `_v0`; the numbering and the
/// memo live only for this call.
pub fn clausify(formula: &Formula) -> Clausification {
    let mut arena = FormulaArena::new();
    let root_id = arena.insert(formula);

    let mut vars: HashMap<NodeId, FreshVar> = HashMap::new();
    let mut definitions: IndexMap<FreshVar, NodeId> = IndexMap::new();
    let mut constraints = ConstraintSet::default();
    let mut stack = vec![Step::Enter(root_id)];

    while let Some(step) = stack.pop() {
        match step {
            Step::Enter(id) => {
                if vars.contains_key(&id) || arena.node(id).is_leaf() {
                    continue;
                }
                let var = FreshVar::new(definitions.len() as u32);
                vars.insert(id, var);
                definitions.insert(var, id);
                let operands = binarized_operands(&mut arena, id);
                let children = operands.clone();
                stack.push(Step::Exit { id, var, operands });
                for child in children.into_iter().rev() {
                    stack.push(Step::Enter(child));
                }
            }
            Step::Exit { id, var, operands } => {
                let literals: Vec<Arc<Formula>> = operands
                    .iter()
                    .map(|&child| literal(&arena, &vars, child))
                    .collect();
                define(&mut constraints, arena.node(id), var, literals);
            }
        }
    }

    let root = literal(&arena, &vars, root_id);
    debug!(
        distinct_subformulas = arena.len(),
        fresh_vars = definitions.len(),
        constraints = constraints.len(),
        "clausified formula"
    );
    Clausification {
        root,
        constraints,
        definitions,
        arena,
    }
}

/// Temporal binaries over more than two operands associate to the right, so
/// `a U b U c` is defined through a separate node for `b U c`.
fn binarized_operands(arena: &mut FormulaArena, id: NodeId) -> Vec<NodeId> {
    match arena.node(id) {
        Node::Nary(op @ (NaryOp::Until | NaryOp::Release | NaryOp::Since | NaryOp::Trigger), cs)
            if cs.len() > 2 =>
        {
            let (op, first, rest) = (*op, cs[0], cs[1..].to_vec());
            let tail = arena.intern(Node::Nary(op, rest));
            vec![first, tail]
        }
        node => node.children().to_vec(),
    }
}

fn literal(arena: &FormulaArena, vars: &HashMap<NodeId, FreshVar>, id: NodeId) -> Arc<Formula> {
    match vars.get(&id) {
        Some(&var) => Arc::new(Formula::fresh(var)),
        None => arena.to_formula(id),
    }
}

fn define(
    constraints: &mut ConstraintSet,
    node: &Node,
    var: FreshVar,
    operands: Vec<Arc<Formula>>,
) {
    let me = Arc::new(Formula::fresh(var));
    let first = operands.first().cloned().unwrap_or_else(|| Arc::new(Formula::True));
    let second = operands.get(1).cloned().unwrap_or_else(|| Arc::new(Formula::True));
    let step = |op: UnaryOp| Formula::unary(op, me.clone());

    let (definition, boundary) = match node {
        Node::Unary(op, _) => match op {
            UnaryOp::Not => (Formula::not(first), None),
            UnaryOp::Next => (Formula::unary(UnaryOp::Next, first), Some((Formula::Last, false))),
            UnaryOp::WeakNext => {
                (Formula::unary(UnaryOp::WeakNext, first), Some((Formula::Last, true)))
            }
            UnaryOp::Before => (
                Formula::unary(UnaryOp::Before, first),
                Some((Formula::Init, false)),
            ),
            UnaryOp::WeakBefore => {
                (Formula::unary(UnaryOp::WeakBefore, first), Some((Formula::Init, true)))
            }
            UnaryOp::Eventually => (Formula::or(first, step(UnaryOp::Next)), None),
            UnaryOp::Always => (Formula::and(first, step(UnaryOp::WeakNext)), None),
            UnaryOp::Once => (Formula::or(first, step(UnaryOp::Before)), None),
            UnaryOp::Historically => (Formula::and(first, step(UnaryOp::WeakBefore)), None),
        },
        Node::Nary(op, _) => match op {
            NaryOp::Until => (Formula::or(second, Formula::and(first, step(UnaryOp::Next))), None),
            NaryOp::Release => {
                (Formula::and(second, Formula::or(first, step(UnaryOp::WeakNext))), None)
            }
            NaryOp::Since => (
                Formula::or(second, Formula::and(first, step(UnaryOp::Before))),
                None,
            ),
            NaryOp::Trigger => {
                (Formula::and(second, Formula::or(first, step(UnaryOp::WeakBefore))), None)
            }
            NaryOp::And | NaryOp::Or | NaryOp::Implies | NaryOp::Equivalence => {
                (Formula::Nary(*op, Operands::from_vec(operands)), None)
            }
        },
        Node::True | Node::False | Node::Atom(_) | Node::Last | Node::End | Node::Init => return,
    };

    constraints.insert(globally(Formula::binary(NaryOp::Equivalence, me.clone(), definition)));
    if let Some((marker, value)) = boundary {
        let literal = if value {
            me.clone()
        } else {
            Arc::new(Formula::not(me.clone()))
        };
        constraints.insert(globally(Formula::binary(NaryOp::Implies, marker, literal)));
    }
}

fn globally(body: Formula) -> Formula {
    Formula::unary(UnaryOp::Always, body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;

    fn rendered(c: &Clausification) -> Vec<String> {
        c.constraints().iter().map(|f| f.to_string()).collect()
    }

    #[test]
    fn leaves_need_no_variables() {
        for src in ["a", "true", "last", "\"q\""] {
            let c = clausify(&parse(src, "t").unwrap());
            assert!(c.constraints().is_empty(), "{src}");
            assert_eq!(c.fresh_vars().count(), 0);
            assert_eq!(c.to_formula(), parse(src, "t").unwrap());
        }
    }

    #[test]
    fn boolean_connective_gets_one_definition() {
        let c = clausify(&parse("a & !b", "t").unwrap());
        assert_eq!(
            rendered(&c),
            vec!["G((_v1 <-> !(b)))", "G((_v0 <-> (a & _v1)))"]
        );
        assert_eq!(c.root().to_string(), "_v0");
        assert_eq!(
            c.to_formula().to_string(),
            "(G((_v1 <-> !(b))) & G((_v0 <-> (a & _v1))) & _v0)"
        );
    }

    #[test]
    fn variables_are_numbered_in_preorder() {
        let c = clausify(&parse("X(a U b)", "t").unwrap());
        assert_eq!(
            rendered(&c),
            vec![
                "G((_v1 <-> (b | (a & X(_v1)))))",
                "G((_v0 <-> X(_v1)))",
                "G((last -> !(_v0)))",
            ]
        );
        let defs: Vec<String> = c
            .fresh_vars()
            .map(|v| c.definition(v).unwrap().to_string())
            .collect();
        assert_eq!(defs, vec!["X((a U b))", "(a U b)"]);
    }

    #[test]
    fn temporal_unfoldings() {
        let c = clausify(&parse("G a & F b & (a R b)", "t").unwrap());
        let r = rendered(&c);
        assert!(r.contains(&"G((_v1 <-> (a & WX(_v1))))".to_string()), "{r:?}");
        assert!(r.contains(&"G((_v2 <-> (b | X(_v2))))".to_string()), "{r:?}");
        assert!(r.contains(&"G((_v3 <-> (b & (a | WX(_v3)))))".to_string()), "{r:?}");

        let c = clausify(&parse("WY a & (a T b) & H a & O b", "t").unwrap());
        let r = rendered(&c);
        assert!(r.contains(&"G((_v1 <-> WY(a)))".to_string()), "{r:?}");
        assert!(r.contains(&"G((init -> _v1))".to_string()), "{r:?}");
        assert!(r.contains(&"G((_v2 <-> (b & (a | WY(_v2)))))".to_string()), "{r:?}");
        assert!(r.contains(&"G((_v3 <-> (a & WY(_v3))))".to_string()), "{r:?}");
        assert!(r.contains(&"G((_v4 <-> (b | Y(_v4))))".to_string()), "{r:?}");
    }

    #[test]
    fn nary_until_is_split_to_the_right() {
        let c = clausify(&parse("a U b U c", "t").unwrap());
        assert_eq!(
            rendered(&c),
            vec![
                "G((_v1 <-> (c | (b & X(_v1)))))",
                "G((_v0 <-> (_v1 | (a & X(_v0)))))",
            ]
        );
        assert_eq!(c.definition(FreshVar::new(1)).unwrap().to_string(), "(b U c)");
    }

    #[test]
    fn repeated_subformulas_share_one_variable() {
        let c = clausify(&parse("(a U b) | X(a U b) | !(a U b)", "t").unwrap());
        // Or, a U b, X, Not
        assert_eq!(c.fresh_vars().count(), 4);
    }

    #[test]
    fn constraint_count_is_independent_of_parent_count() {
        let count = |k: usize| {
            let operands: Vec<Arc<Formula>> = (0..k)
                .map(|_| Arc::new(parse("X(a U b)", "t").unwrap()))
                .collect();
            clausify(&Formula::nary(NaryOp::Or, operands).unwrap())
                .constraints()
                .len()
        };
        assert_eq!(count(2), count(16));
    }

    #[test]
    fn shared_chain_stays_linear() {
        let mut f = Arc::new(Formula::atom("a").unwrap());
        for _ in 0..40 {
            f = Arc::new(Formula::and(f.clone(), f));
        }
        let c = clausify(&f);
        assert_eq!(c.constraints().len(), 40);
        assert_eq!(c.fresh_vars().count(), 40);
    }

    #[test]
    fn state_is_local_to_each_call() {
        let f = parse("G(a -> F b)", "t").unwrap();
        let first = clausify(&f);
        let second = clausify(&f);
        assert_eq!(first.constraints(), second.constraints());
        assert_eq!(second.root().to_string(), "_v0");
    }
}
