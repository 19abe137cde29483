//! Fischer-Ladner closure.

use std::sync::Arc;

use indexmap::IndexSet;

use crate::arena::{FormulaArena, Node};
use crate::ast::{Formula, UnaryOp};

impl Formula {
    /// Every distinct subformula, each followed by its syntactic negation.
    ///
    /// Negations are added as `!f`, never pushed inward, and are not negated
    /// again: the closure of `!a` is `{!a, a}`. Boolean constants contribute
    /// only themselves. Members come in preorder and structurally equal
    /// subformulas appear once.
    pub fn closure(&self) -> Vec<Arc<Formula>> {
        let mut arena = FormulaArena::new();
        let root = arena.insert(self);
        let mut members = IndexSet::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if !members.insert(id) {
                continue;
            }
            let node = arena.node(id).clone();
            stack.extend(node.children().iter().rev());
            if !matches!(node, Node::True | Node::False | Node::Unary(UnaryOp::Not, _)) {
                members.insert(arena.intern(Node::Unary(UnaryOp::Not, id)));
            }
        }

        let built = arena.rebuild_reachable(root);
        members
            .iter()
            .filter_map(|id| match built.get(id) {
                Some(formula) => Some(formula.clone()),
                None => match arena.node(*id) {
                    Node::Unary(UnaryOp::Not, child) => {
                        built.get(child).map(|c| Arc::new(Formula::not(c.clone())))
                    }
                    _ => None,
                },
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use proptest::prelude::*;

    use crate::arena::FormulaArena;
    use crate::parse;
    use crate::proptest_generators::arb_formula;

    fn closure(src: &str) -> Vec<String> {
        parse(src, "t")
            .unwrap()
            .closure()
            .iter()
            .map(|f| f.to_string())
            .collect()
    }

    #[test]
    fn subformulas_come_with_their_negations() {
        assert_eq!(closure("a U b"), ["(a U b)", "!((a U b))", "a", "!(a)", "b", "!(b)"]);
        assert_eq!(closure("X last"), ["X(last)", "!(X(last))", "last", "!(last)"]);
    }

    #[test]
    fn negations_and_constants_are_not_negated_again() {
        assert_eq!(closure("!a"), ["!(a)", "a"]);
        assert_eq!(closure("true"), ["true"]);
        assert_eq!(closure("G false"), ["G(false)", "!(G(false))", "false"]);
    }

    #[test]
    fn repeated_subformulas_appear_once() {
        assert_eq!(closure("a & !a"), ["(a & !(a))", "!((a & !(a)))", "a", "!(a)"]);
        assert_eq!(
            closure("F a | F a"),
            ["(F(a) | F(a))", "!((F(a) | F(a)))", "F(a)", "!(F(a))", "a", "!(a)"]
        );
    }

    proptest! {
        #[test]
        fn closure_is_closed_and_linear(f in arb_formula()) {
            let members: HashSet<_> = f.closure().into_iter().collect();
            let mut arena = FormulaArena::new();
            arena.insert(&f);
            prop_assert!(members.len() <= 2 * arena.len());

            let mut stack = vec![&f];
            while let Some(node) = stack.pop() {
                prop_assert!(members.contains(node), "{} missing from the closure of {}", node, f);
                stack.extend(node.children().iter().map(|c| c.as_ref()));
            }
            for member in &members {
                if let crate::Formula::Unary(crate::UnaryOp::Not, child) = member.as_ref() {
                    prop_assert!(members.contains(child));
                }
            }
        }
    }
}
