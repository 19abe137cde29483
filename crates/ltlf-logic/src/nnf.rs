//! Negation normal form and closed-under-negation duals.
//!
//! Both transformations share one work-stack driver so arbitrarily deep
//! formulas never recurse on the call stack.

use std::sync::Arc;

use crate::ast::{Formula, NaryOp, Operands, UnaryOp};

#[derive(Debug, Clone, Copy)]
enum Mode {
    Nnf,
    Negate,
}

enum Task {
    Visit(Arc<Formula>, Mode),
    /// Pop the last result and visit it again in the given mode.
    Then(Mode),
    Unary(UnaryOp),
    Nary(NaryOp, usize),
}

impl Formula {
    /// Push negations down to atomic symbols.
    ///
    /// `F f` becomes `true U f`, `G f` becomes `false R f`; implications and
    /// equivalences are expanded into disjunctions. Every other operator keeps
    /// its shape with normalised children.
    pub fn to_nnf(&self) -> Formula {
        run(self, Mode::Nnf)
    }

    /// A formula equivalent to `!self` over the same operator set.
    ///
    /// The result is not necessarily in NNF; `to_nnf(negate(to_nnf(f)))` is.
    pub fn negate(&self) -> Formula {
        run(self, Mode::Negate)
    }

    /// True when no negation wraps anything but an atomic symbol.
    pub fn is_nnf(&self) -> bool {
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            if let Formula::Unary(UnaryOp::Not, child) = node {
                if !child.is_atomic() {
                    return false;
                }
                continue;
            }
            stack.extend(node.children().iter().map(|c| c.as_ref()));
        }
        true
    }
}

fn run(root: &Formula, mode: Mode) -> Formula {
    let root = Arc::new(root.clone());
    let mut tasks = vec![Task::Visit(root.clone(), mode)];
    let mut values: Vec<Arc<Formula>> = Vec::new();

    while let Some(task) = tasks.pop() {
        match task {
            Task::Visit(node, Mode::Nnf) => nnf_step(node, &mut tasks, &mut values),
            Task::Visit(node, Mode::Negate) => negate_step(node, &mut tasks, &mut values),
            Task::Then(mode) => {
                if let Some(value) = values.pop() {
                    tasks.push(Task::Visit(value, mode));
                }
            }
            Task::Unary(op) => {
                if let Some(child) = values.pop() {
                    values.push(Arc::new(Formula::Unary(op, child)));
                }
            }
            Task::Nary(op, arity) => {
                let children = values.split_off(values.len().saturating_sub(arity));
                values.push(Arc::new(Formula::Nary(op, Operands::from_vec(children))));
            }
        }
    }

    values.pop().map_or_else(|| root.as_ref().clone(), Arc::unwrap_or_clone)
}

fn visit_children(tasks: &mut Vec<Task>, children: &[Arc<Formula>], mode: Mode) {
    for child in children.iter().rev() {
        tasks.push(Task::Visit(child.clone(), mode));
    }
}

fn nnf_step(node: Arc<Formula>, tasks: &mut Vec<Task>, values: &mut Vec<Arc<Formula>>) {
    match node.as_ref() {
        Formula::True
        | Formula::False
        | Formula::Atom(_)
        | Formula::Last
        | Formula::End
        | Formula::Init => values.push(node),
        Formula::Unary(UnaryOp::Not, child) => {
            if child.is_atomic() {
                values.push(node);
            } else {
                tasks.push(Task::Then(Mode::Nnf));
                tasks.push(Task::Visit(child.clone(), Mode::Negate));
            }
        }
        Formula::Unary(UnaryOp::Eventually, child) => {
            let until = Formula::binary(NaryOp::Until, Formula::True, child.clone());
            tasks.push(Task::Visit(Arc::new(until), Mode::Nnf));
        }
        Formula::Unary(UnaryOp::Always, child) => {
            let release = Formula::binary(NaryOp::Release, Formula::False, child.clone());
            tasks.push(Task::Visit(Arc::new(release), Mode::Nnf));
        }
        Formula::Unary(op, child) => {
            tasks.push(Task::Unary(*op));
            tasks.push(Task::Visit(child.clone(), Mode::Nnf));
        }
        Formula::Nary(NaryOp::Implies, children) => {
            tasks.push(Task::Visit(Arc::new(implication_as_disjunction(children)), Mode::Nnf));
        }
        Formula::Nary(NaryOp::Equivalence, children) => {
            tasks.push(Task::Visit(Arc::new(equivalence_as_disjunction(children)), Mode::Nnf));
        }
        Formula::Nary(op, children) => {
            tasks.push(Task::Nary(*op, children.len()));
            visit_children(tasks, children, Mode::Nnf);
        }
    }
}

fn negate_step(node: Arc<Formula>, tasks: &mut Vec<Task>, values: &mut Vec<Arc<Formula>>) {
    let dual = match node.as_ref() {
        Formula::True => return values.push(Arc::new(Formula::False)),
        Formula::False => return values.push(Arc::new(Formula::True)),
        Formula::Atom(_) => return values.push(Arc::new(Formula::Unary(UnaryOp::Not, node))),
        Formula::Last => {
            return values.push(Arc::new(Formula::unary(UnaryOp::Next, Formula::True)));
        }
        Formula::Init => {
            return values.push(Arc::new(Formula::unary(UnaryOp::Before, Formula::True)));
        }
        Formula::End => {
            let until = Formula::binary(NaryOp::Until, Formula::True, Formula::True);
            return values.push(Arc::new(until));
        }
        Formula::Unary(UnaryOp::Not, child) => return values.push(child.clone()),
        Formula::Unary(op, child) => match unary_dual(*op) {
            Some(dual) => {
                tasks.push(Task::Unary(dual));
                tasks.push(Task::Visit(child.clone(), Mode::Negate));
                return;
            }
            None => return rewrite_then_negate(node.clone(), tasks),
        },
        Formula::Nary(op, _) => match nary_dual(*op) {
            Some(dual) => dual,
            None => return rewrite_then_negate(node.clone(), tasks),
        },
    };
    let children = node.children();
    tasks.push(Task::Nary(dual, children.len()));
    visit_children(tasks, children, Mode::Negate);
}

/// Operators whose negation is the same shape under another operator.
fn unary_dual(op: UnaryOp) -> Option<UnaryOp> {
    match op {
        UnaryOp::Next => Some(UnaryOp::WeakNext),
        UnaryOp::WeakNext => Some(UnaryOp::Next),
        UnaryOp::Before => Some(UnaryOp::WeakBefore),
        UnaryOp::WeakBefore => Some(UnaryOp::Before),
        UnaryOp::Once => Some(UnaryOp::Historically),
        UnaryOp::Historically => Some(UnaryOp::Once),
        UnaryOp::Not | UnaryOp::Eventually | UnaryOp::Always => None,
    }
}

fn nary_dual(op: NaryOp) -> Option<NaryOp> {
    match op {
        NaryOp::And => Some(NaryOp::Or),
        NaryOp::Or => Some(NaryOp::And),
        NaryOp::Until => Some(NaryOp::Release),
        NaryOp::Release => Some(NaryOp::Until),
        NaryOp::Since => Some(NaryOp::Trigger),
        NaryOp::Trigger => Some(NaryOp::Since),
        NaryOp::Implies | NaryOp::Equivalence => None,
    }
}

/// Normalise first, then negate the normal form.
fn rewrite_then_negate(node: Arc<Formula>, tasks: &mut Vec<Task>) {
    tasks.push(Task::Then(Mode::Negate));
    tasks.push(Task::Visit(node, Mode::Nnf));
}

/// `f0 -> f1 -> ... -> fn` folded to the left as `!(...(!f0 | f1)...) | fn`.
fn implication_as_disjunction(children: &[Arc<Formula>]) -> Formula {
    let Some((first, rest)) = children.split_first() else {
        return Formula::True;
    };
    let mut acc = first.clone();
    for next in rest {
        acc = Arc::new(Formula::or(Formula::not(acc), next.clone()));
    }
    Arc::unwrap_or_clone(acc)
}

/// All operands true, or all operands false.
fn equivalence_as_disjunction(children: &Operands) -> Formula {
    let positive = Formula::Nary(NaryOp::And, children.clone());
    let negative = Formula::Nary(
        NaryOp::And,
        children.map(|c| Arc::new(Formula::not(c.clone()))),
    );
    Formula::or(positive, negative)
}

#[cfg(test)]
mod tests {
    use crate::parse;

    fn nnf(src: &str) -> String {
        parse(src, "t").unwrap().to_nnf().to_string()
    }

    fn neg(src: &str) -> String {
        parse(src, "t").unwrap().negate().to_string()
    }

    #[test]
    fn nnf_pushes_negation_through_boolean_connectives() {
        assert_eq!(nnf("!(a & b)"), "(!(a) | !(b))");
        assert_eq!(nnf("!(a | !b)"), "(!(a) & b)");
        assert_eq!(nnf("!!a"), "a");
        assert_eq!(nnf("a -> b"), "(!(a) | b)");
        assert_eq!(nnf("a -> b -> c"), "((a & !(b)) | c)");
        assert_eq!(nnf("a <-> b"), "((a & b) | (!(a) & !(b)))");
    }

    #[test]
    fn nnf_rewrites_eventually_and_always() {
        assert_eq!(nnf("F a"), "(true U a)");
        assert_eq!(nnf("G a"), "(false R a)");
        assert_eq!(nnf("!F a"), "(false R !(a))");
        assert_eq!(nnf("!G a"), "(true U !(a))");
    }

    #[test]
    fn nnf_keeps_other_operators_and_normalises_children() {
        assert_eq!(nnf("X !(a | b)"), "X((!(a) & !(b)))");
        assert_eq!(nnf("!X a"), "WX(!(a))");
        assert_eq!(nnf("!(a U b)"), "(!(a) R !(b))");
        assert_eq!(nnf("!(a S b)"), "(!(a) T !(b))");
        assert_eq!(nnf("!Y a"), "WY(!(a))");
        assert_eq!(nnf("!O a"), "H(!(a))");
        assert_eq!(nnf("WY !(a & b)"), "WY((!(a) | !(b)))");
    }

    #[test]
    fn markers_and_constants() {
        assert_eq!(nnf("last"), "last");
        assert_eq!(nnf("!last"), "X(true)");
        assert_eq!(nnf("!init"), "Y(true)");
        assert_eq!(nnf("!end"), "(true U true)");
        assert_eq!(nnf("!true"), "!(true)");
        assert_eq!(neg("true"), "false");
    }

    #[test]
    fn negate_uses_duals() {
        assert_eq!(neg("a & b"), "(!(a) | !(b))");
        assert_eq!(neg("!a"), "a");
        assert_eq!(neg("X a"), "WX(!(a))");
        assert_eq!(neg("WX a"), "X(!(a))");
        assert_eq!(neg("a R b"), "(!(a) U !(b))");
        assert_eq!(neg("a T b"), "(!(a) S !(b))");
        assert_eq!(neg("WY a"), "Y(!(a))");
        assert_eq!(neg("H a"), "O(!(a))");
        assert_eq!(neg("F a"), "(false R !(a))");
        assert_eq!(neg("a -> b"), "(a & !(b))");
    }

    #[test]
    fn duals_are_involutions_and_cover_every_operator() {
        use super::{nary_dual, unary_dual};
        use crate::ast::{NaryOp, UnaryOp};

        for op in UnaryOp::ALL {
            match unary_dual(op) {
                Some(dual) => assert_eq!(unary_dual(dual), Some(op), "{op}"),
                None => assert!(matches!(op, UnaryOp::Not | UnaryOp::Eventually | UnaryOp::Always)),
            }
        }
        for op in NaryOp::ALL {
            match nary_dual(op) {
                Some(dual) => assert_eq!(nary_dual(dual), Some(op), "{op}"),
                None => assert!(matches!(op, NaryOp::Implies | NaryOp::Equivalence)),
            }
        }
        assert_eq!(neg("O a"), "H(!(a))");
        assert_eq!(neg("Y a"), "WY(!(a))");
        assert_eq!(neg("a S b"), "(!(a) T !(b))");
    }

    #[test]
    fn rewritten_nary_nodes_keep_at_least_two_operands() {
        use std::sync::Arc;

        use crate::ast::{Formula, NaryOp};

        let abc: Vec<Arc<Formula>> =
            ["a", "b", "c"].iter().map(|n| Arc::new(Formula::atom(*n).unwrap())).collect();
        for op in NaryOp::ALL {
            let f = Formula::nary(op, abc.clone()).unwrap();
            for g in [f.to_nnf(), f.negate(), f.negate().to_nnf()] {
                let mut stack = vec![&g];
                while let Some(node) = stack.pop() {
                    if let Formula::Nary(inner, children) = node {
                        assert!(children.len() >= 2, "{inner} in {g}");
                    }
                    stack.extend(node.children().iter().map(|c| c.as_ref()));
                }
            }
        }
    }

    #[test]
    fn negate_of_nested_negation_is_not_normalised() {
        assert_eq!(neg("!(a & b)"), "(a & b)");
        assert_eq!(neg("X !(a & b)"), "WX((a & b))");
        assert!(neg("a U !X b").contains("X(b)"));
    }

    #[test]
    fn is_nnf_detects_negated_compound() {
        assert!(parse("!a & X !b", "t").unwrap().is_nnf());
        assert!(!parse("!(a & b)", "t").unwrap().is_nnf());
        assert!(!parse("G !X a", "t").unwrap().is_nnf());
    }

    #[test]
    fn deep_negation_chain_is_handled_iteratively() {
        let mut f = crate::Formula::atom("a").unwrap();
        for _ in 0..50_000 {
            f = crate::Formula::not(crate::Formula::unary(crate::UnaryOp::Next, f));
        }
        let normal = f.to_nnf();
        assert!(normal.is_nnf());
        assert_eq!(normal.depth(), 50_001);
    }
}
