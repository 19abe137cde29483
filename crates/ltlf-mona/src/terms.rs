/// First-order position expressions over a finite string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PosExpr {
    /// A literal position.
    Lit(u32),
    /// `max($)`, the final position.
    Max,
    /// A bound first-order variable.
    Var(String),
    Plus(Box<PosExpr>, u32),
    /// Saturates at 0, as positions do in M2L-Str.
    Minus(Box<PosExpr>, u32),
}

impl PosExpr {
    pub fn var(name: impl Into<String>) -> Self {
        PosExpr::Var(name.into())
    }

    pub fn plus(self, n: u32) -> Self {
        PosExpr::Plus(Box::new(self), n)
    }

    pub fn minus(self, n: u32) -> Self {
        PosExpr::Minus(Box::new(self), n)
    }
}

/// Abstract M2L-Str formula, printed by [`crate::backends::mona_printer`].
///
/// An encoding is as deep as its formula, so `Clone` and `Drop` walk the
/// tree with a work list instead of recursing.
#[derive(Debug, PartialEq, Eq, Hash)]
pub enum MonaTerm {
    True,
    False,

    /// `p in X`
    In(PosExpr, String),

    // Position comparison
    Eq(PosExpr, PosExpr),
    Lt(PosExpr, PosExpr),
    Le(PosExpr, PosExpr),
    Gt(PosExpr, PosExpr),
    Ge(PosExpr, PosExpr),

    // Set relations
    /// `X sub Y`
    Sub(String, String),
    /// `X ~= Y`
    SetNe(String, String),

    // Boolean logic
    Not(Box<MonaTerm>),
    And(Vec<MonaTerm>),
    Or(Vec<MonaTerm>),
    Implies(Box<MonaTerm>, Box<MonaTerm>),
    Iff(Box<MonaTerm>, Box<MonaTerm>),

    // Quantifiers
    Ex1(String, Box<MonaTerm>),
    All1(String, Box<MonaTerm>),
    Ex2(Vec<String>, Box<MonaTerm>),
}

#[allow(clippy::should_implement_trait)]
impl MonaTerm {
    pub fn member(pos: PosExpr, set: impl Into<String>) -> Self {
        MonaTerm::In(pos, set.into())
    }

    pub fn eq(lhs: PosExpr, rhs: PosExpr) -> Self {
        MonaTerm::Eq(lhs, rhs)
    }

    pub fn lt(lhs: PosExpr, rhs: PosExpr) -> Self {
        MonaTerm::Lt(lhs, rhs)
    }

    pub fn le(lhs: PosExpr, rhs: PosExpr) -> Self {
        MonaTerm::Le(lhs, rhs)
    }

    pub fn gt(lhs: PosExpr, rhs: PosExpr) -> Self {
        MonaTerm::Gt(lhs, rhs)
    }

    pub fn ge(lhs: PosExpr, rhs: PosExpr) -> Self {
        MonaTerm::Ge(lhs, rhs)
    }

    pub fn not(inner: MonaTerm) -> Self {
        MonaTerm::Not(Box::new(inner))
    }

    pub fn and(terms: Vec<MonaTerm>) -> Self {
        MonaTerm::And(terms)
    }

    pub fn or(terms: Vec<MonaTerm>) -> Self {
        MonaTerm::Or(terms)
    }

    pub fn implies(lhs: MonaTerm, rhs: MonaTerm) -> Self {
        MonaTerm::Implies(Box::new(lhs), Box::new(rhs))
    }

    pub fn iff(lhs: MonaTerm, rhs: MonaTerm) -> Self {
        MonaTerm::Iff(Box::new(lhs), Box::new(rhs))
    }

    pub fn ex1(var: impl Into<String>, body: MonaTerm) -> Self {
        MonaTerm::Ex1(var.into(), Box::new(body))
    }

    pub fn all1(var: impl Into<String>, body: MonaTerm) -> Self {
        MonaTerm::All1(var.into(), Box::new(body))
    }

    /// Existentially quantify second-order variables; no-op for an empty list.
    pub fn ex2(vars: Vec<String>, body: MonaTerm) -> Self {
        if vars.is_empty() {
            body
        } else {
            MonaTerm::Ex2(vars, Box::new(body))
        }
    }

    pub fn children(&self) -> Vec<&MonaTerm> {
        match self {
            MonaTerm::Not(inner)
            | MonaTerm::Ex1(_, inner)
            | MonaTerm::All1(_, inner)
            | MonaTerm::Ex2(_, inner) => vec![inner],
            MonaTerm::And(terms) | MonaTerm::Or(terms) => terms.iter().collect(),
            MonaTerm::Implies(lhs, rhs) | MonaTerm::Iff(lhs, rhs) => vec![lhs, rhs],
            _ => Vec::new(),
        }
    }

    /// A copy of this node's own data over already cloned `operands`.
    fn rebuild(&self, mut operands: Vec<MonaTerm>) -> MonaTerm {
        match self {
            MonaTerm::True => MonaTerm::True,
            MonaTerm::False => MonaTerm::False,
            MonaTerm::In(pos, set) => MonaTerm::In(pos.clone(), set.clone()),
            MonaTerm::Eq(l, r) => MonaTerm::Eq(l.clone(), r.clone()),
            MonaTerm::Lt(l, r) => MonaTerm::Lt(l.clone(), r.clone()),
            MonaTerm::Le(l, r) => MonaTerm::Le(l.clone(), r.clone()),
            MonaTerm::Gt(l, r) => MonaTerm::Gt(l.clone(), r.clone()),
            MonaTerm::Ge(l, r) => MonaTerm::Ge(l.clone(), r.clone()),
            MonaTerm::Sub(l, r) => MonaTerm::Sub(l.clone(), r.clone()),
            MonaTerm::SetNe(l, r) => MonaTerm::SetNe(l.clone(), r.clone()),
            MonaTerm::Not(_) => MonaTerm::not(take_one(&mut operands)),
            MonaTerm::And(_) => MonaTerm::And(operands),
            MonaTerm::Or(_) => MonaTerm::Or(operands),
            MonaTerm::Implies(_, _) => {
                let rhs = take_one(&mut operands);
                MonaTerm::implies(take_one(&mut operands), rhs)
            }
            MonaTerm::Iff(_, _) => {
                let rhs = take_one(&mut operands);
                MonaTerm::iff(take_one(&mut operands), rhs)
            }
            MonaTerm::Ex1(var, _) => MonaTerm::ex1(var.clone(), take_one(&mut operands)),
            MonaTerm::All1(var, _) => MonaTerm::all1(var.clone(), take_one(&mut operands)),
            MonaTerm::Ex2(vars, _) => {
                MonaTerm::Ex2(vars.clone(), Box::new(take_one(&mut operands)))
            }
        }
    }

    /// Move the direct subterms into `pending`, leaving `true` behind.
    fn detach_children(&mut self, pending: &mut Vec<MonaTerm>) {
        match self {
            MonaTerm::Not(inner)
            | MonaTerm::Ex1(_, inner)
            | MonaTerm::All1(_, inner)
            | MonaTerm::Ex2(_, inner) => {
                pending.push(std::mem::replace(inner.as_mut(), MonaTerm::True));
            }
            MonaTerm::And(terms) | MonaTerm::Or(terms) => pending.append(terms),
            MonaTerm::Implies(lhs, rhs) | MonaTerm::Iff(lhs, rhs) => {
                pending.push(std::mem::replace(lhs.as_mut(), MonaTerm::True));
                pending.push(std::mem::replace(rhs.as_mut(), MonaTerm::True));
            }
            MonaTerm::True
            | MonaTerm::False
            | MonaTerm::In(_, _)
            | MonaTerm::Eq(_, _)
            | MonaTerm::Lt(_, _)
            | MonaTerm::Le(_, _)
            | MonaTerm::Gt(_, _)
            | MonaTerm::Ge(_, _)
            | MonaTerm::Sub(_, _)
            | MonaTerm::SetNe(_, _) => {}
        }
    }

    /// Number of nodes, counting every position comparison and membership as one.
    pub fn size(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(term) = stack.pop() {
            count += 1;
            stack.extend(term.children());
        }
        count
    }
}

/// Pops the last operand; `rebuild` always receives one per child.
fn take_one(operands: &mut Vec<MonaTerm>) -> MonaTerm {
    operands.pop().unwrap_or(MonaTerm::True)
}

impl Clone for MonaTerm {
    fn clone(&self) -> Self {
        enum Task<'a> {
            Visit(&'a MonaTerm),
            Rebuild(&'a MonaTerm, usize),
        }

        let mut tasks = vec![Task::Visit(self)];
        let mut done: Vec<MonaTerm> = Vec::new();
        while let Some(task) = tasks.pop() {
            match task {
                Task::Visit(term) => {
                    let children = term.children();
                    tasks.push(Task::Rebuild(term, children.len()));
                    tasks.extend(children.into_iter().rev().map(Task::Visit));
                }
                Task::Rebuild(term, arity) => {
                    let operands = done.split_off(done.len().saturating_sub(arity));
                    done.push(term.rebuild(operands));
                }
            }
        }
        done.pop().unwrap_or(MonaTerm::True)
    }
}

impl Drop for MonaTerm {
    fn drop(&mut self) {
        let mut pending = Vec::new();
        self.detach_children(&mut pending);
        while let Some(mut term) = pending.pop() {
            // Childless by the time it goes out of scope.
            term.detach_children(&mut pending);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ex2_without_variables_is_the_body() {
        assert_eq!(MonaTerm::ex2(Vec::new(), MonaTerm::True), MonaTerm::True);
        assert!(matches!(
            MonaTerm::ex2(vec!["A".into()], MonaTerm::True),
            MonaTerm::Ex2(_, _)
        ));
    }

    #[test]
    fn size_counts_every_node() {
        let t = MonaTerm::ex1(
            "v_1",
            MonaTerm::and(vec![
                MonaTerm::eq(PosExpr::var("v_1"), PosExpr::Lit(1)),
                MonaTerm::member(PosExpr::var("v_1"), "A"),
            ]),
        );
        assert_eq!(t.size(), 4);
    }

    #[test]
    fn clone_keeps_operand_order() {
        let t = MonaTerm::ex2(
            vec!["A_p".into()],
            MonaTerm::and(vec![
                MonaTerm::implies(MonaTerm::Sub("A_p".into(), "A".into()), MonaTerm::False),
                MonaTerm::iff(
                    MonaTerm::member(PosExpr::Max, "A"),
                    MonaTerm::not(MonaTerm::lt(PosExpr::Lit(0), PosExpr::var("v_1").plus(1))),
                ),
                MonaTerm::or(Vec::new()),
            ]),
        );
        assert_eq!(t.clone(), t);
    }

    #[test]
    fn deep_terms_clone_and_drop_without_recursion() {
        let mut t = MonaTerm::True;
        for i in 0..100_000 {
            t = if i % 2 == 0 {
                MonaTerm::not(t)
            } else {
                MonaTerm::and(vec![MonaTerm::True, t])
            };
        }
        let copy = t.clone();
        assert_eq!(copy.size(), t.size());
        drop(t);
        drop(copy);
    }
}
