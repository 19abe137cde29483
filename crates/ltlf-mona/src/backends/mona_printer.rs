use crate::terms::{MonaTerm, PosExpr};

/// Print a position expression in MONA syntax.
pub fn pos_to_mona(pos: &PosExpr) -> String {
    match pos {
        PosExpr::Lit(n) => n.to_string(),
        PosExpr::Max => "max($)".to_string(),
        PosExpr::Var(name) => name.clone(),
        PosExpr::Plus(inner, n) => format!("{}+{n}", pos_to_mona(inner)),
        PosExpr::Minus(inner, n) => format!("{}-{n}", pos_to_mona(inner)),
    }
}

enum Piece<'a> {
    Term(&'a MonaTerm),
    Text(&'static str),
}

/// Print a [`MonaTerm`] as MONA formula text.
///
/// Every connective and quantifier is parenthesised, so the output never
/// depends on MONA's precedence rules or on how far a quantifier's scope
/// extends to the right.
pub fn to_mona(term: &MonaTerm) -> String {
    let mut out = String::new();
    let mut stack = vec![Piece::Term(term)];
    while let Some(piece) = stack.pop() {
        let term = match piece {
            Piece::Text(text) => {
                out.push_str(text);
                continue;
            }
            Piece::Term(term) => term,
        };
        match term {
            MonaTerm::True => out.push_str("true"),
            MonaTerm::False => out.push_str("false"),
            MonaTerm::In(pos, set) => {
                out.push_str(&format!("({} in {set})", pos_to_mona(pos)));
            }
            MonaTerm::Eq(l, r) => out.push_str(&relation(l, "=", r)),
            MonaTerm::Lt(l, r) => out.push_str(&relation(l, "<", r)),
            MonaTerm::Le(l, r) => out.push_str(&relation(l, "<=", r)),
            MonaTerm::Gt(l, r) => out.push_str(&relation(l, ">", r)),
            MonaTerm::Ge(l, r) => out.push_str(&relation(l, ">=", r)),
            MonaTerm::Sub(l, r) => out.push_str(&format!("({l} sub {r})")),
            MonaTerm::SetNe(l, r) => out.push_str(&format!("({l} ~= {r})")),
            MonaTerm::Not(inner) => {
                out.push_str("~(");
                stack.push(Piece::Text(")"));
                stack.push(Piece::Term(inner));
            }
            MonaTerm::And(terms) => push_connective(&mut out, &mut stack, terms, " & ", "true"),
            MonaTerm::Or(terms) => push_connective(&mut out, &mut stack, terms, " | ", "false"),
            MonaTerm::Implies(l, r) => push_binary(&mut out, &mut stack, l, " => ", r),
            MonaTerm::Iff(l, r) => push_binary(&mut out, &mut stack, l, " <=> ", r),
            MonaTerm::Ex1(var, body) => push_quantifier(&mut out, &mut stack, "ex1", var, body),
            MonaTerm::All1(var, body) => push_quantifier(&mut out, &mut stack, "all1", var, body),
            MonaTerm::Ex2(vars, body) => {
                push_quantifier(&mut out, &mut stack, "ex2", &vars.join(", "), body)
            }
        }
    }
    out
}

fn relation(lhs: &PosExpr, op: &str, rhs: &PosExpr) -> String {
    format!("({} {op} {})", pos_to_mona(lhs), pos_to_mona(rhs))
}

fn push_connective<'a>(
    out: &mut String,
    stack: &mut Vec<Piece<'a>>,
    terms: &'a [MonaTerm],
    sep: &'static str,
    empty: &'static str,
) {
    match terms {
        [] => out.push_str(empty),
        [single] => stack.push(Piece::Term(single)),
        _ => {
            out.push('(');
            stack.push(Piece::Text(")"));
            for (i, term) in terms.iter().enumerate().rev() {
                stack.push(Piece::Term(term));
                if i > 0 {
                    stack.push(Piece::Text(sep));
                }
            }
        }
    }
}

fn push_binary<'a>(
    out: &mut String,
    stack: &mut Vec<Piece<'a>>,
    lhs: &'a MonaTerm,
    op: &'static str,
    rhs: &'a MonaTerm,
) {
    out.push('(');
    stack.push(Piece::Text(")"));
    stack.push(Piece::Term(rhs));
    stack.push(Piece::Text(op));
    stack.push(Piece::Term(lhs));
}

fn push_quantifier<'a>(
    out: &mut String,
    stack: &mut Vec<Piece<'a>>,
    keyword: &str,
    vars: &str,
    body: &'a MonaTerm,
) {
    out.push_str(&format!("({keyword} {vars}: "));
    stack.push(Piece::Text(")"));
    stack.push(Piece::Term(body));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(name: &str) -> PosExpr {
        PosExpr::var(name)
    }

    #[test]
    fn print_membership_and_relations() {
        assert_eq!(to_mona(&MonaTerm::member(PosExpr::Lit(0), "A")), "(0 in A)");
        assert_eq!(to_mona(&MonaTerm::eq(v("v_1"), PosExpr::Lit(1))), "(v_1 = 1)");
        assert_eq!(to_mona(&MonaTerm::le(v("v_1"), PosExpr::Max)), "(v_1 <= max($))");
        assert_eq!(
            to_mona(&MonaTerm::eq(v("v_2"), PosExpr::Max.minus(1))),
            "(v_2 = max($)-1)"
        );
        assert_eq!(to_mona(&MonaTerm::eq(v("v_2"), v("v_1").plus(1))), "(v_2 = v_1+1)");
        assert_eq!(to_mona(&MonaTerm::Sub("A_p".into(), "A".into())), "(A_p sub A)");
        assert_eq!(to_mona(&MonaTerm::SetNe("A_p".into(), "A".into())), "(A_p ~= A)");
    }

    #[test]
    fn print_connectives() {
        let a = MonaTerm::member(PosExpr::Lit(0), "A");
        let b = MonaTerm::member(PosExpr::Lit(0), "B");
        assert_eq!(to_mona(&MonaTerm::not(a.clone())), "~((0 in A))");
        assert_eq!(
            to_mona(&MonaTerm::and(vec![a.clone(), b.clone(), MonaTerm::True])),
            "((0 in A) & (0 in B) & true)"
        );
        assert_eq!(to_mona(&MonaTerm::or(vec![a.clone()])), "(0 in A)");
        assert_eq!(to_mona(&MonaTerm::and(Vec::new())), "true");
        assert_eq!(to_mona(&MonaTerm::or(Vec::new())), "false");
        assert_eq!(
            to_mona(&MonaTerm::implies(a.clone(), b.clone())),
            "((0 in A) => (0 in B))"
        );
        assert_eq!(to_mona(&MonaTerm::iff(a, b)), "((0 in A) <=> (0 in B))");
    }

    #[test]
    fn print_quantifiers() {
        let body = MonaTerm::and(vec![
            MonaTerm::eq(v("v_1"), PosExpr::Lit(1)),
            MonaTerm::member(v("v_1"), "A"),
        ]);
        assert_eq!(
            to_mona(&MonaTerm::ex1("v_1", body.clone())),
            "(ex1 v_1: ((v_1 = 1) & (v_1 in A)))"
        );
        assert_eq!(
            to_mona(&MonaTerm::all1("v_1", MonaTerm::False)),
            "(all1 v_1: false)"
        );
        assert_eq!(
            to_mona(&MonaTerm::ex2(vec!["A_p".into(), "B_p".into()], MonaTerm::True)),
            "(ex2 A_p, B_p: true)"
        );
    }

    #[test]
    fn deep_terms_print_without_recursion() {
        let mut t = MonaTerm::True;
        for _ in 0..100_000 {
            t = MonaTerm::not(t);
        }
        let printed = to_mona(&t);
        assert!(printed.starts_with("~(~("));
        assert_eq!(printed.len(), 100_000 * 3 + 4);
    }
}
