#![allow(clippy::result_large_err)]

use std::sync::Arc;

use pest::Parser;
use pest_derive::Parser;
use tracing::debug;

use crate::ast::{Formula, NaryOp, UnaryOp};
use crate::errors::ParseError;

#[derive(Parser)]
#[grammar = "grammar.pest"]
struct LtlfParser;

type Pair<'a> = pest::iterators::Pair<'a, Rule>;

/// Deepest parenthesis nesting accepted by [`parse`].
pub const MAX_NESTING: usize = 256;

/// Parse the surface syntax of an LTLf/PLTLf formula.
///
/// Every binary level is collected into one n-ary node, so `a & b & c` is a
/// single `And` with three operands.
pub fn parse(source: &str, filename: &str) -> Result<Formula, ParseError> {
    check_nesting(source, filename)?;

    let mut pairs = LtlfParser::parse(Rule::formula, source).map_err(|e| {
        let (start, end) = match e.location {
            pest::error::InputLocation::Pos(p) => (p, p + 1),
            pest::error::InputLocation::Span((s, e)) => (s, e),
        };
        ParseError::syntax(e.variant.message().to_string(), start, end, source, filename)
    })?;

    let builder = Builder { source, filename };
    let body = pairs
        .next()
        .and_then(|formula| formula.into_inner().next())
        .ok_or_else(|| ParseError::syntax("empty formula", 0, source.len(), source, filename))?;
    let formula = builder.build(body)?;
    debug!(
        filename,
        depth = formula.depth(),
        labels = formula.find_labels().len(),
        "parsed formula"
    );
    Ok(Arc::unwrap_or_clone(formula))
}

/// pest descends once per parenthesis level, so bound it before parsing.
fn check_nesting(source: &str, filename: &str) -> Result<(), ParseError> {
    let mut depth = 0usize;
    let mut in_quote = false;
    for (offset, c) in source.char_indices() {
        match c {
            '"' => in_quote = !in_quote,
            '\n' => in_quote = false,
            '(' if !in_quote => {
                depth += 1;
                if depth > MAX_NESTING {
                    return Err(ParseError::too_deep(MAX_NESTING, offset, source, filename));
                }
            }
            ')' if !in_quote => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    Ok(())
}

struct Builder<'s> {
    source: &'s str,
    filename: &'s str,
}

impl Builder<'_> {
    fn build(&self, pair: Pair<'_>) -> Result<Arc<Formula>, ParseError> {
        let op = match pair.as_rule() {
            Rule::equivalence => NaryOp::Equivalence,
            Rule::implication => NaryOp::Implies,
            Rule::disjunction => NaryOp::Or,
            Rule::conjunction => NaryOp::And,
            Rule::until => NaryOp::Until,
            Rule::release => NaryOp::Release,
            Rule::since => NaryOp::Since,
            Rule::trigger => NaryOp::Trigger,
            Rule::unary => return self.build_unary(pair),
            Rule::constant => return self.build_constant(&pair),
            Rule::ident | Rule::quoted => {
                let span = pair.as_span();
                return Formula::atom(pair.as_str())
                    .map(Arc::new)
                    .map_err(|e| {
                        ParseError::formula(e, span.start(), span.end(), self.source, self.filename)
                    });
            }
            other => return Err(self.unexpected(&pair, other)),
        };

        let span = pair.as_span();
        let mut operands = pair
            .into_inner()
            .map(|p| self.build(p))
            .collect::<Result<Vec<_>, _>>()?;
        if operands.len() == 1 {
            if let Some(single) = operands.pop() {
                return Ok(single);
            }
        }
        Formula::nary(op, operands)
            .map(Arc::new)
            .map_err(|e| {
                ParseError::formula(e, span.start(), span.end(), self.source, self.filename)
            })
    }

    fn build_unary(&self, pair: Pair<'_>) -> Result<Arc<Formula>, ParseError> {
        let span = pair.as_span();
        let mut ops = Vec::new();
        let mut operand = None;
        for inner in pair.into_inner() {
            match inner.as_rule() {
                Rule::prefix_op => ops.push(prefix_op(inner.as_str())),
                _ => operand = Some(self.build(inner)?),
            }
        }
        let mut formula = operand.ok_or_else(|| {
            ParseError::syntax(
                "prefix operator without operand",
                span.start(),
                span.end(),
                self.source,
                self.filename,
            )
        })?;
        for op in ops.into_iter().rev() {
            formula = Arc::new(Formula::Unary(op, formula));
        }
        Ok(formula)
    }

    fn build_constant(&self, pair: &Pair<'_>) -> Result<Arc<Formula>, ParseError> {
        let formula = match pair.as_str() {
            "true" => Formula::True,
            "false" => Formula::False,
            "last" => Formula::Last,
            "end" => Formula::End,
            "init" => Formula::Init,
            _ => return Err(self.unexpected(pair, Rule::constant)),
        };
        Ok(Arc::new(formula))
    }

    fn unexpected(&self, pair: &Pair<'_>, rule: Rule) -> ParseError {
        let span = pair.as_span();
        ParseError::syntax(
            format!("unexpected {rule:?} '{}'", pair.as_str()),
            span.start(),
            span.end(),
            self.source,
            self.filename,
        )
    }
}

fn prefix_op(symbol: &str) -> UnaryOp {
    match symbol {
        "X" => UnaryOp::Next,
        "WX" => UnaryOp::WeakNext,
        "F" => UnaryOp::Eventually,
        "G" => UnaryOp::Always,
        "Y" => UnaryOp::Before,
        "WY" => UnaryOp::WeakBefore,
        "O" => UnaryOp::Once,
        "H" => UnaryOp::Historically,
        _ => UnaryOp::Not,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(src: &str) -> Formula {
        match parse(src, "test.ltlf") {
            Ok(f) => f,
            Err(e) => panic!("failed to parse {src:?}: {e}"),
        }
    }

    #[test]
    fn parse_atoms_and_constants() {
        assert_eq!(p("a"), Formula::atom("a").unwrap());
        assert_eq!(p("true"), Formula::True);
        assert_eq!(p("false"), Formula::False);
        assert_eq!(p("last"), Formula::Last);
        assert_eq!(p("end"), Formula::End);
        assert_eq!(p("init"), Formula::Init);
        assert_eq!(p("trueish"), Formula::atom("trueish").unwrap());
        assert_eq!(p("\"a b\""), Formula::atom("\"a b\"").unwrap());
    }

    #[test]
    fn binary_levels_are_collected_flat() {
        let f = p("a & b & c");
        match &f {
            Formula::Nary(NaryOp::And, children) => assert_eq!(children.len(), 3),
            other => panic!("expected flat And, got {other}"),
        }
        assert_eq!(p("a U b U c").to_string(), "(a U b U c)");
    }

    #[test]
    fn precedence_from_loosest_to_tightest() {
        assert_eq!(p("a <-> b -> c | d & e").to_string(), "(a <-> (b -> (c | (d & e))))");
        assert_eq!(p("a & b U c R d").to_string(), "(a & (b U (c R d)))");
        assert_eq!(p("a U b S c T d").to_string(), "(a U (b S (c T d)))");
        assert_eq!(p("!a U b").to_string(), "(!(a) U b)");
    }

    #[test]
    fn prefix_operators_nest_to_the_right() {
        assert_eq!(p("G F a").to_string(), "G(F(a))");
        assert_eq!(p("WX WY ~ a").to_string(), "WX(WY(!(a)))");
        assert_eq!(p("X(a | b)").to_string(), "X((a | b))");
        assert_eq!(p("O H Y a").to_string(), "O(H(Y(a)))");
    }

    #[test]
    fn canonical_rendering_reparses() {
        for src in [
            "G(req -> F grant)",
            "(a U b) R !c",
            "WX last | end",
            "H(a S b) & O init",
            "a <-> b <-> c",
        ] {
            let f = p(src);
            assert_eq!(p(&f.to_string()), f, "round trip of {src}");
        }
    }

    #[test]
    fn syntax_error_carries_span() {
        let err = parse("a & & b", "bad.ltlf").unwrap_err();
        match err {
            ParseError::Syntax { span, src, .. } => {
                assert!((2..=4).contains(&span.offset()), "offset {}", span.offset());
                assert_eq!(src.name(), "bad.ltlf");
            }
            other => panic!("expected syntax error, got {other:?}"),
        }
    }

    #[test]
    fn rejects_uppercase_identifiers_and_trailing_input() {
        assert!(parse("A", "t").is_err());
        assert!(parse("a b", "t").is_err());
        assert!(parse("", "t").is_err());
        assert!(parse("(a", "t").is_err());
    }

    #[test]
    fn deep_nesting_is_reported_not_overflowed() {
        let src = format!("{}a{}", "(".repeat(MAX_NESTING + 1), ")".repeat(MAX_NESTING + 1));
        let err = parse(&src, "deep.ltlf").unwrap_err();
        assert!(matches!(err, ParseError::TooDeep { limit: MAX_NESTING, .. }));

        let ok = format!("{}a{}", "(".repeat(MAX_NESTING), ")".repeat(MAX_NESTING));
        assert_eq!(p(&ok), Formula::atom("a").unwrap());
    }

    #[test]
    fn parentheses_inside_quotes_do_not_count() {
        let src = format!("\"{}\"", "(".repeat(MAX_NESTING + 10));
        assert!(parse(&src, "q.ltlf").is_ok());
    }
}
