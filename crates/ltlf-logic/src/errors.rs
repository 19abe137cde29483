use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

use crate::ast::NaryOp;

/// Construction-time failures of the formula model.
///
/// A tree that would violate one of these invariants is never built, so
/// every [`crate::Formula`] value in circulation is well formed.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum FormulaError {
    #[error("Invalid atomic symbol '{name}'")]
    #[diagnostic(
        code(ltlf::formula::naming),
        help("atomic symbols are word characters (letters, digits, '_') or a fully quoted string")
    )]
    InvalidName { name: String },

    #[error("{operator} needs at least two operands, got {found}")]
    #[diagnostic(code(ltlf::formula::arity))]
    Arity { operator: NaryOp, found: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TraceError {
    #[error("A trace needs at least one position")]
    Empty,
    #[error("Here and there traces differ in length ({here} vs {there})")]
    LengthMismatch { here: usize, there: usize },
    #[error("Here valuation is not contained in there valuation at position {position}")]
    NotPersistent { position: usize },
    #[error(transparent)]
    Name(#[from] FormulaError),
}

#[derive(Debug, Error, Diagnostic)]
pub enum ParseError {
    #[error("Syntax error: {message}")]
    #[diagnostic(code(ltlf::parse::syntax))]
    Syntax {
        message: String,
        #[label("here")]
        span: SourceSpan,
        #[source_code]
        src: NamedSource<String>,
    },

    #[error("Formula nested deeper than {limit} levels")]
    #[diagnostic(
        code(ltlf::parse::nesting),
        help("split the formula or reduce the number of nested parentheses")
    )]
    TooDeep {
        limit: usize,
        #[label("nesting limit exceeded here")]
        span: SourceSpan,
        #[source_code]
        src: NamedSource<String>,
    },

    #[error("Invalid formula: {source}")]
    #[diagnostic(code(ltlf::parse::formula))]
    Formula {
        #[source]
        source: FormulaError,
        #[label("built from this text")]
        span: SourceSpan,
        #[source_code]
        src: NamedSource<String>,
    },
}

impl ParseError {
    pub fn syntax(
        message: impl Into<String>,
        start: usize,
        end: usize,
        source: &str,
        filename: &str,
    ) -> Self {
        ParseError::Syntax {
            message: message.into(),
            span: span(start, end),
            src: NamedSource::new(filename, source.to_owned()),
        }
    }

    pub(crate) fn formula(
        err: FormulaError,
        start: usize,
        end: usize,
        source: &str,
        filename: &str,
    ) -> Self {
        ParseError::Formula {
            source: err,
            span: span(start, end),
            src: NamedSource::new(filename, source.to_owned()),
        }
    }

    pub(crate) fn too_deep(limit: usize, offset: usize, source: &str, filename: &str) -> Self {
        ParseError::TooDeep {
            limit,
            span: span(offset, offset + 1),
            src: NamedSource::new(filename, source.to_owned()),
        }
    }
}

fn span(start: usize, end: usize) -> SourceSpan {
    (start, end.saturating_sub(start)).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_invalid_name() {
        let err = FormulaError::InvalidName { name: "a-b".into() };
        assert_eq!(err.to_string(), "Invalid atomic symbol 'a-b'");
    }

    #[test]
    fn display_arity() {
        let err = FormulaError::Arity {
            operator: NaryOp::Until,
            found: 1,
        };
        assert_eq!(err.to_string(), "Until needs at least two operands, got 1");
    }

    #[test]
    fn syntax_convenience_constructor() {
        let err = ParseError::syntax("bad token", 5, 10, "some source code", "f.ltlf");
        assert_eq!(err.to_string(), "Syntax error: bad token");
        match &err {
            ParseError::Syntax { span, src, .. } => {
                assert_eq!(span.offset(), 5);
                assert_eq!(span.len(), 5);
                assert_eq!(src.name(), "f.ltlf");
            }
            other => panic!("expected Syntax variant, got {other:?}"),
        }
    }

    #[test]
    fn formula_error_is_kept_as_source() {
        let inner = FormulaError::InvalidName { name: "?".into() };
        let err = ParseError::formula(inner.clone(), 0, 1, "?", "f.ltlf");
        let source = std::error::Error::source(&err).map(|e| e.to_string());
        assert_eq!(source, Some(inner.to_string()));
    }
}
