// Command handler for: Equivalence

use std::path::Path;

use miette::IntoDiagnostic;
use serde::Serialize;

use ltlf_logic::Formula;
use ltlf_mona::{
    check_equivalence, encode_equivalence, BoundedSolver, Equivalence, EquivalenceMode,
    MonaBackend, MonaConfig,
};

use super::helpers::{
    parse_equivalence_mode, parse_formula, print_json, read_formula_file, solver_name,
};
use crate::OutputFormat;

#[derive(Debug, Serialize)]
pub(crate) struct EquivalenceReport {
    pub(crate) left: String,
    pub(crate) right: String,
    pub(crate) mode: EquivalenceMode,
    pub(crate) solver: String,
    pub(crate) result: Equivalence,
}

#[derive(Debug, Serialize)]
pub(crate) struct EquivalenceProgramReport {
    pub(crate) left: String,
    pub(crate) right: String,
    pub(crate) mode: EquivalenceMode,
    pub(crate) program: String,
}

fn render_equivalence_text(report: &EquivalenceReport) -> String {
    let mode = match report.mode {
        EquivalenceMode::Strong => "strongly",
        EquivalenceMode::Classical => "classically",
    };
    let negation = match report.result {
        Equivalence::Equivalent => "",
        Equivalence::NotEquivalent => "not ",
    };
    format!(
        "{} and {} are {negation}{mode} equivalent (decided by {})",
        report.left, report.right, report.solver
    )
}

/// Pair the inline formulas with the file options.
pub(crate) fn read_sides(
    formulas: &[String],
    left_file: Option<&Path>,
    right_file: Option<&Path>,
) -> miette::Result<(Formula, Formula)> {
    let mut inline = formulas.iter();
    let mut side = |file: Option<&Path>, name: &str| match file {
        Some(path) => read_formula_file(path),
        None => match inline.next() {
            Some(text) => parse_formula(text, &format!("<{name}>")),
            None => miette::bail!("No {name} formula given; pass it inline or with --{name}-file"),
        },
    };
    let lhs = side(left_file, "left")?;
    let rhs = side(right_file, "right")?;
    if inline.next().is_some() {
        miette::bail!("Too many formulas; the files already supply a side");
    }
    Ok((lhs, rhs))
}

pub(crate) fn run_equivalence_command(
    lhs: &Formula,
    rhs: &Formula,
    mode: &str,
    emit: bool,
    bounded: Option<usize>,
    mona: MonaConfig,
    format: OutputFormat,
) -> miette::Result<()> {
    let mode = parse_equivalence_mode(mode)?;

    if emit {
        let program = encode_equivalence(lhs, rhs, mode).into_diagnostic()?;
        match format {
            OutputFormat::Text => print!("{program}"),
            OutputFormat::Json => print_json(&EquivalenceProgramReport {
                left: lhs.to_string(),
                right: rhs.to_string(),
                mode,
                program: program.to_string(),
            })?,
        }
        return Ok(());
    }

    let result = match bounded {
        Some(max_len) => {
            let mut solver = BoundedSolver::new(max_len);
            check_equivalence(lhs, rhs, mode, &mut solver).into_diagnostic()?
        }
        None => {
            let mut solver = MonaBackend::new(mona);
            check_equivalence(lhs, rhs, mode, &mut solver).into_diagnostic()?
        }
    };
    let report = EquivalenceReport {
        left: lhs.to_string(),
        right: rhs.to_string(),
        mode,
        solver: solver_name(bounded),
        result,
    };
    match format {
        OutputFormat::Text => println!("{}", render_equivalence_text(&report)),
        OutputFormat::Json => print_json(&report)?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_states_the_mode() {
        let report = EquivalenceReport {
            left: "!!a".to_string(),
            right: "a".to_string(),
            mode: EquivalenceMode::Strong,
            solver: "mona".to_string(),
            result: Equivalence::NotEquivalent,
        };
        assert_eq!(
            render_equivalence_text(&report),
            "!!a and a are not strongly equivalent (decided by mona)"
        );
    }

    #[test]
    fn inline_formulas_fill_the_sides_without_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("left.ltlf");
        std::fs::write(&path, "F a\n").unwrap();
        let inline = |texts: &[&str]| texts.iter().map(|t| t.to_string()).collect::<Vec<_>>();

        let (l, r) = read_sides(&inline(&["a", "b"]), None, None).unwrap();
        assert_eq!((l.to_string(), r.to_string()), ("a".to_string(), "b".to_string()));

        let (l, r) = read_sides(&inline(&["true U a"]), Some(&path), None).unwrap();
        assert_eq!((l.to_string(), r.to_string()), ("F(a)".to_string(), "(true U a)".to_string()));

        let (l, r) = read_sides(&[], Some(&path), Some(&path)).unwrap();
        assert_eq!(l, r);

        assert!(read_sides(&inline(&["a"]), None, None).is_err());
        assert!(read_sides(&inline(&["a", "b"]), Some(&path), None).is_err());
    }
}
