// Command handler for: Check

use miette::IntoDiagnostic;
use serde::Serialize;

use ltlf_mona::{encode_equilibrium, encode_program, MonaConfig, Verdict};

use super::helpers::{decide, print_json, read_formula, solver_name};
use crate::cli::FormulaInput;
use crate::OutputFormat;

#[derive(Debug, Serialize)]
pub(crate) struct CheckReport {
    pub(crate) formula: String,
    pub(crate) equilibrium: bool,
    pub(crate) solver: String,
    pub(crate) verdict: Verdict,
}

fn render_check_text(report: &CheckReport) -> String {
    let what = if report.equilibrium {
        "equilibrium models"
    } else {
        "models"
    };
    let answer = if report.verdict.is_satisfiable() {
        format!("{what} exist")
    } else {
        format!("no {what}")
    };
    format!("{} ({answer}, decided by {})", report.verdict, report.solver)
}

pub(crate) fn run_check_command(
    input: &FormulaInput,
    equilibrium: bool,
    bounded: Option<usize>,
    mona: MonaConfig,
    format: OutputFormat,
) -> miette::Result<()> {
    let formula = read_formula(input)?;
    let program = if equilibrium {
        encode_equilibrium(&formula)
    } else {
        encode_program(&formula)
    }
    .into_diagnostic()?;
    let verdict = decide(&program, bounded, mona)?;
    let report = CheckReport {
        formula: formula.to_string(),
        equilibrium,
        solver: solver_name(bounded),
        verdict,
    };
    match format {
        OutputFormat::Text => println!("{}", render_check_text(&report)),
        OutputFormat::Json => print_json(&report)?,
    }
    Ok(())
}
