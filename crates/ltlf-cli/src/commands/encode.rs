// Command handlers for: Encode, Equilibrium

use std::path::PathBuf;

use miette::IntoDiagnostic;
use serde::Serialize;

use ltlf_mona::{encode_equilibrium, encode_program, MonaProgram};

use super::helpers::{print_json, read_formula, write_text_artifact};
use crate::cli::FormulaInput;
use crate::OutputFormat;

#[derive(Debug, Serialize)]
pub(crate) struct EncodeReport {
    pub(crate) formula: String,
    pub(crate) equilibrium: bool,
    pub(crate) variables: Vec<String>,
    pub(crate) program: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) out: Option<String>,
}

impl EncodeReport {
    fn new(formula: String, equilibrium: bool, program: &MonaProgram) -> Self {
        Self {
            formula,
            equilibrium,
            variables: program.vars.clone(),
            program: program.to_string(),
            out: None,
        }
    }
}

pub(crate) fn run_encode_command(
    input: &FormulaInput,
    out: Option<PathBuf>,
    equilibrium: bool,
    format: OutputFormat,
) -> miette::Result<()> {
    let formula = read_formula(input)?;
    let program = if equilibrium {
        encode_equilibrium(&formula)
    } else {
        encode_program(&formula)
    }
    .into_diagnostic()?;
    let mut report = EncodeReport::new(formula.to_string(), equilibrium, &program);

    if let Some(path) = out {
        write_text_artifact(&path, &report.program)?;
        tracing::info!(path = %path.display(), "program written");
        report.out = Some(path.display().to_string());
        if format == OutputFormat::Text {
            println!("MONA program written to {}", path.display());
            return Ok(());
        }
    }

    match format {
        OutputFormat::Text => print!("{}", report.program),
        OutputFormat::Json => print_json(&report)?,
    }
    Ok(())
}
