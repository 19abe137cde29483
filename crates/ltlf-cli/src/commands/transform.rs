// Command handlers for: Nnf, Negate, Clausify

use serde::Serialize;

use ltlf_logic::clausify;

use super::helpers::{print_json, read_formula};
use crate::cli::FormulaInput;
use crate::OutputFormat;

#[derive(Debug, Clone, Copy)]
pub(crate) enum Transform {
    Nnf,
    Negate,
}

#[derive(Debug, Serialize)]
pub(crate) struct TransformReport {
    pub(crate) input: String,
    pub(crate) output: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct FreshVarEntry {
    pub(crate) var: String,
    pub(crate) stands_for: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct ClausifyReport {
    pub(crate) input: String,
    pub(crate) root: String,
    pub(crate) fresh_vars: Vec<FreshVarEntry>,
    pub(crate) constraints: Vec<String>,
    pub(crate) flattened: String,
}

pub(crate) fn run_transform_command(
    input: &FormulaInput,
    transform: Transform,
    format: OutputFormat,
) -> miette::Result<()> {
    let formula = read_formula(input)?;
    let output = match transform {
        Transform::Nnf => formula.to_nnf(),
        Transform::Negate => formula.negate(),
    };
    match format {
        OutputFormat::Text => println!("{output}"),
        OutputFormat::Json => print_json(&TransformReport {
            input: formula.to_string(),
            output: output.to_string(),
        })?,
    }
    Ok(())
}

pub(crate) fn build_clausify_report(formula: &ltlf_logic::Formula) -> ClausifyReport {
    let clausification = clausify(formula);
    let fresh_vars = clausification
        .fresh_vars()
        .map(|var| FreshVarEntry {
            var: var.to_string(),
            stands_for: clausification
                .definition(var)
                .map(|f| f.to_string())
                .unwrap_or_default(),
        })
        .collect();
    ClausifyReport {
        input: formula.to_string(),
        root: clausification.root().to_string(),
        fresh_vars,
        constraints: clausification
            .constraints()
            .iter()
            .map(|c| c.to_string())
            .collect(),
        flattened: clausification.to_formula().to_string(),
    }
}

fn render_clausify_text(report: &ClausifyReport) -> String {
    let mut out = String::new();
    out.push_str(&format!("root: {}\n", report.root));
    if !report.fresh_vars.is_empty() {
        out.push_str("fresh variables:\n");
        for entry in &report.fresh_vars {
            out.push_str(&format!("  {} := {}\n", entry.var, entry.stands_for));
        }
    }
    if !report.constraints.is_empty() {
        out.push_str("constraints:\n");
        for constraint in &report.constraints {
            out.push_str(&format!("  {constraint}\n"));
        }
    }
    out.push_str(&format!("flattened: {}", report.flattened));
    out
}

pub(crate) fn run_clausify_command(
    input: &FormulaInput,
    format: OutputFormat,
) -> miette::Result<()> {
    let formula = read_formula(input)?;
    let report = build_clausify_report(&formula);
    tracing::debug!(
        fresh_vars = report.fresh_vars.len(),
        constraints = report.constraints.len(),
        "clausified"
    );
    match format {
        OutputFormat::Text => println!("{}", render_clausify_text(&report)),
        OutputFormat::Json => print_json(&report)?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::helpers::parse_formula;

    #[test]
    fn leaf_formulas_need_no_fresh_variables() {
        let report = build_clausify_report(&parse_formula("a", "t").unwrap());
        assert_eq!(report.root, "a");
        assert!(report.fresh_vars.is_empty());
        assert!(report.constraints.is_empty());
        assert_eq!(report.flattened, "a");
    }

    #[test]
    fn every_fresh_variable_has_a_definition() {
        let report = build_clausify_report(&parse_formula("F a & G F a", "t").unwrap());
        assert_eq!(report.root, "_v0");
        assert!(!report.fresh_vars.is_empty());
        assert!(report.fresh_vars.iter().all(|e| !e.stands_for.is_empty()));
        let text = render_clausify_text(&report);
        assert!(text.starts_with("root: _v0\nfresh variables:\n  _v0 := "));
    }
}
