// Shared plumbing for the command handlers: reading formulas, mapping global
// flags into library configuration, and rendering reports.

use std::path::Path;
use std::time::Duration;

use miette::{IntoDiagnostic, WrapErr};
use serde::Serialize;
use tracing::debug;

use ltlf_logic::Formula;
use ltlf_mona::{
    BoundedSolver, EquivalenceMode, MonaBackend, MonaConfig, MonaProgram, MsoSolver, Verdict,
};

use crate::cli::{Cli, FormulaInput};
use crate::OutputFormat;

pub(crate) fn parse_output_format(raw: &str) -> miette::Result<OutputFormat> {
    match raw {
        "text" => Ok(OutputFormat::Text),
        "json" => Ok(OutputFormat::Json),
        other => miette::bail!("Unknown output format: {other}. Use 'text' or 'json'."),
    }
}

pub(crate) fn parse_equivalence_mode(raw: &str) -> miette::Result<EquivalenceMode> {
    match raw {
        "strong" => Ok(EquivalenceMode::Strong),
        "classical" => Ok(EquivalenceMode::Classical),
        other => miette::bail!("Unknown equivalence mode: {other}. Use 'strong' or 'classical'."),
    }
}

pub(crate) fn mona_config_from_cli(cli: &Cli) -> MonaConfig {
    let config = MonaConfig::default().with_command(&cli.mona);
    if cli.timeout == 0 {
        config.without_timeout()
    } else {
        config.with_timeout(Duration::from_secs(cli.timeout))
    }
}

/// Parse the formula named by `input`; syntax errors render with their span.
pub(crate) fn read_formula(input: &FormulaInput) -> miette::Result<Formula> {
    match (&input.formula, &input.file) {
        (_, Some(path)) => read_formula_file(path),
        (Some(text), None) => parse_formula(text, "<formula>"),
        (None, None) => miette::bail!("No formula given; pass it inline or with --file"),
    }
}

pub(crate) fn read_formula_file(path: &Path) -> miette::Result<Formula> {
    let source = std::fs::read_to_string(path)
        .into_diagnostic()
        .wrap_err_with(|| format!("Cannot read {}", path.display()))?;
    parse_formula(&source, &path.display().to_string())
}

pub(crate) fn parse_formula(source: &str, filename: &str) -> miette::Result<Formula> {
    let formula = ltlf_logic::parse(source, filename)?;
    debug!(%formula, labels = formula.find_labels().len(), "parsed formula");
    Ok(formula)
}

/// Decide `program` with MONA, or by enumeration when `bounded` is set.
pub(crate) fn decide(
    program: &MonaProgram,
    bounded: Option<usize>,
    mona: MonaConfig,
) -> miette::Result<Verdict> {
    match bounded {
        Some(max_len) => BoundedSolver::new(max_len).check(program).into_diagnostic(),
        None => MonaBackend::new(mona)
            .check(program)
            .into_diagnostic()
            .wrap_err("MONA could not decide the program"),
    }
}

pub(crate) fn solver_name(bounded: Option<usize>) -> String {
    match bounded {
        Some(max_len) => format!("bounded({max_len})"),
        None => "mona".to_string(),
    }
}

pub(crate) fn write_text_artifact(path: &Path, text: &str) -> miette::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .into_diagnostic()
            .wrap_err_with(|| format!("Cannot create {}", parent.display()))?;
    }
    std::fs::write(path, text)
        .into_diagnostic()
        .wrap_err_with(|| format!("Cannot write {}", path.display()))
}

pub(crate) fn print_json<T: Serialize>(report: &T) -> miette::Result<()> {
    let json = serde_json::to_string_pretty(report).into_diagnostic()?;
    println!("{json}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn output_formats() {
        assert_eq!(parse_output_format("text").unwrap(), OutputFormat::Text);
        assert_eq!(parse_output_format("json").unwrap(), OutputFormat::Json);
        assert!(parse_output_format("yaml").is_err());
    }

    #[test]
    fn equivalence_modes() {
        assert_eq!(parse_equivalence_mode("strong").unwrap(), EquivalenceMode::Strong);
        assert_eq!(
            parse_equivalence_mode("classical").unwrap(),
            EquivalenceMode::Classical
        );
        assert!(parse_equivalence_mode("weak").is_err());
    }

    #[test]
    fn zero_timeout_disables_it() {
        let cli = Cli::parse_from(["ltlf2mona", "--timeout", "0", "nnf", "a"]);
        assert_eq!(mona_config_from_cli(&cli).timeout, None);
        let cli = Cli::parse_from([
            "ltlf2mona",
            "--mona",
            "/opt/mona",
            "--timeout",
            "5",
            "nnf",
            "a",
        ]);
        let config = mona_config_from_cli(&cli);
        assert_eq!(config.timeout, Some(Duration::from_secs(5)));
        assert_eq!(config.command, std::path::PathBuf::from("/opt/mona"));
    }

    #[test]
    fn reads_inline_and_file_formulas() {
        let inline = FormulaInput {
            formula: Some("a U b".to_string()),
            file: None,
        };
        assert_eq!(
            read_formula(&inline).unwrap(),
            parse_formula("a U b", "t").unwrap()
        );

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f.ltlf");
        std::fs::write(&path, "G(req -> F grant)\n").unwrap();
        let from_file = FormulaInput {
            formula: None,
            file: Some(path),
        };
        assert!(read_formula(&from_file).is_ok());
    }

    #[test]
    fn syntax_errors_are_reported() {
        assert!(parse_formula("a U", "t").is_err());
    }

    #[test]
    fn bounded_decision() {
        let program = ltlf_mona::encode_program(&parse_formula("a & !a", "t").unwrap()).unwrap();
        assert_eq!(
            decide(&program, Some(2), MonaConfig::default()).unwrap(),
            Verdict::Unsatisfiable
        );
        assert_eq!(solver_name(Some(2)), "bounded(2)");
        assert_eq!(solver_name(None), "mona");
    }
}
