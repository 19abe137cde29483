//! CLI argument definitions: top-level `Cli` struct and `Commands` enum.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

pub(crate) const CLI_LONG_ABOUT: &str =
    "Translate LTLf/PLTLf formulas into MONA (M2L-Str) programs and decide them.\n\n\
    Typical use:\n  \
    1. ltlf2mona encode 'G(req -> F grant)' > response.mona\n  \
    2. mona -q response.mona\n\n\
    Or let ltlf2mona run MONA itself:\n  \
    - ltlf2mona check 'G(req -> F grant) & F G req'\n  \
    - ltlf2mona equivalence 'F a' 'true U a'\n\n\
    Use --bounded N on check/equivalence to decide by enumerating strings up to\n\
    length N instead of running MONA.";

#[derive(Parser)]
#[command(name = "ltlf2mona")]
#[command(about = "Translate LTLf/PLTLf formulas into MONA programs")]
#[command(long_about = CLI_LONG_ABOUT)]
#[command(version)]
pub(crate) struct Cli {
    /// MONA executable
    #[arg(long, global = true, env = "LTLF_MONA", default_value = "mona")]
    pub(crate) mona: PathBuf,

    /// Seconds before MONA is killed (0 disables the timeout)
    #[arg(long, global = true, default_value_t = 30)]
    pub(crate) timeout: u64,

    /// Output format: text | json
    #[arg(long, global = true, default_value = "text")]
    pub(crate) format: String,

    #[command(subcommand)]
    pub(crate) command: Commands,
}

/// A formula given inline or read from a file.
#[derive(Args, Debug, Clone)]
pub(crate) struct FormulaInput {
    /// Formula text, e.g. 'G(req -> F grant)'
    #[arg(required_unless_present = "file", conflicts_with = "file")]
    pub(crate) formula: Option<String>,

    /// Read the formula from this file
    #[arg(long, short = 'f')]
    pub(crate) file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Print the MONA program whose models are the traces satisfying the formula
    Encode {
        #[command(flatten)]
        input: FormulaInput,

        /// Write the program to this file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Print the MONA program whose models are the formula's temporal equilibrium models
    Equilibrium {
        #[command(flatten)]
        input: FormulaInput,

        /// Write the program to this file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Rewrite the formula into negation normal form
    Nnf {
        #[command(flatten)]
        input: FormulaInput,
    },

    /// Push a negation through the formula
    Negate {
        #[command(flatten)]
        input: FormulaInput,
    },

    /// Flatten the formula into shared fresh-variable definitions
    Clausify {
        #[command(flatten)]
        input: FormulaInput,
    },

    /// Decide whether the formula has a model
    Check {
        #[command(flatten)]
        input: FormulaInput,

        /// Look for temporal equilibrium models instead of plain models
        #[arg(long, default_value_t = false)]
        equilibrium: bool,

        /// Enumerate strings up to this length instead of running MONA
        #[arg(long)]
        bounded: Option<usize>,
    },

    /// Decide whether two formulas are equivalent
    ///
    /// Formulas given inline fill the sides that have no file, left first.
    Equivalence {
        /// Left and right formula text
        #[arg(value_name = "FORMULA", num_args = 0..=2)]
        formulas: Vec<String>,

        /// Read the left formula from this file
        #[arg(long)]
        left_file: Option<PathBuf>,

        /// Read the right formula from this file
        #[arg(long)]
        right_file: Option<PathBuf>,

        /// Equivalence notion: strong | classical
        #[arg(long, default_value = "strong")]
        mode: String,

        /// Print the program instead of deciding it
        #[arg(long, default_value_t = false)]
        emit: bool,

        /// Enumerate strings up to this length instead of running MONA
        #[arg(long, conflicts_with = "emit")]
        bounded: Option<usize>,
    },
}
