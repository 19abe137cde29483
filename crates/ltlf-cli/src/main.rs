mod cli;
mod commands;
mod types;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use commands::helpers::{mona_config_from_cli, parse_output_format};
pub(crate) use types::OutputFormat;

fn main() -> miette::Result<()> {
    // Logs go to stderr so that programs printed on stdout can be piped to mona.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let format = parse_output_format(&cli.format)?;
    let mona = mona_config_from_cli(&cli);

    match cli.command {
        Commands::Encode { input, out } => {
            commands::encode::run_encode_command(&input, out, false, format)?;
        }
        Commands::Equilibrium { input, out } => {
            commands::encode::run_encode_command(&input, out, true, format)?;
        }
        Commands::Nnf { input } => {
            commands::transform::run_transform_command(
                &input,
                commands::transform::Transform::Nnf,
                format,
            )?;
        }
        Commands::Negate { input } => {
            commands::transform::run_transform_command(
                &input,
                commands::transform::Transform::Negate,
                format,
            )?;
        }
        Commands::Clausify { input } => {
            commands::transform::run_clausify_command(&input, format)?;
        }
        Commands::Check {
            input,
            equilibrium,
            bounded,
        } => {
            commands::check::run_check_command(&input, equilibrium, bounded, mona, format)?;
        }
        Commands::Equivalence {
            formulas,
            left_file,
            right_file,
            mode,
            emit,
            bounded,
        } => {
            let (lhs, rhs) = commands::equivalence::read_sides(
                &formulas,
                left_file.as_deref(),
                right_file.as_deref(),
            )?;
            commands::equivalence::run_equivalence_command(
                &lhs, &rhs, &mode, emit, bounded, mona, format,
            )?;
        }
    }

    Ok(())
}
