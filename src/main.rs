//! martcast entry point

use clap::Parser;
use martcast::cli::{cmd_info, cmd_preprocess, cmd_run, Cli, Commands};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "martcast=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            train,
            test,
            output,
            tune,
            search_iterations,
            cv_folds,
            reference_year,
            seed,
        } => {
            cmd_run(
                &train,
                test.as_deref(),
                &output,
                tune,
                search_iterations,
                cv_folds,
                reference_year,
                seed,
            )?;
        }
        Commands::Preprocess {
            data,
            output,
            reference_year,
        } => {
            cmd_preprocess(&data, &output, reference_year)?;
        }
        Commands::Info { data } => {
            cmd_info(&data)?;
        }
    }

    Ok(())
}
