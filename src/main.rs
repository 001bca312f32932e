//! regbench - Main Entry Point

use clap::Parser;
use regbench::cli::{cmd_models, cmd_run, Cli, Commands, RunArgs};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "regbench=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            data,
            target,
            categorical,
            test_fraction,
            seed,
            config,
            output,
            importance_output,
            parallel,
            no_scale,
        } => {
            let args = RunArgs {
                target,
                categorical,
                test_fraction,
                seed,
                config,
                output,
                importance_output,
                parallel,
                no_scale,
            };
            cmd_run(&data, args)?;
        }
        Commands::Models => cmd_models()?,
    }

    Ok(())
}
