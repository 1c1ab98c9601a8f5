use clap::Parser;
use serde::Serialize;

use crate::runtime::AppContext;

use super::types::{AlgorithmsCommand, Cli, Commands, SessionCheck};

fn print_json<T: Serialize>(value: &T) -> Result<(), String> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).map_err(|error| error.to_string())?
    );
    Ok(())
}

pub fn run_cli() -> Result<(), String> {
    let cli = Cli::parse();
    crate::init_logging(cli.verbose)?;
    let app = AppContext::new();

    match cli.command {
        Commands::Run { session, report } => {
            let spec = app
                .session_service()
                .load_spec(&session)
                .map_err(|error| error.to_string())?;
            let session_report = app
                .session_service()
                .run(&spec)
                .map_err(|error| error.to_string())?;
            if let Some(report_path) = report {
                app.session_service()
                    .save_report(report_path, &session_report)
                    .map_err(|error| error.to_string())?;
            }
            print_json(&session_report)?;
        }
        Commands::Check { session } => {
            let spec = app
                .session_service()
                .check(&session)
                .map_err(|error| error.to_string())?;
            print_json(&SessionCheck {
                status: "ok",
                name: spec.name.clone(),
                algorithm: spec.tool.algorithm.name().to_string(),
                shape: spec.reference.shape.clone(),
                time_steps: spec.reference.time_steps,
                steps: spec.steps.iter().map(|step| step.name()).collect(),
            })?;
        }
        Commands::Algorithms { command } => match command {
            AlgorithmsCommand::List => print_json(&app.algorithm_service().list())?,
        },
    }

    Ok(())
}
