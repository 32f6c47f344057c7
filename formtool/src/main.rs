use std::{path::PathBuf, process::ExitCode};

use clap::{Parser, Subcommand};
use formtool::commands::{self, FormArgs};
use log::LevelFilter;

#[derive(Parser)]
#[command(name = "formtool", version, about = "JSON Schema form engine tools")]
struct Cli {
    /// More logging; repeat for more detail.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Print the data with every default filled in
    Defaults {
        #[command(flatten)]
        form: FormArgs,
        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the resolved field plan
    Plan {
        #[command(flatten)]
        form: FormArgs,
        /// Print the render tree as JSON
        #[arg(long)]
        json: bool,
    },
    /// Validate the data as a submit would
    Validate {
        #[command(flatten)]
        form: FormArgs,
        /// Print the errors as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the JSON Schema of the form config file
    ConfigSchema,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    match cli.cmd {
        Cmd::Defaults { form, output } => commands::defaults(&form, output).await?,
        Cmd::Plan { form, json } => commands::plan(&form, json).await?,
        Cmd::Validate { form, json } => {
            if !commands::validate(&form, json).await? {
                return Ok(ExitCode::FAILURE);
            }
        }
        Cmd::ConfigSchema => commands::config_schema()?,
    }
    Ok(ExitCode::SUCCESS)
}
