//! complib - personal component library
//!
//! Browse, search, preview, copy, edit and delete UI components stored in a
//! hosted backend, from the terminal.

use anyhow::Result;
use clap::{Parser, Subcommand};
use complib_logging::{init_logging, LogConfig};
use std::process::ExitCode;
use tracing::error;

mod cli;

#[derive(Parser, Debug)]
#[command(name = "complib", about = "Personal component library", version)]
struct Cli {
    /// Enable verbose logging (info/debug to stderr)
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    /// Backend project URL (selects the supabase backend)
    #[arg(long, env = "COMPLIB_BACKEND_URL", global = true, hide_env_values = true)]
    backend_url: Option<String>,

    /// Backend public API key
    #[arg(long, env = "COMPLIB_API_KEY", global = true, hide_env_values = true)]
    api_key: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Open the interactive catalog (default)
    Tui {
        #[command(flatten)]
        args: cli::tui::TuiArgs,
    },

    /// Show resolved paths and backend settings
    Config {
        #[command(flatten)]
        args: cli::config::ConfigArgs,
    },
}

fn run_command(cli: Cli) -> Result<()> {
    let mut settings = cli::config::load()?.backend;
    settings.apply_overrides(cli.backend_url, cli.api_key);

    match cli.command.unwrap_or(Commands::Tui {
        args: cli::tui::TuiArgs::default(),
    }) {
        Commands::Config { args } => cli::config::run(args, &settings),
        Commands::Tui { args } => {
            let gateway = settings.build_gateway()?;
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?;
            runtime.block_on(cli::tui::run(args, gateway))
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let is_tui_mode = !matches!(cli.command, Some(Commands::Config { .. }));

    if let Err(err) = init_logging(LogConfig {
        app_name: "complib",
        verbose: cli.verbose,
        tui_mode: is_tui_mode,
    }) {
        eprintln!("warning: logging disabled: {:#}", err);
    }

    match run_command(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "command failed");
            eprintln!("{}", err);
            ExitCode::from(1)
        }
    }
}
