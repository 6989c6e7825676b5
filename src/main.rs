use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};

mod cmd;
mod config;
mod daemon;
mod execution;
mod printer;
mod proc;
mod utils;

use cmd::{DescribeArgs, ExecArgs, ListArgs, Outcome, TrailingFlags};
use config::ConfigStore;
use daemon::{DaemonClient, HttpDaemonClient};
use printer::{Emphasis, Printer, TerminalPrinter};

/// Proctor - discover, describe and execute procs on proctord
///
/// Commands:
///   proctor list                                  procs proctord can run
///   proctor describe <PROC>                       what a proc does + its variables
///   proctor execute <PROC> [KEY=VALUE ...]        run a proc and stream its logs
///
/// Configuration (environment wins over file):
///   PROCTOR_HOST, EMAIL_ID, ACCESS_TOKEN          mandatory
///   CONNECTION_TIMEOUT_SECS                       optional, default 10
///   file: ~/.proctor/proctor.yaml  (/tmp/proctor.yaml when ENVIRONMENT=test)
///
/// Global flags:
///   -v / -vv / -vvv   Increase diagnostic verbosity (stderr)
///   -q / --quiet      Errors only
///
/// Examples:
///   proctor list
///   proctor describe say-hello-world
///   proctor execute say-hello-world SAMPLE_ARG_ONE=any SAMPLE_ARG_TWO=variable
#[derive(Parser, Debug)]
#[command(
    name = "proctor",
    version,
    author,
    about = "Proctor - discover, describe and execute procs on proctord",
    propagate_version = true,
    disable_help_subcommand = true
)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Silence all diagnostics except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List procs available for execution
    List(ListArgs),

    /// Describe a proc, list help for variables and constants
    #[command(visible_alias = "help")]
    Describe(DescribeArgs),

    /// Execute a proc with arguments given
    #[command(
        visible_alias = "exec",
        long_about = "To execute a proc, this command helps communicate with `proctord` and streams to logs of proc in execution"
    )]
    Execute(ExecArgs),
}

fn main() -> ExitCode {
    let mut cli = Cli::parse();
    if take_trailing_flags(&mut cli).help {
        let mut command = Cli::command();
        command.build();
        if let Some(execute) = command.find_subcommand_mut("execute") {
            let _ = execute.print_long_help();
        }
        return ExitCode::SUCCESS;
    }
    utils::init_logging(utils::derive_level(cli.verbose, cli.quiet));

    let printer: Arc<dyn Printer> = Arc::new(TerminalPrinter::new());
    match run(cli.command, Arc::clone(&printer)) {
        Ok(outcome) => outcome.into(),
        Err(e) => {
            printer.println(&format!("{e:#}"), Emphasis::Error);
            ExitCode::FAILURE
        }
    }
}

/// Fold flags typed after `execute <PROC>` back into the global ones.
fn take_trailing_flags(cli: &mut Cli) -> TrailingFlags {
    let Commands::Execute(args) = &mut cli.command else {
        return TrailingFlags::default();
    };
    let flags = args.take_trailing_flags();
    cli.verbose = cli.verbose.saturating_add(flags.verbose);
    cli.quiet |= flags.quiet;
    flags
}

fn run(command: Commands, printer: Arc<dyn Printer>) -> Result<Outcome> {
    let config = match ConfigStore::from_process_env().load_config() {
        Ok(config) => config,
        Err(e) => {
            printer.println(&e.root_cause().to_string(), Emphasis::Error);
            printer.println(e.message(), Emphasis::Success);
            printer.println(
                "Encountered error while loading config, exiting.",
                Emphasis::Error,
            );
            return Ok(Outcome::Failure);
        }
    };

    let client = HttpDaemonClient::new(&config, Arc::clone(&printer))
        .context("Failed to set up proctord client")?;
    let rt = tokio::runtime::Runtime::new().context("Failed to create Tokio runtime")?;

    Ok(rt.block_on(dispatch(&command, &client, printer.as_ref())))
}

async fn dispatch(command: &Commands, client: &dyn DaemonClient, printer: &dyn Printer) -> Outcome {
    match command {
        Commands::List(args) => cmd::execute_list(args, client, printer).await,
        Commands::Describe(args) => cmd::execute_describe(args, client, printer).await,
        Commands::Execute(args) => cmd::execute_exec(args, client, printer).await,
    }
}
