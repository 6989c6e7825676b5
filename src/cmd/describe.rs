/*!
`describe.rs`

Implements `proctor describe <PROC>` (alias `help`): show what a proc does
and which variables it expects, so the user can build an `execute` call.

JSON output (--json) is the proc's metadata object.
*/

use clap::Args;

use super::Outcome;
use crate::cmd::format::field_line;
use crate::daemon::DaemonClient;
use crate::printer::{Emphasis, Printer};
use crate::proc::{Metadata, find_by_name};

pub const USAGE_ERROR: &str = "Incorrect command. See `proctor describe --help` for usage";

/// CLI arguments for `proctor describe <PROC>`
#[derive(Args, Debug)]
pub struct DescribeArgs {
    /// Proc to describe
    #[arg(value_name = "PROC")]
    pub proc_name: Option<String>,

    /// Output JSON instead of human-readable text
    #[arg(long)]
    pub json: bool,
}

pub async fn execute_describe(
    args: &DescribeArgs,
    client: &dyn DaemonClient,
    printer: &dyn Printer,
) -> Outcome {
    let Some(name) = args
        .proc_name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
    else {
        printer.println(USAGE_ERROR, Emphasis::Error);
        return Outcome::Failure;
    };

    let procs = match client.list_procs().await {
        Ok(procs) => procs,
        Err(e) => {
            printer.println(&e.to_string(), Emphasis::Error);
            return Outcome::Failure;
        }
    };

    let Some(proc) = find_by_name(&procs, name) else {
        printer.println(&unsupported(name), Emphasis::Error);
        return Outcome::Failure;
    };

    if args.json {
        let value = serde_json::to_value(proc).unwrap_or(serde_json::Value::Null);
        printer.println(&super::to_json(&value), Emphasis::Normal);
    } else {
        print_description(proc, printer);
    }
    Outcome::Success
}

fn print_description(proc: &Metadata, printer: &dyn Printer) {
    printer.println(&field_line("Description", &proc.description), Emphasis::Normal);
    printer.println(&field_line("Contributors", &proc.contributors), Emphasis::Normal);
    printer.println(&field_line("Organization", &proc.organization), Emphasis::Normal);

    printer.println("\nArgs", Emphasis::Highlight);
    for arg in &proc.env_vars.args {
        printer.println(&field_line(&arg.name, &arg.description), Emphasis::Normal);
    }

    printer.println(&execute_hint(&proc.name), Emphasis::Success);
}

fn unsupported(name: &str) -> String {
    format!("Proctor doesn't support Proc `{name}`\nRun `proctor list` to view supported Procs")
}

fn execute_hint(name: &str) -> String {
    format!("\nTo {name}, run:\nproctor execute {name} ARG_ONE=foo ARG_TWO=bar")
}
