/*!
`list.rs`

Implements `proctor list`: enumerate the procs proctord can run.

Human output:
  List of Procs:
  NAME             DESCRIPTION
  ---------------  -----------------------------
  say-hello-world  Prints hello to the world

  For detailed information of any proc, run:
  proctor describe <proc_name>

JSON output (--json):
{
  "status": "ok",
  "count": 1,
  "procs": [ { ...metadata... } ]
}
*/

use clap::Args;
use tracing::debug;

use super::Outcome;
use crate::cmd::format::{StyleOptions, table};
use crate::daemon::DaemonClient;
use crate::printer::{Emphasis, Printer};

pub const HEADER: &str = "List of Procs:";
pub const DESCRIBE_HINT: &str =
    "\nFor detailed information of any proc, run:\nproctor describe <proc_name>";

/// CLI arguments for `proctor list`
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Output JSON instead of human-readable text
    #[arg(long)]
    pub json: bool,
}

/// Entry point for the list subcommand.
pub async fn execute_list(
    args: &ListArgs,
    client: &dyn DaemonClient,
    printer: &dyn Printer,
) -> Outcome {
    let procs = match client.list_procs().await {
        Ok(procs) => procs,
        Err(e) => {
            printer.println(&e.to_string(), Emphasis::Error);
            return Outcome::Failure;
        }
    };
    debug!(count = procs.len(), "fetched proc list");

    if args.json {
        let value = serde_json::json!({
            "status": "ok",
            "count": procs.len(),
            "procs": procs,
        });
        printer.println(&super::to_json(&value), Emphasis::Normal);
        return Outcome::Success;
    }

    printer.println(HEADER, Emphasis::Success);
    let rows: Vec<Vec<String>> = procs
        .iter()
        .map(|p| vec![p.name.clone(), p.description.replace('\n', " ")])
        .collect();
    printer.println(
        &table(&["NAME", "DESCRIPTION"], &rows, &StyleOptions::detect()),
        Emphasis::Normal,
    );
    printer.println(DESCRIBE_HINT, Emphasis::Highlight);
    Outcome::Success
}
