/*!
Subcommand dispatcher module.

Layout:
  src/cmd/
    mod.rs       (this file: declarations, re-exports, Outcome)
    list.rs      (ListArgs     + execute_list)
    describe.rs  (DescribeArgs + execute_describe)
    exec.rs      (ExecArgs     + execute_exec)
    format.rs    (color / table / field helpers)

Conventions:
  - Each subcommand module exposes one public `execute_*` entry point taking
    its clap args, a `DaemonClient` and a `Printer`.
  - Errors are reported to the user where they happen; entry points only
    return an `Outcome` so `main` can pick the exit status.
*/

pub mod describe;
pub mod exec;
pub mod format;
pub mod list;

use std::process::ExitCode;

pub use describe::{DescribeArgs, execute_describe};
pub use exec::{ExecArgs, TrailingFlags, execute_exec};
pub use list::{ListArgs, execute_list};

/// How a command finished. Failures have already been shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure,
}

impl From<Outcome> for ExitCode {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Success => ExitCode::SUCCESS,
            Outcome::Failure => ExitCode::FAILURE,
        }
    }
}

/// Pretty JSON for machine output, compact if pretty-printing fails.
pub(crate) fn to_json(value: &serde_json::Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}
