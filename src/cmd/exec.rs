/*!
`exec.rs`

Implements `proctor execute <PROC> [KEY=VALUE ...]` (alias `exec`).

The command itself is thin: the session logic (argument validation, submit,
log streaming) lives in `crate::execution`. Variables may start with `-`,
so everything after the proc name is captured; proctor's own flags
(`-h`, `-v`, `-q` and their long forms) are taken back out by
`ExecArgs::take_trailing_flags` before the session starts.

Example:
  proctor execute say-hello-world SAMPLE_ARG_ONE=any SAMPLE_ARG_TWO=variable
*/

use clap::Args;
use tracing::info;

use super::Outcome;
use crate::daemon::DaemonClient;
use crate::execution::{Orchestrator, SessionState};
use crate::printer::Printer;

/// CLI arguments for `proctor execute`
#[derive(Args, Debug)]
pub struct ExecArgs {
    /// Proc to execute
    #[arg(value_name = "PROC")]
    pub proc_name: Option<String>,

    /// Proc variables, KEY=VALUE (repeatable)
    #[arg(
        value_name = "KEY=VALUE",
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    pub variables: Vec<String>,
}

/// Flags typed after the proc name that belong to proctor, not the proc.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TrailingFlags {
    pub verbose: u8,
    pub quiet: bool,
    pub help: bool,
}

impl ExecArgs {
    /// Remove `-h/--help`, `-v...`/`--verbose` and `-q/--quiet` from the
    /// captured variables. Anything carrying `=` is a variable.
    pub fn take_trailing_flags(&mut self) -> TrailingFlags {
        let mut flags = TrailingFlags::default();
        self.variables.retain(|token| {
            match token.as_str() {
                "-h" | "--help" => flags.help = true,
                "-q" | "--quiet" => flags.quiet = true,
                "--verbose" => flags.verbose = flags.verbose.saturating_add(1),
                t if t.len() > 1 && t.starts_with('-') && t[1..].chars().all(|c| c == 'v') => {
                    let count = u8::try_from(t.len() - 1).unwrap_or(u8::MAX);
                    flags.verbose = flags.verbose.saturating_add(count);
                }
                _ => return true,
            }
            false
        });
        flags
    }
}

pub async fn execute_exec(
    args: &ExecArgs,
    client: &dyn DaemonClient,
    printer: &dyn Printer,
) -> Outcome {
    let session = Orchestrator::new(client, printer)
        .run(args.proc_name.as_deref(), &args.variables)
        .await;
    debug_assert!(session.state().is_terminal());
    info!(
        proc_name = session.proc_name(),
        handle = session.handle(),
        args = session.args().len(),
        history = ?session.history(),
        "execution session finished"
    );

    match session.state() {
        SessionState::Completed => Outcome::Success,
        _ => Outcome::Failure,
    }
}
