//! Drives one `proctor execute` run from user input to a terminal state.
//!
//! ```text
//! Idle -> Validating -> Submitting -> Streaming -> Completed
//!             |             |             |
//!             +-------------+-------------+-----> Failed
//! ```
//!
//! Phases run strictly in order and nothing is retried: execution is submitted
//! once, and the log stream is only attached after submission succeeded.

pub mod args;

use tracing::{debug, info, trace, warn};

use crate::cmd::format::field_line;
use crate::daemon::DaemonClient;
use crate::printer::{Emphasis, Printer};
use args::{ArgumentMap, parse_args, parse_token};

pub const USAGE_ERROR: &str = "Incorrect command. See `proctor execute --help` for usage";
pub const NO_VARIABLES: &str = "With No Variables";
pub const WITH_VARIABLES: &str = "With Variables";
/// Label of a malformed-token line; padded like a field label, so it sits on
/// its own between blank lines.
pub const INCORRECT_FORMAT: &str = "\nIncorrect variable format\n";
pub const SUBMITTED: &str = "Proc execution successful. \nStreaming logs:";
pub const STREAM_FAILED: &str = "Error Streaming Logs";
pub const STREAM_COMPLETED: &str = "Log stream of proc completed.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Validating,
    Submitting,
    Streaming,
    Completed,
    Failed,
}

impl SessionState {
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionState::Completed | SessionState::Failed)
    }
}

/// One user-initiated run and the states it went through.
#[derive(Debug, Clone)]
pub struct ExecutionSession {
    proc_name: String,
    args: ArgumentMap,
    handle: Option<String>,
    history: Vec<SessionState>,
}

impl ExecutionSession {
    fn new() -> Self {
        Self {
            proc_name: String::new(),
            args: ArgumentMap::new(),
            handle: None,
            history: vec![SessionState::Idle],
        }
    }

    fn transition(&mut self, next: SessionState) {
        trace!(from = ?self.state(), to = ?next, "session transition");
        self.history.push(next);
    }

    pub fn state(&self) -> SessionState {
        self.history
            .last()
            .copied()
            .unwrap_or(SessionState::Idle)
    }

    pub fn history(&self) -> &[SessionState] {
        &self.history
    }

    pub fn proc_name(&self) -> &str {
        &self.proc_name
    }

    pub fn args(&self) -> &ArgumentMap {
        &self.args
    }

    /// Execution handle returned by proctord, once submitted.
    pub fn handle(&self) -> Option<&str> {
        self.handle.as_deref()
    }
}

pub struct Orchestrator<'a> {
    client: &'a dyn DaemonClient,
    printer: &'a dyn Printer,
}

impl<'a> Orchestrator<'a> {
    pub fn new(client: &'a dyn DaemonClient, printer: &'a dyn Printer) -> Self {
        Self { client, printer }
    }

    /// Run a single session. Failures are reported through the printer and
    /// leave the session in [`SessionState::Failed`]; nothing propagates.
    pub async fn run(&self, proc_name: Option<&str>, tokens: &[String]) -> ExecutionSession {
        let mut session = ExecutionSession::new();
        session.transition(SessionState::Validating);

        let Some(name) = proc_name.map(str::trim).filter(|n| !n.is_empty()) else {
            self.printer.println(USAGE_ERROR, Emphasis::Error);
            session.transition(SessionState::Failed);
            return session;
        };
        session.proc_name = name.to_string();

        self.printer
            .println(&field_line("Executing Proc", name), Emphasis::Normal);
        self.report_arguments(tokens);
        let parsed = parse_args(tokens);
        debug!(
            args = parsed.args.len(),
            malformed = parsed.malformed.len(),
            "parsed proc variables"
        );
        session.args = parsed.args;

        session.transition(SessionState::Submitting);
        let handle = match self.client.execute_proc(name, &session.args).await {
            Ok(handle) => handle,
            Err(e) => {
                warn!(proc_name = name, error = %e, "proc execution failed");
                self.printer.println(&e.to_string(), Emphasis::Error);
                session.transition(SessionState::Failed);
                return session;
            }
        };
        info!(proc_name = name, handle = %handle, "proc submitted");
        self.printer.println(SUBMITTED, Emphasis::Success);

        session.transition(SessionState::Streaming);
        let streamed = self.client.stream_proc_logs(&handle).await;
        session.handle = Some(handle);

        match streamed {
            Ok(()) => {
                self.printer.println(STREAM_COMPLETED, Emphasis::Success);
                session.transition(SessionState::Completed);
            }
            Err(e) => {
                // Users only get the generic message; -v shows the cause.
                debug!(error = %e, "log streaming failed");
                self.printer.println(STREAM_FAILED, Emphasis::Error);
                session.transition(SessionState::Failed);
            }
        }
        session
    }

    /// One line per token, in the order given.
    fn report_arguments(&self, tokens: &[String]) {
        if tokens.is_empty() {
            self.printer.println(NO_VARIABLES, Emphasis::Normal);
            return;
        }
        self.printer.println(WITH_VARIABLES, Emphasis::Highlight);
        for token in tokens {
            match parse_token(token) {
                Ok((key, value)) => self
                    .printer
                    .println(&field_line(key, value), Emphasis::Normal),
                Err(bad) => self.printer.println(
                    &field_line(INCORRECT_FORMAT, bad.token()),
                    Emphasis::Warning,
                ),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::daemon::DaemonError;
    use crate::daemon::testing::{Call, DEFAULT_HANDLE, FakeDaemonClient};
    use crate::printer::testing::RecordingPrinter;

    fn tokens(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    fn map(pairs: &[(&str, &str)]) -> ArgumentMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[tokio::test]
    async fn executes_and_streams_with_arguments() {
        let client = FakeDaemonClient::new().with_execution(Ok("h1".into()));
        let printer = RecordingPrinter::default();

        let session = Orchestrator::new(&client, &printer)
            .run(Some("say-hello-world"), &tokens(&["A=1", "B=2"]))
            .await;

        assert_eq!(
            client.calls(),
            vec![
                Call::ExecuteProc {
                    name: "say-hello-world".into(),
                    args: map(&[("A", "1"), ("B", "2")]),
                },
                Call::StreamProcLogs {
                    handle: "h1".into()
                },
            ]
        );
        assert_eq!(session.state(), SessionState::Completed);
        assert_eq!(
            session.history(),
            &[
                SessionState::Idle,
                SessionState::Validating,
                SessionState::Submitting,
                SessionState::Streaming,
                SessionState::Completed,
            ]
        );
        assert_eq!(session.handle(), Some("h1"));

        assert_eq!(
            printer.lines(),
            vec![
                (
                    field_line("Executing Proc", "say-hello-world"),
                    Emphasis::Normal
                ),
                (WITH_VARIABLES.to_string(), Emphasis::Highlight),
                (field_line("A", "1"), Emphasis::Normal),
                (field_line("B", "2"), Emphasis::Normal),
                (SUBMITTED.to_string(), Emphasis::Success),
                (STREAM_COMPLETED.to_string(), Emphasis::Success),
            ]
        );
    }

    #[tokio::test]
    async fn no_tokens_submits_empty_map_after_notice() {
        let client = FakeDaemonClient::new();
        let printer = RecordingPrinter::default();

        let session = Orchestrator::new(&client, &printer)
            .run(Some("say-hello-world"), &[])
            .await;

        assert_eq!(
            client.calls()[0],
            Call::ExecuteProc {
                name: "say-hello-world".into(),
                args: ArgumentMap::new(),
            }
        );
        let messages = printer.messages();
        let notice = messages.iter().position(|m| m == NO_VARIABLES).unwrap();
        let submitted = messages.iter().position(|m| m == SUBMITTED).unwrap();
        assert!(notice < submitted);
        assert!(printer.contains(NO_VARIABLES, Emphasis::Normal));
        assert_eq!(session.state(), SessionState::Completed);
    }

    #[tokio::test]
    async fn malformed_tokens_are_reported_but_not_fatal() {
        let client = FakeDaemonClient::new();
        let printer = RecordingPrinter::default();

        let session = Orchestrator::new(&client, &printer)
            .run(
                Some("say-hello-world"),
                &tokens(&["A=1", "incorrect-format", "B=2"]),
            )
            .await;

        let lines = printer.lines();
        assert_eq!(
            lines[1..5],
            [
                (WITH_VARIABLES.to_string(), Emphasis::Highlight),
                (field_line("A", "1"), Emphasis::Normal),
                (
                    field_line(INCORRECT_FORMAT, "incorrect-format"),
                    Emphasis::Warning
                ),
                (field_line("B", "2"), Emphasis::Normal),
            ]
        );
        assert!(lines[3].0.starts_with("\nIncorrect variable format\n"));
        assert_eq!(
            client.calls()[0],
            Call::ExecuteProc {
                name: "say-hello-world".into(),
                args: map(&[("A", "1"), ("B", "2")]),
            }
        );
        assert_eq!(session.state(), SessionState::Completed);
    }

    #[tokio::test]
    async fn missing_proc_name_is_a_usage_failure() {
        let client = FakeDaemonClient::new();
        let printer = RecordingPrinter::default();
        let orchestrator = Orchestrator::new(&client, &printer);

        let session = orchestrator.run(None, &[]).await;
        assert_eq!(session.state(), SessionState::Failed);
        assert_eq!(
            session.history(),
            &[
                SessionState::Idle,
                SessionState::Validating,
                SessionState::Failed
            ]
        );

        let blank = orchestrator.run(Some("  "), &tokens(&["A=1"])).await;
        assert_eq!(blank.state(), SessionState::Failed);

        assert!(client.calls().is_empty());
        assert_eq!(
            printer.lines(),
            vec![
                (USAGE_ERROR.to_string(), Emphasis::Error),
                (USAGE_ERROR.to_string(), Emphasis::Error),
            ]
        );
    }

    #[tokio::test]
    async fn execution_failure_never_streams() {
        let client = FakeDaemonClient::new().with_execution(Err(DaemonError::Server {
            status: 500,
            body: "test error".into(),
        }));
        let printer = RecordingPrinter::default();

        let session = Orchestrator::new(&client, &printer)
            .run(Some("say-hello-world"), &[])
            .await;

        assert_eq!(session.state(), SessionState::Failed);
        assert!(session.handle().is_none());
        assert!(
            !client
                .calls()
                .iter()
                .any(|c| matches!(c, Call::StreamProcLogs { .. }))
        );
        assert!(printer.contains(
            "Server Error!!!\nStatus Code: 500, test error",
            Emphasis::Error
        ));
        assert!(!printer.messages().iter().any(|m| m == SUBMITTED));
    }

    #[tokio::test]
    async fn streaming_failure_reports_generic_message() {
        let client = FakeDaemonClient::new()
            .with_stream(Err(DaemonError::Stream("socket reset".into())));
        let printer = RecordingPrinter::default();

        let session = Orchestrator::new(&client, &printer)
            .run(Some("say-hello-world"), &[])
            .await;

        assert_eq!(session.state(), SessionState::Failed);
        assert_eq!(session.handle(), Some(DEFAULT_HANDLE));
        assert_eq!(
            client.calls()[1],
            Call::StreamProcLogs {
                handle: DEFAULT_HANDLE.into()
            }
        );
        assert!(printer.contains(STREAM_FAILED, Emphasis::Error));
        assert!(!printer.messages().iter().any(|m| m.contains("socket reset")));
        assert!(!printer.messages().iter().any(|m| m == STREAM_COMPLETED));
    }

    #[test]
    fn terminal_states() {
        assert!(SessionState::Completed.is_terminal());
        assert!(SessionState::Failed.is_terminal());
        assert!(!SessionState::Streaming.is_terminal());
    }
}
