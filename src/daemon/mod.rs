//! Client side of the proctord API.
//!
//! [`DaemonClient`] is the seam the commands depend on; [`HttpDaemonClient`]
//! is the real implementation (HTTP for metadata/execution, WebSocket for the
//! log stream).

use async_trait::async_trait;
use thiserror::Error;

use crate::execution::args::ArgumentMap;
use crate::proc::Metadata;

mod client;

pub use client::HttpDaemonClient;

/// Failures talking to proctord. `Display` is what the user gets to see.
#[derive(Debug, Error)]
pub enum DaemonError {
    #[error(
        "Unauthorized Access!!!\nPlease check the EMAIL_ID and ACCESS_TOKEN validity in proctor config file."
    )]
    Unauthorized,

    #[error(
        "Connection timeout!!!\nPlease check your Internet/VPN connection for connectivity to ProctorD."
    )]
    Timeout,

    #[error("Unable to reach ProctorD at {host}: {reason}")]
    Unreachable { host: String, reason: String },

    #[error("Invalid ProctorD host `{0}`")]
    InvalidHost(String),

    #[error("Server Error!!!\nStatus Code: {status}, {body}")]
    Server { status: u16, body: String },

    #[error("Unexpected response from ProctorD: {0}")]
    Decode(String),

    #[error("Log stream interrupted: {0}")]
    Stream(String),
}

#[async_trait]
pub trait DaemonClient: Send + Sync {
    /// Metadata for every proc proctord knows how to run.
    async fn list_procs(&self) -> Result<Vec<Metadata>, DaemonError>;

    /// Submit a run and return its execution handle.
    async fn execute_proc(&self, name: &str, args: &ArgumentMap) -> Result<String, DaemonError>;

    /// Attach to the log stream of a submitted run, printing lines as they
    /// arrive. Resolves once proctord closes the stream.
    async fn stream_proc_logs(&self, handle: &str) -> Result<(), DaemonError>;
}

#[cfg(test)]
pub mod testing {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::{DaemonClient, DaemonError};
    use crate::execution::args::ArgumentMap;
    use crate::proc::Metadata;

    pub const DEFAULT_HANDLE: &str = "executed-proc-name";

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Call {
        ListProcs,
        ExecuteProc { name: String, args: ArgumentMap },
        StreamProcLogs { handle: String },
    }

    /// Scripted client. Each preset answer is used once; afterwards calls fall
    /// back to success (empty proc list, `DEFAULT_HANDLE`, clean stream end).
    #[derive(Debug, Default)]
    pub struct FakeDaemonClient {
        procs: Mutex<Option<Result<Vec<Metadata>, DaemonError>>>,
        execution: Mutex<Option<Result<String, DaemonError>>>,
        stream: Mutex<Option<Result<(), DaemonError>>>,
        calls: Mutex<Vec<Call>>,
    }

    impl FakeDaemonClient {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_procs(self, result: Result<Vec<Metadata>, DaemonError>) -> Self {
            *self.procs.lock().unwrap() = Some(result);
            self
        }

        pub fn with_execution(self, result: Result<String, DaemonError>) -> Self {
            *self.execution.lock().unwrap() = Some(result);
            self
        }

        pub fn with_stream(self, result: Result<(), DaemonError>) -> Self {
            *self.stream.lock().unwrap() = Some(result);
            self
        }

        pub fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: Call) {
            self.calls.lock().unwrap().push(call);
        }
    }

    #[async_trait]
    impl DaemonClient for FakeDaemonClient {
        async fn list_procs(&self) -> Result<Vec<Metadata>, DaemonError> {
            self.record(Call::ListProcs);
            self.procs.lock().unwrap().take().unwrap_or(Ok(Vec::new()))
        }

        async fn execute_proc(
            &self,
            name: &str,
            args: &ArgumentMap,
        ) -> Result<String, DaemonError> {
            self.record(Call::ExecuteProc {
                name: name.to_string(),
                args: args.clone(),
            });
            self.execution
                .lock()
                .unwrap()
                .take()
                .unwrap_or_else(|| Ok(DEFAULT_HANDLE.to_string()))
        }

        async fn stream_proc_logs(&self, handle: &str) -> Result<(), DaemonError> {
            self.record(Call::StreamProcLogs {
                handle: handle.to_string(),
            });
            self.stream.lock().unwrap().take().unwrap_or(Ok(()))
        }
    }
}
