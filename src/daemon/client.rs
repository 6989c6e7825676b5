//! HTTP + WebSocket implementation of [`DaemonClient`].
//!
//! Endpoints (relative to `PROCTOR_HOST`, `http://` assumed when no scheme is
//! given):
//!   GET  /jobs/metadata            -> 200, [Metadata]
//!   POST /jobs/execute  ToExecute  -> 201, ToExecute (name = execution handle)
//!   WS   /jobs/logs?job_name=<h>   -> log frames until a normal close
//!
//! Every request carries the `Email-Id` and `Access-Token` headers.
//! A zero connection timeout disables the limit.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::StatusCode;
use tokio::time::timeout;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Error as WsError;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tracing::{debug, trace};
use url::Url;

use super::{DaemonClient, DaemonError};
use crate::config::Config;
use crate::execution::args::ArgumentMap;
use crate::printer::{Emphasis, Printer};
use crate::proc::{Metadata, ToExecute};

const EMAIL_HEADER: &str = "Email-Id";
const ACCESS_TOKEN_HEADER: &str = "Access-Token";

const METADATA_PATH: &str = "/jobs/metadata";
const EXECUTE_PATH: &str = "/jobs/execute";
const LOGS_PATH: &str = "/jobs/logs";

pub struct HttpDaemonClient {
    http: reqwest::Client,
    base: Url,
    host: String,
    email: String,
    access_token: String,
    connect_timeout: Option<Duration>,
    printer: Arc<dyn Printer>,
}

impl std::fmt::Debug for HttpDaemonClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpDaemonClient")
            .field("base", &self.base.as_str())
            .field("email", &self.email)
            .field("connect_timeout", &self.connect_timeout)
            .finish_non_exhaustive()
    }
}

impl HttpDaemonClient {
    /// Build a client for the proctord named in `config`. Log lines from
    /// `stream_proc_logs` are written through `printer`.
    pub fn new(config: &Config, printer: Arc<dyn Printer>) -> Result<Self, DaemonError> {
        let base = base_url(&config.host)?;
        let connect_timeout = time_limit(config.connection_timeout);
        let mut builder = reqwest::Client::builder();
        if let Some(limit) = connect_timeout {
            builder = builder.timeout(limit);
        }
        let http = builder
            .build()
            .map_err(|e| DaemonError::Unreachable {
                host: config.host.clone(),
                reason: e.to_string(),
            })?;

        debug!(base = %base, timeout = ?config.connection_timeout, "proctord client ready");

        Ok(Self {
            http,
            base,
            host: config.host.clone(),
            email: config.email.clone(),
            access_token: config.access_token.clone(),
            connect_timeout,
            printer,
        })
    }

    fn endpoint(&self, path: &str) -> Url {
        let mut url = self.base.clone();
        url.set_path(path);
        url
    }

    fn logs_url(&self, handle: &str) -> Result<Url, DaemonError> {
        let mut url = self.endpoint(LOGS_PATH);
        let scheme = if self.base.scheme() == "https" {
            "wss"
        } else {
            "ws"
        };
        url.set_scheme(scheme)
            .map_err(|()| DaemonError::InvalidHost(self.host.clone()))?;
        url.query_pairs_mut().append_pair("job_name", handle);
        Ok(url)
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header(EMAIL_HEADER, &self.email)
            .header(ACCESS_TOKEN_HEADER, &self.access_token)
    }

    fn transport_error(&self, err: &reqwest::Error) -> DaemonError {
        if err.is_timeout() {
            DaemonError::Timeout
        } else {
            DaemonError::Unreachable {
                host: self.host.clone(),
                reason: err.to_string(),
            }
        }
    }

    async fn expect_status(
        response: reqwest::Response,
        expected: StatusCode,
    ) -> Result<reqwest::Response, DaemonError> {
        let status = response.status();
        if status == expected {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(status_error(status.as_u16(), &body))
    }

    fn handshake_error(&self, err: WsError) -> DaemonError {
        match err {
            WsError::Http(response) => {
                let body = response
                    .body()
                    .as_deref()
                    .map(String::from_utf8_lossy)
                    .unwrap_or_default();
                status_error(response.status().as_u16(), &body)
            }
            other => DaemonError::Unreachable {
                host: self.host.clone(),
                reason: other.to_string(),
            },
        }
    }
}

#[async_trait]
impl DaemonClient for HttpDaemonClient {
    async fn list_procs(&self) -> Result<Vec<Metadata>, DaemonError> {
        let url = self.endpoint(METADATA_PATH);
        trace!(url = %url, "listing procs");

        let response = self
            .authorized(self.http.get(url))
            .send()
            .await
            .map_err(|e| self.transport_error(&e))?;
        let response = Self::expect_status(response, StatusCode::OK).await?;

        response
            .json::<Vec<Metadata>>()
            .await
            .map_err(|e| DaemonError::Decode(e.to_string()))
    }

    async fn execute_proc(&self, name: &str, args: &ArgumentMap) -> Result<String, DaemonError> {
        let url = self.endpoint(EXECUTE_PATH);
        let body = ToExecute {
            name: name.to_string(),
            args: args.clone(),
        };
        debug!(proc_name = name, args = args.len(), "submitting proc");

        let response = self
            .authorized(self.http.post(url))
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_error(&e))?;
        let response = Self::expect_status(response, StatusCode::CREATED).await?;

        let executed = response
            .json::<ToExecute>()
            .await
            .map_err(|e| DaemonError::Decode(e.to_string()))?;
        debug!(handle = %executed.name, "proc submitted");
        Ok(executed.name)
    }

    async fn stream_proc_logs(&self, handle: &str) -> Result<(), DaemonError> {
        let url = self.logs_url(handle)?;
        let mut request = url
            .as_str()
            .into_client_request()
            .map_err(|e| DaemonError::InvalidHost(format!("{}: {e}", self.host)))?;
        let headers = request.headers_mut();
        for (name, value) in [
            (EMAIL_HEADER, &self.email),
            (ACCESS_TOKEN_HEADER, &self.access_token),
        ] {
            let value = HeaderValue::from_str(value)
                .map_err(|e| DaemonError::Stream(format!("invalid {name} header: {e}")))?;
            headers.insert(name, value);
        }

        debug!(url = %url, "attaching to log stream");
        let connect = connect_async(request);
        let connected = match self.connect_timeout {
            Some(limit) => timeout(limit, connect)
                .await
                .map_err(|_| DaemonError::Timeout)?,
            None => connect.await,
        };
        let (mut ws, _response) = connected.map_err(|e| self.handshake_error(e))?;

        while let Some(frame) = ws.next().await {
            match frame {
                Ok(Message::Text(text)) => self.printer.println(&text, Emphasis::Normal),
                Ok(Message::Binary(bytes)) => self
                    .printer
                    .println(&String::from_utf8_lossy(&bytes), Emphasis::Normal),
                Ok(Message::Close(frame)) => {
                    return match frame {
                        Some(f) if f.code != CloseCode::Normal => Err(DaemonError::Stream(
                            format!("closed with code {}: {}", u16::from(f.code), f.reason),
                        )),
                        _ => {
                            debug!(handle, "log stream closed");
                            Ok(())
                        }
                    };
                }
                Ok(_) => {}
                Err(WsError::ConnectionClosed | WsError::AlreadyClosed) => return Ok(()),
                Err(e) => return Err(DaemonError::Stream(e.to_string())),
            }
        }
        Ok(())
    }
}

fn time_limit(timeout: Duration) -> Option<Duration> {
    (!timeout.is_zero()).then_some(timeout)
}

/// `PROCTOR_HOST` is usually a bare `host[:port]`; an explicit scheme is kept.
fn base_url(host: &str) -> Result<Url, DaemonError> {
    let host = host.trim().trim_end_matches('/');
    let raw = if host.contains("://") {
        host.to_string()
    } else {
        format!("http://{host}")
    };
    let url = Url::parse(&raw).map_err(|_| DaemonError::InvalidHost(host.to_string()))?;
    match url.scheme() {
        "http" | "https" if url.host_str().is_some() => Ok(url),
        _ => Err(DaemonError::InvalidHost(host.to_string())),
    }
}

fn status_error(status: u16, body: &str) -> DaemonError {
    if status == StatusCode::UNAUTHORIZED.as_u16() {
        return DaemonError::Unauthorized;
    }
    DaemonError::Server {
        status,
        body: body.trim().to_string(),
    }
}
