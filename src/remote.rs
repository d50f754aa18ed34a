//! Client for the remote log store.
//!
//! The store is a plain HTTP file-drop service: `POST /session` with basic
//! auth opens a session, `PUT /files/{folder}/{name}` uploads report bytes,
//! `DELETE /session` closes the session again. The remote sink talks to it
//! through the [`RemoteTransport`] seam so tests can substitute a fake.

use std::time::Duration;

use serde::Deserialize;

/// Remote store configuration.
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    /// Store host, e.g. `logs.example.net:8080`.
    pub host: String,
    /// Username credential.
    pub username: String,
    /// Password credential.
    pub password: String,
}

impl RemoteConfig {
    pub fn new(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            username: username.into(),
            password: password.into(),
        }
    }

    /// Base URL of the store.
    pub fn url(&self) -> String {
        format!("http://{}", self.host)
    }

    /// Session endpoint URL.
    pub fn session_url(&self) -> String {
        format!("{}/session", self.url())
    }

    /// Upload URL for a file in a folder. Both segments are
    /// percent-encoded; report file names contain spaces.
    pub fn file_url(&self, folder: &str, name: &str) -> String {
        format!(
            "{}/files/{}/{}",
            self.url(),
            urlencoding::encode(folder),
            urlencoding::encode(name)
        )
    }
}

/// Remote client error types.
#[derive(Debug)]
pub enum RemoteError {
    /// Configuration error
    Config(String),
    /// Network/HTTP error
    Network(String),
    /// Store returned an error response
    Server { status: u16, message: String },
}

impl std::fmt::Display for RemoteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RemoteError::Config(msg) => write!(f, "remote config error: {msg}"),
            RemoteError::Network(msg) => write!(f, "remote network error: {msg}"),
            RemoteError::Server { status, message } => {
                write!(f, "remote server error ({status}): {message}")
            }
        }
    }
}

impl std::error::Error for RemoteError {}

/// Session acknowledgement from the store. Only inspected for diagnostics.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionAck {
    #[serde(default)]
    pub session_id: Option<String>,
}

/// The connection seam the remote sink drives.
///
/// Implementations own whatever session state the protocol needs.
/// `connect` must be idempotent: a write racing a watchdog disconnect may
/// observe a session that was just torn down and reconnect immediately.
pub trait RemoteTransport: Send {
    /// Open and authenticate a session.
    fn connect(&mut self) -> Result<(), RemoteError>;

    /// Upload `data` as `{folder}/{name}`, replacing any previous upload of
    /// the same name.
    fn upload(&mut self, folder: &str, name: &str, data: &[u8]) -> Result<(), RemoteError>;

    /// Tear the session down. Best-effort; errors are swallowed.
    fn disconnect(&mut self);
}

/// Async client for the remote store.
pub struct RemoteClient {
    config: RemoteConfig,
    http: reqwest::Client,
    agent_id: String,
}

impl RemoteClient {
    /// Create a new client. The agent ID tags every session so the store
    /// can tell concurrent agents apart.
    pub fn new(config: RemoteConfig) -> Result<Self, RemoteError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| RemoteError::Config(format!("failed to create HTTP client: {e}")))?;

        let host = hostname::get()
            .map(|h| h.to_string_lossy().to_string())
            .unwrap_or_else(|_| "unknown".to_string());
        let agent_id = format!(
            "presence-{}-{}",
            host,
            &uuid::Uuid::new_v4().to_string()[..8]
        );

        Ok(Self {
            config,
            http,
            agent_id,
        })
    }

    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }

    /// Open an authenticated session.
    pub async fn open_session(&self) -> Result<SessionAck, RemoteError> {
        let response = self
            .http
            .post(self.config.session_url())
            .basic_auth(&self.config.username, Some(&self.config.password))
            .header("X-Agent-Id", &self.agent_id)
            .send()
            .await
            .map_err(|e| RemoteError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(RemoteError::Server {
                status: status.as_u16(),
                message,
            });
        }

        // An empty body is a valid acknowledgement.
        Ok(response
            .json()
            .await
            .unwrap_or(SessionAck { session_id: None }))
    }

    /// Upload report bytes into the store.
    pub async fn upload(
        &self,
        folder: &str,
        name: &str,
        data: Vec<u8>,
    ) -> Result<(), RemoteError> {
        let response = self
            .http
            .put(self.config.file_url(folder, name))
            .basic_auth(&self.config.username, Some(&self.config.password))
            .header("X-Agent-Id", &self.agent_id)
            .body(data)
            .send()
            .await
            .map_err(|e| RemoteError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(RemoteError::Server {
                status: status.as_u16(),
                message,
            });
        }
        Ok(())
    }

    /// Close the current session.
    pub async fn close_session(&self) -> Result<(), RemoteError> {
        self.http
            .delete(self.config.session_url())
            .basic_auth(&self.config.username, Some(&self.config.password))
            .header("X-Agent-Id", &self.agent_id)
            .send()
            .await
            .map_err(|e| RemoteError::Network(e.to_string()))?;
        Ok(())
    }
}

/// Blocking client for use from the sink's synchronous write path.
pub struct BlockingRemoteClient {
    inner: RemoteClient,
    runtime: tokio::runtime::Runtime,
}

impl BlockingRemoteClient {
    pub fn new(config: RemoteConfig) -> Result<Self, RemoteError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| RemoteError::Config(format!("failed to create runtime: {e}")))?;

        Ok(Self {
            inner: RemoteClient::new(config)?,
            runtime,
        })
    }

    pub fn agent_id(&self) -> &str {
        self.inner.agent_id()
    }
}

impl RemoteTransport for BlockingRemoteClient {
    fn connect(&mut self) -> Result<(), RemoteError> {
        let ack = self.runtime.block_on(self.inner.open_session())?;
        tracing::debug!(
            agent = %self.inner.agent_id(),
            session = ?ack.session_id,
            "remote session opened"
        );
        Ok(())
    }

    fn upload(&mut self, folder: &str, name: &str, data: &[u8]) -> Result<(), RemoteError> {
        self.runtime
            .block_on(self.inner.upload(folder, name, data.to_vec()))
    }

    fn disconnect(&mut self) {
        if let Err(e) = self.runtime.block_on(self.inner.close_session()) {
            tracing::warn!("error closing remote session: {e}");
        }
    }
}
