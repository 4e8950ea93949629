//! Async telnet client for the FMOD Studio scripting console.
//!
//! The console speaks a best-effort text protocol: commands are newline
//! terminated, responses are unstructured, and there is no per-command
//! acknowledgement. The client's job is to preserve line ordering, bound
//! every blocking operation in time, and fail the whole connection rather
//! than attempt partial recovery on any transport-level error.

use crate::error::{AppResult, ImporterError};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::{timeout, Instant};

/// Upper bound on a connection attempt.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Delay between availability checks while reading, to avoid busy-spinning.
const READ_POLL_DELAY: Duration = Duration::from_millis(10);

/// Pacing delay between commands within one batch.
const INTER_COMMAND_DELAY: Duration = Duration::from_millis(50);

/// Telnet negotiation sent once after the stream opens: IAC DO SGA
/// (Suppress Go Ahead). The console does not acknowledge it.
const TELNET_HANDSHAKE: [u8; 3] = [255, 253, 3];

/// A single persistent connection to the scripting console.
///
/// The instance is created unconnected; [`connect`](Self::connect) transitions
/// it to connected. Any I/O fault or explicit [`disconnect`](Self::disconnect)
/// releases the socket irreversibly; a torn-down instance never reconnects.
pub struct ConsoleClient {
    host: String,
    port: u16,
    stream: Option<TcpStream>,
    connected: bool,
    disposed: bool,
}

impl ConsoleClient {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            stream: None,
            connected: false,
            disposed: false,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// `(host, port)` this client was created for.
    pub fn endpoint(&self) -> (&str, u16) {
        (&self.host, self.port)
    }

    /// Opens the stream, bounded by [`CONNECT_TIMEOUT`], and performs the
    /// one-shot telnet negotiation before marking the connection live.
    ///
    /// Idempotent no-op if already connected. A previously torn-down instance
    /// reports [`ImporterError::NotConnected`].
    pub async fn connect(&mut self) -> AppResult<()> {
        if self.connected {
            return Ok(());
        }
        if self.disposed {
            tracing::warn!("Refusing to reconnect a disposed console client");
            return Err(ImporterError::NotConnected);
        }

        let addr = format!("{}:{}", self.host, self.port);
        tracing::info!("Connecting to FMOD Studio console at {}", addr);

        let stream = match timeout(CONNECT_TIMEOUT, TcpStream::connect(&addr)).await {
            Err(_) => {
                self.teardown();
                return Err(ImporterError::ConnectTimeout {
                    host: self.host.clone(),
                    port: self.port,
                    timeout_ms: CONNECT_TIMEOUT.as_millis() as u64,
                });
            }
            Ok(Err(e)) => {
                tracing::error!("Failed to connect to {}: {}", addr, e);
                self.teardown();
                return Err(e.into());
            }
            Ok(Ok(stream)) => stream,
        };

        // Low latency matters more than throughput on this channel.
        stream.set_nodelay(true)?;

        let mut stream = stream;
        if let Err(e) = stream.write_all(&TELNET_HANDSHAKE).await {
            tracing::error!("Telnet negotiation failed: {}", e);
            self.teardown();
            return Err(e.into());
        }
        if let Err(e) = stream.flush().await {
            self.teardown();
            return Err(e.into());
        }

        self.stream = Some(stream);
        self.connected = true;
        tracing::info!("Telnet connection successful to {}", addr);
        Ok(())
    }

    /// Accumulates console output until no more bytes are currently available
    /// and at least one read has completed, or until `read_timeout` elapses.
    ///
    /// Remote-initiated stream closure is terminal: the connection is torn
    /// down and whatever partial text was accumulated is returned. Any other
    /// I/O fault tears the connection down and propagates. A read timeout
    /// fails the operation but leaves the connection up.
    pub async fn read_response(&mut self, read_timeout: Duration) -> AppResult<String> {
        if !self.connected {
            tracing::warn!("Cannot read from console: not connected");
            return Ok(String::new());
        }
        let Some(mut stream) = self.stream.take() else {
            return Ok(String::new());
        };

        let deadline = Instant::now() + read_timeout;
        let mut accumulated = String::new();
        let mut buf = [0u8; 1024];

        loop {
            match timeout(READ_POLL_DELAY, stream.read(&mut buf)).await {
                Ok(Ok(0)) => {
                    tracing::info!("Console connection closed by remote host during read");
                    self.teardown();
                    return Ok(accumulated);
                }
                Ok(Ok(n)) => {
                    accumulated.push_str(&String::from_utf8_lossy(&buf[..n]));
                }
                Ok(Err(e)) => {
                    tracing::error!("I/O error during console read: {}", e);
                    self.teardown();
                    return Err(e.into());
                }
                // Nothing currently available; stop once we have read something.
                Err(_elapsed) => {
                    if !accumulated.is_empty() {
                        break;
                    }
                }
            }

            if Instant::now() >= deadline {
                self.stream = Some(stream);
                let ms = read_timeout.as_millis() as u64;
                tracing::warn!("Console read timed out after {} ms", ms);
                return Err(ImporterError::ReadTimeout(ms));
            }

            tokio::time::sleep(READ_POLL_DELAY).await;
        }

        self.stream = Some(stream);
        tracing::debug!("Console read: {:?}", accumulated);
        Ok(accumulated)
    }

    /// Writes each non-blank line with a `\n` terminator and a short pacing
    /// delay between lines, then flushes once.
    ///
    /// Not connected is a logged no-op. Any I/O fault tears the connection
    /// down and propagates; the batch is not retried.
    pub async fn write_batch(&mut self, lines: &[String]) -> AppResult<()> {
        self.write_lines(lines, true).await
    }

    /// Same contract as [`write_batch`](Self::write_batch) for exactly one
    /// line, without the inter-line delay.
    pub async fn write_single(&mut self, line: &str) -> AppResult<()> {
        let lines = [line.to_string()];
        self.write_lines(&lines, false).await
    }

    async fn write_lines(&mut self, lines: &[String], paced: bool) -> AppResult<()> {
        if !self.connected {
            tracing::warn!("Cannot write to console: not connected");
            return Ok(());
        }
        let Some(mut stream) = self.stream.take() else {
            return Ok(());
        };

        let mut sent = 0usize;
        for line in lines.iter().filter(|l| !l.trim().is_empty()) {
            let framed = format!("{}\n", line);
            if let Err(e) = stream.write_all(framed.as_bytes()).await {
                tracing::error!("I/O error during console write: {}", e);
                self.teardown();
                return Err(e.into());
            }
            sent += 1;
            if paced {
                tokio::time::sleep(INTER_COMMAND_DELAY).await;
            }
        }

        if let Err(e) = stream.flush().await {
            tracing::error!("Failed to flush console stream: {}", e);
            self.teardown();
            return Err(e.into());
        }

        self.stream = Some(stream);
        tracing::debug!("Sent {} command(s)", sent);
        Ok(())
    }

    /// Idempotent teardown: closes the stream and marks the instance
    /// permanently unconnected. Dropping the client has the same effect.
    pub fn disconnect(&mut self) {
        if self.stream.is_some() || self.connected {
            tracing::info!("Disposing console connection to {}:{}", self.host, self.port);
        }
        self.teardown();
    }

    fn teardown(&mut self) {
        // Dropping the TcpStream closes the socket.
        self.stream = None;
        self.connected = false;
        self.disposed = true;
    }
}
