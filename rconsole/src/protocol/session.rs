// (c) 2026 The rconsole authors

//! Authenticated RCON session
//!
//! A [`Session`] is good for exactly one command: open, authenticate,
//! [`execute`](Session::execute), close. Callers use the channel sporadically
//! (once per ban, once per backup), so a fresh connection each time costs little
//! and means we never trip over a stale or half-open socket.

use std::sync::atomic::{AtomicI32, Ordering};
use std::time::Duration;

use thiserror::Error;
use tokio::io::{AsyncBufReadExt as _, AsyncRead, AsyncWrite, AsyncWriteExt as _, BufReader};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, trace};

use super::packet::{
    ENVELOPE_SIZE, FRAME_LIMIT, MalformedPacket, Packet, PacketKind, ReadError, encode, read_packet,
};

/// Request id the server uses to signal a failed authentication
pub const AUTH_FAILED_ID: i32 = -1;

/// How we decide that a (possibly multi-packet) response is complete.
///
/// The protocol has no end-of-response marker, and servers differ in how they
/// chunk long output. Neither heuristic is exact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseEnd {
    /// Keep reading until nothing more arrives for the given grace period
    Idle(Duration),
    /// Stop after the first matching packet
    FirstPacket,
}

/// Timeouts and response heuristics for a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    /// Bound on TCP connect
    pub connect_timeout: Duration,
    /// Bound on waiting for each expected reply
    pub read_timeout: Duration,
    /// End-of-response heuristic
    pub response_end: ResponseEnd,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            read_timeout: Duration::from_secs(5),
            response_end: ResponseEnd::Idle(Duration::from_millis(250)),
        }
    }
}

/// Why a TCP connection could not be made
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum ConnectFailure {
    /// Nothing listening
    Refused,
    /// Connect did not complete within the bound
    Timeout,
    /// Name resolution or routing failure
    Unreachable,
}

/// Session failures
#[derive(Debug, Error)]
pub enum SessionError {
    /// TCP connect failed
    #[error("could not connect to {address}: {reason}")]
    Connect {
        /// host:port we tried
        address: String,
        /// Classification
        reason: ConnectFailure,
    },
    /// The server rejected our password
    #[error("authentication failed (wrong password?)")]
    Auth,
    /// The server sent something that is not a valid packet
    #[error("malformed packet from server: {0}")]
    Malformed(#[from] MalformedPacket),
    /// No response within the read timeout
    #[error("timed out after {0:?} waiting for a response")]
    ExecTimeout(Duration),
    /// The command does not fit in a packet
    #[error("command too long ({0} bytes)")]
    CommandTooLong(usize),
    /// Any other I/O failure, including the server hanging up
    #[error("connection error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ReadError> for SessionError {
    fn from(e: ReadError) -> Self {
        match e {
            ReadError::Io(e) => Self::Io(e),
            ReadError::Malformed(m) => Self::Malformed(m),
        }
    }
}

/// Longest command body we will send. The vanilla server rejects anything over 1446 bytes.
pub const MAX_COMMAND_LEN: usize = 1446;

static NEXT_BASE_ID: AtomicI32 = AtomicI32::new(1);

/// Picks a base request id for a new session.
///
/// Each session gets a block of ids so that ids stay distinct across sessions
/// in the same process, which makes server-side logs easier to follow.
fn fresh_base_id() -> i32 {
    let id = NEXT_BASE_ID
        .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |v| {
            Some(if v > i32::MAX - 1024 { 1 } else { v + 16 })
        })
        .unwrap_or(1);
    id.max(1)
}

/// What an incoming packet means while we wait for the auth reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AuthReply {
    /// Authentication succeeded
    Accepted,
    /// Authentication failed
    Rejected,
    /// Not the packet we were waiting for
    Unrelated,
}

/// Classifies a packet received during the auth handshake.
///
/// An `AUTH_RESPONSE` carrying id -1 is a rejection whatever its body says.
pub(crate) fn classify_auth_reply(packet: &Packet) -> AuthReply {
    if packet.kind != PacketKind::AUTH_RESPONSE {
        return AuthReply::Unrelated;
    }
    if packet.request_id == AUTH_FAILED_ID {
        AuthReply::Rejected
    } else {
        AuthReply::Accepted
    }
}

/// An authenticated connection to an RCON server
#[derive(Debug)]
pub struct Session<S> {
    stream: BufReader<S>,
    settings: SessionSettings,
    next_request_id: i32,
    authenticated: bool,
}

impl Session<TcpStream> {
    /// Connects to `host:port` and authenticates.
    pub async fn open(
        host: &str,
        port: u16,
        password: &str,
        settings: SessionSettings,
    ) -> Result<Self, SessionError> {
        let address = format!("{host}:{port}");
        debug!("connecting to {address}");
        let stream = match timeout(settings.connect_timeout, TcpStream::connect((host, port))).await
        {
            Ok(Ok(s)) => s,
            Ok(Err(e)) => {
                let reason = if e.kind() == std::io::ErrorKind::ConnectionRefused {
                    ConnectFailure::Refused
                } else {
                    debug!("connect to {address}: {e}");
                    ConnectFailure::Unreachable
                };
                return Err(SessionError::Connect { address, reason });
            }
            Err(_) => {
                return Err(SessionError::Connect {
                    address,
                    reason: ConnectFailure::Timeout,
                });
            }
        };
        let _ = stream.set_nodelay(true);
        Self::authenticate(stream, password, settings).await
    }
}

impl<S> Session<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Performs the auth handshake over an already-connected stream.
    pub async fn authenticate(
        stream: S,
        password: &str,
        settings: SessionSettings,
    ) -> Result<Self, SessionError> {
        let base = fresh_base_id();
        let mut session = Self {
            stream: BufReader::new(stream),
            settings,
            next_request_id: base,
            authenticated: false,
        };
        session
            .send(base, PacketKind::AUTH, password.as_bytes())
            .await?;
        loop {
            let packet = session.read_within(settings.read_timeout).await?;
            match classify_auth_reply(&packet) {
                AuthReply::Accepted => {
                    if packet.request_id != base {
                        debug!(
                            "auth reply carried id {} (expected {base})",
                            packet.request_id
                        );
                    }
                    session.authenticated = true;
                    session.next_request_id = base.wrapping_add(1);
                    trace!("authenticated, base request id {base}");
                    return Ok(session);
                }
                AuthReply::Rejected => {
                    session.close().await;
                    return Err(SessionError::Auth);
                }
                AuthReply::Unrelated => {
                    // Some servers send an empty RESPONSE_VALUE ahead of the auth reply
                    trace!("skipping {} packet during auth", packet.kind);
                }
            }
        }
    }

    /// Whether the handshake completed
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    async fn send(&mut self, id: i32, kind: PacketKind, body: &[u8]) -> Result<(), SessionError> {
        if body.len() > FRAME_LIMIT - ENVELOPE_SIZE {
            return Err(SessionError::CommandTooLong(body.len()));
        }
        let wire = encode(id, kind, body);
        trace!("send {kind} id={id} len={}", body.len());
        self.stream.get_mut().write_all(&wire).await?;
        self.stream.get_mut().flush().await?;
        Ok(())
    }

    async fn read_within(&mut self, bound: Duration) -> Result<Packet, SessionError> {
        let packet = timeout(bound, read_packet(&mut self.stream))
            .await
            .map_err(|_| SessionError::ExecTimeout(bound))??;
        trace!(
            "recv {} id={} len={}",
            packet.kind,
            packet.request_id,
            packet.body.len()
        );
        Ok(packet)
    }

    /// Waits up to `grace` for more data to arrive.
    ///
    /// `fill_buf` keeps whatever it has read in the buffer, so abandoning the
    /// wait loses nothing.
    async fn more_data_within(&mut self, grace: Duration) -> Result<bool, SessionError> {
        match timeout(grace, self.stream.fill_buf()).await {
            Err(_) => Ok(false),
            Ok(Ok(buf)) => Ok(!buf.is_empty()),
            Ok(Err(e)) => Err(e.into()),
        }
    }

    /// Runs one command and returns the server's response text.
    ///
    /// Consumes the session: the connection is closed on return, success or failure.
    pub async fn execute(mut self, command: &str) -> Result<String, SessionError> {
        let result = self.execute_inner(command).await;
        self.close().await;
        result
    }

    async fn execute_inner(&mut self, command: &str) -> Result<String, SessionError> {
        if command.len() > MAX_COMMAND_LEN {
            return Err(SessionError::CommandTooLong(command.len()));
        }
        let id = self.next_request_id;
        self.next_request_id = id.wrapping_add(1);
        self.send(id, PacketKind::EXEC_COMMAND, command.as_bytes())
            .await?;

        let read_timeout = self.settings.read_timeout;
        let mut body = Vec::new();
        // The first matching packet must arrive within the read timeout
        loop {
            let packet = self.read_within(read_timeout).await?;
            if packet.kind == PacketKind::RESPONSE_VALUE && packet.request_id == id {
                body.extend_from_slice(&packet.body);
                break;
            }
            debug!(
                "ignoring {} packet with id {} (want {id})",
                packet.kind, packet.request_id
            );
        }

        if let ResponseEnd::Idle(grace) = self.settings.response_end {
            let mut chunks = 1;
            while self.more_data_within(grace).await? {
                let packet = self.read_within(read_timeout).await?;
                if packet.kind == PacketKind::RESPONSE_VALUE && packet.request_id == id {
                    body.extend_from_slice(&packet.body);
                    chunks += 1;
                }
            }
            trace!("response reassembled from {chunks} packet(s)");
        }
        Ok(String::from_utf8_lossy(&body).into_owned())
    }

    async fn close(&mut self) {
        let _ = self.stream.get_mut().shutdown().await;
    }
}
