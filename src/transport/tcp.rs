use std::io;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::{Instant, timeout, timeout_at};
use tracing::{debug, warn};

use crate::error::{Phase, Result, TrapperError};
use crate::protocol::request::{TrapperData, build_request_packet};
use crate::protocol::response::{Response, parse_response};

/// Registered trapper port, used when the address has none.
pub const DEFAULT_SERVER_PORT: u16 = 10051;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Pushes sample batches to a trapper endpoint
///
/// Every `send` opens one connection, does one round trip and closes it.
/// The timeout bounds connect, and a single deadline taken at the start of
/// the call bounds write and read together.
#[derive(Debug, Clone)]
pub struct Sender {
    pub server_address: String,
    pub timeout: Duration,
}

impl Sender {
    pub fn new(server_address: impl Into<String>) -> Self {
        Self {
            server_address: server_address.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sends one batch and returns the server's acknowledgement
    ///
    /// A response with a failure status is still `Ok`; check
    /// [`Response::is_success`].
    pub async fn send(&self, data: &[TrapperData]) -> Result<Response> {
        let deadline = deadline_after(self.timeout);
        let packet = build_request_packet(data)?;

        let addr = add_default_port(&self.server_address);
        debug!("Connecting to {}", addr);
        let mut stream = connect_within(self.timeout, &addr, TcpStream::connect(&addr)).await?;

        // `stream` is dropped, and the socket closed, on every return below
        let resp = round_trip(&mut stream, &packet, deadline).await?;

        if !resp.is_success() {
            warn!(status = %resp.response, info = %resp.info, "server reported failed items");
        }
        Ok(resp)
    }
}

/// Far enough ahead to never fire, for timeouts too large to add to now.
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

/// `now + timeout`, saturating instead of overflowing.
pub fn deadline_after(timeout: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(timeout).unwrap_or_else(|| now + FAR_FUTURE)
}

/// Awaits a connect attempt for at most `limit`.
pub async fn connect_within<F, S>(limit: Duration, addr: &str, connecting: F) -> Result<S>
where
    F: Future<Output = io::Result<S>>,
{
    match timeout(limit, connecting).await {
        Ok(Ok(stream)) => Ok(stream),
        Ok(Err(source)) => Err(TrapperError::Connect {
            addr: addr.to_string(),
            source,
        }),
        Err(_) => Err(TrapperError::Timeout { phase: Phase::Connect }),
    }
}

/// Writes the packet and reads the reply, both bounded by the same `deadline`.
pub async fn round_trip<S>(stream: &mut S, packet: &[u8], deadline: Instant) -> Result<Response>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    timeout_at(deadline, write_packet(stream, packet))
        .await
        .map_err(|_| TrapperError::Timeout { phase: Phase::Write })??;
    debug!(bytes = packet.len(), "sent request packet");

    timeout_at(deadline, parse_response(stream))
        .await
        .map_err(|_| TrapperError::Timeout { phase: Phase::Read })?
}

/// Writes the whole packet, failing if the peer stops taking bytes part way.
pub async fn write_packet<W>(writer: &mut W, packet: &[u8]) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut written = 0;
    while written < packet.len() {
        let n = writer
            .write(&packet[written..])
            .await
            .map_err(TrapperError::Write)?;
        if n == 0 {
            return Err(TrapperError::ShortWrite {
                written,
                expected: packet.len(),
            });
        }
        written += n;
    }
    writer.flush().await.map_err(TrapperError::Write)
}

/// Appends the default port when `addr` has none
///
/// `host` -> `host:10051`, `::1` -> `[::1]:10051`, `[::1]` -> `[::1]:10051`.
/// Addresses that already carry a port are returned unchanged.
pub fn add_default_port(addr: &str) -> String {
    if addr.starts_with('[') {
        if addr.ends_with(']') {
            return format!("{}:{}", addr, DEFAULT_SERVER_PORT);
        }
        return addr.to_string();
    }

    match addr.matches(':').count() {
        0 => format!("{}:{}", addr, DEFAULT_SERVER_PORT),
        1 => addr.to_string(),
        // bare IPv6 literal
        _ => format!("[{}]:{}", addr, DEFAULT_SERVER_PORT),
    }
}
