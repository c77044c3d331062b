//! Connection management.
//!
//! The server listens on the fixed DCP port on every local IPv4 address. A
//! reconciliation loop re-derives the address set each tick and diffs it
//! against the live listeners: new addresses get a listener, vanished ones
//! get theirs aborted, the rest are untouched — established connections on a
//! surviving listener never notice a tick. Each accepted socket runs its own
//! read/dispatch/write loop until the client goes away or framing breaks
//! down.

use crate::backend::Backend;
use crate::config::DcpServerConfig;
use crate::dispatch;
use crate::session::SessionState;
use crate::waypoint::WaypointExecutor;
use dcp_protocol::{DcpError, DcpErrorCode, Frame};
use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout_at};
use tracing::Instrument;

/// Shared state every connection task and the waypoint executor see.
pub struct ServerContext {
    pub config: DcpServerConfig,
    pub session: Arc<Mutex<SessionState>>,
    pub backend: Backend,
    pub waypoints: WaypointExecutor,
}

#[derive(Clone)]
pub struct DcpServer {
    ctx: Arc<ServerContext>,
}

enum ReadOutcome {
    Frame(Frame),
    /// Peer closed between frames.
    Closed,
    /// Peer closed mid-frame; the stream is unrecoverable.
    Truncated,
    /// An in-flight frame stalled past the request timeout.
    TimedOut,
}

impl DcpServer {
    pub fn new(config: DcpServerConfig, backend: Backend) -> DcpServer {
        DcpServer {
            ctx: Arc::new(ServerContext {
                config,
                session: Arc::new(Mutex::new(SessionState::default())),
                backend,
                waypoints: WaypointExecutor::new(),
            }),
        }
    }

    pub fn context(&self) -> &Arc<ServerContext> {
        &self.ctx
    }

    /// Runs the listener reconciliation loop forever.
    pub async fn run(&self) -> Result<(), DcpError> {
        self.ctx.config.validate().map_err(DcpError::Encode)?;
        let interval = Duration::from_millis(self.ctx.config.reconcile_interval_ms);
        let mut listeners: HashMap<IpAddr, JoinHandle<()>> = HashMap::new();
        tracing::info!(port = self.ctx.config.port, "DCP server starting");
        loop {
            self.reconcile(&mut listeners).await;
            sleep(interval).await;
        }
    }

    /// Diffs the desired listener set (current local addresses) against the
    /// live one, binding and aborting as needed.
    async fn reconcile(&self, listeners: &mut HashMap<IpAddr, JoinHandle<()>>) {
        let desired = self.local_addresses();

        listeners.retain(|addr, handle| {
            let keep = desired.contains(addr) && !handle.is_finished();
            if !keep {
                tracing::info!(%addr, "address gone, closing listener");
                handle.abort();
            }
            keep
        });

        for addr in desired {
            if listeners.contains_key(&addr) {
                continue;
            }
            let bind_addr = SocketAddr::new(addr, self.ctx.config.port);
            match TcpListener::bind(bind_addr).await {
                Ok(listener) => {
                    tracing::info!(%bind_addr, "listening");
                    let server = self.clone();
                    let handle = tokio::spawn(async move {
                        server.serve_listener(listener).await;
                    });
                    listeners.insert(addr, handle);
                }
                Err(e) => {
                    tracing::warn!(%bind_addr, "bind failed: {}", e);
                }
            }
        }
    }

    /// Current local IPv4 addresses, the desired listener set.
    fn local_addresses(&self) -> Vec<IpAddr> {
        let interfaces = match local_ip_address::list_afinet_netifas() {
            Ok(interfaces) => interfaces,
            Err(e) => {
                tracing::warn!("could not list network interfaces: {}", e);
                return Vec::new();
            }
        };
        interfaces
            .into_iter()
            .filter_map(|(_name, ip)| match ip {
                IpAddr::V4(v4) => {
                    if v4.is_loopback() && !self.ctx.config.bind_loopback {
                        None
                    } else {
                        Some(IpAddr::V4(v4))
                    }
                }
                IpAddr::V6(_) => None,
            })
            .collect()
    }

    /// Accept loop for one bound listener. Public so tests can drive the
    /// server on an ephemeral port without the reconciliation loop.
    pub async fn serve_listener(&self, listener: TcpListener) {
        loop {
            let (socket, peer) = match listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    tracing::warn!("accept failed: {}", e);
                    continue;
                }
            };
            let server = self.clone();
            tokio::spawn(
                async move {
                    if let Err(e) = server.handle_connection(socket).await {
                        tracing::debug!("connection ended: {}", e);
                    }
                }
                .instrument(tracing::trace_span!("dcp", peer = peer.to_string())),
            );
        }
    }

    /// Reads, dispatches and answers frames on one connection, strictly in
    /// arrival order, until the peer disconnects or framing breaks down.
    pub async fn handle_connection(&self, mut socket: TcpStream) -> Result<(), DcpError> {
        let request_timeout = Duration::from_millis(self.ctx.config.request_timeout_ms);
        let mut acc: Vec<u8> = Vec::new();
        let mut buf = vec![0u8; 1024];

        loop {
            let outcome = self.read_frame(&mut socket, &mut acc, &mut buf, request_timeout).await?;
            match outcome {
                ReadOutcome::Closed => return Ok(()),
                ReadOutcome::Truncated => {
                    // Header shorter than the fixed prefix: answer parse
                    // failed if the peer still listens, then give up.
                    let reply = self.error_frame(DcpErrorCode::ParseFailed).await;
                    let _ = socket.write_all(&reply.encode()).await;
                    return Ok(());
                }
                ReadOutcome::TimedOut => {
                    // The partial frame is discarded; the connection lives
                    // on with a clean buffer.
                    tracing::debug!(discarded = acc.len(), "request frame timed out");
                    acc.clear();
                    let reply = self.error_frame(DcpErrorCode::ConnectionTimeout).await;
                    socket
                        .write_all(&reply.encode())
                        .await
                        .map_err(|e| DcpError::FailedToSend(e.to_string()))?;
                }
                ReadOutcome::Frame(frame) => {
                    let oversized =
                        frame.header.data_length as usize > dcp_protocol::frame::MAX_DATA_SIZE;
                    let reply = dispatch::dispatch(&self.ctx, &frame).await;
                    socket
                        .write_all(&reply.encode())
                        .await
                        .map_err(|e| DcpError::FailedToSend(e.to_string()))?;
                    if oversized {
                        // Payload bytes past the cap were never read; the
                        // stream cannot be re-synchronized.
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Accumulates socket reads until a full frame is buffered. The first
    /// byte of a frame may take forever (idle client); once a frame is
    /// partially buffered, the rest must complete within `request_timeout`
    /// of the first byte.
    async fn read_frame(
        &self,
        socket: &mut TcpStream,
        acc: &mut Vec<u8>,
        buf: &mut [u8],
        request_timeout: Duration,
    ) -> Result<ReadOutcome, DcpError> {
        let mut deadline: Option<tokio::time::Instant> = if acc.is_empty() {
            None
        } else {
            Some(tokio::time::Instant::now() + request_timeout)
        };
        loop {
            if let Some(frame) = Frame::take_from(acc)? {
                return Ok(ReadOutcome::Frame(frame));
            }
            let n = match deadline {
                None => socket
                    .read(buf)
                    .await
                    .map_err(|e| DcpError::FailedToReceive(e.to_string()))?,
                Some(deadline) => match timeout_at(deadline, socket.read(buf)).await {
                    Err(_) => return Ok(ReadOutcome::TimedOut),
                    Ok(read) => read.map_err(|e| DcpError::FailedToReceive(e.to_string()))?,
                },
            };
            if n == 0 {
                if acc.is_empty() {
                    return Ok(ReadOutcome::Closed);
                }
                tracing::debug!(partial = acc.len(), "peer closed mid-frame");
                return Ok(ReadOutcome::Truncated);
            }
            acc.extend_from_slice(&buf[..n]);
            if deadline.is_none() {
                deadline = Some(tokio::time::Instant::now() + request_timeout);
            }
        }
    }

    /// Error frame for failures with no usable request header. Uses invoke
    /// id 0 and still carries fresh status.
    async fn error_frame(&self, code: DcpErrorCode) -> Frame {
        let status = crate::status::synthesize(&self.ctx.backend).await;
        Frame::error(&self.ctx.config.robot_name, 0, status.pack(), code)
    }
}
