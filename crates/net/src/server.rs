//! TCP game server
//!
//! One task per connection reads frames and hands intents to the shared
//! hub; a writer task per connection drains its outbound queue. The hub
//! holds the dispatcher and every peer's queue behind one lock, so each
//! transition runs start to finish before the next one begins.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use boardroom_core::{ConnectionId, Dispatcher, Envelope, Intent};
use chrono::Utc;
use tokio::io::WriteHalf;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{broadcast, mpsc, oneshot, RwLock};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::ServerConfig;
use crate::error::{Error, Result};
use crate::frame::{read_frame, write_frame};
use crate::protocol::{ClientFrame, ServerFrame};

/// Outbound frames buffered per peer before it counts as too slow
const OUTBOUND_QUEUE: usize = 256;

/// Connected peer state
struct Peer {
    tx: mpsc::Sender<ServerFrame>,
    last_seen: Instant,
    /// Dropping this ends the peer's connection task
    _close: oneshot::Sender<()>,
}

/// Dispatcher plus the outbound queue of every connected peer
struct Hub {
    dispatcher: Dispatcher,
    peers: HashMap<ConnectionId, Peer>,
}

impl Hub {
    fn handle(&mut self, conn: ConnectionId, intent: Intent) {
        let out = self.dispatcher.handle(conn, intent, Utc::now());
        self.deliver(out);
    }

    /// Queue notifications without waiting on any peer. A peer whose
    /// queue is full can no longer stay in sync and is disconnected.
    fn deliver(&mut self, envelopes: Vec<Envelope>) {
        let mut lagging: Vec<ConnectionId> = Vec::new();
        for Envelope { to, notification } in envelopes {
            if lagging.contains(&to) {
                continue;
            }
            let Some(peer) = self.peers.get(&to) else {
                continue;
            };
            match peer.tx.try_send(ServerFrame::Notification(notification)) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => lagging.push(to),
                Err(TrySendError::Closed(_)) => {
                    debug!(conn = %to, "Peer writer gone, notification dropped");
                }
            }
        }

        for conn in lagging {
            warn!(conn = %conn, "Outbound queue full, dropping slow peer");
            self.drop_peer(conn);
        }
    }

    fn touch(&mut self, conn: ConnectionId) {
        if let Some(peer) = self.peers.get_mut(&conn) {
            peer.last_seen = Instant::now();
        }
    }

    /// Forget a peer and run the disconnect transition for it
    fn drop_peer(&mut self, conn: ConnectionId) {
        self.peers.remove(&conn);
        let out = self.dispatcher.disconnect(conn, Utc::now());
        self.deliver(out);
    }

    fn stale_peers(&self, timeout: Duration) -> Vec<ConnectionId> {
        self.peers
            .iter()
            .filter(|(_, peer)| peer.last_seen.elapsed() > timeout)
            .map(|(id, _)| *id)
            .collect()
    }

    fn ping_all(&self) {
        for peer in self.peers.values() {
            let _ = peer.tx.try_send(ServerFrame::Ping);
        }
    }
}

/// Game server handle
pub struct Server {
    addr: SocketAddr,
    hub: Arc<RwLock<Hub>>,
    shutdown_tx: broadcast::Sender<()>,
}

impl Server {
    /// Bind the listener and spawn the accept, heartbeat and sweep tasks
    pub async fn start(config: ServerConfig) -> Result<Self> {
        config.validate()?;
        let listener = TcpListener::bind((config.host.as_str(), config.port))
            .await
            .map_err(|source| Error::Bind {
                addr: format!("{}:{}", config.host, config.port),
                source,
            })?;
        let bound_addr = listener.local_addr()?;

        info!(addr = %bound_addr, "Server started");

        let (shutdown_tx, _) = broadcast::channel(1);
        let hub = Arc::new(RwLock::new(Hub {
            dispatcher: Dispatcher::new(config.limits),
            peers: HashMap::new(),
        }));

        tokio::spawn(accept_loop(listener, hub.clone(), shutdown_tx.subscribe()));
        tokio::spawn(heartbeat_task(
            hub.clone(),
            config.heartbeat_interval(),
            config.liveness_timeout(),
            shutdown_tx.subscribe(),
        ));
        tokio::spawn(sweep_task(
            hub.clone(),
            config.sweep_interval(),
            config.idle_room(),
            shutdown_tx.subscribe(),
        ));

        Ok(Server {
            addr: bound_addr,
            hub,
            shutdown_tx,
        })
    }

    /// Get the server's bound address
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub async fn room_count(&self) -> usize {
        self.hub.read().await.dispatcher.room_count()
    }

    pub async fn peer_count(&self) -> usize {
        self.hub.read().await.peers.len()
    }

    /// Shutdown the server
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
        info!("Server shutdown initiated");
    }
}

/// Accept incoming connections
async fn accept_loop(
    listener: TcpListener,
    hub: Arc<RwLock<Hub>>,
    mut shutdown_rx: broadcast::Receiver<()>,
) {
    loop {
        tokio::select! {
            result = listener.accept() => {
                match result {
                    Ok((stream, addr)) => {
                        debug!(addr = %addr, "New connection");
                        let hub = hub.clone();
                        tokio::spawn(handle_connection(stream, addr, hub, shutdown_rx.resubscribe()));
                    }
                    Err(e) => {
                        error!(error = %e, "Accept failed");
                    }
                }
            }
            _ = shutdown_rx.recv() => {
                info!("Accept loop shutting down");
                break;
            }
        }
    }
}

/// Handle a single client connection
async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    hub: Arc<RwLock<Hub>>,
    mut shutdown_rx: broadcast::Receiver<()>,
) {
    let conn: ConnectionId = Uuid::new_v4();
    let (mut reader, writer) = tokio::io::split(stream);
    let (tx, rx) = mpsc::channel(OUTBOUND_QUEUE);
    let (close_tx, mut close_rx) = oneshot::channel();

    hub.write().await.peers.insert(
        conn,
        Peer {
            tx,
            last_seen: Instant::now(),
            _close: close_tx,
        },
    );
    let writer_handle = tokio::spawn(writer_task(writer, rx));

    info!(addr = %addr, conn = %conn, "Peer connected");

    loop {
        tokio::select! {
            result = read_frame(&mut reader) => {
                match result {
                    Ok(payload) => handle_payload(&hub, conn, &payload).await,
                    Err(Error::ConnectionClosed) => {
                        debug!(conn = %conn, "Connection closed");
                        break;
                    }
                    Err(e) => {
                        warn!(conn = %conn, error = %e, "Read error");
                        break;
                    }
                }
            }
            _ = &mut close_rx => {
                debug!(conn = %conn, "Peer evicted");
                break;
            }
            _ = shutdown_rx.recv() => {
                break;
            }
        }
    }

    // Cleanup
    writer_handle.abort();
    hub.write().await.drop_peer(conn);

    info!(conn = %conn, "Peer disconnected");
}

/// Decode one payload and run it through the dispatcher
async fn handle_payload(hub: &Arc<RwLock<Hub>>, conn: ConnectionId, payload: &[u8]) {
    let mut hub = hub.write().await;
    hub.touch(conn);

    match ClientFrame::from_bytes(payload) {
        Ok(ClientFrame::Pong) => {}
        Ok(ClientFrame::Intent(intent)) => {
            debug!(conn = %conn, intent = intent.kind(), "Intent received");
            hub.handle(conn, intent);
        }
        Err(e) => {
            debug!(conn = %conn, error = %e, "Ignoring malformed message");
        }
    }
}

/// Writer task - sends frames to the client
async fn writer_task(mut writer: WriteHalf<TcpStream>, mut rx: mpsc::Receiver<ServerFrame>) {
    while let Some(frame) = rx.recv().await {
        let payload = match frame.to_bytes() {
            Ok(payload) => payload,
            Err(e) => {
                warn!(error = %e, "Failed to encode frame");
                continue;
            }
        };
        if let Err(e) = write_frame(&mut writer, &payload).await {
            debug!(error = %e, "Write failed");
            break;
        }
    }
}

/// Heartbeat task - pings every peer and drops the ones gone quiet
async fn heartbeat_task(
    hub: Arc<RwLock<Hub>>,
    interval: Duration,
    timeout: Duration,
    mut shutdown_rx: broadcast::Receiver<()>,
) {
    loop {
        tokio::select! {
            _ = tokio::time::sleep(interval) => {
                let mut hub = hub.write().await;
                for conn in hub.stale_peers(timeout) {
                    info!(conn = %conn, "Peer timed out");
                    hub.drop_peer(conn);
                }
                hub.ping_all();
            }
            _ = shutdown_rx.recv() => {
                debug!("Heartbeat task shutting down");
                break;
            }
        }
    }
}

/// Sweep task - closes rooms nobody has touched in a while
async fn sweep_task(
    hub: Arc<RwLock<Hub>>,
    interval: Duration,
    max_idle: chrono::Duration,
    mut shutdown_rx: broadcast::Receiver<()>,
) {
    loop {
        tokio::select! {
            _ = tokio::time::sleep(interval) => {
                let mut hub = hub.write().await;
                let out = hub.dispatcher.sweep_idle(Utc::now(), max_idle);
                hub.deliver(out);
            }
            _ = shutdown_rx.recv() => {
                debug!("Sweep task shutting down");
                break;
            }
        }
    }
}
