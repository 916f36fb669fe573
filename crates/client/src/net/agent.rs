use std::io;
use std::net::TcpStream;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use drifter::net::{
    ConnectAck, ConnectRequest, FramePoll, FrameReader, Message, Ping, PlayerInput, ProtocolError,
    send_all,
};

use crate::net::config::ClientConfig;
use crate::net::shared::{ConnectionStatus, SharedState, SnapshotView};

const PING_INTERVAL: Duration = Duration::from_secs(1);

/// Background thread that owns the socket. It performs the handshake,
/// then alternates between draining inbound frames and sending the
/// latest input at a fixed rate. Everything it learns goes through
/// [`SharedState`]; it never touches anything else.
pub struct NetworkAgent {
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl NetworkAgent {
    pub fn spawn(config: ClientConfig, shared: Arc<SharedState>) -> io::Result<Self> {
        let running = Arc::new(AtomicBool::new(true));
        let thread_flag = running.clone();
        let handle = std::thread::Builder::new()
            .name("net-agent".into())
            .spawn(move || run(config, shared, thread_flag))?;
        Ok(Self {
            running,
            handle: Some(handle),
        })
    }

    /// Asks the thread to stop and waits for it. Idempotent via `Drop`.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for NetworkAgent {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run(config: ClientConfig, shared: Arc<SharedState>, running: Arc<AtomicBool>) {
    shared.set_status(
        ConnectionStatus::Connecting,
        format!("connecting to {}:{}", config.host, config.port),
    );

    let mut stream = match TcpStream::connect((config.host.as_str(), config.port)) {
        Ok(stream) => stream,
        Err(e) => {
            shared.set_status(ConnectionStatus::Error, format!("connect failed: {e}"));
            return;
        }
    };

    match handshake(&mut stream, &config) {
        Ok(ack) => {
            shared.set_local_id(ack.player_id);
            shared.set_status(
                ConnectionStatus::Connected,
                format!("connected as player {}", ack.player_id),
            );
        }
        Err(message) => {
            shared.set_status(ConnectionStatus::Error, message);
            return;
        }
    }

    if stream.set_nonblocking(true).is_err() {
        shared.set_status(ConnectionStatus::Error, "could not configure socket");
        return;
    }
    let _ = stream.set_read_timeout(None);
    let _ = stream.set_nodelay(true);

    steady_loop(&mut stream, &config, &shared, &running);

    // Cooperative stop with the link still up: tell the server we are
    // leaving. Failure paths already set their own status.
    if shared.status().0 == ConnectionStatus::Connected {
        let _ = send_all(&mut stream, &Message::Disconnect.encode());
        shared.set_status(ConnectionStatus::Disconnected, "disconnected");
    }
}

/// Blocking connect-request/ack exchange. Runs before the socket goes
/// non-blocking. An expired read timeout surfaces as a `Pending` poll,
/// not an error, so the deadline is enforced here; without it a server
/// that accepts but never answers would pin this thread forever.
fn handshake(stream: &mut TcpStream, config: &ClientConfig) -> Result<ConnectAck, String> {
    if stream.set_read_timeout(Some(config.connect_timeout)).is_err() {
        return Err("could not configure socket".into());
    }

    let hello = Message::Connect(ConnectRequest::new(config.display_name.clone()));
    send_all(stream, &hello.encode()).map_err(|e| format!("could not send connect: {e}"))?;

    let deadline = Instant::now() + config.connect_timeout;
    let mut reader = FrameReader::new();
    let frame = loop {
        match reader.poll(stream) {
            Ok(FramePoll::Frame(frame)) => break frame,
            Ok(FramePoll::Pending) => {
                if Instant::now() >= deadline {
                    return Err("handshake timed out".into());
                }
            }
            Ok(FramePoll::Closed) => return Err("server closed the connection".into()),
            Err(e) => return Err(format!("handshake failed: {e}")),
        }
    };
    match Message::decode(frame.kind, &frame.payload) {
        Ok(Message::ConnectAck(ack)) if ack.accepted => Ok(ack),
        Ok(Message::ConnectAck(ack)) => Err(ack
            .reason
            .map_or_else(|| "connection refused".into(), |r| r.as_str().to_owned())),
        Ok(other) => Err(format!("unexpected {:?} during handshake", other.kind())),
        Err(e) => Err(format!("handshake failed: {e}")),
    }
}

fn steady_loop(
    stream: &mut TcpStream,
    config: &ClientConfig,
    shared: &SharedState,
    running: &AtomicBool,
) {
    let send_interval = Duration::from_secs_f64(1.0 / config.send_rate.max(1) as f64);
    let mut reader = FrameReader::new();
    let started = std::time::Instant::now();
    let mut last_ping = started;

    while running.load(Ordering::SeqCst) {
        // Drain everything the server sent since the last pass.
        loop {
            match reader.poll(stream) {
                Ok(FramePoll::Frame(frame)) => {
                    match Message::decode(frame.kind, &frame.payload) {
                        Ok(Message::GameState(snapshot)) => {
                            shared.record_packet_received();
                            shared.publish_snapshot(SnapshotView {
                                server_tick: snapshot.tick,
                                players: snapshot.players,
                                projectiles: snapshot.projectiles,
                            });
                        }
                        Ok(Message::Pong(pong)) => {
                            let rtt = (started.elapsed().as_millis() as u32)
                                .saturating_sub(pong.client_timestamp);
                            log::debug!("pong after {rtt} ms, server tick {}", pong.server_timestamp);
                        }
                        Ok(other) => log::debug!("ignoring {:?}", other.kind()),
                        Err(ProtocolError::UnknownMessageType(k)) => {
                            log::debug!("ignoring unknown message type {k}");
                        }
                        Err(e) => {
                            log::warn!("undecodable frame from server: {e}");
                            shared.set_status(
                                ConnectionStatus::Error,
                                format!("protocol error: {e}"),
                            );
                            return;
                        }
                    }
                }
                Ok(FramePoll::Pending) => break,
                Ok(FramePoll::Closed) => {
                    shared.set_status(
                        ConnectionStatus::Disconnected,
                        "server closed the connection",
                    );
                    return;
                }
                Err(e) => {
                    shared.set_status(ConnectionStatus::Error, format!("connection lost: {e}"));
                    return;
                }
            }
        }

        // Latest state only; a missed interval is not queued up.
        let (flags, weapon, sequence) = shared.outbound_input();
        let input = Message::PlayerInput(PlayerInput {
            player_id: shared.local_id().unwrap_or(0),
            flags,
            weapon,
            sequence,
        });
        if let Err(e) = send_all(stream, &input.encode()) {
            shared.set_status(ConnectionStatus::Error, format!("send failed: {e}"));
            return;
        }
        shared.record_packet_sent();

        if last_ping.elapsed() >= PING_INTERVAL {
            last_ping = std::time::Instant::now();
            let ping = Message::Ping(Ping {
                timestamp: started.elapsed().as_millis() as u32,
            });
            if let Err(e) = send_all(stream, &ping.encode()) {
                shared.set_status(ConnectionStatus::Error, format!("send failed: {e}"));
                return;
            }
        }

        std::thread::sleep(send_interval);
    }
}
