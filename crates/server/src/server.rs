use std::collections::VecDeque;
use std::io;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use drifter::net::{
    ConnectAck, ConnectRequest, FramePoll, FrameReader, HEADER_LEN, InputFlags, Message,
    MessageType, PlayerState, Pong, ProjectileState, ProtocolError, RejectReason, Snapshot,
    patch_snapshot_ack, recv_exact, send_all, RecvExact,
};

use crate::config::ServerConfig;
use crate::events::{DisconnectReason, ServerEvent};
use crate::simulation::{self, Projectile, Ship};

/// A client that must finish its handshake before it can hold a slot.
const HANDSHAKE_TIMEOUT: Duration = Duration::from_millis(500);

/// A connected player: its socket, stream assembly state, and ship.
#[derive(Debug)]
struct PlayerSlot {
    stream: TcpStream,
    addr: SocketAddr,
    name: String,
    reader: FrameReader,
    /// Highest input sequence applied; older or duplicate inputs are
    /// discarded so reordered packets cannot roll state back.
    last_sequence: u32,
    input: InputFlags,
    ship: Ship,
}

#[derive(Debug, Clone, Copy)]
pub struct ServerStats {
    pub tick: u32,
    pub player_count: usize,
    pub max_players: usize,
    pub projectile_count: usize,
}

/// Authoritative game server. Single-threaded: one loop accepts
/// connections, drains client input, steps the simulation at a fixed
/// rate, and broadcasts snapshots. Clients only ever see server state.
pub struct GameServer {
    listener: TcpListener,
    local_addr: SocketAddr,
    config: ServerConfig,
    tick_duration: Duration,
    players: Vec<Option<PlayerSlot>>,
    projectiles: Vec<Option<Projectile>>,
    tick: u32,
    last_tick_time: Instant,
    accumulator: Duration,
    running: Arc<AtomicBool>,
    pending_events: VecDeque<ServerEvent>,
}

impl GameServer {
    pub fn new(bind_addr: &str, mut config: ServerConfig) -> io::Result<Self> {
        let listener = TcpListener::bind(bind_addr)?;
        listener.set_nonblocking(true)?;
        let local_addr = listener.local_addr()?;
        log::info!(
            "server listening on {local_addr}, {} slots, {} Hz",
            config.max_players,
            config.tick_rate
        );

        // Snapshot counts travel as u8, so both caps stop at 255; a
        // larger cap would let the encoder truncate the advertised
        // count and every recipient would reject the frame.
        let max_players = config.max_players.min(u8::MAX as usize);
        config.snapshot_projectile_cap = config.snapshot_projectile_cap.min(u8::MAX as usize);
        let tick_duration = Duration::from_secs_f64(1.0 / config.tick_rate.max(1) as f64);
        Ok(Self {
            listener,
            local_addr,
            players: (0..max_players).map(|_| None).collect(),
            projectiles: vec![None; config.max_projectiles],
            config,
            tick_duration,
            tick: 0,
            last_tick_time: Instant::now(),
            accumulator: Duration::ZERO,
            running: Arc::new(AtomicBool::new(true)),
            pending_events: VecDeque::new(),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Shared stop flag; flip it from another thread to end `run`.
    pub fn running(&self) -> Arc<AtomicBool> {
        self.running.clone()
    }

    pub fn player_count(&self) -> usize {
        self.players.iter().flatten().count()
    }

    pub fn stats(&self) -> ServerStats {
        ServerStats {
            tick: self.tick,
            player_count: self.player_count(),
            max_players: self.players.len(),
            projectile_count: self.projectiles.iter().flatten().count(),
        }
    }

    pub fn drain_events(&mut self) -> impl Iterator<Item = ServerEvent> + '_ {
        self.pending_events.drain(..)
    }

    /// Runs until the stop flag clears, logging drained events.
    pub fn run(&mut self) {
        let mut last_stats = Instant::now();
        while self.running.load(Ordering::SeqCst) {
            self.tick_once();
            let events: Vec<_> = self.drain_events().collect();
            for event in events {
                self.log_event(&event);
            }
            if last_stats.elapsed() >= Duration::from_secs(10) {
                last_stats = Instant::now();
                let stats = self.stats();
                log::debug!(
                    "tick {}: {}/{} players, {} projectiles",
                    stats.tick,
                    stats.player_count,
                    stats.max_players,
                    stats.projectile_count
                );
            }
            std::thread::sleep(Duration::from_millis(1));
        }
        log::info!("server stopped at tick {}", self.tick);
    }

    /// One pass of the main loop: network first, then as many fixed
    /// simulation steps as wall time owes us.
    pub fn tick_once(&mut self) {
        self.accept_pending();
        self.poll_clients();

        let now = Instant::now();
        self.accumulator += now - self.last_tick_time;
        self.last_tick_time = now;

        while self.accumulator >= self.tick_duration {
            self.accumulator -= self.tick_duration;
            self.step_simulation();
            self.broadcast_state();
            self.tick = self.tick.wrapping_add(1);
        }
    }

    fn log_event(&self, event: &ServerEvent) {
        match event {
            ServerEvent::ClientConnected {
                player_id,
                addr,
                name,
            } => log::info!("player {player_id} ({name}) connected from {addr}"),
            ServerEvent::ClientDisconnected { player_id, reason } => {
                log::info!("player {player_id} left: {}", reason.as_str())
            }
            ServerEvent::ConnectionDenied { addr, reason } => {
                log::warn!("denied {addr}: {}", reason.as_str())
            }
            ServerEvent::Error { message } => log::error!("{message}"),
        }
    }

    fn accept_pending(&mut self) {
        loop {
            match self.listener.accept() {
                Ok((stream, addr)) => self.handshake(stream, addr),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) => {
                    self.pending_events.push_back(ServerEvent::Error {
                        message: format!("accept failed: {e}"),
                    });
                    break;
                }
            }
        }
    }

    /// Blocking read of the connect request, bounded by a short timeout
    /// so a stalled client cannot hold up the tick loop. The socket goes
    /// non-blocking only after the slot is assigned.
    fn handshake(&mut self, mut stream: TcpStream, addr: SocketAddr) {
        // Accepted sockets may inherit the listener's non-blocking mode.
        if stream.set_nonblocking(false).is_err()
            || stream.set_read_timeout(Some(HANDSHAKE_TIMEOUT)).is_err()
        {
            return;
        }

        let request = match read_connect_request(&mut stream) {
            Ok(request) => request,
            Err(HandshakeFailure::BadVersion) => {
                let _ = send_all(
                    &mut stream,
                    &Message::ConnectAck(ConnectAck::rejected(RejectReason::VersionMismatch))
                        .encode(),
                );
                self.pending_events.push_back(ServerEvent::ConnectionDenied {
                    addr,
                    reason: RejectReason::VersionMismatch,
                });
                return;
            }
            Err(HandshakeFailure::Invalid(detail)) => {
                log::warn!("handshake with {addr} failed: {detail}");
                return;
            }
        };

        let Some(slot) = self.players.iter().position(Option::is_none) else {
            let _ = send_all(
                &mut stream,
                &Message::ConnectAck(ConnectAck::rejected(RejectReason::ServerFull)).encode(),
            );
            self.pending_events.push_back(ServerEvent::ConnectionDenied {
                addr,
                reason: RejectReason::ServerFull,
            });
            return;
        };

        let player_id = slot as u8;
        let ack = Message::ConnectAck(ConnectAck::accepted(player_id));
        if send_all(&mut stream, &ack.encode()).is_err() {
            log::warn!("handshake with {addr} failed: could not send ack");
            return;
        }
        if stream.set_nonblocking(true).is_err() || stream.set_read_timeout(None).is_err() {
            return;
        }
        let _ = stream.set_nodelay(true);

        let name = if request.name.is_empty() {
            format!("Player{}", slot + 1)
        } else {
            request.name
        };
        self.players[slot] = Some(PlayerSlot {
            stream,
            addr,
            name: name.clone(),
            reader: FrameReader::new(),
            last_sequence: 0,
            input: InputFlags::empty(),
            ship: Ship::spawn(slot),
        });
        self.pending_events.push_back(ServerEvent::ClientConnected {
            player_id,
            addr,
            name,
        });
    }

    /// Drains every connected socket until it would block. A slot that
    /// fails in any way is freed; the rest are untouched.
    fn poll_clients(&mut self) {
        for id in 0..self.players.len() {
            let Some(slot) = &mut self.players[id] else {
                continue;
            };
            let mut drop_reason = None;
            loop {
                match slot.reader.poll(&mut slot.stream) {
                    Ok(FramePoll::Frame(frame)) => {
                        match handle_frame(slot, id as u8, self.tick, frame.kind, &frame.payload) {
                            Ok(None) => {}
                            Ok(Some(reason)) => {
                                drop_reason = Some(reason);
                                break;
                            }
                            Err(e) => {
                                log::warn!("player {id} protocol violation: {e}");
                                drop_reason = Some(DisconnectReason::ProtocolViolation);
                                break;
                            }
                        }
                    }
                    Ok(FramePoll::Pending) => break,
                    Ok(FramePoll::Closed) => {
                        drop_reason = Some(DisconnectReason::ConnectionClosed);
                        break;
                    }
                    Err(e) => {
                        log::warn!("player {id} read failed: {e}");
                        drop_reason = Some(DisconnectReason::TransportFailed);
                        break;
                    }
                }
            }
            if let Some(reason) = drop_reason {
                self.free_slot(id, reason);
            }
        }
    }

    fn free_slot(&mut self, id: usize, reason: DisconnectReason) {
        if let Some(slot) = self.players[id].take() {
            log::debug!("freeing slot {id} held by {} at {}", slot.name, slot.addr);
            self.pending_events.push_back(ServerEvent::ClientDisconnected {
                player_id: id as u8,
                reason,
            });
        }
    }

    fn step_simulation(&mut self) {
        let dt = self.tick_duration.as_secs_f32();
        for id in 0..self.players.len() {
            let Some(slot) = &mut self.players[id] else {
                continue;
            };
            simulation::step_ship(
                &mut slot.ship,
                id as u8,
                slot.input,
                dt,
                self.tick,
                &self.config.movement,
                &mut self.projectiles,
            );
        }
        simulation::step_projectiles(&mut self.projectiles, dt, self.config.movement.playfield);
    }

    /// Encodes the snapshot once and sends it to everyone, patching the
    /// per-recipient input ack into the shared buffer. A failed send
    /// drops only that client.
    fn broadcast_state(&mut self) {
        if self.player_count() == 0 {
            return;
        }

        let players: Vec<PlayerState> = self
            .players
            .iter()
            .enumerate()
            .filter_map(|(id, slot)| slot.as_ref().map(|slot| (id, slot)))
            .map(|(id, slot)| PlayerState {
                id: id as u8,
                position: slot.ship.position,
                velocity: slot.ship.velocity,
                health: slot.ship.health,
                weapon: slot.ship.weapon,
                flags: if slot.input.contains(InputFlags::FIRE) {
                    PlayerState::FLAG_FIRING
                } else {
                    0
                },
            })
            .collect();

        // Oldest projectiles win when the cap bites, so long-lived shots
        // do not flicker as new ones spawn.
        let mut live: Vec<&Projectile> = self.projectiles.iter().flatten().collect();
        live.sort_by_key(|p| p.spawned_tick);
        live.truncate(self.config.snapshot_projectile_cap);
        let projectiles = live
            .into_iter()
            .map(|p| ProjectileState {
                owner: p.owner,
                position: p.position,
                velocity: p.velocity,
                weapon: p.weapon,
            })
            .collect();

        let mut frame = Message::GameState(Snapshot {
            tick: self.tick,
            acked_sequence: 0,
            players,
            projectiles,
        })
        .encode();

        let mut failed = Vec::new();
        for id in 0..self.players.len() {
            let Some(slot) = &mut self.players[id] else {
                continue;
            };
            patch_snapshot_ack(&mut frame, slot.last_sequence);
            if let Err(e) = send_all(&mut slot.stream, &frame) {
                log::warn!("snapshot send to player {id} failed: {e}");
                failed.push(id);
            }
        }
        for id in failed {
            self.free_slot(id, DisconnectReason::SendFailed);
        }
    }
}

/// Applies one decoded frame from a connected client. Returns a reason
/// to drop the client, or `None` to keep going. Unknown message types
/// were framed correctly, so they are logged and skipped; payloads of
/// known types that fail to decode bubble up as errors.
fn handle_frame(
    slot: &mut PlayerSlot,
    player_id: u8,
    tick: u32,
    kind: u8,
    payload: &[u8],
) -> Result<Option<DisconnectReason>, ProtocolError> {
    let message = match Message::decode(kind, payload) {
        Ok(message) => message,
        Err(ProtocolError::UnknownMessageType(k)) => {
            log::debug!("ignoring unknown message type {k} from player {player_id}");
            return Ok(None);
        }
        Err(e) => return Err(e),
    };

    match message {
        Message::PlayerInput(input) => {
            if input.sequence > slot.last_sequence {
                slot.last_sequence = input.sequence;
                slot.input = input.flags;
                slot.ship.weapon = input.weapon;
            } else {
                log::trace!(
                    "player {player_id} input {} at or behind {}, dropped",
                    input.sequence,
                    slot.last_sequence
                );
            }
            Ok(None)
        }
        Message::Disconnect => Ok(Some(DisconnectReason::Graceful)),
        Message::Ping(ping) => {
            let pong = Message::Pong(Pong {
                client_timestamp: ping.timestamp,
                server_timestamp: tick,
            });
            if send_all(&mut slot.stream, &pong.encode()).is_err() {
                return Ok(Some(DisconnectReason::SendFailed));
            }
            Ok(None)
        }
        other => {
            log::debug!(
                "ignoring {:?} from player {player_id}",
                other.kind()
            );
            Ok(None)
        }
    }
}

enum HandshakeFailure {
    BadVersion,
    Invalid(String),
}

fn read_connect_request(stream: &mut TcpStream) -> Result<ConnectRequest, HandshakeFailure> {
    let mut header = [0u8; HEADER_LEN];
    match recv_exact(stream, &mut header) {
        Ok(RecvExact::Complete) => {}
        Ok(_) => return Err(HandshakeFailure::Invalid("no connect header".into())),
        Err(e) => return Err(HandshakeFailure::Invalid(e.to_string())),
    }
    let kind = header[0];
    let len = u16::from_be_bytes([header[1], header[2]]) as usize;
    if kind != MessageType::Connect as u8 || len != ConnectRequest::WIRE_SIZE {
        return Err(HandshakeFailure::Invalid(format!(
            "expected connect request, got type {kind} with {len} bytes"
        )));
    }

    let mut payload = vec![0u8; len];
    match recv_exact(stream, &mut payload) {
        Ok(RecvExact::Complete) => {}
        Ok(_) => return Err(HandshakeFailure::Invalid("truncated connect request".into())),
        Err(e) => return Err(HandshakeFailure::Invalid(e.to_string())),
    }
    match Message::decode(kind, &payload) {
        Ok(Message::Connect(request)) => Ok(request),
        Err(ProtocolError::VersionMismatch { .. }) => Err(HandshakeFailure::BadVersion),
        Ok(other) => Err(HandshakeFailure::Invalid(format!(
            "unexpected {:?} during handshake",
            other.kind()
        ))),
        Err(e) => Err(HandshakeFailure::Invalid(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drifter::net::{PlayerInput, Ping, PROTOCOL_VERSION};
    use drifter::weapon::WeaponKind;
    use std::io::Write;

    fn test_server(max_players: usize) -> GameServer {
        let config = ServerConfig {
            max_players,
            ..ServerConfig::default()
        };
        GameServer::new("127.0.0.1:0", config).unwrap()
    }

    /// Connects, sends a connect request, and pumps the server until the
    /// ack arrives.
    fn connect(server: &mut GameServer, version: u8, name: &str) -> (TcpStream, ConnectAck) {
        let mut stream = TcpStream::connect(server.local_addr()).unwrap();
        stream
            .set_read_timeout(Some(Duration::from_secs(2)))
            .unwrap();
        // Mirror the server side: without TCP_NODELAY, Nagle holds
        // back-to-back test frames until the next server ACK.
        stream.set_nodelay(true).unwrap();

        let mut frame = Message::Connect(ConnectRequest::new(name)).encode();
        frame[HEADER_LEN] = version;
        stream.write_all(&frame).unwrap();

        // Give loopback a moment to deliver before the server polls.
        std::thread::sleep(Duration::from_millis(20));
        server.tick_once();

        match read_message(&mut stream) {
            Message::ConnectAck(ack) => (stream, ack),
            other => panic!("expected ack, got {other:?}"),
        }
    }

    /// Blocking read of the next frame; the stream's read timeout bounds
    /// the wait.
    fn read_message(stream: &mut TcpStream) -> Message {
        let mut reader = FrameReader::new();
        loop {
            match reader.poll(stream).unwrap() {
                FramePoll::Frame(frame) => {
                    return Message::decode(frame.kind, &frame.payload).unwrap();
                }
                FramePoll::Pending => {}
                FramePoll::Closed => panic!("server closed the connection"),
            }
        }
    }

    fn pump(server: &mut GameServer) {
        std::thread::sleep(Duration::from_millis(20));
        server.tick_once();
    }

    #[test]
    fn handshake_assigns_distinct_slots_until_full() {
        let mut server = test_server(4);
        let mut streams = Vec::new();
        let mut ids = Vec::new();
        for i in 0..4 {
            let (stream, ack) = connect(&mut server, PROTOCOL_VERSION, &format!("p{i}"));
            assert!(ack.accepted);
            ids.push(ack.player_id);
            streams.push(stream);
        }
        ids.sort_unstable();
        assert_eq!(ids, vec![0, 1, 2, 3]);
        assert_eq!(server.player_count(), 4);

        let (_stream, ack) = connect(&mut server, PROTOCOL_VERSION, "p5");
        assert!(!ack.accepted);
        assert_eq!(ack.reason, Some(RejectReason::ServerFull));
        assert_eq!(server.player_count(), 4);
    }

    #[test]
    fn snapshot_caps_are_clamped_to_the_wire_limit() {
        let config = ServerConfig {
            max_players: 600,
            snapshot_projectile_cap: 1000,
            ..ServerConfig::default()
        };
        let server = GameServer::new("127.0.0.1:0", config).unwrap();
        assert_eq!(server.players.len(), u8::MAX as usize);
        assert_eq!(server.config.snapshot_projectile_cap, u8::MAX as usize);
    }

    #[test]
    fn version_mismatch_is_rejected_without_a_slot() {
        let mut server = test_server(4);
        let (_stream, ack) = connect(&mut server, PROTOCOL_VERSION + 1, "old");
        assert!(!ack.accepted);
        assert_eq!(ack.reason, Some(RejectReason::VersionMismatch));
        assert_eq!(server.player_count(), 0);
    }

    #[test]
    fn stale_and_duplicate_inputs_are_discarded() {
        let mut server = test_server(2);
        let (mut stream, ack) = connect(&mut server, PROTOCOL_VERSION, "seq");
        assert!(ack.accepted);

        let inputs = [
            (5, InputFlags::RIGHT),
            (3, InputFlags::UP),
            (7, InputFlags::LEFT),
            (7, InputFlags::DOWN),
            (6, InputFlags::FIRE),
        ];
        for (sequence, flags) in inputs {
            let frame = Message::PlayerInput(PlayerInput {
                player_id: ack.player_id,
                flags,
                weapon: WeaponKind::Spread,
                sequence,
            })
            .encode();
            stream.write_all(&frame).unwrap();
        }

        pump(&mut server);
        std::thread::sleep(Duration::from_millis(20));
        server.tick_once();

        // Skip snapshots broadcast before the inputs landed.
        for _ in 0..20 {
            if let Message::GameState(snapshot) = read_message(&mut stream)
                && snapshot.acked_sequence != 0
            {
                assert_eq!(snapshot.acked_sequence, 7);
                // The ship obeys sequence 7 (LEFT), not the late arrivals.
                assert!(snapshot.players[0].velocity.x < 0.0);
                return;
            }
        }
        panic!("no snapshot with a non-zero ack");
    }

    #[test]
    fn graceful_disconnect_frees_the_slot() {
        let mut server = test_server(1);
        let (mut stream, ack) = connect(&mut server, PROTOCOL_VERSION, "leaver");
        assert!(ack.accepted);

        stream.write_all(&Message::Disconnect.encode()).unwrap();
        pump(&mut server);
        assert_eq!(server.player_count(), 0);

        // The slot is immediately reusable.
        let (_stream, ack) = connect(&mut server, PROTOCOL_VERSION, "joiner");
        assert!(ack.accepted);
        assert_eq!(ack.player_id, 0);
    }

    #[test]
    fn dropped_connection_frees_the_slot() {
        let mut server = test_server(1);
        let (stream, ack) = connect(&mut server, PROTOCOL_VERSION, "vanisher");
        assert!(ack.accepted);

        drop(stream);
        pump(&mut server);
        assert_eq!(server.player_count(), 0);
    }

    #[test]
    fn ping_gets_a_pong() {
        let mut server = test_server(1);
        let (mut stream, _ack) = connect(&mut server, PROTOCOL_VERSION, "pinger");

        stream
            .write_all(&Message::Ping(Ping { timestamp: 123 }).encode())
            .unwrap();
        pump(&mut server);

        // Snapshots may interleave with the pong.
        for _ in 0..20 {
            if let Message::Pong(pong) = read_message(&mut stream) {
                assert_eq!(pong.client_timestamp, 123);
                return;
            }
        }
        panic!("no pong received");
    }

    #[test]
    fn undecodable_payload_drops_the_client() {
        let mut server = test_server(1);
        let (mut stream, _ack) = connect(&mut server, PROTOCOL_VERSION, "bad");

        // Correctly framed input message with a truncated payload.
        let frame = [MessageType::PlayerInput as u8, 0, 2, 0xAA, 0xBB];
        stream.write_all(&frame).unwrap();
        pump(&mut server);
        assert_eq!(server.player_count(), 0);
    }

    #[test]
    fn unknown_message_type_is_ignored() {
        let mut server = test_server(1);
        let (mut stream, ack) = connect(&mut server, PROTOCOL_VERSION, "odd");

        stream.write_all(&[250u8, 0, 1, 0xFF]).unwrap();
        stream
            .write_all(
                &Message::PlayerInput(PlayerInput {
                    player_id: ack.player_id,
                    flags: InputFlags::UP,
                    weapon: WeaponKind::Rapid,
                    sequence: 1,
                })
                .encode(),
            )
            .unwrap();
        pump(&mut server);
        std::thread::sleep(Duration::from_millis(20));
        server.tick_once();

        assert_eq!(server.player_count(), 1);
        for _ in 0..20 {
            if let Message::GameState(snapshot) = read_message(&mut stream)
                && snapshot.acked_sequence == 1
            {
                return;
            }
        }
        panic!("input after the unknown frame was not applied");
    }
}
