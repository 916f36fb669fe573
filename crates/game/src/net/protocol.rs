use bitflags::bitflags;
use glam::Vec2;

use crate::weapon::WeaponKind;

pub const PROTOCOL_VERSION: u8 = 1;
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_TICK_RATE: u32 = 60;

/// Message type byte + payload length (big-endian u16).
pub const HEADER_LEN: usize = 3;

/// Fixed width of the name field in a connect request, NUL padded.
pub const NAME_LEN: usize = 16;

/// Snapshot counts are u8, which bounds the largest legal payload.
pub const MAX_PAYLOAD_LEN: usize = Snapshot::FIXED_SIZE
    + u8::MAX as usize * PlayerState::WIRE_SIZE
    + u8::MAX as usize * ProjectileState::WIRE_SIZE;

/// Byte offset of the acked-sequence field inside an encoded GameState
/// frame. The server patches this per recipient in a shared broadcast
/// buffer instead of re-encoding the whole snapshot.
pub const SNAPSHOT_ACK_OFFSET: usize = HEADER_LEN + 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MessageType {
    None = 0,
    Connect = 1,
    ConnectAck = 2,
    Disconnect = 3,
    PlayerInput = 4,
    GameState = 5,
    Ping = 6,
    Pong = 7,
}

impl TryFrom<u8> for MessageType {
    type Error = ProtocolError;

    fn try_from(value: u8) -> Result<Self, ProtocolError> {
        match value {
            0 => Ok(MessageType::None),
            1 => Ok(MessageType::Connect),
            2 => Ok(MessageType::ConnectAck),
            3 => Ok(MessageType::Disconnect),
            4 => Ok(MessageType::PlayerInput),
            5 => Ok(MessageType::GameState),
            6 => Ok(MessageType::Ping),
            7 => Ok(MessageType::Pong),
            other => Err(ProtocolError::UnknownMessageType(other)),
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("unknown message type {0}")]
    UnknownMessageType(u8),

    #[error("protocol version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: u8, actual: u8 },

    #[error("{ty:?} payload size mismatch: expected {expected}, got {actual}")]
    PayloadSizeMismatch {
        ty: MessageType,
        expected: usize,
        actual: usize,
    },

    #[error("invalid {field} value {value}")]
    InvalidField { field: &'static str, value: u8 },
}

bitflags! {
    /// Held-key bitfield sent with every input message. The upper three
    /// bits are reserved and stripped on decode.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct InputFlags: u8 {
        const UP = 1;
        const LEFT = 1 << 1;
        const DOWN = 1 << 2;
        const RIGHT = 1 << 3;
        const FIRE = 1 << 4;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RejectReason {
    ServerFull = 0,
    VersionMismatch = 1,
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::ServerFull => "server full",
            RejectReason::VersionMismatch => "protocol version mismatch",
        }
    }

    fn from_wire(value: u8) -> Result<Self, ProtocolError> {
        match value {
            0 => Ok(RejectReason::ServerFull),
            1 => Ok(RejectReason::VersionMismatch),
            _ => Err(ProtocolError::InvalidField {
                field: "reject reason",
                value,
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectRequest {
    pub version: u8,
    pub name: String,
}

impl ConnectRequest {
    pub const WIRE_SIZE: usize = 1 + NAME_LEN;

    pub fn new(name: impl Into<String>) -> Self {
        Self {
            version: PROTOCOL_VERSION,
            name: name.into(),
        }
    }

    fn encode_into(&self, buf: &mut Vec<u8>) {
        buf.push(self.version);
        let bytes = self.name.as_bytes();
        let take = bytes.len().min(NAME_LEN);
        buf.extend_from_slice(&bytes[..take]);
        buf.extend(std::iter::repeat_n(0u8, NAME_LEN - take));
    }

    fn decode(payload: &[u8]) -> Result<Self, ProtocolError> {
        check_size(MessageType::Connect, Self::WIRE_SIZE, payload)?;
        let version = payload[0];
        if version != PROTOCOL_VERSION {
            return Err(ProtocolError::VersionMismatch {
                expected: PROTOCOL_VERSION,
                actual: version,
            });
        }
        let raw = &payload[1..1 + NAME_LEN];
        let end = raw.iter().position(|&b| b == 0).unwrap_or(NAME_LEN);
        let name = String::from_utf8_lossy(&raw[..end]).into_owned();
        Ok(Self { version, name })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectAck {
    pub accepted: bool,
    pub player_id: u8,
    pub reason: Option<RejectReason>,
}

impl ConnectAck {
    pub const WIRE_SIZE: usize = 3;

    pub fn accepted(player_id: u8) -> Self {
        Self {
            accepted: true,
            player_id,
            reason: None,
        }
    }

    pub fn rejected(reason: RejectReason) -> Self {
        Self {
            accepted: false,
            player_id: 0,
            reason: Some(reason),
        }
    }

    fn encode_into(&self, buf: &mut Vec<u8>) {
        buf.push(self.accepted as u8);
        buf.push(self.player_id);
        buf.push(self.reason.map_or(0, |r| r as u8));
    }

    fn decode(payload: &[u8]) -> Result<Self, ProtocolError> {
        check_size(MessageType::ConnectAck, Self::WIRE_SIZE, payload)?;
        let accepted = payload[0] != 0;
        let reason = if accepted {
            None
        } else {
            Some(RejectReason::from_wire(payload[2])?)
        };
        Ok(Self {
            accepted,
            player_id: payload[1],
            reason,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerInput {
    pub player_id: u8,
    pub flags: InputFlags,
    pub weapon: WeaponKind,
    pub sequence: u32,
}

impl PlayerInput {
    pub const WIRE_SIZE: usize = 7;

    fn encode_into(&self, buf: &mut Vec<u8>) {
        buf.push(self.player_id);
        buf.push(self.flags.bits());
        buf.push(self.weapon as u8);
        buf.extend_from_slice(&self.sequence.to_be_bytes());
    }

    fn decode(payload: &[u8]) -> Result<Self, ProtocolError> {
        check_size(MessageType::PlayerInput, Self::WIRE_SIZE, payload)?;
        Ok(Self {
            player_id: payload[0],
            flags: InputFlags::from_bits_truncate(payload[1]),
            weapon: decode_weapon(payload[2])?,
            sequence: u32::from_be_bytes([payload[3], payload[4], payload[5], payload[6]]),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerState {
    pub id: u8,
    pub position: Vec2,
    pub velocity: Vec2,
    pub health: i16,
    pub weapon: WeaponKind,
    pub flags: u8,
}

impl PlayerState {
    pub const WIRE_SIZE: usize = 21;

    /// Set when the player was holding fire on the snapshot tick.
    pub const FLAG_FIRING: u8 = 1;

    fn encode_into(&self, buf: &mut Vec<u8>) {
        buf.push(self.id);
        put_vec2(buf, self.position);
        put_vec2(buf, self.velocity);
        buf.extend_from_slice(&self.health.to_be_bytes());
        buf.push(self.weapon as u8);
        buf.push(self.flags);
    }

    fn decode(payload: &[u8]) -> Result<Self, ProtocolError> {
        check_size(MessageType::GameState, Self::WIRE_SIZE, payload)?;
        Ok(Self {
            id: payload[0],
            position: get_vec2(&payload[1..9]),
            velocity: get_vec2(&payload[9..17]),
            health: i16::from_be_bytes([payload[17], payload[18]]),
            weapon: decode_weapon(payload[19])?,
            flags: payload[20],
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectileState {
    pub owner: u8,
    pub position: Vec2,
    pub velocity: Vec2,
    pub weapon: WeaponKind,
}

impl ProjectileState {
    pub const WIRE_SIZE: usize = 18;

    fn encode_into(&self, buf: &mut Vec<u8>) {
        buf.push(self.owner);
        put_vec2(buf, self.position);
        put_vec2(buf, self.velocity);
        buf.push(self.weapon as u8);
    }

    fn decode(payload: &[u8]) -> Result<Self, ProtocolError> {
        check_size(MessageType::GameState, Self::WIRE_SIZE, payload)?;
        Ok(Self {
            owner: payload[0],
            position: get_vec2(&payload[1..9]),
            velocity: get_vec2(&payload[9..17]),
            weapon: decode_weapon(payload[17])?,
        })
    }
}

/// Full world state for one server tick: every active player followed by
/// every synced projectile. State replication, not deltas; a lost snapshot
/// is superseded by the next one.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub tick: u32,
    /// Last input sequence the server accepted from the recipient.
    /// Patched per recipient during broadcast.
    pub acked_sequence: u32,
    pub players: Vec<PlayerState>,
    pub projectiles: Vec<ProjectileState>,
}

impl Snapshot {
    pub const FIXED_SIZE: usize = 10;

    pub fn wire_size(&self) -> usize {
        Self::FIXED_SIZE
            + self.players.len() * PlayerState::WIRE_SIZE
            + self.projectiles.len() * ProjectileState::WIRE_SIZE
    }

    fn encode_into(&self, buf: &mut Vec<u8>) {
        debug_assert!(self.players.len() <= u8::MAX as usize);
        debug_assert!(self.projectiles.len() <= u8::MAX as usize);
        buf.extend_from_slice(&self.tick.to_be_bytes());
        buf.extend_from_slice(&self.acked_sequence.to_be_bytes());
        buf.push(self.players.len() as u8);
        buf.push(self.projectiles.len() as u8);
        for player in &self.players {
            player.encode_into(buf);
        }
        for projectile in &self.projectiles {
            projectile.encode_into(buf);
        }
    }

    fn decode(payload: &[u8]) -> Result<Self, ProtocolError> {
        if payload.len() < Self::FIXED_SIZE {
            return Err(ProtocolError::PayloadSizeMismatch {
                ty: MessageType::GameState,
                expected: Self::FIXED_SIZE,
                actual: payload.len(),
            });
        }
        let tick = u32::from_be_bytes([payload[0], payload[1], payload[2], payload[3]]);
        let acked_sequence = u32::from_be_bytes([payload[4], payload[5], payload[6], payload[7]]);
        let player_count = payload[8] as usize;
        let projectile_count = payload[9] as usize;

        let expected = Self::FIXED_SIZE
            + player_count * PlayerState::WIRE_SIZE
            + projectile_count * ProjectileState::WIRE_SIZE;
        check_size(MessageType::GameState, expected, payload)?;

        let mut offset = Self::FIXED_SIZE;
        let mut players = Vec::with_capacity(player_count);
        for _ in 0..player_count {
            players.push(PlayerState::decode(
                &payload[offset..offset + PlayerState::WIRE_SIZE],
            )?);
            offset += PlayerState::WIRE_SIZE;
        }
        let mut projectiles = Vec::with_capacity(projectile_count);
        for _ in 0..projectile_count {
            projectiles.push(ProjectileState::decode(
                &payload[offset..offset + ProjectileState::WIRE_SIZE],
            )?);
            offset += ProjectileState::WIRE_SIZE;
        }

        Ok(Self {
            tick,
            acked_sequence,
            players,
            projectiles,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ping {
    pub timestamp: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pong {
    pub client_timestamp: u32,
    pub server_timestamp: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Connect(ConnectRequest),
    ConnectAck(ConnectAck),
    Disconnect,
    PlayerInput(PlayerInput),
    GameState(Snapshot),
    Ping(Ping),
    Pong(Pong),
}

impl Message {
    pub fn kind(&self) -> MessageType {
        match self {
            Message::Connect(_) => MessageType::Connect,
            Message::ConnectAck(_) => MessageType::ConnectAck,
            Message::Disconnect => MessageType::Disconnect,
            Message::PlayerInput(_) => MessageType::PlayerInput,
            Message::GameState(_) => MessageType::GameState,
            Message::Ping(_) => MessageType::Ping,
            Message::Pong(_) => MessageType::Pong,
        }
    }

    pub fn payload_len(&self) -> usize {
        match self {
            Message::Connect(_) => ConnectRequest::WIRE_SIZE,
            Message::ConnectAck(_) => ConnectAck::WIRE_SIZE,
            Message::Disconnect => 0,
            Message::PlayerInput(_) => PlayerInput::WIRE_SIZE,
            Message::GameState(snapshot) => snapshot.wire_size(),
            Message::Ping(_) => 4,
            Message::Pong(_) => 8,
        }
    }

    /// Encodes the message as a complete frame: header plus payload,
    /// every multi-byte field big-endian, no padding anywhere.
    pub fn encode(&self) -> Vec<u8> {
        let payload_len = self.payload_len();
        let mut buf = Vec::with_capacity(HEADER_LEN + payload_len);
        buf.push(self.kind() as u8);
        buf.extend_from_slice(&(payload_len as u16).to_be_bytes());
        match self {
            Message::Connect(req) => req.encode_into(&mut buf),
            Message::ConnectAck(ack) => ack.encode_into(&mut buf),
            Message::Disconnect => {}
            Message::PlayerInput(input) => input.encode_into(&mut buf),
            Message::GameState(snapshot) => snapshot.encode_into(&mut buf),
            Message::Ping(ping) => buf.extend_from_slice(&ping.timestamp.to_be_bytes()),
            Message::Pong(pong) => {
                buf.extend_from_slice(&pong.client_timestamp.to_be_bytes());
                buf.extend_from_slice(&pong.server_timestamp.to_be_bytes());
            }
        }
        debug_assert_eq!(buf.len(), HEADER_LEN + payload_len);
        buf
    }

    /// Decodes a framed payload. `kind` is the raw type byte from the
    /// header; the payload must be exactly the size the type dictates.
    pub fn decode(kind: u8, payload: &[u8]) -> Result<Message, ProtocolError> {
        match MessageType::try_from(kind)? {
            // The zero type byte is reserved and never valid on the wire.
            MessageType::None => Err(ProtocolError::UnknownMessageType(kind)),
            MessageType::Connect => Ok(Message::Connect(ConnectRequest::decode(payload)?)),
            MessageType::ConnectAck => Ok(Message::ConnectAck(ConnectAck::decode(payload)?)),
            MessageType::Disconnect => {
                check_size(MessageType::Disconnect, 0, payload)?;
                Ok(Message::Disconnect)
            }
            MessageType::PlayerInput => Ok(Message::PlayerInput(PlayerInput::decode(payload)?)),
            MessageType::GameState => Ok(Message::GameState(Snapshot::decode(payload)?)),
            MessageType::Ping => {
                check_size(MessageType::Ping, 4, payload)?;
                Ok(Message::Ping(Ping {
                    timestamp: u32::from_be_bytes([payload[0], payload[1], payload[2], payload[3]]),
                }))
            }
            MessageType::Pong => {
                check_size(MessageType::Pong, 8, payload)?;
                Ok(Message::Pong(Pong {
                    client_timestamp: u32::from_be_bytes([
                        payload[0], payload[1], payload[2], payload[3],
                    ]),
                    server_timestamp: u32::from_be_bytes([
                        payload[4], payload[5], payload[6], payload[7],
                    ]),
                }))
            }
        }
    }
}

/// Rewrites the acked-sequence field of an already encoded GameState frame.
pub fn patch_snapshot_ack(frame: &mut [u8], sequence: u32) {
    debug_assert_eq!(frame[0], MessageType::GameState as u8);
    frame[SNAPSHOT_ACK_OFFSET..SNAPSHOT_ACK_OFFSET + 4].copy_from_slice(&sequence.to_be_bytes());
}

fn check_size(ty: MessageType, expected: usize, payload: &[u8]) -> Result<(), ProtocolError> {
    if payload.len() != expected {
        return Err(ProtocolError::PayloadSizeMismatch {
            ty,
            expected,
            actual: payload.len(),
        });
    }
    Ok(())
}

fn decode_weapon(value: u8) -> Result<WeaponKind, ProtocolError> {
    WeaponKind::from_wire(value).ok_or(ProtocolError::InvalidField {
        field: "weapon",
        value,
    })
}

fn put_vec2(buf: &mut Vec<u8>, v: Vec2) {
    buf.extend_from_slice(&v.x.to_be_bytes());
    buf.extend_from_slice(&v.y.to_be_bytes());
}

fn get_vec2(bytes: &[u8]) -> Vec2 {
    Vec2::new(
        f32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
        f32::from_be_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(message: Message) -> Message {
        let frame = message.encode();
        assert_eq!(frame.len(), HEADER_LEN + message.payload_len());
        assert_eq!(frame[0], message.kind() as u8);
        let advertised = u16::from_be_bytes([frame[1], frame[2]]) as usize;
        assert_eq!(advertised, message.payload_len());
        Message::decode(frame[0], &frame[HEADER_LEN..]).unwrap()
    }

    #[test]
    fn connect_request_layout() {
        let frame = Message::Connect(ConnectRequest::new("Ace")).encode();
        assert_eq!(frame.len(), HEADER_LEN + 17);
        assert_eq!(frame[0], MessageType::Connect as u8);
        assert_eq!(&frame[1..3], &17u16.to_be_bytes());
        assert_eq!(frame[3], PROTOCOL_VERSION);
        assert_eq!(&frame[4..7], b"Ace");
        assert!(frame[7..].iter().all(|&b| b == 0));
    }

    #[test]
    fn connect_request_roundtrip_truncates_long_names() {
        let decoded = roundtrip(Message::Connect(ConnectRequest::new(
            "a name far longer than sixteen bytes",
        )));
        match decoded {
            Message::Connect(req) => assert_eq!(req.name, "a name far longe"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn connect_version_mismatch() {
        let mut frame = Message::Connect(ConnectRequest::new("Ace")).encode();
        frame[3] = PROTOCOL_VERSION + 1;
        let err = Message::decode(frame[0], &frame[HEADER_LEN..]).unwrap_err();
        assert_eq!(
            err,
            ProtocolError::VersionMismatch {
                expected: PROTOCOL_VERSION,
                actual: PROTOCOL_VERSION + 1,
            }
        );
    }

    #[test]
    fn connect_ack_roundtrip() {
        match roundtrip(Message::ConnectAck(ConnectAck::accepted(2))) {
            Message::ConnectAck(ack) => {
                assert!(ack.accepted);
                assert_eq!(ack.player_id, 2);
                assert_eq!(ack.reason, None);
            }
            other => panic!("unexpected {other:?}"),
        }

        match roundtrip(Message::ConnectAck(ConnectAck::rejected(
            RejectReason::VersionMismatch,
        ))) {
            Message::ConnectAck(ack) => {
                assert!(!ack.accepted);
                assert_eq!(ack.reason, Some(RejectReason::VersionMismatch));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn player_input_roundtrip() {
        let input = PlayerInput {
            player_id: 3,
            flags: InputFlags::UP | InputFlags::RIGHT | InputFlags::FIRE,
            weapon: WeaponKind::Laser,
            sequence: 0xDEAD_BEEF,
        };
        match roundtrip(Message::PlayerInput(input)) {
            Message::PlayerInput(decoded) => assert_eq!(decoded, input),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn reserved_input_bits_are_stripped() {
        let mut frame = Message::PlayerInput(PlayerInput {
            player_id: 0,
            flags: InputFlags::FIRE,
            weapon: WeaponKind::Spread,
            sequence: 1,
        })
        .encode();
        frame[HEADER_LEN + 1] |= 0b1110_0000;
        match Message::decode(frame[0], &frame[HEADER_LEN..]).unwrap() {
            Message::PlayerInput(input) => assert_eq!(input.flags, InputFlags::FIRE),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn snapshot_roundtrip() {
        let snapshot = Snapshot {
            tick: 900,
            acked_sequence: 41,
            players: vec![
                PlayerState {
                    id: 0,
                    position: Vec2::new(100.0, 400.0),
                    velocity: Vec2::new(-3.5, 12.0),
                    health: 87,
                    weapon: WeaponKind::Rapid,
                    flags: PlayerState::FLAG_FIRING,
                },
                PlayerState {
                    id: 2,
                    position: Vec2::new(400.0, 180.0),
                    velocity: Vec2::ZERO,
                    health: -10,
                    weapon: WeaponKind::Spread,
                    flags: 0,
                },
            ],
            projectiles: vec![ProjectileState {
                owner: 0,
                position: Vec2::new(110.0, 360.0),
                velocity: Vec2::new(0.0, -600.0),
                weapon: WeaponKind::Rapid,
            }],
        };
        assert_eq!(snapshot.wire_size(), 10 + 2 * 21 + 18);
        match roundtrip(Message::GameState(snapshot.clone())) {
            Message::GameState(decoded) => assert_eq!(decoded, snapshot),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn empty_snapshot_roundtrip() {
        let snapshot = Snapshot {
            tick: 1,
            acked_sequence: 0,
            players: Vec::new(),
            projectiles: Vec::new(),
        };
        match roundtrip(Message::GameState(snapshot.clone())) {
            Message::GameState(decoded) => assert_eq!(decoded, snapshot),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn disconnect_ping_pong_roundtrip() {
        assert_eq!(roundtrip(Message::Disconnect), Message::Disconnect);
        match roundtrip(Message::Ping(Ping { timestamp: 55 })) {
            Message::Ping(ping) => assert_eq!(ping.timestamp, 55),
            other => panic!("unexpected {other:?}"),
        }
        match roundtrip(Message::Pong(Pong {
            client_timestamp: 55,
            server_timestamp: 1000,
        })) {
            Message::Pong(pong) => {
                assert_eq!(pong.client_timestamp, 55);
                assert_eq!(pong.server_timestamp, 1000);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn wrong_payload_size_is_rejected() {
        let err = Message::decode(MessageType::PlayerInput as u8, &[0u8; 6]).unwrap_err();
        assert_eq!(
            err,
            ProtocolError::PayloadSizeMismatch {
                ty: MessageType::PlayerInput,
                expected: PlayerInput::WIRE_SIZE,
                actual: 6,
            }
        );

        // Snapshot whose advertised counts do not match the actual bytes.
        let mut frame = Message::GameState(Snapshot {
            tick: 0,
            acked_sequence: 0,
            players: Vec::new(),
            projectiles: Vec::new(),
        })
        .encode();
        frame[HEADER_LEN + 8] = 5;
        assert!(matches!(
            Message::decode(frame[0], &frame[HEADER_LEN..]),
            Err(ProtocolError::PayloadSizeMismatch { .. })
        ));
    }

    #[test]
    fn unknown_message_type() {
        assert_eq!(
            Message::decode(0, &[]).unwrap_err(),
            ProtocolError::UnknownMessageType(0)
        );
        assert_eq!(
            Message::decode(200, &[1, 2, 3]).unwrap_err(),
            ProtocolError::UnknownMessageType(200)
        );
    }

    #[test]
    fn snapshot_ack_patch() {
        let snapshot = Snapshot {
            tick: 7,
            acked_sequence: 0,
            players: Vec::new(),
            projectiles: Vec::new(),
        };
        let mut frame = Message::GameState(snapshot).encode();
        patch_snapshot_ack(&mut frame, 1234);
        match Message::decode(frame[0], &frame[HEADER_LEN..]).unwrap() {
            Message::GameState(decoded) => {
                assert_eq!(decoded.tick, 7);
                assert_eq!(decoded.acked_sequence, 1234);
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
