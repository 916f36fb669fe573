use std::net::SocketAddr;

use drifter::net::RejectReason;

/// Things the tick loop wants the embedder to know about. Queued during
/// a tick and drained afterwards, so handling them cannot stall I/O.
#[derive(Debug, Clone)]
pub enum ServerEvent {
    ClientConnected {
        player_id: u8,
        addr: SocketAddr,
        name: String,
    },
    ClientDisconnected {
        player_id: u8,
        reason: DisconnectReason,
    },
    ConnectionDenied {
        addr: SocketAddr,
        reason: RejectReason,
    },
    Error {
        message: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectReason {
    /// Client sent a disconnect message.
    Graceful,
    /// Socket closed without a disconnect message.
    ConnectionClosed,
    /// Read failed with a real error.
    TransportFailed,
    /// Client sent bytes that do not decode.
    ProtocolViolation,
    /// We could not deliver a snapshot.
    SendFailed,
}

impl DisconnectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DisconnectReason::Graceful => "disconnected",
            DisconnectReason::ConnectionClosed => "connection closed",
            DisconnectReason::TransportFailed => "transport error",
            DisconnectReason::ProtocolViolation => "protocol violation",
            DisconnectReason::SendFailed => "send failed",
        }
    }
}
