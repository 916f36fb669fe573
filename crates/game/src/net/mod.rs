mod protocol;
mod transport;

pub use protocol::{
    ConnectAck, ConnectRequest, InputFlags, Message, MessageType, Ping, PlayerInput, PlayerState,
    Pong, ProjectileState, ProtocolError, RejectReason, Snapshot, patch_snapshot_ack, DEFAULT_PORT,
    DEFAULT_TICK_RATE, HEADER_LEN, MAX_PAYLOAD_LEN, NAME_LEN, PROTOCOL_VERSION,
    SNAPSHOT_ACK_OFFSET,
};
pub use transport::{
    FramePoll, FrameReader, RawFrame, RecvExact, TransportError, recv_exact, send_all,
};
