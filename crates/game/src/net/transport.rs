use std::io::{self, Read, Write};

use crate::net::protocol::{HEADER_LEN, MAX_PAYLOAD_LEN};

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("connection closed by peer")]
    ConnectionClosed,

    #[error("frame payload of {actual} bytes exceeds limit of {limit}")]
    FrameTooLarge { actual: usize, limit: usize },

    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Writes the whole buffer, looping over partial writes. `WouldBlock`
/// on a non-blocking socket yields and retries, so a send either lands
/// completely or fails; a frame is never left half-written.
pub fn send_all<W: Write>(writer: &mut W, buf: &[u8]) -> Result<(), TransportError> {
    let mut sent = 0;
    while sent < buf.len() {
        match writer.write(&buf[sent..]) {
            Ok(0) => return Err(TransportError::ConnectionClosed),
            Ok(n) => sent += n,
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => std::thread::yield_now(),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecvExact {
    /// Buffer completely filled.
    Complete,
    /// Read this many bytes, then the socket had nothing more. Only
    /// reported for non-blocking sockets.
    Partial(usize),
    /// Peer closed the connection before the first byte of this call.
    Closed,
}

/// Reads into the whole buffer if it can. On a blocking socket this
/// returns `Complete` or `Closed`; on a non-blocking one it may stop
/// early with `Partial`, and the caller re-enters with the remaining
/// subslice once the socket is readable again.
pub fn recv_exact<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<RecvExact, TransportError> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => {
                return if filled == 0 {
                    Ok(RecvExact::Closed)
                } else {
                    Err(TransportError::ConnectionClosed)
                };
            }
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                return Ok(RecvExact::Partial(filled));
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(RecvExact::Complete)
}

/// A length-delimited frame as read off the wire, payload not yet decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame {
    pub kind: u8,
    pub payload: Vec<u8>,
}

#[derive(Debug, PartialEq, Eq)]
pub enum FramePoll {
    Frame(RawFrame),
    /// No complete frame yet; progress is retained for the next poll.
    Pending,
    /// Peer closed cleanly on a frame boundary.
    Closed,
}

/// Incremental frame assembler for non-blocking sockets. A short read
/// can split a frame anywhere, so the reader keeps header and payload
/// progress across polls instead of discarding partial bytes, which
/// would desync the stream.
#[derive(Debug, Default)]
pub struct FrameReader {
    header: [u8; HEADER_LEN],
    header_filled: usize,
    payload: Vec<u8>,
    payload_filled: usize,
    in_payload: bool,
}

impl FrameReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advances assembly with whatever the socket has and returns at most
    /// one frame. Call in a loop until `Pending` to drain a socket.
    pub fn poll<R: Read>(&mut self, reader: &mut R) -> Result<FramePoll, TransportError> {
        if !self.in_payload {
            match recv_exact(reader, &mut self.header[self.header_filled..])? {
                RecvExact::Complete => {
                    self.header_filled = HEADER_LEN;
                    let len = u16::from_be_bytes([self.header[1], self.header[2]]) as usize;
                    if len > MAX_PAYLOAD_LEN {
                        return Err(TransportError::FrameTooLarge {
                            actual: len,
                            limit: MAX_PAYLOAD_LEN,
                        });
                    }
                    self.payload = vec![0; len];
                    self.payload_filled = 0;
                    self.in_payload = true;
                }
                RecvExact::Partial(n) => {
                    self.header_filled += n;
                    return Ok(FramePoll::Pending);
                }
                RecvExact::Closed => {
                    return if self.header_filled == 0 {
                        Ok(FramePoll::Closed)
                    } else {
                        Err(TransportError::ConnectionClosed)
                    };
                }
            }
        }

        match recv_exact(reader, &mut self.payload[self.payload_filled..])? {
            RecvExact::Complete => {
                let frame = RawFrame {
                    kind: self.header[0],
                    payload: std::mem::take(&mut self.payload),
                };
                self.header_filled = 0;
                self.payload_filled = 0;
                self.in_payload = false;
                Ok(FramePoll::Frame(frame))
            }
            RecvExact::Partial(n) => {
                self.payload_filled += n;
                Ok(FramePoll::Pending)
            }
            RecvExact::Closed => Err(TransportError::ConnectionClosed),
        }
    }
}
