//! Client-side networking: a background agent that owns the socket and
//! a mutex-guarded bridge the game loop reads and writes.

pub mod net;

pub use net::{ClientConfig, ConnectionStatus, NetworkAgent, SharedState, SnapshotView};
