//! Shared game core: the wire protocol, stream transport helpers, and
//! the deterministic simulation pieces both server and client use.

pub mod net;
pub mod player;
pub mod weapon;

pub use net::{DEFAULT_PORT, DEFAULT_TICK_RATE, PROTOCOL_VERSION};
pub use player::MovementConfig;
pub use weapon::WeaponKind;
