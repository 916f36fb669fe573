use std::sync::{Mutex, MutexGuard, PoisonError};

use drifter::WeaponKind;
use drifter::net::{InputFlags, PlayerState, ProjectileState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Error,
}

/// A coherent copy of the latest replicated world.
#[derive(Debug, Clone, Default)]
pub struct SnapshotView {
    pub server_tick: u32,
    pub players: Vec<PlayerState>,
    pub projectiles: Vec<ProjectileState>,
}

#[derive(Debug, Default)]
struct Inner {
    status: ConnectionStatus,
    status_message: String,
    local_id: Option<u8>,
    snapshot: SnapshotView,
    input: InputFlags,
    weapon: WeaponKind,
    sequence: u32,
    packets_sent: u64,
    packets_received: u64,
}

/// The only state shared between the render thread and the network
/// agent. One mutex guards all of it, so every read is a coherent
/// point-in-time view and every write is atomic; neither side ever sees
/// a half-applied snapshot. All accessors lock briefly and copy out.
#[derive(Debug, Default)]
pub struct SharedState {
    inner: Mutex<Inner>,
}

impl SharedState {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A panicked holder cannot leave a half-applied write: every
        // critical section here is a plain field copy.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Publishes the newest input for the agent to send. Each call bumps
    /// the sequence number, so the server can discard reordered inputs
    /// and the client can measure acknowledgement lag.
    pub fn set_outbound_input(&self, input: InputFlags, weapon: WeaponKind) {
        let mut inner = self.lock();
        inner.input = input;
        inner.weapon = weapon;
        inner.sequence = inner.sequence.wrapping_add(1);
    }

    pub fn outbound_input(&self) -> (InputFlags, WeaponKind, u32) {
        let inner = self.lock();
        (inner.input, inner.weapon, inner.sequence)
    }

    /// Replaces the replicated world in one critical section.
    pub fn publish_snapshot(&self, snapshot: SnapshotView) {
        self.lock().snapshot = snapshot;
    }

    pub fn copy_snapshot(&self) -> SnapshotView {
        self.lock().snapshot.clone()
    }

    /// The local player's entry in the latest snapshot, if both the id
    /// assignment and a snapshot containing it have arrived.
    pub fn local_player(&self) -> Option<PlayerState> {
        let inner = self.lock();
        let id = inner.local_id?;
        inner.snapshot.players.iter().find(|p| p.id == id).copied()
    }

    pub fn set_local_id(&self, id: u8) {
        self.lock().local_id = Some(id);
    }

    pub fn local_id(&self) -> Option<u8> {
        self.lock().local_id
    }

    pub fn set_status(&self, status: ConnectionStatus, message: impl Into<String>) {
        let mut inner = self.lock();
        inner.status = status;
        inner.status_message = message.into();
    }

    pub fn status(&self) -> (ConnectionStatus, String) {
        let inner = self.lock();
        (inner.status, inner.status_message.clone())
    }

    pub fn record_packet_sent(&self) {
        self.lock().packets_sent += 1;
    }

    pub fn record_packet_received(&self) {
        self.lock().packets_received += 1;
    }

    /// (sent, received) counters for the status line.
    pub fn packet_counts(&self) -> (u64, u64) {
        let inner = self.lock();
        (inner.packets_sent, inner.packets_received)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn player(id: u8, health: i16) -> PlayerState {
        PlayerState {
            id,
            position: Vec2::new(100.0, 400.0),
            velocity: Vec2::ZERO,
            health,
            weapon: WeaponKind::Spread,
            flags: 0,
        }
    }

    #[test]
    fn input_sequence_increments_per_publish() {
        let shared = SharedState::new();
        shared.set_outbound_input(InputFlags::UP, WeaponKind::Spread);
        shared.set_outbound_input(InputFlags::UP | InputFlags::FIRE, WeaponKind::Laser);

        let (input, weapon, sequence) = shared.outbound_input();
        assert_eq!(input, InputFlags::UP | InputFlags::FIRE);
        assert_eq!(weapon, WeaponKind::Laser);
        assert_eq!(sequence, 2);
    }

    #[test]
    fn local_player_needs_id_and_snapshot() {
        let shared = SharedState::new();
        assert_eq!(shared.local_player(), None);

        shared.set_local_id(1);
        assert_eq!(shared.local_player(), None);

        shared.publish_snapshot(SnapshotView {
            server_tick: 10,
            players: vec![player(0, 100), player(1, 73)],
            projectiles: Vec::new(),
        });
        let me = shared.local_player().unwrap();
        assert_eq!(me.id, 1);
        assert_eq!(me.health, 73);
    }

    /// A reader must never observe a snapshot mixing two publishes.
    #[test]
    fn snapshot_reads_are_coherent_under_contention() {
        let shared = Arc::new(SharedState::new());
        let stop = Arc::new(AtomicBool::new(false));

        let writer = {
            let shared = shared.clone();
            let stop = stop.clone();
            std::thread::spawn(move || {
                let mut flip = false;
                while !stop.load(Ordering::Relaxed) {
                    // Two self-consistent worlds: tick 2 has three
                    // players of health 1, tick 3 has one of health 2.
                    let snapshot = if flip {
                        SnapshotView {
                            server_tick: 2,
                            players: vec![player(0, 1), player(1, 1), player(2, 1)],
                            projectiles: Vec::new(),
                        }
                    } else {
                        SnapshotView {
                            server_tick: 3,
                            players: vec![player(0, 2)],
                            projectiles: Vec::new(),
                        }
                    };
                    shared.publish_snapshot(snapshot);
                    flip = !flip;
                }
            })
        };

        for _ in 0..10_000 {
            let view = shared.copy_snapshot();
            match view.server_tick {
                0 => assert!(view.players.is_empty()),
                2 => {
                    assert_eq!(view.players.len(), 3);
                    assert!(view.players.iter().all(|p| p.health == 1));
                }
                3 => {
                    assert_eq!(view.players.len(), 1);
                    assert_eq!(view.players[0].health, 2);
                }
                other => panic!("impossible tick {other}"),
            }
        }

        stop.store(true, Ordering::Relaxed);
        writer.join().unwrap();
    }
}
