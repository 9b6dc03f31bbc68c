//! Session Registry
//!
//! Connection ↔ player-id bookkeeping and the fan-out half of the
//! snapshot broadcaster. Each connected session is one mpsc sender; the
//! per-connection writer task drains the other end onto the socket, so
//! broadcasting never blocks on a slow peer.

use std::collections::BTreeMap;

use tokio::sync::mpsc;

use crate::game::state::PlayerId;
use crate::network::protocol::ServerMessage;

/// Queue depth per session. A session this far behind starts missing
/// frames; every frame is a full snapshot, so the next one heals it.
pub const SESSION_QUEUE_DEPTH: usize = 64;

/// Registry errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SessionError {
    /// The configured player cap is reached.
    #[error("server is full")]
    ServerFull,
}

/// Tracks connected sessions and assigns player ids.
#[derive(Debug)]
pub struct SessionRegistry {
    /// Admission cap.
    max_players: usize,
    /// Next id to hand out. Only ever increments, so ids freed by a
    /// disconnect are never reused.
    next_id: PlayerId,
    /// Live session channels keyed by player id.
    sessions: BTreeMap<PlayerId, mpsc::Sender<ServerMessage>>,
}

impl SessionRegistry {
    /// Create an empty registry with a capacity cap.
    pub fn new(max_players: usize) -> Self {
        Self {
            max_players,
            next_id: 0,
            sessions: BTreeMap::new(),
        }
    }

    /// Admit a session: capacity check, id assignment, registration, as
    /// one step under the registry lock.
    pub fn admit(
        &mut self,
        sender: mpsc::Sender<ServerMessage>,
    ) -> Result<PlayerId, SessionError> {
        if self.sessions.len() >= self.max_players {
            return Err(SessionError::ServerFull);
        }

        let id = self.next_id;
        self.next_id += 1;
        self.sessions.insert(id, sender);
        Ok(id)
    }

    /// Drop a session. Idempotent.
    pub fn remove(&mut self, id: PlayerId) {
        self.sessions.remove(&id);
    }

    /// Number of connected sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// True when no sessions are connected.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Push a message to every session without blocking.
    ///
    /// Returns the ids whose channel is gone (their writer task exited);
    /// the caller evicts those players under the world lock on the next
    /// tick. A merely-full queue is not an eviction; that session just
    /// misses this frame.
    pub fn broadcast(&self, message: &ServerMessage) -> Vec<PlayerId> {
        let mut dead = Vec::new();
        for (id, sender) in &self.sessions {
            match sender.try_send(message.clone()) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {}
                Err(mpsc::error::TrySendError::Closed(_)) => dead.push(*id),
            }
        }
        dead
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel() -> (
        mpsc::Sender<ServerMessage>,
        mpsc::Receiver<ServerMessage>,
    ) {
        mpsc::channel(SESSION_QUEUE_DEPTH)
    }

    #[test]
    fn test_ids_are_strictly_increasing_and_never_reused() {
        let mut registry = SessionRegistry::new(4);

        let (tx_a, _rx_a) = channel();
        let (tx_b, _rx_b) = channel();
        let a = registry.admit(tx_a).unwrap();
        let b = registry.admit(tx_b).unwrap();
        assert_eq!((a, b), (0, 1));

        registry.remove(a);

        let (tx_c, _rx_c) = channel();
        let c = registry.admit(tx_c).unwrap();
        assert_eq!(c, 2);
    }

    #[test]
    fn test_admission_rejected_at_capacity() {
        let mut registry = SessionRegistry::new(2);

        let (tx_a, _rx_a) = channel();
        let (tx_b, _rx_b) = channel();
        registry.admit(tx_a).unwrap();
        registry.admit(tx_b).unwrap();

        let (tx_c, _rx_c) = channel();
        assert!(matches!(
            registry.admit(tx_c),
            Err(SessionError::ServerFull)
        ));
        assert_eq!(registry.len(), 2);

        // A disconnect frees the slot again.
        registry.remove(0);
        let (tx_d, _rx_d) = channel();
        assert!(registry.admit(tx_d).is_ok());
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut registry = SessionRegistry::new(4);
        let (tx, _rx) = channel();
        let id = registry.admit(tx).unwrap();

        registry.remove(id);
        registry.remove(id);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_broadcast_reports_closed_sessions() {
        let mut registry = SessionRegistry::new(4);

        let (tx_a, mut rx_a) = channel();
        let (tx_b, rx_b) = channel();
        let a = registry.admit(tx_a).unwrap();
        let b = registry.admit(tx_b).unwrap();

        // Session b's writer is gone.
        drop(rx_b);

        let dead = registry.broadcast(&ServerMessage::Full);
        assert_eq!(dead, vec![b]);
        assert_eq!(a, 0);

        // Session a received the frame.
        assert!(matches!(rx_a.try_recv(), Ok(ServerMessage::Full)));
    }

    #[test]
    fn test_full_queue_drops_frame_without_eviction() {
        let mut registry = SessionRegistry::new(4);

        let (tx, mut rx) = mpsc::channel(1);
        registry.admit(tx).unwrap();

        assert!(registry.broadcast(&ServerMessage::Full).is_empty());
        // Queue is now full; the next frame is dropped, not an eviction.
        assert!(registry.broadcast(&ServerMessage::Full).is_empty());

        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err());
    }
}
