//! Snapshot reconciliation.
//!
//! Merging a server snapshot into the local shadow happens here and nowhere
//! else. The engine guards the merge with two checks before the reducer ever
//! sees the snapshot: game identity (a response for a stale or abandoned
//! join must never be merged into the wrong session) and request ordering
//! (a slow response must not overwrite state from a newer one).

use log::{debug, warn};
use thiserror::Error;

use super::{
    entities::{GameId, GameSnapshot},
    state_machine::{GameSession, SessionEvent},
};

/// Monotonically increasing id stamped on each outgoing request. Only the
/// latest issued sequence is allowed to merge.
pub type RequestSeq = u64;

/// Hard failures of a reconciliation attempt. The session is never mutated
/// when one of these is returned.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum ReconciliationError {
    #[error(r#"bad game id: expected "{expected}", got "{got}""#)]
    IdentityMismatch { expected: GameId, got: GameId },
    #[error("stale response: latest issued request is {latest}, got {got}")]
    StaleResponse { latest: RequestSeq, got: RequestSeq },
}

/// Owner of the merge path between the gateway and the session reducer.
#[derive(Debug, Default)]
pub struct ReconciliationEngine {
    latest: RequestSeq,
}

impl ReconciliationEngine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stamps a new outgoing request. Issuing a request invalidates every
    /// response still in flight for earlier ones.
    pub fn begin_request(&mut self) -> RequestSeq {
        self.latest += 1;
        self.latest
    }

    #[must_use]
    pub fn latest(&self) -> RequestSeq {
        self.latest
    }

    /// Merges `snapshot` into `session`.
    ///
    /// `expected` is the game id the request was issued for and `seq` the
    /// sequence stamped by [`ReconciliationEngine::begin_request`]. Applying
    /// the latest snapshot twice is idempotent; reconciliation itself
    /// increments no counters.
    pub fn apply(
        &self,
        session: &mut GameSession,
        expected: &GameId,
        seq: RequestSeq,
        mut snapshot: GameSnapshot,
    ) -> Result<(), ReconciliationError> {
        if seq != self.latest {
            warn!(
                "rejecting stale response for {expected} (seq {seq}, latest {})",
                self.latest
            );
            return Err(ReconciliationError::StaleResponse {
                latest: self.latest,
                got: seq,
            });
        }
        if expected != session.game_id() {
            return Err(ReconciliationError::IdentityMismatch {
                expected: session.game_id().clone(),
                got: expected.clone(),
            });
        }
        if snapshot.game_id != *session.game_id() {
            return Err(ReconciliationError::IdentityMismatch {
                expected: session.game_id().clone(),
                got: snapshot.game_id.clone(),
            });
        }

        Self::normalize_peg_positions(&mut snapshot);
        debug!("merging {} snapshot for {expected}", snapshot.phase);
        session.apply(SessionEvent::SnapshotReceived { snapshot });
        Ok(())
    }

    /// Peg position keys must be exactly the player ids: stray entries are
    /// dropped, missing players start from zero.
    fn normalize_peg_positions(snapshot: &mut GameSnapshot) {
        let players = &snapshot.players;
        snapshot
            .peg_positions
            .retain(|id, _| players.iter().any(|p| p.id == *id));
        for player in players {
            snapshot.peg_positions.entry(player.id.clone()).or_insert(0);
        }
    }
}
