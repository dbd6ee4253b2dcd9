//! Cribbage session state machine.
//!
//! This module holds the client's authoritative-shadow of one match: the
//! last accepted server snapshot plus the player's not-yet-confirmed local
//! action. All mutation flows through a single reducer entry point, split
//! into a validation step ([`GameSession::check`]) and an infallible
//! transition ([`GameSession::apply`]) so the transition itself never fails.
//!
//! Phase transitions are server-driven. The client only gates which
//! *actions* may be offered in each phase.

use log::warn;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use super::entities::{Card, GameId, GameSnapshot, Phase};

/// Kinds of player actions a session can propose.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum ActionKind {
    Shuffle,
    SelectCard,
    Deal,
    BuildCrib,
    Cut,
    Peg,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Shuffle => "shuffle",
            Self::SelectCard => "select card",
            Self::Deal => "deal",
            Self::BuildCrib => "build crib",
            Self::Cut => "cut",
            Self::Peg => "peg",
        };
        write!(f, "{repr}")
    }
}

/// Player actions that may be offered in the given phase. `Score` and
/// `Complete` are read-only.
#[must_use]
pub const fn legal_actions(phase: Phase) -> &'static [ActionKind] {
    match phase {
        Phase::Deal => &[ActionKind::Shuffle, ActionKind::Deal],
        Phase::BuildCrib => &[ActionKind::SelectCard, ActionKind::BuildCrib],
        Phase::Cut => &[ActionKind::Cut],
        Phase::Peg => &[ActionKind::SelectCard, ActionKind::Peg],
        Phase::Score | Phase::Complete => &[],
    }
}

/// Whether `action` may be proposed during `phase`.
#[must_use]
pub fn is_legal(phase: Phase, action: ActionKind) -> bool {
    legal_actions(phase).contains(&action)
}

/// Errors from validating a session event before the state transition runs.
///
/// An illegal action is a precondition violation, not a runtime fault: the
/// session is left unchanged, no network call should be issued, and no
/// user-visible alert is raised.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum SessionError {
    #[error("can't {action} during the {phase} phase")]
    IllegalAction { phase: Phase, action: ActionKind },
    #[error("can't {action} before the game has loaded")]
    NoGameLoaded { action: ActionKind },
}

/// Events the session reducer consumes.
///
/// `SnapshotReceived` must only be dispatched by the reconciliation engine,
/// which validates game identity and request ordering first.
#[derive(Clone, Debug, PartialEq)]
pub enum SessionEvent {
    JoinRequested { id: GameId },
    SnapshotReceived { snapshot: GameSnapshot },
    Exited,
    ShuffleRequested,
    CardToggled { card: Card },
    CutAdjusted { perc: f64 },
    DealRequested,
    BuildCribRequested,
    CutRequested,
    PegRequested,
}

impl SessionEvent {
    /// The action kind this event proposes, or `None` for lifecycle events
    /// that are always accepted.
    #[must_use]
    pub const fn action_kind(&self) -> Option<ActionKind> {
        match self {
            Self::JoinRequested { .. } | Self::SnapshotReceived { .. } | Self::Exited => None,
            Self::ShuffleRequested => Some(ActionKind::Shuffle),
            Self::CardToggled { .. } => Some(ActionKind::SelectCard),
            Self::CutAdjusted { .. } | Self::CutRequested => Some(ActionKind::Cut),
            Self::DealRequested => Some(ActionKind::Deal),
            Self::BuildCribRequested => Some(ActionKind::BuildCrib),
            Self::PegRequested => Some(ActionKind::Peg),
        }
    }
}

/// The player's locally-proposed, not yet server-confirmed action state.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct PendingAction {
    /// Cards accumulated by toggle, unique by identity, in selection order.
    #[serde(default)]
    pub selected_cards: Vec<Card>,
    /// Cosmetic shuffle animation counter. `None` is the uninitialized
    /// state a corrupt persisted session can carry; the next shuffle resets
    /// it to 1.
    #[serde(default)]
    pub num_shuffles: Option<u32>,
    /// Cut position hint in [0, 1], sent with a cut action.
    #[serde(default = "default_perc_cut")]
    pub perc_cut: f64,
}

const fn default_perc_cut() -> f64 {
    0.5
}

impl Default for PendingAction {
    fn default() -> Self {
        Self {
            selected_cards: Vec::new(),
            num_shuffles: Some(0),
            perc_cut: default_perc_cut(),
        }
    }
}

impl PendingAction {
    /// The shuffle counter with the uninitialized state read as zero.
    #[must_use]
    pub fn num_shuffles(&self) -> u32 {
        self.num_shuffles.unwrap_or(0)
    }

    #[must_use]
    pub fn is_selected(&self, card: &Card) -> bool {
        self.selected_cards.iter().any(|c| c.same_card(card))
    }

    fn record_shuffle(&mut self) {
        self.num_shuffles = Some(match self.num_shuffles {
            Some(n) => n.saturating_add(1),
            None => 1,
        });
    }

    fn toggle(&mut self, card: Card) {
        // Face-down cards are not selectable.
        if !card.is_known() {
            return;
        }
        match self.selected_cards.iter().position(|c| c.same_card(&card)) {
            Some(idx) => {
                self.selected_cards.remove(idx);
            }
            None => self.selected_cards.push(card),
        }
    }
}

/// The client-side shadow of one cribbage match.
///
/// Created on join with `loading` set and an empty shadow, populated by the
/// first reconciled snapshot, mutated in place per snapshot, and rendered
/// inert on exit. State is serializable so a UI layer can persist and
/// restore it.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct GameSession {
    #[serde(rename = "gameID", default)]
    game_id: GameId,
    #[serde(default)]
    loading: bool,
    #[serde(default)]
    current_game: Option<GameSnapshot>,
    #[serde(default)]
    current_action: PendingAction,
}

impl Default for GameSession {
    fn default() -> Self {
        Self {
            game_id: GameId::default(),
            loading: true,
            current_game: None,
            current_action: PendingAction::default(),
        }
    }
}

impl GameSession {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn game_id(&self) -> &GameId {
        &self.game_id
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// The last accepted snapshot, if any. Stale after an exit.
    #[must_use]
    pub fn game(&self) -> Option<&GameSnapshot> {
        self.current_game.as_ref()
    }

    #[must_use]
    pub fn pending(&self) -> &PendingAction {
        &self.current_action
    }

    /// Phase of the loaded game, if one has been reconciled in.
    #[must_use]
    pub fn phase(&self) -> Option<Phase> {
        self.current_game.as_ref().map(|g| g.phase)
    }

    /// Validates an event against the current phase without mutating
    /// anything. Lifecycle events always pass.
    pub fn check(&self, event: &SessionEvent) -> Result<(), SessionError> {
        let Some(action) = event.action_kind() else {
            return Ok(());
        };
        match self.phase() {
            None => Err(SessionError::NoGameLoaded { action }),
            Some(phase) if is_legal(phase, action) => Ok(()),
            Some(phase) => Err(SessionError::IllegalAction { phase, action }),
        }
    }

    /// Runs the state transition for a validated event. Events that fail
    /// validation are skipped, so a raw `apply` can never corrupt the
    /// session; use [`GameSession::dispatch`] to observe the rejection.
    pub fn apply(&mut self, event: SessionEvent) {
        if let Err(error) = self.check(&event) {
            warn!("dropping event that failed validation: {error}");
            return;
        }
        self.transition(event);
    }

    /// Validates, then applies. The primary entry point.
    pub fn dispatch(&mut self, event: SessionEvent) -> Result<(), SessionError> {
        self.check(&event)?;
        self.transition(event);
        Ok(())
    }

    fn transition(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::JoinRequested { id } => {
                self.loading = true;
                self.game_id = id;
                // Stale shadow state from a prior game is cleared now, not
                // lazily on the next snapshot.
                self.current_game = None;
                self.current_action = PendingAction::default();
            }
            SessionEvent::SnapshotReceived { snapshot } => {
                self.loading = false;
                let prior_shuffles = self.current_action.num_shuffles;
                self.current_action = PendingAction::default();
                if snapshot.phase == Phase::Deal {
                    // A refresh during the deal must not restart the shuffle
                    // animation. The one field that survives a merge.
                    self.current_action.num_shuffles = prior_shuffles;
                }
                self.current_game = Some(snapshot);
            }
            SessionEvent::Exited => {
                self.loading = false;
                self.game_id = GameId::default();
                // The shadow stays behind, stale but inert: with the id
                // cleared no further snapshot can reconcile against it.
            }
            SessionEvent::ShuffleRequested => self.current_action.record_shuffle(),
            SessionEvent::CardToggled { card } => self.current_action.toggle(card),
            SessionEvent::CutAdjusted { perc } => {
                if perc.is_finite() {
                    self.current_action.perc_cut = perc.clamp(0.0, 1.0);
                } else {
                    warn!("ignoring non-finite cut position {perc}");
                }
            }
            // Accepted but inert: the rule effect of these actions is
            // computed server-side and arrives as the next snapshot.
            SessionEvent::DealRequested
            | SessionEvent::BuildCribRequested
            | SessionEvent::CutRequested
            | SessionEvent::PegRequested => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::entities::{Player, PlayerColor, PlayerId, Suit};
    use std::collections::HashMap;

    fn card(s: &str) -> Card {
        s.parse().unwrap()
    }

    fn snapshot(game_id: &str, phase: Phase) -> GameSnapshot {
        let players = vec![
            Player {
                id: PlayerId::from("p1"),
                name: "alice".to_owned(),
                color: PlayerColor::Blue,
            },
            Player {
                id: PlayerId::from("p2"),
                name: "bob".to_owned(),
                color: PlayerColor::Red,
            },
        ];
        GameSnapshot {
            game_id: GameId::from(game_id),
            phase,
            players,
            hands: HashMap::new(),
            crib: Vec::new(),
            cut_card: None,
            peg_positions: HashMap::new(),
            current_dealer: None,
            current_scores: HashMap::new(),
            lag_scores: HashMap::new(),
            pegged_cards: Vec::new(),
            blocking_players: HashMap::new(),
        }
    }

    fn session_in(phase: Phase) -> GameSession {
        let mut session = GameSession::new();
        session
            .dispatch(SessionEvent::JoinRequested {
                id: GameId::from("G1"),
            })
            .unwrap();
        session.apply(SessionEvent::SnapshotReceived {
            snapshot: snapshot("G1", phase),
        });
        session
    }

    #[test]
    fn test_new_session_is_loading_and_empty() {
        let session = GameSession::new();
        assert!(session.is_loading());
        assert!(session.game_id().is_empty());
        assert!(session.game().is_none());
        assert_eq!(session.pending().num_shuffles(), 0);
        assert_eq!(session.pending().perc_cut, 0.5);
    }

    #[test]
    fn test_join_clears_stale_shadow_state() {
        let mut session = session_in(Phase::BuildCrib);
        session
            .dispatch(SessionEvent::CardToggled { card: card("5h") })
            .unwrap();
        session
            .dispatch(SessionEvent::JoinRequested {
                id: GameId::from("G2"),
            })
            .unwrap();
        assert!(session.is_loading());
        assert_eq!(session.game_id(), &GameId::from("G2"));
        assert!(session.game().is_none());
        assert!(session.pending().selected_cards.is_empty());
    }

    #[test]
    fn test_exit_clears_id_but_leaves_shadow() {
        let mut session = session_in(Phase::Peg);
        session.dispatch(SessionEvent::Exited).unwrap();
        assert!(!session.is_loading());
        assert!(session.game_id().is_empty());
        assert!(session.game().is_some());
    }

    #[test]
    fn test_legality_table() {
        let cases = [
            (Phase::Deal, ActionKind::Shuffle, true),
            (Phase::Deal, ActionKind::Deal, true),
            (Phase::Deal, ActionKind::SelectCard, false),
            (Phase::BuildCrib, ActionKind::SelectCard, true),
            (Phase::BuildCrib, ActionKind::BuildCrib, true),
            (Phase::BuildCrib, ActionKind::Peg, false),
            (Phase::Cut, ActionKind::Cut, true),
            (Phase::Cut, ActionKind::Shuffle, false),
            (Phase::Deal, ActionKind::Cut, false),
            (Phase::Peg, ActionKind::SelectCard, true),
            (Phase::Peg, ActionKind::Peg, true),
            (Phase::Peg, ActionKind::Deal, false),
        ];
        for (phase, action, expected) in cases {
            assert_eq!(is_legal(phase, action), expected, "{phase} / {action}");
        }
        for phase in [Phase::Score, Phase::Complete] {
            assert!(legal_actions(phase).is_empty());
        }
    }

    #[test]
    fn test_read_only_phases_reject_every_action() {
        for phase in [Phase::Score, Phase::Complete] {
            let mut session = session_in(phase);
            let before = session.clone();
            for event in [
                SessionEvent::ShuffleRequested,
                SessionEvent::CardToggled { card: card("5h") },
                SessionEvent::CutAdjusted { perc: 0.9 },
                SessionEvent::DealRequested,
                SessionEvent::BuildCribRequested,
                SessionEvent::CutRequested,
                SessionEvent::PegRequested,
            ] {
                assert!(session.dispatch(event.clone()).is_err());
                session.apply(event);
            }
            assert_eq!(session, before);
        }
    }

    #[test]
    fn test_actions_illegal_before_first_snapshot() {
        let mut session = GameSession::new();
        session
            .dispatch(SessionEvent::JoinRequested {
                id: GameId::from("G1"),
            })
            .unwrap();
        assert_eq!(
            session.dispatch(SessionEvent::DealRequested),
            Err(SessionError::NoGameLoaded {
                action: ActionKind::Deal
            })
        );
    }

    #[test]
    fn test_illegal_action_reports_phase() {
        let mut session = session_in(Phase::Cut);
        assert_eq!(
            session.dispatch(SessionEvent::PegRequested),
            Err(SessionError::IllegalAction {
                phase: Phase::Cut,
                action: ActionKind::Peg
            })
        );
    }

    #[test]
    fn test_toggle_is_its_own_inverse() {
        let mut session = session_in(Phase::BuildCrib);
        session
            .dispatch(SessionEvent::CardToggled { card: card("5h") })
            .unwrap();
        assert!(session.pending().is_selected(&card("5h")));
        session
            .dispatch(SessionEvent::CardToggled { card: card("5h") })
            .unwrap();
        assert!(session.pending().selected_cards.is_empty());
    }

    #[test]
    fn test_toggle_preserves_insertion_order() {
        let mut session = session_in(Phase::BuildCrib);
        for c in ["5h", "Ks", "2d"] {
            session
                .dispatch(SessionEvent::CardToggled { card: card(c) })
                .unwrap();
        }
        session
            .dispatch(SessionEvent::CardToggled { card: card("Ks") })
            .unwrap();
        assert_eq!(session.pending().selected_cards, vec![card("5h"), card("2d")]);
    }

    #[test]
    fn test_toggle_scenario_from_the_table() {
        // 5♥, 5♥, K♠ leaves only the king selected.
        let mut session = session_in(Phase::BuildCrib);
        for c in ["5h", "5h", "Ks"] {
            session
                .dispatch(SessionEvent::CardToggled { card: card(c) })
                .unwrap();
        }
        assert_eq!(session.pending().selected_cards, vec![card("Ks")]);
    }

    #[test]
    fn test_toggle_ignores_face_down_cards() {
        let mut session = session_in(Phase::Peg);
        session
            .dispatch(SessionEvent::CardToggled { card: Card::Unknown })
            .unwrap();
        assert!(session.pending().selected_cards.is_empty());
    }

    #[test]
    fn test_shuffle_counter_increments() {
        let mut session = session_in(Phase::Deal);
        for _ in 0..3 {
            session.dispatch(SessionEvent::ShuffleRequested).unwrap();
        }
        assert_eq!(session.pending().num_shuffles(), 3);
    }

    #[test]
    fn test_shuffle_resets_uninitialized_counter_to_one() {
        // A persisted blob without the counter deserializes uninitialized.
        let mut session = session_in(Phase::Deal);
        let mut pending: PendingAction = serde_json::from_str("{}").unwrap();
        assert_eq!(pending.num_shuffles, None);
        std::mem::swap(&mut session.current_action, &mut pending);
        session.dispatch(SessionEvent::ShuffleRequested).unwrap();
        assert_eq!(session.pending().num_shuffles, Some(1));
    }

    #[test]
    fn test_snapshot_resets_pending_action() {
        let mut session = session_in(Phase::BuildCrib);
        session
            .dispatch(SessionEvent::CardToggled { card: card("5h") })
            .unwrap();
        session.apply(SessionEvent::SnapshotReceived {
            snapshot: snapshot("G1", Phase::Cut),
        });
        assert!(session.pending().selected_cards.is_empty());
        assert_eq!(session.pending().num_shuffles(), 0);
        assert_eq!(session.pending().perc_cut, 0.5);
        assert_eq!(session.phase(), Some(Phase::Cut));
    }

    #[test]
    fn test_deal_snapshot_preserves_shuffle_counter() {
        let mut session = session_in(Phase::Deal);
        for _ in 0..3 {
            session.dispatch(SessionEvent::ShuffleRequested).unwrap();
        }
        session.apply(SessionEvent::SnapshotReceived {
            snapshot: snapshot("G1", Phase::Deal),
        });
        assert_eq!(session.pending().num_shuffles(), 3);
        assert!(session.pending().selected_cards.is_empty());
    }

    #[test]
    fn test_non_deal_snapshot_resets_shuffle_counter() {
        let mut session = session_in(Phase::Deal);
        session.dispatch(SessionEvent::ShuffleRequested).unwrap();
        session.apply(SessionEvent::SnapshotReceived {
            snapshot: snapshot("G1", Phase::BuildCrib),
        });
        assert_eq!(session.pending().num_shuffles, Some(0));
    }

    #[test]
    fn test_cut_adjust_clamps() {
        let mut session = session_in(Phase::Cut);
        session
            .dispatch(SessionEvent::CutAdjusted { perc: 1.7 })
            .unwrap();
        assert_eq!(session.pending().perc_cut, 1.0);
        session
            .dispatch(SessionEvent::CutAdjusted { perc: -0.2 })
            .unwrap();
        assert_eq!(session.pending().perc_cut, 0.0);
        session
            .dispatch(SessionEvent::CutAdjusted { perc: 0.25 })
            .unwrap();
        assert_eq!(session.pending().perc_cut, 0.25);
    }

    #[test]
    fn test_cut_adjust_ignores_non_finite() {
        let mut session = session_in(Phase::Cut);
        session
            .dispatch(SessionEvent::CutAdjusted { perc: f64::NAN })
            .unwrap();
        assert_eq!(session.pending().perc_cut, 0.5);
    }

    #[test]
    fn test_accepted_noop_actions_leave_state_unchanged() {
        let mut session = session_in(Phase::Deal);
        let before = session.clone();
        session.dispatch(SessionEvent::DealRequested).unwrap();
        assert_eq!(session, before);
    }

    #[test]
    fn test_session_round_trips_through_serde() {
        let mut session = session_in(Phase::BuildCrib);
        session
            .dispatch(SessionEvent::CardToggled { card: card("9c") })
            .unwrap();
        let json = serde_json::to_string(&session).unwrap();
        let back: GameSession = serde_json::from_str(&json).unwrap();
        assert_eq!(back, session);
    }
}
