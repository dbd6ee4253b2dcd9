//! Cribbage session engine - shadow state, legality, and reconciliation.

pub mod entities;
pub mod reconcile;
pub mod state_machine;

pub use reconcile::{ReconciliationEngine, ReconciliationError, RequestSeq};
pub use state_machine::{
    ActionKind, GameSession, PendingAction, SessionError, SessionEvent, is_legal, legal_actions,
};
