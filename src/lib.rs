//! # Cribbage Client
//!
//! A client library for an online cribbage game. The server owns the rules
//! and the scoring; this crate owns the client's shadow of one match and the
//! strict reconciliation that keeps it honest.
//!
//! ## Architecture
//!
//! A match moves through six server-driven phases:
//!
//! - **Deal**: shuffling and dealing the round's hands
//! - **BuildCrib**: each player discards to the dealer's crib
//! - **Cut**: cutting the deck to reveal the shared cut card
//! - **Peg**: playing cards alternately against a running count
//! - **Score**: the server tallies hands and the crib
//! - **Complete**: someone reached the winning score
//!
//! The client never advances the phase itself. It gates which *actions* may
//! be proposed in each phase, sends them through the gateway, and merges the
//! snapshot the server answers with - rejecting responses for the wrong
//! game and responses that arrive after a newer request.
//!
//! ## Core Modules
//!
//! - [`game`]: session state machine, entities, and reconciliation
//! - [`net`]: action requests, wire types, and the HTTP gateway
//! - [`alert`]: user-visible notices
//! - [`session`]: the manager driving dispatch → gateway → reconcile
//!
//! ## Example
//!
//! ```
//! use cribbage_client::{GameSession, SessionEvent, entities::GameId};
//!
//! let mut session = GameSession::new();
//! session
//!     .dispatch(SessionEvent::JoinRequested { id: GameId::from("G1") })
//!     .expect("joining is always legal");
//! assert!(session.is_loading());
//! ```

/// User-visible notices produced by failures anywhere in the pipeline.
pub mod alert;
pub use alert::{Alert, AlertBus, Severity};

/// Session state machine, entities, and reconciliation.
pub mod game;
pub use game::{
    ActionKind, GameSession, PendingAction, ReconciliationEngine, ReconciliationError, RequestSeq,
    SessionError, SessionEvent, entities, is_legal, legal_actions,
};

/// Networking components for talking to the game server.
pub mod net;
pub use net::{
    GameActionBuilder, GameActionRequest, GameApi, GatewayError, HttpGameApi, NavToken,
    SessionGateway,
};

/// The session manager driving the full pipeline.
pub mod session;
pub use session::{DispatchError, SessionManager};
