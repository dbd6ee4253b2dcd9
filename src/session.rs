//! Session manager: the driver that wires the pieces together.
//!
//! One action flows dispatch → gateway → reconciliation. The legality check
//! runs first so an action that is illegal in the current phase never costs
//! a network round trip; the gateway call returns a snapshot; the
//! reconciliation engine merges it (or rejects it) into the session.

use log::debug;
use thiserror::Error;

use crate::{
    alert::{Alert, AlertBus, Severity},
    game::{
        entities::{Card, GameId, PlayerId},
        reconcile::{ReconciliationEngine, ReconciliationError, RequestSeq},
        state_machine::{GameSession, SessionError, SessionEvent},
    },
    net::{
        errors::GatewayError,
        gateway::SessionGateway,
        messages::{ActiveGamesResponse, GameActionBuilder, GameActionRequest, NavToken},
    },
};

/// Why a session operation did not complete.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Rejected by the legality check; nothing was sent.
    #[error(transparent)]
    Illegal(#[from] SessionError),
    /// The request failed locally or remotely; an alert was raised.
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    /// The response could not be merged into the session.
    #[error(transparent)]
    Reconcile(#[from] ReconciliationError),
    /// Pegging plays exactly one card.
    #[error("select exactly one card to peg, {selected} selected")]
    PegSelection { selected: usize },
}

/// Owns one player's view of one match and every collaborator that touches
/// it: the session shadow, the reconciliation engine, the gateway, and the
/// alert store (created here at session start, drained by the UI, cleared
/// on exit).
pub struct SessionManager {
    player_id: PlayerId,
    session: GameSession,
    engine: ReconciliationEngine,
    gateway: SessionGateway,
    alerts: AlertBus,
    nav: Option<NavToken>,
}

impl SessionManager {
    #[must_use]
    pub fn new(player_id: PlayerId, gateway: SessionGateway) -> Self {
        Self {
            player_id,
            session: GameSession::new(),
            engine: ReconciliationEngine::new(),
            gateway,
            alerts: AlertBus::new(),
            nav: None,
        }
    }

    #[must_use]
    pub fn session(&self) -> &GameSession {
        &self.session
    }

    #[must_use]
    pub fn alerts(&self) -> &AlertBus {
        &self.alerts
    }

    /// Hands accumulated notices to the UI.
    pub fn drain_alerts(&mut self) -> Vec<Alert> {
        self.alerts.drain()
    }

    /// Token for post-action redirects, carried on every built request.
    pub fn set_navigation(&mut self, token: NavToken) {
        self.nav = Some(token);
    }

    fn builder(&self) -> GameActionBuilder {
        let builder =
            GameActionBuilder::new(self.session.game_id().clone(), self.player_id.clone());
        match &self.nav {
            Some(token) => builder.with_navigation(token.clone()),
            None => builder,
        }
    }

    /// Lists games this player can rejoin.
    pub async fn active_games(&mut self) -> Result<ActiveGamesResponse, DispatchError> {
        let response = self
            .gateway
            .active_games(&self.player_id, &mut self.alerts)
            .await?;
        Ok(response)
    }

    /// Joins a game and fetches its first snapshot.
    pub async fn join(&mut self, id: GameId) -> Result<(), DispatchError> {
        self.session
            .dispatch(SessionEvent::JoinRequested { id })?;
        self.refresh().await
    }

    /// Re-fetches the current game. The explicit retry path for failed
    /// actions.
    pub async fn refresh(&mut self) -> Result<(), DispatchError> {
        let expected = self.session.game_id().clone();
        let seq = self.engine.begin_request();
        let snapshot = self.gateway.refresh_game(&expected, &mut self.alerts).await?;
        self.engine.apply(&mut self.session, &expected, seq, snapshot)?;
        Ok(())
    }

    /// Ends the session. The shadow goes inert, accumulated notices are
    /// dropped, and the navigation token is handed back for the redirect.
    pub fn exit(&mut self) -> Option<NavToken> {
        debug!("exiting game {}", self.session.game_id());
        let _ = self.session.dispatch(SessionEvent::Exited);
        self.alerts.drain();
        self.nav.take()
    }

    /// Toggles a card in the pending selection. Purely local.
    pub fn toggle_card(&mut self, card: Card) -> Result<(), SessionError> {
        self.session.dispatch(SessionEvent::CardToggled { card })
    }

    /// Moves the cut position hint. Purely local until [`Self::cut`] sends it.
    pub fn adjust_cut(&mut self, perc: f64) -> Result<(), SessionError> {
        self.session.dispatch(SessionEvent::CutAdjusted { perc })
    }

    /// Bumps the shuffle animation and asks the server to shuffle.
    pub async fn shuffle(&mut self) -> Result<(), DispatchError> {
        self.session.dispatch(SessionEvent::ShuffleRequested)?;
        let request = self.builder().shuffle();
        self.submit(request).await
    }

    /// Asks for the deal, reporting how many shuffles preceded it.
    pub async fn deal(&mut self) -> Result<(), DispatchError> {
        self.session.dispatch(SessionEvent::DealRequested)?;
        let request = self.builder().deal(self.session.pending().num_shuffles());
        self.submit(request).await
    }

    /// Sends the pending selection to the crib.
    pub async fn build_crib(&mut self) -> Result<(), DispatchError> {
        self.session.dispatch(SessionEvent::BuildCribRequested)?;
        let request = self
            .builder()
            .build_crib(&self.session.pending().selected_cards);
        self.submit(request).await
    }

    /// Cuts the deck at the pending position hint.
    pub async fn cut(&mut self) -> Result<(), DispatchError> {
        self.session.dispatch(SessionEvent::CutRequested)?;
        let request = self.builder().cut(self.session.pending().perc_cut);
        self.submit(request).await
    }

    /// Pegs the single selected card.
    pub async fn peg(&mut self) -> Result<(), DispatchError> {
        self.session.dispatch(SessionEvent::PegRequested)?;
        let selected = &self.session.pending().selected_cards;
        let [card] = selected.as_slice() else {
            let error = DispatchError::PegSelection {
                selected: selected.len(),
            };
            self.alerts.push(error.to_string(), Severity::Warning);
            return Err(error);
        };
        let request = self.builder().peg(*card);
        self.submit(request).await
    }

    async fn submit(&mut self, request: GameActionRequest) -> Result<(), DispatchError> {
        let expected = self.session.game_id().clone();
        let seq: RequestSeq = self.engine.begin_request();
        let snapshot = self.gateway.submit(&request, &mut self.alerts).await?;
        self.engine.apply(&mut self.session, &expected, seq, snapshot)?;
        Ok(())
    }
}
