//! The single point of contact with the remote game server.
//!
//! The gateway never mutates session state: it hands snapshots back for the
//! reconciliation engine to merge. It never retries on its own either, since
//! game actions are not idempotent server-side; retry is the user explicitly
//! re-dispatching. Failures become alert entries plus a typed error, and
//! nothing panics past this boundary.

use async_trait::async_trait;
use log::{debug, warn};
use serde::de::DeserializeOwned;

use super::{
    super::{
        alert::AlertBus,
        game::entities::{GameId, GameSnapshot, PlayerId},
    },
    errors::GatewayError,
    messages::{ActiveGamesResponse, ErrorBody, GameActionRequest},
};

/// Narrow interface to the remote game server.
#[async_trait]
pub trait GameApi {
    /// Lists games the player is currently part of.
    async fn active_games(&self, player_id: &PlayerId)
    -> Result<ActiveGamesResponse, GatewayError>;

    /// Fetches the current snapshot of one game.
    async fn refresh_game(&self, game_id: &GameId) -> Result<GameSnapshot, GatewayError>;

    /// Submits one action and returns the resulting snapshot.
    async fn submit_action(
        &self,
        request: &GameActionRequest,
    ) -> Result<GameSnapshot, GatewayError>;
}

/// HTTP implementation of [`GameApi`].
pub struct HttpGameApi {
    base_url: String,
    client: reqwest::Client,
}

impl HttpGameApi {
    #[must_use]
    pub fn new(base_url: String) -> Self {
        Self {
            base_url,
            client: reqwest::Client::new(),
        }
    }

    /// Reads a success body as JSON, or turns an error status into a typed
    /// failure carrying the server's `message` when it sent one.
    async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, GatewayError> {
        let status = response.status();
        if !status.is_success() {
            let text = response
                .text()
                .await
                .unwrap_or_else(|e| format!("failed to read error response: {e}"));
            let message = serde_json::from_str::<ErrorBody>(&text)
                .map(|body| body.message)
                .unwrap_or(text);
            return Err(GatewayError::Server {
                status: status.as_u16(),
                message,
            });
        }
        response.json().await.map_err(GatewayError::transport)
    }
}

#[async_trait]
impl GameApi for HttpGameApi {
    async fn active_games(
        &self,
        player_id: &PlayerId,
    ) -> Result<ActiveGamesResponse, GatewayError> {
        let response = self
            .client
            .get(format!("{}/games/active", self.base_url))
            .query(&[("playerID", player_id.as_str())])
            .send()
            .await
            .map_err(GatewayError::transport)?;
        Self::read_json(response).await
    }

    async fn refresh_game(&self, game_id: &GameId) -> Result<GameSnapshot, GatewayError> {
        let response = self
            .client
            .get(format!("{}/games/{game_id}", self.base_url))
            .send()
            .await
            .map_err(GatewayError::transport)?;
        Self::read_json(response).await
    }

    async fn submit_action(
        &self,
        request: &GameActionRequest,
    ) -> Result<GameSnapshot, GatewayError> {
        let response = self
            .client
            .post(format!(
                "{}/games/{}/{}",
                self.base_url,
                request.game_id,
                request.endpoint()
            ))
            .json(request)
            .send()
            .await
            .map_err(GatewayError::transport)?;
        Self::read_json(response).await
    }
}

/// Validates, relays, and reports.
///
/// Caller misuse (a missing identifier) is rejected before any network call
/// with a warning-level alert; remote failures come back as error-level
/// alerts carrying the server's message when available. Callers always
/// receive a discriminated result.
pub struct SessionGateway {
    api: Box<dyn GameApi + Send + Sync>,
}

impl SessionGateway {
    #[must_use]
    pub fn new(api: Box<dyn GameApi + Send + Sync>) -> Self {
        Self { api }
    }

    /// Convenience constructor for the HTTP server at `base_url`.
    #[must_use]
    pub fn over_http(base_url: String) -> Self {
        Self::new(Box::new(HttpGameApi::new(base_url)))
    }

    pub async fn active_games(
        &self,
        player_id: &PlayerId,
        alerts: &mut AlertBus,
    ) -> Result<ActiveGamesResponse, GatewayError> {
        if player_id.is_empty() {
            return Err(Self::reject(GatewayError::MissingPlayerId, alerts));
        }
        debug!("fetching active games for {player_id}");
        Self::relay(self.api.active_games(player_id).await, alerts)
    }

    pub async fn refresh_game(
        &self,
        game_id: &GameId,
        alerts: &mut AlertBus,
    ) -> Result<GameSnapshot, GatewayError> {
        if game_id.is_empty() {
            return Err(Self::reject(GatewayError::MissingGameId, alerts));
        }
        debug!("refreshing game {game_id}");
        Self::relay(self.api.refresh_game(game_id).await, alerts)
    }

    pub async fn submit(
        &self,
        request: &GameActionRequest,
        alerts: &mut AlertBus,
    ) -> Result<GameSnapshot, GatewayError> {
        if request.game_id.is_empty() {
            return Err(Self::reject(GatewayError::MissingGameId, alerts));
        }
        if request.player_id.is_empty() {
            return Err(Self::reject(GatewayError::MissingPlayerId, alerts));
        }
        debug!("submitting {} for game {}", request.kind(), request.game_id);
        Self::relay(self.api.submit_action(request).await, alerts)
    }

    /// Local validation failure: one warning alert, no network call.
    fn reject(error: GatewayError, alerts: &mut AlertBus) -> GatewayError {
        alerts.push(error.alert_message(), error.severity());
        error
    }

    fn relay<T>(
        result: Result<T, GatewayError>,
        alerts: &mut AlertBus,
    ) -> Result<T, GatewayError> {
        if let Err(error) = &result {
            warn!("gateway request failed: {error}");
            alerts.push(error.alert_message(), error.severity());
        }
        result
    }
}
