//! Request and response types for the game server API.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::super::game::{
    entities::{Blocker, Card, GameId, Player, PlayerColor, PlayerId},
    state_machine::ActionKind,
};

/// Opaque navigation token carried through an action so the UI layer can
/// redirect after it completes. Never serialized, never inspected here.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NavToken(String);

impl NavToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

/// Per-kind action payload, mirroring the server's action models.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionPayload {
    Shuffle,
    SelectCard { card: Card },
    Deal { num_shuffles: u32 },
    BuildCrib { cards: Vec<Card> },
    Cut { percentage: f64 },
    Peg { card: Card },
}

impl ActionPayload {
    #[must_use]
    pub const fn kind(&self) -> ActionKind {
        match self {
            Self::Shuffle => ActionKind::Shuffle,
            Self::SelectCard { .. } => ActionKind::SelectCard,
            Self::Deal { .. } => ActionKind::Deal,
            Self::BuildCrib { .. } => ActionKind::BuildCrib,
            Self::Cut { .. } => ActionKind::Cut,
            Self::Peg { .. } => ActionKind::Peg,
        }
    }

    /// The blocker this action overcomes server-side, when there is one.
    #[must_use]
    pub const fn overcomes(&self) -> Option<Blocker> {
        match self {
            Self::Deal { .. } => Some(Blocker::DealCards),
            Self::BuildCrib { .. } => Some(Blocker::CribCard),
            Self::Cut { .. } => Some(Blocker::CutCard),
            Self::Peg { .. } => Some(Blocker::PegCard),
            Self::Shuffle | Self::SelectCard { .. } => None,
        }
    }
}

/// A typed, serializable action request bound for the server.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct GameActionRequest {
    #[serde(rename = "gameID")]
    pub game_id: GameId,
    #[serde(rename = "playerID")]
    pub player_id: PlayerId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overcomes: Option<Blocker>,
    #[serde(flatten)]
    pub payload: ActionPayload,
    #[serde(skip)]
    nav: Option<NavToken>,
}

impl GameActionRequest {
    #[must_use]
    pub const fn kind(&self) -> ActionKind {
        self.payload.kind()
    }

    /// Path segment of the submission endpoint for this action kind.
    #[must_use]
    pub const fn endpoint(&self) -> &'static str {
        match self.payload {
            ActionPayload::Shuffle => "shuffle",
            ActionPayload::SelectCard { .. } => "select-card",
            ActionPayload::Deal { .. } => "deal",
            ActionPayload::BuildCrib { .. } => "build-crib",
            ActionPayload::Cut { .. } => "cut",
            ActionPayload::Peg { .. } => "peg",
        }
    }

    #[must_use]
    pub fn nav(&self) -> Option<&NavToken> {
        self.nav.as_ref()
    }
}

/// Builds action requests from raw user input plus session context: the
/// game, the acting player, and an optional navigation token.
#[derive(Clone, Debug)]
pub struct GameActionBuilder {
    game_id: GameId,
    player_id: PlayerId,
    nav: Option<NavToken>,
}

impl GameActionBuilder {
    #[must_use]
    pub fn new(game_id: GameId, player_id: PlayerId) -> Self {
        Self {
            game_id,
            player_id,
            nav: None,
        }
    }

    #[must_use]
    pub fn with_navigation(mut self, token: NavToken) -> Self {
        self.nav = Some(token);
        self
    }

    fn request(&self, payload: ActionPayload) -> GameActionRequest {
        GameActionRequest {
            game_id: self.game_id.clone(),
            player_id: self.player_id.clone(),
            overcomes: payload.overcomes(),
            payload,
            nav: self.nav.clone(),
        }
    }

    #[must_use]
    pub fn shuffle(&self) -> GameActionRequest {
        self.request(ActionPayload::Shuffle)
    }

    #[must_use]
    pub fn deal(&self, num_shuffles: u32) -> GameActionRequest {
        self.request(ActionPayload::Deal { num_shuffles })
    }

    #[must_use]
    pub fn select_card(&self, card: Card) -> GameActionRequest {
        self.request(ActionPayload::SelectCard { card })
    }

    /// Face-down cards are not selectable, so they are filtered out rather
    /// than sent.
    #[must_use]
    pub fn build_crib(&self, cards: &[Card]) -> GameActionRequest {
        let cards = cards.iter().copied().filter(Card::is_known).collect();
        self.request(ActionPayload::BuildCrib { cards })
    }

    /// `percentage` is clamped to [0, 1]; a non-finite input falls back to
    /// the middle of the deck.
    #[must_use]
    pub fn cut(&self, percentage: f64) -> GameActionRequest {
        let percentage = if percentage.is_finite() {
            percentage.clamp(0.0, 1.0)
        } else {
            0.5
        };
        self.request(ActionPayload::Cut { percentage })
    }

    #[must_use]
    pub fn peg(&self, card: Card) -> GameActionRequest {
        self.request(ActionPayload::Peg { card })
    }
}

/// The requesting player as the active-games endpoint reports them.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct PlayerInfo {
    pub id: PlayerId,
    pub name: String,
    #[serde(default)]
    pub games: HashMap<GameId, PlayerColor>,
}

/// One row in the active-games listing.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ActiveGame {
    #[serde(rename = "gameID")]
    pub game_id: GameId,
    pub players: Vec<Player>,
    /// Server-formatted timestamps, opaque to this client.
    #[serde(default)]
    pub created: Option<String>,
    #[serde(default, rename = "lastMove")]
    pub last_move: Option<String>,
}

/// Response to `GET /games/active?playerID={id}`.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ActiveGamesResponse {
    pub player: PlayerInfo,
    #[serde(default, rename = "activeGames")]
    pub active_games: Vec<ActiveGame>,
}

/// Error body the server attaches to failed requests.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ErrorBody {
    pub message: String,
}
