//! Networking components for talking to the game server.

pub mod errors;
pub mod gateway;
pub mod messages;

pub use errors::GatewayError;
pub use gateway::{GameApi, HttpGameApi, SessionGateway};
pub use messages::{
    ActionPayload, ActiveGame, ActiveGamesResponse, GameActionBuilder, GameActionRequest, NavToken,
    PlayerInfo,
};
