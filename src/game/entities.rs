use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::{collections::HashMap, fmt, str::FromStr};
use thiserror::Error;

/// Suit order matches the server's numbering (spades first).
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Suit {
    Spades,
    Clubs,
    Diamonds,
    Hearts,
}

impl Suit {
    pub const ALL: [Self; 4] = [Self::Spades, Self::Clubs, Self::Diamonds, Self::Hearts];

    #[must_use]
    pub const fn from_index(idx: u8) -> Option<Self> {
        match idx {
            0 => Some(Self::Spades),
            1 => Some(Self::Clubs),
            2 => Some(Self::Diamonds),
            3 => Some(Self::Hearts),
            _ => None,
        }
    }

    #[must_use]
    pub const fn index(self) -> u8 {
        match self {
            Self::Spades => 0,
            Self::Clubs => 1,
            Self::Diamonds => 2,
            Self::Hearts => 3,
        }
    }
}

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Spades => "♠",
            Self::Clubs => "♣",
            Self::Diamonds => "♦",
            Self::Hearts => "♥",
        };
        write!(f, "{repr}")
    }
}

/// Placeholder for card values. Ace is 1, king is 13.
pub type Value = u8;

/// A playing card as this client sees it.
///
/// `Unknown` is the face-down sentinel for an opponent card whose identity
/// the server has not revealed. It is never selectable and never compares
/// equal to anything under [`Card::same_card`]; the derived equality is the
/// structural one used when comparing whole snapshots.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Card {
    Known { value: Value, suit: Suit },
    Unknown,
}

impl Card {
    #[must_use]
    pub const fn new(value: Value, suit: Suit) -> Self {
        Self::Known { value, suit }
    }

    /// Deck-position constructor: 0..=51, suits in server order.
    #[must_use]
    pub const fn from_number(n: u8) -> Option<Self> {
        if n > 51 {
            return None;
        }
        match Suit::from_index(n / 13) {
            Some(suit) => Some(Self::new(n % 13 + 1, suit)),
            None => None,
        }
    }

    #[must_use]
    pub const fn is_known(&self) -> bool {
        matches!(self, Self::Known { .. })
    }

    /// Identity comparison by (value, suit). A face-down card has no
    /// identity, so it matches nothing, itself included.
    #[must_use]
    pub fn same_card(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Known { value: v, suit: s }, Self::Known { value: ov, suit: os }) => {
                v == ov && s == os
            }
            _ => false,
        }
    }

    /// Pegging count contribution: face cards count ten.
    #[must_use]
    pub fn peg_value(&self) -> u8 {
        match *self {
            Self::Known { value, .. } => value.min(10),
            Self::Unknown => 0,
        }
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Self::Known { value, suit } => {
                let value = match value {
                    1 => "A",
                    11 => "J",
                    12 => "Q",
                    13 => "K",
                    v => &v.to_string(),
                };
                write!(f, "{value}{suit}")
            }
            Self::Unknown => write!(f, "??"),
        }
    }
}

/// Errors from parsing a card out of its text form.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum ParseCardError {
    #[error("empty card")]
    Empty,
    #[error("bad card value: {0}")]
    BadValue(String),
    #[error("bad input card: {0}")]
    BadSuit(String),
}

impl FromStr for Card {
    type Err = ParseCardError;

    /// Accepts the forms the server emits and users type: `5H`, `10s`,
    /// `kd`, `A♣`, `Q♥`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Suit symbols sometimes carry a variation selector.
        let cleaned: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, '\u{fe0e}' | '\u{fe0f}'))
            .collect();
        let first = cleaned.chars().next().ok_or(ParseCardError::Empty)?;
        let value: Value = match first {
            'A' | 'a' => 1,
            'J' | 'j' => 11,
            'Q' | 'q' => 12,
            'K' | 'k' => 13,
            // 10 through 13 are written with two digits; a bare `1` is an ace
            '1' => cleaned.chars().take(2).collect::<String>().parse().unwrap_or(1),
            c if c.is_ascii_digit() => (c as u8) - b'0',
            _ => return Err(ParseCardError::BadValue(s.to_owned())),
        };
        if !(1..=13).contains(&value) {
            return Err(ParseCardError::BadValue(s.to_owned()));
        }
        let suit = match cleaned.chars().last().ok_or(ParseCardError::Empty)? {
            'S' | 's' | '♤' | '♠' => Suit::Spades,
            'C' | 'c' | '♧' | '♣' => Suit::Clubs,
            'D' | 'd' | '♢' | '♦' => Suit::Diamonds,
            'H' | 'h' | '♡' | '♥' => Suit::Hearts,
            _ => return Err(ParseCardError::BadSuit(s.to_owned())),
        };
        Ok(Self::new(value, suit))
    }
}

/// Wire form of a card: `value == 0` is the face-down sentinel.
#[derive(Deserialize, Serialize)]
struct WireCard {
    value: u8,
    suit: u8,
}

impl Serialize for Card {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let wire = match *self {
            Self::Known { value, suit } => WireCard {
                value,
                suit: suit.index(),
            },
            Self::Unknown => WireCard { value: 0, suit: 0 },
        };
        wire.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Card {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let wire = WireCard::deserialize(deserializer)?;
        match wire.value {
            0 => Ok(Self::Unknown),
            v @ 1..=13 => {
                let suit = Suit::from_index(wire.suit).ok_or_else(|| {
                    serde::de::Error::custom(format!("bad suit index: {}", wire.suit))
                })?;
                Ok(Self::new(v, suit))
            }
            v => Err(serde::de::Error::custom(format!("bad card value: {v}"))),
        }
    }
}

/// Sorts cards in rank order with suit as the tiebreak. Face-down cards sink
/// to the end in either direction.
#[must_use]
pub fn sort_by_value(cards: &[Card], descending: bool) -> Vec<Card> {
    let key = |c: &Card| match *c {
        Card::Known { value, suit } => (0u8, value, suit.index()),
        Card::Unknown => (1, 0, 0),
    };
    let mut sorted = cards.to_vec();
    sorted.sort_by(|a, b| {
        let (ka, kb) = (key(a), key(b));
        if ka.0 != kb.0 {
            return ka.0.cmp(&kb.0);
        }
        let ord = (ka.1, ka.2).cmp(&(kb.1, kb.2));
        if descending { ord.reverse() } else { ord }
    });
    sorted
}

/// Opaque server-assigned player identifier.
#[derive(Clone, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct PlayerId(String);

impl PlayerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for PlayerId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Opaque server-assigned game identifier. Empty when no game is active.
#[derive(Clone, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct GameId(String);

impl GameId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for GameId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Peg colors a player can hold on the board.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerColor {
    Green,
    Blue,
    Red,
}

impl fmt::Display for PlayerColor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Green => "green",
            Self::Blue => "blue",
            Self::Red => "red",
        };
        write!(f, "{repr}")
    }
}

/// One seat at the table. Fixed for the match lifetime.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub color: PlayerColor,
}

/// Match phases, server-authoritative. The client never self-advances the
/// phase; the server moves `Score` back to `Deal` for a new round.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum Phase {
    Deal,
    BuildCrib,
    Cut,
    Peg,
    Score,
    Complete,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Deal => "deal",
            Self::BuildCrib => "build crib",
            Self::Cut => "cut",
            Self::Peg => "peg",
            Self::Score => "score",
            Self::Complete => "complete",
        };
        write!(f, "{repr}")
    }
}

/// What a blocked player must do before the game can advance.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum Blocker {
    DealCards,
    CribCard,
    CutCard,
    PegCard,
    CountHand,
    CountCrib,
}

/// A card played during pegging, attributed to its player.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct PeggedCard {
    pub card: Card,
    pub player_id: PlayerId,
}

/// A full, server-authoritative representation of game state at a point in
/// time. Everything the client knows about a match comes in through one of
/// these.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct GameSnapshot {
    #[serde(rename = "gameID")]
    pub game_id: GameId,
    pub phase: Phase,
    pub players: Vec<Player>,
    #[serde(default)]
    pub hands: HashMap<PlayerId, Vec<Card>>,
    #[serde(default)]
    pub crib: Vec<Card>,
    #[serde(default)]
    pub cut_card: Option<Card>,
    #[serde(default)]
    pub peg_positions: HashMap<PlayerId, u32>,
    #[serde(default)]
    pub current_dealer: Option<PlayerId>,
    #[serde(default)]
    pub current_scores: HashMap<PlayerColor, u32>,
    #[serde(default)]
    pub lag_scores: HashMap<PlayerColor, u32>,
    #[serde(default)]
    pub pegged_cards: Vec<PeggedCard>,
    #[serde(default)]
    pub blocking_players: HashMap<PlayerId, Blocker>,
}

impl GameSnapshot {
    /// Cards this client can see in the given player's hand.
    #[must_use]
    pub fn hand(&self, id: &PlayerId) -> &[Card] {
        self.hands.get(id).map_or(&[], Vec::as_slice)
    }

    /// What the given player must do next, if the game is waiting on them.
    #[must_use]
    pub fn blocker_for(&self, id: &PlayerId) -> Option<Blocker> {
        self.blocking_players.get(id).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(s: &str) -> Card {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_plain_forms() {
        assert_eq!(card("5H"), Card::new(5, Suit::Hearts));
        assert_eq!(card("10s"), Card::new(10, Suit::Spades));
        assert_eq!(card("kd"), Card::new(13, Suit::Diamonds));
        assert_eq!(card("A♣"), Card::new(1, Suit::Clubs));
        assert_eq!(card("Q♥"), Card::new(12, Suit::Hearts));
    }

    #[test]
    fn test_parse_one_is_an_ace() {
        assert_eq!(card("1s"), Card::new(1, Suit::Spades));
        assert_eq!(card("12c"), Card::new(12, Suit::Clubs));
        assert_eq!(card("13h"), Card::new(13, Suit::Hearts));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!("".parse::<Card>(), Err(ParseCardError::Empty));
        assert!(matches!("0s".parse::<Card>(), Err(ParseCardError::BadValue(_))));
        assert!(matches!("5x".parse::<Card>(), Err(ParseCardError::BadSuit(_))));
        assert!(matches!("zz".parse::<Card>(), Err(ParseCardError::BadValue(_))));
    }

    #[test]
    fn test_display_round_trips_through_parse() {
        for s in ["A♠", "10♦", "J♣", "K♥", "7♠"] {
            let c = card(s);
            assert_eq!(format!("{c}"), s);
        }
        assert_eq!(format!("{}", Card::Unknown), "??");
    }

    #[test]
    fn test_from_number_covers_the_deck() {
        assert_eq!(Card::from_number(0), Some(Card::new(1, Suit::Spades)));
        assert_eq!(Card::from_number(12), Some(Card::new(13, Suit::Spades)));
        assert_eq!(Card::from_number(13), Some(Card::new(1, Suit::Clubs)));
        assert_eq!(Card::from_number(51), Some(Card::new(13, Suit::Hearts)));
        assert_eq!(Card::from_number(52), None);
    }

    #[test]
    fn test_unknown_has_no_identity() {
        let five = Card::new(5, Suit::Hearts);
        assert!(five.same_card(&card("5h")));
        assert!(!five.same_card(&Card::Unknown));
        assert!(!Card::Unknown.same_card(&Card::Unknown));
        assert!(!five.same_card(&Card::new(5, Suit::Spades)));
    }

    #[test]
    fn test_peg_value_caps_at_ten() {
        assert_eq!(card("7c").peg_value(), 7);
        assert_eq!(card("10c").peg_value(), 10);
        assert_eq!(card("Kc").peg_value(), 10);
        assert_eq!(Card::Unknown.peg_value(), 0);
    }

    #[test]
    fn test_sort_by_value_ascending_and_descending() {
        let cards = vec![card("Kd"), card("2h"), card("2s"), Card::Unknown, card("9c")];
        let asc = sort_by_value(&cards, false);
        assert_eq!(
            asc,
            vec![card("2s"), card("2h"), card("9c"), card("Kd"), Card::Unknown]
        );
        let desc = sort_by_value(&cards, true);
        assert_eq!(
            desc,
            vec![card("Kd"), card("9c"), card("2h"), card("2s"), Card::Unknown]
        );
    }

    #[test]
    fn test_card_wire_format() {
        let json = serde_json::to_string(&Card::new(13, Suit::Hearts)).unwrap();
        assert_eq!(json, r#"{"value":13,"suit":3}"#);
        let back: Card = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Card::new(13, Suit::Hearts));
    }

    #[test]
    fn test_card_wire_unknown_sentinel() {
        let json = serde_json::to_string(&Card::Unknown).unwrap();
        assert_eq!(json, r#"{"value":0,"suit":0}"#);
        let back: Card = serde_json::from_str(r#"{"value":0,"suit":2}"#).unwrap();
        assert_eq!(back, Card::Unknown);
    }

    #[test]
    fn test_card_wire_rejects_bad_values() {
        assert!(serde_json::from_str::<Card>(r#"{"value":14,"suit":0}"#).is_err());
        assert!(serde_json::from_str::<Card>(r#"{"value":5,"suit":4}"#).is_err());
    }

    #[test]
    fn test_snapshot_deserializes_with_sparse_fields() {
        let json = r#"{
            "gameID": "G1",
            "phase": "Deal",
            "players": [
                {"id": "p1", "name": "alice", "color": "blue"},
                {"id": "p2", "name": "bob", "color": "red"}
            ]
        }"#;
        let snapshot: GameSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snapshot.game_id, GameId::from("G1"));
        assert_eq!(snapshot.phase, Phase::Deal);
        assert!(snapshot.hands.is_empty());
        assert!(snapshot.cut_card.is_none());
        assert!(snapshot.hand(&PlayerId::from("p1")).is_empty());
    }

    #[test]
    fn test_snapshot_full_round_trip() {
        let p1 = PlayerId::from("p1");
        let snapshot = GameSnapshot {
            game_id: GameId::from("G7"),
            phase: Phase::Peg,
            players: vec![Player {
                id: p1.clone(),
                name: "alice".to_owned(),
                color: PlayerColor::Blue,
            }],
            hands: HashMap::from([(p1.clone(), vec![card("4s"), Card::Unknown])]),
            crib: vec![card("6d")],
            cut_card: Some(card("Jh")),
            peg_positions: HashMap::from([(p1.clone(), 42)]),
            current_dealer: Some(p1.clone()),
            current_scores: HashMap::from([(PlayerColor::Blue, 42)]),
            lag_scores: HashMap::from([(PlayerColor::Blue, 37)]),
            pegged_cards: vec![PeggedCard {
                card: card("4s"),
                player_id: p1.clone(),
            }],
            blocking_players: HashMap::from([(p1.clone(), Blocker::PegCard)]),
        };
        let json = serde_json::to_string(&snapshot).unwrap();
        let back: GameSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snapshot);
        assert_eq!(back.blocker_for(&p1), Some(Blocker::PegCard));
    }
}
