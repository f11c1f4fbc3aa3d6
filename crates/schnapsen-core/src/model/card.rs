use crate::model::rank::Rank;
use crate::model::suit::Suit;
use core::fmt;
use core::str::FromStr;
use serde::{Deserialize, Serialize};

/// Ordered by suit, then rank, so sorted hands group suits together.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Card {
    pub suit: Suit,
    pub rank: Rank,
}

impl Card {
    pub const fn new(rank: Rank, suit: Suit) -> Self {
        Self { suit, rank }
    }

    pub const fn points(self) -> u16 {
        self.rank.points()
    }

    /// Dense identifier in `0..20`.
    pub const fn id(self) -> u8 {
        (self.suit.index() * Rank::ORDERED.len() + self.rank.index()) as u8
    }

    pub const fn from_id(id: u8) -> Option<Self> {
        let id = id as usize;
        let suit = match Suit::from_index(id / Rank::ORDERED.len()) {
            Some(suit) => suit,
            None => return None,
        };
        match Rank::from_index(id % Rank::ORDERED.len()) {
            Some(rank) => Some(Card::new(rank, suit)),
            None => None,
        }
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.rank, self.suit)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardParseError(String);

impl fmt::Display for CardParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' is not a valid card", self.0)
    }
}

impl std::error::Error for CardParseError {}

impl FromStr for Card {
    type Err = CardParseError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        let mut chars = trimmed.chars();
        let suit = chars
            .next_back()
            .and_then(Suit::from_symbol)
            .ok_or_else(|| CardParseError(raw.to_string()))?;
        let rank =
            Rank::from_symbol(chars.as_str()).ok_or_else(|| CardParseError(raw.to_string()))?;
        Ok(Card::new(rank, suit))
    }
}
