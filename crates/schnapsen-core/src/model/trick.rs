use crate::model::card::Card;
use crate::model::player::Player;
use crate::model::suit::Suit;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Trick {
    leader: Player,
    plays: Vec<Play>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Play {
    pub player: Player,
    pub card: Card,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrickError {
    TrickComplete,
    OutOfTurn { expected: Player, actual: Player },
}

impl fmt::Display for TrickError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrickError::TrickComplete => write!(f, "trick already complete"),
            TrickError::OutOfTurn { expected, actual } => {
                write!(f, "expected player {expected} to play next but got {actual}")
            }
        }
    }
}

impl std::error::Error for TrickError {}

impl Trick {
    pub fn new(leader: Player) -> Self {
        Self {
            leader,
            plays: Vec::with_capacity(2),
        }
    }

    pub fn leader(&self) -> Player {
        self.leader
    }

    pub fn plays(&self) -> &[Play] {
        &self.plays
    }

    pub fn is_empty(&self) -> bool {
        self.plays.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        self.plays.len() == 2
    }

    pub fn lead_card(&self) -> Option<Card> {
        self.plays.first().map(|play| play.card)
    }

    pub fn lead_suit(&self) -> Option<Suit> {
        self.lead_card().map(|card| card.suit)
    }

    pub fn expected_player(&self) -> Player {
        self.plays
            .last()
            .map(|play| play.player.other())
            .unwrap_or(self.leader)
    }

    pub fn play(&mut self, player: Player, card: Card) -> Result<(), TrickError> {
        if self.is_complete() {
            return Err(TrickError::TrickComplete);
        }

        let expected = self.expected_player();
        if expected != player {
            return Err(TrickError::OutOfTurn {
                expected,
                actual: player,
            });
        }

        self.plays.push(Play { player, card });
        Ok(())
    }

    /// Highest trump wins, otherwise the highest card of the led suit.
    pub fn winner(&self, trump: Suit) -> Option<Player> {
        if !self.is_complete() {
            return None;
        }
        let lead = self.plays[0];
        let follow = self.plays[1];
        if beats(follow.card, lead.card, trump) {
            Some(follow.player)
        } else {
            Some(lead.player)
        }
    }

    pub fn points(&self) -> u16 {
        self.plays.iter().map(|play| play.card.points()).sum()
    }
}

/// Whether `follow` takes a trick led with `lead`.
pub fn beats(follow: Card, lead: Card, trump: Suit) -> bool {
    if follow.suit == lead.suit {
        follow.rank > lead.rank
    } else {
        follow.suit == trump
    }
}
