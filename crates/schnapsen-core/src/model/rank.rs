use core::fmt;
use serde::{Deserialize, Serialize};

/// Card ranks in trick-taking strength order (Ten beats King).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize,
)]
#[repr(u8)]
pub enum Rank {
    Jack = 0,
    Queen = 1,
    King = 2,
    Ten = 3,
    Ace = 4,
}

impl Rank {
    pub const ORDERED: [Rank; 5] = [Rank::Jack, Rank::Queen, Rank::King, Rank::Ten, Rank::Ace];

    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Rank::Jack),
            1 => Some(Rank::Queen),
            2 => Some(Rank::King),
            3 => Some(Rank::Ten),
            4 => Some(Rank::Ace),
            _ => None,
        }
    }

    pub const fn index(self) -> usize {
        self as usize
    }

    /// Card points collected by the trick winner.
    pub const fn points(self) -> u16 {
        match self {
            Rank::Jack => 2,
            Rank::Queen => 3,
            Rank::King => 4,
            Rank::Ten => 10,
            Rank::Ace => 11,
        }
    }

    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol.to_ascii_uppercase().as_str() {
            "J" => Some(Rank::Jack),
            "Q" => Some(Rank::Queen),
            "K" => Some(Rank::King),
            "10" | "T" => Some(Rank::Ten),
            "A" => Some(Rank::Ace),
            _ => None,
        }
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Rank::Jack => "J",
            Rank::Queen => "Q",
            Rank::King => "K",
            Rank::Ten => "10",
            Rank::Ace => "A",
        };
        f.write_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::Rank;

    #[test]
    fn ten_outranks_king() {
        assert!(Rank::Ten > Rank::King);
        assert!(Rank::Ace > Rank::Ten);
    }

    #[test]
    fn deck_points_total_thirty_per_suit() {
        let total: u16 = Rank::ORDERED.iter().map(|rank| rank.points()).sum();
        assert_eq!(total, 30);
    }

    #[test]
    fn display_matches_symbols() {
        assert_eq!(Rank::Queen.to_string(), "Q");
        assert_eq!(Rank::Ten.to_string(), "10");
        assert_eq!(Rank::from_symbol("t"), Some(Rank::Ten));
    }
}
