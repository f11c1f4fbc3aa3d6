use crate::model::card::Card;
use crate::model::deck::Deck;
use crate::model::hand::Hand;
use crate::model::player::Player;
use crate::model::suit::Suit;
use crate::model::trick::{Trick, TrickError, beats};
use crate::model::view::PlayerView;
use crate::rules::{GameState, Observable};
use serde::Serialize;
use std::fmt;

pub const HAND_SIZE: usize = 5;
pub const WINNING_POINTS: u16 = 66;
const SCHNEIDER_POINTS: u16 = 33;

/// Full position of one deal, including every hidden card.
///
/// The stock is stored top first; while it is non-empty its last card is the
/// turned-up trump, which is visible to both players and drawn last.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RoundState {
    hands: [Hand; 2],
    stock: Vec<Card>,
    trump_card: Card,
    current_trick: Trick,
    card_points: [u16; 2],
    tricks_won: [u8; 2],
    trump_holder: Option<Player>,
    last_trick_winner: Option<Player>,
    outcome: Option<Outcome>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Outcome {
    pub winner: Player,
    pub game_points: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayOutcome {
    Played,
    TrickCompleted { winner: Player, points: u16 },
    GameOver(Outcome),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayError {
    GameOver,
    CardNotInHand(Card),
    IllegalCard(Card),
    Trick(TrickError),
}

impl fmt::Display for PlayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlayError::GameOver => write!(f, "the deal is already decided"),
            PlayError::CardNotInHand(card) => write!(f, "{card} is not in hand"),
            PlayError::IllegalCard(card) => write!(f, "{card} may not be played now"),
            PlayError::Trick(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for PlayError {}

impl From<TrickError> for PlayError {
    fn from(err: TrickError) -> Self {
        PlayError::Trick(err)
    }
}

impl RoundState {
    /// Deals five cards each, turns the next card as trump and stacks the rest.
    pub fn deal(deck: &Deck, leader: Player) -> Self {
        let cards = deck.cards();
        let first = Hand::with_cards(cards[..HAND_SIZE].to_vec());
        let second = Hand::with_cards(cards[HAND_SIZE..2 * HAND_SIZE].to_vec());
        let trump_card = cards[2 * HAND_SIZE];
        let mut stock = cards[2 * HAND_SIZE + 1..].to_vec();
        stock.push(trump_card);
        Self::from_parts([first, second], stock, trump_card, leader)
    }

    /// Builds a position at the start of a trick.
    ///
    /// When `stock` is non-empty its last card should be `trump_card`.
    pub fn from_parts(hands: [Hand; 2], stock: Vec<Card>, trump_card: Card, leader: Player) -> Self {
        Self {
            hands,
            stock,
            trump_card,
            current_trick: Trick::new(leader),
            card_points: [0; 2],
            tricks_won: [0; 2],
            trump_holder: None,
            last_trick_winner: None,
            outcome: None,
        }
    }

    pub fn with_score(mut self, card_points: [u16; 2], tricks_won: [u8; 2]) -> Self {
        self.card_points = card_points;
        self.tricks_won = tricks_won;
        self
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn assemble(
        hands: [Hand; 2],
        stock: Vec<Card>,
        trump_card: Card,
        current_trick: Trick,
        card_points: [u16; 2],
        tricks_won: [u8; 2],
        trump_holder: Option<Player>,
        last_trick_winner: Option<Player>,
        outcome: Option<Outcome>,
    ) -> Self {
        Self {
            hands,
            stock,
            trump_card,
            current_trick,
            card_points,
            tricks_won,
            trump_holder,
            last_trick_winner,
            outcome,
        }
    }

    pub fn hand(&self, player: Player) -> &Hand {
        &self.hands[player.index()]
    }

    pub fn stock(&self) -> &[Card] {
        &self.stock
    }

    pub fn trump(&self) -> Suit {
        self.trump_card.suit
    }

    pub fn trump_card(&self) -> Card {
        self.trump_card
    }

    pub fn trump_holder(&self) -> Option<Player> {
        self.trump_holder
    }

    pub fn current_trick(&self) -> &Trick {
        &self.current_trick
    }

    pub fn card_points(&self, player: Player) -> u16 {
        self.card_points[player.index()]
    }

    pub fn tricks_won(&self, player: Player) -> u8 {
        self.tricks_won[player.index()]
    }

    pub(crate) fn card_points_all(&self) -> [u16; 2] {
        self.card_points
    }

    pub(crate) fn tricks_won_all(&self) -> [u8; 2] {
        self.tricks_won
    }

    pub fn last_trick_winner(&self) -> Option<Player> {
        self.last_trick_winner
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    pub fn expected_player(&self) -> Player {
        self.current_trick.expected_player()
    }

    pub fn legal_cards(&self, player: Player) -> Vec<Card> {
        if self.outcome.is_some() || player != self.expected_player() {
            return Vec::new();
        }
        legal_cards_for(
            self.hand(player),
            &self.current_trick,
            self.stock.is_empty(),
            self.trump(),
        )
    }

    pub fn play_card(&mut self, player: Player, card: Card) -> Result<PlayOutcome, PlayError> {
        if self.outcome.is_some() {
            return Err(PlayError::GameOver);
        }
        let expected = self.expected_player();
        if expected != player {
            return Err(TrickError::OutOfTurn {
                expected,
                actual: player,
            }
            .into());
        }
        if !self.hand(player).contains(card) {
            return Err(PlayError::CardNotInHand(card));
        }
        if !self.legal_cards(player).contains(&card) {
            return Err(PlayError::IllegalCard(card));
        }
        Ok(self.play_unchecked(card))
    }

    fn play_unchecked(&mut self, card: Card) -> PlayOutcome {
        let player = self.expected_player();
        self.hands[player.index()].remove(card);
        if self.current_trick.play(player, card).is_err() {
            return PlayOutcome::Played;
        }
        if !self.current_trick.is_complete() {
            return PlayOutcome::Played;
        }

        let trump = self.trump();
        let winner = self
            .current_trick
            .winner(trump)
            .unwrap_or(self.current_trick.leader());
        let points = self.current_trick.points();
        self.card_points[winner.index()] += points;
        self.tricks_won[winner.index()] += 1;
        self.last_trick_winner = Some(winner);
        self.current_trick = Trick::new(winner);

        for drawer in [winner, winner.other()] {
            if self.stock.is_empty() {
                break;
            }
            let drawn = self.stock.remove(0);
            if drawn == self.trump_card {
                self.trump_holder = Some(drawer);
            }
            self.hands[drawer.index()].add(drawn);
        }

        let exhausted = self.hands.iter().all(Hand::is_empty);
        if self.card_points[winner.index()] >= WINNING_POINTS || exhausted {
            let outcome = self.settle(winner);
            self.outcome = Some(outcome);
            return PlayOutcome::GameOver(outcome);
        }

        PlayOutcome::TrickCompleted { winner, points }
    }

    fn settle(&self, winner: Player) -> Outcome {
        let loser = winner.other();
        let game_points = if self.tricks_won[loser.index()] == 0 {
            3
        } else if self.card_points[loser.index()] < SCHNEIDER_POINTS {
            2
        } else {
            1
        };
        Outcome {
            winner,
            game_points,
        }
    }
}

/// Cards `hand` may contribute to `trick`.
///
/// Leading, or following while the stock lasts, is unrestricted. Once the
/// stock is exhausted the follower must head the led suit if able, otherwise
/// follow it, otherwise trump, otherwise play anything.
pub fn legal_cards_for(hand: &Hand, trick: &Trick, stock_empty: bool, trump: Suit) -> Vec<Card> {
    let Some(lead) = trick.lead_card() else {
        return hand.cards().to_vec();
    };
    if !stock_empty || trick.is_complete() {
        return hand.cards().to_vec();
    }

    let following: Vec<Card> = hand.of_suit(lead.suit).copied().collect();
    if !following.is_empty() {
        let heading: Vec<Card> = following
            .iter()
            .copied()
            .filter(|card| beats(*card, lead, trump))
            .collect();
        return if heading.is_empty() { following } else { heading };
    }

    let trumps: Vec<Card> = hand.of_suit(trump).copied().collect();
    if !trumps.is_empty() {
        return trumps;
    }

    hand.cards().to_vec()
}

impl GameState for RoundState {
    type Action = Card;
    type Player = Player;

    fn legal_actions(&self) -> Vec<Card> {
        self.legal_cards(self.expected_player())
    }

    fn apply(&self, action: Card) -> Self {
        let mut next = self.clone();
        next.play_unchecked(action);
        next
    }

    fn is_terminal(&self) -> bool {
        self.outcome.is_some()
    }

    fn terminal_value(&self, player: Player) -> f64 {
        match self.outcome {
            Some(outcome) if outcome.winner == player => f64::from(outcome.game_points),
            Some(outcome) => -f64::from(outcome.game_points),
            None => 0.0,
        }
    }

    fn acting_player(&self) -> Player {
        self.expected_player()
    }
}

impl Observable for RoundState {
    type View = PlayerView;

    fn observer_view(&self, player: Player) -> PlayerView {
        PlayerView::observe(self, player)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::rank::Rank;

    fn card(raw: &str) -> Card {
        raw.parse().expect("valid card")
    }

    fn hand(raw: &[&str]) -> Hand {
        Hand::with_cards(raw.iter().map(|c| card(c)).collect())
    }

    #[test]
    fn deal_distributes_all_twenty_cards() {
        let round = RoundState::deal(&Deck::shuffled_with_seed(3), Player::One);
        assert_eq!(round.hand(Player::One).len(), HAND_SIZE);
        assert_eq!(round.hand(Player::Two).len(), HAND_SIZE);
        assert_eq!(round.stock().len(), 10);
        assert_eq!(round.stock().last().copied(), Some(round.trump_card()));
        assert_eq!(round.expected_player(), Player::One);
    }

    #[test]
    fn trick_winner_draws_first_and_leads() {
        let deck = Deck::shuffled_with_seed(11);
        let mut round = RoundState::deal(&deck, Player::One);
        let top = round.stock()[0];
        let second = round.stock()[1];
        let lead = round.hand(Player::One).cards()[0];
        round.play_card(Player::One, lead).unwrap();
        let reply = round.hand(Player::Two).cards()[0];
        let outcome = round.play_card(Player::Two, reply).unwrap();
        let PlayOutcome::TrickCompleted { winner, points } = outcome else {
            panic!("expected completed trick, got {outcome:?}");
        };
        assert_eq!(points, lead.points() + reply.points());
        assert_eq!(round.expected_player(), winner);
        assert!(round.hand(winner).contains(top));
        assert!(round.hand(winner.other()).contains(second));
        assert_eq!(round.stock().len(), 8);
    }

    #[test]
    fn out_of_turn_play_is_rejected() {
        let mut round = RoundState::deal(&Deck::shuffled_with_seed(5), Player::One);
        let card = round.hand(Player::Two).cards()[0];
        assert!(matches!(
            round.play_card(Player::Two, card),
            Err(PlayError::Trick(TrickError::OutOfTurn { .. }))
        ));
    }

    #[test]
    fn follower_must_head_once_stock_is_empty() {
        let round = RoundState::from_parts(
            [hand(&["QH", "AH", "JS"]), hand(&["KH", "10C", "AC"])],
            Vec::new(),
            card("JS"),
            Player::Two,
        );
        let mut probe = round.clone();
        probe.play_card(Player::Two, card("KH")).unwrap();
        assert_eq!(probe.legal_cards(Player::One), vec![card("AH")]);

        let mut probe = round.clone();
        probe.play_card(Player::Two, card("AC")).unwrap();
        assert_eq!(probe.legal_cards(Player::One), vec![card("JS")]);
    }

    #[test]
    fn free_play_while_stock_remains() {
        let round = RoundState::from_parts(
            [hand(&["QH", "AH"]), hand(&["KH", "10C"])],
            vec![card("JD"), card("JS")],
            card("JS"),
            Player::Two,
        );
        let mut probe = round.clone();
        probe.play_card(Player::Two, card("KH")).unwrap();
        assert_eq!(probe.legal_cards(Player::One).len(), 2);
    }

    #[test]
    fn drawing_the_turned_trump_marks_holder() {
        let round = RoundState::from_parts(
            [hand(&["AH"]), hand(&["JH"])],
            vec![card("JD"), card("QS")],
            card("QS"),
            Player::One,
        );
        let next = round.apply(card("AH")).apply(card("JH"));
        assert_eq!(next.trump_holder(), Some(Player::Two));
        assert!(next.hand(Player::Two).contains(card("QS")));
    }

    #[test]
    fn reaching_sixty_six_ends_the_deal() {
        let round = RoundState::from_parts(
            [hand(&["AH", "JC"]), hand(&["10H", "QC"])],
            Vec::new(),
            card("JS"),
            Player::One,
        )
        .with_score([50, 40], [2, 2]);
        let done = round.apply(card("AH")).apply(card("10H"));
        assert!(done.is_terminal());
        let outcome = done.outcome().unwrap();
        assert_eq!(outcome.winner, Player::One);
        assert_eq!(outcome.game_points, 1);
        assert_eq!(done.terminal_value(Player::One), 1.0);
        assert_eq!(done.terminal_value(Player::Two), -1.0);
        assert!(done.legal_actions().is_empty());
    }

    #[test]
    fn last_trick_decides_when_nobody_reaches_target() {
        let round = RoundState::from_parts(
            [hand(&["JC"]), hand(&["QC"])],
            Vec::new(),
            card("JS"),
            Player::One,
        )
        .with_score([30, 20], [3, 1]);
        let done = round.apply(card("JC")).apply(card("QC"));
        let outcome = done.outcome().unwrap();
        assert_eq!(outcome.winner, Player::Two);
        assert_eq!(outcome.game_points, 2);
    }

    #[test]
    fn shutout_scores_three_game_points() {
        let round = RoundState::from_parts(
            [hand(&["AH"]), hand(&["JH"])],
            Vec::new(),
            card("JS"),
            Player::One,
        )
        .with_score([60, 0], [4, 0]);
        let done = round.apply(Card::new(Rank::Ace, Suit::Hearts)).apply(card("JH"));
        assert_eq!(done.outcome().map(|o| o.game_points), Some(3));
    }
}
