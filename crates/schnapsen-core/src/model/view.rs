//! What one player can see of a [`RoundState`].

use crate::model::card::Card;
use crate::model::hand::Hand;
use crate::model::player::Player;
use crate::model::round::{Outcome, RoundState, legal_cards_for};
use crate::model::suit::Suit;
use crate::model::trick::Trick;
use crate::rules::{ObservedState, Permutation};

/// Observer view with the opponent's hand and the hidden stock erased.
///
/// Only the turned trump is public: while it lies under the stock, and after
/// the opponent draws it until it is played.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlayerView {
    perspective: Player,
    hand: Hand,
    opponent_known: Vec<Card>,
    opponent_hand_size: usize,
    unseen: Vec<Card>,
    stock_len: usize,
    trump_card: Card,
    current_trick: Trick,
    card_points: [u16; 2],
    tricks_won: [u8; 2],
    trump_holder: Option<Player>,
    last_trick_winner: Option<Player>,
    outcome: Option<Outcome>,
}

impl PlayerView {
    pub fn observe(round: &RoundState, perspective: Player) -> Self {
        let opponent = perspective.other();
        let opponent_hand = round.hand(opponent);
        let trump_card = round.trump_card();

        let opponent_known: Vec<Card> = if round.trump_holder() == Some(opponent)
            && opponent_hand.contains(trump_card)
        {
            vec![trump_card]
        } else {
            Vec::new()
        };

        let stock = round.stock();
        let hidden_stock = stock.len().saturating_sub(1);
        let mut unseen: Vec<Card> = opponent_hand
            .iter()
            .copied()
            .filter(|card| !opponent_known.contains(card))
            .chain(stock[..hidden_stock].iter().copied())
            .collect();
        unseen.sort();

        Self {
            perspective,
            hand: round.hand(perspective).clone(),
            opponent_known,
            opponent_hand_size: opponent_hand.len(),
            unseen,
            stock_len: stock.len(),
            trump_card,
            current_trick: round.current_trick().clone(),
            card_points: round.card_points_all(),
            tricks_won: round.tricks_won_all(),
            trump_holder: round.trump_holder(),
            last_trick_winner: round.last_trick_winner(),
            outcome: round.outcome(),
        }
    }

    pub fn hand(&self) -> &Hand {
        &self.hand
    }

    pub fn opponent_known(&self) -> &[Card] {
        &self.opponent_known
    }

    pub fn opponent_hand_size(&self) -> usize {
        self.opponent_hand_size
    }

    pub fn stock_len(&self) -> usize {
        self.stock_len
    }

    pub fn trump(&self) -> Suit {
        self.trump_card.suit
    }

    pub fn trump_card(&self) -> Card {
        self.trump_card
    }

    pub fn current_trick(&self) -> &Trick {
        &self.current_trick
    }

    pub fn card_points(&self, player: Player) -> u16 {
        self.card_points[player.index()]
    }

    pub fn is_my_turn(&self) -> bool {
        self.outcome.is_none() && self.current_trick.expected_player() == self.perspective
    }

    /// Legal plays for the observer; empty when it is not the observer's turn.
    pub fn legal_cards(&self) -> Vec<Card> {
        if !self.is_my_turn() {
            return Vec::new();
        }
        legal_cards_for(
            &self.hand,
            &self.current_trick,
            self.stock_len == 0,
            self.trump(),
        )
    }

    fn hidden_stock_len(&self) -> usize {
        self.stock_len.saturating_sub(1)
    }
}

impl ObservedState for PlayerView {
    type Card = Card;
    type World = RoundState;

    fn perspective(&self) -> Player {
        self.perspective
    }

    fn unseen_cards(&self) -> Vec<Card> {
        self.unseen.clone()
    }

    fn opponent_unknown_count(&self) -> usize {
        self.opponent_hand_size - self.opponent_known.len()
    }

    fn determinize(&self, permutation: &Permutation<Card>) -> RoundState {
        debug_assert_eq!(permutation.split(), self.opponent_unknown_count());
        debug_assert_eq!(permutation.draw_pile().len(), self.hidden_stock_len());

        let mut opponent_cards = self.opponent_known.clone();
        opponent_cards.extend_from_slice(permutation.opponent_hand());

        let mut stock = permutation.draw_pile().to_vec();
        if self.stock_len > 0 {
            stock.push(self.trump_card);
        }

        let mut hands: [Hand; 2] = Default::default();
        hands[self.perspective.index()] = self.hand.clone();
        hands[self.perspective.other().index()] = Hand::with_cards(opponent_cards);

        RoundState::assemble(
            hands,
            stock,
            self.trump_card,
            self.current_trick.clone(),
            self.card_points,
            self.tricks_won,
            self.trump_holder,
            self.last_trick_winner,
            self.outcome,
        )
    }
}
