use crate::cards::Card;
use rand::Rng;
use std::collections::HashSet;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DeckError {
    #[error("invalid deck state: {0}")]
    InvalidDeckState(String),
    #[error("insufficient cards: requested {requested}, {remaining} remaining")]
    InsufficientCards { requested: usize, remaining: usize },
}

/// The 52-card universe minus a set of dead cards.
///
/// A deck is cheap to clone; callers that need many independent draws from the
/// same dead set build one deck and clone it per trial.
///
/// ```
/// use holdem_advisor::cards::Card;
/// use holdem_advisor::deck::Deck;
/// use rand::SeedableRng;
/// use rand_chacha::ChaCha8Rng;
///
/// let dead: Vec<Card> = vec!["As".parse().unwrap(), "Ah".parse().unwrap()];
/// let mut deck = Deck::new(&dead).unwrap();
/// assert_eq!(deck.len(), 50);
///
/// let mut rng = ChaCha8Rng::seed_from_u64(1);
/// let flop = deck.draw_n(3, &mut rng).unwrap();
/// assert_eq!(flop.len(), 3);
/// assert_eq!(deck.len(), 47);
/// ```
#[derive(Debug, Clone)]
pub struct Deck {
    cards: Vec<Card>,
}

impl Deck {
    /// Full 52-card deck.
    pub fn standard() -> Self {
        Self { cards: Card::all().collect() }
    }

    /// Build the deck of every card not in `dead`.
    ///
    /// Fails with [`DeckError::InvalidDeckState`] if `dead` repeats a card or
    /// names more than 52 cards.
    pub fn new(dead: &[Card]) -> Result<Self, DeckError> {
        if dead.len() > 52 {
            return Err(DeckError::InvalidDeckState(format!(
                "{} dead cards exceed the 52-card deck",
                dead.len()
            )));
        }
        let mut seen: HashSet<Card> = HashSet::with_capacity(dead.len());
        for &c in dead {
            if !seen.insert(c) {
                return Err(DeckError::InvalidDeckState(format!("dead card {c} listed twice")));
            }
        }
        let cards = Card::all().filter(|c| !seen.contains(c)).collect();
        Ok(Self { cards })
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn contains(&self, card: Card) -> bool {
        self.cards.contains(&card)
    }

    /// Remaining cards, in no meaningful order.
    pub fn remaining(&self) -> &[Card] {
        &self.cards
    }

    /// Remove and return one uniformly random card.
    pub fn draw<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<Card> {
        if self.cards.is_empty() {
            return None;
        }
        let i = rng.random_range(0..self.cards.len());
        Some(self.cards.swap_remove(i))
    }

    /// Remove and return `k` uniformly random distinct cards.
    ///
    /// Fails without touching the deck when fewer than `k` cards remain.
    pub fn draw_n<R: Rng + ?Sized>(&mut self, k: usize, rng: &mut R) -> Result<Vec<Card>, DeckError> {
        if k > self.cards.len() {
            return Err(DeckError::InsufficientCards { requested: k, remaining: self.cards.len() });
        }
        let mut out = Vec::with_capacity(k);
        for _ in 0..k {
            let i = rng.random_range(0..self.cards.len());
            out.push(self.cards.swap_remove(i));
        }
        Ok(out)
    }

    /// Fill `out` with random cards; the allocation-free form of [`Deck::draw_n`].
    pub fn draw_into<R: Rng + ?Sized>(&mut self, out: &mut [Card], rng: &mut R) -> Result<(), DeckError> {
        if out.len() > self.cards.len() {
            return Err(DeckError::InsufficientCards {
                requested: out.len(),
                remaining: self.cards.len(),
            });
        }
        for slot in out.iter_mut() {
            let i = rng.random_range(0..self.cards.len());
            *slot = self.cards.swap_remove(i);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::{Rank, Suit};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn standard_deck_has_52_cards() {
        assert_eq!(Deck::standard().len(), 52);
        assert_eq!(Deck::new(&[]).unwrap().len(), 52);
    }

    #[test]
    fn dead_cards_are_excluded() {
        let a = Card::new(Rank::Ace, Suit::Spades);
        let k = Card::new(Rank::King, Suit::Hearts);
        let d = Deck::new(&[a, k]).unwrap();
        assert_eq!(d.len(), 50);
        assert!(!d.contains(a));
        assert!(!d.contains(k));
    }

    #[test]
    fn duplicate_dead_cards_are_invalid() {
        let a = Card::new(Rank::Ace, Suit::Spades);
        assert!(matches!(Deck::new(&[a, a]), Err(DeckError::InvalidDeckState(_))));
    }

    #[test]
    fn more_than_52_dead_cards_are_invalid() {
        let mut dead: Vec<Card> = Card::all().collect();
        dead.push(Card::new(Rank::Two, Suit::Clubs));
        assert!(matches!(Deck::new(&dead), Err(DeckError::InvalidDeckState(_))));
    }

    #[test]
    fn seeded_draws_are_reproducible() {
        let mut d1 = Deck::standard();
        let mut d2 = Deck::standard();
        let a = d1.draw_n(7, &mut ChaCha8Rng::seed_from_u64(42)).unwrap();
        let b = d2.draw_n(7, &mut ChaCha8Rng::seed_from_u64(42)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn overdraw_fails_and_leaves_deck_intact() {
        let dead: Vec<Card> = Card::all().take(50).collect();
        let mut d = Deck::new(&dead).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let err = d.draw_n(3, &mut rng).unwrap_err();
        assert_eq!(err, DeckError::InsufficientCards { requested: 3, remaining: 2 });
        assert_eq!(d.len(), 2);
        assert_eq!(d.draw_n(2, &mut rng).unwrap().len(), 2);
        assert!(d.is_empty());
        assert_eq!(d.draw(&mut rng), None);
    }

    #[test]
    fn draw_into_fills_slots() {
        let mut d = Deck::standard();
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let mut buf = [Card::new(Rank::Two, Suit::Clubs); 5];
        d.draw_into(&mut buf, &mut rng).unwrap();
        assert_eq!(d.len(), 47);
        for c in buf {
            assert!(!d.contains(c));
        }
    }
}
