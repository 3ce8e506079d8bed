use holdem_advisor::cards::Card;
use holdem_advisor::deck::{Deck, DeckError};
use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::HashSet;

fn all_cards() -> Vec<Card> {
    Card::all().collect()
}

fn dead_cards() -> impl Strategy<Value = Vec<Card>> {
    proptest::sample::subsequence(all_cards(), 0..=52).prop_shuffle()
}

proptest! {
    #[test]
    fn deck_excludes_exactly_the_dead_cards(dead in dead_cards()) {
        let deck = Deck::new(&dead).unwrap();
        prop_assert_eq!(deck.len(), 52 - dead.len());
        for c in &dead {
            prop_assert!(!deck.contains(*c));
        }
        let unique: HashSet<Card> = deck.remaining().iter().copied().collect();
        prop_assert_eq!(unique.len(), deck.len());
    }

    #[test]
    fn draws_are_distinct_and_live(dead in dead_cards(), k in 0usize..=52, seed in any::<u64>()) {
        let mut deck = Deck::new(&dead).unwrap();
        let before = deck.len();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        match deck.draw_n(k, &mut rng) {
            Ok(drawn) => {
                prop_assert!(k <= before);
                prop_assert_eq!(drawn.len(), k);
                prop_assert_eq!(deck.len(), before - k);
                let unique: HashSet<Card> = drawn.iter().copied().collect();
                prop_assert_eq!(unique.len(), k);
                for c in &drawn {
                    prop_assert!(!dead.contains(c));
                    prop_assert!(!deck.contains(*c));
                }
            }
            Err(e) => {
                prop_assert!(k > before);
                prop_assert_eq!(e, DeckError::InsufficientCards { requested: k, remaining: before });
                prop_assert_eq!(deck.len(), before);
            }
        }
    }

    #[test]
    fn same_seed_same_draws(seed in any::<u64>()) {
        let draw = || {
            let mut deck = Deck::standard();
            deck.draw_n(9, &mut ChaCha8Rng::seed_from_u64(seed)).unwrap()
        };
        prop_assert_eq!(draw(), draw());
    }
}

#[test]
fn repeated_dead_card_is_invalid_state() {
    let ace: Card = "As".parse().unwrap();
    assert!(matches!(Deck::new(&[ace, ace]), Err(DeckError::InvalidDeckState(_))));
}

#[test]
fn draining_the_deck_then_drawing_returns_none() {
    let mut deck = Deck::standard();
    let mut rng = ChaCha8Rng::seed_from_u64(3);
    let all = deck.draw_n(52, &mut rng).unwrap();
    assert_eq!(all.len(), 52);
    assert!(deck.is_empty());
    assert_eq!(deck.draw(&mut rng), None);
}
