//! Hand ranking.
//!
//! The equity estimator and the showdown helpers only ever ask "is this score
//! strictly stronger than that one", through the [`HandEvaluator`] trait. The
//! bundled [`HoldemEvaluator`] picks the best five of seven cards and packs the
//! result into a [`HandValue`] where higher is stronger; other evaluators may
//! use the opposite convention as long as [`HandEvaluator::stronger`] agrees.

use crate::cards::{Card, Rank};
use crate::hand::{validate_holdem, Board, HandError, HoleCards};
use core::cmp::Ordering;
use core::fmt;

/// Ranks a two-card hand against a complete five-card board.
pub trait HandEvaluator: Sync {
    /// Totally ordered strength. Equal scores are ties.
    type Score: Copy + Ord + Send + fmt::Debug;

    fn evaluate(&self, hole: &HoleCards, board: &[Card; 5]) -> Self::Score;

    /// Whether `a` beats `b` outright. Ties are not wins.
    fn stronger(&self, a: &Self::Score, b: &Self::Score) -> bool;
}

/// Compact, comparable hand strength. Higher is better.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HandValue(u64);

impl HandValue {
    pub const fn raw(self) -> u64 {
        self.0
    }

    /// Pack a category and five rank tiebreakers into a comparable value.
    ///
    /// Layout, most significant first: category (8 bits) then five 6-bit ranks.
    fn from_parts(category: Category, ranks_desc: &[Rank; 5]) -> Self {
        const CAT_SHIFT: u32 = 48;
        const RANK_STRIDE: u32 = 6;
        let mut v: u64 = (category as u64) << CAT_SHIFT;
        for (i, r) in ranks_desc.iter().enumerate() {
            let offset = CAT_SHIFT - RANK_STRIDE * (i as u32 + 1);
            v |= (*r as u64) << offset;
        }
        HandValue(v)
    }

    pub fn category(self) -> Category {
        match (self.0 >> 48) as u8 {
            0 => Category::HighCard,
            1 => Category::Pair,
            2 => Category::TwoPair,
            3 => Category::ThreeOfAKind,
            4 => Category::Straight,
            5 => Category::Flush,
            6 => Category::FullHouse,
            7 => Category::FourOfAKind,
            _ => Category::StraightFlush,
        }
    }
}

/// Poker hand category from weakest to strongest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Category {
    HighCard = 0,
    Pair = 1,
    TwoPair = 2,
    ThreeOfAKind = 3,
    Straight = 4,
    Flush = 5,
    FullHouse = 6,
    FourOfAKind = 7,
    StraightFlush = 8,
}

impl Category {
    pub fn label(self) -> &'static str {
        match self {
            Category::HighCard => "High Card",
            Category::Pair => "Pair",
            Category::TwoPair => "Two Pair",
            Category::ThreeOfAKind => "Three of a Kind",
            Category::Straight => "Straight",
            Category::Flush => "Flush",
            Category::FullHouse => "Full House",
            Category::FourOfAKind => "Four of a Kind",
            Category::StraightFlush => "Straight Flush",
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum EvalError {
    #[error("invalid hand: {0}")]
    InvalidHand(#[from] HandError),
    #[error("board has {0} cards; five are needed to evaluate")]
    NotEnoughCards(usize),
}

/// The bundled seven-card evaluator.
#[derive(Debug, Clone, Copy, Default)]
pub struct HoldemEvaluator;

impl HandEvaluator for HoldemEvaluator {
    type Score = HandValue;

    fn evaluate(&self, hole: &HoleCards, board: &[Card; 5]) -> HandValue {
        let seven = [
            hole.first(),
            hole.second(),
            board[0],
            board[1],
            board[2],
            board[3],
            board[4],
        ];
        evaluate_seven(&seven)
    }

    fn stronger(&self, a: &HandValue, b: &HandValue) -> bool {
        a > b
    }
}

/// Validate and evaluate a hand against an observed board.
///
/// ```
/// use holdem_advisor::evaluator::{evaluate_holdem, Category};
/// use holdem_advisor::hand::{Board, HoleCards};
///
/// let hole: HoleCards = "As Ah".parse().unwrap();
/// let board: Board = "Qc Jd 9h 3s 2c".parse().unwrap();
/// let value = evaluate_holdem(&hole, &board).unwrap();
/// assert_eq!(value.category(), Category::Pair);
/// ```
pub fn evaluate_holdem(hole: &HoleCards, board: &Board) -> Result<HandValue, EvalError> {
    validate_holdem(hole, board)?;
    let five: [Card; 5] =
        board.as_slice().try_into().map_err(|_| EvalError::NotEnoughCards(board.len()))?;
    Ok(HoldemEvaluator.evaluate(hole, &five))
}

/// Compare two hands on a shared board.
pub fn compare_holdem(a: &HoleCards, b: &HoleCards, board: &Board) -> Result<Ordering, EvalError> {
    Ok(evaluate_holdem(a, board)?.cmp(&evaluate_holdem(b, board)?))
}

/// Evaluate exactly five cards.
pub fn evaluate_five(cards: &[Card; 5]) -> HandValue {
    let mut ranks = cards.map(|c| c.rank());
    ranks.sort_by(|a, b| b.cmp(a));

    let is_flush = cards.iter().all(|c| c.suit() == cards[0].suit());

    let mut counts = [0u8; 15];
    for r in ranks {
        counts[r as usize] += 1;
    }
    let distinct = counts.iter().filter(|&&c| c > 0).count();
    let is_wheel = distinct == 5
        && ranks == [Rank::Ace, Rank::Five, Rank::Four, Rank::Three, Rank::Two];
    let is_run = distinct == 5 && ranks[0].value() - ranks[4].value() == 4;
    let straight_top = if is_wheel {
        Some(Rank::Five)
    } else if is_run {
        Some(ranks[0])
    } else {
        None
    };

    if let (true, Some(top)) = (is_flush, straight_top) {
        return HandValue::from_parts(Category::StraightFlush, &[top, Rank::Two, Rank::Two, Rank::Two, Rank::Two]);
    }

    // (count, rank) groups, biggest group first, then highest rank
    let mut groups: Vec<(u8, Rank)> = (2u8..=14)
        .rev()
        .filter(|&v| counts[v as usize] > 0)
        .filter_map(|v| Rank::from_value(v).map(|r| (counts[v as usize], r)))
        .collect();
    groups.sort_by(|a, b| b.cmp(a));

    let mut tiebreak = [Rank::Two; 5];
    for (slot, (_, r)) in tiebreak.iter_mut().zip(groups.iter()) {
        *slot = *r;
    }
    let shape: Vec<u8> = groups.iter().map(|(c, _)| *c).collect();

    let category = match shape.as_slice() {
        [4, ..] => Category::FourOfAKind,
        [3, 2] => Category::FullHouse,
        _ if is_flush => {
            tiebreak = ranks;
            Category::Flush
        }
        _ if straight_top.is_some() => {
            tiebreak = [straight_top.unwrap_or(Rank::Two), Rank::Two, Rank::Two, Rank::Two, Rank::Two];
            Category::Straight
        }
        [3, ..] => Category::ThreeOfAKind,
        [2, 2, ..] => Category::TwoPair,
        [2, ..] => Category::Pair,
        _ => Category::HighCard,
    };
    HandValue::from_parts(category, &tiebreak)
}

/// Best of the 21 five-card subsets of seven cards.
pub fn evaluate_seven(cards: &[Card; 7]) -> HandValue {
    let mut best = HandValue(0);
    for skip_a in 0..7 {
        for skip_b in (skip_a + 1)..7 {
            let mut five = [cards[0]; 5];
            let mut n = 0;
            for (i, c) in cards.iter().enumerate() {
                if i != skip_a && i != skip_b {
                    five[n] = *c;
                    n += 1;
                }
            }
            best = best.max(evaluate_five(&five));
        }
    }
    best
}
