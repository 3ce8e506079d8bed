//! Monte Carlo equity estimation.
//!
//! Each trial clones a deck built once from the known cards, completes the
//! board, deals every opponent two cards and asks the evaluator whether the
//! hero beats all of them outright. Trials run in parallel batches; each batch
//! owns a ChaCha stream derived from the base seed and its batch index, so a
//! seeded estimate is reproducible regardless of how rayon schedules batches.
//!
//! A trial where the hero ties the best opponent is *not* a win, so the
//! estimate undercounts equity whenever split pots are likely.

use crate::cards::{Card, Rank, Suit};
use crate::deck::{Deck, DeckError};
use crate::evaluator::{HandEvaluator, HoldemEvaluator};
use crate::hand::{validate_holdem, Board, HandError, HoleCards, Street};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use std::ops::Add;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Trials per estimate unless the query says otherwise. Standard error at
/// p = 0.5 is about 0.16%.
pub const DEFAULT_TRIALS: usize = 100_000;

/// Trials handed to one rayon task.
pub const DEFAULT_BATCH_SIZE: usize = 1_000;

// Fills array slots that are overwritten before use.
const PLACEHOLDER: Card = Card::new(Rank::Two, Suit::Clubs);

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum EquityError {
    #[error("invalid query: {0}")]
    InvalidQuery(#[from] HandError),
    #[error("board must hold 0, 3, 4 or 5 cards, got {0}")]
    BoardSize(usize),
    #[error("at least one opponent is required")]
    NoOpponents,
    #[error("at least one trial is required")]
    NoTrials,
    #[error("insufficient cards: a trial needs {needed} but only {remaining} remain")]
    InsufficientCards { needed: usize, remaining: usize },
    #[error(transparent)]
    Deck(#[from] DeckError),
}

/// What the hero holds, what the board shows, and how many hands to beat.
///
/// ```
/// use holdem_advisor::equity::EquityQuery;
///
/// let q = EquityQuery::new("Ah Kh".parse().unwrap(), "Qh Jh 2c".parse().unwrap(), 2)
///     .unwrap()
///     .with_trials(500);
/// assert_eq!(q.num_trials(), 500);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EquityQuery {
    hole: HoleCards,
    board: Board,
    num_opponents: usize,
    num_trials: usize,
}

impl EquityQuery {
    pub fn new(hole: HoleCards, board: Board, num_opponents: usize) -> Result<Self, EquityError> {
        let query = Self { hole, board, num_opponents, num_trials: DEFAULT_TRIALS };
        query.validate()?;
        Ok(query)
    }

    /// Pre-flop query with an empty board.
    pub fn preflop(hole: HoleCards, num_opponents: usize) -> Result<Self, EquityError> {
        Self::new(hole, Board::empty(), num_opponents)
    }

    pub fn with_trials(mut self, num_trials: usize) -> Self {
        self.num_trials = num_trials;
        self
    }

    pub fn hole(&self) -> &HoleCards {
        &self.hole
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn num_opponents(&self) -> usize {
        self.num_opponents
    }

    pub fn num_trials(&self) -> usize {
        self.num_trials
    }

    pub fn street(&self) -> Option<Street> {
        self.board.street()
    }

    /// Hole cards followed by board cards.
    pub fn dead_cards(&self) -> Vec<Card> {
        let mut dead = Vec::with_capacity(2 + self.board.len());
        dead.extend(self.hole.as_array());
        dead.extend_from_slice(self.board.as_slice());
        dead
    }

    /// Cards one trial takes from the deck.
    pub fn cards_per_trial(&self) -> usize {
        (5 - self.board.len()) + 2 * self.num_opponents
    }

    fn validate(&self) -> Result<(), EquityError> {
        if Street::from_board_len(self.board.len()).is_none() {
            return Err(EquityError::BoardSize(self.board.len()));
        }
        validate_holdem(&self.hole, &self.board)?;
        if self.num_opponents == 0 {
            return Err(EquityError::NoOpponents);
        }
        if self.num_trials == 0 {
            return Err(EquityError::NoTrials);
        }
        let remaining = 52 - 2 - self.board.len();
        let needed = self.cards_per_trial();
        if needed > remaining {
            return Err(EquityError::InsufficientCards { needed, remaining });
        }
        Ok(())
    }
}

/// Outcome of an estimate. `trials_run` falls short of `trials_requested`
/// only when the run was cancelled or hit its time limit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EquityResult {
    pub win_probability: f64,
    pub wins: usize,
    pub trials_run: usize,
    pub trials_requested: usize,
}

impl EquityResult {
    fn from_tally(tally: Tally, requested: usize) -> Self {
        let win_probability =
            if tally.trials == 0 { 0.0 } else { tally.wins as f64 / tally.trials as f64 };
        Self { win_probability, wins: tally.wins, trials_run: tally.trials, trials_requested: requested }
    }

    pub fn is_complete(&self) -> bool {
        self.trials_run == self.trials_requested
    }

    /// `sqrt(p(1-p)/n)`; zero when no trial ran.
    pub fn standard_error(&self) -> f64 {
        if self.trials_run == 0 {
            return 0.0;
        }
        let p = self.win_probability;
        (p * (1.0 - p) / self.trials_run as f64).sqrt()
    }
}

/// Shared flag that stops a running estimate at the next trial boundary.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Knobs for the estimator; the trial count itself lives on the query.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct EstimatorConfig {
    pub seed: Option<u64>,
    pub batch_size: usize,
    pub time_limit: Option<Duration>,
}

impl EstimatorConfig {
    /// Fix the base seed so results are exactly reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Stop after `limit` wall-clock time and report what ran.
    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self { seed: None, batch_size: DEFAULT_BATCH_SIZE, time_limit: None }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Tally {
    wins: usize,
    trials: usize,
}

impl Add for Tally {
    type Output = Tally;
    fn add(self, rhs: Tally) -> Tally {
        Tally { wins: self.wins + rhs.wins, trials: self.trials + rhs.trials }
    }
}

/// Parallel Monte Carlo estimator over a pluggable [`HandEvaluator`].
#[derive(Debug, Clone, Default)]
pub struct EquityEstimator<E = HoldemEvaluator> {
    evaluator: E,
    config: EstimatorConfig,
}

impl EquityEstimator<HoldemEvaluator> {
    pub fn new(config: EstimatorConfig) -> Self {
        Self { evaluator: HoldemEvaluator, config }
    }
}

impl<E: HandEvaluator> EquityEstimator<E> {
    pub fn with_evaluator(evaluator: E, config: EstimatorConfig) -> Self {
        Self { evaluator, config }
    }

    pub fn config(&self) -> &EstimatorConfig {
        &self.config
    }

    pub fn estimate(&self, query: &EquityQuery) -> Result<EquityResult, EquityError> {
        self.estimate_with_cancel(query, &CancelToken::new())
    }

    /// Like [`estimate`](Self::estimate), stopping early once `cancel` fires.
    pub fn estimate_with_cancel(
        &self,
        query: &EquityQuery,
        cancel: &CancelToken,
    ) -> Result<EquityResult, EquityError> {
        query.validate()?;
        let template = Deck::new(&query.dead_cards())?;
        let base_seed = self.config.seed.unwrap_or_else(|| rand::rng().random());
        let deadline = self.config.time_limit.map(|limit| Instant::now() + limit);
        let batch_size = self.config.batch_size.max(1);
        let batches = (query.num_trials + batch_size - 1) / batch_size;

        log::debug!(
            "estimating equity: hole {} board [{}] vs {} opponent(s), {} trials in {} batches",
            query.hole,
            query.board,
            query.num_opponents,
            query.num_trials,
            batches
        );

        let stop = || cancel.is_cancelled() || deadline.is_some_and(|d| Instant::now() >= d);
        let tally = (0..batches)
            .into_par_iter()
            .map(|batch| {
                let start = batch * batch_size;
                let trials = batch_size.min(query.num_trials - start);
                let mut rng = ChaCha8Rng::seed_from_u64(base_seed);
                rng.set_stream(batch as u64);
                self.run_batch(query, &template, trials, &mut rng, &stop)
            })
            .try_reduce(Tally::default, |a, b| Ok(a + b))?;

        let result = EquityResult::from_tally(tally, query.num_trials);
        if result.is_complete() {
            log::debug!(
                "equity {:.4} (±{:.4}) over {} trials",
                result.win_probability,
                result.standard_error(),
                result.trials_run
            );
        } else {
            log::info!(
                "equity estimate stopped early after {}/{} trials: {:.4}",
                result.trials_run,
                result.trials_requested,
                result.win_probability
            );
        }
        Ok(result)
    }

    fn run_batch<R: Rng>(
        &self,
        query: &EquityQuery,
        template: &Deck,
        trials: usize,
        rng: &mut R,
        stop: &(impl Fn() -> bool + Sync),
    ) -> Result<Tally, EquityError> {
        let mut tally = Tally::default();
        for _ in 0..trials {
            if stop() {
                break;
            }
            if self.run_trial(query, template.clone(), rng)? {
                tally.wins += 1;
            }
            tally.trials += 1;
        }
        Ok(tally)
    }

    /// One simulated showdown on a private deck. True if the hero beats every opponent.
    fn run_trial<R: Rng>(&self, query: &EquityQuery, mut deck: Deck, rng: &mut R) -> Result<bool, EquityError> {
        let known = query.board.as_slice();
        let mut board = [PLACEHOLDER; 5];
        board[..known.len()].copy_from_slice(known);
        deck.draw_into(&mut board[known.len()..], rng)?;

        let hero = self.evaluator.evaluate(&query.hole, &board);
        for _ in 0..query.num_opponents {
            let mut pair = [PLACEHOLDER; 2];
            deck.draw_into(&mut pair, rng)?;
            let villain = HoleCards::try_new(pair[0], pair[1])?;
            if !self.evaluator.stronger(&hero, &self.evaluator.evaluate(&villain, &board)) {
                return Ok(false);
            }
        }
        Ok(true)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn seeded(seed: u64) -> EquityEstimator {
        EquityEstimator::new(EstimatorConfig::default().with_seed(seed).with_batch_size(64))
    }

    #[test]
    fn query_rejects_bad_shapes() {
        let hole: HoleCards = "As Ks".parse().unwrap();
        assert_eq!(
            EquityQuery::new(hole, "2c 3c".parse().unwrap(), 1),
            Err(EquityError::BoardSize(2))
        );
        assert_eq!(EquityQuery::preflop(hole, 0), Err(EquityError::NoOpponents));
        assert!(matches!(
            EquityQuery::new(hole, "As 2c 3c".parse().unwrap(), 1),
            Err(EquityError::InvalidQuery(HandError::Overlap))
        ));
    }

    #[test]
    fn zero_trials_fail_fast() {
        let q = EquityQuery::preflop("As Ks".parse().unwrap(), 1).unwrap().with_trials(0);
        assert_eq!(seeded(1).estimate(&q), Err(EquityError::NoTrials));
    }

    #[test]
    fn too_many_opponents_fail_before_any_trial() {
        // 50 cards left, 5 for the board, 23 opponents need 46
        let q = EquityQuery::preflop("As Ks".parse().unwrap(), 23);
        assert_eq!(q, Err(EquityError::InsufficientCards { needed: 51, remaining: 50 }));
        assert!(EquityQuery::preflop("As Ks".parse().unwrap(), 22).is_ok());
    }

    #[test]
    fn cards_per_trial_counts_board_and_opponents() {
        let q = EquityQuery::new("As Ks".parse().unwrap(), "2c 3d 4h 5s".parse().unwrap(), 3).unwrap();
        assert_eq!(q.cards_per_trial(), 1 + 6);
        assert_eq!(q.dead_cards().len(), 6);
        assert_eq!(q.street(), Some(Street::Turn));
    }

    #[test]
    fn seeded_estimates_repeat_exactly() {
        let q = EquityQuery::preflop("Qs Qh".parse().unwrap(), 2).unwrap().with_trials(2_000);
        let a = seeded(11).estimate(&q).unwrap();
        let b = seeded(11).estimate(&q).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.trials_run, 2_000);
        assert!(a.is_complete());
    }

    #[test]
    fn board_tie_never_counts_as_win() {
        let q = EquityQuery::new("2c 3d".parse().unwrap(), "As Ks Qs Js Ts".parse().unwrap(), 3)
            .unwrap()
            .with_trials(300);
        let r = seeded(5).estimate(&q).unwrap();
        assert_eq!(r.wins, 0);
        assert_eq!(r.win_probability, 0.0);
    }

    #[test]
    fn cancelled_before_start_runs_nothing() {
        let q = EquityQuery::preflop("As Ad".parse().unwrap(), 1).unwrap().with_trials(10_000);
        let cancel = CancelToken::new();
        cancel.cancel();
        let r = seeded(2).estimate_with_cancel(&q, &cancel).unwrap();
        assert_eq!(r.trials_run, 0);
        assert_eq!(r.win_probability, 0.0);
        assert!(!r.is_complete());
        assert_eq!(r.standard_error(), 0.0);
    }

    #[test]
    fn standard_error_shrinks_with_trials() {
        let small = EquityResult { win_probability: 0.5, wins: 50, trials_run: 100, trials_requested: 100 };
        let large = EquityResult { win_probability: 0.5, wins: 5000, trials_run: 10_000, trials_requested: 10_000 };
        assert!((small.standard_error() - 0.05).abs() < 1e-12);
        assert!(large.standard_error() < small.standard_error());
    }
}
