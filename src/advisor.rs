//! Pot odds and bet sizing.
//!
//! Everything here is a pure function of chip counts and a win probability.
//! [`recommended_bet_fraction`] is a heuristic, not a Kelly derivation, and its
//! raw output is unbounded in both directions. [`recommended_bet`] applies the
//! clamping policy: the suggested stake is `balance * fraction`, floored, and
//! limited to `[0, balance]`. A negative fraction means "do not bet".

use crate::equity::EquityResult;

/// Share of the resulting pot the caller has to put in: `call / (pot + call)`.
///
/// ```
/// use holdem_advisor::advisor::pot_odds;
///
/// assert_eq!(pot_odds(100, 0), 0.0);
/// assert!((pot_odds(100, 50) - 1.0 / 3.0).abs() < 1e-12);
/// ```
pub fn pot_odds(pot_total: u64, call_amount: u64) -> f64 {
    if call_amount == 0 {
        return 0.0;
    }
    call_amount as f64 / (pot_total as f64 + call_amount as f64)
}

/// Fraction of the balance to stake given pot odds and a win probability.
///
/// With positive pot odds: `(odds * p - (1 - p)) / odds`; otherwise `2p - 1`.
pub fn recommended_bet_fraction(pot_odds: f64, win_probability: f64) -> f64 {
    let p = win_probability;
    if pot_odds > 0.0 {
        (pot_odds * p - (1.0 - p)) / pot_odds
    } else {
        2.0 * p - 1.0
    }
}

/// `balance * fraction`, floored and clamped to `[0, balance]`. NaN stakes nothing.
pub fn recommended_bet(balance: u64, fraction: f64) -> u64 {
    if fraction.is_nan() || fraction <= 0.0 {
        return 0;
    }
    if fraction >= 1.0 {
        return balance;
    }
    ((balance as f64 * fraction).floor() as u64).min(balance)
}

/// How far the win probability sits above an even share of the losses
/// spread across the field: `p - (1 - p) / opponents`. Zero opponents are
/// treated as one.
pub fn favourability(win_probability: f64, num_opponents: usize) -> f64 {
    let n = num_opponents.max(1) as f64;
    win_probability - (1.0 - win_probability) / n
}

/// Expected value of staying in: `pot * p - current_bet`, or the forfeited
/// `-current_bet` once folded.
pub fn utility(pot_total: u64, win_probability: f64, current_bet: u64, folded: bool) -> f64 {
    if folded {
        return -(current_bet as f64);
    }
    pot_total as f64 * win_probability - current_bet as f64
}

/// Opponent stack as a multiple of the hero's; `None` when the hero is broke.
pub fn stack_ratio(opponent_balance: u64, hero_balance: u64) -> Option<f64> {
    if hero_balance == 0 {
        return None;
    }
    Some(opponent_balance as f64 / hero_balance as f64)
}

/// Everything the advisor has to say about one decision point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Advice {
    pub win_probability: f64,
    pub pot_odds: f64,
    pub favourability: f64,
    /// Raw, unclamped output of [`recommended_bet_fraction`].
    pub fraction: f64,
    /// Clamped stake per [`recommended_bet`].
    pub bet: u64,
}

impl Advice {
    pub fn new(
        equity: &EquityResult,
        pot_total: u64,
        call_amount: u64,
        balance: u64,
        num_opponents: usize,
    ) -> Self {
        let p = equity.win_probability;
        let odds = pot_odds(pot_total, call_amount);
        let fraction = recommended_bet_fraction(odds, p);
        Self {
            win_probability: p,
            pot_odds: odds,
            favourability: favourability(p, num_opponents),
            fraction,
            bet: recommended_bet(balance, fraction),
        }
    }

    /// Whether calling is profitable on raw pot odds alone.
    pub fn call_is_profitable(&self) -> bool {
        self.win_probability > self.pot_odds
    }
}
