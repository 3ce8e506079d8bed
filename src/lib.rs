//! holdem-advisor: Texas Hold'em odds and betting assistant
//!
//! Goals:
//! - Monte Carlo win probability for a hero hand against random opponents
//! - Pot odds and a clamped bet-size recommendation
//! - A betting round state machine that never reads a terminal itself
//! - No panics for invalid input; use `Result` for recoverable errors
//!
//! ## Quick start: estimate equity
//! ```
//! use holdem_advisor::equity::{EquityEstimator, EquityQuery, EstimatorConfig};
//! use holdem_advisor::hand::{Board, HoleCards};
//!
//! let hole: HoleCards = "As Ks".parse().unwrap();
//! let board: Board = "Qs Js Ts 2c 3d".parse().unwrap();
//! let query = EquityQuery::new(hole, board, 3).unwrap().with_trials(2_000);
//!
//! let estimator = EquityEstimator::new(EstimatorConfig::default().with_seed(7));
//! let result = estimator.estimate(&query).unwrap();
//! assert_eq!(result.win_probability, 1.0);
//! ```
//!
//! ## Quick start: a betting round
//! ```
//! use holdem_advisor::action::ScriptedActions;
//! use holdem_advisor::betting::Table;
//!
//! let mut table = Table::new(100);
//! for name in ["A", "B", "C"] {
//!     table.add_player(name).unwrap();
//! }
//! table.rotate_dealer();
//! let mut script: ScriptedActions = "check; bet 10; call; call".parse().unwrap();
//! table.run_round(&mut script).unwrap();
//! assert_eq!(table.pot_total(), 30);
//! ```
//!
//! ## CLI
//! Play a hand against the advisor with:
//! ```sh
//! cargo run --bin holdem-advisor -- --balance 500
//! ```

pub mod action;
pub mod advisor;
pub mod betting;
pub mod cards;
pub mod deck;
pub mod equity;
pub mod evaluator;
pub mod hand;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
