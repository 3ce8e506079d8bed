//! Player actions and where they come from.
//!
//! The betting machine never reads a terminal. Whoever drives a round (a CLI,
//! a test, a bot) implements [`ActionSource`] and hands out one [`Action`] per
//! turn; rejected actions are reported back through
//! [`ActionSource::rejected`] so the source can re-prompt.

use crate::betting::{BettingError, Turn};
use core::fmt;
use std::collections::VecDeque;
use std::str::FromStr;

/// One decision by the player whose turn it is. Amounts are the chips put in
/// by this action, on top of what the player already has in front of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Bet(u64),
    Raise(u64),
    Call,
    Check,
    Fold,
}

impl Action {
    pub fn verb(self) -> &'static str {
        match self {
            Action::Bet(_) => "bet",
            Action::Raise(_) => "raise",
            Action::Call => "call",
            Action::Check => "check",
            Action::Fold => "fold",
        }
    }

    /// Build an action from an already split verb and optional amount token.
    pub fn parse(verb: &str, amount: Option<&str>) -> Result<Action, ActionParseError> {
        let verb = verb.trim().to_ascii_lowercase();
        let amount = amount.map(str::trim).filter(|a| !a.is_empty());
        let chips = || -> Result<u64, ActionParseError> {
            let raw = amount.ok_or_else(|| ActionParseError::MissingAmount(verb.clone()))?;
            raw.parse::<u64>().map_err(|_| ActionParseError::InvalidAmount(raw.to_string()))
        };
        let bare = |action: Action| match amount {
            Some(extra) => Err(ActionParseError::UnexpectedAmount(verb.clone(), extra.to_string())),
            None => Ok(action),
        };
        match verb.as_str() {
            "bet" => Ok(Action::Bet(chips()?)),
            "raise" => Ok(Action::Raise(chips()?)),
            "call" => bare(Action::Call),
            "check" => bare(Action::Check),
            "fold" => bare(Action::Fold),
            _ => Err(ActionParseError::UnknownVerb(verb.clone())),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Bet(n) | Action::Raise(n) => write!(f, "{} {n}", self.verb()),
            _ => write!(f, "{}", self.verb()),
        }
    }
}

/// A malformed action token coming from the input collaborator.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ActionParseError {
    #[error("unknown action '{0}': expected bet, raise, call, check or fold")]
    UnknownVerb(String),
    #[error("{0} needs an amount")]
    MissingAmount(String),
    #[error("invalid amount '{0}'")]
    InvalidAmount(String),
    #[error("{0} takes no amount, got '{1}'")]
    UnexpectedAmount(String, String),
    #[error("empty action")]
    Empty,
}

impl FromStr for Action {
    type Err = ActionParseError;

    /// `"bet 10"`, `"raise 25"`, `"call"`, `"check"`, `"fold"`; case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split_whitespace();
        let verb = parts.next().ok_or(ActionParseError::Empty)?;
        let amount = parts.next();
        if let Some(extra) = parts.next() {
            return Err(ActionParseError::InvalidAmount(extra.to_string()));
        }
        Action::parse(verb, amount)
    }
}

/// Supplies actions for a betting round, one turn at a time.
pub trait ActionSource {
    /// The action for the player described by `turn`, or `None` to abandon the round.
    fn next_action(&mut self, turn: &Turn<'_>) -> Option<Action>;

    /// Called when the table refused `action`; the next call to
    /// [`next_action`](Self::next_action) is for the same turn.
    fn rejected(&mut self, _turn: &Turn<'_>, _action: Action, _error: &BettingError) {}
}

/// Plays back a fixed list of actions. Handy for tests and replays.
///
/// ```
/// use holdem_advisor::action::ScriptedActions;
///
/// let script: ScriptedActions = "check; bet 10; call".parse().unwrap();
/// assert_eq!(script.remaining(), 3);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ScriptedActions {
    queue: VecDeque<Action>,
    rejections: Vec<(String, Action, BettingError)>,
}

impl ScriptedActions {
    pub fn new<I: IntoIterator<Item = Action>>(actions: I) -> Self {
        Self { queue: actions.into_iter().collect(), rejections: Vec::new() }
    }

    pub fn remaining(&self) -> usize {
        self.queue.len()
    }

    /// Every refused action with the player it was meant for.
    pub fn rejections(&self) -> &[(String, Action, BettingError)] {
        &self.rejections
    }
}

impl FromStr for ScriptedActions {
    type Err = ActionParseError;

    /// Semicolon- or newline-separated action tokens.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let actions = s
            .split(|c: char| c == ';' || c == '\n')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(Action::from_str)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(actions))
    }
}

impl ActionSource for ScriptedActions {
    fn next_action(&mut self, _turn: &Turn<'_>) -> Option<Action> {
        self.queue.pop_front()
    }

    fn rejected(&mut self, turn: &Turn<'_>, action: Action, error: &BettingError) {
        self.rejections.push((turn.player.name().to_string(), action, error.clone()));
    }
}
