//! Players, the table, and the betting round state machine.
//!
//! A [`Table`] owns the players for a whole session. Balances persist across
//! hands; each player's `current_bet` covers the current street only, while
//! `contributed` accumulates over the hand. The table keeps
//! `pot_total == sum(contributed)` over every seat, folded or not, after every
//! accepted action.
//!
//! A betting round starts with [`Table::start_round`] and advances one
//! [`Action`] at a time through [`Table::apply`]. Action goes around the
//! active players starting left of the dealer. When someone raises, every
//! active player left below the new highest bet owes another action, in the
//! same seat order. The round completes when nobody owes anything or only one
//! player has not folded. Rejected actions change nothing.

use crate::action::{Action, ActionSource};
use crate::advisor::stack_ratio;
use std::collections::BTreeSet;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum BettingError {
    #[error("insufficient balance: needs {needed}, has {balance}")]
    InsufficientBalance { needed: u64, balance: u64 },
    #[error("bet too low: total {total} does not reach the highest bet of {highest}")]
    BetTooLow { total: u64, highest: u64 },
    #[error("cannot check while owing {owed}")]
    IllegalCheck { owed: u64 },
    #[error("player '{0}' not found")]
    PlayerNotFound(String),
    #[error("player '{0}' is already seated")]
    DuplicatePlayer(String),
    #[error("it is {expected}'s turn, not {got}'s")]
    NotYourTurn { expected: String, got: String },
    #[error("the betting round is complete")]
    RoundComplete,
    #[error("no betting round in progress")]
    NoRound,
    #[error("a round needs at least two players, table has {0}")]
    NotEnoughPlayers(usize),
    #[error("no action supplied for {0}")]
    NoAction(String),
    #[error("{0} players are still in the hand; name a winner")]
    NoWinner(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    name: String,
    balance: u64,
    current_bet: u64,
    contributed: u64,
    folded: bool,
}

impl Player {
    pub fn new(name: impl Into<String>, balance: u64) -> Self {
        Self { name: name.into(), balance, current_bet: 0, contributed: 0, folded: false }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Chips not yet committed to the pot.
    pub fn balance(&self) -> u64 {
        self.balance
    }

    /// Chips committed on the current street.
    pub fn current_bet(&self) -> u64 {
        self.current_bet
    }

    /// Chips committed over the whole hand.
    pub fn contributed(&self) -> u64 {
        self.contributed
    }

    pub fn is_folded(&self) -> bool {
        self.folded
    }

    /// Move `amount` from the balance into the current bet.
    pub fn bet(&mut self, amount: u64) -> Result<(), BettingError> {
        if amount > self.balance {
            return Err(BettingError::InsufficientBalance { needed: amount, balance: self.balance });
        }
        self.balance -= amount;
        self.current_bet += amount;
        self.contributed += amount;
        Ok(())
    }

    pub fn win(&mut self, amount: u64) {
        self.balance = self.balance.saturating_add(amount);
    }

    pub fn fold(&mut self) {
        self.folded = true;
    }

    fn reset_bet(&mut self) {
        self.current_bet = 0;
    }

    fn reset_hand(&mut self) {
        self.current_bet = 0;
        self.contributed = 0;
        self.folded = false;
    }
}

/// Where a betting round stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundState {
    /// Waiting on the player in this seat.
    AwaitingAction(usize),
    RoundComplete,
}

/// Per-street bookkeeping. Seats index into [`Table::players`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BettingRound {
    highest_bet: u64,
    active: Vec<usize>,
    folded: BTreeSet<usize>,
    acted: BTreeSet<usize>,
    state: RoundState,
}

impl BettingRound {
    pub fn highest_bet(&self) -> u64 {
        self.highest_bet
    }

    /// Seats still in the hand, in action order.
    pub fn active(&self) -> &[usize] {
        &self.active
    }

    /// Seats that have folded this hand, on this street or earlier.
    pub fn folded(&self) -> &BTreeSet<usize> {
        &self.folded
    }

    /// Seats that need no further action unless someone raises.
    pub fn acted(&self) -> &BTreeSet<usize> {
        &self.acted
    }

    pub fn state(&self) -> RoundState {
        self.state
    }
}

/// The decision in front of one player, as shown to an [`ActionSource`].
#[derive(Debug, Clone, Copy)]
pub struct Turn<'a> {
    pub seat: usize,
    pub player: &'a Player,
    pub highest_bet: u64,
    pub to_call: u64,
    pub pot_total: u64,
}

/// One accepted action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryEntry {
    pub seat: usize,
    pub action: Action,
    /// Chips moved into the pot by this action.
    pub paid: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    players: Vec<Player>,
    starting_balance: u64,
    dealer: usize,
    pot_total: u64,
    round: Option<BettingRound>,
    history: Vec<HistoryEntry>,
}

impl Table {
    pub fn new(starting_balance: u64) -> Self {
        Self {
            players: Vec::new(),
            starting_balance,
            dealer: 0,
            pot_total: 0,
            round: None,
            history: Vec::new(),
        }
    }

    /// Seat a new player with the starting balance. Names are unique.
    pub fn add_player(&mut self, name: impl Into<String>) -> Result<usize, BettingError> {
        let name = name.into();
        if self.seat_of(&name).is_some() {
            return Err(BettingError::DuplicatePlayer(name));
        }
        self.players.push(Player::new(name, self.starting_balance));
        Ok(self.players.len() - 1)
    }

    pub fn starting_balance(&self) -> u64 {
        self.starting_balance
    }

    /// Every seated player in seat order, folded or not.
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player(&self, name: &str) -> Result<&Player, BettingError> {
        self.seat_of(name)
            .map(|seat| &self.players[seat])
            .ok_or_else(|| BettingError::PlayerNotFound(name.to_string()))
    }

    pub fn seat_of(&self, name: &str) -> Option<usize> {
        self.players.iter().position(|p| p.name == name)
    }

    pub fn dealer(&self) -> usize {
        self.dealer
    }

    pub fn rotate_dealer(&mut self) {
        if !self.players.is_empty() {
            self.dealer = (self.dealer + 1) % self.players.len();
        }
    }

    /// All seats, starting left of the dealer and wrapping around.
    pub fn action_order(&self) -> Vec<usize> {
        let n = self.players.len();
        (1..=n).map(|offset| (self.dealer + offset) % n).collect()
    }

    /// Chips in the pot for the current hand.
    pub fn pot_total(&self) -> u64 {
        self.pot_total
    }

    pub fn round(&self) -> Option<&BettingRound> {
        self.round.as_ref()
    }

    pub fn state(&self) -> Option<RoundState> {
        self.round.as_ref().map(|r| r.state)
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    /// Players who have not folded this hand.
    pub fn live_players(&self) -> impl Iterator<Item = &Player> {
        self.players.iter().filter(|p| !p.folded)
    }

    /// Chips the player in `seat` must add to match the highest bet.
    pub fn to_call(&self, seat: usize) -> u64 {
        match (&self.round, self.players.get(seat)) {
            (Some(r), Some(p)) => r.highest_bet.saturating_sub(p.current_bet),
            _ => 0,
        }
    }

    /// The turn currently awaiting a decision, if any.
    pub fn turn(&self) -> Option<Turn<'_>> {
        let round = self.round.as_ref()?;
        match round.state {
            RoundState::AwaitingAction(seat) => Some(Turn {
                seat,
                player: &self.players[seat],
                highest_bet: round.highest_bet,
                to_call: self.to_call(seat),
                pot_total: self.pot_total,
            }),
            RoundState::RoundComplete => None,
        }
    }

    /// Open a betting round for the next street.
    ///
    /// Resets every `current_bet` and the highest bet; the pot carries over.
    /// Players who folded earlier in the hand sit the round out. With fewer
    /// than two live players the round is complete immediately.
    pub fn start_round(&mut self) -> Result<RoundState, BettingError> {
        if self.players.len() < 2 {
            return Err(BettingError::NotEnoughPlayers(self.players.len()));
        }
        for p in &mut self.players {
            p.reset_bet();
        }
        let order = self.action_order();
        let active: Vec<usize> = order.iter().copied().filter(|&s| !self.players[s].folded).collect();
        let folded: BTreeSet<usize> = order.iter().copied().filter(|&s| self.players[s].folded).collect();
        let state = match active.first() {
            Some(&first) if active.len() > 1 => RoundState::AwaitingAction(first),
            _ => RoundState::RoundComplete,
        };
        log::debug!(
            "betting round opens: {} active, pot {}, first to act {:?}",
            active.len(),
            self.pot_total,
            state
        );
        self.round = Some(BettingRound { highest_bet: 0, active, folded, acted: BTreeSet::new(), state });
        Ok(state)
    }

    /// Apply `action` for the player whose turn it is.
    pub fn apply(&mut self, action: Action) -> Result<RoundState, BettingError> {
        let seat = self.current_seat()?;
        match self.try_apply(seat, action) {
            Ok(state) => Ok(state),
            Err(e) => {
                log::debug!("{} tried to {action}: {e}", self.players[seat].name);
                Err(e)
            }
        }
    }

    /// Apply `action` on behalf of the named player, who must be the one to act.
    pub fn act(&mut self, name: &str, action: Action) -> Result<RoundState, BettingError> {
        let seat = self.seat_of(name).ok_or_else(|| BettingError::PlayerNotFound(name.to_string()))?;
        let current = self.current_seat()?;
        if seat != current {
            return Err(BettingError::NotYourTurn {
                expected: self.players[current].name.clone(),
                got: name.to_string(),
            });
        }
        self.apply(action)
    }

    /// Drive a whole round from `source`, re-asking after every rejected action.
    pub fn run_round(&mut self, source: &mut dyn ActionSource) -> Result<(), BettingError> {
        self.start_round()?;
        while let Some(turn) = self.turn() {
            let Some(action) = source.next_action(&turn) else {
                return Err(BettingError::NoAction(turn.player.name.clone()));
            };
            if let Err(e) = self.apply(action) {
                if let Some(turn) = self.turn() {
                    source.rejected(&turn, action, &e);
                }
            }
        }
        Ok(())
    }

    fn current_seat(&self) -> Result<usize, BettingError> {
        match self.round.as_ref().map(|r| r.state) {
            Some(RoundState::AwaitingAction(seat)) => Ok(seat),
            Some(RoundState::RoundComplete) => Err(BettingError::RoundComplete),
            None => Err(BettingError::NoRound),
        }
    }

    fn try_apply(&mut self, seat: usize, action: Action) -> Result<RoundState, BettingError> {
        let Some(round) = self.round.as_mut() else {
            return Err(BettingError::NoRound);
        };
        let player = &self.players[seat];
        let owed = round.highest_bet.saturating_sub(player.current_bet);

        // Validate everything before touching state.
        let paid = match action {
            Action::Bet(amount) | Action::Raise(amount) => {
                let insufficient = |needed: u64| BettingError::InsufficientBalance { needed, balance: player.balance };
                if amount > player.balance {
                    return Err(insufficient(amount));
                }
                let total = player.current_bet.checked_add(amount).ok_or(insufficient(u64::MAX))?;
                // a raise is capped by its resulting total, not just the chips added
                if matches!(action, Action::Raise(_)) && total > player.balance {
                    return Err(insufficient(total));
                }
                let too_low = match action {
                    Action::Raise(_) => total <= round.highest_bet,
                    _ => total < round.highest_bet,
                };
                if amount == 0 || too_low {
                    return Err(BettingError::BetTooLow { total, highest: round.highest_bet });
                }
                amount
            }
            Action::Call => {
                if owed > player.balance {
                    return Err(BettingError::InsufficientBalance { needed: owed, balance: player.balance });
                }
                owed
            }
            Action::Check => {
                if owed > 0 {
                    return Err(BettingError::IllegalCheck { owed });
                }
                0
            }
            Action::Fold => 0,
        };

        let player = &mut self.players[seat];
        let position = round.active.iter().position(|&s| s == seat).unwrap_or(0);
        let mut resume_at = position + 1;
        match action {
            Action::Fold => {
                player.fold();
                round.active.remove(position);
                round.folded.insert(seat);
                resume_at = position;
            }
            _ if paid > 0 => {
                player.bet(paid)?;
                round.highest_bet = round.highest_bet.max(player.current_bet);
                self.pot_total += paid;
            }
            _ => {}
        }
        round.acted.insert(seat);
        log::debug!("{} {action} (paid {paid}, pot {})", player.name, self.pot_total);
        self.history.push(HistoryEntry { seat, action, paid });

        round.state = next_state(round, &self.players, resume_at);
        if round.state == RoundState::RoundComplete {
            log::debug!("betting round complete, pot {}", self.pot_total);
        }
        Ok(round.state)
    }

    /// Pay the whole pot to `winner`, then reset the table for the next hand.
    pub fn award_pot(&mut self, winner: &str) -> Result<u64, BettingError> {
        let seat = self.seat_of(winner).ok_or_else(|| BettingError::PlayerNotFound(winner.to_string()))?;
        let pot = self.pot_total;
        self.players[seat].win(pot);
        log::info!("{} wins the pot of {pot}", self.players[seat].name);
        self.reset_hand();
        Ok(pot)
    }

    /// Settle the hand: the last live player takes the pot uncontested,
    /// otherwise `declared` names the winner.
    pub fn resolve(&mut self, declared: Option<&str>) -> Result<(String, u64), BettingError> {
        let live: Vec<&Player> = self.live_players().collect();
        let winner = match (live.as_slice(), declared) {
            ([only], _) => only.name.clone(),
            (_, Some(name)) => name.to_string(),
            (_, None) => return Err(BettingError::NoWinner(live.len())),
        };
        let pot = self.award_pot(&winner)?;
        Ok((winner, pot))
    }

    /// Zero every bet and contribution, un-fold everyone, empty the pot.
    pub fn reset_hand(&mut self) {
        for p in &mut self.players {
            p.reset_hand();
        }
        self.pot_total = 0;
        self.round = None;
        self.history.clear();
    }

    /// Each other player's balance as a multiple of `hero`'s.
    pub fn stack_deviations(&self, hero: &str) -> Result<Vec<(&str, Option<f64>)>, BettingError> {
        let hero_balance = self.player(hero)?.balance;
        Ok(self
            .players
            .iter()
            .filter(|p| p.name != hero)
            .map(|p| (p.name.as_str(), stack_ratio(p.balance, hero_balance)))
            .collect())
    }
}

/// Pick the next seat that owes action, scanning the active list from `start`.
fn next_state(round: &BettingRound, players: &[Player], start: usize) -> RoundState {
    let n = round.active.len();
    if n <= 1 {
        return RoundState::RoundComplete;
    }
    (0..n)
        .map(|i| round.active[(start + i) % n])
        .find(|&s| !round.acted.contains(&s) || players[s].current_bet < round.highest_bet)
        .map_or(RoundState::RoundComplete, RoundState::AwaitingAction)
}
